pub mod candidates;
pub mod matching;
pub mod ocr;
pub mod preprocessing;
pub mod recognition;
pub mod scoring;
pub mod segmentation;
pub mod templates;

use std::fs;
use std::path::PathBuf;

use image::GrayImage;
use tracing::{info, warn};

use crate::error::{Error, Result};
use crate::models::{PlateCandidate, PlateDetection};

use candidates::CandidateConfig;
use ocr::GlyphOcr;
use preprocessing::PreprocessConfig;
use recognition::RecognizerConfig;
use segmentation::SegmentConfig;
use templates::TemplateSet;

/// Tuning for every stage of the detector.
#[derive(Debug, Clone, Default)]
pub struct DetectorConfig {
    pub preprocess: PreprocessConfig,
    pub candidates: CandidateConfig,
    pub segment: SegmentConfig,
    pub recognize: RecognizerConfig,
}

/// Plate detection orchestrator.
///
/// Owns the working raster. The input is normalized once, on the first
/// `locate`, so repeated calls and a following `detect` reuse the same
/// raster. With a snapshot directory set, every stage writes its
/// intermediate raster there.
pub struct PlateDetector {
    config: DetectorConfig,
    img: GrayImage,
    scale: f32,
    normalized: bool,
    edges: Option<GrayImage>,
    snapshot_dir: Option<PathBuf>,
}

impl PlateDetector {
    pub fn new(img: GrayImage) -> Self {
        Self::with_config(img, DetectorConfig::default())
    }

    pub fn with_config(img: GrayImage, config: DetectorConfig) -> Self {
        Self { config, img, scale: 1.0, normalized: false, edges: None, snapshot_dir: None }
    }

    /// Write every stage's intermediate raster into `dir`.
    pub fn with_snapshot_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.snapshot_dir = Some(dir.into());
        self
    }

    /// Find the most plate-like region of the image.
    ///
    /// Returns `None` when nothing plate-shaped was found.
    pub fn locate(&mut self) -> Result<Option<PlateCandidate>> {
        let (width, height) = self.img.dimensions();
        if width == 0 || height == 0 {
            return Err(Error::EmptyImage { width, height });
        }

        if !self.normalized {
            let (img, scale) = preprocessing::normalize(&self.img, &self.config.preprocess);
            info!(
                "normalized {width}x{height} input to {}x{} (scale {scale:.2})",
                img.width(),
                img.height()
            );
            self.img = img;
            self.scale = scale;
            self.normalized = true;
            self.snapshot("01_normalized.png", &self.img);
        }

        let (candidates, edge_map) = candidates::extract(&self.img, &self.config.candidates);
        info!("{} plate candidates above the area floor", candidates.len());
        self.snapshot("02_edges.png", &edge_map);
        self.edges = Some(edge_map);

        let best = scoring::select_best(candidates, self.img.dimensions());
        match &best {
            Some(candidate) => info!(
                "located plate at {:?} with score {:?}",
                candidate.bbox, candidate.score
            ),
            None => info!("no plate-shaped region found"),
        }
        Ok(best)
    }

    /// Run the full pipeline: locate the plate, segment its characters and
    /// read them.
    ///
    /// `None` means no plate was located. A located plate always produces a
    /// detection, even when every glyph reads as unknown.
    pub fn detect(
        &mut self,
        templates: &TemplateSet,
        ocr: &dyn GlyphOcr,
    ) -> Result<Option<PlateDetection>> {
        let Some(candidate) = self.locate()? else {
            return Ok(None);
        };

        let plate = candidate.bbox.crop(&self.img);
        self.snapshot("03_plate.png", &plate);

        let glyphs = segmentation::segment(&plate, &self.config.segment)?;
        info!("segmented {} glyphs", glyphs.len());
        if self.snapshot_dir.is_some() {
            self.snapshot("04_binarized.png", &segmentation::binarize(&plate, &self.config.segment));
            for (i, glyph) in glyphs.iter().enumerate() {
                self.snapshot(&format!("05_glyph_{i:02}.png"), glyph);
            }
        }

        let text = recognition::recognize(&glyphs, templates, ocr, &self.config.recognize)?;
        info!("plate reads {text:?}");

        Ok(Some(PlateDetection { text, glyph_count: glyphs.len(), candidate }))
    }

    /// The working raster: the input after normalization.
    pub fn image(&self) -> &GrayImage {
        &self.img
    }

    /// Dilated edge map from the last `locate`.
    pub fn edge_map(&self) -> Option<&GrayImage> {
        self.edges.as_ref()
    }

    /// Input-to-working-raster scale factor. Divide working-raster
    /// coordinates by this to land on the original image.
    pub fn scale(&self) -> f32 {
        self.scale
    }

    /// Crop a candidate's region out of the working raster.
    pub fn plate_crop(&self, candidate: &PlateCandidate) -> GrayImage {
        candidate.bbox.crop(&self.img)
    }

    fn snapshot(&self, name: &str, img: &GrayImage) {
        let Some(dir) = &self.snapshot_dir else {
            return;
        };
        if let Err(err) = fs::create_dir_all(dir) {
            warn!("could not create snapshot dir {}: {err}", dir.display());
            return;
        }
        let path = dir.join(name);
        if let Err(err) = img.save(&path) {
            warn!("could not write snapshot {}: {err}", path.display());
        }
    }
}
