use image::{GrayImage, Luma};
pub use ocrs::{ImageSource, OcrEngine};
use ocrs::OcrEngineParams;
use rten::Model;
use std::path::Path;
use tracing::debug;

/// Symbols that can appear on a plate: the twelve letters with identical
/// Latin and Cyrillic shapes, plus digits. The OCR decoder is restricted to
/// this set.
pub const ALLOWED_CHARS: &str = "ABEKMHOPCTYX0123456789";

/// Reads a single glyph raster as text. Implemented by the ocrs-backed
/// engine and by test doubles.
pub trait GlyphOcr {
    fn read_glyph(&self, glyph: &GrayImage) -> anyhow::Result<String>;
}

/// Initialize OCR engine with models from the standard cache location
pub fn init_ocr_engine() -> anyhow::Result<OcrEngine> {
    let home_dir = std::env::var("HOME").or_else(|_| std::env::var("USERPROFILE"))?;

    let cache_dir = Path::new(&home_dir).join(".cache/ocrs");
    let detection_model_path = cache_dir.join("text-detection.rten");
    let recognition_model_path = cache_dir.join("text-recognition.rten");

    if !detection_model_path.exists() || !recognition_model_path.exists() {
        anyhow::bail!(
            "OCR models not found. Please run: ocrs-cli --help (or download models manually)\n\
             Expected locations:\n  - {}\n  - {}",
            detection_model_path.display(),
            recognition_model_path.display()
        );
    }

    let detection_model = Model::load_file(&detection_model_path)?;
    let recognition_model = Model::load_file(&recognition_model_path)?;

    let engine = OcrEngine::new(OcrEngineParams {
        detection_model: Some(detection_model),
        recognition_model: Some(recognition_model),
        allowed_chars: Some(ALLOWED_CHARS.to_string()),
        ..Default::default()
    })?;

    Ok(engine)
}

/// Glyph reader backed by the ocrs text recognition engine.
pub struct OcrsGlyphReader {
    engine: OcrEngine,
}

impl OcrsGlyphReader {
    /// Build a reader from models in `~/.cache/ocrs`.
    pub fn from_cache() -> anyhow::Result<Self> {
        Ok(Self { engine: init_ocr_engine()? })
    }

    pub fn new(engine: OcrEngine) -> Self {
        Self { engine }
    }
}

impl GlyphOcr for OcrsGlyphReader {
    fn read_glyph(&self, glyph: &GrayImage) -> anyhow::Result<String> {
        let prepared = prepare_glyph_for_ocr(glyph);

        // The engine wants RGB input.
        let rgb = image::DynamicImage::ImageLuma8(prepared).to_rgb8();
        let source = ImageSource::from_bytes(rgb.as_raw(), rgb.dimensions())?;
        let input = self.engine.prepare_input(source)?;

        let text = self.engine.get_text(&input)?;
        debug!("ocr read {:?} from {}x{} glyph", text.trim(), glyph.width(), glyph.height());
        Ok(text)
    }
}

/// Preprocess a glyph crop for text recognition.
///
/// Segmenter crops are a few dozen pixels tall, far below what the
/// recognition model was trained on. Crop to the dark content, add a uniform
/// border, upscale to fit a 100x100 canvas and center it on white.
pub fn prepare_glyph_for_ocr(glyph: &GrayImage) -> GrayImage {
    let (width, height) = glyph.dimensions();
    let target_size = 100u32;

    // Bounding box of the dark strokes.
    let mut min_x = width;
    let mut min_y = height;
    let mut max_x = 0;
    let mut max_y = 0;
    let mut has_content = false;

    for (x, y, pixel) in glyph.enumerate_pixels() {
        if pixel[0] < 128 {
            has_content = true;
            min_x = min_x.min(x);
            min_y = min_y.min(y);
            max_x = max_x.max(x);
            max_y = max_y.max(y);
        }
    }

    if !has_content {
        return GrayImage::from_pixel(target_size, target_size, Luma([255u8]));
    }

    let border = 2u32;
    let crop_x = min_x.saturating_sub(border);
    let crop_y = min_y.saturating_sub(border);
    let crop_w = (max_x - min_x + 1 + 2 * border).min(width - crop_x);
    let crop_h = (max_y - min_y + 1 + 2 * border).min(height - crop_y);

    let cropped = image::imageops::crop_imm(glyph, crop_x, crop_y, crop_w, crop_h).to_image();

    // Fit within the canvas while keeping the stroke aspect ratio.
    let margin = 10u32;
    let inner = target_size - 2 * margin;
    let scale = (inner as f32 / crop_w as f32).min(inner as f32 / crop_h as f32);
    let scaled_w = ((crop_w as f32 * scale) as u32).max(1);
    let scaled_h = ((crop_h as f32 * scale) as u32).max(1);

    let scaled =
        image::imageops::resize(&cropped, scaled_w, scaled_h, image::imageops::FilterType::CatmullRom);

    let mut canvas = GrayImage::from_pixel(target_size, target_size, Luma([255u8]));
    let offset_x = (target_size - scaled_w) / 2;
    let offset_y = (target_size - scaled_h) / 2;
    image::imageops::overlay(&mut canvas, &scaled, offset_x.into(), offset_y.into());

    canvas
}
