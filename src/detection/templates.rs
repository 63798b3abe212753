//! Reference digit templates for correlation matching.

use std::collections::BTreeMap;
use std::path::Path;

use image::{GrayImage, imageops};

use crate::error::{Error, Result};

/// Canonical template width in pixels.
pub const TEMPLATE_WIDTH: u32 = 32;
/// Canonical template height in pixels.
pub const TEMPLATE_HEIGHT: u32 = 48;

/// Reference glyphs keyed by the symbol they depict, all at the canonical
/// template size. Iteration follows symbol order, which keeps matching
/// deterministic. A set is loaded once and shared by reference across
/// detections.
#[derive(Debug, Clone, Default)]
pub struct TemplateSet {
    glyphs: BTreeMap<char, GrayImage>,
}

impl TemplateSet {
    /// Load digit templates `0.png` through `9.png` from a directory.
    ///
    /// Absent files are skipped so a partial set still matches. A file that
    /// is present but does not decode is an error.
    pub fn load_dir(dir: &Path) -> Result<Self> {
        let mut glyphs = BTreeMap::new();
        for symbol in '0'..='9' {
            let path = dir.join(format!("{symbol}.png"));
            if !path.exists() {
                continue;
            }
            let img = image::open(&path)
                .map_err(|source| Error::TemplateLoad {
                    symbol,
                    path: path.display().to_string(),
                    source,
                })?
                .to_luma8();
            glyphs.insert(symbol, canonical(&img));
        }
        Ok(Self { glyphs })
    }

    /// Build a set from in-memory rasters, resizing each to the canonical
    /// size.
    pub fn from_glyphs(glyphs: impl IntoIterator<Item = (char, GrayImage)>) -> Self {
        let glyphs = glyphs
            .into_iter()
            .map(|(symbol, img)| (symbol, canonical(&img)))
            .collect();
        Self { glyphs }
    }

    pub fn get(&self, symbol: char) -> Option<&GrayImage> {
        self.glyphs.get(&symbol)
    }

    /// Templates in symbol order.
    pub fn iter(&self) -> impl Iterator<Item = (char, &GrayImage)> {
        self.glyphs.iter().map(|(&symbol, img)| (symbol, img))
    }

    pub fn len(&self) -> usize {
        self.glyphs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.glyphs.is_empty()
    }
}

/// Resize a raster to the canonical template size. Already-canonical
/// rasters are returned as copies.
pub fn canonical(img: &GrayImage) -> GrayImage {
    if img.dimensions() == (TEMPLATE_WIDTH, TEMPLATE_HEIGHT) {
        return img.clone();
    }
    imageops::resize(img, TEMPLATE_WIDTH, TEMPLATE_HEIGHT, imageops::FilterType::Triangle)
}
