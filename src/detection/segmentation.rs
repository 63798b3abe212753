//! Character segmentation inside a located plate crop.
//!
//! The crop is binarized with a Gaussian-weighted adaptive threshold so that
//! glyphs survive uneven lighting across the plate, cleaned with a small
//! morphological opening, and glyph boxes are recovered from the contours of
//! the binary raster. Crops come from the binarized raster, ready for
//! template matching.

use image::{GrayImage, Luma};
use imageproc::contours::find_contours;
use imageproc::filter::gaussian_blur_f32;
use imageproc::morphology::{Mask, grayscale_open};
use tracing::debug;

use crate::error::{Error, Result};
use crate::models::BoundingBox;

/// Tuning for binarization and glyph-box filtering.
#[derive(Debug, Clone)]
pub struct SegmentConfig {
    /// Neighborhood size for the adaptive threshold. Odd, in pixels.
    pub block_size: u32,
    /// Subtracted from the local weighted mean before comparison.
    pub bias: f32,
    /// Boxes narrower than this are noise.
    pub min_width: u32,
    /// Boxes shorter than this are noise.
    pub min_height: u32,
    /// Glyphs must be taller than this fraction of the crop height.
    pub min_height_frac: f32,
    /// Glyphs must be shorter than this fraction of the crop height.
    pub max_height_frac: f32,
    /// A single glyph never spans more than this fraction of the crop width.
    pub max_width_frac: f32,
    /// Width over height ceiling. Plate glyphs are taller than wide.
    pub max_aspect: f32,
    /// Drop a box whose horizontal span overlaps an already-kept box by more
    /// than this many pixels. `None` disables the pass.
    pub overlap_suppression: Option<u32>,
}

impl Default for SegmentConfig {
    fn default() -> Self {
        Self {
            block_size: 13,
            bias: 3.0,
            min_width: 5,
            min_height: 10,
            min_height_frac: 0.35,
            max_height_frac: 0.8,
            max_width_frac: 0.5,
            max_aspect: 1.2,
            overlap_suppression: Some(10),
        }
    }
}

/// Split a plate crop into per-glyph rasters, ordered left to right.
///
/// An empty result is valid; it means the crop held nothing glyph-shaped.
pub fn segment(plate: &GrayImage, config: &SegmentConfig) -> Result<Vec<GrayImage>> {
    let (width, height) = plate.dimensions();
    if width == 0 || height == 0 {
        return Err(Error::EmptyImage { width, height });
    }

    let binary = binarize(plate, config);
    let mut boxes = glyph_boxes(&binary, config);
    boxes.sort_by_key(|b| b.x);

    if let Some(max_overlap) = config.overlap_suppression {
        let before = boxes.len();
        boxes = suppress_overlaps(boxes, max_overlap);
        if boxes.len() < before {
            debug!("overlap suppression dropped {} boxes", before - boxes.len());
        }
    }

    debug!("segmented {} glyphs from {width}x{height} crop", boxes.len());
    Ok(boxes.iter().map(|b| b.crop(&binary)).collect())
}

/// Adaptive threshold plus a 2x2 opening.
///
/// A pixel is kept at 255 when it exceeds the Gaussian-weighted mean of its
/// neighborhood minus `bias`, so dark glyphs land at 0 on a 255 background
/// regardless of the lighting gradient across the plate.
pub fn binarize(img: &GrayImage, config: &SegmentConfig) -> GrayImage {
    let local_mean = gaussian_blur_f32(img, sigma_for_block(config.block_size));

    let mut binary = GrayImage::new(img.width(), img.height());
    for (x, y, px) in img.enumerate_pixels() {
        let threshold = local_mean.get_pixel(x, y)[0] as f32 - config.bias;
        let value = if px[0] as f32 > threshold { 255 } else { 0 };
        binary.put_pixel(x, y, Luma([value]));
    }

    // Knock out bright specks smaller than the kernel.
    let kernel = GrayImage::from_pixel(2, 2, Luma([255u8]));
    grayscale_open(&binary, &Mask::from_image(&kernel, 0, 0))
}

/// Bounding boxes of glyph-shaped regions in a binarized crop.
///
/// Dark glyphs appear as holes in the white plate body, so their boxes come
/// out of the flat contour list alongside the plate's own outline. The width
/// ceiling removes that outline, the remaining filters remove bolts, border
/// fragments and lighting artifacts.
fn glyph_boxes(binary: &GrayImage, config: &SegmentConfig) -> Vec<BoundingBox> {
    let (crop_w, crop_h) = binary.dimensions();
    let contours = find_contours::<i32>(binary);
    let total = contours.len();

    let mut boxes = Vec::new();
    for contour in &contours {
        let Some(bbox) = BoundingBox::around_points(&contour.points) else {
            continue;
        };
        if bbox.w < config.min_width || bbox.h < config.min_height {
            continue;
        }
        let h_frac = bbox.h as f32 / crop_h as f32;
        if h_frac <= config.min_height_frac || h_frac >= config.max_height_frac {
            continue;
        }
        if bbox.w as f32 > config.max_width_frac * crop_w as f32 {
            continue;
        }
        if bbox.aspect_ratio() > config.max_aspect {
            continue;
        }
        boxes.push(bbox);
    }

    debug!("kept {} of {total} contours as glyph boxes", boxes.len());
    boxes
}

/// Keep the earlier of two boxes whose horizontal spans overlap by more than
/// `max_overlap` pixels. Input must be sorted by x.
fn suppress_overlaps(boxes: Vec<BoundingBox>, max_overlap: u32) -> Vec<BoundingBox> {
    let mut kept: Vec<BoundingBox> = Vec::with_capacity(boxes.len());
    for bbox in boxes {
        let collides = kept.iter().any(|k| horizontal_overlap(k, &bbox) > max_overlap);
        if !collides {
            kept.push(bbox);
        }
    }
    kept
}

fn horizontal_overlap(a: &BoundingBox, b: &BoundingBox) -> u32 {
    let (a_lo, a_hi) = a.x_range();
    let (b_lo, b_hi) = b.x_range();
    a_hi.min(b_hi).saturating_sub(a_lo.max(b_lo))
}

// OpenCV's getGaussianKernel sigma for a given aperture, so block_size keeps
// its usual adaptive-threshold meaning.
fn sigma_for_block(block_size: u32) -> f32 {
    0.3 * ((block_size as f32 - 1.0) * 0.5 - 1.0) + 0.8
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Luma;

    /// White 160x60 plate crop with `bars` dark vertical strokes, 8 px wide
    /// and 30 px tall, starting at x = 14 on a 22 px pitch.
    fn striped_plate(bars: u32) -> GrayImage {
        let mut img = GrayImage::from_pixel(160, 60, Luma([220u8]));
        for bar in 0..bars {
            let x0 = 14 + bar * 22;
            for y in 15..45 {
                for x in x0..x0 + 8 {
                    img.put_pixel(x, y, Luma([30u8]));
                }
            }
        }
        img
    }

    #[test]
    fn binarize_separates_strokes_from_background() {
        let img = striped_plate(3);
        let binary = binarize(&img, &SegmentConfig::default());

        // Stroke interiors go to 0, plain background stays at 255.
        assert_eq!(binary.get_pixel(18, 30)[0], 0);
        assert_eq!(binary.get_pixel(18 + 22, 30)[0], 0);
        assert_eq!(binary.get_pixel(120, 10)[0], 255);
        assert_eq!(binary.get_pixel(5, 55)[0], 255);
    }

    #[test]
    fn strokes_come_back_as_ordered_crops() {
        let img = striped_plate(6);
        let glyphs = segment(&img, &SegmentConfig::default()).unwrap();

        assert_eq!(glyphs.len(), 6);
        for glyph in &glyphs {
            // Stroke box plus the traced white ring around it.
            assert!(glyph.width() >= 8 && glyph.width() <= 12, "width {}", glyph.width());
            assert!(glyph.height() >= 30 && glyph.height() <= 34, "height {}", glyph.height());
            assert!(glyph.pixels().any(|p| p[0] == 0));
            assert!(glyph.pixels().any(|p| p[0] == 255));
        }
    }

    #[test]
    fn crops_follow_left_to_right_order() {
        // Bars of descending height drawn left to right.
        let mut img = GrayImage::from_pixel(160, 60, Luma([220u8]));
        for (i, h) in [30u32, 26, 22].into_iter().enumerate() {
            let x0 = 20 + i as u32 * 40;
            for y in 15..15 + h {
                for x in x0..x0 + 8 {
                    img.put_pixel(x, y, Luma([30u8]));
                }
            }
        }

        let glyphs = segment(&img, &SegmentConfig::default()).unwrap();
        assert_eq!(glyphs.len(), 3);

        let heights: Vec<u32> = glyphs.iter().map(|g| g.height()).collect();
        assert!(
            heights[0] > heights[1] && heights[1] > heights[2],
            "crop order does not follow x: {heights:?}"
        );
    }

    #[test]
    fn blank_crop_segments_to_nothing() {
        let img = GrayImage::from_pixel(160, 60, Luma([220u8]));
        let glyphs = segment(&img, &SegmentConfig::default()).unwrap();
        assert!(glyphs.is_empty());
    }

    #[test]
    fn zero_sized_crop_is_rejected() {
        let img = GrayImage::new(0, 0);
        assert!(matches!(
            segment(&img, &SegmentConfig::default()),
            Err(Error::EmptyImage { .. })
        ));
    }

    #[test]
    fn short_and_tall_regions_are_filtered() {
        let mut img = striped_plate(2);
        // A bolt-sized dot and a stroke spanning nearly the full height.
        for y in 28..33 {
            for x in 100..105 {
                img.put_pixel(x, y, Luma([30u8]));
            }
        }
        for y in 2..58 {
            for x in 130..138 {
                img.put_pixel(x, y, Luma([30u8]));
            }
        }

        let glyphs = segment(&img, &SegmentConfig::default()).unwrap();
        assert_eq!(glyphs.len(), 2, "only the two plate-sized strokes survive");
    }

    #[test]
    fn overlapping_boxes_keep_the_earlier_one() {
        let a = BoundingBox { x: 20, y: 10, w: 20, h: 30 };
        let b = BoundingBox { x: 25, y: 12, w: 20, h: 30 };
        let c = BoundingBox { x: 60, y: 10, w: 20, h: 30 };

        let kept = suppress_overlaps(vec![a, b, c], 10);
        assert_eq!(kept, vec![a, c]);

        // Disjoint spans stay untouched.
        let kept = suppress_overlaps(vec![a, c], 10);
        assert_eq!(kept, vec![a, c]);
    }
}
