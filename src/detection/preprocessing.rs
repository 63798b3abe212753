//! Exposure and scale normalization of the input raster.
//!
//! Three steps, applied in order: tile-local contrast enhancement (CLAHE),
//! edge-preserving bilateral smoothing, and a bounded downscale-only resize
//! to the target resolution. The raster is replaced wholesale; no partial
//! pixel mutation is visible outside this stage.

use image::{GrayImage, imageops};
use imageproc::filter::bilateral_filter;
use tracing::debug;

/// Preprocessor parameters.
#[derive(Debug, Clone)]
pub struct PreprocessConfig {
    /// Histogram clip limit for tile-local equalization.
    pub clip_limit: f32,
    /// Tile grid as (columns, rows).
    pub tile_grid: (u32, u32),
    /// Target resolution the raster is shrunk to fit, width.
    pub target_width: u32,
    /// Target resolution the raster is shrunk to fit, height.
    pub target_height: u32,
    /// Bilateral filter window size in pixels.
    pub bilateral_window: u32,
    /// Bilateral intensity sigma.
    pub sigma_color: f32,
    /// Bilateral spatial sigma.
    pub sigma_spatial: f32,
}

impl Default for PreprocessConfig {
    fn default() -> Self {
        Self {
            clip_limit: 3.0,
            tile_grid: (8, 8),
            target_width: 1920,
            target_height: 1080,
            bilateral_window: 3,
            sigma_color: 25.0,
            sigma_spatial: 75.0,
        }
    }
}

/// Normalize exposure and scale. Returns the replacement raster and the
/// applied scale factor (1.0 when the raster was already at or below the
/// target resolution).
pub fn normalize(img: &GrayImage, config: &PreprocessConfig) -> (GrayImage, f32) {
    let enhanced = clahe(img, config.tile_grid, config.clip_limit);
    let smoothed = bilateral_filter(
        &enhanced,
        config.bilateral_window,
        config.sigma_color,
        config.sigma_spatial,
    );
    resize_to_target(&smoothed, config.target_width, config.target_height)
}

/// Contrast-limited adaptive histogram equalization.
///
/// Each tile of the grid gets its own clipped-histogram equalization lookup
/// table; output pixels bilinearly blend the tables of the four surrounding
/// tile centers, which keeps tile borders seam-free.
pub fn clahe(img: &GrayImage, tile_grid: (u32, u32), clip_limit: f32) -> GrayImage {
    let (w, h) = img.dimensions();
    let (grid_x, grid_y) = (tile_grid.0.max(1), tile_grid.1.max(1));
    if w == 0 || h == 0 {
        return img.clone();
    }

    let tile_w = w.div_ceil(grid_x).max(1);
    let tile_h = h.div_ceil(grid_y).max(1);
    let cols = w.div_ceil(tile_w);
    let rows = h.div_ceil(tile_h);

    // One equalization LUT per tile.
    let mut luts = vec![[0u8; 256]; (cols * rows) as usize];
    for ty in 0..rows {
        for tx in 0..cols {
            let x0 = tx * tile_w;
            let y0 = ty * tile_h;
            let x1 = (x0 + tile_w).min(w);
            let y1 = (y0 + tile_h).min(h);

            let mut hist = [0u32; 256];
            for y in y0..y1 {
                for x in x0..x1 {
                    hist[img.get_pixel(x, y)[0] as usize] += 1;
                }
            }
            let n = (x1 - x0) * (y1 - y0);
            clip_histogram(&mut hist, clip_limit, n);

            let lut = &mut luts[(ty * cols + tx) as usize];
            let mut cdf = 0u32;
            for (v, count) in hist.iter().enumerate() {
                cdf += count;
                lut[v] = ((cdf as f32 * 255.0 / n as f32).round() as u32).min(255) as u8;
            }
        }
    }

    // Blend between the four nearest tile LUTs per pixel. Pixels outside the
    // outermost tile centers clamp to the border tile instead of blending.
    let mut out = GrayImage::new(w, h);
    for y in 0..h {
        let fy = (y as f32 + 0.5) / tile_h as f32 - 0.5;
        let (ty0, ty1, wy) = tile_span(fy, rows);

        for x in 0..w {
            let fx = (x as f32 + 0.5) / tile_w as f32 - 0.5;
            let (tx0, tx1, wx) = tile_span(fx, cols);

            let v = img.get_pixel(x, y)[0] as usize;
            let tl = luts[(ty0 * cols + tx0) as usize][v] as f32;
            let tr = luts[(ty0 * cols + tx1) as usize][v] as f32;
            let bl = luts[(ty1 * cols + tx0) as usize][v] as f32;
            let br = luts[(ty1 * cols + tx1) as usize][v] as f32;

            let top = tl + (tr - tl) * wx;
            let bottom = bl + (br - bl) * wx;
            let blended = top + (bottom - top) * wy;
            out.put_pixel(x, y, image::Luma([blended.round().clamp(0.0, 255.0) as u8]));
        }
    }
    out
}

/// Indices of the two tile centers bracketing tile-space coordinate `f`,
/// plus the blend weight toward the second.
fn tile_span(f: f32, count: u32) -> (u32, u32, f32) {
    if f <= 0.0 || count == 1 {
        return (0, 0, 0.0);
    }
    let i0 = f.floor() as u32;
    if i0 >= count - 1 {
        return (count - 1, count - 1, 0.0);
    }
    (i0, i0 + 1, f - i0 as f32)
}

/// Clip histogram bins at `clip_limit` times the uniform bin height and
/// spread the excess evenly over all bins, bounding noise amplification.
fn clip_histogram(hist: &mut [u32; 256], clip_limit: f32, pixels: u32) {
    let threshold = ((clip_limit * pixels as f32 / 256.0).ceil() as u32).max(1);
    let mut excess = 0u32;
    for bin in hist.iter_mut() {
        if *bin > threshold {
            excess += *bin - threshold;
            *bin = threshold;
        }
    }
    let share = excess / 256;
    let mut remainder = excess % 256;
    for bin in hist.iter_mut() {
        *bin += share;
        if remainder > 0 {
            *bin += 1;
            remainder -= 1;
        }
    }
}

/// Shrink the raster to fit inside `target_w` x `target_h`, preserving
/// aspect ratio with cubic interpolation. Rasters already at or below the
/// target stay untouched; this stage never upscales.
pub fn resize_to_target(img: &GrayImage, target_w: u32, target_h: u32) -> (GrayImage, f32) {
    let (w, h) = img.dimensions();
    if w == 0 || h == 0 {
        return (img.clone(), 1.0);
    }

    let scale = (target_w as f32 / w as f32).min(target_h as f32 / h as f32);
    if scale >= 1.0 {
        debug!("raster {}x{} within target, no resize", w, h);
        return (img.clone(), 1.0);
    }

    let new_w = ((w as f32 * scale) as u32).max(1);
    let new_h = ((h as f32 * scale) as u32).max(1);
    debug!("resizing {}x{} -> {}x{} (scale {:.3})", w, h, new_w, new_h, scale);
    let resized = imageops::resize(img, new_w, new_h, imageops::FilterType::CatmullRom);
    (resized, scale)
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Horizontal gradient confined to a narrow band of gray levels.
    fn low_contrast_gradient(w: u32, h: u32, lo: u8, hi: u8) -> GrayImage {
        GrayImage::from_fn(w, h, |x, _| {
            let t = x as f32 / (w - 1) as f32;
            image::Luma([(lo as f32 + t * (hi - lo) as f32) as u8])
        })
    }

    fn value_range(img: &GrayImage) -> (u8, u8) {
        let mut min = u8::MAX;
        let mut max = u8::MIN;
        for p in img.pixels() {
            min = min.min(p[0]);
            max = max.max(p[0]);
        }
        (min, max)
    }

    #[test]
    fn clahe_stretches_low_contrast() {
        let img = low_contrast_gradient(160, 120, 100, 140);
        let out = clahe(&img, (8, 8), 3.0);
        assert_eq!(out.dimensions(), img.dimensions());

        let (before_min, before_max) = value_range(&img);
        let (after_min, after_max) = value_range(&out);
        assert!(
            (after_max - after_min) > (before_max - before_min),
            "contrast not stretched: {}..{} -> {}..{}",
            before_min,
            before_max,
            after_min,
            after_max
        );
    }

    #[test]
    fn clahe_is_deterministic() {
        let img = low_contrast_gradient(96, 64, 60, 200);
        assert_eq!(clahe(&img, (8, 8), 3.0), clahe(&img, (8, 8), 3.0));
    }

    #[test]
    fn resize_never_upscales() {
        let img = GrayImage::from_pixel(640, 480, image::Luma([128]));
        let (out, scale) = resize_to_target(&img, 1920, 1080);
        assert_eq!(scale, 1.0);
        assert_eq!(out.dimensions(), (640, 480));
    }

    #[test]
    fn resize_shrinks_preserving_aspect() {
        let img = GrayImage::from_pixel(3840, 2160, image::Luma([128]));
        let (out, scale) = resize_to_target(&img, 1920, 1080);
        assert!((scale - 0.5).abs() < 1e-6);
        assert_eq!(out.dimensions(), (1920, 1080));
    }

    #[test]
    fn resize_exact_target_is_noop() {
        let img = GrayImage::from_pixel(1920, 1080, image::Luma([50]));
        let (out, scale) = resize_to_target(&img, 1920, 1080);
        assert_eq!(scale, 1.0);
        assert_eq!(out.dimensions(), (1920, 1080));
    }

    #[test]
    fn normalize_keeps_small_raster_dimensions() {
        let img = low_contrast_gradient(320, 80, 90, 150);
        let cfg = PreprocessConfig::default();
        let (out, scale) = normalize(&img, &cfg);
        assert_eq!(scale, 1.0);
        assert_eq!(out.dimensions(), (320, 80));
    }
}
