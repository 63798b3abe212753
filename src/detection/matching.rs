//! Zero-mean normalized cross-correlation against the template set.

use image::GrayImage;

use crate::detection::templates::{self, TemplateSet};

/// Correlation between two equal-sized rasters, in `[-1, 1]`.
///
/// Both inputs are mean-centered first, so uniform brightness offsets do not
/// move the score. A raster with no variance correlates with nothing and
/// scores 0.
pub fn zncc(a: &GrayImage, b: &GrayImage) -> f32 {
    debug_assert_eq!(a.dimensions(), b.dimensions());

    let n = (a.width() * a.height()) as f64;
    if n == 0.0 {
        return 0.0;
    }

    let mean_a = a.pixels().map(|p| p[0] as f64).sum::<f64>() / n;
    let mean_b = b.pixels().map(|p| p[0] as f64).sum::<f64>() / n;

    let mut cov = 0.0;
    let mut var_a = 0.0;
    let mut var_b = 0.0;
    for (pa, pb) in a.pixels().zip(b.pixels()) {
        let da = pa[0] as f64 - mean_a;
        let db = pb[0] as f64 - mean_b;
        cov += da * db;
        var_a += da * da;
        var_b += db * db;
    }

    let denom = (var_a * var_b).sqrt();
    if denom < 1e-6 {
        return 0.0;
    }
    ((cov / denom) as f32).clamp(-1.0, 1.0)
}

/// Best-correlating template for a glyph raster.
///
/// The glyph is resized to the canonical template size, then every template
/// is scored in symbol order; a strictly greater score replaces the running
/// best, so ties resolve to the earlier symbol. `None` means the set was
/// empty.
pub fn best_match(glyph: &GrayImage, templates: &TemplateSet) -> Option<(char, f32)> {
    let probe = templates::canonical(glyph);

    let mut best: Option<(char, f32)> = None;
    for (symbol, tmpl) in templates.iter() {
        let score = zncc(&probe, tmpl);
        if best.is_none_or(|(_, s)| score > s) {
            best = Some((symbol, score));
        }
    }
    best
}
