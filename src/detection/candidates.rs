//! Plate-region candidate extraction.
//!
//! Edge map via dual-threshold gradient detection, dilation to bridge broken
//! plate borders into closed loops, flat contour tracing, then per-boundary
//! area filtering and polygon simplification. Nested contours are kept:
//! characters visible at this stage trace as hole borders and are legitimate
//! proposals too.

use image::GrayImage;
use imageproc::contours::find_contours;
use imageproc::distance_transform::Norm;
use imageproc::edges::canny;
use imageproc::geometry::{approximate_polygon_dp, arc_length};
use imageproc::morphology::dilate;
use imageproc::point::Point;
use tracing::debug;

use crate::models::{BoundingBox, PlateCandidate};

/// Candidate extraction parameters.
#[derive(Debug, Clone)]
pub struct CandidateConfig {
    /// Lower hysteresis threshold of the edge detector.
    pub canny_low: f32,
    /// Upper hysteresis threshold of the edge detector.
    pub canny_high: f32,
    /// Dilation radius; 1 gives the 3x3 structuring element.
    pub dilation_radius: u8,
    /// Minimum enclosed area (normalized-resolution pixels) for a boundary
    /// to become a candidate.
    pub min_area: f64,
    /// Polygon simplification tolerance as a fraction of the boundary
    /// perimeter.
    pub simplify_tolerance: f64,
}

impl Default for CandidateConfig {
    fn default() -> Self {
        Self {
            canny_low: 100.0,
            canny_high: 200.0,
            dilation_radius: 1,
            min_area: 1000.0,
            simplify_tolerance: 0.02,
        }
    }
}

/// Extract region proposals from the normalized raster.
///
/// Returns the candidates (order unspecified) together with the dilated edge
/// map, which is retained for diagnostics only and never read downstream.
/// Zero surviving candidates is a valid outcome, not an error.
pub fn extract(img: &GrayImage, config: &CandidateConfig) -> (Vec<PlateCandidate>, GrayImage) {
    let edges = canny(img, config.canny_low, config.canny_high);
    let edges = dilate(&edges, Norm::LInf, config.dilation_radius);

    let contours = find_contours::<i32>(&edges);
    debug!("traced {} boundaries", contours.len());

    let mut candidates = Vec::new();
    for contour in &contours {
        let area = contour_area(&contour.points);
        if area < config.min_area {
            continue;
        }

        let polygon = simplify_boundary(&contour.points, config.simplify_tolerance);
        let Some(bbox) = BoundingBox::around_points(&polygon) else {
            continue;
        };

        candidates.push(PlateCandidate {
            aspect_ratio: bbox.aspect_ratio(),
            contour: polygon,
            bbox,
            area,
            score: None,
        });
    }
    debug!("{} candidates above area floor", candidates.len());

    (candidates, edges)
}

/// Reduce a traced boundary's vertex count while preserving its shape.
///
/// Tolerance is `fraction` of the closed-boundary perimeter; the result never
/// has more vertices than the input.
pub fn simplify_boundary(points: &[Point<i32>], fraction: f64) -> Vec<Point<i32>> {
    let epsilon = fraction * arc_length(points, true);
    approximate_polygon_dp(points, epsilon, true)
}

/// Enclosed area of a closed boundary via the shoelace formula, matching the
/// Green's-theorem area of the traced polygon.
pub fn contour_area(points: &[Point<i32>]) -> f64 {
    if points.len() < 3 {
        return 0.0;
    }
    let mut twice_area = 0i64;
    for (i, p) in points.iter().enumerate() {
        let q = &points[(i + 1) % points.len()];
        twice_area += p.x as i64 * q.y as i64 - q.x as i64 * p.y as i64;
    }
    twice_area.abs() as f64 / 2.0
}
