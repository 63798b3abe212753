use image::GrayImage;
use imageproc::point::Point;
use serde::Serialize;

/// Axis-aligned rectangle in raster coordinates.
///
/// Invariants: `w > 0`, `h > 0`, and `x + w`, `y + h` stay inside the raster
/// the box was derived from. Boxes are only built from traced contour points,
/// which already lie inside the raster.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BoundingBox {
    pub x: u32,
    pub y: u32,
    pub w: u32,
    pub h: u32,
}

impl BoundingBox {
    /// Tight box around a non-empty point set. Returns `None` for an empty
    /// slice or one containing negative coordinates.
    pub fn around_points(points: &[Point<i32>]) -> Option<Self> {
        let first = points.first()?;
        let (mut min_x, mut min_y) = (first.x, first.y);
        let (mut max_x, mut max_y) = (first.x, first.y);
        for p in points {
            min_x = min_x.min(p.x);
            min_y = min_y.min(p.y);
            max_x = max_x.max(p.x);
            max_y = max_y.max(p.y);
        }
        if min_x < 0 || min_y < 0 {
            return None;
        }
        Some(Self {
            x: min_x as u32,
            y: min_y as u32,
            w: (max_x - min_x + 1) as u32,
            h: (max_y - min_y + 1) as u32,
        })
    }

    pub fn aspect_ratio(&self) -> f32 {
        self.w as f32 / self.h as f32
    }

    /// Vertical center in raster coordinates.
    pub fn center_y(&self) -> f32 {
        self.y as f32 + self.h as f32 / 2.0
    }

    /// Horizontal span as `(left, right)`, right edge exclusive.
    pub fn x_range(&self) -> (u32, u32) {
        (self.x, self.x + self.w)
    }

    /// Crop this box out of `img`. The box is clamped against the raster
    /// bounds, so a box built from the same raster crops losslessly.
    pub fn crop(&self, img: &GrayImage) -> GrayImage {
        image::imageops::crop_imm(img, self.x, self.y, self.w, self.h).to_image()
    }
}

/// A geometric region proposal hypothesized to contain a license plate.
///
/// Produced by candidate extraction; immutable afterwards except that the
/// scorer attaches `score` to the winning candidate.
#[derive(Debug, Clone)]
pub struct PlateCandidate {
    /// Simplified closed boundary polygon.
    pub contour: Vec<Point<i32>>,
    /// Axis-aligned box around `contour`.
    pub bbox: BoundingBox,
    /// Enclosed area of the traced boundary, in pixels of the normalized
    /// raster (shoelace over the raw contour, not the bbox).
    pub area: f64,
    /// Bounding-box width over height.
    pub aspect_ratio: f32,
    /// Heuristic score, set by the scorer on the selected candidate.
    pub score: Option<i32>,
}

impl PlateCandidate {
    /// Vertex count of the simplified polygon.
    pub fn vertex_count(&self) -> usize {
        self.contour.len()
    }
}

/// Final output of one detection run.
#[derive(Debug, Clone)]
pub struct PlateDetection {
    /// Recognized characters in left-to-right order. May be empty when the
    /// plate crop yielded no glyph boxes.
    pub text: String,
    /// The winning region proposal, score attached.
    pub candidate: PlateCandidate,
    /// Number of glyph boxes that survived segmentation.
    pub glyph_count: usize,
}
