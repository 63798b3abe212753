use std::cell::RefCell;
use std::collections::VecDeque;

use image::{GrayImage, Luma};
use platescan::{GlyphOcr, TemplateSet};

/// Plate placement inside [`plate_scene`].
pub const PLATE_LEFT: u32 = 140;
pub const PLATE_TOP: u32 = 300;
pub const PLATE_WIDTH: u32 = 240;
pub const PLATE_HEIGHT: u32 = 52;

/// Stroke design size before the one pixel white margin is added.
pub const STROKE_WIDTH: u32 = 12;
pub const STROKE_HEIGHT: u32 = 30;

/// Synthetic stroke designs. Every dark feature is at most six pixels
/// wide so adaptive thresholding keeps it solid, and the three shapes
/// correlate weakly with each other.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StrokeKind {
    /// Two vertical bars joined at the bottom, thick on the left.
    Trough,
    /// Two thin vertical bars joined by a middle band.
    Bridge,
    /// Two vertical bars joined at the top, thick on the right.
    Arch,
}

fn stroke_cell(kind: StrokeKind, x: u32, y: u32) -> bool {
    match kind {
        StrokeKind::Trough => x < 6 || x >= 9 || y >= 27,
        StrokeKind::Bridge => x < 3 || x >= 9 || (13..17).contains(&y),
        StrokeKind::Arch => x < 3 || x >= 6 || y < 3,
    }
}

/// Renders a stroke design as a dark-on-white panel, the form template
/// matching expects.
pub fn stroke_pattern(kind: StrokeKind) -> GrayImage {
    let mut panel = GrayImage::from_pixel(STROKE_WIDTH + 2, STROKE_HEIGHT + 2, Luma([255u8]));
    for y in 0..STROKE_HEIGHT {
        for x in 0..STROKE_WIDTH {
            if stroke_cell(kind, x, y) {
                panel.put_pixel(x + 1, y + 1, Luma([0u8]));
            }
        }
    }
    panel
}

/// Paints a stroke design into a scene at the given top-left corner.
pub fn paint_stroke(img: &mut GrayImage, left: u32, top: u32, kind: StrokeKind) {
    for y in 0..STROKE_HEIGHT {
        for x in 0..STROKE_WIDTH {
            if stroke_cell(kind, x, y) {
                img.put_pixel(left + x, top + y, Luma([50u8]));
            }
        }
    }
}

/// Digit templates built from the stroke designs: '1' is the trough,
/// '2' the bridge, '3' the arch.
pub fn stroke_templates() -> TemplateSet {
    TemplateSet::from_glyphs([
        ('1', stroke_pattern(StrokeKind::Trough)),
        ('2', stroke_pattern(StrokeKind::Bridge)),
        ('3', stroke_pattern(StrokeKind::Arch)),
    ])
}

/// A 640x480 scene with a bright plate on a dark background. The plate
/// carries six strokes; the digit slots (positions 1 to 3) hold the
/// trough, bridge and arch designs in template order.
pub fn plate_scene() -> GrayImage {
    let mut img = GrayImage::from_pixel(640, 480, Luma([60u8]));
    for y in PLATE_TOP..PLATE_TOP + PLATE_HEIGHT {
        for x in PLATE_LEFT..PLATE_LEFT + PLATE_WIDTH {
            img.put_pixel(x, y, Luma([210u8]));
        }
    }
    let designs = [
        StrokeKind::Bridge,
        StrokeKind::Trough,
        StrokeKind::Bridge,
        StrokeKind::Arch,
        StrokeKind::Trough,
        StrokeKind::Arch,
    ];
    for (i, kind) in designs.into_iter().enumerate() {
        paint_stroke(&mut img, 160 + 34 * i as u32, PLATE_TOP + 11, kind);
    }
    img
}

/// An OCR stand-in that replays scripted replies in order and reads
/// nothing once the script runs out.
pub struct QueueOcr {
    replies: RefCell<VecDeque<String>>,
}

impl QueueOcr {
    pub fn new<I, S>(replies: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            replies: RefCell::new(replies.into_iter().map(Into::into).collect()),
        }
    }
}

impl GlyphOcr for QueueOcr {
    fn read_glyph(&self, _glyph: &GrayImage) -> anyhow::Result<String> {
        Ok(self.replies.borrow_mut().pop_front().unwrap_or_default())
    }
}
