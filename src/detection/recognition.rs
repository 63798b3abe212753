//! Hybrid character recognition over segmented glyphs.
//!
//! Russian plates interleave letters and digits at fixed positions. Letters
//! go through the OCR engine with a restricted alphabet, digits through
//! template correlation, and the two streams are reassembled in glyph order.

use std::collections::BTreeSet;

use image::GrayImage;
use tracing::debug;

use crate::detection::matching;
use crate::detection::ocr::GlyphOcr;
use crate::detection::templates::TemplateSet;
use crate::error::{Error, Result};

/// Emitted for a glyph that cannot be attributed to any symbol.
pub const UNKNOWN_SYMBOL: char = '?';

#[derive(Debug, Clone)]
pub struct RecognizerConfig {
    /// Glyph positions read by OCR instead of template matching. Plates in
    /// the standard series carry letters at positions 0, 4 and 5.
    pub letter_positions: BTreeSet<usize>,
    /// Correlation below this floor reads as unknown. `None` accepts the
    /// best match unconditionally.
    pub score_floor: Option<f32>,
}

impl Default for RecognizerConfig {
    fn default() -> Self {
        Self { letter_positions: BTreeSet::from([0, 4, 5]), score_floor: None }
    }
}

/// Read the plate text from segmented glyphs, left to right.
///
/// A letter glyph the OCR engine cannot read contributes nothing to the
/// output; a digit glyph always contributes a symbol, `'?'` when no template
/// clears the floor. An OCR transport failure aborts the stage.
pub fn recognize(
    glyphs: &[GrayImage],
    templates: &TemplateSet,
    ocr: &dyn GlyphOcr,
    config: &RecognizerConfig,
) -> Result<String> {
    let mut text = String::new();
    for (position, glyph) in glyphs.iter().enumerate() {
        if config.letter_positions.contains(&position) {
            let raw = ocr.read_glyph(glyph).map_err(Error::Ocr)?;
            text.push_str(fix_letter(raw.trim()));
        } else {
            text.push(match_digit(glyph, templates, config));
        }
    }
    debug!("recognized {text:?} from {} glyphs", glyphs.len());
    Ok(text)
}

/// Best correlation over the template set, gated by the optional floor.
fn match_digit(glyph: &GrayImage, templates: &TemplateSet, config: &RecognizerConfig) -> char {
    match matching::best_match(glyph, templates) {
        Some((symbol, score)) => {
            if config.score_floor.is_some_and(|floor| score < floor) {
                debug!("best match '{symbol}' at {score:.2} is below the floor");
                UNKNOWN_SYMBOL
            } else {
                symbol
            }
        }
        None => UNKNOWN_SYMBOL,
    }
}

/// Rewrite digit shapes the text recognizer confuses with letters. Letter
/// positions never hold digits, so a digit there is a misread of the
/// similarly-shaped letter.
fn fix_letter(raw: &str) -> &str {
    match raw {
        "0" => "O",
        "4" => "Y",
        "6" => "B",
        "7" => "T",
        "8" => "B",
        other => other,
    }
}
