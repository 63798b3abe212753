pub mod detection;
pub mod error;
pub mod models;

pub use detection::{DetectorConfig, PlateDetector};
pub use detection::ocr::{ALLOWED_CHARS, GlyphOcr, OcrsGlyphReader};
pub use detection::recognition::UNKNOWN_SYMBOL;
pub use detection::templates::{TEMPLATE_HEIGHT, TEMPLATE_WIDTH, TemplateSet};
pub use error::{Error, Result};
pub use models::{BoundingBox, PlateCandidate, PlateDetection};
