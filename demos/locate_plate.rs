use image::ImageReader;
use platescan::detection::segmentation::{self, SegmentConfig};
use platescan::{DetectorConfig, PlateDetector};

fn main() -> anyhow::Result<()> {
    let path = std::env::args().nth(1).unwrap_or_else(|| "image.png".to_string());

    let img = ImageReader::open(&path)?
        .decode()
        .map_err(|e| anyhow::anyhow!("Failed to decode image: {}", e))?
        .to_luma8();

    println!("Locating plates in {path}...\n");

    let mut detector = PlateDetector::new(img.clone());
    match detector.locate()? {
        Some(candidate) => {
            let bbox = candidate.bbox;
            println!(
                "Located plate at ({}, {}) size {}x{} (score {})",
                bbox.x,
                bbox.y,
                bbox.w,
                bbox.h,
                candidate.score.unwrap_or_default()
            );

            let plate = detector.plate_crop(&candidate);
            let glyphs = segmentation::segment(&plate, &SegmentConfig::default())?;
            println!("  {} glyph-shaped boxes inside the plate", glyphs.len());
        }
        None => println!("No plate-shaped region found"),
    }

    // Same image with stricter candidate filtering
    println!("\n=== Stricter candidate filtering ===");
    let mut config = DetectorConfig::default();
    config.candidates.min_area = 2000.0;
    config.candidates.simplify_tolerance = 0.03;

    let mut strict = PlateDetector::with_config(img, config);
    match strict.locate()? {
        Some(candidate) => println!(
            "Still located at ({}, {}) with score {}",
            candidate.bbox.x,
            candidate.bbox.y,
            candidate.score.unwrap_or_default()
        ),
        None => println!("Nothing survives the stricter filters"),
    }

    Ok(())
}
