use image::{GrayImage, Luma};
use platescan::PlateDetector;

fn main() -> anyhow::Result<()> {
    // Dark street scene with a bright plate carrying six glyph strokes
    let mut img = GrayImage::from_pixel(800, 600, Luma([60u8]));
    for y in 380..470 {
        for x in 250..620 {
            img.put_pixel(x, y, Luma([210u8]));
        }
    }
    for stroke in 0..6u32 {
        let x0 = 280 + stroke * 55;
        for y in 400..450 {
            for x in x0..x0 + 16 {
                img.put_pixel(x, y, Luma([50u8]));
            }
        }
    }

    img.save("synthetic_plate.png")?;
    println!("Created synthetic_plate.png (800x600 grayscale)");

    let mut detector = PlateDetector::new(img);
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
        }
        None => println!("No plate found in the synthetic scene"),
    }

    Ok(())
}
