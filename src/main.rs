use clap::Parser;
use image::ImageReader;
use imageproc::drawing::{draw_hollow_rect_mut, draw_line_segment_mut};
use imageproc::rect::Rect;
use serde::Serialize;
use std::path::{Path, PathBuf};

use platescan::{
    BoundingBox, DetectorConfig, OcrsGlyphReader, PlateCandidate, PlateDetector, TemplateSet,
};

#[derive(Parser)]
#[command(name = "platescan")]
#[command(about = "Locate and read vehicle license plates in photographs")]
struct Cli {
    /// Path to input image file
    #[arg(value_name = "IMAGE")]
    image_path: PathBuf,

    /// Directory with digit templates (0.png through 9.png)
    #[arg(long, value_name = "DIR")]
    templates: Option<PathBuf>,

    /// Stop after locating the plate, skip segmentation and recognition
    #[arg(long)]
    no_recognize: bool,

    /// Minimum template correlation; weaker digit matches read as '?'
    #[arg(long, value_name = "SCORE")]
    score_floor: Option<f32>,

    /// Glyph positions read by OCR instead of template matching
    #[arg(long, value_name = "POS", value_delimiter = ',')]
    letter_positions: Option<Vec<usize>>,

    /// Print the detection report as JSON
    #[arg(long)]
    json: bool,

    /// Draw the located plate on the input image and save it here
    #[arg(long, value_name = "PATH")]
    annotate: Option<PathBuf>,

    /// Save stage snapshots to directory
    #[arg(long, value_name = "DIR")]
    debug_out: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Serialize)]
struct Report {
    source: String,
    located: bool,
    scale: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    bbox: Option<BoundingBox>,
    #[serde(skip_serializing_if = "Option::is_none")]
    score: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    glyph_count: Option<usize>,
}

fn main() -> anyhow::Result<()> {
    let args = Cli::parse();
    init_tracing(args.verbose);

    let img = ImageReader::open(&args.image_path)?
        .decode()
        .map_err(|e| anyhow::anyhow!("Failed to decode image: {}", e))?
        .to_luma8();

    let mut config = DetectorConfig::default();
    if let Some(floor) = args.score_floor {
        config.recognize.score_floor = Some(floor);
    }
    if let Some(positions) = &args.letter_positions {
        config.recognize.letter_positions = positions.iter().copied().collect();
    }

    let mut detector = PlateDetector::with_config(img, config);
    if let Some(dir) = &args.debug_out {
        detector = detector.with_snapshot_dir(dir);
    }

    if args.no_recognize {
        let candidate = detector.locate()?;
        if let (Some(c), Some(out)) = (&candidate, &args.annotate) {
            annotate_original(&args.image_path, c, detector.scale(), out)?;
        }

        if args.json {
            let report = Report {
                source: args.image_path.display().to_string(),
                located: candidate.is_some(),
                scale: detector.scale(),
                bbox: candidate.as_ref().map(|c| c.bbox),
                score: candidate.as_ref().and_then(|c| c.score),
                text: None,
                glyph_count: None,
            };
            println!("{}", serde_json::to_string_pretty(&report)?);
        } else {
            println!("\n=== Plate Location Results ===");
            match &candidate {
                Some(c) => println!(
                    "Plate region at ({}, {}) size {}x{} (score {})",
                    c.bbox.x,
                    c.bbox.y,
                    c.bbox.w,
                    c.bbox.h,
                    c.score.unwrap_or_default()
                ),
                None => println!("No plate-shaped region found."),
            }
        }
        return Ok(());
    }

    let templates = match &args.templates {
        Some(dir) => TemplateSet::load_dir(dir)?,
        None => TemplateSet::default(),
    };
    if templates.is_empty() {
        tracing::warn!("no digit templates loaded, digit positions will read as '?'");
    }

    let ocr = OcrsGlyphReader::from_cache()?;
    let detection = detector.detect(&templates, &ocr)?;

    if let (Some(d), Some(out)) = (&detection, &args.annotate) {
        annotate_original(&args.image_path, &d.candidate, detector.scale(), out)?;
    }

    if args.json {
        let report = Report {
            source: args.image_path.display().to_string(),
            located: detection.is_some(),
            scale: detector.scale(),
            bbox: detection.as_ref().map(|d| d.candidate.bbox),
            score: detection.as_ref().and_then(|d| d.candidate.score),
            text: detection.as_ref().map(|d| d.text.clone()),
            glyph_count: detection.as_ref().map(|d| d.glyph_count),
        };
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("\n=== Plate Detection Results ===");
        match &detection {
            Some(d) => {
                let bbox = d.candidate.bbox;
                println!(
                    "Plate '{}' at ({}, {}) size {}x{} ({} glyphs)",
                    d.text, bbox.x, bbox.y, bbox.w, bbox.h, d.glyph_count
                );
            }
            None => println!("No plate detected."),
        }
    }

    Ok(())
}

fn init_tracing(verbose: bool) {
    let default_filter = if verbose { "platescan=debug" } else { "platescan=info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_filter)),
        )
        .init();
}

/// Draw the located plate on the untouched input image: traced boundary in
/// red, bounding box in green. Working-raster coordinates are mapped back
/// through the normalization scale.
fn annotate_original(
    image_path: &Path,
    candidate: &PlateCandidate,
    scale: f32,
    out: &Path,
) -> anyhow::Result<()> {
    let mut canvas = ImageReader::open(image_path)?.decode()?.to_rgb8();

    let red = image::Rgb([255u8, 0, 0]);
    let contour = &candidate.contour;
    for (i, p) in contour.iter().enumerate() {
        let q = &contour[(i + 1) % contour.len()];
        draw_line_segment_mut(
            &mut canvas,
            (p.x as f32 / scale, p.y as f32 / scale),
            (q.x as f32 / scale, q.y as f32 / scale),
            red,
        );
    }

    let bbox = candidate.bbox;
    let x = (bbox.x as f32 / scale).round() as i32;
    let y = (bbox.y as f32 / scale).round() as i32;
    let w = (bbox.w as f32 / scale).round() as u32;
    let h = (bbox.h as f32 / scale).round() as u32;

    let green = image::Rgb([0u8, 255, 0]);
    for inset in 0..3i32 {
        let rect = Rect::at(x - inset, y - inset).of_size(w + 2 * inset as u32, h + 2 * inset as u32);
        draw_hollow_rect_mut(&mut canvas, rect, green);
    }

    canvas.save(out)?;
    println!("Annotated image saved to {}", out.display());
    Ok(())
}
