//! Render the digit templates used for correlation matching.
//!
//! Writes `0.png` through `9.png` at the canonical template size, black
//! digits on a white field, rasterized from a caller-supplied TTF font.

use ab_glyph::{FontVec, PxScale};
use clap::Parser;
use image::{GrayImage, Luma};
use imageproc::drawing::draw_text_mut;
use std::fs;
use std::path::PathBuf;

use platescan::{TEMPLATE_HEIGHT, TEMPLATE_WIDTH};

#[derive(Parser)]
#[command(name = "render_templates")]
#[command(about = "Render digit templates for plate recognition")]
struct Cli {
    /// TTF font to rasterize digits from
    #[arg(long, value_name = "PATH")]
    font: PathBuf,

    /// Output directory for 0.png through 9.png
    #[arg(long, value_name = "DIR", default_value = "templates")]
    out: PathBuf,
}

fn main() -> anyhow::Result<()> {
    let args = Cli::parse();

    let font_data = fs::read(&args.font)?;
    let font = FontVec::try_from_vec(font_data)
        .map_err(|e| anyhow::anyhow!("could not parse font {}: {e}", args.font.display()))?;

    fs::create_dir_all(&args.out)?;

    // Em size a touch over the canvas height fills most of the template.
    let scale = PxScale::from(TEMPLATE_HEIGHT as f32 * 1.05);
    for digit in '0'..='9' {
        let mut canvas = GrayImage::from_pixel(TEMPLATE_WIDTH, TEMPLATE_HEIGHT, Luma([255u8]));
        draw_text_mut(&mut canvas, Luma([0u8]), 3, 2, scale, &font, &digit.to_string());

        let path = args.out.join(format!("{digit}.png"));
        canvas.save(&path)?;
        println!("wrote {}", path.display());
    }

    Ok(())
}
