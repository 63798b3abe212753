mod common;

use common::*;
use image::{GrayImage, Luma};

/// A 4K scene whose plate sits at (1600, 1400) with size 800x192. The
/// working raster halves both axes, so the located box must map back
/// through the scale factor.
fn oversized_scene() -> GrayImage {
    let mut img = GrayImage::from_pixel(3840, 2160, Luma([60u8]));
    for y in 1400..1592 {
        for x in 1600..2400 {
            img.put_pixel(x, y, Luma([210u8]));
        }
    }
    img
}

#[test]
fn oversized_input_downscales_and_maps_back() {
    let mut detector = PlateDetector::new(oversized_scene());

    let located = detector
        .locate()
        .expect("locate should run")
        .expect("plate should be located");

    let scale = detector.scale();
    assert!((scale - 0.5).abs() < 1e-6);

    // Working-raster coordinates land on the halved plate.
    let bbox = located.bbox;
    assert!((790..=805).contains(&bbox.x));
    assert!((690..=705).contains(&bbox.y));
    assert!((395..=415).contains(&bbox.w));
    assert!((90..=110).contains(&bbox.h));
    assert_eq!(located.score, Some(11));

    // Dividing by the scale factor recovers the original placement.
    let left = bbox.x as f32 / scale;
    let top = bbox.y as f32 / scale;
    let right = (bbox.x + bbox.w) as f32 / scale;
    assert!((1580.0..=1610.0).contains(&left));
    assert!((1380.0..=1410.0).contains(&top));
    assert!((2390.0..=2420.0).contains(&right));
}

#[test]
fn native_resolution_input_keeps_unit_scale() {
    let mut detector = PlateDetector::new(plate_scene());

    let located = detector
        .locate()
        .expect("locate should run")
        .expect("plate should be located");

    assert_eq!(detector.scale(), 1.0);
    assert!(detector.edge_map().is_some());

    let crop = detector.plate_crop(&located);
    assert!((PLATE_WIDTH - 10..=PLATE_WIDTH + 10).contains(&crop.width()));
    assert!((PLATE_HEIGHT - 10..=PLATE_HEIGHT + 10).contains(&crop.height()));
}
