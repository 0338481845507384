//! Integration tests for panel segmentation.

mod common;

use common::*;
use scanlate::detection::PanelDetector;
use scanlate::detection::contours::external_bounding_rects;
use scanlate::PipelineStep;
use scanlate::detection::steps::DilateStep;

#[test]
fn test_two_frames_give_two_panels() {
    let frames = [Rect::new(30, 30, 250, 250), Rect::new(320, 320, 250, 250)];
    let page = page_with_frames(600, 600, &frames);

    let mut panels = PanelDetector::default().detect(&page);
    panels.sort_by_key(|p| (p.rect.y, p.rect.x));

    assert_eq!(panels.len(), 2);
    for (panel, frame) in panels.iter().zip(frames.iter()) {
        // Blur and dilation may widen the frame by a few pixels
        assert!(panel.rect.expand(3, 3).contains(frame));
        assert!(frame.expand(8, 8).contains(&panel.rect));
    }
}

#[test]
fn test_blank_page_has_no_panels() {
    let page = blank_page(400, 400, WHITE);
    assert!(PanelDetector::default().detect(&page).is_empty());
}

#[test]
fn test_small_frames_are_filtered_by_min_area() {
    let page = page_with_frames(400, 400, &[Rect::new(50, 50, 100, 100)]);

    assert!(PanelDetector::default().detect(&page).is_empty());

    let lenient = PanelDetector::new(PanelConfig {
        min_area: 5_000,
        ..PanelConfig::default()
    });
    assert_eq!(lenient.detect(&page).len(), 1);
}

#[test]
fn test_contours_report_outer_bounds_only() {
    let mut mask = image::GrayImage::new(100, 100);
    // Ring with a hole, plus a blob inside the hole
    for y in 10..90 {
        for x in 10..90 {
            let on_ring = !(15..85).contains(&x) || !(15..85).contains(&y);
            let in_blob = (40..60).contains(&x) && (40..60).contains(&y);
            if on_ring || in_blob {
                mask.put_pixel(x, y, image::Luma([255]));
            }
        }
    }

    let rects = external_bounding_rects(&mask);

    assert_eq!(rects, vec![Rect::new(10, 10, 80, 80)]);
}

#[test]
fn test_zero_dilation_is_identity() {
    let page = page_with_frames(200, 200, &[Rect::new(20, 20, 150, 150)]);
    let gray = page.to_luma8();
    assert_eq!(DilateStep { radius: 0 }.process(gray.clone()), gray);
}

#[test]
fn test_dilation_grows_a_single_pixel_into_a_square() {
    let mut edges = image::GrayImage::new(21, 21);
    edges.put_pixel(10, 10, image::Luma([255]));

    let grown = DilateStep { radius: 2 }.process(edges);

    let lit: Vec<(u32, u32)> = grown
        .enumerate_pixels()
        .filter(|(_, _, p)| p.0[0] == 255)
        .map(|(x, y, _)| (x, y))
        .collect();
    assert_eq!(lit.len(), 25);
    assert!(lit.iter().all(|&(x, y)| (8..=12).contains(&x) && (8..=12).contains(&y)));
}
