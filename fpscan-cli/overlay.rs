//! Side-by-side rendering of the sample and the best candidate with their
//! accepted correspondences joined by lines.

use fpscan_core::{ImageBuffer, MatchResult};
use image::imageops::{self, FilterType};
use image::{Rgb, RgbImage};
use imageproc::drawing::{draw_hollow_circle_mut, draw_line_segment_mut};

use crate::config::OverlayConfig;

fn gray_to_rgb(img: &ImageBuffer) -> RgbImage {
    RgbImage::from_fn(img.width() as u32, img.height() as u32, |x, y| {
        let v = img.get(x as usize, y as usize);
        Rgb([v, v, v])
    })
}

/// Sample on the left, best candidate on the right, then upscaled by
/// `cfg.scale`. Only accepted matches are drawn; unmatched keypoints are not.
pub fn render_overlay(sample: &ImageBuffer, best: &MatchResult, cfg: &OverlayConfig) -> RgbImage {
    let candidate = &best.candidate_image;
    let offset = sample.width() as u32;
    let width = offset + candidate.width() as u32;
    let height = sample.height().max(candidate.height()) as u32;

    let mut canvas = RgbImage::new(width, height);
    imageops::replace(&mut canvas, &gray_to_rgb(sample), 0, 0);
    imageops::replace(&mut canvas, &gray_to_rgb(candidate), offset as i64, 0);

    let line = Rgb(cfg.line_color);
    let point = Rgb(cfg.point_color);
    for ((sx, sy), (cx, cy)) in best.match_segments() {
        let end = (cx + offset as f32, cy);
        draw_line_segment_mut(&mut canvas, (sx, sy), end, line);
        draw_hollow_circle_mut(&mut canvas, (sx.round() as i32, sy.round() as i32), cfg.point_radius, point);
        draw_hollow_circle_mut(&mut canvas, (end.0.round() as i32, end.1.round() as i32), cfg.point_radius, point);
    }

    if cfg.scale > 1 {
        imageops::resize(&canvas, width * cfg.scale, height * cfg.scale, FilterType::Nearest)
    } else {
        canvas
    }
}
