// SPDX-License-Identifier: AGPL-3.0-only
// Copyright (C) 2024 Jonathan Lee
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License version 3
// as published by the Free Software Foundation.
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.
// See the GNU Affero General Public License for more details.
// You should have received a copy of the GNU Affero General Public License
// along with this program. If not, see https://www.gnu.org/licenses/.

//! Mark-type hint from a rendered chart image.
//!
//! Three non-learned tests run in order: filled rectangles (bar), a circular
//! outline (arc), a long straight edge (line). Anything undecided, including
//! bytes that do not decode, is a bar.

use crate::chart::MarkType;
use image::imageops::FilterType;
use image::{DynamicImage, GrayImage};
use rayon::prelude::*;
use tracing::debug;
pub const MAX_SIDE: u32 = 512;
const FOREGROUND_LUMA: u8 = 200;
const MIN_COMPONENT_FRACTION: f64 = 0.002;
const RECTANGLE_FILL: f64 = 0.85;
const MIN_RECTANGLES: usize = 3;
const RECTANGLE_SHARE: f64 = 0.4;
const EDGE_MAGNITUDE: f64 = 150.0;
const ARC_COVERAGE: f64 = 0.55;
const RADIUS_TOLERANCE: f64 = 1.5;
const MIN_LINE_VOTES: usize = 100;
pub fn detect_mark(bytes: &[u8]) -> MarkType {
    match image::load_from_memory(bytes) {
        Ok(decoded) => classify_image(&prepare(decoded)),
        Err(err) => {
            debug!(error = %err, "image did not decode, defaulting to bar");
            MarkType::Bar
        }
    }
}
/// Grayscale, no larger than [`MAX_SIDE`] on either side.
pub fn prepare(image: DynamicImage) -> GrayImage {
    let image = if image.width() > MAX_SIDE || image.height() > MAX_SIDE {
        image.resize(MAX_SIDE, MAX_SIDE, FilterType::Triangle)
    } else {
        image
    };
    image.to_luma8()
}
pub fn classify_image(gray: &GrayImage) -> MarkType {
    let (width, height) = gray.dimensions();
    if width < 8 || height < 8 {
        return MarkType::Bar;
    }
    let shapes = ShapeCensus::measure(gray);
    debug!(
        components = shapes.components,
        rectangles = shapes.rectangles,
        "foreground components"
    );
    if shapes.looks_like_bars() {
        return MarkType::Bar;
    }
    let edges = sobel_edges(gray);
    if edges.is_empty() {
        return MarkType::Bar;
    }
    let coverage = best_circle_coverage(&edges, width, height);
    debug!(coverage, edges = edges.len(), "circle support");
    if coverage >= ARC_COVERAGE {
        return MarkType::Arc;
    }
    let votes = strongest_line_votes(&edges, width, height);
    let needed = MIN_LINE_VOTES.max(width as usize / 10);
    debug!(votes, needed, "line support");
    if votes >= needed {
        return MarkType::Line;
    }
    MarkType::Bar
}
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
struct ShapeCensus {
    components: usize,
    rectangles: usize,
}
impl ShapeCensus {
    /// 4-connected dark components, ignoring specks.
    fn measure(gray: &GrayImage) -> Self {
        let (width, height) = gray.dimensions();
        let (w, h) = (width as usize, height as usize);
        let min_area = ((w * h) as f64 * MIN_COMPONENT_FRACTION).max(1.0) as usize;
        let foreground: Vec<bool> = gray.pixels().map(|p| p.0[0] <= FOREGROUND_LUMA).collect();
        let mut visited = vec![false; w * h];
        let mut census = Self::default();
        let mut stack = Vec::new();
        for start in 0..w * h {
            if !foreground[start] || visited[start] {
                continue;
            }
            visited[start] = true;
            stack.push(start);
            let (mut min_x, mut min_y, mut max_x, mut max_y) = (w, h, 0, 0);
            let mut area = 0usize;
            while let Some(idx) = stack.pop() {
                let (x, y) = (idx % w, idx / w);
                area += 1;
                min_x = min_x.min(x);
                max_x = max_x.max(x);
                min_y = min_y.min(y);
                max_y = max_y.max(y);
                let neighbours = [
                    (x > 0).then(|| idx - 1),
                    (x + 1 < w).then(|| idx + 1),
                    (y > 0).then(|| idx - w),
                    (y + 1 < h).then(|| idx + w),
                ];
                for next in neighbours.into_iter().flatten() {
                    if foreground[next] && !visited[next] {
                        visited[next] = true;
                        stack.push(next);
                    }
                }
            }
            if area < min_area {
                continue;
            }
            census.components += 1;
            let box_area = (max_x - min_x + 1) * (max_y - min_y + 1);
            if area as f64 / box_area as f64 >= RECTANGLE_FILL {
                census.rectangles += 1;
            }
        }
        census
    }
    fn looks_like_bars(&self) -> bool {
        self.rectangles >= MIN_RECTANGLES
            || (self.components > 0
                && self.rectangles as f64 / self.components as f64 > RECTANGLE_SHARE)
    }
}
#[derive(Debug, Clone, Copy)]
struct EdgePixel {
    x: f64,
    y: f64,
    gx: f64,
    gy: f64,
}
fn sobel_edges(gray: &GrayImage) -> Vec<EdgePixel> {
    let (width, height) = gray.dimensions();
    let at = |x: u32, y: u32| f64::from(gray.get_pixel(x, y).0[0]);
    let mut edges = Vec::new();
    for y in 1..height - 1 {
        for x in 1..width - 1 {
            let gx = at(x + 1, y - 1) + 2.0 * at(x + 1, y) + at(x + 1, y + 1)
                - at(x - 1, y - 1)
                - 2.0 * at(x - 1, y)
                - at(x - 1, y + 1);
            let gy = at(x - 1, y + 1) + 2.0 * at(x, y + 1) + at(x + 1, y + 1)
                - at(x - 1, y - 1)
                - 2.0 * at(x, y - 1)
                - at(x + 1, y - 1);
            if gx.hypot(gy) >= EDGE_MAGNITUDE {
                edges.push(EdgePixel {
                    x: f64::from(x),
                    y: f64::from(y),
                    gx,
                    gy,
                });
            }
        }
    }
    edges
}
/// Fraction of the circumference supported by edges for the most voted
/// circle. Centres are found by casting each edge along its gradient.
fn best_circle_coverage(edges: &[EdgePixel], width: u32, height: u32) -> f64 {
    let (w, h) = (width as usize, height as usize);
    let side = f64::from(width.min(height));
    let (r_min, r_max) = ((0.05 * side).max(3.0), 0.45 * side);
    if r_max <= r_min {
        return 0.0;
    }
    let mut votes = vec![0u32; w * h];
    for edge in edges {
        let norm = edge.gx.hypot(edge.gy);
        let (dx, dy) = (edge.gx / norm, edge.gy / norm);
        let mut r = r_min;
        while r <= r_max {
            for sign in [-1.0, 1.0] {
                let cx = (edge.x + sign * r * dx).round();
                let cy = (edge.y + sign * r * dy).round();
                if cx >= 0.0 && cy >= 0.0 && (cx as usize) < w && (cy as usize) < h {
                    votes[cy as usize * w + cx as usize] += 1;
                }
            }
            r += 1.0;
        }
    }
    let mut best = (0u32, 0usize, 0usize);
    for y in 1..h.saturating_sub(1) {
        for x in 1..w.saturating_sub(1) {
            let mut sum = 0;
            for ny in y - 1..=y + 1 {
                for nx in x - 1..=x + 1 {
                    sum += votes[ny * w + nx];
                }
            }
            if sum > best.0 {
                best = (sum, x, y);
            }
        }
    }
    if best.0 == 0 {
        return 0.0;
    }
    let (cx, cy) = (best.1 as f64, best.2 as f64);
    let distances: Vec<(f64, f64)> = edges
        .iter()
        .map(|e| ((e.x - cx).hypot(e.y - cy), (e.y - cy).atan2(e.x - cx)))
        .collect();
    let mut radius_histogram = vec![0u32; r_max.ceil() as usize + 2];
    for (d, _) in &distances {
        if *d >= r_min && *d <= r_max {
            radius_histogram[d.round() as usize] += 1;
        }
    }
    let Some((radius, _)) = radius_histogram
        .iter()
        .enumerate()
        .filter(|(_, count)| **count > 0)
        .max_by_key(|(r, count)| (**count, std::cmp::Reverse(*r)))
    else {
        return 0.0;
    };
    let radius = radius as f64;
    let bins = (std::f64::consts::TAU * radius).ceil().clamp(1.0, 360.0) as usize;
    let mut covered = vec![false; bins];
    for (d, angle) in &distances {
        if (d - radius).abs() <= RADIUS_TOLERANCE {
            let turn = (angle + std::f64::consts::PI) / std::f64::consts::TAU;
            covered[((turn * bins as f64) as usize).min(bins - 1)] = true;
        }
    }
    covered.iter().filter(|c| **c).count() as f64 / bins as f64
}
/// Peak accumulator value of a 1 px, 1 degree Hough transform.
fn strongest_line_votes(edges: &[EdgePixel], width: u32, height: u32) -> usize {
    let diagonal = f64::from(width).hypot(f64::from(height)).ceil() as usize;
    (0..180u32)
        .into_par_iter()
        .map(|degree| {
            let theta = f64::from(degree).to_radians();
            let (cos, sin) = (theta.cos(), theta.sin());
            let mut accumulator = vec![0usize; 2 * diagonal + 1];
            for edge in edges {
                let rho = (edge.x * cos + edge.y * sin).round() as i64 + diagonal as i64;
                if (0..accumulator.len() as i64).contains(&rho) {
                    accumulator[rho as usize] += 1;
                }
            }
            accumulator.into_iter().max().unwrap_or(0)
        })
        .max()
        .unwrap_or(0)
}
#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageFormat, Rgb, RgbImage};
    use std::io::Cursor;

    const WHITE: Rgb<u8> = Rgb([255, 255, 255]);

    fn png(image: RgbImage) -> Vec<u8> {
        let mut bytes = Vec::new();
        DynamicImage::ImageRgb8(image)
            .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
            .unwrap();
        bytes
    }

    fn draw_segment(img: &mut RgbImage, from: (f64, f64), to: (f64, f64), half_width: f64) {
        let (w, h) = img.dimensions();
        let (dx, dy) = (to.0 - from.0, to.1 - from.1);
        let len2 = dx * dx + dy * dy;
        for y in 0..h {
            for x in 0..w {
                let (px, py) = (f64::from(x), f64::from(y));
                let t = (((px - from.0) * dx + (py - from.1) * dy) / len2).clamp(0.0, 1.0);
                let (qx, qy) = (from.0 + t * dx, from.1 + t * dy);
                if (px - qx).hypot(py - qy) <= half_width {
                    img.put_pixel(x, y, Rgb([30, 60, 160]));
                }
            }
        }
    }

    #[test]
    fn filled_rectangles_are_bars() {
        let mut img = RgbImage::from_pixel(300, 200, WHITE);
        for (i, top) in [120u32, 60, 90, 30].iter().enumerate() {
            let left = 30 + i as u32 * 65;
            for y in *top..180 {
                for x in left..left + 40 {
                    img.put_pixel(x, y, Rgb([70, 110, 170]));
                }
            }
        }
        assert_eq!(detect_mark(&png(img)), MarkType::Bar);
    }

    #[test]
    fn sectored_disk_is_an_arc() {
        let colours = [Rgb([200, 40, 40]), Rgb([40, 80, 200]), Rgb([40, 160, 80])];
        let img = RgbImage::from_fn(256, 256, |x, y| {
            let (dx, dy) = (f64::from(x) - 128.0, f64::from(y) - 128.0);
            if dx.hypot(dy) > 90.0 {
                return WHITE;
            }
            let degrees = dy.atan2(dx).to_degrees().rem_euclid(360.0);
            colours[((degrees / 120.0) as usize).min(2)]
        });
        assert_eq!(detect_mark(&png(img)), MarkType::Arc);
    }

    #[test]
    fn polyline_is_a_line() {
        let mut img = RgbImage::from_pixel(400, 300, WHITE);
        let points = [(20.0, 260.0), (200.0, 80.0), (300.0, 180.0), (380.0, 100.0)];
        for pair in points.windows(2) {
            draw_segment(&mut img, pair[0], pair[1], 1.5);
        }
        assert_eq!(detect_mark(&png(img)), MarkType::Line);
    }

    #[test]
    fn undecodable_or_blank_input_defaults_to_bar() {
        assert_eq!(detect_mark(b"definitely not an image"), MarkType::Bar);
        assert_eq!(detect_mark(&[]), MarkType::Bar);
        assert_eq!(
            detect_mark(&png(RgbImage::from_pixel(64, 64, WHITE))),
            MarkType::Bar
        );
    }

    #[test]
    fn large_images_are_downscaled() {
        let gray = prepare(DynamicImage::ImageRgb8(RgbImage::from_pixel(2048, 1024, WHITE)));
        assert_eq!(gray.dimensions(), (512, 256));
    }
}
