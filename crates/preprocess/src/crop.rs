use common::span;
use image::{GrayImage, RgbImage, imageops};
use imageproc::contours::{self, BorderType};
use imageproc::contrast::{ThresholdType, threshold};
use imageproc::distance_transform::Norm;
use imageproc::filter::gaussian_blur_f32;
use imageproc::morphology::{dilate, erode};
use imageproc::point::Point;

/// Grayscale intensity above which a pixel counts as brain tissue.
const FOREGROUND_THRESHOLD: u8 = 45;
/// Sigma for a 5x5 Gaussian kernel: 0.3 * ((5 - 1) * 0.5 - 1) + 0.8.
const BLUR_SIGMA: f32 = 1.1;
/// Two passes of a 3x3 structuring element.
const MORPH_RADIUS: u8 = 2;

/// Decode an uploaded image into an 8-bit RGB buffer.
pub fn decode_image(bytes: &[u8]) -> anyhow::Result<RgbImage> {
    let image = image::load_from_memory(bytes)?;
    Ok(image.to_rgb8())
}

/// Crop the scan down to the brain region.
///
/// Blur and threshold the grayscale image to isolate tissue from the black
/// background, clean the mask with an erode/dilate pass, then take the
/// bounding box of the largest outer contour. Scans where no usable contour
/// is found are returned unchanged.
pub fn crop_brain_region(image: &RgbImage) -> RgbImage {
    let _s = span!("crop_brain_region");

    match brain_bounding_box(image) {
        Some((left, top, width, height)) => {
            tracing::trace!(left, top, width, height, "Cropping to brain region");
            imageops::crop_imm(image, left, top, width, height).to_image()
        }
        None => {
            tracing::debug!("No brain contour found, keeping full scan");
            image.clone()
        }
    }
}

fn brain_bounding_box(image: &RgbImage) -> Option<(u32, u32, u32, u32)> {
    let gray: GrayImage = imageops::grayscale(image);
    let blurred = gaussian_blur_f32(&gray, BLUR_SIGMA);

    let mask = threshold(&blurred, FOREGROUND_THRESHOLD, ThresholdType::Binary);
    let mask = erode(&mask, Norm::LInf, MORPH_RADIUS);
    let mask = dilate(&mask, Norm::LInf, MORPH_RADIUS);

    let found = contours::find_contours::<i32>(&mask);
    let largest = found
        .iter()
        .filter(|c| c.border_type == BorderType::Outer)
        .max_by(|a, b| contour_area(&a.points).total_cmp(&contour_area(&b.points)))?;

    bounding_box(&largest.points)
}

/// Bounding box of a contour's extreme points, with exclusive right/bottom
/// edges. Degenerate contours (a single row or column of pixels) yield no
/// box.
fn bounding_box(points: &[Point<i32>]) -> Option<(u32, u32, u32, u32)> {
    let mut left = i32::MAX;
    let mut right = i32::MIN;
    let mut top = i32::MAX;
    let mut bottom = i32::MIN;
    for p in points {
        left = left.min(p.x);
        right = right.max(p.x);
        top = top.min(p.y);
        bottom = bottom.max(p.y);
    }

    if right <= left || bottom <= top {
        return None;
    }

    Some((
        left as u32,
        top as u32,
        (right - left) as u32,
        (bottom - top) as u32,
    ))
}

/// Enclosed polygon area of a contour (shoelace formula).
fn contour_area(points: &[Point<i32>]) -> f64 {
    if points.len() < 3 {
        return 0.0;
    }

    let mut doubled = 0i64;
    for i in 0..points.len() {
        let p = points[i];
        let q = points[(i + 1) % points.len()];
        doubled += p.x as i64 * q.y as i64 - q.x as i64 * p.y as i64;
    }
    doubled.abs() as f64 * 0.5
}
