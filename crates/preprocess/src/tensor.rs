use common::span;
use fast_image_resize::{FilterType, PixelType, ResizeAlg, ResizeOptions, Resizer, images::Image};
use image::RgbImage;
use ndarray::{Array, IxDyn};

const PIXEL_SCALE: f32 = 255.0;

/// Resize a cropped scan to the model input shape and scale pixels to [0, 1].
///
/// The output is laid out NHWC as `[1, height, width, 3]`. Channels are
/// emitted in BGR order: the network was trained on OpenCV-decoded arrays
/// and expects that ordering.
pub fn to_model_input(image: &RgbImage, input_size: (u32, u32)) -> anyhow::Result<Array<f32, IxDyn>> {
    let _s = span!("to_model_input");

    let (width, height) = image.dimensions();
    if width == 0 || height == 0 {
        anyhow::bail!("cannot preprocess an empty image");
    }

    let mut rgb = image.as_raw().clone();
    let src = Image::from_slice_u8(width, height, &mut rgb, PixelType::U8x3)?;
    let mut resized = Image::new(input_size.0, input_size.1, PixelType::U8x3);

    // Cubic interpolation, matching the interpolation the model saw in training.
    Resizer::new().resize(
        &src,
        &mut resized,
        &ResizeOptions::new().resize_alg(ResizeAlg::Convolution(FilterType::CatmullRom)),
    )?;

    let (out_width, out_height) = (input_size.0 as usize, input_size.1 as usize);
    let mut data = vec![0.0f32; out_width * out_height * 3];

    for (i, px) in resized.buffer().chunks_exact(3).enumerate() {
        data[i * 3] = px[2] as f32 / PIXEL_SCALE;
        data[i * 3 + 1] = px[1] as f32 / PIXEL_SCALE;
        data[i * 3 + 2] = px[0] as f32 / PIXEL_SCALE;
    }

    Ok(Array::from_shape_vec(
        IxDyn(&[1, out_height, out_width, 3]),
        data,
    )?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    #[test]
    fn output_has_batched_nhwc_shape() {
        let image = RgbImage::from_pixel(100, 80, Rgb([128, 128, 128]));
        let input = to_model_input(&image, (240, 240)).unwrap();
        assert_eq!(input.shape(), &[1, 240, 240, 3]);
    }

    #[test]
    fn pixels_are_scaled_to_unit_range() {
        let image = RgbImage::from_pixel(16, 16, Rgb([255, 0, 51]));
        let input = to_model_input(&image, (240, 240)).unwrap();

        for v in input.iter() {
            assert!((0.0..=1.0).contains(v), "value {} out of range", v);
        }
    }

    #[test]
    fn channels_are_reordered_to_bgr() {
        // Pure red in RGB must land in the last channel position.
        let image = RgbImage::from_pixel(16, 16, Rgb([255, 0, 0]));
        let input = to_model_input(&image, (240, 240)).unwrap();

        assert!((input[[0, 120, 120, 0]] - 0.0).abs() < 1e-6); // B
        assert!((input[[0, 120, 120, 1]] - 0.0).abs() < 1e-6); // G
        assert!((input[[0, 120, 120, 2]] - 1.0).abs() < 1e-6); // R
    }

    #[test]
    fn empty_image_is_rejected() {
        let image = RgbImage::new(0, 0);
        assert!(to_model_input(&image, (240, 240)).is_err());
    }
}
