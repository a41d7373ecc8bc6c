use image::imageops::{self, FilterType};
use image::{ImageBuffer, Luma, RgbaImage};

use super::InferenceError;

/// Normalized single-channel classifier input with shape `[1, 1, size, size]`.
#[derive(Debug, Clone, PartialEq)]
pub struct InputTensor {
    data: Vec<f32>,
    size: usize,
}

impl InputTensor {
    /// Wrap row-major intensities for a `size`x`size` image.
    pub fn new(data: Vec<f32>, size: usize) -> Result<Self, InferenceError> {
        let expected = size * size;
        if size == 0 || data.len() != expected {
            return Err(InferenceError::InputLength {
                expected,
                actual: data.len(),
            });
        }
        Ok(Self { data, size })
    }

    /// Row-major intensities in `[0, 1]`.
    pub fn data(&self) -> &[f32] {
        &self.data
    }

    /// Batch, channel, height, width.
    pub fn shape(&self) -> [usize; 4] {
        [1, 1, self.size, self.size]
    }
}

/// Convert the canvas bitmap into classifier input.
///
/// Luma conversion, then scaling to the unit range, then a triangle-filter
/// resize to `size`x`size`.
pub fn canvas_to_input(image: &RgbaImage, size: u32) -> Result<InputTensor, InferenceError> {
    let (width, height) = image.dimensions();
    if width == 0 || height == 0 {
        return Err(InferenceError::EmptyImage);
    }
    if size == 0 {
        return Err(InferenceError::InvalidInputSize(size));
    }

    let gray = imageops::grayscale(image);
    let unit: ImageBuffer<Luma<f32>, Vec<f32>> =
        ImageBuffer::from_fn(width, height, |x, y| {
            Luma([f32::from(gray.get_pixel(x, y)[0]) / 255.0])
        });
    let resized = imageops::resize(&unit, size, size, FilterType::Triangle);
    let data = resized
        .into_raw()
        .into_iter()
        .map(|value| value.clamp(0.0, 1.0))
        .collect();

    InputTensor::new(data, size as usize)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    #[test]
    fn input_length_must_match_side() {
        let err = InputTensor::new(vec![0.0; 27], 28).unwrap_err();
        assert!(matches!(
            err,
            InferenceError::InputLength {
                expected: 784,
                actual: 27
            }
        ));
        assert!(InputTensor::new(Vec::new(), 0).is_err());
        assert_eq!(InputTensor::new(vec![0.5; 4], 2).unwrap().shape(), [1, 1, 2, 2]);
    }

    #[test]
    fn blank_canvas_maps_to_zeros() {
        let image = RgbaImage::from_pixel(280, 280, Rgba([0, 0, 0, 255]));
        let input = canvas_to_input(&image, 28).unwrap();
        assert_eq!(input.shape(), [1, 1, 28, 28]);
        assert_eq!(input.data().len(), 28 * 28);
        assert!(input.data().iter().all(|&v| v == 0.0));
    }

    #[test]
    fn white_canvas_maps_to_ones() {
        let image = RgbaImage::from_pixel(56, 56, Rgba([255, 255, 255, 255]));
        let input = canvas_to_input(&image, 28).unwrap();
        assert!(input.data().iter().all(|&v| (v - 1.0).abs() < 1e-5));
    }

    #[test]
    fn ink_keeps_its_position_after_resize() {
        let mut image = RgbaImage::from_pixel(280, 280, Rgba([0, 0, 0, 255]));
        // Left half inked.
        for y in 0..280 {
            for x in 0..140 {
                image.put_pixel(x, y, Rgba([255, 255, 255, 255]));
            }
        }
        let input = canvas_to_input(&image, 28).unwrap();
        let row = &input.data()[14 * 28..15 * 28];
        assert!(row[2] > 0.9);
        assert!(row[25] < 0.1);
        assert!(input.data().iter().all(|v| (0.0..=1.0).contains(v)));
    }

    #[test]
    fn rejects_zero_target_size() {
        let image = RgbaImage::from_pixel(4, 4, Rgba([0, 0, 0, 255]));
        assert!(matches!(
            canvas_to_input(&image, 0),
            Err(InferenceError::InvalidInputSize(0))
        ));
    }

    #[test]
    fn rejects_empty_image() {
        let image = RgbaImage::new(0, 0);
        assert!(matches!(
            canvas_to_input(&image, 28),
            Err(InferenceError::EmptyImage)
        ));
    }
}
