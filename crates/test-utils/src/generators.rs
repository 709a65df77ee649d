//! Test data generators for creating synthetic detector data.
//!
//! These generators create predictable, verifiable test data patterns
//! that can be used across the test suite.

use shot_common::{ArrayData, RawValue};

/// Creates a 16-bit image with predictable pixel values.
///
/// Each pixel value is calculated as: `col * 100 + row`
///
/// # Returns
///
/// A `Vec<u16>` in row-major order (row 0 first, then row 1, etc.)
///
/// # Example
///
/// ```
/// use test_utils::create_test_image;
///
/// let image = create_test_image(10, 5);
/// assert_eq!(image.len(), 50);
/// assert_eq!(image[1], 100);  // col=1, row=0
/// assert_eq!(image[10], 1);   // col=0, row=1
/// ```
pub fn create_test_image(width: usize, height: usize) -> Vec<u16> {
    let mut data = Vec::with_capacity(width * height);
    for row in 0..height {
        for col in 0..width {
            data.push((col * 100 + row) as u16);
        }
    }
    data
}

/// Creates a floating point image with a gradient from 0.0 (top-left)
/// towards 1.0 (bottom-right).
pub fn create_float_image(width: usize, height: usize) -> Vec<f32> {
    let mut data = Vec::with_capacity(width * height);
    for row in 0..height {
        for col in 0..width {
            let x_factor = col as f32 / width.max(1) as f32;
            let y_factor = row as f32 / height.max(1) as f32;
            data.push((x_factor + y_factor) / 2.0);
        }
    }
    data
}

/// Creates a sampled sine trace.
///
/// # Returns
///
/// `(x, y)` where `x` is the sample time in nanoseconds and `y` one period
/// of a unit sine spread over `samples` points.
pub fn create_trace(samples: usize) -> (Vec<f64>, Vec<f64>) {
    let x: Vec<f64> = (0..samples).map(|i| i as f64 * 0.5).collect();
    let y = (0..samples)
        .map(|i| (i as f64 / samples.max(1) as f64 * std::f64::consts::TAU).sin())
        .collect();
    (x, y)
}

/// Creates a spectrum-like vector peaking in the middle.
pub fn create_spectrum(bins: usize) -> Vec<f64> {
    let centre = bins as f64 / 2.0;
    (0..bins)
        .map(|i| {
            let d = (i as f64 - centre) / centre.max(1.0);
            (-4.0 * d * d).exp()
        })
        .collect()
}

/// 2-D raw array value of shape `[height, width]`.
pub fn raw_matrix(height: usize, width: usize, data: ArrayData) -> RawValue {
    RawValue::array(vec![height, width], data)
}

/// 1-D float64 raw array value.
pub fn raw_series(values: Vec<f64>) -> RawValue {
    RawValue::array(vec![values.len()], ArrayData::F64(values))
}
