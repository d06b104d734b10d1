use image::ImageReader;
use image::imageops::FilterType;
use ndarray::Array4;
use std::io::Cursor;

/// Side length the classifier was trained on.
pub const INPUT_SIZE: u32 = 128;
pub const CHANNELS: usize = 3;

#[derive(Debug, thiserror::Error)]
pub enum PreprocessError {
    /// The bytes could not be decoded as an image.
    #[error("{0}")]
    Unreadable(String),
    /// Decoding succeeded but producing the tensor did not.
    #[error("{0}")]
    Failed(String),
}

/// Shape of the tensor handed to the classifier: `[1, 128, 128, 3]`.
pub fn input_shape() -> [usize; 4] {
    [1, INPUT_SIZE as usize, INPUT_SIZE as usize, CHANNELS]
}

/// Decode, convert to RGB, resize to 128x128 (bilinear), scale to [0, 1] and batch.
pub fn preprocess(image: &[u8]) -> Result<Array4<f32>, PreprocessError> {
    let decoded = ImageReader::new(Cursor::new(image))
        .with_guessed_format()
        .map_err(|e| PreprocessError::Unreadable(e.to_string()))?
        .decode()
        .map_err(|e| PreprocessError::Unreadable(e.to_string()))?;

    let rgb = decoded
        .resize_exact(INPUT_SIZE, INPUT_SIZE, FilterType::Triangle)
        .to_rgb8();

    let (width, height) = rgb.dimensions();
    if (width, height) != (INPUT_SIZE, INPUT_SIZE) {
        return Err(PreprocessError::Failed(format!(
            "resized image is {}x{}, expected {}x{}",
            width, height, INPUT_SIZE, INPUT_SIZE
        )));
    }

    let data: Vec<f32> = rgb
        .into_raw()
        .into_iter()
        .map(|v| v as f32 / 255.0)
        .collect();

    Array4::from_shape_vec(input_shape(), data).map_err(|e| PreprocessError::Failed(e.to_string()))
}
