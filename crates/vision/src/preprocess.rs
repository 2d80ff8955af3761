// Image preprocessing for the model boundary
//
// The model takes a fixed square RGB input; inputs arrive as decoded RGBA
// buffers of arbitrary dimensions. Resampling uses a triangle filter (the
// area-style reduction thumbnails want) and values normalize to [0, 1].

use crate::provider::VisionError;
use image::{ImageBuffer, Rgb, RgbImage, RgbaImage, imageops};
use sha2::{Digest, Sha256};

/// A decoded RGBA image buffer of arbitrary dimensions
#[derive(Debug, Clone)]
pub struct ImageData {
  width: u32,
  height: u32,
  pixels: Vec<u8>,
}

impl ImageData {
  /// Wrap a raw RGBA buffer
  pub fn from_rgba(width: u32, height: u32, pixels: Vec<u8>) -> Result<Self, VisionError> {
    let expected = (width as usize) * (height as usize) * 4;
    if pixels.len() != expected {
      return Err(VisionError::Decode(format!(
        "RGBA buffer is {} bytes, expected {} for {}x{}",
        pixels.len(),
        expected,
        width,
        height
      )));
    }

    Ok(Self {
      width,
      height,
      pixels,
    })
  }

  /// Decode an encoded image (PNG/JPEG)
  pub fn decode(bytes: &[u8]) -> Result<Self, VisionError> {
    let decoded = image::load_from_memory(bytes).map_err(|e| VisionError::Decode(e.to_string()))?;
    let rgba = decoded.to_rgba8();
    let (width, height) = rgba.dimensions();

    Ok(Self {
      width,
      height,
      pixels: rgba.into_raw(),
    })
  }

  pub fn width(&self) -> u32 {
    self.width
  }

  pub fn height(&self) -> u32 {
    self.height
  }

  pub fn pixels(&self) -> &[u8] {
    &self.pixels
  }

  /// Stable digest of the pixel content, used as a memo key
  pub fn fingerprint(&self) -> String {
    let mut hasher = Sha256::new();
    hasher.update(self.width.to_le_bytes());
    hasher.update(self.height.to_le_bytes());
    hasher.update(&self.pixels);
    let digest = hasher.finalize();
    hex::encode(&digest[..8])
  }

  fn to_rgba_image(&self) -> Result<RgbaImage, VisionError> {
    ImageBuffer::from_raw(self.width, self.height, self.pixels.clone())
      .ok_or_else(|| VisionError::Decode("RGBA buffer does not match dimensions".to_string()))
  }
}

/// Resize to the model's square input and strip alpha
pub fn to_model_input(image: &ImageData, size: u32) -> Result<RgbImage, VisionError> {
  let rgba = image.to_rgba_image()?;
  let resized = imageops::resize(&rgba, size, size, imageops::FilterType::Triangle);

  let mut rgb: RgbImage = ImageBuffer::new(size, size);
  for (x, y, pixel) in resized.enumerate_pixels() {
    rgb.put_pixel(x, y, Rgb([pixel[0], pixel[1], pixel[2]]));
  }

  Ok(rgb)
}

/// Normalize an RGB input to [0, 1] floats in row-major RGB order
pub fn normalize(input: &RgbImage) -> Vec<f32> {
  input.as_raw().iter().map(|&v| v as f32 / 255.0).collect()
}

/// Encode a preprocessed input as PNG for upload
pub fn encode_png(input: &RgbImage) -> Result<Vec<u8>, VisionError> {
  let mut buffer = std::io::Cursor::new(Vec::new());
  input
    .write_to(&mut buffer, image::ImageOutputFormat::Png)
    .map_err(|e| VisionError::Decode(e.to_string()))?;
  Ok(buffer.into_inner())
}
