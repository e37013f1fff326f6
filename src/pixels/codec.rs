use std::io::Cursor;

use anyhow::Context;
use base64::Engine as _;

use crate::foundation::error::{FxError, FxResult};
use crate::pixels::buffer::{PixelBuffer, unpremultiply_rgba8_in_place};

/// Decode encoded image bytes (PNG and anything else `image` sniffs) into a premultiplied buffer.
pub fn decode_image(bytes: &[u8]) -> FxResult<PixelBuffer> {
    if bytes.is_empty() {
        return Err(FxError::decode("image bytes are empty"));
    }
    let dyn_img = image::load_from_memory(bytes)
        .context("decode image from memory")
        .map_err(|e| FxError::decode(format!("{e:#}")))?;
    let rgba = dyn_img.to_rgba8();
    let (width, height) = rgba.dimensions();
    PixelBuffer::from_straight(width, height, rgba.into_raw())
}

/// Encode a premultiplied buffer as straight-alpha PNG bytes.
pub fn encode_png(buffer: &PixelBuffer) -> FxResult<Vec<u8>> {
    let mut straight = buffer.data().to_vec();
    unpremultiply_rgba8_in_place(&mut straight);
    let img = image::RgbaImage::from_raw(buffer.width(), buffer.height(), straight)
        .ok_or_else(|| FxError::validation("png encode: buffer size mismatch"))?;

    let mut out = Vec::new();
    image::DynamicImage::ImageRgba8(img)
        .write_to(&mut Cursor::new(&mut out), image::ImageFormat::Png)
        .context("encode png")?;
    Ok(out)
}

/// Resize to exact dimensions when a collaborator hands back a differently sized image.
pub(crate) fn resize_to(buffer: PixelBuffer, width: u32, height: u32) -> FxResult<PixelBuffer> {
    if buffer.width() == width && buffer.height() == height {
        return Ok(buffer);
    }
    let (w, h) = (buffer.width(), buffer.height());
    let img = image::RgbaImage::from_raw(w, h, buffer.into_data())
        .ok_or_else(|| FxError::validation("resize: buffer size mismatch"))?;
    // Premultiplied data resamples correctly with a linear filter.
    let resized = image::imageops::resize(&img, width, height, image::imageops::FilterType::Triangle);
    PixelBuffer::from_premul(width, height, resized.into_raw())
}

/// Addressable handle to a rendered PNG, usable wherever the editor accepts an image URL.
#[derive(Clone, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(transparent)]
pub struct ImageHandle(String);

impl ImageHandle {
    const PNG_PREFIX: &'static str = "data:image/png;base64,";

    /// Build a `data:` URL handle for PNG bytes.
    pub fn from_png(png: &[u8]) -> Self {
        let mut url = String::with_capacity(Self::PNG_PREFIX.len() + png.len() * 4 / 3 + 4);
        url.push_str(Self::PNG_PREFIX);
        base64::engine::general_purpose::STANDARD.encode_string(png, &mut url);
        Self(url)
    }

    pub fn url(&self) -> &str {
        &self.0
    }

    /// Recover the PNG bytes from a handle produced by [`ImageHandle::from_png`].
    pub fn png_bytes(&self) -> FxResult<Vec<u8>> {
        let payload = self
            .0
            .strip_prefix(Self::PNG_PREFIX)
            .ok_or_else(|| FxError::decode("image handle is not a png data url"))?;
        base64::engine::general_purpose::STANDARD
            .decode(payload)
            .context("decode image handle payload")
            .map_err(|e| FxError::decode(format!("{e:#}")))
    }
}

#[cfg(test)]
#[path = "../../tests/unit/pixels/codec.rs"]
mod tests;
