//! Image encoding: raw upload bytes → PNG → base64 [`EncodedImage`].
//!
//! VLM APIs accept images as base64 data-URIs embedded in the JSON request
//! body. Every input is re-serialised to PNG whatever its source format, so
//! a JPEG photo and a PNG scan reach the model the same way and the pixel
//! data survives the round trip bit for bit.

use crate::error::ExtractError;
use crate::schema::Side;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use edgequake_llm::ImageData;
use image::DynamicImage;
use std::io::Cursor;
use tracing::debug;

/// Raw bytes of an uploaded raster image (JPEG or PNG).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImagePayload {
    bytes: Vec<u8>,
}

impl ImagePayload {
    pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            bytes: bytes.into(),
        }
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// A PNG image as standard, padded base64 text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedImage {
    data: String,
}

impl EncodedImage {
    /// MIME type of the encoded bytes. Always PNG.
    pub const MIME_TYPE: &'static str = "image/png";

    /// The base64 text.
    pub fn as_base64(&self) -> &str {
        &self.data
    }

    /// `data:image/png;base64,…` for embedding in a request body.
    pub fn data_uri(&self) -> String {
        format!("data:{};base64,{}", Self::MIME_TYPE, self.data)
    }

    /// Decode the base64 text back to PNG bytes.
    pub fn decode_png(&self) -> Result<Vec<u8>, base64::DecodeError> {
        STANDARD.decode(&self.data)
    }

    /// Attachment form used by `edgequake-llm` providers.
    ///
    /// `detail: "high"` keeps the fine print on the card readable.
    pub fn to_image_data(&self) -> ImageData {
        ImageData::new(self.data.clone(), Self::MIME_TYPE).with_detail("high")
    }
}

/// Decode an uploaded image and re-encode it as base64 PNG.
///
/// The source format is sniffed from the content, not from a file name.
pub fn encode_payload(payload: &ImagePayload, side: Side) -> Result<EncodedImage, ExtractError> {
    let img = image::load_from_memory(payload.as_bytes()).map_err(|e| ExtractError::Decode {
        side,
        detail: e.to_string(),
    })?;
    debug!(
        "{}: decoded {}x{} image from {} bytes",
        side,
        img.width(),
        img.height(),
        payload.len()
    );
    encode_image(&img).map_err(|e| ExtractError::Decode {
        side,
        detail: format!("PNG encoding failed: {e}"),
    })
}

/// Encode an in-memory image as base64 PNG.
pub fn encode_image(img: &DynamicImage) -> Result<EncodedImage, image::ImageError> {
    let mut buf = Vec::new();
    img.write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)?;

    let data = STANDARD.encode(&buf);
    debug!("Encoded image → {} bytes base64", data.len());

    Ok(EncodedImage { data })
}
