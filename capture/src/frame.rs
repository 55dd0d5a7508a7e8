//! Still frames and their PNG encoding

use std::borrow::Cow;

use base64::{engine::general_purpose::STANDARD, Engine as _};
use chrono::{DateTime, Utc};
use image::{
    codecs::png::PngEncoder,
    imageops::{self, FilterType},
    ColorType, ImageEncoder, RgbaImage,
};
use thiserror::Error;

use crate::device::Dimensions;

/// Reasons a video frame could not be turned into a still image
#[derive(Error, Debug)]
pub enum CaptureError {
    /// The surface to draw on has no pixels
    #[error("cannot draw onto an empty {0} surface")]
    EmptySurface(Dimensions),

    /// PNG encoding failed
    #[error("failed to encode frame as PNG: {0}")]
    Encode(#[from] image::ImageError),
}

/// A still image frozen from the camera feed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapturedFrame {
    dimensions: Dimensions,
    png: Vec<u8>,
    captured_at: DateTime<Utc>,
}

/// A captured frame packaged for saving to disk
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Download {
    /// Suggested file name, unique per capture millisecond
    pub filename: String,
    /// `data:image/png;base64,...` URL holding the PNG
    pub data_url: String,
}

impl CapturedFrame {
    /// Draws `frame` onto a surface of the stream's intrinsic size and encodes it as PNG
    ///
    /// The frame is scaled when its own size differs from `intrinsic`, so the still
    /// always has exactly the intrinsic dimensions.
    ///
    /// # Errors
    ///
    /// Returns `CaptureError::EmptySurface` for a zero-sized surface and
    /// `CaptureError::Encode` when PNG encoding fails
    pub fn from_video_frame(
        frame: &RgbaImage,
        intrinsic: Dimensions,
        captured_at: DateTime<Utc>,
    ) -> Result<Self, CaptureError> {
        if intrinsic.is_empty() {
            return Err(CaptureError::EmptySurface(intrinsic));
        }

        let surface = if frame.dimensions() == (intrinsic.width, intrinsic.height) {
            Cow::Borrowed(frame)
        } else {
            Cow::Owned(imageops::resize(
                frame,
                intrinsic.width,
                intrinsic.height,
                FilterType::Triangle,
            ))
        };

        let mut png = Vec::new();
        PngEncoder::new(&mut png).write_image(
            surface.as_raw(),
            intrinsic.width,
            intrinsic.height,
            ColorType::Rgba8,
        )?;

        Ok(Self {
            dimensions: intrinsic,
            png,
            captured_at,
        })
    }

    /// Pixel size of the still
    #[must_use]
    pub const fn dimensions(&self) -> Dimensions {
        self.dimensions
    }

    /// Encoded PNG bytes
    #[must_use]
    pub fn png_bytes(&self) -> &[u8] {
        &self.png
    }

    /// When the frame was taken
    #[must_use]
    pub const fn captured_at(&self) -> DateTime<Utc> {
        self.captured_at
    }

    /// The PNG as a `data:` URL
    #[must_use]
    pub fn to_data_url(&self) -> String {
        format!("data:image/png;base64,{}", STANDARD.encode(&self.png))
    }

    /// `captured-image-<epoch-millis>.png`
    #[must_use]
    pub fn suggested_filename(&self) -> String {
        format!(
            "captured-image-{}.png",
            self.captured_at.timestamp_millis()
        )
    }

    /// Packages the still for download
    #[must_use]
    pub fn download(&self) -> Download {
        Download {
            filename: self.suggested_filename(),
            data_url: self.to_data_url(),
        }
    }
}
