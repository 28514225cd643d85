//! Upload checks for itinerary cover images

use crate::domain::StringUuid;

/// Directory all cover images are stored under
const IMAGE_DIR: &str = "itineraries";

/// Accepted raster formats, recognised by magic number
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageFormat {
    Jpeg,
    Png,
    Gif,
}

impl ImageFormat {
    pub fn detect(bytes: &[u8]) -> Option<Self> {
        if bytes.starts_with(&[0xFF, 0xD8, 0xFF]) {
            Some(ImageFormat::Jpeg)
        } else if bytes.starts_with(&[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A]) {
            Some(ImageFormat::Png)
        } else if bytes.starts_with(b"GIF87a") || bytes.starts_with(b"GIF89a") {
            Some(ImageFormat::Gif)
        } else {
            None
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            ImageFormat::Jpeg => "jpg",
            ImageFormat::Png => "png",
            ImageFormat::Gif => "gif",
        }
    }
}

/// An uploaded file as received from the client
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImageUpload {
    pub file_name: Option<String>,
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

impl ImageUpload {
    pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            bytes: bytes.into(),
            ..Default::default()
        }
    }

    /// Check format and size, returning the detected format or the
    /// message to report on the `image` field.
    pub fn check(&self, max_bytes: usize) -> Result<ImageFormat, String> {
        if self.bytes.is_empty() {
            return Err("The image failed to upload.".to_string());
        }
        let format = ImageFormat::detect(&self.bytes)
            .ok_or_else(|| "The image must be a file of type: jpeg, png, jpg, gif.".to_string())?;
        if self.bytes.len() > max_bytes {
            return Err(format!(
                "The image may not be greater than {} kilobytes.",
                max_bytes / 1024
            ));
        }
        Ok(format)
    }

    /// Fresh storage path for an image of the given format
    pub fn storage_path(format: ImageFormat) -> String {
        format!("{}/{}.{}", IMAGE_DIR, StringUuid::new_v4(), format.extension())
    }
}
