use std::fmt;

use base64::{Engine as _, engine::general_purpose::STANDARD};
use serde::{Deserialize, Serialize};

/// Why a frame could not be taken from the operator's camera.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CaptureError {
    #[error("Could not capture image from video.")]
    NoFrame,

    #[error("captured frame is not an image data URI: {0}")]
    Malformed(&'static str),
}

/// A single still frame encoded as `data:<image mime>;base64,<payload>`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PhotoDataUri(String);

impl PhotoDataUri {
    pub fn parse(raw: impl Into<String>) -> Result<Self, CaptureError> {
        let raw = raw.into();
        if raw.trim().is_empty() {
            return Err(CaptureError::NoFrame);
        }

        let rest = raw
            .strip_prefix("data:")
            .ok_or(CaptureError::Malformed("missing data: scheme"))?;
        let (mime, payload) = rest
            .split_once(";base64,")
            .ok_or(CaptureError::Malformed("missing ;base64, marker"))?;

        if !mime.starts_with("image/") || mime.len() == "image/".len() {
            return Err(CaptureError::Malformed("mime type is not image/*"));
        }
        if payload.is_empty() {
            // the browser hands back "data:," style stubs when the video had no frame yet
            return Err(CaptureError::NoFrame);
        }
        STANDARD
            .decode(payload)
            .map_err(|_| CaptureError::Malformed("payload is not base64"))?;

        Ok(Self(raw))
    }

    /// Turns an optional submitted frame into a capture result.
    pub fn from_submission(raw: Option<String>) -> Result<Self, CaptureError> {
        raw.map_or(Err(CaptureError::NoFrame), Self::parse)
    }

    pub fn mime_type(&self) -> &str {
        self.0
            .strip_prefix("data:")
            .and_then(|rest| rest.split_once(';'))
            .map(|(mime, _)| mime)
            .unwrap_or_default()
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for PhotoDataUri {
    type Error = CaptureError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(value)
    }
}

impl From<PhotoDataUri> for String {
    fn from(value: PhotoDataUri) -> Self {
        value.0
    }
}

impl fmt::Display for PhotoDataUri {
    // payloads run to hundreds of kilobytes, keep logs readable
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} frame ({} bytes)", self.mime_type(), self.0.len())
    }
}
