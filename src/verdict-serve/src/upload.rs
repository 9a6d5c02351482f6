use crate::error::UploadError;

/// An image accepted for classification, held in memory until it is
/// persisted as an artifact.
#[derive(Debug, Clone)]
pub struct UploadedImage {
    bytes: Vec<u8>,
    content_type: String,
}

impl UploadedImage {
    pub fn new(
        bytes: Vec<u8>,
        content_type: impl Into<String>,
        max_bytes: usize,
    ) -> Result<Self, UploadError> {
        let content_type = content_type.into();
        Self::check_content_type(&content_type)?;
        if bytes.len() > max_bytes {
            return Err(UploadError::TooLarge { limit: max_bytes });
        }

        Ok(UploadedImage {
            bytes,
            content_type,
        })
    }

    /// File filter applied before any bytes are buffered.
    pub fn check_content_type(content_type: &str) -> Result<(), UploadError> {
        if content_type.starts_with("image/") {
            Ok(())
        } else {
            Err(UploadError::NotAnImage(content_type.to_owned()))
        }
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn content_type(&self) -> &str {
        &self.content_type
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// File extension for the artifact, derived from the MIME subtype.
    pub fn extension(&self) -> String {
        let subtype = self
            .content_type
            .trim_start_matches("image/")
            .split(|c| c == ';' || c == '+')
            .next()
            .unwrap_or("");

        match subtype.trim() {
            "jpeg" | "pjpeg" => "jpg".to_owned(),
            s if !s.is_empty() && s.chars().all(|c| c.is_ascii_alphanumeric()) => {
                s.to_ascii_lowercase()
            }
            _ => "img".to_owned(),
        }
    }
}
