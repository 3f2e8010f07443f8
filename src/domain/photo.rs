//! Photo uploads.

use super::error::ValidationError;

/// 5 MiB.
pub const DEFAULT_MAX_PHOTO_BYTES: u64 = 5 * 1024 * 1024;

/// An image file ready to be sent as the `photo` multipart field.
#[derive(Clone, PartialEq, Eq)]
pub struct PhotoUpload {
    file_name: String,
    content_type: String,
    bytes: Vec<u8>,
}

impl PhotoUpload {
    /// Content type is guessed from the file name's extension.
    pub fn new(file_name: impl Into<String>, bytes: Vec<u8>) -> Self {
        let file_name = file_name.into();
        let content_type = mime_guess::from_path(&file_name)
            .first_or_octet_stream()
            .essence_str()
            .to_string();
        Self {
            file_name,
            content_type,
            bytes,
        }
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    pub fn content_type(&self) -> &str {
        &self.content_type
    }

    pub fn len(&self) -> u64 {
        self.bytes.len() as u64
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn into_parts(self) -> (String, String, Vec<u8>) {
        (self.file_name, self.content_type, self.bytes)
    }

    pub fn validate(&self, max_bytes: u64) -> Result<(), ValidationError> {
        if !self.content_type.starts_with("image/") {
            return Err(ValidationError::NotAnImage {
                file_name: self.file_name.clone(),
                content_type: self.content_type.clone(),
            });
        }
        if self.is_empty() {
            return Err(ValidationError::EmptyPhoto {
                file_name: self.file_name.clone(),
            });
        }
        if self.len() > max_bytes {
            return Err(ValidationError::PhotoTooLarge {
                size: self.len(),
                limit: max_bytes,
            });
        }
        Ok(())
    }
}

impl std::fmt::Debug for PhotoUpload {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PhotoUpload")
            .field("file_name", &self.file_name)
            .field("content_type", &self.content_type)
            .field("len", &self.bytes.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn content_type_is_guessed_from_extension() {
        assert_eq!(PhotoUpload::new("bolo.png", vec![1]).content_type(), "image/png");
        assert_eq!(PhotoUpload::new("bolo.JPG", vec![1]).content_type(), "image/jpeg");
        assert_eq!(
            PhotoUpload::new("notes", vec![1]).content_type(),
            "application/octet-stream"
        );
    }

    #[test]
    fn rejects_non_images() {
        let err = PhotoUpload::new("recipe.pdf", vec![1, 2])
            .validate(DEFAULT_MAX_PHOTO_BYTES)
            .expect_err("pdf is not an image");
        assert!(matches!(err, ValidationError::NotAnImage { .. }));
    }

    #[test]
    fn rejects_empty_and_oversized_files() {
        assert!(matches!(
            PhotoUpload::new("a.png", Vec::new()).validate(10),
            Err(ValidationError::EmptyPhoto { .. })
        ));
        assert_eq!(
            PhotoUpload::new("a.png", vec![0; 11]).validate(10),
            Err(ValidationError::PhotoTooLarge { size: 11, limit: 10 })
        );
        assert!(PhotoUpload::new("a.png", vec![0; 10]).validate(10).is_ok());
    }
}
