//! File attachments for multipart submissions.

use reqwest::multipart::Part;

use crate::validation::FieldErrors;

/// An in-memory file attached to a multipart form (avatar, product or post image).
#[derive(Clone)]
pub struct Upload {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

impl std::fmt::Debug for Upload {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Upload")
            .field("file_name", &self.file_name)
            .field("content_type", &self.content_type)
            .field("len", &self.bytes.len())
            .finish()
    }
}

impl Upload {
    /// Largest attachment the backend accepts.
    pub const MAX_BYTES: usize = 5 * 1024 * 1024;

    /// Create an upload, guessing the content type from the file extension.
    #[must_use]
    pub fn from_bytes(file_name: impl Into<String>, bytes: Vec<u8>) -> Self {
        let file_name = file_name.into();
        let content_type = guess_content_type(&file_name).to_string();
        Self {
            file_name,
            content_type,
            bytes,
        }
    }

    /// Whether the attachment is an image within the size limit.
    #[must_use]
    pub fn is_acceptable_image(&self) -> bool {
        self.content_type.starts_with("image/")
            && !self.bytes.is_empty()
            && self.bytes.len() <= Self::MAX_BYTES
    }

    /// Record an error on `field` unless [`Upload::is_acceptable_image`] holds.
    pub(crate) fn check_image(&self, errors: &mut FieldErrors, field: &'static str) {
        if !self.is_acceptable_image() {
            errors.add(
                field,
                format!(
                    "must be an image of at most {} MB",
                    Self::MAX_BYTES / (1024 * 1024)
                ),
            );
        }
    }

    /// Convert into a multipart part.
    ///
    /// # Errors
    ///
    /// Returns `reqwest::Error` if the content type is not a valid MIME type.
    pub fn into_part(self) -> Result<Part, reqwest::Error> {
        Part::bytes(self.bytes)
            .file_name(self.file_name)
            .mime_str(&self.content_type)
    }
}

fn guess_content_type(file_name: &str) -> &'static str {
    let ext = file_name
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "webp" => "image/webp",
        _ => "application/octet-stream",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_guesses_image_types() {
        assert_eq!(Upload::from_bytes("me.PNG", vec![1]).content_type, "image/png");
        assert_eq!(Upload::from_bytes("a.b.jpeg", vec![1]).content_type, "image/jpeg");
        assert_eq!(
            Upload::from_bytes("notes", vec![1]).content_type,
            "application/octet-stream"
        );
    }

    #[test]
    fn test_acceptable_image() {
        assert!(Upload::from_bytes("a.png", vec![0; 16]).is_acceptable_image());
        assert!(!Upload::from_bytes("a.png", Vec::new()).is_acceptable_image());
        assert!(!Upload::from_bytes("a.txt", vec![0; 16]).is_acceptable_image());
        assert!(!Upload::from_bytes("a.png", vec![0; Upload::MAX_BYTES + 1]).is_acceptable_image());
    }

    #[test]
    fn test_rejection_names_the_size_limit() {
        let mut errors = FieldErrors::new();
        Upload::from_bytes("a.png", vec![0; 16]).check_image(&mut errors, "image");
        assert!(errors.is_empty());

        let oversized = Upload::from_bytes("a.png", vec![0; Upload::MAX_BYTES + 1]);
        oversized.check_image(&mut errors, "image");
        assert_eq!(errors.get("image"), Some("must be an image of at most 5 MB"));
    }
}
