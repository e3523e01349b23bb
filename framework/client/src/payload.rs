use bytes::Bytes;

/// The body of a dispatched request.
#[derive(Debug, Clone, Default)]
pub enum Payload {
    #[default]
    Empty,
    Json(serde_json::Value),
    /// One or more named binary attachments, sent as `multipart/form-data`.
    Multipart(Vec<FilePart>),
}

impl Payload {
    pub fn multipart(parts: Vec<FilePart>) -> Self {
        Self::Multipart(parts)
    }
}

/// One named file attachment within a multipart payload.
#[derive(Debug, Clone)]
pub struct FilePart {
    /// The form field name, e.g. `file` or `files1`.
    pub field: String,
    pub file_name: String,
    pub mime: String,
    pub bytes: Bytes,
}

impl FilePart {
    pub fn new(field: &str, file_name: &str, mime: &str, bytes: impl Into<Bytes>) -> Self {
        Self {
            field: field.to_string(),
            file_name: file_name.to_string(),
            mime: mime.to_string(),
            bytes: bytes.into(),
        }
    }

    /// Shorthand for the JPEG uploads the conversion API takes.
    pub fn jpeg(field: &str, file_name: &str, bytes: &'static [u8]) -> Self {
        Self::new(field, file_name, "image/jpeg", Bytes::from_static(bytes))
    }
}
