//! # Multipart Payloads
//!
//! Locally selected files and the ordered form parts the capsule creation
//! endpoint expects. Part order is preserved exactly as appended; the wire
//! encoding (boundary, filename quoting) is left to the host's `FormData`.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use std::sync::Arc;

/// Opaque handle to a locally selected file.
#[derive(Clone, Debug, PartialEq)]
pub struct FileRef {
    name: String,
    mime_type: String,
    data: Arc<[u8]>,
}

/// How a file is previewed before upload.
#[derive(Clone, Debug, PartialEq)]
pub enum Preview {
    Image(String),
    Video(String),
    Document,
}

impl FileRef {
    pub fn new(name: impl Into<String>, mime_type: impl Into<String>, data: impl Into<Arc<[u8]>>) -> Self {
        let mime_type = mime_type.into();
        Self {
            name: name.into(),
            mime_type: if mime_type.is_empty() {
                "application/octet-stream".to_string()
            } else {
                mime_type
            },
            data: data.into(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn mime_type(&self) -> &str {
        &self.mime_type
    }

    pub fn size(&self) -> u64 {
        self.data.len() as u64
    }

    pub fn bytes(&self) -> &[u8] {
        &self.data
    }

    pub fn is_image(&self) -> bool {
        self.mime_type.starts_with("image/")
    }

    pub fn is_video(&self) -> bool {
        self.mime_type.starts_with("video/")
    }

    /// In-memory preview built from the local bytes; other types get a generic marker.
    pub fn preview(&self) -> Preview {
        if self.is_image() {
            Preview::Image(self.data_url())
        } else if self.is_video() {
            Preview::Video(self.data_url())
        } else {
            Preview::Document
        }
    }

    fn data_url(&self) -> String {
        format!("data:{};base64,{}", self.mime_type, BASE64.encode(&self.data))
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum Part {
    Text { name: String, value: String },
    File { name: String, file: FileRef },
}

impl Part {
    pub fn name(&self) -> &str {
        match self {
            Part::Text { name, .. } | Part::File { name, .. } => name,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct MultipartForm {
    parts: Vec<Part>,
}

impl MultipartForm {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn text(mut self, name: &str, value: impl Into<String>) -> Self {
        self.parts.push(Part::Text {
            name: name.to_string(),
            value: value.into(),
        });
        self
    }

    pub fn file(mut self, name: &str, file: FileRef) -> Self {
        self.parts.push(Part::File {
            name: name.to_string(),
            file,
        });
        self
    }

    pub fn parts(&self) -> &[Part] {
        &self.parts
    }

    pub fn text_value(&self, name: &str) -> Option<&str> {
        self.parts.iter().find_map(|part| match part {
            Part::Text { name: n, value } if n == name => Some(value.as_str()),
            _ => None,
        })
    }

    pub fn files(&self) -> impl Iterator<Item = &FileRef> {
        self.parts.iter().filter_map(|part| match part {
            Part::File { file, .. } => Some(file),
            _ => None,
        })
    }
}
