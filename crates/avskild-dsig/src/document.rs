#![forbid(unsafe_code)]

//! The content being signed.

/// A named byte payload.
///
/// `file_name` becomes the `URI` of the signature's single `Reference`; it
/// is a label and is never opened.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    file_name: String,
    data: Vec<u8>,
}

impl Document {
    pub fn new(file_name: impl Into<String>, data: impl Into<Vec<u8>>) -> Self {
        Self {
            file_name: file_name.into(),
            data: data.into(),
        }
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }
}
