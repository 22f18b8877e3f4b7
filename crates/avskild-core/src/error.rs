#![forbid(unsafe_code)]

/// Errors produced while building, parsing or checking detached signatures.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("XML parsing error: {0}")]
    XmlParse(String),

    #[error("invalid XML structure: {0}")]
    XmlStructure(String),

    #[error("unsupported algorithm: {0}")]
    UnsupportedAlgorithm(String),

    #[error("cryptographic error: {0}")]
    Crypto(String),

    #[error("key error: {0}")]
    Key(String),

    /// The key store could not be opened or the configured entry could not
    /// be extracted from it.
    #[error("key access error: {0}")]
    KeyAccess(String),

    #[error("canonicalization error: {0}")]
    Canonicalization(String),

    #[error("base64 decode error: {0}")]
    Base64(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("key not found: {0}")]
    KeyNotFound(String),

    #[error("missing required element: {0}")]
    MissingElement(String),

    #[error("missing required attribute: {0}")]
    MissingAttribute(String),

    #[error("invalid URI reference: {0}")]
    InvalidUri(String),

    #[error("certificate error: {0}")]
    Certificate(String),

    #[error("{0}")]
    Other(String),
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_includes_context() {
        let err = Error::MissingElement("SignedInfo".into());
        assert_eq!(err.to_string(), "missing required element: SignedInfo");
    }

    #[test]
    fn test_io_error_converts() {
        fn open() -> Result<Vec<u8>> {
            Ok(std::fs::read("/nonexistent/avskild/keystore.p12")?)
        }
        assert!(matches!(open(), Err(Error::Io(_))));
    }
}
