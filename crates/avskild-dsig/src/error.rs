#![forbid(unsafe_code)]

//! Errors surfaced by the public signing and verification API.

use avskild_core::Error;

/// Signing failed; nothing was produced.
#[derive(Debug, thiserror::Error)]
#[error("{context}")]
pub struct SigningError {
    context: String,
    #[source]
    source: Error,
}

impl SigningError {
    pub fn new(context: impl Into<String>, source: Error) -> Self {
        Self {
            context: context.into(),
            source,
        }
    }

    /// The underlying failure.
    pub fn cause(&self) -> &Error {
        &self.source
    }
}

/// Verification could not be carried out.
///
/// A signature that was checked and found not to match is not an error:
/// it is reported as `false` or [`VerifyResult::Invalid`](crate::VerifyResult).
#[derive(Debug, thiserror::Error)]
#[error("{context}")]
pub struct VerificationError {
    context: String,
    #[source]
    source: Error,
}

impl VerificationError {
    pub fn new(context: impl Into<String>, source: Error) -> Self {
        Self {
            context: context.into(),
            source,
        }
    }

    pub fn cause(&self) -> &Error {
        &self.source
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn test_source_chain() {
        let err = VerificationError::new(
            "Signature node not present",
            Error::MissingElement("Signature".into()),
        );
        assert_eq!(err.to_string(), "Signature node not present");
        assert_eq!(
            err.source().map(|s| s.to_string()).as_deref(),
            Some("missing required element: Signature")
        );
        assert!(matches!(err.cause(), Error::MissingElement(_)));
    }
}
