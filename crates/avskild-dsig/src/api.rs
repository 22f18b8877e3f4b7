#![forbid(unsafe_code)]

//! The public signing and verification entry points.

use crate::compose;
use crate::document::Document;
use crate::error::{SigningError, VerificationError};
use crate::inspect::{self, SignatureSummary};
use crate::verify::{self, VerifyResult};
use avskild_core::Error;
use avskild_keys::{KeyProvider, KeyStoreConfig, Pkcs12KeyProvider};

/// Creates and checks detached XML signatures with one key provider.
///
/// Each call is independent; the value can be shared between threads.
pub struct XmlDigitalSignature {
    provider: Box<dyn KeyProvider>,
}

impl XmlDigitalSignature {
    pub fn new(provider: impl KeyProvider + 'static) -> Self {
        Self {
            provider: Box::new(provider),
        }
    }

    /// Use the entry `config` names in a PKCS#12 key store.
    pub fn from_key_store(config: KeyStoreConfig) -> Self {
        Self::new(Pkcs12KeyProvider::new(config))
    }

    /// Sign `document` and return the serialized signature document.
    ///
    /// The document's file name becomes the reference URI; its bytes are
    /// digested but not embedded.
    pub fn generate_detached_signature(
        &self,
        document: &Document,
        digest_method: &str,
        signature_method: &str,
    ) -> Result<Vec<u8>, SigningError> {
        let signature = compose::compose(
            document,
            digest_method,
            signature_method,
            self.provider.as_ref(),
        )
        .map_err(|e| SigningError::new(signing_context(&e, document), e))?;
        tracing::info!(
            file = document.file_name(),
            signature_method,
            "detached signature generated"
        );
        Ok(signature)
    }

    /// `true` iff `signature_document` is a valid signature over `original`
    /// made with this provider's key.
    pub fn verify_detached_signature(
        &self,
        original: &[u8],
        signature_document: &[u8],
    ) -> Result<bool, VerificationError> {
        self.verify_detached_signature_detailed(original, signature_document)
            .map(|result| result.is_valid())
    }

    /// Like [`verify_detached_signature`](Self::verify_detached_signature),
    /// with the reason a signature was rejected.
    pub fn verify_detached_signature_detailed(
        &self,
        original: &[u8],
        signature_document: &[u8],
    ) -> Result<VerifyResult, VerificationError> {
        let result = verify::verify(original, signature_document, self.provider.as_ref())
            .map_err(|e| VerificationError::new(verification_context(&e), e))?;
        match &result {
            VerifyResult::Valid => tracing::info!("detached signature is valid"),
            VerifyResult::Invalid { reason } => {
                tracing::info!(%reason, "detached signature is invalid")
            }
        }
        Ok(result)
    }

    /// Describe a signature document without verifying it.
    pub fn inspect(&self, signature_document: &[u8]) -> Result<SignatureSummary, VerificationError> {
        inspect::inspect(signature_document)
            .map_err(|e| VerificationError::new(verification_context(&e), e))
    }
}

impl std::fmt::Debug for XmlDigitalSignature {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("XmlDigitalSignature").finish_non_exhaustive()
    }
}

fn signing_context(err: &Error, document: &Document) -> String {
    match err {
        Error::KeyAccess(_) | Error::Io(_) => "cannot load the signing key".into(),
        Error::UnsupportedAlgorithm(_) => "unsupported signing algorithm".into(),
        _ => format!("failed to sign '{}'", document.file_name()),
    }
}

fn verification_context(err: &Error) -> &'static str {
    match err {
        Error::MissingElement(name) if name == avskild_core::ns::node::SIGNATURE => {
            "Signature node not present"
        }
        Error::XmlParse(_) => "signature document is not well-formed XML",
        Error::KeyAccess(_) | Error::Io(_) => "cannot load the verification key",
        Error::UnsupportedAlgorithm(_) => "unsupported algorithm in signature",
        _ => "cannot verify signature",
    }
}
