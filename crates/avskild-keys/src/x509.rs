#![forbid(unsafe_code)]

//! X.509 identity certificates.
//!
//! A signature document carries the signer's certificate and subject name.
//! Chain building and validity periods are outside the scope of this crate:
//! trust comes from the key provider, not from the certificate.

use crate::key::Key;
use crate::loader;
use avskild_core::Error;

/// A parsed X.509 certificate with its DER encoding and public key.
#[derive(Clone)]
pub struct Certificate {
    der: Vec<u8>,
    subject: String,
    public_key: Key,
}

impl Certificate {
    /// Parse a DER-encoded certificate.
    pub fn from_der(der_bytes: &[u8]) -> Result<Self, Error> {
        use der::{Decode, Encode};

        let cert = x509_cert::Certificate::from_der(der_bytes)
            .map_err(|e| Error::Certificate(format!("failed to parse X.509 certificate: {e}")))?;

        let spki_der = cert
            .tbs_certificate
            .subject_public_key_info
            .to_der()
            .map_err(|e| Error::Certificate(format!("failed to encode SPKI: {e}")))?;
        let public_key = loader::load_spki_der(&spki_der).map_err(|e| {
            Error::Certificate(format!("unsupported public key in X.509 certificate: {e}"))
        })?;

        Ok(Self {
            der: der_bytes.to_vec(),
            // RdnSequence displays in RFC 4514 order: most specific RDN first
            subject: cert.tbs_certificate.subject.to_string(),
            public_key,
        })
    }

    /// Parse a PEM-encoded (`CERTIFICATE`) certificate.
    pub fn from_pem(pem_data: &[u8]) -> Result<Self, Error> {
        let (label, der_bytes) = loader::decode_pem(pem_data)?;
        if label != "CERTIFICATE" {
            return Err(Error::Certificate(format!(
                "expected CERTIFICATE PEM label, got: {label}"
            )));
        }
        Self::from_der(&der_bytes)
    }

    /// Parse a base64 `X509Certificate` value; whitespace is ignored.
    pub fn from_base64(text: &str) -> Result<Self, Error> {
        use base64::Engine;
        let clean: String = text.chars().filter(|c| !c.is_whitespace()).collect();
        let der_bytes = base64::engine::general_purpose::STANDARD
            .decode(clean)
            .map_err(|e| Error::Base64(format!("X509Certificate: {e}")))?;
        Self::from_der(&der_bytes)
    }

    /// The DER encoding.
    pub fn der(&self) -> &[u8] {
        &self.der
    }

    /// The subject distinguished name in RFC 4514 form.
    pub fn subject_name(&self) -> &str {
        &self.subject
    }

    pub fn public_key(&self) -> &Key {
        &self.public_key
    }

    /// The DER encoding as single-line base64.
    pub fn to_base64(&self) -> String {
        use base64::Engine;
        base64::engine::general_purpose::STANDARD.encode(&self.der)
    }
}

impl std::fmt::Debug for Certificate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Certificate")
            .field("subject", &self.subject)
            .field("public_key", &self.public_key.data)
            .finish()
    }
}
