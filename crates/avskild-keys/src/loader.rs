#![forbid(unsafe_code)]

//! Key loading from PKCS#8, PKCS#1 and X.509 encodings.

use crate::key::{Key, KeyData};
use avskild_core::Error;

/// Load a private key from PKCS#8 DER bytes (as extracted from PKCS#12 or other containers).
///
/// Tries RSA, then EC P-256, then P-384.
pub fn load_private_key_pkcs8_der(der: &[u8]) -> Result<Key, Error> {
    use pkcs8::DecodePrivateKey;

    if let Ok(pk) = rsa::RsaPrivateKey::from_pkcs8_der(der) {
        let public = pk.to_public_key();
        return Ok(Key::new(KeyData::Rsa {
            private: Some(pk),
            public,
        }));
    }

    if let Ok(sk) = p256::ecdsa::SigningKey::from_pkcs8_der(der) {
        let public = *sk.verifying_key();
        return Ok(Key::new(KeyData::EcP256 {
            private: Some(sk),
            public,
        }));
    }

    if let Ok(sk) = p384::ecdsa::SigningKey::from_pkcs8_der(der) {
        let public = *sk.verifying_key();
        return Ok(Key::new(KeyData::EcP384 {
            private: Some(sk),
            public,
        }));
    }

    Err(Error::Key(
        "unable to parse PKCS#8 DER private key (tried RSA, P-256, P-384)".into(),
    ))
}

/// Load a private key from PEM: PKCS#8 `PRIVATE KEY` or PKCS#1 `RSA PRIVATE KEY`.
pub fn load_private_key_pem(pem_data: &[u8]) -> Result<Key, Error> {
    let (label, der_bytes) = decode_pem(pem_data)?;
    match label.as_str() {
        "PRIVATE KEY" => load_private_key_pkcs8_der(&der_bytes),
        "RSA PRIVATE KEY" => {
            use pkcs1::DecodeRsaPrivateKey;
            let pk = rsa::RsaPrivateKey::from_pkcs1_der(&der_bytes)
                .map_err(|e| Error::Key(format!("failed to parse RSA private key: {e}")))?;
            let public = pk.to_public_key();
            Ok(Key::new(KeyData::Rsa {
                private: Some(pk),
                public,
            }))
        }
        "ENCRYPTED PRIVATE KEY" => Err(Error::Key(
            "encrypted PEM keys are not supported; use a PKCS#12 key store".into(),
        )),
        _ => Err(Error::Key(format!("unsupported PEM label: {label}"))),
    }
}

/// Load a public key from raw SubjectPublicKeyInfo DER bytes.
pub fn load_spki_der(spki_der: &[u8]) -> Result<Key, Error> {
    use spki::DecodePublicKey;

    if let Ok(public) = rsa::RsaPublicKey::from_public_key_der(spki_der) {
        return Ok(Key::new(KeyData::Rsa {
            private: None,
            public,
        }));
    }

    if let Ok(public) = p256::ecdsa::VerifyingKey::from_public_key_der(spki_der) {
        return Ok(Key::new(KeyData::EcP256 {
            private: None,
            public,
        }));
    }

    if let Ok(public) = p384::ecdsa::VerifyingKey::from_public_key_der(spki_der) {
        return Ok(Key::new(KeyData::EcP384 {
            private: None,
            public,
        }));
    }

    Err(Error::Key(
        "unsupported public key algorithm in SPKI DER".into(),
    ))
}

/// Split PEM text into its label and DER payload.
pub(crate) fn decode_pem(pem_data: &[u8]) -> Result<(String, Vec<u8>), Error> {
    let pem_str = std::str::from_utf8(pem_data)
        .map_err(|e| Error::Key(format!("invalid PEM encoding: {e}")))?;
    // Some PEM files carry extra blank lines around the block
    let (label, der_bytes) = pem_rfc7468::decode_vec(pem_str.trim().as_bytes())
        .map_err(|e| Error::Key(format!("failed to decode PEM: {e}")))?;
    Ok((label.to_owned(), der_bytes))
}
