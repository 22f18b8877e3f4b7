#![forbid(unsafe_code)]

//! Key types and data structures.

use avskild_crypto::SigningKey;

/// The underlying key data.
#[derive(Clone)]
pub enum KeyData {
    Rsa {
        private: Option<rsa::RsaPrivateKey>,
        public: rsa::RsaPublicKey,
    },
    EcP256 {
        private: Option<p256::ecdsa::SigningKey>,
        public: p256::ecdsa::VerifyingKey,
    },
    EcP384 {
        private: Option<p384::ecdsa::SigningKey>,
        public: p384::ecdsa::VerifyingKey,
    },
}

impl std::fmt::Debug for KeyData {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Rsa { private, public } => {
                use rsa::traits::PublicKeyParts;
                let kind = if private.is_some() { "private+public" } else { "public" };
                write!(f, "RSA-{} {kind} key", public.size() * 8)
            }
            Self::EcP256 { private, .. } => {
                if private.is_some() {
                    write!(f, "EC P-256 private+public key")
                } else {
                    write!(f, "EC P-256 public key")
                }
            }
            Self::EcP384 { private, .. } => {
                if private.is_some() {
                    write!(f, "EC P-384 private+public key")
                } else {
                    write!(f, "EC P-384 public key")
                }
            }
        }
    }
}

/// A named key with associated data.
#[derive(Debug, Clone)]
pub struct Key {
    /// Optional name, the key store alias for provider keys.
    pub name: Option<String>,
    /// The key data.
    pub data: KeyData,
}

impl Key {
    /// Create a new key.
    pub fn new(data: KeyData) -> Self {
        Self { name: None, data }
    }

    /// Set the key name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Whether private key material is present.
    pub fn has_private(&self) -> bool {
        match &self.data {
            KeyData::Rsa { private, .. } => private.is_some(),
            KeyData::EcP256 { private, .. } => private.is_some(),
            KeyData::EcP384 { private, .. } => private.is_some(),
        }
    }

    /// Convert to a `SigningKey`, private if available.
    pub fn to_signing_key(&self) -> SigningKey {
        match &self.data {
            KeyData::Rsa { private: Some(pk), .. } => SigningKey::Rsa(pk.clone()),
            KeyData::Rsa { public, .. } => SigningKey::RsaPublic(public.clone()),
            KeyData::EcP256 { private: Some(sk), .. } => SigningKey::EcP256(sk.clone()),
            KeyData::EcP256 { public, .. } => SigningKey::EcP256Public(*public),
            KeyData::EcP384 { private: Some(sk), .. } => SigningKey::EcP384(sk.clone()),
            KeyData::EcP384 { public, .. } => SigningKey::EcP384Public(*public),
        }
    }

    /// Convert the public half to a `SigningKey` usable for verification.
    pub fn to_verifying_key(&self) -> SigningKey {
        match &self.data {
            KeyData::Rsa { public, .. } => SigningKey::RsaPublic(public.clone()),
            KeyData::EcP256 { public, .. } => SigningKey::EcP256Public(*public),
            KeyData::EcP384 { public, .. } => SigningKey::EcP384Public(*public),
        }
    }

    /// Get the RSA public key if available.
    pub fn rsa_public_key(&self) -> Option<&rsa::RsaPublicKey> {
        match &self.data {
            KeyData::Rsa { public, .. } => Some(public),
            _ => None,
        }
    }

    /// Whether both keys hold the same public key.
    pub fn same_public_key(&self, other: &Key) -> bool {
        match (&self.data, &other.data) {
            (KeyData::Rsa { public: a, .. }, KeyData::Rsa { public: b, .. }) => a == b,
            (KeyData::EcP256 { public: a, .. }, KeyData::EcP256 { public: b, .. }) => a == b,
            (KeyData::EcP384 { public: a, .. }, KeyData::EcP384 { public: b, .. }) => a == b,
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ec_key() -> Key {
        let sk = p256::ecdsa::SigningKey::random(&mut rand::thread_rng());
        let public = *sk.verifying_key();
        Key::new(KeyData::EcP256 { private: Some(sk), public })
    }

    #[test]
    fn test_signing_and_verifying_views() {
        let key = ec_key().with_name("ecalias");
        assert_eq!(key.name.as_deref(), Some("ecalias"));
        assert!(key.has_private());
        assert!(key.to_signing_key().is_private());
        assert!(!key.to_verifying_key().is_private());
        assert!(key.rsa_public_key().is_none());
    }

    #[test]
    fn test_same_public_key() {
        let a = ec_key();
        let b = ec_key();
        assert!(a.same_public_key(&a.clone()));
        assert!(!a.same_public_key(&b));
    }

    #[test]
    fn test_debug_never_shows_key_material() {
        let shown = format!("{:?}", ec_key());
        assert!(shown.contains("EC P-256 private+public key"));
    }
}
