#![forbid(unsafe_code)]

//! Key providers: where the signing identity comes from.
//!
//! A provider hands out one private key and its certificate. The verifier
//! trusts whatever its provider returns and nothing embedded in the
//! signature document.

use crate::key::Key;
use crate::loader;
use crate::x509::Certificate;
use avskild_core::Error;
use std::path::{Path, PathBuf};

/// Location and credentials of a PKCS#12 key store entry.
#[derive(Clone)]
pub struct KeyStoreConfig {
    path: PathBuf,
    alias: String,
    password: String,
}

impl KeyStoreConfig {
    pub fn new(
        path: impl Into<PathBuf>,
        alias: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            path: path.into(),
            alias: alias.into(),
            password: password.into(),
        }
    }

    pub fn with_alias(mut self, alias: impl Into<String>) -> Self {
        self.alias = alias.into();
        self
    }

    /// Set the passphrase, used both for the container MAC and the key bag.
    pub fn with_password(mut self, password: impl Into<String>) -> Self {
        self.password = password.into();
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn alias(&self) -> &str {
        &self.alias
    }
}

impl std::fmt::Debug for KeyStoreConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyStoreConfig")
            .field("path", &self.path)
            .field("alias", &self.alias)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// The decoded entry of a key store, as returned by [`KeyProvider::load`].
#[derive(Debug, Clone)]
pub struct KeyStore {
    pub alias: String,
    pub private_key: Option<Key>,
    pub certificate: Option<Certificate>,
}

/// Source of the signing key and certificate.
pub trait KeyProvider: Send + Sync {
    /// Open the key store.
    fn load(&self) -> Result<KeyStore, Error>;

    /// The private key of the configured entry.
    fn private_key(&self, store: &KeyStore) -> Result<Key, Error> {
        store.private_key.clone().ok_or_else(|| {
            Error::KeyAccess(format!("no private key for alias '{}'", store.alias))
        })
    }

    /// The certificate of the configured entry.
    fn certificate(&self, store: &KeyStore) -> Result<Certificate, Error> {
        store.certificate.clone().ok_or_else(|| {
            Error::KeyAccess(format!("no certificate for alias '{}'", store.alias))
        })
    }
}

/// Reads a PKCS#12 (`.p12`/`.pfx`) file on every [`load`](KeyProvider::load).
#[derive(Debug, Clone)]
pub struct Pkcs12KeyProvider {
    config: KeyStoreConfig,
}

impl Pkcs12KeyProvider {
    pub fn new(config: KeyStoreConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &KeyStoreConfig {
        &self.config
    }
}

impl KeyProvider for Pkcs12KeyProvider {
    fn load(&self) -> Result<KeyStore, Error> {
        let config = &self.config;
        tracing::debug!(path = %config.path.display(), alias = %config.alias, "opening PKCS#12 key store");

        let data = std::fs::read(&config.path).map_err(|e| {
            Error::KeyAccess(format!(
                "cannot read key store {}: {e}",
                config.path.display()
            ))
        })?;
        let contents = avskild_pkcs12::parse_pkcs12(&data, &config.password)?;

        let cert_bag = contents.certificate_for_alias(&config.alias);
        let key_bag = contents.private_key_for_alias(&config.alias);
        if cert_bag.is_none() && key_bag.is_none() {
            return Err(Error::KeyAccess(format!(
                "alias '{}' not found in key store (available: {})",
                config.alias,
                contents.aliases().join(", ")
            )));
        }

        let certificate = cert_bag
            .map(|bag| Certificate::from_der(&bag.der))
            .transpose()?;
        let private_key = key_bag
            .map(|bag| {
                loader::load_private_key_pkcs8_der(&bag.der)
                    .map(|key| key.with_name(config.alias.clone()))
            })
            .transpose()?;

        if let (Some(key), Some(cert)) = (&private_key, &certificate) {
            if !key.same_public_key(cert.public_key()) {
                return Err(Error::KeyAccess(format!(
                    "private key for alias '{}' does not match its certificate",
                    config.alias
                )));
            }
        }

        tracing::debug!(
            alias = %config.alias,
            key = ?private_key.as_ref().map(|k| &k.data),
            subject = certificate.as_ref().map(|c| c.subject_name()),
            "loaded key store entry"
        );

        Ok(KeyStore {
            alias: config.alias.clone(),
            private_key,
            certificate,
        })
    }
}

/// Holds key material that was loaded elsewhere.
#[derive(Debug, Clone)]
pub struct StaticKeyProvider {
    private_key: Option<Key>,
    certificate: Certificate,
}

impl StaticKeyProvider {
    /// A provider for signing and verifying.
    pub fn new(private_key: Key, certificate: Certificate) -> Self {
        Self {
            private_key: Some(private_key),
            certificate,
        }
    }

    /// A verify-only provider.
    pub fn verifying(certificate: Certificate) -> Self {
        Self {
            private_key: None,
            certificate,
        }
    }

    /// Build from a PEM private key and a PEM certificate.
    pub fn from_pem(key_pem: &[u8], cert_pem: &[u8]) -> Result<Self, Error> {
        let key = loader::load_private_key_pem(key_pem)?;
        let certificate = Certificate::from_pem(cert_pem)?;
        if !key.same_public_key(certificate.public_key()) {
            return Err(Error::KeyAccess(
                "private key does not match the certificate".into(),
            ));
        }
        Ok(Self::new(key, certificate))
    }
}

impl KeyProvider for StaticKeyProvider {
    fn load(&self) -> Result<KeyStore, Error> {
        Ok(KeyStore {
            alias: self.certificate.subject_name().to_owned(),
            private_key: self.private_key.clone(),
            certificate: Some(self.certificate.clone()),
        })
    }
}
