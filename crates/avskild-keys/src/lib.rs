#![forbid(unsafe_code)]

//! Key management for avskild.
//!
//! Loads keys and certificates from PKCS#8, PKCS#1, X.509 and PKCS#12
//! sources, writes and reads `<KeyInfo>`, and defines the [`KeyProvider`]
//! contract through which signing and verification obtain their keys.

pub mod key;
pub mod keyinfo;
pub mod loader;
pub mod provider;
pub mod x509;

pub use key::{Key, KeyData};
pub use provider::{KeyProvider, KeyStore, KeyStoreConfig, Pkcs12KeyProvider, StaticKeyProvider};
pub use x509::Certificate;
