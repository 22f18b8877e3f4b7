#![forbid(unsafe_code)]

//! Detached XML digital signatures.
//!
//! ```no_run
//! use avskild::dsig::{Document, XmlDigitalSignature};
//! use avskild::keys::KeyStoreConfig;
//! use avskild::core::algorithm;
//!
//! let dsig = XmlDigitalSignature::from_key_store(KeyStoreConfig::new(
//!     "keystore.p12",
//!     "somealias",
//!     "changeit",
//! ));
//! let document = Document::new("document.xml", std::fs::read("document.xml")?);
//! let signature = dsig.generate_detached_signature(
//!     &document,
//!     algorithm::SHA512,
//!     algorithm::RSA_SHA512,
//! )?;
//! assert!(dsig.verify_detached_signature(document.data(), &signature)?);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub use avskild_c14n as c14n;
pub use avskild_core as core;
pub use avskild_crypto as crypto;
pub use avskild_dsig as dsig;
pub use avskild_keys as keys;
pub use avskild_pkcs12 as pkcs12;
pub use avskild_xml as xml;

pub mod names;
