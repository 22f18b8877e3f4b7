#![forbid(unsafe_code)]

//! Detached XML Digital Signatures.
//!
//! A detached signature covers content that lives outside the signature
//! document: the single `Reference` names the content by URI and carries
//! its digest. [`XmlDigitalSignature`] creates such documents and verifies
//! them against the original bytes.

pub mod api;
pub mod compose;
pub mod digester;
pub mod document;
pub mod error;
pub mod inspect;
pub mod resolver;
pub mod verify;

pub use api::XmlDigitalSignature;
pub use document::Document;
pub use error::{SigningError, VerificationError};
pub use inspect::SignatureSummary;
pub use resolver::{CallScopedResolver, ContentResolver};
pub use verify::VerifyResult;
