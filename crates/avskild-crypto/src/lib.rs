#![forbid(unsafe_code)]

//! Cryptographic algorithm implementations for avskild.
//!
//! Provides the digests used for `DigestMethod` and the public-key
//! signature algorithms used for `SignatureMethod`.

pub mod digest;
pub mod sign;

pub use digest::DigestMethod;
pub use sign::{SignatureAlgorithm, SigningKey};
