#![forbid(unsafe_code)]

//! Core types shared by the avskild crates: the error enum, algorithm
//! identifiers and XML-DSig namespace/element names.

pub mod algorithm;
pub mod error;
pub mod ns;

pub use error::{Error, Result};
