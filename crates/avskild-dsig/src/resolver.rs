#![forbid(unsafe_code)]

//! Detached-content resolution.
//!
//! A detached `Reference` names its content by URI only. The resolver turns
//! that URI into the octets that get digested.

use avskild_core::Error;
use std::cell::Cell;

/// Supplies the bytes behind a reference URI.
pub trait ContentResolver {
    fn resolve(&self, uri: &str) -> Result<Vec<u8>, Error>;
}

impl<F> ContentResolver for F
where
    F: Fn(&str) -> Result<Vec<u8>, Error>,
{
    fn resolve(&self, uri: &str) -> Result<Vec<u8>, Error> {
        self(uri)
    }
}

/// Returns one borrowed buffer, whatever the URI, and only once.
///
/// Created for a single sign or verify call and dropped with it.
#[derive(Debug)]
pub struct CallScopedResolver<'a> {
    content: &'a [u8],
    consumed: Cell<bool>,
}

impl<'a> CallScopedResolver<'a> {
    pub fn new(content: &'a [u8]) -> Self {
        Self {
            content,
            consumed: Cell::new(false),
        }
    }
}

impl ContentResolver for CallScopedResolver<'_> {
    fn resolve(&self, uri: &str) -> Result<Vec<u8>, Error> {
        if self.consumed.replace(true) {
            return Err(Error::InvalidUri(format!(
                "detached content for '{uri}' was already resolved"
            )));
        }
        Ok(self.content.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ignores_uri() {
        let resolver = CallScopedResolver::new(b"hello world");
        assert_eq!(resolver.resolve("anything/at/all.xml").unwrap(), b"hello world");
    }

    #[test]
    fn test_resolves_only_once() {
        let resolver = CallScopedResolver::new(b"data");
        resolver.resolve("a").unwrap();
        assert!(matches!(resolver.resolve("a"), Err(Error::InvalidUri(_))));
    }

    #[test]
    fn test_closure_resolver() {
        let resolver = |uri: &str| -> Result<Vec<u8>, Error> { Ok(uri.as_bytes().to_vec()) };
        assert_eq!(resolver.resolve("doc.xml").unwrap(), b"doc.xml");
    }
}
