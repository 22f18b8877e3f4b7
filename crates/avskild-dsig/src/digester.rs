#![forbid(unsafe_code)]

//! Reference digesting for detached content.

use crate::resolver::ContentResolver;
use avskild_core::Error;
use avskild_crypto::DigestMethod;

/// Resolve `uri` once and digest the returned octets with `digest_method`.
///
/// Detached content is an octet stream: no transforms and no
/// canonicalization are applied.
pub fn digest_reference(
    uri: &str,
    digest_method: &str,
    resolver: &dyn ContentResolver,
) -> Result<Vec<u8>, Error> {
    // Fail on an unknown method before touching the content.
    let method = DigestMethod::from_uri(digest_method)?;
    let content = resolver.resolve(uri)?;
    tracing::debug!(uri, digest_method, len = content.len(), "pre-digest content resolved");
    Ok(method.digest(&content))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolver::{CallScopedResolver, ContentResolver};
    use avskild_core::algorithm;

    #[test]
    fn test_sha256_of_content() {
        let resolver = CallScopedResolver::new(b"abc");
        let digest = digest_reference("doc.xml", algorithm::SHA256, &resolver).unwrap();
        assert_eq!(digest[..4], [0xba, 0x78, 0x16, 0xbf]);
        assert_eq!(digest.len(), 32);
    }

    #[test]
    fn test_unknown_method_does_not_resolve() {
        let resolver = CallScopedResolver::new(b"abc");
        let err = digest_reference("doc.xml", "urn:unknown", &resolver).unwrap_err();
        assert!(matches!(err, Error::UnsupportedAlgorithm(_)));
        // The content is still available.
        assert!(resolver.resolve("doc.xml").is_ok());
    }
}
