#![forbid(unsafe_code)]

//! Short command-line names for algorithm URIs.

use avskild_core::{algorithm, Error};

/// Short digest names and their URIs.
pub const DIGEST_NAMES: &[(&str, &str)] = &[
    ("sha1", algorithm::SHA1),
    ("sha224", algorithm::SHA224),
    ("sha256", algorithm::SHA256),
    ("sha384", algorithm::SHA384),
    ("sha512", algorithm::SHA512),
    ("sha3-224", algorithm::SHA3_224),
    ("sha3-256", algorithm::SHA3_256),
    ("sha3-384", algorithm::SHA3_384),
    ("sha3-512", algorithm::SHA3_512),
];

/// Short signature names and their URIs.
pub const SIGNATURE_NAMES: &[(&str, &str)] = &[
    ("rsa-sha1", algorithm::RSA_SHA1),
    ("rsa-sha224", algorithm::RSA_SHA224),
    ("rsa-sha256", algorithm::RSA_SHA256),
    ("rsa-sha384", algorithm::RSA_SHA384),
    ("rsa-sha512", algorithm::RSA_SHA512),
    ("rsa-pss-sha1", algorithm::RSA_PSS_SHA1),
    ("rsa-pss-sha224", algorithm::RSA_PSS_SHA224),
    ("rsa-pss-sha256", algorithm::RSA_PSS_SHA256),
    ("rsa-pss-sha384", algorithm::RSA_PSS_SHA384),
    ("rsa-pss-sha512", algorithm::RSA_PSS_SHA512),
    ("ecdsa-sha1", algorithm::ECDSA_SHA1),
    ("ecdsa-sha224", algorithm::ECDSA_SHA224),
    ("ecdsa-sha256", algorithm::ECDSA_SHA256),
    ("ecdsa-sha384", algorithm::ECDSA_SHA384),
    ("ecdsa-sha512", algorithm::ECDSA_SHA512),
];

/// Accept a supported digest URI or its short name.
pub fn digest_uri(name: &str) -> Result<&str, Error> {
    lookup(name, DIGEST_NAMES, algorithm::DIGESTS)
        .ok_or_else(|| Error::UnsupportedAlgorithm(format!("digest algorithm: {name}")))
}

/// Accept a supported signature URI or its short name.
pub fn signature_uri(name: &str) -> Result<&str, Error> {
    lookup(name, SIGNATURE_NAMES, algorithm::SIGNATURES)
        .ok_or_else(|| Error::UnsupportedAlgorithm(format!("signature algorithm: {name}")))
}

fn lookup<'a>(
    name: &'a str,
    names: &[(&str, &'static str)],
    uris: &[&str],
) -> Option<&'a str> {
    if uris.contains(&name) {
        return Some(name);
    }
    names
        .iter()
        .find(|(short, _)| short.eq_ignore_ascii_case(name))
        .map(|(_, uri)| *uri)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_names() {
        assert_eq!(digest_uri("sha512").unwrap(), algorithm::SHA512);
        assert_eq!(digest_uri("SHA3-256").unwrap(), algorithm::SHA3_256);
        assert_eq!(signature_uri("rsa-sha512").unwrap(), algorithm::RSA_SHA512);
        assert_eq!(signature_uri("ecdsa-sha256").unwrap(), algorithm::ECDSA_SHA256);
    }

    #[test]
    fn test_uris_pass_through() {
        assert_eq!(digest_uri(algorithm::SHA256).unwrap(), algorithm::SHA256);
        assert_eq!(
            signature_uri(algorithm::RSA_PSS_SHA384).unwrap(),
            algorithm::RSA_PSS_SHA384
        );
    }

    #[test]
    fn test_unknown_names() {
        assert!(digest_uri("md5").is_err());
        assert!(signature_uri("rsa-sha512x").is_err());
        assert!(signature_uri(algorithm::SHA256).is_err());
    }

    #[test]
    fn test_every_short_name_is_supported() {
        for (_, uri) in DIGEST_NAMES {
            assert!(algorithm::DIGESTS.contains(uri));
        }
        for (_, uri) in SIGNATURE_NAMES {
            assert!(algorithm::SIGNATURES.contains(uri));
        }
    }
}
