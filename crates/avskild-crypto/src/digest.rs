#![forbid(unsafe_code)]

//! Digest methods for `DigestMethod` and signature prehashing.

use avskild_core::{algorithm, Error};
use digest::Digest;

/// A hash function named by its XML-DSig URI.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DigestMethod {
    Sha1,
    Sha224,
    Sha256,
    Sha384,
    Sha512,
    Sha3_224,
    Sha3_256,
    Sha3_384,
    Sha3_512,
}

impl DigestMethod {
    pub fn from_uri(uri: &str) -> Result<Self, Error> {
        Ok(match uri {
            algorithm::SHA1 => Self::Sha1,
            algorithm::SHA224 => Self::Sha224,
            algorithm::SHA256 => Self::Sha256,
            algorithm::SHA384 => Self::Sha384,
            algorithm::SHA512 => Self::Sha512,
            algorithm::SHA3_224 => Self::Sha3_224,
            algorithm::SHA3_256 => Self::Sha3_256,
            algorithm::SHA3_384 => Self::Sha3_384,
            algorithm::SHA3_512 => Self::Sha3_512,
            _ => {
                return Err(Error::UnsupportedAlgorithm(format!(
                    "digest algorithm: {uri}"
                )))
            }
        })
    }

    pub fn uri(self) -> &'static str {
        match self {
            Self::Sha1 => algorithm::SHA1,
            Self::Sha224 => algorithm::SHA224,
            Self::Sha256 => algorithm::SHA256,
            Self::Sha384 => algorithm::SHA384,
            Self::Sha512 => algorithm::SHA512,
            Self::Sha3_224 => algorithm::SHA3_224,
            Self::Sha3_256 => algorithm::SHA3_256,
            Self::Sha3_384 => algorithm::SHA3_384,
            Self::Sha3_512 => algorithm::SHA3_512,
        }
    }

    /// Output size in bytes.
    pub fn output_len(self) -> usize {
        match self {
            Self::Sha1 => 20,
            Self::Sha224 | Self::Sha3_224 => 28,
            Self::Sha256 | Self::Sha3_256 => 32,
            Self::Sha384 | Self::Sha3_384 => 48,
            Self::Sha512 | Self::Sha3_512 => 64,
        }
    }

    /// Hash `data` in one pass.
    pub fn digest(self, data: &[u8]) -> Vec<u8> {
        match self {
            Self::Sha1 => hash::<sha1::Sha1>(data),
            Self::Sha224 => hash::<sha2::Sha224>(data),
            Self::Sha256 => hash::<sha2::Sha256>(data),
            Self::Sha384 => hash::<sha2::Sha384>(data),
            Self::Sha512 => hash::<sha2::Sha512>(data),
            Self::Sha3_224 => hash::<sha3::Sha3_224>(data),
            Self::Sha3_256 => hash::<sha3::Sha3_256>(data),
            Self::Sha3_384 => hash::<sha3::Sha3_384>(data),
            Self::Sha3_512 => hash::<sha3::Sha3_512>(data),
        }
    }
}

fn hash<D: Digest>(data: &[u8]) -> Vec<u8> {
    D::digest(data).to_vec()
}

/// Digest `data` with the method named by `uri`.
pub fn digest(uri: &str, data: &[u8]) -> Result<Vec<u8>, Error> {
    Ok(DigestMethod::from_uri(uri)?.digest(data))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hex(bytes: &[u8]) -> String {
        bytes.iter().map(|b| format!("{b:02x}")).collect()
    }

    #[test]
    fn test_known_answers() {
        assert_eq!(
            hex(&digest(algorithm::SHA256, b"hello").unwrap()),
            "2cf24dba5fb0a30e26e83b2ac5b9e29e1b161e5c1fa7425e73043362938b9824"
        );
        assert_eq!(
            hex(&digest(algorithm::SHA1, b"hello").unwrap()),
            "aaf4c61ddcc5e8a2dabede0f3b482cd9aea9434d"
        );
        assert_eq!(
            hex(&digest(algorithm::SHA3_256, b"").unwrap()),
            "a7ffc6f8bf1ed76651c14756a061d662f580ff4de43b49fa82d80a4b80f8434a"
        );
    }

    #[test]
    fn test_every_listed_digest() {
        for uri in algorithm::DIGESTS {
            let method = DigestMethod::from_uri(uri).unwrap();
            assert_eq!(method.uri(), *uri);
            assert_eq!(method.digest(b"hello").len(), method.output_len(), "{uri}");
        }
    }

    #[test]
    fn test_unknown_uri() {
        let err = digest("http://www.w3.org/2001/04/xmldsig-more#md5", b"x");
        assert!(matches!(err, Err(Error::UnsupportedAlgorithm(_))));
    }
}
