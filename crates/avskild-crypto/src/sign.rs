#![forbid(unsafe_code)]

//! Signature algorithm implementations (RSA PKCS#1 v1.5, RSA-PSS, ECDSA).

use crate::digest::DigestMethod;
use avskild_core::{algorithm, Error};
use signature::hazmat::{PrehashSigner, PrehashVerifier};
use signature::SignatureEncoding;

/// Key material for signature operations.
#[derive(Clone)]
pub enum SigningKey {
    Rsa(rsa::RsaPrivateKey),
    RsaPublic(rsa::RsaPublicKey),
    EcP256(p256::ecdsa::SigningKey),
    EcP256Public(p256::ecdsa::VerifyingKey),
    EcP384(p384::ecdsa::SigningKey),
    EcP384Public(p384::ecdsa::VerifyingKey),
}

impl SigningKey {
    /// Whether this key can produce signatures.
    pub fn is_private(&self) -> bool {
        matches!(self, Self::Rsa(_) | Self::EcP256(_) | Self::EcP384(_))
    }

    /// The public half of this key.
    pub fn to_public(&self) -> SigningKey {
        match self {
            Self::Rsa(k) => Self::RsaPublic(k.to_public_key()),
            Self::EcP256(k) => Self::EcP256Public(*k.verifying_key()),
            Self::EcP384(k) => Self::EcP384Public(*k.verifying_key()),
            public => public.clone(),
        }
    }

    /// Short human-readable name of the key type.
    pub fn algorithm_name(&self) -> &'static str {
        match self {
            Self::Rsa(_) | Self::RsaPublic(_) => "RSA",
            Self::EcP256(_) | Self::EcP256Public(_) => "EC P-256",
            Self::EcP384(_) | Self::EcP384Public(_) => "EC P-384",
        }
    }
}

impl std::fmt::Debug for SigningKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let kind = if self.is_private() { "private" } else { "public" };
        write!(f, "SigningKey({} {kind})", self.algorithm_name())
    }
}

/// Trait for signature algorithms.
pub trait SignatureAlgorithm: Send {
    fn uri(&self) -> &'static str;
    fn sign(&self, key: &SigningKey, data: &[u8]) -> Result<Vec<u8>, Error>;
    /// Returns `Ok(false)` when the signature does not match; `Err` only
    /// when the key or the signature bytes are unusable for this algorithm.
    fn verify(&self, key: &SigningKey, data: &[u8], signature: &[u8]) -> Result<bool, Error>;
}

/// Create a signature algorithm from its URI.
pub fn from_uri(uri: &str) -> Result<Box<dyn SignatureAlgorithm>, Error> {
    match uri {
        algorithm::RSA_SHA1 => Ok(Box::new(RsaPkcs1v15 { uri: algorithm::RSA_SHA1, hash: HashType::Sha1 })),
        algorithm::RSA_SHA224 => Ok(Box::new(RsaPkcs1v15 { uri: algorithm::RSA_SHA224, hash: HashType::Sha224 })),
        algorithm::RSA_SHA256 => Ok(Box::new(RsaPkcs1v15 { uri: algorithm::RSA_SHA256, hash: HashType::Sha256 })),
        algorithm::RSA_SHA384 => Ok(Box::new(RsaPkcs1v15 { uri: algorithm::RSA_SHA384, hash: HashType::Sha384 })),
        algorithm::RSA_SHA512 => Ok(Box::new(RsaPkcs1v15 { uri: algorithm::RSA_SHA512, hash: HashType::Sha512 })),

        algorithm::RSA_PSS_SHA1 => Ok(Box::new(RsaPss { uri: algorithm::RSA_PSS_SHA1, hash: HashType::Sha1 })),
        algorithm::RSA_PSS_SHA224 => Ok(Box::new(RsaPss { uri: algorithm::RSA_PSS_SHA224, hash: HashType::Sha224 })),
        algorithm::RSA_PSS_SHA256 => Ok(Box::new(RsaPss { uri: algorithm::RSA_PSS_SHA256, hash: HashType::Sha256 })),
        algorithm::RSA_PSS_SHA384 => Ok(Box::new(RsaPss { uri: algorithm::RSA_PSS_SHA384, hash: HashType::Sha384 })),
        algorithm::RSA_PSS_SHA512 => Ok(Box::new(RsaPss { uri: algorithm::RSA_PSS_SHA512, hash: HashType::Sha512 })),

        algorithm::ECDSA_SHA1 => Ok(Box::new(Ecdsa { uri: algorithm::ECDSA_SHA1, hash: HashType::Sha1 })),
        algorithm::ECDSA_SHA224 => Ok(Box::new(Ecdsa { uri: algorithm::ECDSA_SHA224, hash: HashType::Sha224 })),
        algorithm::ECDSA_SHA256 => Ok(Box::new(Ecdsa { uri: algorithm::ECDSA_SHA256, hash: HashType::Sha256 })),
        algorithm::ECDSA_SHA384 => Ok(Box::new(Ecdsa { uri: algorithm::ECDSA_SHA384, hash: HashType::Sha384 })),
        algorithm::ECDSA_SHA512 => Ok(Box::new(Ecdsa { uri: algorithm::ECDSA_SHA512, hash: HashType::Sha512 })),

        _ => Err(Error::UnsupportedAlgorithm(format!("signature algorithm: {uri}"))),
    }
}

#[derive(Debug, Clone, Copy)]
enum HashType { Sha1, Sha224, Sha256, Sha384, Sha512 }

impl HashType {
    fn prehash(self, data: &[u8]) -> Vec<u8> {
        let method = match self {
            HashType::Sha1 => DigestMethod::Sha1,
            HashType::Sha224 => DigestMethod::Sha224,
            HashType::Sha256 => DigestMethod::Sha256,
            HashType::Sha384 => DigestMethod::Sha384,
            HashType::Sha512 => DigestMethod::Sha512,
        };
        method.digest(data)
    }
}

// ── RSA PKCS#1 v1.5 ─────────────────────────────────────────────────

struct RsaPkcs1v15 { uri: &'static str, hash: HashType }

impl RsaPkcs1v15 {
    fn sign_with_key(&self, private_key: &rsa::RsaPrivateKey, data: &[u8]) -> Result<Vec<u8>, Error> {
        use signature::Signer;
        macro_rules! do_sign {
            ($hasher:ty) => {{
                let sk = rsa::pkcs1v15::SigningKey::<$hasher>::new(private_key.clone());
                let sig = sk
                    .try_sign(data)
                    .map_err(|e| Error::Crypto(format!("RSA signing failed: {e}")))?;
                Ok(sig.to_vec())
            }};
        }
        match self.hash {
            HashType::Sha1 => do_sign!(sha1::Sha1),
            HashType::Sha224 => do_sign!(sha2::Sha224),
            HashType::Sha256 => do_sign!(sha2::Sha256),
            HashType::Sha384 => do_sign!(sha2::Sha384),
            HashType::Sha512 => do_sign!(sha2::Sha512),
        }
    }

    fn verify_with_key(&self, public_key: &rsa::RsaPublicKey, data: &[u8], sig_bytes: &[u8]) -> Result<bool, Error> {
        use signature::Verifier;
        let sig = rsa::pkcs1v15::Signature::try_from(sig_bytes)
            .map_err(|e| Error::Crypto(format!("invalid RSA signature: {e}")))?;
        macro_rules! do_verify {
            ($hasher:ty) => {{
                let vk = rsa::pkcs1v15::VerifyingKey::<$hasher>::new(public_key.clone());
                Ok(vk.verify(data, &sig).is_ok())
            }};
        }
        match self.hash {
            HashType::Sha1 => do_verify!(sha1::Sha1),
            HashType::Sha224 => do_verify!(sha2::Sha224),
            HashType::Sha256 => do_verify!(sha2::Sha256),
            HashType::Sha384 => do_verify!(sha2::Sha384),
            HashType::Sha512 => do_verify!(sha2::Sha512),
        }
    }
}

impl SignatureAlgorithm for RsaPkcs1v15 {
    fn uri(&self) -> &'static str { self.uri }

    fn sign(&self, key: &SigningKey, data: &[u8]) -> Result<Vec<u8>, Error> {
        match key {
            SigningKey::Rsa(pk) => self.sign_with_key(pk, data),
            _ => Err(Error::Key("RSA private key required".into())),
        }
    }

    fn verify(&self, key: &SigningKey, data: &[u8], sig_bytes: &[u8]) -> Result<bool, Error> {
        let pubk = match key {
            SigningKey::Rsa(pk) => pk.to_public_key(),
            SigningKey::RsaPublic(pk) => pk.clone(),
            _ => return Err(Error::Key("RSA key required".into())),
        };
        self.verify_with_key(&pubk, data, sig_bytes)
    }
}

// ── RSA-PSS ──────────────────────────────────────────────────────────

struct RsaPss { uri: &'static str, hash: HashType }

impl SignatureAlgorithm for RsaPss {
    fn uri(&self) -> &'static str { self.uri }

    fn sign(&self, key: &SigningKey, data: &[u8]) -> Result<Vec<u8>, Error> {
        use signature::RandomizedSigner;
        let SigningKey::Rsa(private_key) = key else {
            return Err(Error::Key("RSA private key required for PSS".into()));
        };
        let mut rng = rand::thread_rng();
        macro_rules! do_sign {
            ($hasher:ty) => {{
                let sk = rsa::pss::SigningKey::<$hasher>::new(private_key.clone());
                let sig = sk
                    .try_sign_with_rng(&mut rng, data)
                    .map_err(|e| Error::Crypto(format!("RSA-PSS signing failed: {e}")))?;
                Ok(sig.to_vec())
            }};
        }
        match self.hash {
            HashType::Sha1 => do_sign!(sha1::Sha1),
            HashType::Sha224 => do_sign!(sha2::Sha224),
            HashType::Sha256 => do_sign!(sha2::Sha256),
            HashType::Sha384 => do_sign!(sha2::Sha384),
            HashType::Sha512 => do_sign!(sha2::Sha512),
        }
    }

    fn verify(&self, key: &SigningKey, data: &[u8], sig_bytes: &[u8]) -> Result<bool, Error> {
        use signature::Verifier;
        let pubk = match key {
            SigningKey::Rsa(pk) => pk.to_public_key(),
            SigningKey::RsaPublic(pk) => pk.clone(),
            _ => return Err(Error::Key("RSA key required for PSS".into())),
        };
        let sig = rsa::pss::Signature::try_from(sig_bytes)
            .map_err(|e| Error::Crypto(format!("invalid RSA-PSS signature: {e}")))?;
        macro_rules! do_verify {
            ($hasher:ty) => {{
                let vk = rsa::pss::VerifyingKey::<$hasher>::new(pubk);
                Ok(vk.verify(data, &sig).is_ok())
            }};
        }
        match self.hash {
            HashType::Sha1 => do_verify!(sha1::Sha1),
            HashType::Sha224 => do_verify!(sha2::Sha224),
            HashType::Sha256 => do_verify!(sha2::Sha256),
            HashType::Sha384 => do_verify!(sha2::Sha384),
            HashType::Sha512 => do_verify!(sha2::Sha512),
        }
    }
}

// ── ECDSA ────────────────────────────────────────────────────────────

/// ECDSA over P-256 or P-384. The URI fixes the hash; the key fixes the
/// curve.
struct Ecdsa { uri: &'static str, hash: HashType }

/// Convert XML-DSig ECDSA r||s to a typed Signature for P-256.
pub fn xmldsig_to_p256(rs: &[u8]) -> Result<p256::ecdsa::Signature, Error> {
    if rs.len() != 64 {
        return Err(Error::Crypto(format!("P-256 signature must be 64 bytes, got {}", rs.len())));
    }
    let r = p256::FieldBytes::from_slice(&rs[..32]);
    let s = p256::FieldBytes::from_slice(&rs[32..]);
    p256::ecdsa::Signature::from_scalars(*r, *s)
        .map_err(|e| Error::Crypto(format!("invalid P-256 signature: {e}")))
}

/// Convert P-256 signature to XML-DSig r||s format.
pub fn p256_to_xmldsig(sig: &p256::ecdsa::Signature) -> Vec<u8> {
    let (r, s) = sig.split_bytes();
    let mut out = Vec::with_capacity(64);
    out.extend_from_slice(&r);
    out.extend_from_slice(&s);
    out
}

/// Convert XML-DSig ECDSA r||s to a typed Signature for P-384.
pub fn xmldsig_to_p384(rs: &[u8]) -> Result<p384::ecdsa::Signature, Error> {
    if rs.len() != 96 {
        return Err(Error::Crypto(format!("P-384 signature must be 96 bytes, got {}", rs.len())));
    }
    let r = p384::FieldBytes::from_slice(&rs[..48]);
    let s = p384::FieldBytes::from_slice(&rs[48..]);
    p384::ecdsa::Signature::from_scalars(*r, *s)
        .map_err(|e| Error::Crypto(format!("invalid P-384 signature: {e}")))
}

/// Convert P-384 signature to XML-DSig r||s format.
pub fn p384_to_xmldsig(sig: &p384::ecdsa::Signature) -> Vec<u8> {
    let (r, s) = sig.split_bytes();
    let mut out = Vec::with_capacity(96);
    out.extend_from_slice(&r);
    out.extend_from_slice(&s);
    out
}

impl SignatureAlgorithm for Ecdsa {
    fn uri(&self) -> &'static str { self.uri }

    fn sign(&self, key: &SigningKey, data: &[u8]) -> Result<Vec<u8>, Error> {
        let prehash = self.hash.prehash(data);
        match key {
            SigningKey::EcP256(sk) => {
                let sig: p256::ecdsa::Signature = sk
                    .sign_prehash(&field_sized(&prehash, P256_FIELD_LEN))
                    .map_err(|e| Error::Crypto(format!("ECDSA P-256 signing failed: {e}")))?;
                Ok(p256_to_xmldsig(&sig))
            }
            SigningKey::EcP384(sk) => {
                let sig: p384::ecdsa::Signature = sk
                    .sign_prehash(&field_sized(&prehash, P384_FIELD_LEN))
                    .map_err(|e| Error::Crypto(format!("ECDSA P-384 signing failed: {e}")))?;
                Ok(p384_to_xmldsig(&sig))
            }
            _ => Err(Error::Key("EC private key required for ECDSA".into())),
        }
    }

    fn verify(&self, key: &SigningKey, data: &[u8], sig_bytes: &[u8]) -> Result<bool, Error> {
        let prehash = self.hash.prehash(data);
        match key {
            SigningKey::EcP256(sk) => verify_p256(sk.verifying_key(), &prehash, sig_bytes),
            SigningKey::EcP256Public(vk) => verify_p256(vk, &prehash, sig_bytes),
            SigningKey::EcP384(sk) => verify_p384(sk.verifying_key(), &prehash, sig_bytes),
            SigningKey::EcP384Public(vk) => verify_p384(vk, &prehash, sig_bytes),
            _ => Err(Error::Key("EC key required for ECDSA".into())),
        }
    }
}

fn verify_p256(vk: &p256::ecdsa::VerifyingKey, prehash: &[u8], sig_bytes: &[u8]) -> Result<bool, Error> {
    let sig = xmldsig_to_p256(sig_bytes)?;
    Ok(vk.verify_prehash(&field_sized(prehash, P256_FIELD_LEN), &sig).is_ok())
}

fn verify_p384(vk: &p384::ecdsa::VerifyingKey, prehash: &[u8], sig_bytes: &[u8]) -> Result<bool, Error> {
    let sig = xmldsig_to_p384(sig_bytes)?;
    Ok(vk.verify_prehash(&field_sized(prehash, P384_FIELD_LEN), &sig).is_ok())
}

const P256_FIELD_LEN: usize = 32;
const P384_FIELD_LEN: usize = 48;

/// Left-pad a hash shorter than the curve's field with zero bytes.
///
/// bits2int reads the padded value as the same integer, but the prehash
/// APIs reject anything under half the field size (SHA-1 on P-384).
fn field_sized(prehash: &[u8], field_len: usize) -> Vec<u8> {
    if prehash.len() >= field_len {
        return prehash.to_vec();
    }
    let mut padded = vec![0u8; field_len - prehash.len()];
    padded.extend_from_slice(prehash);
    padded
}
