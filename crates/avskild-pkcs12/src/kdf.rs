#![forbid(unsafe_code)]

//! Key derivation and decryption for PKCS#12.
//!
//! Three paths:
//! 1. PKCS#12 KDF (RFC 7292 Appendix B) for MAC key derivation and legacy PBE
//! 2. Legacy PBE: pbeWithSHAAnd3-KeyTripleDES-CBC using the PKCS#12 KDF
//! 3. PBES2: PBKDF2 + AES-256-CBC (OpenSSL 3.x and JDK default)

use avskild_core::Error;
use cipher::{block_padding::Pkcs7, BlockDecryptMut, KeyIvInit};
use hmac::{Hmac, Mac};
use sha1::Sha1;
use sha2::{Digest, Sha256};

type Aes256CbcDec = cbc::Decryptor<aes::Aes256>;
type Des3CbcDec = cbc::Decryptor<des::TdesEde3>;

/// PKCS#12 KDF ID values (RFC 7292 Appendix B.3).
pub const ID_KEY: u8 = 1;
pub const ID_IV: u8 = 2;
pub const ID_MAC: u8 = 3;

/// Block size `v` of SHA-1 and SHA-256, in bytes.
const KDF_BLOCK: usize = 64;

/// PKCS#12 KDF (RFC 7292 Appendix B) over hash `D`.
///
/// `password` is the BMP-encoded password (see [`password_to_bmp`]);
/// `id` selects key, IV or MAC material.
pub fn pkcs12_kdf<D>(
    id: u8,
    password: &[u8],
    salt: &[u8],
    iterations: u32,
    output_len: usize,
) -> Vec<u8>
where
    D: Digest + sha2::digest::FixedOutputReset,
{
    let u = <D as Digest>::output_size();
    let v = KDF_BLOCK;
    let d_block = vec![id; v];

    // I = S || P, each stretched to a multiple of v
    let mut i_block = extend_to_multiple(salt, v);
    i_block.extend_from_slice(&extend_to_multiple(password, v));

    let num_blocks = output_len.div_ceil(u);
    let mut result = Vec::with_capacity(num_blocks * u);

    for block_idx in 0..num_blocks {
        let mut hasher = D::new();
        Digest::update(&mut hasher, &d_block);
        Digest::update(&mut hasher, &i_block);
        let mut a = hasher.finalize_reset();

        for _ in 1..iterations {
            Digest::update(&mut hasher, &a);
            a = hasher.finalize_reset();
        }

        result.extend_from_slice(&a);

        if block_idx + 1 < num_blocks {
            let b = extend_to_multiple(&a, v);
            // I_j = (I_j + B + 1) mod 2^(v*8)
            for chunk in i_block.chunks_mut(v) {
                add_one_plus_b(chunk, &b);
            }
        }
    }

    result.truncate(output_len);
    result
}

/// Repeat `data` to fill a multiple of `v` bytes. Empty input stays empty.
fn extend_to_multiple(data: &[u8], v: usize) -> Vec<u8> {
    if data.is_empty() {
        return Vec::new();
    }
    let len = data.len().div_ceil(v) * v;
    data.iter().copied().cycle().take(len).collect()
}

/// Compute (I_j + B + 1) mod 2^(v*8) in place.
fn add_one_plus_b(block: &mut [u8], b: &[u8]) {
    let mut carry: u16 = 1;
    for (x, y) in block.iter_mut().zip(b).rev() {
        let sum = *x as u16 + *y as u16 + carry;
        *x = sum as u8;
        carry = sum >> 8;
    }
}

/// Encode a password as BMP (UTF-16BE) with two trailing zero bytes.
pub fn password_to_bmp(password: &str) -> Vec<u8> {
    if password.is_empty() {
        return Vec::new();
    }
    let mut bmp: Vec<u8> = password.encode_utf16().flat_map(u16::to_be_bytes).collect();
    bmp.extend_from_slice(&[0, 0]);
    bmp
}

/// Decrypt with pbeWithSHAAnd3-KeyTripleDES-CBC.
pub fn decrypt_pbe_sha1_3des(
    ciphertext: &[u8],
    password: &[u8],
    salt: &[u8],
    iterations: u32,
) -> Result<Vec<u8>, Error> {
    let key = pkcs12_kdf::<Sha1>(ID_KEY, password, salt, iterations, 24);
    let iv = pkcs12_kdf::<Sha1>(ID_IV, password, salt, iterations, 8);

    let decryptor = Des3CbcDec::new_from_slices(&key, &iv)
        .map_err(|e| Error::KeyAccess(format!("3DES-CBC init failed: {e}")))?;

    let mut buf = ciphertext.to_vec();
    let plaintext = decryptor
        .decrypt_padded_mut::<Pkcs7>(&mut buf)
        .map_err(|e| Error::KeyAccess(format!("3DES-CBC decrypt/unpad failed: {e}")))?;

    Ok(plaintext.to_vec())
}

/// PBKDF2 pseudo-random function.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Prf {
    HmacSha1,
    HmacSha256,
}

/// Decrypt with PBES2: PBKDF2 (with `prf`) + AES-256-CBC.
pub fn decrypt_pbes2_aes256cbc(
    ciphertext: &[u8],
    password: &str,
    prf: Prf,
    salt: &[u8],
    iterations: u32,
    iv: &[u8],
) -> Result<Vec<u8>, Error> {
    let mut key = [0u8; 32];
    match prf {
        Prf::HmacSha1 => pbkdf2::pbkdf2_hmac::<Sha1>(password.as_bytes(), salt, iterations, &mut key),
        Prf::HmacSha256 => {
            pbkdf2::pbkdf2_hmac::<Sha256>(password.as_bytes(), salt, iterations, &mut key)
        }
    }

    let decryptor = Aes256CbcDec::new_from_slices(&key, iv)
        .map_err(|e| Error::KeyAccess(format!("AES-256-CBC init failed: {e}")))?;

    let mut buf = ciphertext.to_vec();
    let plaintext = decryptor
        .decrypt_padded_mut::<Pkcs7>(&mut buf)
        .map_err(|e| Error::KeyAccess(format!("AES-256-CBC decrypt/unpad failed: {e}")))?;

    Ok(plaintext.to_vec())
}

/// Compute the PFX integrity MAC and compare it with `expected`.
pub fn verify_hmac_sha1(key: &[u8], data: &[u8], expected: &[u8]) -> Result<bool, Error> {
    let mut mac = Hmac::<Sha1>::new_from_slice(key)
        .map_err(|e| Error::KeyAccess(format!("HMAC init failed: {e}")))?;
    mac.update(data);
    Ok(mac.verify_slice(expected).is_ok())
}

pub fn verify_hmac_sha256(key: &[u8], data: &[u8], expected: &[u8]) -> Result<bool, Error> {
    let mut mac = Hmac::<Sha256>::new_from_slice(key)
        .map_err(|e| Error::KeyAccess(format!("HMAC init failed: {e}")))?;
    mac.update(data);
    Ok(mac.verify_slice(expected).is_ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pkcs12_kdf_sha1_basic() {
        let password = password_to_bmp("test");
        let salt = b"saltsalt";
        let key = pkcs12_kdf::<Sha1>(ID_KEY, &password, salt, 2048, 24);
        assert_eq!(key.len(), 24);
        assert_eq!(key, pkcs12_kdf::<Sha1>(ID_KEY, &password, salt, 2048, 24));

        let iv = pkcs12_kdf::<Sha1>(ID_IV, &password, salt, 2048, 8);
        assert_eq!(iv.len(), 8);
        assert_ne!(&key[..8], &iv[..]);
    }

    #[test]
    fn test_pkcs12_kdf_sha256_multi_block() {
        let password = password_to_bmp("test");
        let long = pkcs12_kdf::<Sha256>(ID_KEY, &password, b"salt", 3, 40);
        assert_eq!(long.len(), 40);
        // the first block does not depend on how much is requested
        assert_eq!(&long[..32], &pkcs12_kdf::<Sha256>(ID_KEY, &password, b"salt", 3, 32)[..]);
    }

    #[test]
    fn test_password_to_bmp() {
        assert!(password_to_bmp("").is_empty());
        assert_eq!(password_to_bmp("A"), vec![0x00, 0x41, 0x00, 0x00]);
        assert_eq!(password_to_bmp("ab"), vec![0x00, 0x61, 0x00, 0x62, 0x00, 0x00]);
    }

    #[test]
    fn test_add_one_plus_b_carries() {
        let mut block = [0x00, 0xFF];
        add_one_plus_b(&mut block, &[0x00, 0x00]);
        assert_eq!(block, [0x01, 0x00]);
    }

    #[test]
    fn test_verify_hmac() {
        let mut mac = Hmac::<Sha256>::new_from_slice(b"k").unwrap();
        mac.update(b"data");
        let tag = mac.finalize().into_bytes();
        assert!(verify_hmac_sha256(b"k", b"data", &tag).unwrap());
        assert!(!verify_hmac_sha256(b"k", b"dat4", &tag).unwrap());
        assert!(!verify_hmac_sha1(b"k", b"data", &tag).unwrap());
    }
}
