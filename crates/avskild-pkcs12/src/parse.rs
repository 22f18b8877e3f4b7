#![forbid(unsafe_code)]

//! BER parsing of PKCS#12 (PFX) structures (RFC 7292).
//!
//! Uses `yasna::parse_ber` since PKCS#12 files use BER encoding, not strict DER.

use avskild_core::Error;
use yasna::models::ObjectIdentifier;
use yasna::{ASN1Error, ASN1ErrorKind, BERReader, BERReaderSeq, Tag};

use crate::kdf::{self, Prf};
use crate::{Pkcs12Bag, Pkcs12Contents};

// ── OID constants ──────────────────────────────────────────────────────────

// Content types (PKCS#7)
const OID_DATA: &[u64] = &[1, 2, 840, 113549, 1, 7, 1];
const OID_ENCRYPTED_DATA: &[u64] = &[1, 2, 840, 113549, 1, 7, 6];

// Bag types (PKCS#12)
const OID_PKCS8_SHROUDED_KEY_BAG: &[u64] = &[1, 2, 840, 113549, 1, 12, 10, 1, 2];
const OID_CERT_BAG: &[u64] = &[1, 2, 840, 113549, 1, 12, 10, 1, 3];

// Certificate type
const OID_X509_CERTIFICATE: &[u64] = &[1, 2, 840, 113549, 1, 9, 22, 1];

// Bag attributes (PKCS#9)
const OID_FRIENDLY_NAME: &[u64] = &[1, 2, 840, 113549, 1, 9, 20];
const OID_LOCAL_KEY_ID: &[u64] = &[1, 2, 840, 113549, 1, 9, 21];

// PBE algorithms
const OID_PBE_SHA1_3DES: &[u64] = &[1, 2, 840, 113549, 1, 12, 1, 3];
const OID_PBES2: &[u64] = &[1, 2, 840, 113549, 1, 5, 13];
const OID_PBKDF2: &[u64] = &[1, 2, 840, 113549, 1, 5, 12];

// Cipher
const OID_AES_256_CBC: &[u64] = &[2, 16, 840, 1, 101, 3, 4, 1, 42];

// Hash / HMAC
const OID_SHA1: &[u64] = &[1, 3, 14, 3, 2, 26];
const OID_SHA256: &[u64] = &[2, 16, 840, 1, 101, 3, 4, 2, 1];
const OID_HMAC_SHA1: &[u64] = &[1, 2, 840, 113549, 2, 7];
const OID_HMAC_SHA256: &[u64] = &[1, 2, 840, 113549, 2, 9];

fn oid(components: &[u64]) -> ObjectIdentifier {
    ObjectIdentifier::from_slice(components)
}

fn invalid() -> ASN1Error {
    ASN1Error::new(ASN1ErrorKind::Invalid)
}

// ── Algorithm types ────────────────────────────────────────────────────────

#[derive(Debug)]
enum EncryptionAlgorithm {
    PbeSha1And3Des {
        salt: Vec<u8>,
        iterations: u32,
    },
    Pbes2 {
        salt: Vec<u8>,
        iterations: u32,
        prf: Prf,
        iv: Vec<u8>,
    },
}

#[derive(Debug, Clone, Copy)]
enum MacHashAlgorithm {
    Sha1,
    Sha256,
}

// ── Parsed structures ──────────────────────────────────────────────────────

struct MacData {
    digest_algorithm: MacHashAlgorithm,
    digest_value: Vec<u8>,
    salt: Vec<u8>,
    iterations: u32,
}

#[derive(Debug, Default)]
struct BagAttributes {
    friendly_name: Option<String>,
    local_key_id: Option<Vec<u8>>,
}

enum SafeBag {
    ShroudedKeyBag {
        algorithm: EncryptionAlgorithm,
        ciphertext: Vec<u8>,
        attributes: BagAttributes,
    },
    CertBag {
        cert_der: Vec<u8>,
        attributes: BagAttributes,
    },
    Other,
}

enum ContentInfoInner {
    Data(Vec<u8>),
    EncryptedData {
        algorithm: EncryptionAlgorithm,
        ciphertext: Vec<u8>,
    },
}

// ── Top-level parser ───────────────────────────────────────────────────────

pub fn parse_pfx(data: &[u8], password: &str) -> Result<Pkcs12Contents, Error> {
    let (auth_safe_data, mac_data) = yasna::parse_ber(data, |r| {
        r.read_sequence(|r| {
            let version = r.next().read_u32()?;
            if version != 3 {
                return Err(invalid());
            }
            let auth_safe_data = parse_content_info_data(r.next())?;
            let mac_data = r.read_optional(parse_mac_data)?;
            Ok((auth_safe_data, mac_data))
        })
    })
    .map_err(|e| Error::KeyAccess(format!("failed to parse PKCS#12 PFX: {e}")))?;

    if let Some(ref mac) = mac_data {
        verify_mac(mac, &auth_safe_data, password)?;
    }

    let content_infos = yasna::parse_ber(&auth_safe_data, |r| {
        r.collect_sequence_of(parse_content_info_inner)
    })
    .map_err(|e| Error::KeyAccess(format!("failed to parse authSafe contents: {e}")))?;

    let bmp_password = kdf::password_to_bmp(password);
    let mut contents = Pkcs12Contents::default();

    for ci in content_infos {
        let bags_data = match ci {
            ContentInfoInner::Data(data) => data,
            ContentInfoInner::EncryptedData { algorithm, ciphertext } => {
                decrypt_data(&algorithm, &ciphertext, password, &bmp_password)?
            }
        };

        let bags = yasna::parse_ber(&bags_data, |r| r.collect_sequence_of(parse_safe_bag))
            .map_err(|e| Error::KeyAccess(format!("failed to parse SafeBags: {e}")))?;

        for bag in bags {
            match bag {
                SafeBag::ShroudedKeyBag { algorithm, ciphertext, attributes } => {
                    let der = decrypt_data(&algorithm, &ciphertext, password, &bmp_password)?;
                    contents.private_keys.push(Pkcs12Bag {
                        der,
                        friendly_name: attributes.friendly_name,
                        local_key_id: attributes.local_key_id,
                    });
                }
                SafeBag::CertBag { cert_der, attributes } => {
                    contents.certificates.push(Pkcs12Bag {
                        der: cert_der,
                        friendly_name: attributes.friendly_name,
                        local_key_id: attributes.local_key_id,
                    });
                }
                SafeBag::Other => {}
            }
        }
    }

    Ok(contents)
}

// ── ContentInfo parsing ────────────────────────────────────────────────────

/// Parse the ContentInfo that wraps the authSafe: OID = data, OCTET STRING payload.
fn parse_content_info_data(r: BERReader) -> Result<Vec<u8>, ASN1Error> {
    r.read_sequence(|r| {
        let content_type = r.next().read_oid()?;
        if content_type != oid(OID_DATA) {
            return Err(invalid());
        }
        r.next().read_tagged(Tag::context(0), |r| r.read_bytes())
    })
}

/// Parse a ContentInfo inside the authSafe SEQUENCE.
fn parse_content_info_inner(r: BERReader) -> Result<ContentInfoInner, ASN1Error> {
    r.read_sequence(|r| {
        let content_type = r.next().read_oid()?;

        if content_type == oid(OID_DATA) {
            let data = r.next().read_tagged(Tag::context(0), |r| r.read_bytes())?;
            Ok(ContentInfoInner::Data(data))
        } else if content_type == oid(OID_ENCRYPTED_DATA) {
            r.next().read_tagged(Tag::context(0), |r| {
                r.read_sequence(|r| {
                    let _version = r.next().read_u32()?;
                    // EncryptedContentInfo
                    r.next().read_sequence(|r| {
                        let _content_type = r.next().read_oid()?;
                        let algorithm = parse_algorithm_identifier(r.next())?;
                        // [0] IMPLICIT encrypted content
                        let ciphertext = r
                            .next()
                            .read_tagged_implicit(Tag::context(0), |r| r.read_bytes())?;
                        Ok(ContentInfoInner::EncryptedData { algorithm, ciphertext })
                    })
                })
            })
        } else {
            Err(invalid())
        }
    })
}

// ── SafeBag parsing ────────────────────────────────────────────────────────

fn parse_safe_bag(r: BERReader) -> Result<SafeBag, ASN1Error> {
    r.read_sequence(|r| {
        let bag_type = r.next().read_oid()?;

        if bag_type == oid(OID_PKCS8_SHROUDED_KEY_BAG) {
            // [0] EXPLICIT EncryptedPrivateKeyInfo
            let (algorithm, ciphertext) = r.next().read_tagged(Tag::context(0), |r| {
                r.read_sequence(|r| {
                    let algorithm = parse_algorithm_identifier(r.next())?;
                    let ciphertext = r.next().read_bytes()?;
                    Ok((algorithm, ciphertext))
                })
            })?;
            let attributes = parse_bag_attributes(r)?;
            Ok(SafeBag::ShroudedKeyBag { algorithm, ciphertext, attributes })
        } else if bag_type == oid(OID_CERT_BAG) {
            // [0] EXPLICIT CertBag
            let cert_der = r.next().read_tagged(Tag::context(0), |r| {
                r.read_sequence(|r| {
                    let cert_type = r.next().read_oid()?;
                    if cert_type != oid(OID_X509_CERTIFICATE) {
                        return Err(invalid());
                    }
                    r.next().read_tagged(Tag::context(0), |r| r.read_bytes())
                })
            })?;
            let attributes = parse_bag_attributes(r)?;
            Ok(SafeBag::CertBag { cert_der, attributes })
        } else {
            let _value = r.next().read_tagged(Tag::context(0), |r| r.read_der())?;
            let _attributes = parse_bag_attributes(r)?;
            Ok(SafeBag::Other)
        }
    })
}

/// Read the optional `bagAttributes` SET, keeping the alias and key id.
fn parse_bag_attributes(r: &mut BERReaderSeq) -> Result<BagAttributes, ASN1Error> {
    let mut attributes = BagAttributes::default();
    r.read_optional(|r| {
        r.read_set_of(|r| {
            r.read_sequence(|r| {
                let attr_type = r.next().read_oid()?;
                if attr_type == oid(OID_FRIENDLY_NAME) {
                    r.next().read_set_of(|r| {
                        let name = r.read_bmp_string()?;
                        attributes.friendly_name.get_or_insert(name);
                        Ok(())
                    })
                } else if attr_type == oid(OID_LOCAL_KEY_ID) {
                    r.next().read_set_of(|r| {
                        let id = r.read_bytes()?;
                        attributes.local_key_id.get_or_insert(id);
                        Ok(())
                    })
                } else {
                    r.next().read_set_of(|r| {
                        r.read_der()?;
                        Ok(())
                    })
                }
            })
        })
    })?;
    Ok(attributes)
}

// ── AlgorithmIdentifier parsing ────────────────────────────────────────────

fn parse_algorithm_identifier(r: BERReader) -> Result<EncryptionAlgorithm, ASN1Error> {
    r.read_sequence(|r| {
        let alg_oid = r.next().read_oid()?;

        if alg_oid == oid(OID_PBE_SHA1_3DES) {
            // SEQUENCE { salt OCTET STRING, iterations INTEGER }
            r.next().read_sequence(|r| {
                let salt = r.next().read_bytes()?;
                let iterations = r.next().read_u32()?;
                Ok(EncryptionAlgorithm::PbeSha1And3Des { salt, iterations })
            })
        } else if alg_oid == oid(OID_PBES2) {
            // PBES2-params: SEQUENCE { keyDerivationFunc, encryptionScheme }
            r.next().read_sequence(|r| {
                let (salt, iterations, prf) = r.next().read_sequence(|r| {
                    let kdf_oid = r.next().read_oid()?;
                    if kdf_oid != oid(OID_PBKDF2) {
                        return Err(invalid());
                    }
                    // PBKDF2-params: SEQUENCE { salt, iterationCount, keyLength?, prf? }
                    r.next().read_sequence(|r| {
                        let salt = r.next().read_bytes()?;
                        let iterations = r.next().read_u32()?;
                        // keyLength (INTEGER) and prf (SEQUENCE) are both
                        // optional; tell them apart by their tag byte.
                        let mut prf = Prf::HmacSha1;
                        if let Some(next) = r.read_optional(|r| r.read_der())? {
                            let prf_der = if next.first() == Some(&0x30) {
                                Some(next)
                            } else {
                                r.read_optional(|r| r.read_der())?
                            };
                            if let Some(der) = prf_der {
                                prf = parse_prf_der(&der)?;
                            }
                        }
                        Ok((salt, iterations, prf))
                    })
                })?;

                let iv = r.next().read_sequence(|r| {
                    let enc_oid = r.next().read_oid()?;
                    if enc_oid != oid(OID_AES_256_CBC) {
                        return Err(invalid());
                    }
                    r.next().read_bytes()
                })?;

                Ok(EncryptionAlgorithm::Pbes2 { salt, iterations, prf, iv })
            })
        } else {
            Err(invalid())
        }
    })
}

fn parse_prf_der(der: &[u8]) -> Result<Prf, ASN1Error> {
    yasna::parse_der(der, |r| r.read_sequence(|r| {
        let prf_oid = r.next().read_oid()?;
        let _null = r.read_optional(|r| r.read_null())?;
        if prf_oid == oid(OID_HMAC_SHA256) {
            Ok(Prf::HmacSha256)
        } else if prf_oid == oid(OID_HMAC_SHA1) {
            Ok(Prf::HmacSha1)
        } else {
            Err(invalid())
        }
    }))
}

// ── MAC verification ───────────────────────────────────────────────────────

fn parse_mac_data(r: BERReader) -> Result<MacData, ASN1Error> {
    r.read_sequence(|r| {
        // DigestInfo: SEQUENCE { digestAlgorithm, digest }
        let (digest_algorithm, digest_value) = r.next().read_sequence(|r| {
            let alg = r.next().read_sequence(|r| {
                let hash_oid = r.next().read_oid()?;
                let _null = r.read_optional(|r| r.read_null())?;
                if hash_oid == oid(OID_SHA256) {
                    Ok(MacHashAlgorithm::Sha256)
                } else if hash_oid == oid(OID_SHA1) {
                    Ok(MacHashAlgorithm::Sha1)
                } else {
                    Err(invalid())
                }
            })?;
            let digest = r.next().read_bytes()?;
            Ok((alg, digest))
        })?;

        let salt = r.next().read_bytes()?;
        let iterations = r.read_optional(|r| r.read_u32())?.unwrap_or(1);

        Ok(MacData {
            digest_algorithm,
            digest_value,
            salt,
            iterations,
        })
    })
}

fn verify_mac(mac: &MacData, auth_safe_data: &[u8], password: &str) -> Result<(), Error> {
    let bmp_password = kdf::password_to_bmp(password);

    let matches = match mac.digest_algorithm {
        MacHashAlgorithm::Sha1 => {
            let key = kdf::pkcs12_kdf::<sha1::Sha1>(
                kdf::ID_MAC,
                &bmp_password,
                &mac.salt,
                mac.iterations,
                20,
            );
            kdf::verify_hmac_sha1(&key, auth_safe_data, &mac.digest_value)?
        }
        MacHashAlgorithm::Sha256 => {
            let key = kdf::pkcs12_kdf::<sha2::Sha256>(
                kdf::ID_MAC,
                &bmp_password,
                &mac.salt,
                mac.iterations,
                32,
            );
            kdf::verify_hmac_sha256(&key, auth_safe_data, &mac.digest_value)?
        }
    };

    if !matches {
        return Err(Error::KeyAccess(
            "PKCS#12 MAC verification failed (wrong password?)".into(),
        ));
    }
    Ok(())
}

// ── Decryption dispatch ────────────────────────────────────────────────────

fn decrypt_data(
    algorithm: &EncryptionAlgorithm,
    ciphertext: &[u8],
    password: &str,
    bmp_password: &[u8],
) -> Result<Vec<u8>, Error> {
    match algorithm {
        EncryptionAlgorithm::PbeSha1And3Des { salt, iterations } => {
            kdf::decrypt_pbe_sha1_3des(ciphertext, bmp_password, salt, *iterations)
        }
        EncryptionAlgorithm::Pbes2 { salt, iterations, prf, iv } => {
            kdf::decrypt_pbes2_aes256cbc(ciphertext, password, *prf, salt, *iterations, iv)
        }
    }
}
