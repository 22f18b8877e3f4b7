#![forbid(unsafe_code)]

//! PKCS#12 (.p12/.pfx) reader for avskild.
//!
//! Supports both legacy PBE (SHA-1 + 3DES-CBC) and modern PBES2
//! (PBKDF2 + AES-256-CBC) encryption as used by OpenSSL 3.x and current
//! Java key stores. Bags keep their `friendlyName` (the entry alias) and
//! `localKeyId` attributes so that a key and its certificate can be
//! paired by alias.

mod kdf;
mod parse;

/// One decrypted bag from a PKCS#12 file.
#[derive(Clone)]
pub struct Pkcs12Bag {
    /// PKCS#8 DER for key bags, X.509 DER for certificate bags.
    pub der: Vec<u8>,
    /// The `friendlyName` attribute, if present.
    pub friendly_name: Option<String>,
    /// The `localKeyId` attribute, if present.
    pub local_key_id: Option<Vec<u8>>,
}

impl std::fmt::Debug for Pkcs12Bag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // never print key material
        f.debug_struct("Pkcs12Bag")
            .field("der_len", &self.der.len())
            .field("friendly_name", &self.friendly_name)
            .field("local_key_id", &self.local_key_id)
            .finish()
    }
}

/// Contents extracted from a PKCS#12 file.
#[derive(Debug, Default)]
pub struct Pkcs12Contents {
    pub private_keys: Vec<Pkcs12Bag>,
    pub certificates: Vec<Pkcs12Bag>,
}

impl Pkcs12Contents {
    /// The certificate stored under `alias`.
    pub fn certificate_for_alias(&self, alias: &str) -> Option<&Pkcs12Bag> {
        self.certificates
            .iter()
            .find(|bag| bag.friendly_name.as_deref() == Some(alias))
    }

    /// The private key stored under `alias`.
    ///
    /// A key is matched to the alias's certificate through `localKeyId`
    /// first, then by its own `friendlyName`.
    pub fn private_key_for_alias(&self, alias: &str) -> Option<&Pkcs12Bag> {
        let by_key_id = self
            .certificate_for_alias(alias)
            .and_then(|cert| cert.local_key_id.as_deref())
            .and_then(|id| {
                self.private_keys
                    .iter()
                    .find(|key| key.local_key_id.as_deref() == Some(id))
            });
        by_key_id.or_else(|| {
            self.private_keys
                .iter()
                .find(|key| key.friendly_name.as_deref() == Some(alias))
        })
    }

    /// All aliases present in the file, in bag order, without duplicates.
    pub fn aliases(&self) -> Vec<&str> {
        let mut out: Vec<&str> = Vec::new();
        for name in self
            .private_keys
            .iter()
            .chain(&self.certificates)
            .filter_map(|bag| bag.friendly_name.as_deref())
        {
            if !out.contains(&name) {
                out.push(name);
            }
        }
        out
    }
}

/// Parse a PKCS#12 file, decrypting with the given password.
pub fn parse_pkcs12(data: &[u8], password: &str) -> Result<Pkcs12Contents, avskild_core::Error> {
    parse::parse_pfx(data, password)
}
