#![forbid(unsafe_code)]

//! KeyInfo XML processing.
//!
//! Writing: `<KeyInfo>` with an `<X509Data>` (subject name and certificate)
//! followed by a `<KeyValue>` describing the certificate's public key.
//!
//! Reading: extracts the same pieces for display. The verifier never takes
//! its key from here.

use crate::key::{Key, KeyData};
use crate::x509::Certificate;
use avskild_core::{algorithm, ns, Error};
use avskild_xml::document::{compact_text, find_child_element};
use avskild_xml::XmlWriter;
use base64::Engine;

const B64: base64::engine::GeneralPurpose = base64::engine::general_purpose::STANDARD;

/// Write `<KeyInfo>` for `certificate` into an open element whose default
/// namespace is the DSig namespace.
pub fn write_key_info(w: &mut XmlWriter, certificate: &Certificate) -> Result<(), Error> {
    use ns::node;

    w.start_element(node::KEY_INFO, &[])?;

    w.start_element(node::X509_DATA, &[])?;
    w.text_element(node::X509_SUBJECT_NAME, &[], certificate.subject_name())?;
    w.text_element(node::X509_CERTIFICATE, &[], &certificate.to_base64())?;
    w.end_element(node::X509_DATA)?;

    w.start_element(node::KEY_VALUE, &[])?;
    write_key_value(w, certificate.public_key())?;
    w.end_element(node::KEY_VALUE)?;

    w.end_element(node::KEY_INFO)
}

/// Write the `RSAKeyValue` or `ECKeyValue` content of a `<KeyValue>`.
pub fn write_key_value(w: &mut XmlWriter, key: &Key) -> Result<(), Error> {
    use ns::node;

    match &key.data {
        KeyData::Rsa { public, .. } => {
            use rsa::traits::PublicKeyParts;
            w.start_element(node::RSA_KEY_VALUE, &[])?;
            w.text_element(node::RSA_MODULUS, &[], &B64.encode(public.n().to_bytes_be()))?;
            w.text_element(node::RSA_EXPONENT, &[], &B64.encode(public.e().to_bytes_be()))?;
            w.end_element(node::RSA_KEY_VALUE)
        }
        KeyData::EcP256 { public, .. } => {
            let point = public.to_encoded_point(false);
            write_ec_key_value(w, algorithm::CURVE_P256, point.as_bytes())
        }
        KeyData::EcP384 { public, .. } => {
            let point = public.to_encoded_point(false);
            write_ec_key_value(w, algorithm::CURVE_P384, point.as_bytes())
        }
    }
}

fn write_ec_key_value(w: &mut XmlWriter, curve_uri: &str, point: &[u8]) -> Result<(), Error> {
    use ns::node;
    w.start_element(node::EC_KEY_VALUE, &[("xmlns", ns::DSIG11)])?;
    w.empty_element(node::NAMED_CURVE, &[(ns::attr::URI, curve_uri)])?;
    w.text_element(node::PUBLIC_KEY, &[], &B64.encode(point))?;
    w.end_element(node::EC_KEY_VALUE)
}

/// What a `<KeyInfo>` element says about the signer.
#[derive(Debug, Default)]
pub struct KeyInfoContents {
    pub subject_name: Option<String>,
    pub certificate: Option<Certificate>,
    pub key_value: Option<Key>,
}

/// Read `<KeyInfo>`. `namespaces` lists the namespaces its DSig children
/// may use ("" for none).
pub fn read_key_info(
    key_info: roxmltree::Node<'_, '_>,
    namespaces: &[&str],
) -> Result<KeyInfoContents, Error> {
    let mut contents = KeyInfoContents::default();

    if let Some(x509_data) = find_child_element(key_info, namespaces, ns::node::X509_DATA) {
        contents.subject_name =
            find_child_element(x509_data, namespaces, ns::node::X509_SUBJECT_NAME)
                .map(avskild_xml::document::text_content);
        if let Some(cert) = find_child_element(x509_data, namespaces, ns::node::X509_CERTIFICATE)
        {
            contents.certificate = Some(Certificate::from_base64(&compact_text(cert))?);
        }
    }

    if let Some(key_value) = find_child_element(key_info, namespaces, ns::node::KEY_VALUE) {
        let mut value_namespaces = namespaces.to_vec();
        value_namespaces.push(ns::DSIG11);
        if let Some(rsa_kv) =
            find_child_element(key_value, &value_namespaces, ns::node::RSA_KEY_VALUE)
        {
            contents.key_value = Some(parse_rsa_key_value(rsa_kv, namespaces)?);
        } else if let Some(ec_kv) =
            find_child_element(key_value, &value_namespaces, ns::node::EC_KEY_VALUE)
        {
            contents.key_value = Some(parse_ec_key_value(ec_kv)?);
        }
    }

    Ok(contents)
}

/// Extract an RSA public key from an `<RSAKeyValue>` element.
pub fn parse_rsa_key_value(
    rsa_kv: roxmltree::Node<'_, '_>,
    namespaces: &[&str],
) -> Result<Key, Error> {
    let modulus = find_child_element(rsa_kv, namespaces, ns::node::RSA_MODULUS)
        .ok_or_else(|| Error::MissingElement("Modulus".into()))?;
    let exponent = find_child_element(rsa_kv, namespaces, ns::node::RSA_EXPONENT)
        .ok_or_else(|| Error::MissingElement("Exponent".into()))?;

    let modulus_bytes = B64
        .decode(compact_text(modulus))
        .map_err(|e| Error::Base64(format!("Modulus: {e}")))?;
    let exponent_bytes = B64
        .decode(compact_text(exponent))
        .map_err(|e| Error::Base64(format!("Exponent: {e}")))?;

    let n = rsa::BigUint::from_bytes_be(&modulus_bytes);
    let e = rsa::BigUint::from_bytes_be(&exponent_bytes);
    let public = rsa::RsaPublicKey::new(n, e)
        .map_err(|err| Error::Key(format!("invalid RSA public key: {err}")))?;

    Ok(Key::new(KeyData::Rsa { private: None, public }))
}

/// Extract an EC public key from an `<ECKeyValue>` element (P-256 or P-384).
pub fn parse_ec_key_value(ec_kv: roxmltree::Node<'_, '_>) -> Result<Key, Error> {
    let namespaces = [ns::DSIG11, ns::DSIG];
    let named_curve = find_child_element(ec_kv, &namespaces, ns::node::NAMED_CURVE)
        .ok_or_else(|| Error::MissingElement("NamedCurve".into()))?;
    let curve_uri = named_curve
        .attribute(ns::attr::URI)
        .ok_or_else(|| Error::MissingAttribute("URI on NamedCurve".into()))?;
    let public_key = find_child_element(ec_kv, &namespaces, ns::node::PUBLIC_KEY)
        .ok_or_else(|| Error::MissingElement("PublicKey".into()))?;

    let point_bytes = B64
        .decode(compact_text(public_key))
        .map_err(|e| Error::Base64(format!("EC PublicKey: {e}")))?;

    match curve_uri {
        algorithm::CURVE_P256 => {
            let public = p256::ecdsa::VerifyingKey::from_sec1_bytes(&point_bytes)
                .map_err(|e| Error::Key(format!("invalid P-256 public key point: {e}")))?;
            Ok(Key::new(KeyData::EcP256 { private: None, public }))
        }
        algorithm::CURVE_P384 => {
            let public = p384::ecdsa::VerifyingKey::from_sec1_bytes(&point_bytes)
                .map_err(|e| Error::Key(format!("invalid P-384 public key point: {e}")))?;
            Ok(Key::new(KeyData::EcP384 { private: None, public }))
        }
        _ => Err(Error::UnsupportedAlgorithm(format!("EC curve: {curve_uri}"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fixture(name: &str) -> Vec<u8> {
        let path = std::path::Path::new(env!("CARGO_MANIFEST_DIR"))
            .join("../../test-data")
            .join(name);
        std::fs::read(path).unwrap()
    }

    fn key_info_xml(cert: &Certificate) -> String {
        let mut w = XmlWriter::new();
        w.start_element("Signature", &[("xmlns", ns::DSIG)]).unwrap();
        write_key_info(&mut w, cert).unwrap();
        w.end_element("Signature").unwrap();
        w.into_string().unwrap()
    }

    #[test]
    fn test_write_rsa_key_info() {
        let cert = Certificate::from_pem(&fixture("signer.crt")).unwrap();
        let xml = key_info_xml(&cert);
        assert!(xml.starts_with(
            "<Signature xmlns=\"http://www.w3.org/2000/09/xmldsig#\"><KeyInfo><X509Data>\
             <X509SubjectName>CN=Test Signer,O=Avskild Test,C=HU</X509SubjectName>\
             <X509Certificate>"
        ));
        assert!(xml.contains("</X509Data><KeyValue><RSAKeyValue><Modulus>"));
        assert!(xml.contains("<Exponent>AQAB</Exponent>"));
        assert!(!xml.contains('\n'));
    }

    #[test]
    fn test_read_back_rsa() {
        let cert = Certificate::from_pem(&fixture("signer.crt")).unwrap();
        let xml = key_info_xml(&cert);
        let doc = avskild_xml::parse(&xml).unwrap();
        let key_info = doc.descendants().find(|n| n.has_tag_name((ns::DSIG, "KeyInfo"))).unwrap();
        let contents = read_key_info(key_info, &[ns::DSIG]).unwrap();
        assert_eq!(contents.subject_name.as_deref(), Some(cert.subject_name()));
        assert_eq!(contents.certificate.unwrap().der(), cert.der());
        assert!(contents.key_value.unwrap().same_public_key(cert.public_key()));
    }

    #[test]
    fn test_ec_key_value_round_trip() {
        let cert = Certificate::from_pem(&fixture("ec.crt")).unwrap();
        let xml = key_info_xml(&cert);
        assert!(xml.contains(
            "<ECKeyValue xmlns=\"http://www.w3.org/2009/xmldsig11#\">\
             <NamedCurve URI=\"urn:oid:1.2.840.10045.3.1.7\"></NamedCurve><PublicKey>"
        ));
        let doc = avskild_xml::parse(&xml).unwrap();
        let key_info = doc.descendants().find(|n| n.has_tag_name((ns::DSIG, "KeyInfo"))).unwrap();
        let contents = read_key_info(key_info, &[ns::DSIG]).unwrap();
        assert!(contents.key_value.unwrap().same_public_key(cert.public_key()));
    }

    #[test]
    fn test_read_unprefixed_without_namespace() {
        let xml = "<Signature><KeyInfo><KeyValue><RSAKeyValue>\
                   <Modulus>AQAB</Modulus></RSAKeyValue></KeyValue></KeyInfo></Signature>";
        let doc = avskild_xml::parse(xml).unwrap();
        let key_info = doc.descendants().find(|n| n.has_tag_name("KeyInfo")).unwrap();
        let err = read_key_info(key_info, &[ns::DSIG, ""]).unwrap_err();
        assert!(matches!(err, Error::MissingElement(ref name) if name == "Exponent"));
    }

    #[test]
    fn test_unknown_curve() {
        let xml = format!(
            "<ECKeyValue xmlns=\"{}\"><NamedCurve URI=\"urn:oid:1.3.132.0.35\"/>\
             <PublicKey>AA==</PublicKey></ECKeyValue>",
            ns::DSIG11
        );
        let doc = avskild_xml::parse(&xml).unwrap();
        let err = parse_ec_key_value(doc.root_element()).unwrap_err();
        assert!(matches!(err, Error::UnsupportedAlgorithm(_)));
    }
}
