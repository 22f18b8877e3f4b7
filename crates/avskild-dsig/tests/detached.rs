#![forbid(unsafe_code)]

use avskild_core::algorithm;
use avskild_dsig::{Document, VerifyResult, XmlDigitalSignature};
use avskild_keys::KeyStoreConfig;
use base64::Engine;

fn fixture_path(name: &str) -> std::path::PathBuf {
    std::path::Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("../../test-data")
        .join(name)
}

fn fixture(name: &str) -> Vec<u8> {
    std::fs::read(fixture_path(name)).unwrap()
}

fn dsig(keystore: &str, alias: &str) -> XmlDigitalSignature {
    XmlDigitalSignature::from_key_store(KeyStoreConfig::new(
        fixture_path(keystore),
        alias,
        "changeit",
    ))
}

fn rsa() -> XmlDigitalSignature {
    dsig("keystore.p12", "somealias")
}

fn sign_document_xml(signer: &XmlDigitalSignature, digest: &str, signature: &str) -> Vec<u8> {
    let document = Document::new("document.xml", fixture("document.xml"));
    signer
        .generate_detached_signature(&document, digest, signature)
        .unwrap()
}

/// Replace the text of the first `<name>` element.
fn replace_element_text(xml: &[u8], name: &str, text: &str) -> Vec<u8> {
    let xml = String::from_utf8(xml.to_vec()).unwrap();
    let open = format!("<{name}>");
    let close = format!("</{name}>");
    let start = xml.find(&open).unwrap() + open.len();
    let end = start + xml[start..].find(&close).unwrap();
    format!("{}{text}{}", &xml[..start], &xml[end..]).into_bytes()
}

fn element_text(xml: &[u8], name: &str) -> String {
    let xml = std::str::from_utf8(xml).unwrap();
    let open = format!("<{name}>");
    let start = xml.find(&open).unwrap() + open.len();
    let end = start + xml[start..].find('<').unwrap();
    xml[start..end].to_owned()
}

#[test]
fn test_hello_world_scenario() {
    let signer = rsa();
    let out = signer
        .generate_detached_signature(
            &Document::new("document.xml", "hello world"),
            algorithm::SHA512,
            algorithm::RSA_SHA512,
        )
        .unwrap();
    assert!(!out.is_empty());
    assert!(String::from_utf8(out.clone()).unwrap().contains("Signature"));
    assert!(signer.verify_detached_signature(b"hello world", &out).unwrap());
    assert!(!signer.verify_detached_signature(b"hello worldx", &out).unwrap());
}

fn rsa_signatures() -> Vec<&'static str> {
    algorithm::SIGNATURES
        .iter()
        .copied()
        .filter(|uri| !uri.contains("#ecdsa-"))
        .collect()
}

fn ecdsa_signatures() -> Vec<&'static str> {
    algorithm::SIGNATURES
        .iter()
        .copied()
        .filter(|uri| uri.contains("#ecdsa-"))
        .collect()
}

/// Sign document.xml with every digest and every signature method in
/// `signatures`, verify each result, then verify it against changed content.
fn assert_round_trips(signer: &XmlDigitalSignature, signatures: &[&str]) {
    let original = fixture("document.xml");
    let mut changed = original.clone();
    changed.push(b'\n');
    for digest in algorithm::DIGESTS {
        for signature in signatures {
            let out = sign_document_xml(signer, digest, signature);
            assert!(
                signer.verify_detached_signature(&original, &out).unwrap(),
                "{digest} + {signature}"
            );
            assert!(
                !signer.verify_detached_signature(&changed, &out).unwrap(),
                "{digest} + {signature} on changed content"
            );
        }
    }
}

#[test]
fn test_rsa_round_trips() {
    let signatures = rsa_signatures();
    assert_eq!(signatures.len(), 10);
    assert_round_trips(&rsa(), &signatures);
}

#[test]
fn test_ec_p256_round_trips() {
    let signatures = ecdsa_signatures();
    assert_eq!(signatures.len(), 5);
    assert_round_trips(&dsig("ec-keystore.p12", "ecalias"), &signatures);
}

#[test]
fn test_ec_p384_round_trips() {
    assert_round_trips(&dsig("ec384-keystore.p12", "ec384alias"), &ecdsa_signatures());
}

#[test]
fn test_ec_key_value_is_written() {
    let out = sign_document_xml(
        &dsig("ec-keystore.p12", "ecalias"),
        algorithm::SHA256,
        algorithm::ECDSA_SHA256,
    );
    let text = String::from_utf8(out).unwrap();
    assert!(text.contains("<ECKeyValue xmlns=\"http://www.w3.org/2009/xmldsig11#\">"));
}

#[test]
fn test_tampered_content() {
    let signer = rsa();
    let out = sign_document_xml(&signer, algorithm::SHA512, algorithm::RSA_SHA512);
    let tampered = String::from_utf8(fixture("document.xml"))
        .unwrap()
        .replace("125000", "925000");
    let result = signer
        .verify_detached_signature_detailed(tampered.as_bytes(), &out)
        .unwrap();
    assert!(matches!(result, VerifyResult::Invalid { ref reason } if reason.contains("digest")));
}

#[test]
fn test_tampered_digest_value() {
    let signer = rsa();
    let out = sign_document_xml(&signer, algorithm::SHA512, algorithm::RSA_SHA512);
    let other_digest = base64::engine::general_purpose::STANDARD.encode([0u8; 64]);
    let tampered = replace_element_text(&out, "DigestValue", &other_digest);
    assert!(!signer
        .verify_detached_signature(&fixture("document.xml"), &tampered)
        .unwrap());
}

#[test]
fn test_tampered_signature_value() {
    let signer = rsa();
    let out = sign_document_xml(&signer, algorithm::SHA512, algorithm::RSA_SHA512);
    let engine = base64::engine::general_purpose::STANDARD;
    let mut signature = engine.decode(element_text(&out, "SignatureValue")).unwrap();
    let middle = signature.len() / 2;
    signature[middle] ^= 0x01;
    let tampered = replace_element_text(&out, "SignatureValue", &engine.encode(signature));
    let result = signer
        .verify_detached_signature_detailed(&fixture("document.xml"), &tampered)
        .unwrap();
    assert_eq!(
        result,
        VerifyResult::Invalid {
            reason: "signature value verification failed".into()
        }
    );
}

#[test]
fn test_signed_info_change_breaks_signature() {
    let signer = rsa();
    let out = sign_document_xml(&signer, algorithm::SHA512, algorithm::RSA_SHA512);
    let renamed = String::from_utf8(out)
        .unwrap()
        .replace("URI=\"document.xml\"", "URI=\"renamed.xml\"");
    assert!(!signer
        .verify_detached_signature(&fixture("document.xml"), renamed.as_bytes())
        .unwrap());
}

#[test]
fn test_signing_is_repeatable() {
    let signer = rsa();
    let first = sign_document_xml(&signer, algorithm::SHA512, algorithm::RSA_SHA512);
    let second = sign_document_xml(&signer, algorithm::SHA512, algorithm::RSA_SHA512);
    assert_eq!(first, second);
}

#[test]
fn test_verification_is_repeatable() {
    let signer = rsa();
    let original = fixture("document.xml");
    let changed = b"<invoice/>";
    let out = sign_document_xml(&signer, algorithm::SHA512, algorithm::RSA_SHA512);

    let valid = signer
        .verify_detached_signature_detailed(&original, &out)
        .unwrap();
    let invalid = signer
        .verify_detached_signature_detailed(changed, &out)
        .unwrap();
    assert_eq!(valid, VerifyResult::Valid);
    assert!(!invalid.is_valid());
    for _ in 0..3 {
        assert_eq!(
            signer
                .verify_detached_signature_detailed(&original, &out)
                .unwrap(),
            valid
        );
        assert_eq!(
            signer
                .verify_detached_signature_detailed(changed, &out)
                .unwrap(),
            invalid
        );
    }
}

#[test]
fn test_no_line_breaks_after_declaration() {
    let out = sign_document_xml(&rsa(), algorithm::SHA512, algorithm::RSA_SHA512);
    let text = String::from_utf8(out).unwrap();
    let body = text
        .strip_prefix(r#"<?xml version="1.0" encoding="UTF-8"?>"#)
        .unwrap();
    assert!(body.starts_with("<Signature "));
    assert!(!body.contains(|c: char| c == '\r' || c == '\n'));
    assert!(!body.contains("&#13;"));
    assert!(!body.contains("&#xD;"));
}

#[test]
fn test_missing_signature() {
    let err = rsa()
        .verify_detached_signature(b"hello", &fixture("document.xml"))
        .unwrap_err();
    assert_eq!(err.to_string(), "Signature node not present");
}

#[test]
fn test_malformed_signature_document() {
    let err = rsa()
        .verify_detached_signature(b"hello", b"<Signature><SignedInfo>")
        .unwrap_err();
    assert!(matches!(err.cause(), avskild_core::Error::XmlParse(_)));
}

#[test]
fn test_legacy_unqualified_signature() {
    assert!(rsa()
        .verify_detached_signature(&fixture("document.xml"), &fixture("document.legacy.sign.xml"))
        .unwrap());
}

#[test]
fn test_externally_produced_signature() {
    let signer = rsa();
    let original = fixture("document.xml");
    let signature = fixture("document.sign.xml");
    assert!(signer.verify_detached_signature(&original, &signature).unwrap());
    assert!(!signer.verify_detached_signature(b"hello world", &signature).unwrap());
}

#[test]
fn test_verifier_trusts_its_own_key() {
    let ours = rsa();
    let theirs = dsig("other-keystore.p12", "somealias");
    let original = fixture("document.xml");

    // Signed by another key: its KeyInfo is self-consistent but not trusted.
    let foreign = sign_document_xml(&theirs, algorithm::SHA512, algorithm::RSA_SHA512);
    assert!(theirs.verify_detached_signature(&original, &foreign).unwrap());
    assert!(!ours.verify_detached_signature(&original, &foreign).unwrap());

    // Signed by our key with KeyInfo claiming the other key: still valid.
    let genuine = sign_document_xml(&ours, algorithm::SHA512, algorithm::RSA_SHA512);
    let other_cert = element_text(&foreign, "X509Certificate");
    let relabelled = replace_element_text(&genuine, "X509Certificate", &other_cert);
    assert!(ours.verify_detached_signature(&original, &relabelled).unwrap());
}

#[test]
fn test_wrong_password() {
    let signer = XmlDigitalSignature::from_key_store(KeyStoreConfig::new(
        fixture_path("keystore.p12"),
        "somealias",
        "wrong",
    ));
    let document = Document::new("document.xml", "hello world");
    assert!(signer
        .generate_detached_signature(&document, algorithm::SHA512, algorithm::RSA_SHA512)
        .is_err());
    let err = signer
        .verify_detached_signature(&fixture("document.xml"), &fixture("document.sign.xml"))
        .unwrap_err();
    assert!(matches!(err.cause(), avskild_core::Error::KeyAccess(_)));
}

#[test]
fn test_concurrent_use() {
    let signer = std::sync::Arc::new(rsa());
    let handles: Vec<_> = (0..4)
        .map(|i| {
            let signer = signer.clone();
            std::thread::spawn(move || {
                let content = format!("payload {i}");
                let out = signer
                    .generate_detached_signature(
                        &Document::new(format!("file-{i}.txt"), content.clone()),
                        algorithm::SHA256,
                        algorithm::RSA_SHA256,
                    )
                    .unwrap();
                signer
                    .verify_detached_signature(content.as_bytes(), &out)
                    .unwrap()
            })
        })
        .collect();
    for handle in handles {
        assert!(handle.join().unwrap());
    }
}
