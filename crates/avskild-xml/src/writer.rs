#![forbid(unsafe_code)]

//! XML writer for building signature documents.
//!
//! Output is written directly in canonical form: attributes in the order
//! given, explicit end tags, canonical escaping, and no whitespace between
//! elements. Nothing is indented and no line breaks are inserted.

use crate::escape;
use avskild_core::Error;

/// A string-backed XML writer.
#[derive(Debug, Default)]
pub struct XmlWriter {
    out: String,
    open: Vec<String>,
}

impl XmlWriter {
    /// Create a new XML writer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Write the XML declaration. Must come first.
    pub fn write_declaration(&mut self) -> Result<(), Error> {
        if !self.out.is_empty() {
            return Err(Error::XmlStructure(
                "XML declaration must start the document".into(),
            ));
        }
        self.out
            .push_str(r#"<?xml version="1.0" encoding="UTF-8"?>"#);
        Ok(())
    }

    /// Start an element with the given name and attributes.
    ///
    /// Namespace declarations are passed as ordinary attributes
    /// (`("xmlns", uri)`, `("xmlns:p", uri)`) and must precede the others.
    pub fn start_element(&mut self, name: &str, attrs: &[(&str, &str)]) -> Result<(), Error> {
        check_name(name)?;
        self.out.push('<');
        self.out.push_str(name);
        for (attr_name, value) in attrs {
            check_name(attr_name)?;
            self.out.push(' ');
            self.out.push_str(attr_name);
            self.out.push_str("=\"");
            self.out.push_str(&escape::escape_attr(value));
            self.out.push('"');
        }
        self.out.push('>');
        self.open.push(name.to_owned());
        Ok(())
    }

    /// Write an element with no content.
    pub fn empty_element(&mut self, name: &str, attrs: &[(&str, &str)]) -> Result<(), Error> {
        self.start_element(name, attrs)?;
        self.end_element(name)
    }

    /// Write an element whose only content is `text`.
    pub fn text_element(
        &mut self,
        name: &str,
        attrs: &[(&str, &str)],
        text: &str,
    ) -> Result<(), Error> {
        self.start_element(name, attrs)?;
        self.write_text(text)?;
        self.end_element(name)
    }

    /// End the current element. `name` must match the open element.
    pub fn end_element(&mut self, name: &str) -> Result<(), Error> {
        match self.open.pop() {
            Some(open) if open == name => {
                self.out.push_str("</");
                self.out.push_str(name);
                self.out.push('>');
                Ok(())
            }
            Some(open) => Err(Error::XmlStructure(format!(
                "end tag </{name}> does not match open element <{open}>"
            ))),
            None => Err(Error::XmlStructure(format!(
                "end tag </{name}> without open element"
            ))),
        }
    }

    /// Write text content.
    pub fn write_text(&mut self, text: &str) -> Result<(), Error> {
        if self.open.is_empty() {
            return Err(Error::XmlStructure("text outside the root element".into()));
        }
        self.out.push_str(&escape::escape_text(text));
        Ok(())
    }

    /// Finish writing and return the XML as a string.
    pub fn into_string(self) -> Result<String, Error> {
        if let Some(open) = self.open.last() {
            return Err(Error::XmlStructure(format!("element <{open}> is not closed")));
        }
        Ok(self.out)
    }

    /// Finish writing and return the XML bytes.
    pub fn into_bytes(self) -> Result<Vec<u8>, Error> {
        self.into_string().map(String::into_bytes)
    }
}

fn check_name(name: &str) -> Result<(), Error> {
    let valid = !name.is_empty()
        && !name.starts_with(|c: char| c.is_ascii_digit() || c == '-' || c == '.')
        && name
            .chars()
            .all(|c| c.is_alphanumeric() || matches!(c, '_' | '-' | '.' | ':'));
    if valid {
        Ok(())
    } else {
        Err(Error::XmlStructure(format!("invalid XML name: {name:?}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_writes_canonical_form() {
        let mut w = XmlWriter::new();
        w.write_declaration().unwrap();
        w.start_element("Signature", &[("xmlns", "http://www.w3.org/2000/09/xmldsig#")])
            .unwrap();
        w.empty_element("SignatureMethod", &[("Algorithm", "a&b")]).unwrap();
        w.text_element("SignatureValue", &[], "AB+/==").unwrap();
        w.end_element("Signature").unwrap();
        assert_eq!(
            w.into_string().unwrap(),
            concat!(
                r#"<?xml version="1.0" encoding="UTF-8"?>"#,
                r#"<Signature xmlns="http://www.w3.org/2000/09/xmldsig#">"#,
                r#"<SignatureMethod Algorithm="a&amp;b"></SignatureMethod>"#,
                r#"<SignatureValue>AB+/==</SignatureValue>"#,
                r#"</Signature>"#
            )
        );
    }

    #[test]
    fn test_escapes_text_and_carriage_returns() {
        let mut w = XmlWriter::new();
        w.text_element("a", &[], "x<y\r\n").unwrap();
        assert_eq!(w.into_string().unwrap(), "<a>x&lt;y&#xD;\n</a>");
    }

    #[test]
    fn test_mismatched_end_tag() {
        let mut w = XmlWriter::new();
        w.start_element("a", &[]).unwrap();
        assert!(matches!(w.end_element("b"), Err(Error::XmlStructure(_))));
    }

    #[test]
    fn test_unclosed_element() {
        let mut w = XmlWriter::new();
        w.start_element("a", &[]).unwrap();
        assert!(w.into_string().is_err());
    }

    #[test]
    fn test_declaration_must_come_first() {
        let mut w = XmlWriter::new();
        w.start_element("a", &[]).unwrap();
        assert!(w.write_declaration().is_err());
    }

    #[test]
    fn test_rejects_bad_names() {
        let mut w = XmlWriter::new();
        assert!(w.start_element("1a", &[]).is_err());
        assert!(w.start_element("a b", &[]).is_err());
        assert!(w.start_element("a", &[("x=\"", "v")]).is_err());
    }
}
