use crate::xml::XmlDocument;
use std::path::Path;

/// Outcome of classifying one attachment payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classification {
    Xml,
    NotXml,
}

impl Classification {
    pub fn is_xml(self) -> bool {
        matches!(self, Classification::Xml)
    }
}

/// Decide whether a raw byte buffer is XML.
///
/// A filename hint ending in `.xml` (case-insensitive) classifies as
/// [`Classification::Xml`] without parsing; anything else is decided by a
/// full well-formedness parse of the payload. The check is deterministic,
/// never touches storage, and never fails — parse errors (including empty
/// and binary payloads) simply classify as [`Classification::NotXml`].
///
/// ```
/// use pdfxml2csv::{classify, Classification};
///
/// assert_eq!(classify("invoice.XML", b"anything"), Classification::Xml);
/// assert_eq!(classify("data.bin", b"<r><a>1</a></r>"), Classification::Xml);
/// assert_eq!(classify("data.bin", b"\x00\x01\x02"), Classification::NotXml);
/// ```
pub fn classify(filename_hint: &str, payload: &[u8]) -> Classification {
    if has_xml_extension(filename_hint) {
        return Classification::Xml;
    }
    if XmlDocument::parse(payload).is_ok() {
        Classification::Xml
    } else {
        Classification::NotXml
    }
}

/// `true` when the filename carries a `.xml` extension, case-insensitive.
pub(crate) fn has_xml_extension(filename: &str) -> bool {
    Path::new(filename)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.eq_ignore_ascii_case("xml"))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extension_hint_short_circuits() {
        // The payload is not XML at all; the hint alone decides.
        assert_eq!(classify("report.xml", b"not xml"), Classification::Xml);
        assert_eq!(classify("REPORT.XML", b""), Classification::Xml);
    }

    #[test]
    fn content_parse_decides_without_hint() {
        assert_eq!(classify("blob", b"<a><b>1</b></a>"), Classification::Xml);
        assert_eq!(classify("blob", b"plain text"), Classification::NotXml);
    }

    #[test]
    fn empty_and_binary_payloads_are_not_xml() {
        assert_eq!(classify("blob", b""), Classification::NotXml);
        assert_eq!(classify("blob", &[0xde, 0xad, 0xbe, 0xef]), Classification::NotXml);
    }

    #[test]
    fn classification_is_deterministic() {
        let payload = b"<r><a>x</a></r>";
        assert_eq!(classify("f.bin", payload), classify("f.bin", payload));
    }

    #[test]
    fn xml_extension_matching() {
        assert!(has_xml_extension("a.xml"));
        assert!(has_xml_extension("a.XmL"));
        assert!(!has_xml_extension("a.xm"));
        assert!(!has_xml_extension("xml"));
        assert!(!has_xml_extension("a.xml.gz"));
    }
}
