use chardetng::EncodingDetector;
use encoding_rs::Encoding;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedHtml {
    pub html: String,
    pub encoding_label: String,
    /// Malformed sequences were replaced with U+FFFD.
    pub had_errors: bool,
}

/// Decode a page body to UTF-8: BOM, then the `Content-Type` charset, then chardetng.
pub fn decode_html(bytes: &[u8], content_type: Option<&str>) -> DecodedHtml {
    if let Some((encoding, _)) = Encoding::for_bom(bytes) {
        return decode_with(bytes, encoding);
    }

    if let Some(label) = content_type.and_then(charset_param) {
        if let Some(encoding) = Encoding::for_label(label.as_bytes()) {
            return decode_with(bytes, encoding);
        }
    }

    let mut detector = EncodingDetector::new();
    detector.feed(bytes, true);
    decode_with(bytes, detector.guess(None, true))
}

fn charset_param(content_type: &str) -> Option<String> {
    content_type.split(';').find_map(|part| {
        let (name, value) = part.split_once('=')?;
        if !name.trim().eq_ignore_ascii_case("charset") {
            return None;
        }
        let value = value.trim().trim_matches(['"', '\'']);
        (!value.is_empty()).then(|| value.to_string())
    })
}

fn decode_with(bytes: &[u8], encoding: &'static Encoding) -> DecodedHtml {
    let (text, used, had_errors) = encoding.decode(bytes);
    DecodedHtml {
        html: text.into_owned(),
        encoding_label: used.name().to_string(),
        had_errors,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_charset_is_honoured() {
        let (bytes, _, _) = encoding_rs::GBK.encode("公众号");
        let decoded = decode_html(&bytes, Some("text/html; Charset=\"gbk\""));
        assert_eq!(decoded.html, "公众号");
        assert!(!decoded.had_errors);
    }

    #[test]
    fn bom_wins_over_header() {
        let mut bytes = vec![0xEF, 0xBB, 0xBF];
        bytes.extend_from_slice("文章".as_bytes());
        let decoded = decode_html(&bytes, Some("text/html; charset=gbk"));
        assert_eq!(decoded.html, "文章");
        assert_eq!(decoded.encoding_label, "UTF-8");
    }

    #[test]
    fn invalid_bytes_are_replaced_not_rejected() {
        let decoded = decode_html(b"ok \xff\xfe end", Some("text/html; charset=utf-8"));
        assert!(decoded.had_errors);
        assert!(decoded.html.starts_with("ok "));
        assert!(decoded.html.contains('\u{FFFD}'));
    }
}
