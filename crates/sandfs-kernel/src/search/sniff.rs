//! Content-type sniffing over a file's leading bytes.
//!
//! A compact subset of the WHATWG MIME sniffing algorithm: byte-order marks,
//! a handful of well-known signatures, markup detection, and finally the
//! binary-byte test that separates text from opaque data.

/// Bytes examined by [`detect_content_type`].
pub const SNIFF_LEN: usize = 512;

/// Content type reported for data that is not recognisably text.
pub const OCTET_STREAM: &str = "application/octet-stream";

const TEXT_UTF8: &str = "text/plain; charset=utf-8";

/// Exact-prefix signatures.
const SIGNATURES: &[(&[u8], &str)] = &[
    (b"\xFE\xFF", "text/plain; charset=utf-16be"),
    (b"\xFF\xFE", "text/plain; charset=utf-16le"),
    (b"\xEF\xBB\xBF", TEXT_UTF8),
    (b"%PDF-", "application/pdf"),
    (b"%!PS-Adobe-", "application/postscript"),
    (b"GIF87a", "image/gif"),
    (b"GIF89a", "image/gif"),
    (b"\x89PNG\x0D\x0A\x1A\x0A", "image/png"),
    (b"\xFF\xD8\xFF", "image/jpeg"),
    (b"BM", "image/bmp"),
    (b"PK\x03\x04", "application/zip"),
    (b"\x1F\x8B\x08", "application/x-gzip"),
    (b"Rar!\x1A\x07", "application/x-rar-compressed"),
    (b"\x00asm", "application/wasm"),
    (b"OggS\x00", "application/ogg"),
];

/// Markup prefixes, matched case-insensitively after leading whitespace and
/// followed by a space or `>`.
const HTML_TAGS: &[&[u8]] = &[
    b"<!DOCTYPE HTML",
    b"<HTML",
    b"<HEAD",
    b"<SCRIPT",
    b"<IFRAME",
    b"<H1",
    b"<DIV",
    b"<FONT",
    b"<TABLE",
    b"<A",
    b"<STYLE",
    b"<TITLE",
    b"<B",
    b"<BODY",
    b"<BR",
    b"<P",
    b"<!--",
];

/// Classify `data` (only the first [`SNIFF_LEN`] bytes are considered).
///
/// Always returns a valid MIME type; [`OCTET_STREAM`] when nothing more
/// specific applies and the data contains binary control bytes.
pub fn detect_content_type(data: &[u8]) -> &'static str {
    let data = &data[..data.len().min(SNIFF_LEN)];

    if let Some(&(_, mime)) = SIGNATURES.iter().find(|(sig, _)| data.starts_with(sig)) {
        return mime;
    }

    let start = data
        .iter()
        .position(|b| !is_whitespace(*b))
        .unwrap_or(data.len());
    let trimmed = &data[start..];

    if HTML_TAGS.iter().any(|tag| html_match(trimmed, tag)) {
        return "text/html; charset=utf-8";
    }
    if trimmed.starts_with(b"<?xml") {
        return "text/xml; charset=utf-8";
    }

    if data.iter().any(|b| is_binary(*b)) {
        return OCTET_STREAM;
    }
    TEXT_UTF8
}

/// True when [`detect_content_type`] would report opaque binary data.
pub fn is_binary_content(data: &[u8]) -> bool {
    detect_content_type(data) == OCTET_STREAM
}

fn html_match(data: &[u8], tag: &[u8]) -> bool {
    if data.len() <= tag.len() {
        return false;
    }
    if !data[..tag.len()].eq_ignore_ascii_case(tag) {
        return false;
    }
    matches!(data[tag.len()], b' ' | b'>')
}

fn is_whitespace(b: u8) -> bool {
    matches!(b, b'\t' | b'\n' | b'\x0C' | b'\r' | b' ')
}

fn is_binary(b: u8) -> bool {
    matches!(b, 0x00..=0x08 | 0x0B | 0x0E..=0x1A | 0x1C..=0x1F)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text() {
        assert_eq!(detect_content_type(b""), TEXT_UTF8);
        assert_eq!(detect_content_type(b"hello world\n"), TEXT_UTF8);
        assert_eq!(detect_content_type("héllo\tworld\r\n".as_bytes()), TEXT_UTF8);
        assert!(!is_binary_content(b"fn main() {}\n"));
    }

    #[test]
    fn test_binary() {
        assert_eq!(detect_content_type(b"abc\x00def"), OCTET_STREAM);
        assert_eq!(detect_content_type(b"\x7FELF\x02\x01\x01\x00"), OCTET_STREAM);
        assert!(is_binary_content(&[0u8; 16]));
    }

    #[test]
    fn test_signatures() {
        assert_eq!(detect_content_type(b"%PDF-1.7\n"), "application/pdf");
        assert_eq!(detect_content_type(b"\x89PNG\r\n\x1a\n\x00\x00"), "image/png");
        assert_eq!(detect_content_type(b"PK\x03\x04rest"), "application/zip");
        assert_eq!(
            detect_content_type(b"\xEF\xBB\xBFbom text"),
            "text/plain; charset=utf-8"
        );
    }

    #[test]
    fn test_markup() {
        assert_eq!(
            detect_content_type(b"  <html><body></body></html>"),
            "text/html; charset=utf-8"
        );
        assert_eq!(
            detect_content_type(b"<!doctype html>\n"),
            "text/html; charset=utf-8"
        );
        assert_eq!(
            detect_content_type(b"<?xml version=\"1.0\"?>"),
            "text/xml; charset=utf-8"
        );
        // `<a` must be followed by a tag terminator.
        assert_eq!(detect_content_type(b"<abc"), TEXT_UTF8);
    }

    #[test]
    fn test_only_head_is_considered() {
        let mut data = vec![b'a'; SNIFF_LEN];
        data.push(0);
        assert_eq!(detect_content_type(&data), TEXT_UTF8);
    }
}
