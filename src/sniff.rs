//! Content-Type detection for response bodies written without one.
//!
//! Looks at no more than the first 512 bytes and always returns a valid MIME
//! type, falling back to `application/octet-stream`.

const SNIFF_LEN: usize = 512;

const TEXT_HTML: &str = "text/html; charset=utf-8";
const TEXT_PLAIN: &str = "text/plain; charset=utf-8";
const OCTET_STREAM: &str = "application/octet-stream";

enum Signature {
    /// Case-insensitive tag after optional whitespace, terminated by space or `>`.
    Html(&'static [u8]),
    /// Exact prefix, optionally after leading whitespace.
    Prefix {
        pattern: &'static [u8],
        skip_whitespace: bool,
        content_type: &'static str,
    },
    /// Prefix compared under a byte mask.
    Masked {
        mask: &'static [u8],
        pattern: &'static [u8],
        content_type: &'static str,
    },
}

const fn prefix(pattern: &'static [u8], content_type: &'static str) -> Signature {
    Signature::Prefix {
        pattern,
        skip_whitespace: false,
        content_type,
    }
}

static SIGNATURES: &[Signature] = &[
    Signature::Html(b"<!DOCTYPE HTML"),
    Signature::Html(b"<HTML"),
    Signature::Html(b"<HEAD"),
    Signature::Html(b"<SCRIPT"),
    Signature::Html(b"<IFRAME"),
    Signature::Html(b"<H1"),
    Signature::Html(b"<DIV"),
    Signature::Html(b"<FONT"),
    Signature::Html(b"<TABLE"),
    Signature::Html(b"<A"),
    Signature::Html(b"<STYLE"),
    Signature::Html(b"<TITLE"),
    Signature::Html(b"<B"),
    Signature::Html(b"<BODY"),
    Signature::Html(b"<BR"),
    Signature::Html(b"<P"),
    Signature::Html(b"<!--"),
    Signature::Prefix {
        pattern: b"<?xml",
        skip_whitespace: true,
        content_type: "text/xml; charset=utf-8",
    },
    prefix(b"%PDF-", "application/pdf"),
    prefix(b"%!PS-Adobe-", "application/postscript"),
    prefix(b"\xFE\xFF", "text/plain; charset=utf-16be"),
    prefix(b"\xFF\xFE", "text/plain; charset=utf-16le"),
    prefix(b"\xEF\xBB\xBF", TEXT_PLAIN),
    prefix(b"\x00\x00\x01\x00", "image/x-icon"),
    prefix(b"\x00\x00\x02\x00", "image/x-icon"),
    prefix(b"BM", "image/bmp"),
    prefix(b"GIF87a", "image/gif"),
    prefix(b"GIF89a", "image/gif"),
    Signature::Masked {
        mask: b"\xFF\xFF\xFF\xFF\x00\x00\x00\x00\xFF\xFF\xFF\xFF\xFF\xFF",
        pattern: b"RIFF\x00\x00\x00\x00WEBPVP",
        content_type: "image/webp",
    },
    prefix(b"\x89PNG\x0D\x0A\x1A\x0A", "image/png"),
    prefix(b"\xFF\xD8\xFF", "image/jpeg"),
    prefix(b"OggS\x00", "application/ogg"),
    prefix(b"ID3", "audio/mpeg"),
    prefix(b"wOFF", "font/woff"),
    prefix(b"wOF2", "font/woff2"),
    prefix(b"\x1F\x8B\x08", "application/x-gzip"),
    prefix(b"PK\x03\x04", "application/zip"),
    prefix(b"Rar!\x1A\x07\x00", "application/x-rar-compressed"),
    prefix(b"Rar!\x1A\x07\x01\x00", "application/x-rar-compressed"),
    prefix(b"\x00\x61\x73\x6D", "application/wasm"),
];

const fn is_whitespace(b: u8) -> bool {
    matches!(b, b'\t' | b'\n' | b'\x0C' | b'\r' | b' ')
}

/// Control bytes that never appear in text.
const fn is_binary_byte(b: u8) -> bool {
    matches!(b, 0x00..=0x08 | 0x0B | 0x0E..=0x1A | 0x1C..=0x1F)
}

fn skip_whitespace(data: &[u8]) -> &[u8] {
    let start = data.iter().position(|b| !is_whitespace(*b)).unwrap_or(data.len());
    data.get(start..).unwrap_or_default()
}

impl Signature {
    fn matches(&self, data: &[u8]) -> Option<&'static str> {
        match self {
            Self::Html(tag) => {
                let data = skip_whitespace(data);
                let head = data.get(..tag.len())?;
                let terminator = *data.get(tag.len())?;
                (head.eq_ignore_ascii_case(tag) && (terminator == b' ' || terminator == b'>'))
                    .then_some(TEXT_HTML)
            }
            Self::Prefix {
                pattern,
                skip_whitespace: skip,
                content_type,
            } => {
                let data = if *skip { skip_whitespace(data) } else { data };
                data.starts_with(pattern).then_some(*content_type)
            }
            Self::Masked {
                mask,
                pattern,
                content_type,
            } => {
                let head = data.get(..pattern.len())?;
                head.iter()
                    .zip(mask.iter())
                    .zip(pattern.iter())
                    .all(|((b, m), p)| b & m == *p)
                    .then_some(*content_type)
            }
        }
    }
}

/// Detects the content type of `data`.
#[must_use]
pub fn detect_content_type(data: &[u8]) -> &'static str {
    let data = data.get(..SNIFF_LEN).unwrap_or(data);
    if let Some(content_type) = SIGNATURES.iter().find_map(|sig| sig.matches(data)) {
        return content_type;
    }
    if data.iter().copied().any(is_binary_byte) {
        OCTET_STREAM
    } else {
        TEXT_PLAIN
    }
}
