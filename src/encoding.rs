use encoding_rs::{Encoding, UTF_8, UTF_16BE, UTF_16LE};

/// Output encoding for text taken from the document.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum TextEncoding {
    #[default]
    Utf8,
    /// 7-bit ASCII; anything above U+007F is dropped.
    Ascii7,
    /// UTF-16 code units, big endian, no byte order mark.
    Ucs2,
    /// Any single- or multi-byte encoding `encoding_rs` can encode into.
    Other(&'static Encoding),
}

impl TextEncoding {
    pub const DEFAULT_NAME: &'static str = "UTF-8";

    /// Resolve an encoding by name, case-insensitively. Besides the WHATWG
    /// labels this accepts the `ASCII7`, `UCS-2` and `Latin1` names.
    pub fn for_name(name: &str) -> Option<TextEncoding> {
        let name = name.trim();
        if name.eq_ignore_ascii_case("ASCII7") || name.eq_ignore_ascii_case("ASCII") {
            return Some(TextEncoding::Ascii7);
        }
        if name.eq_ignore_ascii_case("UCS-2") || name.eq_ignore_ascii_case("UCS2") {
            return Some(TextEncoding::Ucs2);
        }

        let encoding = Encoding::for_label(name.as_bytes())?;
        Some(if encoding == UTF_8 {
            TextEncoding::Utf8
        } else if encoding == UTF_16BE {
            TextEncoding::Ucs2
        } else if encoding == UTF_16LE || encoding.output_encoding() != encoding {
            // encoding_rs can only decode these; it would silently write UTF-8
            return None;
        } else {
            TextEncoding::Other(encoding)
        })
    }

    /// Encode text, dropping characters the encoding cannot represent.
    pub fn encode(&self, text: &str) -> Vec<u8> {
        match self {
            TextEncoding::Utf8 => text.as_bytes().to_vec(),
            TextEncoding::Ascii7 => text.bytes().filter(u8::is_ascii).collect(),
            TextEncoding::Ucs2 => text.encode_utf16().flat_map(u16::to_be_bytes).collect(),
            TextEncoding::Other(encoding) => {
                let mut out = Vec::with_capacity(text.len());
                let mut buf = [0u8; 4];
                for c in text.chars() {
                    let (bytes, _, unmappable) = encoding.encode(c.encode_utf8(&mut buf));
                    if !unmappable {
                        out.extend_from_slice(&bytes);
                    }
                }
                out
            }
        }
    }
}
