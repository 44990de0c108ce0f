//! `data:` URI decoding and encoding, plus MIME sniffing for embedded images.

use base64::Engine;

const DATA_PREFIX: &str = "data:";

/// Default MIME type for embedded buffers.
pub const OCTET_STREAM: &str = "application/octet-stream";

pub fn is_data_uri(uri: &str) -> bool {
    uri.starts_with(DATA_PREFIX)
}

/// A decoded `data:` URI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataUri {
    pub mime_type: Option<String>,
    pub data: Vec<u8>,
}

/// Decodes `data:[<mediatype>][;base64],<data>`.
///
/// Payloads without `;base64` are percent-decoded. Base64 padding is optional.
pub fn decode(uri: &str) -> Result<DataUri, String> {
    let rest = uri
        .strip_prefix(DATA_PREFIX)
        .ok_or_else(|| "missing 'data:' prefix".to_string())?;
    let comma = rest
        .find(',')
        .ok_or_else(|| "no ',' separating header and payload".to_string())?;
    let header = &rest[..comma];
    let payload = &rest[comma + 1..];

    let mut params = header.split(';');
    let mime_type = params
        .next()
        .filter(|m| !m.is_empty())
        .map(str::to_string);
    let is_base64 = params.any(|p| p.eq_ignore_ascii_case("base64"));

    let data = if is_base64 {
        base64::engine::general_purpose::STANDARD_NO_PAD
            .decode(payload.trim_end_matches('='))
            .map_err(|e| format!("invalid base64 payload: {}", e))?
    } else {
        percent_decode(payload)
    };

    Ok(DataUri { mime_type, data })
}

/// Encodes bytes as a base64 `data:` URI.
pub fn encode(mime_type: &str, data: &[u8]) -> String {
    format!(
        "{}{};base64,{}",
        DATA_PREFIX,
        mime_type,
        base64::engine::general_purpose::STANDARD.encode(data)
    )
}

/// Decodes `%XX` escapes. Malformed escapes pass through unchanged.
pub fn percent_decode(input: &str) -> Vec<u8> {
    let mut output = Vec::with_capacity(input.len());
    let bytes = input.as_bytes();
    let mut i = 0;

    while i < bytes.len() {
        if bytes[i] == b'%' && i + 2 < bytes.len() {
            if let (Some(h), Some(l)) = (hex_digit(bytes[i + 1]), hex_digit(bytes[i + 2])) {
                output.push((h << 4) | l);
                i += 3;
                continue;
            }
        }
        output.push(bytes[i]);
        i += 1;
    }

    output
}

fn hex_digit(b: u8) -> Option<u8> {
    match b {
        b'0'..=b'9' => Some(b - b'0'),
        b'a'..=b'f' => Some(b - b'a' + 10),
        b'A'..=b'F' => Some(b - b'A' + 10),
        _ => None,
    }
}

/// Guesses an image MIME type from magic bytes.
pub fn sniff_mime(data: &[u8]) -> Option<&'static str> {
    const KTX2: &[u8] = b"\xABKTX 20\xBB\r\n\x1A\n";
    if data.starts_with(b"\x89PNG\r\n\x1A\n") {
        Some("image/png")
    } else if data.starts_with(&[0xFF, 0xD8, 0xFF]) {
        Some("image/jpeg")
    } else if data.starts_with(b"GIF87a") || data.starts_with(b"GIF89a") {
        Some("image/gif")
    } else if data.len() >= 12 && &data[0..4] == b"RIFF" && &data[8..12] == b"WEBP" {
        Some("image/webp")
    } else if data.starts_with(KTX2) {
        Some("image/ktx2")
    } else {
        None
    }
}
