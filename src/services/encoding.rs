use chardetng::EncodingDetector;
use encoding_rs::Encoding;
use tracing::warn;

const UTF8_BOM: [u8; 3] = [0xEF, 0xBB, 0xBF];

/// Decodes a dataset file. UTF-8 (with or without BOM) passes through;
/// anything else is sniffed and converted, which happens when a CSV went
/// through a spreadsheet and came back as windows-1252.
pub fn decode(bytes: &[u8]) -> String {
    let bytes = bytes.strip_prefix(&UTF8_BOM[..]).unwrap_or(bytes);

    if let Ok(text) = std::str::from_utf8(bytes) {
        return text.to_string();
    }

    let mut detector = EncodingDetector::new();
    detector.feed(bytes, true);
    let encoding = detector.guess(None, true);

    let (text, lossy) = decode_with(bytes, encoding);
    warn!(
        encoding = encoding.name(),
        lossy,
        "dataset is not valid UTF-8; decoded with detected encoding"
    );

    text
}

/// Decodes `bytes` as `encoding`; the flag is set when some bytes had to be
/// replaced.
pub fn decode_with(bytes: &[u8], encoding: &'static Encoding) -> (String, bool) {
    let (text, _, had_errors) = encoding.decode(bytes);
    (text.into_owned(), had_errors)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bom_is_stripped() {
        let mut bytes = UTF8_BOM.to_vec();
        bytes.extend_from_slice("headword,definition".as_bytes());
        assert_eq!(decode(&bytes), "headword,definition");
    }

    #[test]
    fn explicit_encoding_reports_replacements() {
        let (text, lossy) = decode_with(b"caf\xe9", encoding_rs::WINDOWS_1252);
        assert_eq!(text, "caf\u{e9}");
        assert!(!lossy);

        let (_, lossy) = decode_with(b"caf\xe9", encoding_rs::UTF_8);
        assert!(lossy);
    }

    #[test]
    fn latin1_bytes_are_converted() {
        // "café" in windows-1252
        let bytes = b"caf\xe9 au lait,coffee,simile\n";
        let text = decode(bytes);
        assert!(text.starts_with("caf\u{e9} au lait"));
    }
}
