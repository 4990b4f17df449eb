//! Inbound byte-stream repair.
//!
//! IRC carries no encoding negotiation, so a peer can send anything. Lines
//! are interpreted as UTF-8 first; byte sequences that fail validation are
//! reinterpreted as Windows-1252, the de-facto legacy encoding on ASCII-ish
//! networks. Decoding is total: the caller always gets valid UTF-8 back,
//! never an error, because a hostile or misconfigured peer must not be able
//! to crash anything downstream.

use encoding_rs::WINDOWS_1252;

/// Decode one raw inbound line into valid UTF-8.
///
/// Valid UTF-8 input is returned byte-for-byte. Anything else is decoded as
/// Windows-1252; bytes that still cannot be mapped become U+FFFD. This
/// repairs mixed lines like `b"abcd\xE9f"` into `"abcdéf"`.
pub fn decode_line(bytes: &[u8]) -> String {
    match std::str::from_utf8(bytes) {
        Ok(s) => s.to_owned(),
        Err(_) => {
            let (text, _, _) = WINDOWS_1252.decode(bytes);
            text.into_owned()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn valid_utf8_unchanged() {
        assert_eq!(decode_line("hello こんにちは".as_bytes()), "hello こんにちは");
    }

    #[test]
    fn empty_input() {
        assert_eq!(decode_line(b""), "");
    }

    #[test]
    fn latin1_byte_repaired() {
        // 0xE9 is 'é' in Windows-1252 but invalid as a lone UTF-8 byte.
        assert_eq!(decode_line(b"abcd\xE9f"), "abcd\u{e9}f");
    }

    #[test]
    fn cp1252_specific_range() {
        // 0x93/0x94 are curly quotes in Windows-1252, C1 controls in Latin-1.
        assert_eq!(decode_line(b"\x93quoted\x94"), "\u{201c}quoted\u{201d}");
    }

    #[test]
    fn utf8_multibyte_not_misread_as_cp1252() {
        // Valid UTF-8 for 'é' (0xC3 0xA9) must stay one char, not become "Ã©".
        assert_eq!(decode_line(b"caf\xC3\xA9"), "café");
    }

    proptest! {
        #[test]
        fn never_fails_on_arbitrary_bytes(bytes in proptest::collection::vec(any::<u8>(), 0..520)) {
            // Total function: the output is a String, hence valid UTF-8.
            // Both paths decode each input byte to at most one char.
            let decoded = decode_line(&bytes);
            prop_assert!(decoded.chars().count() <= bytes.len());
        }

        #[test]
        fn valid_utf8_roundtrips(s in ".*") {
            prop_assert_eq!(decode_line(s.as_bytes()), s);
        }
    }
}
