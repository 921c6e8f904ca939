//! Modified UTF-8, the string encoding of class file Utf8 constants.
//!
//! Differs from standard UTF-8 in two ways: NUL is written as the two byte
//! sequence `C0 80`, and characters outside the BMP are written as a pair of
//! three byte encoded surrogates instead of one four byte sequence.

/// Decodes modified UTF-8. Returns `None` on malformed input or lone surrogates.
pub fn decode(bytes: &[u8]) -> Option<String> {
    let mut units = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        let b0 = bytes[i];
        if b0 & 0x80 == 0 {
            if b0 == 0 {
                return None;
            }
            units.push(u16::from(b0));
            i += 1;
        } else if b0 & 0xE0 == 0xC0 {
            let b1 = continuation(bytes, i + 1)?;
            units.push((u16::from(b0 & 0x1F) << 6) | b1);
            i += 2;
        } else if b0 & 0xF0 == 0xE0 {
            let b1 = continuation(bytes, i + 1)?;
            let b2 = continuation(bytes, i + 2)?;
            units.push((u16::from(b0 & 0x0F) << 12) | (b1 << 6) | b2);
            i += 3;
        } else {
            return None;
        }
    }
    String::from_utf16(&units).ok()
}

pub fn encode(value: &str) -> Vec<u8> {
    let mut out = Vec::with_capacity(value.len());
    for unit in value.encode_utf16() {
        match unit {
            0x0001..=0x007F => out.push(unit as u8),
            0x0000 | 0x0080..=0x07FF => {
                out.push(0xC0 | (unit >> 6) as u8);
                out.push(0x80 | (unit & 0x3F) as u8);
            }
            _ => {
                out.push(0xE0 | (unit >> 12) as u8);
                out.push(0x80 | ((unit >> 6) & 0x3F) as u8);
                out.push(0x80 | (unit & 0x3F) as u8);
            }
        }
    }
    out
}

fn continuation(bytes: &[u8], at: usize) -> Option<u16> {
    let b = *bytes.get(at)?;
    (b & 0xC0 == 0x80).then_some(u16::from(b & 0x3F))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ascii_is_unchanged() {
        assert_eq!(encode("net/minecraft/class_1;"), b"net/minecraft/class_1;");
        assert_eq!(decode(b"Lfoo/Bar;").as_deref(), Some("Lfoo/Bar;"));
    }

    #[test]
    fn nul_uses_two_bytes() {
        assert_eq!(encode("a\0b"), vec![b'a', 0xC0, 0x80, b'b']);
        assert_eq!(decode(&[b'a', 0xC0, 0x80, b'b']).as_deref(), Some("a\0b"));
        assert_eq!(decode(&[b'a', 0x00]), None);
    }

    #[test]
    fn supplementary_characters_use_surrogate_pairs() {
        let encoded = encode("\u{1F600}");
        assert_eq!(encoded, vec![0xED, 0xA0, 0xBD, 0xED, 0xB8, 0x80]);
        assert_eq!(decode(&encoded).as_deref(), Some("\u{1F600}"));
    }

    #[test]
    fn truncated_sequences_are_rejected() {
        assert_eq!(decode(&[0xE2, 0x82]), None);
        assert_eq!(decode(&[0xF0, 0x9F, 0x98, 0x80]), None);
    }
}
