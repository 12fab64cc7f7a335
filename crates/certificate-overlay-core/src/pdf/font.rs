//! Standard 14 font metrics and WinAnsi text encoding for overlay text.
//!
//! The overlay uses the built-in Helvetica faces instead of embedding a font
//! program. Every conforming PDF viewer ships these faces, so the overlay only
//! needs a small font dictionary plus the advance widths used to centre lines.
//!
//! # Encoding
//!
//! Text is encoded with `WinAnsiEncoding`:
//! - U+0020..U+007E and U+00A0..U+00FF map to the byte of the same value
//! - A handful of typographic characters map into 0x80..0x9F
//! - Anything else is replaced with `?`

use lopdf::{Dictionary, Object};
use serde::{Deserialize, Serialize};

/// Advance widths (1/1000 em) for bytes 0x20..=0x7E in Helvetica.
const HELVETICA_ASCII: [u16; 95] = [
    278, 278, 355, 556, 556, 889, 667, 191, 333, 333, 389, 584, 278, 333, 278, 278, // 0x20
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, 278, 278, 584, 584, 584, 556, // 0x30
    1015, 667, 667, 722, 722, 667, 611, 778, 722, 278, 500, 667, 556, 833, 722, 778, // 0x40
    667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, 278, 278, 278, 469, 556, // 0x50
    333, 556, 556, 500, 556, 556, 278, 556, 556, 222, 222, 500, 222, 833, 556, 556, // 0x60
    556, 556, 333, 500, 278, 556, 500, 722, 500, 500, 500, 334, 260, 334, 584, // 0x70
];

/// Advance widths (1/1000 em) for bytes 0x20..=0x7E in Helvetica-Bold.
const HELVETICA_BOLD_ASCII: [u16; 95] = [
    278, 333, 474, 556, 556, 889, 722, 238, 333, 333, 389, 584, 278, 333, 278, 278, // 0x20
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, 333, 333, 584, 584, 584, 611, // 0x30
    975, 722, 722, 722, 722, 667, 611, 778, 722, 278, 556, 722, 611, 833, 722, 778, // 0x40
    667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, 333, 278, 333, 584, 556, // 0x50
    333, 556, 611, 556, 611, 556, 333, 611, 611, 278, 278, 556, 278, 889, 611, 611, // 0x60
    611, 611, 389, 556, 333, 611, 556, 778, 556, 556, 500, 389, 280, 389, 584, // 0x70
];

/// Width used for bytes with no explicit metric.
const FALLBACK_WIDTH: u16 = 556;

/// A standard 14 font usable in overlay text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StandardFont {
    Helvetica,
    HelveticaBold,
}

impl StandardFont {
    /// Every font the overlay may reference, in resource order.
    pub const ALL: [Self; 2] = [Self::Helvetica, Self::HelveticaBold];

    /// PostScript name written as `/BaseFont`.
    pub const fn base_font(self) -> &'static str {
        match self {
            Self::Helvetica => "Helvetica",
            Self::HelveticaBold => "Helvetica-Bold",
        }
    }

    /// Name under which the font is registered in the page's `/Font` resources.
    pub const fn resource_name(self) -> &'static str {
        match self {
            Self::Helvetica => "F1",
            Self::HelveticaBold => "F2",
        }
    }

    const fn ascii_widths(self) -> &'static [u16; 95] {
        match self {
            Self::Helvetica => &HELVETICA_ASCII,
            Self::HelveticaBold => &HELVETICA_BOLD_ASCII,
        }
    }

    /// Advance width of a single WinAnsi byte, in 1/1000 em.
    pub fn byte_width(self, byte: u8) -> u16 {
        let bold = matches!(self, Self::HelveticaBold);
        match byte {
            0x20..=0x7E => self.ascii_widths()[usize::from(byte - 0x20)],
            0x85 | 0x97 => 1000,
            0x91 | 0x92 => if bold { 278 } else { 222 },
            0x93 | 0x94 => if bold { 500 } else { 333 },
            0x95 => 350,
            0xA0 => 278,
            0xA1 => 333,
            0xAA => 370,
            0xB0 => 400,
            0xBA => 365,
            0xBF => 611,
            0xA9 | 0xAE => 737,
            0xC6 => 1000,
            0xD7 | 0xF7 => 584,
            0xDF => 611,
            0xE6 => 889,
            // Accented i's are wider than the plain 'i' in Helvetica
            0xEC..=0xEF => 278,
            0xF0 | 0xFE => if bold { 611 } else { 556 },
            0xC0..=0xFF => base_letter(byte).map_or(FALLBACK_WIDTH, |b| self.byte_width(b)),
            _ => FALLBACK_WIDTH,
        }
    }

    /// Width of `text` in PDF points at `font_size`.
    pub fn string_width(self, text: &str, font_size: f32) -> f32 {
        let units: u32 = encode_win_ansi(text)
            .into_iter()
            .map(|b| u32::from(self.byte_width(b)))
            .sum();
        #[allow(clippy::cast_precision_loss)] // Widths of a single line stay far below 2^24
        let units = units as f32;
        units * font_size / 1000.0
    }

    /// Build the Type1 font dictionary for this face.
    pub fn font_dictionary(self) -> Dictionary {
        Dictionary::from_iter([
            ("Type", Object::Name(b"Font".to_vec())),
            ("Subtype", Object::Name(b"Type1".to_vec())),
            ("BaseFont", Object::Name(self.base_font().as_bytes().to_vec())),
            ("Encoding", Object::Name(b"WinAnsiEncoding".to_vec())),
        ])
    }
}

/// Unaccented ASCII letter sharing the advance width of a Latin-1 letter.
const fn base_letter(byte: u8) -> Option<u8> {
    let base = match byte {
        0xC0..=0xC5 => b'A',
        0xC7 => b'C',
        0xC8..=0xCB => b'E',
        0xCC..=0xCF => b'I',
        0xD0 => b'D',
        0xD1 => b'N',
        0xD2..=0xD6 | 0xD8 => b'O',
        0xD9..=0xDC => b'U',
        0xDD => b'Y',
        0xDE => b'P',
        0xE0..=0xE5 => b'a',
        0xE7 => b'c',
        0xE8..=0xEB => b'e',
        0xF1 => b'n',
        0xF2..=0xF6 | 0xF8 => b'o',
        0xF9..=0xFC => b'u',
        0xFD | 0xFF => b'y',
        _ => return None,
    };
    Some(base)
}

/// Encode text as WinAnsi bytes, replacing unsupported characters with `?`.
pub fn encode_win_ansi(text: &str) -> Vec<u8> {
    text.chars()
        .map(|c| match u32::from(c) {
            code @ (0x20..=0x7E | 0xA0..=0xFF) => u8::try_from(code).unwrap_or(b'?'),
            _ => match c {
                '€' => 0x80,
                '…' => 0x85,
                '‘' => 0x91,
                '’' => 0x92,
                '“' => 0x93,
                '”' => 0x94,
                '•' => 0x95,
                '–' => 0x96,
                '—' => 0x97,
                '\t' => b' ',
                _ => b'?',
            },
        })
        .collect()
}

/// Convert text to a hex string of WinAnsi bytes for PDF content streams.
/// Returns the hex string without angle brackets.
pub fn text_to_hex(text: &str) -> String {
    use std::fmt::Write;
    encode_win_ansi(text).into_iter().fold(String::new(), |mut acc, b| {
        let _ = write!(acc, "{b:02X}");
        acc
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ascii_passthrough() {
        assert_eq!(encode_win_ansi("Aluno: 42"), b"Aluno: 42".to_vec());
    }

    #[test]
    fn test_latin1_accents() {
        assert_eq!(encode_win_ansi("ãçé"), vec![0xE3, 0xE7, 0xE9]);
    }

    #[test]
    fn test_unsupported_characters_replaced() {
        assert_eq!(encode_win_ansi("a漢b"), b"a?b".to_vec());
        assert_eq!(encode_win_ansi("–"), vec![0x96]);
    }

    #[test]
    fn test_hex_conversion() {
        assert_eq!(text_to_hex("A"), "41");
        assert_eq!(text_to_hex("ão"), "E36F");
    }

    #[test]
    fn test_string_width_matches_afm() {
        // "Aluno" = 667 + 222 + 556 + 556 + 556
        let width = StandardFont::Helvetica.string_width("Aluno", 10.0);
        assert!((width - 25.57).abs() < 0.001);
    }

    #[test]
    fn test_accented_letters_use_base_width() {
        let font = StandardFont::Helvetica;
        assert_eq!(font.byte_width(0xE3), font.byte_width(b'a'));
        assert_eq!(font.byte_width(0xC7), font.byte_width(b'C'));
        assert_eq!(font.byte_width(0xED), 278);
    }

    #[test]
    fn test_bold_is_wider() {
        let text = "Cursos Concluídos:";
        assert!(
            StandardFont::HelveticaBold.string_width(text, 16.0)
                > StandardFont::Helvetica.string_width(text, 16.0)
        );
    }

    #[test]
    fn test_font_dictionary() {
        let dict = StandardFont::HelveticaBold.font_dictionary();
        assert_eq!(dict.get(b"BaseFont").and_then(Object::as_name).ok(), Some(&b"Helvetica-Bold"[..]));
        assert_eq!(dict.get(b"Encoding").and_then(Object::as_name).ok(), Some(&b"WinAnsiEncoding"[..]));
    }
}
