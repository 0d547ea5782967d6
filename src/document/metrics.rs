//! Glyph metrics for the standard Helvetica faces and WinAnsi encoding.
//!
//! Widths are the Adobe AFM advance widths in 1/1000 em, which is what a PDF
//! viewer uses for the built-in fonts, so wrapped lines measured here match
//! what ends up on paper.

use super::layout::Font;

/// Millimetres per PDF point.
pub const MM_PER_PT: f64 = 25.4 / 72.0;

/// Widths for U+0020..=U+007E.
const HELVETICA_ASCII: [u16; 95] = [
    278, 278, 355, 556, 556, 889, 667, 191, 333, 333, 389, 584, 278, 333, 278, 278, // ' '..'/'
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, // '0'..'9'
    278, 278, 584, 584, 584, 556, 1015, // ':'..'@'
    667, 667, 722, 722, 667, 611, 778, 722, 278, 500, 667, 556, 833, // 'A'..'M'
    722, 778, 667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, // 'N'..'Z'
    278, 278, 278, 469, 556, 333, // '['..'`'
    556, 556, 500, 556, 556, 278, 556, 556, 222, 222, 500, 222, 833, // 'a'..'m'
    556, 556, 556, 556, 333, 500, 278, 556, 500, 722, 500, 500, 500, // 'n'..'z'
    334, 260, 334, 584, // '{'..'~'
];

const HELVETICA_BOLD_ASCII: [u16; 95] = [
    278, 333, 474, 556, 556, 889, 722, 238, 333, 333, 389, 584, 278, 333, 278, 278, // ' '..'/'
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, // '0'..'9'
    333, 333, 584, 584, 584, 611, 975, // ':'..'@'
    722, 722, 722, 722, 667, 611, 778, 722, 278, 556, 722, 611, 833, // 'A'..'M'
    722, 778, 667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, // 'N'..'Z'
    333, 278, 333, 584, 556, 333, // '['..'`'
    556, 611, 556, 611, 556, 333, 611, 611, 278, 278, 556, 278, 889, // 'a'..'m'
    611, 611, 611, 611, 389, 556, 333, 611, 556, 778, 556, 556, 500, // 'n'..'z'
    389, 280, 389, 584, // '{'..'~'
];

/// Fallback advance for glyphs without an entry.
const DEFAULT_WIDTH: u16 = 556;

/// Advance width of `ch` in 1/1000 em.
pub fn glyph_width(ch: char, font: Font) -> u16 {
    let table = match font {
        Font::Regular => &HELVETICA_ASCII,
        Font::Bold => &HELVETICA_BOLD_ASCII,
    };

    let code = ch as u32;
    if (0x20..=0x7E).contains(&code) {
        return table[(code - 0x20) as usize];
    }

    match ch {
        '\u{A0}' => table[0],
        '\u{2013}' => 556,
        '\u{2014}' | '\u{2026}' | '\u{2030}' => 1000,
        '\u{2018}' | '\u{2019}' | '\u{201A}' => match font {
            Font::Regular => 222,
            Font::Bold => 278,
        },
        '\u{201C}' | '\u{201D}' | '\u{201E}' => match font {
            Font::Regular => 333,
            Font::Bold => 500,
        },
        '\u{2022}' => 350,
        'º' | 'ª' => match font {
            Font::Regular => 365,
            Font::Bold => 370,
        },
        '°' => 400,
        _ => match base_letter(ch) {
            Some(base) => table[(base as u32 - 0x20) as usize],
            None => DEFAULT_WIDTH,
        },
    }
}

/// Width of `text` in millimetres at `size` points.
pub fn text_width(text: &str, font: Font, size: f64) -> f64 {
    let units: u32 = text.chars().map(|ch| glyph_width(ch, font) as u32).sum();
    units as f64 / 1000.0 * size * MM_PER_PT
}

/// Accented Latin-1 letters share the advance of their unaccented base.
fn base_letter(ch: char) -> Option<char> {
    let base = match ch {
        'À' | 'Á' | 'Â' | 'Ã' | 'Ä' | 'Å' => 'A',
        'Ç' => 'C',
        'È' | 'É' | 'Ê' | 'Ë' => 'E',
        'Ì' | 'Í' | 'Î' | 'Ï' => 'I',
        'Ñ' => 'N',
        'Ò' | 'Ó' | 'Ô' | 'Õ' | 'Ö' => 'O',
        'Ù' | 'Ú' | 'Û' | 'Ü' => 'U',
        'Ý' => 'Y',
        'à' | 'á' | 'â' | 'ã' | 'ä' | 'å' => 'a',
        'ç' => 'c',
        'è' | 'é' | 'ê' | 'ë' => 'e',
        'ì' | 'í' | 'î' | 'ï' => 'i',
        'ñ' => 'n',
        'ò' | 'ó' | 'ô' | 'õ' | 'ö' => 'o',
        'ù' | 'ú' | 'û' | 'ü' => 'u',
        'ý' | 'ÿ' => 'y',
        _ => return None,
    };
    Some(base)
}

/// Encode a character for a WinAnsi-encoded standard font.
///
/// Latin-1 maps to itself; a handful of typographic characters live in the
/// 0x80..0x9F block. Anything else becomes `?`.
pub fn win_ansi_byte(ch: char) -> u8 {
    let code = ch as u32;
    if (0x20..=0x7E).contains(&code) || (0xA0..=0xFF).contains(&code) {
        return code as u8;
    }
    match ch {
        '\u{20AC}' => 0x80,
        '\u{201A}' => 0x82,
        '\u{201E}' => 0x84,
        '\u{2026}' => 0x85,
        '\u{2030}' => 0x89,
        '\u{2018}' => 0x91,
        '\u{2019}' => 0x92,
        '\u{201C}' => 0x93,
        '\u{201D}' => 0x94,
        '\u{2022}' => 0x95,
        '\u{2013}' => 0x96,
        '\u{2014}' => 0x97,
        '\t' => b' ',
        _ => b'?',
    }
}
