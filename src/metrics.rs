//! # Character Metrics
//!
//! Advance widths for the wrap estimator, based on the Helvetica AFM tables
//! (the reference sans-serif used for poster body text). Widths are in
//! 1/1000s of an em; the estimator only needs relative proportions good
//! enough for line counting, not glyph-exact shaping.

/// Advance widths for ASCII 32..=126, in 1/1000 em.
#[rustfmt::skip]
const ASCII_WIDTHS: [u16; 95] = [
    278, 278, 355, 556, 556, 889, 667, 191, // ' ' ! " # $ % & '
    333, 333, 389, 584, 278, 333, 278, 278, // ( ) * + , - . /
    556, 556, 556, 556, 556, 556, 556, 556, // 0 1 2 3 4 5 6 7
    556, 556, 278, 278, 584, 584, 584, 556, // 8 9 : ; < = > ?
    1015, 667, 667, 722, 722, 667, 611, 778, // @ A B C D E F G
    722, 278, 500, 667, 556, 833, 722, 778, // H I J K L M N O
    667, 778, 722, 667, 611, 722, 667, 944, // P Q R S T U V W
    667, 667, 611, 278, 278, 278, 469, 556, // X Y Z [ \ ] ^ _
    333, 556, 556, 500, 556, 556, 278, 556, // ` a b c d e f g
    556, 222, 222, 500, 222, 833, 556, 556, // h i j k l m n o
    556, 556, 333, 500, 278, 556, 500, 722, // p q r s t u v w
    500, 500, 500, 334, 260, 334, 584,      // x y z { | } ~
];

/// Fallback width for characters outside the table.
const DEFAULT_WIDTH: u16 = 556;

/// Advance width of a character in inches at the given font size (points).
pub fn char_width(ch: char, font_size_pt: f64) -> f64 {
    let units = match ch as u32 {
        32..=126 => ASCII_WIDTHS[ch as usize - 32],
        _ => DEFAULT_WIDTH,
    };
    (units as f64 / 1000.0) * font_size_pt / 72.0
}

/// Width of a string in inches at the given font size (points).
pub fn string_width(text: &str, font_size_pt: f64) -> f64 {
    text.chars().map(|ch| char_width(ch, font_size_pt)).sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn space_is_narrower_than_em() {
        assert!(char_width(' ', 12.0) < char_width('m', 12.0));
    }

    #[test]
    fn width_scales_linearly_with_font_size() {
        let w12 = string_width("poster", 12.0);
        let w24 = string_width("poster", 24.0);
        assert!((w24 - 2.0 * w12).abs() < 1e-9);
    }

    #[test]
    fn non_ascii_uses_fallback() {
        assert!((char_width('é', 72.0) - 0.556).abs() < 1e-9);
    }
}
