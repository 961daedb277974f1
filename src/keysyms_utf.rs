use crate::keysyms::{XKB_KEYSYM_UNICODE_MAX, XKB_KEYSYM_UNICODE_OFFSET};
use xkeysym::Keysym;

// Highest legacy keysym with a Unicode counterpart.
const LEGACY_KEYSYM_MAX: u32 = 0x20ff;

pub fn keysym_to_utf32(keysym: Keysym) -> Option<char> {
    let raw = keysym.raw();

    /* first check for Latin-1 characters (1:1 mapping) */
    if (0x0020..=0x007e).contains(&raw) || (0x00a0..=0x00ff).contains(&raw) {
        return char::from_u32(raw);
    }

    /* patch encoding botch */
    if keysym == Keysym::KP_Space {
        return Some(' ');
    }

    /* special keysyms */
    if (Keysym::BackSpace..=Keysym::Clear).contains(&keysym)
        || (Keysym::KP_Multiply..=Keysym::KP_9).contains(&keysym)
        || keysym == Keysym::Return
        || keysym == Keysym::Escape
        || keysym == Keysym::Delete
        || keysym == Keysym::KP_Tab
        || keysym == Keysym::KP_Enter
        || keysym == Keysym::KP_Equal
    {
        return char::from_u32(raw & 0x7f);
    }

    /* Unicode keysym */
    if (XKB_KEYSYM_UNICODE_OFFSET..=XKB_KEYSYM_UNICODE_MAX).contains(&raw) {
        return match raw - XKB_KEYSYM_UNICODE_OFFSET {
            0 => None,
            code => char::from_u32(code),
        };
    }

    if raw > LEGACY_KEYSYM_MAX {
        return None;
    }

    keysym.key_char()
}

pub fn keysym_to_utf8(keysym: Keysym) -> Option<String> {
    keysym_to_utf32(keysym).map(String::from)
}

#[cfg(test)]
mod test {
    use super::*;

    fn test_utf8(keysym: Keysym, expected: &str) -> Option<bool> {
        let got = keysym_to_utf8(keysym)?;

        Some(got == expected)
    }

    #[test]
    fn test_latin1() {
        assert!(test_utf8(Keysym::from(0x0020), "\x20").unwrap());
        assert!(test_utf8(Keysym::from(0x007e), "\x7e").unwrap());
        assert!(test_utf8(Keysym::from(0x00a0), "\u{a0}").unwrap());
        assert!(test_utf8(Keysym::from(0x00ff), "\u{ff}").unwrap());
        assert!(test_utf8(Keysym::y, "y").unwrap());
        assert!(test_utf8(Keysym::exclam, "!").unwrap());
        assert!(test_utf8(Keysym::oslash, "\u{f8}").unwrap());
        assert!(test_utf8(Keysym::hyphen, "\u{ad}").unwrap());

        assert_eq!(keysym_to_utf8(Keysym::from(0x001f)), None);
        assert_eq!(keysym_to_utf8(Keysym::from(0x009f)), None);
    }

    #[test]
    fn test_legacy_keysyms() {
        assert!(test_utf8(Keysym::Cyrillic_em, "\u{43c}").unwrap());
        assert!(test_utf8(Keysym::Cyrillic_u, "\u{443}").unwrap());
        assert!(test_utf8(Keysym::hebrew_aleph, "\u{5d0}").unwrap());
        assert!(test_utf8(Keysym::Arabic_sheen, "\u{634}").unwrap());
        assert!(test_utf8(Keysym::EuroSign, "\u{20ac}").unwrap());
    }

    #[test]
    fn test_special_keysyms() {
        assert!(test_utf8(Keysym::space, " ").unwrap());
        assert!(test_utf8(Keysym::KP_Space, " ").unwrap());
        assert!(test_utf8(Keysym::BackSpace, "\u{8}").unwrap());
        assert!(test_utf8(Keysym::Escape, "\x1b").unwrap());
        assert!(test_utf8(Keysym::KP_Separator, ",").unwrap());
        assert!(test_utf8(Keysym::KP_Decimal, ".").unwrap());
        assert!(test_utf8(Keysym::Tab, "\t").unwrap());
        assert!(test_utf8(Keysym::KP_Tab, "\t").unwrap());
        assert!(test_utf8(Keysym::Linefeed, "\n").unwrap());
        assert!(test_utf8(Keysym::Return, "\r").unwrap());
        assert!(test_utf8(Keysym::KP_Enter, "\r").unwrap());
        assert!(test_utf8(Keysym::KP_Equal, "=").unwrap());
        assert!(test_utf8(Keysym::Delete, "\x7f").unwrap());
        assert!(test_utf8(Keysym::_9, "9").unwrap());
        assert!(test_utf8(Keysym::KP_9, "9").unwrap());
        assert!(test_utf8(Keysym::KP_Multiply, "*").unwrap());
        assert!(test_utf8(Keysym::KP_Subtract, "-").unwrap());

        assert_eq!(keysym_to_utf8(Keysym::F1), None);
        assert_eq!(keysym_to_utf8(Keysym::Shift_L), None);
        assert_eq!(keysym_to_utf8(Keysym::NoSymbol), None);
    }

    #[test]
    fn test_unicode_keysyms() {
        assert!(test_utf8(Keysym::from(XKB_KEYSYM_UNICODE_OFFSET), "").is_none());
        assert!(test_utf8(Keysym::from(0x1000001), "\x01").unwrap());
        assert!(test_utf8(Keysym::from(0x1000020), " ").unwrap());
        assert!(test_utf8(Keysym::from(0x100007f), "\x7f").unwrap());
        assert!(test_utf8(Keysym::from(0x10000a0), "\u{a0}").unwrap());
        assert!(test_utf8(Keysym::from(0x1000100), "\u{100}").unwrap());
        assert!(test_utf8(Keysym::from(0x10005d0), "\u{5d0}").unwrap());
        assert!(test_utf8(Keysym::from(XKB_KEYSYM_UNICODE_MAX), "\u{10ffff}").unwrap());
        assert!(test_utf8(Keysym::from(0x0100d800), "").is_none());
        assert!(test_utf8(Keysym::from(0x0100dfff), "").is_none());
        assert!(test_utf8(Keysym::from(0x1110000), "").is_none());
    }

    #[test]
    fn test_utf32() {
        assert_eq!(keysym_to_utf32(Keysym::a), Some('a'));
        assert_eq!(keysym_to_utf32(Keysym::Cyrillic_ef), Some('\u{444}'));
        assert_eq!(keysym_to_utf32(Keysym::Escape), Some('\u{1b}'));
        assert_eq!(keysym_to_utf32(Keysym::from(0x1008fe01)), None);
    }
}
