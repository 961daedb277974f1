use crate::rust_xkbcommon::*;

mod constants {
    pub const XKB_KEYSYM_UNICODE_OFFSET: u32 = 0x01000000;
    pub const XKB_KEYSYM_UNICODE_MAX: u32 = 0x0110ffff;
}

pub use constants::*;

struct ConvertCase {
    upper: u32,
    lower: u32,
}

// Only mappings to a single code point are used.
fn single_char(mut chars: impl Iterator<Item = char>) -> Option<u32> {
    let c = chars.next()?;

    match chars.next() {
        None => Some(c.into()),
        Some(_) => None,
    }
}

fn ucs_convert_case(code: u32) -> ConvertCase {
    let Some(c) = char::from_u32(code) else {
        return ConvertCase {
            upper: code,
            lower: code,
        };
    };

    ConvertCase {
        upper: single_char(c.to_uppercase()).unwrap_or(code),
        lower: single_char(c.to_lowercase()).unwrap_or(code),
    }
}

fn x_convert_case(sym: Keysym) -> ConvertCase {
    let sym_raw: u32 = sym.raw();
    // Latin 1 keysym (first part: fast path)
    if sym_raw < 0xb5 {
        return ucs_convert_case(sym_raw);
    }

    /* Unicode keysym */
    if (sym_raw & 0xff000000) == XKB_KEYSYM_UNICODE_OFFSET {
        let mut convert = ucs_convert_case(sym_raw & 0x00ffffff);
        convert.upper |= XKB_KEYSYM_UNICODE_OFFSET;
        convert.lower |= XKB_KEYSYM_UNICODE_OFFSET;
        return convert;
    }

    /* Legacy keysym */

    let mut lower = sym_raw;
    let mut upper = sym_raw;

    match sym_raw >> 8 {
        0 => {
            // Latin 1 (second part)
            if sym == Keysym::mu {
                upper = Keysym::Greek_MU.raw();
            } else if sym == Keysym::ydiaeresis {
                upper = Keysym::Ydiaeresis.raw();
            } else {
                let case = ucs_convert_case(sym_raw);
                // stay inside Latin 1
                if case.lower <= 0xff {
                    lower = case.lower;
                }
                if case.upper <= 0xff {
                    upper = case.upper;
                }
            }
        }
        1 => {
            /* Latin 2 */
            /* Assume the KeySym is a legal value (ignore discontinuities) */
            if sym == Keysym::Aogonek {
                lower = Keysym::aogonek.raw();
            } else if sym >= Keysym::Lstroke && sym <= Keysym::Sacute {
                lower += Keysym::lstroke.raw() - Keysym::Lstroke.raw();
            } else if sym >= Keysym::Scaron && sym <= Keysym::Zacute {
                lower += Keysym::scaron.raw() - Keysym::Scaron.raw();
            } else if sym >= Keysym::Zcaron && sym <= Keysym::Zabovedot {
                lower += Keysym::zcaron.raw() - Keysym::Zcaron.raw();
            } else if sym == Keysym::aogonek {
                upper = Keysym::Aogonek.raw();
            } else if sym >= Keysym::lstroke && sym <= Keysym::sacute {
                upper -= Keysym::lstroke.raw() - Keysym::Lstroke.raw();
            } else if sym >= Keysym::scaron && sym <= Keysym::zacute {
                upper -= Keysym::scaron.raw() - Keysym::Scaron.raw();
            } else if sym >= Keysym::zcaron && sym <= Keysym::zabovedot {
                upper -= Keysym::zcaron.raw() - Keysym::Zcaron.raw();
            } else if sym >= Keysym::Racute && sym <= Keysym::Tcedilla {
                lower += Keysym::racute.raw() - Keysym::Racute.raw();
            } else if sym >= Keysym::racute && sym <= Keysym::tcedilla {
                upper -= Keysym::racute.raw() - Keysym::Racute.raw();
            }
        }
        2 => {
            /* Latin 3 */
            /* Assume the KeySym is a legal value (ignore discontinuities) */
            if sym >= Keysym::Hstroke && sym <= Keysym::Hcircumflex {
                lower += Keysym::hstroke.raw() - Keysym::Hstroke.raw();
            } else if sym >= Keysym::Gbreve && sym <= Keysym::Jcircumflex {
                lower += Keysym::gbreve.raw() - Keysym::Gbreve.raw();
            } else if sym >= Keysym::hstroke && sym <= Keysym::hcircumflex {
                upper -= Keysym::hstroke.raw() - Keysym::Hstroke.raw();
            } else if sym >= Keysym::gbreve && sym <= Keysym::jcircumflex {
                upper -= Keysym::gbreve.raw() - Keysym::Gbreve.raw();
            } else if sym >= Keysym::Cabovedot && sym <= Keysym::Scircumflex {
                lower += Keysym::cabovedot.raw() - Keysym::Cabovedot.raw();
            } else if sym >= Keysym::cabovedot && sym <= Keysym::scircumflex {
                upper -= Keysym::cabovedot.raw() - Keysym::Cabovedot.raw();
            }
        }
        3 => {
            /* Latin 4 */
            /* Assume the KeySym is a legal value (ignore discontinuities) */
            if sym >= Keysym::Rcedilla && sym <= Keysym::Tslash {
                lower += Keysym::rcedilla.raw() - Keysym::Rcedilla.raw();
            } else if sym >= Keysym::rcedilla && sym <= Keysym::tslash {
                upper -= Keysym::rcedilla.raw() - Keysym::Rcedilla.raw();
            } else if sym == Keysym::ENG {
                lower = Keysym::eng.raw();
            } else if sym == Keysym::eng {
                upper = Keysym::ENG.raw();
            } else if sym >= Keysym::Amacron && sym <= Keysym::Umacron {
                lower += Keysym::amacron.raw() - Keysym::Amacron.raw();
            } else if sym >= Keysym::amacron && sym <= Keysym::umacron {
                upper -= Keysym::amacron.raw() - Keysym::Amacron.raw();
            }
        }
        6 => {
            /* Cyrillic */
            /* Assume the KeySym is a legal value (ignore discontinuities) */
            if sym >= Keysym::Serbian_DJE && sym <= Keysym::Cyrillic_DZHE {
                lower -= Keysym::Serbian_DJE.raw() - Keysym::Serbian_dje.raw();
            } else if sym >= Keysym::Serbian_dje && sym <= Keysym::Cyrillic_dzhe {
                upper += Keysym::Serbian_DJE.raw() - Keysym::Serbian_dje.raw();
            } else if sym >= Keysym::Cyrillic_YU && sym <= Keysym::Cyrillic_HARDSIGN {
                lower -= Keysym::Cyrillic_YU.raw() - Keysym::Cyrillic_yu.raw();
            } else if sym >= Keysym::Cyrillic_yu && sym <= Keysym::Cyrillic_hardsign {
                upper += Keysym::Cyrillic_YU.raw() - Keysym::Cyrillic_yu.raw();
            }
        }
        7 => {
            /* Greek */
            /* Assume the KeySym is a legal value (ignore discontinuities) */
            if sym >= Keysym::Greek_ALPHAaccent && sym <= Keysym::Greek_OMEGAaccent {
                lower += Keysym::Greek_alphaaccent.raw() - Keysym::Greek_ALPHAaccent.raw();
            } else if sym >= Keysym::Greek_alphaaccent
                && sym <= Keysym::Greek_omegaaccent
                && sym != Keysym::Greek_iotaaccentdieresis
                && sym != Keysym::Greek_upsilonaccentdieresis
            {
                upper -= Keysym::Greek_alphaaccent.raw() - Keysym::Greek_ALPHAaccent.raw();
            } else if sym >= Keysym::Greek_ALPHA && sym <= Keysym::Greek_OMEGA {
                lower += Keysym::Greek_alpha.raw() - Keysym::Greek_ALPHA.raw();
            } else if sym >= Keysym::Greek_alpha
                && sym <= Keysym::Greek_omega
                && sym != Keysym::Greek_finalsmallsigma
            {
                upper -= Keysym::Greek_alpha.raw() - Keysym::Greek_ALPHA.raw();
            }
        }
        0x13 => {
            /* Latin 9 */
            if sym == Keysym::OE {
                lower = Keysym::oe.raw();
            } else if sym == Keysym::oe {
                upper = Keysym::OE.raw();
            } else if sym == Keysym::Ydiaeresis {
                lower = Keysym::ydiaeresis.raw();
            }
        }
        _ => {}
    }

    ConvertCase { lower, upper }
}

/// Whether the keysym is a lower case letter with an upper case counterpart.
pub fn keysym_is_lower(ks: Keysym) -> bool {
    let convert = x_convert_case(ks);

    if convert.lower == convert.upper {
        return false;
    }

    ks.raw() == convert.lower
}

/// Whether the keysym is an upper case letter with a lower case counterpart.
pub fn keysym_is_upper(ks: Keysym) -> bool {
    let convert = x_convert_case(ks);

    if convert.lower == convert.upper {
        return false;
    }

    ks.raw() == convert.upper
}

/// Converts the keysym to lower case, if it has a single-keysym lower case form.
pub fn keysym_to_lower(ks: Keysym) -> Keysym {
    let convert = x_convert_case(ks);

    Keysym::from(convert.lower)
}

/// Converts the keysym to upper case, if it has a single-keysym upper case form.
pub fn keysym_to_upper(ks: Keysym) -> Keysym {
    let convert = x_convert_case(ks);

    Keysym::from(convert.upper)
}
