use crate::rust_xkbcommon::*;

use crate::keymap::*;
use crate::state::State;

use crate::errors::*;

use evdev::Key;

pub(crate) const EVDEV_OFFSET: u32 = 8;

pub(crate) const SHIFT_MASK: ModMask = 1 << 0;
pub(crate) const LOCK_MASK: ModMask = 1 << 1;
pub(crate) const CONTROL_MASK: ModMask = 1 << 2;
pub(crate) const MOD_1_MASK: ModMask = 1 << 3;
pub(crate) const MOD_2_MASK: ModMask = 1 << 4;
pub(crate) const MOD_3_MASK: ModMask = 1 << 5;
pub(crate) const MOD_4_MASK: ModMask = 1 << 6;
pub(crate) const MOD_5_MASK: ModMask = 1 << 7;
pub(crate) const NO_MODIFIER: ModMask = 0;

pub(crate) const XF86_SWITCH_VT_1: Keysym = Keysym::new(0x1008fe01);

pub(crate) fn kc(key: Key) -> RawKeycode {
    u32::from(key.0) + EVDEV_OFFSET
}

/// Which virtual modifiers of the test keymap share real modifiers.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) enum Overlap {
    None,
    /// Super and Hyper are both bound to Mod3+Mod4.
    SuperHyper,
    /// Meta is bound to Mod1+Mod3.
    Meta,
    Both,
}

/// A pc105-like keymap with an "us" and a "ru" layout.
pub(crate) fn build_keymap(overlap: Overlap) -> Result<Keymap, KeymapBuildError> {
    let (super_hyper, meta) = match overlap {
        Overlap::None => (MOD_4_MASK, MOD_1_MASK),
        Overlap::SuperHyper => (MOD_3_MASK | MOD_4_MASK, MOD_1_MASK),
        Overlap::Meta => (MOD_4_MASK, MOD_1_MASK | MOD_3_MASK),
        Overlap::Both => (MOD_3_MASK | MOD_4_MASK, MOD_1_MASK | MOD_3_MASK),
    };

    let mut builder = KeymapBuilder::new();
    builder.add_layout("English (US)")?;
    builder.add_layout("Russian")?;

    builder.add_virtual_mod("NumLock", MOD_2_MASK)?;
    builder.add_virtual_mod("Alt", MOD_1_MASK)?;
    builder.add_virtual_mod("Meta", meta)?;
    builder.add_virtual_mod("Super", super_hyper)?;
    builder.add_virtual_mod("Hyper", super_hyper)?;
    builder.add_virtual_mod("LevelThree", MOD_5_MASK)?;
    builder.add_virtual_mod("ScrollLock", 0)?;
    builder.add_virtual_mod("LevelFive", 0)?;

    let num_lock = builder.mod_mask(&["NumLock"])?;
    let alt = builder.mod_mask(&["Alt"])?;
    let level_three = builder.mod_mask(&["LevelThree"])?;
    let scroll_lock = builder.mod_mask(&["ScrollLock"])?;

    let one_level = builder.add_type(KeyTypeBuilder::new("ONE_LEVEL", 0, 1))?;
    let two_level = builder.add_type(
        KeyTypeBuilder::new("TWO_LEVEL", SHIFT_MASK, 2).map(SHIFT_MASK, 1),
    )?;
    let alphabetic = builder.add_type(
        KeyTypeBuilder::new("ALPHABETIC", SHIFT_MASK | LOCK_MASK, 2)
            .map(SHIFT_MASK, 1)
            .map(LOCK_MASK, 1),
    )?;
    let keypad = builder.add_type(
        KeyTypeBuilder::new("KEYPAD", SHIFT_MASK | num_lock, 2)
            .map(SHIFT_MASK, 1)
            .map(num_lock, 1),
    )?;
    let four_level_alphabetic = builder.add_type(
        KeyTypeBuilder::new(
            "FOUR_LEVEL_ALPHABETIC",
            SHIFT_MASK | LOCK_MASK | level_three,
            4,
        )
        .map(SHIFT_MASK, 1)
        .map(LOCK_MASK, 1)
        .map(level_three, 2)
        .map(SHIFT_MASK | level_three, 3)
        .map(LOCK_MASK | level_three, 3),
    )?;
    let ctrl_alt = builder.add_type(
        KeyTypeBuilder::new(
            "CTRL+ALT",
            SHIFT_MASK | level_three | CONTROL_MASK | alt,
            5,
        )
        .map_preserve(SHIFT_MASK, 1, SHIFT_MASK)
        .map(level_three, 2)
        .map_preserve(SHIFT_MASK | level_three, 3, SHIFT_MASK)
        .map(CONTROL_MASK | alt, 4),
    )?;
    let pc_super_level2 = builder.add_type(
        KeyTypeBuilder::new("PC_SUPER_LEVEL2", MOD_4_MASK, 2).map(MOD_4_MASK, 1),
    )?;

    // modifier keys
    let modifier_keys = [
        (Key::KEY_LEFTCTRL, "LCTL", Keysym::Control_L, CONTROL_MASK),
        (Key::KEY_RIGHTCTRL, "RCTL", Keysym::Control_R, CONTROL_MASK),
        (Key::KEY_LEFTSHIFT, "LFSH", Keysym::Shift_L, SHIFT_MASK),
        (Key::KEY_RIGHTSHIFT, "RTSH", Keysym::Shift_R, SHIFT_MASK),
        (Key::KEY_LEFTALT, "LALT", Keysym::Alt_L, MOD_1_MASK),
        (Key::KEY_RIGHTALT, "RALT", Keysym::Alt_R, MOD_1_MASK),
    ];
    for (key, name, sym, modmap) in modifier_keys {
        builder.add_key(
            KeyBuilder::new(kc(key), name)
                .syms(one_level, &[sym])
                .modmap(modmap)
                .repeats(false),
        )?;
    }

    builder.add_key(
        KeyBuilder::new(kc(Key::KEY_CAPSLOCK), "CAPS")
            .syms(one_level, &[Keysym::Caps_Lock])
            .action(0, 0, KeyAction::lock_mods(LOCK_MASK))
            .repeats(false),
    )?;
    builder.add_key(
        KeyBuilder::new(kc(Key::KEY_NUMLOCK), "NMLK")
            .syms(one_level, &[Keysym::Num_Lock])
            .action(0, 0, KeyAction::lock_mods(num_lock))
            .repeats(false),
    )?;
    builder.add_key(
        KeyBuilder::new(kc(Key::KEY_COMPOSE), "COMP")
            .syms(one_level, &[Keysym::ISO_Next_Group])
            .action(0, 0, KeyAction::lock_group(1)),
    )?;
    builder.add_key(
        KeyBuilder::new(kc(Key::KEY_LEFTMETA), "LWIN")
            .syms(one_level, &[Keysym::ISO_Group_Latch])
            .action(0, 0, KeyAction::latch_group(1)),
    )?;
    builder.add_key(
        KeyBuilder::new(kc(Key::KEY_RIGHTMETA), "RWIN")
            .syms(one_level, &[Keysym::ISO_Group_Latch])
            .action(
                0,
                0,
                KeyAction::latch_group(1)
                    .with_flags(ActionFlags::LATCH_TO_LOCK | ActionFlags::LOCK_CLEAR),
            ),
    )?;
    builder.add_key(
        KeyBuilder::new(kc(Key::KEY_102ND), "LSGT")
            .syms(one_level, &[Keysym::ISO_Level3_Latch])
            .action(0, 0, KeyAction::latch_mods(level_three)),
    )?;

    // symbol keys
    builder.add_key(
        KeyBuilder::new(kc(Key::KEY_A), "AC01")
            .syms(alphabetic, &[Keysym::a, Keysym::A])
            .syms(alphabetic, &[Keysym::Cyrillic_ef, Keysym::Cyrillic_EF]),
    )?;
    builder.add_key(
        KeyBuilder::new(kc(Key::KEY_Z), "AB01")
            .syms(alphabetic, &[Keysym::z, Keysym::Z])
            .syms(alphabetic, &[Keysym::Cyrillic_ya, Keysym::Cyrillic_YA]),
    )?;
    for (key, name, lower, upper) in [
        (Key::KEY_Q, "AD01", Keysym::q, Keysym::Q),
        (Key::KEY_B, "AB05", Keysym::b, Keysym::B),
        (Key::KEY_C, "AB03", Keysym::c, Keysym::C),
    ] {
        builder.add_key(KeyBuilder::new(kc(key), name).syms(alphabetic, &[lower, upper]))?;
    }
    builder.add_key(KeyBuilder::new(kc(Key::KEY_E), "AD03").syms(
        four_level_alphabetic,
        &[Keysym::e, Keysym::E, Keysym::EuroSign, Keysym::EuroSign],
    ))?;
    for (key, name, lower, upper) in [
        (Key::KEY_1, "AE01", Keysym::_1, Keysym::exclam),
        (Key::KEY_5, "AE05", Keysym::_5, Keysym::percent),
        (Key::KEY_7, "AE07", Keysym::_7, Keysym::ampersand),
        (Key::KEY_EQUAL, "AE12", Keysym::equal, Keysym::plus),
        (Key::KEY_SEMICOLON, "AC10", Keysym::eacute, Keysym::odiaeresis),
    ] {
        builder.add_key(KeyBuilder::new(kc(key), name).syms(two_level, &[lower, upper]))?;
    }
    builder.add_key(KeyBuilder::new(kc(Key::KEY_6), "AE06").group(
        one_level,
        vec![vec![Keysym::H, Keysym::E, Keysym::L, Keysym::L, Keysym::O]],
    ))?;
    builder.add_key(
        KeyBuilder::new(kc(Key::KEY_ESC), "ESC").syms(one_level, &[Keysym::Escape]),
    )?;
    builder.add_key(
        KeyBuilder::new(kc(Key::KEY_KP1), "KP1").syms(keypad, &[Keysym::KP_End, Keysym::KP_1]),
    )?;
    builder.add_key(KeyBuilder::new(kc(Key::KEY_F1), "FK01").syms(
        ctrl_alt,
        &[
            Keysym::F1,
            Keysym::F1,
            Keysym::F1,
            Keysym::F1,
            XF86_SWITCH_VT_1,
        ],
    ))?;
    builder.add_key(
        KeyBuilder::new(kc(Key::KEY_SPACE), "SPCE")
            .syms(pc_super_level2, &[Keysym::space, Keysym::nobreakspace]),
    )?;

    builder.add_led(LedBuilder::new("Caps Lock").mods(LOCK_MASK, StateComponent::MODS_LOCKED))?;
    builder.add_led(LedBuilder::new("Num Lock").mods(num_lock, StateComponent::MODS_LOCKED))?;
    builder
        .add_led(LedBuilder::new("Scroll Lock").mods(scroll_lock, StateComponent::MODS_LOCKED))?;
    builder.add_led(LedBuilder::new("Shift Lock").mods(SHIFT_MASK, StateComponent::MODS_LOCKED))?;
    builder.add_led(
        LedBuilder::new("Group 2").groups(0b1110, StateComponent::LAYOUT_EFFECTIVE),
    )?;

    builder.build()
}

pub(crate) fn get_keymap_1() -> Keymap {
    build_keymap(Overlap::None).unwrap()
}

#[derive(Debug, PartialEq)]
pub(crate) enum KeySeqState {
    Down,
    Repeat,
    Up,
    Both,
}

pub(crate) fn test_key_seq(
    keymap: &Keymap,
    interactions: Vec<(Key, KeySeqState, Keysym)>,
) -> Result<(), TestErr> {
    let mut state = State::new(keymap.clone());
    eprintln!("----");

    for (evdev_key, op, provided_keysym) in interactions {
        let kc = Keycode::new(kc(evdev_key));
        let mut syms = state.key_get_syms(kc);
        if syms.len() == 1 {
            // with uppercase transform
            if let Some(sym) = state.key_get_one_sym(kc) {
                syms = vec![sym];
            }
        }

        use KeySeqState::*;
        if [Down, Both].contains(&op) {
            state.update_key(kc, KeyDirection::Down);
        }
        if [Up, Both].contains(&op) {
            state.update_key(kc, KeyDirection::Up);
        }

        eprintln!(
            "op {:?} got {} syms for keycode {}: {:?}",
            op,
            syms.len(),
            kc.raw(),
            syms
        );

        match syms.first() {
            Some(sym) if *sym != provided_keysym => {
                return Err(TestErr::WrongKeysym {
                    expected: provided_keysym,
                    got: *sym,
                });
            }
            Some(_) => {}
            None if provided_keysym != xkeysym::NO_SYMBOL => {
                return Err(TestErr::NoSymsForKeycode(kc));
            }
            None => {}
        }
    }

    Ok(())
}

/// Sends one key event and checks the reported changes.
pub(crate) fn test_update_key(
    state: &mut State,
    key: Key,
    direction: KeyDirection,
    expected: StateComponent,
) -> Result<(), TestErr> {
    let keycode = Keycode::new(kc(key));
    let got = state.update_key(keycode, direction);

    if got != expected {
        return Err(TestErr::WrongChanges {
            keycode,
            expected,
            got,
        });
    }

    Ok(())
}
