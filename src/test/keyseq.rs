use crate::log_init;
use crate::test::*;

use xkeysym::Keysym;

use evdev::Key;

#[test]
fn keyseq_shift() {
    log_init!();

    use KeySeqState::*;
    let keymap = get_keymap_1();

    test_key_seq(
        &keymap,
        vec![
            (Key::KEY_Z, Both, Keysym::z),
            (Key::KEY_LEFTSHIFT, Down, Keysym::Shift_L),
            (Key::KEY_Z, Both, Keysym::Z),
            (Key::KEY_7, Both, Keysym::ampersand),
            (Key::KEY_EQUAL, Both, Keysym::plus),
            (Key::KEY_LEFTSHIFT, Up, Keysym::Shift_L),
            (Key::KEY_EQUAL, Both, Keysym::equal),
            (Key::KEY_ESC, Both, Keysym::Escape),
        ],
    )
    .unwrap();

    // Shift pressed and released while a key repeats
    test_key_seq(
        &keymap,
        vec![
            (Key::KEY_Z, Down, Keysym::z),
            (Key::KEY_Z, Repeat, Keysym::z),
            (Key::KEY_RIGHTSHIFT, Down, Keysym::Shift_R),
            (Key::KEY_Z, Repeat, Keysym::Z),
            (Key::KEY_RIGHTSHIFT, Up, Keysym::Shift_R),
            (Key::KEY_Z, Repeat, Keysym::z),
            (Key::KEY_Z, Up, Keysym::z),
        ],
    )
    .unwrap();

    // Releasing RTSH does not clear the Shift held by LFSH
    test_key_seq(
        &keymap,
        vec![
            (Key::KEY_LEFTSHIFT, Down, Keysym::Shift_L),
            (Key::KEY_RIGHTSHIFT, Up, Keysym::Shift_R),
            (Key::KEY_7, Both, Keysym::ampersand),
            (Key::KEY_RIGHTSHIFT, Down, Keysym::Shift_R),
            (Key::KEY_LEFTSHIFT, Up, Keysym::Shift_L),
            (Key::KEY_7, Both, Keysym::ampersand),
            (Key::KEY_RIGHTSHIFT, Up, Keysym::Shift_R),
            (Key::KEY_7, Both, Keysym::_7),
        ],
    )
    .unwrap();

    // A key pressed twice is held until it is released twice
    test_key_seq(
        &keymap,
        vec![
            (Key::KEY_LEFTSHIFT, Down, Keysym::Shift_L),
            (Key::KEY_LEFTSHIFT, Down, Keysym::Shift_L),
            (Key::KEY_LEFTSHIFT, Up, Keysym::Shift_L),
            (Key::KEY_Z, Both, Keysym::Z),
            (Key::KEY_LEFTSHIFT, Up, Keysym::Shift_L),
            (Key::KEY_Z, Both, Keysym::z),
        ],
    )
    .unwrap();
}

#[test]
fn keyseq_locks() {
    log_init!();

    use KeySeqState::*;
    let keymap = get_keymap_1();

    // Caps Lock only affects keys whose type uses Lock; the other ones
    // are capitalized
    test_key_seq(
        &keymap,
        vec![
            (Key::KEY_CAPSLOCK, Both, Keysym::Caps_Lock),
            (Key::KEY_Z, Both, Keysym::Z),
            (Key::KEY_E, Both, Keysym::E),
            (Key::KEY_7, Both, Keysym::_7),
            (Key::KEY_SEMICOLON, Both, Keysym::Eacute),
            (Key::KEY_LEFTSHIFT, Down, Keysym::Shift_L),
            (Key::KEY_Z, Both, Keysym::z),
            (Key::KEY_SEMICOLON, Both, Keysym::Odiaeresis),
            (Key::KEY_7, Both, Keysym::ampersand),
            (Key::KEY_LEFTSHIFT, Up, Keysym::Shift_L),
            (Key::KEY_CAPSLOCK, Both, Keysym::Caps_Lock),
            (Key::KEY_SEMICOLON, Both, Keysym::eacute),
            (Key::KEY_Z, Both, Keysym::z),
        ],
    )
    .unwrap();

    // The lock is taken on the first press and kept over a repeated press
    test_key_seq(
        &keymap,
        vec![
            (Key::KEY_CAPSLOCK, Down, Keysym::Caps_Lock),
            (Key::KEY_E, Both, Keysym::E),
            (Key::KEY_CAPSLOCK, Down, Keysym::Caps_Lock),
            (Key::KEY_CAPSLOCK, Up, Keysym::Caps_Lock),
            (Key::KEY_E, Both, Keysym::E),
            (Key::KEY_CAPSLOCK, Up, Keysym::Caps_Lock),
            (Key::KEY_E, Both, Keysym::E),
            (Key::KEY_CAPSLOCK, Both, Keysym::Caps_Lock),
            (Key::KEY_E, Both, Keysym::e),
        ],
    )
    .unwrap();

    // Num Lock selects the digits; Shift inverts it
    test_key_seq(
        &keymap,
        vec![
            (Key::KEY_KP1, Both, Keysym::KP_End),
            (Key::KEY_LEFTSHIFT, Down, Keysym::Shift_L),
            (Key::KEY_KP1, Both, Keysym::KP_1),
            (Key::KEY_LEFTSHIFT, Up, Keysym::Shift_L),
            (Key::KEY_NUMLOCK, Both, Keysym::Num_Lock),
            (Key::KEY_KP1, Both, Keysym::KP_1),
            (Key::KEY_LEFTSHIFT, Down, Keysym::Shift_L),
            (Key::KEY_KP1, Both, Keysym::KP_End),
            (Key::KEY_LEFTSHIFT, Up, Keysym::Shift_L),
            (Key::KEY_NUMLOCK, Both, Keysym::Num_Lock),
            (Key::KEY_KP1, Both, Keysym::KP_End),
        ],
    )
    .unwrap();
}

#[test]
fn keyseq_groups() {
    log_init!();

    use KeySeqState::*;
    let keymap = get_keymap_1();

    test_key_seq(
        &keymap,
        vec![
            (Key::KEY_A, Both, Keysym::a),
            (Key::KEY_COMPOSE, Both, Keysym::ISO_Next_Group),
            (Key::KEY_A, Both, Keysym::Cyrillic_ef),
            (Key::KEY_Z, Both, Keysym::Cyrillic_ya),
            // single group keys wrap back to their only group
            (Key::KEY_Q, Both, Keysym::q),
            (Key::KEY_102ND, Both, Keysym::ISO_Level3_Latch),
            (Key::KEY_E, Both, Keysym::EuroSign),
            (Key::KEY_CAPSLOCK, Both, Keysym::Caps_Lock),
            (Key::KEY_A, Both, Keysym::Cyrillic_EF),
            (Key::KEY_CAPSLOCK, Both, Keysym::Caps_Lock),
            // the locked group wraps
            (Key::KEY_COMPOSE, Both, Keysym::ISO_Next_Group),
            (Key::KEY_A, Both, Keysym::a),
            (Key::KEY_COMPOSE, Down, Keysym::ISO_Next_Group),
            (Key::KEY_Z, Both, Keysym::Cyrillic_ya),
            (Key::KEY_COMPOSE, Up, Keysym::ISO_Next_Group),
            (Key::KEY_Z, Both, Keysym::Cyrillic_ya),
        ],
    )
    .unwrap();
}

#[test]
fn keyseq_levels() {
    log_init!();

    use KeySeqState::*;
    let keymap = get_keymap_1();

    // Control + Alt reaches the fifth level of FK01
    test_key_seq(
        &keymap,
        vec![
            (Key::KEY_F1, Both, Keysym::F1),
            (Key::KEY_RIGHTCTRL, Down, Keysym::Control_R),
            (Key::KEY_F1, Both, Keysym::F1),
            (Key::KEY_LEFTALT, Down, Keysym::Alt_L),
            (Key::KEY_F1, Both, XF86_SWITCH_VT_1),
            (Key::KEY_LEFTSHIFT, Down, Keysym::Shift_L),
            (Key::KEY_F1, Both, Keysym::F1),
            (Key::KEY_LEFTSHIFT, Up, Keysym::Shift_L),
            (Key::KEY_RIGHTCTRL, Up, Keysym::Control_R),
            (Key::KEY_F1, Both, Keysym::F1),
            (Key::KEY_LEFTALT, Up, Keysym::Alt_L),
        ],
    )
    .unwrap();

    // Shift and a latched LevelThree together select the fourth level
    test_key_seq(
        &keymap,
        vec![
            (Key::KEY_LEFTSHIFT, Down, Keysym::Shift_L),
            (Key::KEY_102ND, Both, Keysym::ISO_Level3_Latch),
            (Key::KEY_E, Both, Keysym::EuroSign),
            (Key::KEY_E, Both, Keysym::E),
            (Key::KEY_LEFTSHIFT, Up, Keysym::Shift_L),
            (Key::KEY_E, Both, Keysym::e),
        ],
    )
    .unwrap();

    // AE06 produces several keysyms; unknown keys produce none
    test_key_seq(
        &keymap,
        vec![
            (Key::KEY_6, Both, Keysym::H),
            (Key::KEY_5, Both, Keysym::_5),
            (Key::KEY_8, Both, xkeysym::NO_SYMBOL),
            (Key::KEY_5, Both, Keysym::_5),
        ],
    )
    .unwrap();
}

#[test]
fn keyseq_latches() {
    log_init!();

    use KeySeqState::*;
    let keymap = get_keymap_1();

    // LSGT latches LevelThree for the next key only, even one which
    // does not use it
    test_key_seq(
        &keymap,
        vec![
            (Key::KEY_102ND, Both, Keysym::ISO_Level3_Latch),
            (Key::KEY_E, Both, Keysym::EuroSign),
            (Key::KEY_E, Both, Keysym::e),
            (Key::KEY_102ND, Both, Keysym::ISO_Level3_Latch),
            (Key::KEY_1, Both, Keysym::_1),
            (Key::KEY_E, Both, Keysym::e),
        ],
    )
    .unwrap();

    // Modifier keys do not break the latch
    test_key_seq(
        &keymap,
        vec![
            (Key::KEY_102ND, Both, Keysym::ISO_Level3_Latch),
            (Key::KEY_LEFTCTRL, Both, Keysym::Control_L),
            (Key::KEY_E, Both, Keysym::EuroSign),
            (Key::KEY_E, Both, Keysym::e),
        ],
    )
    .unwrap();

    // Keys pressed while LSGT is held see LevelThree, and no latch is left
    test_key_seq(
        &keymap,
        vec![
            (Key::KEY_102ND, Down, Keysym::ISO_Level3_Latch),
            (Key::KEY_E, Both, Keysym::EuroSign),
            (Key::KEY_E, Both, Keysym::EuroSign),
            (Key::KEY_102ND, Up, Keysym::ISO_Level3_Latch),
            (Key::KEY_E, Both, Keysym::e),
        ],
    )
    .unwrap();

    // LWIN latches the Russian layout
    test_key_seq(
        &keymap,
        vec![
            (Key::KEY_LEFTMETA, Both, Keysym::ISO_Group_Latch),
            (Key::KEY_A, Both, Keysym::Cyrillic_ef),
            (Key::KEY_A, Both, Keysym::a),
            (Key::KEY_LEFTMETA, Down, Keysym::ISO_Group_Latch),
            (Key::KEY_Z, Both, Keysym::Cyrillic_ya),
            (Key::KEY_LEFTMETA, Up, Keysym::ISO_Group_Latch),
            (Key::KEY_Z, Both, Keysym::z),
        ],
    )
    .unwrap();

    // RWIN latched twice locks the layout; the next latch clears the lock
    test_key_seq(
        &keymap,
        vec![
            (Key::KEY_RIGHTMETA, Both, Keysym::ISO_Group_Latch),
            (Key::KEY_RIGHTMETA, Both, Keysym::ISO_Group_Latch),
            (Key::KEY_A, Both, Keysym::Cyrillic_ef),
            (Key::KEY_Z, Both, Keysym::Cyrillic_ya),
            (Key::KEY_RIGHTMETA, Both, Keysym::ISO_Group_Latch),
            (Key::KEY_A, Both, Keysym::a),
            (Key::KEY_Z, Both, Keysym::z),
        ],
    )
    .unwrap();
}
