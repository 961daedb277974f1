// based on test/keymap.c
/*
 * Copyright © 2016 Intel Corporation
 * Copyright © 2024 wysiwys
 *
 * Permission is hereby granted, free of charge, to any person obtaining a
 * copy of this software and associated documentation files (the "Software"),
 * to deal in the Software without restriction, including without limitation
 * the rights to use, copy, modify, merge, publish, distribute, sublicense,
 * and/or sell copies of the Software, and to permit persons to whom the
 * Software is furnished to do so, subject to the following conditions:
 *
 * The above copyright notice and this permission notice (including the next
 * paragraph) shall be included in all copies or substantial portions of the
 * Software.
 *
 * THE SOFTWARE IS PROVIDED "AS IS", WITHOUT WARRANTY OF ANY KIND, EXPRESS OR
 * IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF MERCHANTABILITY,
 * FITNESS FOR A PARTICULAR PURPOSE AND NONINFRINGEMENT.  IN NO EVENT SHALL
 * THE AUTHORS OR COPYRIGHT HOLDERS BE LIABLE FOR ANY CLAIM, DAMAGES OR OTHER
 * LIABILITY, WHETHER IN AN ACTION OF CONTRACT, TORT OR OTHERWISE, ARISING
 * FROM, OUT OF OR IN CONNECTION WITH THE SOFTWARE OR THE USE OR OTHER
 * DEALINGS IN THE SOFTWARE.
 *
 * Author: Mike Blumenkrantz <zmike@osg.samsung.com>
 */

use crate::log_init;
use crate::rust_xkbcommon::*;
use crate::test::*;

use crate::keymap::KeyGetSymsByLevelError;

use evdev::Key;

#[test]
fn test_keymap() {
    log_init!();

    let keymap = get_keymap_1();

    let kc = keymap.key_by_name("AE06").unwrap();
    assert_eq!(kc.raw(), Key::KEY_6.0 as u32 + EVDEV_OFFSET);
    let keyname = keymap.key_get_name(kc).unwrap();
    assert_eq!(keyname, "AE06");

    let kc = keymap.key_by_name("COMP").unwrap();
    let keyname = keymap.key_get_name(kc).unwrap();
    assert_eq!(keyname, "COMP");

    assert!(keymap.key_by_name("MENU").is_none());
    assert!(keymap.key_get_name(Key::KEY_8.0 as u32 + EVDEV_OFFSET).is_none());

    let kc = keymap.key_by_name("AC01").unwrap();

    // AC01 level 0 ('a') requires no modifiers
    let masks_out = keymap.key_get_mods_for_level(kc, 0, 0).unwrap();
    assert_eq!(masks_out, vec![0]);

    let shift_mask = 1 << keymap.mod_get_index("Shift").unwrap();
    let lock_mask = 1 << keymap.mod_get_index("Lock").unwrap();
    let mod2_mask = 1 << keymap.mod_get_index("Mod2").unwrap();

    // AC01 level 1 ('A') requires either Shift or Lock
    let masks_out = keymap.key_get_mods_for_level(kc, 0, 1).unwrap();
    assert_eq!(masks_out, vec![shift_mask, lock_mask]);

    // The same holds in the second layout
    let masks_out = keymap.key_get_mods_for_level(kc, 1, 1).unwrap();
    assert_eq!(masks_out, vec![shift_mask, lock_mask]);

    // KP1 level 1 ('1') requires either Shift or NumLock,
    // which is bound to Mod2
    let kc = keymap.key_by_name("KP1").unwrap();
    let masks_out = keymap.key_get_mods_for_level(kc, 0, 0).unwrap();
    assert_eq!(masks_out, vec![0]);
    let masks_out = keymap.key_get_mods_for_level(kc, 0, 1).unwrap();
    assert_eq!(masks_out, vec![shift_mask, mod2_mask]);

    // Escape is not affected by modifiers
    let kc = keymap.key_by_name("ESC").unwrap();
    let masks_out = keymap.key_get_mods_for_level(kc, 0, 0).unwrap();
    assert_eq!(masks_out, vec![0]);

    // no such level
    assert!(keymap.key_get_mods_for_level(kc, 0, 1).is_none());
    assert!(keymap
        .key_get_mods_for_level(Key::KEY_8.0 as u32 + EVDEV_OFFSET, 0, 0)
        .is_none());
}

#[test]
fn test_keymap_names() {
    let keymap = get_keymap_1();

    // 8 real modifiers, then the virtual ones in order of definition
    assert_eq!(keymap.num_mods(), 16);
    assert_eq!(keymap.mod_get_name(0), Some("Shift"));
    assert_eq!(keymap.mod_get_name(1), Some("Lock"));
    assert_eq!(keymap.mod_get_name(7), Some("Mod5"));
    assert_eq!(keymap.mod_get_name(8), Some("NumLock"));
    assert_eq!(keymap.mod_get_name(15), Some("LevelFive"));
    assert_eq!(keymap.mod_get_name(16), None);

    assert_eq!(keymap.mod_get_index("Control"), Some(2));
    assert_eq!(keymap.mod_get_index("Alt"), Some(9));
    assert_eq!(keymap.mod_get_index("LevelThree"), Some(13));
    // names are case-sensitive
    assert_eq!(keymap.mod_get_index("shift"), None);
    assert_eq!(keymap.mod_get_index("Unknown"), None);

    assert_eq!(keymap.num_layouts(), 2);
    assert_eq!(keymap.layout_get_name(0), Some("English (US)"));
    assert_eq!(keymap.layout_get_name(1), Some("Russian"));
    assert_eq!(keymap.layout_get_name(2), None);
    assert_eq!(keymap.layout_get_index("Russian"), Some(1));
    assert_eq!(keymap.layout_get_index("German"), None);

    assert_eq!(keymap.num_leds(), 5);
    assert_eq!(keymap.led_get_name(0), Some("Caps Lock"));
    assert_eq!(keymap.led_get_name(4), Some("Group 2"));
    assert_eq!(keymap.led_get_name(5), None);
    assert_eq!(keymap.led_get_index("Num Lock"), Some(1));
    assert_eq!(keymap.led_get_index("Kana"), None);
}

#[test]
fn test_keymap_levels() {
    let keymap = get_keymap_1();

    let a = Key::KEY_A.0 as u32 + EVDEV_OFFSET;
    let q = Key::KEY_Q.0 as u32 + EVDEV_OFFSET;
    let e = Key::KEY_E.0 as u32 + EVDEV_OFFSET;
    let f1 = Key::KEY_F1.0 as u32 + EVDEV_OFFSET;

    assert_eq!(keymap.num_layouts_for_key(a), 2);
    assert_eq!(keymap.num_layouts_for_key(q), 1);
    assert_eq!(keymap.num_layouts_for_key(Key::KEY_8.0 as u32 + EVDEV_OFFSET), 0);

    assert_eq!(keymap.num_levels_for_key(a, 0), 2);
    assert_eq!(keymap.num_levels_for_key(e, 0), 4);
    assert_eq!(keymap.num_levels_for_key(f1, 0), 5);
    // the layout wraps around for keys with fewer groups
    assert_eq!(keymap.num_levels_for_key(q, 1), 2);
    assert_eq!(keymap.num_levels_for_key(0u32, 0), 0);

    let syms = keymap.key_get_syms_by_level(a, 1, 0).unwrap();
    assert_eq!(syms, vec![Keysym::Cyrillic_ef]);
    let syms = keymap.key_get_syms_by_level(q, 1, 1).unwrap();
    assert_eq!(syms, vec![Keysym::Q]);
    let syms = keymap.key_get_syms_by_level(e, 0, 3).unwrap();
    assert_eq!(syms, vec![Keysym::EuroSign]);
    let syms = keymap
        .key_get_syms_by_level(Key::KEY_6.0 as u32 + EVDEV_OFFSET, 0, 0)
        .unwrap();
    assert_eq!(syms.len(), 5);

    assert_eq!(
        keymap.key_get_syms_by_level(a, 0, 2),
        Err(KeyGetSymsByLevelError::InvalidLevelIndex(2))
    );
    assert_eq!(
        keymap.key_get_syms_by_level(0u32, 0, 0),
        Err(KeyGetSymsByLevelError::NoKeyForKeycode(Keycode::new(0)))
    );

    // CTRL+ALT: Control and Alt together select the fifth level
    let ctrl = 1 << keymap.mod_get_index("Control").unwrap();
    let mod1 = 1 << keymap.mod_get_index("Mod1").unwrap();
    let masks_out = keymap.key_get_mods_for_level(f1, 0, 4).unwrap();
    assert_eq!(masks_out, vec![ctrl | mod1]);
}

#[test]
fn test_keymap_range() {
    let keymap = get_keymap_1();

    assert_eq!(keymap.min_keycode().raw(), Key::KEY_ESC.0 as u32 + EVDEV_OFFSET);
    assert_eq!(
        keymap.max_keycode().raw(),
        Key::KEY_COMPOSE.0 as u32 + EVDEV_OFFSET
    );

    let names = keymap
        .iter_keycodes()
        .filter_map(|kc| keymap.key_get_name(kc))
        .collect::<Vec<_>>();
    assert_eq!(names.len(), keymap.iter_keycodes().count());
    assert_eq!(names.first(), Some(&"ESC"));
    assert_eq!(names.last(), Some(&"COMP"));
}
