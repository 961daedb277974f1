/*
 * Copyright © 2012 Intel Corporation
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
 * Author: Daniel Stone <daniel@fooishbar.org>
 */

//! Names of the modifiers and LEDs found in most keymaps.

use std::borrow::Borrow;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ModName(pub &'static str);

impl AsRef<str> for ModName {
    fn as_ref(&self) -> &str {
        self.0
    }
}

impl Borrow<str> for ModName {
    fn borrow(&self) -> &str {
        self.0
    }
}

/// Names of the real modifiers.
impl ModName {
    pub const SHIFT: ModName = ModName("Shift");
    pub const CAPS: ModName = ModName("Lock");
    pub const CTRL: ModName = ModName("Control");
    pub const MOD1: ModName = ModName("Mod1");
    pub const MOD2: ModName = ModName("Mod2");
    pub const MOD3: ModName = ModName("Mod3");
    pub const MOD4: ModName = ModName("Mod4");
    pub const MOD5: ModName = ModName("Mod5");

    pub const ALT: ModName = ModName("Mod1");
    pub const NUM: ModName = ModName("Mod2");
    pub const LOGO: ModName = ModName("Mod4");

    pub fn name(&self) -> &'static str {
        self.0
    }
}

/// Conventional names of virtual modifiers.
///
/// A keymap is free to bind these to any real modifiers, or to none.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct VModName(pub &'static str);

impl AsRef<str> for VModName {
    fn as_ref(&self) -> &str {
        self.0
    }
}

impl Borrow<str> for VModName {
    fn borrow(&self) -> &str {
        self.0
    }
}

impl VModName {
    pub const ALT: VModName = VModName("Alt");
    pub const META: VModName = VModName("Meta");
    pub const SUPER: VModName = VModName("Super");
    pub const HYPER: VModName = VModName("Hyper");
    pub const NUM: VModName = VModName("NumLock");
    pub const SCROLL: VModName = VModName("ScrollLock");
    pub const LEVEL3: VModName = VModName("LevelThree");
    pub const LEVEL5: VModName = VModName("LevelFive");

    pub fn name(&self) -> &'static str {
        self.0
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LedName(pub &'static str);

impl AsRef<str> for LedName {
    fn as_ref(&self) -> &str {
        self.0
    }
}

impl Borrow<str> for LedName {
    fn borrow(&self) -> &str {
        self.0
    }
}

impl LedName {
    pub const CAPS: LedName = LedName("Caps Lock");
    pub const NUM: LedName = LedName("Num Lock");
    pub const SCROLL: LedName = LedName("Scroll Lock");
    pub const COMPOSE: LedName = LedName("Compose");
    pub const KANA: LedName = LedName("Kana");

    pub fn name(&self) -> &'static str {
        self.0
    }
}
