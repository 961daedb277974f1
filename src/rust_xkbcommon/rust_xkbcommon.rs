//based on xkbcommon.h
/*
 * Copyright 1985, 1987, 1990, 1998  The Open Group
 * Copyright 2008  Dan Nicholson
 *
 * Permission is hereby granted, free of charge, to any person obtaining a
 * copy of this software and associated documentation files (the "Software"),
 * to deal in the Software without restriction, including without limitation
 * the rights to use, copy, modify, merge, publish, distribute, sublicense,
 * and/or sell copies of the Software, and to permit persons to whom the
 * Software is furnished to do so, subject to the following conditions:
 *
 * The above copyright notice and this permission notice shall be included in
 * all copies or substantial portions of the Software.
 *
 * THE SOFTWARE IS PROVIDED "AS IS", WITHOUT WARRANTY OF ANY KIND, EXPRESS OR
 * IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF MERCHANTABILITY,
 * FITNESS FOR A PARTICULAR PURPOSE AND NONINFRINGEMENT. IN NO EVENT SHALL THE
 * AUTHORS BE LIABLE FOR ANY CLAIM, DAMAGES OR OTHER LIABILITY, WHETHER IN AN
 * ACTION OF CONTRACT, TORT OR OTHERWISE, ARISING FROM, OUT OF OR IN
 * CONNECTION WITH THE SOFTWARE OR THE USE OR OTHER DEALINGS IN THE SOFTWARE.
 *
 * Except as contained in this notice, the names of the authors or their
 * institutions shall not be used in advertising or otherwise to promote the
 * sale, use or other dealings in this Software without prior written
 * authorization from the authors.
 */

/************************************************************
 * Copyright (c) 1993 by Silicon Graphics Computer Systems, Inc.
 *
 * Permission to use, copy, modify, and distribute this
 * software and its documentation for any purpose and without
 * fee is hereby granted, provided that the above copyright
 * notice appear in all copies and that both that copyright
 * notice and this permission notice appear in supporting
 * documentation, and that the name of Silicon Graphics not be
 * used in advertising or publicity pertaining to distribution
 * of the software without specific prior written permission.
 * Silicon Graphics makes no representation about the suitability
 * of this software for any purpose. It is provided "as is"
 * without any express or implied warranty.
 *
 * SILICON GRAPHICS DISCLAIMS ALL WARRANTIES WITH REGARD TO THIS
 * SOFTWARE, INCLUDING ALL IMPLIED WARRANTIES OF MERCHANTABILITY
 * AND FITNESS FOR A PARTICULAR PURPOSE. IN NO EVENT SHALL SILICON
 * GRAPHICS BE LIABLE FOR ANY SPECIAL, INDIRECT OR CONSEQUENTIAL
 * DAMAGES OR ANY DAMAGES WHATSOEVER RESULTING FROM LOSS OF USE,
 * DATA OR PROFITS, WHETHER IN AN ACTION OF CONTRACT, NEGLIGENCE
 * OR OTHER TORTIOUS ACTION, ARISING OUT OF OR IN CONNECTION  WITH
 * THE USE OR PERFORMANCE OF THIS SOFTWARE.
 *
 ********************************************************/

/*
 * Copyright © 2009-2012 Daniel Stone
 * Copyright © 2012 Intel Corporation
 * Copyright © 2012 Ran Benita
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

pub(crate) use crate::keycode::Keycode;

pub(crate) use xkeysym::Keysym;

use std::str::FromStr;

/// The number of a physical key. Which key has which number is up to the keymap
/// and the input system.
pub type RawKeycode = u32;

impl From<Keycode> for u32 {
    fn from(val: Keycode) -> Self {
        val.0
    }
}

impl From<u32> for Keycode {
    fn from(raw: u32) -> Self {
        Self(raw)
    }
}
impl Keycode {
    pub fn new(raw: u32) -> Self {
        Self(raw)
    }

    pub fn raw(&self) -> u32 {
        self.0
    }
}

/// Index of a layout (an XKB group). The first layout has index 0.
pub type LayoutIndex = usize;

/// One bit per layout index.
pub type LayoutMask = u32;

/// Index of a shift level within a key's layout.
pub type LevelIndex = usize;

/// Index of a modifier: the eight real modifiers first, then virtual ones in
/// the order they were defined.
pub type ModIndex = usize;

/// One bit per modifier index.
pub type ModMask = u32;

pub type LedIndex = usize;

pub type LedMask = u32;

/// Index of a key type inside a [Keymap](crate::Keymap).
pub type TypeIndex = usize;

pub const XKB_KEYCODE_MAX: RawKeycode = 0xffffffff - 1;

impl Keycode {
    pub fn is_legal_ext(&self) -> bool {
        self.0 <= XKB_KEYCODE_MAX
    }

    pub fn is_legal_x11(&self) -> bool {
        self.0 >= 8 && self.0 <= 255
    }
}

#[derive(PartialEq, Clone, Copy, Debug)]
pub enum KeyDirection {
    /// The key was released.
    Up,
    /// The key was pressed.
    Down,
}

bitflags::bitflags! {
    /// The parts of a [State](crate::State).
    ///
    /// Used both to select what to serialize or query and as the change mask returned by
    /// the `update_*` functions, where a flag is set only if that part changed. The
    /// depressed parts are called "base" in XKB.
    #[derive(Copy, Clone, Eq, PartialEq, Debug)]
    pub struct StateComponent: u16 {
        /// Modifiers set by keys currently held down.
        const MODS_DEPRESSED = (1 << 0);
        /// Modifiers that apply to the next key press only.
        const MODS_LATCHED = (1 << 1);
        /// Modifiers that stay until their lock key is pressed again.
        const MODS_LOCKED = (1 << 2);
        /// The union of the three above; what key translation uses.
        const MODS_EFFECTIVE = (1 << 3);
        const LAYOUT_DEPRESSED = (1 << 4);
        const LAYOUT_LATCHED = (1 << 5);
        const LAYOUT_LOCKED = (1 << 6);
        /// The sum of the three above, brought into range.
        const LAYOUT_EFFECTIVE = (1 << 7);
        const LEDS = (1 << 8);
    }
}

impl From<StateComponent> for i64 {
    fn from(val: StateComponent) -> Self {
        val.bits() as i64
    }
}

impl TryFrom<i64> for StateComponent {
    type Error = &'static str;

    fn try_from(i: i64) -> Result<Self, Self::Error> {
        let u = i.try_into().map_err(|_| "Could not convert from i64")?;

        Self::from_bits(u).ok_or("Could not convert to StateComponent")
    }
}

impl FromStr for StateComponent {
    type Err = String;

    /// Parses a `+`-separated list of component names,
    /// e.g. `"ModsDepressed+ModsLocked"` or `"base+locked"`.
    /// Names are matched case-insensitively.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut mask = StateComponent::empty();

        for name in s.split('+').map(str::trim).filter(|n| !n.is_empty()) {
            let component = crate::text::lookup_key(&crate::text::STATE_COMPONENT_NAMES, name)
                .ok_or_else(|| format!("Unknown state component: {}", name))?;
            mask |= *component;
        }

        Ok(mask)
    }
}

bitflags::bitflags! {
    /// How a list of modifiers is matched against the state.
    #[derive(Copy, Clone, Debug, PartialEq, Eq)]
    pub struct StateMatch: u32 {
        /// At least one of the modifiers is active.
        const ANY = (1 << 0);
        /// Every modifier is active.
        const ALL = (1 << 1);
        /// Other active modifiers are allowed.
        const NON_EXCLUSIVE = (1 << 16);
    }
}

/// Which modifiers count as consumed by a key's translation. Preserved
/// modifiers of the matching entry are never consumed.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ConsumedMode {
    /// Every modifier of the key's type, whether or not it is active: any of them
    /// could change the result. This is what libX11 does.
    Xkb,
    /// Only the modifiers of the matching entry, plus any single modifier which on its
    /// own selects a level with other symbols than the base level. This is what GTK does.
    Gtk,
}
