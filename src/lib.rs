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

//!
//! The keyboard state machine of XKB, in safe Rust.
//!
//! A [Keymap] describes a keyboard: its modifiers, layouts, key types, keys and LEDs. A [State]
//! follows one keyboard through key events and tells which symbols, text and LEDs result. Both are
//! `Send + Sync`; many states can share one keymap through an [Arc](std::sync::Arc).
//!
//! There is no XKB text parser here. A [Keymap] is assembled from its parts with a
//! [KeymapBuilder](xkb_keymap::KeymapBuilder) and never changes after [build](xkb_keymap::KeymapBuilder::build).
//!
//! ### Example
//!
//! ```rust
//! use xkbstate_rs::xkb_keymap::*;
//! use xkbstate_rs::xkb_state::*;
//! use xkbstate_rs::keysym::Keysym;
//!
//! let mut builder = Keymap::builder();
//! builder.add_layout("English (US)").unwrap();
//! let one_level = builder
//!     .add_type(KeyTypeBuilder::new("ONE_LEVEL", 0, 1))
//!     .unwrap();
//! let two_level = builder
//!     .add_type(KeyTypeBuilder::new("TWO_LEVEL", RealMod::Shift.mask(), 2)
//!         .map(RealMod::Shift.mask(), 1))
//!     .unwrap();
//! builder
//!     .add_key(KeyBuilder::new(50u32, "LFSH")
//!         .syms(one_level, &[Keysym::Shift_L])
//!         .modmap(RealMod::Shift.mask()))
//!     .unwrap();
//! builder
//!     .add_key(KeyBuilder::new(38u32, "AC01").syms(two_level, &[Keysym::a, Keysym::A]))
//!     .unwrap();
//! let keymap = builder.build().unwrap();
//!
//! let mut state = State::new(keymap);
//! state.update_key(50u32, KeyDirection::Down);
//! assert_eq!(state.key_get_one_sym(38u32), Some(Keysym::A));
//! assert_eq!(state.key_get_utf8(38u32), "A");
//! ```
//!
//! # Features
//! - `server`: [State::update_key], [State::update_latched_locked] and the `serialize_*`
//!   functions. For the process that reads the keyboard, such as a compositor.
//! - `client`: [State::update_mask]. For processes that receive the serialized state from a
//!   server and mirror it.
//!
//! Both are enabled by default. A process should drive a state through one set only.
//!
#![cfg_attr(docsrs, feature(doc_auto_cfg))]
#![allow(clippy::module_inception)]
#![allow(clippy::unwrap_or_default)]
#![crate_name = "xkbstate_rs"]
#![forbid(unsafe_code)]
mod keysyms_utf;

mod keysyms;

mod atom;
mod errors;
mod keymap;
mod state;

mod rust_xkbcommon;

mod utils;

mod text;

pub mod error {
    //! Errors returned when building a keymap or querying a state.

    pub use super::errors::{keymap, state};
}

pub mod xkb_keymap {
    //! [Keymap] and the builders that assemble it.
    //!
    //! ```rust
    //! use xkbstate_rs::xkb_keymap::*;
    //!
    //! let mut builder = Keymap::builder();
    //! builder.add_layout("us").unwrap();
    //! builder.add_virtual_mod("NumLock", RealMod::Mod2.mask()).unwrap();
    //! let keymap = builder.build().unwrap();
    //!
    //! assert_eq!(keymap.num_mods(), 9);
    //! ```

    pub use super::keymap::Keymap;
    pub use super::keymap::KeymapBuilder;
    pub use super::keymap::KeyTypeBuilder;
    pub use super::keymap::KeyBuilder;
    pub use super::keymap::LedBuilder;
    pub use super::keymap::KeyAction;
    pub use super::keymap::ActionFlags;
    pub use super::keymap::RealMod;
    pub use super::keymap::MatchStyle;
    pub use super::keymap::RangeExceed;
    pub use super::keymap::XKB_MAX_GROUPS;
}
pub use xkb_keymap::Keymap;

pub mod xkb_state {
    //! [State], the value types it is queried with, and well-known modifier and LED names.
    //!
    //! A client mirroring a compositor only needs the `client` feature:
    //! ```toml
    //! [dependencies]
    //! xkbstate-rs = { version = "0.1.0", default-features = false, features = ["client"] }
    //! ```
    //! and feeds each `wl_keyboard.modifiers` event to [State::update_mask]:
    //! ```rust,ignore
    //! state.update_mask(mods_depressed, mods_latched, mods_locked, 0, 0, group as i32);
    //! ```

    pub use super::state::State;

    pub use super::rust_xkbcommon::KeyDirection;
    pub use super::rust_xkbcommon::LayoutIndex;
    pub use super::rust_xkbcommon::LayoutMask;
    pub use super::rust_xkbcommon::LevelIndex;
    pub use super::rust_xkbcommon::ModIndex;
    pub use super::rust_xkbcommon::ModMask;
    pub use super::rust_xkbcommon::LedIndex;
    pub use super::rust_xkbcommon::LedMask;
    pub use super::rust_xkbcommon::TypeIndex;

    pub use super::rust_xkbcommon::names::*;

    pub use super::rust_xkbcommon::ConsumedMode;
    pub use super::rust_xkbcommon::StateComponent;
    pub use super::rust_xkbcommon::StateMatch;
}
pub use xkb_state::State;

pub mod keycode {
    //! Keycodes identify physical keys. With Linux evdev scan codes, the keycode is the scan code
    //! plus 8.
    pub use super::rust_xkbcommon::RawKeycode;

    /// A keycode, as passed to [State::update_key](crate::State::update_key).
    #[derive(Clone, Copy, Debug, PartialOrd, Ord, PartialEq, Eq, Hash)]
    pub struct Keycode(pub RawKeycode);
}

/// Case conversion and text for [`xkeysym`] keysyms.
pub mod keysym {
    pub use xkeysym::Keysym;
    pub use xkeysym::NO_SYMBOL;

    pub use super::keysyms::{keysym_is_lower, keysym_is_upper, keysym_to_lower, keysym_to_upper};
    pub use super::keysyms_utf::{keysym_to_utf32, keysym_to_utf8};
}


#[cfg(test)]
macro_rules! log_init {
    () => {
        use simplelog::*;

        let _ = TermLogger::init(
            LevelFilter::Debug,
            Config::default(),
            TerminalMode::Mixed,
            ColorChoice::Auto,
        );
    };
}
#[cfg(test)]
pub(crate) use log_init;
