/*
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
 */

use crate::rust_xkbcommon::*;

pub mod state {
    //! Errors for the [State](crate::State) struct.
    pub use crate::state::errors::*;
}

pub mod keymap {

    //! Errors for the [Keymap](crate::Keymap) struct and its builders.
    pub use super::KeymapBuildError;
    pub use crate::keymap::KeyGetSymsByLevelError;
}

use thiserror::Error;

/// Errors returned while assembling a [Keymap](crate::Keymap).
///
/// A builder which returned an error is left unchanged, so the caller may
/// correct the input and try again.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum KeymapBuildError {
    #[error("A modifier named {0:?} already exists")]
    DuplicateModName(String),

    #[error("No modifier named {0:?}")]
    NoSuchModName(String),

    #[error("Too many modifiers defined (maximum {0})")]
    TooManyMods(usize),

    #[error("Virtual modifier {name:?} must be bound to real modifiers only, got {mapping:#x}")]
    VirtualModMappingNotReal { name: String, mapping: ModMask },

    #[error("Too many layouts defined (maximum {0})")]
    TooManyLayouts(usize),

    #[error("The keymap has no layouts")]
    NoLayouts,

    #[error("A key type named {0:?} already exists")]
    DuplicateTypeName(String),

    #[error("Key type {name:?} must have between 1 and {max} levels, got {num_levels}")]
    InvalidLevelCount {
        name: String,
        num_levels: LevelIndex,
        max: LevelIndex,
    },

    #[error("Key type {name:?} maps to level {level}, but only has {num_levels} levels")]
    TypeLevelOutOfRange {
        name: String,
        level: LevelIndex,
        num_levels: LevelIndex,
    },

    #[error("Key type {name:?} has an entry with modifiers {mods:#x} outside of its mask {type_mods:#x}")]
    TypeEntryModsNotInType {
        name: String,
        mods: ModMask,
        type_mods: ModMask,
    },

    #[error("Modifier mask {0:#x} references undefined modifiers")]
    UndefinedMods(ModMask),

    #[error("Illegal keycode {0}")]
    IllegalKeycode(RawKeycode),

    #[error("A key with keycode {0} already exists")]
    DuplicateKeycode(RawKeycode),

    #[error("A key named {0:?} already exists")]
    DuplicateKeyName(String),

    #[error("Key {0:?} has no groups")]
    KeyWithoutGroups(String),

    #[error("Key {name:?} has {num_groups} groups, but the keymap has {num_layouts} layouts")]
    KeyHasTooManyGroups {
        name: String,
        num_groups: LayoutIndex,
        num_layouts: LayoutIndex,
    },

    #[error("Key {name:?} references the undefined key type {type_index}")]
    NoSuchType { name: String, type_index: TypeIndex },

    #[error("Key {name:?} group {group} has {num_levels} levels, but its type only has {type_levels}")]
    KeyHasTooManyLevels {
        name: String,
        group: LayoutIndex,
        num_levels: LevelIndex,
        type_levels: LevelIndex,
    },

    #[error("Key {name:?} has an action for group {group} level {level}, which does not exist")]
    NoSuchKeyLevel {
        name: String,
        group: LayoutIndex,
        level: LevelIndex,
    },

    #[error("Key {name:?} redirects out-of-range groups to the undefined group {group}")]
    InvalidRedirectGroup { name: String, group: LayoutIndex },

    #[error("An LED named {0:?} already exists")]
    DuplicateLedName(String),

    #[error("Too many LEDs defined (maximum {0})")]
    TooManyLeds(usize),
}

#[cfg(test)]
#[derive(Debug)]
pub enum TestErr {
    Keymap(KeymapBuildError),
    NoSymsForKeycode(Keycode),
    WrongKeysym { expected: Keysym, got: Keysym },
    WrongChanges {
        keycode: Keycode,
        expected: StateComponent,
        got: StateComponent,
    },
}

#[cfg(test)]
impl From<KeymapBuildError> for TestErr {
    fn from(e: KeymapBuildError) -> Self {
        Self::Keymap(e)
    }
}
