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
 * Copyright © 2009 Dan Nicholson
 * Copyright © 2009-2012 Daniel Stone
 * Copyright © 2012 Intel Corporation
 * Copyright © 2012 Ran Benita
 * Copyright © 2012 Ran Benita <ran234@gmail.com>
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
 *         Dan Nicholson <dbn.lists@gmail.com>
 *         wysiwys
 */

//! The compiled keymap and the builders which assemble it.
//!
//! A [Keymap] is immutable once built. Every [State](crate::State) reads
//! from it, and any number of states may share one keymap.

use crate::atom::{Atom, AtomTable};
use crate::errors::*;
use crate::rust_xkbcommon::*;
use crate::utils::bit;
use std::collections::BTreeMap;

use strum::{EnumCount, IntoEnumIterator};

pub(crate) const MOD_REAL_MASK_ALL: ModMask = 0x000000ff;

/// Maximum number of allowed groups
///
/// This limit is artificially enforced. The main
/// reason it's still here is that the rules file
/// format does not support multiple groups very well,
/// and the rules shipped with `xkeyboard-config`
/// (see rules/evdev) depend on this limit extensively.
/// So just lifting this limit would cause problems for
/// people who will use more than 4 layouts.
pub const XKB_MAX_GROUPS: u8 = 4;
pub(crate) const XKB_MAX_MODS: usize = std::mem::size_of::<ModMask>() * u8::BITS as usize;
pub(crate) const XKB_MAX_LEDS: usize = std::mem::size_of::<LedMask>() * u8::BITS as usize;

// Limits to avoid memory exhaustion or memory waste
pub(crate) const XKB_KEYCODE_MAX_IMPL: RawKeycode = 0xfff;
pub(crate) const XKB_LEVEL_MAX_IMPL: LevelIndex = 2048;

/// The eight real (core) modifiers, in bit order.
///
/// Every keymap defines these; their indices never change.
#[derive(
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    strum_macros::EnumCount,
    strum_macros::EnumIter,
    strum_macros::IntoStaticStr,
)]
pub enum RealMod {
    Shift,
    Lock,
    Control,
    Mod1,
    Mod2,
    Mod3,
    Mod4,
    Mod5,
}

impl RealMod {
    pub fn index(self) -> ModIndex {
        self as ModIndex
    }

    pub fn mask(self) -> ModMask {
        1 << (self as u32)
    }

    pub fn name(self) -> &'static str {
        self.into()
    }
}

bitflags::bitflags! {

    #[derive(Copy, Clone, Debug, PartialEq)]
    pub(crate) struct ModType: u8 {
        const REAL = (1 << 0);
        const VIRT = (1 << 1);
        const BOTH = (1 << 0) | (1 << 1);
        }
}

#[derive(Clone, Copy, Eq, PartialEq, Debug)]
pub(crate) enum ActionType {
    None,
    ModSet,
    ModLatch,
    ModLock,
    GroupSet,
    GroupLatch,
    GroupLock,
}

bitflags::bitflags! {
    /// Flags modifying the behavior of a [KeyAction].
    #[derive(Clone, Copy, Eq, PartialEq, Debug, Default)]
    pub struct ActionFlags: u16 {
        /// Set/latch actions: releasing the key also clears a lock of the
        /// same modifiers or group, unless another key was pressed meanwhile.
        const LOCK_CLEAR = (1 << 0);
        /// Latch actions: pressing the key again while the latch is
        /// pending turns the latch into a lock.
        const LATCH_TO_LOCK = (1 << 1);
        /// Lock actions: the key only unlocks.
        const LOCK_NO_LOCK = (1 << 2);
        /// Lock actions: the key only locks.
        const LOCK_NO_UNLOCK = (1 << 3);
        /// Group actions: the group value is absolute instead of relative.
        const ABSOLUTE_SWITCH = (1 << 5);
    }
}

#[derive(PartialEq, Eq, Clone, Copy, Debug, Default)]
pub(crate) struct Mods {
    pub(crate) mods: ModMask, //original
    pub(crate) mask: ModMask, //computed.
}

impl Mods {
    pub(crate) fn new(mods: ModMask) -> Self {
        Self { mods, mask: 0 }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct ModAction {
    pub(crate) action_type: ActionType,
    pub(crate) flags: ActionFlags,
    pub(crate) mods: Mods,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct GroupAction {
    pub(crate) action_type: ActionType,
    pub(crate) flags: ActionFlags,
    pub(crate) group: i32,
}

#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub(crate) enum Action {
    Mods(ModAction),
    Group(GroupAction),
    #[default]
    None,
}

impl Action {
    pub(crate) fn action_type(&self) -> ActionType {
        match self {
            Action::Mods(a) => a.action_type,
            Action::Group(a) => a.action_type,
            Action::None => ActionType::None,
        }
    }

    fn resolve_mods(&mut self, mods: &ModSet) {
        if let Action::Mods(action) = self {
            action.mods.mask = mods.mod_mask_get_effective(action.mods.mods);
        }
    }
}

/// An action bound to a level of a key.
///
/// Actions are what make a key change the keyboard state: a key without an
/// action only produces symbols. Modifier masks may contain virtual
/// modifiers; they are resolved to the modifiers they are bound to when the
/// keymap is built.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum KeyAction {
    #[default]
    None,
    /// Sets the modifiers while the key is held.
    SetMods { mods: ModMask, flags: ActionFlags },
    /// Sets the modifiers while the key is held, then latches them
    /// for the next key press.
    LatchMods { mods: ModMask, flags: ActionFlags },
    /// Toggles a lock of the modifiers.
    LockMods { mods: ModMask, flags: ActionFlags },
    /// Changes the depressed group while the key is held.
    SetGroup { group: i32, flags: ActionFlags },
    /// Changes the depressed group while the key is held, then latches
    /// the change for the next key press.
    LatchGroup { group: i32, flags: ActionFlags },
    /// Changes the locked group.
    LockGroup { group: i32, flags: ActionFlags },
}

impl KeyAction {
    pub fn set_mods(mods: ModMask) -> Self {
        Self::SetMods {
            mods,
            flags: ActionFlags::empty(),
        }
    }

    pub fn latch_mods(mods: ModMask) -> Self {
        Self::LatchMods {
            mods,
            flags: ActionFlags::empty(),
        }
    }

    pub fn lock_mods(mods: ModMask) -> Self {
        Self::LockMods {
            mods,
            flags: ActionFlags::empty(),
        }
    }

    pub fn set_group(group: i32) -> Self {
        Self::SetGroup {
            group,
            flags: ActionFlags::empty(),
        }
    }

    pub fn latch_group(group: i32) -> Self {
        Self::LatchGroup {
            group,
            flags: ActionFlags::empty(),
        }
    }

    pub fn lock_group(group: i32) -> Self {
        Self::LockGroup {
            group,
            flags: ActionFlags::empty(),
        }
    }

    /// Replaces the flags of the action. Has no effect on [KeyAction::None].
    pub fn with_flags(self, new_flags: ActionFlags) -> Self {
        use KeyAction::*;
        match self {
            None => None,
            SetMods { mods, .. } => SetMods {
                mods,
                flags: new_flags,
            },
            LatchMods { mods, .. } => LatchMods {
                mods,
                flags: new_flags,
            },
            LockMods { mods, .. } => LockMods {
                mods,
                flags: new_flags,
            },
            SetGroup { group, .. } => SetGroup {
                group,
                flags: new_flags,
            },
            LatchGroup { group, .. } => LatchGroup {
                group,
                flags: new_flags,
            },
            LockGroup { group, .. } => LockGroup {
                group,
                flags: new_flags,
            },
        }
    }

    fn mods(&self) -> ModMask {
        match self {
            KeyAction::SetMods { mods, .. }
            | KeyAction::LatchMods { mods, .. }
            | KeyAction::LockMods { mods, .. } => *mods,
            _ => 0,
        }
    }
}

impl From<KeyAction> for Action {
    fn from(action: KeyAction) -> Self {
        use KeyAction::*;

        let mod_action = |action_type, mods, flags| {
            Action::Mods(ModAction {
                action_type,
                flags,
                mods: Mods::new(mods),
            })
        };
        let group_action = |action_type, group, flags| {
            Action::Group(GroupAction {
                action_type,
                flags,
                group,
            })
        };

        match action {
            None => Action::None,
            SetMods { mods, flags } => mod_action(ActionType::ModSet, mods, flags),
            LatchMods { mods, flags } => mod_action(ActionType::ModLatch, mods, flags),
            LockMods { mods, flags } => mod_action(ActionType::ModLock, mods, flags),
            SetGroup { group, flags } => group_action(ActionType::GroupSet, group, flags),
            LatchGroup { group, flags } => group_action(ActionType::GroupLatch, group, flags),
            LockGroup { group, flags } => group_action(ActionType::GroupLock, group, flags),
        }
    }
}

/// How the modifiers of a key type entry are compared with the active modifiers.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum MatchStyle {
    /// The active modifiers, restricted to the type's modifiers,
    /// must equal the entry's modifiers.
    #[default]
    Exact,
    /// At least one of the entry's modifiers must be active.
    Any,
}

#[derive(Clone, PartialEq, Debug)]
pub(crate) struct KeyTypeEntry {
    pub(crate) level: LevelIndex,
    pub(crate) mods: Mods,
    pub(crate) preserve: Mods,
    pub(crate) match_style: MatchStyle,
}

impl KeyTypeEntry {
    /// Corresponds to `entry_is_active`
    /// If the virtual modifiers are not bound to anything, the entry is not active and should be
    /// skipped.
    pub(crate) fn is_active(&self) -> bool {
        self.mods.mods == 0 || self.mods.mask != 0
    }

    pub(crate) fn matches(&self, active_mods: ModMask) -> bool {
        if !self.is_active() {
            return false;
        }

        match self.match_style {
            MatchStyle::Exact => self.mods.mask == active_mods,
            MatchStyle::Any => (self.mods.mask & active_mods) != 0,
        }
    }
}

#[derive(Clone, PartialEq, Debug)]
pub(crate) struct KeyType {
    pub(crate) name: Atom,
    pub(crate) mods: Mods,
    pub(crate) num_levels: LevelIndex,
    pub(crate) entries: Vec<KeyTypeEntry>,
}

impl KeyType {
    /// The first active entry matching the given real modifiers, in declaration order.
    pub(crate) fn get_entry_for_mods(&self, mods: ModMask) -> Option<&KeyTypeEntry> {
        self.entries.iter().find(|entry| entry.matches(mods))
    }
}

/// Describes a key type: which modifiers it looks at, and which
/// combination of them selects which level.
///
/// ```
/// use xkbstate_rs::xkb_keymap::{KeymapBuilder, KeyTypeBuilder};
///
/// let mut builder = KeymapBuilder::new();
/// let shift = builder.mod_mask(&["Shift"]).unwrap();
/// let two_level = builder
///     .add_type(KeyTypeBuilder::new("TWO_LEVEL", shift, 2).map(shift, 1))
///     .unwrap();
/// # let _ = two_level;
/// ```
#[derive(Clone, Debug)]
pub struct KeyTypeBuilder {
    name: String,
    mods: ModMask,
    num_levels: LevelIndex,
    entries: Vec<KeyTypeEntry>,
}

impl KeyTypeBuilder {
    pub fn new(name: &str, mods: ModMask, num_levels: LevelIndex) -> Self {
        Self {
            name: name.to_owned(),
            mods,
            num_levels,
            entries: vec![],
        }
    }

    /// Maps exactly `mods` to `level`.
    pub fn map(self, mods: ModMask, level: LevelIndex) -> Self {
        self.map_with(mods, level, 0, MatchStyle::Exact)
    }

    /// Maps exactly `mods` to `level`; the modifiers in `preserve` are
    /// not reported as consumed when this entry matches.
    pub fn map_preserve(self, mods: ModMask, level: LevelIndex, preserve: ModMask) -> Self {
        self.map_with(mods, level, preserve, MatchStyle::Exact)
    }

    /// Maps any state containing at least one of `mods` to `level`.
    pub fn map_any(self, mods: ModMask, level: LevelIndex) -> Self {
        self.map_with(mods, level, 0, MatchStyle::Any)
    }

    fn map_with(
        mut self,
        mods: ModMask,
        level: LevelIndex,
        preserve: ModMask,
        match_style: MatchStyle,
    ) -> Self {
        self.entries.push(KeyTypeEntry {
            level,
            mods: Mods::new(mods),
            preserve: Mods::new(preserve),
            match_style,
        });
        self
    }
}

#[derive(Clone, Debug)]
pub(crate) struct Led {
    pub(crate) name: Atom,
    pub(crate) which_groups: StateComponent,
    pub(crate) groups: LayoutMask,
    pub(crate) which_mods: StateComponent,
    pub(crate) mods: Mods,
}

/// Describes a keyboard LED and the state which lights it.
#[derive(Clone, Debug)]
pub struct LedBuilder {
    name: String,
    which_mods: StateComponent,
    mods: ModMask,
    which_groups: StateComponent,
    groups: LayoutMask,
}

impl LedBuilder {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_owned(),
            which_mods: StateComponent::empty(),
            mods: 0,
            which_groups: StateComponent::empty(),
            groups: 0,
        }
    }

    /// Lights the LED when any of `mods` is set in one of the `which`
    /// modifier components.
    pub fn mods(mut self, mods: ModMask, which: StateComponent) -> Self {
        self.mods = mods;
        self.which_mods = which;
        self
    }

    /// Lights the LED when one of the `which` layout components holds a
    /// layout whose bit is set in `groups`.
    pub fn groups(mut self, groups: LayoutMask, which: StateComponent) -> Self {
        self.groups = groups;
        self.which_groups = which;
        self
    }
}

/// What to do with a group index which is out of range for a key.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub enum RangeExceed {
    #[default]
    Wrap,
    Saturate,
    Redirect(LayoutIndex),
}

#[derive(Clone, PartialEq, Eq, Debug, Default)]
pub(crate) struct Level {
    pub(crate) action: Action,
    pub(crate) syms: Vec<Keysym>,
}

impl Level {
    pub(super) fn same_syms(&self, other: &Self) -> bool {
        self.syms == other.syms
    }
}

pub(super) fn wrap_group_into_range(
    group: i32,
    num_groups: LayoutIndex,
    out_of_range: &RangeExceed,
) -> Option<LayoutIndex> {
    if num_groups == 0 {
        return None;
    }

    if let Ok(layout_idx) = LayoutIndex::try_from(group) {
        if layout_idx < num_groups {
            return Some(layout_idx);
        }
    }

    match out_of_range {
        RangeExceed::Redirect(n) if *n >= num_groups => None,
        RangeExceed::Redirect(n) => Some(*n),

        RangeExceed::Saturate if group < 0 => Some(0),
        RangeExceed::Saturate => Some(num_groups - 1),

        RangeExceed::Wrap => {
            let ngroups: i32 = num_groups.try_into().ok()?;

            group.rem_euclid(ngroups).try_into().ok()
        }
    }
}

#[derive(Clone, PartialEq, Debug)]
pub(crate) struct Group {
    pub(super) key_type: TypeIndex,
    pub(super) levels: Vec<Level>,
}

/// Describes one key: its symbols and actions per group and level, and
/// its modifier map.
///
/// ```
/// use xkbstate_rs::xkb_keymap::{KeyAction, KeyBuilder};
/// use xkeysym::Keysym;
///
/// let key = KeyBuilder::new(38u32, "AC01")
///     .syms(0, &[Keysym::a, Keysym::A]);
/// let caps = KeyBuilder::new(66u32, "CAPS")
///     .syms(1, &[Keysym::Caps_Lock])
///     .action(0, 0, KeyAction::lock_mods(0b10));
/// # let _ = (key, caps);
/// ```
#[derive(Clone, Debug)]
pub struct KeyBuilder {
    keycode: RawKeycode,
    name: String,
    groups: Vec<(TypeIndex, Vec<Vec<Keysym>>)>,
    actions: Vec<(LayoutIndex, LevelIndex, KeyAction)>,
    modmap: ModMask,
    repeats: bool,
    out_of_range: RangeExceed,
}

impl KeyBuilder {
    pub fn new(keycode: impl Into<RawKeycode>, name: &str) -> Self {
        Self {
            keycode: keycode.into(),
            name: name.to_owned(),
            groups: vec![],
            actions: vec![],
            modmap: 0,
            repeats: true,
            out_of_range: RangeExceed::default(),
        }
    }

    /// Adds a group using the key type at `key_type`, with the keysyms of each level.
    pub fn group(mut self, key_type: TypeIndex, levels: Vec<Vec<Keysym>>) -> Self {
        self.groups.push((key_type, levels));
        self
    }

    /// Adds a group with one keysym per level. [NO_SYMBOL](xkeysym::NO_SYMBOL)
    /// leaves the level empty.
    pub fn syms(self, key_type: TypeIndex, syms: &[Keysym]) -> Self {
        let levels = syms
            .iter()
            .map(|sym| match *sym {
                xkeysym::NO_SYMBOL => vec![],
                sym => vec![sym],
            })
            .collect();

        self.group(key_type, levels)
    }

    /// Binds an action to a level of a group.
    pub fn action(mut self, group: LayoutIndex, level: LevelIndex, action: KeyAction) -> Self {
        self.actions.push((group, level, action));
        self
    }

    /// The modifiers this key sets while held, when no explicit action
    /// is bound to its first level.
    pub fn modmap(mut self, mods: ModMask) -> Self {
        self.modmap = mods;
        self
    }

    pub fn repeats(mut self, repeats: bool) -> Self {
        self.repeats = repeats;
        self
    }

    pub fn out_of_range(mut self, out_of_range: RangeExceed) -> Self {
        self.out_of_range = out_of_range;
        self
    }
}

#[derive(Clone, Debug, PartialEq)]
pub(crate) struct Key {
    pub(super) keycode: Keycode,
    pub(crate) name: Atom,
    pub(crate) modmap: ModMask,
    pub(crate) repeats: bool,
    pub(super) out_of_range: RangeExceed,
    pub(super) groups: Vec<Group>,
}

impl Key {
    pub(crate) fn num_levels(
        &self,
        layout: LayoutIndex,
        keymap: &Keymap,
    ) -> Option<LevelIndex> {
        let group = self.groups.get(layout)?;

        keymap.types.get(group.key_type).map(|t| t.num_levels)
    }

    pub(crate) fn wrap_group(&self, group: i32) -> Option<LayoutIndex> {
        wrap_group_into_range(group, self.groups.len(), &self.out_of_range)
    }
}

#[derive(Copy, Clone, Debug)]
pub(crate) struct Mod {
    pub(crate) name: Atom,
    pub(crate) mod_type: ModType,
    pub(crate) mapping: ModMask, // vmod to real mod mapping
}

#[derive(Clone, Debug)]
pub(crate) struct ModSet {
    pub(crate) mods: Vec<Mod>,
}

impl ModSet {
    fn new_real(atoms: &mut AtomTable) -> Self {
        // Predefined (AKA real, core, X11) modifiers. The order is important!
        let mods = RealMod::iter()
            .map(|real_mod| Mod {
                name: atoms.intern(real_mod.name()),
                mod_type: ModType::REAL,
                mapping: real_mod.mask(),
            })
            .collect::<Vec<_>>();
        debug_assert_eq!(mods.len(), RealMod::COUNT);

        Self { mods }
    }

    pub(crate) fn mod_name_to_index(&self, name: Atom, mod_type: ModType) -> Option<ModIndex> {
        self.mods
            .iter()
            .position(|_mod| _mod.name == name && _mod.mod_type.intersects(mod_type))
    }

    /// The mask of all defined modifier indices.
    pub(crate) fn defined_mask(&self) -> ModMask {
        match bit(self.mods.len()) {
            Some(b) => b - 1,
            None => ModMask::MAX,
        }
    }

    // Gets a modifier mask and returns the resolved effective mask; this is needed because some
    // modifiers can also map to other modifiers, e.g. the "NumLock" modifier usually also sets the
    // "Mod2" modifier.
    // drops vmods, except pure ones once the keymap is built
    pub(crate) fn mod_mask_get_effective(&self, mods: ModMask) -> ModMask {
        let mut mask = mods & MOD_REAL_MASK_ALL;

        for (i, _mod) in self.mods.iter().enumerate() {
            if matches!(bit(i), Some(b) if mods & b != 0) {
                mask |= _mod.mapping;
            }
        }

        mask
    }

    /// Keeps the defined bits of `mods` and adds the real modifiers they resolve to.
    pub(crate) fn mod_mask_resolve(&self, mods: ModMask) -> ModMask {
        (mods & self.defined_mask()) | self.mod_mask_get_effective(mods)
    }
}

/// An immutable representation of a keymap. Used by the [State](crate::State) struct.
///
/// A keymap is created with a [KeymapBuilder] and cannot change afterwards.
/// It holds no references and is `Send + Sync`, so it may be wrapped in an
/// [Arc](std::sync::Arc) and shared by many states.
#[derive(Clone, Debug)]
pub struct Keymap {
    pub(crate) atoms: AtomTable,
    pub(crate) min_key_code: RawKeycode,
    pub(crate) max_key_code: RawKeycode,
    pub(crate) keys: BTreeMap<RawKeycode, Key>,

    pub(crate) types: Vec<KeyType>,

    pub(crate) mods: ModSet,

    // Not all groups must have names
    pub(crate) num_groups: usize,
    pub(crate) group_names: Vec<Atom>,

    pub(crate) leds: Vec<Led>,
}

/// Assembles a [Keymap].
///
/// The eight real modifiers are always defined. Virtual modifiers, layouts, key
/// types, keys and LEDs are added in turn; [KeymapBuilder::build()] validates the
/// result and resolves every virtual modifier to the real modifiers it is bound to,
/// or to itself when it is bound to none.
#[derive(Clone, Debug)]
pub struct KeymapBuilder {
    atoms: AtomTable,
    mods: ModSet,
    group_names: Vec<Atom>,
    types: Vec<KeyType>,
    keys: BTreeMap<RawKeycode, Key>,
    leds: Vec<Led>,
}

impl Default for KeymapBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl KeymapBuilder {
    pub fn new() -> Self {
        let mut atoms = AtomTable::new();
        let mods = ModSet::new_real(&mut atoms);

        Self {
            atoms,
            mods,
            group_names: vec![],
            types: vec![],
            keys: BTreeMap::new(),
            leds: vec![],
        }
    }

    fn check_mods_defined(&self, mods: ModMask) -> Result<(), KeymapBuildError> {
        match mods & !self.mods.defined_mask() {
            0 => Ok(()),
            _ => Err(KeymapBuildError::UndefinedMods(mods)),
        }
    }

    /// Defines a virtual modifier bound to the real modifiers in `mapping`.
    ///
    /// A mapping of `0` makes it a pure virtual modifier: it is not bound to any real
    /// modifier and [KeymapBuilder::build()] maps it to its own bit instead.
    pub fn add_virtual_mod(
        &mut self,
        name: &str,
        mapping: ModMask,
    ) -> Result<ModIndex, KeymapBuildError> {
        let exists = self
            .atoms
            .atom_lookup(name)
            .and_then(|atom| self.mods.mod_name_to_index(atom, ModType::BOTH))
            .is_some();
        if exists {
            return Err(KeymapBuildError::DuplicateModName(name.to_owned()));
        }

        if self.mods.mods.len() >= XKB_MAX_MODS {
            return Err(KeymapBuildError::TooManyMods(XKB_MAX_MODS));
        }

        if mapping & !MOD_REAL_MASK_ALL != 0 {
            return Err(KeymapBuildError::VirtualModMappingNotReal {
                name: name.to_owned(),
                mapping,
            });
        }

        self.mods.mods.push(Mod {
            name: self.atoms.intern(name),
            mod_type: ModType::VIRT,
            mapping,
        });

        Ok(self.mods.mods.len() - 1)
    }

    /// Looks up a modifier (real or virtual) by name.
    pub fn mod_index(&self, name: &str) -> Option<ModIndex> {
        self.atoms
            .atom_lookup(name)
            .and_then(|atom| self.mods.mod_name_to_index(atom, ModType::BOTH))
    }

    /// Builds a modifier mask from modifier names.
    pub fn mod_mask(&self, names: &[impl AsRef<str>]) -> Result<ModMask, KeymapBuildError> {
        names.iter().try_fold(0, |mask, name| {
            let name = name.as_ref();
            self.mod_index(name)
                .and_then(bit)
                .map(|b| mask | b)
                .ok_or_else(|| KeymapBuildError::NoSuchModName(name.to_owned()))
        })
    }

    /// Adds a layout (group). Layout names need not be unique.
    pub fn add_layout(&mut self, name: &str) -> Result<LayoutIndex, KeymapBuildError> {
        if self.group_names.len() >= XKB_MAX_GROUPS.into() {
            return Err(KeymapBuildError::TooManyLayouts(XKB_MAX_GROUPS.into()));
        }

        self.group_names.push(self.atoms.intern(name));

        Ok(self.group_names.len() - 1)
    }

    pub fn add_type(&mut self, builder: KeyTypeBuilder) -> Result<TypeIndex, KeymapBuildError> {
        let KeyTypeBuilder {
            name,
            mods,
            num_levels,
            entries,
        } = builder;

        let exists = self
            .atoms
            .atom_lookup(&name)
            .is_some_and(|atom| self.types.iter().any(|t| t.name == atom));
        if exists {
            return Err(KeymapBuildError::DuplicateTypeName(name));
        }

        if num_levels == 0 || num_levels > XKB_LEVEL_MAX_IMPL {
            return Err(KeymapBuildError::InvalidLevelCount {
                name,
                num_levels,
                max: XKB_LEVEL_MAX_IMPL,
            });
        }

        self.check_mods_defined(mods)?;

        for entry in entries.iter() {
            if entry.level >= num_levels {
                return Err(KeymapBuildError::TypeLevelOutOfRange {
                    name,
                    level: entry.level,
                    num_levels,
                });
            }

            for entry_mods in [entry.mods.mods, entry.preserve.mods] {
                if entry_mods & !mods != 0 {
                    return Err(KeymapBuildError::TypeEntryModsNotInType {
                        name,
                        mods: entry_mods,
                        type_mods: mods,
                    });
                }
            }
        }

        self.types.push(KeyType {
            name: self.atoms.intern(&name),
            mods: Mods::new(mods),
            num_levels,
            entries,
        });

        Ok(self.types.len() - 1)
    }

    pub fn add_key(&mut self, builder: KeyBuilder) -> Result<Keycode, KeymapBuildError> {
        let KeyBuilder {
            keycode,
            name,
            groups,
            actions,
            modmap,
            repeats,
            out_of_range,
        } = builder;

        if keycode > XKB_KEYCODE_MAX_IMPL {
            return Err(KeymapBuildError::IllegalKeycode(keycode));
        }

        if self.keys.contains_key(&keycode) {
            return Err(KeymapBuildError::DuplicateKeycode(keycode));
        }

        let exists = self
            .atoms
            .atom_lookup(&name)
            .is_some_and(|atom| self.keys.values().any(|k| k.name == atom));
        if exists {
            return Err(KeymapBuildError::DuplicateKeyName(name));
        }

        if groups.is_empty() {
            return Err(KeymapBuildError::KeyWithoutGroups(name));
        }

        if groups.len() > XKB_MAX_GROUPS.into() {
            return Err(KeymapBuildError::KeyHasTooManyGroups {
                name,
                num_groups: groups.len(),
                num_layouts: XKB_MAX_GROUPS.into(),
            });
        }

        self.check_mods_defined(modmap)?;

        let mut built_groups = Vec::with_capacity(groups.len());
        for (group_idx, (type_index, level_syms)) in groups.into_iter().enumerate() {
            let Some(key_type) = self.types.get(type_index) else {
                return Err(KeymapBuildError::NoSuchType { name, type_index });
            };

            if level_syms.len() > key_type.num_levels {
                return Err(KeymapBuildError::KeyHasTooManyLevels {
                    name,
                    group: group_idx,
                    num_levels: level_syms.len(),
                    type_levels: key_type.num_levels,
                });
            }

            let mut levels: Vec<Level> = level_syms
                .into_iter()
                .map(|syms| Level {
                    action: Action::None,
                    syms: syms
                        .into_iter()
                        .filter(|sym| *sym != xkeysym::NO_SYMBOL)
                        .collect(),
                })
                .collect();
            levels.resize_with(key_type.num_levels, Level::default);

            built_groups.push(Group {
                key_type: type_index,
                levels,
            });
        }

        for (group, level, action) in actions {
            let Some(slot) = built_groups
                .get_mut(group)
                .and_then(|g| g.levels.get_mut(level))
            else {
                return Err(KeymapBuildError::NoSuchKeyLevel { name, group, level });
            };

            self.check_mods_defined(action.mods())?;
            slot.action = action.into();
        }

        // A modifier key without an explicit action sets its modifiers while held.
        if modmap != 0 {
            for group in built_groups.iter_mut() {
                if let Some(level) = group.levels.first_mut() {
                    if level.action == Action::None {
                        level.action = KeyAction::set_mods(modmap).into();
                    }
                }
            }
        }

        let key = Key {
            keycode: Keycode::new(keycode),
            name: self.atoms.intern(&name),
            modmap,
            repeats,
            out_of_range,
            groups: built_groups,
        };
        self.keys.insert(keycode, key);

        Ok(Keycode::new(keycode))
    }

    pub fn add_led(&mut self, builder: LedBuilder) -> Result<LedIndex, KeymapBuildError> {
        let exists = self
            .atoms
            .atom_lookup(&builder.name)
            .is_some_and(|atom| self.leds.iter().any(|led| led.name == atom));
        if exists {
            return Err(KeymapBuildError::DuplicateLedName(builder.name));
        }

        if self.leds.len() >= XKB_MAX_LEDS {
            return Err(KeymapBuildError::TooManyLeds(XKB_MAX_LEDS));
        }

        self.check_mods_defined(builder.mods)?;

        self.leds.push(Led {
            name: self.atoms.intern(&builder.name),
            which_groups: builder.which_groups,
            groups: builder.groups,
            which_mods: builder.which_mods,
            mods: Mods::new(builder.mods),
        });

        Ok(self.leds.len() - 1)
    }

    /// Validates the keymap and resolves every modifier mask to the real and pure virtual modifiers it stands for.
    pub fn build(self) -> Result<Keymap, KeymapBuildError> {
        let KeymapBuilder {
            atoms,
            mut mods,
            group_names,
            mut types,
            mut keys,
            mut leds,
        } = self;

        let num_groups = group_names.len();
        if num_groups == 0 {
            return Err(KeymapBuildError::NoLayouts);
        }

        // A pure virtual modifier is mapped to itself.
        for (idx, _mod) in mods.mods.iter_mut().enumerate() {
            if _mod.mod_type.contains(ModType::VIRT) && _mod.mapping == 0 {
                _mod.mapping = bit(idx).unwrap_or(0);
            }
        }

        for _type in types.iter_mut() {
            _type.mods.mask = mods.mod_mask_get_effective(_type.mods.mods);

            for entry in _type.entries.iter_mut() {
                entry.mods.mask = mods.mod_mask_get_effective(entry.mods.mods);
                entry.preserve.mask = mods.mod_mask_get_effective(entry.preserve.mods);
            }
        }

        for key in keys.values_mut() {
            let key_name = || atoms.get(key.name).unwrap_or_default().to_owned();

            if key.groups.len() > num_groups {
                return Err(KeymapBuildError::KeyHasTooManyGroups {
                    name: key_name(),
                    num_groups: key.groups.len(),
                    num_layouts: num_groups,
                });
            }

            if let RangeExceed::Redirect(group) = key.out_of_range {
                if group >= key.groups.len() {
                    return Err(KeymapBuildError::InvalidRedirectGroup {
                        name: key_name(),
                        group,
                    });
                }
            }

            key.modmap = mods.mod_mask_get_effective(key.modmap);

            for level in key.groups.iter_mut().flat_map(|g| g.levels.iter_mut()) {
                level.action.resolve_mods(&mods);
            }
        }

        for led in leds.iter_mut() {
            led.mods.mask = mods.mod_mask_get_effective(led.mods.mods);
        }

        let min_key_code = keys.keys().next().copied().unwrap_or(8);
        let max_key_code = keys.keys().next_back().copied().unwrap_or(255);

        log::debug!(
            "Built keymap: {} keys ({}..={}), {} types, {} modifiers, {} layouts, {} LEDs",
            keys.len(),
            min_key_code,
            max_key_code,
            types.len(),
            mods.mods.len(),
            num_groups,
            leds.len()
        );

        Ok(Keymap {
            atoms,
            min_key_code,
            max_key_code,
            keys,
            types,
            mods,
            num_groups,
            group_names,
            leds,
        })
    }
}

impl Keymap {
    /// Shorthand for [KeymapBuilder::new()].
    pub fn builder() -> KeymapBuilder {
        KeymapBuilder::new()
    }

    pub(crate) fn xkb_key(&self, kc: RawKeycode) -> Option<&Key> {
        if kc < self.min_key_code || kc > self.max_key_code {
            None
        } else {
            self.keys.get(&kc)
        }
    }

    pub fn num_mods(&self) -> ModIndex {
        self.mods.mods.len()
    }

    pub fn mod_get_name(&self, idx: ModIndex) -> Option<&str> {
        self.mods
            .mods
            .get(idx)
            .and_then(|_mod| self.atoms.get(_mod.name))
    }

    pub fn mod_get_index(&self, name: impl AsRef<str>) -> Option<ModIndex> {
        self.atoms
            .atom_lookup(name.as_ref())
            .and_then(|atom| self.mods.mod_name_to_index(atom, ModType::BOTH))
    }

    /// Whether the modifier is virtual. Returns `None` for an undefined index.
    pub fn mod_is_virtual(&self, idx: ModIndex) -> Option<bool> {
        self.mods
            .mods
            .get(idx)
            .map(|_mod| _mod.mod_type == ModType::VIRT)
    }

    /// The real modifiers a modifier is bound to.
    ///
    /// Real and pure virtual modifiers are bound to themselves. Returns `None` for an
    /// undefined index.
    pub fn mod_get_mapping(&self, idx: ModIndex) -> Option<ModMask> {
        self.mods.mods.get(idx).map(|_mod| _mod.mapping)
    }

    pub fn num_layouts(&self) -> LayoutIndex {
        self.num_groups
    }

    pub fn layout_get_name(&self, idx: LayoutIndex) -> Option<&str> {
        self.group_names
            .get(idx)
            .and_then(|name| self.atoms.get(*name))
    }

    pub fn layout_get_index(&self, name: impl AsRef<str>) -> Option<LayoutIndex> {
        self.atoms
            .atom_lookup(name.as_ref())
            .and_then(|atom| self.group_names.iter().position(|n| *n == atom))
    }

    /// The number of layouts of a key, or 0 if the keycode is invalid.
    pub fn num_layouts_for_key(&self, kc: impl Into<RawKeycode>) -> LayoutIndex {
        self.xkb_key(kc.into())
            .map(|key| key.groups.len())
            .unwrap_or(0)
    }

    /// The number of levels of a key in a layout, or 0 if the keycode is invalid.
    ///
    /// Out-of-range layouts are brought into range as the key specifies.
    pub fn num_levels_for_key(&self, kc: impl Into<RawKeycode>, layout: LayoutIndex) -> LevelIndex {
        let num_levels = || -> Option<_> {
            let key = self.xkb_key(kc.into())?;

            let layout = key.wrap_group(layout.try_into().ok()?)?;

            key.num_levels(layout, self)
        }();

        num_levels.unwrap_or(0)
    }

    pub fn num_leds(&self) -> LedIndex {
        self.leds.len()
    }

    pub fn led_get_name(&self, idx: LedIndex) -> Option<&str> {
        self.leds.get(idx).and_then(|led| self.atoms.get(led.name))
    }

    pub fn led_get_index(&self, name: impl AsRef<str>) -> Option<LedIndex> {
        let atom = self.atoms.atom_lookup(name.as_ref())?;
        self.leds.iter().position(|led| led.name == atom)
    }

    /// Retrieves every modifier mask which selects `level` of `layout` for the key.
    ///
    /// The empty mask is reported for level 0 unless the key type maps it elsewhere.
    pub fn key_get_mods_for_level(
        &self,
        kc: impl Into<RawKeycode>,
        layout: LayoutIndex,
        level: LevelIndex,
    ) -> Option<Vec<ModMask>> {
        let key = self.xkb_key(kc.into())?;

        let layout = key.wrap_group(layout.try_into().ok()?)?;

        let group = key.groups.get(layout)?;
        if level >= group.levels.len() {
            return None;
        }

        let _type = self.types.get(group.key_type)?;

        let mut masks_out = vec![];

        if level == 0 {
            let empty_mapped = _type
                .entries
                .iter()
                .any(|entry| entry.is_active() && entry.mods.mask == 0);

            if !empty_mapped {
                masks_out.push(0);
            }
        }

        // now search explicit mappings
        masks_out.extend(
            _type
                .entries
                .iter()
                .filter(|entry| entry.is_active() && entry.level == level)
                .map(|entry| entry.mods.mask),
        );

        Some(masks_out)
    }
}
impl Key {
    pub(crate) fn get_syms_by_level(
        &self,
        layout: LayoutIndex,
        level: LevelIndex,
    ) -> Result<&[Keysym], KeyGetSymsByLevelError> {
        let group = i32::try_from(layout)
            .ok()
            .and_then(|layout| self.wrap_group(layout))
            .and_then(|layout| self.groups.get(layout))
            .ok_or(KeyGetSymsByLevelError::InvalidLayoutIndex(layout))?;

        let level = group
            .levels
            .get(level)
            .ok_or(KeyGetSymsByLevelError::InvalidLevelIndex(level))?;

        Ok(&level.syms)
    }
}
impl Keymap {
    pub fn key_get_syms_by_level(
        &self,
        kc: impl Into<RawKeycode>,
        layout: LayoutIndex,
        level: LevelIndex,
    ) -> Result<Vec<Keysym>, KeyGetSymsByLevelError> {
        let kc = kc.into();
        let key = self
            .xkb_key(kc)
            .ok_or(KeyGetSymsByLevelError::NoKeyForKeycode(Keycode(kc)))?;

        key.get_syms_by_level(layout, level).map(<[Keysym]>::to_vec)
    }

    pub fn min_keycode(&self) -> Keycode {
        Keycode::new(self.min_key_code)
    }

    pub fn max_keycode(&self) -> Keycode {
        Keycode::new(self.max_key_code)
    }

    /// Iterates over the keycodes which have a key, in ascending order.
    pub fn iter_keycodes(&self) -> impl Iterator<Item = Keycode> + '_ {
        self.keys.keys().copied().map(Keycode::new)
    }

    pub fn key_get_name(&self, kc: impl Into<RawKeycode>) -> Option<&str> {
        self.xkb_key(kc.into())
            .and_then(|key| self.atoms.get(key.name))
    }

    pub fn key_by_name(&self, name: impl AsRef<str>) -> Option<Keycode> {
        let atom = self.atoms.atom_lookup(name.as_ref())?;

        self.keys
            .values()
            .find(|key| key.name == atom)
            .map(|key| key.keycode)
    }

    pub fn key_repeats(&self, kc: impl Into<RawKeycode>) -> bool {
        self.xkb_key(kc.into()).map(|k| k.repeats).unwrap_or(false)
    }
}

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum KeyGetSymsByLevelError {
    #[error("Keymap has no syms for the keycode {0:?}")]
    NoKeyForKeycode(Keycode),

    #[error("Provided layout index is invalid: {0}")]
    InvalidLayoutIndex(LayoutIndex),

    #[error("Provided level index is invalid: {0}")]
    InvalidLevelIndex(LevelIndex),
}
