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
 * Copyright © 2012 Intel Corporation
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
 */
use crate::keymap::*;

use crate::keysyms::*;
use crate::rust_xkbcommon::*;
use crate::utils::{bit, one_bit_set, set_bits};

use std::borrow::Borrow;
use std::sync::Arc;

pub(crate) mod errors {
    use super::*;
    use thiserror::Error;

    #[derive(Debug, Error, PartialEq, Eq)]
    pub enum ModIndexIsConsumedError {
        #[error("The provided mod index does not exist: {0}")]
        NoSuchModIndex(usize),
    }

    #[derive(Debug, Error, PartialEq, Eq)]
    pub enum LedIsActiveError {
        #[error("The provided LED index does not exist: {0}")]
        NoSuchLedIndex(usize),

        #[error("The provided LED name does not exist: {0}")]
        NoSuchLedName(String),
    }

    #[derive(Debug, Error, PartialEq, Eq)]
    pub enum LayoutIsActiveError {
        #[error("The provided layout index does not exist: {0}")]
        NoSuchLayoutIndex(usize),

        #[error("The provided layout name does not exist: {0}")]
        NoSuchLayoutName(String),
    }

    #[derive(Debug, Error, PartialEq, Eq)]
    pub enum ModIsActiveError {
        #[error("The provided mod index does not exist: {0}")]
        NoSuchModIndex(usize),

        #[error("The provided mod name does not exist: {0}")]
        NoSuchModName(String),
    }

    #[derive(PartialEq, Debug, Clone)]
    pub(crate) enum InternalStateError {
        NoSuchFilter,
        CannotCreateFilterFromActionType(ActionType),
        WrongActionType,
        CannotInitializeNullFilter,
        CannotApplyNullFilter,
        WrongFilterData,
    }
}
use errors::*;

#[derive(Clone, Debug)]
struct Filter {
    action: Action,
    func: FilterFunc,
    // `None` for latches installed by `update_latched_locked`
    key: Option<RawKeycode>,
    refcnt: usize,
    _priv: FilterData,
}

impl Filter {
    fn new(action: Action, key: Option<RawKeycode>) -> Result<Self, InternalStateError> {
        let func = FilterFunc::try_from(action.action_type())?;

        Ok(Filter {
            refcnt: 0,
            action,
            key,
            _priv: FilterData::None,
            func,
        })
    }

    fn mod_action(&mut self) -> Result<&mut ModAction, InternalStateError> {
        match self.action {
            Action::Mods(ref mut action) => Ok(action),
            _ => Err(InternalStateError::WrongActionType),
        }
    }

    fn group_action(&mut self) -> Result<&mut GroupAction, InternalStateError> {
        match self.action {
            Action::Group(ref mut action) => Ok(action),
            _ => Err(InternalStateError::WrongActionType),
        }
    }

    fn is_pending_latch(&self, func: FilterFunc) -> bool {
        self.func == func
            && matches!(
                self._priv,
                FilterData::Latch(LatchState::Pending)
                    | FilterData::GroupLatch {
                        latch: LatchState::Pending,
                        ..
                    }
            )
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
enum FilterFunc {
    ModSet,
    ModLatch,
    ModLock,
    GroupSet,
    GroupLatch,
    GroupLock,
    None,
}

impl TryFrom<ActionType> for FilterFunc {
    type Error = InternalStateError;

    fn try_from(t: ActionType) -> Result<Self, Self::Error> {
        use ActionType::*;
        let func = match t {
            ModSet => FilterFunc::ModSet,
            ModLatch => FilterFunc::ModLatch,
            ModLock => FilterFunc::ModLock,
            GroupSet => FilterFunc::GroupSet,
            GroupLatch => FilterFunc::GroupLatch,
            GroupLock => FilterFunc::GroupLock,
            t => return Err(InternalStateError::CannotCreateFilterFromActionType(t)),
        };

        Ok(func)
    }
}

#[derive(Clone, Debug)]
enum FilterData {
    None,
    Latch(LatchState),
    Mods(ModMask),
    Group(i32),
    GroupLatch { latch: LatchState, delta: i32 },
}

#[derive(Clone, Copy, PartialEq, Debug, Default)]
enum LatchState {
    #[default]
    NoLatch,
    KeyDown,
    Pending,
}

#[derive(PartialEq)]
enum FilterResult {
    // The event is consumed by the filters.
    // An event is always processed by all filters,
    // but any filter can prevent it from being processed further
    // by consuming it.
    Consume,

    // The event may continue to be processed as far as
    // this filter is concerned
    Continue,
}

#[derive(Clone, Debug, Default, PartialEq)]
struct StateComponents {
    // these may be negative or out of range
    base_group: i32,
    latched_group: i32,
    locked_group: i32,
    group: LayoutIndex,
    base_mods: ModMask,
    latched_mods: ModMask,
    locked_mods: ModMask,
    mods: ModMask,
    leds: LedMask,
}

impl StateComponents {
    fn get_changes(&self, other: &Self) -> StateComponent {
        let mut mask = StateComponent::empty();

        if self.group != other.group {
            mask |= StateComponent::LAYOUT_EFFECTIVE;
        }
        if self.base_group != other.base_group {
            mask |= StateComponent::LAYOUT_DEPRESSED;
        }
        if self.latched_group != other.latched_group {
            mask |= StateComponent::LAYOUT_LATCHED;
        }
        if self.locked_group != other.locked_group {
            mask |= StateComponent::LAYOUT_LOCKED;
        }
        if self.mods != other.mods {
            mask |= StateComponent::MODS_EFFECTIVE;
        }
        if self.base_mods != other.base_mods {
            mask |= StateComponent::MODS_DEPRESSED;
        }
        if self.latched_mods != other.latched_mods {
            mask |= StateComponent::MODS_LATCHED;
        }
        if self.locked_mods != other.locked_mods {
            mask |= StateComponent::MODS_LOCKED;
        }
        if self.leds != other.leds {
            mask |= StateComponent::LEDS;
        }

        mask
    }
}

/// The state of one keyboard: its depressed, latched and locked modifiers
/// and layouts, and the derived effective values and LEDs.
///
/// A state shares its [Keymap] through an [Arc]; it never modifies it.
#[derive(Clone, Debug)]
pub struct State {
    // Before updating the state, we keep a copy of just this struct.
    // This allows us to report which components of the state have been changed.
    components: StateComponents,

    // At each event, we accumulate all the needed modifications to the
    // base modifiers, and apply them at the end.
    // These keep track of the state.
    set_mods: ModMask,
    clear_mods: ModMask,

    // We mustn't clear a base modifier if there's another depressed key
    // which affects it, e.g. given this sequence
    // < Left Shift down, Right Shift down, Left Shift up >
    // the modifier should still be set. This keeps the count.
    mod_key_count: [i16; XKB_MAX_MODS],

    filters: Filters,

    keymap: Arc<Keymap>,
}

#[derive(Clone, Debug, Default)]
struct Filters {
    filters: Vec<Filter>,
}

impl Filters {
    /// Reuses a dead filter slot if there is one.
    fn add_or_modify_filter(
        &mut self,
        action: Action,
        key: Option<RawKeycode>,
    ) -> Result<Option<usize>, InternalStateError> {
        let func = match FilterFunc::try_from(action.action_type()) {
            Ok(func) => func,
            // skip actions which do not change the state
            Err(_) => return Ok(None),
        };

        let idx = match self
            .filters
            .iter()
            .position(|f| f.func == FilterFunc::None)
        {
            Some(idx) => idx,
            None => {
                self.filters.push(Filter::new(action.clone(), key)?);
                self.filters.len() - 1
            }
        };

        let filter = self
            .filters
            .get_mut(idx)
            .ok_or(InternalStateError::NoSuchFilter)?;
        filter.key = key;
        filter.action = action;
        filter.func = func;
        filter._priv = FilterData::None;
        filter.refcnt = 1;

        log::trace!(
            "{} filter {} for key {:?}",
            filter.action.action_type().text(),
            idx,
            key
        );

        Ok(Some(idx))
    }
}

impl Action {
    fn breaks_latch(&self) -> bool {
        self.action_type() == ActionType::None
    }
}

// Converts a character to its control counterpart, following the rules of
// libX11's `XkbToControl`.
fn xkb_to_control(ch: u8) -> u8 {
    match ch {
        b'@'..=0x7e | b' ' => ch & 0x1f,
        b'2' => 0,
        b'3'..=b'7' => ch - b'3' + 0x1b,
        b'8' => 0x7f,
        b'/' => b'_' & 0x1f,
        _ => ch,
    }
}

fn group_bit(group: i32) -> LayoutMask {
    usize::try_from(group).ok().and_then(bit).unwrap_or(0)
}

impl State {
    /// Create a new keyboard state machine
    /// from a provided keymap.
    ///
    /// All components start out empty, with the first layout active.
    pub fn new(keymap: impl Into<Arc<Keymap>>) -> Self {
        let mut state = Self {
            keymap: keymap.into(),
            components: Default::default(),
            filters: Filters::default(),
            set_mods: 0,
            clear_mods: 0,
            mod_key_count: [0; XKB_MAX_MODS],
        };

        state.update_derived();

        state
    }

    /// Get the keymap which a keyboard state object is using
    ///
    /// Returns the keymap which was passed to [State::new()] when creating this state object.
    pub fn get_keymap(&self) -> &Keymap {
        &self.keymap
    }

    fn filter(&mut self, filter_idx: usize) -> Result<&mut Filter, InternalStateError> {
        self.filters
            .filters
            .get_mut(filter_idx)
            .ok_or(InternalStateError::NoSuchFilter)
    }

    fn apply_filter(
        &mut self,
        kc: RawKeycode,
        filter_idx: usize,
        direction: KeyDirection,
    ) -> Result<FilterResult, InternalStateError> {
        use FilterFunc::*;
        match self.filter(filter_idx)?.func {
            ModSet => self.filter_mod_set_func(filter_idx, kc, direction),
            ModLatch => self.filter_mod_latch_func(filter_idx, kc, direction),
            ModLock => self.filter_mod_lock_func(filter_idx, kc, direction),
            GroupSet => self.filter_group_set_func(filter_idx, kc, direction),
            GroupLatch => self.filter_group_latch_func(filter_idx, kc, direction),
            GroupLock => self.filter_group_lock_func(filter_idx, kc, direction),
            None => Err(InternalStateError::CannotApplyNullFilter),
        }
    }

    /// Matches the filter to the `new` function
    fn initialize_with_filter(&mut self, filter_idx: usize) -> Result<(), InternalStateError> {
        use FilterFunc::*;
        match self.filter(filter_idx)?.func {
            ModSet => self.filter_mod_set_new(filter_idx),
            ModLatch => self.filter_mod_latch_new(filter_idx),
            ModLock => self.filter_mod_lock_new(filter_idx),
            GroupSet => self.filter_group_set_new(filter_idx),
            GroupLatch => self.filter_group_latch_new(filter_idx),
            GroupLock => self.filter_group_lock_new(filter_idx),
            None => Err(InternalStateError::CannotInitializeNullFilter),
        }
    }

    fn filter_group_set_new(&mut self, filter_idx: usize) -> Result<(), InternalStateError> {
        let base_group = self.components.base_group;
        let filter = self.filter(filter_idx)?;

        filter._priv = FilterData::Group(base_group);

        let group_action = filter.group_action()?;
        let group = if group_action.flags.intersects(ActionFlags::ABSOLUTE_SWITCH) {
            group_action.group
        } else {
            base_group.saturating_add(group_action.group)
        };
        self.components.base_group = group;

        Ok(())
    }

    fn filter_group_set_func(
        &mut self,
        filter_idx: usize,
        kc: RawKeycode,
        direction: KeyDirection,
    ) -> Result<FilterResult, InternalStateError> {
        let filter = self
            .filters
            .filters
            .get_mut(filter_idx)
            .ok_or(InternalStateError::NoSuchFilter)?;

        if filter.key != Some(kc) {
            filter.group_action()?.flags &= !ActionFlags::LOCK_CLEAR;
            return Ok(FilterResult::Continue);
        }

        if direction == KeyDirection::Down {
            filter.refcnt += 1;
            return Ok(FilterResult::Consume);
        }

        filter.refcnt = filter.refcnt.saturating_sub(1);
        if filter.refcnt > 0 {
            return Ok(FilterResult::Consume);
        }

        self.components.base_group = match filter._priv {
            FilterData::Group(group) => group,
            FilterData::None => 0,
            _ => return Err(InternalStateError::WrongFilterData),
        };

        if filter
            .group_action()?
            .flags
            .intersects(ActionFlags::LOCK_CLEAR)
        {
            self.components.locked_group = 0;
        }

        filter.func = FilterFunc::None;
        Ok(FilterResult::Continue)
    }

    fn filter_group_lock_new(&mut self, filter_idx: usize) -> Result<(), InternalStateError> {
        let num_groups = self.keymap.num_groups;
        let locked_group = self.components.locked_group;

        let group_action = self.filter(filter_idx)?.group_action()?;

        let group = if group_action.flags.intersects(ActionFlags::ABSOLUTE_SWITCH) {
            group_action.group
        } else {
            locked_group.saturating_add(group_action.group)
        };

        // cycle through the layouts
        self.components.locked_group = wrap_group_into_range(group, num_groups, &RangeExceed::Wrap)
            .and_then(|group| i32::try_from(group).ok())
            .unwrap_or(0);

        Ok(())
    }

    fn filter_group_lock_func(
        &mut self,
        filter_idx: usize,
        kc: RawKeycode,
        direction: KeyDirection,
    ) -> Result<FilterResult, InternalStateError> {
        let filter = self.filter(filter_idx)?;

        use FilterResult::*;
        if filter.key != Some(kc) {
            return Ok(Continue);
        }

        if direction == KeyDirection::Down {
            filter.refcnt += 1;
            return Ok(Consume);
        }
        filter.refcnt = filter.refcnt.saturating_sub(1);
        if filter.refcnt > 0 {
            return Ok(Consume);
        }

        filter.func = FilterFunc::None;

        Ok(Continue)
    }

    fn filter_group_latch_new(&mut self, filter_idx: usize) -> Result<(), InternalStateError> {
        let base_group = self.components.base_group;
        let filter = self.filter(filter_idx)?;

        let group_action = filter.group_action()?;
        let delta = if group_action.flags.intersects(ActionFlags::ABSOLUTE_SWITCH) {
            group_action.group.saturating_sub(base_group)
        } else {
            group_action.group
        };

        filter._priv = FilterData::GroupLatch {
            latch: LatchState::KeyDown,
            delta,
        };
        self.components.base_group = base_group.saturating_add(delta);

        Ok(())
    }

    fn filter_group_latch_func(
        &mut self,
        filter_idx: usize,
        kc: RawKeycode,
        direction: KeyDirection,
    ) -> Result<FilterResult, InternalStateError> {
        let action = self.key_get_action(kc).cloned();
        let filter = self
            .filters
            .filters
            .get_mut(filter_idx)
            .ok_or(InternalStateError::NoSuchFilter)?;

        use FilterResult::*;
        let (mut latch, delta) = match filter._priv {
            FilterData::GroupLatch { latch, delta } => (latch, delta),
            _ => return Err(InternalStateError::WrongFilterData),
        };

        if direction == KeyDirection::Down && latch == LatchState::Pending {
            // Awaiting the single latched keypress: either break the latch
            // if any random key is pressed, or promote it to a lock if it's
            // the same group latch.
            match action {
                Some(Action::Group(group_action))
                    if group_action.action_type == ActionType::GroupLatch
                        && group_action == *filter.group_action()? =>
                {
                    if group_action.flags.intersects(ActionFlags::LATCH_TO_LOCK)
                        && group_action.group != 0
                    {
                        filter.action = Action::Group(GroupAction {
                            action_type: ActionType::GroupLock,
                            ..group_action
                        });
                        filter.func = FilterFunc::GroupLock;
                        filter.key = Some(kc);
                        filter._priv = FilterData::None;
                        self.components.latched_group =
                            self.components.latched_group.saturating_sub(delta);

                        self.filter_group_lock_new(filter_idx)?;
                        return Ok(Consume);
                    }
                    // Without LatchToLock a new latch filter is created for this key.
                }
                None => {
                    self.components.latched_group =
                        self.components.latched_group.saturating_sub(delta);
                    filter.func = FilterFunc::None;
                    return Ok(Continue);
                }
                Some(a) if a.breaks_latch() => {
                    self.components.latched_group =
                        self.components.latched_group.saturating_sub(delta);
                    filter.func = FilterFunc::None;
                    return Ok(Continue);
                }
                _ => {}
            }
        } else if direction == KeyDirection::Up && filter.key == Some(kc) {
            // Our key got released. If we've set it to clear locks,
            // and we currently have a group locked, then release it and
            // don't actually latch. Else we've actually hit the latching
            // stage, so set PENDING and move our group from base to
            // latched.
            let lock_clear = filter
                .group_action()?
                .flags
                .intersects(ActionFlags::LOCK_CLEAR);

            if latch == LatchState::NoLatch || (lock_clear && self.components.locked_group != 0)
            {
                if latch == LatchState::Pending {
                    self.components.latched_group =
                        self.components.latched_group.saturating_sub(delta);
                } else {
                    self.components.base_group =
                        self.components.base_group.saturating_sub(delta);
                }
                if lock_clear {
                    self.components.locked_group = 0;
                }
                filter.func = FilterFunc::None;
            } else if latch == LatchState::KeyDown {
                latch = LatchState::Pending;
                self.components.base_group = self.components.base_group.saturating_sub(delta);
                self.components.latched_group =
                    self.components.latched_group.saturating_add(delta);
            }
        } else if direction == KeyDirection::Down && latch == LatchState::KeyDown {
            // Another key was pressed while the latching key is held:
            // keep the base group active, but don't trip the latch.
            latch = LatchState::NoLatch;
        }

        filter._priv = FilterData::GroupLatch { latch, delta };

        Ok(Continue)
    }

    fn filter_mod_set_new(&mut self, filter_idx: usize) -> Result<(), InternalStateError> {
        let filter = self
            .filters
            .filters
            .get_mut(filter_idx)
            .ok_or(InternalStateError::NoSuchFilter)?;

        self.set_mods = filter.mod_action()?.mods.mask;

        Ok(())
    }

    fn filter_mod_set_func(
        &mut self,
        filter_idx: usize,
        kc: RawKeycode,
        direction: KeyDirection,
    ) -> Result<FilterResult, InternalStateError> {
        use FilterResult::*;

        let filter = self
            .filters
            .filters
            .get_mut(filter_idx)
            .ok_or(InternalStateError::NoSuchFilter)?;

        if filter.key != Some(kc) {
            filter.mod_action()?.flags &= !ActionFlags::LOCK_CLEAR;

            return Ok(Continue);
        }
        if direction == KeyDirection::Down {
            filter.refcnt += 1;
            return Ok(Consume);
        }

        // If something else refers to it, consume
        filter.refcnt = filter.refcnt.saturating_sub(1);
        if filter.refcnt > 0 {
            return Ok(Consume);
        }

        let mod_action = filter.mod_action()?;

        self.clear_mods = mod_action.mods.mask;
        if mod_action.flags.intersects(ActionFlags::LOCK_CLEAR) {
            self.components.locked_mods &= !mod_action.mods.mask;
        }

        filter.func = FilterFunc::None;
        Ok(Continue)
    }

    fn filter_mod_lock_new(&mut self, filter_idx: usize) -> Result<(), InternalStateError> {
        let filter = self
            .filters
            .filters
            .get_mut(filter_idx)
            .ok_or(InternalStateError::NoSuchFilter)?;

        filter._priv = FilterData::Mods(self.components.locked_mods & filter.mod_action()?.mods.mask);

        let mod_action = filter.mod_action()?;

        self.set_mods |= mod_action.mods.mask;

        if !mod_action.flags.intersects(ActionFlags::LOCK_NO_LOCK) {
            self.components.locked_mods |= mod_action.mods.mask;
        }

        Ok(())
    }

    fn filter_mod_lock_func(
        &mut self,
        filter_idx: usize,
        kc: RawKeycode,
        direction: KeyDirection,
    ) -> Result<FilterResult, InternalStateError> {
        let filter = self
            .filters
            .filters
            .get_mut(filter_idx)
            .ok_or(InternalStateError::NoSuchFilter)?;

        use FilterResult::*;

        if filter.key != Some(kc) {
            return Ok(Continue);
        }

        if direction == KeyDirection::Down {
            filter.refcnt += 1;
            return Ok(Consume);
        }

        filter.refcnt = filter.refcnt.saturating_sub(1);
        if filter.refcnt > 0 {
            return Ok(Consume);
        }

        self.clear_mods |= filter.mod_action()?.mods.mask;

        if !filter
            .mod_action()?
            .flags
            .intersects(ActionFlags::LOCK_NO_UNLOCK)
        {
            let mods = match filter._priv {
                FilterData::Mods(mods) => mods,
                FilterData::None => 0,
                _ => return Err(InternalStateError::WrongFilterData),
            };
            self.components.locked_mods &= !mods;
        }

        filter.func = FilterFunc::None;

        Ok(Continue)
    }

    fn filter_mod_latch_new(&mut self, filter_idx: usize) -> Result<(), InternalStateError> {
        let filter = self
            .filters
            .filters
            .get_mut(filter_idx)
            .ok_or(InternalStateError::NoSuchFilter)?;

        filter._priv = FilterData::Latch(LatchState::KeyDown);
        self.set_mods = filter.mod_action()?.mods.mask;

        Ok(())
    }

    fn filter_mod_latch_func(
        &mut self,
        filter_idx: usize,
        kc: RawKeycode,
        direction: KeyDirection,
    ) -> Result<FilterResult, InternalStateError> {
        let action = self.key_get_action(kc).cloned();
        let filter = self
            .filters
            .filters
            .get_mut(filter_idx)
            .ok_or(InternalStateError::NoSuchFilter)?;

        use FilterResult::*;
        let mut latch: LatchState = match filter._priv {
            FilterData::Latch(latch) => latch,
            _ => return Err(InternalStateError::WrongFilterData),
        };

        if direction == KeyDirection::Down && latch == LatchState::Pending {
            // If this is a new keypress and we're awaiting our
            // single latched keypress, then either break the latch
            // if any random key is pressed, or promote it to a lock
            // or plain base set if it's the same modifier.
            match action {
                Some(Action::Mods(mod_action))
                    if mod_action.action_type == ActionType::ModLatch
                        && mod_action.flags == filter.mod_action()?.flags
                        && mod_action.mods.mask == filter.mod_action()?.mods.mask =>
                {
                    let mask = mod_action.mods.mask;
                    let latch_to_lock = mod_action.flags.intersects(ActionFlags::LATCH_TO_LOCK);
                    filter.action = Action::Mods(mod_action);

                    if latch_to_lock {
                        filter.mod_action()?.action_type = ActionType::ModLock;
                        filter.func = FilterFunc::ModLock;
                        // the lock is released by the next lock action, not by this key
                        filter._priv = FilterData::Mods(0);

                        self.components.locked_mods |= mask;
                    } else {
                        filter.mod_action()?.action_type = ActionType::ModSet;
                        filter.func = FilterFunc::ModSet;
                        filter._priv = FilterData::None;
                        self.set_mods = mask;
                    }
                    filter.key = Some(kc);
                    self.components.latched_mods &= !mask;

                    return Ok(Consume);
                }
                None => {
                    self.components.latched_mods &= !filter.mod_action()?.mods.mask;
                    filter.func = FilterFunc::None;
                    return Ok(Continue);
                }
                Some(a) if a.breaks_latch() => {
                    self.components.latched_mods &= !filter.mod_action()?.mods.mask;
                    filter.func = FilterFunc::None;
                    return Ok(Continue);
                }
                _ => {}
            }
        } else if direction == KeyDirection::Up && filter.key == Some(kc) {
            // Our key got released. If we've set it to clear locks,
            // and we currently have the same modifiers locked, then
            // release them and don't actually latch. Else we've
            // actually hit the latching stage, so set PENDING and move
            // out modifier from base to latched.
            let mod_action = filter.mod_action()?;
            let mask = mod_action.mods.mask;

            if latch == LatchState::NoLatch
                || (mod_action.flags.intersects(ActionFlags::LOCK_CLEAR)
                    && (self.components.locked_mods & mask) == mask)
            {
                if latch == LatchState::Pending {
                    self.components.latched_mods &= !mask;
                } else {
                    self.clear_mods = mask;
                }

                self.components.locked_mods &= !mask;

                filter.func = FilterFunc::None;
            } else {
                latch = LatchState::Pending;
                self.clear_mods = mask;
                self.components.latched_mods |= mask;
            }
        } else if direction == KeyDirection::Down && latch == LatchState::KeyDown {
            // Someone's pressed another key while we've still
            // got the latching key held down, so keep the base
            // modifier state active, but don't trip the latch,
            // just clear it as soon as the modifier gets released.

            latch = LatchState::NoLatch;
        }

        filter._priv = FilterData::Latch(latch);

        Ok(Continue)
    }

    /// Applies any relevant filters to the key, first from the list of
    /// filters that are currently active, then if no filter has claimed
    /// the key, possibly apply a new filter from the key action.
    fn filter_apply_all(
        &mut self,
        kc: RawKeycode,
        direction: KeyDirection,
    ) -> Result<(), InternalStateError> {
        let mut consumed = false;

        // First run through all the currently active filters
        // and see if any of them have consumed this event.
        for idx in 0..self.filters.filters.len() {
            if self.filters.filters[idx].func == FilterFunc::None {
                continue;
            }

            if self.apply_filter(kc, idx, direction)? == FilterResult::Consume {
                consumed = true;
            }
        }

        if consumed || direction == KeyDirection::Up {
            return Ok(());
        }

        let action = match self.key_get_action(kc) {
            Some(action) => action.clone(),
            None => return Ok(()),
        };

        let filter_idx = match self.filters.add_or_modify_filter(action, Some(kc))? {
            Some(idx) => idx,
            None => return Ok(()),
        };

        self.initialize_with_filter(filter_idx)
    }

    // Update the LED state to match the rest of the State
    fn led_update_all(&mut self) {
        self.components.leds = 0;

        for (idx, led) in self.keymap.leds.iter().enumerate() {
            let Some(led_bit) = bit(idx) else {
                continue;
            };

            if !led.which_mods.is_empty() && led.mods.mask != 0 {
                let mut mod_mask = 0;

                if led.which_mods.intersects(StateComponent::MODS_EFFECTIVE) {
                    mod_mask |= self.components.mods;
                }
                if led.which_mods.intersects(StateComponent::MODS_DEPRESSED) {
                    mod_mask |= self.components.base_mods;
                }
                if led.which_mods.intersects(StateComponent::MODS_LATCHED) {
                    mod_mask |= self.components.latched_mods;
                }
                if led.which_mods.intersects(StateComponent::MODS_LOCKED) {
                    mod_mask |= self.components.locked_mods;
                }

                if (led.mods.mask & mod_mask) != 0 {
                    self.components.leds |= led_bit;
                    continue;
                }
            }

            if !led.which_groups.is_empty() && led.groups != 0 {
                let mut group_mask = 0;

                if led
                    .which_groups
                    .intersects(StateComponent::LAYOUT_EFFECTIVE)
                {
                    group_mask |= bit(self.components.group).unwrap_or(0);
                }
                if led
                    .which_groups
                    .intersects(StateComponent::LAYOUT_DEPRESSED)
                {
                    group_mask |= group_bit(self.components.base_group);
                }
                if led.which_groups.intersects(StateComponent::LAYOUT_LATCHED) {
                    group_mask |= group_bit(self.components.latched_group);
                }
                if led.which_groups.intersects(StateComponent::LAYOUT_LOCKED) {
                    group_mask |= group_bit(self.components.locked_group);
                }

                if (led.groups & group_mask) != 0 {
                    self.components.leds |= led_bit;
                }
            }
        }
    }

    /// Calculates the derived state (effective mods/group and LEDs)
    /// from an up-to-date State.
    fn update_derived(&mut self) {
        self.components.mods =
            self.components.base_mods | self.components.latched_mods | self.components.locked_mods;

        // The stored groups keep their value; only the effective group is clamped.
        let sum = i64::from(self.components.base_group)
            + i64::from(self.components.latched_group)
            + i64::from(self.components.locked_group);
        let max_group = i64::try_from(self.keymap.num_groups)
            .unwrap_or(i64::MAX)
            .saturating_sub(1)
            .max(0);

        self.components.group = LayoutIndex::try_from(sum.clamp(0, max_group)).unwrap_or(0);

        self.led_update_all();
    }

    fn log_changes(&self, what: std::fmt::Arguments, changes: StateComponent) {
        if changes.is_empty() {
            return;
        }

        log::debug!(
            "{}: changed {}; mods {}, layout {}, leds {:#x}",
            what,
            crate::text::component_mask_text(changes),
            crate::text::mod_mask_text(
                &self.keymap.mods,
                &self.keymap.atoms,
                self.components.mods
            ),
            self.components.group,
            self.components.leds
        );
    }

    /// Update the keyboard state to reflect a given key being pressed or released.
    ///
    /// This entry point is intended for *server* applications and should not be used by *client*
    /// applications. Clients should use [State::update_mask()] instead.
    ///
    /// This function is often used in conjunction with the function [State::key_get_syms()] (or
    /// [State::key_get_one_sym()]), for example, when handling a key event. In this case, you
    /// should prefer to get the keysyms *before* updating the key, such that the keysyms reported
    /// for the key event are not affected by the event itself. This is the conventional behavior.
    ///
    /// Returns a mask of state components that have changed as a result of the update. If nothing
    /// in the state has changed, returns an empty mask.
    #[cfg(feature = "server")]
    pub fn update_key(
        &mut self,
        kc: impl Into<RawKeycode>,
        direction: KeyDirection,
    ) -> StateComponent {
        let kc = kc.into();
        if self.keymap.xkb_key(kc).is_none() {
            return StateComponent::empty();
        }

        let prev_components = self.components.clone();

        // reset the mods for this turn
        self.set_mods = 0;
        self.clear_mods = 0;

        if let Err(e) = self.filter_apply_all(kc, direction) {
            log::error!("Could not apply filters for keycode {}: {:?}", kc, e);
        }

        for bit_idx in set_bits(self.set_mods) {
            if let Some(b) = bit(bit_idx) {
                self.mod_key_count[bit_idx] = self.mod_key_count[bit_idx].saturating_add(1);
                self.components.base_mods |= b;
            }
        }

        for bit_idx in set_bits(self.clear_mods) {
            if let Some(b) = bit(bit_idx) {
                self.mod_key_count[bit_idx] -= 1;

                if self.mod_key_count[bit_idx] <= 0 {
                    self.components.base_mods &= !b;
                    self.mod_key_count[bit_idx] = 0;
                }
            }
        }
        self.set_mods = 0;
        self.clear_mods = 0;

        self.update_derived();

        let changes = self.components.get_changes(&prev_components);
        self.log_changes(format_args!("key {} {:?}", kc, direction), changes);

        changes
    }

    /// Update the latched and locked components of the state.
    ///
    /// This entry point is intended for *server* applications, to set the
    /// latches and locks which do not come from key events (e.g. a
    /// "lock Control" request from a client).
    ///
    /// # Arguments
    /// * `affect_latched_mods`: the latched modifiers to change;
    ///   only these bits of `latched_mods` are used.
    /// * `affect_latched_group`: whether to change the latched group.
    /// * `affect_locked_mods`, `affect_locked_group`: the same for the locked components.
    ///
    /// Modifier masks are resolved to real modifiers first; undefined modifiers are ignored.
    /// Updating the latched modifiers cancels the pending latches of the affected modifiers,
    /// and updating the latched group cancels a pending group latch. The new latches last
    /// until the next key press, like latches set by a key.
    ///
    /// Returns a mask of state components that have changed as a result of the update.
    #[cfg(feature = "server")]
    #[allow(clippy::too_many_arguments)]
    pub fn update_latched_locked(
        &mut self,
        affect_latched_mods: ModMask,
        latched_mods: ModMask,
        affect_latched_group: bool,
        latched_group: i32,
        affect_locked_mods: ModMask,
        locked_mods: ModMask,
        affect_locked_group: bool,
        locked_group: i32,
    ) -> StateComponent {
        let prev_components = self.components.clone();
        let keymap = Arc::clone(&self.keymap);
        let resolve = |mask| keymap.mods.mod_mask_resolve(mask);

        // Update locks
        let affect_locked_mods = resolve(affect_locked_mods);
        let locked_mods = resolve(locked_mods);
        self.components.locked_mods =
            (self.components.locked_mods & !affect_locked_mods) | (locked_mods & affect_locked_mods);

        if affect_locked_group {
            self.components.locked_group = locked_group;
        }

        // Update latches
        let affect_latched_mods = resolve(affect_latched_mods);
        let latched_mods = resolve(latched_mods);
        if affect_latched_mods != 0 {
            self.update_latched_mods(affect_latched_mods, latched_mods);
        }

        if affect_latched_group {
            self.update_latched_group(latched_group);
        }

        self.update_derived();

        let changes = self.components.get_changes(&prev_components);
        self.log_changes(format_args!("latched/locked update"), changes);

        changes
    }

    #[cfg(feature = "server")]
    fn update_latched_mods(&mut self, affect: ModMask, value: ModMask) {
        // Pending latches of the affected modifiers are dropped; the rest
        // of their modifiers stay latched under the new latch.
        let mut kept = 0;
        for filter in self.filters.filters.iter_mut() {
            if !filter.is_pending_latch(FilterFunc::ModLatch) {
                continue;
            }
            if let Action::Mods(ref mod_action) = filter.action {
                if mod_action.mods.mask & affect != 0 {
                    kept |= mod_action.mods.mask & !affect;
                    filter.func = FilterFunc::None;
                }
            }
        }

        self.components.latched_mods =
            (self.components.latched_mods & !affect) | (value & affect);

        let latch = kept | (value & affect);
        if latch == 0 {
            return;
        }

        let action = Action::Mods(ModAction {
            action_type: ActionType::ModLatch,
            flags: ActionFlags::empty(),
            mods: Mods {
                mods: latch,
                mask: latch,
            },
        });
        self.install_pending_latch(action, FilterData::Latch(LatchState::Pending));
    }

    #[cfg(feature = "server")]
    fn update_latched_group(&mut self, group: i32) {
        for filter in self.filters.filters.iter_mut() {
            if filter.is_pending_latch(FilterFunc::GroupLatch) {
                filter.func = FilterFunc::None;
            }
        }

        self.components.latched_group = group;

        if group == 0 {
            return;
        }

        let action = Action::Group(GroupAction {
            action_type: ActionType::GroupLatch,
            flags: ActionFlags::empty(),
            group,
        });
        self.install_pending_latch(
            action,
            FilterData::GroupLatch {
                latch: LatchState::Pending,
                delta: group,
            },
        );
    }

    #[cfg(feature = "server")]
    fn install_pending_latch(&mut self, action: Action, data: FilterData) {
        match self.filters.add_or_modify_filter(action, None) {
            Ok(Some(idx)) => {
                if let Some(filter) = self.filters.filters.get_mut(idx) {
                    filter._priv = data;
                }
            }
            Ok(None) => {}
            Err(e) => log::error!("Could not install latch: {:?}", e),
        }
    }

    /// Updates the state from a set of explicit masks.
    ///
    /// This entry point is intended for *client* applications. *Server* applications should use
    /// [State::update_key()] instead.
    ///
    /// All parameters must always be passed, or the resulting state may be incoherent.
    /// Virtual modifiers are resolved to the real modifiers they are bound to; bits of undefined
    /// modifiers are dropped. The group values are stored as given, and only the effective
    /// layout is brought into range.
    ///
    /// The serialization is lossy and will not survive round trips; it must only be used to feed
    /// client state objects, and must not be used to update the server state.
    #[cfg(feature = "client")]
    pub fn update_mask(
        &mut self,
        base_mods: ModMask,
        latched_mods: ModMask,
        locked_mods: ModMask,
        base_group: i32,
        latched_group: i32,
        locked_group: i32,
    ) -> StateComponent {
        let prev_components = self.components.clone();

        // Make sure the mods are fully resolved,
        // since we get arbitrary input.
        let mods = &self.keymap.mods;
        self.components.base_mods = mods.mod_mask_resolve(base_mods);
        self.components.latched_mods = mods.mod_mask_resolve(latched_mods);
        self.components.locked_mods = mods.mod_mask_resolve(locked_mods);

        self.components.base_group = base_group;
        self.components.latched_group = latched_group;
        self.components.locked_group = locked_group;

        self.update_derived();

        let changes = self.components.get_changes(&prev_components);
        self.log_changes(format_args!("mask update"), changes);

        changes
    }
}

impl State {
    fn get_entry_for_key_state<'e>(
        &'e self,
        key: &Key,
        group: LayoutIndex,
    ) -> Option<&'e KeyTypeEntry> {
        let type_index = key.groups.get(group)?.key_type;
        let _type = self.keymap.types.get(type_index)?;
        let active_mods = self.components.mods & _type.mods.mask;

        _type.get_entry_for_mods(active_mods)
    }

    /// Returns the level to use for the given key and state
    ///
    /// Returns `None` if invalid.
    pub fn key_get_level(
        &self,
        kc: impl Into<RawKeycode>,
        layout: LayoutIndex,
    ) -> Option<LevelIndex> {
        let key = self.keymap.xkb_key(kc.into())?;

        if layout >= key.groups.len() {
            return None;
        }

        // If we don't find an explicit match, the default is 0.
        let level = match self.get_entry_for_key_state(key, layout) {
            Some(entry) => entry.level,
            None => 0,
        };

        Some(level)
    }

    /// Returns the layout to use for the given
    /// key and state, taking wrapping/clamping/
    /// etc. into account
    ///
    /// Returns `None` if invalid.
    pub fn key_get_layout(&self, kc: impl Into<RawKeycode>) -> Option<LayoutIndex> {
        let key = self.keymap.xkb_key(kc.into())?;

        key.wrap_group(self.components.group.try_into().ok()?)
    }

    fn key_get_action(&self, kc: RawKeycode) -> Option<&Action> {
        let layout = self.key_get_layout(kc)?;
        let level = self.key_get_level(kc, layout)?;
        let key = self.keymap.xkb_key(kc)?;

        Some(&key.groups.get(layout)?.levels.get(level)?.action)
    }

    /// Get the keysyms obtained from pressing a particular key in a given keyboard state.
    ///
    /// Get the keysyms for a key according to the current active layout, modifiers and shift level
    /// for the key, as determined by a keyboard state.
    ///
    /// As an extension to XKB, this function can return more than one keysym. If you do not want
    /// to handle this case, you can use [State::key_get_one_sym()] for a simpler interface.
    ///
    /// This function does not perform any keysym transformations.
    pub fn key_get_syms(&self, kc: impl Into<RawKeycode>) -> Vec<Keysym> {
        let kc = kc.into();

        let Some(layout) = self.key_get_layout(kc) else {
            return vec![];
        };

        let Some(level) = self.key_get_level(kc, layout) else {
            return vec![];
        };

        self.keymap
            .key_get_syms_by_level(kc, layout, level)
            .unwrap_or_default()
    }

    fn mod_is_active_and_unconsumed(&self, kc: RawKeycode, real_mod: RealMod) -> bool {
        let idx = real_mod.index();

        let is_active = matches!(
            self.mod_index_is_active(idx, StateComponent::MODS_EFFECTIVE),
            Ok(true)
        );

        is_active && self.mod_index_is_consumed(kc, idx) == Ok(false)
    }

    fn should_do_caps_transformation(&self, kc: RawKeycode) -> bool {
        self.mod_is_active_and_unconsumed(kc, RealMod::Lock)
    }

    fn should_do_ctrl_transformation(&self, kc: RawKeycode) -> bool {
        self.mod_is_active_and_unconsumed(kc, RealMod::Control)
    }

    /// Get the single keysym obtained from pressing a particular key in a given keyboard state.
    ///
    /// This function is similar to [State::key_get_syms()], but intended for users who cannot or
    /// do not want to handle the cases where multiple keysyms are returned (in which case this
    /// function is preferred).
    ///
    /// Returns the keysym. If the key does not have exactly one keysym, returns `None`.
    ///
    /// This function performs capitalization: when Caps Lock is active and not consumed by the
    /// key, the keysym is converted to upper case.
    pub fn key_get_one_sym(&self, kc: impl Into<RawKeycode>) -> Option<Keysym> {
        let kc = kc.into();
        let sym = match self.key_get_syms(kc).as_slice() {
            [sym] => *sym,
            _ => return None,
        };

        if self.should_do_caps_transformation(kc) {
            return Some(keysym_to_upper(sym));
        }

        Some(sym)
    }

    // The caps and ctrl transformations require some special handling,
    // so we cannot simply use `State::get_one_sym()` for them.
    // In particular, if Control is set, we must try very hard to find
    // some layout in which the keysym is ASCII and thus can be (maybe)
    // converted to a control character.
    fn get_one_sym_for_string(&self, kc: RawKeycode) -> Option<Keysym> {
        let layout = self.key_get_layout(kc)?;

        let num_layouts = match self.keymap.num_layouts_for_key(kc) {
            0 => return None,
            n => n,
        };

        let level = self.key_get_level(kc, layout)?;

        let mut sym = match self.keymap.key_get_syms_by_level(kc, layout, level) {
            Ok(syms) if syms.len() == 1 => syms[0],
            _ => return None,
        };

        if self.should_do_ctrl_transformation(kc) && sym.raw() > 127 {
            let ascii = (0..num_layouts).find_map(|i| {
                let level = self.key_get_level(kc, i)?;
                match self.keymap.key_get_syms_by_level(kc, i, level) {
                    Ok(syms) if syms.len() == 1 && syms[0].raw() <= 127 => Some(syms[0]),
                    _ => None,
                }
            });

            if let Some(ascii) = ascii {
                sym = ascii;
            }
        }

        if self.should_do_caps_transformation(kc) {
            sym = keysym_to_upper(sym);
        }

        Some(sym)
    }

    /// Get the Unicode/UTF-8 string obtained from pressing a particular key in a given keyboard
    /// state.
    ///
    /// Returns an empty string if the key produces no text.
    ///
    /// This function performs Capitalization and Control keysym transformations.
    pub fn key_get_utf8(&self, kc: impl Into<RawKeycode>) -> String {
        let kc = kc.into();

        let syms = match self.get_one_sym_for_string(kc) {
            Some(sym) => vec![sym],
            None => self.key_get_syms(kc),
        };

        let Some(utf8) = syms
            .into_iter()
            .map(crate::keysyms_utf::keysym_to_utf8)
            .collect::<Option<String>>()
        else {
            return String::new();
        };

        if let [c] = utf8.as_bytes() {
            if c.is_ascii() && self.should_do_ctrl_transformation(kc) {
                return char::from(xkb_to_control(*c)).to_string();
            }
        }

        utf8
    }

    /// Writes the UTF-8 string of [State::key_get_utf8()] into `buffer`, followed by a NUL byte.
    ///
    /// The string is truncated to fit, but never in the middle of a UTF-8 sequence. An empty
    /// buffer is left untouched.
    ///
    /// Returns the length of the full string in bytes, without the terminating NUL.
    pub fn key_get_utf8_into(&self, kc: impl Into<RawKeycode>, buffer: &mut [u8]) -> usize {
        let utf8 = self.key_get_utf8(kc);

        let Some(max_len) = buffer.len().checked_sub(1) else {
            return utf8.len();
        };

        let mut len = utf8.len().min(max_len);
        while !utf8.is_char_boundary(len) {
            len -= 1;
        }

        buffer[..len].copy_from_slice(&utf8.as_bytes()[..len]);
        buffer[len] = 0;

        utf8.len()
    }

    /// Get the Unicode/UTF-32 codepoint obtained from pressing a particular key in a given
    /// keyboard state.
    ///
    /// Returns the UTF-32 representation for the key, if it consists of only a single codepoint.
    /// Otherwise, returns 0.
    ///
    /// This function performs Capitalization and Control keysym transformations.
    pub fn key_get_utf32(&self, kc: impl Into<RawKeycode>) -> u32 {
        let kc = kc.into();

        let Some(cp) = self
            .get_one_sym_for_string(kc)
            .and_then(crate::keysyms_utf::keysym_to_utf32)
        else {
            return 0;
        };

        match u8::try_from(cp) {
            Ok(c) if c.is_ascii() && self.should_do_ctrl_transformation(kc) => {
                xkb_to_control(c).into()
            }
            _ => cp.into(),
        }
    }

    /// The counterpart to [State::update_mask()] for modifiers, to be used on the server side of
    /// serialization.
    ///
    /// This entry point is intended for *server* applications. *Client* applications should use
    /// [State::mod_index_is_active()] or [State::mod_name_is_active()].
    /// # Arguments
    /// * `components`: A mask of the modifier state components to serialize.
    ///
    /// State components other than `StateComponent::MODS_*` are ignored.
    /// If `MODS_EFFECTIVE` is included, all other state components are ignored.
    /// # Output
    /// Returns a [ModMask] representing the given components of the modifier state.
    #[cfg(feature = "server")]
    pub fn serialize_mods(&self, components: StateComponent) -> ModMask {
        self._serialize_mods(components)
    }

    fn _serialize_mods(&self, components: StateComponent) -> ModMask {
        let mut ret = 0;
        if components.intersects(StateComponent::MODS_EFFECTIVE) {
            return self.components.mods;
        }
        if components.intersects(StateComponent::MODS_DEPRESSED) {
            ret |= self.components.base_mods;
        }
        if components.intersects(StateComponent::MODS_LATCHED) {
            ret |= self.components.latched_mods;
        }
        if components.intersects(StateComponent::MODS_LOCKED) {
            ret |= self.components.locked_mods;
        }

        ret
    }

    /// The counterpart to [State::update_mask] for layouts, to be used on the server side of
    /// serialization.
    ///
    /// This entry point is intended for *server* applications. *Client* applications should use
    /// [State::layout_index_is_active()] and [State::layout_name_is_active()].
    /// # Arguments
    /// * `components`: A mask of the layout state components to serialize.
    ///
    /// State components other than `StateComponent::LAYOUT_*` are ignored.
    /// If `LAYOUT_EFFECTIVE` is included, the effective layout (always in range) is returned;
    /// otherwise the sum of the requested components, which may be out of range.
    #[cfg(feature = "server")]
    pub fn serialize_layout(&self, components: StateComponent) -> i32 {
        let mut ret: i32 = 0;

        if components.intersects(StateComponent::LAYOUT_EFFECTIVE) {
            return self.components.group.try_into().unwrap_or(0);
        }
        if components.intersects(StateComponent::LAYOUT_DEPRESSED) {
            ret = ret.saturating_add(self.components.base_group);
        }
        if components.intersects(StateComponent::LAYOUT_LATCHED) {
            ret = ret.saturating_add(self.components.latched_group);
        }
        if components.intersects(StateComponent::LAYOUT_LOCKED) {
            ret = ret.saturating_add(self.components.locked_group);
        }

        ret
    }
}

impl State {
    // Real and pure virtual modifiers active in the given components.
    fn active_real_mods(&self, components: StateComponent) -> ModMask {
        self.keymap
            .mods
            .mod_mask_get_effective(self._serialize_mods(components))
    }

    fn mod_mapping(&self, idx: ModIndex) -> Option<ModMask> {
        self.keymap.mods.mods.get(idx).map(|_mod| _mod.mapping)
    }

    /// Test whether a modifier is active in a given keyboard state by index.
    ///
    /// A modifier is active when all the real modifiers it is bound to are active. A pure
    /// virtual modifier is active when it is itself set.
    ///
    /// Returns Ok(true) if the given modifier is active with the specified type(s),
    /// Ok(false) if not,
    /// and Err(_) if the modifier is invalid.
    pub fn mod_index_is_active(
        &self,
        idx: ModIndex,
        components: StateComponent,
    ) -> Result<bool, ModIsActiveError> {
        let mapping = self
            .mod_mapping(idx)
            .ok_or(ModIsActiveError::NoSuchModIndex(idx))?;

        let active = self.active_real_mods(components);

        Ok(mapping != 0 && (active & mapping) == mapping)
    }

    /// Helper function for `State::mod_indices_are_active`
    /// and `State::mod_names_are_active`.
    fn match_mod_mappings(
        &self,
        components: StateComponent,
        state_match: StateMatch,
        mappings: &[ModMask],
    ) -> bool {
        let active = self.active_real_mods(components);
        let is_active = |mapping: &ModMask| *mapping != 0 && (active & mapping) == *mapping;

        let matched = if state_match.intersects(StateMatch::ANY) {
            mappings.iter().any(is_active)
        } else {
            mappings.iter().all(is_active)
        };

        if !matched {
            return false;
        }

        if !state_match.intersects(StateMatch::NON_EXCLUSIVE) {
            let wanted = mappings.iter().fold(0, |acc, m| acc | m);
            return (active & !wanted) == 0;
        }

        true
    }

    /// Test whether a set of modifiers are active in a given keyboard state by index.
    ///
    /// With [StateMatch::ANY], at least one of the modifiers must be active; otherwise all of
    /// them. Unless [StateMatch::NON_EXCLUSIVE] is given, no other real modifier may be active.
    pub fn mod_indices_are_active(
        &self,
        components: StateComponent,
        state_match: StateMatch,
        indices: &[ModIndex],
    ) -> Result<bool, ModIsActiveError> {
        let mappings = indices
            .iter()
            .map(|idx| {
                self.mod_mapping(*idx)
                    .ok_or(ModIsActiveError::NoSuchModIndex(*idx))
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(self.match_mod_mappings(components, state_match, &mappings))
    }

    /// Test whether a modifier is active in a given keyboard state by name.
    ///
    /// Returns `Ok(true)` if the given modifier is active with
    /// the specified type(s), `Ok(false)` if not, or `Err(...)`
    /// if the modifier is invalid.
    pub fn mod_name_is_active(
        &self,
        name: impl Borrow<str>,
        components: StateComponent,
    ) -> Result<bool, ModIsActiveError> {
        let name: &str = name.borrow();
        let idx = self
            .keymap
            .mod_get_index(name)
            .ok_or_else(|| ModIsActiveError::NoSuchModName(name.to_string()))?;

        self.mod_index_is_active(idx, components)
    }

    /// Test whether a set of modifiers are active in a given keyboard state by name
    ///
    /// Matches as [State::mod_indices_are_active()].
    pub fn mod_names_are_active(
        &self,
        components: StateComponent,
        state_match: StateMatch,
        names: &[impl Borrow<str>],
    ) -> Result<bool, ModIsActiveError> {
        let indices = names
            .iter()
            .map(|name| {
                let name: &str = name.borrow();
                self.keymap
                    .mod_get_index(name)
                    .ok_or_else(|| ModIsActiveError::NoSuchModName(name.to_string()))
            })
            .collect::<Result<Vec<_>, _>>()?;

        self.mod_indices_are_active(components, state_match, &indices)
    }

    /// Test whether a layout is active in a given keyboard state by index.
    ///
    /// Returns `Ok(true)` if the given group is active with
    /// the specified type(s), `Ok(false)` if not, or `Err(...)`
    /// if the group is invalid.
    pub fn layout_index_is_active(
        &self,
        idx: LayoutIndex,
        components: StateComponent,
    ) -> Result<bool, LayoutIsActiveError> {
        if idx >= self.keymap.num_groups {
            return Err(LayoutIsActiveError::NoSuchLayoutIndex(idx));
        }

        if components.intersects(StateComponent::LAYOUT_EFFECTIVE) && self.components.group == idx
        {
            return Ok(true);
        }

        let idx: i32 = idx
            .try_into()
            .map_err(|_| LayoutIsActiveError::NoSuchLayoutIndex(idx))?;

        if components.intersects(StateComponent::LAYOUT_DEPRESSED)
            && self.components.base_group == idx
        {
            return Ok(true);
        }
        if components.intersects(StateComponent::LAYOUT_LATCHED)
            && self.components.latched_group == idx
        {
            return Ok(true);
        }
        if components.intersects(StateComponent::LAYOUT_LOCKED)
            && self.components.locked_group == idx
        {
            return Ok(true);
        }

        Ok(false)
    }

    /// Test whether a layout is active in a given keyboard state by name.
    ///
    /// If multiple layouts in the keymap have this name, the one with the lowest index is tested.
    pub fn layout_name_is_active(
        &self,
        name: impl Borrow<str>,
        components: StateComponent,
    ) -> Result<bool, LayoutIsActiveError> {
        let name: &str = name.borrow();
        let idx = self
            .keymap
            .layout_get_index(name)
            .ok_or_else(|| LayoutIsActiveError::NoSuchLayoutName(name.into()))?;

        self.layout_index_is_active(idx, components)
    }

    /// Test whether a LED is active in a given keyboard state by index.
    pub fn led_index_is_active(&self, idx: LedIndex) -> Result<bool, LedIsActiveError> {
        if idx >= self.keymap.leds.len() {
            return Err(LedIsActiveError::NoSuchLedIndex(idx));
        }

        let led_bit = bit(idx).ok_or(LedIsActiveError::NoSuchLedIndex(idx))?;

        Ok((self.components.leds & led_bit) != 0)
    }

    /// Test whether a LED is active in a given keyboard state by name.
    pub fn led_name_is_active(&self, name: impl Borrow<str>) -> Result<bool, LedIsActiveError> {
        let name: &str = name.borrow();
        let idx = self
            .keymap
            .led_get_index(name)
            .ok_or_else(|| LedIsActiveError::NoSuchLedName(name.into()))?;

        self.led_index_is_active(idx)
    }

    fn key_get_consumed(&self, key: &Key, mode: ConsumedMode) -> ModMask {
        let mut consumed: ModMask = 0;

        let Some(group) = self.key_get_layout(key.keycode.raw()) else {
            return 0;
        };
        let Some(key_group) = key.groups.get(group) else {
            return 0;
        };
        let Some(_type) = self.keymap.types.get(key_group.key_type) else {
            return 0;
        };

        let matching_entry = self.get_entry_for_key_state(key, group);
        let preserve = matching_entry.map(|e| e.preserve.mask).unwrap_or(0);

        match mode {
            ConsumedMode::Xkb => consumed = _type.mods.mask,
            ConsumedMode::Gtk => {
                let no_mods_leveli = _type.get_entry_for_mods(0).map(|e| e.level).unwrap_or(0);
                let Some(no_mods_level) = key_group.levels.get(no_mods_leveli) else {
                    return 0;
                };

                for entry in _type.entries.iter().filter(|e| e.is_active()) {
                    let Some(level) = key_group.levels.get(entry.level) else {
                        continue;
                    };
                    if level.same_syms(no_mods_level) {
                        continue;
                    }

                    if Some(entry) == matching_entry || one_bit_set(entry.mods.mask) {
                        consumed |= entry.mods.mask & !entry.preserve.mask;
                    }
                }
            }
        };

        consumed & !preserve
    }

    /// Test whether a modifier is consumed by keyboard state translation for a key.
    ///
    /// A modifier is consumed when all the real modifiers it is bound to are consumed.
    /// Returns `Ok(false)` for a keycode without a key.
    pub fn mod_index_is_consumed2(
        &self,
        kc: impl Into<RawKeycode>,
        idx: ModIndex,
        mode: ConsumedMode,
    ) -> Result<bool, ModIndexIsConsumedError> {
        let mapping = self
            .mod_mapping(idx)
            .ok_or(ModIndexIsConsumedError::NoSuchModIndex(idx))?;

        let Some(key) = self.keymap.xkb_key(kc.into()) else {
            return Ok(false);
        };

        let consumed = self.key_get_consumed(key, mode);

        Ok(mapping != 0 && (mapping & consumed) == mapping)
    }

    /// Same as [State::mod_index_is_consumed2()] with mode [ConsumedMode::Xkb]
    pub fn mod_index_is_consumed(
        &self,
        kc: impl Into<RawKeycode>,
        idx: ModIndex,
    ) -> Result<bool, ModIndexIsConsumedError> {
        self.mod_index_is_consumed2(kc, idx, ConsumedMode::Xkb)
    }

    /// Remove consumed modifiers from a modifier mask for a key.
    ///
    /// The mask is resolved to the modifiers its members are bound to, then the
    /// modifiers consumed by the key (in [ConsumedMode::Xkb] mode) are removed.
    pub fn mod_mask_remove_consumed(&self, kc: impl Into<RawKeycode>, mask: ModMask) -> ModMask {
        let Some(key) = self.keymap.xkb_key(kc.into()) else {
            return 0;
        };

        self.keymap.mods.mod_mask_get_effective(mask)
            & !self.key_get_consumed(key, ConsumedMode::Xkb)
    }

    /// Get the mask of modifiers consumed by translating a given key.
    ///
    /// # Arguments
    /// * `kc`: The keycode of the key
    /// * `mode`: The consumed modifiers mode to use
    ///
    /// # Output
    /// Returns a mask of the consumed modifiers.
    pub fn key_get_consumed_mods2(&self, kc: impl Into<RawKeycode>, mode: ConsumedMode) -> ModMask {
        let Some(key) = self.keymap.xkb_key(kc.into()) else {
            return 0;
        };

        self.key_get_consumed(key, mode)
    }

    /// Same as [State::key_get_consumed_mods2()] with mode [ConsumedMode::Xkb]
    pub fn key_get_consumed_mods(&self, kc: impl Into<RawKeycode>) -> ModMask {
        self.key_get_consumed_mods2(kc, ConsumedMode::Xkb)
    }
}
