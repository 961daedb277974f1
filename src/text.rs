// Name tables are matched case-insensitively.

use crate::atom::AtomTable;
use crate::keymap::{ActionType, ModSet, MOD_REAL_MASK_ALL};
use crate::rust_xkbcommon::*;
use crate::utils::set_bits;

pub(crate) fn lookup_key<'s, K, V, B>(
    tab: &'static phf::OrderedMap<B, V>,
    key: &'s str,
) -> Option<&'static V>
where
    K: Eq + Ord + phf::PhfHash + std::convert::From<&'s str>,
    B: phf_shared::PhfBorrow<K>,
{
    let key: K = key.into();
    tab.get(&key)
}

pub(crate) fn lookup_value<T, K, V>(
    tab: &phf::OrderedMap<K, T>,
    value: V,
    reverse: bool,
) -> Option<&'static str>
where
    T: PartialEq,
    K: Into<&'static str> + Copy,
    V: TryInto<T>,
{
    let value = match value.try_into() {
        Ok(value) => value,
        Err(_) => return None,
    };

    let mut entries = tab.entries();
    let found = if reverse {
        entries.rfind(|(_, entry_value)| **entry_value == value)
    } else {
        entries.find(|(_, entry_value)| **entry_value == value)
    };

    found.map(|(entry_name, _)| (*entry_name).into())
}

use unicase::UniCase;

// The first name of each component is the one used for display.
pub(crate) static STATE_COMPONENT_NAMES: phf::OrderedMap<UniCase<&'static str>, StateComponent> = phf::phf_ordered_map! {

        UniCase::ascii("ModsDepressed") => StateComponent::MODS_DEPRESSED,
        UniCase::ascii("ModsLatched") => StateComponent::MODS_LATCHED,
        UniCase::ascii("ModsLocked") => StateComponent::MODS_LOCKED,
        UniCase::ascii("ModsEffective") => StateComponent::MODS_EFFECTIVE,
        UniCase::ascii("LayoutDepressed") => StateComponent::LAYOUT_DEPRESSED,
        UniCase::ascii("LayoutLatched") => StateComponent::LAYOUT_LATCHED,
        UniCase::ascii("LayoutLocked") => StateComponent::LAYOUT_LOCKED,
        UniCase::ascii("LayoutEffective") => StateComponent::LAYOUT_EFFECTIVE,
        UniCase::ascii("Leds") => StateComponent::LEDS,

        UniCase::ascii("base") => StateComponent::MODS_DEPRESSED,
        UniCase::ascii("latched") => StateComponent::MODS_LATCHED,
        UniCase::ascii("locked") => StateComponent::MODS_LOCKED,
        UniCase::ascii("effective") => StateComponent::MODS_EFFECTIVE,

};

pub(crate) static ACTION_TYPE_NAMES: phf::OrderedMap<UniCase<&'static str>, ActionType> = phf::phf_ordered_map! {

        UniCase::ascii("NoAction") => ActionType::None,
        UniCase::ascii("SetMods") => ActionType::ModSet,
        UniCase::ascii("LatchMods") => ActionType::ModLatch,
        UniCase::ascii("LockMods") => ActionType::ModLock,
        UniCase::ascii("SetGroup") => ActionType::GroupSet,
        UniCase::ascii("LatchGroup") => ActionType::GroupLatch,
        UniCase::ascii("LockGroup") => ActionType::GroupLock,
};

impl ActionType {
    pub(crate) fn text(&self) -> &'static str {
        lookup_value(&ACTION_TYPE_NAMES, *self, false).unwrap_or("NoAction")
    }
}

pub(crate) fn mod_mask_text(mods: &ModSet, atoms: &AtomTable, mask: ModMask) -> String {
    if mask == 0 {
        return "none".into();
    }

    if mask == MOD_REAL_MASK_ALL {
        return "all".into();
    }

    set_bits(mask)
        .map(|i| {
            mods.mods
                .get(i)
                .and_then(|_mod| atoms.get(_mod.name))
                .unwrap_or("?")
        })
        .collect::<Vec<&str>>()
        .join("+")
}

pub(crate) fn component_mask_text(mask: StateComponent) -> String {
    if mask.is_empty() {
        return "0".into();
    }

    mask.iter()
        .filter_map(|component| lookup_value(&STATE_COMPONENT_NAMES, component, false))
        .collect::<Vec<&str>>()
        .join("+")
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::keymap::KeymapBuilder;

    #[test]
    fn test_component_mask_text() {
        assert_eq!(component_mask_text(StateComponent::empty()), "0");
        assert_eq!(
            component_mask_text(StateComponent::MODS_DEPRESSED | StateComponent::LEDS),
            "ModsDepressed+Leds"
        );
        assert_eq!(
            component_mask_text(StateComponent::all()),
            "ModsDepressed+ModsLatched+ModsLocked+ModsEffective+\
             LayoutDepressed+LayoutLatched+LayoutLocked+LayoutEffective+Leds"
        );
    }

    #[test]
    fn test_lookup_is_case_insensitive() {
        assert_eq!(
            lookup_key(&STATE_COMPONENT_NAMES, "modsLOCKED"),
            Some(&StateComponent::MODS_LOCKED)
        );
        assert_eq!(
            lookup_key(&STATE_COMPONENT_NAMES, "Effective"),
            Some(&StateComponent::MODS_EFFECTIVE)
        );
        assert_eq!(lookup_key(&STATE_COMPONENT_NAMES, "nope"), None);
        assert_eq!(
            lookup_value(&STATE_COMPONENT_NAMES, StateComponent::MODS_DEPRESSED, true),
            Some("base")
        );
    }

    #[test]
    fn test_action_type_text() {
        assert_eq!(ActionType::None.text(), "NoAction");
        assert_eq!(ActionType::GroupLatch.text(), "LatchGroup");
    }

    #[test]
    fn test_mod_mask_text() {
        let mut builder = KeymapBuilder::new();
        builder.add_layout("us").unwrap();
        builder.add_virtual_mod("NumLock", 0x10).unwrap();
        let keymap = builder.build().unwrap();

        assert_eq!(mod_mask_text(&keymap.mods, &keymap.atoms, 0), "none");
        assert_eq!(mod_mask_text(&keymap.mods, &keymap.atoms, 0xff), "all");
        assert_eq!(
            mod_mask_text(&keymap.mods, &keymap.atoms, 0b101),
            "Shift+Control"
        );
        assert_eq!(
            mod_mask_text(&keymap.mods, &keymap.atoms, 1 << 8),
            "NumLock"
        );
    }
}
