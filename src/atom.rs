/*
 * Copyright © 2009 Dan Nicholson
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
 */

//! Interning of the names found in a keymap: modifiers, layouts, key types,
//! key names and LEDs. Every name is stored once; lookups by name go
//! through the table instead of comparing strings per entry.

pub(crate) type Atom = usize;

use indexmap::IndexSet;

#[derive(Clone, Debug, Default)]
pub(crate) struct AtomTable {
    table: IndexSet<String>,
}

impl AtomTable {
    pub(crate) fn new() -> Self {
        Self {
            table: IndexSet::new(),
        }
    }

    pub(crate) fn atom_lookup(&self, string: &str) -> Option<Atom> {
        self.table.get_index_of(string)
    }

    pub(crate) fn intern(&mut self, string: &str) -> Atom {
        if let Some(existing_atom) = self.table.get_index_of(string) {
            return existing_atom;
        }

        let (atom, _) = self.table.insert_full(string.to_owned());

        atom
    }

    pub(crate) fn get(&self, atom: Atom) -> Option<&str> {
        self.table.get_index(atom).map(|s| s.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_intern_is_stable() {
        let mut table = AtomTable::new();

        let shift = table.intern("Shift");
        let lock = table.intern("Lock");
        assert_ne!(shift, lock);
        assert_eq!(table.intern("Shift"), shift);

        assert_eq!(table.atom_lookup("Lock"), Some(lock));
        assert_eq!(table.atom_lookup("lock"), None);
        assert_eq!(table.get(shift), Some("Shift"));
        assert_eq!(table.get(lock + 1), None);
    }
}
