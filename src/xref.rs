use std::collections::BTreeMap;

/// One object table entry (`spec.md` §3 "Object table"). `Free`'s payload is the
/// next-free object number, forming the classical free-list chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum XrefEntry {
    Free { next_free: u32, generation: u16 },
    InUse { offset: u32, generation: u16 },
    Compressed { container: u32, index: u32 },
}

/// Ordered-by-object-number registry of `XrefEntry`, indexed by `major`
/// (`spec.md` §3). Built incrementally while chasing `/Prev`, newest first.
#[derive(Debug, Clone, Default)]
pub struct XrefTable {
    pub entries: BTreeMap<u32, XrefEntry>,
    pub size: u32,
}

impl XrefTable {
    pub fn new() -> Self {
        let mut entries = BTreeMap::new();
        entries.insert(0, XrefEntry::Free { next_free: 0, generation: 65535 });
        XrefTable { entries, size: 1 }
    }

    pub fn get(&self, id: u32) -> Option<&XrefEntry> {
        self.entries.get(&id)
    }

    /// Inserts an entry only if no newer xref section already claimed this id —
    /// `spec.md` §4.3: "An entry already set by a newer ... xref takes precedence".
    pub fn insert_if_absent(&mut self, id: u32, entry: XrefEntry) {
        self.entries.entry(id).or_insert(entry);
    }

    pub fn force_insert(&mut self, id: u32, entry: XrefEntry) {
        self.entries.insert(id, entry);
    }

    /// Merges an older (`/Prev`-chained) table into `self`; `self`'s entries win.
    pub fn merge_older(&mut self, older: XrefTable) {
        for (id, entry) in older.entries {
            self.insert_if_absent(id, entry);
        }
        self.size = self.size.max(older.size);
    }

    pub fn max_id(&self) -> u32 {
        self.entries.keys().next_back().copied().unwrap_or(0)
    }

    pub fn ensure_entry_zero_free(&mut self) {
        match self.entries.get(&0) {
            Some(XrefEntry::Free { generation: 65535, .. }) => {}
            _ => {
                self.entries.insert(0, XrefEntry::Free { next_free: 0, generation: 65535 });
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn newer_entry_wins_on_merge() {
        let mut newer = XrefTable::new();
        newer.force_insert(5, XrefEntry::InUse { offset: 100, generation: 0 });

        let mut older = XrefTable::new();
        older.force_insert(5, XrefEntry::InUse { offset: 999, generation: 0 });
        older.force_insert(6, XrefEntry::InUse { offset: 200, generation: 0 });

        newer.merge_older(older);
        assert_eq!(newer.get(5), Some(&XrefEntry::InUse { offset: 100, generation: 0 }));
        assert_eq!(newer.get(6), Some(&XrefEntry::InUse { offset: 200, generation: 0 }));
    }

    #[test]
    fn entry_zero_is_always_free_65535() {
        let table = XrefTable::new();
        assert_eq!(table.get(0), Some(&XrefEntry::Free { next_free: 0, generation: 65535 }));
    }
}
