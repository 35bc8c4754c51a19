use rm20::{split_address, Word};
use std::collections::hash_map::Entry;
use std::collections::HashMap;

/// A symbol defined by a source file.
///
/// For locally defined symbols `base_addr + offset` is the word address the
/// symbol denotes; external symbols keep both fields zero until load time.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Symbol {
    /// Address rounded down to the nearest multiple of 16.
    pub base_addr: Word,
    /// Address modulo 16.
    pub offset: Word,
    /// Declared with `.extern`.
    pub ext: bool,
}

impl Symbol {
    /// Word address denoted by the symbol.
    pub fn address(&self) -> Word {
        self.base_addr + self.offset
    }

    /// Sets the symbol's address, splitting it into base and offset.
    pub fn set_address(&mut self, addr: Word) {
        let (base_addr, offset) = split_address(addr);
        self.base_addr = base_addr;
        self.offset = offset;
    }
}

/// Labels mapped to their symbol records. Labels compare by exact string
/// equality; no case folding.
pub struct SymbolTable {
    symbols: HashMap<String, Symbol>,
}

impl SymbolTable {
    pub fn new() -> SymbolTable {
        SymbolTable {
            symbols: HashMap::new(),
        }
    }

    /// Inserts a fresh zeroed record under `label` and returns it for
    /// filling in, or `None` when the label is already defined. An existing
    /// record is never replaced.
    pub fn define(&mut self, label: &str) -> Option<&mut Symbol> {
        match self.symbols.entry(label.to_owned()) {
            Entry::Occupied(_) => None,
            Entry::Vacant(vacant) => Some(vacant.insert(Symbol::default())),
        }
    }

    pub fn find(&self, label: &str) -> Option<&Symbol> {
        self.symbols.get(label)
    }

    pub fn find_mut(&mut self, label: &str) -> Option<&mut Symbol> {
        self.symbols.get_mut(label)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn define_then_find() {
        let mut table = SymbolTable::new();

        let sym = table.define("LOOP").unwrap();
        sym.set_address(103);

        let found = table.find("LOOP").unwrap();
        assert_eq!(found.base_addr, 96);
        assert_eq!(found.offset, 7);
        assert_eq!(found.address(), 103);
    }

    #[test]
    fn define_refuses_duplicates() {
        let mut table = SymbolTable::new();

        table.define("X").unwrap().set_address(100);
        assert!(table.define("X").is_none());

        // The original record is untouched.
        assert_eq!(table.find("X").unwrap().address(), 100);
    }

    #[test]
    fn lookups_are_case_sensitive() {
        let mut table = SymbolTable::new();
        table.define("main").unwrap();

        assert!(table.find("main").is_some());
        assert!(table.find("MAIN").is_none());
    }
}
