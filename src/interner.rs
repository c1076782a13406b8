//! Process-wide symbol interning. The table is created lazily on first use
//! and lives until the process exits; symbols are compared by id, so
//! environment keys and identity checks never look at the text. A mutex
//! guards the table for the benefit of multi-session embedders, although the
//! interpreter itself runs on a single thread.

use std::collections::HashMap;
use std::fmt;
use std::sync::Mutex;

/// An interned identifier. Two symbols spelled the same way are the same
/// symbol.
#[derive(Copy, Clone, PartialEq, Eq, Hash)]
pub struct Symbol(u32);

struct Table {
    names: Vec<&'static str>,
    ids: HashMap<&'static str, u32>,
}

lazy_static! {
    static ref TABLE: Mutex<Table> = Mutex::new(Table {
        names: Vec::new(),
        ids: HashMap::new(),
    });
}

impl Symbol {
    pub fn intern(name: &str) -> Symbol {
        let mut table = TABLE.lock().unwrap();
        if let Some(&id) = table.ids.get(name) {
            return Symbol(id);
        }
        let id = table.names.len() as u32;
        // Entries are never removed, so the text can simply be leaked.
        let stored: &'static str = Box::leak(name.to_owned().into_boxed_str());
        table.names.push(stored);
        table.ids.insert(stored, id);
        Symbol(id)
    }

    pub fn as_str(self) -> &'static str {
        TABLE.lock().unwrap().names[self.0 as usize]
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Debug for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Symbol({})", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn equal_text_is_the_same_symbol() {
        assert_eq!(Symbol::intern("甲"), Symbol::intern("甲"));
    }

    #[test]
    fn distinct_text_gets_distinct_symbols() {
        assert_ne!(Symbol::intern("甲"), Symbol::intern("乙"));
    }

    #[test]
    fn resolves_back_to_its_text() {
        assert_eq!(Symbol::intern("情况符合").as_str(), "情况符合");
    }

    #[test]
    fn interning_is_case_sensitive() {
        assert_ne!(Symbol::intern("abc"), Symbol::intern("Abc"));
    }
}
