use crate::value::SymbolId;
use std::collections::HashMap;

/// Interned symbol table. Each unique symbol name maps to a unique SymbolId.
/// `(eq? 'foo 'foo)` is true because both resolve to the same SymbolId.
pub struct SymbolTable {
    name_to_id: HashMap<String, SymbolId>,
    id_to_name: Vec<String>,
}

/// Well-known symbol IDs, pre-interned at startup.
/// These must match the order of interning in SymbolTable::new().
pub mod sym {
    use crate::value::SymbolId;

    pub const QUOTE: SymbolId = SymbolId(0);
    pub const IF: SymbolId = SymbolId(1);
    pub const BEGIN: SymbolId = SymbolId(2);
    pub const LAMBDA: SymbolId = SymbolId(3);
    pub const DEFINE: SymbolId = SymbolId(4);
    pub const SETQ: SymbolId = SymbolId(5);
    pub const CAR: SymbolId = SymbolId(6);
    pub const CDR: SymbolId = SymbolId(7);
    pub const CONS: SymbolId = SymbolId(8);
    pub const EQ: SymbolId = SymbolId(9);
    pub const PAIR_P: SymbolId = SymbolId(10);
    pub const NULL_P: SymbolId = SymbolId(11);
    pub const NOT: SymbolId = SymbolId(12);
    pub const LIST: SymbolId = SymbolId(13);
    pub const DISPLAY: SymbolId = SymbolId(14);
    pub const NEWLINE: SymbolId = SymbolId(15);
    pub const READ: SymbolId = SymbolId(16);
    pub const EOF_P: SymbolId = SymbolId(17);
    pub const SYMBOL_P: SymbolId = SymbolId(18);
    pub const CALLCC: SymbolId = SymbolId(19);
    pub const APPLY: SymbolId = SymbolId(20);
    pub const PLUS: SymbolId = SymbolId(21);
    pub const MINUS: SymbolId = SymbolId(22);
    pub const TIMES: SymbolId = SymbolId(23);
    pub const LESS: SymbolId = SymbolId(24);
    pub const EQUALS: SymbolId = SymbolId(25);
    pub const NUMBER_P: SymbolId = SymbolId(26);
    pub const ERROR: SymbolId = SymbolId(27);
    pub const GLOBALS: SymbolId = SymbolId(28);
}

impl SymbolTable {
    /// Create a new symbol table with all well-known symbols pre-interned.
    /// The order MUST match the constants in the `sym` module above.
    pub fn new() -> Self {
        let names = [
            "quote", "if", "begin", "lambda", "define", "set!",
            "car", "cdr", "cons", "eq?", "pair?", "null?", "not", "list",
            "display", "newline", "read", "eof-object?", "symbol?",
            "call/cc", "apply",
            "+", "-", "*", "<", "=",
            "number?", "error", "globals",
        ];

        let mut name_to_id = HashMap::new();
        let mut id_to_name = Vec::new();

        for (i, name) in names.iter().enumerate() {
            let id = SymbolId(i as u32);
            name_to_id.insert(name.to_string(), id);
            id_to_name.push(name.to_string());
        }

        SymbolTable {
            name_to_id,
            id_to_name,
        }
    }

    /// Intern a symbol name. Returns the existing ID if already interned,
    /// or creates a new one.
    pub fn intern(&mut self, name: &str) -> SymbolId {
        if let Some(&id) = self.name_to_id.get(name) {
            return id;
        }
        let id = SymbolId(self.id_to_name.len() as u32);
        self.name_to_id.insert(name.to_string(), id);
        self.id_to_name.push(name.to_string());
        id
    }

    /// Look up a symbol name by its ID.
    pub fn name(&self, id: SymbolId) -> &str {
        &self.id_to_name[id.0 as usize]
    }

    /// Look up a symbol ID by name, without interning.
    pub fn lookup(&self, name: &str) -> Option<SymbolId> {
        self.name_to_id.get(name).copied()
    }

    /// Total number of interned symbols.
    pub fn count(&self) -> usize {
        self.id_to_name.len()
    }
}

impl Default for SymbolTable {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::{sym, SymbolTable};

    #[test]
    fn interning_is_idempotent() {
        let mut table = SymbolTable::new();
        let a = table.intern("widget");
        let b = table.intern("widget");
        assert_eq!(a, b);
        assert_eq!(table.name(a), "widget");
    }

    #[test]
    fn well_known_ids_line_up() {
        let table = SymbolTable::new();
        assert_eq!(table.lookup("quote"), Some(sym::QUOTE));
        assert_eq!(table.lookup("set!"), Some(sym::SETQ));
        assert_eq!(table.lookup("call/cc"), Some(sym::CALLCC));
        assert_eq!(table.lookup("globals"), Some(sym::GLOBALS));
        assert_eq!(table.count(), 29);
    }
}
