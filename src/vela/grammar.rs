//! Compiled grammar tables and their cache.
//!
//! The parser itself is code, but two derived tables drive it: the
//! keyword table (which names the lexer must reclassify) and the binding
//! operator table (which maps the five binding spellings to their stable
//! binding-kind identifiers). Both are built once into an immutable
//! [`Grammar`] value that is shared read-only across parses.
//!
//! A [`GrammarCache`] may be supplied to persist the built table between
//! processes. Population is at-least-once and race-safe: writers stage
//! the payload in a temp file and rename it into place, and any
//! unreadable, corrupt, or version-mismatched payload falls back to an
//! in-memory rebuild. A loaded table is byte-for-byte the same as a
//! freshly built one.

use std::collections::BTreeMap;
use std::fs;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

use crate::vela::token::TokenKind;

/// Bumped whenever the token set or the tables change shape; a cache
/// payload from another version is ignored.
pub const GRAMMAR_VERSION: u32 = 1;

/// The five binding operators of the declarative syntax.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BindingOperator {
    /// `=` — default value
    Assign,
    /// `:=` — delegation
    ColonEqual,
    /// `<<` — subscribe
    LeftShift,
    /// `>>` — notify
    RightShift,
    /// `::` — exec block
    DoubleColon,
}

impl BindingOperator {
    /// The operator as written in source.
    pub fn symbol(self) -> &'static str {
        match self {
            BindingOperator::Assign => "=",
            BindingOperator::ColonEqual => ":=",
            BindingOperator::LeftShift => "<<",
            BindingOperator::RightShift => ">>",
            BindingOperator::DoubleColon => "::",
        }
    }

    /// Map a binding-operator token kind to the operator, if it is one.
    pub fn from_token(kind: TokenKind) -> Option<BindingOperator> {
        match kind {
            TokenKind::Assign => Some(BindingOperator::Assign),
            TokenKind::ColonEqual => Some(BindingOperator::ColonEqual),
            TokenKind::LeftShift => Some(BindingOperator::LeftShift),
            TokenKind::RightShift => Some(BindingOperator::RightShift),
            TokenKind::DoubleColon => Some(BindingOperator::DoubleColon),
            _ => None,
        }
    }

    pub const ALL: [BindingOperator; 5] = [
        BindingOperator::Assign,
        BindingOperator::ColonEqual,
        BindingOperator::LeftShift,
        BindingOperator::RightShift,
        BindingOperator::DoubleColon,
    ];
}

/// Translate an operator spelling into its binding-kind identifier:
/// each character maps to a name fragment and the fragments concatenate
/// into `__operator_<Names>__`.
fn translate_operator(symbol: &str) -> String {
    let name: String = symbol
        .chars()
        .filter_map(|ch| match ch {
            '=' => Some("Equal"),
            '<' => Some("Less"),
            '>' => Some("Greater"),
            ':' => Some("Colon"),
            _ => None,
        })
        .collect();
    format!("__operator_{}__", name)
}

/// One translated identifier per binding operator. Fixed fields rather
/// than a map: an operator outside this set is unrepresentable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BindingTable {
    equal: String,
    colon_equal: String,
    left_shift: String,
    right_shift: String,
    double_colon: String,
}

impl BindingTable {
    fn build() -> Self {
        BindingTable {
            equal: translate_operator(BindingOperator::Assign.symbol()),
            colon_equal: translate_operator(BindingOperator::ColonEqual.symbol()),
            left_shift: translate_operator(BindingOperator::LeftShift.symbol()),
            right_shift: translate_operator(BindingOperator::RightShift.symbol()),
            double_colon: translate_operator(BindingOperator::DoubleColon.symbol()),
        }
    }

    fn identifier(&self, op: BindingOperator) -> &str {
        match op {
            BindingOperator::Assign => &self.equal,
            BindingOperator::ColonEqual => &self.colon_equal,
            BindingOperator::LeftShift => &self.left_shift,
            BindingOperator::RightShift => &self.right_shift,
            BindingOperator::DoubleColon => &self.double_colon,
        }
    }
}

/// The immutable grammar tables shared by the lexer and parser.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Grammar {
    pub version: u32,
    keywords: BTreeMap<String, TokenKind>,
    bindings: BindingTable,
}

impl Grammar {
    /// Build the tables from scratch.
    pub fn build() -> Grammar {
        let mut keywords = BTreeMap::new();
        let entries: [(&str, TokenKind); 13] = [
            ("and", TokenKind::And),
            ("or", TokenKind::Or),
            ("not", TokenKind::Not),
            ("in", TokenKind::In),
            ("is", TokenKind::Is),
            ("if", TokenKind::If),
            ("else", TokenKind::Else),
            ("for", TokenKind::For),
            ("lambda", TokenKind::Lambda),
            ("import", TokenKind::Import),
            ("from", TokenKind::From),
            ("as", TokenKind::As),
            ("pass", TokenKind::Pass),
        ];
        for (word, kind) in entries {
            keywords.insert(word.to_string(), kind);
        }
        Grammar {
            version: GRAMMAR_VERSION,
            keywords,
            bindings: BindingTable::build(),
        }
    }

    /// Load the tables from a cache, or build (and best-effort persist)
    /// them when the cache has nothing usable.
    pub fn load_or_build(cache: &dyn GrammarCache) -> Grammar {
        if let Some(payload) = cache.load() {
            if let Ok(grammar) = serde_json::from_str::<Grammar>(&payload) {
                if grammar.version == GRAMMAR_VERSION {
                    return grammar;
                }
            }
        }
        let grammar = Grammar::build();
        if let Ok(payload) = serde_json::to_string_pretty(&grammar) {
            cache.store(&payload);
        }
        grammar
    }

    /// The process-wide shared tables, built on first use.
    pub fn shared() -> Arc<Grammar> {
        static SHARED: Lazy<Arc<Grammar>> = Lazy::new(|| Arc::new(Grammar::build()));
        Arc::clone(&SHARED)
    }

    /// Reclassify a name as a keyword token kind, if it is one.
    pub fn keyword(&self, name: &str) -> Option<TokenKind> {
        self.keywords.get(name).copied()
    }

    /// The stable binding-kind identifier for a binding operator.
    pub fn binding_identifier(&self, op: BindingOperator) -> &str {
        self.bindings.identifier(op)
    }
}

/// Storage for a serialized grammar table.
///
/// Implementations are free to fail silently: the grammar is always
/// rebuildable in memory, so `load` returning `None` (or garbage) and
/// `store` doing nothing are both acceptable.
pub trait GrammarCache {
    fn load(&self) -> Option<String>;
    fn store(&self, payload: &str);
}

/// A cache that never hits; every process rebuilds in memory.
#[derive(Debug, Default)]
pub struct NullCache;

impl GrammarCache for NullCache {
    fn load(&self) -> Option<String> {
        None
    }

    fn store(&self, _payload: &str) {}
}

/// Filesystem cache keyed by grammar version inside a directory.
///
/// Writes stage the payload next to the final path and rename it into
/// place, so concurrent first-use populations race benignly: whichever
/// writer wins, the file content is identical, and a reader that sees no
/// usable file simply rebuilds.
#[derive(Debug, Clone)]
pub struct DirCache {
    dir: PathBuf,
}

impl DirCache {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        DirCache { dir: dir.into() }
    }

    fn table_path(&self) -> PathBuf {
        self.dir.join(format!("grammar_v{}.json", GRAMMAR_VERSION))
    }
}

impl GrammarCache for DirCache {
    fn load(&self) -> Option<String> {
        fs::read_to_string(self.table_path()).ok()
    }

    fn store(&self, payload: &str) {
        static STAGE: AtomicUsize = AtomicUsize::new(0);

        if fs::create_dir_all(&self.dir).is_err() {
            return;
        }
        let staged = self.dir.join(format!(
            "grammar_v{}.json.{}.{}",
            GRAMMAR_VERSION,
            std::process::id(),
            STAGE.fetch_add(1, Ordering::Relaxed)
        ));
        if fs::write(&staged, payload).is_ok() {
            let _ = fs::rename(&staged, self.table_path());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    #[test]
    fn operator_translation_matches_the_char_table() {
        assert_eq!(translate_operator("="), "__operator_Equal__");
        assert_eq!(translate_operator(":="), "__operator_ColonEqual__");
        assert_eq!(translate_operator("<<"), "__operator_LessLess__");
        assert_eq!(translate_operator(">>"), "__operator_GreaterGreater__");
        assert_eq!(translate_operator("::"), "__operator_ColonColon__");
    }

    #[test]
    fn binding_identifiers_are_distinct_and_stable() {
        let grammar = Grammar::build();
        let idents: BTreeSet<&str> = BindingOperator::ALL
            .iter()
            .map(|&op| grammar.binding_identifier(op))
            .collect();
        assert_eq!(idents.len(), 5);
        assert_eq!(
            grammar.binding_identifier(BindingOperator::Assign),
            "__operator_Equal__"
        );
        assert_eq!(
            grammar.binding_identifier(BindingOperator::DoubleColon),
            "__operator_ColonColon__"
        );
    }

    #[test]
    fn keyword_table_covers_the_reserved_words() {
        let grammar = Grammar::build();
        assert_eq!(grammar.keyword("lambda"), Some(TokenKind::Lambda));
        assert_eq!(grammar.keyword("pass"), Some(TokenKind::Pass));
        assert_eq!(grammar.keyword("attr"), None);
        assert_eq!(grammar.keyword("event"), None);
        assert_eq!(grammar.keyword("id"), None);
    }

    #[test]
    fn loaded_table_parses_identically_to_built() {
        let dir = tempfile::tempdir().unwrap();
        let cache = DirCache::new(dir.path());

        let built = Grammar::load_or_build(&cache);
        let loaded = Grammar::load_or_build(&cache);
        assert_eq!(built, loaded);
        assert!(cache.table_path().exists());
    }

    #[test]
    fn corrupt_cache_falls_back_to_rebuild() {
        let dir = tempfile::tempdir().unwrap();
        let cache = DirCache::new(dir.path());
        fs::create_dir_all(dir.path()).unwrap();
        fs::write(cache.table_path(), "{not json").unwrap();

        let grammar = Grammar::load_or_build(&cache);
        assert_eq!(grammar, Grammar::build());
    }

    #[test]
    fn null_cache_always_rebuilds() {
        let grammar = Grammar::load_or_build(&NullCache);
        assert_eq!(grammar, Grammar::build());
    }
}
