/*!
# Tracer - Two-Phase Transform Engine

Rewrites a corpus of source files line by line with an ordered rule set.

## Overview

The engine runs in two strictly ordered phases:

1. **Indexing**: every file of the manifest is fed to an [`Indexer`], which
   records the declarations it finds in a [`DeclarationIndex`].
2. **Rewriting**: [`Indexer::finish`] consumes the indexer and yields a
   [`Rewriter`] that owns the now frozen index and rewrites each file.

Because the rewriter can only be obtained by consuming the indexer, no file is
rewritten before the whole corpus has been indexed, and the index cannot be
changed once rewriting starts.

## Example Usage

```rust
use shiftline_core::tracer::Indexer;
use shiftline_core::{ApplyMode, RewriteRule};

let mut indexer = Indexer::new();
indexer.index_file("Model.kt".as_ref(), &["class Foo".to_string()]);

let rules = vec![RewriteRule::new("Foo", "Bar", ApplyMode::All)];
let mut rewriter = indexer.finish(rules, true);
let out = rewriter.rewrite(&["val f: Foo = FooFactory()".to_string()]).unwrap();
assert_eq!(out, vec!["val f: Bar = FooFactory()".to_string()]);
```
*/

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::Serialize;

pub mod engine;
pub mod scanner;

pub use engine::{Indexer, MatchStrategy, Rewriter, RuleStats};
pub use scanner::DeclarationScanner;

/// Internal engine failures; these abort the whole run
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    #[error("declaration '{name}' required by rule #{rule} is missing from the index")]
    MissingDeclaration { name: String, rule: usize },
}

/// What kind of construct introduced a name
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum DeclarationKind {
    Class,
    DataClass,
    EnumClass,
    Interface,
    Object,
    Function,
    Property,
    TypeAlias,
}

/// Where a name was first declared
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Declaration {
    pub name: String,
    pub kind: DeclarationKind,
    pub file: PathBuf,
    /// 1-based line number
    pub line: usize,
}

/// Corpus-wide declarations, keyed by name
///
/// The first declaration in manifest order wins; later ones only bump the
/// redeclaration counter.
#[derive(Debug, Clone, Default, Serialize)]
pub struct DeclarationIndex {
    declarations: BTreeMap<String, Declaration>,
    redeclarations: usize,
}

impl DeclarationIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn insert(&mut self, declaration: Declaration) {
        if self.declarations.contains_key(&declaration.name) {
            self.redeclarations += 1;
        } else {
            self.declarations.insert(declaration.name.clone(), declaration);
        }
    }

    pub fn get(&self, name: &str) -> Option<&Declaration> {
        self.declarations.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.declarations.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.declarations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.declarations.is_empty()
    }

    /// Number of declarations that reused an already indexed name
    pub fn redeclarations(&self) -> usize {
        self.redeclarations
    }
}
