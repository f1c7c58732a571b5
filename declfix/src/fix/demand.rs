//! Identifiers that must be imported, grouped by module.

use rustc_hash::FxHashMap;
use serde::Serialize;

/// Names one module must provide.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ModuleImports {
    /// Module specifier, exactly as it appeared in the reference.
    pub module: String,
    /// Imported names, in first-seen order, without duplicates.
    pub identifiers: Vec<String>,
}

/// Import requirements accumulated while applying one file's changes.
///
/// Modules are kept in first-seen order; that order is the order in which
/// import statements are emitted.
#[derive(Debug, Clone, Default)]
pub struct ImportDemand {
    modules: Vec<ModuleImports>,
    index: FxHashMap<String, usize>,
}

impl ImportDemand {
    /// Create an empty demand.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record that `identifier` must be imported from `module`.
    ///
    /// Returns `false` if the pair was already recorded.
    pub fn record(&mut self, module: &str, identifier: &str) -> bool {
        let slot = match self.index.get(module) {
            Some(&slot) => slot,
            None => {
                self.modules.push(ModuleImports {
                    module: module.to_owned(),
                    identifiers: Vec::new(),
                });
                self.index.insert(module.to_owned(), self.modules.len() - 1);
                self.modules.len() - 1
            }
        };
        let names = &mut self.modules[slot].identifiers;
        if names.iter().any(|name| name == identifier) {
            return false;
        }
        names.push(identifier.to_owned());
        true
    }

    /// True when nothing needs importing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }

    /// Number of distinct modules.
    #[must_use]
    pub fn module_count(&self) -> usize {
        self.modules.len()
    }

    /// Names recorded for `module`, if any.
    #[must_use]
    pub fn identifiers(&self, module: &str) -> Option<&[String]> {
        self.index
            .get(module)
            .map(|&slot| self.modules[slot].identifiers.as_slice())
    }

    /// Iterate modules in emission order.
    pub fn iter(&self) -> impl Iterator<Item = &ModuleImports> {
        self.modules.iter()
    }

    /// Consume the demand, yielding modules in emission order.
    #[must_use]
    pub fn into_modules(self) -> Vec<ModuleImports> {
        self.modules
    }
}
