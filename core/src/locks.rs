//! Per-scope mutual exclusion for schedule generation.
//!
//! Two generations for the same scope never interleave; different scopes
//! proceed in parallel. Each scope gets its own lock, created on first use.

use crate::types::ScopeId;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

#[derive(Debug, Default)]
pub struct ScopeLocks {
    scopes: Mutex<HashMap<ScopeId, Arc<Mutex<()>>>>,
}

impl ScopeLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `f` while holding the lock for `scope`.
    pub fn with_scope<T>(&self, scope: &str, f: impl FnOnce() -> T) -> T {
        let lock = {
            let mut scopes = self.scopes.lock().unwrap_or_else(PoisonError::into_inner);
            Arc::clone(scopes.entry(scope.to_string()).or_default())
        };
        // A panicked generation left no partial state behind; the lock is still usable.
        let _guard = lock.lock().unwrap_or_else(PoisonError::into_inner);
        f()
    }

    pub fn known_scopes(&self) -> usize {
        self.scopes.lock().unwrap_or_else(PoisonError::into_inner).len()
    }
}
