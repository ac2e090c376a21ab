//! Thrift method registry.
//!
//! Methods keep their declaration order for listings; lookup is a direct
//! key lookup by method name.

use std::collections::{HashMap, HashSet};

use crate::error::RouterError;
use crate::filter::{FilterChain, SharedHandler};
use crate::thrift::{ThriftMethod, ThriftRequest, ThriftResponse};

/// Build-phase method collection.
#[derive(Default)]
pub struct MethodRegistry {
    methods: Vec<ThriftMethod>,
}

impl MethodRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, method: ThriftMethod) -> Result<(), RouterError> {
        if self.methods.iter().any(|m| m.name() == method.name()) {
            return Err(RouterError::DuplicateMethod {
                method: method.name().to_string(),
            });
        }
        tracing::debug!(method = %method.name(), "Thrift method registered");
        self.methods.push(method);
        Ok(())
    }

    /// Register every method of `methods`, or none of them if any name is
    /// already taken or repeated within the batch.
    pub fn register_all(&mut self, methods: Vec<ThriftMethod>) -> Result<(), RouterError> {
        let mut seen: HashSet<&str> = self.methods.iter().map(ThriftMethod::name).collect();
        if let Some(duplicate) = methods.iter().find(|m| !seen.insert(m.name())) {
            return Err(RouterError::DuplicateMethod {
                method: duplicate.name().to_string(),
            });
        }
        for method in methods {
            tracing::debug!(method = %method.name(), "Thrift method registered");
            self.methods.push(method);
        }
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.methods.len()
    }

    pub fn is_empty(&self) -> bool {
        self.methods.is_empty()
    }

    /// Compose every method as `outer → per-method → callback`.
    pub fn compile(self, outer: &FilterChain<ThriftRequest, ThriftResponse>) -> MethodTable {
        let mut names = Vec::with_capacity(self.methods.len());
        let mut entries = HashMap::with_capacity(self.methods.len());

        for method in self.methods {
            let (name, filters, callback) = method.into_parts();
            let composed = outer.clone().and_then(filters).compose(callback.clone());
            names.push(name.clone());
            entries.insert(name, CompiledMethod { composed, callback });
        }

        MethodTable { names, entries }
    }
}

struct CompiledMethod {
    composed: SharedHandler<ThriftRequest, ThriftResponse>,
    callback: SharedHandler<ThriftRequest, ThriftResponse>,
}

/// Immutable method-name → handler table.
pub struct MethodTable {
    names: Vec<String>,
    entries: HashMap<String, CompiledMethod>,
}

impl MethodTable {
    /// The composed handler for `method`, or its bare callback when
    /// `bypass_filters` is set.
    pub fn lookup(&self, method: &str, bypass_filters: bool) -> Option<&SharedHandler<ThriftRequest, ThriftResponse>> {
        self.entries.get(method).map(|entry| {
            if bypass_filters {
                &entry.callback
            } else {
                &entry.composed
            }
        })
    }

    /// Method names in declaration order.
    pub fn method_names(&self) -> &[String] {
        &self.names
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}
