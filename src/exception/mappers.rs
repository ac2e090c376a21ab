//! Exception mapper registry.
//!
//! # Responsibilities
//! - Collect `(exception type → mapper)` registrations during the build phase
//! - Resolve a failure to the mapper of its nearest registered ancestor
//! - Fall back to the mandatory default mapper
//!
//! # Design Decisions
//! - `ExceptionMappers` is the mutable build-phase registry; `ExceptionResolver`
//!   is the immutable runtime view and can only exist with a default mapper
//! - Resolution results are cached per concrete type (`DashMap`), so repeated
//!   failures of one type skip the lineage walk

use std::any::TypeId;
use std::collections::HashMap;
use std::sync::Arc;

use dashmap::DashMap;

use crate::error::RouterError;
use crate::exception::{Exception, ExceptionType, Failure};

/// Converts a failure into a response.
pub trait ExceptionMapper<Rep>: Send + Sync + 'static {
    fn to_response(&self, failure: &Failure) -> Rep;
}

impl<Rep, F> ExceptionMapper<Rep> for F
where
    F: Fn(&Failure) -> Rep + Send + Sync + 'static,
{
    fn to_response(&self, failure: &Failure) -> Rep {
        (self)(failure)
    }
}

type SharedMapper<Rep> = Arc<dyn ExceptionMapper<Rep>>;

/// Build-phase registry of exception mappers.
pub struct ExceptionMappers<Rep> {
    mappers: HashMap<TypeId, (ExceptionType, SharedMapper<Rep>)>,
    default: Option<SharedMapper<Rep>>,
}

impl<Rep: 'static> ExceptionMappers<Rep> {
    pub fn new() -> Self {
        Self {
            mappers: HashMap::new(),
            default: None,
        }
    }

    /// Register `mapper` for `E` and, through lineage, for types deriving from it.
    /// A later registration for the same type replaces the earlier one.
    pub fn register<E, M>(&mut self, mapper: M)
    where
        E: Exception,
        M: ExceptionMapper<Rep>,
    {
        let exception_type = ExceptionType::of::<E>();
        if self
            .mappers
            .insert(exception_type.id(), (exception_type, Arc::new(mapper)))
            .is_some()
        {
            tracing::debug!(exception = exception_type.name(), "Replacing exception mapper");
        }
    }

    /// Register the catch-all mapper.
    pub fn register_default<M: ExceptionMapper<Rep>>(&mut self, mapper: M) {
        self.default = Some(Arc::new(mapper));
    }

    pub fn has_default(&self) -> bool {
        self.default.is_some()
    }

    pub fn len(&self) -> usize {
        self.mappers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mappers.is_empty()
    }

    /// Produce the immutable runtime view.
    pub fn build(&self) -> Result<ExceptionResolver<Rep>, RouterError> {
        let default = self.default.clone().ok_or(RouterError::MissingDefaultMapper)?;
        Ok(ExceptionResolver {
            mappers: self
                .mappers
                .iter()
                .map(|(id, (_, mapper))| (*id, mapper.clone()))
                .collect(),
            default,
            resolved: DashMap::new(),
        })
    }
}

impl<Rep: 'static> Default for ExceptionMappers<Rep> {
    fn default() -> Self {
        Self::new()
    }
}

/// Immutable exception mapping table used while dispatching.
pub struct ExceptionResolver<Rep> {
    mappers: HashMap<TypeId, SharedMapper<Rep>>,
    default: SharedMapper<Rep>,
    resolved: DashMap<TypeId, SharedMapper<Rep>>,
}

impl<Rep: 'static> ExceptionResolver<Rep> {
    /// Map `failure` with its nearest registered mapper.
    pub fn resolve(&self, failure: &Failure) -> Rep {
        self.mapper_for(failure).to_response(failure)
    }

    fn mapper_for(&self, failure: &Failure) -> SharedMapper<Rep> {
        let Some(concrete) = failure.exception_type() else {
            return self.default.clone();
        };

        if let Some(cached) = self.resolved.get(&concrete.id()) {
            return cached.clone();
        }

        let mapper = failure
            .lineage()
            .iter()
            .find_map(|t| self.mappers.get(&t.id()))
            .cloned()
            .unwrap_or_else(|| self.default.clone());

        self.resolved.insert(concrete.id(), mapper.clone());
        mapper
    }
}
