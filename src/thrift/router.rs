//! Thrift router façade.
//!
//! # State Machine
//! ```text
//! Building ──freeze()──▶ Frozen
//!   filter:          Building, before the controller
//!   exception_mapper: Building
//!   add_controller:  Building, at most once
//! ```
//!
//! # Design Decisions
//! - Every global filter wraps every method, so filters must all be added
//!   before the controller
//! - No mappers are pre-registered; a default mapper is required to freeze
//! - A controller is bound all or nothing: a rejected controller leaves no
//!   methods behind
//! - Failures are mapped twice: once inside the global filters, so they see
//!   the mapped reply, and once outermost for failures the filters raise

use std::sync::Arc;

use futures_util::future::{self, BoxFuture, FutureExt};

use crate::error::{DispatchError, RouterError};
use crate::exception::{Exception, ExceptionMapper, ExceptionMappers};
use crate::filter::{ExceptionMappingFilter, Filter, FilterChain};
use crate::observability::metrics;
use crate::thrift::registry::{MethodRegistry, MethodTable};
use crate::thrift::{ThriftController, ThriftRequest, ThriftResponse};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BuildState {
    Building,
    Frozen,
}

/// Mutable build phase of a Thrift router.
pub struct ThriftRouterBuilder {
    state: BuildState,
    filters: FilterChain<ThriftRequest, ThriftResponse>,
    mappers: ExceptionMappers<ThriftResponse>,
    controller: Option<String>,
    registry: MethodRegistry,
}

impl ThriftRouterBuilder {
    pub fn new() -> Self {
        Self {
            state: BuildState::Building,
            filters: FilterChain::identity(),
            mappers: ExceptionMappers::new(),
            controller: None,
            registry: MethodRegistry::new(),
        }
    }

    fn ensure_building(&self) -> Result<(), RouterError> {
        match self.state {
            BuildState::Building => Ok(()),
            BuildState::Frozen => Err(RouterError::Frozen),
        }
    }

    pub fn is_frozen(&self) -> bool {
        self.state == BuildState::Frozen
    }

    /// Add a global filter. Fails once a controller has been added.
    pub fn filter<F: Filter<ThriftRequest, ThriftResponse>>(&mut self, filter: F) -> Result<&mut Self, RouterError> {
        self.ensure_building()?;
        if let Some(controller) = &self.controller {
            return Err(RouterError::FilterAfterController {
                controller: controller.clone(),
            });
        }
        self.filters = std::mem::take(&mut self.filters).with(filter);
        Ok(self)
    }

    pub fn exception_mapper<E, M>(&mut self, mapper: M) -> Result<&mut Self, RouterError>
    where
        E: Exception,
        M: ExceptionMapper<ThriftResponse>,
    {
        self.ensure_building()?;
        self.mappers.register::<E, M>(mapper);
        Ok(self)
    }

    pub fn default_exception_mapper<M: ExceptionMapper<ThriftResponse>>(
        &mut self,
        mapper: M,
    ) -> Result<&mut Self, RouterError> {
        self.ensure_building()?;
        self.mappers.register_default(mapper);
        Ok(self)
    }

    /// Bind the service. A router serves exactly one controller.
    pub fn add_controller<C: ThriftController>(&mut self, controller: C) -> Result<&mut Self, RouterError> {
        self.ensure_building()?;
        let name = controller.service_name().to_string();
        if let Some(existing) = &self.controller {
            return Err(RouterError::MultipleControllers {
                existing: existing.clone(),
                rejected: name,
            });
        }

        let methods = Arc::new(controller).methods();
        if methods.is_empty() {
            tracing::warn!(controller = %name, "Thrift controller declares no methods");
        }
        self.registry.register_all(methods)?;

        tracing::info!(controller = %name, methods = self.registry.len(), "Thrift controller added");
        self.controller = Some(name);
        Ok(self)
    }

    pub fn freeze(&mut self) -> Result<ThriftRouter, RouterError> {
        self.ensure_building()?;
        let resolver = Arc::new(self.mappers.build()?);
        self.state = BuildState::Frozen;

        let outer = FilterChain::of(ExceptionMappingFilter::new(resolver.clone()))
            .and_then(std::mem::take(&mut self.filters))
            .with(ExceptionMappingFilter::new(resolver));
        let table = std::mem::take(&mut self.registry).compile(&outer);

        if self.controller.is_none() {
            tracing::warn!("Thrift router frozen without a controller");
        }
        tracing::info!(methods = table.len(), "Thrift router frozen");

        Ok(ThriftRouter {
            service: self.controller.clone(),
            table: Arc::new(table),
        })
    }
}

impl Default for ThriftRouterBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Frozen Thrift dispatch table.
#[derive(Clone)]
pub struct ThriftRouter {
    service: Option<String>,
    table: Arc<MethodTable>,
}

impl ThriftRouter {
    pub fn builder() -> ThriftRouterBuilder {
        ThriftRouterBuilder::new()
    }

    /// Name of the bound service, if any.
    pub fn service_name(&self) -> Option<&str> {
        self.service.as_deref()
    }

    pub fn method_names(&self) -> &[String] {
        self.table.method_names()
    }

    pub fn dispatch(&self, request: ThriftRequest) -> BoxFuture<'static, Result<ThriftResponse, DispatchError>> {
        self.dispatch_with(request, false)
    }

    /// Dispatch, optionally calling the method callback directly with no filters.
    pub fn dispatch_with(
        &self,
        request: ThriftRequest,
        bypass_filters: bool,
    ) -> BoxFuture<'static, Result<ThriftResponse, DispatchError>> {
        let Some(handler) = self.table.lookup(&request.method, bypass_filters) else {
            tracing::debug!(method = %request.method, "No Thrift method matched");
            metrics::record_method_not_found();
            return future::ready(Err(DispatchError::MethodNotFound { method: request.method })).boxed();
        };

        let handler = handler.clone();
        async move { handler.call(request).await.map_err(DispatchError::Unhandled) }.boxed()
    }
}

impl std::fmt::Debug for ThriftRouter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ThriftRouter")
            .field("service", &self.service)
            .field("methods", &self.table.len())
            .finish()
    }
}
