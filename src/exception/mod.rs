//! Failure values and exception-to-response mapping.
//!
//! # Data Flow
//! ```text
//! Handler / filter returns Err(Failure)
//!     → Failure carries its exception lineage (concrete type first)
//!     → mappers.rs (ExceptionResolver) walks the lineage
//!     → nearest registered mapper, else the default mapper
//!     → typed response
//! ```
//!
//! # Design Decisions
//! - Lineage is declared per type through `Exception::supertype`, captured
//!   once when the `Failure` is built
//! - Plain boxed errors carry no lineage and always hit the default mapper
//! - The default mapper is mandatory: a resolver cannot be built without it

pub mod http;
pub mod mappers;

use std::any::TypeId;
use std::error::Error as StdError;
use std::fmt;

pub use self::http::HttpException;
pub use self::mappers::{ExceptionMapper, ExceptionMappers, ExceptionResolver};

/// Boxed error used for failures with no declared exception lineage.
pub type BoxError = Box<dyn StdError + Send + Sync + 'static>;

/// Upper bound on lineage length; guards against cyclic `supertype` chains.
const MAX_LINEAGE_DEPTH: usize = 32;

/// An error type that takes part in exception mapping.
///
/// Implementors may name a less specific exception type. Mappers registered
/// for that type (or any of its own supertypes) apply when no mapper is
/// registered for the implementor itself.
///
/// ```
/// use request_router::exception::{Exception, ExceptionType};
///
/// #[derive(Debug, thiserror::Error)]
/// #[error("storage unavailable")]
/// struct StorageError;
/// impl Exception for StorageError {}
///
/// #[derive(Debug, thiserror::Error)]
/// #[error("replica lagging")]
/// struct ReplicaLag;
/// impl Exception for ReplicaLag {
///     fn supertype() -> Option<ExceptionType> {
///         Some(ExceptionType::of::<StorageError>())
///     }
/// }
/// ```
pub trait Exception: StdError + Send + Sync + 'static {
    /// The next less specific exception type, if any.
    fn supertype() -> Option<ExceptionType>
    where
        Self: Sized,
    {
        None
    }
}

/// Runtime descriptor of an `Exception` type.
#[derive(Clone, Copy)]
pub struct ExceptionType {
    id: TypeId,
    name: &'static str,
    supertype: fn() -> Option<ExceptionType>,
}

impl ExceptionType {
    /// Descriptor for `E`.
    pub fn of<E: Exception>() -> Self {
        Self {
            id: TypeId::of::<E>(),
            name: std::any::type_name::<E>(),
            supertype: <E as Exception>::supertype,
        }
    }

    pub fn id(&self) -> TypeId {
        self.id
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// This type followed by its supertypes, most specific first.
    pub fn lineage(self) -> Vec<ExceptionType> {
        let mut lineage = vec![self];
        let mut current = self;
        while let Some(parent) = (current.supertype)() {
            if lineage.len() >= MAX_LINEAGE_DEPTH || lineage.contains(&parent) {
                tracing::warn!(
                    exception = self.name,
                    "Exception lineage is cyclic or too deep; truncating"
                );
                break;
            }
            lineage.push(parent);
            current = parent;
        }
        lineage
    }
}

impl PartialEq for ExceptionType {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for ExceptionType {}

impl fmt::Debug for ExceptionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

/// A failure raised by a handler or filter.
///
/// Transparent over the wrapped error: `Display` and `source` both forward to
/// it, so an error chain reads the same with or without the wrapper.
pub struct Failure {
    error: BoxError,
    lineage: Vec<ExceptionType>,
}

impl Failure {
    /// Wrap an exception, capturing its lineage.
    pub fn new<E: Exception>(error: E) -> Self {
        Self {
            lineage: ExceptionType::of::<E>().lineage(),
            error: Box::new(error),
        }
    }

    /// Wrap an arbitrary error. It resolves only to the default mapper.
    pub fn from_boxed(error: BoxError) -> Self {
        Self {
            error,
            lineage: Vec::new(),
        }
    }

    /// Build a lineage-free failure from a message.
    pub fn msg(message: impl Into<String>) -> Self {
        let message: String = message.into();
        Self::from_boxed(message.into())
    }

    /// Exception lineage, most specific first. Empty for plain errors.
    pub fn lineage(&self) -> &[ExceptionType] {
        &self.lineage
    }

    /// The concrete exception type, when one was declared.
    pub fn exception_type(&self) -> Option<ExceptionType> {
        self.lineage.first().copied()
    }

    pub fn downcast_ref<E: StdError + 'static>(&self) -> Option<&E> {
        self.error.downcast_ref::<E>()
    }

    pub fn is<E: StdError + 'static>(&self) -> bool {
        self.error.is::<E>()
    }

    pub fn into_inner(self) -> BoxError {
        self.error
    }
}

impl<E: Exception> From<E> for Failure {
    fn from(error: E) -> Self {
        Failure::new(error)
    }
}

impl fmt::Debug for Failure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Failure")
            .field("error", &self.error)
            .field("lineage", &self.lineage)
            .finish()
    }
}

impl fmt::Display for Failure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.error, f)
    }
}

impl StdError for Failure {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.error.source()
    }
}
