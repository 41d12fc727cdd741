//! Provider - Trait abstracting resource operations
//!
//! A Provider defines the CRUD operations for one configuration API.
//! It is responsible for converting Effects into actual API calls.

use std::future::Future;
use std::pin::Pin;

use crate::diagnostics::Diagnostics;
use crate::resource::{Resource, ResourceId, State};
use crate::schema::ResourceSchema;

/// What went wrong in a Provider operation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// The plan was rejected before any request was sent
    Validation,
    /// The server answered with a non-2xx status
    Http { status: u16, body: String },
    /// The request never got an answer
    Transport,
    /// The server answered with something we cannot use
    UnexpectedResponse,
    UnknownResourceType,
    Other,
}

/// Error type for Provider operations
#[derive(Debug)]
pub struct ProviderError {
    pub kind: ErrorKind,
    pub message: String,
    pub resource_id: Option<ResourceId>,
    pub cause: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl std::fmt::Display for ProviderError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if let Some(ref id) = self.resource_id {
            write!(f, "[{}.{}] {}", id.resource_type, id.name, self.message)
        } else {
            write!(f, "{}", self.message)
        }
    }
}

impl std::error::Error for ProviderError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.cause
            .as_ref()
            .map(|e| e.as_ref() as &dyn std::error::Error)
    }
}

impl ProviderError {
    pub fn new(message: impl Into<String>) -> Self {
        Self::with_kind(ErrorKind::Other, message)
    }

    pub fn with_kind(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            resource_id: None,
            cause: None,
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::with_kind(ErrorKind::Validation, message)
    }

    pub fn http(status: u16, body: impl Into<String>, message: impl Into<String>) -> Self {
        Self::with_kind(
            ErrorKind::Http {
                status,
                body: body.into(),
            },
            message,
        )
    }

    pub fn transport(message: impl Into<String>) -> Self {
        Self::with_kind(ErrorKind::Transport, message)
    }

    pub fn unexpected_response(message: impl Into<String>) -> Self {
        Self::with_kind(ErrorKind::UnexpectedResponse, message)
    }

    pub fn unknown_resource_type(resource_type: &str) -> Self {
        Self::with_kind(
            ErrorKind::UnknownResourceType,
            format!("Unknown resource type: {}", resource_type),
        )
    }

    pub fn for_resource(mut self, id: ResourceId) -> Self {
        self.resource_id = Some(id);
        self
    }

    pub fn with_cause(mut self, cause: impl std::error::Error + Send + Sync + 'static) -> Self {
        self.cause = Some(Box::new(cause));
        self
    }

    /// HTTP status of the failed call, if the server answered
    pub fn status(&self) -> Option<u16> {
        match &self.kind {
            ErrorKind::Http { status, .. } => Some(*status),
            _ => None,
        }
    }
}

pub type ProviderResult<T> = Result<T, ProviderError>;

/// Return type for async operations
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// A successful operation: the new state plus any non-fatal findings
#[derive(Debug, Clone, PartialEq)]
pub struct Outcome {
    pub state: State,
    pub diagnostics: Diagnostics,
}

impl Outcome {
    pub fn new(state: State) -> Self {
        Self {
            state,
            diagnostics: Diagnostics::new(),
        }
    }

    pub fn with_diagnostics(mut self, diagnostics: Diagnostics) -> Self {
        self.diagnostics = diagnostics;
        self
    }
}

/// Definition of resource types that a Provider can handle
pub trait ResourceType: Send + Sync {
    /// Resource type name (e.g., "syslog_external_server")
    fn name(&self) -> &'static str;

    /// Attribute schema for this resource type
    fn schema(&self) -> ResourceSchema;
}

/// Main Provider trait
///
/// All operations are async and involve side effects. Each call performs at
/// most one round of requests and never retries.
pub trait Provider: Send + Sync {
    /// Name of this Provider (e.g., "pingdirectory")
    fn name(&self) -> &'static str;

    /// List of resource types this Provider can handle
    fn resource_types(&self) -> Vec<Box<dyn ResourceType>>;

    /// Get the current state of a resource
    ///
    /// `prior` is the last recorded state; values the server never returns
    /// (secrets) are carried over from it. Returns `State::not_found()` if
    /// the resource no longer exists.
    fn read(
        &self,
        id: &ResourceId,
        identifier: &str,
        prior: Option<&State>,
    ) -> BoxFuture<'_, ProviderResult<Outcome>>;

    /// Create a resource
    ///
    /// Returns State with identifier set to the configuration object name
    fn create(&self, resource: &Resource) -> BoxFuture<'_, ProviderResult<Outcome>>;

    /// Update a resource in place
    fn update(
        &self,
        id: &ResourceId,
        identifier: &str,
        from: &State,
        to: &Resource,
    ) -> BoxFuture<'_, ProviderResult<Outcome>>;

    /// Delete a resource
    fn delete(&self, id: &ResourceId, identifier: &str) -> BoxFuture<'_, ProviderResult<()>>;

    /// Adopt an existing object using only its identifier
    fn import(&self, id: &ResourceId, identifier: &str) -> BoxFuture<'_, ProviderResult<Outcome>> {
        self.read(id, identifier, None)
    }
}

/// Provider implementation for Box<dyn Provider>
/// This enables dynamic dispatch for Providers
impl Provider for Box<dyn Provider> {
    fn name(&self) -> &'static str {
        (**self).name()
    }

    fn resource_types(&self) -> Vec<Box<dyn ResourceType>> {
        (**self).resource_types()
    }

    fn read(
        &self,
        id: &ResourceId,
        identifier: &str,
        prior: Option<&State>,
    ) -> BoxFuture<'_, ProviderResult<Outcome>> {
        (**self).read(id, identifier, prior)
    }

    fn create(&self, resource: &Resource) -> BoxFuture<'_, ProviderResult<Outcome>> {
        (**self).create(resource)
    }

    fn update(
        &self,
        id: &ResourceId,
        identifier: &str,
        from: &State,
        to: &Resource,
    ) -> BoxFuture<'_, ProviderResult<Outcome>> {
        (**self).update(id, identifier, from, to)
    }

    fn delete(&self, id: &ResourceId, identifier: &str) -> BoxFuture<'_, ProviderResult<()>> {
        (**self).delete(id, identifier)
    }

    fn import(&self, id: &ResourceId, identifier: &str) -> BoxFuture<'_, ProviderResult<Outcome>> {
        (**self).import(id, identifier)
    }
}
