//! pdconf PingDirectory Provider
//!
//! Manages External Server configuration objects through the PingDirectory
//! Configuration API.
//!
//! ## Module Structure
//!
//! - `config` - Provider settings and their environment fallbacks
//! - `schemas` - Schema declarations, one module per External Server type
//! - `resources` - Resource type definitions
//! - `request` - Plan to request body conversion
//! - `response` - Response to state conversion
//! - `provider` - PingDirectoryProvider implementation

pub mod config;
pub mod provider;
pub mod request;
pub mod resources;
pub mod response;
pub mod schemas;

// Re-export main types
pub use config::{ConfigError, ProviderBlock, ProviderConfig};
pub use provider::PingDirectoryProvider;

use pdconf_core::provider::{BoxFuture, Outcome, Provider, ProviderResult};
use pdconf_core::resource::{Resource, ResourceId, State};

use resources::resource_types;

// =============================================================================
// Provider Trait Implementation
// =============================================================================

impl Provider for PingDirectoryProvider {
    fn name(&self) -> &'static str {
        "pingdirectory"
    }

    fn resource_types(&self) -> Vec<Box<dyn pdconf_core::provider::ResourceType>> {
        resource_types()
    }

    fn read(
        &self,
        id: &ResourceId,
        identifier: &str,
        prior: Option<&State>,
    ) -> BoxFuture<'_, ProviderResult<Outcome>> {
        let id = id.clone();
        let identifier = identifier.to_string();
        let prior = prior.cloned();
        Box::pin(async move {
            self.read_resource(&id, &identifier, prior.as_ref()).await
        })
    }

    fn create(&self, resource: &Resource) -> BoxFuture<'_, ProviderResult<Outcome>> {
        let resource = resource.clone();
        Box::pin(async move { self.create_resource(&resource).await })
    }

    fn update(
        &self,
        id: &ResourceId,
        identifier: &str,
        from: &State,
        to: &Resource,
    ) -> BoxFuture<'_, ProviderResult<Outcome>> {
        let id = id.clone();
        let identifier = identifier.to_string();
        let from = from.clone();
        let to = to.clone();
        Box::pin(async move { self.update_resource(&id, &identifier, &from, &to).await })
    }

    fn delete(&self, id: &ResourceId, identifier: &str) -> BoxFuture<'_, ProviderResult<()>> {
        let id = id.clone();
        let identifier = identifier.to_string();
        Box::pin(async move { self.delete_resource(&id, &identifier).await })
    }
}
