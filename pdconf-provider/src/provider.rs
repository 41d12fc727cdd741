//! PingDirectory Provider implementation
//!
//! This module contains the main provider implementation that communicates
//! with the Configuration API to manage External Servers.

use std::sync::Arc;

use chrono::Utc;
use log::{debug, info};
use pdconf_client::{ClientError, ConfigClient, ExternalServerApi};
use pdconf_core::differ::diff_operations;
use pdconf_core::provider::{Outcome, ProviderError, ProviderResult};
use pdconf_core::resource::{Resource, ResourceId, State, Value};

use crate::config::ProviderConfig;
use crate::request::{build_add_request, build_update_request, planned_attributes, validate_plan};
use crate::response::read_response;
use crate::schemas::{ExternalServerConfig, LAST_UPDATED_ATTRIBUTE, get_schema_config};

/// Go's RFC 850 layout, as used for `last_updated`
const RFC850_FORMAT: &str = "%A, %d-%b-%y %H:%M:%S UTC";

/// Current time formatted for `last_updated`
pub fn rfc850_now() -> String {
    Utc::now().format(RFC850_FORMAT).to_string()
}

fn schema_config(id: &ResourceId) -> ProviderResult<ExternalServerConfig> {
    get_schema_config(&id.resource_type).ok_or_else(|| {
        ProviderError::unknown_resource_type(&id.resource_type).for_resource(id.clone())
    })
}

/// Translate a client failure, keeping status and body
fn client_error(id: &ResourceId, action: &str, err: ClientError) -> ProviderError {
    let message = format!("Failed to {}: {}", action, err);
    let error = match &err {
        ClientError::Status { status, body, .. } => {
            ProviderError::http(*status, body.clone(), message)
        }
        ClientError::Request { .. } => ProviderError::transport(message),
        ClientError::Decode { .. } => ProviderError::unexpected_response(message),
        _ => ProviderError::new(message),
    };
    error.with_cause(err).for_resource(id.clone())
}

/// PingDirectory External Server Provider
///
/// Holds a single client handle that is never mutated after construction.
pub struct PingDirectoryProvider {
    api: Arc<dyn ExternalServerApi>,
}

impl PingDirectoryProvider {
    /// Create a provider talking HTTP to the configured server
    pub fn new(config: &ProviderConfig) -> ProviderResult<Self> {
        let client = ConfigClient::new(config.client_settings()).map_err(|e| {
            ProviderError::new(format!("Failed to create Configuration API client: {}", e))
                .with_cause(e)
        })?;
        Ok(Self::with_api(Arc::new(client)))
    }

    /// Create a provider on top of any ExternalServerApi implementation
    pub fn with_api(api: Arc<dyn ExternalServerApi>) -> Self {
        Self { api }
    }

    // =========================================================================
    // Resource Operations
    // =========================================================================

    /// Read an External Server by name
    ///
    /// Attributes the server never returns are taken from `prior`.
    pub async fn read_resource(
        &self,
        id: &ResourceId,
        identifier: &str,
        prior: Option<&State>,
    ) -> ProviderResult<Outcome> {
        let config = schema_config(id)?;

        let response = match self
            .api
            .get(identifier)
            .await
            .map_err(|e| client_error(id, "read external server", e))?
        {
            Some(response) => response,
            None => {
                info!("{} ({}) no longer exists", id, identifier);
                return Ok(Outcome::new(State::not_found(id.clone())));
            }
        };

        let expected = prior.map(|p| p.attributes.clone()).unwrap_or_default();
        let (state, diagnostics) = read_response(&config, id, &response, &expected)?;
        Ok(Outcome::new(state).with_diagnostics(diagnostics))
    }

    /// Create an External Server from a plan
    pub async fn create_resource(&self, resource: &Resource) -> ProviderResult<Outcome> {
        let id = &resource.id;
        let config = schema_config(id)?;
        let planned = planned_attributes(&config, resource);
        let request = build_add_request(&config, &planned).map_err(|e| e.for_resource(id.clone()))?;

        info!("Creating {} ({})", id, request.server_name);
        let response = self
            .api
            .add(&request)
            .await
            .map_err(|e| client_error(id, "create external server", e))?;

        let (mut state, diagnostics) = read_response(&config, id, &response, &planned)?;
        stamp_last_updated(&mut state);
        Ok(Outcome::new(state).with_diagnostics(diagnostics))
    }

    /// Update an External Server in place
    ///
    /// When nothing differs no request is sent and `from` is returned as is.
    pub async fn update_resource(
        &self,
        id: &ResourceId,
        identifier: &str,
        from: &State,
        to: &Resource,
    ) -> ProviderResult<Outcome> {
        let config = schema_config(id)?;
        let planned = planned_attributes(&config, to);
        validate_plan(&config, &planned).map_err(|e| e.for_resource(id.clone()))?;

        let operations = diff_operations(&config.schema, &planned, &from.attributes);
        if operations.is_empty() {
            debug!("{} has no changes, skipping update", id);
            return Ok(Outcome::new(from.clone()));
        }

        let request =
            build_update_request(&config, &operations).map_err(|e| e.for_resource(id.clone()))?;

        info!("Updating {} ({})", id, identifier);
        let response = self
            .api
            .update(identifier, &request)
            .await
            .map_err(|e| client_error(id, "update external server", e))?;

        let (mut state, diagnostics) = read_response(&config, id, &response, &planned)?;
        stamp_last_updated(&mut state);
        Ok(Outcome::new(state).with_diagnostics(diagnostics))
    }

    /// Delete an External Server
    pub async fn delete_resource(&self, id: &ResourceId, identifier: &str) -> ProviderResult<()> {
        schema_config(id)?;
        info!("Deleting {} ({})", id, identifier);
        self.api
            .delete(identifier)
            .await
            .map_err(|e| client_error(id, "delete external server", e))
    }
}

fn stamp_last_updated(state: &mut State) {
    state.attributes.insert(
        LAST_UPDATED_ATTRIBUTE.to_string(),
        Value::String(rfc850_now()),
    );
}
