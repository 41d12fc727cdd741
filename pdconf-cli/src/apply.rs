//! Plan execution
//!
//! Runs provider calls for refreshed state and planned effects, recording
//! each outcome in the state file. Nothing here writes to the backend; the
//! caller persists the state after every step that changed it.

use std::collections::HashSet;

use log::{info, warn};
use pdconf_core::diagnostics::Diagnostics;
use pdconf_core::effect::Effect;
use pdconf_core::provider::{Provider, ProviderError, ProviderResult};
use pdconf_core::resource::{Resource, ResourceId};
use pdconf_provider::schemas::ID_ATTRIBUTE;
use pdconf_state::StateFile;

/// Diagnostics reported while refreshing, per resource
pub type RefreshWarnings = Vec<(ResourceId, Diagnostics)>;

/// Re-read every recorded managed resource
///
/// Objects deleted outside of pdconf are dropped from the state.
pub async fn refresh_state(
    provider: &dyn Provider,
    state: &mut StateFile,
) -> Result<RefreshWarnings, String> {
    let mut recorded: Vec<_> = state
        .managed_states()
        .map_err(|e| e.to_string())?
        .into_values()
        .collect();
    recorded.sort_by_key(|s| s.id.to_string());

    let mut warnings = Vec::new();
    for prior in recorded {
        let Some(identifier) = prior.identifier.as_deref() else {
            warn!("{} has no identifier recorded, skipping refresh", prior.id);
            continue;
        };
        let outcome = provider
            .read(&prior.id, identifier, Some(&prior))
            .await
            .map_err(|e| format!("Failed to refresh {}: {}", prior.id, e))?;
        if !outcome.state.exists {
            info!("{} was deleted outside of pdconf", prior.id);
        }
        state.record(&outcome.state, provider.name(), false);
        if !outcome.diagnostics.is_empty() {
            warnings.push((prior.id.clone(), outcome.diagnostics));
        }
    }
    Ok(warnings)
}

/// Execute one effect and record its outcome
///
/// A replacement that fails after the delete leaves the resource removed
/// from the state.
pub async fn apply_effect(
    provider: &dyn Provider,
    effect: &Effect,
    state: &mut StateFile,
) -> ProviderResult<Diagnostics> {
    match effect {
        Effect::Read(resource) => read_data_source(provider, resource, state).await,
        Effect::Create(resource) => {
            let outcome = provider.create(resource).await?;
            state.record(&outcome.state, provider.name(), false);
            Ok(outcome.diagnostics)
        }
        Effect::Update { id, from, to, .. } => {
            let identifier = from.identifier.as_deref().ok_or_else(|| {
                ProviderError::new("No identifier recorded").for_resource(id.clone())
            })?;
            let outcome = provider.update(id, identifier, from, to).await?;
            state.record(&outcome.state, provider.name(), false);
            Ok(outcome.diagnostics)
        }
        Effect::Replace { from, to } => {
            let identifier = from.identifier.as_deref().ok_or_else(|| {
                ProviderError::new("No identifier recorded").for_resource(from.id.clone())
            })?;
            provider.delete(&from.id, identifier).await?;
            state.remove_resource(&from.id.resource_type, &from.id.name);

            let outcome = provider.create(to).await?;
            state.record(&outcome.state, provider.name(), false);
            Ok(outcome.diagnostics)
        }
        Effect::Delete { id, identifier } => {
            provider.delete(id, identifier).await?;
            state.remove_resource(&id.resource_type, &id.name);
            Ok(Diagnostics::new())
        }
    }
}

async fn read_data_source(
    provider: &dyn Provider,
    resource: &Resource,
    state: &mut StateFile,
) -> ProviderResult<Diagnostics> {
    let identifier = resource.string_attribute(ID_ATTRIBUTE).ok_or_else(|| {
        ProviderError::validation("Data source requires the 'id' attribute")
            .for_resource(resource.id.clone())
    })?;

    let outcome = provider.read(&resource.id, identifier, None).await?;
    if !outcome.state.exists {
        return Err(ProviderError::new(format!(
            "External server '{}' does not exist",
            identifier
        ))
        .for_resource(resource.id.clone()));
    }
    state.record(&outcome.state, provider.name(), true);
    Ok(outcome.diagnostics)
}

/// Forget data sources that are no longer declared
pub fn prune_data_sources(state: &mut StateFile, declared: &[Resource]) {
    let declared: HashSet<&ResourceId> = declared
        .iter()
        .filter(|r| r.is_data_source())
        .map(|r| &r.id)
        .collect();
    state
        .resources
        .retain(|r| !r.data_source || declared.contains(&r.id()));
}
