//! State file structures for persisting managed External Servers

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

use pdconf_core::resource::{ResourceId, State, Value};

use crate::backend::{BackendError, BackendResult};

/// The main state file structure that persists to the backend
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StateFile {
    /// State file format version
    pub version: u32,
    /// Monotonically increasing number for each state modification
    pub serial: u64,
    /// Unique identifier for this state lineage (prevents accidental overwrites)
    pub lineage: String,
    /// Version of pdconf that last modified this state
    pub pdconf_version: String,
    /// All recorded resources and data sources
    pub resources: Vec<ResourceState>,
}

impl StateFile {
    /// Current state file format version
    pub const CURRENT_VERSION: u32 = 1;

    /// Create a new empty state file
    pub fn new() -> Self {
        Self::with_lineage(uuid::Uuid::new_v4().to_string())
    }

    /// Create a new state file with a specific lineage
    pub fn with_lineage(lineage: String) -> Self {
        Self {
            version: Self::CURRENT_VERSION,
            serial: 0,
            lineage,
            pdconf_version: env!("CARGO_PKG_VERSION").to_string(),
            resources: Vec::new(),
        }
    }

    /// Increment serial and update the pdconf version for a new state write
    pub fn increment_serial(&mut self) {
        self.serial += 1;
        self.pdconf_version = env!("CARGO_PKG_VERSION").to_string();
    }

    /// Find a resource by type and name
    pub fn find_resource(&self, resource_type: &str, name: &str) -> Option<&ResourceState> {
        self.resources
            .iter()
            .find(|r| r.resource_type == resource_type && r.name == name)
    }

    /// Add or update a resource in the state
    pub fn upsert_resource(&mut self, resource: ResourceState) {
        match self
            .resources
            .iter_mut()
            .find(|r| r.resource_type == resource.resource_type && r.name == resource.name)
        {
            Some(existing) => *existing = resource,
            None => self.resources.push(resource),
        }
    }

    /// Remove a resource from the state
    pub fn remove_resource(&mut self, resource_type: &str, name: &str) -> Option<ResourceState> {
        let pos = self
            .resources
            .iter()
            .position(|r| r.resource_type == resource_type && r.name == name)?;
        Some(self.resources.remove(pos))
    }

    /// Record the outcome of a provider call
    ///
    /// A state that no longer exists removes the entry.
    pub fn record(&mut self, state: &State, provider: &str, data_source: bool) {
        if state.exists {
            self.upsert_resource(ResourceState::from_state(state, provider, data_source));
        } else {
            self.remove_resource(&state.id.resource_type, &state.id.name);
        }
    }

    /// Recorded managed resources keyed by id, ready for the differ
    ///
    /// Data sources are left out: they are never planned for mutation.
    pub fn managed_states(&self) -> BackendResult<HashMap<ResourceId, State>> {
        self.resources
            .iter()
            .filter(|r| !r.data_source)
            .map(|r| {
                let state = r.to_state()?;
                Ok((state.id.clone(), state))
            })
            .collect()
    }
}

impl Default for StateFile {
    fn default() -> Self {
        Self::new()
    }
}

/// State of a single recorded resource
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceState {
    /// Resource type (e.g., "syslog_external_server")
    pub resource_type: String,
    /// Binding name from the configuration file
    pub name: String,
    /// Provider name (e.g., "pingdirectory")
    pub provider: String,
    /// Configuration API object name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub identifier: Option<String>,
    /// Whether this entry was recorded by reading a data source
    #[serde(default)]
    pub data_source: bool,
    /// All attributes of the resource as JSON values
    pub attributes: BTreeMap<String, serde_json::Value>,
}

impl ResourceState {
    /// Create a new resource state
    pub fn new(
        resource_type: impl Into<String>,
        name: impl Into<String>,
        provider: impl Into<String>,
    ) -> Self {
        Self {
            resource_type: resource_type.into(),
            name: name.into(),
            provider: provider.into(),
            identifier: None,
            data_source: false,
            attributes: BTreeMap::new(),
        }
    }

    #[cfg(test)]
    fn with_attribute(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.attributes.insert(key.into(), value);
        self
    }

    /// Set the Configuration API object name
    pub fn with_identifier(mut self, identifier: impl Into<String>) -> Self {
        self.identifier = Some(identifier.into());
        self
    }

    /// Snapshot a provider state
    pub fn from_state(state: &State, provider: &str, data_source: bool) -> Self {
        Self {
            resource_type: state.id.resource_type.clone(),
            name: state.id.name.clone(),
            provider: provider.to_string(),
            identifier: state.identifier.clone(),
            data_source,
            attributes: state
                .attributes
                .iter()
                .map(|(k, v)| (k.clone(), v.to_json()))
                .collect(),
        }
    }

    /// `type.name` key used by the differ and the configuration file
    pub fn id(&self) -> ResourceId {
        ResourceId::new(&self.resource_type, &self.name)
    }

    /// Convert back into a provider state
    pub fn to_state(&self) -> BackendResult<State> {
        let attributes = self
            .attributes
            .iter()
            .map(|(k, v)| {
                Value::from_json(v).map(|v| (k.clone(), v)).map_err(|e| {
                    BackendError::InvalidState(format!(
                        "{}.{} attribute '{}': {}",
                        self.resource_type, self.name, k, e
                    ))
                })
            })
            .collect::<BackendResult<HashMap<_, _>>>()?;

        let state = State::existing(self.id(), attributes);
        Ok(match &self.identifier {
            Some(identifier) => state.with_identifier(identifier.clone()),
            None => state,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_state_file_new() {
        let state = StateFile::new();
        assert_eq!(state.version, StateFile::CURRENT_VERSION);
        assert_eq!(state.serial, 0);
        assert!(!state.lineage.is_empty());
        assert!(state.resources.is_empty());
    }

    #[test]
    fn test_state_file_increment_serial() {
        let mut state = StateFile::new();
        state.increment_serial();
        state.increment_serial();
        assert_eq!(state.serial, 2);
    }

    #[test]
    fn test_upsert_and_remove() {
        let mut state = StateFile::new();
        state.upsert_resource(
            ResourceState::new("syslog_external_server", "logs", "pingdirectory")
                .with_attribute("server_port", json!(514)),
        );
        state.upsert_resource(
            ResourceState::new("syslog_external_server", "logs", "pingdirectory")
                .with_attribute("server_port", json!(1514)),
        );
        assert_eq!(state.resources.len(), 1);
        assert_eq!(state.resources[0].attributes["server_port"], json!(1514));

        assert!(state.remove_resource("syslog_external_server", "logs").is_some());
        assert!(state.remove_resource("syslog_external_server", "logs").is_none());
    }

    #[test]
    fn test_record_round_trips_provider_state() {
        let id = ResourceId::new("smtp_external_server", "mail");
        let attributes = HashMap::from([
            ("id".to_string(), Value::String("mail".to_string())),
            ("server_port".to_string(), Value::Int(25)),
            (
                "smtp_connection_properties".to_string(),
                Value::List(vec![Value::String("mail.debug=false".to_string())]),
            ),
        ]);
        let provider_state = State::existing(id.clone(), attributes).with_identifier("mail");

        let mut state = StateFile::new();
        state.record(&provider_state, "pingdirectory", false);

        let managed = state.managed_states().unwrap();
        assert_eq!(managed[&id], provider_state);

        state.record(&State::not_found(id.clone()), "pingdirectory", false);
        assert!(state.find_resource("smtp_external_server", "mail").is_none());
    }

    #[test]
    fn test_data_sources_are_not_managed() {
        let mut state = StateFile::new();
        state.upsert_resource(
            ResourceState {
                data_source: true,
                ..ResourceState::new("vault_external_server", "existing", "pingdirectory")
            }
            .with_identifier("vault"),
        );
        assert!(state.managed_states().unwrap().is_empty());
    }

    #[test]
    fn test_invalid_attribute_is_reported() {
        let mut state = StateFile::new();
        state.upsert_resource(
            ResourceState::new("http_external_server", "api", "pingdirectory")
                .with_attribute("base_url", json!(null)),
        );
        let err = state.managed_states().unwrap_err();
        assert!(err.to_string().contains("base_url"));
    }

    #[test]
    fn test_state_file_serialization() {
        let mut state = StateFile::new();
        state.upsert_resource(
            ResourceState::new("amazon_aws_external_server", "primary", "pingdirectory")
                .with_identifier("aws")
                .with_attribute("aws_region_name", json!("us-east-1")),
        );

        let json = serde_json::to_string_pretty(&state).unwrap();
        let deserialized: StateFile = serde_json::from_str(&json).unwrap();

        assert_eq!(deserialized.lineage, state.lineage);
        assert_eq!(deserialized.resources, state.resources);
    }
}
