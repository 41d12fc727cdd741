//! Configuration file loading
//!
//! The configuration file is JSON with four top-level keys, all optional:
//! `provider`, `backend`, `resources` and `data_sources`.

use std::collections::HashSet;
use std::fs;
use std::path::Path;

use pdconf_core::resource::{Resource, Value};
use pdconf_provider::ProviderBlock;
use pdconf_state::BackendConfig;
use serde::Deserialize;

pub const DEFAULT_CONFIG_FILE: &str = "pdconf.json";

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigFile {
    #[serde(default)]
    pub provider: ProviderBlock,
    #[serde(default)]
    pub backend: BackendConfig,
    #[serde(default)]
    pub resources: Vec<ResourceBlock>,
    #[serde(default)]
    pub data_sources: Vec<ResourceBlock>,
}

/// One declared resource or data source
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ResourceBlock {
    #[serde(rename = "type")]
    pub resource_type: String,
    pub name: String,
    #[serde(default)]
    pub attributes: serde_json::Map<String, serde_json::Value>,
}

impl ResourceBlock {
    fn to_resource(&self, read_only: bool) -> Result<Resource, String> {
        let mut resource = Resource::new(&self.resource_type, &self.name).with_read_only(read_only);
        for (key, json) in &self.attributes {
            let value = Value::from_json(json).map_err(|e| {
                format!(
                    "{}.{}: attribute '{}': {}",
                    self.resource_type, self.name, key, e
                )
            })?;
            resource.attributes.insert(key.clone(), value);
        }
        Ok(resource)
    }
}

impl ConfigFile {
    pub fn load(path: &Path) -> Result<Self, String> {
        let content = fs::read_to_string(path)
            .map_err(|e| format!("Failed to read {}: {}", path.display(), e))?;
        Self::parse(&content).map_err(|e| format!("{}: {}", path.display(), e))
    }

    pub fn parse(content: &str) -> Result<Self, String> {
        serde_json::from_str(content).map_err(|e| format!("Parse error: {}", e))
    }

    /// Managed resources followed by data sources
    ///
    /// Every `type.name` may be declared only once across both lists.
    pub fn declared_resources(&self) -> Result<Vec<Resource>, String> {
        let mut seen = HashSet::new();
        let managed = self.resources.iter().map(|b| (b, false));
        let data_sources = self.data_sources.iter().map(|b| (b, true));

        let mut resources = Vec::new();
        for (block, read_only) in managed.chain(data_sources) {
            let resource = block.to_resource(read_only)?;
            if !seen.insert(resource.id.clone()) {
                return Err(format!("{} is declared more than once", resource.id));
            }
            resources.push(resource);
        }
        Ok(resources)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const EXAMPLE: &str = r#"{
        "provider": {"https_host": "https://localhost:1443", "username": "cn=administrator", "password": "secret"},
        "backend": {"type": "local", "path": "prod.state.json"},
        "resources": [
            {"type": "smtp_external_server", "name": "mail", "attributes": {
                "id": "mail",
                "server_host_name": "smtp.example.com",
                "smtp_connection_properties": ["mail.debug=false"]
            }}
        ],
        "data_sources": [
            {"type": "syslog_external_server", "name": "existing", "attributes": {"id": "syslog"}}
        ]
    }"#;

    #[test]
    fn test_parse_example() {
        let config = ConfigFile::parse(EXAMPLE).unwrap();
        assert_eq!(
            config.provider.https_host.as_deref(),
            Some("https://localhost:1443")
        );
        assert_eq!(config.backend.get_string("path"), Some("prod.state.json"));

        let resources = config.declared_resources().unwrap();
        assert_eq!(resources.len(), 2);
        assert!(!resources[0].is_data_source());
        assert_eq!(
            resources[0].attributes["smtp_connection_properties"],
            Value::List(vec![Value::String("mail.debug=false".to_string())])
        );
        assert!(resources[1].is_data_source());
        assert_eq!(resources[1].string_attribute("id"), Some("syslog"));
    }

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = ConfigFile::parse("{}").unwrap();
        assert_eq!(config.backend.backend_type, "local");
        assert!(config.provider.https_host.is_none());
        assert!(config.declared_resources().unwrap().is_empty());
    }

    #[test]
    fn test_unknown_top_level_key_is_rejected() {
        assert!(ConfigFile::parse(r#"{"providers": {}}"#).is_err());
    }

    #[test]
    fn test_object_attribute_is_rejected() {
        let config = ConfigFile::parse(
            r#"{"resources": [{"type": "http_external_server", "name": "api",
                "attributes": {"id": "api", "base_url": {"host": "x"}}}]}"#,
        )
        .unwrap();
        let err = config.declared_resources().unwrap_err();
        assert!(err.contains("http_external_server.api"));
        assert!(err.contains("base_url"));
    }

    #[test]
    fn test_duplicate_declaration_is_rejected() {
        let config = ConfigFile::parse(
            r#"{
                "resources": [{"type": "vault_external_server", "name": "v", "attributes": {"id": "a"}}],
                "data_sources": [{"type": "vault_external_server", "name": "v", "attributes": {"id": "b"}}]
            }"#,
        )
        .unwrap();
        let err = config.declared_resources().unwrap_err();
        assert!(err.contains("declared more than once"));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(EXAMPLE.as_bytes()).unwrap();

        let config = ConfigFile::load(file.path()).unwrap();
        assert_eq!(config.resources.len(), 1);
        assert_eq!(config.data_sources.len(), 1);
    }

    #[test]
    fn test_load_missing_file() {
        let err = ConfigFile::load(Path::new("/nonexistent/pdconf.json")).unwrap_err();
        assert!(err.contains("Failed to read"));
    }
}
