//! Response reader
//!
//! Converts a Configuration API response into resource state. Secrets are
//! never taken from the response; they are carried over from the expected
//! attributes (the plan on create/update, the prior state on read).

use std::collections::HashMap;

use log::warn;
use pdconf_client::ExternalServerResponse;
use pdconf_core::diagnostics::Diagnostics;
use pdconf_core::provider::{ProviderError, ProviderResult};
use pdconf_core::resource::{ResourceId, State, Value};

use crate::schemas::{
    ExternalServerConfig, ID_ATTRIBUTE, LAST_UPDATED_ATTRIBUTE, NOTIFICATIONS_ATTRIBUTE,
    REQUIRED_ACTIONS_ATTRIBUTE,
};

pub const MISMATCHED_FORMAT_SUMMARY: &str = "Mismatched formatted attribute";

/// Read a response into state, reporting non-fatal mismatches as warnings
pub fn read_response(
    config: &ExternalServerConfig,
    id: &ResourceId,
    response: &ExternalServerResponse,
    expected: &HashMap<String, Value>,
) -> ProviderResult<(State, Diagnostics)> {
    let urn = config.schema_urn();
    if !response.has_schema(&urn) {
        return Err(ProviderError::unexpected_response(format!(
            "Object '{}' is not a {} (schemas: {})",
            response.id,
            urn,
            response.schemas.join(", ")
        ))
        .for_resource(id.clone()));
    }

    let mut diagnostics = Diagnostics::new();
    let mut attributes = HashMap::new();
    attributes.insert(ID_ATTRIBUTE.to_string(), Value::String(response.id.clone()));

    for attr in config.schema.attributes() {
        let Some(api_name) = &attr.provider_name else {
            continue;
        };
        let expected_value = expected.get(&attr.name).filter(|v| !v.is_empty_string());

        if attr.sensitive {
            if let Some(value) = expected_value {
                attributes.insert(attr.name.clone(), value.clone());
            }
            continue;
        }

        let Some(json) = response.properties.get(api_name).filter(|v| !v.is_null()) else {
            continue;
        };
        let actual = Value::from_json(json).map_err(|e| {
            ProviderError::unexpected_response(format!(
                "Property '{}' of '{}': {}",
                api_name, response.id, e
            ))
            .for_resource(id.clone())
        })?;

        let value = match expected_value {
            // Keep the user's spelling when the server only reformatted it
            Some(expected) if attr.attr_type.semantically_equal(expected, &actual) => {
                expected.clone()
            }
            Some(expected) if attr.attr_type.is_format_normalized() => {
                warn!(
                    "{}: {} expected {} but the server returned {}",
                    id, attr.name, expected, actual
                );
                diagnostics.add_warning(
                    MISMATCHED_FORMAT_SUMMARY,
                    format!("Expected {} but the server returned {}", expected, actual),
                    Some(&attr.name),
                );
                actual
            }
            _ => actual,
        };
        attributes.insert(attr.name.clone(), value);
    }

    if let Some(last_updated) = expected.get(LAST_UPDATED_ATTRIBUTE) {
        attributes.insert(LAST_UPDATED_ATTRIBUTE.to_string(), last_updated.clone());
    }

    if let Some(messages) = &response.messages {
        if !messages.notifications.is_empty() {
            let notifications = messages
                .notifications
                .iter()
                .map(|n| Value::String(n.clone()))
                .collect();
            attributes.insert(
                NOTIFICATIONS_ATTRIBUTE.to_string(),
                Value::List(notifications),
            );
        }
        if !messages.required_actions.is_empty() {
            let actions = messages
                .required_actions
                .iter()
                .map(|a| Value::String(a.to_string()))
                .collect();
            attributes.insert(REQUIRED_ACTIONS_ATTRIBUTE.to_string(), Value::List(actions));
        }
    }

    let state = State::existing(id.clone(), attributes).with_identifier(response.id.clone());
    Ok((state, diagnostics))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::request::{build_add_request, planned_attributes};
    use crate::schemas::{self, vault};
    use pdconf_core::differ::diff_operations;
    use pdconf_client::{Messages, RequiredAction};
    use pdconf_core::provider::ErrorKind;
    use pdconf_core::resource::Resource;
    use serde_json::{Map, json};

    fn s(v: &str) -> Value {
        Value::String(v.to_string())
    }

    fn response(urn: String, id: &str, properties: serde_json::Value) -> ExternalServerResponse {
        let properties: Map<String, serde_json::Value> = match properties {
            serde_json::Value::Object(map) => map,
            _ => Map::new(),
        };
        ExternalServerResponse {
            id: id.to_string(),
            schemas: vec![urn],
            messages: None,
            meta: None,
            properties,
        }
    }

    fn vault_plan() -> Resource {
        Resource::new("vault_external_server", "secrets")
            .with_attribute("id", s("vault"))
            .with_attribute(
                "vault_server_base_uri",
                Value::List(vec![s("https://vault1:8200"), s("https://vault2:8200")]),
            )
            .with_attribute("vault_authentication_method", s("approle"))
            .with_attribute("http_connect_timeout", s("5 s"))
            .with_attribute("trust_store_pin", s("changeit"))
    }

    #[test]
    fn sensitive_values_come_from_expected() {
        let config = vault::vault_config();
        let plan = vault_plan();
        let response = response(
            config.schema_urn(),
            "vault",
            json!({
                "vaultServerBaseURI": ["https://vault1:8200", "https://vault2:8200"],
                "vaultAuthenticationMethod": "approle",
                "trustStorePin": "AADtcGFzc3dvcmQ="
            }),
        );

        let (state, _) = read_response(&config, &plan.id, &response, &plan.attributes).unwrap();
        assert_eq!(state.attributes["trust_store_pin"], s("changeit"));

        let (state, _) = read_response(&config, &plan.id, &response, &HashMap::new()).unwrap();
        assert!(!state.attributes.contains_key("trust_store_pin"));
    }

    #[test]
    fn equal_durations_keep_the_planned_spelling() {
        let config = vault::vault_config();
        let plan = vault_plan();
        let response = response(
            config.schema_urn(),
            "vault",
            json!({
                "vaultServerBaseURI": ["https://vault2:8200", "https://vault1:8200"],
                "vaultAuthenticationMethod": "approle",
                "httpConnectTimeout": "5000 ms",
                "httpResponseTimeout": "30 s"
            }),
        );

        let (state, diagnostics) =
            read_response(&config, &plan.id, &response, &plan.attributes).unwrap();
        assert!(diagnostics.is_empty());
        assert_eq!(state.attributes["http_connect_timeout"], s("5 s"));
        assert_eq!(state.attributes["http_response_timeout"], s("30 s"));
        assert_eq!(
            state.attributes["vault_server_base_uri"],
            plan.attributes["vault_server_base_uri"]
        );
    }

    #[test]
    fn differing_duration_is_a_warning() {
        let config = vault::vault_config();
        let plan = vault_plan();
        let response = response(
            config.schema_urn(),
            "vault",
            json!({
                "vaultServerBaseURI": ["https://vault1:8200", "https://vault2:8200"],
                "vaultAuthenticationMethod": "approle",
                "httpConnectTimeout": "10 s"
            }),
        );

        let (state, diagnostics) =
            read_response(&config, &plan.id, &response, &plan.attributes).unwrap();
        assert!(!diagnostics.has_errors());
        let warning = diagnostics.warnings().next().unwrap();
        assert_eq!(warning.summary, MISMATCHED_FORMAT_SUMMARY);
        assert_eq!(warning.attribute.as_deref(), Some("http_connect_timeout"));
        assert_eq!(state.attributes["http_connect_timeout"], s("10 s"));
    }

    #[test]
    fn wrong_type_urn_is_rejected() {
        let config = vault::vault_config();
        let plan = vault_plan();
        let response = response(
            schemas::syslog::syslog_config().schema_urn(),
            "vault",
            json!({}),
        );

        let err = read_response(&config, &plan.id, &response, &plan.attributes).unwrap_err();
        assert_eq!(err.kind, ErrorKind::UnexpectedResponse);
    }

    #[test]
    fn messages_become_bookkeeping_attributes() {
        let config = vault::vault_config();
        let plan = vault_plan();
        let mut response = response(config.schema_urn(), "vault", json!({}));
        response.messages = Some(Messages {
            notifications: vec!["The Vault server could not be reached".to_string()],
            required_actions: vec![RequiredAction {
                property: Some("trustStoreFile".to_string()),
                action_type: "component-restart".to_string(),
                synopsis: "Restart the Vault client".to_string(),
            }],
        });

        let (state, _) = read_response(&config, &plan.id, &response, &plan.attributes).unwrap();
        assert_eq!(
            state.attributes["notifications"],
            Value::List(vec![s("The Vault server could not be reached")])
        );
        assert_eq!(
            state.attributes["required_actions"],
            Value::List(vec![s(
                "Restart the Vault client (property: trustStoreFile, type: component-restart)"
            )])
        );
    }

    /// One valid plan per resource type, setting every secret the type has
    fn sample_plans() -> Vec<Resource> {
        vec![
            Resource::new("amazon_aws_external_server", "a")
                .with_attribute("id", s("aws"))
                .with_attribute("authentication_method", s("access-key-id-and-secret"))
                .with_attribute("aws_access_key_id", s("AKIAEXAMPLE"))
                .with_attribute("aws_secret_access_key", s("secret"))
                .with_attribute("aws_region_name", s("us-east-1")),
            vault_plan().with_attribute("description", s("primary vault")),
            Resource::new("syslog_external_server", "b")
                .with_attribute("id", s("syslog"))
                .with_attribute("server_host_name", s("logs.example.com"))
                .with_attribute("transport_mechanism", s("tls-encrypted-tcp"))
                .with_attribute("max_connection_age", s("30 m"))
                .with_attribute("trust_manager_provider", s("JVM-Default")),
            Resource::new("ping_one_http_external_server", "c")
                .with_attribute("id", s("pingone"))
                .with_attribute("hostname_verification_method", s("allow-all"))
                .with_attribute("response_timeout", s("10 s")),
            Resource::new("http_external_server", "d")
                .with_attribute("id", s("http"))
                .with_attribute("base_url", s("https://service.example.com:9031"))
                .with_attribute("ssl_cert_nickname", s("server-cert")),
            Resource::new("smtp_external_server", "e")
                .with_attribute("id", s("smtp"))
                .with_attribute("server_host_name", s("smtp.example.com"))
                .with_attribute("smtp_security", s("starttls"))
                .with_attribute("user_name", s("mailer"))
                .with_attribute("password", s("hunter2"))
                .with_attribute(
                    "smtp_connection_properties",
                    Value::List(vec![s("mail.smtp.ehlo=true"), s("mail.debug=false")]),
                ),
        ]
    }

    fn sample_plan(config: &ExternalServerConfig) -> HashMap<String, Value> {
        let plan = sample_plans()
            .into_iter()
            .find(|p| p.id.resource_type == config.resource_type_name)
            .unwrap_or_else(|| panic!("no sample plan for {}", config.resource_type_name));
        planned_attributes(config, &plan)
    }

    #[test]
    fn every_type_diffs_clean_against_itself() {
        for config in schemas::configs() {
            let planned = sample_plan(&config);
            let operations = diff_operations(&config.schema, &planned, &planned);
            assert!(operations.is_empty(), "{}: {:?}", config.resource_type_name, operations);
        }
    }

    #[test]
    fn every_type_omits_blank_fields_from_add() {
        for config in schemas::configs() {
            let planned = sample_plan(&config);
            let mut blanked = planned.clone();
            for attr in config.schema.attributes() {
                if !attr.read_only
                    && attr.provider_name.is_some()
                    && !planned.contains_key(&attr.name)
                {
                    blanked.insert(attr.name.clone(), s(""));
                }
            }
            assert!(blanked.len() > planned.len(), "{}", config.resource_type_name);

            let request = build_add_request(&config, &blanked).unwrap();
            for attr in config.schema.attributes() {
                let Some(api_name) = &attr.provider_name else {
                    continue;
                };
                assert_eq!(
                    request.properties.contains_key(api_name),
                    planned.contains_key(&attr.name),
                    "{}: {}",
                    config.resource_type_name,
                    attr.name
                );
            }
        }
    }

    /// Echo every type's own add request back with altered secrets and read it again
    #[test]
    fn echoed_add_request_reproduces_the_plan() {
        for config in schemas::configs() {
            let planned = sample_plan(&config);
            let request = build_add_request(&config, &planned).unwrap();

            let mut properties = request.properties.clone();
            for attr in config.schema.attributes().filter(|a| a.sensitive) {
                assert!(planned.contains_key(&attr.name), "{}", attr.name);
                if let Some(api_name) = &attr.provider_name {
                    properties.insert(api_name.clone(), json!("AADtcGFzc3dvcmQ="));
                }
            }
            let echoed = ExternalServerResponse {
                id: request.server_name.clone(),
                schemas: request.schemas.clone(),
                messages: None,
                meta: None,
                properties,
            };

            let id = ResourceId::new(config.resource_type_name, "sample");
            let (state, diagnostics) = read_response(&config, &id, &echoed, &planned).unwrap();
            assert!(diagnostics.is_empty(), "{}", config.resource_type_name);
            assert_eq!(state.attributes, planned, "{}", config.resource_type_name);
            assert_eq!(state.identifier.as_deref(), planned["id"].as_str());
        }
    }
}
