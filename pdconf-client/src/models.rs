//! Wire models for the `external-servers` collection of the Configuration API

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Prefix shared by every External Server type URN
pub const EXTERNAL_SERVER_URN_PREFIX: &str =
    "urn:pingidentity:schemas:configuration:2.0:external-server:";

/// Build the schema URN of an External Server type (e.g., "amazon-aws")
pub fn external_server_urn(suffix: &str) -> String {
    format!("{}{}", EXTERNAL_SERVER_URN_PREFIX, suffix)
}

/// Body of `POST /config/external-servers`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddExternalServerRequest {
    pub schemas: Vec<String>,
    pub server_name: String,
    /// Type-specific properties keyed by their API name
    #[serde(flatten)]
    pub properties: Map<String, Value>,
}

impl AddExternalServerRequest {
    pub fn new(schema_urn: impl Into<String>, server_name: impl Into<String>) -> Self {
        Self {
            schemas: vec![schema_urn.into()],
            server_name: server_name.into(),
            properties: Map::new(),
        }
    }
}

/// Any External Server as returned by the Configuration API
///
/// The concrete type is identified by `schemas`; its properties are kept as
/// raw JSON and interpreted by the schema that asked for them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExternalServerResponse {
    pub id: String,
    #[serde(default)]
    pub schemas: Vec<String>,
    #[serde(
        rename = "urn:pingidentity:schemas:configuration:messages:2.0",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub messages: Option<Messages>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<Value>,
    #[serde(flatten)]
    pub properties: Map<String, Value>,
}

impl ExternalServerResponse {
    pub fn has_schema(&self, urn: &str) -> bool {
        self.schemas.iter().any(|s| s == urn)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Messages {
    #[serde(default)]
    pub notifications: Vec<String>,
    #[serde(default)]
    pub required_actions: Vec<RequiredAction>,
}

/// An action the administrator must take for a change to become effective
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequiredAction {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub property: Option<String>,
    #[serde(rename = "type")]
    pub action_type: String,
    pub synopsis: String,
}

impl std::fmt::Display for RequiredAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.property {
            Some(property) => write!(
                f,
                "{} (property: {}, type: {})",
                self.synopsis, property, self.action_type
            ),
            None => write!(f, "{} (type: {})", self.synopsis, self.action_type),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PatchOp {
    Replace,
    Add,
    Remove,
}

/// One entry of a `PATCH` body
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatchOperation {
    pub op: PatchOp,
    pub path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,
}

/// Body of `PATCH /config/external-servers/{name}`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UpdateRequest {
    pub operations: Vec<PatchOperation>,
}

/// Error body returned with non-2xx statuses
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ErrorResponse {
    #[serde(default)]
    pub detail: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn add_request_flattens_properties() {
        let mut request =
            AddExternalServerRequest::new(external_server_urn("amazon-aws"), "aws-primary");
        request
            .properties
            .insert("awsRegionName".to_string(), json!("us-east-1"));

        let body = serde_json::to_value(&request).unwrap();
        assert_eq!(
            body,
            json!({
                "schemas": ["urn:pingidentity:schemas:configuration:2.0:external-server:amazon-aws"],
                "serverName": "aws-primary",
                "awsRegionName": "us-east-1"
            })
        );
    }

    #[test]
    fn response_separates_messages_from_properties() {
        let body = json!({
            "schemas": ["urn:pingidentity:schemas:configuration:2.0:external-server:syslog"],
            "id": "central-syslog",
            "serverHostName": "logs.example.com",
            "serverPort": 514,
            "meta": {"resourceType": "Syslog External Server"},
            "urn:pingidentity:schemas:configuration:messages:2.0": {
                "notifications": ["restart pending"],
                "requiredActions": [{
                    "property": "serverPort",
                    "type": "component-restart",
                    "synopsis": "Restart the handler"
                }]
            }
        });

        let response: ExternalServerResponse = serde_json::from_value(body).unwrap();
        assert_eq!(response.id, "central-syslog");
        assert!(response.has_schema(&external_server_urn("syslog")));
        assert_eq!(response.properties.len(), 2);
        assert_eq!(response.properties["serverPort"], json!(514));

        let messages = response.messages.unwrap();
        assert_eq!(messages.notifications, vec!["restart pending"]);
        assert_eq!(
            messages.required_actions[0].to_string(),
            "Restart the handler (property: serverPort, type: component-restart)"
        );
    }

    #[test]
    fn patch_operations_serialize_lowercase() {
        let request = UpdateRequest {
            operations: vec![
                PatchOperation {
                    op: PatchOp::Replace,
                    path: "awsRegionName".to_string(),
                    value: Some(json!("us-west-2")),
                },
                PatchOperation {
                    op: PatchOp::Remove,
                    path: "description".to_string(),
                    value: None,
                },
            ],
        };

        assert_eq!(
            serde_json::to_value(&request).unwrap(),
            json!({"operations": [
                {"op": "replace", "path": "awsRegionName", "value": "us-west-2"},
                {"op": "remove", "path": "description"}
            ]})
        );
    }
}
