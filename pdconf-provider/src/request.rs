//! Request builders
//!
//! Pure conversions from a plan into Configuration API request bodies.

use std::collections::HashMap;

use pdconf_client::{AddExternalServerRequest, PatchOp, PatchOperation, UpdateRequest};
use pdconf_core::differ::{Operation, OperationKind};
use pdconf_core::provider::{ProviderError, ProviderResult};
use pdconf_core::resource::{Resource, Value};

use crate::schemas::{ExternalServerConfig, ID_ATTRIBUTE};

/// Plan attributes with declared defaults filled in
pub fn planned_attributes(
    config: &ExternalServerConfig,
    resource: &Resource,
) -> HashMap<String, Value> {
    let mut attributes = resource.attributes.clone();
    config.schema.apply_defaults(&mut attributes);
    attributes
}

/// Check a plan against its schema before anything is sent
pub fn validate_plan(
    config: &ExternalServerConfig,
    attributes: &HashMap<String, Value>,
) -> ProviderResult<()> {
    config.schema.validate(attributes).map_err(|errors| {
        let messages: Vec<String> = errors.iter().map(|e| e.to_string()).collect();
        ProviderError::validation(format!(
            "Invalid {}: {}",
            config.resource_type_name,
            messages.join("; ")
        ))
    })
}

/// Build the body of an Add call
///
/// Only attributes the user set are sent; empty strings count as unset.
pub fn build_add_request(
    config: &ExternalServerConfig,
    attributes: &HashMap<String, Value>,
) -> ProviderResult<AddExternalServerRequest> {
    validate_plan(config, attributes)?;

    let server_name = attributes
        .get(ID_ATTRIBUTE)
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| ProviderError::validation("Attribute 'id' must be a non-empty string"))?;

    let mut request = AddExternalServerRequest::new(config.schema_urn(), server_name);

    for attr in config.schema.attributes() {
        if attr.read_only {
            continue;
        }
        if let Some(api_name) = &attr.provider_name
            && let Some(value) = attributes.get(&attr.name)
            && !value.is_empty_string()
        {
            request.properties.insert(api_name.clone(), value.to_json());
        }
    }

    Ok(request)
}

/// Map diff operations onto the body of an Update call
pub fn build_update_request(
    config: &ExternalServerConfig,
    operations: &[Operation],
) -> ProviderResult<UpdateRequest> {
    let operations = operations
        .iter()
        .map(|op| {
            let api_name = config
                .schema
                .get(&op.attribute)
                .and_then(|attr| attr.provider_name.clone())
                .ok_or_else(|| {
                    ProviderError::validation(format!(
                        "Attribute '{}' cannot be updated on {}",
                        op.attribute, config.resource_type_name
                    ))
                })?;
            Ok(PatchOperation {
                op: match op.kind {
                    OperationKind::Replace => PatchOp::Replace,
                    OperationKind::Add => PatchOp::Add,
                    OperationKind::Remove => PatchOp::Remove,
                },
                path: api_name,
                value: op.value.as_ref().map(Value::to_json),
            })
        })
        .collect::<ProviderResult<Vec<_>>>()?;

    Ok(UpdateRequest { operations })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schemas::{amazon_aws, smtp, syslog};
    use pdconf_core::provider::ErrorKind;
    use serde_json::json;

    fn s(v: &str) -> Value {
        Value::String(v.to_string())
    }

    #[test]
    fn add_request_contains_only_set_attributes() {
        let config = amazon_aws::amazon_aws_config();
        let resource = Resource::new("amazon_aws_external_server", "primary")
            .with_attribute("id", s("aws"))
            .with_attribute("aws_region_name", s("us-east-1"))
            .with_attribute("description", s(""));

        let request = build_add_request(&config, &planned_attributes(&config, &resource)).unwrap();
        assert_eq!(
            serde_json::to_value(&request).unwrap(),
            json!({
                "schemas": ["urn:pingidentity:schemas:configuration:2.0:external-server:amazon-aws"],
                "serverName": "aws",
                "awsRegionName": "us-east-1"
            })
        );
    }

    #[test]
    fn defaults_and_sets_are_sent() {
        let config = smtp::smtp_config();
        let resource = Resource::new("smtp_external_server", "mail")
            .with_attribute("id", s("mail"))
            .with_attribute("server_host_name", s("smtp.example.com"))
            .with_attribute("password", s("hunter2"))
            .with_attribute(
                "smtp_connection_properties",
                Value::List(vec![s("mail.smtp.ehlo=true")]),
            );

        let request = build_add_request(&config, &planned_attributes(&config, &resource)).unwrap();
        assert_eq!(request.properties["serverPort"], json!(25));
        assert_eq!(request.properties["password"], json!("hunter2"));
        assert_eq!(
            request.properties["smtpConnectionProperties"],
            json!(["mail.smtp.ehlo=true"])
        );
    }

    #[test]
    fn invalid_enum_is_a_validation_error() {
        let config = syslog::syslog_config();
        let resource = Resource::new("syslog_external_server", "logs")
            .with_attribute("id", s("logs"))
            .with_attribute("server_host_name", s("logs.example.com"))
            .with_attribute("transport_mechanism", s("carrier-pigeon"));

        let err = build_add_request(&config, &planned_attributes(&config, &resource)).unwrap_err();
        assert_eq!(err.kind, ErrorKind::Validation);
        assert!(err.message.contains("transport_mechanism"));
    }

    #[test]
    fn missing_required_attribute_is_a_validation_error() {
        let config = amazon_aws::amazon_aws_config();
        let resource =
            Resource::new("amazon_aws_external_server", "primary").with_attribute("id", s("aws"));

        let err = build_add_request(&config, &resource.attributes).unwrap_err();
        assert_eq!(err.kind, ErrorKind::Validation);
        assert!(err.message.contains("aws_region_name"));
    }

    #[test]
    fn update_request_uses_api_names() {
        let config = amazon_aws::amazon_aws_config();
        let operations = vec![
            Operation::replace("aws_region_name", s("us-west-2")),
            Operation::remove("description", None),
        ];

        let request = build_update_request(&config, &operations).unwrap();
        assert_eq!(
            serde_json::to_value(&request).unwrap(),
            json!({"operations": [
                {"op": "replace", "path": "awsRegionName", "value": "us-west-2"},
                {"op": "remove", "path": "description"}
            ]})
        );
    }

    #[test]
    fn update_request_rejects_unmapped_attribute() {
        let config = amazon_aws::amazon_aws_config();
        let operations = vec![Operation::replace("last_updated", s("now"))];
        assert!(build_update_request(&config, &operations).is_err());
    }
}
