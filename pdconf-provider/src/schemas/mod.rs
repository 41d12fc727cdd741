//! External Server schema definitions
//!
//! One module per External Server type. Every type shares the bookkeeping
//! attributes declared here.

pub mod amazon_aws;
pub mod http;
pub mod ping_one_http;
pub mod smtp;
pub mod syslog;
pub mod vault;

use pdconf_client::models::external_server_urn;
use pdconf_core::schema::{AttributeSchema, AttributeType, ResourceSchema};

/// Name of the attribute holding the Configuration API object name
pub const ID_ATTRIBUTE: &str = "id";
pub const DESCRIPTION_ATTRIBUTE: &str = "description";
pub const LAST_UPDATED_ATTRIBUTE: &str = "last_updated";
pub const NOTIFICATIONS_ATTRIBUTE: &str = "notifications";
pub const REQUIRED_ACTIONS_ATTRIBUTE: &str = "required_actions";

/// External Server schema configuration
///
/// Combines the ResourceSchema with the Configuration API type it maps to.
pub struct ExternalServerConfig {
    /// Last segment of the type URN (e.g., "amazon-aws")
    pub urn_suffix: &'static str,
    /// Resource type name (e.g., "amazon_aws_external_server")
    pub resource_type_name: &'static str,
    /// The resource schema with attribute definitions
    pub schema: ResourceSchema,
}

impl ExternalServerConfig {
    /// Full schema URN sent in `schemas` and expected back in responses
    pub fn schema_urn(&self) -> String {
        external_server_urn(self.urn_suffix)
    }
}

/// Returns all External Server schema configs
pub fn configs() -> Vec<ExternalServerConfig> {
    vec![
        amazon_aws::amazon_aws_config(),
        vault::vault_config(),
        syslog::syslog_config(),
        ping_one_http::ping_one_http_config(),
        http::http_config(),
        smtp::smtp_config(),
    ]
}

/// Get the ExternalServerConfig for a resource type
pub fn get_schema_config(resource_type: &str) -> Option<ExternalServerConfig> {
    configs()
        .into_iter()
        .find(|c| c.resource_type_name == resource_type)
}

/// Returns all External Server schemas
pub fn all_schemas() -> Vec<ResourceSchema> {
    configs().into_iter().map(|c| c.schema).collect()
}

/// Schema seeded with the object name, which cannot change after creation
pub(crate) fn base_schema(resource_type: &str, description: &str) -> ResourceSchema {
    ResourceSchema::new(resource_type)
        .with_description(description)
        .attribute(
            AttributeSchema::new(ID_ATTRIBUTE, AttributeType::String)
                .required()
                .requires_replace()
                .with_description("Name of this object."),
        )
}

/// Append the attributes every External Server type carries
pub(crate) fn with_common_attributes(schema: ResourceSchema) -> ResourceSchema {
    schema
        .attribute(
            AttributeSchema::new(DESCRIPTION_ATTRIBUTE, AttributeType::String)
                .with_description("A description for this External Server")
                .with_provider_name("description"),
        )
        .attribute(
            AttributeSchema::new(LAST_UPDATED_ATTRIBUTE, AttributeType::String)
                .read_only()
                .with_description("Timestamp of the last create or update (RFC 850)."),
        )
        .attribute(
            AttributeSchema::new(
                NOTIFICATIONS_ATTRIBUTE,
                AttributeType::List(Box::new(AttributeType::String)),
            )
            .read_only()
            .with_description("Notifications returned by the server."),
        )
        .attribute(
            AttributeSchema::new(
                REQUIRED_ACTIONS_ATTRIBUTE,
                AttributeType::List(Box::new(AttributeType::String)),
            )
            .read_only()
            .with_description("Actions required before a change takes effect."),
        )
}
