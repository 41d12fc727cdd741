//! SMTP External Server schema definition

use super::{ExternalServerConfig, base_schema, with_common_attributes};
use pdconf_core::resource::Value;
use pdconf_core::schema::{AttributeSchema, AttributeType, types};

/// Returns the schema config for smtp_external_server
pub fn smtp_config() -> ExternalServerConfig {
    let schema = base_schema(
        "smtp_external_server",
        "Describes an outgoing SMTP External Server.",
    )
    .attribute(
        AttributeSchema::new("server_host_name", AttributeType::String)
            .required()
            .with_description("The host name of the smtp server.")
            .with_provider_name("serverHostName"),
    )
    .attribute(
        AttributeSchema::new("server_port", types::port())
            .with_default(Value::Int(25))
            .with_description("The port number where the smtp server listens for requests.")
            .with_provider_name("serverPort"),
    )
    .attribute(
        AttributeSchema::new(
            "smtp_security",
            types::enumeration(&["none", "ssl", "starttls"]),
        )
        .computed()
        .with_description("This property specifies type of connection security to use when connecting to the outgoing mail server.")
        .with_provider_name("smtpSecurity"),
    )
    .attribute(
        AttributeSchema::new("user_name", AttributeType::String)
            .with_description("The name of the login ID to use when connecting to the outgoing mail server.")
            .with_provider_name("userName"),
    )
    .attribute(
        AttributeSchema::new("password", AttributeType::String)
            .sensitive()
            .with_description("The login password for the specified user name.")
            .with_provider_name("password"),
    )
    .attribute(
        AttributeSchema::new("smtp_timeout", AttributeType::Duration)
            .computed()
            .with_description("Specifies the maximum length of time that a connection or attempted connection to a SMTP server may take.")
            .with_provider_name("smtpTimeout"),
    )
    .attribute(
        AttributeSchema::new("smtp_connection_properties", types::string_set())
            .with_description("Specifies the connection properties for the smtp server.")
            .with_provider_name("smtpConnectionProperties"),
    );

    ExternalServerConfig {
        urn_suffix: "smtp",
        resource_type_name: "smtp_external_server",
        schema: with_common_attributes(schema),
    }
}
