//! Syslog External Server schema definition

use super::{ExternalServerConfig, base_schema, with_common_attributes};
use pdconf_core::resource::Value;
use pdconf_core::schema::{AttributeSchema, AttributeType, types};

/// Returns the schema config for syslog_external_server
pub fn syslog_config() -> ExternalServerConfig {
    let schema = base_schema(
        "syslog_external_server",
        "Describes a Syslog External Server.",
    )
    .attribute(
        AttributeSchema::new("server_host_name", AttributeType::String)
            .required()
            .with_description("The address of the syslog server.")
            .with_provider_name("serverHostName"),
    )
    .attribute(
        AttributeSchema::new("server_port", types::port())
            .with_default(Value::Int(514))
            .with_description("The port on which the syslog server accepts connections.")
            .with_provider_name("serverPort"),
    )
    .attribute(
        AttributeSchema::new(
            "transport_mechanism",
            types::enumeration(&["unencrypted-tcp", "tls-encrypted-tcp", "udp"]),
        )
        .required()
        .with_description("The transport mechanism that should be used when communicating with the syslog server.")
        .with_provider_name("transportMechanism"),
    )
    .attribute(
        AttributeSchema::new("connect_timeout", AttributeType::Duration)
            .computed()
            .with_description("The maximum length of time to wait for a connection to be established before giving up.")
            .with_provider_name("connectTimeout"),
    )
    .attribute(
        AttributeSchema::new("max_connection_age", AttributeType::Duration)
            .computed()
            .with_description("The maximum length of time that TCP connections should remain established.")
            .with_provider_name("maxConnectionAge"),
    )
    .attribute(
        AttributeSchema::new("trust_manager_provider", AttributeType::String)
            .with_description("A trust manager provider that will be used to determine whether to trust the certificate chain presented by the syslog server when communication is encrypted with TLS.")
            .with_provider_name("trustManagerProvider"),
    );

    ExternalServerConfig {
        urn_suffix: "syslog",
        resource_type_name: "syslog_external_server",
        schema: with_common_attributes(schema),
    }
}
