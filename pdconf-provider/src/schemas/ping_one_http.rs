//! PingOne HTTP External Server schema definition

use super::{ExternalServerConfig, base_schema, with_common_attributes};
use pdconf_core::schema::{AttributeSchema, AttributeType, types};

/// Returns the schema config for ping_one_http_external_server
pub fn ping_one_http_config() -> ExternalServerConfig {
    let schema = base_schema(
        "ping_one_http_external_server",
        "Describes a PingOne HTTP External Server.",
    )
    .attribute(
        AttributeSchema::new(
            "hostname_verification_method",
            types::enumeration(&["strict", "allow-all"]),
        )
        .computed()
        .with_description("The mechanism for checking if the hostname of the PingOne HTTP Servlet Extension matches the name(s) stored inside the server's X.509 certificate.")
        .with_provider_name("hostnameVerificationMethod"),
    )
    .attribute(
        AttributeSchema::new("trust_manager_provider", AttributeType::String)
            .computed()
            .with_description("The trust manager provider to use for HTTPS connection-level security.")
            .with_provider_name("trustManagerProvider"),
    )
    .attribute(
        AttributeSchema::new("connect_timeout", AttributeType::Duration)
            .computed()
            .with_description("Specifies the maximum length of time to wait for a connection to be established before aborting a request to PingOne.")
            .with_provider_name("connectTimeout"),
    )
    .attribute(
        AttributeSchema::new("response_timeout", AttributeType::Duration)
            .computed()
            .with_description("Specifies the maximum length of time to wait for response data to be read from an established connection before aborting a request to PingOne.")
            .with_provider_name("responseTimeout"),
    );

    ExternalServerConfig {
        urn_suffix: "ping-one-http",
        resource_type_name: "ping_one_http_external_server",
        schema: with_common_attributes(schema),
    }
}
