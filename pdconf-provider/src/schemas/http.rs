//! HTTP External Server schema definition

use super::{ExternalServerConfig, base_schema, with_common_attributes};
use pdconf_core::schema::{AttributeSchema, AttributeType, types};

/// Returns the schema config for http_external_server
pub fn http_config() -> ExternalServerConfig {
    let schema = base_schema(
        "http_external_server",
        "Describes a generic HTTP External Server.",
    )
    .attribute(
        AttributeSchema::new("base_url", AttributeType::String)
            .required()
            .with_description("The base URL of the external server, optionally including port number, for example \"https://externalService:9031\".")
            .with_provider_name("baseURL"),
    )
    .attribute(
        AttributeSchema::new(
            "hostname_verification_method",
            types::enumeration(&["strict", "allow-all"]),
        )
        .computed()
        .with_description("The mechanism for checking if the hostname of the HTTP External Server matches the name(s) stored inside the server's X.509 certificate.")
        .with_provider_name("hostnameVerificationMethod"),
    )
    .attribute(
        AttributeSchema::new("key_manager_provider", AttributeType::String)
            .with_description("The key manager provider to use if SSL (HTTPS) is to be used for connection-level security.")
            .with_provider_name("keyManagerProvider"),
    )
    .attribute(
        AttributeSchema::new("ssl_cert_nickname", AttributeType::String)
            .with_description("The certificate alias within the keystore to use if SSL (HTTPS) is to be used for connection-level security.")
            .with_provider_name("sslCertNickname"),
    )
    .attribute(
        AttributeSchema::new("trust_manager_provider", AttributeType::String)
            .with_description("The trust manager provider to use if SSL (HTTPS) is to be used for connection-level security.")
            .with_provider_name("trustManagerProvider"),
    )
    .attribute(
        AttributeSchema::new("connect_timeout", AttributeType::Duration)
            .computed()
            .with_description("Specifies the maximum length of time to wait for a connection to be established before aborting a request to the server.")
            .with_provider_name("connectTimeout"),
    )
    .attribute(
        AttributeSchema::new("response_timeout", AttributeType::Duration)
            .computed()
            .with_description("Specifies the maximum length of time to wait for response data to be read from an established connection before aborting a request to the server.")
            .with_provider_name("responseTimeout"),
    );

    ExternalServerConfig {
        urn_suffix: "http",
        resource_type_name: "http_external_server",
        schema: with_common_attributes(schema),
    }
}
