//! Vault External Server schema definition

use super::{ExternalServerConfig, base_schema, with_common_attributes};
use pdconf_core::schema::{AttributeSchema, AttributeType, types};

/// Returns the schema config for vault_external_server
pub fn vault_config() -> ExternalServerConfig {
    let schema = base_schema(
        "vault_external_server",
        "Describes a HashiCorp Vault External Server.",
    )
    .attribute(
        AttributeSchema::new("vault_server_base_uri", types::string_set())
            .required()
            .with_description("The base URL needed to access the Vault server. The base URL should consist of the protocol (\"http\" or \"https\"), the server address (resolvable name or IP address), and the port number.")
            .with_provider_name("vaultServerBaseURI"),
    )
    .attribute(
        AttributeSchema::new("vault_authentication_method", AttributeType::String)
            .required()
            .with_description("The mechanism used to authenticate to the Vault server.")
            .with_provider_name("vaultAuthenticationMethod"),
    )
    .attribute(
        AttributeSchema::new("http_connect_timeout", AttributeType::Duration)
            .computed()
            .with_description("The maximum length of time to wait to obtain an HTTP connection.")
            .with_provider_name("httpConnectTimeout"),
    )
    .attribute(
        AttributeSchema::new("http_response_timeout", AttributeType::Duration)
            .computed()
            .with_description("The maximum length of time to wait for a response to an HTTP request.")
            .with_provider_name("httpResponseTimeout"),
    )
    .attribute(
        AttributeSchema::new("trust_store_file", AttributeType::String)
            .with_description("The path to a file containing the information needed to trust the certificate presented by the Vault servers.")
            .with_provider_name("trustStoreFile"),
    )
    .attribute(
        AttributeSchema::new("trust_store_pin", AttributeType::String)
            .sensitive()
            .with_description("The passphrase needed to access the contents of the trust store.")
            .with_provider_name("trustStorePin"),
    )
    .attribute(
        AttributeSchema::new("trust_store_type", AttributeType::String)
            .with_description("The store type for the specified trust store file. The value should likely be one of \"JKS\", \"PKCS12\", or \"BCFKS\".")
            .with_provider_name("trustStoreType"),
    );

    ExternalServerConfig {
        urn_suffix: "vault",
        resource_type_name: "vault_external_server",
        schema: with_common_attributes(schema),
    }
}
