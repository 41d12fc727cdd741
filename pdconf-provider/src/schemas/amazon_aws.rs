//! Amazon AWS External Server schema definition

use super::{ExternalServerConfig, base_schema, with_common_attributes};
use pdconf_core::schema::{AttributeSchema, AttributeType, types};

/// Returns the schema config for amazon_aws_external_server
pub fn amazon_aws_config() -> ExternalServerConfig {
    let schema = base_schema(
        "amazon_aws_external_server",
        "Describes an Amazon AWS External Server.",
    )
    .attribute(
        AttributeSchema::new("http_proxy_external_server", AttributeType::String)
            .with_description("A reference to an HTTP proxy server that should be used for requests sent to the AWS service.")
            .with_provider_name("httpProxyExternalServer"),
    )
    .attribute(
        AttributeSchema::new(
            "authentication_method",
            types::enumeration(&["access-key-id-and-secret", "default-credentials-provider-chain"]),
        )
        .computed()
        .with_description("The mechanism to use to authenticate to AWS.")
        .with_provider_name("authenticationMethod"),
    )
    .attribute(
        AttributeSchema::new("aws_access_key_id", AttributeType::String)
            .with_description("The access key ID that will be used if authentication should use an access key.")
            .with_provider_name("awsAccessKeyID"),
    )
    .attribute(
        AttributeSchema::new("aws_secret_access_key", AttributeType::String)
            .sensitive()
            .with_description("The secret access key that will be used if authentication should use an access key.")
            .with_provider_name("awsSecretAccessKey"),
    )
    .attribute(
        AttributeSchema::new("aws_region_name", AttributeType::String)
            .required()
            .with_description("The name of the AWS region containing the resources that will be accessed.")
            .with_provider_name("awsRegionName"),
    );

    ExternalServerConfig {
        urn_suffix: "amazon-aws",
        resource_type_name: "amazon_aws_external_server",
        schema: with_common_attributes(schema),
    }
}
