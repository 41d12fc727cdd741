//! Resource type definitions for the PingDirectory provider
//!
//! Each External Server type is exposed both as a managed resource and as a
//! data source; the host decides which by the resource's `read_only` flag.

use pdconf_core::provider::ResourceType;
use pdconf_core::schema::ResourceSchema;

use crate::schemas::{amazon_aws, http, ping_one_http, smtp, syslog, vault};

macro_rules! define_resource_type {
    ($name:ident, $type_name:expr, $config:path) => {
        pub struct $name;
        impl ResourceType for $name {
            fn name(&self) -> &'static str {
                $type_name
            }
            fn schema(&self) -> ResourceSchema {
                $config().schema
            }
        }
    };
}

define_resource_type!(
    AmazonAwsExternalServerType,
    "amazon_aws_external_server",
    amazon_aws::amazon_aws_config
);
define_resource_type!(VaultExternalServerType, "vault_external_server", vault::vault_config);
define_resource_type!(SyslogExternalServerType, "syslog_external_server", syslog::syslog_config);
define_resource_type!(
    PingOneHttpExternalServerType,
    "ping_one_http_external_server",
    ping_one_http::ping_one_http_config
);
define_resource_type!(HttpExternalServerType, "http_external_server", http::http_config);
define_resource_type!(SmtpExternalServerType, "smtp_external_server", smtp::smtp_config);

/// Returns all resource types supported by this provider
pub fn resource_types() -> Vec<Box<dyn ResourceType>> {
    vec![
        Box::new(AmazonAwsExternalServerType),
        Box::new(VaultExternalServerType),
        Box::new(SyslogExternalServerType),
        Box::new(PingOneHttpExternalServerType),
        Box::new(HttpExternalServerType),
        Box::new(SmtpExternalServerType),
    ]
}
