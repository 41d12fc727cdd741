/*!
`pdconf-client` talks to the `external-servers` collection of the PingDirectory
Configuration API.

Every call is a single request authenticated with HTTP basic auth:

| Call | Request |
|---|---|
| add | `POST /config/external-servers` |
| get | `GET /config/external-servers/{name}` (404 yields `None`) |
| update | `PATCH /config/external-servers/{name}` |
| delete | `DELETE /config/external-servers/{name}` |

Response bodies are logged at debug level. Request bodies are not logged since
they may carry secrets.
*/

pub mod error;
pub mod models;

use async_trait::async_trait;
use log::{debug, info};
use reqwest::{Client, Method, StatusCode};
use serde::de::DeserializeOwned;
use url::Url;

pub use error::{ClientError, Result};
pub use models::{
    AddExternalServerRequest, ErrorResponse, ExternalServerResponse, Messages, PatchOp,
    PatchOperation, RequiredAction, UpdateRequest,
};

const COLLECTION_PATH: [&str; 2] = ["config", "external-servers"];

/// Operations on the External Server collection
///
/// This is the seam the provider depends on, so tests can substitute it.
#[async_trait]
pub trait ExternalServerApi: Send + Sync {
    async fn add(&self, request: &AddExternalServerRequest) -> Result<ExternalServerResponse>;

    /// Returns `None` when the server does not know the object
    async fn get(&self, name: &str) -> Result<Option<ExternalServerResponse>>;

    async fn update(&self, name: &str, request: &UpdateRequest) -> Result<ExternalServerResponse>;

    async fn delete(&self, name: &str) -> Result<()>;
}

/// Connection settings for [`ConfigClient`]
#[derive(Debug, Clone)]
pub struct ClientSettings {
    /// Scheme, host and port of the server (e.g., `https://localhost:1443`)
    pub base_url: Url,
    pub username: String,
    pub password: String,
    /// Skip TLS certificate verification
    pub accept_invalid_certs: bool,
}

/// HTTP implementation of [`ExternalServerApi`]
pub struct ConfigClient {
    http: Client,
    base_url: Url,
    username: String,
    password: String,
}

impl ConfigClient {
    pub fn new(settings: ClientSettings) -> Result<Self> {
        if settings.base_url.cannot_be_a_base() {
            return Err(ClientError::InvalidBaseUrl {
                url: settings.base_url.to_string(),
                reason: "URL cannot be used as a base".to_string(),
            });
        }

        let http = Client::builder()
            .danger_accept_invalid_certs(settings.accept_invalid_certs)
            .build()
            .map_err(ClientError::Build)?;

        Ok(Self {
            http,
            base_url: settings.base_url,
            username: settings.username,
            password: settings.password,
        })
    }

    /// URL of the collection, or of one object in it
    fn endpoint(&self, name: Option<&str>) -> Result<Url> {
        let mut url = self.base_url.clone();
        {
            let mut segments = url
                .path_segments_mut()
                .map_err(|_| ClientError::InvalidBaseUrl {
                    url: self.base_url.to_string(),
                    reason: "URL cannot be used as a base".to_string(),
                })?;
            segments.pop_if_empty().extend(COLLECTION_PATH);
            if let Some(name) = name {
                segments.push(name);
            }
        }
        Ok(url)
    }

    async fn send(
        &self,
        method: Method,
        url: &Url,
        body: Option<serde_json::Value>,
    ) -> Result<(StatusCode, String)> {
        debug!("Sending {} {}", method, url);

        let mut request = self
            .http
            .request(method.clone(), url.clone())
            .basic_auth(&self.username, Some(&self.password))
            .header(reqwest::header::ACCEPT, "application/json");
        if let Some(body) = body {
            request = request.json(&body);
        }

        let request_error = |source| ClientError::Request {
            method: method.to_string(),
            url: url.to_string(),
            source,
        };
        let response = request.send().await.map_err(request_error)?;
        let status = response.status();
        let text = response.text().await.map_err(request_error)?;
        debug!("{} {} returned {}: {}", method, url, status, text);

        Ok((status, text))
    }

    fn check(method: &Method, url: &Url, status: StatusCode, body: String) -> Result<String> {
        if status.is_success() {
            return Ok(body);
        }
        let detail = serde_json::from_str::<ErrorResponse>(&body)
            .ok()
            .and_then(|e| e.detail);
        Err(ClientError::Status {
            method: method.to_string(),
            url: url.to_string(),
            status: status.as_u16(),
            body,
            detail,
        })
    }

    fn decode<T: DeserializeOwned>(url: &Url, body: &str) -> Result<T> {
        serde_json::from_str(body).map_err(|source| ClientError::Decode {
            url: url.to_string(),
            source,
        })
    }

    async fn call<T: DeserializeOwned>(
        &self,
        method: Method,
        url: Url,
        body: Option<serde_json::Value>,
    ) -> Result<T> {
        let (status, text) = self.send(method.clone(), &url, body).await?;
        let text = Self::check(&method, &url, status, text)?;
        Self::decode(&url, &text)
    }
}

fn to_body<T: serde::Serialize>(value: &T) -> Result<serde_json::Value> {
    serde_json::to_value(value).map_err(ClientError::Encode)
}

#[async_trait]
impl ExternalServerApi for ConfigClient {
    async fn add(&self, request: &AddExternalServerRequest) -> Result<ExternalServerResponse> {
        info!("Adding external server {}", request.server_name);
        let url = self.endpoint(None)?;
        let body = to_body(request)?;
        self.call(Method::POST, url, Some(body)).await
    }

    async fn get(&self, name: &str) -> Result<Option<ExternalServerResponse>> {
        let url = self.endpoint(Some(name))?;
        let (status, text) = self.send(Method::GET, &url, None).await?;
        if status == StatusCode::NOT_FOUND {
            debug!("External server {} not found", name);
            return Ok(None);
        }
        let text = Self::check(&Method::GET, &url, status, text)?;
        Self::decode(&url, &text).map(Some)
    }

    async fn update(&self, name: &str, request: &UpdateRequest) -> Result<ExternalServerResponse> {
        info!(
            "Updating external server {} ({} operations)",
            name,
            request.operations.len()
        );
        let url = self.endpoint(Some(name))?;
        let body = to_body(request)?;
        self.call(Method::PATCH, url, Some(body)).await
    }

    async fn delete(&self, name: &str) -> Result<()> {
        info!("Deleting external server {}", name);
        let url = self.endpoint(Some(name))?;
        let (status, text) = self.send(Method::DELETE, &url, None).await?;
        Self::check(&Method::DELETE, &url, status, text)?;
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use httptest::{Expectation, Server, matchers::*, responders::*};
    use serde_json::json;

    fn client_for(server: &Server) -> ConfigClient {
        let base_url = Url::parse(&format!("http://{}", server.addr())).unwrap();
        ConfigClient::new(ClientSettings {
            base_url,
            username: "cn=administrator".to_string(),
            password: "2FederateM0re".to_string(),
            accept_invalid_certs: false,
        })
        .unwrap()
    }

    fn syslog_body() -> serde_json::Value {
        json!({
            "schemas": ["urn:pingidentity:schemas:configuration:2.0:external-server:syslog"],
            "id": "central-syslog",
            "serverHostName": "logs.example.com",
            "serverPort": 514,
            "transportMechanism": "udp"
        })
    }

    #[tokio::test]
    async fn add_posts_to_collection() {
        let server = Server::run();
        server.expect(
            Expectation::matching(all_of![
                request::method_path("POST", "/config/external-servers"),
                request::headers(contains(key("authorization"))),
                request::body(json_decoded(eq(json!({
                    "schemas": ["urn:pingidentity:schemas:configuration:2.0:external-server:syslog"],
                    "serverName": "central-syslog",
                    "serverHostName": "logs.example.com"
                })))),
            ])
            .times(1)
            .respond_with(json_encoded(syslog_body())),
        );

        let client = client_for(&server);
        let mut request = AddExternalServerRequest::new(
            models::external_server_urn("syslog"),
            "central-syslog",
        );
        request
            .properties
            .insert("serverHostName".to_string(), json!("logs.example.com"));

        let response = client.add(&request).await.unwrap();
        assert_eq!(response.id, "central-syslog");
        assert_eq!(response.properties["serverPort"], json!(514));
    }

    #[tokio::test]
    async fn get_returns_none_on_not_found() {
        let server = Server::run();
        server.expect(
            Expectation::matching(request::method_path(
                "GET",
                "/config/external-servers/missing",
            ))
            .times(1)
            .respond_with(status_code(404)),
        );

        let client = client_for(&server);
        assert_eq!(client.get("missing").await.unwrap(), None);
    }

    #[tokio::test]
    async fn get_decodes_existing_object() {
        let server = Server::run();
        server.expect(
            Expectation::matching(request::method_path(
                "GET",
                "/config/external-servers/central-syslog",
            ))
            .times(1)
            .respond_with(json_encoded(syslog_body())),
        );

        let client = client_for(&server);
        let response = client.get("central-syslog").await.unwrap().unwrap();
        assert_eq!(response.properties["transportMechanism"], json!("udp"));
    }

    #[tokio::test]
    async fn update_sends_patch_operations() {
        let server = Server::run();
        server.expect(
            Expectation::matching(all_of![
                request::method_path("PATCH", "/config/external-servers/central-syslog"),
                request::body(json_decoded(eq(json!({"operations": [
                    {"op": "replace", "path": "serverPort", "value": 1514}
                ]})))),
            ])
            .times(1)
            .respond_with(json_encoded(syslog_body())),
        );

        let client = client_for(&server);
        let request = UpdateRequest {
            operations: vec![PatchOperation {
                op: PatchOp::Replace,
                path: "serverPort".to_string(),
                value: Some(json!(1514)),
            }],
        };
        client.update("central-syslog", &request).await.unwrap();
    }

    #[tokio::test]
    async fn error_status_carries_detail_and_body() {
        let server = Server::run();
        let error_body = json!({
            "schemas": ["urn:ietf:params:scim:api:messages:2.0:Error"],
            "status": "400",
            "detail": "Invalid value for awsRegionName"
        });
        server.expect(
            Expectation::matching(request::method_path("POST", "/config/external-servers"))
                .times(1)
                .respond_with(status_code(400).body(error_body.to_string())),
        );

        let client = client_for(&server);
        let request = AddExternalServerRequest::new(
            models::external_server_urn("amazon-aws"),
            "aws",
        );
        let err = client.add(&request).await.unwrap_err();
        assert_eq!(err.status(), Some(400));
        assert!(err.body().unwrap().contains("awsRegionName"));
        assert!(err.to_string().contains("Invalid value for awsRegionName"));
    }

    #[tokio::test]
    async fn delete_targets_object() {
        let server = Server::run();
        server.expect(
            Expectation::matching(request::method_path(
                "DELETE",
                "/config/external-servers/central-syslog",
            ))
            .times(1)
            .respond_with(status_code(204)),
        );

        let client = client_for(&server);
        client.delete("central-syslog").await.unwrap();
    }

    #[test]
    fn endpoint_keeps_base_path() {
        let client = ConfigClient::new(ClientSettings {
            base_url: Url::parse("https://ds.example.com:1443/").unwrap(),
            username: "u".to_string(),
            password: "p".to_string(),
            accept_invalid_certs: true,
        })
        .unwrap();
        assert_eq!(
            client.endpoint(Some("a b")).unwrap().as_str(),
            "https://ds.example.com:1443/config/external-servers/a%20b"
        );
    }
}
