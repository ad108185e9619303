//! HTTP client for the Boundary controller API.
//!
//! Every call is a single request/response. Non-2xx answers become
//! [`ProviderError::Api`] carrying the status and the controller's error kind;
//! nothing is retried.

mod host_catalogs;
mod host_sets;
mod hosts;
mod roles;
mod workers;

pub use host_catalogs::HostCatalog;
pub use host_sets::HostSet;
pub use hosts::{Host, HostAttributes};
pub use roles::Role;
pub use workers::Worker;

use reqwest::{Method, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{Map, Value};
use tracing::debug;

use crate::config::{PasswordLogin, ProviderConfig};
use crate::error::ProviderError;

/// A set of field changes sent in a PATCH body.
///
/// `None` values are sent as JSON `null`, which clears the field on the server.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Patch(Map<String, Value>);

impl Patch {
    /// Create an empty patch.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set or clear an optional string field.
    pub fn string(mut self, field: &str, value: Option<String>) -> Self {
        self.0
            .insert(field.to_string(), value.map(Value::String).unwrap_or(Value::Null));
        self
    }

    /// Set an arbitrary JSON field.
    pub fn value(mut self, field: &str, value: Value) -> Self {
        self.0.insert(field.to_string(), value);
        self
    }

    /// Whether the patch changes nothing.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Field names touched by this patch.
    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    fn into_body(self, version: u32) -> Value {
        let mut body = self.0;
        body.insert("version".to_string(), Value::from(version));
        Value::Object(body)
    }
}

#[derive(Debug, Deserialize)]
struct ListResponse {
    #[serde(default)]
    items: Vec<Value>,
}

#[derive(Debug, Deserialize)]
struct AuthenticateResponse {
    #[serde(default)]
    attributes: AuthenticateAttributes,
}

#[derive(Debug, Default, Deserialize)]
struct AuthenticateAttributes {
    #[serde(default)]
    token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Versioned {
    #[serde(default)]
    version: u32,
}

/// Client for one Boundary controller.
#[derive(Debug, Clone)]
pub struct BoundaryClient {
    http: reqwest::Client,
    addr: String,
    token: Option<String>,
}

impl BoundaryClient {
    /// Build a client from provider configuration without authenticating.
    pub fn new(config: &ProviderConfig) -> Result<Self, ProviderError> {
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout())
            .danger_accept_invalid_certs(config.tls_insecure())
            .build()?;

        Ok(Self {
            http,
            addr: config.addr()?.to_string(),
            token: config.token.clone(),
        })
    }

    /// Build a client and make sure it holds a token.
    ///
    /// A configured token is used as-is; otherwise the password auth method is
    /// used to log in.
    pub async fn connect(config: &ProviderConfig) -> Result<Self, ProviderError> {
        let mut client = Self::new(config)?;
        if client.token.is_none() {
            let login = config.password_login().ok_or_else(|| {
                ProviderError::Configuration(
                    "no token and incomplete password auth method settings".to_string(),
                )
            })?;
            client.authenticate(&login).await?;
        }
        Ok(client)
    }

    /// Log in with a password auth method and keep the returned token.
    pub async fn authenticate(&mut self, login: &PasswordLogin) -> Result<(), ProviderError> {
        let body = serde_json::json!({
            "command": "login",
            "attributes": {
                "login_name": login.login_name,
                "password": login.password,
            }
        });
        let path = format!("auth-methods/{}:authenticate", login.auth_method_id);
        let response: AuthenticateResponse = self
            .send(Method::POST, &path, &[], Some(&body), "error authenticating")
            .await?;

        let token = response.attributes.token.ok_or_else(|| {
            ProviderError::PermissionDenied("authenticate response did not include a token".to_string())
        })?;
        debug!(auth_method_id = %login.auth_method_id, "Authenticated with password auth method");
        self.token = Some(token);
        Ok(())
    }

    /// The controller base address.
    pub fn addr(&self) -> &str {
        &self.addr
    }

    /// The token used for requests, if any.
    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    // =========================================================================
    // Generic item operations
    // =========================================================================

    pub(crate) async fn create_item<T: DeserializeOwned>(
        &self,
        collection: &str,
        body: &Value,
        context: &str,
    ) -> Result<T, ProviderError> {
        self.send(Method::POST, collection, &[], Some(body), context)
            .await
    }

    pub(crate) async fn read_item<T: DeserializeOwned>(
        &self,
        collection: &str,
        id: &str,
        context: &str,
    ) -> Result<T, ProviderError> {
        self.send(Method::GET, &item_path(collection, id), &[], None, context)
            .await
    }

    /// PATCH an item. Without a known `version` the current one is read first.
    pub(crate) async fn update_item<T: DeserializeOwned>(
        &self,
        collection: &str,
        id: &str,
        version: Option<u32>,
        patch: Patch,
        context: &str,
    ) -> Result<T, ProviderError> {
        let version = self.resolve_version(collection, id, version, context).await?;
        let body = patch.into_body(version);
        self.send(Method::PATCH, &item_path(collection, id), &[], Some(&body), context)
            .await
    }

    pub(crate) async fn delete_item(
        &self,
        collection: &str,
        id: &str,
        context: &str,
    ) -> Result<(), ProviderError> {
        self.send_raw(Method::DELETE, &item_path(collection, id), &[], None, context)
            .await
            .map(|_| ())
    }

    /// POST a custom action such as `:set-hosts` against an item.
    pub(crate) async fn item_action<T: DeserializeOwned>(
        &self,
        collection: &str,
        id: &str,
        action: &str,
        version: Option<u32>,
        body: Value,
        context: &str,
    ) -> Result<T, ProviderError> {
        let version = self.resolve_version(collection, id, version, context).await?;
        let mut body = match body {
            Value::Object(map) => map,
            _ => Map::new(),
        };
        body.insert("version".to_string(), Value::from(version));
        let path = format!("{}:{}", item_path(collection, id), action);
        self.send(Method::POST, &path, &[], Some(&Value::Object(body)), context)
            .await
    }

    /// List a collection, returning the raw items.
    pub async fn list(
        &self,
        collection: &str,
        query: &[(String, String)],
    ) -> Result<Vec<Value>, ProviderError> {
        let context = format!("error listing {}", collection);
        let response: ListResponse = self
            .send(Method::GET, collection, query, None, &context)
            .await?;
        Ok(response.items)
    }

    async fn resolve_version(
        &self,
        collection: &str,
        id: &str,
        version: Option<u32>,
        context: &str,
    ) -> Result<u32, ProviderError> {
        match version {
            Some(version) => Ok(version),
            None => {
                let current: Versioned = self.read_item(collection, id, context).await?;
                debug!(collection, id, version = current.version, "Resolved current version");
                Ok(current.version)
            },
        }
    }

    // =========================================================================
    // Transport
    // =========================================================================

    async fn send<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        query: &[(String, String)],
        body: Option<&Value>,
        context: &str,
    ) -> Result<T, ProviderError> {
        let text = self.send_raw(method, path, query, body, context).await?;
        let text = if text.trim().is_empty() { "{}" } else { &text };
        serde_json::from_str(text).map_err(|e| {
            ProviderError::InvalidRequest(format!("{}: unexpected response body: {}", context, e))
        })
    }

    async fn send_raw(
        &self,
        method: Method,
        path: &str,
        query: &[(String, String)],
        body: Option<&Value>,
        context: &str,
    ) -> Result<String, ProviderError> {
        let url = format!("{}/v1/{}", self.addr, path);
        debug!(method = %method, path, "Sending Boundary API request");

        let mut request = self.http.request(method.clone(), &url);
        if !query.is_empty() {
            request = request.query(query);
        }
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await.map_err(|e| ProviderError::from(e).context(context))?;
        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| ProviderError::from(e).context(context))?;
        debug!(method = %method, path, status = status.as_u16(), "Received Boundary API response");

        if status.is_success() || status == StatusCode::NO_CONTENT {
            Ok(text)
        } else {
            Err(ProviderError::from_api_response(context, status.as_u16(), &text))
        }
    }
}

fn item_path(collection: &str, id: &str) -> String {
    format!("{}/{}", collection, id)
}

/// Drop empty strings so they are treated as unset.
pub(crate) fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}
