//! Provider configuration.
//!
//! The provider block is decoded into [`ProviderConfig`] and then overlaid
//! with `BOUNDARY_*` environment variables for any field left unset.

use serde::Deserialize;
use std::time::Duration;

use crate::error::ProviderError;
use crate::schema::{Attribute, Diagnostic, Schema};

/// Environment variable holding the controller address.
pub const ENV_ADDR: &str = "BOUNDARY_ADDR";
/// Environment variable holding a pre-issued auth token.
pub const ENV_TOKEN: &str = "BOUNDARY_TOKEN";
/// Environment variable holding the password auth method id.
pub const ENV_AUTH_METHOD_ID: &str = "BOUNDARY_AUTH_METHOD_ID";

const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 60;

/// Settings needed to talk to a Boundary controller.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ProviderConfig {
    /// Base URL of the controller, e.g. `http://127.0.0.1:9200`.
    #[serde(default)]
    pub addr: Option<String>,
    /// Pre-issued auth token. Takes precedence over password authentication.
    #[serde(default)]
    pub token: Option<String>,
    /// Id of the password auth method used to log in.
    #[serde(default)]
    pub auth_method_id: Option<String>,
    /// Login name for the password auth method.
    #[serde(default)]
    pub password_auth_method_login_name: Option<String>,
    /// Password for the password auth method.
    #[serde(default)]
    pub password_auth_method_password: Option<String>,
    /// Skip TLS certificate verification.
    #[serde(default)]
    pub tls_insecure: Option<bool>,
    /// Per-request timeout in seconds.
    #[serde(default)]
    pub request_timeout_secs: Option<u64>,
}

/// Credentials used for password authentication.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PasswordLogin {
    /// Auth method id (`ampw_...`).
    pub auth_method_id: String,
    /// Account login name.
    pub login_name: String,
    /// Account password.
    pub password: String,
}

impl ProviderConfig {
    /// Decode the provider block and overlay the process environment.
    pub fn from_value(config: serde_json::Value) -> Result<Self, ProviderError> {
        Self::from_value_with_env(config, |key| std::env::var(key).ok())
    }

    /// Decode the provider block and overlay values from `env`.
    ///
    /// Values present in the block always win.
    pub fn from_value_with_env(
        config: serde_json::Value,
        env: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ProviderError> {
        let mut parsed: ProviderConfig = if config.is_null() {
            ProviderConfig::default()
        } else {
            serde_json::from_value(config)
                .map_err(|e| ProviderError::Configuration(e.to_string()))?
        };

        for field in [
            &mut parsed.addr,
            &mut parsed.token,
            &mut parsed.auth_method_id,
            &mut parsed.password_auth_method_login_name,
            &mut parsed.password_auth_method_password,
        ] {
            *field = field.take().filter(|value| !value.is_empty());
        }

        fill_from_env(&mut parsed.addr, ENV_ADDR, &env);
        fill_from_env(&mut parsed.token, ENV_TOKEN, &env);
        fill_from_env(&mut parsed.auth_method_id, ENV_AUTH_METHOD_ID, &env);

        if let Some(addr) = parsed.addr.as_mut() {
            while addr.ends_with('/') {
                addr.pop();
            }
        }

        Ok(parsed)
    }

    /// Check that the configuration is usable, returning one diagnostic per problem.
    pub fn diagnostics(&self) -> Vec<Diagnostic> {
        let mut diagnostics = Vec::new();

        if self.addr.as_deref().map_or(true, str::is_empty) {
            diagnostics.push(
                Diagnostic::error("Missing Boundary address")
                    .with_detail(format!("Set `addr` or the {} environment variable", ENV_ADDR))
                    .with_attribute("addr"),
            );
        }

        if self.token.is_none() && self.password_login().is_none() {
            diagnostics.push(
                Diagnostic::error("Missing Boundary credentials").with_detail(
                    "Set `token`, or all of `auth_method_id`, \
                     `password_auth_method_login_name` and `password_auth_method_password`",
                ),
            );
        }

        if self.request_timeout_secs == Some(0) {
            diagnostics.push(
                Diagnostic::error("Invalid request timeout")
                    .with_detail("request_timeout_secs must be at least 1")
                    .with_attribute("request_timeout_secs"),
            );
        }

        diagnostics
    }

    /// The controller address. Only valid after [`diagnostics`](Self::diagnostics) passed.
    pub fn addr(&self) -> Result<&str, ProviderError> {
        self.addr
            .as_deref()
            .filter(|addr| !addr.is_empty())
            .ok_or_else(|| ProviderError::Configuration("addr is not set".to_string()))
    }

    /// Password credentials, if all three parts are present.
    pub fn password_login(&self) -> Option<PasswordLogin> {
        Some(PasswordLogin {
            auth_method_id: self.auth_method_id.clone()?,
            login_name: self.password_auth_method_login_name.clone()?,
            password: self.password_auth_method_password.clone()?,
        })
    }

    /// Whether TLS certificate verification is disabled.
    pub fn tls_insecure(&self) -> bool {
        self.tls_insecure.unwrap_or(false)
    }

    /// Per-request timeout.
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(
            self.request_timeout_secs
                .unwrap_or(DEFAULT_REQUEST_TIMEOUT_SECS),
        )
    }

    /// Schema of the provider configuration block.
    pub fn schema() -> Schema {
        Schema::v0()
            .with_description("Configuration for connecting to a Boundary controller")
            .with_attribute(
                "addr",
                Attribute::optional_string().with_description(format!(
                    "Base URL of the Boundary controller. Falls back to {}",
                    ENV_ADDR
                )),
            )
            .with_attribute(
                "token",
                Attribute::optional_string()
                    .sensitive()
                    .with_description(format!("Auth token. Falls back to {}", ENV_TOKEN)),
            )
            .with_attribute(
                "auth_method_id",
                Attribute::optional_string()
                    .with_description("Password auth method id used when no token is set"),
            )
            .with_attribute(
                "password_auth_method_login_name",
                Attribute::optional_string(),
            )
            .with_attribute(
                "password_auth_method_password",
                Attribute::optional_string().sensitive(),
            )
            .with_attribute(
                "tls_insecure",
                Attribute::optional_bool()
                    .with_default(serde_json::Value::Bool(false))
                    .with_description("Skip TLS certificate verification"),
            )
            .with_attribute(
                "request_timeout_secs",
                Attribute::optional_int64()
                    .with_default(serde_json::json!(DEFAULT_REQUEST_TIMEOUT_SECS)),
            )
    }
}

fn fill_from_env(field: &mut Option<String>, key: &str, env: &impl Fn(&str) -> Option<String>) {
    if field.is_none() {
        *field = env(key).filter(|value| !value.is_empty());
    }
}
