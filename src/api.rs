//! Build status API: base URL derivation, the `BuildApi` seam and its GitLab HTTP implementation.

use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::blocking::Client;
use serde_json::{Map, Value};

use crate::config::HttpConfig;
use crate::errors::{CiError, Result};

pub const PRIVATE_TOKEN_HEADER: &str = "PRIVATE-TOKEN";

static BASE_URL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^http.+projects/\d+/").expect("static base url pattern"));

/// A JSON object as returned by the provider; values are heterogeneous.
pub type JsonObject = Map<String, Value>;

/// Build-list filter.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Scope {
    Running,
    Pending,
}

impl Scope {
    /// Discovery order.
    pub const ALL: [Scope; 2] = [Scope::Running, Scope::Pending];

    pub fn as_str(&self) -> &'static str {
        match self {
            Scope::Running => "running",
            Scope::Pending => "pending",
        }
    }
}

/// Derive `http(s)://host/.../projects/<id>/` from the trigger URL.
pub fn derive_base_url(trigger_url: &str) -> Result<String> {
    BASE_URL_RE
        .find(trigger_url)
        .map(|m| m.as_str().to_string())
        .ok_or_else(|| CiError::BadBaseUrl(trigger_url.to_string()))
}

/// Read access to the provider's builds.
pub trait BuildApi {
    /// `GET <base>builds?scope=<scope>`; non-object array entries are dropped.
    fn list_builds(&self, scope: Scope) -> Result<Vec<JsonObject>>;

    /// `GET <base>builds/<id>`.
    fn build_detail(&self, id: &str) -> Result<JsonObject>;
}

pub fn http_client(cfg: &HttpConfig) -> Result<Client> {
    Client::builder()
        .timeout(cfg.timeout)
        .user_agent(cfg.user_agent.as_str())
        .build()
        .map_err(|e| CiError::Client(format!("failed to build HTTP client: {e}")))
}

pub struct GitlabApi {
    client: Client,
    base: String,
    private_token: String,
}

impl GitlabApi {
    pub fn new(client: Client, base: impl Into<String>, private_token: impl Into<String>) -> Self {
        Self {
            client,
            base: base.into(),
            private_token: private_token.into(),
        }
    }

    pub fn base(&self) -> &str {
        &self.base
    }

    fn get_text(&self, url: &str) -> Result<String> {
        tracing::debug!(%url, "GET");
        let resp = self
            .client
            .get(url)
            .header(PRIVATE_TOKEN_HEADER, &self.private_token)
            .send()?;
        let status = resp.status();
        if !status.is_success() {
            return Err(CiError::Http {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }
        Ok(resp.text()?)
    }
}

impl BuildApi for GitlabApi {
    fn list_builds(&self, scope: Scope) -> Result<Vec<JsonObject>> {
        let url = format!("{}builds?scope={}", self.base, scope.as_str());
        let body = self.get_text(&url)?;
        parse_build_list(&body)
    }

    fn build_detail(&self, id: &str) -> Result<JsonObject> {
        let url = format!("{}builds/{}", self.base, urlencoding::encode(id));
        let body = self.get_text(&url)?;
        parse_build_detail(&body)
    }
}

pub fn parse_build_list(body: &str) -> Result<Vec<JsonObject>> {
    let items: Vec<Value> = serde_json::from_str(body)?;
    Ok(items
        .into_iter()
        .filter_map(|v| match v {
            Value::Object(m) => Some(m),
            _ => None,
        })
        .collect())
}

pub fn parse_build_detail(body: &str) -> Result<JsonObject> {
    Ok(serde_json::from_str(body)?)
}

/// Render a JSON value for log lines: strings verbatim, everything else as JSON text.
pub fn display_value(v: &Value) -> String {
    match v {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
