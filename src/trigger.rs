//! Trigger stage: validate inputs and POST the pipeline trigger.

use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::blocking::Client;
use reqwest::header::CONTENT_TYPE;

use crate::config::TriggerInputs;
use crate::errors::{CiError, Result};

const SEE_HELP: &str = "See -h option for more information.";

pub const VERSION_VARIABLE: &str = "variables[FULL_VERSION]";

static FULL_VERSION_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d+\.\d+\.\d+\.\d+$").expect("static version pattern"));

/// A validated trigger request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TriggerRequest {
    pub url: String,
    pub ref_name: String,
    pub token: String,
    /// Present only in tag mode.
    pub version: Option<String>,
}

/// `major.minor.build.revision`, all numeric.
pub fn is_full_version(s: &str) -> bool {
    FULL_VERSION_RE.is_match(s)
}

/// Blank counts as missing; anything else is kept byte-for-byte.
fn required(v: &Option<String>, what: &str) -> Result<String> {
    match v.as_deref() {
        Some(s) if !s.trim().is_empty() => Ok(s.to_string()),
        _ => Err(CiError::Validation(format!("{what} {SEE_HELP}"))),
    }
}

/// Check presence of ref, token and URL, and the version format in tag mode.
pub fn validate(inputs: &TriggerInputs) -> Result<TriggerRequest> {
    let ref_name = required(&inputs.ref_name, "No ref/branch provided.")?;
    let token = required(&inputs.token, "No trigger token provided.")?;
    let url = required(&inputs.url, "No target url.")?;

    match url::Url::parse(&url) {
        Ok(u) if u.scheme() == "http" || u.scheme() == "https" => {}
        _ => {
            return Err(CiError::Validation(format!(
                "Invalid target url (expected http:// or https://): {url}"
            )))
        }
    }

    let version = if inputs.tag {
        let v = required(&inputs.version, "No version provided.")?;
        if !is_full_version(&v) {
            return Err(CiError::Validation(format!(
                "Invalid version format. Should be 'major.minor.build.revision': {v}"
            )));
        }
        Some(v)
    } else {
        None
    };

    Ok(TriggerRequest {
        url,
        ref_name,
        token,
        version,
    })
}

impl TriggerRequest {
    pub fn form_pairs(&self) -> Vec<(&'static str, &str)> {
        let mut pairs = vec![("ref", self.ref_name.as_str()), ("token", self.token.as_str())];
        if let Some(v) = self.version.as_deref() {
            pairs.push((VERSION_VARIABLE, v));
        }
        pairs
    }

    /// application/x-www-form-urlencoded body.
    pub fn encode_body(&self) -> String {
        encode_form(&self.form_pairs())
    }

    /// Body with the trigger token masked, for dry-run output.
    pub fn redacted_body(&self) -> String {
        let pairs: Vec<(&str, &str)> = self
            .form_pairs()
            .into_iter()
            .map(|(k, v)| if k == "token" { (k, "***") } else { (k, v) })
            .collect();
        encode_form(&pairs)
    }

    /// POST the trigger and return the response status line (e.g. `201 Created`).
    ///
    /// Transport failures become `TriggerUnreachable`; a non-success status becomes
    /// `TriggerRejected` carrying the status line.
    pub fn send(&self, client: &Client) -> Result<String> {
        tracing::debug!(url = %self.url, tag = self.version.is_some(), "posting trigger");
        let resp = client
            .post(&self.url)
            .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(self.encode_body())
            .send()
            .map_err(|e| CiError::TriggerUnreachable(e.to_string()))?;
        let status = resp.status();
        let line = status.to_string();
        if status.is_success() {
            Ok(line)
        } else {
            let body = resp.text().unwrap_or_default();
            tracing::debug!(%status, body = %body.trim(), "trigger rejected");
            Err(CiError::TriggerRejected { status: line })
        }
    }
}

pub fn encode_form(pairs: &[(&str, &str)]) -> String {
    pairs
        .iter()
        .map(|(k, v)| format!("{}={}", urlencoding::encode(k), urlencoding::encode(v)))
        .collect::<Vec<_>>()
        .join("&")
}
