//! Discovery stage: find the builds the trigger started.
//!
//! Each scope is listed up to `discovery_attempts` times, stopping at the first non-empty list.
//! Builds whose `ref` equals the requested ref are tracked from the moment they are seen.

use std::collections::BTreeMap;
use std::time::Instant;

use serde_json::Value;

use crate::api::{BuildApi, JsonObject, Scope};
use crate::cancel::CancelToken;
use crate::color::{log_info, log_warn};
use crate::config::WaitPolicy;
use crate::errors::{CiError, Result};

const SCOPE: &str = "discover";

/// Per-build tracking state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildRecord {
    pub id: String,
    pub done: bool,
    pub start: Instant,
}

impl BuildRecord {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            done: false,
            start: Instant::now(),
        }
    }
}

/// Build ID to record.
pub type TrackedBuilds = BTreeMap<String, BuildRecord>;

/// Stringify a provider build ID: numbers in decimal, strings verbatim.
pub fn id_string(v: &Value) -> Option<String> {
    match v {
        Value::Number(n) => Some(n.to_string()),
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        _ => None,
    }
}

/// IDs of the listed builds whose `ref` is exactly `ref_name`.
pub fn matching_ids(items: &[JsonObject], ref_name: &str) -> Vec<String> {
    items
        .iter()
        .filter(|item| item.get("ref").and_then(Value::as_str) == Some(ref_name))
        .filter_map(|item| item.get("id").and_then(id_string))
        .collect()
}

fn list_scope_with_retry(
    api: &dyn BuildApi,
    scope: Scope,
    policy: &WaitPolicy,
    cancel: &CancelToken,
    use_err: bool,
) -> Result<Vec<JsonObject>> {
    let attempts = policy.discovery_attempts.max(1);
    let mut items = Vec::new();
    for attempt in 1..=attempts {
        if cancel.is_cancelled() {
            return Err(CiError::Cancelled);
        }
        log_info(use_err, SCOPE, "Contacting repository...");
        tracing::debug!(scope = scope.as_str(), attempt, attempts, "listing builds");
        match api.list_builds(scope) {
            Ok(found) => items = found,
            Err(e) => {
                log_warn(use_err, SCOPE, &e.to_string());
                items.clear();
            }
        }
        if !items.is_empty() || attempt == attempts {
            break;
        }
        if !cancel.sleep(policy.discovery_delay) {
            return Err(CiError::Cancelled);
        }
    }
    Ok(items)
}

/// List the running and pending scopes and track every build for `ref_name`.
///
/// An ID seen in both scopes keeps the record from the later scope.
/// Returns `NoBuildsDetected` when nothing matched.
pub fn discover_builds(
    api: &dyn BuildApi,
    ref_name: &str,
    policy: &WaitPolicy,
    cancel: &CancelToken,
    use_err: bool,
) -> Result<TrackedBuilds> {
    let mut tracked = TrackedBuilds::new();
    for scope in Scope::ALL {
        let items = list_scope_with_retry(api, scope, policy, cancel, use_err)?;
        for id in matching_ids(&items, ref_name) {
            if tracked.contains_key(&id) {
                tracing::debug!(%id, scope = scope.as_str(), "build listed again; restarting its clock");
            }
            tracked.insert(id.clone(), BuildRecord::new(id));
        }
    }

    if tracked.is_empty() {
        return Err(CiError::NoBuildsDetected);
    }
    let ids: Vec<&str> = tracked.keys().map(String::as_str).collect();
    log_info(use_err, SCOPE, &format!("Active builds: {}", ids.join(", ")));
    Ok(tracked)
}
