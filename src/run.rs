//! Top-level flow: trigger, then optionally discover and poll.

use crate::api::{derive_base_url, http_client, GitlabApi};
use crate::cancel::{install_signal_handlers, CancelToken};
use crate::color::{color_enabled_stderr, log_error, log_info};
use crate::config::RunConfig;
use crate::discovery::discover_builds;
use crate::errors::{CiError, Result};
use crate::poll::{format_elapsed, poll_until_done, BuildOutcome};
use crate::trigger;

/// Log a fatal error the way the failing stage reports it.
pub fn report_error(use_err: bool, e: &CiError) {
    let scope = match e {
        CiError::Validation(_) => "validate",
        CiError::BadBaseUrl(_) => "wait",
        CiError::TriggerUnreachable(_) | CiError::TriggerRejected { .. } => "trigger",
        CiError::NoBuildsDetected => "discover",
        CiError::PollTimeout { .. } | CiError::Cancelled => "poll",
        CiError::Http { .. } | CiError::Client(_) => "main",
    };
    match e {
        CiError::NoBuildsDetected => {
            log_error(use_err, scope, &e.to_string());
            log_error(use_err, scope, "You can check the status manually in GitLab.");
        }
        CiError::Cancelled => log_error(use_err, scope, "Stopped waiting; builds keep running."),
        _ => log_error(use_err, scope, &e.to_string()),
    }
}

fn summary_line(outcomes: &[BuildOutcome]) -> String {
    let parts: Vec<String> = outcomes
        .iter()
        .map(|o| format!("{} {} {} ({})", o.id, o.name, o.status, format_elapsed(o.elapsed)))
        .collect();
    format!("{} build(s) finished: {}", outcomes.len(), parts.join("; "))
}

pub fn run(cfg: &RunConfig) -> Result<()> {
    let use_err = color_enabled_stderr();
    let req = trigger::validate(&cfg.inputs)?;

    // Everything the wait stages need is checked before the build is triggered.
    let wait_target = if cfg.wait {
        let user_token = cfg
            .user_token
            .as_deref()
            .filter(|s| !s.trim().is_empty())
            .ok_or_else(|| {
                CiError::Validation(
                    "No user private token provided. See -h option for more information."
                        .to_string(),
                )
            })?;
        Some((derive_base_url(&req.url)?, user_token.to_string()))
    } else {
        None
    };

    if req.version.is_some() {
        log_info(use_err, "trigger", "Starting official build.");
    }

    if cfg.dry_run {
        log_info(use_err, "trigger", &format!("Dry run: POST {}", req.url));
        log_info(use_err, "trigger", &format!("Body: {}", req.redacted_body()));
        if let Some((base, _)) = &wait_target {
            log_info(use_err, "wait", &format!("Would poll builds under {base}"));
        }
        return Ok(());
    }

    let client = http_client(&cfg.http)?;
    match req.send(&client) {
        Ok(status) => log_info(use_err, "trigger", &format!("Response status: {status}")),
        Err(CiError::TriggerRejected { status }) => {
            log_info(use_err, "trigger", &format!("Response status: {status}"));
            return Err(CiError::TriggerRejected { status });
        }
        Err(e) => return Err(e),
    }

    let Some((base, user_token)) = wait_target else {
        return Ok(());
    };

    install_signal_handlers();
    let cancel = CancelToken::from_signals();
    log_info(use_err, "wait", "Press CTRL+C to terminate.");
    log_info(use_err, "wait", &format!("Base URL: {base}"));

    let api = GitlabApi::new(client, base, user_token);
    let builds = discover_builds(&api, &req.ref_name, &cfg.policy, &cancel, use_err)?;
    let outcomes = poll_until_done(&api, builds, &cfg.policy, &cancel, use_err)?;
    log_info(use_err, "wait", &summary_line(&outcomes));
    Ok(())
}
