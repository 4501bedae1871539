//! Poll stage: fetch each tracked build until all of them reach a terminal status.

use std::time::{Duration, Instant};

use crate::api::{display_value, BuildApi};
use crate::cancel::CancelToken;
use crate::color::{log_info, log_warn};
use crate::config::WaitPolicy;
use crate::discovery::TrackedBuilds;
use crate::errors::{CiError, Result};

const SCOPE: &str = "poll";

pub const TERMINAL_STATUSES: [&str; 3] = ["success", "failed", "canceled"];

pub fn is_terminal(status: &str) -> bool {
    TERMINAL_STATUSES.contains(&status)
}

/// Final state of one build.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildOutcome {
    pub id: String,
    pub name: String,
    pub status: String,
    pub elapsed: Duration,
}

/// `Duration` as `1m 23s 456ms`, truncated to milliseconds.
pub fn format_elapsed(d: Duration) -> String {
    let ms = Duration::from_millis(d.as_millis() as u64);
    humantime::format_duration(ms).to_string()
}

/// One pass over the pending builds. Returns the outcomes that became terminal in this pass.
fn poll_round(
    api: &dyn BuildApi,
    builds: &mut TrackedBuilds,
    cancel: &CancelToken,
    use_err: bool,
) -> Result<Vec<BuildOutcome>> {
    let mut finished = Vec::new();
    for (id, rec) in builds.iter_mut().filter(|(_, r)| !r.done) {
        if cancel.is_cancelled() {
            return Err(CiError::Cancelled);
        }
        let detail = match api.build_detail(id) {
            Ok(d) => d,
            Err(e) => {
                log_warn(use_err, SCOPE, &format!("build {id}: {e}"));
                continue;
            }
        };
        let (Some(r), Some(name), Some(status)) =
            (detail.get("ref"), detail.get("name"), detail.get("status"))
        else {
            tracing::debug!(%id, "build detail lacks ref/name/status");
            continue;
        };
        let name = display_value(name);
        let status_text = display_value(status);
        log_info(
            use_err,
            SCOPE,
            &format!("{} [{}] build status: {}", display_value(r), name, status_text),
        );
        if status.as_str().is_some_and(is_terminal) {
            rec.done = true;
            let elapsed = rec.start.elapsed();
            log_info(
                use_err,
                SCOPE,
                &format!("The {} build took {} to run.", name, format_elapsed(elapsed)),
            );
            finished.push(BuildOutcome {
                id: id.clone(),
                name,
                status: status_text,
                elapsed,
            });
        }
    }
    Ok(finished)
}

/// Poll until every tracked build is terminal, the wait bound is hit, or the token fires.
///
/// Takes ownership of the tracked builds; nothing else observes them while polling.
pub fn poll_until_done(
    api: &dyn BuildApi,
    mut builds: TrackedBuilds,
    policy: &WaitPolicy,
    cancel: &CancelToken,
    use_err: bool,
) -> Result<Vec<BuildOutcome>> {
    let started = Instant::now();
    let mut outcomes = Vec::with_capacity(builds.len());
    let mut round: u64 = 0;
    loop {
        round += 1;
        tracing::debug!(round, pending = builds.values().filter(|r| !r.done).count(), "poll round");
        outcomes.extend(poll_round(api, &mut builds, cancel, use_err)?);

        if builds.values().all(|r| r.done) {
            return Ok(outcomes);
        }

        let mut pause = policy.poll_interval;
        if let Some(max) = policy.max_wait {
            let waited = started.elapsed();
            if waited >= max {
                let pending: Vec<&str> = builds
                    .values()
                    .filter(|r| !r.done)
                    .map(|r| r.id.as_str())
                    .collect();
                return Err(CiError::PollTimeout {
                    waited: format_elapsed(waited),
                    pending: pending.join(", "),
                });
            }
            pause = pause.min(max - waited);
        }
        if !cancel.sleep(pause) {
            return Err(CiError::Cancelled);
        }
    }
}
