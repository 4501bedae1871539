//! Trigger a GitLab CI pipeline for a ref and optionally wait for the builds it starts.
//!
//! Stages run strictly in sequence on one thread:
//! - [`trigger`]: validate inputs and POST the trigger form.
//! - [`discovery`]: list running/pending builds and track the ones for the ref.
//! - [`poll`]: fetch each tracked build until all are terminal.
//!
//! [`run::run`] ties them together; the binary only parses flags and maps errors to exit codes.

pub mod api;
pub mod cancel;
pub mod color;
pub mod config;
pub mod discovery;
pub mod errors;
pub mod poll;
pub mod run;
pub mod telemetry;
pub mod trigger;

pub use api::{derive_base_url, BuildApi, GitlabApi, Scope};
pub use cancel::CancelToken;
pub use color::{color_enabled_stderr, set_color_mode, ColorMode};
pub use config::{parse_duration, HttpConfig, RunConfig, TriggerInputs, WaitPolicy};
pub use discovery::{discover_builds, BuildRecord, TrackedBuilds};
pub use errors::{exit_code_for_error, CiError};
pub use poll::{poll_until_done, BuildOutcome};
pub use trigger::{is_full_version, TriggerRequest};
