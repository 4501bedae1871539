#![allow(clippy::module_name_repetitions)]
//! Color mode configuration and stderr log lines.
//!
//! Logging policy:
//! - Every notable event is a single stderr line: `<timestamp> [<scope>] <message>`.
//! - `scope` is the name of the routine emitting the line (`trigger`, `discover`, `poll`, ...).
//! - Use log_info for progress, log_warn for transient failures that are retried,
//!   and log_error for fatal diagnostics right before exiting.
//! - Precompute `use_err = color_enabled_stderr()` once per routine and pass it down.

use clap::ValueEnum;
use once_cell::sync::OnceCell;
use std::time::SystemTime;

#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Debug, ValueEnum)]
pub enum ColorMode {
    Auto,
    Always,
    Never,
}

static COLOR_MODE: OnceCell<ColorMode> = OnceCell::new();

pub fn set_color_mode(mode: ColorMode) {
    let _ = COLOR_MODE.set(mode);
}

/// `CI_TRIGGER_COLOR` takes the same values as `--color`, case-insensitively.
fn env_color_mode_pref() -> Option<ColorMode> {
    let v = std::env::var("CI_TRIGGER_COLOR").ok()?;
    ColorMode::from_str(v.trim(), true).ok()
}

/// NO_COLOR (https://no-color.org/) beats the flag, which beats the env var, which beats the TTY.
fn pick_color(
    no_color: bool,
    flag: Option<ColorMode>,
    env: Option<ColorMode>,
    is_tty: bool,
) -> bool {
    if no_color {
        return false;
    }
    match flag.or(env).unwrap_or(ColorMode::Auto) {
        ColorMode::Always => true,
        ColorMode::Never => false,
        ColorMode::Auto => is_tty,
    }
}

pub fn color_enabled_stderr() -> bool {
    pick_color(
        std::env::var_os("NO_COLOR").is_some(),
        COLOR_MODE.get().copied(),
        env_color_mode_pref(),
        atty::is(atty::Stream::Stderr),
    )
}

/// Wrap string with ANSI color code when enabled; otherwise return unchanged.
pub fn paint(enabled: bool, code: &str, s: &str) -> String {
    if enabled {
        format!("{code}{s}\x1b[0m")
    } else {
        s.to_string()
    }
}

/// `[scope] message`, the uncolored body of a log line.
pub fn scoped_line(scope: &str, msg: &str) -> String {
    format!("[{scope}] {msg}")
}

fn emit(use_color: bool, code: &str, scope: &str, msg: &str) {
    let ts = humantime::format_rfc3339_seconds(SystemTime::now());
    eprintln!("{ts} {}", paint(use_color, code, &scoped_line(scope, msg)));
}

pub fn log_info(use_color: bool, scope: &str, msg: &str) {
    emit(use_color, "\x1b[36;1m", scope, msg);
}

pub fn log_warn(use_color: bool, scope: &str, msg: &str) {
    emit(use_color, "\x1b[33m", scope, msg);
}

pub fn log_error(use_color: bool, scope: &str, msg: &str) {
    emit(use_color, "\x1b[31;1m", scope, msg);
}
