use std::ffi::OsString;
use std::time::Duration;

use clap::{ArgAction, CommandFactory, Parser};

use ci_trigger::{parse_duration, ColorMode, HttpConfig, RunConfig, TriggerInputs, WaitPolicy};

const LONG_VERSION: &str = concat!(
    env!("CARGO_PKG_VERSION"),
    "\nbuilt:  ",
    env!("CI_TRIGGER_BUILD_DATE"),
    "\ntarget: ",
    env!("CI_TRIGGER_BUILD_TARGET"),
    "\nrustc:  ",
    env!("CI_TRIGGER_BUILD_RUSTC"),
);

fn parse_attempts(s: &str) -> Result<u32, String> {
    match s.trim().parse::<u32>() {
        Ok(n) if n >= 1 => Ok(n),
        _ => Err("must be a whole number >= 1".to_string()),
    }
}

#[derive(Parser, Debug)]
#[command(
    name = "ci-trigger",
    version,
    long_version = LONG_VERSION,
    disable_version_flag = true,
    about = "Trigger a GitLab CI build for a ref and optionally wait for it to finish."
)]
pub(crate) struct Cli {
    /// The [branch] to build. Branch names, short commit SHAs, and full commit SHAs are also valid.
    #[arg(long = "ref", env = "CI_TRIGGER_REF", value_name = "BRANCH")]
    pub ref_name: Option<String>,

    /// Trigger a build with tag.
    #[arg(long, action = ArgAction::Set, num_args = 0..=1, require_equals = true,
          default_value_t = false, default_missing_value = "true")]
    pub tag: bool,

    /// The [full-version] of the build in the format 'major.minor.build.revision'.
    #[arg(long, env = "CI_TRIGGER_VERSION", value_name = "FULL_VERSION")]
    pub version: Option<String>,

    /// The [token] for the trigger build authentication.
    #[arg(long, env = "CI_TRIGGER_TOKEN", hide_env_values = true, value_name = "TOKEN")]
    pub token: Option<String>,

    /// The [url] to send the build trigger.
    #[arg(long, env = "CI_TRIGGER_URL", value_name = "URL")]
    pub url: Option<String>,

    /// Wait for the result by polling the build status until done.
    #[arg(long, action = ArgAction::Set, num_args = 0..=1, require_equals = true,
          default_value_t = true, default_missing_value = "true")]
    pub wait: bool,

    /// User's private [token] for accessing url's API.
    #[arg(long = "usrtoken", env = "CI_TRIGGER_USRTOKEN", hide_env_values = true, value_name = "TOKEN")]
    pub user_token: Option<String>,

    /// Attempts per scope when looking for the triggered builds
    #[arg(long = "discovery-attempts", default_value = "5", value_parser = parse_attempts)]
    pub discovery_attempts: u32,

    /// Pause between discovery attempts (e.g. 2s, 500ms)
    #[arg(long = "discovery-delay", default_value = "2s", value_parser = parse_duration)]
    pub discovery_delay: Duration,

    /// Pause between poll rounds
    #[arg(long = "poll-interval", default_value = "10s", value_parser = parse_duration)]
    pub poll_interval: Duration,

    /// Give up polling after this long (default: wait until all builds finish)
    #[arg(long = "max-wait", value_parser = parse_duration)]
    pub max_wait: Option<Duration>,

    /// Per-request HTTP timeout
    #[arg(long = "http-timeout", default_value = "30s", value_parser = parse_duration)]
    pub http_timeout: Duration,

    /// Validate and print the trigger request without sending it
    #[arg(long = "dry-run")]
    pub dry_run: bool,

    /// Colorize output: auto|always|never
    #[arg(long = "color", value_enum)]
    pub color: Option<ColorMode>,

    /// Print version information
    #[arg(short = 'V', long = "print-version", action = ArgAction::Version)]
    #[allow(dead_code)]
    print_version: Option<bool>,
}

impl Cli {
    pub(crate) fn into_run_config(self) -> RunConfig {
        RunConfig {
            inputs: TriggerInputs {
                ref_name: self.ref_name,
                token: self.token,
                url: self.url,
                tag: self.tag,
                version: self.version,
            },
            wait: self.wait,
            user_token: self.user_token,
            dry_run: self.dry_run,
            policy: WaitPolicy {
                discovery_attempts: self.discovery_attempts,
                discovery_delay: self.discovery_delay,
                poll_interval: self.poll_interval,
                max_wait: self.max_wait,
            },
            http: HttpConfig {
                timeout: self.http_timeout,
                ..HttpConfig::default()
            },
        }
    }
}

/// Accept Go flag spellings: `-ref main`, `-wait=false` become `--ref main`, `--wait=false`.
///
/// Only single-dash words naming a known long flag are rewritten; short flags such as `-h`
/// and everything after a bare `--` pass through untouched.
pub(crate) fn normalize_go_flags<I>(args: I) -> Vec<OsString>
where
    I: IntoIterator<Item = OsString>,
{
    let cmd = Cli::command();
    let longs: Vec<String> = cmd
        .get_arguments()
        .filter_map(|a| a.get_long().map(str::to_string))
        .chain(["help".to_string()])
        .collect();

    let mut out = Vec::new();
    let mut passthrough = false;
    for (i, arg) in args.into_iter().enumerate() {
        if i == 0 || passthrough {
            out.push(arg);
            continue;
        }
        let Some(s) = arg.to_str() else {
            out.push(arg);
            continue;
        };
        if s == "--" {
            passthrough = true;
            out.push(arg);
            continue;
        }
        let rewritten = s
            .strip_prefix('-')
            .filter(|rest| !rest.starts_with('-'))
            .filter(|rest| {
                let name = rest.split('=').next().unwrap_or(rest);
                longs.iter().any(|l| l == name)
            })
            .map(|rest| OsString::from(format!("--{rest}")));
        out.push(rewritten.unwrap_or(arg));
    }
    out
}
