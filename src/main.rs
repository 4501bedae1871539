use std::process::ExitCode;

use anyhow::Context;

mod cli;

/// Load `.env` from the working directory; a missing file is not an error.
fn load_dotenv() -> anyhow::Result<()> {
    match dotenvy::dotenv() {
        Ok(_) => Ok(()),
        Err(e) if e.not_found() => Ok(()),
        Err(e) => Err(e).context("failed to load .env"),
    }
}

fn main() -> ExitCode {
    let dotenv_result = load_dotenv();

    let args = cli::normalize_go_flags(std::env::args_os());
    let cli = <cli::Cli as clap::Parser>::parse_from(args);
    if let Some(mode) = cli.color {
        ci_trigger::set_color_mode(mode);
    }
    ci_trigger::telemetry::telemetry_init();

    let use_err = ci_trigger::color_enabled_stderr();
    if let Err(e) = dotenv_result {
        ci_trigger::color::log_warn(use_err, "main", &format!("{e:#}"));
    }

    let cfg = cli.into_run_config();
    match ci_trigger::run::run(&cfg) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            ci_trigger::run::report_error(use_err, &e);
            ExitCode::from(ci_trigger::exit_code_for_error(&e))
        }
    }
}
