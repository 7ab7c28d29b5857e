mod args;
mod output;
mod run;

use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::EnvFilter;
use xcs_api::ApiError;
use xcs_engine::ComponentError;
use xcs_types::ErrorModal;

use crate::args::Cli;
use crate::output::Output;

#[tokio::main]
async fn main() -> ExitCode {
    init_tracing();
    let cli = Cli::parse();
    let out = Output::new(cli.global.json);

    match run::run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => report(&out, error),
    }
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(log_filter(std::env::var("RUST_LOG").ok().as_deref()))
        .with_writer(std::io::stderr)
        .try_init();
}

/// `RUST_LOG` directives, or `info` when unset or unparsable.
fn log_filter(directives: Option<&str>) -> EnvFilter {
    directives
        .filter(|directives| !directives.trim().is_empty())
        .and_then(|directives| EnvFilter::try_new(directives).ok())
        .unwrap_or_else(|| EnvFilter::new("info"))
}

/// Print a failure and pick the exit code. A dry-run preview is the
/// expected end of a write under `--dry-run`, so it prints to stdout and
/// exits cleanly.
fn report(out: &Output, error: anyhow::Error) -> ExitCode {
    let error = match error.downcast::<ComponentError>() {
        Ok(ComponentError::Api {
            source: ApiError::DryRun(preview),
            ..
        }) => return print_preview(out, &preview),
        Ok(component) => {
            out.error(&component.modal());
            return ExitCode::FAILURE;
        }
        Err(error) => error,
    };
    let error = match error.downcast::<ApiError>() {
        Ok(ApiError::DryRun(preview)) => return print_preview(out, &preview),
        Ok(api) => {
            out.error(&ComponentError::from(api).modal());
            return ExitCode::FAILURE;
        }
        Err(error) => error,
    };
    out.error(&ErrorModal {
        title: "Error".into(),
        message: format!("{error:#}"),
    });
    ExitCode::FAILURE
}

fn print_preview(out: &Output, preview: &xcs_api::RequestPreview) -> ExitCode {
    match out.value(preview) {
        Ok(()) => ExitCode::SUCCESS,
        Err(_) => ExitCode::FAILURE,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tracing::level_filters::LevelFilter;

    #[test]
    fn rust_log_sets_the_level() {
        assert_eq!(log_filter(Some("debug")).max_level_hint(), Some(LevelFilter::DEBUG));
        assert_eq!(log_filter(Some("xcs_api=trace")).max_level_hint(), Some(LevelFilter::TRACE));
        assert_eq!(log_filter(None).max_level_hint(), Some(LevelFilter::INFO));
        assert_eq!(log_filter(Some("  ")).max_level_hint(), Some(LevelFilter::INFO));
    }
}
