/*!
 * Command-line interface for code2md
 */

use std::io;
use std::path::Path;
use std::process::ExitCode;
use std::sync::Arc;

use clap::{CommandFactory, Parser};
use indicatif::{ProgressBar, ProgressStyle};
use tracing_subscriber::EnvFilter;

use code2md::config::{Args, Config};
use code2md::error::{Code2MdError, Result};
use code2md::present::{ClipboardPresenter, PathPresenter, Presenter};
use code2md::report::{ReportFormat, Reporter};
use code2md::run_bundle;

#[tokio::main]
async fn main() -> ExitCode {
    // Parse command line arguments
    let args = Args::parse();

    if let Some(shell) = args.generate {
        let mut cmd = Args::command();
        let name = cmd.get_name().to_string();
        clap_complete::generate(shell, &mut cmd, name, &mut io::stdout());
        return ExitCode::SUCCESS;
    }

    init_tracing(args.verbose);

    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(Code2MdError::NoMatchingFiles) => {
            eprintln!("Warning: No matching files found to convert.");
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(args: Args) -> Result<()> {
    // Create and validate configuration
    let config = Config::from_args(args)?;
    config.validate()?;

    let progress = ProgressBar::new(0);
    progress.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} {prefix:.bold.cyan} {wide_msg:.dim.white} {pos}/{len} ({percent}%)")
            .map_err(|e| Code2MdError::Config(e.to_string()))?,
    );
    progress.enable_steady_tick(std::time::Duration::from_millis(100));
    progress.set_prefix("Bundling");
    progress.set_message(format!("Scanning {}", config.project_root.display()));

    let result = run_bundle(&config, Arc::new(progress.clone())).await;
    progress.finish_and_clear();
    let report = result?;

    Reporter::new(ReportFormat::ConsoleTable).print_report(&report);

    // The document exists at this point; presenting it is best effort
    let document = Path::new(&report.output_file);
    let presented = if config.clip {
        match tokio::fs::read_to_string(document).await {
            Ok(contents) => ClipboardPresenter::detect().present(document, &contents),
            Err(e) => Err(e.into()),
        }
    } else {
        PathPresenter.present(document, "")
    };
    if let Err(e) = presented {
        eprintln!("Warning: {}", e);
    }

    Ok(())
}

fn init_tracing(verbose: bool) {
    let default_directive = if verbose { "code2md=info" } else { "code2md=warn" };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .try_init();
}
