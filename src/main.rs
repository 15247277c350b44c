use clap::{Parser, Subcommand};
use imgbatch::{batch, config, logging, output};
use std::path::{Path, PathBuf};

/// Overrides for a single run; each replaces the matching config value.
#[derive(clap::Args, Clone)]
struct RunArgs {
    /// Input list (`name;url` per line)
    #[arg(long)]
    input: Option<PathBuf>,

    /// Base directory; images go to <base-dir>/<subdir>/
    #[arg(long)]
    base_dir: Option<PathBuf>,

    /// Factor applied to both edges
    #[arg(long)]
    scale: Option<f64>,

    /// Log file, appended to
    #[arg(long)]
    log_file: Option<PathBuf>,
}

#[derive(Parser)]
#[command(name = "imgbatch")]
#[command(about = "Download a list of images, rescale them, and save them as JPEG")]
#[command(long_about = "\
Download a list of images, rescale them, and save them as JPEG

Reads one row per line from the input list:

  alice;https://img.example/alice.png
  bob;https://img.example/bob.webp

For each row the image is downloaded to <base>/avs/<name>.jpeg, scaled by
1.5 on both edges (bilinear), converted to RGB, and re-encoded as JPEG in
place. Rows that cannot be parsed, downloaded, or decoded are logged to the
log file and skipped; the run always continues to the end of the list.

Run 'imgbatch gen-config' to generate a documented imgbatch.toml.")]
#[command(version)]
struct Cli {
    /// Config file (default: imgbatch.toml, if present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Download and rescale every row of the input list
    Run(RunArgs),
    /// Parse the input list and show what would be done, without downloading
    Check(RunArgs),
    /// Print a stock imgbatch.toml with all options documented
    GenConfig,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    match cli.command {
        Command::Run(args) => {
            let config = load(cli.config.as_deref(), &args)?;
            let log = logging::init_logging(&config.log)?;

            let base_dir = config.output.base_dir.clone();
            let (tx, rx) = std::sync::mpsc::channel();
            let printer = std::thread::spawn(move || {
                for report in rx {
                    output::print_row_report(&report, &base_dir);
                }
            });
            let report = batch::run_batch(&config, Some(tx)).await;
            printer.join().unwrap();

            output::print_summary(&report);
            println!("Log: {}", log.path().display());
            log.flush()?;
        }
        Command::Check(args) => {
            let config = load(cli.config.as_deref(), &args)?;
            println!("==> Checking {}", config.input.path.display());
            let lines = batch::check_input(&config)?;
            output::print_check_output(&lines, &config);
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
    }

    Ok(())
}

/// Resolve the effective config: stock defaults, then the config file, then
/// command-line overrides.
///
/// An explicitly named config file must exist; the default one is optional.
fn load(
    path: Option<&Path>,
    args: &RunArgs,
) -> Result<config::BatchConfig, Box<dyn std::error::Error>> {
    let mut config = match path {
        Some(p) if !p.exists() => {
            return Err(format!("config file not found: {}", p.display()).into());
        }
        Some(p) => config::load_config(p)?,
        None => config::load_config(Path::new(config::DEFAULT_CONFIG_FILE))?,
    };

    if let Some(input) = &args.input {
        config.input.path = input.clone();
    }
    if let Some(base_dir) = &args.base_dir {
        config.output.base_dir = base_dir.clone();
    }
    if let Some(scale) = args.scale {
        config.transform.scale = scale;
    }
    if let Some(log_file) = &args.log_file {
        config.log.file = log_file.clone();
    }
    config.validate()?;
    Ok(config)
}
