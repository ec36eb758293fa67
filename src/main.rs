// src/main.rs
//
// Command-line entry point.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tiltlink_lib::settings::default_config_path;
use tiltlink_lib::{check_config, list_ports, run, stop_file_logging, RunOptions};

/// Rotate and move a display when the tilt sensor says so.
#[derive(Parser, Debug)]
#[command(name = "tiltlink", version)]
#[command(about = "Host-side controller for the USB tilt sensor")]
#[command(args_conflicts_with_subcommands = true)]
struct Args {
    #[command(subcommand)]
    command: Option<Command>,

    #[command(flatten)]
    run: RunArgs,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Connect to the sensor and follow its orientation (default)
    Run(RunArgs),

    /// List serial ports and mark the ones that look like the sensor
    List {
        /// Configuration file (for `device_names`)
        #[arg(short, long)]
        config: Option<PathBuf>,
    },

    /// Validate a configuration file and print the resolved mode as JSON
    Check {
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Mode to resolve instead of the file's `mode`
        #[arg(short, long)]
        mode: Option<String>,
    },
}

#[derive(clap::Args, Debug, Default)]
struct RunArgs {
    /// Configuration file (default: <config dir>/tiltlink/tiltlink.toml)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Mode to use instead of the file's `mode`
    #[arg(short, long)]
    mode: Option<String>,

    /// Serial port, e.g. COM3 or /dev/ttyACM0 (default: scan)
    #[arg(short, long)]
    port: Option<String>,

    /// Give up after this many failed connection or configuration retries
    #[arg(long)]
    retry_limit: Option<u32>,

    /// Also write the log to a timestamped file in this directory
    #[arg(long)]
    log_dir: Option<PathBuf>,
}

impl From<RunArgs> for RunOptions {
    fn from(args: RunArgs) -> Self {
        RunOptions {
            config_path: args.config.unwrap_or_else(default_config_path),
            mode: args.mode,
            port: args.port,
            retry_limit: args.retry_limit,
            log_dir: args.log_dir,
        }
    }
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    let code = match args.command {
        Some(Command::List { config }) => {
            match list_ports(&config.unwrap_or_else(default_config_path)) {
                Ok(ports) => {
                    if ports.is_empty() {
                        println!("No serial ports found");
                    }
                    for port in ports {
                        println!("{}", port.summary());
                    }
                    0
                }
                Err(e) => {
                    eprintln!("{}", e);
                    e.exit_code()
                }
            }
        }
        Some(Command::Check { config, mode }) => {
            match check_config(&config.unwrap_or_else(default_config_path), mode) {
                Ok(json) => {
                    println!("{}", json);
                    0
                }
                Err(e) => {
                    eprintln!("{}", e);
                    e.exit_code()
                }
            }
        }
        Some(Command::Run(run_args)) => run_until_fatal(run_args).await,
        None => run_until_fatal(args.run).await,
    };

    // The monitor thread and the command loop never finish on their own
    std::process::exit(code);
}

async fn run_until_fatal(args: RunArgs) -> i32 {
    let code = match run(args.into()).await {
        Ok(()) => 0,
        Err(e) => e.exit_code(),
    };
    stop_file_logging();
    code
}
