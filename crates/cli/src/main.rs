use clap::{Parser, Subcommand};
use jobset_api::ValidateOptions;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

mod check;
mod config;
mod crd;
mod manifest;
mod names;

use config::OutputFormat;

#[derive(Parser, Debug)]
#[command(name = "jobsetctl")]
#[command(about = "jobsetctl - Validate and inspect JobSet manifests")]
struct Args {
    /// Config file (defaults to ~/.jobset/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Print the JobSet CustomResourceDefinition
    Crd {
        /// Write to a file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Validate a JobSet or JobSetList manifest (YAML or JSON)
    Validate {
        file: PathBuf,
        #[arg(short, long, value_enum)]
        format: Option<OutputFormat>,
        /// Ignore `.status` when validating
        #[arg(long)]
        skip_status: bool,
    },
    /// List the child Job names a manifest would produce
    Names { file: PathBuf },
    /// Print the child Jobs a manifest would create, as YAML
    Jobs { file: PathBuf },
}

fn exit_on_error<T>(result: Result<T, Box<dyn std::error::Error>>) -> T {
    match result {
        Ok(value) => value,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    }
}

fn main() {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::from_default_env())
        .init();

    let args = Args::parse();
    let config = exit_on_error(config::load_config(args.config.as_deref()));

    match args.command {
        Commands::Crd { output } => {
            exit_on_error(crd::handle_crd(output.as_deref()));
        }
        Commands::Validate {
            file,
            format,
            skip_status,
        } => {
            let format = format.unwrap_or(config.output.format);
            let options = ValidateOptions {
                check_status: !(skip_status || config.validate.skip_status),
            };
            if !exit_on_error(check::handle_validate(&file, format, &options)) {
                std::process::exit(1);
            }
        }
        Commands::Names { file } => {
            exit_on_error(names::handle_names(&file));
        }
        Commands::Jobs { file } => {
            exit_on_error(names::handle_jobs(&file));
        }
    }
}
