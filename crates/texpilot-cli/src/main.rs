use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use std::fs;
use std::path::{Path, PathBuf};
use texpilot_build::{BuildConfig, Builder};
use texpilot_log::linter::to_linter_messages;
use texpilot_log::{sort_for_display, Diagnostic, LogInterpreter};

#[derive(Parser)]
#[command(name = "texpilot")]
#[command(about = "TexPilot CLI tools", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse a TeX log file and emit diagnostics as JSON
    Parse {
        /// Path to the .log file
        #[arg(value_name = "FILE")]
        path: PathBuf,

        /// Root document the log belongs to [default: FILE with a .tex extension]
        #[arg(long, value_name = "TEX")]
        root: Option<PathBuf>,

        #[arg(long, value_enum, default_value_t = Format::Json)]
        format: Format,

        /// Order by severity, then by line
        #[arg(long)]
        sort: bool,
    },
    /// Compile a document with latexmk and report its diagnostics
    Build {
        /// Path to the .tex file
        #[arg(value_name = "FILE")]
        path: PathBuf,

        /// JSON build configuration
        #[arg(long, value_name = "JSON")]
        config: Option<PathBuf>,

        #[arg(long, value_enum, default_value_t = Format::Json)]
        format: Format,
    },
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Format {
    /// Full diagnostic IR
    Json,
    /// Editor linter messages
    Linter,
}

fn print_diagnostics(diagnostics: &[Diagnostic], format: Format) -> anyhow::Result<()> {
    let json = match format {
        Format::Json => serde_json::to_string_pretty(diagnostics)?,
        Format::Linter => serde_json::to_string_pretty(&to_linter_messages(diagnostics))?,
    };
    println!("{}", json);
    Ok(())
}

fn absolute(path: &Path) -> anyhow::Result<PathBuf> {
    std::path::absolute(path).with_context(|| format!("Invalid path {}", path.display()))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    match &cli.command {
        Commands::Parse {
            path,
            root,
            format,
            sort,
        } => {
            let content = fs::read_to_string(path)
                .with_context(|| format!("Failed to read {}", path.display()))?;
            let root = match root {
                Some(root) => absolute(root)?,
                None => absolute(&path.with_extension("tex"))?,
            };
            let report = LogInterpreter::new().parse_report(&content, &root);
            if let Some(output) = &report.output_file {
                log::info!("output written on {}", output.display());
            }
            let mut diagnostics = report.diagnostics;
            if *sort {
                sort_for_display(&mut diagnostics);
            }
            print_diagnostics(&diagnostics, *format)?;
        }
        Commands::Build {
            path,
            config,
            format,
        } => {
            let config = match config {
                Some(config) => BuildConfig::load(config)?,
                None => BuildConfig::default(),
            };
            let builder = Builder::new(config);
            let status = builder
                .registry()
                .lock()
                .map_err(|_| anyhow::anyhow!("build registry is poisoned"))?
                .on_status_changed();

            let report = builder.build(&absolute(path)?).await?;
            for event in status.try_iter() {
                match &event.error {
                    Some(error) => log::info!("status: {:?} ({})", event.status, error),
                    None => log::info!("status: {:?}", event.status),
                }
            }

            match format {
                Format::Json => println!("{}", serde_json::to_string_pretty(&report)?),
                Format::Linter => print_diagnostics(&report.diagnostics, *format)?,
            }
            if !report.succeeded() {
                std::process::exit(1);
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_defaults() {
        let cli = Cli::parse_from(["texpilot", "parse", "out/main.log"]);
        match cli.command {
            Commands::Parse {
                path,
                root,
                format,
                sort,
            } => {
                assert_eq!(path, PathBuf::from("out/main.log"));
                assert_eq!(root, None);
                assert!(format == Format::Json);
                assert!(!sort);
            }
            Commands::Build { .. } => panic!("expected parse"),
        }
    }
}
