use clap::Parser;
use loadplan::{AuxiliaryFile, CompileError, CompilerBuilder};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use thiserror::Error;

/// Compile a load-test template and its data files into a JMeter test plan.
#[derive(Parser, Debug)]
#[command(name = "loadplan", version)]
struct Cli {
    /// Template file to compile
    template: PathBuf,

    /// Data file uploaded next to the template (CSV, TSV, JSON, TXT); repeatable
    #[arg(short = 'f', long = "file", value_name = "FILE")]
    files: Vec<PathBuf>,

    /// Write the document here instead of stdout
    #[arg(short, long, value_name = "OUT")]
    output: Option<PathBuf>,

    /// Print the resolved generation context as JSON instead of the document
    #[arg(long)]
    dump_context: bool,

    /// Do not pair `<thread group>.csv` and `<request>.json` files by name
    #[arg(long)]
    no_pairing: bool,

    /// Skip data files larger than this
    #[arg(long, value_name = "BYTES")]
    max_file_size: Option<usize>,
}

#[derive(Error, Debug)]
enum CliError {
    #[error("Failed to read '{path}': {source}")]
    Read { path: PathBuf, source: io::Error },

    #[error("Failed to write output: {0}")]
    Write(#[from] io::Error),

    #[error("{0} (phase: {phase})", phase = .0.phase())]
    Compile(#[from] CompileError),

    #[error("Failed to serialize context: {0}")]
    Json(#[from] serde_json::Error),
}

fn read(path: &Path) -> Result<Vec<u8>, CliError> {
    fs::read(path).map_err(|source| CliError::Read {
        path: path.to_path_buf(),
        source,
    })
}

fn run(cli: Cli) -> Result<(), CliError> {
    let template_bytes = read(&cli.template)?;
    let template = String::from_utf8_lossy(&template_bytes);

    let mut files = Vec::with_capacity(cli.files.len());
    for path in &cli.files {
        let filename = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        files.push(AuxiliaryFile::new(filename, read(path)?));
    }

    let mut builder = CompilerBuilder::new().with_file_pairing(!cli.no_pairing);
    if let Some(bytes) = cli.max_file_size {
        builder = builder.with_max_file_size(bytes);
    }
    let compilation = builder.build().compile(&template, &files)?;

    for warning in &compilation.warnings {
        log::warn!("{}", warning);
    }

    let mut output = if cli.dump_context {
        serde_json::to_string_pretty(&compilation.context)?
    } else {
        compilation.document
    };
    output.push('\n');

    match &cli.output {
        Some(path) => {
            fs::write(path, output)?;
            log::info!("wrote {}", path.display());
        }
        None => print!("{}", output),
    }
    Ok(())
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    match run(Cli::parse()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{}", e);
            ExitCode::FAILURE
        }
    }
}
