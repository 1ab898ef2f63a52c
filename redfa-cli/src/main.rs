mod error;

use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use error::Error;

/// Compiles a regular expression into a minimized DFA and writes a
/// Graphviz DOT rendering of it.
#[derive(Debug, Parser)]
#[command(author, version, about)]
struct Cli {
    /// Path to the file containing the regex to compile.
    input: PathBuf,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .init();

    let cli = Cli::parse();
    match run(&cli.input) {
        Ok(output_path) => {
            println!("success: produced file '{}'", output_path.display());
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("{e}");
            ExitCode::FAILURE
        }
    }
}

/// Reads `input`, compiles it, and writes the rendered DOT file to
/// `dots/<basename>.dot`. Returns the path written on success. A compile
/// failure's error message carries the full two-line caret diagnostic
/// (SPEC_FULL.md 7/10.1's `CompileError::diagnostic`) rendered against the
/// source that was actually read, not just the bare error variant.
fn run(input: &Path) -> Result<PathBuf, Error> {
    let source = fs::read(input).map_err(|source| Error::Read {
        path: input.to_path_buf(),
        source,
    })?;

    let dfa = redfa::compile(&source).map_err(|e| Error::Compile(e.diagnostic(&source)))?;
    let dot = redfa::emit::to_dot(&dfa);

    let dots_dir = Path::new("dots");
    fs::create_dir_all(dots_dir).map_err(|source| Error::CreateDir {
        path: dots_dir.to_path_buf(),
        source,
    })?;

    let output_path = dots_dir.join(basename(input)).with_extension("dot");
    fs::write(&output_path, dot).map_err(|source| Error::Write {
        path: output_path.clone(),
        source,
    })?;

    Ok(output_path)
}

/// The input's file name with any directory prefix and its last
/// extension stripped, e.g. `foo/bar.regex` -> `bar`.
fn basename(input: &Path) -> &std::ffi::OsStr {
    input.file_stem().unwrap_or_else(|| input.as_os_str())
}
