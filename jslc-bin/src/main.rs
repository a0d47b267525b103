use std::{
    fs,
    io::{self, Write},
    path::{Path, PathBuf},
    process::ExitCode,
};

use anyhow::Context;
use clap::Parser;
use jsl::{
    parser::DEFAULT_MAX_DEPTH,
    pipeline::{self, Diagnostic, Options},
};
use tracing_subscriber::EnvFilter;

use crate::target::Target;

mod target;

/// Compiles JSL effects into shaders.
#[derive(Parser)]
#[command(version, about)]
struct Args {
    /// The effect source file.
    file: PathBuf,

    #[arg(short, long, default_value_t = target::DEFAULT_TARGET)]
    target: Target,

    /// Output file, or a directory to place `<effect>.<ext>` in. Defaults to
    /// the standard output.
    #[arg(short, long)]
    output: Option<PathBuf>,

    #[arg(long, value_enum, default_value = "code")]
    emit: Emit,

    /// Bound on how deeply statements and expressions may nest.
    #[arg(long, default_value_t = DEFAULT_MAX_DEPTH)]
    max_depth: usize,

    /// Log more, up to `-vvv`. `RUST_LOG` takes precedence.
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[derive(Copy, Clone, PartialEq, Eq, clap::ValueEnum)]
enum Emit {
    /// The significant tokens.
    Tokens,
    /// The type-decorated syntax tree.
    Tree,
    /// Code for the selected target.
    Code,
}

fn main() -> ExitCode {
    let args = Args::parse();
    init_logging(args.verbose);

    match run(&args) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(error) => {
            eprintln!("jslc: {error:#}");
            ExitCode::FAILURE
        }
    }
}

/// Returns whether the effect compiled.
fn run(args: &Args) -> anyhow::Result<bool> {
    let src = fs::read_to_string(&args.file)
        .with_context(|| format!("failed to read {}", args.file.display()))?;
    let options = Options {
        max_depth: args.max_depth,
    };

    tracing::info!(file = %args.file.display(), backend = %args.target, "compiling");
    let result = match args.emit {
        Emit::Tokens => pipeline::dump_tokens(&src),
        Emit::Tree => pipeline::dump_tree(&src, &options),
        Emit::Code => pipeline::compile(&src, args.target.into(), &options),
    };
    let out = match result {
        Ok(out) => out,
        Err(diagnostics) => {
            report(&args.file, &diagnostics);
            return Ok(false);
        }
    };

    match &args.output {
        Some(path) => {
            let path = output_path(path, &args.file, args.target);
            fs::write(&path, out)
                .with_context(|| format!("failed to write {}", path.display()))?;
            tracing::info!(path = %path.display(), "wrote output");
        }
        None => io::stdout().lock().write_all(out.as_bytes())?,
    }
    Ok(true)
}

fn output_path(output: &Path, input: &Path, target: Target) -> PathBuf {
    if !output.is_dir() {
        return output.to_owned();
    }
    let stem = input.file_stem().unwrap_or(input.as_os_str());
    output.join(stem).with_extension(target.extension())
}

fn report(file: &Path, diagnostics: &[Diagnostic]) {
    let mut stderr = io::stderr().lock();
    for diagnostic in diagnostics {
        _ = writeln!(stderr, "{}:{diagnostic}", file.display());
    }
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(io::stderr)
        .init();
}
