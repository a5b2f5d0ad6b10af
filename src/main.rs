//! Glitteral Compiler
//!
//! Command-line driver: reads a source file, runs the pipeline, writes the
//! generated Rust and hands it to rustc.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::{self, Command};
use std::time::Instant;

use anyhow::{bail, Context};
use clap::{Parser, Subcommand, ValueEnum};
use log::info;

use glitteral::backend::{CodeGen, RustCodeGen};
use glitteral::feedback::{is_source_error, CompilationFeedback, CompilationStats, ErrorReport};
use glitteral::frontend::lexer::tokenize;
use glitteral::frontend::parser::parse;
use glitteral::stdlib::BuiltinRegistry;
use glitteral::utils::Error;
use glitteral::{analyze, DEFAULT_PRELUDE};

/// Glitteral Compiler
#[derive(Parser, Debug)]
#[command(name = "glitteralc")]
#[command(version)]
#[command(about = "Glitteral compiler - an indentation-sensitive Lisp that compiles to Rust")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Diagnostic output format
    #[arg(long, value_enum, default_value_t = MessageFormat::Human, global = true)]
    message_format: MessageFormat,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum MessageFormat {
    Human,
    Json,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Compile a source file
    Build {
        /// Input source file
        input: PathBuf,

        /// Output file (the executable, or the Rust file with --just-rust)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Stop after writing the generated Rust
        #[arg(long)]
        just_rust: bool,

        /// Prelude to prepend instead of the bundled runtime
        #[arg(long, value_name = "FILE")]
        prelude: Option<PathBuf>,
    },
    /// Check a source file for errors
    Check {
        /// Input source file
        input: PathBuf,
    },
    /// Print the token stream
    Tokens { input: PathBuf },
    /// Print the parsed nodes
    Ast { input: PathBuf },
    /// Print version information
    Version,
}

fn main() {
    env_logger::init();

    let cli = Cli::parse();
    if let Err(error) = run(&cli) {
        eprintln!("Error: {:#}", error);
        process::exit(1);
    }
}

fn run(cli: &Cli) -> anyhow::Result<()> {
    match &cli.command {
        Commands::Build { input, output, just_rust, prelude } => {
            build_file(input, output.as_deref(), *just_rust, prelude.as_deref(), cli.message_format)
        }
        Commands::Check { input } => check_file(input, cli.message_format),
        Commands::Tokens { input } => {
            let source = read_source(input)?;
            let tokens = tokenize(&source).unwrap_or_else(|error| fail(&error, &source, input, cli.message_format));
            for token in tokens {
                let (line, column) = token.span.line_column(&source);
                println!("{}:{}\t{}", line, column, token);
            }
            Ok(())
        }
        Commands::Ast { input } => {
            let source = read_source(input)?;
            let nodes = tokenize(&source)
                .and_then(parse)
                .unwrap_or_else(|error| fail(&error, &source, input, cli.message_format));
            for node in nodes {
                println!("{:#?}", node.kind);
            }
            Ok(())
        }
        Commands::Version => {
            println!("glitteralc {}", env!("CARGO_PKG_VERSION"));
            println!("Glitteral Compiler");
            println!("License: Apache-2.0");
            Ok(())
        }
    }
}

fn read_source(input: &Path) -> anyhow::Result<String> {
    fs::read_to_string(input).with_context(|| format!("reading {}", input.display()))
}

/// Run the pipeline, reporting a compiler error and exiting on failure
fn generate(source: &str, prelude: &str, input: &Path, format: MessageFormat) -> (String, CompilationStats) {
    let started = Instant::now();
    let registry = BuiltinRegistry::new();
    let mut stats = CompilationStats {
        loc: source.lines().count(),
        ..CompilationStats::default()
    };
    let generated = analyze(source, &registry).and_then(|analysis| {
        stats.token_count = analysis.token_count;
        stats.node_count = analysis.nodes.len();
        let mut codegen = RustCodeGen::new(&registry);
        info!("generating {} for {}", codegen.name(), input.display());
        codegen.generate_program(&analysis.nodes, prelude)
    });
    stats.total_time_ms = started.elapsed().as_millis() as u64;
    match generated {
        Ok(rust) => (rust, stats),
        Err(error) => fail_with_stats(&error, source, input, format, stats),
    }
}

/// Compile a source file to Rust, then to an executable
fn build_file(
    input: &Path,
    output: Option<&Path>,
    just_rust: bool,
    prelude: Option<&Path>,
    format: MessageFormat,
) -> anyhow::Result<()> {
    let source = read_source(input)?;
    let prelude = match prelude {
        Some(path) => fs::read_to_string(path).with_context(|| format!("reading prelude {}", path.display()))?,
        None => DEFAULT_PRELUDE.to_string(),
    };

    let (rust, stats) = generate(&source, &prelude, input, format);
    let stem = input
        .file_stem()
        .and_then(|stem| stem.to_str())
        .context("input file has no usable name")?;

    let rust_path = match output {
        Some(path) if just_rust => path.to_path_buf(),
        _ => input.with_file_name(format!("__{}_compiled.rs", stem)),
    };
    fs::write(&rust_path, &rust).with_context(|| format!("writing {}", rust_path.display()))?;
    info!("wrote {}", rust_path.display());

    if !just_rust {
        let executable = output
            .map(Path::to_path_buf)
            .unwrap_or_else(|| input.with_file_name(stem));
        let status = Command::new("rustc")
            .arg("-O")
            .arg("-o")
            .arg(&executable)
            .arg(&rust_path)
            .status()
            .context("running rustc")?;
        if !status.success() {
            bail!("rustc failed on {} ({})", rust_path.display(), status);
        }
        info!("built {}", executable.display());
    }

    match format {
        MessageFormat::Json => {
            println!("{}", CompilationFeedback::success(input.display().to_string(), stats).to_json())
        }
        MessageFormat::Human => println!("Compiled {} → {}", input.display(), rust_path.display()),
    }
    Ok(())
}

/// Check a source file for errors without writing anything
fn check_file(input: &Path, format: MessageFormat) -> anyhow::Result<()> {
    let source = read_source(input)?;
    let (_, stats) = generate(&source, "", input, format);
    match format {
        MessageFormat::Json => {
            println!("{}", CompilationFeedback::success(input.display().to_string(), stats).to_json())
        }
        MessageFormat::Human => println!("No errors found in {}", input.display()),
    }
    Ok(())
}

fn fail(error: &Error, source: &str, input: &Path, format: MessageFormat) -> ! {
    fail_with_stats(error, source, input, format, CompilationStats::default())
}

/// Print a compiler diagnostic and exit
fn fail_with_stats(error: &Error, source: &str, input: &Path, format: MessageFormat, stats: CompilationStats) -> ! {
    let report = ErrorReport::from_error(error, source, &input.display().to_string());
    match format {
        MessageFormat::Json => {
            let feedback = CompilationFeedback::failure(input.display().to_string(), vec![report], stats);
            println!("{}", feedback.to_json());
        }
        MessageFormat::Human => {
            eprintln!("{}", report.to_human());
            if let (Some(location), true) = (&report.location, is_source_error(error.stage())) {
                if let Some(line) = source.lines().nth(location.line - 1) {
                    eprintln!("    {}", line);
                    eprintln!("    {}^", " ".repeat(location.column.saturating_sub(1)));
                }
            }
            for suggestion in &report.suggestions {
                eprintln!("  help: {}", suggestion.message);
            }
        }
    }
    process::exit(1);
}
