use anyhow::{bail, Context};
use ariadne::{Color, Config, IndexType, Label, Report, ReportKind, Source};
use clap::{Args, Parser, Subcommand};
use indexmap::IndexMap;
use std::fs;
use std::ops::Range;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Instant;
use tracing_subscriber::EnvFilter;

use minipack::config::CONFIG_FILE_NAME;
use minipack::{
    load_config, BundleConfig, BundleError, Compiler, DoneLoggerPlugin, Entry, LoaderRegistry, Plugin,
    RunLoggerPlugin, Stats,
};
use minipack_lexer::{Lexer, Token, TokenKind};

#[derive(Parser)]
#[command(
    name = "minipack",
    version,
    about = "A minimal JavaScript module bundler",
    long_about = "Bundles CommonJS-style modules reachable from one or more entries\ninto self-contained scripts, one per entry."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Bundle the configured entries and write one file per chunk
    Build {
        #[command(flatten)]
        inputs: InputArgs,
    },

    /// Build the module graph without writing anything and print it
    Graph {
        #[command(flatten)]
        inputs: InputArgs,

        /// Print the graph as JSON
        #[arg(long)]
        json: bool,
    },

    /// Tokenize a JavaScript file and show tokens (debug)
    Tokens {
        /// Input JavaScript file
        input: PathBuf,

        /// Show token positions
        #[arg(short, long)]
        positions: bool,
    },
}

#[derive(Args)]
struct InputArgs {
    /// Entry modules, as `name=path` or a plain path
    entries: Vec<String>,

    /// Configuration file (defaults to ./minipack.json when present)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Output directory
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Output filename pattern; `[name]` becomes the chunk name
    #[arg(long)]
    filename: Option<String>,

    /// Extensions tried when a specifier has none (repeatable)
    #[arg(short, long = "extension")]
    extensions: Vec<String>,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    match cli.command {
        Commands::Build { inputs } => {
            init_logging(inputs.verbose);
            build_command(inputs)
        }
        Commands::Graph { inputs, json } => {
            init_logging(inputs.verbose);
            graph_command(inputs, json)
        }
        Commands::Tokens { input, positions } => tokens_command(input, positions),
    }
}

fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn build_command(inputs: InputArgs) -> ExitCode {
    let compiler = match make_compiler(&inputs) {
        Ok(compiler) => compiler,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            return ExitCode::FAILURE;
        }
    };

    match compiler.run(|_| {}) {
        Ok(stats) => {
            print_assets(&stats);
            ExitCode::SUCCESS
        }
        Err(err) => report_bundle_error(err),
    }
}

fn graph_command(inputs: InputArgs, json: bool) -> ExitCode {
    let started = Instant::now();
    let compiler = match make_compiler(&inputs) {
        Ok(compiler) => compiler,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            return ExitCode::FAILURE;
        }
    };

    let compilation = match compiler.compile() {
        Ok(compilation) => compilation,
        Err(err) => return report_bundle_error(err),
    };
    let output_dir = match compiler.output_dir() {
        Ok(dir) => dir,
        Err(err) => return report_bundle_error(err),
    };
    let stats = Stats::new(&compilation, output_dir, started.elapsed());

    if json {
        match stats.to_json() {
            Ok(text) => println!("{}", text),
            Err(e) => {
                eprintln!("Error: cannot serialize graph: {}", e);
                return ExitCode::FAILURE;
            }
        }
        return ExitCode::SUCCESS;
    }

    println!("Modules for {}:\n", stats.context.display());
    println!("{}", "=".repeat(80));
    for module in &stats.modules {
        println!("{} [{}]", module.id, module.names.join(", "));
        for dep in &module.dependencies {
            println!("    -> {}", dep);
        }
    }
    println!("{}", "=".repeat(80));
    for chunk in &stats.chunks {
        println!("chunk {} -> {} ({} modules)", chunk.name, chunk.filename, chunk.modules.len());
    }
    println!("\nFile dependencies:");
    for path in &stats.file_dependencies {
        println!("    {}", path.display());
    }

    ExitCode::SUCCESS
}

fn tokens_command(input: PathBuf, positions: bool) -> ExitCode {
    let source = match fs::read_to_string(&input) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Error reading file: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let filename = input.to_string_lossy().to_string();
    let tokens = Lexer::new(&source).tokenize();

    println!("Tokens for {}:\n", filename);
    println!("{}", "=".repeat(80));

    for (i, token) in tokens.iter().enumerate() {
        if token.kind == TokenKind::Eof {
            println!("\n{:4} | {:?}", i, token.kind);
            break;
        }

        if positions {
            println!(
                "{:4} | {:20?} | {:?} | {}..{}",
                i, token.kind, token.text, token.span.start, token.span.end
            );
        } else {
            println!("{:4} | {:20?} | {:?}", i, token.kind, token.text);
        }
    }

    println!("{}", "=".repeat(80));
    println!("\nTotal tokens: {}", tokens.len());

    let error_count = tokens.iter().filter(|t| t.kind == TokenKind::Error).count();
    if error_count > 0 {
        println!("\nLexer errors found: {}", error_count);
        report_lexer_errors(&tokens, &filename, &source);
        return ExitCode::FAILURE;
    }

    ExitCode::SUCCESS
}

// Helper functions

fn make_compiler(inputs: &InputArgs) -> anyhow::Result<Compiler> {
    let registry = LoaderRegistry::with_builtins();

    let config_path = match &inputs.config {
        Some(path) => Some(path.clone()),
        None => Some(PathBuf::from(CONFIG_FILE_NAME)).filter(|p| p.is_file()),
    };

    let (mut config, plugins) = match config_path {
        Some(path) => {
            let loaded = load_config(&path, &registry).with_context(|| format!("loading {}", path.display()))?;
            (loaded.config, loaded.plugins)
        }
        None => {
            let plugins: Vec<Box<dyn Plugin>> = vec![Box::new(RunLoggerPlugin), Box::new(DoneLoggerPlugin)];
            (BundleConfig::default(), plugins)
        }
    };

    if let Some(entry) = parse_entries(&inputs.entries)? {
        config.entry = entry;
    }
    if let Some(output) = &inputs.output {
        config = config.with_output_path(output.clone());
    }
    if let Some(pattern) = &inputs.filename {
        config = config.with_filename(pattern.clone());
    }
    if !inputs.extensions.is_empty() {
        config = config.with_extensions(inputs.extensions.iter().cloned());
    }

    Ok(Compiler::new(config, plugins))
}

/// Turns command-line entries into an [`Entry`]. A single unnamed path keeps
/// the default chunk name; several are named after their file stems.
fn parse_entries(args: &[String]) -> anyhow::Result<Option<Entry>> {
    match args {
        [] => return Ok(None),
        [only] if !only.contains('=') => return Ok(Some(Entry::Single(only.clone()))),
        _ => {}
    }

    let mut named = IndexMap::new();
    for arg in args {
        let (name, request) = match arg.split_once('=') {
            Some((name, request)) => (name.to_string(), request.to_string()),
            None => match Path::new(arg).file_stem() {
                Some(stem) => (stem.to_string_lossy().to_string(), arg.clone()),
                None => bail!("cannot derive a chunk name from entry '{}'", arg),
            },
        };
        if name.is_empty() || request.is_empty() {
            bail!("invalid entry '{}': expected name=path", arg);
        }
        if named.insert(name.clone(), request).is_some() {
            bail!("entry name '{}' is used more than once", name);
        }
    }
    Ok(Some(Entry::Named(named)))
}

fn print_assets(stats: &Stats) {
    println!("{:<40} {:>10}", "Asset", "Size");
    for asset in &stats.assets {
        println!("{:<40} {:>10}", asset.filename, format!("{} B", asset.size));
    }
    println!(
        "\n{} modules, {} chunks written to {} in {} ms",
        stats.modules.len(),
        stats.chunks.len(),
        stats.output_path.display(),
        stats.elapsed_ms
    );
}

fn report_bundle_error(err: BundleError) -> ExitCode {
    let code = match &err {
        BundleError::Parse { .. } => Some(("E1000", "Parse error")),
        BundleError::UnsupportedImport { .. } => Some(("E2001", "Unsupported import")),
        _ => None,
    };

    if let (Some((code, title)), Some((path, text, spans))) = (code, err.source_spans()) {
        let filename = path.to_string_lossy().to_string();
        for (span, message) in spans {
            report_error(code, title, &message, span.start, span.end, &filename, text);
        }
        return ExitCode::FAILURE;
    }

    eprintln!("Error: {:#}", anyhow::Error::new(err));
    ExitCode::FAILURE
}

fn report_lexer_errors(tokens: &[Token], filename: &str, source: &str) {
    for token in tokens.iter().filter(|t| t.kind == TokenKind::Error) {
        report_error(
            "E0001",
            "Lexical error",
            &token.value,
            token.span.start,
            token.span.end,
            filename,
            source,
        );
    }
}

fn report_error(code: &str, title: &str, message: &str, start: usize, end: usize, filename: &str, source: &str) {
    match render_report(code, title, message, start..end, filename, source, true) {
        Ok(text) => eprint!("{}", text),
        Err(_) => eprintln!("{}: {}: {} at {}..{}", filename, title, message, start, end),
    }
}

/// Renders one labelled diagnostic. `span` holds byte offsets into `source`.
fn render_report(
    code: &str,
    title: &str,
    message: &str,
    span: Range<usize>,
    filename: &str,
    source: &str,
    color: bool,
) -> std::io::Result<String> {
    let span = (filename, span);
    let mut out = Vec::new();
    Report::build(ReportKind::Error, span.clone())
        .with_config(Config::default().with_index_type(IndexType::Byte).with_color(color))
        .with_code(code)
        .with_message(title)
        .with_label(Label::new(span).with_message(message).with_color(Color::Red))
        .finish()
        .write((filename, Source::from(source)), &mut out)?;
    Ok(String::from_utf8_lossy(&out).into_owned())
}
