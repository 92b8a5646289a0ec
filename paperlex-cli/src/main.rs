//! Command-line interface for paperlex
//! This binary segments a question-paper token dump into an annotated
//! question tree, optionally reconciling it against an answer-row dump.
//!
//! Usage:
//!   paperlex `<tokens.json>` [--rows `<rows.json>`] [--kind `<kind>`] [--format `<format>`]

use clap::{Arg, Command};
use tracing_subscriber::EnvFilter;

use paperlex_config::Loader;
use paperlex_parser::paper::formats;
use paperlex_parser::paper::pipeline::{PaperKind, ParseOutcome, Pipeline};
use paperlex_parser::paper::source::{AnswerSource, DocumentAccess};
use paperlex_parser::paper::token::TokenStream;

mod dump;

use dump::{JsonAnswerTable, JsonDocument};

fn main() {
    init_tracing();

    let matches = Command::new("paperlex")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Segments exam-paper token dumps and reconciles answer tables")
        .arg_required_else_help(true)
        .arg(
            Arg::new("tokens")
                .help("Path to the token dump (JSON array of positioned tokens)")
                .required(true)
                .index(1),
        )
        .arg(
            Arg::new("rows")
                .long("rows")
                .short('r')
                .help("Path to the answer-row dump; omit to segment only"),
        )
        .arg(
            Arg::new("kind")
                .long("kind")
                .short('k')
                .help("Paper grammar: 'structured' or 'mcq'")
                .default_value("structured"),
        )
        .arg(
            Arg::new("format")
                .long("format")
                .short('f')
                .help("Output format: 'outline', 'json', or 'yaml'")
                .default_value("outline"),
        )
        .arg(
            Arg::new("config")
                .long("config")
                .short('c')
                .help("Configuration file layered over the built-in defaults"),
        )
        .get_matches();

    let tokens_path = matches
        .get_one::<String>("tokens")
        .expect("tokens path is required");
    let kind = match matches.get_one::<String>("kind").unwrap().as_str() {
        "structured" => PaperKind::Structured,
        "mcq" => PaperKind::MultipleChoice,
        other => {
            eprintln!("Unknown paper kind '{}'; expected 'structured' or 'mcq'", other);
            std::process::exit(1);
        }
    };

    let mut loader = Loader::new();
    if let Some(path) = matches.get_one::<String>("config") {
        loader = loader.with_file(path);
    }
    let config = loader.build().unwrap_or_else(|err| {
        eprintln!("Configuration error: {}", err);
        std::process::exit(1);
    });

    let document = JsonDocument::new(tokens_path);
    let tokens = document.read_tokens().unwrap_or_else(|err| {
        eprintln!("Token dump error: {}", err);
        std::process::exit(1);
    });
    let stream = TokenStream::new(tokens);

    let rows = match matches.get_one::<String>("rows") {
        Some(path) => JsonAnswerTable::new(path).extract_rows().unwrap_or_else(|err| {
            eprintln!("Answer dump error: {}", err);
            std::process::exit(1);
        }),
        None => Vec::new(),
    };

    let pipeline = Pipeline::with_options(config.engine_options());
    let outcome = if rows.is_empty() {
        pipeline.segment(&stream, kind, None)
    } else {
        pipeline.run(&stream, kind, &rows, None)
    };
    let ParseOutcome { paper, diagnostics } = outcome.unwrap_or_else(|err| {
        eprintln!("Pipeline error: {}", err);
        std::process::exit(1);
    });

    if !diagnostics.is_empty() {
        eprintln!("{} diagnostic(s):", diagnostics.len());
        for diagnostic in &diagnostics {
            eprintln!("  {}", diagnostic);
        }
    }

    let formatted = match matches.get_one::<String>("format").unwrap().as_str() {
        "outline" => formats::to_outline(&paper),
        "json" => formats::to_json(&paper).unwrap_or_else(|err| {
            eprintln!("Error formatting tree: {}", err);
            std::process::exit(1);
        }),
        "yaml" => formats::to_yaml(&paper).unwrap_or_else(|err| {
            eprintln!("Error formatting tree: {}", err);
            std::process::exit(1);
        }),
        other => {
            eprintln!("Format '{}' not supported", other);
            eprintln!("Available formats: outline, json, yaml");
            std::process::exit(1);
        }
    };

    println!("{}", formatted);
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}
