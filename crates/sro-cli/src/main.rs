//! SRO CLI - Command-line interface
//!
//! Usage:
//!   sro extract <doc.json>... [--format csv|json|jsonl] [--output <file>]
//!   sro graph <doc.json> [--node <name>] [--top <n>]
//!   sro eval <doc.json> --gold <gold.json>

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use sro_core::{AppConfig, Document, LoggingConfig, OutputFormat, Triplet};
use sro_extractor::metrics::AggregateMetrics;
use sro_extractor::{export, Extraction, RuleBasedSro, TripletExtractor};
use sro_graph::KnowledgeGraph;

#[derive(Parser)]
#[command(name = "sro")]
#[command(about = "Subject-Relation-Object triplet extraction CLI")]
#[command(version)]
struct Cli {
    /// TOML configuration file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract triplets from annotated documents
    Extract {
        /// Annotated document files (JSON)
        #[arg(required = true)]
        documents: Vec<PathBuf>,
        /// Output format
        #[arg(long)]
        format: Option<OutputFormat>,
        /// Write to a file instead of stdout
        #[arg(long, short)]
        output: Option<PathBuf>,
        /// Minimum subject frequency
        #[arg(long)]
        subject_threshold: Option<usize>,
        /// Minimum object frequency
        #[arg(long)]
        object_threshold: Option<usize>,
        /// Skip subject merging
        #[arg(long)]
        no_merge: bool,
        /// Skip all post-processing
        #[arg(long)]
        raw: bool,
    },
    /// Summarize the knowledge graph of a document
    Graph {
        document: PathBuf,
        /// Print the outgoing triplets of one node
        #[arg(long)]
        node: Option<String>,
        /// Number of highest-degree nodes to list
        #[arg(long, default_value_t = 10)]
        top: usize,
    },
    /// Score a document's triplets against a gold collection
    Eval {
        document: PathBuf,
        /// Gold triplets (JSON array)
        #[arg(long)]
        gold: PathBuf,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = load_config(cli.config.as_deref())?;
    init_logging(&config.logging);

    match cli.command {
        Commands::Extract {
            documents,
            format,
            output,
            subject_threshold,
            object_threshold,
            no_merge,
            raw,
        } => {
            if let Some(format) = format {
                config.output.format = format;
            }
            if let Some(threshold) = subject_threshold {
                config.postprocess.subject_threshold = threshold;
            }
            if let Some(threshold) = object_threshold {
                config.postprocess.object_threshold = threshold;
            }
            if no_merge {
                config.postprocess.merge_subjects = false;
            }

            let triplets = extract_all(&config, documents, raw).await?;
            let mut writer = open_output(output.as_deref())?;
            export::write_triplets(&mut writer, &triplets, config.output.format)?;
            writer.flush()?;
        }
        Commands::Graph {
            document,
            node,
            top,
        } => {
            let extraction = extract_file(&RuleBasedSro::from_app_config(&config), &document, false)?;
            let graph = KnowledgeGraph::from_triplets(&extraction.triplets);
            println!(
                "Nodes: {} | Edges: {}",
                graph.node_count(),
                graph.edge_count()
            );

            match node {
                Some(node) => {
                    if !graph.contains(&node) {
                        anyhow::bail!("Node not found in graph: {}", node);
                    }
                    let mut stdout = io::stdout().lock();
                    export::write_triplets(&mut stdout, &graph.subgraph(&node), config.output.format)?;
                }
                None => {
                    for entry in graph.top_nodes(top) {
                        println!("{}\t{}", entry.degree, entry.node);
                    }
                }
            }
        }
        Commands::Eval { document, gold } => {
            let extraction = extract_file(&RuleBasedSro::from_app_config(&config), &document, false)?;
            let content = std::fs::read_to_string(&gold)
                .with_context(|| format!("Failed to read {}", gold.display()))?;
            let gold_triplets: Vec<Triplet> = serde_json::from_str(&content)
                .with_context(|| format!("Invalid gold collection {}", gold.display()))?;

            let mut metrics = AggregateMetrics::default();
            metrics.add_document(&extraction.triplets, &gold_triplets);
            println!("{}", metrics.report());
        }
    }

    Ok(())
}

fn load_config(path: Option<&Path>) -> anyhow::Result<AppConfig> {
    let config = match path {
        Some(path) => AppConfig::from_file(path)?.with_env_override()?,
        None => AppConfig::from_env()?,
    };
    Ok(config)
}

/// Logs go to stderr so stdout stays clean for exported triplets
fn init_logging(config: &LoggingConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_file(config.include_location)
        .with_line_number(config.include_location);

    if config.json_format {
        builder.json().init();
    } else {
        builder.init();
    }
}

/// One blocking task per document; results are concatenated in input order
async fn extract_all(config: &AppConfig, documents: Vec<PathBuf>, raw: bool) -> anyhow::Result<Vec<Triplet>> {
    let extractor = Arc::new(RuleBasedSro::from_app_config(config));

    let handles: Vec<_> = documents
        .into_iter()
        .map(|path| {
            let extractor = Arc::clone(&extractor);
            tokio::task::spawn_blocking(move || {
                let extraction = extract_file(&extractor, &path, raw)?;
                Ok::<_, anyhow::Error>((path, extraction))
            })
        })
        .collect();

    let mut triplets = Vec::new();
    for handle in handles {
        let (path, extraction) = handle.await.context("Extraction task failed")??;
        info!(
            document = %path.display(),
            triplets = extraction.len(),
            rejected = extraction.stats.rejected,
            removed = extraction.stats.postprocess.rows_removed(),
            "Document processed"
        );
        triplets.extend(extraction.triplets);
    }
    Ok(triplets)
}

fn extract_file(extractor: &RuleBasedSro, path: &Path, raw: bool) -> anyhow::Result<Extraction> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let document = Document::from_json(&content)
        .with_context(|| format!("Invalid document {}", path.display()))?;

    let extraction = if raw {
        extractor.extract_raw(&document)
    } else {
        extractor.extract(&document)
    };
    extraction.with_context(|| format!("Extraction failed for {}", path.display()))
}

fn open_output(path: Option<&Path>) -> anyhow::Result<Box<dyn Write>> {
    Ok(match path {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("Failed to create {}", path.display()))?;
            Box::new(BufWriter::new(file))
        }
        None => Box::new(BufWriter::new(io::stdout().lock())),
    })
}
