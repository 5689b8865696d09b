use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tokio::task::JoinSet;
use tracing::{Level, info, warn};
use tracing_subscriber::FmtSubscriber;

use oncoclass::io::load_document;
use oncoclass::{
    AnalyzedDocument, BiomarkerField, ClassificationReport, ExtractionConfig, HumanSummary,
    ResourceTable, SourceDocument, analyze_document, finish_submission, load_documents,
    load_resource_table,
};

#[derive(Parser)]
#[command(name = "oncoclass")]
#[command(author, version, about = "Biomarker extraction and staging for OCR'd oncology reports", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Classify a submission made of one or more OCR'd reports
    Classify {
        /// Input documents (.txt, or .json with {"text", "mimeType", "reportDate"})
        #[arg(short, long, required = true, num_args = 1..)]
        input: Vec<PathBuf>,

        /// Output file for the classification report (JSON)
        #[arg(short, long)]
        output: PathBuf,

        /// Output file for a human-readable summary (text)
        #[arg(long)]
        human_readable: Option<PathBuf>,

        /// Stage confirmed by the patient; overrides the calculated stage
        #[arg(long)]
        stage: Option<String>,

        /// Stage-to-resource table (JSON object) replacing the built-in one
        #[arg(long)]
        resources: Option<PathBuf>,

        /// PD-L1 percentage at or above which expression is high
        #[arg(long, env = "ONCOCLASS_PDL1_THRESHOLD", default_value = "10")]
        pdl1_threshold: u32,

        /// Ki-67 percentage at or above which proliferation is high
        #[arg(long, env = "ONCOCLASS_KI67_THRESHOLD", default_value = "20")]
        ki67_threshold: u32,

        /// Verbose output
        #[arg(short, long)]
        verbose: bool,
    },

    /// Show what the extractor detects in a single document
    Extract {
        /// Input document
        #[arg(short, long)]
        input: PathBuf,

        /// Only show these fields (e.g. HER2, ERPR); repeatable
        #[arg(short, long)]
        field: Vec<BiomarkerField>,

        /// Verbose output
        #[arg(short, long)]
        verbose: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Classify {
            input,
            output,
            human_readable,
            stage,
            resources,
            pdl1_threshold,
            ki67_threshold,
            verbose,
        } => {
            setup_logging(verbose);
            let config = ExtractionConfig {
                pdl1_positivity_threshold: pdl1_threshold,
                ki67_high_threshold: ki67_threshold,
                ..Default::default()
            };
            classify_submission(input, output, human_readable, stage, resources, config).await
        }
        Commands::Extract {
            input,
            field,
            verbose,
        } => {
            setup_logging(verbose);
            extract_document(input, field).await
        }
    }
}

fn setup_logging(verbose: bool) {
    let level = if verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder().with_max_level(level).finish();
    tracing::subscriber::set_global_default(subscriber).ok();
}

async fn classify_submission(
    input: Vec<PathBuf>,
    output: PathBuf,
    human_readable: Option<PathBuf>,
    stage: Option<String>,
    resources: Option<PathBuf>,
    config: ExtractionConfig,
) -> Result<()> {
    let table = match resources {
        Some(path) => {
            info!("Loading resource table from {:?}", path);
            load_resource_table(&path)?
        }
        None => ResourceTable::default(),
    };

    let documents = load_documents(&input).await;
    info!("Loaded {} of {} documents", documents.len(), input.len());
    if documents.is_empty() {
        warn!("No readable documents; classifying an empty record");
    }

    // Stage 0 runs per document in parallel; the merge is a single fold
    let analyzed = analyze_concurrently(documents, Arc::new(config)).await?;
    let submission = finish_submission(analyzed, stage.as_deref(), &table);

    let report = ClassificationReport::new(
        submission.documents,
        submission.record,
        submission.classification,
        &table,
    );
    report.write_json(&output)?;
    info!("Output written to {:?}", output);

    if let Some(path) = human_readable {
        HumanSummary::new(&report).write_file(&path)?;
        info!("Human-readable summary written to {:?}", path);
    }

    info!(
        "Complete: {} ({} packages)",
        report.classification.user_stage,
        report.classification.packages.len()
    );

    Ok(())
}

async fn analyze_concurrently(
    documents: Vec<SourceDocument>,
    config: Arc<ExtractionConfig>,
) -> Result<Vec<AnalyzedDocument>> {
    let mut tasks = JoinSet::new();
    for (index, document) in documents.into_iter().enumerate() {
        let config = Arc::clone(&config);
        tasks.spawn_blocking(move || (index, analyze_document(&document, &config)));
    }

    let mut analyzed = Vec::with_capacity(tasks.len());
    while let Some(joined) = tasks.join_next().await {
        analyzed.push(joined.context("Extraction task failed")?);
    }

    // Back to input order before folding
    analyzed.sort_by_key(|(index, _)| *index);
    Ok(analyzed.into_iter().map(|(_, doc)| doc).collect())
}

async fn extract_document(input: PathBuf, fields: Vec<BiomarkerField>) -> Result<()> {
    info!("Extracting fields from {:?}", input);
    let document = load_document(&input)
        .await
        .context("Failed to load input document")?;
    let analyzed = analyze_document(&document, &ExtractionConfig::default());

    println!("Document Analysis");
    println!("=================");
    println!("Source: {}", analyzed.source);
    println!("Report type: {}", analyzed.meta.report_type.as_str());
    match analyzed.meta.report_date {
        Some(date) => println!("Report date: {}", date),
        None => println!("Report date: not found"),
    }
    println!();

    println!("Fields");
    println!("------");
    let shown: Vec<BiomarkerField> = if fields.is_empty() {
        BiomarkerField::ALL.to_vec()
    } else {
        fields
    };
    for field in shown {
        let accepted = if analyzed.meta.report_type.allows(field) {
            ""
        } else {
            " (ignored for this report type)"
        };
        println!(
            "{:<20}{}{}",
            field.label(),
            analyzed.detected.display(field),
            accepted
        );
    }
    println!();
    println!(
        "{} of {} fields detected",
        analyzed.detected.detected_count(),
        BiomarkerField::ALL.len()
    );

    Ok(())
}
