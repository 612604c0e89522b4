//! DocLens CLI
//!
//! Command-line interface for the document analysis pipeline.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

use doclens_agents::{AnalystAgent, ChatbotSession, LlmConfig, OpenAiProvider};
use doclens_core::{chunk_document, AnalysisKind, AnalysisResult, Chunk, DocumentText};

/// DocLens - Intelligent analysis of PDF, Word and PowerPoint documents
#[derive(Parser)]
#[command(name = "doclens")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Verbose output
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract a document and show its statistics (no model calls)
    Inspect {
        /// Path to a .pdf, .docx or .pptx file
        path: PathBuf,
    },

    /// Triage a document: type, main topic, suggested analyses
    Profile {
        /// Path to a .pdf, .docx or .pptx file
        path: PathBuf,
    },

    /// Run an analysis strategy over a document
    Analyze {
        /// Path to a .pdf, .docx or .pptx file
        path: PathBuf,

        /// summary | topics | data | clauses | timeline, or any custom label
        #[arg(short, long, default_value = "summary")]
        kind: String,

        /// Write the serialized result to a JSON file
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Chat with every document in a folder
    Chat {
        /// Folder to ingest recursively
        folder: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from .env if present.
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    // Setup logging
    let log_level = if cli.verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    match cli.command {
        Commands::Inspect { path } => cmd_inspect(&path),
        Commands::Profile { path } => cmd_profile(&path).await,
        Commands::Analyze { path, kind, output } => cmd_analyze(&path, &kind, output).await,
        Commands::Chat { folder } => cmd_chat(&folder).await,
    }
}

/// Credentials are validated up front; no command reaches the pipeline
/// with a broken configuration.
fn make_provider() -> Result<Arc<OpenAiProvider>> {
    let config = LlmConfig::from_env().context("LLM configuration is invalid")?;
    Ok(Arc::new(OpenAiProvider::new(config)))
}

fn load_document(path: &Path) -> Result<(DocumentText, String)> {
    let doc = doclens_extract::extract_path(path)
        .with_context(|| format!("Failed to extract {}", path.display()))?;
    let filename = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());
    Ok((doc, filename))
}

fn cmd_inspect(path: &Path) -> Result<()> {
    let (doc, filename) = load_document(path)?;
    let digest = doc.digest();

    println!("Document: {} ({})", filename, digest.kind);
    if let Some(pages) = doc.metadata.pages {
        println!("Pages: {}", pages);
    }
    if let Some(paragraphs) = doc.metadata.paragraphs {
        println!("Paragraphs: {}", paragraphs);
    }
    if let Some(slides) = doc.metadata.slides {
        println!("Slides: {}", slides);
    }
    println!("Words: {}", digest.word_count);
    println!("Characters: {}", digest.char_count);
    println!("Estimated reading time: {} min", digest.estimated_reading_minutes);
    println!("Has images: {}", if digest.has_images { "yes" } else { "no" });
    println!("Has tables: {}", if digest.has_tables { "yes" } else { "no" });

    if !digest.potential_titles.is_empty() {
        println!("Potential titles:");
        for title in &digest.potential_titles {
            println!("  - {}", title);
        }
    }

    let chunks = chunk_document(&doc, &filename, None);
    println!("Chunks at default size: {}", chunks.len());

    Ok(())
}

async fn cmd_profile(path: &Path) -> Result<()> {
    let provider = make_provider()?;
    let (doc, filename) = load_document(path)?;

    let analyst = AnalystAgent::new(provider);
    let profile = analyst.profile_document(&doc, &filename).await;

    println!("Document type: {}", profile.document_type);
    println!("Main topic: {}", profile.main_topic);
    println!("Confidence: {}%", profile.confidence);
    if let Some(pages) = profile.structure.estimated_pages {
        println!("Estimated pages: {}", pages);
    }
    if let Some(ref language) = profile.structure.language {
        println!("Language: {}", language);
    }
    if !profile.structure.main_sections.is_empty() {
        println!("Main sections:");
        for section in &profile.structure.main_sections {
            println!("  - {}", section);
        }
    }
    if !profile.key_entities.is_empty() {
        println!("Key entities: {}", profile.key_entities.join(", "));
    }
    println!("Suggested analyses:");
    for kind in &profile.suggested_analyses {
        println!("  - {}", kind);
    }
    println!("Recommended first: {}", profile.priority_analysis);

    Ok(())
}

async fn cmd_analyze(path: &Path, kind_selector: &str, output: Option<PathBuf>) -> Result<()> {
    let provider = make_provider()?;
    let (doc, filename) = load_document(path)?;
    let kind = AnalysisKind::from_selector(kind_selector);

    let chunks: Vec<Chunk> = chunk_document(&doc, &filename, None);
    println!("Analyzing {} ({} chunks)...", filename, chunks.len());

    let analyst = AnalystAgent::new(provider);
    let result = analyst.analyze(&chunks, &kind).await?;

    print_result(&result);

    if let Some(output_path) = output {
        let json = result.to_json_pretty()?;
        std::fs::write(&output_path, json)
            .with_context(|| format!("Failed to write {}", output_path.display()))?;
        println!("\nResult written to {}", output_path.display());
    }

    Ok(())
}

fn print_list(heading: &str, items: &[String]) {
    if items.is_empty() {
        return;
    }
    println!("{}:", heading);
    for item in items {
        println!("  - {}", item);
    }
}

fn print_result(result: &AnalysisResult) {
    println!("\n=== {} ===\n", result.kind());

    match result {
        AnalysisResult::ExecutiveSummary(summary) => {
            println!("{}\n", summary.summary);
            print_list("Key findings", &summary.key_findings);
            print_list("Important metrics", &summary.important_metrics);
            print_list("Recommendations", &summary.recommendations);
            print_list("Main conclusions", &summary.main_conclusions);
            if summary.consolidation_degraded {
                println!("\n(consolidation degraded: synthesized from raw section results)");
            }
        }
        AnalysisResult::Topics(topics) => {
            for branch in &topics.hierarchy {
                if branch.subtopics.is_empty() {
                    println!("- {}", branch.topic);
                } else {
                    println!("- {} ({})", branch.topic, branch.subtopics.join(", "));
                }
            }
            for report in &topics.reports {
                println!("\n## {}\n", report.topic);
                println!("{}", report.summary);
                print_list("Key points", &report.key_points);
                print_list("Details", &report.details);
                print_list("Related data", &report.related_data);
            }
        }
        AnalysisResult::DataExtraction(data) => {
            print_list("Dates", &data.dates);
            print_list("Numbers", &data.numbers);
            print_list("Percentages", &data.percentages);
            print_list("Currencies", &data.currencies);
            print_list("Names", &data.names);
            print_list("Locations", &data.locations);
            print_list("Organizations", &data.organizations);
        }
        AnalysisResult::Clauses(clauses) => {
            for record in &clauses.sections {
                println!("Section {}:", record.section);
                print_list("  Clauses", &record.clauses_found);
                print_list("  Key terms", &record.key_terms);
                print_list("  Obligations", &record.obligations);
                print_list("  Conditions", &record.important_conditions);
            }
        }
        AnalysisResult::Timeline(timeline) => {
            for event in &timeline.events {
                println!("{} - {} ({:?})", event.date, event.event, event.importance);
            }
        }
        AnalysisResult::General(general) => {
            println!("{}", general.content);
        }
    }
}

async fn cmd_chat(folder: &Path) -> Result<()> {
    let provider = make_provider()?;
    let mut session = ChatbotSession::new(provider);

    let count = session
        .ingest_folder(folder)
        .with_context(|| format!("Failed to ingest {}", folder.display()))?;
    if count == 0 {
        anyhow::bail!("No supported documents found in {}", folder.display());
    }

    println!("{}\n", session.summary());
    println!("Ask questions about the documents. Commands: summary, stats, exit\n");

    let stdin = io::stdin();
    loop {
        print!("> ");
        io::stdout().flush()?;

        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            break;
        }
        let question = line.trim();

        match question {
            "" => continue,
            "exit" | "quit" => break,
            "summary" => println!("{}", session.summary()),
            "stats" => {
                let stats = session.stats();
                println!("Questions asked: {}", stats.total_questions);
                if !stats.most_consulted.is_empty() {
                    println!("Most consulted documents:");
                    for (name, mentions) in &stats.most_consulted {
                        println!("  - {} ({} citations)", name, mentions);
                    }
                }
            }
            _ => {
                let answer = session.ask(question).await?;
                println!("{}\n", answer);
            }
        }
    }

    Ok(())
}
