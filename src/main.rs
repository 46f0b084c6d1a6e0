//! admitbuddy - Main CLI Entry Point

use anyhow::Result;
use chrono::{Local, NaiveDate};
use clap::Parser;
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;
use std::sync::Arc;
use std::time::Duration;

use admitbuddy::bootstrap::{Bootstrap, BootstrapStatus, EXIT_CODE_SETUP_NEEDED};
use admitbuddy::cli::{Args, Commands, Verbosity};
use admitbuddy::config::Config;
use admitbuddy::embedding::EmbeddingEngine;
use admitbuddy::generation::{build_prompt, OllamaClient};
use admitbuddy::ingest::Ingestor;
use admitbuddy::rag::{AnswerPipeline, CrossEncoder, PipelineParams, QdrantRetriever};
use admitbuddy::store::VectorStore;

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let mut config = Config::load()?;
    if let Some(model) = &args.model {
        config.ollama.model = model.clone();
    }
    if let Some(url) = &args.qdrant_url {
        config.qdrant.url = url.clone();
    }

    match &args.command {
        Commands::Ask {
            question,
            date,
            k,
            top_k,
        } => {
            let reference_date = parse_reference_date(date.as_deref())?;
            let params = PipelineParams {
                retrieve_k: k.unwrap_or(config.pipeline.retrieve_k),
                top_k: top_k.unwrap_or(config.pipeline.top_k),
            };

            let assistant = Assistant::build(&config, args.verbosity()).await?;
            assistant.answer(question, reference_date, &params).await?;
        }
        Commands::Chat => {
            run_chat(&config, args.verbosity()).await?;
        }
        Commands::Ingest { dir } => {
            run_ingest(&config, dir, args.verbosity()).await?;
        }
        Commands::Doctor => {
            run_doctor(&config).await?;
        }
        Commands::Config => {
            show_config(&config);
        }
    }

    Ok(())
}

fn parse_reference_date(date: Option<&str>) -> Result<NaiveDate> {
    match date {
        Some(raw) => NaiveDate::parse_from_str(raw, "%Y-%m-%d")
            .map_err(|e| anyhow::anyhow!("Invalid --date '{}' (expected YYYY-MM-DD): {}", raw, e)),
        None => Ok(Local::now().date_naive()),
    }
}

fn spinner(message: &str, show: bool) -> Option<ProgressBar> {
    if !show {
        return None;
    }
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.cyan} {msg}")
            .unwrap(),
    );
    pb.set_message(message.to_string());
    pb.enable_steady_tick(Duration::from_millis(100));
    Some(pb)
}

/// One-time wiring of models, index and pipeline; reused per question
struct Assistant {
    pipeline: AnswerPipeline,
    generator: OllamaClient,
    contact_email: String,
    verbosity: Verbosity,
}

impl Assistant {
    async fn build(config: &Config, verbosity: Verbosity) -> Result<Self> {
        let pb = spinner("Loading models...", verbosity.show_progress());

        // Model and index handles are created once and shared read-only
        let embedder = Arc::new(EmbeddingEngine::with_model(&config.models.embedding)?);
        let cross_encoder = Arc::new(CrossEncoder::with_model(&config.models.reranker)?);
        let store = Arc::new(VectorStore::connect(
            &config.qdrant.url,
            &config.qdrant.collection,
        )?);

        if let Some(pb) = pb {
            pb.finish_and_clear();
        }

        let retriever = Arc::new(QdrantRetriever::new(embedder, store));
        let pipeline = AnswerPipeline::new(
            retriever,
            cross_encoder,
            config.guardrail.contact_email.clone(),
        );

        let generator = OllamaClient::new(&config.ollama_url(), &config.ollama.model)?;

        Ok(Self {
            pipeline,
            generator,
            contact_email: config.guardrail.contact_email.clone(),
            verbosity,
        })
    }

    /// Run the pipeline for one question and print the answer
    async fn answer(
        &self,
        question: &str,
        reference_date: NaiveDate,
        params: &PipelineParams,
    ) -> Result<()> {
        let pb = spinner("Searching program documents...", self.verbosity.show_progress());

        let result = self.pipeline.run(question, reference_date, params).await?;

        if let Some(pb) = pb {
            pb.finish_and_clear();
        }

        if self.verbosity.show_stages() {
            eprintln!(
                "[PIPELINE] {} passages in context, verdict: {:?}",
                result.sources.len(),
                result.verdict
            );
        }

        if result.verdict.is_abstain() {
            if let Some(advisory) = result.verdict.advisory() {
                println!("{}", advisory.yellow());
            }
            return Ok(());
        }

        if !result.has_context() {
            println!(
                "{}",
                format!(
                    "No information found in the program documents for this question. \
                     Please contact admissions at {}.",
                    self.contact_email
                )
                .yellow()
            );
            return Ok(());
        }

        let prompt = build_prompt(&result.context, question, reference_date, &self.contact_email);

        let answer = self
            .generator
            .generate_streaming(prompt, |token| {
                print!("{}", token);
                use std::io::Write;
                std::io::stdout().flush().ok();
            })
            .await?;
        println!();

        if answer.trim().is_empty() {
            println!("{}", "No answer returned.".yellow());
        }

        if !result.sources.is_empty() {
            println!("\n{}", "Sources:".bold());
            let mut seen = Vec::new();
            for source in &result.sources {
                if !seen.contains(source) {
                    println!("  - {}", source.dimmed());
                    seen.push(source.clone());
                }
            }
        }

        if let Some(advisory) = result.verdict.advisory() {
            println!("\n{}", advisory.yellow());
        }

        Ok(())
    }
}

async fn run_chat(config: &Config, verbosity: Verbosity) -> Result<()> {
    let assistant = Assistant::build(config, verbosity).await?;

    let history_path = dirs::home_dir()
        .unwrap_or_else(|| std::path::PathBuf::from("."))
        .join(".admitbuddy_history");

    let mut editor = DefaultEditor::new()?;
    if history_path.exists() {
        let _ = editor.load_history(&history_path);
    }

    println!("{}", "admitbuddy chat - MS in Applied Data Science".bold());
    println!("Ask a question, or type 'exit' to quit.\n");

    loop {
        match editor.readline("you> ") {
            Ok(line) => {
                let question = line.trim();
                if question.is_empty() {
                    continue;
                }
                if question == "exit" || question == "quit" {
                    break;
                }

                let _ = editor.add_history_entry(question);

                // Each turn is an independent pipeline invocation; errors are
                // reported and the session continues
                let reference_date = Local::now().date_naive();
                let params = PipelineParams {
                    retrieve_k: config.pipeline.retrieve_k,
                    top_k: config.pipeline.top_k,
                };
                if let Err(e) = assistant.answer(question, reference_date, &params).await {
                    eprintln!("{} {}", "Error:".red(), e);
                }
                println!();
            }
            Err(ReadlineError::Interrupted) => {
                println!("Use 'exit' to quit");
                continue;
            }
            Err(ReadlineError::Eof) => break,
            Err(e) => return Err(e.into()),
        }
    }

    let _ = editor.save_history(&history_path);

    Ok(())
}

async fn run_ingest(config: &Config, dir: &std::path::Path, verbosity: Verbosity) -> Result<()> {
    let pb = spinner("Loading embedding model...", verbosity.show_progress());
    let embedder = Arc::new(EmbeddingEngine::with_model(&config.models.embedding)?);
    if let Some(pb) = pb {
        pb.finish_and_clear();
    }

    let store = Arc::new(VectorStore::connect(
        &config.qdrant.url,
        &config.qdrant.collection,
    )?);

    let ingestor = Ingestor::new(embedder, store);
    let report = ingestor.ingest_dir(dir).await?;

    if report.documents == 0 {
        println!("No .txt documents found in {}", dir.display());
    } else {
        println!(
            "{} Ingested {} documents ({} chunks) into '{}'",
            "OK".green(),
            report.documents,
            report.chunks,
            config.qdrant.collection
        );
    }

    Ok(())
}

async fn run_doctor(config: &Config) -> Result<()> {
    let store = Arc::new(VectorStore::connect(
        &config.qdrant.url,
        &config.qdrant.collection,
    )?);
    let generator = OllamaClient::new(&config.ollama_url(), &config.ollama.model)?;

    let bootstrap = Bootstrap::new(store, generator);

    println!("Running health checks...\n");

    match bootstrap.check().await? {
        BootstrapStatus::Ready => {
            println!("{} Qdrant reachable at {}", "OK".green(), config.qdrant.url);
            println!("{} Collection '{}' is populated", "OK".green(), config.qdrant.collection);
            println!("{} Ollama reachable at {}", "OK".green(), config.ollama_url());
            println!("{} Model '{}' available", "OK".green(), config.ollama.model);
            println!("\nAll checks passed.");
        }
        BootstrapStatus::QdrantNotRunning => {
            Bootstrap::show_qdrant_instructions();
            std::process::exit(EXIT_CODE_SETUP_NEEDED);
        }
        BootstrapStatus::IndexEmpty(collection) => {
            Bootstrap::show_ingest_instructions(&collection);
            std::process::exit(EXIT_CODE_SETUP_NEEDED);
        }
        BootstrapStatus::OllamaNotRunning => {
            Bootstrap::show_ollama_instructions();
            std::process::exit(EXIT_CODE_SETUP_NEEDED);
        }
        BootstrapStatus::ModelNotAvailable(model) => {
            Bootstrap::show_model_pull_instructions(&model);
            std::process::exit(EXIT_CODE_SETUP_NEEDED);
        }
    }

    Ok(())
}

fn show_config(config: &Config) {
    println!("admitbuddy configuration\n");

    println!("Qdrant:");
    println!("  URL:        {}", config.qdrant.url);
    println!("  Collection: {}", config.qdrant.collection);
    println!();

    println!("Ollama:");
    println!("  URL:   {}", config.ollama_url());
    println!("  Model: {}", config.ollama.model);
    println!();

    println!("Models:");
    println!("  Embedding: {}", config.models.embedding);
    println!("  Reranker:  {}", config.models.reranker);
    println!();

    println!("Pipeline:");
    println!("  Retrieve k: {}", config.pipeline.retrieve_k);
    println!("  Top k:      {}", config.pipeline.top_k);
    println!();

    println!("Guardrail:");
    println!("  Contact: {}", config.guardrail.contact_email);
    println!();

    if let Ok(path) = Config::config_path() {
        println!("Config file: {}", path.display());
    }
}
