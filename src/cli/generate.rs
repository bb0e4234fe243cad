use std::sync::Arc;
use std::time::Instant;

use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{info, warn};

use crate::classify::{summary_line, Classifier};
use crate::cli::commands::ConfigArgs;
use crate::config::{ChatCredentials, EmbeddingCredentials};
use crate::errors::SondoError;
use crate::llm::{Embedder, OpenAiChat, OpenAiEmbedder, TextGenerator};
use crate::models::{Job, RunReport};
use crate::prompts::{self, PromptLibrary};
use crate::store::CategoryStore;
use crate::synthesis::SynthesisLoop;
use crate::writer;

pub async fn handle_generate(args: ConfigArgs) -> Result<(), SondoError> {
    let config = args.load().await?;
    info!(vendor = %config.vendor, product = %config.product, "Starting payload generation");

    let creds = ChatCredentials::from_env()?;
    let llm: Arc<dyn TextGenerator> =
        Arc::new(OpenAiChat::new(&creds.api_base, &creds.api_key, &creds.model));
    let embedder: Option<Arc<dyn Embedder>> = match EmbeddingCredentials::from_env() {
        Some(creds) => Some(Arc::new(OpenAiEmbedder::new(
            &creds.api_base,
            &creds.api_key,
            &creds.model,
        ))),
        None => {
            info!("No embedding credentials; fitness falls back to lexical scoring");
            None
        }
    };

    let prompts = PromptLibrary::new(&config.workspace);
    let target_template = prompts.target_template()?;
    let prerequisites_template = prompts.prerequisites_template()?;
    let poc_template = prompts.poc_template(&config.vendor)?;

    let seeds = crate::inputs::scan_inputs(&config.input_dir())?;
    if seeds.is_empty() {
        println!("No input files found.");
        return Ok(());
    }

    let output_root = config.output_dir();
    writer::clean_output_root(&output_root)?;

    let mut store = CategoryStore::load(&config.store_path);
    let classifier = Classifier::new(llm.clone());
    let synthesis = SynthesisLoop::new(
        llm,
        embedder,
        prerequisites_template,
        config.synthesis.clone(),
    );

    let bar = ProgressBar::new(seeds.len() as u64);
    bar.set_style(
        ProgressStyle::default_bar()
            .template("  {bar:40.cyan/dark_gray} {pos}/{len} | {msg}")
            .unwrap()
            .progress_chars("█▓░"),
    );

    let mut report = RunReport::new();
    for seed in seeds {
        let started = Instant::now();
        let template_prompt = prompts::fill_target(&target_template, &seed.baseline_packet);
        let mut job = Job::from_seed(seed, &config.vendor, &config.product, template_prompt);
        bar.set_message(job.label().to_string());

        classifier.classify(&mut store, &mut job).await;
        bar.println(summary_line(&job));

        let clues = store
            .clues(job.function_category_str())
            .map(<[String]>::to_vec)
            .unwrap_or_default();
        let items = synthesis.run(&job, clues).await.into_items();

        match writer::write_artifacts(&job, &items, &poc_template, &output_root) {
            Ok(paths) => {
                let label = job.label().to_string();
                report.record(&label, started.elapsed().as_millis() as u64, paths.len());
            }
            Err(e) => {
                warn!(label = job.label(), error = %e, "No scripts written for task");
                report.skipped += 1;
            }
        }
        bar.inc(1);
    }
    bar.finish_and_clear();

    print_report(&report);
    Ok(())
}

fn print_report(report: &RunReport) {
    println!("Per-task elapsed time:");
    for timing in &report.jobs {
        println!(
            "  {}: {:.2}s ({} scripts)",
            timing.label,
            timing.elapsed_ms as f64 / 1000.0,
            timing.artifacts
        );
    }
    if report.skipped > 0 {
        println!("  {} task(s) produced nothing", style(report.skipped).yellow());
    }
    println!(
        "Total elapsed: {:.2}s, {} scripts",
        report.total_elapsed_ms() as f64 / 1000.0,
        style(report.total_artifacts()).green()
    );
}
