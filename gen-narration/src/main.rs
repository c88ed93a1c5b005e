//! gen-narration - Turn Japanese scripts into VOICEVOX narration

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use gen_narration::NarrationConfig;
use gen_narration::files::scan_documents;
use gen_narration::pipeline::{
    NarrationPaths, NarrationSummary, SynthesisOptions, combine_documents, narrate_document,
    write_document_script,
};
use gen_narration::text::{Segmenter, TokenizerKind};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};
use voicevox_client::{Synthesizer, VoicevoxEngine};

#[derive(Parser, Debug)]
#[command(name = "gen-narration")]
#[command(about = "Narrate Japanese documents with VOICEVOX", long_about = None)]
#[command(version)]
struct Args {
    /// Documents to narrate (default: every *.txt in the input directory)
    files: Vec<PathBuf>,

    /// Maximum script line length in characters
    #[arg(long)]
    max_length: Option<usize>,

    /// VOICEVOX speaker id
    #[arg(long)]
    speaker: Option<u32>,

    /// Maximum concurrent synthesis requests
    #[arg(long)]
    concurrency: Option<usize>,

    /// VOICEVOX engine base URL
    #[arg(long)]
    engine_url: Option<String>,

    /// Word tokenizer used for line wrapping
    #[arg(long, value_enum)]
    tokenizer: Option<TokenizerKind>,

    /// Compiled vibrato dictionary (.dic or .dic.zst)
    #[arg(long)]
    dictionary: Option<PathBuf>,

    /// Directory for scripts and combined audio
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// Write scripts only, skip synthesis
    #[arg(long)]
    script_only: bool,

    /// Keep per-line audio after a successful run
    #[arg(long)]
    keep_work: bool,

    /// Do not join all documents into output_all.wav
    #[arg(long)]
    no_combine: bool,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Print the script lines of a document to stdout
    Script {
        /// Path to the document
        file: PathBuf,
    },
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug)]
enum ConfigAction {
    /// Show current configuration
    Show,
    /// Set default maximum line length
    SetMaxLength {
        /// Characters per line (at least 1)
        value: usize,
    },
    /// Set default speaker id
    SetSpeaker {
        /// VOICEVOX speaker id
        value: u32,
    },
    /// Set default synthesis concurrency
    SetConcurrency {
        /// Requests in flight (at least 1)
        value: usize,
    },
    /// Set default engine URL
    SetEngineUrl {
        /// Base URL, e.g. http://localhost:50021
        url: String,
    },
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.verbose);

    if let Some(Commands::Config { action }) = &args.command {
        return handle_config_command(action);
    }

    let mut config = NarrationConfig::load().context("Failed to load configuration")?;
    apply_overrides(&mut config, &args);
    let segmenter = config
        .build_segmenter()
        .context("Failed to initialize the segmenter")?;
    log::info!(
        "Segmenter ready: tokenizer={}, max_length={}",
        segmenter.tokenizer_name(),
        segmenter.max_length()
    );

    if let Some(Commands::Script { file }) = &args.command {
        for line in segmenter.segment_file(file)? {
            println!("{}", line);
        }
        return Ok(());
    }

    let documents = if args.files.is_empty() {
        scan_documents(&config.input_dir).with_context(|| {
            format!("Failed to scan input directory {}", config.input_dir.display())
        })?
    } else {
        args.files.clone()
    };

    if documents.is_empty() {
        anyhow::bail!(
            "No documents to narrate. Pass files or put *.txt files in {}",
            config.input_dir.display()
        );
    }

    let start = Instant::now();
    let failures = if args.script_only {
        write_scripts(&segmenter, &documents, &config.output_dir)
    } else {
        narrate_all(&segmenter, &documents, &config, &args).await?
    };

    eprintln!(
        "\nProcessed {} document(s) in {:.1}s",
        documents.len(),
        start.elapsed().as_secs_f64()
    );

    if failures > 0 {
        anyhow::bail!("{} of {} document(s) failed", failures, documents.len());
    }

    Ok(())
}

fn apply_overrides(config: &mut NarrationConfig, args: &Args) {
    if let Some(max_length) = args.max_length {
        config.max_length = max_length;
    }
    if let Some(speaker) = args.speaker {
        config.speaker_id = speaker;
    }
    if let Some(concurrency) = args.concurrency {
        config.concurrency = concurrency;
    }
    if let Some(url) = &args.engine_url {
        config.engine_url = url.clone();
    }
    if let Some(tokenizer) = args.tokenizer {
        config.tokenizer = tokenizer;
    }
    if let Some(dictionary) = &args.dictionary {
        config.dictionary = Some(dictionary.clone());
    }
    if let Some(output_dir) = &args.output_dir {
        config.output_dir = output_dir.clone();
    }
    if args.no_combine {
        config.combine_all = false;
    }
}

/// Write scripts without synthesis. Returns the number of failed documents.
fn write_scripts(segmenter: &Segmenter, documents: &[PathBuf], output_dir: &Path) -> usize {
    let mut failures = 0;
    for document in documents {
        match write_document_script(segmenter, document, output_dir) {
            Ok((lines, path)) => {
                eprintln!("{}: {} lines -> {}", document.display(), lines.len(), path.display());
            }
            Err(e) => {
                eprintln!("{}: FAILED - {}", document.display(), e);
                failures += 1;
            }
        }
    }
    failures
}

/// Narrate every document. Returns the number of documents that failed.
async fn narrate_all(
    segmenter: &Segmenter,
    documents: &[PathBuf],
    config: &NarrationConfig,
    args: &Args,
) -> Result<usize> {
    let engine = VoicevoxEngine::new(&config.engine_config())
        .context("Failed to create VOICEVOX client")?;
    let version = engine.version().await.with_context(|| {
        format!(
            "VOICEVOX engine is not reachable at {}. Is it running?",
            config.engine_url
        )
    })?;
    eprintln!("VOICEVOX engine {} at {}", version, config.engine_url);

    let synthesizer: Arc<dyn Synthesizer> = Arc::new(engine);
    let paths = NarrationPaths {
        output_dir: config.output_dir.clone(),
        work_dir: config.work_dir.clone(),
        clean_work: !args.keep_work,
    };
    let options = SynthesisOptions {
        speaker_id: config.speaker_id,
        concurrency: config.concurrency,
        max_retries: config.max_retries,
        retry_delay: Duration::from_millis(500),
        skip_blank_lines: config.skip_blank_lines,
    };

    let mut failures = 0;
    let mut summaries = Vec::new();
    for document in documents {
        eprintln!("\nNarrating {}", document.display());

        let pb = ProgressBar::new(0);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} ({eta}) {msg}")
                .context("Invalid progress bar template")?
                .progress_chars("#>-"),
        );

        let result = narrate_document(
            segmenter,
            Arc::clone(&synthesizer),
            document,
            &paths,
            &options,
            |progress| {
                pb.set_length(progress.total as u64);
                pb.set_position((progress.completed + progress.failed) as u64);
                if progress.failed > 0 {
                    pb.set_message(format!("{} failed", progress.failed));
                }
            },
        )
        .await;

        match result {
            Ok(summary) => {
                pb.finish_and_clear();
                report_summary(&summary);
                if summary.failed > 0 {
                    failures += 1;
                }
                summaries.push(summary);
            }
            Err(e) => {
                pb.abandon();
                eprintln!("{}: FAILED - {}", document.display(), e);
                failures += 1;
            }
        }
    }

    if config.combine_all && documents.len() > 1 {
        match combine_documents(&summaries, &config.output_dir) {
            Ok(Some((path, combined))) => {
                eprintln!("\nCombined {} document(s) -> {}", combined.files, path.display());
            }
            Ok(None) => eprintln!("\nNo audio to combine"),
            Err(e) => {
                eprintln!("\nCombining documents FAILED - {}", e);
                failures += 1;
            }
        }
    }

    Ok(failures)
}

fn report_summary(summary: &NarrationSummary) {
    eprintln!("Script: {} ({} lines)", summary.script_path.display(), summary.lines);
    eprintln!(
        "Completed: {}, Skipped: {}, Failed: {}",
        summary.completed, summary.skipped, summary.failed
    );
    match &summary.audio_path {
        Some(path) => match std::fs::metadata(path) {
            Ok(metadata) => {
                let size_mb = metadata.len() as f64 / (1024.0 * 1024.0);
                eprintln!("Output: {} ({:.1} MB)", path.display(), size_mb);
            }
            Err(_) => eprintln!("Output: {}", path.display()),
        },
        None => eprintln!("Output: (no audio produced)"),
    }
}

fn handle_config_command(action: &ConfigAction) -> Result<()> {
    match action {
        ConfigAction::Show => {
            let config = NarrationConfig::load()?;
            println!("Configuration file: {:?}", NarrationConfig::config_path()?);
            println!();
            println!("max_length = {}", config.max_length);
            println!("speaker_id = {}", config.speaker_id);
            println!("concurrency = {}", config.concurrency);
            println!("max_retries = {}", config.max_retries);
            println!("engine_url = \"{}\"", config.engine_url);
            println!("timeout_secs = {}", config.timeout_secs);
            println!("tokenizer = \"{}\"", config.tokenizer);
            if let Some(dictionary) = &config.dictionary {
                println!("dictionary = \"{}\"", dictionary.display());
            } else {
                println!("dictionary = (none)");
            }
            println!("skip_blank_lines = {}", config.skip_blank_lines);
            println!("combine_all = {}", config.combine_all);
            println!("input_dir = \"{}\"", config.input_dir.display());
            println!("output_dir = \"{}\"", config.output_dir.display());
            println!("work_dir = \"{}\"", config.work_dir.display());
        }
        ConfigAction::SetMaxLength { value } => {
            let mut config = NarrationConfig::load()?;
            config.max_length = *value;
            config.validate()?;
            config.save()?;
            println!("Default max length set to: {}", config.max_length);
        }
        ConfigAction::SetSpeaker { value } => {
            let mut config = NarrationConfig::load()?;
            config.speaker_id = *value;
            config.save()?;
            println!("Default speaker set to: {}", config.speaker_id);
        }
        ConfigAction::SetConcurrency { value } => {
            let mut config = NarrationConfig::load()?;
            config.concurrency = *value;
            config.validate()?;
            config.save()?;
            println!("Default concurrency set to: {}", config.concurrency);
        }
        ConfigAction::SetEngineUrl { url } => {
            let mut config = NarrationConfig::load()?;
            config.engine_url = url.trim_end_matches('/').to_string();
            config.save()?;
            println!("Default engine URL set to: {}", config.engine_url);
        }
    }
    Ok(())
}
