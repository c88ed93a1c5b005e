//! Bounded-concurrency synthesis of script lines and per-document narration.
//!
//! One task is spawned per script line; a semaphore caps how many talk to
//! the engine at once. Tasks finish in any order, so outcomes are sorted by
//! line index and per-line files are named by index.

use crate::audio::{WavSummary, concat_wav_files};
use crate::error::{NarrationError, Result};
use crate::files::{document_stem, prepare_dir, write_script};
use crate::text::{ScriptLine, Segmenter, number_lines};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use voicevox_client::Synthesizer;

/// Settings for one synthesis run.
#[derive(Debug, Clone)]
pub struct SynthesisOptions {
    /// VOICEVOX speaker id
    pub speaker_id: u32,
    /// Maximum requests in flight
    pub concurrency: usize,
    /// Attempts per line, including the first
    pub max_retries: u32,
    /// Delay before the first retry; doubles on each further retry
    pub retry_delay: Duration,
    /// Leave blank lines out instead of synthesizing them
    pub skip_blank_lines: bool,
}

impl Default for SynthesisOptions {
    fn default() -> Self {
        Self {
            speaker_id: 1,
            concurrency: 3,
            max_retries: 3,
            retry_delay: Duration::from_millis(500),
            skip_blank_lines: false,
        }
    }
}

/// What happened to one script line.
#[derive(Debug)]
pub enum LineStatus {
    /// Audio written to `path`
    Completed { path: PathBuf },
    /// Blank line left out by configuration
    Skipped,
    /// All attempts failed
    Failed { error: NarrationError },
}

#[derive(Debug)]
pub struct LineOutcome {
    pub index: usize,
    pub text: String,
    pub attempts: u32,
    pub status: LineStatus,
}

impl LineOutcome {
    pub fn audio_path(&self) -> Option<&Path> {
        match &self.status {
            LineStatus::Completed { path } => Some(path),
            _ => None,
        }
    }
}

/// Progress reported after each finished line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SynthesisProgress {
    pub total: usize,
    pub completed: usize,
    pub failed: usize,
}

/// File name of the audio for the line at `index`.
pub fn line_audio_name(index: usize) -> String {
    format!("{:05}.wav", index)
}

/// Synthesize every line into `work_dir`, at most `options.concurrency` at a time.
///
/// Per-line failures do not abort the run; they come back as
/// [`LineStatus::Failed`]. Outcomes are in line index order.
pub async fn synthesize_lines<F>(
    synthesizer: Arc<dyn Synthesizer>,
    lines: &[ScriptLine],
    work_dir: &Path,
    options: &SynthesisOptions,
    mut on_progress: F,
) -> Result<Vec<LineOutcome>>
where
    F: FnMut(SynthesisProgress),
{
    let semaphore = Arc::new(Semaphore::new(options.concurrency.max(1)));
    let mut tasks = JoinSet::new();
    let mut outcomes = Vec::with_capacity(lines.len());

    for line in lines {
        if options.skip_blank_lines && line.is_blank() {
            outcomes.push(LineOutcome {
                index: line.index,
                text: line.text.clone(),
                attempts: 0,
                status: LineStatus::Skipped,
            });
            continue;
        }

        let semaphore = Arc::clone(&semaphore);
        let synthesizer = Arc::clone(&synthesizer);
        let line = line.clone();
        let path = work_dir.join(line_audio_name(line.index));
        let options = options.clone();

        tasks.spawn(async move {
            let permit = semaphore.acquire_owned().await;
            if permit.is_err() {
                return LineOutcome {
                    index: line.index,
                    text: line.text,
                    attempts: 0,
                    status: LineStatus::Failed {
                        error: NarrationError::Task("synthesis queue closed".to_string()),
                    },
                };
            }
            synthesize_line(synthesizer.as_ref(), line, path, &options).await
        });
    }

    let mut progress = SynthesisProgress {
        total: tasks.len(),
        completed: 0,
        failed: 0,
    };

    while let Some(joined) = tasks.join_next().await {
        let outcome = joined.map_err(|e| NarrationError::Task(e.to_string()))?;
        match outcome.status {
            LineStatus::Failed { ref error } => {
                log::warn!(
                    "Line {} failed after {} attempts: {}",
                    outcome.index,
                    outcome.attempts,
                    error
                );
                progress.failed += 1;
            }
            _ => progress.completed += 1,
        }
        on_progress(progress);
        outcomes.push(outcome);
    }

    outcomes.sort_by_key(|o| o.index);
    Ok(outcomes)
}

async fn synthesize_line(
    synthesizer: &dyn Synthesizer,
    line: ScriptLine,
    path: PathBuf,
    options: &SynthesisOptions,
) -> LineOutcome {
    let max_attempts = options.max_retries.max(1);
    let mut delay = options.retry_delay;
    let mut attempt = 0;

    let status = loop {
        attempt += 1;
        log::debug!("Synthesizing line {} (attempt {}): {:?}", line.index, attempt, line.text);

        match synthesizer.synthesize(&line.text, options.speaker_id).await {
            Ok(audio) => match tokio::fs::write(&path, audio).await {
                Ok(()) => break LineStatus::Completed { path },
                Err(e) => {
                    break LineStatus::Failed {
                        error: NarrationError::io("write", &path, e),
                    };
                }
            },
            Err(e) if attempt < max_attempts && e.is_transient() => {
                log::info!(
                    "Line {} attempt {} failed, retrying in {:?}: {}",
                    line.index,
                    attempt,
                    delay,
                    e
                );
                tokio::time::sleep(delay).await;
                delay = delay.saturating_mul(2);
            }
            Err(e) => break LineStatus::Failed { error: e.into() },
        }
    };

    LineOutcome {
        index: line.index,
        text: line.text,
        attempts: attempt,
        status,
    }
}

/// Where a document's outputs go.
#[derive(Debug, Clone)]
pub struct NarrationPaths {
    /// Scripts and combined audio
    pub output_dir: PathBuf,
    /// Parent of the per-document line audio directories
    pub work_dir: PathBuf,
    /// Remove the per-document line audio after a successful run
    pub clean_work: bool,
}

/// Result of narrating one document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NarrationSummary {
    pub document: PathBuf,
    pub script_path: PathBuf,
    /// Combined audio, absent when nothing was synthesized
    pub audio_path: Option<PathBuf>,
    pub lines: usize,
    pub completed: usize,
    pub skipped: usize,
    pub failed: usize,
}

/// Write the script for `document` without synthesizing it.
pub fn write_document_script(
    segmenter: &Segmenter,
    document: &Path,
    output_dir: &Path,
) -> Result<(Vec<String>, PathBuf)> {
    let lines = segmenter.segment_file(document)?;
    let script_path = output_dir.join(format!("{}_script.txt", document_stem(document)));
    write_script(&lines, &script_path)?;
    log::info!("Wrote {} script lines to {}", lines.len(), script_path.display());
    Ok((lines, script_path))
}

/// Segment, synthesize and concatenate one document.
///
/// Outputs: `{output_dir}/{stem}_script.txt` and
/// `{output_dir}/output_{stem}.wav`. Line audio lives in `{work_dir}/{stem}/`.
pub async fn narrate_document<F>(
    segmenter: &Segmenter,
    synthesizer: Arc<dyn Synthesizer>,
    document: &Path,
    paths: &NarrationPaths,
    options: &SynthesisOptions,
    on_progress: F,
) -> Result<NarrationSummary>
where
    F: FnMut(SynthesisProgress),
{
    let stem = document_stem(document);
    let (lines, script_path) = write_document_script(segmenter, document, &paths.output_dir)?;

    let line_dir = paths.work_dir.join(&stem);
    prepare_dir(&line_dir)?;

    let script_lines = number_lines(lines);
    let outcomes =
        synthesize_lines(synthesizer, &script_lines, &line_dir, options, on_progress).await?;

    let audio_files: Vec<&Path> = outcomes.iter().filter_map(|o| o.audio_path()).collect();
    let skipped = outcomes
        .iter()
        .filter(|o| matches!(o.status, LineStatus::Skipped))
        .count();
    let failed = outcomes
        .iter()
        .filter(|o| matches!(o.status, LineStatus::Failed { .. }))
        .count();

    let audio_path = if audio_files.is_empty() {
        log::warn!("No audio was produced for {}", document.display());
        None
    } else {
        let output = paths.output_dir.join(format!("output_{}.wav", stem));
        concat_wav_files(&audio_files, &output)?;
        Some(output)
    };

    if paths.clean_work && failed == 0 {
        if let Err(e) = std::fs::remove_dir_all(&line_dir) {
            log::warn!("Failed to remove {}: {}", line_dir.display(), e);
        }
    }

    Ok(NarrationSummary {
        document: document.to_path_buf(),
        script_path,
        audio_path,
        lines: script_lines.len(),
        completed: audio_files.len(),
        skipped,
        failed,
    })
}

/// File name of the batch-wide combined audio.
pub const COMBINED_AUDIO_NAME: &str = "output_all.wav";

/// Join the combined audio of several documents, in the given order, into
/// `{output_dir}/output_all.wav`.
///
/// Documents without audio are left out. Returns `None` when there is
/// nothing to join.
pub fn combine_documents(
    summaries: &[NarrationSummary],
    output_dir: &Path,
) -> Result<Option<(PathBuf, WavSummary)>> {
    let output = output_dir.join(COMBINED_AUDIO_NAME);

    let inputs: Vec<&Path> = summaries
        .iter()
        .filter_map(|s| s.audio_path.as_deref())
        .filter(|path| {
            // A document named "all" would otherwise be truncated while read
            let is_output = *path == output.as_path();
            if is_output {
                log::warn!("Leaving {} out of the combined audio", path.display());
            }
            !is_output
        })
        .collect();

    if inputs.is_empty() {
        return Ok(None);
    }

    let summary = concat_wav_files(&inputs, &output)?;
    log::info!(
        "Combined {} documents into {}",
        summary.files,
        output.display()
    );
    Ok(Some((output, summary)))
}
