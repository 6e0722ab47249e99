//! Batch scan engine: scores every candidate against one sample and keeps the
//! best result, reporting progress after each candidate.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::{debug, info, warn};

use crate::error::ScanResult;
use crate::scorer::{score, RATIO_THRESHOLD};
use crate::traits::{Extractor, ImageLoader, NearestNeighborMatcher};
use crate::types::{DescriptorSet, MatchResult};
use crate::ImageBuffer;

/// Status emitted after each candidate
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Progress {
    pub processed: usize,
    pub total: usize,
    /// Linear extrapolation of the remaining time; `None` before the first candidate
    pub eta_seconds: Option<f64>,
}

/// Receives progress on the scanning thread, once per candidate and in order.
pub trait ProgressSink {
    fn on_progress(&mut self, progress: &Progress);
}

impl<F: FnMut(&Progress)> ProgressSink for F {
    fn on_progress(&mut self, progress: &Progress) {
        self(progress)
    }
}

/// Sink that discards every update
#[derive(Debug, Clone, Copy, Default)]
pub struct NoProgress;

impl ProgressSink for NoProgress {
    fn on_progress(&mut self, _progress: &Progress) {}
}

/// Cooperative cancellation flag, checked between candidates
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanOutcome {
    Running,
    Completed,
    Cancelled,
}

/// Accumulated state of one scan. Only the engine mutates it.
#[derive(Debug, Clone)]
pub struct ScanState {
    best: Option<MatchResult>,
    processed: usize,
    total: usize,
    skipped: usize,
    started: Instant,
    outcome: ScanOutcome,
}

impl ScanState {
    fn new(total: usize) -> Self {
        Self {
            best: None,
            processed: 0,
            total,
            skipped: 0,
            started: Instant::now(),
            outcome: ScanOutcome::Running,
        }
    }

    pub fn best(&self) -> Option<&MatchResult> {
        self.best.as_ref()
    }

    pub fn into_best(self) -> Option<MatchResult> {
        self.best
    }

    pub fn processed(&self) -> usize {
        self.processed
    }

    pub fn total(&self) -> usize {
        self.total
    }

    pub fn skipped(&self) -> usize {
        self.skipped
    }

    pub fn started(&self) -> Instant {
        self.started
    }

    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    pub fn outcome(&self) -> ScanOutcome {
        self.outcome
    }

    pub fn is_terminal(&self) -> bool {
        self.outcome != ScanOutcome::Running
    }

    fn best_score(&self) -> f64 {
        self.best.as_ref().map_or(0.0, MatchResult::score)
    }

    fn progress(&self) -> Progress {
        Progress {
            processed: self.processed,
            total: self.total,
            eta_seconds: eta_seconds(self.elapsed(), self.processed, self.total),
        }
    }
}

/// `elapsed / processed * (total - processed)`, or `None` while nothing is processed
pub fn eta_seconds(elapsed: Duration, processed: usize, total: usize) -> Option<f64> {
    if processed == 0 {
        return None;
    }
    let remaining = total.saturating_sub(processed);
    Some(elapsed.as_secs_f64() / processed as f64 * remaining as f64)
}

/// What happened to one candidate
enum Step {
    Scored {
        image: ImageBuffer,
        descriptors: DescriptorSet,
        scored: crate::scorer::Scored,
    },
    Skipped(String),
}

/// Drives loading, extraction and scoring of a candidate list.
#[derive(Debug, Clone)]
pub struct ScanEngine<L, E, M> {
    loader: L,
    extractor: E,
    matcher: M,
}

impl<L, E, M> ScanEngine<L, E, M>
where
    L: ImageLoader,
    E: Extractor,
    M: NearestNeighborMatcher,
{
    pub fn new(loader: L, extractor: E, matcher: M) -> Self {
        Self {
            loader,
            extractor,
            matcher,
        }
    }

    pub fn extractor(&self) -> &E {
        &self.extractor
    }

    /// Score every candidate against `sample`, in order.
    ///
    /// Candidates that fail to load or yield no descriptors are counted as
    /// skipped. A sample that cannot be extracted is treated as having no
    /// descriptors, so every candidate is skipped and the scan still completes.
    /// A set `cancel` token stops the scan before the next candidate and the
    /// partial state is returned with [`ScanOutcome::Cancelled`].
    pub fn scan<P>(
        &self,
        sample: &ImageBuffer,
        candidates: &[PathBuf],
        progress: &mut P,
        cancel: &CancelToken,
    ) -> ScanResult<ScanState>
    where
        P: ProgressSink + ?Sized,
    {
        let mut state = ScanState::new(candidates.len());
        let sample_set = match self.extractor.extract(sample) {
            Ok(set) => Arc::new(set),
            Err(e) => {
                warn!("sample extraction failed, no candidate can match: {}", e);
                Arc::new(DescriptorSet::empty())
            }
        };
        info!(
            candidates = candidates.len(),
            sample_keypoints = sample_set.len(),
            "scan started"
        );

        if candidates.is_empty() {
            state.outcome = ScanOutcome::Completed;
            progress.on_progress(&state.progress());
            info!("no candidates to scan");
            return Ok(state);
        }

        for path in candidates {
            if cancel.is_cancelled() {
                state.outcome = ScanOutcome::Cancelled;
                info!(processed = state.processed, total = state.total, "scan cancelled");
                break;
            }

            match self.process(&sample_set, path) {
                Step::Scored {
                    image,
                    descriptors,
                    scored,
                } => {
                    debug!(
                        file = %path.display(),
                        score = scored.score,
                        accepted = scored.accepted.len(),
                        "candidate scored"
                    );
                    if scored.score > state.best_score() {
                        let candidate_id = candidate_id(path);
                        info!(candidate = %candidate_id, score = scored.score, "new best match");
                        state.best = Some(MatchResult {
                            candidate_id,
                            path: path.clone(),
                            candidate_image: image,
                            sample: Arc::clone(&sample_set),
                            candidate: descriptors,
                            accepted: scored.accepted,
                        });
                    }
                }
                Step::Skipped(reason) => {
                    warn!(file = %path.display(), "skipping candidate: {}", reason);
                    state.skipped += 1;
                }
            }

            state.processed += 1;
            progress.on_progress(&state.progress());
        }

        if state.outcome == ScanOutcome::Running {
            state.outcome = ScanOutcome::Completed;
        }
        info!(
            processed = state.processed,
            skipped = state.skipped,
            best = state.best.as_ref().map(|b| b.candidate_id.as_str()).unwrap_or("-"),
            "scan finished"
        );
        Ok(state)
    }

    fn process(&self, sample: &DescriptorSet, path: &Path) -> Step {
        let image = match self.loader.load(path) {
            Ok(image) => image,
            Err(e) => return Step::Skipped(e.to_string()),
        };
        let descriptors = match self.extractor.extract(&image) {
            Ok(descriptors) => descriptors,
            Err(e) => return Step::Skipped(e.to_string()),
        };
        if sample.is_empty() || descriptors.is_empty() {
            return Step::Skipped("no descriptors found".to_string());
        }

        let scored = score(sample, &descriptors, RATIO_THRESHOLD, &self.matcher);
        Step::Scored {
            image,
            descriptors,
            scored,
        }
    }
}

/// File name used to identify a candidate in reports
pub fn candidate_id(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
