//! Runs a scan on a dedicated worker thread and hands progress to the caller
//! through a bounded channel.

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;

use crossbeam_channel::{bounded, Receiver, TrySendError};
use tracing::debug;

use crate::engine::{CancelToken, Progress, ScanEngine, ScanState};
use crate::error::{ScanError, ScanResult};
use crate::traits::{Extractor, ImageLoader, NearestNeighborMatcher};
use crate::ImageBuffer;

/// Clears the in-flight flag when the worker exits, including on panic
struct InFlightGuard(Arc<AtomicBool>);

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Owner of the single-scan-at-a-time rule
#[derive(Debug)]
pub struct ScanSession {
    in_flight: Arc<AtomicBool>,
    progress_capacity: usize,
}

impl ScanSession {
    pub fn new(progress_capacity: usize) -> Self {
        Self {
            in_flight: Arc::new(AtomicBool::new(false)),
            progress_capacity: progress_capacity.max(1),
        }
    }

    pub fn is_running(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    /// Start scanning `candidates` against `sample` on a worker thread.
    ///
    /// Fails with [`ScanError::MissingSample`] when no sample is given and with
    /// [`ScanError::AlreadyRunning`] while a previous scan is still in flight.
    pub fn start<L, E, M>(
        &self,
        engine: Arc<ScanEngine<L, E, M>>,
        sample: Option<Arc<ImageBuffer>>,
        candidates: Vec<PathBuf>,
    ) -> ScanResult<ScanHandle>
    where
        L: ImageLoader + Send + Sync + 'static,
        E: Extractor + Send + Sync + 'static,
        M: NearestNeighborMatcher + Send + Sync + 'static,
    {
        let sample = sample.ok_or(ScanError::MissingSample)?;
        if self
            .in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return Err(ScanError::AlreadyRunning);
        }
        let guard = InFlightGuard(Arc::clone(&self.in_flight));

        let (tx, rx) = bounded::<Progress>(self.progress_capacity);
        let overflow = rx.clone();
        let cancel = CancelToken::new();
        let worker_cancel = cancel.clone();

        let worker = thread::Builder::new()
            .name("fpscan-worker".to_string())
            .spawn(move || {
                let _guard = guard;
                let mut dropped = 0u64;
                // Latest wins: when the presenter lags, the oldest queued
                // update is discarded to make room.
                let mut sink = |progress: &Progress| {
                    let mut pending = *progress;
                    loop {
                        match tx.try_send(pending) {
                            Ok(()) | Err(TrySendError::Disconnected(_)) => break,
                            Err(TrySendError::Full(p)) => {
                                let _ = overflow.try_recv();
                                dropped += 1;
                                pending = p;
                            }
                        }
                    }
                };
                let result = engine.scan(&sample, &candidates, &mut sink, &worker_cancel);
                debug!(dropped, "progress updates replaced by newer ones");
                result
            })
            .map_err(ScanError::Spawn)?;

        Ok(ScanHandle {
            progress: rx,
            cancel,
            worker,
        })
    }
}

impl Default for ScanSession {
    fn default() -> Self {
        Self::new(crate::config::ScanConfig::default().progress_capacity)
    }
}

/// Caller side of a running scan
#[derive(Debug)]
pub struct ScanHandle {
    progress: Receiver<Progress>,
    cancel: CancelToken,
    worker: thread::JoinHandle<ScanResult<ScanState>>,
}

impl ScanHandle {
    /// Progress updates in increasing `processed` order; disconnects when the worker exits
    pub fn progress(&self) -> &Receiver<Progress> {
        &self.progress
    }

    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    pub fn is_finished(&self) -> bool {
        self.worker.is_finished()
    }

    /// Wait for the worker and take the terminal state
    pub fn join(self) -> ScanResult<ScanState> {
        self.worker.join().map_err(|_| ScanError::WorkerPanicked)?
    }
}
