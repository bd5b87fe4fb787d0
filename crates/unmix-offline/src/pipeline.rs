//! Decode -> separate -> package pipeline

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use parking_lot::RwLock;
use rayon::prelude::*;

use unmix_core::amplitude_to_db;
use unmix_separation::{MonotonicProgress, ProgressSink, ScaledProgress, SeparationEngine};

use crate::decoder::AudioDecoder;
use crate::encoder::write_output;
use crate::error::OfflineResult;
use crate::job::{JobId, JobResult, JobStatus, SeparationJob};

/// Progress at the end of decoding
const DECODE_END: f64 = 0.2;
/// Progress at the end of the engine call
const SEPARATE_END: f64 = 0.9;

// ═══════════════════════════════════════════════════════════════════════════════
// SINGLE JOB
// ═══════════════════════════════════════════════════════════════════════════════

/// Run one job to completion.
///
/// Progress: decoding covers `0.0..0.2`, the engine `0.2..0.9` and
/// encoding plus writing `0.9..1.0`. Nothing is written unless every
/// stage succeeds.
pub fn run_job(
    engine: &SeparationEngine,
    job: &SeparationJob,
    progress: &mut dyn ProgressSink,
) -> OfflineResult<JobResult> {
    let start = Instant::now();
    let mut progress = MonotonicProgress::new(progress);
    progress.report(0.0);

    job.validate()?;

    log::info!(
        "Job {} '{}': {} -> {}",
        job.id,
        job.name,
        job.input_path.display(),
        job.output_path.display()
    );

    let input = AudioDecoder::decode(&job.input_path)?;
    progress.report(DECODE_END);

    let (output, sample_rate) = {
        let mut stage = ScaledProgress::new(&mut progress, DECODE_END, SEPARATE_END);
        engine.process(&input, &job.method, job.quality, &mut stage)?
    };
    progress.report(SEPARATE_END);

    let output_size = write_output(&job.output_path, &output, &job.format)?;
    progress.report(1.0);

    let duration = start.elapsed();
    log::info!(
        "Job {} done in {} ms ({} bytes)",
        job.id,
        duration.as_millis(),
        output_size
    );

    Ok(JobResult::success(
        job.id,
        job.output_path.clone(),
        output_size,
        duration,
        sample_rate,
        output.frames(),
        amplitude_to_db(output.peak()),
    ))
}

// ═══════════════════════════════════════════════════════════════════════════════
// BATCH
// ═══════════════════════════════════════════════════════════════════════════════

/// Live state of a batch job
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct JobProgress {
    pub status: JobStatus,
    pub fraction: f64,
}

/// Runs independent jobs in parallel, one rayon worker per job
pub struct BatchSeparator {
    engine: Arc<SeparationEngine>,
    max_parallel: usize,
    progress: Arc<RwLock<HashMap<JobId, JobProgress>>>,
}

impl BatchSeparator {
    pub fn new(engine: Arc<SeparationEngine>) -> Self {
        Self {
            engine,
            max_parallel: num_cpus::get(),
            progress: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Set max parallel jobs
    pub fn with_max_parallel(mut self, max: usize) -> Self {
        self.max_parallel = max.max(1);
        self
    }

    pub fn max_parallel(&self) -> usize {
        self.max_parallel
    }

    /// Current state of a submitted job
    pub fn progress(&self, id: JobId) -> Option<JobProgress> {
        self.progress.read().get(&id).copied()
    }

    /// Process all jobs; results come back in submission order.
    ///
    /// A failing job produces a `Failed` result and never stops the others.
    pub fn process_all(&self, jobs: &[SeparationJob]) -> Vec<JobResult> {
        {
            let mut table = self.progress.write();
            for job in jobs {
                table.insert(
                    job.id,
                    JobProgress {
                        status: JobStatus::Pending,
                        fraction: 0.0,
                    },
                );
            }
        }

        match rayon::ThreadPoolBuilder::new()
            .num_threads(self.max_parallel)
            .build()
        {
            Ok(pool) => pool.install(|| jobs.par_iter().map(|job| self.run_one(job)).collect::<Vec<_>>()),
            Err(e) => {
                log::warn!("Falling back to the global rayon pool: {}", e);
                jobs.par_iter().map(|job| self.run_one(job)).collect::<Vec<_>>()
            }
        }
    }

    fn run_one(&self, job: &SeparationJob) -> JobResult {
        let start = Instant::now();
        self.set_status(job.id, JobStatus::Processing);

        let table = &self.progress;
        let mut sink = |fraction: f64| {
            if let Some(entry) = table.write().get_mut(&job.id) {
                entry.fraction = fraction;
            }
        };

        let result = match run_job(&self.engine, job, &mut sink) {
            Ok(result) => result,
            Err(e) => {
                log::error!("Job {} failed: {}", job.id, e);
                JobResult::failure(job.id, e.to_string(), start.elapsed())
            }
        };
        self.set_status(job.id, result.status);
        result
    }

    fn set_status(&self, id: JobId, status: JobStatus) {
        if let Some(entry) = self.progress.write().get_mut(&id) {
            entry.status = status;
        }
    }
}
