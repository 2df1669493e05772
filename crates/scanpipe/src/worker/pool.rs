use std::sync::Arc;
use std::thread::{self, JoinHandle};

use crossbeam_channel::{bounded, unbounded, Receiver, Sender};
use log::{debug, error, info};

use crate::error::WorkerError;
use crate::pipeline::{LogProgress, Pipeline, PipelineConfig, PipelineContext};
use crate::worker::job::{Job, JobQueue, JobResult};

/// Fixed set of OS threads, each running the pipeline for one volume at a time.
///
/// Jobs go through a bounded channel, so `submit` blocks while every worker
/// is busy and the queue is full. Results are never dropped.
pub struct WorkerPool {
    job_sender: Sender<Job>,
    result_receiver: Receiver<JobResult>,
    workers: Vec<JoinHandle<()>>,
}

impl WorkerPool {
    /// Starts `worker_count` workers (at least one).
    pub fn new(config: Arc<PipelineConfig>, worker_count: usize) -> Self {
        let worker_count = worker_count.max(1);
        let (job_sender, job_receiver) = bounded::<Job>(worker_count * 2);
        let (result_sender, result_receiver) = unbounded::<JobResult>();

        let workers = (0..worker_count)
            .map(|worker_id| {
                let job_rx = job_receiver.clone();
                let result_tx = result_sender.clone();
                let worker_config = Arc::clone(&config);
                thread::spawn(move || run_worker(worker_id, job_rx, result_tx, worker_config))
            })
            .collect();

        info!("Started {} workers", worker_count);

        Self {
            job_sender,
            result_receiver,
            workers,
        }
    }

    pub fn submit(&self, job: Job) -> Result<(), WorkerError> {
        self.job_sender
            .send(job)
            .map_err(|_| WorkerError::ChannelClosed)
    }

    /// Closes the queue, waits for every queued job to finish and returns
    /// all results.
    pub fn finish(self) -> Vec<JobResult> {
        drop(self.job_sender);

        for (i, worker) in self.workers.into_iter().enumerate() {
            if let Err(e) = worker.join() {
                error!("Worker {} panicked: {:?}", i, e);
            } else {
                debug!("Worker {} finished", i);
            }
        }

        info!("All workers have stopped");
        self.result_receiver.try_iter().collect()
    }
}

impl JobQueue for WorkerPool {
    fn submit(&self, job: Job) -> Result<(), WorkerError> {
        WorkerPool::submit(self, job)
    }
}

/// Runs jobs until the queue is closed and drained.
fn run_worker(
    worker_id: usize,
    job_receiver: Receiver<Job>,
    result_sender: Sender<JobResult>,
    config: Arc<PipelineConfig>,
) {
    debug!("Worker {} started", worker_id);

    let pipeline = Pipeline::from_config(config);

    for job in job_receiver.iter() {
        debug!("Worker {} processing volume {}", worker_id, job.label);

        let progress = LogProgress::new(&job.label);
        let (result, _ctx) = pipeline.run(PipelineContext::new(job), &progress);

        if let Err(e) = result_sender.send(result) {
            error!("Worker {} failed to send result: {}", worker_id, e);
            break;
        }
    }

    debug!("Worker {} stopped", worker_id);
}
