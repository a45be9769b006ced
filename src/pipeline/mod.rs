//! Pipeline module: Seed Jobs and the worker pool that runs them

mod job;
mod pool;

pub use job::JobRunner;
pub use pool::run_seed_jobs;
