pub mod jobs;
pub mod scheduler;
pub mod worker;

pub use jobs::{get_scheduled_jobs, update_job_next_run, JobType, ScheduledJob};
pub use scheduler::{is_job_due, next_run_timestamp};
pub use worker::{CheckOutcome, CheckReport, CheckWorker, QueueSummary};
