pub mod process_inbox;

use async_trait::async_trait;
use std::time::Duration;

use crate::core::config::AppConfig;

/// A background job that runs forever on a fixed interval.
#[async_trait]
pub trait PeriodicJob {
    fn interval(&self) -> Duration;

    async fn run_job(&self, config: &AppConfig);
}

/// Spawn a job onto the runtime. The first tick fires immediately.
pub fn spawn_periodic_job<J>(config: AppConfig, job: J)
where
    J: PeriodicJob + Send + Sync + 'static,
{
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(job.interval());
        loop {
            interval.tick().await;
            job.run_job(&config).await;
        }
    });
}
