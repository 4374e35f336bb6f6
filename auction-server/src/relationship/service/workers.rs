use {
    super::Service,
    crate::server::{
        EXIT_CHECK_INTERVAL,
        SHOULD_EXIT,
    },
    anyhow::Result,
    std::{
        sync::atomic::Ordering,
        time::Duration,
    },
};

impl Service {
    pub async fn run_expiry_loop(&self, sweep_interval: Duration) -> Result<()> {
        tracing::info!("Starting relationship expiry sweeper...");
        let mut exit_check_interval = tokio::time::interval(EXIT_CHECK_INTERVAL);
        let mut sweep = tokio::time::interval(sweep_interval);

        while !SHOULD_EXIT.load(Ordering::Acquire) {
            tokio::select! {
                _ = sweep.tick() => {
                    if let Err(e) = self.expire_relationships().await {
                        tracing::error!(error = e.to_string(), "Relationship expiry sweep failed");
                    }
                }
                _ = exit_check_interval.tick() => {}
            }
        }
        tracing::info!("Shutting down relationship expiry sweeper...");
        Ok(())
    }
}
