use {
    super::Service,
    crate::server::{
        EXIT_CHECK_INTERVAL,
        SHOULD_EXIT,
    },
    anyhow::Result,
    std::sync::atomic::Ordering,
};

impl Service {
    /// The periodic half of the expiry contract; the lazy half lives inside
    /// `place_bid`, which rejects bids on lapsed asks the sweep has not
    /// reached yet.
    pub async fn run_expiry_loop(&self) -> Result<()> {
        tracing::info!("Starting ask expiry sweeper...");
        let mut exit_check_interval = tokio::time::interval(EXIT_CHECK_INTERVAL);
        let mut sweep = tokio::time::interval(self.config.expiry_sweep_interval);

        while !SHOULD_EXIT.load(Ordering::Acquire) {
            tokio::select! {
                _ = sweep.tick() => {
                    if let Err(e) = self.expire_asks().await {
                        tracing::error!(error = e.to_string(), "Ask expiry sweep failed");
                    }
                }
                _ = exit_check_interval.tick() => {}
            }
        }
        tracing::info!("Shutting down ask expiry sweeper...");
        Ok(())
    }
}
