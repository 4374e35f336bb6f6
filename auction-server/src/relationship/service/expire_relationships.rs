use super::Service;

impl Service {
    /// One sweep: flips every relationship whose derived expiry has lapsed.
    #[tracing::instrument(skip_all, fields(expired))]
    pub async fn expire_relationships(&self) -> anyhow::Result<()> {
        let expired = self.repo.expire_relationships(self.clock.now()).await?;
        if !expired.is_empty() {
            tracing::Span::current().record("expired", expired.len());
            tracing::info!(count = expired.len(), "Expired lapsed relationships");
        }
        Ok(())
    }
}
