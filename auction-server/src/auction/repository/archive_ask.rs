use {
    super::{
        models,
        Repository,
    },
    crate::{
        api::RestError,
        auction::entities,
    },
    time::OffsetDateTime,
};

impl Repository {
    /// Stamps the archival time and evicts the ask from the working set;
    /// archived asks are cold reads from then on.
    pub async fn archive_ask(
        &self,
        ask_id: entities::AskId,
        archived_at: OffsetDateTime,
    ) -> Result<(), RestError> {
        self.db
            .archive_ask(ask_id, models::primitive(archived_at))
            .await
            .map_err(|e| {
                tracing::error!(error = e.to_string(), ask_id = ?ask_id, "Failed to archive ask");
                RestError::TemporarilyUnavailable
            })?;

        self.in_memory_store.asks.write().await.remove(&ask_id);
        self.in_memory_store.bids.write().await.remove(&ask_id);
        self.remove_in_memory_ask_lock(ask_id).await;
        Ok(())
    }
}
