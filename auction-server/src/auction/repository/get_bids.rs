use {
    super::Repository,
    crate::{
        api::RestError,
        auction::entities,
    },
};

impl Repository {
    /// The full bid set of an ask, oldest first. Loads the durable rows into
    /// the in-memory working set the first time an ask's ledger is touched.
    pub async fn get_bids(
        &self,
        ask_id: entities::AskId,
    ) -> Result<Vec<entities::Bid>, RestError> {
        if let Some(bids) = self.in_memory_store.bids.read().await.get(&ask_id) {
            return Ok(bids.clone());
        }

        let models = self.db.get_bids(ask_id).await?;
        let mut bids = Vec::with_capacity(models.len());
        for model in models {
            bids.push(model.get_bid_entity().map_err(|e| {
                tracing::error!(error = e.to_string(), ask_id = ?ask_id, "Failed to convert bid row");
                RestError::TemporarilyUnavailable
            })?);
        }

        Ok(self
            .in_memory_store
            .bids
            .write()
            .await
            .entry(ask_id)
            .or_insert(bids)
            .clone())
    }
}
