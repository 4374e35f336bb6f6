use {
    super::Repository,
    crate::{
        api::RestError,
        auction::entities,
    },
};

impl Repository {
    pub async fn get_ask(
        &self,
        ask_id: entities::AskId,
    ) -> Result<Option<entities::Ask>, RestError> {
        if let Some(ask) = self.in_memory_store.asks.read().await.get(&ask_id) {
            return Ok(Some(ask.clone()));
        }

        let Some(model) = self.db.get_ask(ask_id).await? else {
            return Ok(None);
        };
        let ask = model.get_ask_entity().map_err(|e| {
            tracing::error!(error = e.to_string(), ask_id = ?ask_id, "Failed to convert ask row");
            RestError::TemporarilyUnavailable
        })?;

        // Writers mutate the cached entry in place under the ask lock, so a
        // stale row read here must never replace an existing entry.
        Ok(Some(
            self.in_memory_store
                .asks
                .write()
                .await
                .entry(ask_id)
                .or_insert(ask)
                .clone(),
        ))
    }
}
