use {
    super::{
        models,
        Repository,
    },
    crate::{
        api::RestError,
        auction::entities,
    },
};

impl Repository {
    pub async fn add_ask(&self, ask: entities::Ask) -> Result<entities::Ask, RestError> {
        self.db.add_ask(&models::Ask::new(&ask)).await.map_err(|e| {
            tracing::error!(error = e.to_string(), ask_id = ?ask.id, "Failed to persist ask");
            RestError::TemporarilyUnavailable
        })?;

        self.in_memory_store
            .asks
            .write()
            .await
            .insert(ask.id, ask.clone());
        Ok(ask)
    }
}
