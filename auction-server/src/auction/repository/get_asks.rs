use {
    super::Repository,
    crate::{
        api::RestError,
        auction::entities,
    },
};

impl Repository {
    /// Lists non-archived asks straight from the durable store; the listing
    /// is not part of the hot per-ask path and is never cached.
    pub async fn get_asks(&self) -> Result<Vec<entities::Ask>, RestError> {
        let models = self.db.get_asks().await?;
        let mut asks = Vec::with_capacity(models.len());
        for model in models {
            match model.get_ask_entity() {
                Ok(ask) => asks.push(ask),
                Err(e) => {
                    tracing::error!(error = e.to_string(), "Skipping unconvertible ask row")
                }
            }
        }
        Ok(asks)
    }
}
