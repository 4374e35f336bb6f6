use {
    super::Repository,
    crate::{
        api::RestError,
        auction::entities::AskId,
        relationship::entities,
    },
};

impl Repository {
    pub async fn get_contact_reveal(
        &self,
        ask_id: AskId,
    ) -> Result<Option<entities::ContactReveal>, RestError> {
        let Some(model) = self.db.get_contact_reveal(ask_id).await? else {
            return Ok(None);
        };
        model
            .get_contact_reveal_entity()
            .map(Some)
            .map_err(|e| {
                tracing::error!(error = e.to_string(), ask_id = ?ask_id, "Failed to convert reveal row");
                RestError::TemporarilyUnavailable
            })
    }
}
