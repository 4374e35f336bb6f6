use {
    super::Repository,
    crate::{
        api::RestError,
        kernel::entities::UserId,
        models,
    },
};

impl Repository {
    pub async fn get_profile(&self, user_id: UserId) -> Result<Option<models::Profile>, RestError> {
        let Some(row) = self.db.get_profile(user_id).await? else {
            return Ok(None);
        };
        row.get_profile_entity()
            .map(Some)
            .map_err(|e| {
                tracing::error!(error = e.to_string(), user_id = ?user_id, "Failed to convert profile row");
                RestError::TemporarilyUnavailable
            })
    }
}
