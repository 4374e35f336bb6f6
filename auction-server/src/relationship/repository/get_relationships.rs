use {
    super::Repository,
    crate::{
        api::RestError,
        kernel::entities::UserId,
        relationship::entities,
    },
};

impl Repository {
    pub async fn get_relationships(
        &self,
        user: UserId,
    ) -> Result<Vec<entities::Relationship>, RestError> {
        Ok(self
            .db
            .get_relationships(user)
            .await?
            .iter()
            .map(|model| model.get_relationship_entity())
            .collect())
    }
}
