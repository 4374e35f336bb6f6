use {
    super::Service,
    crate::{
        api::RestError,
        kernel::entities::UserId,
        relationship::entities,
    },
};

pub struct GetRelationshipsInput {
    pub user: UserId,
}

impl Service {
    pub async fn get_relationships(
        &self,
        input: GetRelationshipsInput,
    ) -> Result<Vec<entities::Relationship>, RestError> {
        self.repo.get_relationships(input.user).await
    }
}
