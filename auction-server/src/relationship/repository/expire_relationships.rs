use {
    super::Repository,
    crate::{
        auction::repository::primitive,
        relationship::entities,
    },
    time::OffsetDateTime,
};

impl Repository {
    pub async fn expire_relationships(
        &self,
        now: OffsetDateTime,
    ) -> anyhow::Result<Vec<entities::RelationshipId>> {
        self.db.expire_relationships(primitive(now)).await
    }
}
