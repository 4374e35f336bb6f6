use {
    super::Repository,
    crate::kernel::entities::UserId,
};

impl Repository {
    pub async fn get_highest_pair_sequence(
        &self,
        party_a: UserId,
        party_b: UserId,
    ) -> anyhow::Result<Option<i32>> {
        self.db.get_highest_pair_sequence(party_a, party_b).await
    }
}
