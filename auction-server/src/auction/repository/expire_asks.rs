use {
    super::{
        models,
        Repository,
    },
    crate::auction::entities,
    time::OffsetDateTime,
};

impl Repository {
    /// Flips every lapsed active ask to expired in the durable store and
    /// mirrors the flip in memory, taking each ask's lock so the update
    /// cannot interleave with an in-flight placement or acceptance.
    pub async fn expire_asks(
        &self,
        now: OffsetDateTime,
    ) -> anyhow::Result<Vec<entities::AskId>> {
        let expired = self.db.expire_asks(models::primitive(now)).await?;

        for ask_id in &expired {
            let lock = self.get_or_create_in_memory_ask_lock(*ask_id).await;
            let _guard = lock.lock().await;
            if let Some(ask) = self.in_memory_store.asks.write().await.get_mut(ask_id) {
                ask.status = entities::AskStatus::Expired;
            }
            drop(_guard);
            self.remove_in_memory_ask_lock(*ask_id).await;
        }
        Ok(expired)
    }
}
