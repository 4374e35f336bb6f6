use {
    super::Repository,
    crate::auction::entities,
};

impl Repository {
    pub async fn get_or_create_in_memory_ask_lock(
        &self,
        ask_id: entities::AskId,
    ) -> entities::AskLock {
        self.in_memory_store
            .ask_locks
            .lock()
            .await
            .entry(ask_id)
            .or_default()
            .clone()
    }
}
