use {
    super::Repository,
    crate::auction::entities,
};

impl Repository {
    pub async fn remove_in_memory_ask_lock(&self, ask_id: entities::AskId) {
        self.in_memory_store.ask_locks.lock().await.remove(&ask_id);
    }
}
