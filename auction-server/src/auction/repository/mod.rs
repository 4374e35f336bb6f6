use {
    super::entities,
    std::collections::HashMap,
    tokio::sync::{
        Mutex,
        RwLock,
    },
};

mod add_ask;
mod add_bid;
mod archive_ask;
mod commit_acceptance;
mod expire_asks;
mod get_active_bid;
mod get_ask;
mod get_asks;
mod get_bid_statistics;
mod get_bids;
mod get_or_create_in_memory_ask_lock;
mod get_profile;
mod models;
mod remove_in_memory_ask_lock;

pub use models::*;

/// Hot working set mirroring the durable rows. Invariant: when the bids map
/// has an entry for an ask, that entry is the ask's full bid set.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    pub asks:      RwLock<HashMap<entities::AskId, entities::Ask>>,
    pub bids:      RwLock<HashMap<entities::AskId, Vec<entities::Bid>>>,
    pub ask_locks: Mutex<HashMap<entities::AskId, entities::AskLock>>,
}

#[derive(Debug)]
pub struct Repository {
    pub in_memory_store: InMemoryStore,
    db: Box<dyn Database>,
}

impl Repository {
    pub fn new(db: impl Database) -> Self {
        Self {
            in_memory_store: InMemoryStore::default(),
            db: Box::new(db),
        }
    }
}
