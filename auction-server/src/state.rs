use {
    crate::{
        api::ws,
        auction,
        kernel::db::DB,
        relationship,
    },
    tokio_util::task::TaskTracker,
};

pub struct Store {
    pub db: DB,
    pub ws: ws::WsState,
}

pub struct StoreNew {
    pub store: std::sync::Arc<Store>,
    pub auction_service: auction::service::Service,
    pub relationship_service: relationship::service::Service,
    pub task_tracker: TaskTracker,
}

impl StoreNew {
    pub fn new(
        store: std::sync::Arc<Store>,
        auction_service: auction::service::Service,
        relationship_service: relationship::service::Service,
        task_tracker: TaskTracker,
    ) -> Self {
        Self {
            store,
            auction_service,
            relationship_service,
            task_tracker,
        }
    }
}
