use {
    super::repository::{
        Database,
        Repository,
    },
    crate::{
        api::ws::UpdateEvent,
        kernel::clock::SharedClock,
        relationship,
    },
    std::{
        sync::Arc,
        time::Duration,
    },
    tokio::sync::broadcast,
};

pub mod accept_bid;
pub mod archive_ask;
pub mod expire_asks;
pub mod get_active_bid;
pub mod get_ask;
pub mod get_asks;
pub mod get_bid_statistics;
pub mod get_bids;
pub mod place_bid;
pub mod post_ask;
pub mod verification;
pub mod workers;

pub struct Config {
    /// Bids landing with less than this much time left trigger an extension.
    pub anti_snipe_window:    Duration,
    /// How far the end time is pushed, measured from the previous end time.
    pub anti_snipe_extension: Duration,
    /// Presentation convention, not a ledger invariant: when set, a new bid
    /// must beat the lowest pending one.
    pub enforce_improving_bids: bool,
    pub expiry_sweep_interval: Duration,
}

pub struct ServiceInner {
    config: Config,
    clock:  SharedClock,
    repo:   Arc<Repository>,
    relationship_service: relationship::service::Service,
    event_sender: broadcast::Sender<UpdateEvent>,
}

#[derive(Clone)]
pub struct Service(Arc<ServiceInner>);
impl std::ops::Deref for Service {
    type Target = ServiceInner;
    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl Service {
    pub fn new(
        db: impl Database,
        relationship_service: relationship::service::Service,
        config: Config,
        clock: SharedClock,
        event_sender: broadcast::Sender<UpdateEvent>,
    ) -> Self {
        Self(Arc::new(ServiceInner {
            config,
            clock,
            repo: Arc::new(Repository::new(db)),
            relationship_service,
            event_sender,
        }))
    }

    pub fn now(&self) -> time::OffsetDateTime {
        self.clock.now()
    }

    pub(super) fn send_event(&self, event: UpdateEvent) {
        if let Err(e) = self.event_sender.send(event) {
            tracing::error!(error = e.to_string(), "Failed to send update event");
        }
    }
}

#[cfg(test)]
pub mod tests {
    use {
        super::*,
        crate::{
            auction::repository::MockDatabase,
            kernel::clock::test::ManualClock,
            relationship::repository::models::MockDatabase as MockRelationshipDatabase,
        },
        time::macros::datetime,
    };

    impl Config {
        pub fn for_tests() -> Self {
            Self {
                anti_snipe_window:    Duration::from_secs(60),
                anti_snipe_extension: Duration::from_secs(60),
                enforce_improving_bids: false,
                expiry_sweep_interval: Duration::from_secs(10),
            }
        }
    }

    impl Service {
        pub fn new_with_mocks(
            db: MockDatabase,
            relationship_db: MockRelationshipDatabase,
            config: Config,
            clock: Arc<ManualClock>,
            event_sender: broadcast::Sender<UpdateEvent>,
        ) -> Self {
            let relationship_service =
                relationship::service::Service::new(relationship_db, clock.clone());
            Service::new(db, relationship_service, config, clock, event_sender)
        }
    }

    pub fn test_clock() -> Arc<ManualClock> {
        ManualClock::new(datetime!(2025-06-01 11:59:10 UTC))
    }
}
