use {
    super::Service,
    crate::{
        api::ws::UpdateEvent,
        auction::{
            api::to_api_ask,
            entities,
        },
    },
};

impl Service {
    /// One sweep of the passive expiry path: asks whose window lapsed with
    /// no accepted bid flip to expired. Acceptance racing the sweep is
    /// resolved by the storage guards; whichever commits first wins.
    #[tracing::instrument(skip_all, fields(expired))]
    pub async fn expire_asks(&self) -> anyhow::Result<Vec<entities::AskId>> {
        let now = self.clock.now();
        let expired = self.repo.expire_asks(now).await?;
        if expired.is_empty() {
            return Ok(expired);
        }

        tracing::Span::current().record("expired", expired.len());
        tracing::info!(count = expired.len(), "Expired lapsed asks");
        for ask_id in &expired {
            match self.repo.get_ask(*ask_id).await {
                Ok(Some(ask)) => {
                    self.send_event(UpdateEvent::AskStatusUpdate(to_api_ask(&ask, now)))
                }
                Ok(None) => {}
                Err(e) => {
                    tracing::error!(error = ?e, ask_id = ?ask_id, "Failed to load expired ask")
                }
            }
        }
        Ok(expired)
    }
}

#[cfg(test)]
mod tests {
    use {
        super::*,
        crate::auction::service::tests::test_clock,
        crate::{
            auction::{
                repository::{
                    models,
                    MockDatabase,
                },
                service::{
                    accept_bid::AcceptBidInput,
                    Config,
                },
            },
            api::RestError,
            relationship::repository::models::MockDatabase as MockRelationshipDatabase,
        },
        time::macros::{
            date,
            datetime,
        },
        tokio::sync::broadcast,
        uuid::Uuid,
    };

    #[tokio::test]
    async fn sweep_broadcasts_every_flip() {
        let mut row = models::Ask::new(&entities::Ask {
            id: Uuid::new_v4(),
            owner: Uuid::new_v4(),
            compensation: entities::Compensation {
                kind:   entities::CompensationKind::Flat,
                amount: 100,
            },
            schedule: entities::Schedule::SingleDate(date!(2025 - 06 - 01)),
            requirements: String::new(),
            auction_ends_at: Some(datetime!(2025-06-01 11:00:00 UTC)),
            status: entities::AskStatus::Active,
            archived_at: None,
            created_at: datetime!(2025-05-01 00:00:00 UTC),
        });
        row.status = models::AskStatus::Expired;
        let ask_id = row.id;

        let mut db = MockDatabase::new();
        db.expect_expire_asks()
            .times(1)
            .returning(move |_| Ok(vec![ask_id]));
        db.expect_get_ask().returning(move |_| Ok(Some(row.clone())));

        let (event_sender, mut event_receiver) = broadcast::channel(16);
        let service = Service::new_with_mocks(
            db,
            MockRelationshipDatabase::new(),
            Config::for_tests(),
            test_clock(),
            event_sender,
        );

        let expired = service.expire_asks().await.unwrap();
        assert_eq!(expired, vec![ask_id]);
        match event_receiver.try_recv().unwrap() {
            UpdateEvent::AskStatusUpdate(ask) => {
                assert_eq!(ask.id, ask_id);
                assert_eq!(ask.status, ask_auction_api_types::ask::AskStatus::Expired);
            }
            other => panic!("expected AskStatusUpdate, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn acceptance_after_the_sweep_is_already_resolved() {
        let owner = Uuid::new_v4();
        let mut row = models::Ask::new(&entities::Ask {
            id: Uuid::new_v4(),
            owner,
            compensation: entities::Compensation {
                kind:   entities::CompensationKind::Flat,
                amount: 100,
            },
            schedule: entities::Schedule::SingleDate(date!(2025 - 06 - 01)),
            requirements: String::new(),
            auction_ends_at: Some(datetime!(2025-06-01 11:00:00 UTC)),
            status: entities::AskStatus::Active,
            archived_at: None,
            created_at: datetime!(2025-05-01 00:00:00 UTC),
        });
        row.status = models::AskStatus::Expired;
        let ask_id = row.id;

        let mut db = MockDatabase::new();
        db.expect_get_ask().returning(move |_| Ok(Some(row.clone())));
        db.expect_commit_acceptance().never();

        let service = Service::new_with_mocks(
            db,
            MockRelationshipDatabase::new(),
            Config::for_tests(),
            test_clock(),
            broadcast::channel(16).0,
        );
        let result = service
            .accept_bid(AcceptBidInput {
                ask_id,
                bid_id: Uuid::new_v4(),
                actor: owner,
            })
            .await;
        assert!(matches!(result, Err(RestError::AlreadyResolved)));
    }
}
