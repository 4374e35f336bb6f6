use {
    super::Service,
    crate::{
        api::{
            ws::UpdateEvent,
            RestError,
        },
        auction::{
            api::{
                to_api_ask,
                to_api_bid,
            },
            entities,
        },
        kernel::entities::UserId,
    },
    uuid::Uuid,
};

pub struct PlaceBidInput {
    pub ask_id: entities::AskId,
    pub bidder: UserId,
    pub amount: i64,
    pub pitch:  String,
}

impl Service {
    /// Appends a bid to the ledger. Holds the ask lock across the whole
    /// operation so the expiry re-check, the anti-snipe extension and the
    /// insert are one unit with respect to any concurrent acceptance.
    #[tracing::instrument(skip_all, fields(ask_id = ?input.ask_id, bid_id, bidder = ?input.bidder))]
    pub async fn place_bid(&self, input: PlaceBidInput) -> Result<entities::Bid, RestError> {
        let lock = self.repo.get_or_create_in_memory_ask_lock(input.ask_id).await;
        let _guard = lock.lock().await;

        let ask = self
            .repo
            .get_ask(input.ask_id)
            .await?
            .ok_or(RestError::AskNotFound)?;

        // Expiry is re-read under the lock, immediately before commit; a
        // window that lapsed between the caller's read and now rejects here.
        let now = self.clock.now();
        if !ask.is_open(now) {
            return Err(RestError::AuctionClosed);
        }

        let existing_bids = self.repo.get_bids(input.ask_id).await?;
        self.verify_bid_amount(input.amount, &existing_bids)?;

        let bidder_profile = self
            .repo
            .get_profile(input.bidder)
            .await?
            .ok_or_else(|| RestError::BadParameters("unknown bidder".to_string()))?;

        let new_end_time =
            ask.anti_snipe_extension(now, self.config.anti_snipe_window, self.config.anti_snipe_extension);

        let bid = entities::Bid {
            id: Uuid::new_v4(),
            ask_id: input.ask_id,
            bidder: input.bidder,
            bidder_name: bidder_profile.name,
            amount: input.amount,
            pitch: input.pitch,
            status: entities::BidStatus::Pending,
            submitted_at: now,
        };
        tracing::Span::current().record("bid_id", bid.id.to_string());

        let bid = self.repo.add_bid(bid, new_end_time).await?;

        // Published while the lock is held: per-ask delivery order is commit
        // order.
        self.send_event(UpdateEvent::NewBid(to_api_bid(&bid, false)));
        if let Some(end) = new_end_time {
            let mut extended = ask;
            extended.auction_ends_at = Some(end);
            tracing::info!(ask_id = ?extended.id, new_end = ?end, "Anti-snipe extension applied");
            self.send_event(UpdateEvent::AskStatusUpdate(to_api_ask(&extended, now)));
        }
        Ok(bid)
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
                service::Config,
            },
            relationship::repository::models::MockDatabase as MockRelationshipDatabase,
        },
        std::time::Duration,
        time::macros::{
            date,
            datetime,
        },
        tokio::sync::broadcast,
    };

    fn ask_row(end: Option<time::OffsetDateTime>) -> models::Ask {
        models::Ask::new(&entities::Ask {
            id: Uuid::new_v4(),
            owner: Uuid::new_v4(),
            compensation: entities::Compensation {
                kind:   entities::CompensationKind::PerUnit,
                amount: 100,
            },
            schedule: entities::Schedule::SingleDate(date!(2025 - 06 - 01)),
            requirements: String::new(),
            auction_ends_at: end,
            status: entities::AskStatus::Active,
            archived_at: None,
            created_at: datetime!(2025-05-01 00:00:00 UTC),
        })
    }

    fn profile_row(name: &str) -> models::Profile {
        models::Profile {
            id:    Uuid::new_v4(),
            name:  name.to_string(),
            email: "bidder@example.com".to_string(),
            phone: "+15555550100".to_string(),
        }
    }

    fn service_with(db: MockDatabase) -> Service {
        Service::new_with_mocks(
            db,
            MockRelationshipDatabase::new(),
            Config::for_tests(),
            test_clock(),
            broadcast::channel(16).0,
        )
    }

    #[tokio::test]
    async fn closing_bid_extends_from_the_previous_end() {
        // Clock reads 11:59:10; the window ends at 12:00:00, so 50 seconds
        // remain and the extension must land at 12:01:00, not 12:00:10.
        let end = datetime!(2025-06-01 12:00:00 UTC);
        let row = ask_row(Some(end));
        let ask_id = row.id;

        let mut db = MockDatabase::new();
        db.expect_get_ask().returning(move |_| Ok(Some(row.clone())));
        db.expect_get_bids().returning(|_| Ok(vec![]));
        db.expect_get_profile()
            .returning(|_| Ok(Some(profile_row("John Doe"))));
        db.expect_add_bid()
            .withf(move |bid, new_end| {
                bid.ask_id == ask_id
                    && *new_end == Some(models::primitive(datetime!(2025-06-01 12:01:00 UTC)))
            })
            .times(1)
            .returning(|_, _| Ok(()));

        let service = service_with(db);
        let bid = service
            .place_bid(PlaceBidInput {
                ask_id,
                bidder: Uuid::new_v4(),
                amount: 80,
                pitch: String::new(),
            })
            .await
            .unwrap();
        assert_eq!(bid.bidder_name, "John Doe");
        assert!(bid.status.is_pending());
    }

    #[tokio::test]
    async fn consecutive_closing_bids_compound_the_extension() {
        let end = datetime!(2025-06-01 12:00:00 UTC);
        let row = ask_row(Some(end));
        let ask_id = row.id;
        let clock = test_clock();

        let mut db = MockDatabase::new();
        db.expect_get_ask().returning(move |_| Ok(Some(row.clone())));
        db.expect_get_bids().returning(|_| Ok(vec![]));
        db.expect_get_profile()
            .returning(|_| Ok(Some(profile_row("John Doe"))));
        // First push: previous end + 60s. Second, ten seconds later: pushed
        // again from the already-updated end.
        db.expect_add_bid()
            .withf(|_, new_end| {
                *new_end == Some(models::primitive(datetime!(2025-06-01 12:01:00 UTC)))
            })
            .times(1)
            .returning(|_, _| Ok(()));
        db.expect_add_bid()
            .withf(|_, new_end| {
                *new_end == Some(models::primitive(datetime!(2025-06-01 12:02:00 UTC)))
            })
            .times(1)
            .returning(|_, _| Ok(()));

        let service = Service::new_with_mocks(
            db,
            MockRelationshipDatabase::new(),
            Config::for_tests(),
            clock.clone(),
            broadcast::channel(16).0,
        );

        service
            .place_bid(PlaceBidInput {
                ask_id,
                bidder: Uuid::new_v4(),
                amount: 80,
                pitch: String::new(),
            })
            .await
            .unwrap();

        // 12:00:01 against the pushed end of 12:01:00: inside the window
        // again, and the push is measured from 12:01:00, not from now.
        clock.advance(Duration::from_secs(51));
        service
            .place_bid(PlaceBidInput {
                ask_id,
                bidder: Uuid::new_v4(),
                amount: 75,
                pitch: String::new(),
            })
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn lapsed_window_rejects_even_when_read_before_expiry() {
        let clock = test_clock();
        // The request raced the clock: the window ended at 11:59:00 but the
        // row still reads active because no sweep has run yet.
        let row = ask_row(Some(datetime!(2025-06-01 11:59:00 UTC)));
        let ask_id = row.id;

        let mut db = MockDatabase::new();
        db.expect_get_ask().returning(move |_| Ok(Some(row.clone())));
        db.expect_add_bid().never();

        let service = Service::new_with_mocks(
            db,
            MockRelationshipDatabase::new(),
            Config::for_tests(),
            clock,
            broadcast::channel(16).0,
        );
        let result = service
            .place_bid(PlaceBidInput {
                ask_id,
                bidder: Uuid::new_v4(),
                amount: 80,
                pitch: String::new(),
            })
            .await;
        assert!(matches!(result, Err(RestError::AuctionClosed)));
    }

    #[tokio::test]
    async fn unknown_ask_is_reported_as_such() {
        let mut db = MockDatabase::new();
        db.expect_get_ask().returning(|_| Ok(None));

        let service = service_with(db);
        let result = service
            .place_bid(PlaceBidInput {
                ask_id: Uuid::new_v4(),
                bidder: Uuid::new_v4(),
                amount: 80,
                pitch: String::new(),
            })
            .await;
        assert!(matches!(result, Err(RestError::AskNotFound)));
    }

    #[tokio::test]
    async fn unbounded_asks_are_never_extended() {
        let row = ask_row(None);
        let ask_id = row.id;

        let mut db = MockDatabase::new();
        db.expect_get_ask().returning(move |_| Ok(Some(row.clone())));
        db.expect_get_bids().returning(|_| Ok(vec![]));
        db.expect_get_profile()
            .returning(|_| Ok(Some(profile_row("John Doe"))));
        db.expect_add_bid()
            .withf(|_, new_end| new_end.is_none())
            .times(1)
            .returning(|_, _| Ok(()));

        let service = service_with(db);
        service
            .place_bid(PlaceBidInput {
                ask_id,
                bidder: Uuid::new_v4(),
                amount: 80,
                pitch: String::new(),
            })
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn extension_is_visible_to_observers() {
        let end = datetime!(2025-06-01 12:00:00 UTC);
        let row = ask_row(Some(end));
        let ask_id = row.id;

        let mut db = MockDatabase::new();
        db.expect_get_ask().returning(move |_| Ok(Some(row.clone())));
        db.expect_get_bids().returning(|_| Ok(vec![]));
        db.expect_get_profile()
            .returning(|_| Ok(Some(profile_row("John Doe"))));
        db.expect_add_bid().returning(|_, _| Ok(()));

        let (event_sender, mut event_receiver) = broadcast::channel(16);
        let service = Service::new_with_mocks(
            db,
            MockRelationshipDatabase::new(),
            Config::for_tests(),
            test_clock(),
            event_sender,
        );
        let bid = service
            .place_bid(PlaceBidInput {
                ask_id,
                bidder: Uuid::new_v4(),
                amount: 80,
                pitch: String::new(),
            })
            .await
            .unwrap();

        // Creation is observed before any later status change of the row.
        match event_receiver.try_recv().unwrap() {
            UpdateEvent::NewBid(api_bid) => assert_eq!(api_bid.id, bid.id),
            other => panic!("expected NewBid first, got {:?}", other),
        }
        match event_receiver.try_recv().unwrap() {
            UpdateEvent::AskStatusUpdate(api_ask) => {
                assert_eq!(api_ask.id, ask_id);
                assert_eq!(
                    api_ask.auction_ends_at,
                    Some(datetime!(2025-06-01 12:01:00 UTC))
                );
            }
            other => panic!("expected AskStatusUpdate, got {:?}", other),
        }
    }
}
