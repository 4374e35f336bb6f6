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
                to_api_bid_status,
            },
            entities,
        },
        kernel::entities::UserId,
        relationship::{
            entities as relationship_entities,
            service::form_relationship::FormRelationshipInput,
        },
    },
    ask_auction_api_types::bid::BidStatusWithId,
};

pub struct AcceptBidInput {
    pub ask_id: entities::AskId,
    pub bid_id: entities::BidId,
    pub actor:  UserId,
}

impl Service {
    /// Closes the auction by accepting one bid: the target flips to
    /// accepted, every rival to rejected, the ask to completed, and the
    /// relationship and contact snapshot come into existence, atomically,
    /// under the ask lock. Acceptance of the leading bid after the window
    /// has lapsed, but before the expiry sweep has flipped the ask, is
    /// deliberately legal.
    #[tracing::instrument(skip_all, fields(ask_id = ?input.ask_id, bid_id = ?input.bid_id, relationship_id))]
    pub async fn accept_bid(
        &self,
        input: AcceptBidInput,
    ) -> Result<relationship_entities::Relationship, RestError> {
        let lock = self.repo.get_or_create_in_memory_ask_lock(input.ask_id).await;
        let _guard = lock.lock().await;

        let ask = self
            .repo
            .get_ask(input.ask_id)
            .await?
            .ok_or(RestError::AskNotFound)?;
        if ask.owner != input.actor {
            return Err(RestError::NotOwner);
        }
        if ask.status != entities::AskStatus::Active || ask.archived_at.is_some() {
            return Err(RestError::AlreadyResolved);
        }

        let bids = self.repo.get_bids(input.ask_id).await?;
        if bids.iter().any(|bid| bid.status.is_accepted()) {
            return Err(RestError::AlreadyResolved);
        }
        let bid = bids
            .iter()
            .find(|bid| bid.id == input.bid_id)
            .ok_or(RestError::BidNotFound)?
            .clone();

        let requester = self
            .repo
            .get_profile(ask.owner)
            .await?
            .ok_or(RestError::TemporarilyUnavailable)?;
        // Snapshot of the winner's contact card as of this instant; later
        // profile edits must not alter the reveal.
        let provider = self
            .repo
            .get_profile(bid.bidder)
            .await?
            .ok_or(RestError::TemporarilyUnavailable)?;

        let (relationship, contact_reveal) = self
            .relationship_service
            .form_relationship(FormRelationshipInput {
                ask: &ask,
                bid: &bid,
                requester,
                provider,
            })
            .await;
        tracing::Span::current().record("relationship_id", relationship.id.to_string());

        self.repo
            .commit_acceptance(input.ask_id, input.bid_id, &relationship, &contact_reveal)
            .await?;

        // Commit order is delivery order: still under the ask lock.
        self.send_event(UpdateEvent::BidStatusUpdate {
            ask_id: input.ask_id,
            status: BidStatusWithId {
                id:         bid.id,
                bid_status: to_api_bid_status(&entities::BidStatus::Accepted {
                    relationship_id: relationship.id,
                }),
            },
        });
        for rival in bids.iter().filter(|b| b.id != bid.id && b.status.is_pending()) {
            self.send_event(UpdateEvent::BidStatusUpdate {
                ask_id: input.ask_id,
                status: BidStatusWithId {
                    id:         rival.id,
                    bid_status: to_api_bid_status(&entities::BidStatus::Rejected),
                },
            });
        }
        let mut completed = ask;
        completed.status = entities::AskStatus::Completed;
        self.send_event(UpdateEvent::AskStatusUpdate(to_api_ask(
            &completed,
            self.clock.now(),
        )));
        self.send_event(UpdateEvent::NewRelationship(
            crate::relationship::api::to_api_relationship(&relationship),
        ));

        self.repo.remove_in_memory_ask_lock(input.ask_id).await;
        Ok(relationship)
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
                    get_bids::GetBidsInput,
                    place_bid::PlaceBidInput,
                    Config,
                },
            },
            relationship::repository::models::MockDatabase as MockRelationshipDatabase,
        },
        time::macros::{
            date,
            datetime,
        },
        tokio::sync::broadcast,
        uuid::Uuid,
    };

    struct Scenario {
        owner:    Uuid,
        bidder_b: Uuid,
        ask:      models::Ask,
        bid_a:    models::Bid,
        bid_b:    models::Bid,
    }

    // The canonical setup: a per-unit ask at 100 for a single date, bidder A
    // pending at 90, bidder B pending at 80.
    fn scenario() -> Scenario {
        let owner = Uuid::new_v4();
        let bidder_a = Uuid::new_v4();
        let bidder_b = Uuid::new_v4();
        let ask = models::Ask::new(&entities::Ask {
            id: Uuid::new_v4(),
            owner,
            compensation: entities::Compensation {
                kind:   entities::CompensationKind::PerUnit,
                amount: 100,
            },
            schedule: entities::Schedule::SingleDate(date!(2025 - 06 - 01)),
            requirements: String::new(),
            auction_ends_at: Some(datetime!(2025-06-01 12:00:00 UTC)),
            status: entities::AskStatus::Active,
            archived_at: None,
            created_at: datetime!(2025-05-01 00:00:00 UTC),
        });
        let bid = |bidder: Uuid, name: &str, amount: i64, at| {
            models::Bid::new(&entities::Bid {
                id: Uuid::new_v4(),
                ask_id: ask.id,
                bidder,
                bidder_name: name.to_string(),
                amount,
                pitch: String::new(),
                status: entities::BidStatus::Pending,
                submitted_at: at,
            })
        };
        Scenario {
            owner,
            bidder_b,
            bid_a: bid(bidder_a, "Alice Able", 90, datetime!(2025-06-01 10:00:00 UTC)),
            bid_b: bid(bidder_b, "John Doe", 80, datetime!(2025-06-01 10:30:00 UTC)),
            ask,
        }
    }

    fn profile_row(id: Uuid, name: &str) -> models::Profile {
        models::Profile {
            id,
            name: name.to_string(),
            email: "winner@example.com".to_string(),
            phone: "+15555550100".to_string(),
        }
    }

    fn mock_db_for(scenario: &Scenario) -> MockDatabase {
        let mut db = MockDatabase::new();
        let (ask, bid_a, bid_b) = (scenario.ask.clone(), scenario.bid_a.clone(), scenario.bid_b.clone());
        let (owner, bidder_b) = (scenario.owner, scenario.bidder_b);
        db.expect_get_ask().returning(move |_| Ok(Some(ask.clone())));
        db.expect_get_bids()
            .returning(move |_| Ok(vec![bid_a.clone(), bid_b.clone()]));
        db.expect_get_profile()
            .returning(move |id| {
                Ok(Some(if id == owner {
                    profile_row(owner, "Mary Smith")
                } else {
                    profile_row(bidder_b, "John Doe")
                }))
            });
        db
    }

    fn mock_relationship_db() -> MockRelationshipDatabase {
        let mut db = MockRelationshipDatabase::new();
        db.expect_get_highest_pair_sequence()
            .returning(|_, _| Ok(None));
        db
    }

    #[tokio::test]
    async fn acceptance_resolves_the_whole_ledger_atomically() {
        let scenario = scenario();
        let mut db = mock_db_for(&scenario);
        let (ask_id, bid_b_id) = (scenario.ask.id, scenario.bid_b.id);
        db.expect_commit_acceptance()
            .withf(move |acceptance| {
                acceptance.ask_id == ask_id
                    && acceptance.bid_id == bid_b_id
                    && acceptance.relationship.code == "JDMS0001"
                    && acceptance.relationship.payment_amount == 80
                    && acceptance.contact_reveal.name == "John Doe"
                    && acceptance.contact_reveal.email == "winner@example.com"
            })
            .times(1)
            .returning(|_| Ok(()));

        let (event_sender, mut event_receiver) = broadcast::channel(16);
        let service = Service::new_with_mocks(
            db,
            mock_relationship_db(),
            Config::for_tests(),
            test_clock(),
            event_sender,
        );

        let relationship = service
            .accept_bid(AcceptBidInput {
                ask_id,
                bid_id: bid_b_id,
                actor: scenario.owner,
            })
            .await
            .unwrap();

        assert_eq!(relationship.code, "JDMS0001");
        assert_eq!(
            relationship.status,
            crate::relationship::entities::RelationshipStatus::Active
        );

        // Observable postconditions: one accepted bid, zero pending, the ask
        // completed.
        let bids = service.get_bids(GetBidsInput { ask_id }).await.unwrap();
        assert_eq!(
            bids.iter().filter(|b| b.status.is_accepted()).count(),
            1
        );
        assert_eq!(bids.iter().filter(|b| b.status.is_pending()).count(), 0);
        let ask = service
            .get_ask(super::super::get_ask::GetAskInput { ask_id })
            .await
            .unwrap();
        assert_eq!(ask.status, entities::AskStatus::Completed);

        // Update stream: accepted, rejected rival, completed ask, then the
        // relationship. Never a status flip before the rows they concern.
        let mut seen = vec![];
        while let Ok(event) = event_receiver.try_recv() {
            seen.push(event);
        }
        assert!(matches!(
            seen[0],
            UpdateEvent::BidStatusUpdate { ref status, .. } if status.id == bid_b_id
        ));
        assert!(matches!(
            seen[1],
            UpdateEvent::BidStatusUpdate { ref status, .. } if status.id == scenario.bid_a.id
        ));
        assert!(matches!(seen[2], UpdateEvent::AskStatusUpdate(_)));
        assert!(matches!(seen[3], UpdateEvent::NewRelationship(_)));
    }

    #[tokio::test]
    async fn retry_after_success_reports_already_resolved() {
        let scenario = scenario();
        let mut db = mock_db_for(&scenario);
        db.expect_commit_acceptance().times(1).returning(|_| Ok(()));

        let service = Service::new_with_mocks(
            db,
            mock_relationship_db(),
            Config::for_tests(),
            test_clock(),
            broadcast::channel(16).0,
        );

        let input = || AcceptBidInput {
            ask_id: scenario.ask.id,
            bid_id: scenario.bid_b.id,
            actor:  scenario.owner,
        };
        service.accept_bid(input()).await.unwrap();
        // The relationship mock would panic on a second sequence lookup if
        // acceptance got that far again; times(1) above pins the commit too.
        let retry = service.accept_bid(input()).await;
        assert!(matches!(retry, Err(RestError::AlreadyResolved)));
    }

    #[tokio::test]
    async fn concurrent_acceptances_elect_exactly_one_winner() {
        let scenario = scenario();
        let mut db = mock_db_for(&scenario);
        db.expect_commit_acceptance().times(1).returning(|_| Ok(()));

        let service = Service::new_with_mocks(
            db,
            mock_relationship_db(),
            Config::for_tests(),
            test_clock(),
            broadcast::channel(16).0,
        );

        let accept_a = service.accept_bid(AcceptBidInput {
            ask_id: scenario.ask.id,
            bid_id: scenario.bid_a.id,
            actor:  scenario.owner,
        });
        let accept_b = service.accept_bid(AcceptBidInput {
            ask_id: scenario.ask.id,
            bid_id: scenario.bid_b.id,
            actor:  scenario.owner,
        });
        let (result_a, result_b) = tokio::join!(accept_a, accept_b);

        let successes = [&result_a, &result_b]
            .iter()
            .filter(|r| r.is_ok())
            .count();
        assert_eq!(successes, 1);
        assert!([result_a, result_b]
            .into_iter()
            .any(|r| matches!(r, Err(RestError::AlreadyResolved))));
    }

    #[tokio::test]
    async fn only_the_owner_accepts() {
        let scenario = scenario();
        let db = mock_db_for(&scenario);
        let service = Service::new_with_mocks(
            db,
            MockRelationshipDatabase::new(),
            Config::for_tests(),
            test_clock(),
            broadcast::channel(16).0,
        );

        let result = service
            .accept_bid(AcceptBidInput {
                ask_id: scenario.ask.id,
                bid_id: scenario.bid_b.id,
                actor:  Uuid::new_v4(),
            })
            .await;
        assert!(matches!(result, Err(RestError::NotOwner)));
    }

    #[tokio::test]
    async fn unknown_bids_are_reported() {
        let scenario = scenario();
        let db = mock_db_for(&scenario);
        let service = Service::new_with_mocks(
            db,
            MockRelationshipDatabase::new(),
            Config::for_tests(),
            test_clock(),
            broadcast::channel(16).0,
        );

        let result = service
            .accept_bid(AcceptBidInput {
                ask_id: scenario.ask.id,
                bid_id: Uuid::new_v4(),
                actor:  scenario.owner,
            })
            .await;
        assert!(matches!(result, Err(RestError::BidNotFound)));
    }

    #[tokio::test]
    async fn late_acceptance_is_legal_until_the_sweep_runs() {
        let scenario = scenario();
        let clock = test_clock();
        // Window lapsed an hour ago; the row still reads active.
        clock.set(datetime!(2025-06-01 13:00:00 UTC));

        let mut db = mock_db_for(&scenario);
        db.expect_commit_acceptance().times(1).returning(|_| Ok(()));
        let service = Service::new_with_mocks(
            db,
            mock_relationship_db(),
            Config::for_tests(),
            clock,
            broadcast::channel(16).0,
        );

        let relationship = service
            .accept_bid(AcceptBidInput {
                ask_id: scenario.ask.id,
                bid_id: scenario.bid_b.id,
                actor:  scenario.owner,
            })
            .await
            .unwrap();
        assert_eq!(relationship.bid_id, scenario.bid_b.id);
    }

    #[tokio::test]
    async fn a_snipe_guarded_auction_accepts_and_rejects_per_ledger() {
        // End to end: B bids 80 with the window in its final minute, the
        // window stretches, then the owner accepts B.
        let scenario = scenario();
        let clock = test_clock();
        let mut db = mock_db_for(&scenario);
        let bid_b_amount = 80;

        db.expect_add_bid()
            .withf(|_, new_end| {
                *new_end == Some(models::primitive(datetime!(2025-06-01 12:01:00 UTC)))
            })
            .times(1)
            .returning(|_, _| Ok(()));
        db.expect_commit_acceptance()
            .withf(move |acceptance| {
                acceptance.relationship.payment_amount == bid_b_amount
                    && acceptance.relationship.status
                        == crate::relationship::repository::models::RelationshipStatus::Active
            })
            .times(1)
            .returning(|_| Ok(()));

        let service = Service::new_with_mocks(
            db,
            mock_relationship_db(),
            Config::for_tests(),
            clock,
            broadcast::channel(16).0,
        );

        let placed = service
            .place_bid(PlaceBidInput {
                ask_id: scenario.ask.id,
                bidder: scenario.bidder_b,
                amount: bid_b_amount,
                pitch:  "Certified, available both weeks.".to_string(),
            })
            .await
            .unwrap();

        service
            .accept_bid(AcceptBidInput {
                ask_id: scenario.ask.id,
                bid_id: placed.id,
                actor:  scenario.owner,
            })
            .await
            .unwrap();

        let bids = service
            .get_bids(GetBidsInput {
                ask_id: scenario.ask.id,
            })
            .await
            .unwrap();
        for bid in &bids {
            if bid.id == placed.id {
                assert!(bid.status.is_accepted());
            } else {
                assert_eq!(bid.status, entities::BidStatus::Rejected);
            }
        }
    }
}
