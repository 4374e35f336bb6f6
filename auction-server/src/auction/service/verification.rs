use {
    super::Service,
    crate::{
        api::RestError,
        auction::entities,
    },
};

impl Service {
    /// Terms checks for a new ask. The "exactly one schedule shape" rule is
    /// structural; what remains is value validation.
    pub fn verify_ask_terms(
        &self,
        compensation: &entities::Compensation,
        schedule: &entities::Schedule,
    ) -> Result<(), RestError> {
        if compensation.amount <= 0 {
            return Err(RestError::BadParameters(
                "compensation amount must be positive".to_string(),
            ));
        }
        match schedule {
            entities::Schedule::DateRange { start, end } if end < start => {
                Err(RestError::BadParameters(
                    "schedule range ends before it starts".to_string(),
                ))
            }
            entities::Schedule::Term(name) if name.trim().is_empty() => Err(
                RestError::BadParameters("schedule term must be named".to_string()),
            ),
            _ => Ok(()),
        }
    }

    /// Ledger-level bid validation. Rebidding at any amount is legal; the
    /// improving-bid rule only applies when configured.
    pub fn verify_bid_amount(
        &self,
        amount: i64,
        existing_bids: &[entities::Bid],
    ) -> Result<(), RestError> {
        if amount <= 0 {
            return Err(RestError::BadParameters(
                "bid amount must be positive".to_string(),
            ));
        }
        if self.config.enforce_improving_bids {
            if let Some(lowest) = entities::BidStatistics::over_pending(existing_bids).lowest {
                if amount >= lowest {
                    return Err(RestError::BadParameters(format!(
                        "bid must beat the lowest pending offer of {}",
                        lowest
                    )));
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use {
        super::*,
        crate::auction::service::tests::test_clock,
        crate::{
            auction::{
                repository::MockDatabase,
                service::Config,
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

    fn service(config: Config) -> Service {
        Service::new_with_mocks(
            MockDatabase::new(),
            MockRelationshipDatabase::new(),
            config,
            test_clock(),
            broadcast::channel(16).0,
        )
    }

    fn pending_bid(amount: i64) -> entities::Bid {
        entities::Bid {
            id: Uuid::new_v4(),
            ask_id: Uuid::new_v4(),
            bidder: Uuid::new_v4(),
            bidder_name: "Bidder".to_string(),
            amount,
            pitch: String::new(),
            status: entities::BidStatus::Pending,
            submitted_at: datetime!(2025-06-01 10:00:00 UTC),
        }
    }

    #[test]
    fn compensation_must_be_positive() {
        let service = service(Config::for_tests());
        let schedule = entities::Schedule::SingleDate(date!(2025 - 06 - 01));
        for amount in [0, -5] {
            let compensation = entities::Compensation {
                kind: entities::CompensationKind::Flat,
                amount,
            };
            assert!(matches!(
                service.verify_ask_terms(&compensation, &schedule),
                Err(RestError::BadParameters(_))
            ));
        }
    }

    #[test]
    fn range_must_be_ordered() {
        let service = service(Config::for_tests());
        let compensation = entities::Compensation {
            kind:   entities::CompensationKind::Hourly,
            amount: 50,
        };
        assert!(service
            .verify_ask_terms(
                &compensation,
                &entities::Schedule::DateRange {
                    start: date!(2025 - 06 - 01),
                    end:   date!(2025 - 06 - 14),
                },
            )
            .is_ok());
        assert!(matches!(
            service.verify_ask_terms(
                &compensation,
                &entities::Schedule::DateRange {
                    start: date!(2025 - 06 - 14),
                    end:   date!(2025 - 06 - 01),
                },
            ),
            Err(RestError::BadParameters(_))
        ));
    }

    #[test]
    fn rebidding_at_any_amount_is_legal_by_default() {
        let service = service(Config::for_tests());
        let bids = vec![pending_bid(80)];
        assert!(service.verify_bid_amount(90, &bids).is_ok());
        assert!(matches!(
            service.verify_bid_amount(0, &bids),
            Err(RestError::BadParameters(_))
        ));
    }

    #[test]
    fn improving_rule_applies_only_when_configured() {
        let config = Config {
            enforce_improving_bids: true,
            ..Config::for_tests()
        };
        let service = service(config);
        let bids = vec![pending_bid(80)];
        assert!(service.verify_bid_amount(79, &bids).is_ok());
        assert!(matches!(
            service.verify_bid_amount(80, &bids),
            Err(RestError::BadParameters(_))
        ));
        assert!(matches!(
            service.verify_bid_amount(95, &bids),
            Err(RestError::BadParameters(_))
        ));
    }
}
