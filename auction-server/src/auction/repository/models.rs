#[cfg(test)]
use mockall::automock;
use {
    super::entities,
    crate::{
        api::RestError,
        kernel::{
            db::DB,
            entities::UserId,
        },
        models,
        relationship::repository::models as relationship_models,
    },
    anyhow::anyhow,
    axum::async_trait,
    sqlx::FromRow,
    std::fmt::Debug,
    time::{
        Date,
        OffsetDateTime,
        PrimitiveDateTime,
    },
    tracing::instrument,
    uuid::Uuid,
};

pub fn primitive(time: OffsetDateTime) -> PrimitiveDateTime {
    PrimitiveDateTime::new(time.date(), time.time())
}

#[derive(Clone, Debug, PartialEq, sqlx::Type)]
#[sqlx(type_name = "ask_status", rename_all = "lowercase")]
pub enum AskStatus {
    Active,
    Completed,
    Expired,
}

#[derive(Clone, Debug, PartialEq, sqlx::Type)]
#[sqlx(type_name = "compensation_kind", rename_all = "snake_case")]
pub enum CompensationKind {
    Hourly,
    PerUnit,
    Flat,
}

#[derive(Clone, Debug, PartialEq, sqlx::Type)]
#[sqlx(type_name = "schedule_kind", rename_all = "snake_case")]
pub enum ScheduleKind {
    SingleDate,
    DateRange,
    Term,
}

#[derive(Clone, Debug, PartialEq, sqlx::Type)]
#[sqlx(type_name = "bid_status", rename_all = "lowercase")]
pub enum BidStatus {
    Pending,
    Accepted,
    Rejected,
}

#[derive(Clone, FromRow, Debug)]
pub struct Ask {
    pub id:                entities::AskId,
    pub owner:             Uuid,
    pub compensation_kind: CompensationKind,
    pub compensation_amount: i64,
    pub schedule_kind:     ScheduleKind,
    pub schedule_date:     Option<Date>,
    pub schedule_end_date: Option<Date>,
    pub schedule_term:     Option<String>,
    pub requirements:      String,
    pub auction_ends_at:   Option<PrimitiveDateTime>,
    pub status:            AskStatus,
    pub archived_at:       Option<PrimitiveDateTime>,
    pub created_at:        PrimitiveDateTime,
}

impl Ask {
    pub fn new(ask: &entities::Ask) -> Self {
        let (schedule_kind, schedule_date, schedule_end_date, schedule_term) =
            match &ask.schedule {
                entities::Schedule::SingleDate(date) => {
                    (ScheduleKind::SingleDate, Some(*date), None, None)
                }
                entities::Schedule::DateRange { start, end } => {
                    (ScheduleKind::DateRange, Some(*start), Some(*end), None)
                }
                entities::Schedule::Term(name) => {
                    (ScheduleKind::Term, None, None, Some(name.clone()))
                }
            };
        Self {
            id: ask.id,
            owner: ask.owner,
            compensation_kind: match ask.compensation.kind {
                entities::CompensationKind::Hourly => CompensationKind::Hourly,
                entities::CompensationKind::PerUnit => CompensationKind::PerUnit,
                entities::CompensationKind::Flat => CompensationKind::Flat,
            },
            compensation_amount: ask.compensation.amount,
            schedule_kind,
            schedule_date,
            schedule_end_date,
            schedule_term,
            requirements: ask.requirements.clone(),
            auction_ends_at: ask.auction_ends_at.map(primitive),
            status: match ask.status {
                entities::AskStatus::Active => AskStatus::Active,
                entities::AskStatus::Completed => AskStatus::Completed,
                entities::AskStatus::Expired => AskStatus::Expired,
            },
            archived_at: ask.archived_at.map(primitive),
            created_at: primitive(ask.created_at),
        }
    }

    pub fn get_ask_entity(&self) -> anyhow::Result<entities::Ask> {
        let schedule = match (&self.schedule_kind, self.schedule_date, self.schedule_end_date) {
            (ScheduleKind::SingleDate, Some(date), None) => entities::Schedule::SingleDate(date),
            (ScheduleKind::DateRange, Some(start), Some(end)) => {
                entities::Schedule::DateRange { start, end }
            }
            (ScheduleKind::Term, None, None) => entities::Schedule::Term(
                self.schedule_term
                    .clone()
                    .ok_or_else(|| anyhow!("ask {} has no schedule term", self.id))?,
            ),
            _ => return Err(anyhow!("ask {} has an inconsistent schedule", self.id)),
        };
        Ok(entities::Ask {
            id: self.id,
            owner: self.owner,
            compensation: entities::Compensation {
                kind:   match self.compensation_kind {
                    CompensationKind::Hourly => entities::CompensationKind::Hourly,
                    CompensationKind::PerUnit => entities::CompensationKind::PerUnit,
                    CompensationKind::Flat => entities::CompensationKind::Flat,
                },
                amount: self.compensation_amount,
            },
            schedule,
            requirements: self.requirements.clone(),
            auction_ends_at: self.auction_ends_at.map(|end| end.assume_utc()),
            status: match self.status {
                AskStatus::Active => entities::AskStatus::Active,
                AskStatus::Completed => entities::AskStatus::Completed,
                AskStatus::Expired => entities::AskStatus::Expired,
            },
            archived_at: self.archived_at.map(|at| at.assume_utc()),
            created_at: self.created_at.assume_utc(),
        })
    }
}

#[derive(Clone, FromRow, Debug)]
pub struct Bid {
    pub id:              entities::BidId,
    pub ask_id:          entities::AskId,
    pub bidder:          Uuid,
    pub bidder_name:     String,
    pub amount:          i64,
    pub pitch:           String,
    pub status:          BidStatus,
    pub relationship_id: Option<Uuid>,
    pub submitted_at:    PrimitiveDateTime,
}

impl Bid {
    pub fn new(bid: &entities::Bid) -> Self {
        let (status, relationship_id) = match &bid.status {
            entities::BidStatus::Pending => (BidStatus::Pending, None),
            entities::BidStatus::Accepted { relationship_id } => {
                (BidStatus::Accepted, Some(*relationship_id))
            }
            entities::BidStatus::Rejected => (BidStatus::Rejected, None),
        };
        Self {
            id: bid.id,
            ask_id: bid.ask_id,
            bidder: bid.bidder,
            bidder_name: bid.bidder_name.clone(),
            amount: bid.amount,
            pitch: bid.pitch.clone(),
            status,
            relationship_id,
            submitted_at: primitive(bid.submitted_at),
        }
    }

    pub fn get_bid_entity(&self) -> anyhow::Result<entities::Bid> {
        let status = match (&self.status, self.relationship_id) {
            (BidStatus::Pending, _) => entities::BidStatus::Pending,
            (BidStatus::Accepted, Some(relationship_id)) => {
                entities::BidStatus::Accepted { relationship_id }
            }
            (BidStatus::Accepted, None) => {
                return Err(anyhow!("accepted bid {} has no relationship", self.id))
            }
            (BidStatus::Rejected, _) => entities::BidStatus::Rejected,
        };
        Ok(entities::Bid {
            id: self.id,
            ask_id: self.ask_id,
            bidder: self.bidder,
            bidder_name: self.bidder_name.clone(),
            amount: self.amount,
            pitch: self.pitch.clone(),
            status,
            submitted_at: self.submitted_at.assume_utc(),
        })
    }
}

#[derive(Clone, FromRow, Debug)]
pub struct Profile {
    pub id:    Uuid,
    pub name:  String,
    pub email: String,
    pub phone: String,
}

impl Profile {
    pub fn get_profile_entity(&self) -> anyhow::Result<models::Profile> {
        Ok(models::Profile {
            id:    self.id,
            name:  self.name.clone(),
            email: self
                .email
                .parse()
                .map_err(|e| anyhow!("profile {} has an invalid email: {}", self.id, e))?,
            phone: self.phone.clone(),
        })
    }
}

/// Everything the acceptance transaction writes, prebuilt by the service so
/// the storage layer can commit it as one unit.
#[derive(Clone, Debug)]
pub struct Acceptance {
    pub ask_id:         entities::AskId,
    pub bid_id:         entities::BidId,
    pub relationship:   relationship_models::Relationship,
    pub contact_reveal: relationship_models::ContactReveal,
}

#[cfg_attr(test, automock)]
#[async_trait]
pub trait Database: Debug + Send + Sync + 'static {
    async fn add_ask(&self, ask: &Ask) -> anyhow::Result<()>;
    async fn get_ask(&self, ask_id: entities::AskId) -> Result<Option<Ask>, RestError>;
    async fn get_asks(&self) -> Result<Vec<Ask>, RestError>;
    /// Inserts the bid and applies the anti-snipe end-time push in one
    /// transaction, re-checking that the ask is still open at commit time.
    async fn add_bid(
        &self,
        bid: &Bid,
        new_end_time: Option<PrimitiveDateTime>,
    ) -> Result<(), RestError>;
    async fn get_bids(&self, ask_id: entities::AskId) -> Result<Vec<Bid>, RestError>;
    /// The all-or-nothing acceptance commit: accept one bid, reject the
    /// rivals, complete the ask, insert the relationship and the contact
    /// reveal. Rolls back wholesale on any failure.
    async fn commit_acceptance(&self, acceptance: &Acceptance) -> Result<(), RestError>;
    async fn archive_ask(
        &self,
        ask_id: entities::AskId,
        archived_at: PrimitiveDateTime,
    ) -> anyhow::Result<()>;
    async fn expire_asks(&self, now: PrimitiveDateTime) -> anyhow::Result<Vec<entities::AskId>>;
    async fn get_profile(&self, user_id: UserId) -> Result<Option<Profile>, RestError>;
}

#[async_trait]
impl Database for DB {
    #[instrument(
        target = "metrics",
        name = "db_add_ask",
        fields(category = "db_queries", result = "success", name = "add_ask"),
        skip_all
    )]
    async fn add_ask(&self, ask: &Ask) -> anyhow::Result<()> {
        sqlx::query(
            "INSERT INTO ask (id, owner, compensation_kind, compensation_amount, schedule_kind, \
             schedule_date, schedule_end_date, schedule_term, requirements, auction_ends_at, \
             status, created_at) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)",
        )
        .bind(ask.id)
        .bind(ask.owner)
        .bind(&ask.compensation_kind)
        .bind(ask.compensation_amount)
        .bind(&ask.schedule_kind)
        .bind(ask.schedule_date)
        .bind(ask.schedule_end_date)
        .bind(&ask.schedule_term)
        .bind(&ask.requirements)
        .bind(ask.auction_ends_at)
        .bind(&ask.status)
        .bind(ask.created_at)
        .execute(self)
        .await
        .inspect_err(|_| {
            tracing::Span::current().record("result", "error");
        })?;
        Ok(())
    }

    #[instrument(
        target = "metrics",
        name = "db_get_ask",
        fields(category = "db_queries", result = "success", name = "get_ask"),
        skip_all
    )]
    async fn get_ask(&self, ask_id: entities::AskId) -> Result<Option<Ask>, RestError> {
        sqlx::query_as::<_, Ask>("SELECT * FROM ask WHERE id = $1")
            .bind(ask_id)
            .fetch_optional(self)
            .await
            .map_err(|e| {
                tracing::Span::current().record("result", "error");
                tracing::error!(error = ?e, "Failed to get ask from db");
                RestError::TemporarilyUnavailable
            })
    }

    #[instrument(
        target = "metrics",
        name = "db_get_asks",
        fields(category = "db_queries", result = "success", name = "get_asks"),
        skip_all
    )]
    async fn get_asks(&self) -> Result<Vec<Ask>, RestError> {
        sqlx::query_as::<_, Ask>(
            "SELECT * FROM ask WHERE archived_at IS NULL ORDER BY created_at DESC",
        )
        .fetch_all(self)
        .await
        .map_err(|e| {
            tracing::Span::current().record("result", "error");
            tracing::error!(error = ?e, "Failed to get asks from db");
            RestError::TemporarilyUnavailable
        })
    }

    #[instrument(
        target = "metrics",
        name = "db_add_bid",
        fields(category = "db_queries", result = "success", name = "add_bid"),
        skip_all
    )]
    async fn add_bid(
        &self,
        bid: &Bid,
        new_end_time: Option<PrimitiveDateTime>,
    ) -> Result<(), RestError> {
        let mut tx = self.begin().await.map_err(|e| {
            tracing::Span::current().record("result", "error");
            tracing::error!(error = ?e, "Failed to begin add_bid transaction");
            RestError::TemporarilyUnavailable
        })?;

        // Guard and extension in one statement: the ask must still be open at
        // commit time, not merely at the read that preceded this call.
        let guard = sqlx::query(
            "UPDATE ask SET auction_ends_at = COALESCE($2, auction_ends_at) \
             WHERE id = $1 AND status = 'active' AND archived_at IS NULL",
        )
        .bind(bid.ask_id)
        .bind(new_end_time)
        .execute(&mut *tx)
        .await
        .map_err(|e| {
            tracing::Span::current().record("result", "error");
            tracing::error!(error = ?e, "Failed to re-check ask openness");
            RestError::TemporarilyUnavailable
        })?;
        if guard.rows_affected() != 1 {
            return Err(RestError::AuctionClosed);
        }

        sqlx::query(
            "INSERT INTO bid (id, ask_id, bidder, bidder_name, amount, pitch, status, \
             submitted_at) VALUES ($1, $2, $3, $4, $5, $6, $7, $8)",
        )
        .bind(bid.id)
        .bind(bid.ask_id)
        .bind(bid.bidder)
        .bind(&bid.bidder_name)
        .bind(bid.amount)
        .bind(&bid.pitch)
        .bind(&bid.status)
        .bind(bid.submitted_at)
        .execute(&mut *tx)
        .await
        .map_err(|e| {
            tracing::Span::current().record("result", "error");
            tracing::error!(error = ?e, "Failed to insert bid");
            RestError::TemporarilyUnavailable
        })?;

        tx.commit().await.map_err(|e| {
            tracing::Span::current().record("result", "error");
            tracing::error!(error = ?e, "Failed to commit add_bid transaction");
            RestError::TemporarilyUnavailable
        })
    }

    #[instrument(
        target = "metrics",
        name = "db_get_bids",
        fields(category = "db_queries", result = "success", name = "get_bids"),
        skip_all
    )]
    async fn get_bids(&self, ask_id: entities::AskId) -> Result<Vec<Bid>, RestError> {
        sqlx::query_as::<_, Bid>(
            "SELECT * FROM bid WHERE ask_id = $1 ORDER BY submitted_at ASC",
        )
        .bind(ask_id)
        .fetch_all(self)
        .await
        .map_err(|e| {
            tracing::Span::current().record("result", "error");
            tracing::error!(error = ?e, "Failed to get bids from db");
            RestError::TemporarilyUnavailable
        })
    }

    #[instrument(
        target = "metrics",
        name = "db_commit_acceptance",
        fields(category = "db_queries", result = "success", name = "commit_acceptance"),
        skip_all
    )]
    async fn commit_acceptance(&self, acceptance: &Acceptance) -> Result<(), RestError> {
        let unavailable = |e: sqlx::Error| {
            tracing::Span::current().record("result", "error");
            tracing::error!(error = ?e, "Acceptance transaction failed");
            RestError::TemporarilyUnavailable
        };

        let mut tx = self.begin().await.map_err(unavailable)?;

        let accepted = sqlx::query(
            "UPDATE bid SET status = 'accepted', relationship_id = $3 \
             WHERE id = $2 AND ask_id = $1 AND status = 'pending'",
        )
        .bind(acceptance.ask_id)
        .bind(acceptance.bid_id)
        .bind(acceptance.relationship.id)
        .execute(&mut *tx)
        .await
        .map_err(unavailable)?;
        if accepted.rows_affected() != 1 {
            return Err(RestError::AlreadyResolved);
        }

        sqlx::query("UPDATE bid SET status = 'rejected' WHERE ask_id = $1 AND id != $2")
            .bind(acceptance.ask_id)
            .bind(acceptance.bid_id)
            .execute(&mut *tx)
            .await
            .map_err(unavailable)?;

        let completed = sqlx::query(
            "UPDATE ask SET status = 'completed' WHERE id = $1 AND status = 'active'",
        )
        .bind(acceptance.ask_id)
        .execute(&mut *tx)
        .await
        .map_err(unavailable)?;
        if completed.rows_affected() != 1 {
            return Err(RestError::AlreadyResolved);
        }

        let relationship = &acceptance.relationship;
        sqlx::query(
            "INSERT INTO relationship (id, code, requester, requester_name, provider, \
             provider_name, ask_id, bid_id, status, payment_kind, payment_amount, \
             pair_sequence, expires_at, created_at, last_activity_at, unread_requester, \
             unread_provider) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17)",
        )
        .bind(relationship.id)
        .bind(&relationship.code)
        .bind(relationship.requester)
        .bind(&relationship.requester_name)
        .bind(relationship.provider)
        .bind(&relationship.provider_name)
        .bind(relationship.ask_id)
        .bind(relationship.bid_id)
        .bind(&relationship.status)
        .bind(&relationship.payment_kind)
        .bind(relationship.payment_amount)
        .bind(relationship.pair_sequence)
        .bind(relationship.expires_at)
        .bind(relationship.created_at)
        .bind(relationship.last_activity_at)
        .bind(relationship.unread_requester)
        .bind(relationship.unread_provider)
        .execute(&mut *tx)
        .await
        .map_err(unavailable)?;

        let reveal = &acceptance.contact_reveal;
        sqlx::query(
            "INSERT INTO contact_reveal (id, ask_id, bid_id, requester, provider, name, email, \
             phone, revealed_at) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)",
        )
        .bind(reveal.id)
        .bind(reveal.ask_id)
        .bind(reveal.bid_id)
        .bind(reveal.requester)
        .bind(reveal.provider)
        .bind(&reveal.name)
        .bind(&reveal.email)
        .bind(&reveal.phone)
        .bind(reveal.revealed_at)
        .execute(&mut *tx)
        .await
        .map_err(unavailable)?;

        tx.commit().await.map_err(unavailable)
    }

    #[instrument(
        target = "metrics",
        name = "db_archive_ask",
        fields(category = "db_queries", result = "success", name = "archive_ask"),
        skip_all
    )]
    async fn archive_ask(
        &self,
        ask_id: entities::AskId,
        archived_at: PrimitiveDateTime,
    ) -> anyhow::Result<()> {
        sqlx::query(
            "UPDATE ask SET archived_at = $2 \
             WHERE id = $1 AND status = 'completed' AND archived_at IS NULL",
        )
        .bind(ask_id)
        .bind(archived_at)
        .execute(self)
        .await
        .inspect_err(|_| {
            tracing::Span::current().record("result", "error");
        })?;
        Ok(())
    }

    #[instrument(
        target = "metrics",
        name = "db_expire_asks",
        fields(category = "db_queries", result = "success", name = "expire_asks"),
        skip_all
    )]
    async fn expire_asks(&self, now: PrimitiveDateTime) -> anyhow::Result<Vec<entities::AskId>> {
        let rows: Vec<(Uuid,)> = sqlx::query_as(
            "UPDATE ask SET status = 'expired' \
             WHERE status = 'active' AND archived_at IS NULL \
             AND auction_ends_at IS NOT NULL AND auction_ends_at <= $1 \
             RETURNING id",
        )
        .bind(now)
        .fetch_all(self)
        .await
        .inspect_err(|_| {
            tracing::Span::current().record("result", "error");
        })?;
        Ok(rows.into_iter().map(|(id,)| id).collect())
    }

    #[instrument(
        target = "metrics",
        name = "db_get_profile",
        fields(category = "db_queries", result = "success", name = "get_profile"),
        skip_all
    )]
    async fn get_profile(&self, user_id: UserId) -> Result<Option<Profile>, RestError> {
        sqlx::query_as::<_, Profile>("SELECT id, name, email, phone FROM profile WHERE id = $1")
            .bind(user_id)
            .fetch_optional(self)
            .await
            .map_err(|e| {
                tracing::Span::current().record("result", "error");
                tracing::error!(error = ?e, "Failed to get profile from db");
                RestError::TemporarilyUnavailable
            })
    }
}
