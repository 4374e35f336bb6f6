#[cfg(test)]
use mockall::automock;
use {
    super::super::entities,
    crate::{
        api::RestError,
        auction::{
            entities::{
                AskId,
                CompensationKind as EntityCompensationKind,
            },
            repository::{
                primitive,
                CompensationKind,
            },
        },
        kernel::{
            db::DB,
            entities::UserId,
        },
    },
    anyhow::anyhow,
    axum::async_trait,
    sqlx::FromRow,
    std::fmt::Debug,
    time::PrimitiveDateTime,
    tracing::instrument,
    uuid::Uuid,
};

#[derive(Clone, Debug, PartialEq, sqlx::Type)]
#[sqlx(type_name = "relationship_status", rename_all = "lowercase")]
pub enum RelationshipStatus {
    Active,
    Completed,
    Expired,
    Cancelled,
}

#[derive(Clone, FromRow, Debug)]
pub struct Relationship {
    pub id:             entities::RelationshipId,
    pub code:           String,
    pub requester:      Uuid,
    pub requester_name: String,
    pub provider:       Uuid,
    pub provider_name:  String,
    pub ask_id:         AskId,
    pub bid_id:         Uuid,
    pub status:         RelationshipStatus,
    pub payment_kind:   CompensationKind,
    pub payment_amount: i64,
    pub pair_sequence:  i32,
    pub expires_at:     Option<PrimitiveDateTime>,
    pub created_at:     PrimitiveDateTime,
    pub last_activity_at: PrimitiveDateTime,
    pub unread_requester: i32,
    pub unread_provider:  i32,
}

impl Relationship {
    pub fn new(relationship: &entities::Relationship) -> Self {
        Self {
            id: relationship.id,
            code: relationship.code.clone(),
            requester: relationship.requester,
            requester_name: relationship.requester_name.clone(),
            provider: relationship.provider,
            provider_name: relationship.provider_name.clone(),
            ask_id: relationship.ask_id,
            bid_id: relationship.bid_id,
            status: match relationship.status {
                entities::RelationshipStatus::Active => RelationshipStatus::Active,
                entities::RelationshipStatus::Completed => RelationshipStatus::Completed,
                entities::RelationshipStatus::Expired => RelationshipStatus::Expired,
                entities::RelationshipStatus::Cancelled => RelationshipStatus::Cancelled,
            },
            payment_kind: match relationship.payment.kind {
                EntityCompensationKind::Hourly => CompensationKind::Hourly,
                EntityCompensationKind::PerUnit => CompensationKind::PerUnit,
                EntityCompensationKind::Flat => CompensationKind::Flat,
            },
            payment_amount: relationship.payment.amount,
            pair_sequence: relationship.pair_sequence,
            expires_at: relationship.expires_at.map(primitive),
            created_at: primitive(relationship.created_at),
            last_activity_at: primitive(relationship.last_activity_at),
            unread_requester: relationship.unread_requester,
            unread_provider: relationship.unread_provider,
        }
    }

    pub fn get_relationship_entity(&self) -> entities::Relationship {
        entities::Relationship {
            id: self.id,
            code: self.code.clone(),
            requester: self.requester,
            requester_name: self.requester_name.clone(),
            provider: self.provider,
            provider_name: self.provider_name.clone(),
            ask_id: self.ask_id,
            bid_id: self.bid_id,
            status: match self.status {
                RelationshipStatus::Active => entities::RelationshipStatus::Active,
                RelationshipStatus::Completed => entities::RelationshipStatus::Completed,
                RelationshipStatus::Expired => entities::RelationshipStatus::Expired,
                RelationshipStatus::Cancelled => entities::RelationshipStatus::Cancelled,
            },
            payment: entities::PaymentTerms {
                kind:   match self.payment_kind {
                    CompensationKind::Hourly => EntityCompensationKind::Hourly,
                    CompensationKind::PerUnit => EntityCompensationKind::PerUnit,
                    CompensationKind::Flat => EntityCompensationKind::Flat,
                },
                amount: self.payment_amount,
            },
            pair_sequence: self.pair_sequence,
            expires_at: self.expires_at.map(|at| at.assume_utc()),
            created_at: self.created_at.assume_utc(),
            last_activity_at: self.last_activity_at.assume_utc(),
            unread_requester: self.unread_requester,
            unread_provider: self.unread_provider,
        }
    }
}

#[derive(Clone, FromRow, Debug)]
pub struct ContactReveal {
    pub id:          Uuid,
    pub ask_id:      AskId,
    pub bid_id:      Uuid,
    pub requester:   Uuid,
    pub provider:    Uuid,
    pub name:        String,
    pub email:       String,
    pub phone:       String,
    pub revealed_at: PrimitiveDateTime,
}

impl ContactReveal {
    pub fn new(reveal: &entities::ContactReveal) -> Self {
        Self {
            id:          reveal.id,
            ask_id:      reveal.ask_id,
            bid_id:      reveal.bid_id,
            requester:   reveal.requester,
            provider:    reveal.provider,
            name:        reveal.name.clone(),
            email:       reveal.email.to_string(),
            phone:       reveal.phone.clone(),
            revealed_at: primitive(reveal.revealed_at),
        }
    }

    pub fn get_contact_reveal_entity(&self) -> anyhow::Result<entities::ContactReveal> {
        Ok(entities::ContactReveal {
            id: self.id,
            ask_id: self.ask_id,
            bid_id: self.bid_id,
            requester: self.requester,
            provider: self.provider,
            name: self.name.clone(),
            email: self
                .email
                .parse()
                .map_err(|e| anyhow!("reveal {} has an invalid email: {}", self.id, e))?,
            phone: self.phone.clone(),
            revealed_at: self.revealed_at.assume_utc(),
        })
    }
}

#[cfg_attr(test, automock)]
#[async_trait]
pub trait Database: Debug + Send + Sync + 'static {
    /// The highest per-pair sequence between the two identities, in either
    /// role order.
    async fn get_highest_pair_sequence(
        &self,
        party_a: UserId,
        party_b: UserId,
    ) -> anyhow::Result<Option<i32>>;
    async fn get_relationships(&self, user: UserId) -> Result<Vec<Relationship>, RestError>;
    async fn get_contact_reveal(&self, ask_id: AskId) -> Result<Option<ContactReveal>, RestError>;
    async fn expire_relationships(
        &self,
        now: PrimitiveDateTime,
    ) -> anyhow::Result<Vec<entities::RelationshipId>>;
}

#[async_trait]
impl Database for DB {
    #[instrument(
        target = "metrics",
        name = "db_get_highest_pair_sequence",
        fields(category = "db_queries", result = "success", name = "get_highest_pair_sequence"),
        skip_all
    )]
    async fn get_highest_pair_sequence(
        &self,
        party_a: UserId,
        party_b: UserId,
    ) -> anyhow::Result<Option<i32>> {
        let row: (Option<i32>,) = sqlx::query_as(
            "SELECT MAX(pair_sequence) FROM relationship \
             WHERE (requester = $1 AND provider = $2) OR (requester = $2 AND provider = $1)",
        )
        .bind(party_a)
        .bind(party_b)
        .fetch_one(self)
        .await
        .inspect_err(|_| {
            tracing::Span::current().record("result", "error");
        })?;
        Ok(row.0)
    }

    #[instrument(
        target = "metrics",
        name = "db_get_relationships",
        fields(category = "db_queries", result = "success", name = "get_relationships"),
        skip_all
    )]
    async fn get_relationships(&self, user: UserId) -> Result<Vec<Relationship>, RestError> {
        sqlx::query_as::<_, Relationship>(
            "SELECT * FROM relationship WHERE requester = $1 OR provider = $1 \
             ORDER BY created_at DESC",
        )
        .bind(user)
        .fetch_all(self)
        .await
        .map_err(|e| {
            tracing::Span::current().record("result", "error");
            tracing::error!(error = ?e, "Failed to get relationships from db");
            RestError::TemporarilyUnavailable
        })
    }

    #[instrument(
        target = "metrics",
        name = "db_get_contact_reveal",
        fields(category = "db_queries", result = "success", name = "get_contact_reveal"),
        skip_all
    )]
    async fn get_contact_reveal(
        &self,
        ask_id: AskId,
    ) -> Result<Option<ContactReveal>, RestError> {
        sqlx::query_as::<_, ContactReveal>("SELECT * FROM contact_reveal WHERE ask_id = $1")
            .bind(ask_id)
            .fetch_optional(self)
            .await
            .map_err(|e| {
                tracing::Span::current().record("result", "error");
                tracing::error!(error = ?e, "Failed to get contact reveal from db");
                RestError::TemporarilyUnavailable
            })
    }

    #[instrument(
        target = "metrics",
        name = "db_expire_relationships",
        fields(category = "db_queries", result = "success", name = "expire_relationships"),
        skip_all
    )]
    async fn expire_relationships(
        &self,
        now: PrimitiveDateTime,
    ) -> anyhow::Result<Vec<entities::RelationshipId>> {
        let rows: Vec<(Uuid,)> = sqlx::query_as(
            "UPDATE relationship SET status = 'expired' \
             WHERE status = 'active' AND expires_at IS NOT NULL AND expires_at <= $1 \
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
}
