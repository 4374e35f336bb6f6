use {
    crate::{
        ask::{
            AskId,
            CompensationKind,
        },
        bid::BidId,
        AccessLevel,
        RouteTrait,
        UserId,
    },
    email_address::EmailAddress,
    serde::{
        Deserialize,
        Serialize,
    },
    strum::AsRefStr,
    time::OffsetDateTime,
    utoipa::{
        ToResponse,
        ToSchema,
    },
    uuid::Uuid,
};

pub type RelationshipId = Uuid;

#[derive(Serialize, Deserialize, ToSchema, Clone, Copy, PartialEq, Debug)]
#[serde(rename_all = "snake_case")]
pub enum RelationshipStatus {
    Active,
    Completed,
    Expired,
    Cancelled,
}

/// Payment terms frozen at acceptance time.
#[derive(Serialize, Deserialize, ToSchema, Clone, PartialEq, Debug)]
pub struct PaymentTerms {
    pub kind:   CompensationKind,
    #[schema(example = 80)]
    pub amount: i64,
}

#[derive(Serialize, Deserialize, ToSchema, ToResponse, Clone, PartialEq, Debug)]
pub struct Relationship {
    #[schema(example = "obo3ee3e-58cc-4372-a567-0e02b2c3d479", value_type = String)]
    pub id:             RelationshipId,
    /// Human-readable collaboration code, e.g. `JDMS0001`.
    #[schema(example = "JDMS0001")]
    pub code:           String,
    #[schema(value_type = String)]
    pub requester:      UserId,
    pub requester_name: String,
    #[schema(value_type = String)]
    pub provider:       UserId,
    pub provider_name:  String,
    #[schema(value_type = String)]
    pub ask_id:         AskId,
    #[schema(value_type = String)]
    pub bid_id:         BidId,
    pub status:         RelationshipStatus,
    pub payment:        PaymentTerms,
    #[schema(value_type = Option<String>)]
    #[serde(with = "time::serde::rfc3339::option")]
    pub expires_at:     Option<OffsetDateTime>,
    #[schema(value_type = String)]
    #[serde(with = "time::serde::rfc3339")]
    pub created_at:     OffsetDateTime,
}

#[derive(Serialize, Deserialize, ToResponse, ToSchema, Clone)]
pub struct Relationships {
    pub items: Vec<Relationship>,
}

/// The winning bidder's contact card, disclosed to the requester once and
/// frozen as of acceptance time.
#[derive(Serialize, Deserialize, ToSchema, ToResponse, Clone, Debug)]
pub struct ContactReveal {
    #[schema(value_type = String)]
    pub id:          Uuid,
    #[schema(value_type = String)]
    pub ask_id:      AskId,
    #[schema(value_type = String)]
    pub bid_id:      BidId,
    #[schema(example = "John Doe")]
    pub name:        String,
    #[schema(example = "john@example.com", value_type = String)]
    pub email:       EmailAddress,
    #[schema(example = "+15555550100")]
    pub phone:       String,
    #[schema(value_type = String)]
    #[serde(with = "time::serde::rfc3339")]
    pub revealed_at: OffsetDateTime,
}

#[derive(AsRefStr, Clone)]
#[strum(prefix = "/")]
pub enum Route {
    #[strum(serialize = "")]
    GetRelationships,
}

impl RouteTrait for Route {
    fn access_level(&self) -> AccessLevel {
        match self {
            Route::GetRelationships => AccessLevel::LoggedIn,
        }
    }

    fn method(&self) -> http::Method {
        match self {
            Route::GetRelationships => http::Method::GET,
        }
    }

    fn full_path(&self) -> String {
        let path = format!(
            "{}{}{}",
            crate::Route::V1.as_ref(),
            crate::Route::Relationship.as_ref(),
            self.as_ref()
        );
        path.trim_end_matches('/').to_string()
    }
}
