use {
    crate::{
        ask::AskId,
        relationship::RelationshipId,
        AccessLevel,
        RouteTrait,
        UserId,
    },
    serde::{
        Deserialize,
        Serialize,
    },
    strum::AsRefStr,
    time::OffsetDateTime,
    utoipa::{
        IntoParams,
        ToResponse,
        ToSchema,
    },
    uuid::Uuid,
};

pub type BidId = Uuid;

#[derive(Serialize, Deserialize, ToSchema, Clone, PartialEq, Debug)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum BidStatus {
    /// The bid is live and can still win the auction.
    #[schema(title = "Pending")]
    Pending,
    /// The requester accepted this bid; the referenced relationship was formed.
    #[schema(title = "Accepted")]
    Accepted {
        #[schema(example = "obo3ee3e-58cc-4372-a567-0e02b2c3d479", value_type = String)]
        relationship_id: RelationshipId,
    },
    /// Another bid was accepted, or the ask was resolved without this bid.
    #[schema(title = "Rejected")]
    Rejected,
}

#[derive(Serialize, Deserialize, ToSchema, ToResponse, Clone, PartialEq, Debug)]
pub struct Bid {
    #[schema(example = "obo3ee3e-58cc-4372-a567-0e02b2c3d479", value_type = String)]
    pub id:          BidId,
    #[schema(value_type = String)]
    pub ask_id:      AskId,
    #[schema(value_type = String)]
    pub bidder:      UserId,
    #[schema(example = "John Doe")]
    pub bidder_name: String,
    #[schema(example = 80)]
    pub amount:      i64,
    pub pitch:       String,
    pub status:      BidStatus,
    /// The same bidder placed a newer bid; only that one is considered for
    /// acceptance. Computed, never stored.
    pub superseded:  bool,
    #[schema(value_type = String)]
    #[serde(with = "time::serde::rfc3339")]
    pub submitted_at: OffsetDateTime,
}

#[derive(Serialize, Deserialize, ToSchema, Clone, Debug)]
pub struct BidCreate {
    #[schema(example = 80)]
    pub amount: i64,
    #[schema(example = "Certified, available both weeks.")]
    pub pitch:  String,
}

#[derive(Serialize, Deserialize, ToResponse, ToSchema, Clone, Debug)]
pub struct BidResult {
    #[schema(example = "OK")]
    pub status: String,
    /// The id of the created bid.
    #[schema(example = "beedbeed-58cc-4372-a567-0e02b2c3d479", value_type = String)]
    pub id:     BidId,
}

/// The status carried by every bid update on the websocket stream.
#[derive(Serialize, Deserialize, ToSchema, Clone, PartialEq, Debug)]
pub struct BidStatusWithId {
    #[schema(value_type = String)]
    pub id:         BidId,
    pub bid_status: BidStatus,
}

#[derive(Serialize, Deserialize, ToResponse, ToSchema, Clone)]
pub struct Bids {
    pub items: Vec<Bid>,
}

#[derive(Serialize, Deserialize, IntoParams, Clone)]
pub struct BidPathParams {
    #[param(example = "obo3ee3e-58cc-4372-a567-0e02b2c3d479", value_type = String)]
    pub ask_id: AskId,
    #[param(example = "beedbeed-58cc-4372-a567-0e02b2c3d479", value_type = String)]
    pub bid_id: BidId,
}

#[derive(AsRefStr, Clone)]
#[strum(prefix = "/")]
pub enum Route {
    #[strum(serialize = ":ask_id/bids")]
    PostBid,
    #[strum(serialize = ":ask_id/bids")]
    GetBids,
    #[strum(serialize = ":ask_id/bids/active")]
    GetActiveBid,
    #[strum(serialize = ":ask_id/bids/:bid_id/accept")]
    PostAcceptBid,
}

impl RouteTrait for Route {
    fn access_level(&self) -> AccessLevel {
        match self {
            Route::PostBid => AccessLevel::LoggedIn,
            Route::GetBids => AccessLevel::Public,
            Route::GetActiveBid => AccessLevel::LoggedIn,
            Route::PostAcceptBid => AccessLevel::LoggedIn,
        }
    }

    fn method(&self) -> http::Method {
        match self {
            Route::PostBid => http::Method::POST,
            Route::GetBids => http::Method::GET,
            Route::GetActiveBid => http::Method::GET,
            Route::PostAcceptBid => http::Method::POST,
        }
    }

    fn full_path(&self) -> String {
        let path = format!(
            "{}{}{}",
            crate::Route::V1.as_ref(),
            crate::Route::Ask.as_ref(),
            self.as_ref()
        );
        path.trim_end_matches('/').to_string()
    }
}
