use {
    crate::{
        AccessLevel,
        RouteTrait,
        UserId,
    },
    serde::{
        Deserialize,
        Serialize,
    },
    strum::AsRefStr,
    time::{
        Date,
        OffsetDateTime,
    },
    utoipa::{
        IntoParams,
        ToResponse,
        ToSchema,
    },
    uuid::Uuid,
};

pub type AskId = Uuid;

/// How the requester pays for the service once a bid is accepted.
#[derive(Serialize, Deserialize, ToSchema, Clone, Copy, PartialEq, Debug)]
#[serde(rename_all = "snake_case")]
pub enum CompensationKind {
    Hourly,
    PerUnit,
    Flat,
}

#[derive(Serialize, Deserialize, ToSchema, Clone, PartialEq, Debug)]
pub struct Compensation {
    pub kind:   CompensationKind,
    /// Offered amount in minor currency units. Must be positive.
    #[schema(example = 100)]
    pub amount: i64,
}

/// When the service is needed. Exactly one variant is ever populated.
#[derive(Serialize, Deserialize, ToSchema, Clone, PartialEq, Debug)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Schedule {
    #[schema(title = "SingleDate")]
    SingleDate {
        #[schema(example = "2025-06-01", value_type = String)]
        date: Date,
    },
    #[schema(title = "DateRange")]
    DateRange {
        #[schema(example = "2025-06-01", value_type = String)]
        start: Date,
        #[schema(example = "2025-06-14", value_type = String)]
        end:   Date,
    },
    /// A named term such as "Summer 2025"; no calendar bound is derived.
    #[schema(title = "Term")]
    Term {
        #[schema(example = "Summer 2025")]
        name: String,
    },
}

#[derive(Serialize, Deserialize, ToSchema, Clone, Copy, PartialEq, Debug)]
#[serde(rename_all = "snake_case")]
pub enum AskStatus {
    Active,
    Completed,
    Expired,
}

#[derive(Serialize, Deserialize, ToSchema, Clone, Debug)]
pub struct AskCreate {
    pub compensation: Compensation,
    pub schedule:     Schedule,
    #[schema(example = "Two sessions a week, flexible on timing.")]
    pub requirements: String,
    /// End of the bidding window. Asks without one stay open until accepted.
    #[schema(example = "2025-05-23T21:26:57Z", value_type = Option<String>)]
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub auction_ends_at: Option<OffsetDateTime>,
}

#[derive(Serialize, Deserialize, ToSchema, ToResponse, Clone, PartialEq, Debug)]
pub struct Ask {
    #[schema(example = "obo3ee3e-58cc-4372-a567-0e02b2c3d479", value_type = String)]
    pub id:           AskId,
    #[schema(value_type = String)]
    pub owner:        UserId,
    pub compensation: Compensation,
    pub schedule:     Schedule,
    pub requirements: String,
    #[schema(value_type = Option<String>)]
    #[serde(with = "time::serde::rfc3339::option")]
    pub auction_ends_at: Option<OffsetDateTime>,
    pub status:       AskStatus,
    /// Set when less than a day remains on the bidding window.
    pub last_day:     bool,
    pub archived:     bool,
    #[schema(value_type = String)]
    #[serde(with = "time::serde::rfc3339")]
    pub created_at:   OffsetDateTime,
}

#[derive(Serialize, Deserialize, ToResponse, ToSchema, Clone)]
pub struct Asks {
    pub items: Vec<Ask>,
}

/// Aggregates over the pending bids of one ask.
#[derive(Serialize, Deserialize, ToSchema, ToResponse, Clone, PartialEq, Debug)]
pub struct AskStatistics {
    pub count:   u64,
    #[schema(example = 80)]
    pub lowest:  Option<i64>,
    #[schema(example = 85.0)]
    pub average: Option<f64>,
}

#[derive(Serialize, Deserialize, IntoParams, Clone)]
pub struct AskPathParams {
    #[param(example = "obo3ee3e-58cc-4372-a567-0e02b2c3d479", value_type = String)]
    pub ask_id: AskId,
}

#[derive(AsRefStr, Clone)]
#[strum(prefix = "/")]
pub enum Route {
    #[strum(serialize = "")]
    PostAsk,
    #[strum(serialize = "")]
    GetAsks,
    #[strum(serialize = ":ask_id")]
    GetAsk,
    #[strum(serialize = ":ask_id/statistics")]
    GetAskStatistics,
    #[strum(serialize = ":ask_id/archive")]
    PostArchiveAsk,
    #[strum(serialize = ":ask_id/reveal")]
    GetContactReveal,
}

impl RouteTrait for Route {
    fn access_level(&self) -> AccessLevel {
        match self {
            Route::PostAsk => AccessLevel::LoggedIn,
            Route::GetAsks => AccessLevel::Public,
            Route::GetAsk => AccessLevel::Public,
            Route::GetAskStatistics => AccessLevel::Public,
            Route::PostArchiveAsk => AccessLevel::LoggedIn,
            Route::GetContactReveal => AccessLevel::LoggedIn,
        }
    }

    fn method(&self) -> http::Method {
        match self {
            Route::PostAsk => http::Method::POST,
            Route::GetAsks => http::Method::GET,
            Route::GetAsk => http::Method::GET,
            Route::GetAskStatistics => http::Method::GET,
            Route::PostArchiveAsk => http::Method::POST,
            Route::GetContactReveal => http::Method::GET,
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
