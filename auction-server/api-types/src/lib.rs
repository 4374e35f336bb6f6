use {
    serde::{
        Deserialize,
        Serialize,
    },
    strum::AsRefStr,
    utoipa::{
        ToResponse,
        ToSchema,
    },
    uuid::Uuid,
};

pub mod ask;
pub mod bid;
pub mod relationship;
pub mod ws;

pub type UserId = Uuid;

#[derive(ToResponse, ToSchema, Serialize, Deserialize)]
#[response(description = "An error occurred processing the request")]
pub struct ErrorBodyResponse {
    pub error: String,
}

#[derive(AsRefStr)]
#[strum(prefix = "/")]
pub enum Route {
    #[strum(serialize = "v1")]
    V1,
    #[strum(serialize = "asks")]
    Ask,
    #[strum(serialize = "relationships")]
    Relationship,
    #[strum(serialize = "")]
    Root,
    #[strum(serialize = "live")]
    Liveness,
    #[strum(serialize = "docs")]
    Docs,
    #[strum(serialize = "docs/openapi.json")]
    OpenApi,
}

#[derive(PartialEq)]
pub enum AccessLevel {
    LoggedIn,
    Public,
}

pub trait RouteTrait: AsRef<str> + Clone {
    fn access_level(&self) -> AccessLevel;
    fn method(&self) -> http::Method;
    fn full_path(&self) -> String;
}
