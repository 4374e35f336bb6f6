use {
    crate::{
        ask::{
            Ask,
            AskId,
        },
        bid::{
            Bid,
            BidCreate,
            BidResult,
            BidStatusWithId,
        },
        relationship::Relationship,
        AccessLevel,
        RouteTrait,
    },
    serde::{
        Deserialize,
        Serialize,
    },
    strum::AsRefStr,
    utoipa::ToSchema,
};

#[derive(Deserialize, Clone, ToSchema, Serialize)]
#[serde(tag = "method", content = "params")]
pub enum ClientMessage {
    /// Watch specific asks. Updates for unwatched asks are not delivered.
    #[serde(rename = "subscribe")]
    Subscribe {
        #[schema(value_type = Vec<String>)]
        ask_ids: Vec<AskId>,
    },
    #[serde(rename = "unsubscribe")]
    Unsubscribe {
        #[schema(value_type = Vec<String>)]
        ask_ids: Vec<AskId>,
    },
    /// Watch the whole ask collection, including asks posted later.
    #[serde(rename = "subscribe_collection")]
    SubscribeCollection,
    #[serde(rename = "unsubscribe_collection")]
    UnsubscribeCollection,
    #[serde(rename = "post_bid")]
    PostBid {
        #[schema(value_type = String)]
        ask_id: AskId,
        bid:    BidCreate,
    },
}

#[derive(Deserialize, Clone, ToSchema, Serialize)]
pub struct ClientRequest {
    pub id:  String,
    #[serde(flatten)]
    pub msg: ClientMessage,
}

/// An update pushed to the client for a subscription it holds. Deliveries are
/// at-least-once; clients re-fetch state on receipt instead of applying the
/// payload as a patch.
#[derive(Serialize, Clone, ToSchema, Deserialize, Debug)]
#[serde(tag = "type")]
pub enum ServerUpdateResponse {
    #[serde(rename = "new_ask")]
    NewAsk { ask: Ask },
    #[serde(rename = "ask_status_update")]
    AskStatusUpdate { ask: Ask },
    #[serde(rename = "new_bid")]
    NewBid { bid: Bid },
    #[serde(rename = "bid_status_update")]
    BidStatusUpdate { status: BidStatusWithId },
    #[serde(rename = "new_relationship")]
    NewRelationship { relationship: Relationship },
}

#[derive(Serialize, Clone, ToSchema, Deserialize, Debug)]
#[serde(untagged)]
pub enum APIResponse {
    BidResult(BidResult),
}

#[derive(Serialize, Clone, ToSchema, Deserialize, Debug)]
#[serde(tag = "status", content = "result")]
pub enum ServerResultMessage {
    #[serde(rename = "success")]
    Success(Option<APIResponse>),
    #[serde(rename = "error")]
    Err(String),
}

/// The result for a specific client request, correlated by id. Id is only
/// None when the client message could not be parsed.
#[derive(Serialize, ToSchema, Deserialize, Clone, Debug)]
pub struct ServerResultResponse {
    pub id:     Option<String>,
    #[serde(flatten)]
    pub result: ServerResultMessage,
}

#[derive(AsRefStr, Clone)]
#[strum(prefix = "/")]
pub enum Route {
    #[strum(serialize = "ws")]
    Ws,
}

impl RouteTrait for Route {
    fn access_level(&self) -> AccessLevel {
        match self {
            Route::Ws => AccessLevel::Public,
        }
    }

    fn method(&self) -> http::Method {
        match self {
            Route::Ws => http::Method::GET,
        }
    }

    fn full_path(&self) -> String {
        let path = format!("{}{}", crate::Route::V1.as_ref(), self.as_ref());
        path.trim_end_matches('/').to_string()
    }
}
