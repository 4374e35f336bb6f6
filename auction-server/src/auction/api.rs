use {
    super::{
        entities,
        service::{
            accept_bid::AcceptBidInput,
            archive_ask::ArchiveAskInput,
            get_active_bid::GetActiveBidInput,
            get_ask::GetAskInput,
            get_bid_statistics::GetBidStatisticsInput,
            get_bids::GetBidsInput,
            place_bid::PlaceBidInput,
            post_ask::PostAskInput,
        },
    },
    crate::{
        api::{
            Auth,
            RestError,
            WrappedRouter,
        },
        relationship::api::to_api_relationship,
        state::StoreNew,
    },
    ask_auction_api_types::{
        ask::{
            Ask,
            AskCreate,
            AskPathParams,
            AskStatistics,
            AskStatus,
            Asks,
            CompensationKind,
            Route as AskRoute,
            Schedule,
        },
        bid::{
            Bid,
            BidCreate,
            BidPathParams,
            BidResult,
            BidStatus,
            Bids,
            Route as BidRoute,
        },
        relationship::Relationship,
        ErrorBodyResponse,
    },
    axum::{
        extract::{
            Path,
            State,
        },
        Json,
        Router,
    },
    std::sync::Arc,
    time::OffsetDateTime,
};

impl From<CompensationKind> for entities::CompensationKind {
    fn from(kind: CompensationKind) -> Self {
        match kind {
            CompensationKind::Hourly => entities::CompensationKind::Hourly,
            CompensationKind::PerUnit => entities::CompensationKind::PerUnit,
            CompensationKind::Flat => entities::CompensationKind::Flat,
        }
    }
}

impl From<entities::CompensationKind> for CompensationKind {
    fn from(kind: entities::CompensationKind) -> Self {
        match kind {
            entities::CompensationKind::Hourly => CompensationKind::Hourly,
            entities::CompensationKind::PerUnit => CompensationKind::PerUnit,
            entities::CompensationKind::Flat => CompensationKind::Flat,
        }
    }
}

impl From<Schedule> for entities::Schedule {
    fn from(schedule: Schedule) -> Self {
        match schedule {
            Schedule::SingleDate { date } => entities::Schedule::SingleDate(date),
            Schedule::DateRange { start, end } => entities::Schedule::DateRange { start, end },
            Schedule::Term { name } => entities::Schedule::Term(name),
        }
    }
}

impl From<entities::Schedule> for Schedule {
    fn from(schedule: entities::Schedule) -> Self {
        match schedule {
            entities::Schedule::SingleDate(date) => Schedule::SingleDate { date },
            entities::Schedule::DateRange { start, end } => Schedule::DateRange { start, end },
            entities::Schedule::Term(name) => Schedule::Term { name },
        }
    }
}

pub fn to_api_ask(ask: &entities::Ask, now: OffsetDateTime) -> Ask {
    Ask {
        id: ask.id,
        owner: ask.owner,
        compensation: ask_auction_api_types::ask::Compensation {
            kind:   ask.compensation.kind.into(),
            amount: ask.compensation.amount,
        },
        schedule: ask.schedule.clone().into(),
        requirements: ask.requirements.clone(),
        auction_ends_at: ask.auction_ends_at,
        status: match ask.status {
            entities::AskStatus::Active => AskStatus::Active,
            entities::AskStatus::Completed => AskStatus::Completed,
            entities::AskStatus::Expired => AskStatus::Expired,
        },
        last_day: ask.is_last_day(now),
        archived: ask.archived_at.is_some(),
        created_at: ask.created_at,
    }
}

pub fn to_api_bid_status(status: &entities::BidStatus) -> BidStatus {
    match status {
        entities::BidStatus::Pending => BidStatus::Pending,
        entities::BidStatus::Accepted { relationship_id } => BidStatus::Accepted {
            relationship_id: *relationship_id,
        },
        entities::BidStatus::Rejected => BidStatus::Rejected,
    }
}

pub fn to_api_bid(bid: &entities::Bid, superseded: bool) -> Bid {
    Bid {
        id: bid.id,
        ask_id: bid.ask_id,
        bidder: bid.bidder,
        bidder_name: bid.bidder_name.clone(),
        amount: bid.amount,
        pitch: bid.pitch.clone(),
        status: to_api_bid_status(&bid.status),
        superseded,
        submitted_at: bid.submitted_at,
    }
}

/// Post a new ask.
///
/// Opens a reverse auction: bidders undercut each other until the window
/// closes or the owner accepts an offer.
#[utoipa::path(post, path = "/v1/asks", request_body = AskCreate, responses(
    (status = 200, description = "The posted ask", body = Ask),
    (status = 400, response = ErrorBodyResponse),
),)]
pub async fn post_ask(
    auth: Auth,
    State(store): State<Arc<StoreNew>>,
    Json(params): Json<AskCreate>,
) -> Result<Json<Ask>, RestError> {
    let owner = auth.user_id()?;
    let ask = store
        .auction_service
        .post_ask(PostAskInput {
            owner,
            compensation: entities::Compensation {
                kind:   params.compensation.kind.into(),
                amount: params.compensation.amount,
            },
            schedule: params.schedule.into(),
            requirements: params.requirements,
            auction_ends_at: params.auction_ends_at,
        })
        .await?;
    Ok(Json(to_api_ask(&ask, store.auction_service.now())))
}

/// List the non-archived asks.
#[utoipa::path(get, path = "/v1/asks", responses(
    (status = 200, description = "The current asks", body = Asks),
),)]
pub async fn get_asks(State(store): State<Arc<StoreNew>>) -> Result<Json<Asks>, RestError> {
    let now = store.auction_service.now();
    let asks = store.auction_service.get_asks().await?;
    Ok(Json(Asks {
        items: asks.iter().map(|ask| to_api_ask(ask, now)).collect(),
    }))
}

/// Fetch one ask.
#[utoipa::path(get, path = "/v1/asks/{ask_id}", params(AskPathParams), responses(
    (status = 200, description = "The ask", body = Ask),
    (status = 404, description = "Ask was not found", body = ErrorBodyResponse),
),)]
pub async fn get_ask(
    State(store): State<Arc<StoreNew>>,
    Path(params): Path<AskPathParams>,
) -> Result<Json<Ask>, RestError> {
    let ask = store
        .auction_service
        .get_ask(GetAskInput {
            ask_id: params.ask_id,
        })
        .await?;
    Ok(Json(to_api_ask(&ask, store.auction_service.now())))
}

/// Aggregates over the pending bids of an ask.
#[utoipa::path(get, path = "/v1/asks/{ask_id}/statistics", params(AskPathParams), responses(
    (status = 200, description = "Count, lowest and average of the pending bids", body = AskStatistics),
    (status = 404, description = "Ask was not found", body = ErrorBodyResponse),
),)]
pub async fn get_ask_statistics(
    State(store): State<Arc<StoreNew>>,
    Path(params): Path<AskPathParams>,
) -> Result<Json<AskStatistics>, RestError> {
    let statistics = store
        .auction_service
        .get_bid_statistics(GetBidStatisticsInput {
            ask_id: params.ask_id,
        })
        .await?;
    Ok(Json(AskStatistics {
        count:   statistics.count,
        lowest:  statistics.lowest,
        average: statistics.average,
    }))
}

/// Bid on an ask.
///
/// This is a reverse auction: the convention is to undercut the lowest
/// pending offer, and a bid landing in the closing minute stretches the
/// window. Re-bidding supersedes your earlier offer for acceptance.
#[utoipa::path(post, path = "/v1/asks/{ask_id}/bids", params(AskPathParams), request_body = BidCreate, responses(
    (status = 200, description = "Bid was placed successfully", body = BidResult),
    (status = 404, description = "Ask was not found", body = ErrorBodyResponse),
    (status = 409, description = "Auction is closed", body = ErrorBodyResponse),
),)]
pub async fn post_bid(
    auth: Auth,
    State(store): State<Arc<StoreNew>>,
    Path(params): Path<AskPathParams>,
    Json(bid_create): Json<BidCreate>,
) -> Result<Json<BidResult>, RestError> {
    process_bid(auth, store, params.ask_id, bid_create)
        .await
        .map(Json)
}

pub async fn process_bid(
    auth: Auth,
    store: Arc<StoreNew>,
    ask_id: entities::AskId,
    bid_create: BidCreate,
) -> Result<BidResult, RestError> {
    let bidder = auth.user_id()?;
    let bid = store
        .auction_service
        .place_bid(PlaceBidInput {
            ask_id,
            bidder,
            amount: bid_create.amount,
            pitch: bid_create.pitch,
        })
        .await?;
    Ok(BidResult {
        status: "OK".to_string(),
        id:     bid.id,
    })
}

/// The ledger of an ask, newest first, with supersession flags.
#[utoipa::path(get, path = "/v1/asks/{ask_id}/bids", params(AskPathParams), responses(
    (status = 200, description = "The bids of the ask", body = Bids),
    (status = 404, description = "Ask was not found", body = ErrorBodyResponse),
),)]
pub async fn get_bids(
    State(store): State<Arc<StoreNew>>,
    Path(params): Path<AskPathParams>,
) -> Result<Json<Bids>, RestError> {
    let bids = store
        .auction_service
        .get_bids(GetBidsInput {
            ask_id: params.ask_id,
        })
        .await?;
    Ok(Json(Bids {
        items: bids
            .iter()
            .map(|bid| to_api_bid(bid, entities::is_superseded(&bids, bid)))
            .collect(),
    }))
}

/// The caller's most recent bid on the ask, superseding any earlier ones.
#[utoipa::path(get, path = "/v1/asks/{ask_id}/bids/active", params(AskPathParams), responses(
    (status = 200, description = "The caller's active bid; null when they never bid", body = Bid),
    (status = 404, description = "Ask was not found", body = ErrorBodyResponse),
),)]
pub async fn get_active_bid(
    auth: Auth,
    State(store): State<Arc<StoreNew>>,
    Path(params): Path<AskPathParams>,
) -> Result<Json<Option<Bid>>, RestError> {
    let bidder = auth.user_id()?;
    let bid = store
        .auction_service
        .get_active_bid(GetActiveBidInput {
            ask_id: params.ask_id,
            bidder,
        })
        .await?;
    Ok(Json(bid.map(|bid| to_api_bid(&bid, false))))
}

/// Accept a bid, closing the auction.
///
/// Atomically rejects every rival bid, completes the ask, forms the
/// relationship and reveals the winner's contact card to you. Safe to retry:
/// a second call reports the auction as already resolved.
#[utoipa::path(post, path = "/v1/asks/{ask_id}/bids/{bid_id}/accept", params(BidPathParams), responses(
    (status = 200, description = "The relationship formed by the acceptance", body = Relationship),
    (status = 403, description = "Only the ask owner accepts bids", body = ErrorBodyResponse),
    (status = 404, description = "Ask or bid was not found", body = ErrorBodyResponse),
    (status = 409, description = "The auction was already resolved", body = ErrorBodyResponse),
),)]
pub async fn post_accept_bid(
    auth: Auth,
    State(store): State<Arc<StoreNew>>,
    Path(params): Path<BidPathParams>,
) -> Result<Json<Relationship>, RestError> {
    let actor = auth.user_id()?;
    let relationship = store
        .auction_service
        .accept_bid(AcceptBidInput {
            ask_id: params.ask_id,
            bid_id: params.bid_id,
            actor,
        })
        .await?;
    Ok(Json(to_api_relationship(&relationship)))
}

/// Archive a completed ask.
#[utoipa::path(post, path = "/v1/asks/{ask_id}/archive", params(AskPathParams), responses(
    (status = 200, description = "Ask was archived"),
    (status = 400, response = ErrorBodyResponse),
    (status = 403, description = "Only the ask owner archives it", body = ErrorBodyResponse),
    (status = 404, description = "Ask was not found", body = ErrorBodyResponse),
),)]
pub async fn post_archive_ask(
    auth: Auth,
    State(store): State<Arc<StoreNew>>,
    Path(params): Path<AskPathParams>,
) -> Result<(), RestError> {
    let actor = auth.user_id()?;
    store
        .auction_service
        .archive_ask(ArchiveAskInput {
            ask_id: params.ask_id,
            actor,
        })
        .await
}

pub fn get_routes(store: Arc<StoreNew>) -> Router<Arc<StoreNew>> {
    WrappedRouter::new(store)
        .route(AskRoute::PostAsk, post_ask)
        .route(AskRoute::GetAsks, get_asks)
        .route(AskRoute::GetAsk, get_ask)
        .route(AskRoute::GetAskStatistics, get_ask_statistics)
        .route(AskRoute::PostArchiveAsk, post_archive_ask)
        .route(BidRoute::PostBid, post_bid)
        .route(BidRoute::GetBids, get_bids)
        .route(BidRoute::GetActiveBid, get_active_bid)
        .route(BidRoute::PostAcceptBid, post_accept_bid)
        .router
}
