use {
    crate::{
        auction,
        config::RunOptions,
        kernel::entities::UserId,
        relationship,
        server::{
            EXIT_CHECK_INTERVAL,
            SHOULD_EXIT,
        },
        state::StoreNew,
    },
    anyhow::Result,
    ask_auction_api_types::{
        ask::{
            Ask,
            AskCreate,
            AskStatistics,
            AskStatus,
            Asks,
            Compensation,
            CompensationKind,
            Schedule,
        },
        bid::{
            Bid,
            BidCreate,
            BidResult,
            BidStatus,
            BidStatusWithId,
            Bids,
        },
        relationship::{
            ContactReveal,
            PaymentTerms,
            Relationship,
            RelationshipStatus,
            Relationships,
        },
        ws::{
            APIResponse,
            ClientMessage,
            ClientRequest,
            ServerResultMessage,
            ServerResultResponse,
            ServerUpdateResponse,
        },
        ErrorBodyResponse,
        Route,
        RouteTrait,
    },
    axum::{
        async_trait,
        extract::FromRequestParts,
        http::{
            request::Parts,
            Method,
            StatusCode,
        },
        response::{
            IntoResponse,
            Response,
        },
        routing::{
            get,
            post,
        },
        Json,
        Router,
    },
    axum_extra::{
        headers::{
            authorization::Bearer,
            Authorization,
        },
        TypedHeader,
    },
    clap::crate_version,
    std::sync::{
        atomic::Ordering,
        Arc,
    },
    tower_http::cors::CorsLayer,
    utoipa::OpenApi,
    utoipa_redoc::{
        Redoc,
        Servable,
    },
};

pub mod ws;

pub enum RestError {
    /// The request contained invalid parameters.
    BadParameters(String),
    /// The caller presented no usable credential.
    Unauthorized,
    /// The caller is not the owner of the ask.
    NotOwner,
    /// The ask was not found.
    AskNotFound,
    /// The bid was not found.
    BidNotFound,
    /// No contact reveal exists for the ask.
    RevealNotFound,
    /// The bidding window is over, by expiry or by resolution.
    AuctionClosed,
    /// The ask has already been resolved.
    AlreadyResolved,
    /// The requester IP already holds too many websocket connections.
    TooManyOpenWebsocketConnections,
    /// Internal error occurred during processing the request.
    TemporarilyUnavailable,
}

impl RestError {
    pub fn to_status_and_message(&self) -> (StatusCode, String) {
        match self {
            RestError::BadParameters(msg) => {
                (StatusCode::BAD_REQUEST, format!("Bad parameters: {}", msg))
            }
            RestError::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                "Provide a bearer credential to use this endpoint".to_string(),
            ),
            RestError::NotOwner => (
                StatusCode::FORBIDDEN,
                "Only the owner of the ask may do this".to_string(),
            ),
            RestError::AskNotFound => (
                StatusCode::NOT_FOUND,
                "Ask with the specified id was not found".to_string(),
            ),
            RestError::BidNotFound => (
                StatusCode::NOT_FOUND,
                "Bid with the specified id was not found".to_string(),
            ),
            RestError::RevealNotFound => (
                StatusCode::NOT_FOUND,
                "No contact reveal exists for this ask".to_string(),
            ),
            RestError::AuctionClosed => (
                StatusCode::CONFLICT,
                "The bidding window of this ask is closed".to_string(),
            ),
            RestError::AlreadyResolved => (
                StatusCode::CONFLICT,
                "The ask has already been resolved".to_string(),
            ),
            RestError::TooManyOpenWebsocketConnections => (
                StatusCode::TOO_MANY_REQUESTS,
                "Too many open websocket connections from this address".to_string(),
            ),
            RestError::TemporarilyUnavailable => (
                StatusCode::SERVICE_UNAVAILABLE,
                "This service is temporarily unavailable".to_string(),
            ),
        }
    }
}

impl IntoResponse for RestError {
    fn into_response(self) -> Response {
        let (status, msg) = self.to_status_and_message();
        (status, Json(ErrorBodyResponse { error: msg })).into_response()
    }
}

impl std::fmt::Debug for RestError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_status_and_message().1)
    }
}

/// The identity boundary. Authentication proper is an external collaborator;
/// here the bearer credential is the caller's user id, and the extractor is
/// the seam where a real token service would plug in.
#[derive(Clone)]
pub enum Auth {
    Authorized(UserId),
    Unauthorized,
}

impl Auth {
    pub fn user_id(&self) -> Result<UserId, RestError> {
        match self {
            Auth::Authorized(user_id) => Ok(*user_id),
            Auth::Unauthorized => Err(RestError::Unauthorized),
        }
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for Auth
where
    S: Send + Sync,
{
    type Rejection = RestError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        match TypedHeader::<Authorization<Bearer>>::from_request_parts(parts, state).await {
            Ok(token) => token
                .token()
                .parse()
                .map(Auth::Authorized)
                .map_err(|_| RestError::Unauthorized),
            Err(_) => Ok(Auth::Unauthorized),
        }
    }
}

/// Router wrapper pairing every handler with its entry in the shared route
/// table, so paths and methods live in one place for server and clients.
pub struct WrappedRouter {
    pub router: Router<Arc<StoreNew>>,
}

impl WrappedRouter {
    pub fn new(_store: Arc<StoreNew>) -> Self {
        Self {
            router: Router::new(),
        }
    }

    pub fn route<H, T>(self, route: impl RouteTrait, handler: H) -> Self
    where
        H: axum::handler::Handler<T, Arc<StoreNew>>,
        T: 'static,
    {
        let method_router = match route.method() {
            Method::GET => get(handler),
            Method::POST => post(handler),
            _ => unreachable!("route table only carries GET and POST"),
        };
        Self {
            router: self.router.route(&route.full_path(), method_router),
        }
    }
}

async fn root() -> String {
    format!("Ask Auction Server API {}", crate_version!())
}

pub async fn live() -> Response {
    (StatusCode::OK, "OK").into_response()
}

pub async fn start_api(run_options: RunOptions, store: Arc<StoreNew>) -> Result<()> {
    // Make sure functions included in the paths section have distinct names,
    // otherwise some api generators will fail.
    #[derive(OpenApi)]
    #[openapi(
    paths(
    auction::api::post_ask,
    auction::api::get_asks,
    auction::api::get_ask,
    auction::api::get_ask_statistics,
    auction::api::post_bid,
    auction::api::get_bids,
    auction::api::get_active_bid,
    auction::api::post_accept_bid,
    auction::api::post_archive_ask,
    relationship::api::get_relationships,
    relationship::api::get_contact_reveal,
    ),
    components(
    schemas(
    Ask,
    AskCreate,
    AskStatistics,
    AskStatus,
    Asks,
    Compensation,
    CompensationKind,
    Schedule,
    Bid,
    BidCreate,
    BidResult,
    BidStatus,
    BidStatusWithId,
    Bids,
    Relationship,
    Relationships,
    RelationshipStatus,
    PaymentTerms,
    ContactReveal,
    ErrorBodyResponse,
    ClientRequest,
    ClientMessage,
    ServerResultMessage,
    ServerUpdateResponse,
    ServerResultResponse,
    APIResponse,
    ),
    responses(
    ErrorBodyResponse,
    Ask,
    AskStatistics,
    Bid,
    BidResult,
    Relationship,
    ContactReveal,
    ),
    ),
    tags(
    (name = "Ask Auction Server", description = "The auction server runs time-boxed reverse auctions: \
    a requester posts an ask, bidders undercut each other until the window closes, and accepting a bid \
    atomically resolves the ledger and forms the collaboration.")
    )
    )]
    struct ApiDoc;

    let app: Router<()> = Router::new()
        .merge(Redoc::with_url(
            Route::Docs.as_ref().to_string(),
            ApiDoc::openapi(),
        ))
        .merge(auction::api::get_routes(store.clone()))
        .merge(relationship::api::get_routes(store.clone()))
        .merge(ws::get_routes(store.clone()))
        .route(Route::Root.as_ref(), get(root))
        .route(Route::Liveness.as_ref(), get(live))
        .layer(CorsLayer::permissive())
        .with_state(store.clone());

    let listener = tokio::net::TcpListener::bind(&run_options.server.listen_addr)
        .await
        .unwrap();
    tracing::info!(
        listen_addr = run_options.server.listen_addr,
        "Server started"
    );
    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            while !SHOULD_EXIT.load(Ordering::Acquire) {
                tokio::time::sleep(EXIT_CHECK_INTERVAL).await;
            }
            tracing::info!("Shutting down RPC server...");
        })
        .await?;
    Ok(())
}
