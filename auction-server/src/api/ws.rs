use {
    super::{
        Auth,
        RestError,
        WrappedRouter,
    },
    crate::{
        auction::{
            api::process_bid,
            entities::{
                AskId,
                BidId,
            },
            service::get_ask::GetAskInput,
        },
        server::{
            EXIT_CHECK_INTERVAL,
            SHOULD_EXIT,
        },
        state::StoreNew,
    },
    anyhow::{
        anyhow,
        Result,
    },
    ask_auction_api_types::{
        ask::Ask,
        bid::{
            Bid,
            BidCreate,
            BidStatusWithId,
        },
        relationship::Relationship,
        ws::{
            APIResponse,
            ClientMessage,
            ClientRequest,
            Route,
            ServerResultMessage,
            ServerResultResponse,
            ServerUpdateResponse,
        },
    },
    axum::{
        extract::{
            ws::{
                Message,
                WebSocket,
            },
            State,
            WebSocketUpgrade,
        },
        http::HeaderMap,
        response::IntoResponse,
        Router,
    },
    futures::{
        stream::{
            SplitSink,
            SplitStream,
        },
        SinkExt,
        StreamExt,
    },
    std::{
        collections::{
            HashMap,
            HashSet,
        },
        future::Future,
        net::IpAddr,
        sync::{
            atomic::{
                AtomicUsize,
                Ordering,
            },
            Arc,
        },
        time::Duration,
    },
    tokio::sync::{
        broadcast,
        RwLock,
        Semaphore,
    },
    tracing::{
        instrument,
        Instrument,
    },
};

pub struct WsState {
    pub requester_ip_header_name: String,
    subscriber_counter:           AtomicUsize,
    subscriber_per_ip:            RwLock<HashMap<IpAddr, HashSet<SubscriberId>>>,
    pub broadcast_sender:         broadcast::Sender<UpdateEvent>,
    pub broadcast_receiver:       broadcast::Receiver<UpdateEvent>,
}

const MAXIMUM_SUBSCRIBERS_PER_IP: usize = 10;

impl WsState {
    pub fn new(requester_ip_header_name: String, broadcast_channel_size: usize) -> Self {
        let (broadcast_sender, broadcast_receiver) = broadcast::channel(broadcast_channel_size);
        Self {
            requester_ip_header_name,
            subscriber_counter: AtomicUsize::new(0),
            subscriber_per_ip: RwLock::new(HashMap::new()),
            broadcast_sender,
            broadcast_receiver,
        }
    }

    /// If the specified IP address has too many open websocket connections,
    /// this function will return none. Otherwise, it will return the new
    /// subscriber id.
    pub async fn get_new_subscriber_id(&self, ip: Option<IpAddr>) -> Option<SubscriberId> {
        let id = self.subscriber_counter.fetch_add(1, Ordering::SeqCst);
        if let Some(ip) = ip {
            let mut write_guard = self.subscriber_per_ip.write().await;
            let ids = write_guard.entry(ip).or_insert_with(HashSet::new);
            if ids.len() >= MAXIMUM_SUBSCRIBERS_PER_IP {
                return None;
            }
            ids.insert(id);
        }
        Some(id)
    }

    pub async fn remove_subscriber(&self, id: SubscriberId, ip: Option<IpAddr>) {
        if let Some(ip) = ip {
            let mut write_guard = self.subscriber_per_ip.write().await;
            if let Some(ids) = write_guard.get_mut(&ip) {
                ids.remove(&id);
                if ids.is_empty() {
                    write_guard.remove(&ip);
                }
            }
        }
    }
}

pub async fn ws_route_handler(
    auth: Auth,
    ws: WebSocketUpgrade,
    State(store): State<Arc<StoreNew>>,
    headers: HeaderMap,
) -> impl IntoResponse {
    let ws_state = &store.store.ws;
    let requester_ip = headers
        .get(ws_state.requester_ip_header_name.as_str())
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(',').next()) // Only take the first ip if there are multiple
        .and_then(|value| value.parse().ok());

    match ws_state.get_new_subscriber_id(requester_ip).await {
        Some(subscriber_id) => ws.on_upgrade(move |socket| {
            websocket_handler(socket, store, subscriber_id, auth, requester_ip)
        }),
        None => RestError::TooManyOpenWebsocketConnections.into_response(),
    }
}

async fn websocket_handler(
    stream: WebSocket,
    state: Arc<StoreNew>,
    subscriber_id: SubscriberId,
    auth: Auth,
    requester_ip: Option<IpAddr>,
) {
    let ws_state = &state.store.ws;
    let (sender, receiver) = stream.split();
    let new_receiver = ws_state.broadcast_receiver.resubscribe();
    let mut subscriber = Subscriber::new(
        subscriber_id,
        state.clone(),
        new_receiver,
        receiver,
        sender,
        auth,
    );
    subscriber.run().await;
    ws_state
        .remove_subscriber(subscriber_id, requester_ip)
        .await;
}

/// Everything the engine publishes. Delivery is at-least-once and ordered
/// per ask; publishers send while holding the ask's lock, so the stream
/// never shows a row's status change before the row's creation.
#[derive(Clone, PartialEq, Debug)]
pub enum UpdateEvent {
    NewAsk(Ask),
    AskStatusUpdate(Ask),
    NewBid(Bid),
    BidStatusUpdate {
        ask_id: AskId,
        status: BidStatusWithId,
    },
    NewRelationship(Relationship),
}

pub type SubscriberId = usize;

#[derive(Debug, Clone)]
struct DeferredResponse {
    response:      ServerResultResponse,
    bid_id_to_add: Option<BidId>,
}

/// Subscriber is an actor that handles a single websocket connection. It
/// listens to the store for updates and sends them to the client.
pub struct Subscriber {
    id:                  SubscriberId,
    closed:              bool,
    store:               Arc<StoreNew>,
    notify_receiver:     broadcast::Receiver<UpdateEvent>,
    receiver:            SplitStream<WebSocket>,
    sender:              SplitSink<WebSocket, Message>,
    ask_ids:             HashSet<AskId>,
    all_asks:            bool,
    bid_ids:             HashSet<BidId>,
    ping_interval:       tokio::time::Interval,
    exit_check_interval: tokio::time::Interval,
    responded_to_ping:   bool,
    auth:                Auth,
    active_requests:     Arc<Semaphore>,
    response_sender:     broadcast::Sender<DeferredResponse>,
    response_receiver:   broadcast::Receiver<DeferredResponse>,
}

const PING_INTERVAL_DURATION: Duration = Duration::from_secs(30);

fn ok_response(id: String) -> ServerResultResponse {
    ServerResultResponse {
        id:     Some(id),
        result: ServerResultMessage::Success(None),
    }
}

const MAX_ACTIVE_REQUESTS: usize = 50;

impl Subscriber {
    pub fn new(
        id: SubscriberId,
        store: Arc<StoreNew>,
        notify_receiver: broadcast::Receiver<UpdateEvent>,
        receiver: SplitStream<WebSocket>,
        sender: SplitSink<WebSocket, Message>,
        auth: Auth,
    ) -> Self {
        let (response_sender, response_receiver) = broadcast::channel(100);
        Self {
            id,
            closed: false,
            store,
            notify_receiver,
            receiver,
            sender,
            ask_ids: HashSet::new(),
            all_asks: false,
            bid_ids: HashSet::new(),
            ping_interval: tokio::time::interval(PING_INTERVAL_DURATION),
            exit_check_interval: tokio::time::interval(EXIT_CHECK_INTERVAL),
            responded_to_ping: true, // We start with true so we don't close the connection immediately
            auth,
            active_requests: Arc::new(Semaphore::new(MAX_ACTIVE_REQUESTS)),
            response_receiver,
            response_sender,
        }
    }

    pub async fn run(&mut self) {
        while !self.closed {
            if let Err(e) = self.handle_next().await {
                tracing::debug!(subscriber = self.id, error = ?e, "Error Handling Subscriber Message.");
                break;
            }
        }
    }

    async fn handle_next(&mut self) -> Result<()> {
        tokio::select! {
            maybe_update_event = self.notify_receiver.recv() => {
                match maybe_update_event {
                    Ok(event) => self.handle_update(event).await,
                    Err(e) => Err(anyhow!("Error receiving update event: {:?}", e)),
                }
            },
            maybe_message_or_err = self.receiver.next() => {
                self.handle_client_message(
                    maybe_message_or_err.ok_or(anyhow!("Client channel is closed"))??
                ).await
            },
            response_received = self.response_receiver.recv() => {
                match response_received {
                    Ok(DeferredResponse { response, bid_id_to_add }) => {
                        if let Some(bid_id) = bid_id_to_add {
                            self.bid_ids.insert(bid_id);
                        }
                        self.sender.send(serde_json::to_string(&response)?.into()).await?;
                    }
                    Err(e) => {
                        tracing::warn!(
                            subscriber = self.id,
                            error = ?e,
                            "Error Handling Subscriber Response Message."
                        );
                    }
                }
                Ok(())
            },
            _  = self.ping_interval.tick() => {
                if !self.responded_to_ping {
                    return Err(anyhow!("Subscriber did not respond to ping. Closing connection."));
                }
                self.responded_to_ping = false;
                self.sender.send(Message::Ping(vec![])).await?;
                Ok(())
            },
            _ = self.exit_check_interval.tick() => {
                if SHOULD_EXIT.load(Ordering::Acquire) {
                    self.sender.close().await?;
                    self.closed = true;
                    return Err(anyhow!("Application is shutting down. Closing connection."));
                }
                Ok(())
            }
        }
    }

    fn watches_ask(&self, ask_id: &AskId) -> bool {
        self.all_asks || self.ask_ids.contains(ask_id)
    }

    async fn handle_new_ask(&mut self, ask: Ask) -> Result<()> {
        if !self.all_asks {
            // Irrelevant update
            return Ok(());
        }
        let message = serde_json::to_string(&ServerUpdateResponse::NewAsk { ask })?;
        self.sender.send(message.into()).await?;
        Ok(())
    }

    async fn handle_ask_status_update(&mut self, ask: Ask) -> Result<()> {
        if !self.watches_ask(&ask.id) {
            // Irrelevant update
            return Ok(());
        }
        let message = serde_json::to_string(&ServerUpdateResponse::AskStatusUpdate { ask })?;
        self.sender.send(message.into()).await?;
        Ok(())
    }

    async fn handle_new_bid(&mut self, bid: Bid) -> Result<()> {
        if !self.watches_ask(&bid.ask_id) {
            // Irrelevant update
            return Ok(());
        }
        let message = serde_json::to_string(&ServerUpdateResponse::NewBid { bid })?;
        self.sender.send(message.into()).await?;
        Ok(())
    }

    async fn handle_bid_status_update(
        &mut self,
        ask_id: AskId,
        status: BidStatusWithId,
    ) -> Result<()> {
        if !self.watches_ask(&ask_id) && !self.bid_ids.contains(&status.id) {
            // Irrelevant update
            return Ok(());
        }
        let message = serde_json::to_string(&ServerUpdateResponse::BidStatusUpdate { status })?;
        self.sender.send(message.into()).await?;
        Ok(())
    }

    async fn handle_new_relationship(&mut self, relationship: Relationship) -> Result<()> {
        let involves_caller = match &self.auth {
            Auth::Authorized(user_id) => {
                relationship.requester == *user_id || relationship.provider == *user_id
            }
            Auth::Unauthorized => false,
        };
        if !self.watches_ask(&relationship.ask_id) && !involves_caller {
            // Irrelevant update
            return Ok(());
        }
        let message =
            serde_json::to_string(&ServerUpdateResponse::NewRelationship { relationship })?;
        self.sender.send(message.into()).await?;
        Ok(())
    }

    #[instrument(
        target = "metrics",
        fields(category = "ws_update", result = "success", name),
        skip_all
    )]
    async fn handle_update(&mut self, event: UpdateEvent) -> Result<()> {
        let result = match event {
            UpdateEvent::NewAsk(ask) => {
                tracing::Span::current().record("name", "new_ask");
                self.handle_new_ask(ask).await
            }
            UpdateEvent::AskStatusUpdate(ask) => {
                tracing::Span::current().record("name", "ask_status_update");
                self.handle_ask_status_update(ask).await
            }
            UpdateEvent::NewBid(bid) => {
                tracing::Span::current().record("name", "new_bid");
                self.handle_new_bid(bid).await
            }
            UpdateEvent::BidStatusUpdate { ask_id, status } => {
                tracing::Span::current().record("name", "bid_status_update");
                self.handle_bid_status_update(ask_id, status).await
            }
            UpdateEvent::NewRelationship(relationship) => {
                tracing::Span::current().record("name", "new_relationship");
                self.handle_new_relationship(relationship).await
            }
        };
        if result.is_err() {
            tracing::Span::current().record("result", "error");
        }
        result
    }

    async fn handle_subscribe(&mut self, message_id: String, ask_ids: Vec<AskId>) {
        let mut not_found_ask_ids: Vec<AskId> = Vec::new();
        for ask_id in &ask_ids {
            if self
                .store
                .auction_service
                .get_ask(GetAskInput { ask_id: *ask_id })
                .await
                .is_err()
            {
                not_found_ask_ids.push(*ask_id);
            }
        }
        // If there is a single ask id that is not found, we don't subscribe
        // to any of the asked correct ask ids and return an error to be more
        // explicit and clear.
        let resp = if !not_found_ask_ids.is_empty() {
            ServerResultResponse {
                id:     Some(message_id),
                result: ServerResultMessage::Err(format!(
                    "Ask(s) with id(s) {:?} not found",
                    not_found_ask_ids
                )),
            }
        } else {
            self.ask_ids.extend(ask_ids);
            ok_response(message_id)
        };
        Self::send_response(
            &self.response_sender,
            DeferredResponse {
                response:      resp,
                bid_id_to_add: None,
            },
        );
    }

    async fn handle_unsubscribe(&mut self, message_id: String, ask_ids: Vec<AskId>) {
        self.ask_ids.retain(|ask_id| !ask_ids.contains(ask_id));
        Self::send_response(
            &self.response_sender,
            DeferredResponse {
                response:      ok_response(message_id),
                bid_id_to_add: None,
            },
        );
    }

    fn send_response(
        response_sender: &broadcast::Sender<DeferredResponse>,
        deferred_response: DeferredResponse,
    ) {
        if matches!(
            deferred_response.response.result,
            ServerResultMessage::Err(_)
        ) {
            tracing::Span::current().record("result", "error");
        }
        if let Err(e) = response_sender.send(deferred_response) {
            tracing::warn!(error = ?e, "Error sending response to subscriber");
        }
    }

    async fn spawn_deferred(
        &mut self,
        fut: impl Future<Output = DeferredResponse> + Send + 'static,
    ) {
        let permit = self
            .active_requests
            .clone()
            .acquire_owned()
            .await
            .expect("Semaphore should not be closed");
        let response_sender = self.response_sender.clone();
        self.store.task_tracker.spawn(
            async move {
                let resp = fut.await;
                Self::send_response(&response_sender, resp);
                drop(permit);
            }
            .in_current_span(),
        );
    }

    async fn handle_post_bid(&mut self, message_id: String, ask_id: AskId, bid: BidCreate) {
        let (auth, store) = (self.auth.clone(), self.store.clone());
        self.spawn_deferred(async move {
            match process_bid(auth, store, ask_id, bid).await {
                Ok(bid_result) => DeferredResponse {
                    bid_id_to_add: Some(bid_result.id),
                    response:      ServerResultResponse {
                        id:     Some(message_id),
                        result: ServerResultMessage::Success(Some(APIResponse::BidResult(
                            bid_result,
                        ))),
                    },
                },
                Err(e) => DeferredResponse {
                    response:      ServerResultResponse {
                        id:     Some(message_id),
                        result: ServerResultMessage::Err(e.to_status_and_message().1),
                    },
                    bid_id_to_add: None,
                },
            }
        })
        .await;
    }

    #[instrument(
        target = "metrics",
        fields(category = "ws_client_message", result = "success", name),
        skip_all
    )]
    async fn handle_client_message(&mut self, message: Message) -> Result<()> {
        let maybe_client_message = match message {
            Message::Close(_) => {
                // Closing the connection. We don't remove it from the
                // subscribers list, instead when the Subscriber struct is
                // dropped the channel to subscribers list will be closed and
                // it will eventually get removed.
                // Send the close message to gracefully shut down the
                // connection. Otherwise the client might get an abnormal
                // Websocket closure error.
                tracing::Span::current().record("name", "close");
                if let Err(e) = self.sender.close().await {
                    tracing::Span::current().record("result", "error");
                    return Err(e.into());
                }
                self.closed = true;
                return Ok(());
            }
            Message::Text(text) => serde_json::from_str::<ClientRequest>(&text),
            Message::Binary(data) => serde_json::from_slice::<ClientRequest>(&data),
            Message::Ping(_) => {
                // Axum will send Pong automatically
                tracing::Span::current().record("name", "ping");
                return Ok(());
            }
            Message::Pong(_) => {
                tracing::Span::current().record("name", "pong");
                self.responded_to_ping = true;
                return Ok(());
            }
        };

        match maybe_client_message {
            Err(e) => {
                Self::send_response(
                    &self.response_sender,
                    DeferredResponse {
                        response:      ServerResultResponse {
                            id:     None,
                            result: ServerResultMessage::Err(e.to_string()),
                        },
                        bid_id_to_add: None,
                    },
                );
            }
            Ok(ClientRequest { msg, id }) => match msg {
                ClientMessage::Subscribe { ask_ids } => {
                    tracing::Span::current().record("name", "subscribe");
                    self.handle_subscribe(id, ask_ids).await
                }
                ClientMessage::Unsubscribe { ask_ids } => {
                    tracing::Span::current().record("name", "unsubscribe");
                    self.handle_unsubscribe(id, ask_ids).await
                }
                ClientMessage::SubscribeCollection => {
                    tracing::Span::current().record("name", "subscribe_collection");
                    self.all_asks = true;
                    Self::send_response(
                        &self.response_sender,
                        DeferredResponse {
                            response:      ok_response(id),
                            bid_id_to_add: None,
                        },
                    );
                }
                ClientMessage::UnsubscribeCollection => {
                    tracing::Span::current().record("name", "unsubscribe_collection");
                    self.all_asks = false;
                    Self::send_response(
                        &self.response_sender,
                        DeferredResponse {
                            response:      ok_response(id),
                            bid_id_to_add: None,
                        },
                    );
                }
                ClientMessage::PostBid { ask_id, bid } => {
                    tracing::Span::current().record("name", "post_bid");
                    self.handle_post_bid(id, ask_id, bid).await
                }
            },
        };

        Ok(())
    }
}

pub fn get_routes(store: Arc<StoreNew>) -> Router<Arc<StoreNew>> {
    WrappedRouter::new(store)
        .route(Route::Ws, ws_route_handler)
        .router
}
