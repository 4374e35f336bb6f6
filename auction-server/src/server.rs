use {
    crate::{
        api,
        api::ws,
        auction,
        config::{
            Config,
            RunOptions,
        },
        kernel::clock::SystemClock,
        relationship,
        state::{
            Store,
            StoreNew,
        },
    },
    anyhow::anyhow,
    futures::future::join_all,
    sqlx::postgres::PgPoolOptions,
    std::{
        sync::{
            atomic::{
                AtomicBool,
                Ordering,
            },
            Arc,
        },
        time::Duration,
    },
    tokio_util::task::TaskTracker,
};

const DATABASE_MAX_CONNECTIONS: u32 = 10;

pub async fn start_server(run_options: RunOptions) -> anyhow::Result<()> {
    tokio::spawn(async move {
        tracing::info!("Registered shutdown signal handler...");
        tokio::signal::ctrl_c().await.unwrap();
        tracing::info!("Shut down signal received, waiting for tasks...");
        SHOULD_EXIT.store(true, Ordering::Release);
    });

    let config = Config::load(&run_options.config.config).map_err(|err| {
        anyhow!(
            "Failed to load config from file({path}): {:?}",
            err,
            path = run_options.config.config
        )
    })?;

    let pool = PgPoolOptions::new()
        .max_connections(DATABASE_MAX_CONNECTIONS)
        .connect(&run_options.database_url)
        .await
        .map_err(|err| anyhow!("Failed to connect to the database: {:?}", err))?;
    sqlx::migrate!("./migrations").run(&pool).await?;

    let store = Arc::new(Store {
        db: pool.clone(),
        ws: ws::WsState::new(
            config.ws.requester_ip_header_name.clone(),
            config.ws.notification_channel_size,
        ),
    });
    let task_tracker = TaskTracker::new();
    let clock = Arc::new(SystemClock);

    let relationship_service =
        relationship::service::Service::new(pool.clone(), clock.clone());
    let auction_service = auction::service::Service::new(
        pool,
        relationship_service.clone(),
        auction::service::Config {
            anti_snipe_window:    Duration::from_secs(config.auction.anti_snipe_window_secs),
            anti_snipe_extension: Duration::from_secs(config.auction.anti_snipe_extension_secs),
            enforce_improving_bids: config.auction.enforce_improving_bids,
            expiry_sweep_interval: Duration::from_secs(config.auction.expiry_sweep_interval_secs),
        },
        clock,
        store.ws.broadcast_sender.clone(),
    );

    let store_new = Arc::new(StoreNew::new(
        store,
        auction_service.clone(),
        relationship_service.clone(),
        task_tracker,
    ));

    let relationship_sweep_interval =
        Duration::from_secs(config.auction.expiry_sweep_interval_secs);
    let expiry_loop = tokio::spawn(async move { auction_service.run_expiry_loop().await });
    let relationship_expiry_loop = tokio::spawn(async move {
        relationship_service
            .run_expiry_loop(relationship_sweep_interval)
            .await
    });
    let server_loop = tokio::spawn(api::start_api(run_options, store_new.clone()));
    join_all(vec![expiry_loop, relationship_expiry_loop, server_loop]).await;

    store_new.task_tracker.close();
    store_new.task_tracker.wait().await;
    Ok(())
}

// A static exit flag to indicate to running threads that we're shutting down.
// This is used to gracefully shutdown the application.
pub static SHOULD_EXIT: AtomicBool = AtomicBool::new(false);
pub const EXIT_CHECK_INTERVAL: Duration = Duration::from_secs(1);
