use axum::{
    http::Method,
    middleware as axum_middleware,
    routing::{delete, get, post, put},
    Router,
};
use std::net::SocketAddr;
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use geoattend_backend::{
    config::Config,
    db::{connection::create_pool, redis::create_redis_pool},
    handlers,
    jobs::{self, PgJobStore, Scheduler},
    middleware as auth_middleware,
    services::{
        attendance_cache::{AttendanceCacheTrait, NoopAttendanceCache, RedisAttendanceCache},
        notifier::{FlagNotifierTrait, LogFlagNotifier},
    },
    state::AppState,
    utils::time,
};

fn mask_secret(s: &str) -> String {
    if s.is_empty() {
        return "<empty>".into();
    }
    let prefix = s.chars().take(4).collect::<String>();
    format!("{}*** (len={})", prefix, s.len())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "geoattend_backend=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::load()?;
    tracing::info!(
        database_url = %config.database_url,
        jwt_secret = %mask_secret(&config.jwt_secret),
        time_zone = %config.time_zone,
        office_hours = %format!("[{}, {})", config.office_open_hour, config.office_close_hour),
        auto_checkout_at = %config.auto_checkout_at,
        absentee_run_at = %config.absentee_run_at,
        "Loaded configuration from environment/.env"
    );

    let pool = create_pool(&config.database_url).await?;
    sqlx::migrate!("./migrations").run(pool.as_ref()).await?;

    let cache: Arc<dyn AttendanceCacheTrait> = match create_redis_pool(&config).await? {
        Some(redis) => Arc::new(RedisAttendanceCache::new(redis)),
        None => Arc::new(NoopAttendanceCache),
    };
    let notifier: Arc<dyn FlagNotifierTrait> = Arc::new(LogFlagNotifier);

    let state = AppState::new(pool.clone(), config.clone(), cache.clone(), notifier.clone());

    // Nightly jobs run in-process; the ops binaries cover manual reruns.
    let job_store = PgJobStore::new((*pool).clone());
    let mut scheduler = Scheduler::new(config.time_zone);
    {
        let store = job_store.clone();
        let notifier = notifier.clone();
        let tz = config.time_zone;
        scheduler.schedule_daily("mark_absentees", config.absentee_run_at, move || {
            let store = store.clone();
            let notifier = notifier.clone();
            async move {
                let date = time::today_local(&tz);
                jobs::absentee::run(&store, notifier.as_ref(), date).await?;
                Ok(())
            }
        });
    }
    {
        let store = job_store.clone();
        let notifier = notifier.clone();
        let cache = cache.clone();
        let tz = config.time_zone;
        let cutoff = config.auto_checkout_at;
        scheduler.schedule_daily("auto_checkout", config.auto_checkout_at, move || {
            let store = store.clone();
            let notifier = notifier.clone();
            let cache = cache.clone();
            async move {
                let date = time::today_local(&tz);
                jobs::auto_checkout::run(
                    &store,
                    notifier.as_ref(),
                    cache.as_ref(),
                    date,
                    cutoff,
                )
                .await?;
                Ok(())
            }
        });
    }

    let user_routes = Router::new()
        .route(
            "/api/attendance/check-in",
            post(handlers::attendance::check_in),
        )
        .route(
            "/api/attendance/check-out",
            post(handlers::attendance::check_out),
        )
        .route(
            "/api/attendance/today",
            get(handlers::attendance::get_today),
        )
        .route(
            "/api/attendance/me",
            get(handlers::attendance::get_my_attendance),
        )
        .route("/api/branches", get(handlers::branches::list_branches))
        .route("/api/holidays", get(handlers::holidays::list_holidays))
        .route_layer(axum_middleware::from_fn_with_state(
            state.clone(),
            auth_middleware::auth,
        ));

    let admin_routes = Router::new()
        .route(
            "/api/admin/attendance/flagged",
            get(handlers::admin::list_flagged),
        )
        .route(
            "/api/admin/attendance/{id}/approve",
            put(handlers::admin::approve_record),
        )
        .route(
            "/api/admin/jobs/mark-absentees",
            post(handlers::admin::run_absentee),
        )
        .route(
            "/api/admin/jobs/auto-checkout",
            post(handlers::admin::run_auto_checkout),
        )
        .route(
            "/api/admin/branches",
            post(handlers::branches::create_branch),
        )
        .route(
            "/api/admin/holidays",
            post(handlers::holidays::create_holiday),
        )
        .route(
            "/api/admin/holidays/{id}",
            delete(handlers::holidays::delete_holiday),
        )
        .route_layer(axum_middleware::from_fn_with_state(
            state.clone(),
            auth_middleware::auth_manager,
        ));

    let app = Router::new()
        .merge(user_routes)
        .merge(admin_routes)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(
                    CorsLayer::new()
                        .allow_origin(Any)
                        .allow_methods([
                            Method::GET,
                            Method::POST,
                            Method::PUT,
                            Method::DELETE,
                            Method::OPTIONS,
                        ])
                        .allow_headers(Any)
                        .max_age(std::time::Duration::from_secs(24 * 60 * 60)),
                ),
        )
        .with_state(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.listen_port));
    tracing::info!("Server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    scheduler.shutdown().await;
    Ok(())
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
    tracing::info!("shutdown signal received");
}
