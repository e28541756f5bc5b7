use std::{net::SocketAddr, sync::Arc};

use axum::Router;
use http::HeaderValue;
use tokio::signal;
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::{error, info};

use kerani_api as api;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cfg = api::config::load_config()?;
    api::config::init_tracing(cfg.log_level(), cfg.log_json);

    // Init DB
    let db_pool = api::db::establish_connection_from_app_config(&cfg).await?;
    if cfg.auto_migrate {
        api::db::run_migrations(&db_pool).await.map_err(|e| {
            error!("failed running migrations: {}", e);
            e
        })?;
    }

    let db_arc = Arc::new(db_pool);
    let services = api::handlers::AppServices::new(db_arc.clone(), &cfg);

    // Cron scheduler; registry handle kept alive for the process lifetime.
    let _scheduler = if cfg.scheduler_enabled {
        Some(
            api::jobs::start_scheduler(api::jobs::JobContext {
                tz: cfg.tz(),
                auto_clockout: services.auto_clockout.clone(),
                holiday_notifier: services.holiday_notifier.clone(),
                driver_sync: services.driver_sync.clone(),
                resignations: services.resignations.clone(),
            })
            .await?,
        )
    } else {
        info!("cron scheduler disabled by configuration");
        None
    };

    let auth_service = Arc::new(api::auth::AuthService::new(&cfg.jwt_secret));

    let app_state = api::AppState {
        db: db_arc.clone(),
        config: cfg.clone(),
        services,
    };

    // CORS from config; permissive in development only.
    let configured_origins: Option<Vec<HeaderValue>> = cfg
        .cors_allowed_origins
        .as_ref()
        .map(|raw| {
            raw.split(',')
                .filter_map(|origin| {
                    let trimmed = origin.trim();
                    if trimmed.is_empty() {
                        None
                    } else {
                        HeaderValue::from_str(trimmed).ok()
                    }
                })
                .collect::<Vec<_>>()
        })
        .filter(|origins| !origins.is_empty());

    let cors_layer = match configured_origins {
        Some(origins) => CorsLayer::new()
            .allow_origin(origins)
            .allow_methods(Any)
            .allow_headers(Any),
        None if cfg.is_development() => CorsLayer::permissive(),
        None => {
            error!("missing CORS configuration; set APP__CORS_ALLOWED_ORIGINS");
            return Err("missing CORS configuration: set APP__CORS_ALLOWED_ORIGINS".into());
        }
    };

    let app = Router::<api::AppState>::new()
        .route("/", axum::routing::get(|| async { "kerani-api up" }))
        .nest("/api/v1", api::api_v1_routes())
        .merge(api::openapi::swagger_ui())
        .layer(TraceLayer::new_for_http())
        .layer(CompressionLayer::new())
        .layer(cors_layer)
        // Inject AuthService into request extensions for auth middleware
        .layer(axum::middleware::from_fn_with_state(
            auth_service.clone(),
            |axum::extract::State(auth): axum::extract::State<Arc<api::auth::AuthService>>,
             mut req: axum::http::Request<axum::body::Body>,
             next: axum::middleware::Next| async move {
                req.extensions_mut().insert(auth);
                next.run(req).await
            },
        ))
        .with_state(app_state);

    let addr = SocketAddr::from(([0, 0, 0, 0], cfg.port));
    info!("kerani-api listening on http://{}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};

        let mut sigterm =
            signal(SignalKind::terminate()).expect("failed to install signal handler");
        sigterm.recv().await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
