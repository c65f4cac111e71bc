use actix_governor::{Governor, GovernorConfigBuilder};
use actix_web::dev::Service;
use actix_web::{middleware::Logger, web, App, HttpServer};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use roastmycv_server::{
    config::ServerConfig, metrics::register_metrics, routes, state::AppState,
};

#[tokio::main]
async fn main() -> std::io::Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,actix_web=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = match ServerConfig::from_env() {
        Ok(c) => c,
        Err(e) => {
            tracing::error!("Failed to load configuration: {e}");
            std::process::exit(1);
        }
    };
    config.warn_risky_settings();

    let port = config.port;
    let allowed_origins = config.allowed_origins.clone();
    let rate_limit_rpm = config.rate_limit_rpm;
    let spa_dir = config.spa_dir.clone();

    tracing::info!("Starting roastmycv-server on port {}", port);
    tracing::info!("Network: {}", config.network);
    tracing::info!("Pay to: {}", config.server_address);
    tracing::info!(
        "Review price: {} STX ({} microSTX)",
        config.review_price_stx,
        config.review_price
    );
    tracing::info!("Facilitator URL: {}", config.facilitator_url);
    tracing::info!("Direct transfers: {:?}", config.direct_transfer_policy);

    let db_path = config.db_path.clone();
    let state = match AppState::new(config) {
        Ok(s) => s,
        Err(e) => {
            tracing::error!("Failed to initialize state: {e}");
            std::process::exit(1);
        }
    };
    tracing::info!("Database initialized at: {}", db_path);

    // Register Prometheus metrics
    register_metrics();

    let state_data = web::Data::new(state);

    // Configure rate limiter
    let governor_conf = match GovernorConfigBuilder::default()
        .requests_per_minute(rate_limit_rpm as u64)
        .finish()
    {
        Some(c) => c,
        None => {
            tracing::error!("Invalid RATE_LIMIT_RPM: {}", rate_limit_rpm);
            std::process::exit(1);
        }
    };

    if let Some(ref dir) = spa_dir {
        tracing::info!("Serving SPA from: {}", dir);
    }

    HttpServer::new(move || {
        let cors = roastmycv_server::cors::build_cors(&allowed_origins);

        let mut app = App::new()
            .app_data(state_data.clone())
            .wrap_fn(|req, srv| {
                let endpoint = req
                    .match_pattern()
                    .unwrap_or_else(|| "unmatched".to_string());
                let fut = srv.call(req);
                async move {
                    let res = fut.await?;
                    roastmycv_server::metrics::record_request(&endpoint, res.status().as_u16());
                    Ok(res)
                }
            })
            .wrap(Logger::default())
            .wrap(cors)
            .wrap(Governor::new(&governor_conf))
            .configure(routes::configure);

        // Serve SPA static files last (catch-all) if configured
        if let Some(ref dir) = spa_dir {
            let index_path = format!("{}/index.html", dir);
            app = app.service(
                actix_files::Files::new("/", dir)
                    .index_file("index.html")
                    .default_handler(web::to(move || {
                        let path = index_path.clone();
                        async move { actix_files::NamedFile::open_async(path).await }
                    })),
            );
        }

        app
    })
    .bind(("0.0.0.0", port))?
    .run()
    .await
}
