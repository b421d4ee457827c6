use std::sync::Arc;
use std::time::Duration;

use axum::{
    Router, middleware,
    routing::{get, post},
};
use color_eyre::eyre::{Context, eyre};
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use url::Url;

use crate::{
    config::Config,
    database::Database,
    http_server::{auth::require_auth, http_routes, state::AppState},
    services::auth::AuthService,
    services::netease::client::NeteaseHttpAdapter,
};

pub struct HttpServerConfig {
    pub port: u16,
    pub database: Database,
    pub config: Config,
}

async fn root() -> &'static str {
    "netease-mirror"
}

pub async fn start(server_config: HttpServerConfig) -> color_eyre::Result<()> {
    let HttpServerConfig {
        port,
        database,
        config,
    } = server_config;

    let netease = NeteaseHttpAdapter::new(
        Url::parse(&config.netease.api_url).wrap_err("Invalid netease api_url")?,
        Duration::from_millis(config.netease.timeout_ms),
    )?;
    let auth = AuthService::new(
        config.auth.jwt_secret.clone(),
        config.auth.token_expiry_hours,
    );

    let app_state = Arc::new(AppState {
        db: Arc::new(database),
        netease,
        auth,
        config,
    });

    tracing::info!(
        "Proxying Netease API at {}",
        app_state.config.netease.api_url
    );

    #[cfg(debug_assertions)]
    let cors_layer = CorsLayer::permissive();

    #[cfg(not(debug_assertions))]
    let cors_layer = {
        use axum::http::HeaderValue;
        use tower_http::cors::{AllowHeaders, AllowMethods};

        let mut layer = CorsLayer::new()
            .allow_methods(AllowMethods::any())
            .allow_headers(AllowHeaders::any());
        if let Some(origin) = app_state.config.server.allowed_origin.as_deref() {
            layer = layer.allow_origin(
                origin
                    .parse::<HeaderValue>()
                    .wrap_err("Invalid allowed_origin")?,
            );
        }
        layer
    };

    let protected = Router::new()
        .route("/playlists", get(http_routes::playlist::list_playlists))
        .route("/playlists/sync", post(http_routes::playlist::sync_playlists))
        .route(
            "/playlists/search",
            get(http_routes::playlist::search_playlists),
        )
        .route(
            "/playlists/import",
            post(http_routes::playlist::import_playlist),
        )
        .route(
            "/playlists/{id}",
            get(http_routes::playlist::get_playlist)
                .delete(http_routes::playlist::delete_playlist),
        )
        .route(
            "/playlists/{id}/songs",
            get(http_routes::playlist::playlist_songs),
        )
        .route(
            "/export/playlist/{id}",
            get(http_routes::export::export_playlist),
        )
        .route("/export/all", get(http_routes::export::export_all))
        .layer(middleware::from_fn_with_state(
            app_state.clone(),
            require_auth,
        ));

    let app = Router::new()
        .route("/", get(root))
        .route("/api/auth/register", post(http_routes::auth::register))
        .route("/api/auth/login", post(http_routes::auth::login))
        .nest("/api", protected)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors_layer),
        )
        .with_state(app_state.clone());

    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", port))
        .await
        .wrap_err_with(|| eyre!("Failed to bind to port {}", port))?;

    tracing::info!("Listening on 0.0.0.0:{port}");

    axum::serve(listener, app)
        .await
        .wrap_err("Failed to start HTTP server")?;

    Ok(())
}
