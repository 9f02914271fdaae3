use axum::body::Body;
use axum::http::header;
use axum::response::Response;
use axum::{extract::FromRef, http::StatusCode, routing::get, Router};
use prometheus::{Encoder, TextEncoder};
use routes::{
    category_router, parents_router, payments_router, progress_router, questions_router,
    quizzes_router, users_router,
};
use sqlx::SqlitePool;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tower_sessions::{cookie::time::Duration, cookie::SameSite, Expiry, SessionManagerLayer};
use tower_sessions_sqlx_store::SqliteStore;

use super::auth::{auth_router, build_oidc_client, DiscoveredClient};
use super::routes;
use crate::args::Args;
use crate::email::Mailer;
use crate::payments::PaymentClient;

#[derive(FromRef, Clone)]
pub struct AppState {
    pub pool: SqlitePool,
    pub oidc_client: Option<DiscoveredClient>,
    pub payments: Option<PaymentClient>,
    pub mailer: Option<Mailer>,
    pub public_url: String,
}

pub async fn run_server(pool: SqlitePool, args: Args) -> anyhow::Result<()> {
    let addr = format!("0.0.0.0:{}", args.port);

    let session_store = SqliteStore::new(pool.clone());
    session_store.migrate().await?;
    let session_layer = SessionManagerLayer::new(session_store)
        .with_same_site(SameSite::Lax)
        .with_expiry(Expiry::OnInactivity(Duration::days(7)));

    let oidc_client = match (&args.google_client_id, &args.google_client_secret) {
        (Some(id), Some(secret)) => {
            Some(build_oidc_client(&args.public_url, id.clone(), secret.clone()).await?)
        }
        _ => {
            tracing::warn!("GOOGLE_CLIENT_ID/SECRET not set, OAuth login disabled");
            None
        }
    };

    let payments = args
        .payment_access_token
        .clone()
        .map(|token| PaymentClient::new(args.payment_api_url.clone(), token));
    if payments.is_none() {
        tracing::warn!("PAYMENT_ACCESS_TOKEN not set, payments disabled");
    }

    let mailer = Mailer::from_args(&args)?;
    if mailer.is_none() {
        tracing::warn!("SMTP_HOST not set, outbound mail disabled");
    }

    let state = AppState {
        pool,
        oidc_client,
        payments,
        mailer,
        public_url: args.public_url.clone(),
    };

    let app = Router::new()
        .route("/metrics", get(metrics))
        .merge(auth_router(state.clone()))
        .merge(category_router(state.clone()))
        .merge(quizzes_router(state.clone()))
        .merge(questions_router(state.clone()))
        .merge(progress_router(state.clone()))
        .merge(users_router(state.clone()))
        .merge(parents_router(state.clone()))
        .merge(payments_router(state.clone()))
        .fallback(|| async {
            tracing::info!("Fallback");
            StatusCode::NOT_FOUND
        })
        .layer(session_layer)
        .layer(TraceLayer::new_for_http());
    let listener = TcpListener::bind(&addr).await?;

    tracing::info!("Serving on {addr}");
    axum::serve(listener, app).await?;
    Ok(())
}

async fn metrics() -> Response {
    let encoder = TextEncoder::new();
    let metrics = prometheus::gather();
    let mut buf = vec![];
    encoder.encode(&metrics, &mut buf).unwrap();
    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, encoder.format_type())
        .body(Body::from(buf))
        .unwrap()
}
