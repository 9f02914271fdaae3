use axum::extract::{Path, State};
use axum::routing::{get, post};
use axum::{Json, Router};

use crate::payments::{CreatePreference, PaymentStatus, Preference};
use crate::server::app::AppState;
use crate::server::auth::AuthUser;
use crate::server::error::{ApiError, ApiResponse};

/// Create a checkout preference for buying hint credits. The gateway hosts
/// the actual checkout; we only hand back the redirect link.
async fn create_preference(
    user: AuthUser,
    State(state): State<AppState>,
    Json(mut body): Json<CreatePreference>,
) -> ApiResponse<Preference> {
    let Some(payments) = &state.payments else {
        return Err(ApiError::NotFound("Payments"));
    };
    if body.unit_price <= 0.0 || body.quantity == 0 {
        return Err(ApiError::BadRequest("Invalid item".to_owned()));
    }
    if body.payer_email.is_none() {
        body.payer_email = user.email.clone();
    }

    let preference = payments
        .create_preference(&body, &state.public_url)
        .await
        .map_err(ApiError::Internal)?;
    tracing::info!(user = user.id, preference = %preference.id, "checkout preference created");
    Ok(Json(preference))
}

async fn payment_status(
    _user: AuthUser,
    State(state): State<AppState>,
    Path(payment_id): Path<u64>,
) -> ApiResponse<PaymentStatus> {
    let Some(payments) = &state.payments else {
        return Err(ApiError::NotFound("Payments"));
    };
    let status = payments
        .payment_status(payment_id)
        .await
        .map_err(ApiError::Internal)?;
    Ok(Json(status))
}

pub fn payments_router(state: AppState) -> Router {
    Router::new()
        .route("/api/payments/preference", post(create_preference))
        .route("/api/payments/{id}/status", get(payment_status))
        .with_state(state)
}
