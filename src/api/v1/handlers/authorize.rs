/*
 * Responsibility
 * - POST /authorize
 * - gateway event → AuthorizationRequest → Authorizer → gateway response document
 */
use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
};

use crate::api::v1::dto::authorizer::{AuthorizerEvent, AuthorizerResponse};
use crate::error::AppError;
use crate::state::AppState;

pub async fn authorize(
    State(state): State<AppState>,
    payload: Result<Json<AuthorizerEvent>, JsonRejection>,
) -> Result<Json<AuthorizerResponse>, AppError> {
    let Json(event) = payload?;
    let request = event
        .into_request()
        .map_err(|message| AppError::bad_request("INVALID_AUTHORIZER_EVENT", message))?;

    let decision = state.authorizer.authorize(&request).await?;

    Ok(Json(AuthorizerResponse::from(&decision)))
}
