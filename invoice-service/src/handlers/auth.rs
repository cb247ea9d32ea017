use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use service_core::error::AppError;

use crate::dtos::auth::{LoginRequest, LoginResponse, RegisterRequest, RegisterResponse};
use crate::startup::AppState;
use crate::utils::{Password, ValidatedJson};

pub async fn register(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<RegisterRequest>,
) -> Result<impl IntoResponse, AppError> {
    state
        .users
        .register(&req.name, &req.email, &Password::new(req.password))
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse {
            message: "User registered successfully".to_string(),
        }),
    ))
}

pub async fn login(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<LoginRequest>,
) -> Result<impl IntoResponse, AppError> {
    let user = state
        .users
        .authenticate(&req.email, &Password::new(req.password))
        .await?;

    let token = state.jwt.generate_token(&user.email, &user.name)?;
    tracing::info!(user = %user.email, "User logged in");

    Ok(Json(LoginResponse { token }))
}
