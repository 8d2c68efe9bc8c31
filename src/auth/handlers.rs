use axum::{
    extract::{FromRef, State},
    http::StatusCode,
    routing::{get, post, put},
    Json, Router,
};
use tracing::{info, instrument};

use super::{
    dto::{
        AuthResponse, CartResponse, LoginRequest, MeResponse, Profile, PublicUser, RegisterRequest,
        UpdateCartRequest, UserCart,
    },
    extractors::AuthUser,
    jwt::JwtKeys,
    services,
};
use crate::{error::AppResult, extract::ApiJson, state::AppState};

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
        .route("/auth/me", get(get_me))
        .route("/auth/cart", get(get_cart).put(update_cart))
}

#[instrument(skip(state, payload))]
pub async fn register(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<RegisterRequest>,
) -> AppResult<(StatusCode, Json<AuthResponse>)> {
    let keys = JwtKeys::from_ref(&state);
    let (user, token) = services::register(state.store.as_ref(), &keys, payload).await?;
    Ok((
        StatusCode::CREATED,
        Json(AuthResponse { success: true, token, user: PublicUser::from(&user) }),
    ))
}

#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<LoginRequest>,
) -> AppResult<Json<AuthResponse>> {
    let keys = JwtKeys::from_ref(&state);
    let (user, token) = services::login(state.store.as_ref(), &keys, payload).await?;
    Ok(Json(AuthResponse { success: true, token, user: PublicUser::from(&user) }))
}

#[instrument(skip_all, fields(user_id = %user.id))]
pub async fn get_me(AuthUser(user): AuthUser) -> Json<MeResponse> {
    Json(MeResponse {
        success: true,
        user: Profile {
            id: user.id,
            name: user.name,
            email: user.email,
            created_at: user.created_at,
        },
    })
}

#[instrument(skip_all, fields(user_id = %user.id))]
pub async fn get_cart(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
) -> AppResult<Json<CartResponse>> {
    let cart = state.store.get_cart(user.id).await?;
    Ok(Json(CartResponse { success: true, user: UserCart { id: user.id, cart } }))
}

#[instrument(skip_all, fields(user_id = %user.id))]
pub async fn update_cart(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    ApiJson(payload): ApiJson<UpdateCartRequest>,
) -> AppResult<Json<CartResponse>> {
    let items = payload.cart.unwrap_or_default();
    services::validate_cart(&items)?;
    let cart = state.store.replace_cart(user.id, items).await?;
    info!(items = cart.len(), "cart saved");
    Ok(Json(CartResponse { success: true, user: UserCart { id: user.id, cart } }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::OffsetDateTime;
    use uuid::Uuid;

    #[test]
    fn me_response_serialization() {
        let response = MeResponse {
            success: true,
            user: Profile {
                id: Uuid::new_v4(),
                name: "Ada".into(),
                email: "test@example.com".into(),
                created_at: OffsetDateTime::UNIX_EPOCH,
            },
        };

        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["success"], true);
        assert_eq!(json["user"]["email"], "test@example.com");
        assert_eq!(json["user"]["createdAt"], "1970-01-01T00:00:00Z");
        assert!(json["user"].get("password_hash").is_none());
    }
}
