//! Account signup, login, and session check endpoints.

use axum::extract::State;
use axum::routing;
use axum::{Json, Router};
use serde::{Deserialize, Serialize};

use filegate_service::CreateUserError;

use crate::auth::password;
use crate::endpoints::common::{ApiError, ApiResult};
use crate::extractors::BearerToken;
use crate::state::ServiceState;

pub fn router() -> Router<ServiceState> {
    Router::new()
        .route("/signup", routing::post(signup))
        .route("/login", routing::post(login))
        .route("/me", routing::get(me))
}

/// Pulls a required field out of a request body, treating an empty
/// string like a missing value.
fn require(field: Option<&str>) -> Option<&str> {
    field.filter(|value| !value.is_empty())
}

/// Signup request body.
///
/// Fields are optional at the serde level so that missing input yields
/// the gateway's own 400 instead of a deserialization rejection.
#[derive(Debug, Deserialize)]
struct SignupRequest {
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    password: Option<String>,
    #[serde(default)]
    name: Option<String>,
}

#[derive(Debug, Serialize)]
struct SignupResponse {
    ok: bool,
    message: &'static str,
}

#[tracing::instrument(skip_all)]
async fn signup(
    State(state): State<ServiceState>,
    Json(body): Json<SignupRequest>,
) -> ApiResult<Json<SignupResponse>> {
    let (Some(email), Some(plaintext)) = (
        require(body.email.as_deref()),
        require(body.password.as_deref()),
    ) else {
        return Err(ApiError::Validation("Informe email e senha"));
    };
    let name = body.name.clone().filter(|name| !name.is_empty());

    let password_hash = password::hash(plaintext)
        .await
        .map_err(|err| ApiError::server("Falha ao criar usuário", err))?;

    match state.users.create(email, name, password_hash).await {
        Ok(_) => Ok(Json(SignupResponse {
            ok: true,
            message: "Usuário criado",
        })),
        Err(CreateUserError::AlreadyExists) => Err(ApiError::Conflict("Email já cadastrado")),
        Err(err) => Err(ApiError::server("Falha ao criar usuário", err)),
    }
}

#[derive(Debug, Deserialize)]
struct LoginRequest {
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    password: Option<String>,
}

#[derive(Debug, Serialize)]
struct LoginResponse {
    ok: bool,
    token: String,
    user: PublicUser,
}

/// The public fields of an account, as returned by login.
#[derive(Debug, Serialize)]
struct PublicUser {
    email: String,
    name: Option<String>,
}

#[tracing::instrument(skip_all)]
async fn login(
    State(state): State<ServiceState>,
    Json(body): Json<LoginRequest>,
) -> ApiResult<Json<LoginResponse>> {
    let (Some(email), Some(plaintext)) = (
        require(body.email.as_deref()),
        require(body.password.as_deref()),
    ) else {
        return Err(ApiError::Validation("Informe email e senha"));
    };

    let user = state
        .users
        .find_by_email(email)
        .await
        .map_err(|err| ApiError::server("Falha ao autenticar", err))?;

    // An unknown email and a wrong password produce the same response,
    // so a failed login reveals nothing about account existence.
    let Some(user) = user else {
        return Err(ApiError::Unauthorized("Credenciais inválidas"));
    };

    let matches = password::verify(plaintext, &user.password_hash)
        .await
        .map_err(|err| ApiError::server("Falha ao autenticar", err))?;
    if !matches {
        return Err(ApiError::Unauthorized("Credenciais inválidas"));
    }

    let token = state
        .tokens
        .issue(&user.email)
        .map_err(|err| ApiError::server("Falha ao autenticar", err))?;

    Ok(Json(LoginResponse {
        ok: true,
        token,
        user: PublicUser {
            email: user.email,
            name: user.name,
        },
    }))
}

#[derive(Debug, Serialize)]
struct MeResponse {
    ok: bool,
    me: String,
}

#[tracing::instrument(skip_all)]
async fn me(
    State(state): State<ServiceState>,
    BearerToken(token): BearerToken,
) -> ApiResult<Json<MeResponse>> {
    let subject = state
        .tokens
        .verify(&token)
        .map_err(|_| ApiError::Unauthorized("Token inválido"))?;

    Ok(Json(MeResponse {
        ok: true,
        me: subject,
    }))
}
