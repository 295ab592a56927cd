//! Session and user directory handlers.
//!
//! ```text
//! POST   /api/v1/login {"email":"ana@example.com","password":"s3cret-pass"}
//! POST   /api/v1/logout
//! GET    /api/v1/users
//! POST   /api/v1/users
//! GET    /api/v1/users/{id}
//! PUT    /api/v1/users/{id}
//! DELETE /api/v1/users/{id}
//! ```

use actix_web::{HttpResponse, delete, get, post, put, web};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use utoipa::ToSchema;
use zeroize::Zeroizing;

use crate::domain::ports::{CreateUserRequest, UpdateUserRequest};
use crate::domain::{DirectoryUser, Error, LoginCredentials, LoginValidationError};
use crate::inbound::http::ApiResult;
use crate::inbound::http::session::SessionContext;
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation::parse_user_id;

/// Login request body for `POST /api/v1/login`.
#[derive(Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    #[schema(format = "email")]
    pub email: String,
    pub password: String,
}

impl TryFrom<LoginRequest> for LoginCredentials {
    type Error = LoginValidationError;

    fn try_from(value: LoginRequest) -> Result<Self, Self::Error> {
        let password = Zeroizing::new(value.password);
        Self::try_from_parts(&value.email, &password)
    }
}

fn map_login_validation_error(err: LoginValidationError) -> Error {
    match err {
        LoginValidationError::InvalidEmail => Error::invalid_request(err.to_string())
            .with_details(json!({ "field": "email", "code": "invalid_email" })),
        LoginValidationError::EmptyPassword => Error::invalid_request(err.to_string())
            .with_details(json!({ "field": "password", "code": "empty_password" })),
    }
}

/// Directory user as returned to clients. The credential never leaves the
/// server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserBody {
    #[schema(format = "uuid")]
    pub id: String,
    #[schema(example = "Ana Souza")]
    pub name: String,
    #[schema(format = "email")]
    pub email: String,
    pub active: bool,
    pub photo_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&DirectoryUser> for UserBody {
    fn from(user: &DirectoryUser) -> Self {
        Self {
            id: user.id.to_string(),
            name: user.name.to_string(),
            email: user.email.to_string(),
            active: user.active,
            photo_url: user.photo_url.as_ref().map(|url| url.as_ref().to_owned()),
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }
}

/// Registration payload for `POST /api/v1/users`.
#[derive(Deserialize, Serialize, ToSchema, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct CreateUserBody {
    pub name: String,
    #[schema(format = "email")]
    pub email: String,
    pub password: String,
    pub photo_url: Option<String>,
}

impl From<CreateUserBody> for CreateUserRequest {
    fn from(body: CreateUserBody) -> Self {
        Self {
            name: body.name,
            email: body.email,
            password: Zeroizing::new(body.password),
            photo_url: body.photo_url,
        }
    }
}

/// Partial update for `PUT /api/v1/users/{id}`; absent fields are kept.
#[derive(Debug, Deserialize, Serialize, ToSchema, Default)]
#[serde(rename_all = "camelCase")]
pub struct UpdateUserBody {
    pub name: Option<String>,
    #[schema(format = "email")]
    pub email: Option<String>,
    /// An empty string removes the photo.
    pub photo_url: Option<String>,
    pub active: Option<bool>,
}

impl From<UpdateUserBody> for UpdateUserRequest {
    fn from(body: UpdateUserBody) -> Self {
        Self {
            name: body.name,
            email: body.email,
            photo_url: body.photo_url,
            active: body.active,
        }
    }
}

/// Authenticate a directory user and establish a session.
#[utoipa::path(
    post,
    path = "/api/v1/login",
    request_body = LoginRequest,
    responses(
        (
            status = 200,
            description = "Login success",
            body = UserBody,
            headers(("Set-Cookie" = String, description = "Session cookie"))
        ),
        (status = 400, description = "Invalid request", body = Error),
        (status = 401, description = "Invalid credentials", body = Error),
        (status = 500, description = "Internal server error", body = Error)
    ),
    tags = ["users"],
    operation_id = "login",
    security([])
)]
#[post("/login")]
pub async fn login(
    state: web::Data<HttpState>,
    session: SessionContext,
    payload: web::Json<LoginRequest>,
) -> ApiResult<HttpResponse> {
    let credentials =
        LoginCredentials::try_from(payload.into_inner()).map_err(map_login_validation_error)?;
    let caller = state.login.authenticate(&credentials).await?;
    session.persist_caller(&caller)?;
    let user = state.users.get_user(&caller.user_id).await?;
    Ok(HttpResponse::Ok().json(UserBody::from(&user)))
}

/// End the current session.
#[utoipa::path(
    post,
    path = "/api/v1/logout",
    responses((status = 204, description = "Session cleared")),
    tags = ["users"],
    operation_id = "logout"
)]
#[post("/logout")]
pub async fn logout(session: SessionContext) -> HttpResponse {
    session.clear();
    HttpResponse::NoContent().finish()
}

/// List directory users ordered by name.
#[utoipa::path(
    get,
    path = "/api/v1/users",
    responses(
        (status = 200, description = "Users", body = [UserBody]),
        (status = 401, description = "Unauthorised", body = Error),
        (status = 503, description = "Service unavailable", body = Error)
    ),
    tags = ["users"],
    operation_id = "listUsers"
)]
#[get("/users")]
pub async fn list_users(
    state: web::Data<HttpState>,
    session: SessionContext,
) -> ApiResult<web::Json<Vec<UserBody>>> {
    session.require_caller()?;
    let users = state.users.list_users().await?;
    Ok(web::Json(users.iter().map(UserBody::from).collect()))
}

/// Fetch one directory user.
#[utoipa::path(
    get,
    path = "/api/v1/users/{id}",
    params(("id" = String, Path, description = "User identifier", format = "uuid")),
    responses(
        (status = 200, description = "User", body = UserBody),
        (status = 400, description = "Malformed identifier", body = Error),
        (status = 401, description = "Unauthorised", body = Error),
        (status = 404, description = "User not found", body = Error)
    ),
    tags = ["users"],
    operation_id = "getUser"
)]
#[get("/users/{id}")]
pub async fn get_user(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<String>,
) -> ApiResult<web::Json<UserBody>> {
    session.require_caller()?;
    let id = parse_user_id(&path.into_inner())?;
    let user = state.users.get_user(&id).await?;
    Ok(web::Json(UserBody::from(&user)))
}

/// Register a directory user with a login password.
#[utoipa::path(
    post,
    path = "/api/v1/users",
    request_body = CreateUserBody,
    responses(
        (status = 201, description = "User created", body = UserBody),
        (status = 400, description = "Invalid request", body = Error),
        (status = 401, description = "Unauthorised", body = Error),
        (status = 409, description = "Email already registered", body = Error)
    ),
    tags = ["users"],
    operation_id = "createUser"
)]
#[post("/users")]
pub async fn create_user(
    state: web::Data<HttpState>,
    session: SessionContext,
    payload: web::Json<CreateUserBody>,
) -> ApiResult<HttpResponse> {
    session.require_caller()?;
    let user = state.directory.create(payload.into_inner().into()).await?;
    Ok(HttpResponse::Created().json(UserBody::from(&user)))
}

/// Apply a partial update to a directory user.
#[utoipa::path(
    put,
    path = "/api/v1/users/{id}",
    params(("id" = String, Path, description = "User identifier", format = "uuid")),
    request_body = UpdateUserBody,
    responses(
        (status = 200, description = "User updated", body = UserBody),
        (status = 400, description = "Invalid request", body = Error),
        (status = 401, description = "Unauthorised", body = Error),
        (status = 404, description = "User not found", body = Error),
        (status = 409, description = "Email already registered", body = Error)
    ),
    tags = ["users"],
    operation_id = "updateUser"
)]
#[put("/users/{id}")]
pub async fn update_user(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<String>,
    payload: web::Json<UpdateUserBody>,
) -> ApiResult<web::Json<UserBody>> {
    session.require_caller()?;
    let id = parse_user_id(&path.into_inner())?;
    let user = state
        .directory
        .update(&id, payload.into_inner().into())
        .await?;
    Ok(web::Json(UserBody::from(&user)))
}

/// Delete a directory user that no ticket references.
#[utoipa::path(
    delete,
    path = "/api/v1/users/{id}",
    params(("id" = String, Path, description = "User identifier", format = "uuid")),
    responses(
        (status = 204, description = "User deleted"),
        (status = 401, description = "Unauthorised", body = Error),
        (status = 404, description = "User not found", body = Error),
        (status = 409, description = "User is referenced by tickets", body = Error)
    ),
    tags = ["users"],
    operation_id = "deleteUser"
)]
#[delete("/users/{id}")]
pub async fn delete_user(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<String>,
) -> ApiResult<HttpResponse> {
    session.require_caller()?;
    let id = parse_user_id(&path.into_inner())?;
    state.directory.delete(&id).await?;
    Ok(HttpResponse::NoContent().finish())
}
