//! # User Commands
//!
//! Login and account management.
//!
//! `users:login` answers with the user and an opaque session token. The
//! token is only meaningful to this process (see [`SessionState`]).

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::ApiError;
use crate::state::{DbState, Session, SessionState};
use cafe_core::validation::{validate_id, validate_password, validate_username};
use cafe_core::{CoreError, NewUser, Role, User, UserUpdate};

#[derive(Debug, Clone, Deserialize)]
pub struct Credentials {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

/// The part of a user the register UI keeps after login.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct UserDto {
    pub id: i64,
    pub username: String,
    pub role: Role,
}

impl From<User> for UserDto {
    fn from(u: User) -> Self {
        UserDto {
            id: u.id,
            username: u.username,
            role: u.role,
        }
    }
}

impl From<Session> for UserDto {
    fn from(s: Session) -> Self {
        UserDto {
            id: s.user_id,
            username: s.username,
            role: s.role,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub user: UserDto,
    pub token: String,
}

/// `users:create` payload. Role defaults to cashier.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateUserRequest {
    pub username: String,
    pub password: String,
    #[serde(default = "default_role")]
    pub role: Role,
}

fn default_role() -> Role {
    Role::Cashier
}

pub async fn login(
    db: &DbState,
    sessions: &SessionState,
    credentials: Credentials,
) -> Result<LoginResponse, ApiError> {
    let username = credentials.username.trim();
    if username.is_empty() || credentials.password.is_empty() {
        return Err(ApiError::validation("Username and password are required"));
    }

    let user = db
        .inner()
        .users()
        .login(username, &credentials.password)
        .await?
        .ok_or(CoreError::InvalidCredentials)?;

    let token = sessions.open(&user);
    info!(user_id = user.id, role = %user.role, "User logged in");

    Ok(LoginResponse {
        user: user.into(),
        token,
    })
}

/// Ends a session. Unknown tokens are not an error.
pub fn logout(sessions: &SessionState, token: &str) -> bool {
    sessions.close(token)
}

/// The user behind a session token.
///
/// Lets the UI restore who is signed in after a reload. Tokens identify
/// sessions; they do not gate other channels.
pub fn session(sessions: &SessionState, token: &str) -> Result<UserDto, ApiError> {
    sessions
        .get(token)
        .map(UserDto::from)
        .ok_or_else(|| ApiError::unauthorized("Session expired or unknown"))
}

pub async fn list(db: &DbState) -> Result<Vec<User>, ApiError> {
    Ok(db.inner().users().list().await?)
}

pub async fn create(db: &DbState, request: CreateUserRequest) -> Result<User, ApiError> {
    validate_username(&request.username)?;
    validate_password(&request.password)?;

    let user = db
        .inner()
        .users()
        .create(&NewUser {
            username: request.username,
            password: request.password,
            role: request.role,
        })
        .await?;
    Ok(user)
}

/// Updates name and role; a non-empty password replaces the old one and
/// signs the user out everywhere.
pub async fn update(
    db: &DbState,
    sessions: &SessionState,
    id: i64,
    update: UserUpdate,
) -> Result<User, ApiError> {
    validate_id("id", id)?;
    validate_username(&update.username)?;

    let password_changed = match update.password.as_deref() {
        Some(p) if !p.is_empty() => {
            validate_password(p)?;
            true
        }
        _ => false,
    };

    let user = db.inner().users().update(id, &update).await?;
    if password_changed {
        sessions.close_user(id);
    }
    Ok(user)
}

pub async fn delete(db: &DbState, sessions: &SessionState, id: i64) -> Result<(), ApiError> {
    validate_id("id", id)?;
    db.inner().users().delete(id).await?;
    sessions.close_user(id);
    Ok(())
}
