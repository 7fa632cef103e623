//! [`User`]-related REST API definitions.

use axum::{
    extract::Path,
    response::{IntoResponse as _, Response},
    Json,
};
use http::StatusCode;
use secrecy::SecretBox;
use serde::Serialize;
use service::{
    command::{self, Command as _},
    domain::{self, user},
    query::{self, Query as _},
    read,
};

use crate::{
    api::{parse_id, Body, Page, Paging},
    define_error,
    error::NotFound,
    AsError, Context, Error, Validation,
};

/// A user of the system.
#[derive(Clone, Debug, Serialize)]
pub struct User {
    /// ID of this [`User`].
    pub id: user::Id,

    /// Unique username of this [`User`].
    pub username: String,

    /// Email address of this [`User`], if any.
    pub email: Option<String>,

    /// First name of this [`User`].
    pub first_name: String,

    /// Last name of this [`User`].
    pub last_name: String,

    /// Indicates whether this [`User`] is a staff member.
    pub is_staff: bool,
}

impl From<domain::User> for User {
    fn from(user: domain::User) -> Self {
        Self {
            id: user.id,
            username: user.username.to_string(),
            email: user.email.map(|e| e.to_string()),
            first_name: user.first_name.to_string(),
            last_name: user.last_name.to_string(),
            is_staff: user.is_staff,
        }
    }
}

/// Issued access token.
#[derive(Clone, Debug, Serialize)]
pub struct Token {
    /// Bearer token to put into the `Authorization` header.
    pub access: String,

    /// When the [`Token`] expires.
    pub expires_at: user::session::ExpirationDateTime,
}

/// Profile fields of a [`User`].
#[derive(Debug, Default)]
struct Profile {
    username: Option<user::Username>,
    email: Option<Option<user::Email>>,
    first_name: Option<user::Name>,
    last_name: Option<user::Name>,
}

impl Profile {
    /// Reads a [`Profile`] out of the provided [`Body`], recording invalid
    /// fields into the provided [`Validation`].
    ///
    /// The `username` must be present if `complete` is set. An empty or
    /// `null` `email` clears it.
    fn read(v: &mut Validation, body: &Body, complete: bool) -> Self {
        let email = match body.text("email") {
            Some(e) if !e.trim().is_empty() => v
                .parse::<user::Email>("email", Some(e.trim()), false)
                .map(Some),
            Some(_) => Some(None),
            None => body.has("email").then_some(None),
        };
        Self {
            username: v.parse(
                "username",
                body.text("username").as_deref(),
                complete,
            ),
            email,
            first_name: v.parse(
                "first_name",
                body.text("first_name").as_deref(),
                false,
            ),
            last_name: v.parse(
                "last_name",
                body.text("last_name").as_deref(),
                false,
            ),
        }
    }
}

/// Lists [`User`]s page by page.
///
/// # Errors
///
/// If the requested page doesn't exist.
pub async fn list(
    ctx: Context,
    paging: Paging,
) -> Result<Json<Page<User>>, Error> {
    let page = ctx
        .service()
        .execute(query::users::List::by(read::user::list::Selector {
            arguments: paging.arguments(),
            filter: (),
        }))
        .await
        .map_err(AsError::into_error)?;
    paging.render(page.map(User::from)).map(Json)
}

/// Creates a new [`User`] without a password.
///
/// # Errors
///
/// If the request is not authenticated, its input is invalid or the
/// username is occupied.
#[tracing::instrument(skip_all)]
pub async fn create(
    ctx: Context,
    body: Body,
) -> Result<(StatusCode, Json<User>), Error> {
    _ = ctx.current_session().await?;

    let mut v = Validation::default();
    let Profile {
        username,
        email,
        first_name,
        last_name,
    } = Profile::read(&mut v, &body, true);
    let password = v.parse::<user::Password>(
        "password",
        body.text("password").as_deref(),
        false,
    );
    let cmd = v.finish(|| {
        Some(command::CreateUser {
            username: username?,
            email: email.flatten(),
            first_name: first_name.unwrap_or_default(),
            last_name: last_name.unwrap_or_default(),
            password: password.map(|p| SecretBox::init_with(move || p)),
        })
    })?;

    let user = ctx
        .service()
        .execute(cmd)
        .await
        .map_err(AsError::into_error)?;
    Ok((StatusCode::CREATED, Json(user.into())))
}

/// Registers a new [`User`] and redirects to the listings.
///
/// # Errors
///
/// If the input is invalid or the username is occupied.
#[tracing::instrument(skip_all)]
pub async fn sign_up(ctx: Context, body: Body) -> Result<Response, Error> {
    let mut v = Validation::default();
    let Profile {
        username,
        email,
        first_name,
        last_name,
    } = Profile::read(&mut v, &body, true);
    let password = v.parse::<user::Password>(
        "password",
        body.text("password").as_deref(),
        true,
    );
    let cmd = v.finish(|| {
        let password = password?;
        Some(command::SignUpUser {
            username: username?,
            email: email.flatten(),
            first_name: first_name.unwrap_or_default(),
            last_name: last_name.unwrap_or_default(),
            password: SecretBox::init_with(move || password),
        })
    })?;

    let user = ctx
        .service()
        .execute(cmd)
        .await
        .map_err(AsError::into_error)?;
    tracing::info!(user.id = %user.id, "signed up");

    Ok(to_listings())
}

/// Redirects to the listings with `302 Found`.
fn to_listings() -> Response {
    (
        StatusCode::FOUND,
        [(http::header::LOCATION, "/api/listings/")],
    )
        .into_response()
}

/// Exchanges credentials for an access [`Token`].
///
/// # Errors
///
/// If the credentials don't match any [`User`].
#[tracing::instrument(skip_all)]
pub async fn create_token(
    ctx: Context,
    body: Body,
) -> Result<Json<Token>, Error> {
    let mut v = Validation::default();
    let username = v.require("username", body.text("username"), true);
    let password = v.require("password", body.text("password"), true);
    let (username, password) =
        v.finish(|| Some((username?, password?)))?;

    let Ok(username) = username.parse::<user::Username>() else {
        return Err(UserError::WrongCredentials.into());
    };
    #[expect(unsafe_code, reason = "checked against the stored hash")]
    let password = unsafe { user::Password::new_unchecked(password) };

    let output = ctx
        .service()
        .execute(command::CreateUserSession {
            username,
            password: SecretBox::init_with(move || password),
        })
        .await
        .map_err(AsError::into_error)?;
    Ok(Json(Token {
        access: output.token.to_string(),
        expires_at: output.expires_at,
    }))
}

/// Retrieves the authenticated [`User`].
///
/// # Errors
///
/// If the request is not authenticated.
pub async fn me(ctx: Context) -> Result<Json<User>, Error> {
    let session = ctx.current_session().await?;
    let user = ctx
        .service()
        .execute(query::user::ById::by(session.user_id))
        .await
        .map_err(AsError::into_error)?
        .ok_or(NotFound)?;
    Ok(Json(user.into()))
}

/// Retrieves a single [`User`].
///
/// # Errors
///
/// If the [`User`] doesn't exist.
pub async fn retrieve(
    ctx: Context,
    Path(id): Path<String>,
) -> Result<Json<User>, Error> {
    let user = ctx
        .service()
        .execute(query::user::ById::by(parse_id(&id)?))
        .await
        .map_err(AsError::into_error)?
        .ok_or(NotFound)?;
    Ok(Json(user.into()))
}

/// Replaces the profile of a [`User`].
///
/// # Errors
///
/// If the request is not authenticated, the [`User`] doesn't exist or the
/// input is invalid.
pub async fn update(
    ctx: Context,
    Path(id): Path<String>,
    body: Body,
) -> Result<Json<User>, Error> {
    apply_update(ctx, &id, &body, true).await
}

/// Updates the provided profile fields of a [`User`].
///
/// # Errors
///
/// If the request is not authenticated, the [`User`] doesn't exist or any
/// provided field is invalid.
pub async fn partial_update(
    ctx: Context,
    Path(id): Path<String>,
    body: Body,
) -> Result<Json<User>, Error> {
    apply_update(ctx, &id, &body, false).await
}

/// Updates a [`User`] with the provided [`Body`].
#[tracing::instrument(skip(ctx, body))]
async fn apply_update(
    ctx: Context,
    id: &str,
    body: &Body,
    complete: bool,
) -> Result<Json<User>, Error> {
    _ = ctx.current_session().await?;
    let user_id = parse_id(id)?;

    let mut v = Validation::default();
    let Profile {
        username,
        email,
        first_name,
        last_name,
    } = Profile::read(&mut v, body, complete);
    let cmd = v.finish(|| {
        Some(command::UpdateUser {
            user_id,
            username,
            email,
            first_name,
            last_name,
        })
    })?;

    let user = ctx
        .service()
        .execute(cmd)
        .await
        .map_err(AsError::into_error)?;
    Ok(Json(user.into()))
}

/// Deletes a [`User`].
///
/// # Errors
///
/// If the request is not authenticated or the [`User`] doesn't exist.
#[tracing::instrument(skip_all)]
pub async fn delete(
    ctx: Context,
    Path(id): Path<String>,
) -> Result<StatusCode, Error> {
    _ = ctx.current_session().await?;
    ctx.service()
        .execute(command::DeleteUser {
            user_id: parse_id(&id)?,
        })
        .await
        .map_err(AsError::into_error)?;
    Ok(StatusCode::NO_CONTENT)
}

impl AsError for command::create_user::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        match self {
            Self::Db(e) => e.try_as_error(),
            Self::UsernameOccupied(_) => {
                Some(UserError::UsernameOccupied.into())
            }
        }
    }
}

impl AsError for command::sign_up_user::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        match self {
            Self::CreateUser(e) => e.try_as_error(),
        }
    }
}

impl AsError for command::create_user_session::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        match self {
            Self::Db(e) => e.try_as_error(),
            Self::JsonWebTokenEncodeError(_) => None,
            Self::WrongCredentials => Some(UserError::WrongCredentials.into()),
        }
    }
}

impl AsError for command::update_user::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        match self {
            Self::Db(e) => e.try_as_error(),
            Self::UserNotExists(_) => Some(NotFound.into()),
            Self::UsernameOccupied(_) => {
                Some(UserError::UsernameOccupied.into())
            }
        }
    }
}

impl AsError for command::delete_user::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        match self {
            Self::Db(e) => e.try_as_error(),
            Self::UserNotExists(_) => Some(NotFound.into()),
        }
    }
}

define_error! {
    enum UserError {
        #[code = "USERNAME_OCCUPIED"]
        #[status = BAD_REQUEST]
        #[message = "A user with that username already exists."]
        UsernameOccupied,

        #[code = "WRONG_CREDENTIALS"]
        #[status = UNAUTHORIZED]
        #[message = "No active account found with the given credentials"]
        WrongCredentials,
    }
}
