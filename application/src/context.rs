//! [`Context`]-related definitions.

use axum::{async_trait, extract::FromRequestParts, RequestPartsExt as _};
use axum_extra::{
    headers::{authorization::Bearer, Authorization},
    TypedHeader,
};
use common::DateTime;
use service::{
    command::{self, Command as _},
    domain::user::{self, session},
};

use crate::{define_error, AsError, Error, Service};

/// Request context.
///
/// Gives access to the [`Service`] and authenticates the request by its
/// `Authorization: Bearer` header.
#[derive(Debug)]
pub struct Context {
    /// [`Service`] instance.
    service: Service,

    /// `Authorization` header of the request, if any.
    authorization: Result<Authorization<Bearer>, AuthHeaderError>,
}

impl Context {
    /// Returns [`Service`] instance of this [`Context`].
    #[must_use]
    pub fn service(&self) -> &Service {
        &self.service
    }

    /// Returns the current [`Session`] for this [`Context`].
    ///
    /// # Errors
    ///
    /// Errors if:
    /// - the current HTTP request is not authorized;
    /// - the provided authentication token is invalid.
    pub async fn current_session(&self) -> Result<Session, Error> {
        let bearer = match &self.authorization {
            Ok(Authorization(bearer)) => bearer,
            Err(AuthHeaderError::Missing) => {
                return Err(AuthError::AuthorizationRequired.into());
            }
            Err(AuthHeaderError::Malformed) => {
                return Err(AuthError::MalformedHeader.into());
            }
        };

        #[expect(unsafe_code, reason = "specified in correct header")]
        let token =
            unsafe { session::Token::new_unchecked(bearer.token().to_owned()) };
        self.service
            .execute(command::AuthorizeUserSession {
                token: token.clone(),
            })
            .await
            .map(|s| Session {
                user_id: s.user_id,
                token,
                expires_at: s.expires_at.coerce(),
            })
            .map_err(AsError::into_error)
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for Context
where
    S: Send + Sync,
{
    type Rejection = Error;

    async fn from_request_parts(
        parts: &mut http::request::Parts,
        _: &S,
    ) -> Result<Self, Self::Rejection> {
        let service = parts
            .extensions
            .get::<Service>()
            .cloned()
            .ok_or_else(|| Error::internal(&"missing `Service` extension"))?;

        let authorization = parts
            .extract::<TypedHeader<Authorization<Bearer>>>()
            .await
            .map(|TypedHeader(auth)| auth)
            .map_err(|e| {
                if e.is_missing() {
                    AuthHeaderError::Missing
                } else {
                    AuthHeaderError::Malformed
                }
            });

        Ok(Self {
            service,
            authorization,
        })
    }
}

/// Failure of reading the `Authorization` header.
#[derive(Clone, Copy, Debug)]
enum AuthHeaderError {
    /// Header is absent.
    Missing,

    /// Header is not a valid `Bearer` authorization.
    Malformed,
}

/// User session.
#[derive(Clone, Debug)]
pub struct Session {
    /// ID of the [`User`] associated with this [`Session`].
    ///
    /// [`User`]: service::domain::User
    pub user_id: user::Id,

    /// Authentication token.
    pub token: session::Token,

    /// [`DateTime`] when this [`Session`] expires.
    pub expires_at: DateTime,
}

impl AsError for command::authorize_user_session::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        match self {
            Self::Db(e) => e.try_as_error(),
            Self::Expired => Some(AuthError::TokenExpired.into()),
            Self::JsonWebTokenDecodeError(_) | Self::UserNotExists(_) => {
                Some(AuthError::InvalidToken.into())
            }
        }
    }
}

define_error! {
    enum AuthError {
        #[code = "AUTHORIZATION_REQUIRED"]
        #[status = UNAUTHORIZED]
        #[message = "Authentication credentials were not provided."]
        AuthorizationRequired,

        #[code = "INVALID_TOKEN"]
        #[status = UNAUTHORIZED]
        #[message = "Given token not valid for any user"]
        InvalidToken,

        #[code = "TOKEN_EXPIRED"]
        #[status = UNAUTHORIZED]
        #[message = "Token is expired"]
        TokenExpired,

        #[code = "MALFORMED_AUTHORIZATION"]
        #[status = UNAUTHORIZED]
        #[message = "Authorization header must contain a `Bearer` token"]
        MalformedHeader,
    }
}
