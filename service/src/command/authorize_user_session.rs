//! [`Command`] for authorizing a [`User`] by a [`Session`] token.

use common::operations::{By, Select};
use derive_more::{Display, Error, From};
use jsonwebtoken::{errors::ErrorKind, Validation};
use tracerr::Traced;

use crate::{
    domain::{
        user::{self, session, Session},
        User,
    },
    infra::{database, Database},
    Service,
};

use super::Command;

/// [`Command`] for authorizing a [`User`] by a [`Session`] token.
///
/// The token must be signed with the configured key, be unexpired and belong
/// to an existing [`User`].
#[derive(Clone, Debug, From)]
pub struct AuthorizeUserSession {
    /// [`Session`] token to authorize.
    pub token: session::Token,
}

impl<Db, Gw, M> Command<AuthorizeUserSession> for Service<Db, Gw, M>
where
    Db: Database<
        Select<By<Option<User>, user::Id>>,
        Ok = Option<User>,
        Err = Traced<database::Error>,
    >,
{
    type Ok = Session;
    type Err = Traced<ExecutionError>;

    async fn execute(
        &self,
        AuthorizeUserSession { token }: AuthorizeUserSession,
    ) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let mut validation = Validation::default();
        validation.leeway = 0;
        let session = jsonwebtoken::decode::<Session>(
            token.as_ref(),
            &self.config().jwt_decoding_key,
            &validation,
        )
        .map_err(|e| match e.kind() {
            ErrorKind::ExpiredSignature => E::Expired,
            _ => E::JsonWebTokenDecodeError(e),
        })
        .map_err(tracerr::wrap!())?
        .claims;

        let user_exists = self
            .database()
            .execute(Select(By::new(session.user_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .is_some();
        if !user_exists {
            return Err(tracerr::new!(E::UserNotExists(session.user_id)));
        }

        Ok(session)
    }
}

/// Error of [`AuthorizeUserSession`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    Db(database::Error),

    /// [`Session`] token has expired.
    #[display("`Session` token has expired")]
    Expired,

    /// [`jsonwebtoken`] decoding error.
    #[display("Failed to decode a JSON Web Token: {_0}")]
    JsonWebTokenDecodeError(jsonwebtoken::errors::Error),

    /// [`User`] the [`Session`] belongs to does not exist.
    #[display("`User(id: {_0})` does not exist")]
    #[from(ignore)]
    UserNotExists(#[error(not(source))] user::Id),
}

#[cfg(test)]
mod spec {
    use common::DateTime;

    use crate::{
        command::Command as _,
        domain::user::{self, session, Session},
        infra::gateway::mock::Scripted,
        test_util::{service, user},
    };

    use super::{AuthorizeUserSession, ExecutionError};

    fn sign(user_id: user::Id, expires_at: DateTime) -> session::Token {
        jsonwebtoken::encode(
            &jsonwebtoken::Header::default(),
            &Session {
                user_id,
                expires_at: expires_at.coerce(),
            },
            &jsonwebtoken::EncodingKey::from_secret(b"secret"),
        )
        .unwrap()
        .parse()
        .unwrap()
    }

    #[tokio::test]
    async fn rejects_malformed_token() {
        let (svc, _, _) = service(Scripted::default());

        let err = svc
            .execute(AuthorizeUserSession {
                token: "not-a-jwt".parse::<session::Token>().unwrap(),
            })
            .await
            .unwrap_err();

        assert!(matches!(
            err.as_ref(),
            ExecutionError::JsonWebTokenDecodeError(_),
        ));
    }

    #[tokio::test]
    async fn rejects_expired_token() {
        let (svc, db, _) = service(Scripted::default());
        let abebe = user(&db, "abebe", None).await;
        let past = DateTime::from_unix_timestamp(1_600_000_000).unwrap();

        let err = svc
            .execute(AuthorizeUserSession {
                token: sign(abebe.id, past),
            })
            .await
            .unwrap_err();

        assert!(matches!(err.as_ref(), ExecutionError::Expired));
    }

    #[tokio::test]
    async fn rejects_token_of_deleted_user() {
        let (svc, _, _) = service(Scripted::default());
        let ghost = user::Id::new();
        let future = DateTime::from_unix_timestamp(4_000_000_000).unwrap();

        let err = svc
            .execute(AuthorizeUserSession {
                token: sign(ghost, future),
            })
            .await
            .unwrap_err();

        assert!(matches!(err.as_ref(), ExecutionError::UserNotExists(id)
            if *id == ghost));
    }
}
