//! [`Command`] for creating a new [`User`].

use common::{
    operations::{By, Commit, Insert, Lock, Select, Transact, Transacted},
    DateTime,
};
use derive_more::{Display, Error, From};
use secrecy::{ExposeSecret, SecretBox};
use tracerr::Traced;

#[cfg(doc)]
use crate::domain::user::{Email, Name, Password, PasswordHash, Username};
use crate::{
    domain::{user, User},
    infra::{database, Database},
    Service,
};

use super::Command;

/// [`Command`] for creating a new [`User`].
#[derive(Clone, Debug)]
pub struct CreateUser {
    /// [`Username`] of a new [`User`].
    pub username: user::Username,

    /// [`Email`] of a new [`User`].
    pub email: Option<user::Email>,

    /// First [`Name`] of a new [`User`].
    pub first_name: user::Name,

    /// Last [`Name`] of a new [`User`].
    pub last_name: user::Name,

    /// [`Password`] of a new [`User`].
    ///
    /// If [`None`], the [`User`] gets an unusable [`PasswordHash`] and
    /// cannot sign in.
    pub password: Option<SecretBox<user::Password>>,
}

impl<Db, Gw, M> Command<CreateUser> for Service<Db, Gw, M>
where
    Db: Database<Transact, Err = Traced<database::Error>>,
    Transacted<Db>: for<'u> Database<
            Lock<By<User, &'u user::Username>>,
            Ok = (),
            Err = Traced<database::Error>,
        > + for<'u> Database<
            Select<By<Option<User>, &'u user::Username>>,
            Ok = Option<User>,
            Err = Traced<database::Error>,
        > + Database<Insert<User>, Ok = (), Err = Traced<database::Error>>
        + Database<Commit, Ok = (), Err = Traced<database::Error>>,
{
    type Ok = User;
    type Err = Traced<ExecutionError>;

    async fn execute(&self, cmd: CreateUser) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let CreateUser {
            username,
            email,
            first_name,
            last_name,
            password,
        } = cmd;

        let tx = self
            .database()
            .execute(Transact)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        // Serialize concurrent sign-ups with the same `Username`.
        tx.execute(Lock(By::new(&username)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        let existing = tx
            .execute(Select(By::<Option<User>, _>::new(&username)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;
        if existing.is_some() {
            return Err(tracerr::new!(E::UsernameOccupied(username)));
        }

        let password_hash =
            password.map_or_else(user::PasswordHash::unusable, |p| {
                user::PasswordHash::new(p.expose_secret())
            });
        let user = User {
            id: user::Id::new(),
            username,
            email,
            first_name,
            last_name,
            password_hash,
            is_staff: false,
            created_at: DateTime::now().coerce(),
            deleted_at: None,
        };

        tx.execute(Insert(user.clone()))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;
        tx.execute(Commit)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        Ok(user)
    }
}

/// Error of [`CreateUser`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    Db(database::Error),

    /// [`user::Username`] is already occupied.
    #[display("`{_0}` username is occupied")]
    #[from(ignore)]
    UsernameOccupied(#[error(not(source))] user::Username),
}

#[cfg(test)]
mod spec {
    use secrecy::SecretBox;

    use crate::{
        domain::user,
        infra::gateway::mock::Scripted,
        test_util::service,
        Command as _,
    };

    use super::{CreateUser, ExecutionError};

    fn create_user(username: &str, email: Option<&str>) -> CreateUser {
        CreateUser {
            username: user::Username::new(username).unwrap(),
            email: email.map(|e| user::Email::new(e).unwrap()),
            first_name: user::Name::new("Abebe").unwrap(),
            last_name: user::Name::new("Kebede").unwrap(),
            password: Some(SecretBox::new(Box::new(
                user::Password::new("password123").unwrap(),
            ))),
        }
    }

    #[tokio::test]
    async fn creates_user_with_hashed_password() {
        let (svc, db, _) = service(Scripted::default());

        let user = svc
            .execute(create_user("abebe", Some("abebe@example.com")))
            .await
            .unwrap();

        assert_eq!(user.username.to_string(), "abebe");
        assert!(!user.is_staff);
        assert!(user
            .password_hash
            .verify(&user::Password::new("password123").unwrap()));
        assert_eq!(db.users().len(), 1);
    }

    #[tokio::test]
    async fn creates_user_without_password() {
        let (svc, _, _) = service(Scripted::default());

        let user = svc
            .execute(CreateUser {
                password: None,
                ..create_user("almaz", None)
            })
            .await
            .unwrap();

        assert!(!user.password_hash.is_usable());
        assert!(user.email.is_none());
    }

    #[tokio::test]
    async fn rejects_occupied_username() {
        let (svc, db, _) = service(Scripted::default());
        _ = svc.execute(create_user("abebe", None)).await.unwrap();

        let err = svc.execute(create_user("abebe", None)).await.unwrap_err();

        assert!(matches!(
            err.as_ref(),
            ExecutionError::UsernameOccupied(u) if u.to_string() == "abebe",
        ));
        assert_eq!(db.users().len(), 1);
    }
}
