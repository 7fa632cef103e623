//! [`Command`] for updating a [`User`].

use common::operations::{
    By, Commit, Lock, Select, Transact, Transacted, Update,
};
use derive_more::{Display, Error, From};
use tracerr::Traced;

#[cfg(doc)]
use crate::domain::user::{Email, Name, Username};
use crate::{
    domain::{user, User},
    infra::{database, Database},
    Service,
};

use super::Command;

/// [`Command`] for updating a [`User`].
///
/// Fields left as [`None`] are not changed.
#[derive(Clone, Debug, Default)]
pub struct UpdateUser {
    /// ID of the [`User`] to update.
    pub user_id: user::Id,

    /// New [`Username`] of the [`User`].
    pub username: Option<user::Username>,

    /// New [`Email`] of the [`User`], `Some(None)` removes it.
    pub email: Option<Option<user::Email>>,

    /// New first [`Name`] of the [`User`].
    pub first_name: Option<user::Name>,

    /// New last [`Name`] of the [`User`].
    pub last_name: Option<user::Name>,
}

impl<Db, Gw, M> Command<UpdateUser> for Service<Db, Gw, M>
where
    Db: Database<Transact, Err = Traced<database::Error>>,
    Transacted<Db>: Database<
            Lock<By<User, user::Id>>,
            Ok = (),
            Err = Traced<database::Error>,
        > + Database<
            Select<By<Option<User>, user::Id>>,
            Ok = Option<User>,
            Err = Traced<database::Error>,
        > + for<'u> Database<
            Lock<By<User, &'u user::Username>>,
            Ok = (),
            Err = Traced<database::Error>,
        > + for<'u> Database<
            Select<By<Option<User>, &'u user::Username>>,
            Ok = Option<User>,
            Err = Traced<database::Error>,
        > + Database<Update<User>, Ok = (), Err = Traced<database::Error>>
        + Database<Commit, Ok = (), Err = Traced<database::Error>>,
{
    type Ok = User;
    type Err = Traced<ExecutionError>;

    async fn execute(&self, cmd: UpdateUser) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let UpdateUser {
            user_id,
            username,
            email,
            first_name,
            last_name,
        } = cmd;

        let tx = self
            .database()
            .execute(Transact)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        // Avoid concurrent actions upon the same `User`.
        tx.execute(Lock(By::new(user_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        let mut user = tx
            .execute(Select(By::<Option<User>, _>::new(user_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or(E::UserNotExists(user_id))
            .map_err(tracerr::wrap!())?;

        if let Some(username) = username.filter(|u| *u != user.username) {
            tx.execute(Lock(By::new(&username)))
                .await
                .map_err(tracerr::map_from_and_wrap!(=> E))?;
            let occupied = tx
                .execute(Select(By::<Option<User>, _>::new(&username)))
                .await
                .map_err(tracerr::map_from_and_wrap!(=> E))?
                .is_some();
            if occupied {
                return Err(tracerr::new!(E::UsernameOccupied(username)));
            }
            user.username = username;
        }
        if let Some(email) = email {
            user.email = email;
        }
        if let Some(name) = first_name {
            user.first_name = name;
        }
        if let Some(name) = last_name {
            user.last_name = name;
        }

        tx.execute(Update(user.clone()))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;
        tx.execute(Commit)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        Ok(user)
    }
}

/// Error of [`UpdateUser`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    Db(database::Error),

    /// [`User`] doesn't exist.
    #[display("`User(id: {_0})` does not exist")]
    #[from(ignore)]
    UserNotExists(#[error(not(source))] user::Id),

    /// [`user::Username`] is already occupied.
    #[display("`{_0}` username is occupied")]
    #[from(ignore)]
    UsernameOccupied(#[error(not(source))] user::Username),
}

#[cfg(test)]
mod spec {
    use crate::{
        command::Command as _,
        domain::user,
        infra::gateway::mock::Scripted,
        test_util::{service, user},
    };

    use super::{ExecutionError, UpdateUser};

    #[tokio::test]
    async fn updates_only_provided_fields() {
        let (svc, db, _) = service(Scripted::default());
        let abebe = user(&db, "abebe", Some("abebe@example.com")).await;

        let updated = svc
            .execute(UpdateUser {
                user_id: abebe.id,
                first_name: Some(user::Name::new("Abebe").unwrap()),
                email: Some(None),
                ..UpdateUser::default()
            })
            .await
            .unwrap();

        assert_eq!(updated.username, abebe.username);
        assert_eq!(updated.first_name.to_string(), "Abebe");
        assert!(updated.email.is_none());
        assert!(db.users()[0].email.is_none());
    }

    #[tokio::test]
    async fn rejects_occupied_username() {
        let (svc, db, _) = service(Scripted::default());
        let abebe = user(&db, "abebe", None).await;
        _ = user(&db, "almaz", None).await;

        let err = svc
            .execute(UpdateUser {
                user_id: abebe.id,
                username: Some(user::Username::new("almaz").unwrap()),
                ..UpdateUser::default()
            })
            .await
            .unwrap_err();

        assert!(matches!(err.as_ref(), ExecutionError::UsernameOccupied(_)));
    }

    #[tokio::test]
    async fn fails_on_unknown_user() {
        let (svc, _, _) = service(Scripted::default());

        let err = svc
            .execute(UpdateUser {
                user_id: user::Id::new(),
                ..UpdateUser::default()
            })
            .await
            .unwrap_err();

        assert!(matches!(err.as_ref(), ExecutionError::UserNotExists(_)));
    }
}
