//! Infrastructure layer.

pub mod database;
pub mod gateway;
pub mod mailer;
pub mod notifier;

pub use self::{
    database::Database, gateway::Gateway, mailer::Mailer, notifier::Notifier,
};
#[cfg(feature = "postgres")]
pub use self::database::{postgres, Postgres};
