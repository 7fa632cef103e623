//! Background environment for running [`Task`]s.

use std::{
    error::Error as StdError,
    future::{Future, IntoFuture},
};

use derive_more::{Display, Error};
use futures::{future::LocalBoxFuture, FutureExt as _};
use tokio::task::{JoinSet, LocalSet};
use tracing as log;

#[cfg(doc)]
use crate::Task;

/// Background environment for running [`Task`]s.
///
/// [`Task`]s are `!Send` and run on the current thread, only while this
/// [`Background`] is being awaited.
#[derive(Debug, Default)]
pub struct Background {
    /// Local set the [`Task`]s are running on.
    set: LocalSet,

    /// Spawned [`Task`]s.
    tasks: JoinSet<Result<(), TaskError>>,
}

impl Background {
    /// Spawns a new [`Task`] with the provided `name` inside this
    /// [`Background`] environment.
    pub fn spawn<F, E>(&mut self, name: &'static str, task: F)
    where
        F: Future<Output = Result<(), E>> + 'static,
        E: StdError + 'static,
    {
        log::debug!("spawning `{name}` background task");
        _ = self.tasks.spawn_local_on(
            async move {
                task.await.map_err(|e| TaskError {
                    task: name,
                    cause: Box::new(e),
                })
            },
            &self.set,
        );
    }

    /// Returns the number of [`Task`]s spawned in this [`Background`].
    #[must_use]
    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    /// Indicates whether no [`Task`]s are spawned in this [`Background`].
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }
}

impl IntoFuture for Background {
    type Output = Result<(), TaskError>;
    type IntoFuture = LocalBoxFuture<'static, Self::Output>;

    /// Runs all the spawned [`Task`]s until they complete, or until the
    /// first of them fails.
    fn into_future(self) -> Self::IntoFuture {
        let Self { set, mut tasks } = self;
        async move {
            set.run_until(async move {
                while let Some(res) = tasks.join_next().await {
                    res.map_err(|e| TaskError {
                        task: "unknown",
                        cause: Box::new(e),
                    })??;
                }
                Ok::<_, TaskError>(())
            })
            .await
        }
        .boxed_local()
    }
}

/// Failure of a [`Task`] running in a [`Background`].
#[derive(Debug, Display, Error)]
#[display("`{task}` task failed: {cause}")]
pub struct TaskError {
    /// Name of the failed [`Task`].
    #[error(not(source))]
    pub task: &'static str,

    /// Cause of the failure.
    #[error(not(source))]
    pub cause: Box<dyn StdError>,
}
