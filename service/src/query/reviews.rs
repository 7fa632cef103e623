//! [`Query`] collection related to the [`Review`]s of a [`Listing`].

use common::operations::By;

use crate::read;
#[cfg(doc)]
use crate::{
    domain::{Listing, Review},
    Query,
};

use super::DatabaseQuery;

/// Queries a list of [`Review`]s left on a [`Listing`].
pub type List =
    DatabaseQuery<By<read::review::list::Page, read::review::list::Selector>>;
