//! [`Query`] collection related to the multiple [`Listing`]s.

use std::collections::HashMap;

use common::operations::By;

use crate::{
    domain::{listing, Listing},
    read,
};
#[cfg(doc)]
use crate::{domain::Review, Query};

use super::DatabaseQuery;

/// Queries multiple [`Listing`]s by their [`listing::Id`]s.
pub type ByIds =
    DatabaseQuery<By<HashMap<listing::Id, Listing>, Vec<listing::Id>>>;

/// Queries a list of [`Listing`]s.
pub type List = DatabaseQuery<
    By<read::listing::list::Page, read::listing::list::Selector>,
>;

/// Queries [`Review`] summaries of [`Listing`]s by their [`listing::Id`]s.
///
/// Every requested [`Listing`] has an entry, even without any [`Review`]s.
pub type Ratings = DatabaseQuery<
    By<HashMap<listing::Id, read::listing::Rating>, Vec<listing::Id>>,
>;
