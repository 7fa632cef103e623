//! [`Listing`]-related read definitions.

#[cfg(doc)]
use crate::domain::{Listing, Review};

/// Summary of [`Review`]s left on a [`Listing`].
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Rating {
    /// Number of [`Review`]s.
    pub reviews_count: u32,

    /// Average rating across all [`Review`]s, if there are any.
    pub average: Option<f64>,
}

pub mod list {
    //! [`Listing`] list definitions.

    use common::define_pagination;

    use crate::domain::Listing;

    define_pagination!(Node, Filter);

    /// Node in a [`Page`].
    pub type Node = Listing;

    /// Filter for [`Selector`].
    pub type Filter = ();
}
