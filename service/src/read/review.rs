//! [`Review`]-related read definitions.

#[cfg(doc)]
use crate::domain::Review;

pub mod list {
    //! [`Review`] list definitions.

    use common::define_pagination;

    use crate::domain::{listing, Review};

    define_pagination!(Node, Filter);

    /// Node in a [`Page`].
    pub type Node = Review;

    /// Filter for [`Selector`].
    #[derive(Clone, Copy, Debug)]
    pub struct Filter {
        /// ID of the [`Listing`] to list [`Review`]s of.
        ///
        /// [`Listing`]: crate::domain::Listing
        pub listing_id: listing::Id,
    }
}
