//! [`User`]-related read definitions.

#[cfg(doc)]
use crate::domain::User;

pub mod list {
    //! [`User`] list definitions.

    use common::define_pagination;

    use crate::domain::User;

    define_pagination!(Node, Filter);

    /// Node in a [`Page`].
    pub type Node = User;

    /// Filter for [`Selector`].
    pub type Filter = ();
}
