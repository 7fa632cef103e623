//! [`Booking`]-related read definitions.

#[cfg(doc)]
use crate::domain::Booking;

pub mod list {
    //! [`Booking`] list definitions.

    use common::define_pagination;

    use crate::domain::Booking;

    define_pagination!(Node, Filter);

    /// Node in a [`Page`].
    pub type Node = Booking;

    /// Filter for [`Selector`].
    pub type Filter = ();
}
