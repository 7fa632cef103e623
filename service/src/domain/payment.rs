//! [`Payment`] definitions.

#[cfg(doc)]
use common::DateTime;
use common::{define_kind, unit, DateTimeOf};
use derive_more::{AsRef, Display, From, FromStr, Into};
#[cfg(feature = "postgres")]
use postgres_types::{FromSql, ToSql};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::{booking, Price};

/// Payment of a [`Booking`] processed by the payment gateway.
///
/// [`Booking`]: crate::domain::Booking
#[derive(Clone, Debug)]
pub struct Payment {
    /// ID of this [`Payment`].
    pub id: Id,

    /// ID of the paid [`Booking`].
    ///
    /// [`Booking`]: crate::domain::Booking
    pub booking_id: booking::Id,

    /// Gateway [`TransactionId`] of this [`Payment`].
    pub transaction_id: TransactionId,

    /// Paid amount.
    pub amount: Price,

    /// [`Status`] of this [`Payment`].
    pub status: Status,

    /// [`DateTime`] when this [`Payment`] was created.
    pub created_at: CreationDateTime,

    /// [`DateTime`] when this [`Payment`] was last modified.
    pub updated_at: ModificationDateTime,
}

impl Payment {
    /// Moves this [`Payment`] into the provided [`Status`].
    ///
    /// Returns `false` if the transition is not allowed or changes nothing,
    /// leaving this [`Payment`] untouched.
    pub fn transition_to(&mut self, next: Status) -> bool {
        let Some(status) = self.status.transition_to(next) else {
            return false;
        };
        self.status = status;
        self.updated_at = ModificationDateTime::now();
        true
    }
}

/// ID of a [`Payment`].
#[derive(
    Clone,
    Copy,
    Debug,
    Default,
    Deserialize,
    Display,
    Eq,
    From,
    FromStr,
    Hash,
    Into,
    PartialEq,
    Serialize,
)]
#[cfg_attr(feature = "postgres", derive(ToSql, FromSql), postgres(transparent))]
pub struct Id(Uuid);

impl Id {
    /// Creates a new random [`Id`].
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

/// Identifier of a [`Payment`] transaction on the payment gateway side.
#[derive(AsRef, Clone, Debug, Display, Eq, Hash, PartialEq)]
#[as_ref(str, String)]
#[cfg_attr(feature = "postgres", derive(FromSql, ToSql), postgres(transparent))]
pub struct TransactionId(String);

impl TransactionId {
    /// Creates a new [`TransactionId`] if the given `id` is valid.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Option<Self> {
        let id = id.into();
        Self::check(&id).then_some(Self(id))
    }

    /// Creates the merchant-side reference of a transaction paying the
    /// provided [`Booking`].
    ///
    /// Used as the [`TransactionId`] if the payment gateway doesn't report
    /// its own one.
    ///
    /// [`Booking`]: crate::domain::Booking
    #[must_use]
    pub fn reference(booking_id: booking::Id) -> Self {
        Self(format!("booking-{booking_id}"))
    }

    /// Checks whether the given `id` is a valid [`TransactionId`].
    fn check(id: impl AsRef<str>) -> bool {
        let id = id.as_ref();
        !id.is_empty()
            && id.len() <= 100
            && !id.contains(|c: char| c.is_whitespace() || c == '/')
    }
}

impl FromStr for TransactionId {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s).ok_or("invalid transaction ID")
    }
}

define_kind! {
    #[doc = "Status of a [`Payment`]."]
    enum Status {
        #[doc = "[`Payment`] is initiated but not settled yet."]
        Pending = 1,

        #[doc = "[`Payment`] has been settled successfully."]
        Completed = 2,

        #[doc = "[`Payment`] has failed."]
        Failed = 3,
    }
}

impl Status {
    /// Maps a transaction status reported by the payment gateway into a
    /// [`Status`].
    ///
    /// Unknown statuses are considered [`Status::Pending`].
    #[must_use]
    pub fn from_gateway(status: &str) -> Self {
        match status.to_lowercase().as_str() {
            "successful" => Self::Completed,
            "failed" => Self::Failed,
            _ => Self::Pending,
        }
    }

    /// Indicates whether this [`Status`] is terminal.
    #[must_use]
    pub fn is_terminal(self) -> bool {
        !matches!(self, Self::Pending)
    }

    /// Returns the [`Status`] to move into, if moving from this [`Status`] to
    /// the `next` one is allowed and changes something.
    ///
    /// Only [`Status::Pending`] may be left, and only towards a terminal
    /// [`Status`].
    #[must_use]
    pub fn transition_to(self, next: Self) -> Option<Self> {
        (!self.is_terminal() && next.is_terminal()).then_some(next)
    }
}

/// [`DateTime`] when a [`Payment`] was created.
pub type CreationDateTime = DateTimeOf<(Payment, unit::Creation)>;

/// [`DateTime`] when a [`Payment`] was modified.
pub type ModificationDateTime = DateTimeOf<(Payment, unit::Modification)>;

#[cfg(test)]
mod spec {
    use crate::domain::booking;

    use super::{Status, TransactionId};

    #[test]
    fn maps_gateway_statuses() {
        assert_eq!(Status::from_gateway("successful"), Status::Completed);
        assert_eq!(Status::from_gateway("SUCCESSFUL"), Status::Completed);
        assert_eq!(Status::from_gateway("Failed"), Status::Failed);
        assert_eq!(Status::from_gateway("pending"), Status::Pending);
        assert_eq!(Status::from_gateway("refunded"), Status::Pending);
        assert_eq!(Status::from_gateway(""), Status::Pending);
    }

    #[test]
    fn leaves_only_pending() {
        use Status as S;

        assert_eq!(S::Pending.transition_to(S::Completed), Some(S::Completed));
        assert_eq!(S::Pending.transition_to(S::Failed), Some(S::Failed));
        assert_eq!(S::Pending.transition_to(S::Pending), None);

        for terminal in [S::Completed, S::Failed] {
            for next in S::ALL {
                assert_eq!(terminal.transition_to(*next), None);
            }
        }
    }

    #[test]
    fn validates_transaction_ids() {
        assert!(TransactionId::new("booking-1b2c").is_some());
        assert!(TransactionId::new("APn1Xk3").is_some());
        assert!(TransactionId::new("").is_none());
        assert!(TransactionId::new("a/b").is_none());
        assert!(TransactionId::new("with space").is_none());

        let id = booking::Id::new();
        let reference = TransactionId::reference(id);
        assert_eq!(reference.to_string(), format!("booking-{id}"));
        assert!(TransactionId::new(reference.to_string()).is_some());
    }
}
