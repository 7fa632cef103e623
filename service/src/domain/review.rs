//! [`Review`] definitions.

#[cfg(doc)]
use common::DateTime;
use common::{unit, DateTimeOf};
use derive_more::{AsRef, Display, From, FromStr, Into};
#[cfg(feature = "postgres")]
use postgres_types::{FromSql, ToSql};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::{listing, user};

/// Feedback left by a [`User`] on a [`Listing`].
///
/// A [`User`] reviews a [`Listing`] at most once.
///
/// [`Listing`]: crate::domain::Listing
/// [`User`]: crate::domain::User
#[derive(Clone, Debug)]
pub struct Review {
    /// ID of this [`Review`].
    pub id: Id,

    /// ID of the reviewed [`Listing`].
    ///
    /// [`Listing`]: crate::domain::Listing
    pub listing_id: listing::Id,

    /// ID of the reviewing [`User`].
    ///
    /// [`User`]: crate::domain::User
    pub user_id: user::Id,

    /// [`Rating`] of this [`Review`].
    pub rating: Rating,

    /// [`Comment`] of this [`Review`].
    pub comment: Comment,

    /// [`DateTime`] when this [`Review`] was created.
    pub created_at: CreationDateTime,
}

/// ID of a [`Review`].
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

/// Rating of a [`Review`], from 1 to 5.
#[derive(Clone, Copy, Debug, Display, Eq, Into, Ord, PartialEq, PartialOrd)]
pub struct Rating(u8);

impl Rating {
    /// Creates a new [`Rating`] if the given `stars` are within `1..=5`.
    #[must_use]
    pub fn new(stars: u8) -> Option<Self> {
        (1..=5).contains(&stars).then_some(Self(stars))
    }

    /// Returns the number of stars of this [`Rating`].
    #[must_use]
    pub fn get(self) -> u8 {
        self.0
    }
}

/// Free-form text of a [`Review`].
#[derive(AsRef, Clone, Debug, Default, Display, Eq, PartialEq)]
#[as_ref(str, String)]
#[cfg_attr(feature = "postgres", derive(FromSql, ToSql), postgres(transparent))]
pub struct Comment(String);

impl Comment {
    /// Creates a new [`Comment`] if the given `text` is valid.
    #[must_use]
    pub fn new(text: impl Into<String>) -> Option<Self> {
        let text = text.into();
        (text.chars().count() <= 5000).then_some(Self(text))
    }
}

impl FromStr for Comment {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s).ok_or("ensure this field has no more than 5000 characters")
    }
}

/// [`DateTime`] when a [`Review`] was created.
pub type CreationDateTime = DateTimeOf<(Review, unit::Creation)>;

#[cfg(test)]
mod spec {
    use super::Rating;

    #[test]
    fn rating_bounds() {
        assert!(Rating::new(0).is_none());
        assert!(Rating::new(6).is_none());
        for stars in 1..=5 {
            assert_eq!(Rating::new(stars).unwrap().get(), stars);
        }
    }
}
