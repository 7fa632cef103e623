//! [`Listing`] definitions.

use std::sync::LazyLock;

#[cfg(doc)]
use common::DateTime;
use common::{define_kind, unit, Date, DateTimeOf};
use derive_more::{AsRef, Display, From, FromStr, Into};
#[cfg(feature = "postgres")]
use postgres_types::{FromSql, ToSql};
use regex::Regex;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::{user, Price};

/// Place or activity offered by a host for booking.
#[derive(Clone, Debug)]
pub struct Listing {
    /// ID of this [`Listing`].
    pub id: Id,

    /// [`Title`] of this [`Listing`].
    pub title: Title,

    /// Unique [`Slug`] of this [`Listing`].
    pub slug: Slug,

    /// [`Description`] of this [`Listing`].
    pub description: Description,

    /// ID of the [`User`] hosting this [`Listing`].
    ///
    /// [`User`]: crate::domain::User
    pub host_id: user::Id,

    /// [`Location`] of this [`Listing`].
    pub location: Location,

    /// [`Kind`] of this [`Listing`].
    pub kind: Kind,

    /// [`Price`] of this [`Listing`].
    pub price: Price,

    /// [`Capacity`] of this [`Listing`].
    pub capacity: Capacity,

    /// [`Availability`] window of this [`Listing`].
    pub availability: Availability,

    /// [`DateTime`] when this [`Listing`] was created.
    pub created_at: CreationDateTime,
}

/// ID of a [`Listing`].
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

/// Title of a [`Listing`].
#[derive(AsRef, Clone, Debug, Display, Eq, PartialEq)]
#[as_ref(str, String)]
#[cfg_attr(feature = "postgres", derive(FromSql, ToSql), postgres(transparent))]
pub struct Title(String);

impl Title {
    /// Maximum number of characters in a [`Title`].
    pub const MAX_LEN: usize = 200;

    /// Creates a new [`Title`] if the given `title` is valid.
    #[must_use]
    pub fn new(title: impl Into<String>) -> Option<Self> {
        let title = title.into();
        Self::check(&title).then_some(Self(title))
    }

    /// Checks whether the given `title` is a valid [`Title`].
    fn check(title: impl AsRef<str>) -> bool {
        let title = title.as_ref();
        title.trim() == title
            && !title.is_empty()
            && title.chars().count() <= Self::MAX_LEN
    }
}

impl FromStr for Title {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s).ok_or(
            "ensure this field is not blank and has no more than 200 \
             characters",
        )
    }
}

/// URL-friendly unique identifier of a [`Listing`] derived from its
/// [`Title`].
#[derive(AsRef, Clone, Debug, Display, Eq, Hash, PartialEq)]
#[as_ref(str, String)]
#[cfg_attr(feature = "postgres", derive(FromSql, ToSql), postgres(transparent))]
pub struct Slug(String);

impl Slug {
    /// [`Slug`] used when a [`Title`] has no sluggable characters.
    const FALLBACK: &'static str = "listing";

    /// Derives a [`Slug`] from the provided [`Title`].
    ///
    /// Characters other than ASCII letters, digits, underscores, hyphens and
    /// whitespace are dropped, the rest is lowercased and runs of hyphens and
    /// whitespace collapse into a single hyphen.
    #[must_use]
    pub fn from_title(title: &Title) -> Self {
        /// Characters dropped from a [`Slug`].
        static DISALLOWED: LazyLock<Regex> = LazyLock::new(|| {
            Regex::new(r"[^a-z0-9_\s-]").expect("valid regex")
        });
        /// Runs of separators collapsed into a single hyphen.
        static SEPARATORS: LazyLock<Regex> =
            LazyLock::new(|| Regex::new(r"[-\s]+").expect("valid regex"));

        let lower = AsRef::<str>::as_ref(title).to_lowercase();
        let kept = DISALLOWED.replace_all(&lower, "");
        let joined = SEPARATORS.replace_all(&kept, "-");
        let slug = joined
            .trim_matches(|c: char| c == '-' || c == '_')
            .to_owned();

        if slug.is_empty() {
            Self(Self::FALLBACK.into())
        } else {
            Self(slug)
        }
    }

    /// Returns this [`Slug`] with the provided numeric `suffix` appended.
    #[must_use]
    pub fn with_suffix(&self, suffix: u32) -> Self {
        Self(format!("{}-{suffix}", self.0))
    }
}

/// Description of a [`Listing`].
#[derive(AsRef, Clone, Debug, Display, Eq, PartialEq)]
#[as_ref(str, String)]
#[cfg_attr(feature = "postgres", derive(FromSql, ToSql), postgres(transparent))]
pub struct Description(String);

impl Description {
    /// Creates a new [`Description`] if the given `text` is not blank.
    #[must_use]
    pub fn new(text: impl Into<String>) -> Option<Self> {
        let text = text.into();
        (!text.trim().is_empty()).then_some(Self(text))
    }
}

impl FromStr for Description {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s).ok_or("this field may not be blank")
    }
}

/// Location of a [`Listing`].
#[derive(AsRef, Clone, Debug, Display, Eq, PartialEq)]
#[as_ref(str, String)]
#[cfg_attr(feature = "postgres", derive(FromSql, ToSql), postgres(transparent))]
pub struct Location(String);

impl Location {
    /// Creates a new [`Location`] if the given `location` is valid.
    #[must_use]
    pub fn new(location: impl Into<String>) -> Option<Self> {
        let location = location.into();
        Self::check(&location).then_some(Self(location))
    }

    /// Checks whether the given `location` is a valid [`Location`].
    fn check(location: impl AsRef<str>) -> bool {
        let location = location.as_ref();
        !location.trim().is_empty() && location.chars().count() <= 255
    }
}

impl FromStr for Location {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s).ok_or(
            "ensure this field is not blank and has no more than 255 \
             characters",
        )
    }
}

define_kind! {
    #[doc = "Kind of a [`Listing`]."]
    enum Kind {
        #[doc = "Hotel room or apartment."]
        Hotel = 1,

        #[doc = "Guided tour."]
        Tour = 2,

        #[doc = "Rental of a property or a vehicle."]
        Rental = 3,

        #[doc = "Activity or experience."]
        Activity = 4,
    }
}

/// Maximum number of guests a [`Listing`] accommodates.
#[derive(Clone, Copy, Debug, Display, Eq, Into, Ord, PartialEq, PartialOrd)]
pub struct Capacity(u16);

impl Capacity {
    /// Creates a new [`Capacity`] if the given `guests` number is positive.
    #[must_use]
    pub fn new(guests: u16) -> Option<Self> {
        (guests >= 1).then_some(Self(guests))
    }

    /// Returns the number of guests of this [`Capacity`].
    #[must_use]
    pub fn get(self) -> u16 {
        self.0
    }
}

/// Period a [`Listing`] is available for booking.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Availability {
    /// First available [`Date`].
    from: Date,

    /// Last available [`Date`].
    to: Date,
}

impl Availability {
    /// Creates a new [`Availability`] if `from` is not after `to`.
    #[must_use]
    pub fn new(from: Date, to: Date) -> Option<Self> {
        (from <= to).then_some(Self { from, to })
    }

    /// Returns the first available [`Date`].
    #[must_use]
    pub fn first_day(&self) -> Date {
        self.from
    }

    /// Returns the last available [`Date`].
    #[must_use]
    pub fn last_day(&self) -> Date {
        self.to
    }
}

/// [`DateTime`] when a [`Listing`] was created.
pub type CreationDateTime = DateTimeOf<(Listing, unit::Creation)>;

#[cfg(test)]
mod spec {
    use common::Date;

    use super::{Availability, Capacity, Kind, Slug, Title};

    fn slug(title: &str) -> String {
        Slug::from_title(&Title::new(title).unwrap()).to_string()
    }

    #[test]
    fn slugifies_titles() {
        assert_eq!(slug("Cozy Beach House"), "cozy-beach-house");
        assert_eq!(slug("Addis  Ababa -- City Tour!"), "addis-ababa-city-tour");
        assert_eq!(slug("Lake_Tana  Boat"), "lake_tana-boat");
        assert_eq!(slug("100% Fun & Games"), "100-fun-games");
    }

    #[test]
    fn falls_back_when_nothing_sluggable() {
        assert_eq!(slug("!!!"), "listing");
        assert_eq!(slug("ሰላም"), "listing");
    }

    #[test]
    fn appends_suffixes() {
        let base = Slug::from_title(&Title::new("Desert Trek").unwrap());

        assert_eq!(base.with_suffix(1).to_string(), "desert-trek-1");
        assert_eq!(base.with_suffix(12).to_string(), "desert-trek-12");
    }

    #[test]
    fn limits_title_length() {
        assert!(Title::new("a".repeat(Title::MAX_LEN)).is_some());
        assert!(Title::new("a".repeat(Title::MAX_LEN + 1)).is_none());
        assert!(Title::new("é".repeat(Title::MAX_LEN)).is_some());
    }

    #[test]
    fn longest_slug_fits_with_any_suffix() {
        let title = Title::new("a".repeat(Title::MAX_LEN)).unwrap();

        let slug = Slug::from_title(&title).with_suffix(u32::MAX);

        assert!(slug.to_string().len() <= 255, "{slug}");
    }

    #[test]
    fn parses_kinds_case_insensitively() {
        assert_eq!("hotel".parse::<Kind>().unwrap(), Kind::Hotel);
        assert_eq!("ACTIVITY".parse::<Kind>().unwrap(), Kind::Activity);
        assert_eq!(Kind::Rental.to_string(), "RENTAL");
        assert!("cruise".parse::<Kind>().is_err());
    }

    #[test]
    fn validates_capacity_and_availability() {
        assert!(Capacity::new(0).is_none());
        assert_eq!(Capacity::new(4).unwrap().get(), 4);

        let from: Date = "2025-06-01".parse().unwrap();
        let to: Date = "2025-06-30".parse().unwrap();
        assert!(Availability::new(from, to).is_some());
        assert!(Availability::new(from, from).is_some());
        assert!(Availability::new(to, from).is_none());
    }
}
