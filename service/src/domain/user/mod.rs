//! [`User`] definitions.

pub mod session;

use std::sync::LazyLock;

use argon2::{
    password_hash::{
        rand_core::OsRng, PasswordHash as Phc, PasswordHasher as _,
        PasswordVerifier as _, SaltString,
    },
    Argon2,
};
#[cfg(doc)]
use common::DateTime;
use common::{unit, DateTimeOf};
use derive_more::{AsRef, Display, From, FromStr, Into};
#[cfg(feature = "postgres")]
use postgres_types::{FromSql, ToSql};
use regex::Regex;
use secrecy::{zeroize::Zeroize, CloneableSecret};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub use self::session::Session;

/// Platform user, either a guest booking listings or a host owning them.
#[derive(Clone, Debug, From)]
pub struct User {
    /// ID of this [`User`].
    pub id: Id,

    /// [`Username`] of this [`User`].
    pub username: Username,

    /// [`Email`] of this [`User`], if any.
    pub email: Option<Email>,

    /// First [`Name`] of this [`User`].
    pub first_name: Name,

    /// Last [`Name`] of this [`User`].
    pub last_name: Name,

    /// [`PasswordHash`] of this [`User`].
    pub password_hash: PasswordHash,

    /// Indicator whether this [`User`] is a staff member.
    pub is_staff: bool,

    /// [`DateTime`] when this [`User`] was created.
    pub created_at: CreationDateTime,

    /// [`DateTime`] when this [`User`] was deleted.
    pub deleted_at: Option<DeletionDateTime>,
}

impl User {
    /// Returns the full name of this [`User`].
    ///
    /// Empty if neither first nor last name is set.
    #[must_use]
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
            .trim()
            .to_owned()
    }

    /// Returns the name this [`User`] is presented by to other users.
    ///
    /// Falls back to the [`Username`] if no full name is set.
    #[must_use]
    pub fn display_name(&self) -> String {
        let full = self.full_name();
        if full.is_empty() {
            self.username.to_string()
        } else {
            full
        }
    }
}

/// ID of a [`User`].
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

/// Unique login name of a [`User`].
#[derive(AsRef, Clone, Debug, Display, Eq, Hash, PartialEq)]
#[as_ref(str, String)]
#[cfg_attr(feature = "postgres", derive(FromSql, ToSql), postgres(transparent))]
pub struct Username(String);

impl Username {
    /// Creates a new [`Username`] if the given `username` is valid.
    #[must_use]
    pub fn new(username: impl Into<String>) -> Option<Self> {
        let username = username.into();
        Self::check(&username).then_some(Self(username))
    }

    /// Checks whether the given `username` is a valid [`Username`].
    fn check(username: impl AsRef<str>) -> bool {
        /// Letters, digits and `@`, `.`, `+`, `-`, `_` only, up to 150
        /// characters.
        static REGEX: LazyLock<Regex> = LazyLock::new(|| {
            Regex::new(r"^[\w.@+-]{1,150}$").expect("valid regex")
        });

        REGEX.is_match(username.as_ref())
    }
}

impl FromStr for Username {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s).ok_or(
            "enter a valid username: up to 150 letters, digits and \
             `@`/`.`/`+`/`-`/`_` characters",
        )
    }
}

/// First or last name of a [`User`].
///
/// May be empty.
#[derive(AsRef, Clone, Debug, Default, Display, Eq, PartialEq)]
#[as_ref(str, String)]
#[cfg_attr(feature = "postgres", derive(FromSql, ToSql), postgres(transparent))]
pub struct Name(String);

impl Name {
    /// Creates a new [`Name`] if the given `name` is valid.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Option<Self> {
        let name = name.into();
        Self::check(&name).then_some(Self(name))
    }

    /// Checks whether the given `name` is a valid [`Name`].
    fn check(name: impl AsRef<str>) -> bool {
        let name = name.as_ref();
        name.trim() == name && name.chars().count() <= 150
    }
}

impl FromStr for Name {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s).ok_or("ensure this field has no more than 150 characters")
    }
}

/// Password of a [`User`].
#[derive(Clone, Debug, Display, Eq, PartialEq)]
pub struct Password(String);

impl Password {
    /// Minimal length of a [`Password`].
    pub const MIN_LEN: usize = 8;

    /// Creates a new [`Password`].
    ///
    /// # Safety
    ///
    /// The caller must ensure that the given `password` matches the format.
    #[expect(unsafe_code, reason = "bypass")]
    #[must_use]
    pub unsafe fn new_unchecked(password: impl Into<String>) -> Self {
        Self(password.into())
    }

    /// Creates a new [`Password`] if the given `password` is valid.
    #[must_use]
    pub fn new(password: impl Into<String>) -> Option<Self> {
        let password = password.into();
        Self::check(&password).then_some(Self(password))
    }

    /// Checks whether the given `password` is a valid [`Password`].
    fn check(password: impl AsRef<str>) -> bool {
        let len = password.as_ref().chars().count();
        (Self::MIN_LEN..=128).contains(&len)
    }
}

impl FromStr for Password {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s).ok_or(
            "ensure this field has at least 8 and at most 128 characters",
        )
    }
}

impl CloneableSecret for Password {}
impl Zeroize for Password {
    fn zeroize(&mut self) {
        self.0.zeroize();
    }
}

/// Password hash of a [`User`] in the PHC string format.
#[derive(Clone, Debug, Display, Eq, PartialEq)]
#[cfg_attr(feature = "postgres", derive(FromSql, ToSql), postgres(transparent))]
pub struct PasswordHash(String);

impl PasswordHash {
    /// Prefix of unusable [`PasswordHash`]es.
    const UNUSABLE_PREFIX: char = '!';

    /// Hashes the given [`Password`] with [Argon2id] and a random salt.
    ///
    /// [Argon2id]: https://en.wikipedia.org/wiki/Argon2
    #[expect(clippy::missing_panics_doc, reason = "infallible")]
    #[must_use]
    pub fn new(password: &Password) -> Self {
        let salt = SaltString::generate(&mut OsRng);
        let hash = Argon2::default()
            .hash_password(password.0.as_bytes(), &salt)
            .expect("default `Argon2` parameters are valid");
        Self(hash.to_string())
    }

    /// Creates a [`PasswordHash`] no [`Password`] ever matches.
    #[must_use]
    pub fn unusable() -> Self {
        Self(format!("{}{}", Self::UNUSABLE_PREFIX, Uuid::new_v4().simple()))
    }

    /// Indicates whether this [`PasswordHash`] can match any [`Password`].
    #[must_use]
    pub fn is_usable(&self) -> bool {
        !self.0.starts_with(Self::UNUSABLE_PREFIX)
    }

    /// Verifies the given [`Password`] against this [`PasswordHash`].
    #[must_use]
    pub fn verify(&self, password: &Password) -> bool {
        if !self.is_usable() {
            return false;
        }
        Phc::new(&self.0).is_ok_and(|phc| {
            Argon2::default()
                .verify_password(password.0.as_bytes(), &phc)
                .is_ok()
        })
    }
}

/// Email address of a [`User`].
#[derive(AsRef, Clone, Debug, Display, Eq, Hash, PartialEq)]
#[as_ref(str, String)]
#[cfg_attr(feature = "postgres", derive(FromSql, ToSql), postgres(transparent))]
pub struct Email(String);

impl Email {
    /// Creates a new [`Email`] if the given `address` is valid.
    #[must_use]
    pub fn new(address: impl Into<String>) -> Option<Self> {
        let address = address.into();
        Self::check(&address).then_some(Self(address))
    }

    /// Checks whether the given `address` is a valid [`Email`].
    fn check(address: impl AsRef<str>) -> bool {
        /// Regular expression checking [`Email`] format.
        static REGEX: LazyLock<Regex> = LazyLock::new(|| {
            Regex::new(concat!(
                r"^[A-Za-z0-9.!#$%&'*+/=?^_`{|}~-]+",
                r"@[A-Za-z0-9](?:[A-Za-z0-9-]{0,61}[A-Za-z0-9])?",
                r"(?:\.[A-Za-z0-9](?:[A-Za-z0-9-]{0,61}[A-Za-z0-9])?)+$",
            ))
            .expect("valid regex")
        });

        let address = address.as_ref();
        address.len() <= 254 && REGEX.is_match(address)
    }
}

impl FromStr for Email {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s).ok_or("enter a valid email address")
    }
}

/// [`DateTime`] when a [`User`] was created.
pub type CreationDateTime = DateTimeOf<(User, unit::Creation)>;

/// [`DateTime`] when a [`User`] was deleted.
pub type DeletionDateTime = DateTimeOf<(User, unit::Deletion)>;

#[cfg(test)]
mod spec {
    use common::DateTime;

    use super::{Email, Id, Name, Password, PasswordHash, User, Username};

    fn user(first: &str, last: &str) -> User {
        User {
            id: Id::new(),
            username: Username::new("traveller_1").unwrap(),
            email: None,
            first_name: Name::new(first).unwrap(),
            last_name: Name::new(last).unwrap(),
            password_hash: PasswordHash::unusable(),
            is_staff: false,
            created_at: DateTime::now().coerce(),
            deleted_at: None,
        }
    }

    #[test]
    fn validates_usernames() {
        for valid in ["alice", "bob.smith", "c+d@e-f_g", "x"] {
            assert!(Username::new(valid).is_some(), "{valid}");
        }
        for invalid in ["", "with space", "semi;colon", &"a".repeat(151)] {
            assert!(Username::new(invalid).is_none(), "{invalid}");
        }
    }

    #[test]
    fn validates_emails() {
        assert!(Email::new("guest@example.com").is_some());
        assert!(Email::new("first.last+tag@sub.example.org").is_some());
        assert!(Email::new("no-at-sign").is_none());
        assert!(Email::new("two@@example.com").is_none());
        assert!(Email::new("nodomain@localhost").is_none());
    }

    #[test]
    fn password_min_length() {
        assert!(Password::new("short").is_none());
        assert!(Password::new("password123").is_some());
    }

    #[test]
    fn hashes_and_verifies_passwords() {
        let password = Password::new("password123").unwrap();
        let hash = PasswordHash::new(&password);

        assert!(hash.verify(&password));
        assert!(!hash.verify(&Password::new("password124").unwrap()));
        assert_ne!(hash, PasswordHash::new(&password), "salted");
    }

    #[test]
    fn unusable_hash_never_matches() {
        let hash = PasswordHash::unusable();

        assert!(!hash.is_usable());
        assert!(!hash.verify(&Password::new("password123").unwrap()));
    }

    #[test]
    fn display_name_falls_back_to_username() {
        assert_eq!(user("Abebe", "Bikila").display_name(), "Abebe Bikila");
        assert_eq!(user("Abebe", "").display_name(), "Abebe");
        assert_eq!(user("", "").display_name(), "traveller_1");
    }
}
