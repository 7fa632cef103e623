//! Seeding of the database with sample data.

use common::{operations::Insert, pagination, Date, DateTime};
use rand::{rngs::StdRng, seq::IndexedRandom as _, Rng as _, SeedableRng as _};
use rust_decimal::Decimal;
use secrecy::SecretBox;
use service::{
    command::{self, Command as _},
    domain::{
        booking, listing, payment, review, user, Booking, Listing, Payment,
        Price, User,
    },
    infra::Database as _,
    query::{self, Query as _},
    read,
};
use tracing as log;

use crate::{AsError, Error, Service};

/// Password of every seeded [`User`].
pub const PASSWORD: &str = "password123";

/// Number of [`Listing`]s created by [`sample()`].
pub const LISTINGS: usize = 10;

const FIRST_NAMES: &[&str] = &[
    "Abebe", "Almaz", "Bekele", "Dawit", "Hana", "Kebede", "Liya", "Meron",
    "Selam", "Tigist", "Yonas", "Zewdu",
];

const LAST_NAMES: &[&str] = &[
    "Alemu", "Bekele", "Desta", "Gebre", "Haile", "Kassa", "Mekonnen",
    "Tadesse", "Tesfaye", "Worku",
];

const ADJECTIVES: &[&str] = &[
    "Cozy", "Grand", "Hidden", "Highland", "Lakeside", "Quiet", "Rustic",
    "Scenic", "Sunny",
];

const NOUNS: &[&str] = &[
    "Cabin", "Camp", "Escape", "Lodge", "Retreat", "Safari", "Trail", "Villa",
];

const LOCATIONS: &[&str] = &[
    "Addis Ababa",
    "Arba Minch",
    "Axum",
    "Bahir Dar",
    "Gondar",
    "Hawassa",
    "Lalibela",
    "Simien Mountains",
];

const COMMENTS: &[&str] = &[
    "Amazing stay, would come again.",
    "Friendly host and a great view.",
    "Decent place for the price.",
    "Not as clean as expected.",
    "",
];

/// Creates `count` [`User`]s with random names and the [`PASSWORD`].
///
/// Occupied usernames are skipped and regenerated.
///
/// # Errors
///
/// If any [`User`] fails to be created for another reason.
pub async fn users(service: &Service, count: usize) -> Result<(), Error> {
    let mut rng = StdRng::from_rng(&mut rand::rng());

    let mut created = 0;
    let mut attempts = 0;
    while created < count && attempts < count * 10 {
        attempts += 1;

        let first = FIRST_NAMES.choose(&mut rng).copied().unwrap_or("guest");
        let last = LAST_NAMES.choose(&mut rng).copied().unwrap_or("user");
        let raw = format!(
            "{}.{}{}",
            first.to_lowercase(),
            last.to_lowercase(),
            rng.random_range(1..1000),
        );
        let username = parse(raw.as_str())?;

        #[expect(unsafe_code, reason = "constant is long enough")]
        let password = unsafe { user::Password::new_unchecked(PASSWORD) };
        let res = service
            .execute(command::CreateUser {
                username,
                email: user::Email::new(format!("{raw}@example.com")),
                first_name: parse(first)?,
                last_name: parse(last)?,
                password: Some(SecretBox::init_with(move || password)),
            })
            .await;
        match res {
            Ok(user) => {
                log::info!("created `User(username: {})`", user.username);
                created += 1;
            }
            Err(e) => {
                if let command::create_user::ExecutionError::UsernameOccupied(
                    name,
                ) = e.as_ref()
                {
                    log::debug!("`{name}` username is occupied, skipping");
                } else {
                    return Err(e.into_error());
                }
            }
        }
    }

    log::info!("seeded {created} users");
    Ok(())
}

/// Creates [`LISTINGS`] [`Listing`]s hosted by existing [`User`]s, along
/// with [`Booking`]s, [`Payment`]s and [`Review`]s of them.
///
/// [`Review`]: service::domain::Review
///
/// # Errors
///
/// If there are no [`User`]s, or any record fails to be created.
pub async fn sample(service: &Service) -> Result<(), Error> {
    let users = all_users(service).await?;
    let Some(host) = users.first() else {
        return Err(Error::internal(
            &"no users found, run `seed-users` first",
        ));
    };
    let mut rng = StdRng::from_rng(&mut rand::rng());

    for _ in 0..LISTINGS {
        let listing = create_listing(service, &mut rng, host).await?;

        for _ in 0..rng.random_range(1..=3) {
            let Some(guest) = users.choose(&mut rng) else {
                continue;
            };
            let booking = insert_booking(service, &mut rng, &listing, guest)
                .await?;
            insert_payment(service, &mut rng, &booking).await?;
        }

        let reviewers = users.choose_multiple(&mut rng, 3);
        for reviewer in reviewers {
            create_review(service, &mut rng, &listing, reviewer).await?;
        }
    }

    log::info!("seeded {LISTINGS} listings");
    Ok(())
}

/// Selects all the existing [`User`]s page by page.
async fn all_users(service: &Service) -> Result<Vec<User>, Error> {
    let mut users = Vec::new();
    let mut number = 1_usize;
    loop {
        let arguments = pagination::Arguments::new(Some(number), 100)
            .ok_or_else(|| Error::internal(&"invalid page"))?;
        let page = service
            .execute(query::users::List::by(read::user::list::Selector {
                arguments,
                filter: (),
            }))
            .await
            .map_err(AsError::into_error)?;
        let has_next = page.has_next();
        users.extend(page.items);
        if !has_next {
            return Ok(users);
        }
        number += 1;
    }
}

/// Creates a random [`Listing`] hosted by the provided [`User`].
async fn create_listing(
    service: &Service,
    rng: &mut StdRng,
    host: &User,
) -> Result<Listing, Error> {
    let adjective = ADJECTIVES.choose(rng).copied().unwrap_or("Quiet");
    let noun = NOUNS.choose(rng).copied().unwrap_or("Lodge");
    let location = LOCATIONS.choose(rng).copied().unwrap_or("Addis Ababa");
    let kind = [
        listing::Kind::Hotel,
        listing::Kind::Tour,
        listing::Kind::Rental,
        listing::Kind::Activity,
    ]
    .choose(rng)
    .copied()
    .unwrap_or(listing::Kind::Hotel);

    let from = Date::today();
    let to = from
        .checked_add_days(rng.random_range(30..=180))
        .ok_or_else(|| Error::internal(&"date overflow"))?;
    let price = Price::new(Decimal::new(rng.random_range(2_000..=60_000), 2))
        .ok_or_else(|| Error::internal(&"invalid price"))?;

    service
        .execute(command::CreateListing {
            host_id: host.id,
            title: parse(format!("{adjective} {noun} {location}").as_str())?,
            description: parse(
                format!("{adjective} {noun} in {location}.").as_str(),
            )?,
            location: parse(location)?,
            kind,
            price,
            capacity: listing::Capacity::new(rng.random_range(1..=8))
                .ok_or_else(|| Error::internal(&"invalid capacity"))?,
            availability: listing::Availability::new(from, to)
                .ok_or_else(|| Error::internal(&"invalid availability"))?,
        })
        .await
        .map_err(AsError::into_error)
}

/// Inserts a random [`Booking`] of the provided [`Listing`] by the provided
/// [`User`].
///
/// Its [`Price`] is the [`Listing`]'s one multiplied by a random factor.
async fn insert_booking(
    service: &Service,
    rng: &mut StdRng,
    listing: &Listing,
    guest: &User,
) -> Result<Booking, Error> {
    let check_in = listing
        .availability
        .first_day()
        .checked_add_days(rng.random_range(0..=20))
        .ok_or_else(|| Error::internal(&"date overflow"))?;
    let check_out = check_in
        .checked_add_days(rng.random_range(1..=7))
        .ok_or_else(|| Error::internal(&"date overflow"))?;

    let booking = Booking {
        id: booking::Id::new(),
        listing_id: listing.id,
        user_id: guest.id,
        stay: booking::Stay::new(check_in, check_out)
            .ok_or_else(|| Error::internal(&"invalid stay"))?,
        guests: booking::Guests::new(
            rng.random_range(1..=listing.capacity.get()),
        )
        .ok_or_else(|| Error::internal(&"invalid guests"))?,
        price: listing
            .price
            .times(rng.random_range(1..=3))
            .ok_or_else(|| Error::internal(&"price overflow"))?,
        status: [
            booking::Status::Pending,
            booking::Status::Confirmed,
            booking::Status::Cancelled,
        ]
        .choose(rng)
        .copied()
        .unwrap_or(booking::Status::Pending),
        created_at: DateTime::now().coerce(),
    };
    service
        .database()
        .execute(Insert(booking.clone()))
        .await
        .map_err(AsError::into_error)?;
    Ok(booking)
}

/// Inserts a random [`Payment`] of the provided [`Booking`].
async fn insert_payment(
    service: &Service,
    rng: &mut StdRng,
    booking: &Booking,
) -> Result<(), Error> {
    let now = DateTime::now();
    let payment = Payment {
        id: payment::Id::new(),
        booking_id: booking.id,
        transaction_id: payment::TransactionId::new(
            uuid::Uuid::new_v4().to_string(),
        )
        .ok_or_else(|| Error::internal(&"invalid transaction ID"))?,
        amount: booking.price,
        status: [
            payment::Status::Pending,
            payment::Status::Completed,
            payment::Status::Failed,
        ]
        .choose(rng)
        .copied()
        .unwrap_or(payment::Status::Pending),
        created_at: now.coerce(),
        updated_at: now.coerce(),
    };
    service
        .database()
        .execute(Insert(payment))
        .await
        .map_err(AsError::into_error)
}

/// Leaves a random review of the provided [`Listing`] by the provided
/// [`User`], unless they have already reviewed it.
async fn create_review(
    service: &Service,
    rng: &mut StdRng,
    listing: &Listing,
    reviewer: &User,
) -> Result<(), Error> {
    let res = service
        .execute(command::CreateReview {
            listing_id: listing.id,
            user_id: reviewer.id,
            rating: review::Rating::new(rng.random_range(1..=5))
                .ok_or_else(|| Error::internal(&"invalid rating"))?,
            comment: parse(COMMENTS.choose(rng).copied().unwrap_or_default())?,
        })
        .await;
    match res {
        Ok(_) => Ok(()),
        Err(e) => match e.as_ref() {
            command::create_review::ExecutionError::AlreadyReviewed(_) => {
                Ok(())
            }
            command::create_review::ExecutionError::Db(_)
            | command::create_review::ExecutionError::ListingNotExists(_) => {
                Err(e.into_error())
            }
        },
    }
}

/// Parses a generated value.
fn parse<T>(raw: &str) -> Result<T, Error>
where
    T: std::str::FromStr<Err = &'static str>,
{
    raw.parse()
        .map_err(|e| Error::internal(&format!("`{raw}` is invalid: {e}")))
}

#[cfg(test)]
mod spec {
    use service::domain::{listing, user};

    use super::{parse, ADJECTIVES, FIRST_NAMES, LAST_NAMES, NOUNS, PASSWORD};

    #[test]
    fn password_is_valid() {
        assert!(user::Password::new(PASSWORD).is_some());
    }

    #[test]
    fn generated_values_are_valid() {
        for first in FIRST_NAMES {
            for last in LAST_NAMES {
                let raw = format!(
                    "{}.{}999",
                    first.to_lowercase(),
                    last.to_lowercase(),
                );
                assert!(parse::<user::Username>(&raw).is_ok(), "{raw}");
            }
        }
        for adjective in ADJECTIVES {
            for noun in NOUNS {
                let title = format!("{adjective} {noun} Simien Mountains");
                assert!(parse::<listing::Title>(&title).is_ok(), "{title}");
            }
        }
    }
}
