//! [`Booking`]-related REST API definitions.

use axum::{extract::Path, Json};
use common::{pagination, Date};
use http::StatusCode;
use serde::Serialize;
use service::{
    command::{self, Command as _},
    domain::{self, booking, listing, Price},
    query::{self, Query as _},
    read,
};

use crate::{
    api::{parse_id, Body, Page, Paging},
    define_error,
    error::NotFound,
    AsError, Context, Error, Validation,
};

/// Reservation of a listing made by a user.
#[derive(Clone, Debug, Serialize)]
pub struct Booking {
    /// ID of this [`Booking`].
    pub id: booking::Id,

    /// Username of the booking user, if they still exist.
    pub user: Option<String>,

    /// Title of the booked listing.
    pub listing: Option<String>,

    /// Check-in date.
    pub check_in: Date,

    /// Check-out date.
    pub check_out: Date,

    /// Number of guests.
    pub guests: u16,

    /// Total price.
    pub price: Price,

    /// Status of this [`Booking`].
    pub status: String,

    /// When this [`Booking`] was made.
    pub created_at: booking::CreationDateTime,
}

impl Booking {
    /// Renders the provided [`domain::Booking`]s, loading their users and
    /// listings.
    async fn render_all(
        ctx: &Context,
        bookings: Vec<domain::Booking>,
    ) -> Result<Vec<Self>, Error> {
        let user_ids = bookings.iter().map(|b| b.user_id).collect();
        let users = ctx
            .service()
            .execute(query::users::ByIds::by(user_ids))
            .await
            .map_err(AsError::into_error)?;
        let listing_ids = bookings.iter().map(|b| b.listing_id).collect();
        let listings = ctx
            .service()
            .execute(query::listings::ByIds::by(listing_ids))
            .await
            .map_err(AsError::into_error)?;

        Ok(bookings
            .into_iter()
            .map(|b| Self {
                id: b.id,
                user: users.get(&b.user_id).map(|u| u.username.to_string()),
                listing: listings
                    .get(&b.listing_id)
                    .map(|l| l.title.to_string()),
                check_in: b.stay.check_in(),
                check_out: b.stay.check_out(),
                guests: b.guests.get(),
                price: b.price,
                status: b.status.to_string(),
                created_at: b.created_at,
            })
            .collect())
    }

    /// Renders the provided [`domain::Booking`].
    async fn render(
        ctx: &Context,
        booking: domain::Booking,
    ) -> Result<Self, Error> {
        Self::render_all(ctx, vec![booking])
            .await?
            .pop()
            .ok_or_else(|| Error::internal(&"rendered no `Booking`"))
    }
}

/// Input of a [`Booking`] creation or update.
#[derive(Debug, Default)]
struct Input {
    check_in: Option<Date>,
    check_out: Option<Date>,
    guests: Option<booking::Guests>,
    price: Option<Price>,
}

impl Input {
    /// Reads an [`Input`] out of the provided [`Body`], recording invalid
    /// fields into the provided [`Validation`].
    ///
    /// Every field must be present if `complete` is set.
    fn read(v: &mut Validation, body: &Body, complete: bool) -> Self {
        let input = Self {
            check_in: v.parse(
                "check_in",
                body.text("check_in").as_deref(),
                complete,
            ),
            check_out: v.parse(
                "check_out",
                body.text("check_out").as_deref(),
                complete,
            ),
            guests: v.parse_with(
                "guests",
                body.text("guests").as_deref(),
                complete,
                parse_guests,
            ),
            price: v.parse("price", body.text("price").as_deref(), complete),
        };
        if let (Some(check_in), Some(check_out)) =
            (input.check_in, input.check_out)
        {
            if booking::Stay::new(check_in, check_out).is_none() {
                v.fail("check_out", "Check-out must be after check-in.");
            }
        }
        input
    }
}

/// Parses [`booking::Guests`].
fn parse_guests(s: &str) -> Result<booking::Guests, &'static str> {
    s.trim()
        .parse()
        .ok()
        .and_then(booking::Guests::new)
        .ok_or("A positive integer is required.")
}

/// Parses a [`booking::Status`] case-insensitively.
fn parse_status(s: &str) -> Result<booking::Status, String> {
    s.trim()
        .parse()
        .map_err(|_| format!("\"{s}\" is not a valid choice."))
}

/// Lists [`Booking`]s page by page.
///
/// # Errors
///
/// If the request is not authenticated or the requested page doesn't
/// exist.
pub async fn list(
    ctx: Context,
    paging: Paging,
) -> Result<Json<Page<Booking>>, Error> {
    _ = ctx.current_session().await?;
    let pagination::Page {
        items,
        number,
        size,
        total,
    } = ctx
        .service()
        .execute(query::bookings::List::by(read::booking::list::Selector {
            arguments: paging.arguments(),
            filter: (),
        }))
        .await
        .map_err(AsError::into_error)?;
    let items = Booking::render_all(&ctx, items).await?;
    paging
        .render(pagination::Page {
            items,
            number,
            size,
            total,
        })
        .map(Json)
}

/// Books a listing on behalf of the authenticated user.
///
/// # Errors
///
/// If the request is not authenticated, its input is invalid or the
/// listing doesn't exist.
pub async fn create(
    ctx: Context,
    body: Body,
) -> Result<(StatusCode, Json<Booking>), Error> {
    let session = ctx.current_session().await?;

    let mut v = Validation::default();
    let listing_id = v.parse_with(
        "listing",
        body.text("listing").as_deref(),
        true,
        |s| s.trim().parse::<listing::Id>().map_err(|_| "Invalid listing."),
    );
    let Input {
        check_in,
        check_out,
        guests,
        price,
    } = Input::read(&mut v, &body, true);
    let cmd = v.finish(|| {
        Some(command::CreateBooking {
            listing_id: listing_id?,
            user_id: session.user_id,
            stay: booking::Stay::new(check_in?, check_out?)?,
            guests: guests?,
            price: price?,
        })
    })?;

    let booking = ctx
        .service()
        .execute(cmd)
        .await
        .map_err(AsError::into_error)?;
    let booking = Booking::render(&ctx, booking).await?;
    Ok((StatusCode::CREATED, Json(booking)))
}

/// Retrieves a single [`Booking`].
///
/// # Errors
///
/// If the request is not authenticated or the [`Booking`] doesn't exist.
pub async fn retrieve(
    ctx: Context,
    Path(id): Path<String>,
) -> Result<Json<Booking>, Error> {
    _ = ctx.current_session().await?;
    let booking = ctx
        .service()
        .execute(query::booking::ById::by(parse_id(&id)?))
        .await
        .map_err(AsError::into_error)?
        .ok_or(NotFound)?;
    Booking::render(&ctx, booking).await.map(Json)
}

/// Replaces all the writable fields of a [`Booking`].
///
/// # Errors
///
/// If the request is not authenticated, the [`Booking`] doesn't exist or
/// any field is missing or invalid.
pub async fn update(
    ctx: Context,
    Path(id): Path<String>,
    body: Body,
) -> Result<Json<Booking>, Error> {
    apply_update(ctx, &id, &body, true).await
}

/// Updates the provided fields of a [`Booking`].
///
/// # Errors
///
/// If the request is not authenticated, the [`Booking`] doesn't exist or
/// any provided field is invalid.
pub async fn partial_update(
    ctx: Context,
    Path(id): Path<String>,
    body: Body,
) -> Result<Json<Booking>, Error> {
    apply_update(ctx, &id, &body, false).await
}

/// Updates a [`Booking`] with the provided [`Body`].
async fn apply_update(
    ctx: Context,
    id: &str,
    body: &Body,
    complete: bool,
) -> Result<Json<Booking>, Error> {
    _ = ctx.current_session().await?;
    let booking_id = parse_id(id)?;

    let mut v = Validation::default();
    let Input {
        check_in,
        check_out,
        guests,
        price,
    } = Input::read(&mut v, body, complete);
    let status = v.parse_with(
        "status",
        body.text("status").as_deref(),
        false,
        parse_status,
    );
    let cmd = v.finish(|| {
        Some(command::UpdateBooking {
            booking_id,
            check_in,
            check_out,
            guests,
            price,
            status,
        })
    })?;

    let booking = ctx
        .service()
        .execute(cmd)
        .await
        .map_err(AsError::into_error)?;
    Booking::render(&ctx, booking).await.map(Json)
}

/// Deletes a [`Booking`] along with its payments.
///
/// # Errors
///
/// If the request is not authenticated or the [`Booking`] doesn't exist.
pub async fn delete(
    ctx: Context,
    Path(id): Path<String>,
) -> Result<StatusCode, Error> {
    _ = ctx.current_session().await?;
    ctx.service()
        .execute(command::DeleteBooking {
            booking_id: parse_id(&id)?,
        })
        .await
        .map_err(AsError::into_error)?;
    Ok(StatusCode::NO_CONTENT)
}

impl AsError for command::create_booking::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        match self {
            Self::Db(e) => e.try_as_error(),
            Self::ListingNotExists(_) => {
                Some(BookingError::ListingNotExists.into())
            }
            Self::UserNotExists(_) => Some(NotFound.into()),
        }
    }
}

impl AsError for command::update_booking::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        match self {
            Self::BookingNotExists(_) => Some(NotFound.into()),
            Self::Db(e) => e.try_as_error(),
            Self::InvalidStay { .. } => Some(BookingError::InvalidStay.into()),
        }
    }
}

impl AsError for command::delete_booking::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        match self {
            Self::BookingNotExists(_) => Some(NotFound.into()),
            Self::Db(e) => e.try_as_error(),
        }
    }
}

define_error! {
    enum BookingError {
        #[code = "LISTING_NOT_EXISTS"]
        #[status = BAD_REQUEST]
        #[message = "Listing does not exist."]
        ListingNotExists,

        #[code = "INVALID_STAY"]
        #[status = BAD_REQUEST]
        #[message = "Check-out must be after check-in."]
        InvalidStay,
    }
}

#[cfg(test)]
mod spec {
    use service::domain::booking;

    use super::{parse_guests, parse_status, Input};
    use crate::{api::Body, Error, Validation};

    fn read(json: serde_json::Value, complete: bool) -> Result<Input, Error> {
        let body = serde_json::from_value(json).map(Body).unwrap();
        let mut v = Validation::default();
        let input = Input::read(&mut v, &body, complete);
        v.finish(|| Some(input))
    }

    #[test]
    fn parses_status_case_insensitively() {
        assert_eq!(
            parse_status("confirmed").unwrap(),
            booking::Status::Confirmed,
        );
        assert!(parse_status("paid").is_err());
    }

    #[test]
    fn requires_at_least_one_guest() {
        assert_eq!(parse_guests("2").unwrap().get(), 2);
        assert!(parse_guests("0").is_err());
    }

    #[test]
    fn rejects_check_out_not_after_check_in() {
        let err = read(
            serde_json::json!({
                "check_in": "2025-03-04",
                "check_out": "2025-03-04",
                "guests": 2,
                "price": "450.00",
            }),
            true,
        )
        .unwrap_err();

        assert!(err.details.unwrap().get("check_out").is_some());
    }

    #[test]
    fn accepts_partial_input() {
        let input = read(serde_json::json!({"guests": "3"}), false).unwrap();

        assert_eq!(input.guests.map(booking::Guests::get), Some(3));
        assert!(input.check_in.is_none());
        assert!(input.price.is_none());
    }
}
