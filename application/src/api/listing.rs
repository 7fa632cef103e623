//! [`Listing`]-related REST API definitions.

use std::collections::HashMap;

use axum::{extract::Path, Json};
use common::{pagination, Date};
use http::StatusCode;
use serde::Serialize;
use service::{
    command::{self, Command as _},
    domain::{self, listing, user, Price},
    query::{self, Query as _},
    read,
};

use crate::{
    api::{parse_id, Body, Page, Paging},
    define_error,
    error::NotFound,
    AsError, Context, Error, Validation,
};

/// Place or activity offered for booking.
#[derive(Clone, Debug, Serialize)]
pub struct Listing {
    /// ID of this [`Listing`].
    pub id: listing::Id,

    /// Title of this [`Listing`].
    pub title: String,

    /// Unique URL-friendly name of this [`Listing`].
    pub slug: String,

    /// Description of this [`Listing`].
    pub description: String,

    /// Username of the host of this [`Listing`].
    ///
    /// [`None`] if the host has been deleted.
    pub host: Option<String>,

    /// Location of this [`Listing`].
    pub location: String,

    /// Kind of this [`Listing`].
    pub listing_type: String,

    /// Price of this [`Listing`].
    pub price: Price,

    /// Maximum number of guests of this [`Listing`].
    pub capacity: u16,

    /// First day this [`Listing`] is available on.
    pub available_from: Date,

    /// Last day this [`Listing`] is available on.
    pub available_to: Date,

    /// When this [`Listing`] was created.
    pub created_at: listing::CreationDateTime,

    /// Number of reviews left on this [`Listing`].
    pub reviews_count: u32,

    /// Average rating of this [`Listing`], if it has any reviews.
    pub average_rating: Option<f64>,
}

impl Listing {
    /// Creates a new [`Listing`] out of the provided [`domain::Listing`].
    fn new(
        listing: domain::Listing,
        hosts: &HashMap<user::Id, domain::User>,
        ratings: &HashMap<listing::Id, read::listing::Rating>,
    ) -> Self {
        let rating = ratings.get(&listing.id).copied().unwrap_or_default();
        Self {
            id: listing.id,
            title: listing.title.to_string(),
            slug: listing.slug.to_string(),
            description: listing.description.to_string(),
            host: hosts.get(&listing.host_id).map(|u| u.username.to_string()),
            location: listing.location.to_string(),
            listing_type: listing.kind.to_string(),
            price: listing.price,
            capacity: listing.capacity.get(),
            available_from: listing.availability.first_day(),
            available_to: listing.availability.last_day(),
            created_at: listing.created_at,
            reviews_count: rating.reviews_count,
            average_rating: rating.average,
        }
    }

    /// Renders the provided [`domain::Listing`]s, loading their hosts and
    /// ratings.
    async fn render_all(
        ctx: &Context,
        listings: Vec<domain::Listing>,
    ) -> Result<Vec<Self>, Error> {
        let host_ids = listings.iter().map(|l| l.host_id).collect();
        let hosts = ctx
            .service()
            .execute(query::users::ByIds::by(host_ids))
            .await
            .map_err(AsError::into_error)?;
        let ids = listings.iter().map(|l| l.id).collect();
        let ratings = ctx
            .service()
            .execute(query::listings::Ratings::by(ids))
            .await
            .map_err(AsError::into_error)?;

        Ok(listings
            .into_iter()
            .map(|l| Self::new(l, &hosts, &ratings))
            .collect())
    }

    /// Renders the provided [`domain::Listing`].
    async fn render(
        ctx: &Context,
        listing: domain::Listing,
    ) -> Result<Self, Error> {
        Self::render_all(ctx, vec![listing])
            .await?
            .pop()
            .ok_or_else(|| Error::internal(&"rendered no `Listing`"))
    }
}

/// Input of a [`Listing`] creation or update.
#[derive(Debug, Default)]
struct Input {
    title: Option<listing::Title>,
    description: Option<listing::Description>,
    location: Option<listing::Location>,
    kind: Option<listing::Kind>,
    price: Option<Price>,
    capacity: Option<listing::Capacity>,
    available_from: Option<Date>,
    available_to: Option<Date>,
}

impl Input {
    /// Reads an [`Input`] out of the provided [`Body`], recording invalid
    /// fields into the provided [`Validation`].
    ///
    /// Every field must be present if `complete` is set.
    fn read(v: &mut Validation, body: &Body, complete: bool) -> Self {
        let input = Self {
            title: v.parse("title", body.text("title").as_deref(), complete),
            description: v.parse(
                "description",
                body.text("description").as_deref(),
                complete,
            ),
            location: v.parse(
                "location",
                body.text("location").as_deref(),
                complete,
            ),
            kind: v.parse_with(
                "listing_type",
                body.text("listing_type").as_deref(),
                complete,
                parse_kind,
            ),
            price: v.parse("price", body.text("price").as_deref(), complete),
            capacity: v.parse_with(
                "capacity",
                body.text("capacity").as_deref(),
                complete,
                parse_capacity,
            ),
            available_from: v.parse(
                "available_from",
                body.text("available_from").as_deref(),
                complete,
            ),
            available_to: v.parse(
                "available_to",
                body.text("available_to").as_deref(),
                complete,
            ),
        };
        if let (Some(from), Some(to)) =
            (input.available_from, input.available_to)
        {
            if from > to {
                v.fail(
                    "available_to",
                    "Must not be earlier than `available_from`.",
                );
            }
        }
        input
    }
}

/// Parses a [`listing::Kind`] case-insensitively.
fn parse_kind(s: &str) -> Result<listing::Kind, String> {
    s.trim()
        .parse()
        .map_err(|_| format!("\"{s}\" is not a valid choice."))
}

/// Parses a [`listing::Capacity`].
fn parse_capacity(s: &str) -> Result<listing::Capacity, &'static str> {
    s.trim()
        .parse()
        .ok()
        .and_then(listing::Capacity::new)
        .ok_or("A positive integer is required.")
}

/// Lists [`Listing`]s page by page.
///
/// # Errors
///
/// If the requested page doesn't exist.
pub async fn list(
    ctx: Context,
    paging: Paging,
) -> Result<Json<Page<Listing>>, Error> {
    let pagination::Page {
        items,
        number,
        size,
        total,
    } = ctx
        .service()
        .execute(query::listings::List::by(read::listing::list::Selector {
            arguments: paging.arguments(),
            filter: (),
        }))
        .await
        .map_err(AsError::into_error)?;
    let items = Listing::render_all(&ctx, items).await?;
    paging
        .render(pagination::Page {
            items,
            number,
            size,
            total,
        })
        .map(Json)
}

/// Creates a new [`Listing`] hosted by the authenticated user.
///
/// # Errors
///
/// If the request is not authenticated or its input is invalid.
pub async fn create(
    ctx: Context,
    body: Body,
) -> Result<(StatusCode, Json<Listing>), Error> {
    let session = ctx.current_session().await?;
    let mut v = Validation::default();
    let Input {
        title,
        description,
        location,
        kind,
        price,
        capacity,
        available_from,
        available_to,
    } = Input::read(&mut v, &body, true);
    let cmd = v.finish(|| {
        Some(command::CreateListing {
            host_id: session.user_id,
            title: title?,
            description: description?,
            location: location?,
            kind: kind?,
            price: price?,
            capacity: capacity?,
            availability: listing::Availability::new(
                available_from?,
                available_to?,
            )?,
        })
    })?;

    let listing = ctx
        .service()
        .execute(cmd)
        .await
        .map_err(AsError::into_error)?;
    let listing = Listing::render(&ctx, listing).await?;
    Ok((StatusCode::CREATED, Json(listing)))
}

/// Retrieves a single [`Listing`].
///
/// # Errors
///
/// If the [`Listing`] doesn't exist.
pub async fn retrieve(
    ctx: Context,
    Path(id): Path<String>,
) -> Result<Json<Listing>, Error> {
    let listing = ctx
        .service()
        .execute(query::listing::ById::by(parse_id(&id)?))
        .await
        .map_err(AsError::into_error)?
        .ok_or(NotFound)?;
    Listing::render(&ctx, listing).await.map(Json)
}

/// Replaces all the writable fields of a [`Listing`].
///
/// # Errors
///
/// If the request is not authenticated, the [`Listing`] doesn't exist or
/// any field is missing or invalid.
pub async fn update(
    ctx: Context,
    Path(id): Path<String>,
    body: Body,
) -> Result<Json<Listing>, Error> {
    apply_update(ctx, &id, &body, true).await
}

/// Updates the provided fields of a [`Listing`].
///
/// # Errors
///
/// If the request is not authenticated, the [`Listing`] doesn't exist or
/// any provided field is invalid.
pub async fn partial_update(
    ctx: Context,
    Path(id): Path<String>,
    body: Body,
) -> Result<Json<Listing>, Error> {
    apply_update(ctx, &id, &body, false).await
}

/// Updates a [`Listing`] with the provided [`Body`].
async fn apply_update(
    ctx: Context,
    id: &str,
    body: &Body,
    complete: bool,
) -> Result<Json<Listing>, Error> {
    _ = ctx.current_session().await?;
    let listing_id = parse_id(id)?;
    let mut v = Validation::default();
    let Input {
        title,
        description,
        location,
        kind,
        price,
        capacity,
        available_from,
        available_to,
    } = Input::read(&mut v, body, complete);
    let cmd = v.finish(|| {
        Some(command::UpdateListing {
            listing_id,
            title,
            description,
            location,
            kind,
            price,
            capacity,
            available_from,
            available_to,
        })
    })?;

    let listing = ctx
        .service()
        .execute(cmd)
        .await
        .map_err(AsError::into_error)?;
    Listing::render(&ctx, listing).await.map(Json)
}

/// Deletes a [`Listing`] along with its bookings and reviews.
///
/// # Errors
///
/// If the request is not authenticated or the [`Listing`] doesn't exist.
pub async fn delete(
    ctx: Context,
    Path(id): Path<String>,
) -> Result<StatusCode, Error> {
    _ = ctx.current_session().await?;
    ctx.service()
        .execute(command::DeleteListing {
            listing_id: parse_id(&id)?,
        })
        .await
        .map_err(AsError::into_error)?;
    Ok(StatusCode::NO_CONTENT)
}

impl AsError for command::create_listing::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        match self {
            Self::Db(e) => e.try_as_error(),
        }
    }
}

impl AsError for command::update_listing::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        match self {
            Self::Db(e) => e.try_as_error(),
            Self::InvalidAvailability { .. } => {
                Some(ListingError::InvalidAvailability.into())
            }
            Self::ListingNotExists(_) => Some(NotFound.into()),
        }
    }
}

impl AsError for command::delete_listing::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        match self {
            Self::Db(e) => e.try_as_error(),
            Self::ListingNotExists(_) => Some(NotFound.into()),
        }
    }
}

define_error! {
    enum ListingError {
        #[code = "INVALID_AVAILABILITY"]
        #[status = BAD_REQUEST]
        #[message = "`available_from` must not be after `available_to`."]
        InvalidAvailability,
    }
}

#[cfg(test)]
mod spec {
    use service::domain::listing;

    use super::{parse_capacity, parse_kind, Input};
    use crate::{api::Body, Error, Validation};

    fn read(json: serde_json::Value, complete: bool) -> Result<Input, Error> {
        let body = serde_json::from_value(json).map(Body).unwrap();
        let mut v = Validation::default();
        let input = Input::read(&mut v, &body, complete);
        v.finish(|| Some(input))
    }

    #[test]
    fn parses_kind_case_insensitively() {
        assert_eq!(parse_kind("hotel").unwrap(), listing::Kind::Hotel);
        assert_eq!(parse_kind("Tour").unwrap(), listing::Kind::Tour);
        assert!(parse_kind("castle").is_err());
    }

    #[test]
    fn rejects_zero_capacity() {
        assert_eq!(parse_capacity("3").unwrap().get(), 3);
        assert!(parse_capacity("0").is_err());
        assert!(parse_capacity("-2").is_err());
    }

    #[test]
    fn requires_every_field_when_complete() {
        let err = read(serde_json::json!({"title": "Simien Trek"}), true)
            .unwrap_err();
        let details = err.details.unwrap();

        assert!(details.get("title").is_none());
        for field in ["description", "price", "capacity", "available_to"] {
            assert!(details.get(field).is_some(), "{field}");
        }
    }

    #[test]
    fn accepts_subset_when_partial() {
        let input = read(
            serde_json::json!({"price": 120, "listing_type": "activity"}),
            false,
        )
        .unwrap();

        assert_eq!(input.price.unwrap().to_string(), "120.00");
        assert_eq!(input.kind, Some(listing::Kind::Activity));
        assert!(input.title.is_none());
    }

    #[test]
    fn rejects_inverted_availability() {
        let err = read(
            serde_json::json!({
                "available_from": "2025-06-10",
                "available_to": "2025-06-01",
            }),
            false,
        )
        .unwrap_err();

        assert!(err.details.unwrap().get("available_to").is_some());
    }
}
