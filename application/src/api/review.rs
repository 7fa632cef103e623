//! [`Review`]-related REST API definitions.

use std::collections::HashMap;

use axum::{extract::Path, Json};
use common::pagination;
use http::StatusCode;
use serde::Serialize;
use service::{
    command::{self, Command as _},
    domain::{self, listing, review, user},
    query::{self, Query as _},
    read,
};

use crate::{
    api::{parse_id, Body, Page, Paging},
    define_error,
    error::NotFound,
    AsError, Context, Error, Validation,
};

/// Review left by a user on a listing.
#[derive(Clone, Debug, Serialize)]
pub struct Review {
    /// ID of this [`Review`].
    pub id: review::Id,

    /// ID of the reviewed listing.
    pub listing: listing::Id,

    /// Username of the reviewing user, if they still exist.
    pub user: Option<String>,

    /// Rating from 1 to 5.
    pub rating: u8,

    /// Free-form comment.
    pub comment: String,

    /// When this [`Review`] was left.
    pub created_at: review::CreationDateTime,
}

impl Review {
    /// Renders the provided [`domain::Review`]s, loading their authors.
    async fn render_all(
        ctx: &Context,
        reviews: Vec<domain::Review>,
    ) -> Result<Vec<Self>, Error> {
        let ids = reviews.iter().map(|r| r.user_id).collect();
        let users: HashMap<user::Id, domain::User> = ctx
            .service()
            .execute(query::users::ByIds::by(ids))
            .await
            .map_err(AsError::into_error)?;

        Ok(reviews
            .into_iter()
            .map(|r| Self {
                id: r.id,
                listing: r.listing_id,
                user: users.get(&r.user_id).map(|u| u.username.to_string()),
                rating: r.rating.get(),
                comment: r.comment.to_string(),
                created_at: r.created_at,
            })
            .collect())
    }
}

/// Parses a [`review::Rating`].
fn parse_rating(s: &str) -> Result<review::Rating, &'static str> {
    s.trim()
        .parse()
        .ok()
        .and_then(review::Rating::new)
        .ok_or("Rating must be an integer from 1 to 5.")
}

/// Lists [`Review`]s of a listing page by page.
///
/// # Errors
///
/// If the listing or the requested page doesn't exist.
pub async fn list(
    ctx: Context,
    Path(id): Path<String>,
    paging: Paging,
) -> Result<Json<Page<Review>>, Error> {
    let listing_id = parse_id(&id)?;
    _ = ctx
        .service()
        .execute(query::listing::ById::by(listing_id))
        .await
        .map_err(AsError::into_error)?
        .ok_or(NotFound)?;

    let pagination::Page {
        items,
        number,
        size,
        total,
    } = ctx
        .service()
        .execute(query::reviews::List::by(read::review::list::Selector {
            arguments: paging.arguments(),
            filter: read::review::list::Filter { listing_id },
        }))
        .await
        .map_err(AsError::into_error)?;
    let items = Review::render_all(&ctx, items).await?;
    paging
        .render(pagination::Page {
            items,
            number,
            size,
            total,
        })
        .map(Json)
}

/// Leaves a new [`Review`] of the authenticated user on a listing.
///
/// # Errors
///
/// If the request is not authenticated, the listing doesn't exist, the
/// input is invalid or the user has already reviewed the listing.
pub async fn create(
    ctx: Context,
    Path(id): Path<String>,
    body: Body,
) -> Result<(StatusCode, Json<Review>), Error> {
    let session = ctx.current_session().await?;
    let listing_id = parse_id(&id)?;

    let mut v = Validation::default();
    let rating = v.parse_with(
        "rating",
        body.text("rating").as_deref(),
        true,
        parse_rating,
    );
    let comment = v.parse::<review::Comment>(
        "comment",
        body.text("comment").as_deref(),
        false,
    );
    let cmd = v.finish(|| {
        Some(command::CreateReview {
            listing_id,
            user_id: session.user_id,
            rating: rating?,
            comment: comment.unwrap_or_default(),
        })
    })?;

    let review = ctx
        .service()
        .execute(cmd)
        .await
        .map_err(AsError::into_error)?;
    let review = Review::render_all(&ctx, vec![review])
        .await?
        .pop()
        .ok_or_else(|| Error::internal(&"rendered no `Review`"))?;
    Ok((StatusCode::CREATED, Json(review)))
}

impl AsError for command::create_review::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        match self {
            Self::AlreadyReviewed(_) => {
                Some(ReviewError::AlreadyReviewed.into())
            }
            Self::Db(e) => e.try_as_error(),
            Self::ListingNotExists(_) => Some(NotFound.into()),
        }
    }
}

define_error! {
    enum ReviewError {
        #[code = "ALREADY_REVIEWED"]
        #[status = BAD_REQUEST]
        #[message = "You have already reviewed this listing."]
        AlreadyReviewed,
    }
}

#[cfg(test)]
mod spec {
    use service::domain::review;

    use super::parse_rating;

    #[test]
    fn accepts_ratings_from_one_to_five() {
        for stars in 1..=5_u8 {
            assert_eq!(
                parse_rating(&stars.to_string()).unwrap(),
                review::Rating::new(stars).unwrap(),
            );
        }
        for raw in ["0", "6", "-1", "great"] {
            assert!(parse_rating(raw).is_err(), "{raw}");
        }
    }
}
