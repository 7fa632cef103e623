//! REST API definitions.

pub mod booking;
pub mod listing;
pub mod payment;
pub mod review;
pub mod user;

use std::str::FromStr;

use axum::{
    async_trait,
    extract::{FromRequest, FromRequestParts, Query, Request},
    routing::{get, post},
    Json, RequestPartsExt as _, Router,
};
use common::pagination;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::{define_error, error::NotFound, AsError, Error};

/// Number of items on a single [`Page`].
pub const PAGE_SIZE: usize = 10;

/// Builds the [`Router`] serving the REST API.
pub fn router() -> Router {
    Router::new()
        .route("/api/listings/", get(listing::list).post(listing::create))
        .route(
            "/api/listings/:id/",
            get(listing::retrieve)
                .put(listing::update)
                .patch(listing::partial_update)
                .delete(listing::delete),
        )
        .route(
            "/api/listings/:id/reviews/",
            get(review::list).post(review::create),
        )
        .route("/api/bookings/", get(booking::list).post(booking::create))
        .route(
            "/api/bookings/:id/",
            get(booking::retrieve)
                .put(booking::update)
                .patch(booking::partial_update)
                .delete(booking::delete),
        )
        .route("/api/users/", get(user::list).post(user::create))
        .route("/api/users/me/", get(user::me))
        .route("/api/users/signup/", post(user::sign_up))
        .route(
            "/api/users/:id/",
            get(user::retrieve)
                .put(user::update)
                .patch(user::partial_update)
                .delete(user::delete),
        )
        .route("/api/token/", post(user::create_token))
        .route(
            "/api/payments/initiate/:booking_id/",
            post(payment::initiate),
        )
        .route(
            "/api/payments/verify/:transaction_id/",
            get(payment::verify),
        )
}

/// Parses an identifier out of a path segment.
///
/// # Errors
///
/// With a `404 Not Found` [`Error`] if the `raw` value is not a valid
/// identifier, as no resource can be found by it.
pub fn parse_id<T: FromStr>(raw: &str) -> Result<T, Error> {
    raw.parse().map_err(|_| NotFound.into())
}

/// JSON object body of a request.
///
/// Scalar fields are read as text, so numbers may be provided either as
/// JSON numbers or as strings.
#[derive(Clone, Debug, Default)]
pub struct Body(Map<String, Value>);

impl Body {
    /// Returns the textual value of the provided `field`.
    ///
    /// [`None`] is returned if the `field` is absent or `null`.
    #[must_use]
    pub fn text(&self, field: &str) -> Option<String> {
        match self.0.get(field)? {
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            Value::Bool(b) => Some(b.to_string()),
            Value::Null | Value::Array(_) | Value::Object(_) => None,
        }
    }

    /// Indicates whether the provided `field` is present, even as `null`.
    #[must_use]
    pub fn has(&self, field: &str) -> bool {
        self.0.contains_key(field)
    }
}

#[async_trait]
impl<S> FromRequest<S> for Body
where
    S: Send + Sync,
{
    type Rejection = Error;

    async fn from_request(
        req: Request,
        state: &S,
    ) -> Result<Self, Self::Rejection> {
        let Json(fields) =
            Json::<Map<String, Value>>::from_request(req, state)
                .await
                .map_err(AsError::into_error)?;
        Ok(Self(fields))
    }
}

/// Page of a list, as returned by the REST API.
#[derive(Clone, Debug, Serialize)]
pub struct Page<T> {
    /// Total number of items across all pages.
    pub count: usize,

    /// Link to the next page, if any.
    pub next: Option<String>,

    /// Link to the previous page, if any.
    pub previous: Option<String>,

    /// Items on this page.
    pub results: Vec<T>,
}

/// Query parameters of a list request.
#[derive(Clone, Debug, Default, Deserialize)]
struct PageQuery {
    /// Requested page number, the first one if omitted.
    page: Option<String>,
}

/// Extractor of a page-number pagination request.
#[derive(Clone, Debug)]
pub struct Paging {
    /// Requested [`pagination::Arguments`].
    arguments: pagination::Arguments,

    /// Requested path.
    path: String,

    /// Query parameters of the request, except the page number.
    params: Vec<String>,

    /// `Host` the request has been sent to, if known.
    host: Option<String>,
}

impl Paging {
    /// Returns the requested [`pagination::Arguments`].
    #[must_use]
    pub fn arguments(&self) -> pagination::Arguments {
        self.arguments
    }

    /// Renders the provided [`pagination::Page`] into a [`Page`].
    ///
    /// # Errors
    ///
    /// With a `404 Not Found` [`Error`] if the page is out of range.
    pub fn render<T>(
        &self,
        page: pagination::Page<T>,
    ) -> Result<Page<T>, Error> {
        if !page.exists() {
            return Err(PageError::Invalid.into());
        }
        Ok(Page {
            count: page.total,
            next: page.has_next().then(|| self.link(page.number + 1)),
            previous: page.has_previous().then(|| self.link(page.number - 1)),
            results: page.items,
        })
    }

    /// Builds a link to the page with the provided `number`.
    ///
    /// The first page is linked without a page number.
    fn link(&self, number: usize) -> String {
        let mut params = self.params.clone();
        if number > 1 {
            params.push(format!("page={number}"));
        }
        let mut link = match &self.host {
            Some(host) => format!("http://{host}{}", self.path),
            None => self.path.clone(),
        };
        if !params.is_empty() {
            link.push('?');
            link.push_str(&params.join("&"));
        }
        link
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for Paging
where
    S: Send + Sync,
{
    type Rejection = Error;

    async fn from_request_parts(
        parts: &mut http::request::Parts,
        _: &S,
    ) -> Result<Self, Self::Rejection> {
        let Query(query) = parts
            .extract::<Query<PageQuery>>()
            .await
            .map_err(AsError::into_error)?;

        let number = query
            .page
            .as_deref()
            .map(|p| p.trim().parse::<i64>())
            .transpose()
            .map_err(|_| Error::from(PageError::Invalid))?;
        let arguments = pagination::Arguments::new(number, PAGE_SIZE)
            .ok_or(PageError::Invalid)?;

        let params = parts
            .uri
            .query()
            .unwrap_or_default()
            .split('&')
            .filter(|p| !p.is_empty() && !p.starts_with("page="))
            .map(ToOwned::to_owned)
            .collect();
        let host = parts
            .headers
            .get(http::header::HOST)
            .and_then(|h| h.to_str().ok())
            .map(ToOwned::to_owned);

        Ok(Self {
            arguments,
            path: parts.uri.path().to_owned(),
            params,
            host,
        })
    }
}

define_error! {
    enum PageError {
        #[code = "INVALID_PAGE"]
        #[status = NOT_FOUND]
        #[message = "Invalid page."]
        Invalid,
    }
}

#[cfg(test)]
mod spec {
    use axum::extract::FromRequestParts as _;
    use common::pagination;

    use super::{Paging, PAGE_SIZE};

    async fn paging(uri: &str) -> Result<Paging, crate::Error> {
        let (mut parts, ()) = http::Request::builder()
            .uri(uri)
            .header(http::header::HOST, "travel.example.com")
            .body(())
            .unwrap()
            .into_parts();
        Paging::from_request_parts(&mut parts, &()).await
    }

    fn page(paging: &Paging, total: usize) -> pagination::Page<usize> {
        let args = paging.arguments();
        let items = (args.offset()..total.min(args.offset() + args.limit()))
            .collect::<Vec<_>>();
        pagination::Page::new(args, items, total)
    }

    #[tokio::test]
    async fn links_neighbour_pages() {
        let paging = paging("/api/listings/?page=2").await.unwrap();

        let rendered = paging.render(page(&paging, 25)).unwrap();

        assert_eq!(rendered.count, 25);
        assert_eq!(rendered.results.len(), PAGE_SIZE);
        assert_eq!(rendered.results[0], 10);
        assert_eq!(
            rendered.next.as_deref(),
            Some("http://travel.example.com/api/listings/?page=3"),
        );
        assert_eq!(
            rendered.previous.as_deref(),
            Some("http://travel.example.com/api/listings/"),
        );
    }

    #[tokio::test]
    async fn first_page_has_no_previous() {
        let paging = paging("/api/users/").await.unwrap();

        let rendered = paging.render(page(&paging, 3)).unwrap();

        assert_eq!(rendered.results, [0, 1, 2]);
        assert!(rendered.next.is_none());
        assert!(rendered.previous.is_none());
    }

    #[tokio::test]
    async fn rejects_out_of_range_pages() {
        for uri in ["/api/users/?page=0", "/api/users/?page=abc"] {
            let err = paging(uri).await.unwrap_err();
            assert_eq!(err.status_code, http::StatusCode::NOT_FOUND, "{uri}");
        }

        let paging = paging("/api/users/?page=4").await.unwrap();
        let err = paging.render(page(&paging, 25)).unwrap_err();
        assert_eq!(err.status_code, http::StatusCode::NOT_FOUND);
    }
}
