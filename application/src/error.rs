//! [`Error`]-related definitions.

use std::{fmt, num::TryFromIntError, str::FromStr};

use axum::{
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    response::{IntoResponse, Response},
    Json,
};
use axum_extra::typed_header::TypedHeaderRejection;
use derive_more::Error as StdError;
use serde_json::{Map, Value};
use service::infra::{database, gateway};
use tracerr::{Trace, Traced};
use tracing as log;

/// Defines a new error type.
#[expect(clippy::module_name_repetitions, reason = "more readable")]
#[macro_export]
macro_rules! define_error {
    (
        enum $name:ident {
            $(
                #[code = $code:literal]
                #[status = $status_code:ident]
                #[message = $message:literal]
                $variant:ident
            ),* $(,)?
        }
    ) => {
        /// Error type.
        #[derive(
            Clone,
            Copy,
            Debug,
            ::derive_more::Display,
            ::derive_more::Error
        )]
        #[repr(u16)]
        pub enum $name {
            $(
                #[display($message)]
                #[doc = $message]
                $variant,
            )*
        }

        impl From<$name> for $crate::Error {
            fn from(err: $name) -> Self {
                match err {
                    $(
                        $name::$variant => Self {
                            code: $code,
                            status_code: ::http::StatusCode::$status_code,
                            message: $message.to_string(),
                            details: None,
                            backtrace: None,
                        },
                    )*
                }
            }
        }
    };
}

/// REST API [`Error`].
///
/// Rendered as a JSON object with `code`, `error` and optional `details`
/// fields.
#[derive(Clone, Debug, StdError)]
pub struct Error {
    /// [`Error`] code.
    pub code: Code,

    /// [`http::StatusCode`] of this [`Error`].
    pub status_code: http::StatusCode,

    /// Backtrace of this [`Error`].
    #[error(not(backtrace))]
    pub backtrace: Option<Trace>,

    /// [`Error`] message.
    pub message: String,

    /// Additional details of this [`Error`], if any.
    pub details: Option<Value>,
}

impl Error {
    /// Create a new [`Error`] representing an internal server error.
    #[must_use]
    pub fn internal(msg: &impl ToString) -> Self {
        Self {
            code: "INTERNAL_SERVER_ERROR",
            status_code: http::StatusCode::INTERNAL_SERVER_ERROR,
            message: msg.to_string(),
            details: None,
            backtrace: None,
        }
    }

    /// Attaches the provided `details` to this [`Error`].
    #[must_use]
    pub fn with_details(mut self, details: Value) -> Self {
        self.details = Some(details);
        self
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Self {
            code,
            status_code: _,
            backtrace,
            message,
            details: _,
        } = self;

        write!(f, "[{code}]: {message}")?;
        if let Some(trace) = backtrace {
            write!(f, "\n{trace}")?;
        }
        Ok(())
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        if self.status_code.is_server_error() {
            log::error!("{self}");
        }

        let mut body = Map::with_capacity(3);
        drop(body.insert("code".into(), self.code.into()));
        drop(body.insert("error".into(), self.message.into()));
        if let Some(details) = self.details {
            drop(body.insert("details".into(), details));
        }
        (self.status_code, Json(Value::Object(body))).into_response()
    }
}

/// [`Error`] code.
pub type Code = &'static str;

/// Helper trait for converting types into [`Error`]s.
pub trait AsError {
    /// Tries to convert the type into an [`Error`].
    ///
    /// [`None`] is returned if the type cannot be converted into an [`Error`].
    fn try_as_error(&self) -> Option<Error>;

    /// Converts the type into an [`Error`].
    fn as_error(&self) -> Error
    where
        Self: fmt::Display,
    {
        self.try_as_error()
            .unwrap_or_else(|| Error::internal(&self))
    }

    /// Converts the type into an [`Error`] by consuming it.
    fn into_error(self) -> Error
    where
        Self: fmt::Display + Sized,
    {
        self.as_error()
    }
}

impl<E: AsError + fmt::Display> AsError for Traced<E> {
    fn try_as_error(&self) -> Option<Error> {
        let mut error = self.as_ref().try_as_error()?;
        error.backtrace = Some(self.trace().clone());
        Some(error)
    }

    fn as_error(&self) -> Error {
        let mut error = self.as_ref().as_error();
        error.backtrace = Some(self.trace().clone());
        error
    }
}

impl AsError for TypedHeaderRejection {
    fn try_as_error(&self) -> Option<Error> {
        Some(Error {
            code: "BAD_REQUEST",
            status_code: http::StatusCode::BAD_REQUEST,
            message: self.to_string(),
            details: None,
            backtrace: None,
        })
    }
}

impl AsError for JsonRejection {
    fn try_as_error(&self) -> Option<Error> {
        Some(Error {
            code: "INVALID_BODY",
            status_code: self.status(),
            message: self.body_text(),
            details: None,
            backtrace: None,
        })
    }
}

impl AsError for QueryRejection {
    fn try_as_error(&self) -> Option<Error> {
        Some(Error {
            code: "INVALID_QUERY",
            status_code: self.status(),
            message: self.body_text(),
            details: None,
            backtrace: None,
        })
    }
}

impl AsError for PathRejection {
    fn try_as_error(&self) -> Option<Error> {
        Some(NotFound.into())
    }
}

impl AsError for database::Error {
    fn try_as_error(&self) -> Option<Error> {
        None
    }
}

impl AsError for gateway::Error {
    fn try_as_error(&self) -> Option<Error> {
        None
    }
}

impl AsError for TryFromIntError {
    fn try_as_error(&self) -> Option<Error> {
        None
    }
}

/// [`Error`] of a missing resource.
#[derive(Clone, Copy, Debug)]
pub struct NotFound;

impl From<NotFound> for Error {
    fn from(_: NotFound) -> Self {
        Self {
            code: "NOT_FOUND",
            status_code: http::StatusCode::NOT_FOUND,
            message: "Not found.".into(),
            details: None,
            backtrace: None,
        }
    }
}

/// Collector of per-field input validation failures.
///
/// Failures are reported all at once, as a single [`Error`] with a list of
/// messages for every invalid field under its `details`.
#[derive(Debug, Default)]
pub struct Validation {
    /// Messages of the failed fields.
    failures: Map<String, Value>,
}

impl Validation {
    /// Message of a missing required field.
    pub const REQUIRED: &'static str = "This field is required.";

    /// Records a failure `message` for the provided `field`.
    pub fn fail(&mut self, field: &str, message: impl fmt::Display) {
        let messages = self
            .failures
            .entry(field)
            .or_insert_with(|| Value::Array(Vec::new()));
        if let Value::Array(list) = messages {
            list.push(message.to_string().into());
        }
    }

    /// Checks the provided parsing `result` of the `field`, recording its
    /// failure, if any.
    pub fn check<T, E: fmt::Display>(
        &mut self,
        field: &str,
        result: Result<T, E>,
    ) -> Option<T> {
        result.map_err(|e| self.fail(field, e)).ok()
    }

    /// Parses the provided `field` value, if it's present.
    ///
    /// A missing value is recorded as a failure only if `required` is set.
    pub fn parse<T>(
        &mut self,
        field: &str,
        value: Option<&str>,
        required: bool,
    ) -> Option<T>
    where
        T: FromStr,
        T::Err: fmt::Display,
    {
        self.parse_with(field, value, required, str::parse::<T>)
    }

    /// Parses the provided `field` value with the provided function, if
    /// it's present.
    ///
    /// A missing value is recorded as a failure only if `required` is set.
    pub fn parse_with<T, E: fmt::Display>(
        &mut self,
        field: &str,
        value: Option<&str>,
        required: bool,
        parse: impl FnOnce(&str) -> Result<T, E>,
    ) -> Option<T> {
        match value {
            Some(v) => self.check(field, parse(v)),
            None => {
                if required {
                    self.fail(field, Self::REQUIRED);
                }
                None
            }
        }
    }

    /// Records a failure of the `field` if its `value` is missing while
    /// `required`.
    pub fn require<T>(
        &mut self,
        field: &str,
        value: Option<T>,
        required: bool,
    ) -> Option<T> {
        if value.is_none() && required {
            self.fail(field, Self::REQUIRED);
        }
        value
    }

    /// Finishes this [`Validation`], building the validated value with the
    /// provided `build` function if there are no failures.
    ///
    /// # Errors
    ///
    /// If any failure has been recorded.
    pub fn finish<T>(
        self,
        build: impl FnOnce() -> Option<T>,
    ) -> Result<T, Error> {
        if !self.failures.is_empty() {
            return Err(Error::from(ValidationError::Invalid)
                .with_details(Value::Object(self.failures)));
        }
        build().ok_or_else(|| Error::internal(&"incomplete validation"))
    }
}

crate::define_error! {
    enum ValidationError {
        #[code = "VALIDATION_FAILED"]
        #[status = BAD_REQUEST]
        #[message = "Invalid input"]
        Invalid,
    }
}

#[cfg(test)]
mod spec {
    use axum::response::IntoResponse as _;
    use serde_json::json;

    use super::{Error, NotFound, Validation};

    #[test]
    fn collects_all_failures() {
        let mut v = Validation::default();

        let capacity = v.parse::<u16>("capacity", Some("-1"), true);
        let title = v.parse::<String>("title", None, true);
        let location = v.parse::<String>("location", None, false);
        let guests = v.require("guests", None::<u16>, true);

        assert!(capacity.is_none());
        assert!(title.is_none());
        assert!(location.is_none());
        assert!(guests.is_none());

        let err = v.finish(|| Some(())).unwrap_err();
        assert_eq!(err.status_code, http::StatusCode::BAD_REQUEST);
        assert_eq!(err.code, "VALIDATION_FAILED");
        let details = err.details.unwrap();
        assert_eq!(details["title"], json!([Validation::REQUIRED]));
        assert_eq!(details["guests"], json!([Validation::REQUIRED]));
        assert!(details.get("location").is_none());
        assert_eq!(details["capacity"].as_array().unwrap().len(), 1);
    }

    #[test]
    fn builds_value_without_failures() {
        let mut v = Validation::default();

        let guests = v.parse::<u16>("guests", Some("3"), true);

        assert_eq!(v.finish(|| Some(guests? * 2)).unwrap(), 6);
    }

    #[test]
    fn renders_not_found() {
        let resp = Error::from(NotFound).into_response();

        assert_eq!(resp.status(), http::StatusCode::NOT_FOUND);
    }
}
