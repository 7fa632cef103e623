//! [`Config`]-related definitions.

use std::time;

use common::money::Currency;
use config::{builder::DefaultState, ConfigBuilder, ConfigError};
use derive_more::Debug;
use serde::{de, Deserialize, Deserializer};
use service::infra::{gateway, mailer, notifier};
use smart_default::SmartDefault;
use tracerr::Traced;

/// Application configuration.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Server configuration.
    pub server: Server,

    /// Service configuration.
    pub service: Service,

    /// Payment gateway configuration.
    pub gateway: Gateway,

    /// Mailer configuration.
    pub mailer: Mailer,

    /// Postgres configuration.
    pub postgres: Postgres,

    /// Log configuration.
    pub log: Log,
}

impl Config {
    /// Creates a new [`Config`] by:
    /// - loading it from the provided `path` (if any);
    /// - merging it with the environment variables (if any);
    /// - using default values for missing fields.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid.
    pub fn new(path: impl AsRef<str>) -> Result<Self, ConfigError> {
        ConfigBuilder::<DefaultState>::default()
            .add_source(config::File::with_name(path.as_ref()).required(false))
            .add_source(config::Environment::with_prefix("CONF").separator("."))
            .build()?
            .try_deserialize()
    }
}

/// Server configuration.
#[derive(Clone, Debug, Deserialize, SmartDefault)]
#[serde(default)]
pub struct Server {
    /// Host to bind the server to.
    #[default("0.0.0.0".to_owned())]
    pub host: String,

    /// Port to bind the server to.
    #[default(8080)]
    pub port: u16,

    /// [CORS] configuration.
    ///
    /// [CORS]: https://developer.mozilla.org/en-US/docs/Web/HTTP/CORS
    pub cors: Cors,
}

/// [CORS] configuration.
///
/// [CORS]: https://developer.mozilla.org/en-US/docs/Web/HTTP/CORS
#[derive(Clone, Debug, Deserialize, SmartDefault)]
#[serde(default)]
pub struct Cors {
    /// List of allowed origins.
    #[default(vec!["*".to_owned()])]
    pub origins: Vec<String>,
}

/// Service configuration.
#[derive(Clone, Debug, Deserialize, SmartDefault)]
#[serde(default)]
pub struct Service {
    /// [JWT] secret.
    ///
    /// [JWT]: https://wikipedia.org/wiki/JSON_Web_Token
    #[debug(skip)]
    #[default("secret".to_owned())]
    pub jwt_secret: String,

    /// Lifetime of the issued [JWT]s.
    ///
    /// [JWT]: https://wikipedia.org/wiki/JSON_Web_Token
    #[default(time::Duration::from_secs(60 * 60 * 24))]
    #[serde(with = "humantime_serde")]
    pub session_ttl: time::Duration,

    /// Base URL of the frontend payers are redirected back to.
    #[default("http://localhost:3000".to_owned())]
    pub frontend_url: String,

    /// Notifications dispatching mode.
    pub notifications: notifier::Mode,
}

impl Service {
    /// Converts this [`Service`] configuration into a [`service::Config`],
    /// charging bookings in the provided [`Currency`].
    #[must_use]
    pub fn into_config(self, currency: Currency) -> service::Config {
        let Self {
            jwt_secret,
            session_ttl,
            frontend_url,
            notifications,
        } = self;
        service::Config {
            jwt_encoding_key: jsonwebtoken::EncodingKey::from_secret(
                jwt_secret.as_bytes(),
            ),
            jwt_decoding_key: jsonwebtoken::DecodingKey::from_secret(
                jwt_secret.as_bytes(),
            ),
            session_ttl,
            frontend_url,
            currency,
            notifications,
        }
    }
}

/// Payment gateway configuration.
#[derive(Clone, Debug, Deserialize, SmartDefault)]
#[serde(default)]
pub struct Gateway {
    /// Base URL of the [Chapa] API.
    ///
    /// [Chapa]: https://developer.chapa.co
    #[default("https://api.chapa.co".to_owned())]
    pub base_url: String,

    /// Secret key of the merchant.
    #[debug(skip)]
    pub secret_key: String,

    /// [`Currency`] bookings are charged in.
    #[default(Currency::Etb)]
    #[serde(deserialize_with = "currency")]
    pub currency: Currency,

    /// Timeout of a single request to the gateway.
    #[default(time::Duration::from_secs(30))]
    #[serde(with = "humantime_serde")]
    pub timeout: time::Duration,
}

impl From<Gateway> for gateway::Config {
    fn from(value: Gateway) -> Self {
        let Gateway {
            base_url,
            secret_key,
            currency: _,
            timeout,
        } = value;
        Self {
            base_url,
            secret_key: secret_key.into(),
            timeout,
        }
    }
}

/// Deserializes a [`Currency`] out of its case-insensitive code.
fn currency<'de, D>(d: D) -> Result<Currency, D::Error>
where
    D: Deserializer<'de>,
{
    String::deserialize(d)?.parse().map_err(de::Error::custom)
}

/// Mailer configuration.
#[derive(Clone, Debug, Deserialize, SmartDefault)]
#[serde(default)]
pub struct Mailer {
    /// [`MailerBackend`] delivering emails.
    pub backend: MailerBackend,

    /// SMTP server host.
    #[default("localhost".to_owned())]
    pub host: String,

    /// SMTP server port.
    #[default(587)]
    pub port: u16,

    /// Indicator whether to upgrade SMTP connections with `STARTTLS`.
    #[default(true)]
    pub starttls: bool,

    /// SMTP username, if authentication is required.
    pub username: Option<String>,

    /// SMTP password.
    #[debug(skip)]
    pub password: String,

    /// `From` header of the sent emails.
    #[default("ALX Travel <no-reply@alxtravel.com>".to_owned())]
    pub from: String,
}

impl Mailer {
    /// Builds the configured [`mailer::Transport`].
    ///
    /// # Errors
    ///
    /// If the SMTP transport cannot be initialized.
    pub fn build(self) -> Result<mailer::Transport, Traced<mailer::Error>> {
        let Self {
            backend,
            host,
            port,
            starttls,
            username,
            password,
            from,
        } = self;
        Ok(match backend {
            MailerBackend::Console => mailer::Console.into(),
            MailerBackend::Smtp => mailer::Smtp::new(mailer::smtp::Config {
                host,
                port,
                starttls,
                username,
                password: password.into(),
                from,
            })?
            .into(),
        })
    }
}

/// Backend delivering emails.
#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, PartialEq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MailerBackend {
    /// Emails are written into the log.
    #[default]
    Console,

    /// Emails are sent over SMTP.
    Smtp,
}

/// Postgres configuration.
#[derive(Clone, Debug, Deserialize, SmartDefault)]
#[serde(default)]
pub struct Postgres {
    /// Host to connect to.
    #[default("127.0.0.1".to_owned())]
    pub host: String,

    /// Port to connect to.
    #[default(5432)]
    pub port: u16,

    /// User to connect as.
    #[default("postgres".to_owned())]
    pub user: String,

    /// Password to connect with.
    #[debug(skip)]
    #[default("postgres".to_owned())]
    pub password: String,

    /// Database name to connect to.
    #[default("postgres".to_owned())]
    pub dbname: String,
}

impl From<Postgres> for service::infra::postgres::Config {
    fn from(value: Postgres) -> Self {
        let Postgres {
            host,
            port,
            user,
            password,
            dbname,
        } = value;

        Self {
            host: Some(host),
            port: Some(port),
            user: Some(user),
            password: Some(password),
            dbname: Some(dbname),
            ..Self::default()
        }
    }
}

/// Log configuration.
#[derive(Clone, Copy, Debug, Default, Deserialize)]
#[serde(default)]
pub struct Log {
    /// Log level.
    pub level: LogLevel,
}

/// Log level.
#[derive(Clone, Copy, Debug, Default, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LogLevel {
    /// Designates very low priority, often extremely verbose, information.
    Trace,

    /// Designates lower priority information.
    Debug,

    /// Designates useful information.
    #[default]
    Info,

    /// Designates hazardous situations.
    Warn,

    /// Designates very serious errors.
    Error,
}

impl From<LogLevel> for tracing::Level {
    fn from(value: LogLevel) -> Self {
        match value {
            LogLevel::Trace => Self::TRACE,
            LogLevel::Debug => Self::DEBUG,
            LogLevel::Info => Self::INFO,
            LogLevel::Warn => Self::WARN,
            LogLevel::Error => Self::ERROR,
        }
    }
}

#[cfg(test)]
mod spec {
    use common::money::Currency;
    use service::infra::notifier;

    use super::{Config, MailerBackend};

    #[test]
    fn defaults_without_file() {
        let config = Config::new("missing.toml").unwrap();

        assert_eq!(config.server.port, 8080);
        assert_eq!(config.gateway.currency, Currency::Etb);
        assert_eq!(config.gateway.base_url, "https://api.chapa.co");
        assert_eq!(config.mailer.backend, MailerBackend::Console);
        assert_eq!(config.service.notifications, notifier::Mode::Immediate);
    }
}
