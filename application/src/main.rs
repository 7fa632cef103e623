use std::{future::IntoFuture as _, io, sync::OnceLock, time};

use application::{api, args::Command, config, seed, Args, Config, Service};
use axum::{extract::MatchedPath, Extension, Router};
use axum_client_ip::InsecureClientIp;
use futures::{future, TryFutureExt as _};
use service::infra::{gateway, postgres, Postgres};
use tokio::net::TcpListener;
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::{self as log, Subscriber};
use tracing_subscriber::{
    filter::filter_fn,
    fmt::MakeWriter,
    layer::{Layer, SubscriberExt as _},
    registry::LookupSpan,
    util::SubscriberInitExt as _,
};

/// [`log::Level`]s written to `stderr` rather than `stdout`.
const STDERR_LEVELS: &[log::Level] = &[log::Level::WARN, log::Level::ERROR];

/// Maximum [`log::Level`] to output, as configured.
static LOG_LEVEL: OnceLock<log::Level> = OnceLock::new();

postgres::embed_migrations!("../migrations");

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(console(io::stdout, false))
        .with(console(io::stderr, true))
        .init();

    _ = start().await;
}

/// Builds a console logging [`Layer`] writing to the provided `writer` the
/// events of either [`STDERR_LEVELS`] or the remaining ones.
fn console<S, W>(writer: W, stderr: bool) -> impl Layer<S>
where
    S: Subscriber + for<'s> LookupSpan<'s>,
    W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
{
    tracing_subscriber::fmt::layer()
        .compact()
        .with_ansi(true)
        .with_thread_names(true)
        .with_writer(writer)
        .with_filter(filter_fn(move |meta| {
            let max = LOG_LEVEL.get().copied().unwrap_or(log::Level::INFO);
            meta.is_span()
                || STDERR_LEVELS.contains(meta.level()) == stderr
                    && max >= *meta.level()
        }))
}

async fn start() -> Result<(), ()> {
    let Args { config, command } = Args::parse().map_err(|e| {
        log::error!("failed to parse command line arguments: {e}");
    })?;

    let Config {
        server,
        service,
        gateway,
        mailer,
        postgres,
        log,
    } = Config::new(config).map_err(|e| {
        log::error!("failed to load `Config`: {e}");
    })?;

    LOG_LEVEL
        .set(log.level.into())
        .unwrap_or_else(|_| unreachable!("first initialization"));

    let mut postgres =
        Postgres::new(&postgres.into()).map_err(|e| {
            log::error!("failed to initialize `Postgres` client: {e}");
        })?;
    migrations::runner()
        .run_async(&mut postgres)
        .await
        .map_err(|e| {
            log::error!("failed to run database migrations: {e}");
        })?;

    let currency = gateway.currency;
    let chapa = gateway::Chapa::new(gateway.into()).map_err(|e| {
        log::error!("failed to initialize payment `Gateway`: {e}");
    })?;
    let mailer = mailer.build().map_err(|e| {
        log::error!("failed to initialize `Mailer`: {e}");
    })?;

    let (service, background) =
        Service::new(service.into_config(currency), postgres, chapa, mailer);

    match command.unwrap_or_default() {
        Command::Serve => {}
        Command::SeedUsers { count } => {
            return seed::users(&service, count).await.map_err(|e| {
                log::error!("failed to seed users: {e}");
            });
        }
        Command::Seed => {
            return seed::sample(&service).await.map_err(|e| {
                log::error!("failed to seed sample data: {e}");
            });
        }
    }

    let app = app(service, &server)?;
    let listener = TcpListener::bind((server.host.as_str(), server.port))
        .await
        .map_err(|e| {
            log::error!(
                "failed to listen on `{}:{}`: {e}",
                server.host,
                server.port,
            );
        })?;
    log::info!("listening on `{}:{}`", server.host, server.port);

    future::try_join(
        axum::serve(listener, app)
            .into_future()
            .map_err(|e| log::error!("webserver failed: {e}")),
        background.into_future().map_err(|e| {
            log::error!("background task failed: {e}");
        }),
    )
    .await
    .map(drop)
}

/// Builds the HTTP application serving the REST API of the provided
/// [`Service`].
fn app(service: Service, server: &config::Server) -> Result<Router, ()> {
    Ok(api::router()
        .layer(Extension(service))
        .layer(cors(&server.cors)?)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|r: &http::Request<_>| {
                    log::info_span!(
                        "HTTP request",
                        http.client_ip = InsecureClientIp::from(
                            r.headers(),
                            r.extensions(),
                        )
                        .map(|ip| ip.0.to_string())
                        .ok(),
                        http.method = r.method().as_str(),
                        http.route = r
                            .extensions()
                            .get::<MatchedPath>()
                            .map(MatchedPath::as_str),
                        http.target = r
                            .uri()
                            .path_and_query()
                            .map(http::uri::PathAndQuery::as_str),
                        http.user_agent = r
                            .headers()
                            .get(http::header::USER_AGENT)
                            .and_then(|h| h.to_str().ok()),
                        http.status_code = log::field::Empty,
                    )
                })
                .on_response(
                    |r: &http::Response<_>,
                     dur: time::Duration,
                     span: &log::Span| {
                        let status = r.status();
                        _ = span.record("http.status_code", status.as_u16());

                        let duration = format!("{}ms", dur.as_millis());
                        if status.is_server_error() {
                            log::error!(duration = duration.as_str());
                        } else if status.is_client_error() {
                            log::warn!(duration = duration.as_str());
                        } else {
                            log::info!(duration = duration.as_str());
                        }
                    },
                ),
        ))
}

/// Builds the [`CorsLayer`] allowing the configured origins.
///
/// A `*` origin allows any.
fn cors(conf: &config::Cors) -> Result<CorsLayer, ()> {
    let origins = if conf.origins.iter().any(|o| o == "*") {
        AllowOrigin::from(Any)
    } else {
        let origins = conf
            .origins
            .iter()
            .map(|origin| {
                origin.parse::<http::HeaderValue>().map_err(|e| {
                    log::error!("`{origin}` is not a valid CORS origin: {e}");
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        AllowOrigin::list(origins)
    };
    Ok(CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([
            http::Method::DELETE,
            http::Method::GET,
            http::Method::OPTIONS,
            http::Method::PATCH,
            http::Method::POST,
            http::Method::PUT,
        ])
        .allow_headers([
            http::header::AUTHORIZATION,
            http::header::CONTENT_TYPE,
        ]))
}
