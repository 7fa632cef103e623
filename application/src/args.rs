//! [`Args`] definitions.

use clap::{Parser, Subcommand};

/// Server of the travel booking platform.
#[derive(Debug, Parser)]
#[command(version, about, long_about = None)]
pub struct Args {
    /// Path to the configuration file.
    #[arg(short, long, default_value = "config.toml")]
    pub config: String,

    /// [`Command`] to run, serving the API if omitted.
    #[command(subcommand)]
    pub command: Option<Command>,
}

impl Args {
    /// Parses command line arguments.
    ///
    /// # Errors
    ///
    /// Errors if failed to parse command line arguments.
    pub fn parse() -> Result<Self, clap::Error> {
        <Self as Parser>::try_parse()
    }
}

/// Command to run.
#[derive(Clone, Copy, Debug, Default, Subcommand)]
pub enum Command {
    /// Serves the REST API.
    #[default]
    Serve,

    /// Seeds the database with sample users (hosts and customers).
    SeedUsers {
        /// Number of users to create.
        #[arg(long, default_value_t = 5)]
        count: usize,
    },

    /// Seeds the database with sample listings, bookings, payments and
    /// reviews.
    Seed,
}
