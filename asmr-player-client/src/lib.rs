#[macro_use]
extern crate tracing;

use snafu::prelude::*;

pub mod client;
pub mod gateway;
pub mod models;

pub use client::{Client, ClientConfig};

#[derive(Snafu, Debug)]
#[snafu(visibility(pub(crate)))]
pub enum Error {
    #[snafu(display("{message}"))]
    InvalidArgument { message: String },
    #[snafu(display("Username and password must not be empty"))]
    InvalidCredentials,
    #[snafu(display("{endpoint} requires signing in"))]
    Unauthorized { endpoint: String },
    #[snafu(display("Unable to reach the catalog: {source}"))]
    Network { source: reqwest::Error },
    #[snafu(display("{endpoint} responded with HTTP {status}"))]
    Service { endpoint: String, status: u16 },
    #[snafu(display("Unexpected response from {endpoint}: {source}"))]
    Decode {
        endpoint: String,
        source: serde_json::Error,
    },
}

impl Error {
    /// HTTP status of a rejected request, if the service answered at all.
    pub fn status(&self) -> Option<u16> {
        match self {
            Error::Service { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn is_unauthorized(&self) -> bool {
        matches!(self, Error::Unauthorized { .. })
    }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
