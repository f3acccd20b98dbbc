//! Failures raised while wiring up the process: settings, the database pool,
//! the log subscriber and the HTTP listener. Request handling never sees these.

use std::{io, net::SocketAddr};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum InfraError {
    /// Layered settings could not be merged or failed validation.
    #[error("invalid configuration: {message}")]
    Configuration { message: String },
    /// Connecting to Postgres or applying migrations failed.
    #[error("postgres unavailable: {message}")]
    Database { message: String },
    #[error("could not install log subscriber: {message}")]
    Telemetry { message: String },
    #[error("could not listen on {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: io::Error,
    },
    #[error("http server stopped unexpectedly: {0}")]
    Serve(#[source] io::Error),
}

impl InfraError {
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    pub fn database(message: impl Into<String>) -> Self {
        Self::Database {
            message: message.into(),
        }
    }

    pub fn telemetry(message: impl Into<String>) -> Self {
        Self::Telemetry {
            message: message.into(),
        }
    }

    pub fn bind(addr: SocketAddr, source: io::Error) -> Self {
        Self::Bind { addr, source }
    }
}
