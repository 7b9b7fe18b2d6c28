use thiserror::Error;

/// Which upstream document a payload came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Feed {
    Today,
    Forecast,
}

impl std::fmt::Display for Feed {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Feed::Today => "today",
            Feed::Forecast => "forecast",
        })
    }
}

/// How an error should be reported to whoever called the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    ClientError,
    NotFound,
    ServerError,
}

#[derive(Debug, Error)]
pub enum WeatherError {
    #[error("Invalid argument '{param}': {message}")]
    InvalidArgument { param: &'static str, message: String },

    #[error("No forecast found for city '{city}'")]
    NoData { city: String },

    #[error("Weather for city '{city}' not found")]
    CityNotFound { city: String },

    #[error("Malformed {feed} payload: {reason}")]
    MalformedPayload { feed: Feed, reason: String },

    #[error("Fetch failed: {0}")]
    Fetch(String),
}

impl WeatherError {
    pub fn invalid(param: &'static str, message: impl Into<String>) -> Self {
        Self::InvalidArgument { param, message: message.into() }
    }

    pub fn malformed(feed: Feed, reason: impl ToString) -> Self {
        Self::MalformedPayload { feed, reason: reason.to_string() }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            WeatherError::InvalidArgument { .. } => ErrorKind::ClientError,
            WeatherError::NoData { .. } | WeatherError::CityNotFound { .. } => {
                ErrorKind::NotFound
            }
            WeatherError::MalformedPayload { .. } | WeatherError::Fetch(_) => {
                ErrorKind::ServerError
            }
        }
    }
}

pub type Result<T, E = WeatherError> = std::result::Result<T, E>;
