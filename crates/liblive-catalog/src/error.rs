// SPDX-License-Identifier: MIT OR Apache-2.0

pub type Result<T> = std::result::Result<T, Error>;

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("network request failed: {0}")]
    Network(#[from] reqwest::Error),

    #[error("api returned error status: {0}")]
    ApiError(u16),

    #[error("failed to parse json: {0}")]
    Json(#[from] serde_json::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid version: {0}")]
    InvalidVersion(String),

    #[error("invalid selector: {0}")]
    InvalidSelector(String),

    #[error("invalid catalog payload: {0}")]
    InvalidPayload(String),

    #[error("storage backend failed: {0}")]
    Backend(String),

    #[error("config error: {0}")]
    Config(String),

    #[error("{0}")]
    Other(String),
}

macro_rules! error_ctor {
    ($($name:ident => $variant:ident),* $(,)?) => {
        $(
            pub fn $name(msg: impl Into<String>) -> Self {
                Self::$variant(msg.into())
            }
        )*
    };
}

impl Error {
    error_ctor!(
        version => InvalidVersion,
        selector => InvalidSelector,
        payload => InvalidPayload,
        backend => Backend,
        config => Config,
        other => Other,
    );

    /// returns true for errors caused by caller input rather than the environment.
    /// these are rejected before anything is applied.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Self::InvalidVersion(_) | Self::InvalidSelector(_) | Self::InvalidPayload(_)
        )
    }
}
