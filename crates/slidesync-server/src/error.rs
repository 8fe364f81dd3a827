use slidesync_common::ConfigError;

#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    #[error("listener has no local address: {0}")]
    LocalAddr(std::io::Error),

    #[error("hub is not running")]
    HubStopped,

    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl ServerError {
    pub(crate) fn bind(addr: impl Into<String>, source: std::io::Error) -> Self {
        Self::Bind {
            addr: addr.into(),
            source,
        }
    }
}
