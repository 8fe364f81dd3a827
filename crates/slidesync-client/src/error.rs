use slidesync_common::ProtocolError;

/// Errors returned by controller and display handles.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// No live connection right now. Nothing was queued.
    #[error("not connected to the sync server")]
    NotConnected,

    /// The client was closed and will not reconnect.
    #[error("client is closed")]
    Closed,

    #[error(transparent)]
    Protocol(#[from] ProtocolError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_messages() {
        assert_eq!(
            ClientError::NotConnected.to_string(),
            "not connected to the sync server"
        );
        assert_eq!(ClientError::Closed.to_string(), "client is closed");
    }

    #[test]
    fn wraps_protocol_errors() {
        let err: ClientError = ProtocolError::Binary(4).into();
        assert!(matches!(err, ClientError::Protocol(_)));
    }
}
