use crate::secrets::SecretsError;

/// Boxed cause carried by the remote-call variants.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("unknown service {0:?}")]
    UnknownService(String),

    #[error("failed to load {name}")]
    ConfigLoad {
        name: String,
        #[source]
        source: SecretsError,
    },

    #[error("please set {client_id_var} and {client_secret_var} environment variables")]
    MissingCredentials {
        client_id_var: &'static str,
        client_secret_var: &'static str,
    },

    #[error("not logged in on {0}")]
    NotAuthenticated(String),

    #[error("failed to authenticate on {service}")]
    Authentication {
        service: String,
        #[source]
        source: BoxError,
    },

    #[error("failed to read {service} profile data")]
    ProfileRead {
        service: &'static str,
        #[source]
        source: BoxError,
    },

    #[error("failed to read {service} loved tracks")]
    TrackFetch {
        service: &'static str,
        #[source]
        source: BoxError,
    },

    #[error("failed to mark track as loved on {service}")]
    TrackLove {
        service: &'static str,
        #[source]
        source: BoxError,
    },

    #[error("failed to save {service} secrets")]
    TokenPersistence {
        service: &'static str,
        #[source]
        source: BoxError,
    },

    #[error("playlist {0} not found")]
    PlaylistNotFound(String),

    /// A composite playlist operation failed on the remote side.
    #[error("{context} on {service}")]
    Playlist {
        service: &'static str,
        context: &'static str,
        #[source]
        source: BoxError,
    },

    #[error("failed to write output")]
    Output(#[from] std::io::Error),
}

impl ServiceError {
    pub fn authentication(service: impl Into<String>, source: impl Into<BoxError>) -> Self {
        Self::Authentication {
            service: service.into(),
            source: source.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_service_message_quotes_original_name() {
        let error = ServiceError::UnknownService("Fo.o".to_string());
        assert_eq!(error.to_string(), r#"unknown service "Fo.o""#);
    }

    #[test]
    fn test_remote_errors_keep_their_cause() {
        let error = ServiceError::TrackFetch {
            service: "Spotify",
            source: color_eyre::eyre::eyre!("503 Service Unavailable").into(),
        };

        assert_eq!(error.to_string(), "failed to read Spotify loved tracks");
        let source = std::error::Error::source(&error).unwrap();
        assert_eq!(source.to_string(), "503 Service Unavailable");
    }
}
