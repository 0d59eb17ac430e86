use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use axum::Router;
use axum::extract::{Query, State};
use axum::routing::get;
use color_eyre::Result;
use color_eyre::eyre::{Context, eyre};
use tokio::sync::oneshot;
use url::Url;

/// Source of the authorization code a backend sends back after the user granted access.
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait CallbackProvider: Send + Sync {
    /// Wait for the OAuth redirect and return the value of its `code_param` query parameter.
    async fn read_code(&self, code_param: &str) -> Result<String>;
}

type Params = HashMap<String, String>;

#[derive(Clone)]
struct CallbackState {
    sender: Arc<Mutex<Option<oneshot::Sender<Params>>>>,
}

async fn callback(State(state): State<CallbackState>, Query(params): Query<Params>) -> &'static str {
    let sender = state
        .sender
        .lock()
        .ok()
        .and_then(|mut sender| sender.take());

    if let Some(sender) = sender {
        let _ = sender.send(params);
    }

    "Authentication received, you can close this window."
}

fn code_from_params(params: &Params, code_param: &str) -> Result<String> {
    params
        .get(code_param)
        .filter(|code| !code.is_empty())
        .cloned()
        .ok_or_else(|| eyre!("Callback request has no {} parameter", code_param))
}

/// Serves the redirect URL on the local machine for exactly one request.
pub struct HttpCallbackProvider {
    redirect_url: String,
}

impl HttpCallbackProvider {
    pub fn new(redirect_url: impl Into<String>) -> Self {
        Self {
            redirect_url: redirect_url.into(),
        }
    }
}

#[async_trait::async_trait]
impl CallbackProvider for HttpCallbackProvider {
    async fn read_code(&self, code_param: &str) -> Result<String> {
        let url = Url::parse(&self.redirect_url)
            .wrap_err_with(|| format!("Invalid redirect URL: {}", self.redirect_url))?;
        let host = url
            .host_str()
            .ok_or_else(|| eyre!("Redirect URL has no host: {}", self.redirect_url))?
            .to_string();
        let port = url
            .port_or_known_default()
            .ok_or_else(|| eyre!("Redirect URL has no port: {}", self.redirect_url))?;

        let (sender, receiver) = oneshot::channel();
        let state = CallbackState {
            sender: Arc::new(Mutex::new(Some(sender))),
        };
        let app = Router::new()
            .route(url.path(), get(callback))
            .with_state(state);

        let listener = tokio::net::TcpListener::bind((host.as_str(), port))
            .await
            .wrap_err_with(|| eyre!("Failed to bind to {}:{}", host, port))?;
        log::debug!("Waiting for OAuth callback on {}:{}", host, port);

        let (shutdown, shutdown_signal) = oneshot::channel::<()>();
        let server = tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async move {
                    let _ = shutdown_signal.await;
                })
                .await
        });

        let params = receiver.await.wrap_err("Callback server stopped early");
        let _ = shutdown.send(());
        server
            .await
            .wrap_err("Callback server panicked")?
            .wrap_err("Callback server failed")?;

        code_from_params(&params?, code_param)
    }
}
