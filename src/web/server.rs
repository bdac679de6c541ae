//! Web server for Parlor.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use tokio::net::TcpListener;

use crate::chat;
use crate::config::{ChatConfig, Config};
use crate::{ParlorError, Result};

use super::handlers::AppState;
use super::router::{create_health_router, create_router};

/// Web server hosting the chat WebSocket and the REST surface.
pub struct WebServer {
    /// Server address.
    addr: SocketAddr,
    /// Chat configuration.
    chat_config: ChatConfig,
    /// Allowed CORS origins.
    cors_origins: Vec<String>,
}

impl WebServer {
    /// Create a new web server.
    pub fn new(config: &Config) -> Result<Self> {
        let addr = format!("{}:{}", config.server.host, config.server.port)
            .parse()
            .map_err(|e| ParlorError::Config(format!("invalid server address: {e}")))?;

        Ok(Self {
            addr,
            chat_config: config.chat.clone(),
            cors_origins: config.web.cors_origins.clone(),
        })
    }

    /// Get the server address.
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Start the chat processor and build the router around it.
    fn build_router(&self) -> Router {
        let (coordinator, _task) = chat::spawn(&self.chat_config);
        let app_state = Arc::new(AppState::new(
            coordinator,
            self.chat_config.default_room.clone(),
        ));

        create_router(app_state, &self.cors_origins).merge(create_health_router())
    }

    /// Run the web server.
    pub async fn run(self) -> std::result::Result<(), std::io::Error> {
        let listener = TcpListener::bind(self.addr).await?;
        let local_addr = listener.local_addr()?;
        let router = self.build_router();

        tracing::info!("Web server listening on http://{}", local_addr);
        tracing::info!("WebSocket endpoint at ws://{}/ws", local_addr);

        axum::serve(listener, router).await
    }

    /// Run the server and return the actual bound address.
    ///
    /// This is useful for testing when binding to port 0.
    pub async fn run_with_addr(self) -> std::result::Result<SocketAddr, std::io::Error> {
        let listener = TcpListener::bind(self.addr).await?;
        let local_addr = listener.local_addr()?;
        let router = self.build_router();

        tracing::info!("Web server listening on http://{}", local_addr);

        tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, router).await {
                tracing::error!("Web server error: {}", e);
            }
        });

        Ok(local_addr)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_config() -> Config {
        let mut config = Config::default();
        config.server.host = "127.0.0.1".to_string();
        config.server.port = 0; // Use random port
        config
    }

    #[test]
    fn test_web_server_new() {
        let server = WebServer::new(&create_test_config()).unwrap();
        assert_eq!(server.addr().ip().to_string(), "127.0.0.1");
    }

    #[test]
    fn test_web_server_invalid_address() {
        let mut config = create_test_config();
        config.server.host = "not an address".to_string();
        assert!(matches!(
            WebServer::new(&config),
            Err(ParlorError::Config(_))
        ));
    }

    #[tokio::test]
    async fn test_web_server_run() {
        let server = WebServer::new(&create_test_config()).unwrap();
        let addr = server.run_with_addr().await.unwrap();
        assert_ne!(addr.port(), 0);
    }
}
