pub mod bot;
pub mod client;

pub use bot::Bot;
pub use client::Client;
pub use client::RetryPolicy;
use thiserror::Error;

/// Error type for client operations.
#[derive(Error, Debug)]
pub enum Error {
    #[error("reqwest error: {0}")]
    Reqwest(#[from] reqwest::Error),
    #[error("failed: {0}: {1}")]
    Failed(reqwest::StatusCode, String),
    #[error("URL parse error: {0}")]
    Url(#[from] url::ParseError),
    #[error("invalid URL scheme: {0} (expected http or https)")]
    InvalidScheme(String),
    #[error("telegram error: {0}")]
    Telegram(String),
}

/// Result type for client operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;
    use cardscore_server::{Api, MemoryStore};
    use cardscore_types::{
        api::{Rotate, Setup},
        Phase, THEMED_NAMES,
    };
    use std::{net::SocketAddr, sync::Arc};
    use tokio::time::{sleep, Duration};

    struct TestContext {
        store: Arc<MemoryStore>,
        base_url: String,
        server_handle: tokio::task::JoinHandle<()>,
    }

    impl TestContext {
        async fn new() -> Self {
            let store = Arc::new(MemoryStore::new());
            let api = Api::new(store.clone());

            // Start server on random port
            let addr = SocketAddr::from(([127, 0, 0, 1], 0));
            let router = api.router();
            let listener = tokio::net::TcpListener::bind(addr).await.unwrap();
            let actual_addr = listener.local_addr().unwrap();
            let base_url = format!("http://{actual_addr}");

            let server_handle = tokio::spawn(async move {
                axum::serve(
                    listener,
                    router.into_make_service_with_connect_info::<SocketAddr>(),
                )
                .await
                .unwrap();
            });

            // Give server time to start
            sleep(Duration::from_millis(100)).await;

            Self {
                store,
                base_url,
                server_handle,
            }
        }

        fn create_client(&self) -> Client {
            Client::new(&self.base_url).unwrap()
        }
    }

    impl Drop for TestContext {
        fn drop(&mut self) {
            self.server_handle.abort();
        }
    }

    fn four_players() -> Setup {
        Setup {
            num_players: 4,
            bet: Some(1),
            player_names: vec![
                "Batman".to_string(),
                "Joker".to_string(),
                "Neo".to_string(),
                "Rocky".to_string(),
            ],
        }
    }

    #[tokio::test]
    async fn test_client_game_flow() {
        let ctx = TestContext::new().await;
        let client = ctx.create_client();

        let ledger = client.game().await.unwrap();
        assert_eq!(ledger.phase, Phase::Setup);

        let ledger = client.setup(&four_players()).await.unwrap();
        assert_eq!(ledger.phase, Phase::Playing);
        assert_eq!(ledger.players.len(), 4);

        // Three straight wins: 3, 3, then a tripled 9
        for _ in 0..3 {
            client.round(0).await.unwrap();
        }
        let ledger = client.game().await.unwrap();
        assert_eq!(ledger.player(0).map(|p| p.score), Some(15));
        assert_eq!(ledger.round_history, vec![0, 0, 0]);

        let ledger = client
            .rotate(&Rotate {
                leave_player_id: Some(3),
                new_player_name: Some("Gandalf".to_string()),
            })
            .await
            .unwrap();
        assert_eq!(ledger.active_count(), 4);
        assert_eq!(ledger.player(4).map(|p| p.name.as_str()), Some("Gandalf"));

        let ledger = client.clear().await.unwrap();
        assert_eq!(ledger.total_score(), 0);
        assert_eq!(ledger.players.len(), 5);

        let ledger = client.back().await.unwrap();
        assert_eq!(ledger.phase, Phase::Setup);
        assert!(ledger.players.is_empty());
    }

    #[tokio::test]
    async fn test_client_unknown_winner() {
        let ctx = TestContext::new().await;
        let client = ctx.create_client();
        let before = client.setup(&four_players()).await.unwrap();
        let after = client.round(42).await.unwrap();
        assert_eq!(before, after);
    }

    #[tokio::test]
    async fn test_client_sessions() {
        let ctx = TestContext::new().await;
        let kitchen = ctx.create_client().with_session("kitchen");
        let patio = ctx.create_client().with_session("patio");

        kitchen.setup(&four_players()).await.unwrap();
        kitchen.round(2).await.unwrap();

        assert_eq!(patio.game().await.unwrap().phase, Phase::Setup);
        assert_eq!(kitchen.game().await.unwrap().round_history, vec![2]);
        assert_eq!(ctx.store.sessions(), 2);
    }

    #[tokio::test]
    async fn test_client_validation_error() {
        let ctx = TestContext::new().await;
        let client = ctx.create_client();

        let result = client
            .setup(&Setup {
                num_players: 0,
                bet: None,
                player_names: vec![],
            })
            .await;
        match result {
            Err(Error::Failed(status, message)) => {
                assert_eq!(status, reqwest::StatusCode::BAD_REQUEST);
                assert_eq!(message, "Need numPlayers and playerNames array");
            }
            other => panic!("Expected validation failure, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_client_names() {
        let ctx = TestContext::new().await;
        let client = ctx.create_client();

        let names = client.names(3).await.unwrap();
        assert_eq!(names.len(), 3);
        assert!(names.iter().all(|n| THEMED_NAMES.contains(&n.as_str())));

        let names = client.names(40).await.unwrap();
        assert_eq!(names.len(), 16);
    }

    #[test]
    fn test_client_invalid_scheme() {
        // Test invalid scheme
        let result = Client::new("ftp://example.com");
        assert!(result.is_err());
        if let Err(err) = result {
            assert!(matches!(err, Error::InvalidScheme(_)));
            assert_eq!(
                err.to_string(),
                "invalid URL scheme: ftp (expected http or https)"
            );
        }

        // Test valid http scheme
        let result = Client::new("http://localhost:8080");
        assert!(result.is_ok());

        // Test valid https scheme
        let result = Client::new("https://localhost:8080");
        assert!(result.is_ok());
    }
}
