use std::sync::Arc;
use tokio::sync::RwLock;

use crate::client::ApiClient;
use crate::config::Config;
use crate::error::AppResult;
use crate::session::Session;

/// Everything a command needs: configuration, the login session and a
/// client bound to that session
#[derive(Clone)]
pub struct AppState {
    /// Application configuration
    pub config: Arc<Config>,
    /// Login session shared with the client
    pub session: Arc<RwLock<Session>>,
    /// Backend client
    pub client: ApiClient,
}

impl AppState {
    /// Create application state around an already loaded session
    pub fn new(config: Config, session: Session) -> AppResult<Self> {
        let session = Arc::new(RwLock::new(session));
        let client = ApiClient::new(&config.api, session.clone())?;

        Ok(Self {
            config: Arc::new(config),
            session,
            client,
        })
    }

    /// Create application state, reading the session file named in `config`
    pub fn load(config: Config) -> AppResult<Self> {
        let session = Session::load(&config.session_file)?;
        Self::new(config, session)
    }

    /// Write the current session back to disk
    pub async fn persist_session(&self) -> AppResult<()> {
        self.session.read().await.save(&self.config.session_file)
    }

    pub async fn is_authenticated(&self) -> bool {
        self.session.read().await.is_authenticated()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_shares_session_with_client() {
        let state = AppState::new(Config::default(), Session::new()).unwrap();
        assert!(Arc::ptr_eq(&state.session, state.client.session()));
        assert!(!tokio_test::block_on(state.is_authenticated()));
    }

    #[tokio::test]
    async fn test_persist_session_round_trip() {
        let path = std::env::temp_dir().join(format!(
            "screenplan-state-{}/session.json",
            std::process::id()
        ));
        let config = Config {
            session_file: path.clone(),
            ..Config::default()
        };

        let state = AppState::load(config.clone()).unwrap();
        assert!(!state.is_authenticated().await);
        state.session.write().await.store(
            "tok-1",
            serde_json::from_str(r#"{"id": "u-1", "email": "a@example.com", "role": "ADMIN"}"#)
                .unwrap(),
        );
        state.persist_session().await.unwrap();

        let reloaded = AppState::load(config).unwrap();
        assert!(reloaded.is_authenticated().await);

        if let Some(dir) = path.parent() {
            std::fs::remove_dir_all(dir).unwrap();
        }
    }
}
