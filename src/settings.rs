use std::time::Duration;

/// Runtime knobs, loadable from the environment. Intervals and the import
/// budget are compiled-in defaults; only the endpoints and the operating
/// user vary between deployments.
#[derive(Debug, Clone)]
pub struct EngineSettings {
    /// Base URL of the ticker backend, e.g. `http://127.0.0.1:8000/api/v1`.
    pub api_base: String,
    /// Base URL of the ingestion webhook host.
    pub ingest_base: String,
    /// User whose favorite set this session operates on.
    pub user_id: i64,
    pub match_poll_interval: Duration,
    pub live_poll_interval: Duration,
    pub import_max_attempts: u32,
    pub import_retry_delay: Duration,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            api_base: "http://127.0.0.1:8000/api/v1".into(),
            ingest_base: "http://127.0.0.1:5678/webhook".into(),
            user_id: 1,
            match_poll_interval: Duration::from_secs(5),
            live_poll_interval: Duration::from_secs(10),
            import_max_attempts: 3,
            import_retry_delay: Duration::from_secs(2),
        }
    }
}

impl EngineSettings {
    pub fn load() -> Self {
        let mut settings = Self::default();
        if let Ok(base) = std::env::var("TICKERDESK_API_BASE") {
            settings.api_base = base;
        }
        if let Ok(base) = std::env::var("TICKERDESK_INGEST_BASE") {
            settings.ingest_base = base;
        }
        if let Ok(user) = std::env::var("TICKERDESK_USER_ID") {
            if let Ok(id) = user.parse() {
                settings.user_id = id;
            }
        }
        settings
    }
}
