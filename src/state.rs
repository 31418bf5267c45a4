use std::sync::Arc;

use crate::auth::UserStore;
use crate::chat::{ChatCompletion, OpenAiProvider};
use crate::config::AppConfig;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub users: UserStore,
    pub llm: Arc<dyn ChatCompletion>,
}

impl AppState {
    pub fn init(config: AppConfig) -> anyhow::Result<Self> {
        let provider = OpenAiProvider::new(&config.llm)?;
        if !provider.is_configured() {
            tracing::warn!("OPENAI_API_KEY not set; /api/chat will answer with a configuration error");
        }
        let llm = Arc::new(provider) as Arc<dyn ChatCompletion>;

        Ok(Self::from_parts(Arc::new(config), UserStore::new(), llm))
    }

    pub fn from_parts(
        config: Arc<AppConfig>,
        users: UserStore,
        llm: Arc<dyn ChatCompletion>,
    ) -> Self {
        Self { config, users, llm }
    }
}
