use std::sync::Arc;
use std::time::Duration;

use crate::clients::{ChatWebhook, Mailer, SlackWebhook, SmtpMailer};
use crate::config::Config;
use crate::db::Store;
use crate::services::{
    AnuncioService, ImageService, Notifier, SeaOrmAnuncioService, SearchService, TokenService,
};

/// Everything a request handler may need, built once at startup.
#[derive(Clone)]
pub struct SharedState {
    pub config: Arc<Config>,

    pub store: Arc<Store>,

    pub image_service: Arc<ImageService>,

    pub notifier: Arc<Notifier>,

    pub tokens: Arc<TokenService>,

    pub anuncio_service: Arc<dyn AnuncioService>,

    pub search_service: Arc<SearchService>,
}

impl SharedState {
    /// Connects to the database and wires the real SMTP and webhook clients.
    pub async fn new(config: Config) -> anyhow::Result<Self> {
        let timeout = Duration::from_secs(config.notifications.request_timeout_seconds);
        let mailer: Arc<dyn Mailer> = Arc::new(SmtpMailer::new(&config.notifications)?);
        let webhook: Arc<dyn ChatWebhook> = Arc::new(SlackWebhook::new(
            config.notifications.webhook_url.clone(),
            timeout,
        )?);

        Self::with_clients(config, mailer, webhook).await
    }

    /// Same as [`SharedState::new`] with caller-supplied outbound clients.
    pub async fn with_clients(
        config: Config,
        mailer: Arc<dyn Mailer>,
        webhook: Arc<dyn ChatWebhook>,
    ) -> anyhow::Result<Self> {
        let store = Arc::new(
            Store::with_pool_options(
                &config.general.database_path,
                config.general.max_db_connections,
                config.general.min_db_connections,
            )
            .await?,
        );

        let image_service = Arc::new(ImageService::new(config.images.clone()));
        let notifier = Arc::new(Notifier::new(
            mailer,
            webhook,
            config.notifications.clone(),
        ));
        let tokens = Arc::new(TokenService::new(&config.auth));

        let anuncio_service = Arc::new(SeaOrmAnuncioService::new(
            store.clone(),
            image_service.clone(),
            notifier.clone(),
            config.listings.quota,
        )) as Arc<dyn AnuncioService>;

        let search_service = Arc::new(SearchService::new(store.clone()));

        Ok(Self {
            config: Arc::new(config),
            store,
            image_service,
            notifier,
            tokens,
            anuncio_service,
            search_service,
        })
    }
}
