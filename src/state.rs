use std::sync::Arc;

use crate::api::auth::LoginThrottle;
use crate::clients::{HttpRelayMailer, Mailer, MemoryMailer};
use crate::config::Config;
use crate::db::Store;
use crate::logging::FileLogger;
use crate::services::{
    AuthService, NoteService, SeaOrmAuthService, SeaOrmNoteService, SeaOrmUserService,
    SessionKeys, UserService,
};

#[derive(Clone)]
pub struct SharedState {
    pub config: Config,

    pub store: Store,

    pub sessions: SessionKeys,

    pub mailer: Arc<dyn Mailer>,

    pub auth_service: Arc<dyn AuthService>,

    pub user_service: Arc<dyn UserService>,

    pub note_service: Arc<dyn NoteService>,

    pub request_log: FileLogger,

    pub login_throttle: Arc<LoginThrottle>,
}

impl SharedState {
    pub async fn new(config: Config) -> anyhow::Result<Self> {
        let store = Store::with_pool_options(
            &config.general.database_path,
            config.general.max_db_connections,
            config.general.min_db_connections,
        )
        .await?;

        let mailer: Arc<dyn Mailer> = if config.mail.enabled {
            Arc::new(HttpRelayMailer::new(config.mail.clone())?)
        } else {
            Arc::new(MemoryMailer::new())
        };

        Ok(Self::with_parts(config, store, mailer))
    }

    /// Assemble the state from pre-built collaborators. Tests use this to
    /// inject a recording mailer.
    #[must_use]
    pub fn with_parts(config: Config, store: Store, mailer: Arc<dyn Mailer>) -> Self {
        let sessions = SessionKeys::new(
            &config.auth.session_secret,
            config.auth.token_ttl_days,
        );

        let auth_service = Arc::new(SeaOrmAuthService::new(
            store.clone(),
            config.clone(),
            sessions.clone(),
            mailer.clone(),
        )) as Arc<dyn AuthService>;

        let user_service = Arc::new(SeaOrmUserService::new(
            store.clone(),
            config.security.clone(),
        )) as Arc<dyn UserService>;

        let note_service =
            Arc::new(SeaOrmNoteService::new(store.clone())) as Arc<dyn NoteService>;

        let request_log = FileLogger::new(&config.general.log_dir);
        let login_throttle = Arc::new(LoginThrottle::new(&config.security.auth_throttle));

        Self {
            config,
            store,
            sessions,
            mailer,
            auth_service,
            user_service,
            note_service,
            request_log,
            login_throttle,
        }
    }
}
