use std::sync::Arc;

use anyhow::Context;
use secrecy::ExposeSecret;

use filegate_service::{ObjectStore, ObjectStoreConfig, UserStore, UserStoreConfig};

use crate::auth::TokenService;
use crate::config::{Config, ObjectStorage, UserStorage};

/// Shared reference to the gateway [service state](State).
pub type ServiceState = Arc<State>;

/// Reference to the gateway business logic.
///
/// This structure is created once during server startup and shared with
/// all HTTP request handlers. The storage and credential clients inside
/// it are process-wide singletons passed in by construction, so backend
/// connections are pooled instead of re-created per request.
///
/// In request handlers, use `axum::extract::State<ServiceState>` to
/// retrieve a shared reference to this structure.
#[derive(Debug)]
pub struct State {
    /// The server configuration.
    pub config: Config,
    /// The object store client.
    pub objects: ObjectStore,
    /// The user account store client.
    pub users: UserStore,
    /// The session token service.
    pub tokens: TokenService,
}

impl State {
    /// Initializes all services for the gateway.
    ///
    /// Fails when the token signing secret is absent: the gateway never
    /// issues tokens signed with a baked-in default.
    pub async fn new(config: Config) -> anyhow::Result<ServiceState> {
        let secret = config
            .auth
            .token_secret
            .as_ref()
            .context("auth.token_secret is not configured, refusing to issue session tokens")?;
        let tokens = TokenService::new(secret.expose_secret().as_str(), config.auth.token_validity);

        let objects = ObjectStore::new(map_object_storage(&config.object_storage)).await?;
        let users = UserStore::new(map_user_storage(&config.user_storage)).await?;

        Ok(Arc::new(Self {
            config,
            objects,
            users,
            tokens,
        }))
    }
}

fn map_object_storage(config: &'_ ObjectStorage) -> ObjectStoreConfig<'_> {
    match config {
        ObjectStorage::FileSystem { path } => ObjectStoreConfig::FileSystem { path },
        ObjectStorage::S3Compatible {
            endpoint,
            region,
            bucket,
            access_key,
            secret_key,
            path_style,
        } => ObjectStoreConfig::S3Compatible {
            bucket,
            region,
            endpoint: endpoint.as_deref(),
            access_key: access_key.as_deref(),
            secret_key: secret_key.as_ref().map(|key| key.expose_secret().as_str()),
            path_style: *path_style,
        },
        ObjectStorage::Memory => ObjectStoreConfig::Memory,
    }
}

fn map_user_storage(config: &'_ UserStorage) -> UserStoreConfig<'_> {
    match config {
        UserStorage::FileSystem { path } => UserStoreConfig::FileSystem { path },
        UserStorage::Memory => UserStoreConfig::Memory,
    }
}
