//! `SeaORM` implementation of the `AuthService` trait.

use async_trait::async_trait;
use sha2::{Digest, Sha256};
use std::sync::Arc;
use tracing::{info, warn};

use crate::clients::Mailer;
use crate::config::Config;
use crate::constants::reset;
use crate::db::{NewUser, Store, UniqueViolation, UserConflict};
use crate::models::{Role, User};
use crate::services::auth_service::{AuthError, AuthService, RegisterInput};
use crate::services::session::SessionKeys;

pub struct SeaOrmAuthService {
    store: Store,
    config: Config,
    sessions: SessionKeys,
    mailer: Arc<dyn Mailer>,
}

impl SeaOrmAuthService {
    #[must_use]
    pub fn new(store: Store, config: Config, sessions: SessionKeys, mailer: Arc<dyn Mailer>) -> Self {
        Self {
            store,
            config,
            sessions,
            mailer,
        }
    }

    fn validate_password(password: &str) -> Result<(), AuthError> {
        if password.len() < 8 {
            return Err(AuthError::Validation(
                "Password must be at least 8 characters".to_string(),
            ));
        }
        Ok(())
    }
}

#[async_trait]
impl AuthService for SeaOrmAuthService {
    async fn login(&self, username: &str, password: &str) -> Result<(User, String), AuthError> {
        let Some((user, password_hash)) = self.store.get_user_credentials(username).await? else {
            return Err(AuthError::InvalidCredentials);
        };

        // A suspended account keeps its credentials but cannot log in.
        if !user.active {
            return Err(AuthError::InvalidCredentials);
        }

        let is_valid = crate::db::repositories::user::verify_against_hash(
            password_hash,
            password.to_string(),
        )
        .await?;

        if !is_valid {
            return Err(AuthError::InvalidCredentials);
        }

        let token = self
            .sessions
            .issue(&user)
            .map_err(|e| AuthError::Internal(e.to_string()))?;

        Ok((user, token))
    }

    async fn register(&self, input: RegisterInput) -> Result<User, AuthError> {
        if input.username.trim().is_empty() {
            return Err(AuthError::Validation("Username is required".to_string()));
        }
        if input.display_name.trim().is_empty() {
            return Err(AuthError::Validation("Display name is required".to_string()));
        }
        if !input.email.contains('@') {
            return Err(AuthError::Validation("A valid email is required".to_string()));
        }
        Self::validate_password(&input.password)?;

        // Friendly pre-check; the partial unique indexes catch the race
        // two concurrent registrations can still win together.
        match self
            .store
            .find_user_conflict(Some(&input.username), Some(&input.email), None)
            .await?
        {
            Some(UserConflict::Username) => {
                return Err(AuthError::Conflict("Username is already taken".to_string()));
            }
            Some(UserConflict::Email) => {
                return Err(AuthError::Conflict("Email is already registered".to_string()));
            }
            None => {}
        }

        let new_user = NewUser {
            username: input.username,
            display_name: input.display_name,
            email: input.email,
            password: input.password,
            role: Role::Employee,
            active: true,
            avatar: None,
        };

        let user = self
            .store
            .create_user(new_user, &self.config.security)
            .await
            .map_err(|e| {
                if e.downcast_ref::<UniqueViolation>().is_some() {
                    AuthError::Conflict("Username or email is already taken".to_string())
                } else {
                    AuthError::Internal(e.to_string())
                }
            })?;

        info!("Registered new account: {}", user.username);
        Ok(user)
    }

    async fn forgot_password(&self, email: &str) -> Result<(), AuthError> {
        let user = self
            .store
            .get_user_by_email(email)
            .await?
            .ok_or(AuthError::UnknownEmail)?;

        let secret = generate_reset_secret();
        let token_hash = hash_reset_secret(&secret);
        let requested_at = chrono::Utc::now().to_rfc3339();

        self.store
            .set_reset_ticket(user.id, Some(token_hash), Some(requested_at))
            .await?;

        let base_url = self
            .config
            .mail
            .frontend_url(&self.config.general.environment);
        let link = format!("{base_url}/resetpassword/{secret}");
        let body = format!(
            "Hello {},\n\n\
             A password reset was requested for your account. Follow the link\n\
             below within {} minutes to choose a new password:\n\n{link}\n\n\
             If you did not request this, you can ignore this message.",
            user.display_name,
            reset::TTL_MINUTES,
        );

        if let Err(e) = self
            .mailer
            .send(&user.email, "Reset your password", &body)
            .await
        {
            // Roll the ticket back so a secret that never reached the
            // user cannot linger.
            warn!("Reset mail delivery failed for {}: {e}", user.email);
            self.store.set_reset_ticket(user.id, None, None).await?;
            return Err(AuthError::Delivery(e.to_string()));
        }

        info!("Reset ticket issued for user {}", user.id);
        Ok(())
    }

    async fn reset_password(&self, raw_token: &str, new_password: &str) -> Result<(), AuthError> {
        Self::validate_password(new_password)?;

        let token_hash = hash_reset_secret(raw_token);
        let Some((user, requested_at)) = self.store.find_user_by_reset_hash(&token_hash).await?
        else {
            return Err(AuthError::InvalidResetToken);
        };

        let issued = chrono::DateTime::parse_from_rfc3339(&requested_at)
            .map_err(|e| AuthError::Internal(format!("Bad reset timestamp: {e}")))?
            .with_timezone(&chrono::Utc);
        let age = chrono::Utc::now() - issued;

        if age > chrono::Duration::minutes(reset::TTL_MINUTES) {
            // Expired tickets stay in place until a new forgot-password
            // request overwrites them; expiry is only checked here.
            return Err(AuthError::InvalidResetToken);
        }

        self.store
            .update_user_password(user.id, new_password, &self.config.security)
            .await?;
        self.store.set_reset_ticket(user.id, None, None).await?;

        info!("Password reset consumed for user {}", user.id);
        Ok(())
    }
}

/// Generate a high-entropy one-time secret (64 character hex string).
#[must_use]
pub fn generate_reset_secret() -> String {
    use rand::Rng;

    let mut rng = rand::rng();
    let bytes: [u8; 32] = rng.random();

    bytes
        .iter()
        .fold(String::with_capacity(reset::SECRET_HEX_LEN), |mut acc, b| {
            use std::fmt::Write;
            let _ = write!(acc, "{b:02x}");
            acc
        })
}

/// One-way hash of the raw secret; only this ever touches storage.
#[must_use]
pub fn hash_reset_secret(secret: &str) -> String {
    let digest = Sha256::digest(secret.as_bytes());
    hex::encode(digest)
}
