use crate::error::{AppError, AppResult};
use crate::external::ApiClient;
use crate::models::*;
use crate::utils::is_token_expired;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::{Arc, PoisonError, RwLock};

/// What survives between runs: the bearer token and who it belongs to.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StoredSession {
    pub token: String,
    pub user: AuthUser,
}

#[derive(Clone)]
pub struct AuthService {
    api: ApiClient,
    token_path: PathBuf,
    current: Arc<RwLock<Option<AuthUser>>>,
}

impl AuthService {
    pub fn new(api: ApiClient, token_path: impl Into<PathBuf>) -> Self {
        Self {
            api,
            token_path: token_path.into(),
            current: Arc::new(RwLock::new(None)),
        }
    }

    pub fn current_user(&self) -> Option<AuthUser> {
        self.current
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub async fn login(&self, username: &str, password: &str) -> AppResult<AuthUser> {
        if username.trim().is_empty() || password.is_empty() {
            return Err(AppError::ValidationError(
                "Username and password are required".to_string(),
            ));
        }

        let response: LoginResponse = self
            .api
            .post(
                "/auth/login",
                &LoginRequest {
                    username: username.trim().to_string(),
                    password: password.to_string(),
                },
            )
            .await?;

        let session = StoredSession {
            token: response.token,
            user: response.user,
        };
        write_session(&self.token_path, &session).await?;
        self.activate(&session);

        log::info!("Logged in as {} ({})", session.user.username, session.user.role);
        Ok(session.user)
    }

    /// Load a previously saved session. Expired tokens are discarded.
    pub async fn restore(&self) -> AppResult<Option<AuthUser>> {
        let raw = match tokio::fs::read_to_string(&self.token_path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        let session: StoredSession = match serde_json::from_str(&raw) {
            Ok(session) => session,
            Err(e) => {
                log::warn!("Ignoring unreadable session file {}: {e}", self.token_path.display());
                remove_session(&self.token_path).await?;
                return Ok(None);
            }
        };

        if is_token_expired(&session.token, Utc::now()) {
            log::info!("Saved session for {} has expired", session.user.username);
            remove_session(&self.token_path).await?;
            return Ok(None);
        }

        self.activate(&session);
        Ok(Some(session.user))
    }

    pub async fn logout(&self) -> AppResult<()> {
        self.api.set_token(None);
        *self.current.write().unwrap_or_else(PoisonError::into_inner) = None;
        remove_session(&self.token_path).await
    }

    fn activate(&self, session: &StoredSession) {
        self.api.set_token(Some(session.token.clone()));
        *self.current.write().unwrap_or_else(PoisonError::into_inner) = Some(session.user.clone());
    }
}

async fn write_session(path: &Path, session: &StoredSession) -> AppResult<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        tokio::fs::create_dir_all(parent).await?;
    }
    let body = serde_json::to_string_pretty(session)?;
    tokio::fs::write(path, body).await?;
    Ok(())
}

async fn remove_session(path: &Path) -> AppResult<()> {
    match tokio::fs::remove_file(path).await {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e.into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ApiConfig;
    use crate::utils::TokenClaims;
    use chrono::Duration;
    use jsonwebtoken::{EncodingKey, Header, encode};

    fn service(path: &Path) -> AuthService {
        let api = ApiClient::new(&ApiConfig::default()).unwrap();
        AuthService::new(api, path)
    }

    fn token(offset: Duration) -> String {
        let claims = TokenClaims {
            exp: Some((Utc::now() + offset).timestamp()),
            role: Some("admin".to_string()),
        };
        encode(&Header::default(), &claims, &EncodingKey::from_secret(b"k")).unwrap()
    }

    fn admin() -> AuthUser {
        AuthUser {
            id: "1".to_string(),
            username: "admin".to_string(),
            role: Role::Admin,
        }
    }

    #[tokio::test]
    async fn test_restore_live_session() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/session.json");
        let session = StoredSession {
            token: token(Duration::hours(1)),
            user: admin(),
        };
        write_session(&path, &session).await.unwrap();

        let auth = service(&path);
        assert_eq!(auth.restore().await.unwrap(), Some(admin()));
        assert_eq!(auth.current_user(), Some(admin()));
        assert_eq!(auth.api.token(), Some(session.token));
    }

    #[tokio::test]
    async fn test_expired_session_is_dropped() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");
        let session = StoredSession {
            token: token(Duration::hours(-1)),
            user: admin(),
        };
        write_session(&path, &session).await.unwrap();

        let auth = service(&path);
        assert_eq!(auth.restore().await.unwrap(), None);
        assert!(!path.exists());
        assert!(auth.api.token().is_none());
    }

    #[tokio::test]
    async fn test_missing_session_and_logout() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");
        let auth = service(&path);

        assert_eq!(auth.restore().await.unwrap(), None);
        auth.logout().await.unwrap();
        auth.logout().await.unwrap();
        assert!(auth.current_user().is_none());
    }

    #[tokio::test]
    async fn test_login_requires_credentials() {
        let dir = tempfile::tempdir().unwrap();
        let auth = service(&dir.path().join("session.json"));
        assert!(matches!(
            auth.login(" ", "secret").await,
            Err(AppError::ValidationError(_))
        ));
    }
}
