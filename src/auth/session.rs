//! Сессия текущего пользователя.
//!
//! Вместо глобального контекста - явный объект, который передаётся туда, где нужна
//! идентичность (`Arc<Session>`): API-клиенту, чекауту, профилю.
//! Жизненный цикл: заполняется при логине, очищается при логауте или ответе 401.

use chrono::{DateTime, TimeZone, Utc};
use jsonwebtoken::{decode, DecodingKey, Validation};
use serde::Deserialize;
use std::sync::{PoisonError, RwLock};
use thiserror::Error;
use tracing::{debug, info};

use crate::models::User;

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("invalid token: {0}")]
    InvalidToken(#[from] jsonwebtoken::errors::Error),
    #[error("token has expired")]
    Expired,
    #[error("token carries no user id")]
    MissingUserId,
}

// Claims из bearer-токена. Подпись проверяет сервер, клиенту нужны только id, имя и срок.
#[derive(Debug, Deserialize)]
struct Claims {
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    sub: Option<String>,
    #[serde(default, rename = "_id")]
    underscore_id: Option<String>,
    #[serde(default, rename = "userId")]
    user_id: Option<String>,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    role: Option<String>,
    #[serde(default)]
    exp: Option<i64>,
}

impl Claims {
    // Первый из встречающихся вариантов поля с id пользователя.
    fn user_id(&self) -> Option<String> {
        [&self.id, &self.sub, &self.underscore_id, &self.user_id]
            .into_iter()
            .find_map(|v| v.clone())
    }
}

#[derive(Debug, Clone)]
struct SessionData {
    token: String,
    user: User,
    expires_at: Option<DateTime<Utc>>,
}

impl SessionData {
    fn is_live(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.map_or(true, |exp| exp > now)
    }
}

#[derive(Debug, Default)]
pub struct Session {
    inner: RwLock<Option<SessionData>>,
}

impl Session {
    /// Пустая (анонимная) сессия.
    pub fn new() -> Self {
        Self::default()
    }

    /// Логин по ответу сервера: токен и профиль пользователя.
    pub fn login(&self, token: String, user: User) {
        let expires_at = read_claims(&token).ok().and_then(|c| c.exp).and_then(timestamp);
        info!("User {} logged in", user.id);
        *self.inner.write().unwrap_or_else(PoisonError::into_inner) = Some(SessionData { token, user, expires_at });
    }

    /// Восстанавливает сессию из готового bearer-токена.
    pub fn login_with_token(&self, token: String) -> Result<(), SessionError> {
        let claims = read_claims(&token)?;
        let expires_at = claims.exp.and_then(timestamp);
        if expires_at.is_some_and(|exp| exp <= Utc::now()) {
            return Err(SessionError::Expired);
        }

        let id = claims.user_id().ok_or(SessionError::MissingUserId)?;
        let user = User {
            name: claims.name.unwrap_or_else(|| id.clone()),
            id,
            email: claims.email,
            role: claims.role,
            created_at: None,
        };
        info!("Session restored from token for user {}", user.id);
        *self.inner.write().unwrap_or_else(PoisonError::into_inner) = Some(SessionData { token, user, expires_at });
        Ok(())
    }

    pub fn logout(&self) {
        let previous = self.inner.write().unwrap_or_else(PoisonError::into_inner).take();
        if let Some(data) = previous {
            info!("User {} logged out", data.user.id);
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.live().is_some()
    }

    pub fn current_user(&self) -> Option<User> {
        self.live().map(|d| d.user)
    }

    pub fn bearer_token(&self) -> Option<String> {
        self.live().map(|d| d.token)
    }

    fn live(&self) -> Option<SessionData> {
        let guard = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        match guard.as_ref() {
            Some(data) if data.is_live(Utc::now()) => Some(data.clone()),
            Some(data) => {
                debug!("Session token for user {} has expired", data.user.id);
                None
            }
            None => None,
        }
    }
}

fn read_claims(token: &str) -> Result<Claims, jsonwebtoken::errors::Error> {
    let mut validation = Validation::default();
    validation.insecure_disable_signature_validation();
    validation.validate_exp = false;
    validation.validate_aud = false;
    validation.required_spec_claims.clear();
    Ok(decode::<Claims>(token, &DecodingKey::from_secret(&[]), &validation)?.claims)
}

fn timestamp(secs: i64) -> Option<DateTime<Utc>> {
    Utc.timestamp_opt(secs, 0).single()
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsonwebtoken::{encode, EncodingKey, Header};
    use serde_json::json;

    fn token(exp: i64) -> String {
        encode(
            &Header::default(),
            &json!({"id": "u1", "name": "Ada", "email": "ada@example.com", "exp": exp}),
            &EncodingKey::from_secret(b"server-secret"),
        )
        .unwrap()
    }

    #[test]
    fn restores_user_from_token_claims() {
        let session = Session::new();
        assert!(!session.is_authenticated());

        let exp = (Utc::now() + chrono::Duration::hours(1)).timestamp();
        session.login_with_token(token(exp)).unwrap();
        assert!(session.is_authenticated());
        let user = session.current_user().unwrap();
        assert_eq!(user.id, "u1");
        assert_eq!(user.name, "Ada");
        assert!(session.bearer_token().is_some());
    }

    #[test]
    fn expired_token_is_rejected() {
        let session = Session::new();
        let exp = (Utc::now() - chrono::Duration::minutes(5)).timestamp();
        assert!(matches!(session.login_with_token(token(exp)), Err(SessionError::Expired)));
        assert!(!session.is_authenticated());
    }

    fn encode_claims(claims: serde_json::Value) -> String {
        encode(&Header::default(), &claims, &EncodingKey::from_secret(b"server-secret")).unwrap()
    }

    #[test]
    fn token_with_both_id_and_sub_is_accepted() {
        let session = Session::new();
        let exp = (Utc::now() + chrono::Duration::hours(1)).timestamp();
        session
            .login_with_token(encode_claims(json!({"id": "u1", "sub": "u1", "name": "Ada", "exp": exp})))
            .unwrap();
        assert_eq!(session.current_user().unwrap().id, "u1");
    }

    #[test]
    fn audience_is_not_checked_on_client() {
        let session = Session::new();
        let exp = (Utc::now() + chrono::Duration::hours(1)).timestamp();
        session
            .login_with_token(encode_claims(json!({"id": "u1", "aud": "movies", "exp": exp})))
            .unwrap();
        assert!(session.is_authenticated());
    }

    #[test]
    fn user_id_falls_back_to_sub_then_user_id() {
        let session = Session::new();
        session.login_with_token(encode_claims(json!({"sub": "s1"}))).unwrap();
        assert_eq!(session.current_user().unwrap().id, "s1");
        session.login_with_token(encode_claims(json!({"userId": "x9", "name": "Bob"}))).unwrap();
        assert_eq!(session.current_user().unwrap().id, "x9");
        assert!(matches!(
            session.login_with_token(encode_claims(json!({"name": "Nobody"}))),
            Err(SessionError::MissingUserId)
        ));
    }

    #[test]
    fn garbage_token_is_rejected() {
        let session = Session::new();
        assert!(matches!(
            session.login_with_token("not-a-jwt".to_string()),
            Err(SessionError::InvalidToken(_))
        ));
    }

    #[test]
    fn logout_clears_identity() {
        let session = Session::new();
        let user = User { id: "u2".into(), name: "Bob".into(), email: None, role: None, created_at: None };
        session.login("opaque-token".to_string(), user);
        assert!(session.is_authenticated());
        assert_eq!(session.bearer_token().as_deref(), Some("opaque-token"));
        session.logout();
        assert!(!session.is_authenticated());
        assert!(session.current_user().is_none());
    }
}
