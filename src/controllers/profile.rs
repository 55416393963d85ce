use chrono::{DateTime, Utc};

use crate::auth::{Navigator, Route, Session};
use crate::checkout::pricing::Money;
use crate::models::{User, UserStats};
use crate::services::api::{ApiClient, ApiError};

pub const FETCH_FAILED: &str = "Failed to fetch user stats";

/// Данные страницы профиля.
#[derive(Debug, Clone, PartialEq)]
pub struct Profile {
    pub user: User,
    pub stats: UserStats,
}

impl Profile {
    /// Загружает статистику пользователя из сессии.
    pub async fn load(api: &ApiClient) -> Result<Self, ApiError> {
        let session_user = api.session().current_user().ok_or(ApiError::NotAuthenticated)?;
        let response = api.user_stats().await?;
        Ok(Self {
            user: response.user.unwrap_or(session_user),
            stats: response.stats,
        })
    }

    pub fn initial(&self) -> char {
        self.user.initial().unwrap_or('?')
    }

    pub fn account_type(&self) -> &'static str {
        self.user.account_type()
    }

    /// "March 2024"
    pub fn member_since(&self) -> Option<String> {
        self.user.created_at.map(|at: DateTime<Utc>| at.format("%B %Y").to_string())
    }

    pub fn total_spent(&self) -> Money {
        Money(self.stats.total_spent)
    }
}

/// Выход: сессия очищается, пользователь уходит на экран логина.
pub fn logout(session: &Session, navigator: &dyn Navigator) {
    session.logout();
    navigator.navigate(Route::Login);
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    #[derive(Default)]
    struct Recorder(RefCell<Vec<Route>>);

    impl Navigator for Recorder {
        fn navigate(&self, route: Route) {
            self.0.borrow_mut().push(route);
        }
    }

    fn user() -> User {
        serde_json::from_value(serde_json::json!({
            "_id": "u1", "name": "grace", "role": "admin", "createdAt": "2024-03-10T12:00:00Z"
        }))
        .unwrap()
    }

    #[test]
    fn profile_helpers() {
        let profile = Profile { user: user(), stats: UserStats::default() };
        assert_eq!(profile.initial(), 'G');
        assert_eq!(profile.account_type(), "Administrator");
        assert_eq!(profile.member_since().as_deref(), Some("March 2024"));
        assert_eq!(profile.total_spent().to_string(), "$0.00");
    }

    #[test]
    fn logout_clears_session_and_goes_to_login() {
        let session = Session::new();
        session.login("t".into(), user());
        let nav = Recorder::default();
        logout(&session, &nav);
        assert!(!session.is_authenticated());
        assert_eq!(*nav.0.borrow(), vec![Route::Login]);
    }
}
