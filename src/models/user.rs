use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    #[serde(rename = "_id")]
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

impl User {
    pub fn is_admin(&self) -> bool {
        self.role.as_deref() == Some("admin")
    }

    pub fn account_type(&self) -> &'static str {
        if self.is_admin() {
            "Administrator"
        } else {
            "Regular Member"
        }
    }

    /// Буква для аватара.
    pub fn initial(&self) -> Option<char> {
        self.name.chars().next().map(|c| c.to_ascii_uppercase())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserStats {
    #[serde(default)]
    pub total_bookings: u32,
    #[serde(default)]
    pub monthly_bookings: u32,
    #[serde(default)]
    pub total_spent: Decimal,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn account_type_depends_on_role() {
        let mut user = User {
            id: "u1".into(),
            name: "ada".into(),
            email: None,
            role: Some("admin".into()),
            created_at: None,
        };
        assert_eq!(user.account_type(), "Administrator");
        assert_eq!(user.initial(), Some('A'));
        user.role = None;
        assert_eq!(user.account_type(), "Regular Member");
    }
}
