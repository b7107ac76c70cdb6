//! Persisted records: users, session log entries, calorie entries

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ============================================================================
// Identity
// ============================================================================

/// An account, created by password registration or by the first Google login.
///
/// Invariant: at least one of `password_hash` / `google_id` is set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    /// Google subject identifier, set only for accounts created through OAuth
    pub google_id: Option<String>,
    pub email: String,
    /// bcrypt hash, set only for accounts created through `/register`
    #[serde(skip_serializing)]
    pub password_hash: Option<String>,
    pub name: Option<String>,
}

impl User {
    /// New password account
    pub fn with_password(email: &str, password_hash: String, name: Option<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            google_id: None,
            email: email.to_string(),
            password_hash: Some(password_hash),
            name,
        }
    }

    /// New Google account
    pub fn with_google_id(email: &str, google_id: &str, name: Option<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            google_id: Some(google_id.to_string()),
            email: email.to_string(),
            password_hash: None,
            name,
        }
    }

    pub fn has_password(&self) -> bool {
        self.password_hash.as_deref().is_some_and(|h| !h.is_empty())
    }

    pub fn has_google_id(&self) -> bool {
        self.google_id.as_deref().is_some_and(|g| !g.is_empty())
    }
}

/// Audit record written once per successful login or registration.
///
/// Never read back for verification; the token carries its own expiry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub id: Uuid,
    pub user_id: Uuid,
    pub token: String,
    /// Unix timestamp (seconds), equal to the token's `exp`
    pub expires_at: i64,
}

impl Session {
    pub fn new(user_id: Uuid, token: &str, expires_at: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id,
            token: token.to_string(),
            expires_at: expires_at.timestamp(),
        }
    }
}

// ============================================================================
// Calorie entries
// ============================================================================

/// One dated food-intake record owned by a user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CalorieEntry {
    pub id: Uuid,
    pub user_id: Uuid,
    pub date: String,
    pub meal: String,
    pub calories: i64,
}

/// Client-supplied fields of a calorie entry (add and update payload)
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct EntryInput {
    pub date: String,
    pub meal: String,
    pub calories: i64,
}

impl EntryInput {
    /// Returns a description of the first invalid field, if any.
    pub fn validate(&self) -> Result<(), &'static str> {
        if self.date.trim().is_empty() {
            return Err("date is required");
        }
        if self.meal.trim().is_empty() {
            return Err("meal is required");
        }
        if self.calories < 0 {
            return Err("calories must not be negative");
        }
        Ok(())
    }

    pub fn into_entry(self, user_id: Uuid) -> CalorieEntry {
        CalorieEntry {
            id: Uuid::new_v4(),
            user_id,
            date: self.date,
            meal: self.meal,
            calories: self.calories,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_credential_flags() {
        let pw = User::with_password("a@x.com", "$2b$04$hash".into(), None);
        assert!(pw.has_password());
        assert!(!pw.has_google_id());

        let g = User::with_google_id("b@x.com", "1234", Some("Bob".into()));
        assert!(!g.has_password());
        assert!(g.has_google_id());
    }

    #[test]
    fn test_user_serialization_omits_hash() {
        let user = User::with_password("a@x.com", "$2b$04$secret".into(), None);
        let json = serde_json::to_value(&user).unwrap();
        assert!(json.get("password_hash").is_none());
        assert_eq!(json["email"], "a@x.com");
    }

    #[test]
    fn test_entry_uses_camel_case() {
        let entry = EntryInput {
            date: "2026-10-16".into(),
            meal: "Lunch".into(),
            calories: 640,
        }
        .into_entry(Uuid::nil());
        let json = serde_json::to_value(&entry).unwrap();
        assert_eq!(json["userId"], Uuid::nil().to_string());
        assert_eq!(json["calories"], 640);
    }

    #[test]
    fn test_entry_input_validation() {
        let ok = EntryInput {
            date: "2026-10-16".into(),
            meal: "Dinner".into(),
            calories: 0,
        };
        assert!(ok.validate().is_ok());

        let mut bad = ok.clone();
        bad.meal = "  ".into();
        assert_eq!(bad.validate(), Err("meal is required"));

        let mut bad = ok.clone();
        bad.calories = -5;
        assert!(bad.validate().is_err());

        let mut bad = ok;
        bad.date = String::new();
        assert_eq!(bad.validate(), Err("date is required"));
    }
}
