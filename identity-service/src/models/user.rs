//! User model - password accounts and their public profile.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Professional specification attached to a profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Specification {
    Frontend,
    Backend,
    #[serde(rename = "Machine Learning")]
    MachineLearning,
    Developer,
    Designer,
    Manager,
}

impl Specification {
    pub fn as_str(&self) -> &'static str {
        match self {
            Specification::Frontend => "Frontend",
            Specification::Backend => "Backend",
            Specification::MachineLearning => "Machine Learning",
            Specification::Developer => "Developer",
            Specification::Designer => "Designer",
            Specification::Manager => "Manager",
        }
    }
}

impl std::str::FromStr for Specification {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Frontend" => Ok(Specification::Frontend),
            "Backend" => Ok(Specification::Backend),
            "Machine Learning" => Ok(Specification::MachineLearning),
            "Developer" => Ok(Specification::Developer),
            "Designer" => Ok(Specification::Designer),
            "Manager" => Ok(Specification::Manager),
            _ => Err(format!("Invalid specification: {}", s)),
        }
    }
}

/// User entity as stored by the credential store.
#[derive(Clone, FromRow)]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub specification: String,
    pub telegram: Option<String>,
    pub about: Option<String>,
    pub photo_url: Option<String>,
    pub resume_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Create a new password account with a fresh identifier.
    pub fn new(
        name: String,
        email: String,
        password_hash: String,
        specification: Specification,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            name,
            email,
            password_hash,
            specification: specification.as_str().to_string(),
            telegram: None,
            about: None,
            photo_url: None,
            resume_url: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Convert to sanitized response (no credential material).
    pub fn sanitized(&self) -> UserResponse {
        UserResponse::from(self.clone())
    }
}

impl std::fmt::Debug for User {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("User")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("email", &self.email)
            .field("password_hash", &"[REDACTED]")
            .field("specification", &self.specification)
            .field("created_at", &self.created_at)
            .field("updated_at", &self.updated_at)
            .finish_non_exhaustive()
    }
}

/// Partial profile edit. `None` leaves the stored value unchanged; the email
/// and password hash are not editable through this path.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UserProfileUpdate {
    pub name: Option<String>,
    pub specification: Option<Specification>,
    pub telegram: Option<String>,
    pub about: Option<String>,
    pub photo_url: Option<String>,
    pub resume_url: Option<String>,
}

impl UserProfileUpdate {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Copy the present fields onto `user` and stamp `updated_at`.
    pub fn apply_to(&self, user: &mut User) {
        if let Some(name) = &self.name {
            user.name = name.clone();
        }
        if let Some(specification) = self.specification {
            user.specification = specification.as_str().to_string();
        }
        if let Some(telegram) = &self.telegram {
            user.telegram = Some(telegram.clone());
        }
        if let Some(about) = &self.about {
            user.about = Some(about.clone());
        }
        if let Some(photo_url) = &self.photo_url {
            user.photo_url = Some(photo_url.clone());
        }
        if let Some(resume_url) = &self.resume_url {
            user.resume_url = Some(resume_url.clone());
        }
        user.updated_at = Utc::now();
    }
}

/// User representation returned by the API.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UserResponse {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub specification: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub telegram: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub about: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub photo_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resume_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<User> for UserResponse {
    fn from(u: User) -> Self {
        Self {
            id: u.id,
            name: u.name,
            email: u.email,
            specification: u.specification,
            telegram: u.telegram,
            about: u.about,
            photo_url: u.photo_url,
            resume_url: u.resume_url,
            created_at: u.created_at,
            updated_at: u.updated_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> User {
        User::new(
            "Ada".to_string(),
            "ada@example.com".to_string(),
            "$argon2id$v=19$secret-hash".to_string(),
            Specification::Backend,
        )
    }

    #[test]
    fn test_sanitized_json_has_no_hash() {
        let json = serde_json::to_string(&sample().sanitized()).unwrap();

        assert!(!json.contains("password"));
        assert!(!json.contains("secret-hash"));
        assert!(json.contains("\"specification\":\"Backend\""));
    }

    #[test]
    fn test_debug_redacts_hash() {
        let debug = format!("{:?}", sample());
        assert!(!debug.contains("secret-hash"));
        assert!(debug.contains("[REDACTED]"));
    }

    #[test]
    fn test_profile_update_touches_only_present_fields() {
        let mut user = sample();
        let before = user.clone();

        UserProfileUpdate {
            about: Some("Compilers".to_string()),
            specification: Some(Specification::Manager),
            ..Default::default()
        }
        .apply_to(&mut user);

        assert_eq!(user.name, before.name);
        assert_eq!(user.email, before.email);
        assert_eq!(user.password_hash, before.password_hash);
        assert_eq!(user.about.as_deref(), Some("Compilers"));
        assert_eq!(user.specification, "Manager");
        assert!(user.updated_at >= before.updated_at);
        assert!(UserProfileUpdate::default().is_empty());
    }

    #[test]
    fn test_specification_round_trips_through_str() {
        let spec: Specification = "Machine Learning".parse().unwrap();
        assert_eq!(spec, Specification::MachineLearning);
        assert_eq!(spec.as_str(), "Machine Learning");
        assert!("Astronaut".parse::<Specification>().is_err());
    }
}
