use serde::Deserialize;
use validator::Validate;

use crate::models::{Specification, UserProfileUpdate};
use crate::utils::validation::{validate_not_blank, validate_specification};

/// Body of `PATCH /update_user_info`. Absent fields are left unchanged;
/// unknown fields such as `email` or `password` are rejected.
#[derive(Debug, Default, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct UpdateUserRequest {
    #[validate(
        custom(function = "validate_not_blank", message = "Name must not be empty"),
        length(max = 100, message = "Name must be at most 100 characters")
    )]
    pub name: Option<String>,

    #[validate(custom(function = "validate_specification", message = "Unknown specification"))]
    pub specification: Option<String>,

    #[validate(length(max = 64, message = "Telegram handle must be at most 64 characters"))]
    pub telegram: Option<String>,

    #[validate(length(max = 2000, message = "About must be at most 2000 characters"))]
    pub about: Option<String>,

    #[validate(length(max = 512, message = "Photo URL must be at most 512 characters"))]
    pub photo_url: Option<String>,

    #[validate(length(max = 512, message = "Resume URL must be at most 512 characters"))]
    pub resume_url: Option<String>,
}

impl UpdateUserRequest {
    /// Trimmed edit for the store. Call after `validate()`; an unparseable
    /// specification is dropped rather than written.
    pub fn into_update(self) -> UserProfileUpdate {
        let trim = |value: Option<String>| value.map(|v| v.trim().to_string());

        UserProfileUpdate {
            name: trim(self.name),
            specification: self
                .specification
                .and_then(|s| s.parse::<Specification>().ok()),
            telegram: trim(self.telegram),
            about: trim(self.about),
            photo_url: trim(self.photo_url),
            resume_url: trim(self.resume_url),
        }
    }
}
