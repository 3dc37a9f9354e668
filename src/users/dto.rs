use serde::{Deserialize, Serialize};

use crate::users::repo_types::User;

/// Request body for user registration.
#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub password: String,
}

/// Request body for login.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Response returned after login.
#[derive(Debug, Serialize)]
pub struct TokenResponse {
    pub token: String,
}

/// Partial profile update. Absent or blank fields keep their current
/// values.
#[derive(Debug, Default, Deserialize)]
pub struct UpdateProfileRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub photo: Option<String>,
    pub phone: Option<String>,
    pub bio: Option<String>,
}

/// Request body for changing the password of a logged-in user.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePasswordRequest {
    pub old_password: String,
    pub new_password: String,
}

/// Request body for completing a password reset.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResetPasswordRequest {
    pub new_password: String,
}

fn non_empty(field: &Option<String>) -> Option<String> {
    field
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_owned)
}

impl UpdateProfileRequest {
    /// The submitted email, if a non-blank value was provided.
    pub fn submitted_email(&self) -> Option<String> {
        non_empty(&self.email)
    }

    /// Merge submitted fields over the current record, field by field.
    pub fn merge_into(&self, user: &mut User) {
        if let Some(name) = non_empty(&self.name) {
            user.name = name;
        }
        if let Some(email) = non_empty(&self.email) {
            user.email = email;
        }
        if let Some(photo) = non_empty(&self.photo) {
            user.photo = Some(photo);
        }
        if let Some(phone) = non_empty(&self.phone) {
            user.phone = phone;
        }
        if let Some(bio) = non_empty(&self.bio) {
            user.bio = bio;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::OffsetDateTime;
    use uuid::Uuid;

    fn sample_user() -> User {
        User {
            id: Uuid::new_v4(),
            name: "Ann".into(),
            email: "ann@x.com".into(),
            password_hash: "$argon2id$stub".into(),
            photo: None,
            phone: "+91".into(),
            bio: "bio".into(),
            created_at: OffsetDateTime::now_utc(),
        }
    }

    #[test]
    fn merge_keeps_unset_fields() {
        let mut user = sample_user();
        let update = UpdateProfileRequest {
            name: Some("Ann B.".into()),
            ..Default::default()
        };
        update.merge_into(&mut user);
        assert_eq!(user.name, "Ann B.");
        assert_eq!(user.email, "ann@x.com");
        assert_eq!(user.phone, "+91");
        assert_eq!(user.bio, "bio");
        assert_eq!(user.photo, None);
    }

    #[test]
    fn merge_treats_blank_as_absent() {
        let mut user = sample_user();
        let update = UpdateProfileRequest {
            name: Some("   ".into()),
            bio: Some("".into()),
            phone: Some("+49 151 0000".into()),
            ..Default::default()
        };
        update.merge_into(&mut user);
        assert_eq!(user.name, "Ann");
        assert_eq!(user.bio, "bio");
        assert_eq!(user.phone, "+49 151 0000");
    }

    #[test]
    fn merge_sets_optional_photo() {
        let mut user = sample_user();
        let update = UpdateProfileRequest {
            photo: Some("https://cdn.example/ann.png".into()),
            ..Default::default()
        };
        update.merge_into(&mut user);
        assert_eq!(user.photo.as_deref(), Some("https://cdn.example/ann.png"));
    }

    #[test]
    fn submitted_email_ignores_blank() {
        let update = UpdateProfileRequest {
            email: Some("  ".into()),
            ..Default::default()
        };
        assert_eq!(update.submitted_email(), None);

        let update = UpdateProfileRequest {
            email: Some(" bob@x.com ".into()),
            ..Default::default()
        };
        assert_eq!(update.submitted_email().as_deref(), Some("bob@x.com"));
    }

    #[test]
    fn user_json_omits_password_hash() {
        let user = sample_user();
        let json = serde_json::to_string(&user).unwrap();
        assert!(!json.contains("password_hash"));
        assert!(!json.contains("$argon2id$stub"));
        assert!(json.contains("ann@x.com"));
    }
}
