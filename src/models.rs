use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::AppError;

pub const DEFAULT_EDIT_PW: &str = "0000";

pub const MAX_USER_NAME_CHARS: usize = 20;
pub const MAX_SELECTED_BADGES: usize = 6;
/// Base64 data URL length, roughly 100 KB of raw image bytes.
pub const MAX_AVATAR_CHARS: usize = 140_000;

/// One stored report. `daily_stats` and `ach_state` are produced and consumed
/// entirely by the client pipeline and stay opaque here.
#[derive(Serialize, Deserialize)]
pub struct ReportRecord {
    pub daily_stats: Value,
    pub ach_state: Value,
    #[serde(default = "default_edit_pw")]
    pub edit_pw: String,
    #[serde(default)]
    pub profile: Profile,
}

fn default_edit_pw() -> String {
    DEFAULT_EDIT_PW.to_string()
}

/// User customizations that must survive stat re-uploads.
#[derive(Serialize, Deserialize, Default, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub selected_badges: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
}

impl Profile {
    /// Only fields carried by the update are replaced.
    pub fn apply(&mut self, update: ProfileUpdate) {
        if let Some(user_name) = update.user_name {
            self.user_name = Some(user_name);
        }
        if let Some(selected_badges) = update.selected_badges {
            self.selected_badges = Some(selected_badges);
        }
        if let Some(avatar) = update.avatar {
            self.avatar = Some(avatar);
        }
    }
}

#[derive(Debug, Default, PartialEq)]
pub struct ProfileUpdate {
    pub user_name: Option<String>,
    pub selected_badges: Option<Vec<String>>,
    pub avatar: Option<String>,
}

impl ProfileUpdate {
    /// Validates each field independently; a field is checked only when the
    /// update carries it, so error responses name the offending field.
    pub fn from_value(updates: &Value) -> Result<Self, AppError> {
        let updates = updates.as_object().ok_or(AppError::InvalidJson)?;
        let mut parsed = Self::default();

        if let Some(user_name) = updates.get("userName") {
            let user_name = user_name.as_str().ok_or(AppError::InvalidField("userName"))?;
            if user_name.chars().count() > MAX_USER_NAME_CHARS {
                return Err(AppError::FieldTooLong {
                    field: "userName",
                    max: MAX_USER_NAME_CHARS,
                });
            }
            parsed.user_name = Some(user_name.trim().to_string());
        }

        if let Some(selected) = updates.get("selectedBadges") {
            let selected = selected
                .as_array()
                .ok_or(AppError::InvalidField("selectedBadges"))?;
            if selected.len() > MAX_SELECTED_BADGES {
                return Err(AppError::FieldTooLong {
                    field: "selectedBadges",
                    max: MAX_SELECTED_BADGES,
                });
            }
            let badges = selected
                .iter()
                .map(|badge| badge.as_str().map(str::to_string))
                .collect::<Option<Vec<_>>>()
                .ok_or(AppError::InvalidField("selectedBadges"))?;
            parsed.selected_badges = Some(badges);
        }

        if let Some(avatar) = updates.get("avatar") {
            let avatar = avatar.as_str().ok_or(AppError::InvalidField("avatar"))?;
            if !avatar.starts_with("data:image/") {
                return Err(AppError::InvalidField("avatar"));
            }
            if avatar.chars().count() > MAX_AVATAR_CHARS {
                return Err(AppError::AvatarTooLarge);
            }
            parsed.avatar = Some(avatar.to_string());
        }

        Ok(parsed)
    }
}

#[derive(Serialize)]
pub struct UploadResponse {
    pub id: String,
    pub url: String,
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::{AppError, MAX_AVATAR_CHARS, Profile, ProfileUpdate, ReportRecord};

    #[test]
    fn test_user_name_boundary() {
        let at_limit = "a".repeat(20);
        let update = ProfileUpdate::from_value(&json!({ "userName": at_limit })).unwrap();
        assert_eq!(update.user_name.as_deref(), Some(at_limit.as_str()));

        let over_limit = "a".repeat(21);
        assert!(matches!(
            ProfileUpdate::from_value(&json!({ "userName": over_limit })),
            Err(AppError::FieldTooLong { field: "userName", .. })
        ));
    }

    #[test]
    fn test_user_name_is_trimmed() {
        let update = ProfileUpdate::from_value(&json!({ "userName": "  padded  " })).unwrap();
        assert_eq!(update.user_name.as_deref(), Some("padded"));
    }

    #[test]
    fn test_user_name_type_is_checked() {
        assert!(matches!(
            ProfileUpdate::from_value(&json!({ "userName": 42 })),
            Err(AppError::InvalidField("userName"))
        ));
        assert!(matches!(
            ProfileUpdate::from_value(&json!({ "userName": null })),
            Err(AppError::InvalidField("userName"))
        ));
    }

    #[test]
    fn test_selected_badges_limits() {
        let six = vec!["b"; 6];
        let update = ProfileUpdate::from_value(&json!({ "selectedBadges": six })).unwrap();
        assert_eq!(update.selected_badges.unwrap().len(), 6);

        let seven = vec!["b"; 7];
        assert!(matches!(
            ProfileUpdate::from_value(&json!({ "selectedBadges": seven })),
            Err(AppError::FieldTooLong { field: "selectedBadges", .. })
        ));

        assert!(matches!(
            ProfileUpdate::from_value(&json!({ "selectedBadges": ["ok", 3] })),
            Err(AppError::InvalidField("selectedBadges"))
        ));
        assert!(matches!(
            ProfileUpdate::from_value(&json!({ "selectedBadges": "nope" })),
            Err(AppError::InvalidField("selectedBadges"))
        ));
    }

    #[test]
    fn test_avatar_rules() {
        let ok = "data:image/png;base64,AAAA";
        let update = ProfileUpdate::from_value(&json!({ "avatar": ok })).unwrap();
        assert_eq!(update.avatar.as_deref(), Some(ok));

        assert!(matches!(
            ProfileUpdate::from_value(&json!({ "avatar": "http://x/a.png" })),
            Err(AppError::InvalidField("avatar"))
        ));

        let huge = format!("data:image/png;base64,{}", "A".repeat(MAX_AVATAR_CHARS));
        assert!(matches!(
            ProfileUpdate::from_value(&json!({ "avatar": huge })),
            Err(AppError::AvatarTooLarge)
        ));
    }

    #[test]
    fn test_apply_leaves_absent_fields() {
        let mut profile = Profile {
            user_name: Some("old".to_string()),
            selected_badges: Some(vec!["first".to_string()]),
            avatar: None,
        };

        profile.apply(ProfileUpdate {
            user_name: Some("new".to_string()),
            ..ProfileUpdate::default()
        });

        assert_eq!(profile.user_name.as_deref(), Some("new"));
        assert_eq!(profile.selected_badges, Some(vec!["first".to_string()]));
    }

    #[test]
    fn test_record_defaults() {
        let record: ReportRecord =
            serde_json::from_value(json!({ "daily_stats": {}, "ach_state": {} })).unwrap();

        assert_eq!(record.edit_pw, "0000");
        assert_eq!(record.profile, Profile::default());
    }

    #[test]
    fn test_profile_wire_names() {
        let profile = Profile {
            user_name: Some("X".to_string()),
            selected_badges: Some(vec![]),
            avatar: None,
        };

        let value = serde_json::to_value(&profile).unwrap();
        assert_eq!(value, json!({ "userName": "X", "selectedBadges": [] }));
    }
}
