use serde::{Deserialize, Serialize};

use crate::serde_util::{null_default, string_or_number};

// ── Users ──

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    #[default]
    #[serde(other)]
    User,
}

/// A user record as returned by the auth service.
///
/// `/user/me` keys the id as `_id`, the Google login reply as `id`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    #[serde(rename = "_id", alias = "id", default)]
    pub id: String,
    pub email: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "null_default")]
    pub role: Role,
    #[serde(default, deserialize_with = "string_or_number")]
    pub phone: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub bio: Option<String>,
    #[serde(default)]
    pub picture: Option<String>,
    #[serde(default, deserialize_with = "null_default")]
    pub points: i64,
    #[serde(default, deserialize_with = "null_default")]
    pub rating: f64,
    #[serde(default, rename = "items", deserialize_with = "null_default")]
    pub items_listed: u32,
    #[serde(default, deserialize_with = "null_default")]
    pub swaps: u32,
    #[serde(default, deserialize_with = "null_default")]
    pub favorites: u32,
    #[serde(default)]
    pub created_at: Option<String>,
}

impl User {
    pub fn display_name(&self) -> &str {
        match self.name.as_deref() {
            Some(name) if !name.trim().is_empty() => name,
            _ => &self.email,
        }
    }

    /// Initials for avatar fallbacks ("Sarah Johnson" -> "SJ").
    pub fn initials(&self) -> String {
        self.display_name()
            .split_whitespace()
            .filter_map(|part| part.chars().next())
            .flat_map(char::to_uppercase)
            .take(2)
            .collect()
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    pub fn eco_impact(&self) -> EcoImpact {
        EcoImpact::from_swaps(self.swaps)
    }

    /// "March 2024" from an ISO `created_at`, "Recently" when absent or
    /// unreadable.
    pub fn member_since(&self) -> String {
        self.created_at
            .as_deref()
            .and_then(month_year)
            .unwrap_or_else(|| "Recently".to_string())
    }

    pub fn points_label(&self) -> String {
        let grouped = group_thousands(self.points.unsigned_abs());
        if self.points < 0 {
            format!("-{grouped} pts")
        } else {
            format!("{grouped} pts")
        }
    }
}

const MONTHS: [&str; 12] = [
    "January", "February", "March", "April", "May", "June", "July", "August", "September",
    "October", "November", "December",
];

fn month_year(iso: &str) -> Option<String> {
    let year: u32 = iso.get(0..4)?.parse().ok()?;
    if iso.get(4..5)? != "-" {
        return None;
    }
    let month: usize = iso.get(5..7)?.parse().ok()?;
    let name = MONTHS.get(month.checked_sub(1)?)?;
    Some(format!("{name} {year}"))
}

/// `GET /user/me` wraps the record in `{"user": ...}`; older deployments
/// return it bare.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum ProfileEnvelope {
    Wrapped { user: User },
    Bare(User),
}

impl ProfileEnvelope {
    pub fn into_user(self) -> User {
        match self {
            Self::Wrapped { user } | Self::Bare(user) => user,
        }
    }
}

/// Partial profile update. Absent fields are left untouched by the server.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UserUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bio: Option<String>,
}

impl UserUpdate {
    /// Builds an update holding only the fields that differ from `current`.
    pub fn diff(current: &User, edited: &UserUpdate) -> Self {
        fn changed(old: Option<&str>, new: Option<&String>) -> Option<String> {
            let new = new?.trim();
            (old.unwrap_or_default() != new).then(|| new.to_string())
        }

        Self {
            name: changed(current.name.as_deref(), edited.name.as_ref()),
            email: changed(Some(current.email.as_str()), edited.email.as_ref())
                .filter(|email| !email.is_empty()),
            phone: changed(current.phone.as_deref(), edited.phone.as_ref()),
            location: changed(current.location.as_deref(), edited.location.as_ref()),
            bio: changed(current.bio.as_deref(), edited.bio.as_ref()),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.email.is_none()
            && self.phone.is_none()
            && self.location.is_none()
            && self.bio.is_none()
    }
}

// ── Auth requests ──

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bio: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GoogleTokenRequest {
    pub credential: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChangePasswordRequest {
    pub email: String,
    pub old_password: String,
    pub new_password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PasswordResetRequest {
    pub email: String,
    pub password: String,
}

/// Generic `{"message": ...}` reply shared by most mutating endpoints.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MessageResponse {
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub user: Option<User>,
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub product_id: Option<String>,
}

impl MessageResponse {
    pub fn is(&self, sentinel: &str) -> bool {
        self.message == sentinel
    }
}

// ── Dashboard ──

/// Environmental savings shown on the dashboard, derived from swap count.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EcoImpact {
    pub items_saved: u32,
    pub co2_kg: f64,
    pub water_litres: u64,
}

impl EcoImpact {
    const CO2_KG_PER_SWAP: f64 = 0.66;
    const WATER_LITRES_PER_SWAP: u64 = 54;

    pub fn from_swaps(swaps: u32) -> Self {
        Self {
            items_saved: swaps,
            co2_kg: f64::from(swaps) * Self::CO2_KG_PER_SWAP,
            water_litres: u64::from(swaps) * Self::WATER_LITRES_PER_SWAP,
        }
    }

    pub fn co2_label(&self) -> String {
        format!("{:.1} kg", self.co2_kg)
    }

    pub fn water_label(&self) -> String {
        format!("{} L", group_thousands(self.water_litres))
    }
}

/// Formats 12345 as "12,345".
pub fn group_thousands(n: u64) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn profile_parses_wrapped_record_with_numeric_phone() {
        let json = r#"{"user":{"_id":"665f","email":"sam@rewear.dev","name":"Sam Lee",
            "role":"admin","phone":5551234,"points":null,"swaps":3}}"#;
        let user = serde_json::from_str::<ProfileEnvelope>(json).unwrap().into_user();
        assert_eq!(user.id, "665f");
        assert_eq!(user.phone.as_deref(), Some("5551234"));
        assert_eq!(user.points, 0);
        assert!(user.is_admin());
        assert_eq!(user.initials(), "SL");
    }

    #[test]
    fn google_user_uses_plain_id_and_unknown_role_defaults_to_user() {
        let json = r#"{"id":"g-1","email":"g@rewear.dev","name":"G","picture":"","role":"moderator"}"#;
        let user: User = serde_json::from_str(json).unwrap();
        assert_eq!(user.id, "g-1");
        assert_eq!(user.role, Role::User);
    }

    #[test]
    fn roles_parse_in_lowercase() {
        let admin: Role = serde_json::from_str(r#""admin""#).unwrap();
        assert_eq!(admin, Role::Admin);
        let user: Role = serde_json::from_str(r#""user""#).unwrap();
        assert_eq!(user, Role::User);
        assert_eq!(serde_json::to_string(&Role::Admin).unwrap(), r#""admin""#);
        assert_eq!(Role::default(), Role::User);
    }

    #[test]
    fn display_name_falls_back_to_email() {
        let user: User = serde_json::from_str(r#"{"_id":"1","email":"a@b.c","name":" "}"#).unwrap();
        assert_eq!(user.display_name(), "a@b.c");
    }

    #[test]
    fn update_diff_keeps_only_changed_fields() {
        let current: User =
            serde_json::from_str(r#"{"_id":"1","email":"a@b.c","name":"Ann","location":"Oslo"}"#)
                .unwrap();
        let edited = UserUpdate {
            name: Some("Ann".into()),
            email: Some("a@b.c".into()),
            location: Some(" Bergen ".into()),
            bio: Some("Vintage hunter".into()),
            ..Default::default()
        };
        let diff = UserUpdate::diff(&current, &edited);
        assert_eq!(diff.name, None);
        assert_eq!(diff.email, None);
        assert_eq!(diff.location.as_deref(), Some("Bergen"));
        assert_eq!(diff.bio.as_deref(), Some("Vintage hunter"));

        let json = serde_json::to_value(&diff).unwrap();
        assert!(json.get("name").is_none());
    }

    #[test]
    fn eco_impact_matches_dashboard_figures() {
        let impact = EcoImpact::from_swaps(25);
        assert_eq!(impact.co2_label(), "16.5 kg");
        assert_eq!(impact.water_label(), "1,350 L");
        assert_eq!(group_thousands(999), "999");
        assert_eq!(group_thousands(1_234_567), "1,234,567");
    }

    #[test]
    fn member_since_reads_iso_dates() {
        let mut user: User = serde_json::from_str(r#"{"_id":"u1","email":"a@b.c","points":12500}"#).unwrap();
        assert_eq!(user.member_since(), "Recently");
        assert_eq!(user.points_label(), "12,500 pts");

        user.created_at = Some("2024-03-15T10:22:00Z".into());
        assert_eq!(user.member_since(), "March 2024");

        user.created_at = Some("2024-13-01".into());
        assert_eq!(user.member_since(), "Recently");
    }
}
