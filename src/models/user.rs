use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Serialize, Serializer};
use sqlx::prelude::FromRow;

/// A row of the `users` table. Column order matches the list query.
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize)]
pub struct UserModel {
    pub id: i64,
    pub first_name: String,
    pub last_name: String,
    pub nickname: String,
    // TODO: drop from the list response once API consumers stop reading it back.
    pub password: String,
    pub email: String,
    pub country: String,
    #[serde(serialize_with = "serialize_rfc3339")]
    pub created_at: DateTime<Utc>,
    #[serde(serialize_with = "serialize_rfc3339")]
    pub updated_at: DateTime<Utc>,
}

/// Timestamps go out as `2006-01-02T15:04:05Z`, whole seconds, `Z` for UTC.
pub fn serialize_rfc3339<S>(ts: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_str(&ts.to_rfc3339_opts(SecondsFormat::Secs, true))
}

/// The allow-list of user columns that callers may set or filter on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UserField {
    FirstName,
    LastName,
    Nickname,
    Password,
    Email,
    Country,
}

impl UserField {
    /// Every recognised field, in column order.
    pub const ALL: [UserField; 6] = [
        UserField::FirstName,
        UserField::LastName,
        UserField::Nickname,
        UserField::Password,
        UserField::Email,
        UserField::Country,
    ];

    /// Column name, which is also the form/query key.
    pub fn as_str(&self) -> &'static str {
        match self {
            UserField::FirstName => "first_name",
            UserField::LastName => "last_name",
            UserField::Nickname => "nickname",
            UserField::Password => "password",
            UserField::Email => "email",
            UserField::Country => "country",
        }
    }
}

/// Values for a new user. Fields the caller left out are stored as empty strings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewUser {
    pub first_name: String,
    pub last_name: String,
    pub nickname: String,
    pub password: String,
    pub email: String,
    pub country: String,
}

impl NewUser {
    pub fn from_lookup<'a, F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<&'a str>,
    {
        let get = |field: UserField| lookup(field.as_str()).unwrap_or_default().to_string();
        Self {
            first_name: get(UserField::FirstName),
            last_name: get(UserField::LastName),
            nickname: get(UserField::Nickname),
            password: get(UserField::Password),
            email: get(UserField::Email),
            country: get(UserField::Country),
        }
    }

    pub fn get(&self, field: UserField) -> &str {
        match field {
            UserField::FirstName => &self.first_name,
            UserField::LastName => &self.last_name,
            UserField::Nickname => &self.nickname,
            UserField::Password => &self.password,
            UserField::Email => &self.email,
            UserField::Country => &self.country,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn sample() -> UserModel {
        let ts = Utc.with_ymd_and_hms(2023, 4, 5, 6, 7, 8).unwrap();
        UserModel {
            id: 7,
            first_name: "Bruce".into(),
            last_name: "Banner".into(),
            nickname: "Hulk".into(),
            password: "smash".into(),
            email: "bruce@example.com".into(),
            country: "USA".into(),
            created_at: ts,
            updated_at: ts + chrono::Duration::milliseconds(1500),
        }
    }

    #[test]
    fn serializes_id_as_number_and_timestamps_as_rfc3339() {
        let json = serde_json::to_value(sample()).unwrap();
        assert_eq!(json["id"], 7);
        assert_eq!(json["nickname"], "Hulk");
        assert_eq!(json["created_at"], "2023-04-05T06:07:08Z");
        assert_eq!(json["updated_at"], "2023-04-05T06:07:09Z");
    }

    #[test]
    fn serialized_timestamps_parse_back() {
        let user = sample();
        let json = serde_json::to_value(&user).unwrap();
        let parsed = DateTime::parse_from_rfc3339(json["created_at"].as_str().unwrap()).unwrap();
        assert_eq!(parsed.with_timezone(&Utc), user.created_at);
    }

    #[test]
    fn new_user_ignores_unknown_keys_and_defaults_missing_ones() {
        let pairs = [("email", "a@b.c"), ("country", "UK"), ("role", "admin")];
        let user = NewUser::from_lookup(|key| {
            pairs.iter().find(|(k, _)| *k == key).map(|(_, v)| *v)
        });
        assert_eq!(user.email, "a@b.c");
        assert_eq!(user.country, "UK");
        assert_eq!(user.first_name, "");
        assert_eq!(user.get(UserField::Country), "UK");
    }
}
