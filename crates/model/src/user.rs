use std::{fmt, str::FromStr};

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use utility::id::HasId;

use crate::ExampleData;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Driver,
    #[default]
    User,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::Driver => "driver",
            Self::User => "user",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownRole(pub String);

impl std::error::Error for UnknownRole {}

impl fmt::Display for UnknownRole {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "unknown role '{}'", self.0)
    }
}

impl FromStr for Role {
    type Err = UnknownRole;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "admin" => Ok(Self::Admin),
            "driver" | "conductor" => Ok(Self::Driver),
            "user" | "usuario" => Ok(Self::User),
            other => Err(UnknownRole(other.to_owned())),
        }
    }
}

/// A registered user. The password hash never leaves the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub email: String,
    pub name: String,
    pub role: Role,
    /// Profile grouping the routes and vehicles this user works with.
    pub profile_id: String,
}

impl HasId for User {
    type IdType = i32;
}

impl ExampleData for User {
    fn example_data() -> Self {
        Self {
            email: "m.garcia@ecorecolecta.co".to_owned(),
            name: "M. García".to_owned(),
            role: Role::Driver,
            profile_id: "a4cdc1ca-5e37-40b1-8a4b-d26237e25142".to_owned(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewUser {
    #[serde(deserialize_with = "utility::serde::lowercase::deserialize")]
    pub email: String,
    #[serde(deserialize_with = "utility::serde::trimmed::deserialize")]
    pub password: String,
    #[serde(deserialize_with = "utility::serde::trimmed::deserialize")]
    pub name: String,
    #[serde(default)]
    pub role: Role,
    #[serde(
        default,
        deserialize_with = "utility::serde::trimmed::deserialize_option"
    )]
    pub profile_id: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Credentials {
    #[serde(deserialize_with = "utility::serde::lowercase::deserialize")]
    pub email: String,
    #[serde(deserialize_with = "utility::serde::trimmed::deserialize")]
    pub password: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roles_parse_with_legacy_names() {
        assert_eq!("Usuario".parse::<Role>(), Ok(Role::User));
        assert_eq!(" conductor ".parse::<Role>(), Ok(Role::Driver));
        assert_eq!("admin".parse::<Role>(), Ok(Role::Admin));
        assert!("root".parse::<Role>().is_err());
    }

    #[test]
    fn new_user_defaults_to_user_role() {
        let user: NewUser = serde_json::from_str(
            r#"{"email": " Ana@Mail.com", "password": " secret ", "name": "Ana"}"#,
        )
        .unwrap();
        assert_eq!(user.email, "ana@mail.com");
        assert_eq!(user.password, "secret");
        assert_eq!(user.role, Role::User);
        assert_eq!(user.profile_id, None);
    }
}
