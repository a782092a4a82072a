use serde::{Deserialize, Serialize};
use std::fmt;
use utoipa::ToSchema;

pub const ALL_OFFICES: &str = "all";

#[derive(Debug, Copy, Clone, Eq, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Admin,
    OfficeUser,
}

/// Offices a credential may read or write. Serialized as `"all"` or an office name.
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Scope {
    All,
    Office(String),
}

impl Scope {
    pub fn permits(&self, office: &str) -> bool {
        match self {
            Scope::All => true,
            Scope::Office(own) => own == office,
        }
    }

    pub fn office(&self) -> Option<&str> {
        match self {
            Scope::All => None,
            Scope::Office(own) => Some(own),
        }
    }
}

impl From<String> for Scope {
    fn from(value: String) -> Self {
        if value == ALL_OFFICES {
            Scope::All
        } else {
            Scope::Office(value)
        }
    }
}

impl From<Scope> for String {
    fn from(scope: Scope) -> Self {
        match scope {
            Scope::All => ALL_OFFICES.to_string(),
            Scope::Office(office) => office,
        }
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scope::All => f.write_str(ALL_OFFICES),
            Scope::Office(office) => f.write_str(office),
        }
    }
}

/// Role and office scope resolved for a username.
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct UserScope {
    pub role: Role,
    #[schema(value_type = String, example = "Hyderabad")]
    pub office: Scope,
}

impl UserScope {
    /// Admins reach every office; anyone else only the office in their scope.
    pub fn can_access(&self, office: &str) -> bool {
        self.role == Role::Admin || self.office.permits(office)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scope_round_trips_through_its_string_form() {
        let all: Scope = serde_json::from_str("\"all\"").unwrap();
        assert_eq!(all, Scope::All);
        let office: Scope = serde_json::from_str("\"Koraput\"").unwrap();
        assert_eq!(office, Scope::Office("Koraput".into()));
        assert_eq!(serde_json::to_string(&Scope::All).unwrap(), "\"all\"");
    }

    #[test]
    fn office_user_reaches_only_their_office() {
        let scope = UserScope {
            role: Role::OfficeUser,
            office: Scope::Office("Hyderabad".into()),
        };
        assert!(scope.can_access("Hyderabad"));
        assert!(!scope.can_access("Koraput"));
    }

    #[test]
    fn admin_reaches_every_office() {
        let scope = UserScope {
            role: Role::Admin,
            office: Scope::All,
        };
        assert!(scope.can_access("Koraput"));
        assert!(scope.can_access("Anywhere"));
    }
}
