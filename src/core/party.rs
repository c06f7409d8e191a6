use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Stable integer identity handed out by the identity registry.
pub type PersonId = u32;

/// The kind of person an identity belongs to.
///
/// Identities are keyed by (role, name), so a cashier and a client may share
/// a name and still receive different ids.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PersonRole {
    Cashier,
    Manager,
    Client,
}

impl PersonRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            PersonRole::Cashier => "cashier",
            PersonRole::Manager => "manager",
            PersonRole::Client => "client",
        }
    }
}

impl fmt::Display for PersonRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PersonRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "cashier" => Ok(PersonRole::Cashier),
            "manager" => Ok(PersonRole::Manager),
            "client" => Ok(PersonRole::Client),
            other => Err(format!("unknown role '{other}'")),
        }
    }
}

/// A person taking part in a transaction: a client, or the staff member
/// serving them.
///
/// # Examples
///
/// ```
/// use exchange_office::core::party::Party;
///
/// let client = Party::new(7, "Ada Lovelace");
/// assert_eq!(client.to_string(), "Ada Lovelace (ID 7)");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Party {
    pub id: PersonId,
    pub name: String,
}

impl Party {
    pub fn new(id: PersonId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
        }
    }
}

impl fmt::Display for Party {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (ID {})", self.name, self.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_party_equality() {
        let a = Party::new(1, "Alice");
        let b = Party::new(1, "Alice");
        let c = Party::new(2, "Alice");
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_party_display() {
        assert_eq!(Party::new(12, "Bob").to_string(), "Bob (ID 12)");
    }

    #[test]
    fn test_role_parse() {
        assert_eq!("Manager".parse::<PersonRole>().unwrap(), PersonRole::Manager);
        assert_eq!(PersonRole::Client.to_string(), "client");
        assert!("janitor".parse::<PersonRole>().is_err());
    }
}
