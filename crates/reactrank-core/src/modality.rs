//! Test modalities and user identifiers.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::RankError;

/// Sensory channel a reaction-time test exercises.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Modality {
    /// Response to a colour change on screen.
    Visual,
    /// Response to a tone.
    Auditory,
}

impl Modality {
    /// Every modality, in response order.
    pub const ALL: [Modality; 2] = [Modality::Visual, Modality::Auditory];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Visual => "visual",
            Self::Auditory => "auditory",
        }
    }
}

impl std::fmt::Display for Modality {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Modality {
    type Err = RankError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "visual" => Ok(Self::Visual),
            "auditory" => Ok(Self::Auditory),
            other => Err(RankError::InvalidInput(format!("unknown modality: {other:?}"))),
        }
    }
}

/// Longest accepted user identifier, in characters.
pub const MAX_USER_ID_LEN: usize = 256;

/// Opaque user identifier (typically a client-side fingerprint).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct UserId(String);

impl UserId {
    /// Validate and wrap an identifier. Surrounding whitespace is trimmed.
    pub fn parse(raw: &str) -> Result<Self, RankError> {
        let id = raw.trim();
        if id.is_empty() {
            return Err(RankError::InvalidInput("user id is required".to_string()));
        }
        if id.chars().count() > MAX_USER_ID_LEN {
            return Err(RankError::InvalidInput(format!(
                "user id longer than {MAX_USER_ID_LEN} characters"
            )));
        }
        if id.chars().any(char::is_control) {
            return Err(RankError::InvalidInput(
                "user id contains control characters".to_string(),
            ));
        }
        Ok(Self(id.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for UserId {
    type Error = RankError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<UserId> for String {
    fn from(id: UserId) -> Self {
        id.0
    }
}

impl FromStr for UserId {
    type Err = RankError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_modality_round_trips_through_display() {
        for m in Modality::ALL {
            assert_eq!(m.to_string().parse::<Modality>().unwrap(), m);
        }
    }

    #[test]
    fn test_modality_parse_is_case_insensitive() {
        assert_eq!("Visual".parse::<Modality>().unwrap(), Modality::Visual);
        assert_eq!(" AUDITORY ".parse::<Modality>().unwrap(), Modality::Auditory);
    }

    #[test]
    fn test_modality_parse_unknown() {
        assert!(matches!(
            "haptic".parse::<Modality>(),
            Err(RankError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_modality_serde_lowercase() {
        let json = serde_json::to_string(&Modality::Auditory).unwrap();
        assert_eq!(json, "\"auditory\"");
    }

    #[test]
    fn test_user_id_trims() {
        let id = UserId::parse("  abc123 ").unwrap();
        assert_eq!(id.as_str(), "abc123");
    }

    #[test]
    fn test_user_id_rejects_empty() {
        assert!(matches!(UserId::parse(""), Err(RankError::InvalidInput(_))));
        assert!(matches!(UserId::parse("   "), Err(RankError::InvalidInput(_))));
    }

    #[test]
    fn test_user_id_rejects_overlong() {
        let long = "a".repeat(MAX_USER_ID_LEN + 1);
        assert!(UserId::parse(&long).is_err());
        assert!(UserId::parse(&"a".repeat(MAX_USER_ID_LEN)).is_ok());
    }

    #[test]
    fn test_user_id_rejects_control_chars() {
        assert!(UserId::parse("ab\ncd").is_err());
    }

    #[test]
    fn test_user_id_deserialize_validates() {
        let ok: UserId = serde_json::from_str("\"u1\"").unwrap();
        assert_eq!(ok.as_str(), "u1");
        assert!(serde_json::from_str::<UserId>("\"\"").is_err());
    }
}
