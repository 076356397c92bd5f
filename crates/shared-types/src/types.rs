use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Three-step rating shared by risk severity and opportunity impact.
///
/// Model output is free text, so decoding never fails: tokens are matched
/// case-insensitively and anything unrecognised becomes [`Level::Medium`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Level {
    Low,
    #[default]
    Medium,
    High,
}

pub type Severity = Level;
pub type Impact = Level;

impl Level {
    pub const ALL: [Level; 3] = [Level::Low, Level::Medium, Level::High];

    /// Lenient parse used at the model boundary.
    pub fn from_token(token: &str) -> Self {
        Self::parse(token).unwrap_or_default()
    }

    /// Exact parse used when reading stored rows.
    pub fn parse(token: &str) -> Option<Self> {
        match token.trim().to_ascii_uppercase().as_str() {
            "LOW" => Some(Level::Low),
            "MEDIUM" => Some(Level::Medium),
            "HIGH" => Some(Level::High),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Level::Low => "LOW",
            Level::Medium => "MEDIUM",
            Level::High => "HIGH",
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Level {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Value::deserialize(deserializer)?;
        Ok(value.as_str().map(Level::from_token).unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    #[test]
    fn tokens_are_case_insensitive() {
        assert_eq!(Level::from_token("high"), Level::High);
        assert_eq!(Level::from_token(" Low "), Level::Low);
        assert_eq!(Level::from_token("MEDIUM"), Level::Medium);
    }

    #[test]
    fn unknown_tokens_default_to_medium() {
        assert_eq!(Level::from_token("critical"), Level::Medium);
        assert_eq!(Level::from_token(""), Level::Medium);
        assert_eq!(Level::parse("critical"), None);
    }

    #[test]
    fn non_string_json_decodes_to_medium() {
        let level: Level = serde_json::from_str("3").unwrap();
        assert_eq!(level, Level::Medium);
        let level: Level = serde_json::from_str("null").unwrap();
        assert_eq!(level, Level::Medium);
    }

    #[test]
    fn serializes_uppercase() {
        assert_eq!(serde_json::to_string(&Level::High).unwrap(), "\"HIGH\"");
    }

    proptest! {
        #[test]
        fn from_token_never_panics(token in ".*") {
            let level = Level::from_token(&token);
            prop_assert!(Level::ALL.contains(&level));
        }

        #[test]
        fn display_parses_back(idx in 0usize..3) {
            let level = Level::ALL[idx];
            prop_assert_eq!(Level::parse(&level.to_string()), Some(level));
        }
    }
}
