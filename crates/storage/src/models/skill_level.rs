use serde::{Deserialize, Serialize};

use crate::MatchupError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SkillLevel {
    #[default]
    Beginner,
    Intermediate,
    Advanced,
}

impl SkillLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Beginner => "beginner",
            Self::Intermediate => "intermediate",
            Self::Advanced => "advanced",
        }
    }

    pub fn all() -> &'static [SkillLevel] {
        &[Self::Beginner, Self::Intermediate, Self::Advanced]
    }

    fn parse_str(s: &str) -> Result<Self, MatchupError> {
        match s.trim().to_lowercase().as_str() {
            "beginner" => Ok(Self::Beginner),
            "intermediate" => Ok(Self::Intermediate),
            "advanced" => Ok(Self::Advanced),
            _ => Err(MatchupError::Validation(format!(
                "Unknown skill level: '{}'. Expected one of: {}",
                s,
                Self::all()
                    .iter()
                    .map(|l| l.as_str())
                    .collect::<Vec<_>>()
                    .join(", ")
            ))),
        }
    }
}

impl std::str::FromStr for SkillLevel {
    type Err = MatchupError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse_str(s)
    }
}

impl std::fmt::Display for SkillLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_skill_level_parsing() {
        assert_eq!("beginner".parse::<SkillLevel>().unwrap(), SkillLevel::Beginner);
        assert_eq!(" Advanced ".parse::<SkillLevel>().unwrap(), SkillLevel::Advanced);
        assert_eq!(
            "INTERMEDIATE".parse::<SkillLevel>().unwrap(),
            SkillLevel::Intermediate
        );
        assert!("expert".parse::<SkillLevel>().is_err());
    }

    #[test]
    fn test_default_is_beginner() {
        assert_eq!(SkillLevel::default(), SkillLevel::Beginner);
    }
}
