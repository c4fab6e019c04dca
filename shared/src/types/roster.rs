//! The fixed list of subjects monitored by the exporter

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Subjects monitored when no override is configured.
pub const DEFAULT_HEROES: &[&str] = &[
    "Superman",
    "Batman",
    "Spider-Man",
    "Wonder Woman",
    "Iron Man",
    "Captain America",
    "Thor",
    "Black Widow",
    "Hawkeye",
    "Black Panther",
];

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RosterError {
    #[error("roster is empty")]
    Empty,

    #[error("roster contains a blank subject name")]
    BlankName,

    #[error("duplicate subject in roster: {0}")]
    Duplicate(String),
}

/// Ordered, duplicate-free list of subject names. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<String>", into = "Vec<String>")]
pub struct Roster {
    subjects: Vec<String>,
}

impl Roster {
    /// Build a roster, trimming names and rejecting blanks and duplicates.
    pub fn new<I, S>(names: I) -> Result<Self, RosterError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut subjects: Vec<String> = Vec::new();
        for name in names {
            let name = name.as_ref().trim();
            if name.is_empty() {
                return Err(RosterError::BlankName);
            }
            if subjects.iter().any(|s| s == name) {
                return Err(RosterError::Duplicate(name.to_string()));
            }
            subjects.push(name.to_string());
        }
        if subjects.is_empty() {
            return Err(RosterError::Empty);
        }
        Ok(Self { subjects })
    }

    pub fn len(&self) -> usize {
        self.subjects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.subjects.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.subjects.iter().map(String::as_str)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.subjects.iter().any(|s| s == name)
    }
}

impl Default for Roster {
    fn default() -> Self {
        Self {
            subjects: DEFAULT_HEROES.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl TryFrom<Vec<String>> for Roster {
    type Error = RosterError;

    fn try_from(names: Vec<String>) -> Result<Self, Self::Error> {
        Roster::new(names)
    }
}

impl From<Roster> for Vec<String> {
    fn from(roster: Roster) -> Self {
        roster.subjects
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_roster() {
        let roster = Roster::default();
        assert_eq!(roster.len(), 10);
        assert_eq!(roster.iter().next(), Some("Superman"));
        assert!(roster.contains("Black Panther"));
    }

    #[test]
    fn test_new_trims_and_keeps_order() {
        let roster = Roster::new([" Batman ", "Superman"]).unwrap();
        let names: Vec<&str> = roster.iter().collect();
        assert_eq!(names, vec!["Batman", "Superman"]);
    }

    #[test]
    fn test_rejects_invalid_rosters() {
        assert_eq!(Roster::new(Vec::<String>::new()), Err(RosterError::Empty));
        assert_eq!(Roster::new(["Thor", "  "]), Err(RosterError::BlankName));
        assert_eq!(
            Roster::new(["Thor", "Thor"]),
            Err(RosterError::Duplicate("Thor".to_string()))
        );
    }

    #[test]
    fn test_deserialize_validates() {
        let roster: Roster = serde_json::from_str(r#"["Iron Man","Hawkeye"]"#).unwrap();
        assert_eq!(roster.len(), 2);
        assert!(serde_json::from_str::<Roster>("[]").is_err());
    }
}
