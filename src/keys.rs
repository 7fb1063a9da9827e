//! Composite cache keys with an explicit encode/decode pair.
//!
//! The flat store addresses values with prefixed string keys:
//!   answer::{assignment}::{sub}::{question}
//!   questions::{assignment}::{sub}
//!   title::{assignment}::{sub}
//!
//! Identifiers containing the `::` delimiter are rejected at encode time so a
//! key always splits back into the tuple it was built from.

pub const DELIMITER: &str = "::";

const ANSWER_PREFIX: &str = "answer";
const QUESTIONS_PREFIX: &str = "questions";
const TITLE_PREFIX: &str = "title";

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum CacheKey {
  Answer { assignment: String, sub: String, question: String },
  Questions { assignment: String, sub: String },
  Title { assignment: String, sub: String },
}

#[derive(Debug, PartialEq, Eq)]
pub enum KeyError {
  /// An identifier contains the delimiter sequence.
  BadIdentifier(String),
  /// The string is not a well-formed cache key.
  Malformed(String),
}

impl std::fmt::Display for KeyError {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    match self {
      KeyError::BadIdentifier(id) => write!(f, "identifier '{}' contains '{}'", id, DELIMITER),
      KeyError::Malformed(key) => write!(f, "malformed cache key '{}'", key),
    }
  }
}

impl std::error::Error for KeyError {}

fn check_id(id: &str) -> Result<(), KeyError> {
  if id.is_empty() || id.contains(DELIMITER) {
    Err(KeyError::BadIdentifier(id.to_string()))
  } else {
    Ok(())
  }
}

impl CacheKey {
  pub fn answer(assignment: &str, sub: &str, question: &str) -> Result<Self, KeyError> {
    check_id(assignment)?;
    check_id(sub)?;
    check_id(question)?;
    Ok(CacheKey::Answer {
      assignment: assignment.into(),
      sub: sub.into(),
      question: question.into(),
    })
  }

  pub fn questions(assignment: &str, sub: &str) -> Result<Self, KeyError> {
    check_id(assignment)?;
    check_id(sub)?;
    Ok(CacheKey::Questions { assignment: assignment.into(), sub: sub.into() })
  }

  pub fn title(assignment: &str, sub: &str) -> Result<Self, KeyError> {
    check_id(assignment)?;
    check_id(sub)?;
    Ok(CacheKey::Title { assignment: assignment.into(), sub: sub.into() })
  }

  pub fn encode(&self) -> String {
    match self {
      CacheKey::Answer { assignment, sub, question } => {
        format!("{ANSWER_PREFIX}{DELIMITER}{assignment}{DELIMITER}{sub}{DELIMITER}{question}")
      }
      CacheKey::Questions { assignment, sub } => {
        format!("{QUESTIONS_PREFIX}{DELIMITER}{assignment}{DELIMITER}{sub}")
      }
      CacheKey::Title { assignment, sub } => {
        format!("{TITLE_PREFIX}{DELIMITER}{assignment}{DELIMITER}{sub}")
      }
    }
  }

  pub fn decode(key: &str) -> Result<Self, KeyError> {
    let parts: Vec<&str> = key.split(DELIMITER).collect();
    match parts.as_slice() {
      [ANSWER_PREFIX, a, s, q] if !a.is_empty() && !s.is_empty() && !q.is_empty() => {
        Ok(CacheKey::Answer { assignment: (*a).into(), sub: (*s).into(), question: (*q).into() })
      }
      [QUESTIONS_PREFIX, a, s] if !a.is_empty() && !s.is_empty() => {
        Ok(CacheKey::Questions { assignment: (*a).into(), sub: (*s).into() })
      }
      [TITLE_PREFIX, a, s] if !a.is_empty() && !s.is_empty() => {
        Ok(CacheKey::Title { assignment: (*a).into(), sub: (*s).into() })
      }
      _ => Err(KeyError::Malformed(key.to_string())),
    }
  }
}
