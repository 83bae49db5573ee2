use serde::{Deserialize, Serialize};

use super::ids::BookUid;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Book {
    pub book_uid: BookUid,
    pub name: String,
    pub author: String,
    pub genre: String,
}

/// Condition a book is recorded in at loan time and reported in at return
/// time. A mismatch between the two costs the user a steep rating penalty.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BookCondition {
    Excellent,
    Good,
    Bad,
}

impl BookCondition {
    pub fn as_str(&self) -> &'static str {
        match self {
            BookCondition::Excellent => "EXCELLENT",
            BookCondition::Good => "GOOD",
            BookCondition::Bad => "BAD",
        }
    }
}

/// Book as served by the library service: the public card plus internal row
/// id and recorded condition.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct BookInfo {
    pub id: i64,
    #[serde(flatten)]
    pub book: Book,
    pub condition: BookCondition,
}

/// Availability-decrement/increment request against the library service.
/// `returning = false` takes a copy off the shelf, `returning = true` puts
/// one back.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct AvailabilityRequest {
    pub library_id: i64,
    pub book_id: i64,
    pub returning: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn book_condition_serializes_screaming() {
        assert_eq!(
            serde_json::to_string(&BookCondition::Excellent).unwrap(),
            "\"EXCELLENT\""
        );
        let parsed: BookCondition = serde_json::from_str("\"BAD\"").unwrap();
        assert_eq!(parsed, BookCondition::Bad);
    }
}
