use serde::{Deserialize, Serialize};

/// A user's standing. Stars double as the concurrent-reservation allowance:
/// a user may hold at most `stars` active reservations.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct Rating {
    pub stars: i32,
}

impl Rating {
    pub fn new(stars: i32) -> Self {
        Self { stars }
    }
}

/// Rating delta applied after a return: +1 for a book handed back in the
/// recorded condition, -10 otherwise.
pub fn return_delta(matches_recorded_condition: bool) -> i32 {
    if matches_recorded_condition {
        1
    } else {
        -10
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn delta_rewards_matching_condition() {
        assert_eq!(return_delta(true), 1);
        assert_eq!(return_delta(false), -10);
    }
}
