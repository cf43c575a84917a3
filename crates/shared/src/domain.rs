use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UserId(pub i64);

pub const DEFAULT_USER_COUNT: i64 = 10;

impl UserId {
    /// Next id in a 1-based cycle of `user_count` ids, wrapping back to 1.
    pub fn next_in_cycle(self, user_count: i64) -> UserId {
        UserId((self.0 % user_count.max(1)) + 1)
    }
}
