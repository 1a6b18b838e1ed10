pub mod leaderboard;
pub mod list;

pub use leaderboard::leaderboard_get;
pub use list::{members_get, users_get};
