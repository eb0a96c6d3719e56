// Order execution and bar feed module
pub mod executor;
pub mod feed;

pub use executor::{Fill, OrderExecutor, OrderRequest, PaperExecutor};
pub use feed::{spawn_replay, FeedDriver, FeedStats};
