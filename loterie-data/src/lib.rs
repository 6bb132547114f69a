pub mod error;
pub mod history;
pub mod models;

pub use error::ValidationError;
pub use history::DrawHistory;
pub use models::{DrawRecord, GameType, Grid, Pool};
