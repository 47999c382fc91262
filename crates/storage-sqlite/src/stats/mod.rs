mod model;
mod repository;

pub use model::ProviderStatsDB;
pub use repository::SqliteStatsStore;
