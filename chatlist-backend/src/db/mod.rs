mod sqlite;
mod tables;

pub use sqlite::Database;
pub(crate) use sqlite::parse_timestamp;
