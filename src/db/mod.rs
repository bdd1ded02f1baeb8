pub mod connection;
pub mod costs;
pub mod dimensions;
pub mod schema;

pub use connection::Database;
