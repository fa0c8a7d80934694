pub mod archive;
pub mod connection;

pub use archive::PostgresArchive;
pub use connection::connect_with_retry;
