pub mod connection;
pub mod database;
pub mod error;
pub mod server;
pub mod version;

pub use connection::{CouchConnection, DatabaseConnection};
pub use database::DatabaseManager;
pub use error::{CouchError, ErrorKind, Result};
pub use server::ServerManager;
pub use version::{MultiQueryStrategy, ServerVersion};

// Re-export common types for convenience
pub use couchmanager_common::{
    BulkDocs, BulkResult, DatabaseInfo, DocumentResponse, MultiQueryResult, ServerInfo, ViewQuery,
    ViewResult, ViewRow,
};

/// Manager for server-level administration of the server at `server_url`.
pub fn get_server_manager(server_url: &str) -> Result<ServerManager> {
    ServerManager::new(server_url)
}

/// Manager for the documents and views of `database` on the server at `server_url`.
pub fn get_database_manager(server_url: &str, database: &str) -> Result<DatabaseManager> {
    DatabaseManager::new(server_url, database)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_factories_bind_url_and_database() {
        let server = get_server_manager("http://localhost:5984").unwrap();
        assert_eq!(server.connection().base_url().as_str(), "http://localhost:5984/");

        let db = get_database_manager("http://localhost:5984", "testing").unwrap();
        assert_eq!(db.connection().name(), "testing");
    }

    #[test]
    fn test_factories_reject_bad_urls() {
        assert!(matches!(get_server_manager("localhost"), Err(CouchError::InvalidUrl { .. })));
        assert!(get_database_manager("", "testing").is_err());
    }
}
