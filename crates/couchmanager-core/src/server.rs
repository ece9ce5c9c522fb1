use crate::connection::CouchConnection;
use crate::error::{CouchError, Result};
use couchmanager_common::config::CouchDbConfig;
use couchmanager_common::ServerInfo;
use reqwest::Method;
use serde_json::Value;

/// Server-level administration: liveness, server metadata and database lifecycle.
#[derive(Clone)]
pub struct ServerManager {
    connection: CouchConnection,
}

impl ServerManager {
    pub fn new(server_url: &str) -> Result<Self> {
        Ok(Self::with_connection(CouchConnection::new(server_url)?))
    }

    pub fn from_config(config: &CouchDbConfig) -> Result<Self> {
        Ok(Self::with_connection(CouchConnection::from_config(config)?))
    }

    pub fn with_connection(connection: CouchConnection) -> Self {
        Self { connection }
    }

    pub fn connection(&self) -> &CouchConnection {
        &self.connection
    }

    /// True if `GET /` answers successfully. Every failure, including auth
    /// errors, folds into `false`.
    pub async fn is_server_running(&self) -> bool {
        match self.connection.server_info().await {
            Ok(_) => true,
            Err(e) => {
                tracing::warn!("CouchDB server at {} is not reachable: {}", self.connection.base_url(), e);
                false
            }
        }
    }

    pub async fn get_server_information(&self) -> Result<ServerInfo> {
        self.connection
            .server_info()
            .await
            .map_err(|e| e.context("Error getting server information"))
    }

    /// Existence check. Fails with [`CouchError::ServerUnreachable`] when the
    /// server is down; otherwise any failure of the lookup means `false`.
    pub async fn database_exist(&self, name: &str) -> Result<bool> {
        self.ensure_running().await?;

        let url = self.connection.endpoint(&[name]);
        match self.connection.send::<Value>(self.connection.request(Method::GET, url)).await {
            Ok(_) => Ok(true),
            Err(e) => {
                tracing::debug!("Database {} not found: {}", name, e);
                Ok(false)
            }
        }
    }

    pub async fn create_database(&self, name: &str) -> Result<bool> {
        self.ensure_running().await?;

        let url = self.connection.endpoint(&[name]);
        self.connection
            .send::<Value>(self.connection.request(Method::PUT, url))
            .await
            .map_err(|e| e.context(format!("Error creating database {}", name)))?;

        tracing::info!("Created database {}", name);
        Ok(true)
    }

    pub async fn destroy_database(&self, name: &str) -> Result<bool> {
        self.ensure_running().await?;

        let url = self.connection.endpoint(&[name]);
        self.connection
            .send::<Value>(self.connection.request(Method::DELETE, url))
            .await
            .map_err(|e| e.context(format!("Error deleting the database {}", name)))?;

        tracing::info!("Destroyed database {}", name);
        Ok(true)
    }

    async fn ensure_running(&self) -> Result<()> {
        if self.is_server_running().await {
            Ok(())
        } else {
            Err(CouchError::ServerUnreachable)
        }
    }
}

#[cfg(test)]
#[path = "server_tests.rs"]
mod server_tests;
