use crate::connection::{CouchConnection, DatabaseConnection};
use crate::error::Result;
use crate::version::{MultiQueryStrategy, ServerVersion};
use couchmanager_common::config::CouchDbConfig;
use couchmanager_common::{
    BulkDocs, BulkResult, DatabaseInfo, DocumentResponse, MultiQueryResult, ViewQuery, ViewResult,
    DESIGN_PREFIX, DESIGN_RANGE_END,
};
use reqwest::{Method, Url};
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Deserialize)]
struct CurrentRevision {
    #[serde(rename = "_rev")]
    rev: String,
}

#[derive(Serialize)]
struct KeysBody<'a> {
    keys: &'a [Value],
}

#[derive(Serialize)]
struct QueriesBody<'a> {
    queries: &'a [ViewQuery],
}

/// Document and view operations scoped to one database.
#[derive(Clone)]
pub struct DatabaseManager {
    db: DatabaseConnection,
}

impl DatabaseManager {
    pub fn new(server_url: &str, database: &str) -> Result<Self> {
        Ok(Self::with_connection(CouchConnection::new(server_url)?.database(database)))
    }

    pub fn from_config(config: &CouchDbConfig) -> Result<Self> {
        Ok(Self::with_connection(
            CouchConnection::from_config(config)?.database(config.database.as_str()),
        ))
    }

    pub fn with_connection(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// The bound connection, for requests this manager does not wrap.
    pub fn connection(&self) -> &DatabaseConnection {
        &self.db
    }

    pub async fn get_database_information(&self) -> Result<DatabaseInfo> {
        self.db
            .info()
            .await
            .map_err(|e| e.context("Error getting the database information"))
    }

    /// Stores a new document (or a new revision when `_id`/`_rev` are set).
    pub async fn insert_document<T: Serialize + ?Sized>(&self, document: &T) -> Result<DocumentResponse> {
        let url = self.db.endpoint(&[]);
        self.db
            .send(self.db.request(Method::POST, url).json(document))
            .await
            .map_err(|e| e.context("Error inserting document"))
    }

    /// Deletes a document. Without `rev` the current revision is read first;
    /// errors from that read-then-delete pair are returned unwrapped, and a
    /// concurrent update between the two requests surfaces as a conflict.
    pub async fn destroy_document(&self, id: &str, rev: Option<&str>) -> Result<DocumentResponse> {
        match rev {
            Some(rev) => self
                .delete_revision(id, rev)
                .await
                .map_err(|e| e.context("Error destroying document")),
            None => {
                let url = self.db.document_endpoint(id);
                let current: CurrentRevision = self.db.send(self.db.request(Method::GET, url)).await?;
                self.delete_revision(id, &current.rev).await
            }
        }
    }

    async fn delete_revision(&self, id: &str, rev: &str) -> Result<DocumentResponse> {
        let mut url = self.db.document_endpoint(id);
        url.query_pairs_mut().append_pair("rev", rev);
        self.db.send(self.db.request(Method::DELETE, url)).await
    }

    /// Submits a batch in one request. Per-document failures are reported in
    /// the returned entries, not as an error.
    pub async fn insert_document_in_bulk(&self, bulk: &BulkDocs) -> Result<Vec<BulkResult>> {
        self.post_bulk(bulk)
            .await
            .map_err(|e| e.context("Error inserting documents in bulk mode"))
    }

    /// Marks every document of the batch `_deleted` and submits it.
    pub async fn delete_document_in_bulk(&self, mut bulk: BulkDocs) -> Result<Vec<BulkResult>> {
        bulk.mark_deleted();
        self.post_bulk(&bulk).await.map_err(|e| {
            tracing::error!("Error deleting documents in bulk mode. Error: {}", e);
            e.context("Error deleting documents in bulk mode")
        })
    }

    async fn post_bulk(&self, bulk: &BulkDocs) -> Result<Vec<BulkResult>> {
        let url = self.db.endpoint(&["_bulk_docs"]);
        self.db.send(self.db.request(Method::POST, url).json(bulk)).await
    }

    /// Fetches documents by id with `include_docs`. `None` when the request
    /// itself reports `missing`; ids that do not resolve come back as rows
    /// carrying an `error`.
    pub async fn fetch_documents_in_bulk<S: AsRef<str>>(&self, ids: &[S]) -> Result<Option<ViewResult>> {
        let keys = ids.iter().map(|id| Value::from(id.as_ref())).collect();
        let query = ViewQuery::with_keys(keys).include_docs(true);

        match self.all_docs(&query).await {
            Ok(result) => Ok(Some(result)),
            Err(e) if e.is_missing() => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// `None` when the document is `missing`; any other failure is returned as is.
    pub async fn get_document(&self, id: &str) -> Result<Option<Value>> {
        let url = self.db.document_endpoint(id);
        match self.db.send(self.db.request(Method::GET, url)).await {
            Ok(doc) => Ok(Some(doc)),
            Err(e) if e.is_missing() => Ok(None),
            Err(e) => {
                tracing::error!("Error getting document {}. Error: {}", id, e);
                Err(e)
            }
        }
    }

    pub async fn get_view(&self, design: &str, view: &str, params: Option<&ViewQuery>) -> Result<ViewResult> {
        let default = ViewQuery::default();
        self.query_view(design, view, params.unwrap_or(&default))
            .await
            .map_err(|e| e.context(format!("Error getting view {}/{}", design, view)))
    }

    /// Every design document, with its body.
    pub async fn get_design(&self) -> Result<ViewResult> {
        let query = ViewQuery::range(Value::from(DESIGN_PREFIX), Value::from(DESIGN_RANGE_END)).include_docs(true);
        self.all_docs(&query)
            .await
            .map_err(|e| e.context("Error getting the design documents"))
    }

    /// Runs a view with the caller's query; `include_docs` overrides the
    /// query's own flag.
    pub async fn get_view_with_query(
        &self,
        design: &str,
        view: &str,
        query: &ViewQuery,
        include_docs: bool,
    ) -> Result<ViewResult> {
        let query = query.clone().include_docs(include_docs);
        self.query_view(design, view, &query)
            .await
            .map_err(|e| e.context(format!("Error getting view {}/{} with query", design, view)))
    }

    /// Runs several queries against one view. Servers from 2.2 on take them in
    /// a single request; older ones get one request per query.
    pub async fn get_view_with_multiple_queries(
        &self,
        design: &str,
        view: &str,
        queries: &[ViewQuery],
    ) -> Result<MultiQueryResult> {
        self.multi_query(design, view, queries)
            .await
            .map_err(|e| e.context(format!("Error getting view {}/{} with multiple queries", design, view)))
    }

    async fn multi_query(&self, design: &str, view: &str, queries: &[ViewQuery]) -> Result<MultiQueryResult> {
        let info = self.db.server().server_info().await?;
        let version: ServerVersion = info.version.parse()?;
        let strategy = MultiQueryStrategy::for_version(version);

        tracing::debug!(
            "Running {} queries on {}/{} with {:?} strategy (server {})",
            queries.len(),
            design,
            view,
            strategy,
            version
        );

        match strategy {
            MultiQueryStrategy::Native => {
                let url = self.db.endpoint(&["_design", design, "_view", view, "queries"]);
                let body = QueriesBody { queries };
                self.db.send(self.db.request(Method::POST, url).json(&body)).await
            }
            MultiQueryStrategy::Sequential => {
                let mut results = Vec::with_capacity(queries.len());
                for query in queries {
                    results.push(self.query_view(design, view, query).await?);
                }
                Ok(MultiQueryResult { results })
            }
        }
    }

    async fn query_view(&self, design: &str, view: &str, query: &ViewQuery) -> Result<ViewResult> {
        let url = self.db.endpoint(&["_design", design, "_view", view]);
        self.run_query(url, query).await
    }

    async fn all_docs(&self, query: &ViewQuery) -> Result<ViewResult> {
        let url = self.db.endpoint(&["_all_docs"]);
        self.run_query(url, query).await
    }

    /// GET with the query string, or POST with `{"keys": [...]}` when the
    /// query carries a key list.
    async fn run_query(&self, mut url: Url, query: &ViewQuery) -> Result<ViewResult> {
        let pairs = query.query_pairs();
        if !pairs.is_empty() {
            url.query_pairs_mut().extend_pairs(pairs);
        }

        let req = match &query.keys {
            Some(keys) => self
                .db
                .request(Method::POST, url)
                .json(&KeysBody { keys: keys.as_slice() }),
            None => self.db.request(Method::GET, url),
        };
        self.db.send(req).await
    }
}

#[cfg(test)]
#[path = "database_tests.rs"]
mod database_tests;
