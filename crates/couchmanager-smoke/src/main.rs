use anyhow::{bail, Context, Result};
use couchmanager_common::config::AppConfig;
use couchmanager_core::{BulkDocs, DatabaseManager, ServerManager, ViewQuery};
use serde_json::{json, Value};
use tracing_subscriber::EnvFilter;

/// Created and destroyed again by the server checks.
const SCRATCH_DB: &str = "testing111222";
const DESIGN_NAME: &str = "query-demo";
const DESIGN_ID: &str = "_design/query-demo";
const VIEW_NAME: &str = "test";

fn testing_docs() -> Vec<Value> {
    vec![
        json!({"docType": "test", "value": 1}),
        json!({"docType": "test", "value": 2}),
        json!({"docType": "test", "value": 3}),
        json!({"docType": "test", "value": 1}),
    ]
}

#[derive(Default)]
struct Report {
    passed: usize,
    failed: usize,
}

impl Report {
    fn check(&mut self, name: &str, condition: bool) {
        if condition {
            self.passed += 1;
            tracing::info!("{} test: PASSED", name);
        } else {
            self.failed += 1;
            tracing::error!("{} test: FAILED", name);
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = AppConfig::load().context("Failed to load configuration")?;
    tracing::info!(
        "Smoke run against {} (database {})",
        config.couchdb.server_url,
        config.couchdb.database
    );

    let mut report = Report::default();
    match std::env::args().nth(1).as_deref() {
        None | Some("all") => run_all(&config, &mut report).await?,
        Some("design") => run_design(&config, &mut report).await?,
        Some(other) => bail!("Unknown mode '{}', expected 'all' or 'design'", other),
    }

    tracing::info!("{} passed, {} failed", report.passed, report.failed);
    if report.failed > 0 {
        bail!("{} check(s) failed", report.failed);
    }
    Ok(())
}

async fn run_all(config: &AppConfig, report: &mut Report) -> Result<()> {
    let server = ServerManager::from_config(&config.couchdb)?;
    if !server.is_server_running().await {
        bail!("CouchDB server at {} is not running", config.couchdb.server_url);
    }

    tracing::info!("=============Server manager tests=============");
    let info = server.get_server_information().await?;
    tracing::info!("Server: {} {}", info.couchdb, info.version);
    report.check("Server information && server running", !info.couchdb.is_empty());

    report.check("Created db", server.create_database(SCRATCH_DB).await?);
    report.check("Exist db", server.database_exist(SCRATCH_DB).await?);
    report.check("Destroyed db", server.destroy_database(SCRATCH_DB).await?);
    report.check("Gone db", !server.database_exist(SCRATCH_DB).await?);

    let db_name = config.couchdb.database.as_str();
    if !server.database_exist(db_name).await? {
        server.create_database(db_name).await?;
    }

    let db = DatabaseManager::from_config(&config.couchdb)?;
    ensure_design(&db).await?;

    tracing::info!("=============Database manager tests=============");
    let info = db.get_database_information().await?;
    report.check("Database info", info.db_name == db_name);

    tracing::info!("=============Database documents tests=============");
    let raw = db.connection().info().await?;
    report.check("Connection", raw.db_name == db_name);

    let design = db.get_design().await?;
    report.check("Design", design.rows.iter().any(|r| r.id.as_deref() == Some(DESIGN_ID)));

    let docs = testing_docs();
    let inserted = db.insert_document(&docs[0]).await?;
    report.check("Insert", inserted.ok && !inserted.id.is_empty());

    let fetched = db.get_document(&inserted.id).await?;
    report.check(
        "Get",
        fetched.map_or(false, |doc| doc["value"] == 1 && doc["_rev"] == inserted.rev.as_str()),
    );

    let deleted = db.destroy_document(&inserted.id, None).await?;
    report.check("Delete", deleted.ok);

    report.check("Get unknown", db.get_document("no-such-document").await?.is_none());

    let results = db.insert_document_in_bulk(&BulkDocs::new(docs.clone())).await?;
    report.check("Insert bulk", results.len() == docs.len());

    let view = db.get_view(DESIGN_NAME, VIEW_NAME, None).await?;
    report.check("View", !view.rows.is_empty());

    let to_fetch: Vec<String> = view.rows.iter().filter_map(|r| r.id.clone()).collect();
    let to_delete: Vec<Value> = view.rows.iter().map(|r| r.value.clone()).collect();

    let range = ViewQuery::range(json!([1]), json!([1, {}]));
    let result = db.get_view_with_query(DESIGN_NAME, VIEW_NAME, &range, true).await?;
    report.check("Query", result.rows.len() == 2);

    if let Some(first) = to_fetch.first() {
        let keys = ViewQuery::with_keys(vec![json!([1, first])]);
        let result = db.get_view_with_query(DESIGN_NAME, VIEW_NAME, &keys, true).await?;
        report.check("Query with 'keys'", result.rows.len() == 1);
    }

    let queries = vec![range, ViewQuery::range(json!([2]), json!([2, {}]))];
    let multi = db
        .get_view_with_multiple_queries(DESIGN_NAME, VIEW_NAME, &queries)
        .await?;
    report.check(
        "Multiple queries",
        multi.results.len() == 2 && multi.results[0].rows.len() == 2 && multi.results[1].rows.len() == 1,
    );

    let fetched = db.fetch_documents_in_bulk(&to_fetch).await?;
    report.check("Fetch bulk", fetched.map_or(false, |r| r.rows.len() >= docs.len()));

    let expected = to_delete.len();
    let results = db.delete_document_in_bulk(BulkDocs::new(to_delete)).await?;
    report.check("Delete bulk", results.len() == expected);

    Ok(())
}

async fn run_design(config: &AppConfig, report: &mut Report) -> Result<()> {
    let db = DatabaseManager::from_config(&config.couchdb)?;

    let design = db.get_design().await?;
    tracing::info!("{}", serde_json::to_string(&design)?);
    report.check("Design", design.total_rows.is_some());

    Ok(())
}

async fn ensure_design(db: &DatabaseManager) -> Result<()> {
    // A failed lookup is handled like an absent design document.
    let existing = db.get_document(DESIGN_ID).await.unwrap_or(None);
    if existing.is_none() {
        db.insert_document(&json!({
            "_id": DESIGN_ID,
            "views": {
                VIEW_NAME: {
                    "map": "function (doc) {  emit([doc.value, doc._id], doc);}"
                }
            },
            "language": "javascript"
        }))
        .await?;
        tracing::info!("Created design document {}", DESIGN_ID);
    }
    Ok(())
}
