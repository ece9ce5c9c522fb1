use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

pub mod config;

/// Lower bound of the design-document id range in `_all_docs`.
pub const DESIGN_PREFIX: &str = "_design/";
/// Upper bound of the design-document id range (`'0'` sorts right after `'/'`).
pub const DESIGN_RANGE_END: &str = "_design0";

/// Payload of `GET /` on the server.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerInfo {
    pub couchdb: String,
    pub version: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Payload of `GET /{db}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseInfo {
    pub db_name: String,
    #[serde(default)]
    pub doc_count: u64,
    #[serde(default)]
    pub doc_del_count: u64,
    #[serde(default)]
    pub update_seq: Value,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Confirmation returned for single document writes and deletes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentResponse {
    #[serde(default)]
    pub ok: bool,
    pub id: String,
    pub rev: String,
}

/// Body of a `_bulk_docs` request.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BulkDocs {
    pub docs: Vec<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub new_edits: Option<bool>,
}

impl BulkDocs {
    pub fn new(docs: Vec<Value>) -> Self {
        Self { docs, new_edits: None }
    }

    /// Sets `_deleted: true` on every object in the batch. Non-object entries
    /// are left alone and will be rejected per document by the server.
    pub fn mark_deleted(&mut self) {
        for doc in self.docs.iter_mut() {
            if let Value::Object(fields) = doc {
                fields.insert("_deleted".to_string(), Value::Bool(true));
            }
        }
    }
}

/// One entry of a `_bulk_docs` response, in the same position as the submitted document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BulkResult {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ok: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rev: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl BulkResult {
    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }
}

/// Parameters of a view or `_all_docs` request.
///
/// `key`, `startkey` and `endkey` are arbitrary JSON and are JSON-encoded when
/// sent in a query string. A non-empty `keys` list turns the request into a
/// POST carrying `{"keys": [...]}`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewQuery {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub keys: Option<Vec<Value>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub startkey: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub endkey: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub startkey_docid: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub endkey_docid: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub include_docs: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub inclusive_end: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub skip: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub descending: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reduce: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub group: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub group_level: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub update: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub update_seq: Option<bool>,
}

impl ViewQuery {
    pub fn range(startkey: Value, endkey: Value) -> Self {
        Self {
            startkey: Some(startkey),
            endkey: Some(endkey),
            ..Self::default()
        }
    }

    pub fn with_keys(keys: Vec<Value>) -> Self {
        Self {
            keys: Some(keys),
            ..Self::default()
        }
    }

    pub fn include_docs(mut self, include_docs: bool) -> Self {
        self.include_docs = Some(include_docs);
        self
    }

    /// Query-string pairs for every parameter except `keys`, which travels in the body.
    pub fn query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::new();

        let json_params = [
            ("key", &self.key),
            ("startkey", &self.startkey),
            ("endkey", &self.endkey),
        ];
        for (name, value) in json_params {
            if let Some(value) = value {
                pairs.push((name, value.to_string()));
            }
        }

        if let Some(id) = &self.startkey_docid {
            pairs.push(("startkey_docid", id.clone()));
        }
        if let Some(id) = &self.endkey_docid {
            pairs.push(("endkey_docid", id.clone()));
        }

        let flags = [
            ("include_docs", self.include_docs),
            ("inclusive_end", self.inclusive_end),
            ("descending", self.descending),
            ("reduce", self.reduce),
            ("group", self.group),
            ("update_seq", self.update_seq),
        ];
        for (name, flag) in flags {
            if let Some(flag) = flag {
                pairs.push((name, flag.to_string()));
            }
        }

        if let Some(limit) = self.limit {
            pairs.push(("limit", limit.to_string()));
        }
        if let Some(skip) = self.skip {
            pairs.push(("skip", skip.to_string()));
        }
        if let Some(level) = self.group_level {
            pairs.push(("group_level", level.to_string()));
        }
        if let Some(update) = &self.update {
            pairs.push(("update", update.clone()));
        }

        pairs
    }

    pub fn has_keys(&self) -> bool {
        self.keys.is_some()
    }
}

/// A row of a view or `_all_docs` response. Keys that do not resolve to a
/// document come back as rows carrying only `key` and `error`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ViewRow {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default)]
    pub key: Value,
    #[serde(default)]
    pub value: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub doc: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ViewResult {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_rows: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub offset: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub update_seq: Option<Value>,
    #[serde(default)]
    pub rows: Vec<ViewRow>,
}

/// Results of several view queries, one entry per query in submission order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MultiQueryResult {
    pub results: Vec<ViewResult>,
}
