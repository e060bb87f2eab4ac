//! In-process REST backend.
//!
//! `InMemoryServer` implements [`HttpClient`] directly, so models and
//! collections can be exercised end to end without sockets. It understands
//! the conventional routes:
//!
//! - `GET {root}` lists records, filtered by `?key=value` pairs
//! - `GET {root}/{id}` returns one record
//! - `POST {root}` stores a record and assigns the next integer id
//! - `PUT {root}/{id}` replaces a record
//! - `DELETE {root}/{id}` removes a record

use parking_lot::Mutex;
use restmodel_core::{
    async_trait, Attributes, HttpClient, HttpMethod, HttpRequest, HttpResponse, TransportError,
    DEFAULT_ID_ATTRIBUTE,
};
use serde_json::{json, Value};
use std::collections::{BTreeMap, HashMap, VecDeque};
use url::{form_urlencoded, Url};

/// Origin that relative request URLs are resolved against.
const LOCAL_ORIGIN: &str = "http://in-memory.invalid/";

/// A scripted failure returned instead of routing the next request.
#[derive(Debug, Clone)]
pub enum InjectedFailure {
    /// Respond with this status and body.
    Status(u16, Value),
    /// Fail at the transport level.
    Transport(TransportError),
}

#[derive(Debug, Default)]
struct Table {
    records: BTreeMap<i64, Attributes>,
    next_id: i64,
}

#[derive(Debug, Default)]
struct ServerState {
    tables: HashMap<String, Table>,
    failures: VecDeque<InjectedFailure>,
    requests: Vec<HttpRequest>,
}

/// A REST backend that lives in memory.
#[derive(Debug)]
pub struct InMemoryServer {
    id_attribute: String,
    state: Mutex<ServerState>,
}

impl InMemoryServer {
    /// Creates a server using the default `ID` key.
    pub fn new() -> Self {
        Self::with_id_attribute(DEFAULT_ID_ATTRIBUTE)
    }

    /// Creates a server that stores identifiers under `id_attribute`.
    pub fn with_id_attribute(id_attribute: impl Into<String>) -> Self {
        Self {
            id_attribute: id_attribute.into(),
            state: Mutex::new(ServerState::default()),
        }
    }

    /// Registers an endpoint root such as `/api/widgets`.
    pub fn register(&self, root: impl Into<String>) -> &Self {
        self.state
            .lock()
            .tables
            .entry(root.into())
            .or_insert_with(|| Table {
                records: BTreeMap::new(),
                next_id: 1,
            });
        self
    }

    /// Inserts a record directly, bypassing the HTTP surface. Returns its id.
    pub fn seed(&self, root: &str, mut record: Attributes) -> i64 {
        let mut state = self.state.lock();
        let table = state.tables.entry(root.to_string()).or_insert_with(|| Table {
            records: BTreeMap::new(),
            next_id: 1,
        });
        let id = table.next_id;
        table.next_id += 1;
        record.insert(self.id_attribute.clone(), json!(id));
        table.records.insert(id, record);
        id
    }

    /// Returns a stored record.
    pub fn record(&self, root: &str, id: i64) -> Option<Attributes> {
        self.state
            .lock()
            .tables
            .get(root)
            .and_then(|t| t.records.get(&id).cloned())
    }

    /// Returns the number of records under `root`.
    pub fn count(&self, root: &str) -> usize {
        self.state
            .lock()
            .tables
            .get(root)
            .map_or(0, |t| t.records.len())
    }

    /// Makes the next request fail with `status`.
    pub fn fail_next(&self, status: u16) {
        self.state
            .lock()
            .failures
            .push_back(InjectedFailure::Status(status, json!({"error": "injected"})));
    }

    /// Queues an arbitrary failure for the next request.
    pub fn inject(&self, failure: InjectedFailure) {
        self.state.lock().failures.push_back(failure);
    }

    /// Returns every request received so far.
    pub fn requests(&self) -> Vec<HttpRequest> {
        self.state.lock().requests.clone()
    }

    /// Returns the number of requests received.
    pub fn request_count(&self) -> usize {
        self.state.lock().requests.len()
    }

    fn route(&self, request: &HttpRequest) -> HttpResponse {
        let Some((path, filters)) = split_url(&request.url) else {
            return HttpResponse::new(400, json!({"error": format!("bad URL {}", request.url)}));
        };
        let path = path.as_str();
        let mut state = self.state.lock();

        let Some((root, id)) = resolve(&state.tables, path) else {
            return not_found(path);
        };
        let Some(table) = state.tables.get_mut(&root) else {
            return not_found(path);
        };

        match (request.method, id) {
            (HttpMethod::Get, None) => {
                let items: Vec<Value> = table
                    .records
                    .values()
                    .filter(|record| matches_filters(record, &filters))
                    .map(|record| Value::Object(record.clone()))
                    .collect();
                HttpResponse::ok(Value::Array(items))
            }
            (HttpMethod::Get, Some(id)) => match table.records.get(&id) {
                Some(record) => HttpResponse::ok(Value::Object(record.clone())),
                None => not_found(path),
            },
            (HttpMethod::Post, None) => {
                let mut record = body_object(request);
                let id = table.next_id;
                table.next_id += 1;
                record.insert(self.id_attribute.clone(), json!(id));
                table.records.insert(id, record.clone());
                HttpResponse::new(201, Value::Object(record))
            }
            (HttpMethod::Put, Some(id)) => {
                if !table.records.contains_key(&id) {
                    return not_found(path);
                }
                let mut record = body_object(request);
                record.insert(self.id_attribute.clone(), json!(id));
                table.records.insert(id, record.clone());
                HttpResponse::ok(Value::Object(record))
            }
            (HttpMethod::Delete, Some(id)) => match table.records.remove(&id) {
                Some(_) => HttpResponse::no_content(),
                None => not_found(path),
            },
            _ => HttpResponse::new(405, json!({"error": "method not allowed"})),
        }
    }
}

impl Default for InMemoryServer {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl HttpClient for InMemoryServer {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        let failure = {
            let mut state = self.state.lock();
            state.requests.push(request.clone());
            state.failures.pop_front()
        };

        match failure {
            Some(InjectedFailure::Status(status, body)) => Ok(HttpResponse::new(status, body)),
            Some(InjectedFailure::Transport(err)) => Err(err),
            None => Ok(self.route(&request)),
        }
    }
}

/// Splits a request URL into its path and decoded query pairs.
fn split_url(url: &str) -> Option<(String, Vec<(String, String)>)> {
    let parsed = Url::parse(LOCAL_ORIGIN).ok()?.join(url).ok()?;
    let filters = form_urlencoded::parse(parsed.query().unwrap_or_default().as_bytes())
        .into_owned()
        .collect();
    Some((parsed.path().to_string(), filters))
}

/// Finds the registered root for `path` and the trailing integer id, if any.
fn resolve(tables: &HashMap<String, Table>, path: &str) -> Option<(String, Option<i64>)> {
    if tables.contains_key(path) {
        return Some((path.to_string(), None));
    }
    let (root, id) = path.rsplit_once('/')?;
    if !tables.contains_key(root) {
        return None;
    }
    let id = id.parse().ok()?;
    Some((root.to_string(), Some(id)))
}

fn body_object(request: &HttpRequest) -> Attributes {
    match &request.body {
        Some(Value::Object(map)) => map.clone(),
        _ => Attributes::new(),
    }
}

fn not_found(path: &str) -> HttpResponse {
    HttpResponse::new(404, json!({"error": format!("no route for {path}")}))
}

fn matches_filters(record: &Attributes, filters: &[(String, String)]) -> bool {
    filters.iter().all(|(key, expected)| match record.get(key) {
        Some(Value::String(s)) => s == expected,
        Some(other) => other.to_string() == *expected,
        None => false,
    })
}
