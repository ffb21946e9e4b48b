//! In-memory transport shared across adapter integration tests.
#![allow(dead_code)]

use std::collections::HashSet;
use std::fmt::{self, Debug};
use std::sync::Arc;

use futures::stream;
use parking_lot::Mutex;
use serde_json::json;
use soql_adapter::soql_orm::{FieldDefinition, ScalarKind, TypeDescriptor};
use soql_adapter::{
    Adapter, BatchOptions, ConnectOptions, Describe, ExternalRecord, FutureResult, Id,
    QueryResponse, Registry, SaveError, SaveResult, Transport,
};

/// Rewrites the rows a query returns.
pub type Responder = dyn Fn(&str, Vec<ExternalRecord>) -> Vec<ExternalRecord> + Send + Sync;

#[derive(Default)]
pub struct State {
    pub rows: Vec<ExternalRecord>,
    pub next_id: u32,
    pub queries: Vec<(String, usize)>,
    pub login: Option<ConnectOptions>,
    pub described: Vec<String>,
    pub logged_out: bool,
    pub batches: usize,
}

#[derive(Default)]
pub struct MockTransport {
    pub state: Mutex<State>,
    pub fail_login: bool,
    pub fail_describe: bool,
    pub responder: Option<Box<Responder>>,
}

impl Debug for MockTransport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MockTransport").finish_non_exhaustive()
    }
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn respond_with(
        mut self, responder: impl Fn(&str, Vec<ExternalRecord>) -> Vec<ExternalRecord> + Send + Sync + 'static,
    ) -> Self {
        self.responder = Some(Box::new(responder));
        self
    }

    /// Stores a row directly, returning its id.
    pub fn seed(&self, row: serde_json::Value) -> Id {
        let mut state = self.state.lock();
        let mut row = object(row);
        let id = next_id(&mut state);
        row.insert("Id".to_string(), id.to_json());
        state.rows.push(row);
        id
    }

    pub fn queries(&self) -> Vec<String> {
        self.state.lock().queries.iter().map(|(soql, _)| soql.clone()).collect()
    }

    pub fn last_query(&self) -> String {
        self.queries().pop().unwrap_or_default()
    }

    pub fn batches(&self) -> usize {
        self.state.lock().batches
    }

    pub fn row_count(&self) -> usize {
        self.state.lock().rows.len()
    }
}

fn next_id(state: &mut State) -> Id {
    state.next_id += 1;
    Id::from(format!("001{:012}", state.next_id))
}

fn object(value: serde_json::Value) -> ExternalRecord {
    match value {
        serde_json::Value::Object(map) => map,
        _ => panic!("expected a JSON object"),
    }
}

fn row_id(row: &ExternalRecord) -> Option<Id> {
    row.get("Id").and_then(Id::from_json)
}

/// Identifiers in the first `Id IN (..)` filter of a query.
fn id_filter(soql: &str) -> Option<HashSet<String>> {
    let start = soql.find("WHERE Id IN (")? + "WHERE Id IN (".len();
    let end = start + soql[start..].find(')')?;
    Some(soql[start..end].split(", ").map(|id| id.trim_matches('\'').to_string()).collect())
}

impl Transport for MockTransport {
    fn login(&self, options: ConnectOptions) -> FutureResult<()> {
        let fail = self.fail_login;
        self.state.lock().login = Some(options);
        Box::pin(async move {
            if fail {
                anyhow::bail!("INVALID_LOGIN: invalid username, password, security token");
            }
            Ok(())
        })
    }

    fn logout(&self) -> FutureResult<()> {
        self.state.lock().logged_out = true;
        Box::pin(async { Ok(()) })
    }

    fn describe(&self, object: String) -> FutureResult<Describe> {
        let fail = self.fail_describe;
        self.state.lock().described.push(object.clone());
        Box::pin(async move {
            if fail {
                anyhow::bail!("NOT_FOUND: the requested resource does not exist");
            }
            let describe = match object.as_str() {
                "Account" => json!({
                    "childRelationships": [
                        { "relationshipName": "ChildAccounts", "field": "ParentId" }
                    ],
                    "fields": [
                        { "name": "Id", "type": "id", "relationshipName": null },
                        { "name": "Name", "type": "string", "relationshipName": null },
                        { "name": "ParentId", "type": "reference", "relationshipName": "Parent" },
                        { "name": "OwnerId", "type": "reference", "relationshipName": "Owner" },
                        { "name": "CreatedById", "type": "reference", "relationshipName": "CreatedBy" },
                        {
                            "name": "LastModifiedById",
                            "type": "reference",
                            "relationshipName": "LastModifiedBy"
                        }
                    ]
                }),
                "User" => json!({
                    "childRelationships": [
                        { "relationshipName": "Accounts", "field": "OwnerId" }
                    ],
                    "fields": []
                }),
                _ => json!({}),
            };
            Ok(serde_json::from_value(describe)?)
        })
    }

    fn query(&self, soql: String, max_fetch: usize) -> FutureResult<QueryResponse> {
        let mut state = self.state.lock();
        state.queries.push((soql.clone(), max_fetch));

        let mut rows: Vec<ExternalRecord> = match id_filter(&soql) {
            Some(ids) => state
                .rows
                .iter()
                .filter(|row| row_id(row).is_some_and(|id| ids.contains(&id.to_string())))
                .cloned()
                .collect(),
            None => state.rows.clone(),
        };

        if soql.contains("(SELECT Id FROM ChildAccounts") {
            for row in &mut rows {
                let parent = row.get("Id").cloned();
                let children: Vec<_> = state
                    .rows
                    .iter()
                    .filter(|child| parent.is_some() && child.get("ParentId") == parent.as_ref())
                    .map(|child| json!({ "Id": child.get("Id") }))
                    .collect();
                row.insert(
                    "ChildAccounts".to_string(),
                    json!({ "totalSize": children.len(), "done": true, "records": children }),
                );
            }
        }
        drop(state);

        if let Some(responder) = &self.responder {
            rows = responder(&soql, rows);
        }
        let total_size = rows.len() as u64;
        rows.truncate(max_fetch);

        Box::pin(async move {
            Ok(QueryResponse {
                total_size,
                records: Box::pin(stream::iter(rows.into_iter().map(Ok))),
            })
        })
    }

    fn create(
        &self, _object: String, records: Vec<ExternalRecord>, options: BatchOptions,
    ) -> FutureResult<Vec<SaveResult>> {
        let mut state = self.state.lock();
        state.batches += 1;

        let missing_name = |record: &ExternalRecord| {
            record.get("Name").is_none_or(serde_json::Value::is_null)
        };
        let results = if options.all_or_none && records.iter().any(missing_name) {
            records
                .iter()
                .map(|record| {
                    let error = if missing_name(record) {
                        SaveError::new("REQUIRED_FIELD_MISSING", "Required fields are missing: [Name]")
                            .field("Name")
                    } else {
                        SaveError::new("ALL_OR_NONE_OPERATION_ROLLED_BACK", "Record rolled back")
                    };
                    SaveResult::failed(error)
                })
                .collect()
        } else {
            records
                .into_iter()
                .map(|mut record| {
                    let id = next_id(&mut state);
                    record.insert("Id".to_string(), id.to_json());
                    state.rows.push(record);
                    SaveResult::ok(id)
                })
                .collect()
        };

        Box::pin(async move { Ok(results) })
    }

    fn update(
        &self, _object: String, records: Vec<ExternalRecord>, _options: BatchOptions,
    ) -> FutureResult<Vec<SaveResult>> {
        let mut state = self.state.lock();
        state.batches += 1;

        let results = records
            .into_iter()
            .map(|record| {
                let id = row_id(&record);
                let existing = state.rows.iter_mut().find(|row| id.is_some() && row_id(row) == id);
                match (id, existing) {
                    _ if record.get("Name").is_some_and(serde_json::Value::is_null) => {
                        SaveResult::failed(
                            SaveError::new("REQUIRED_FIELD_MISSING", "Required fields are missing: [Name]")
                                .field("Name"),
                        )
                    }
                    (Some(id), Some(row)) => {
                        row.extend(record);
                        SaveResult::ok(id)
                    }
                    _ => SaveResult::failed(SaveError::new(
                        "INVALID_CROSS_REFERENCE_KEY",
                        "invalid cross reference id",
                    )),
                }
            })
            .collect();

        Box::pin(async move { Ok(results) })
    }

    fn delete(&self, _object: String, ids: Vec<Id>) -> FutureResult<Vec<SaveResult>> {
        let mut state = self.state.lock();
        state.batches += 1;

        let results = ids
            .into_iter()
            .map(|id| {
                let before = state.rows.len();
                state.rows.retain(|row| row_id(row).as_ref() != Some(&id));
                if state.rows.len() < before {
                    SaveResult::ok(id)
                } else {
                    SaveResult::failed(SaveError::new("ENTITY_IS_DELETED", "entity is deleted"))
                }
            })
            .collect();

        Box::pin(async move { Ok(results) })
    }
}

pub fn account() -> TypeDescriptor {
    TypeDescriptor::new("Account")
        .field("Name", FieldDefinition::scalar(ScalarKind::String))
        .field("NumberOfEmployees", FieldDefinition::scalar(ScalarKind::Number))
        .field("Opened_Date__c", FieldDefinition::scalar(ScalarKind::CalendarDate))
        .field("Parent", FieldDefinition::to_one("Account").inverse("ChildAccounts"))
        .field("ChildAccounts", FieldDefinition::to_many("Account").inverse("Parent"))
        .field("Owner", FieldDefinition::to_one("User"))
}

pub fn user() -> TypeDescriptor {
    TypeDescriptor::new("User")
        .field("Name", FieldDefinition::scalar(ScalarKind::String))
        .field("Accounts", FieldDefinition::to_many("Account").inverse("Owner"))
}

pub fn registry() -> Registry {
    Registry::new().with(account()).with(user())
}

pub fn options() -> ConnectOptions {
    ConnectOptions {
        login_url: "https://login.example.com".to_string(),
        api_version: "59.0".to_string(),
        username: "user@example.com".to_string(),
        password: "secret".to_string(),
        ..ConnectOptions::default()
    }
}

/// Connects an adapter over the mock, returning both.
pub async fn connect(mock: MockTransport) -> (Adapter, Arc<MockTransport>) {
    let mock = Arc::new(mock);
    let transport: Arc<dyn Transport> = Arc::<MockTransport>::clone(&mock);
    let adapter = Adapter::builder(transport, registry()).connect_with(options()).await.unwrap();
    (adapter, mock)
}
