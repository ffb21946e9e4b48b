//! Common test helpers shared across integration tests.
#![allow(dead_code)]

use std::collections::HashMap;

use soql_orm::{
    Dialect, FieldDefinition, ForeignKeyMap, Registry, ScalarKind, Schema, TypeDescriptor,
};

// Common record types used across multiple test files

pub fn account() -> TypeDescriptor {
    TypeDescriptor::new("Account")
        .field("Name", FieldDefinition::scalar(ScalarKind::String))
        .field("AccountNumber", FieldDefinition::scalar(ScalarKind::String))
        .field("NumberOfEmployees", FieldDefinition::scalar(ScalarKind::Number))
        .field("IsOpen__c", FieldDefinition::scalar(ScalarKind::Boolean))
        .field("Opened_Date__c", FieldDefinition::scalar(ScalarKind::CalendarDate))
        .field("Parent", FieldDefinition::to_one("Account").inverse("ChildAccounts"))
        .field("ChildAccounts", FieldDefinition::to_many("Account").inverse("Parent"))
        .field("Owner", FieldDefinition::to_one("User"))
        .field("CreatedDate", FieldDefinition::scalar(ScalarKind::Instant))
        .field("LastModifiedDate", FieldDefinition::scalar(ScalarKind::Instant))
        .field("CreatedBy", FieldDefinition::to_one("User"))
        .field("LastModifiedBy", FieldDefinition::to_one("User"))
}

pub fn user() -> TypeDescriptor {
    TypeDescriptor::new("User")
        .field("Name", FieldDefinition::scalar(ScalarKind::String))
        .field("IsActive", FieldDefinition::scalar(ScalarKind::Boolean))
        .field("Accounts", FieldDefinition::to_many("Account").inverse("Owner"))
}

pub fn foreign_keys() -> ForeignKeyMap {
    let columns = |pairs: &[(&str, &str)]| -> HashMap<String, String> {
        pairs.iter().map(|(field, column)| ((*field).to_string(), (*column).to_string())).collect()
    };

    ForeignKeyMap::new()
        .with(
            "Account",
            columns(&[
                ("Parent", "ParentId"),
                ("ChildAccounts", "ParentId"),
                ("Owner", "OwnerId"),
                ("CreatedBy", "CreatedById"),
                ("LastModifiedBy", "LastModifiedById"),
            ]),
        )
        .with("User", columns(&[("Accounts", "OwnerId")]))
}

pub fn schema() -> Schema {
    Schema::new(Registry::new().with(account()).with(user()), foreign_keys(), Dialect::default())
}

/// Normalize SOQL by collapsing whitespace.
fn normalize_soql(soql: &str) -> String {
    soql.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Assert that SOQL contains all expected fragments in order.
///
/// Whitespace is normalized on both sides, and fragments must appear
/// sequentially in the generated query.
#[allow(clippy::missing_panics_doc)]
pub fn assert_soql_contains(actual: &str, fragments: &[&str]) {
    let actual_normalized = normalize_soql(actual);
    let mut search_start = 0usize;

    for fragment in fragments {
        let fragment_normalized = normalize_soql(fragment);
        if fragment_normalized.is_empty() {
            continue;
        }

        if let Some(pos) = actual_normalized[search_start..].find(&fragment_normalized) {
            search_start += pos + fragment_normalized.len();
        } else {
            panic!("expected SOQL fragment `{fragment_normalized}` not found in `{actual_normalized}`");
        }
    }
}
