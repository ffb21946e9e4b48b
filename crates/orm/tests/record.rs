//! Integration tests for record mapping between the canonical and external
//! shapes.

#![allow(missing_docs)]

mod common;

use chrono::{DateTime, NaiveDate, Utc};
use common::schema;
use serde_json::json;
use soql_orm::{ExternalRecord, Id, Record, RecordMapper, Value};

fn external(value: serde_json::Value) -> ExternalRecord {
    match value {
        serde_json::Value::Object(map) => map,
        _ => panic!("expected a JSON object"),
    }
}

#[test]
fn outbound_coerces_declared_fields() {
    let schema = schema();
    let mapper = RecordMapper::new(&schema, "Account").unwrap();

    let raw = external(json!({
        "Id": "001A",
        "Name": "ACME",
        "NumberOfEmployees": "37",
        "IsOpen__c": "true",
        "Opened_Date__c": "2024-03-07",
        "CreatedDate": "2024-03-07T10:00:00.000+0000",
        "ParentId": "001P",
        "OwnerId": null,
        "Website": "https://acme.example",
        "ChildAccounts": { "totalSize": 1, "done": true, "records": [{ "Id": "001C" }] }
    }));
    let record = mapper.outbound(&raw);

    let created: DateTime<Utc> = "2024-03-07T10:00:00Z".parse().unwrap();
    assert_eq!(record.id, Some(Id::from("001A")));
    assert_eq!(record.get("Name"), Some(&Value::from("ACME")));
    assert_eq!(record.get("NumberOfEmployees"), Some(&Value::Number(37.0)));
    assert_eq!(record.get("IsOpen__c"), Some(&Value::Bool(true)));
    assert_eq!(
        record.get("Opened_Date__c"),
        Some(&Value::Date(NaiveDate::from_ymd_opt(2024, 3, 7).unwrap()))
    );
    assert_eq!(record.get("CreatedDate"), Some(&Value::Instant(created)));
    assert_eq!(record.get("Parent"), Some(&Value::Link(Id::from("001P"))));
    assert_eq!(record.get("ChildAccounts"), Some(&Value::Links(vec![Id::from("001C")])));

    assert_eq!(record.get("Owner"), None);
    assert_eq!(record.get("AccountNumber"), None);
    assert_eq!(record.get("Website"), None);
}

#[test]
fn outbound_to_many_is_always_present() {
    let schema = schema();
    let mapper = RecordMapper::new(&schema, "Account").unwrap();

    let record = mapper.outbound(&external(json!({ "id": "001A" })));
    assert_eq!(record.id, Some(Id::from("001A")));
    assert_eq!(record.get("ChildAccounts"), Some(&Value::Links(vec![])));

    let none = mapper.outbound(&external(json!({ "Id": "001A", "ChildAccounts": null })));
    assert_eq!(none.get("ChildAccounts"), Some(&Value::Links(vec![])));
}

#[test]
fn outbound_copies_falsy_values() {
    let schema = schema();
    let mapper = RecordMapper::new(&schema, "Account").unwrap();

    let raw = external(json!({
        "Id": "001A",
        "NumberOfEmployees": null,
        "IsOpen__c": null,
        "CreatedDate": null,
        "Opened_Date__c": null
    }));
    let record = mapper.outbound(&raw);

    assert_eq!(record.get("NumberOfEmployees"), Some(&Value::Null));
    assert_eq!(record.get("IsOpen__c"), Some(&Value::Null));
    assert_eq!(record.get("CreatedDate"), Some(&Value::Null));
    assert_eq!(record.get("Opened_Date__c"), Some(&Value::Null));
}

#[test]
fn outbound_copies_uncoercible_values() {
    let schema = schema();
    let mapper = RecordMapper::new(&schema, "Account").unwrap();

    let raw = external(json!({
        "Id": "001A",
        "Name": "ACME",
        "NumberOfEmployees": "",
        "CreatedDate": "last week"
    }));
    let record = mapper.outbound(&raw);

    assert_eq!(record.get("Name"), Some(&Value::from("ACME")));
    assert_eq!(record.get("NumberOfEmployees"), Some(&Value::Text(String::new())));
    assert_eq!(record.get("CreatedDate"), Some(&Value::from("last week")));

    let many = mapper.outbound(&external(json!({ "Id": "001B", "NumberOfEmployees": "many" })));
    assert_eq!(many.get("NumberOfEmployees"), Some(&Value::from("many")));
}

#[test]
fn outbound_id_falls_back_when_lowercase_is_null() {
    let schema = schema();
    let mapper = RecordMapper::new(&schema, "Account").unwrap();

    let record = mapper.outbound(&external(json!({ "id": null, "Id": "001A" })));
    assert_eq!(record.id, Some(Id::from("001A")));

    let record = mapper.outbound(&external(json!({ "id": "001B", "Id": "001A" })));
    assert_eq!(record.id, Some(Id::from("001B")));
}

#[test]
fn inbound_writes_external_shape() {
    let schema = schema();
    let mapper = RecordMapper::new(&schema, "Account").unwrap();

    let created: DateTime<Utc> = "2024-03-07T10:00:00Z".parse().unwrap();
    let record = Record::new()
        .set("Name", "ACME")
        .set("NumberOfEmployees", 37)
        .set("Opened_Date__c", created)
        .set("CreatedDate", "2024-03-07T12:00:00+02:00")
        .set("Parent", Id::from("001P"))
        .set("Owner", Value::Null)
        .set("ChildAccounts", vec![Id::from("001C")])
        .set("Website", "https://acme.example");

    let raw = mapper.inbound(&record).unwrap();
    assert_eq!(
        serde_json::Value::Object(raw),
        json!({
            "Name": "ACME",
            "NumberOfEmployees": 37,
            "Opened_Date__c": "2024-03-07",
            "CreatedDate": "2024-03-07T10:00:00.000Z",
            "ParentId": "001P",
            "OwnerId": null
        })
    );
}

#[test]
fn inbound_writes_id_when_present() {
    let schema = schema();
    let mapper = RecordMapper::new(&schema, "Account").unwrap();

    let raw = mapper.inbound(&Record::new().id("001A").set("Name", "ACME")).unwrap();
    assert_eq!(serde_json::Value::Object(raw), json!({ "Id": "001A", "Name": "ACME" }));
}

#[test]
fn inbound_rejects_bad_instants() {
    let schema = schema();
    let mapper = RecordMapper::new(&schema, "Account").unwrap();

    let err = mapper.inbound(&Record::new().set("CreatedDate", "last week")).unwrap_err();
    assert!(format!("{err:#}").contains("unsupported timestamp"));
}

#[test]
fn to_one_round_trip_preserves_id() {
    let schema = schema();
    let mapper = RecordMapper::new(&schema, "Account").unwrap();

    let raw = external(json!({ "Id": "001A", "ParentId": "001P" }));
    let record = mapper.outbound(&raw);
    let back = mapper.inbound(&record).unwrap();

    assert_eq!(back.get("ParentId"), Some(&json!("001P")));
    assert_eq!(back.get("Id"), Some(&json!("001A")));
    assert!(!back.contains_key("ChildAccounts"));
}

#[test]
fn unknown_type_is_rejected() {
    let schema = schema();
    let Err(err) = RecordMapper::new(&schema, "Opportunity") else {
        panic!("expected unknown record type");
    };
    assert!(err.to_string().contains("unknown record type"));
}
