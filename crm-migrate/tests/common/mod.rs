#![allow(dead_code)]

use crm_migrate::host::{EntityDefs, EntityManager, HostConfig, Instance};
use crm_migrate::transfer::{Row, RowStream};
use serde_json::{Value, json};

/// Entity defs shared by the flow tests
pub fn defs() -> Vec<EntityDefs> {
    serde_json::from_value(json!([
        {
            "name": "User",
            "attributes": [
                {"name": "id", "type": "id"},
                {"name": "userName", "type": "varchar"},
                {"name": "type", "type": "varchar"},
                {"name": "password", "type": "password"},
                {"name": "deleted", "type": "bool"},
                {"name": "createdAt", "type": "datetime"},
                {"name": "modifiedAt", "type": "datetime"}
            ]
        },
        {
            "name": "Account",
            "attributes": [
                {"name": "id", "type": "id"},
                {"name": "name", "type": "varchar"},
                {"name": "description", "type": "text"},
                {"name": "assignedUserId", "type": "foreignId"},
                {"name": "assignedUserName", "type": "foreign",
                 "foreign": {"relation": "assignedUser", "attribute": "userName"}},
                {"name": "data", "type": "jsonObject"},
                {"name": "amount", "type": "float", "field": "amount"},
                {"name": "amountCurrency", "type": "varchar", "field": "amount"},
                {"name": "deleted", "type": "bool"},
                {"name": "createdAt", "type": "datetime"},
                {"name": "modifiedAt", "type": "datetime"}
            ],
            "fields": {
                "amount": {"type": "currency"}
            },
            "relations": [
                {"name": "assignedUser", "type": "belongsTo", "entity": "User", "key": "assignedUserId"}
            ],
            "idReferenceAttributes": {
                "data": ["User"]
            }
        },
        {
            "name": "Note",
            "attributes": [
                {"name": "id", "type": "id"},
                {"name": "type", "type": "varchar"},
                {"name": "post", "type": "text"},
                {"name": "parentType", "type": "foreignType"},
                {"name": "parentId", "type": "foreignId"},
                {"name": "deleted", "type": "bool"},
                {"name": "createdAt", "type": "datetime"},
                {"name": "modifiedAt", "type": "datetime"}
            ],
            "relations": [
                {"name": "parent", "type": "belongsToParent", "key": "parentId"}
            ]
        }
    ]))
    .unwrap()
}

pub fn row(value: Value) -> Row {
    value.as_object().cloned().unwrap()
}

/// Instance with the shared defs and the given records
pub fn instance(records: &[(&str, Value)]) -> Instance {
    let mut instance = Instance::new(defs());
    instance.config.set("applicationName", json!("CRM"));
    instance.config.set("version", json!("8.1.0"));
    instance.config.set("defaultCurrency", json!("USD"));
    for (entity_type, value) in records {
        instance.store.insert(entity_type, row(value.clone()));
    }
    instance
}

/// Instance holding a small but linked data set
pub fn source_instance() -> Instance {
    instance(&[
        (
            "User",
            json!({"id": "u1", "userName": "admin", "type": "admin", "password": "hash-1",
                   "deleted": false, "createdAt": "2023-01-01 00:00:00", "modifiedAt": "2023-01-01 00:00:00"}),
        ),
        (
            "User",
            json!({"id": "system", "userName": "system", "type": "system",
                   "deleted": false, "createdAt": "2023-01-01 00:00:00", "modifiedAt": "2023-01-01 00:00:00"}),
        ),
        (
            "Account",
            json!({"id": "a1", "name": "Acme", "description": "Owner is 'u1'",
                   "assignedUserId": "u1", "data": {"owner": "u1", "tags": ["x"]},
                   "amount": 10.5, "amountCurrency": "USD", "deleted": false,
                   "createdAt": "2023-02-01 00:00:00", "modifiedAt": "2023-03-01 00:00:00"}),
        ),
        (
            "Account",
            json!({"id": "a2", "name": "Beta", "assignedUserId": null,
                   "deleted": false, "createdAt": "2023-02-02 00:00:00", "modifiedAt": "2023-03-02 00:00:00"}),
        ),
        (
            "Note",
            json!({"id": "n1", "type": "Post", "post": "hello", "parentType": "Account", "parentId": "a1",
                   "deleted": false, "createdAt": "2023-03-01 00:00:00", "modifiedAt": "2023-03-01 00:00:00"}),
        ),
    ])
}

pub fn stored(instance: &Instance, entity_type: &str, id: &str) -> Option<Row> {
    instance
        .store
        .get_by_id(entity_type, id, true)
        .unwrap()
        .map(|e| e.into_values())
}

pub fn rows(stream: &mut RowStream) -> Vec<Row> {
    stream.rewind().unwrap();
    let mut rows = Vec::new();
    while let Some(row) = stream.read().unwrap() {
        rows.push(row);
    }
    rows
}
