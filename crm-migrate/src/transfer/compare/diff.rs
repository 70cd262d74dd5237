//! Attribute-level row diff

use super::super::Row;

/// Attributes whose value in `master` differs from `slave`
///
/// Only attributes present in both rows are compared. Values are compared
/// strictly: `1` and `1.0` differ, as do `"1"` and `1`. The result carries
/// the master values.
pub fn get_diff_data(master: &Row, slave: &Row) -> Row {
    master
        .iter()
        .filter(|(key, value)| slave.get(key.as_str()).is_some_and(|other| other != *value))
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect()
}

/// Values of `row` for the keys of `keys`, in `keys` order
pub fn pick(row: &Row, keys: &Row) -> Row {
    keys.keys()
        .filter_map(|key| row.get(key).map(|value| (key.clone(), value.clone())))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::{Value, json};

    fn row(value: Value) -> Row {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_diff_strict_inequality() {
        let master = row(json!({
            "id": "1",
            "name": "Old",
            "amount": 1,
            "code": "7",
            "flag": null,
            "data": {"a": [1, 2]},
            "onlyMaster": true
        }));
        let slave = row(json!({
            "id": "1",
            "name": "New",
            "amount": 1.0,
            "code": 7,
            "flag": null,
            "data": {"a": [1, 2]},
            "onlySlave": true
        }));

        let diff = get_diff_data(&master, &slave);
        assert_eq!(diff, row(json!({"name": "Old", "amount": 1, "code": "7"})));
    }

    #[test]
    fn test_diff_empty_when_equal() {
        let master = row(json!({"id": "1", "tags": ["a"], "n": null}));
        assert!(get_diff_data(&master, &master.clone()).is_empty());
        assert!(get_diff_data(&master, &Row::new()).is_empty());
    }

    #[test]
    fn test_pick() {
        let actual = row(json!({"id": "1", "name": "New", "other": 2}));
        let keys = row(json!({"name": "Old", "missing": 1}));
        assert_eq!(pick(&actual, &keys), row(json!({"name": "New"})));
    }
}
