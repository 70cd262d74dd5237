//! Placeholder substitution applied to rows on import
//!
//! Entity metadata can declare, per attribute, an action that replaces the
//! bundle value with something derived from the target instance: the
//! current date, a configuration value, a fresh password, and so on.
//!
//! ```json
//! "placeholders": {
//!   "dateStart": {"action": "currentMonth"},
//!   "password": {"action": "password", "missing": "generate", "length": 12},
//!   "currency": {"action": "config", "key": "defaultCurrency"}
//! }
//! ```

use chrono::{DateTime, Datelike, NaiveDate, Utc};
use chrono_tz::Tz;
use rand::distr::{Alphanumeric, SampleString};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{DATE_FORMAT, DATETIME_FORMAT, ProcessOutcome, Row, parse_datetime};
use crate::error::Result;
use crate::host::HostContext;

/// What to do when a password attribute has no value
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum MissingPassword {
    #[default]
    Generate,
    Skip,
}

fn default_password_length() -> usize {
    12
}

/// A declarative placeholder action
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "camelCase")]
pub enum PlaceholderAction {
    /// Move a date/datetime into the current month, keeping day and time
    CurrentMonth,
    /// Current UTC datetime
    Now,
    /// Current date in the instance time zone
    Today,
    /// Value of an instance configuration parameter
    Config { key: String },
    /// Fixed value
    Value { value: Value },
    /// Keep an existing hash, otherwise generate one or skip the row
    Password {
        #[serde(default)]
        missing: MissingPassword,
        #[serde(default = "default_password_length")]
        length: usize,
    },
}

/// Applies the placeholder actions declared for an entity type
pub struct PlaceholderHandler;

impl PlaceholderHandler {
    pub fn apply(ctx: &HostContext<'_>, entity_type: &str, row: &mut Row) -> Result<ProcessOutcome> {
        Self::apply_at(ctx, entity_type, row, Utc::now())
    }

    /// Same as [`apply`](Self::apply) with an explicit current time
    pub fn apply_at(
        ctx: &HostContext<'_>,
        entity_type: &str,
        row: &mut Row,
        now: DateTime<Utc>,
    ) -> Result<ProcessOutcome> {
        let defs = ctx.entity_defs(entity_type)?;
        if defs.placeholders.is_empty() {
            return Ok(ProcessOutcome::Continue);
        }

        let time_zone: Tz = ctx.config.time_zone().parse().unwrap_or(chrono_tz::UTC);
        let local_now = now.with_timezone(&time_zone);

        let mut attributes: Vec<&String> = defs.placeholders.keys().collect();
        attributes.sort();

        for attribute in attributes {
            let action = &defs.placeholders[attribute];
            match action {
                PlaceholderAction::CurrentMonth => {
                    let moved = row
                        .get(attribute.as_str())
                        .and_then(Value::as_str)
                        .and_then(|v| move_to_month(v, local_now.year(), local_now.month()));
                    if let Some(moved) = moved {
                        row.insert(attribute.clone(), Value::String(moved));
                    }
                }
                PlaceholderAction::Now => {
                    let value = now.naive_utc().format(DATETIME_FORMAT).to_string();
                    row.insert(attribute.clone(), Value::String(value));
                }
                PlaceholderAction::Today => {
                    let value = local_now.date_naive().format(DATE_FORMAT).to_string();
                    row.insert(attribute.clone(), Value::String(value));
                }
                PlaceholderAction::Config { key } => match ctx.config.get(key) {
                    Some(value) => {
                        row.insert(attribute.clone(), value.clone());
                    }
                    None => log::debug!("Config key '{}' not set, keeping {}", key, attribute),
                },
                PlaceholderAction::Value { value } => {
                    row.insert(attribute.clone(), value.clone());
                }
                PlaceholderAction::Password { missing, length } => {
                    let present = row
                        .get(attribute.as_str())
                        .and_then(Value::as_str)
                        .is_some_and(|v| !v.is_empty());
                    if present {
                        continue;
                    }
                    match missing {
                        MissingPassword::Skip => {
                            return Ok(ProcessOutcome::skip(format!("{} is not set", attribute)));
                        }
                        MissingPassword::Generate => {
                            let plain = Alphanumeric.sample_string(&mut rand::rng(), *length);
                            let hash = ctx.config.hash_password(&plain);
                            row.insert(attribute.clone(), Value::String(hash));
                        }
                    }
                }
            }
        }

        Ok(ProcessOutcome::Continue)
    }
}

/// Move a stored date or datetime into another month
///
/// The day is clamped to the length of the target month. Date-only values
/// stay date-only.
pub fn move_to_month(value: &str, year: i32, month: u32) -> Option<String> {
    let date_only = NaiveDate::parse_from_str(value, DATE_FORMAT).is_ok();
    let parsed = parse_datetime(value)?;
    let day = parsed.day().min(days_in_month(year, month)?);
    let date = NaiveDate::from_ymd_opt(year, month, day)?;

    if date_only {
        return Some(date.format(DATE_FORMAT).to_string());
    }
    Some(date.and_time(parsed.time()).format(DATETIME_FORMAT).to_string())
}

fn days_in_month(year: i32, month: u32) -> Option<u32> {
    let first = NaiveDate::from_ymd_opt(year, month, 1)?;
    let next = if month == 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1)?
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1)?
    };
    u32::try_from((next - first).num_days()).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::{EntityDefs, HostConfig, Instance};
    use chrono::TimeZone;
    use serde_json::json;

    fn instance(placeholders: Value) -> Instance {
        let mut defs = EntityDefs::new("User");
        defs.placeholders = serde_json::from_value(placeholders).unwrap();
        let mut instance = Instance::new(vec![defs]);
        instance.config.set("defaultCurrency", json!("EUR"));
        instance.config.set("timeZone", json!("Europe/Berlin"));
        instance
    }

    fn row(value: Value) -> Row {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_deserialize_actions() {
        let action: PlaceholderAction =
            serde_json::from_value(json!({"action": "config", "key": "defaultCurrency"})).unwrap();
        assert_eq!(action, PlaceholderAction::Config { key: "defaultCurrency".into() });

        let action: PlaceholderAction = serde_json::from_value(json!({"action": "password"})).unwrap();
        assert_eq!(
            action,
            PlaceholderAction::Password { missing: MissingPassword::Generate, length: 12 }
        );
    }

    #[test]
    fn test_move_to_month() {
        assert_eq!(
            move_to_month("2023-01-31 10:15:00", 2024, 2).as_deref(),
            Some("2024-02-29 10:15:00")
        );
        assert_eq!(move_to_month("2023-05-10", 2024, 11).as_deref(), Some("2024-11-10"));
        assert_eq!(move_to_month("not a date", 2024, 1), None);
    }

    #[test]
    fn test_apply_actions() {
        let mut instance = instance(json!({
            "dateStart": {"action": "currentMonth"},
            "createdAt": {"action": "now"},
            "birthday": {"action": "today"},
            "currency": {"action": "config", "key": "defaultCurrency"},
            "status": {"action": "value", "value": "Active"}
        }));
        let ctx = instance.context();
        // 23:30 UTC is already the next day in Berlin
        let now = Utc.with_ymd_and_hms(2024, 3, 31, 23, 30, 0).unwrap();

        let mut values = row(json!({"dateStart": "2020-01-31 08:00:00", "status": "Draft"}));
        let outcome = PlaceholderHandler::apply_at(&ctx, "User", &mut values, now).unwrap();

        assert_eq!(outcome, ProcessOutcome::Continue);
        assert_eq!(values["dateStart"], json!("2024-04-30 08:00:00"));
        assert_eq!(values["createdAt"], json!("2024-03-31 23:30:00"));
        assert_eq!(values["birthday"], json!("2024-04-01"));
        assert_eq!(values["currency"], json!("EUR"));
        assert_eq!(values["status"], json!("Active"));
    }

    #[test]
    fn test_password_generate_and_keep() {
        let mut instance = instance(json!({"password": {"action": "password", "length": 16}}));
        let ctx = instance.context();

        let mut missing = row(json!({"userName": "a", "password": null}));
        PlaceholderHandler::apply(&ctx, "User", &mut missing).unwrap();
        let hash = missing["password"].as_str().unwrap();
        assert_eq!(hash.len(), 128);

        let mut present = row(json!({"userName": "b", "password": "existing-hash"}));
        PlaceholderHandler::apply(&ctx, "User", &mut present).unwrap();
        assert_eq!(present["password"], json!("existing-hash"));
    }

    #[test]
    fn test_password_skip() {
        let mut instance =
            instance(json!({"password": {"action": "password", "missing": "skip"}}));
        let ctx = instance.context();

        let mut values = row(json!({"userName": "a"}));
        let outcome = PlaceholderHandler::apply(&ctx, "User", &mut values).unwrap();
        assert!(outcome.is_skip());
    }
}
