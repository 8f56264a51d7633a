//! Configuration loading and environment parsing.

use super::Config;
use anyhow::Context;
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};

/// Environment variable naming the config file when `--config` is absent.
pub const CONFIG_PATH_ENV: &str = "MATCHBAY_CONFIG_PATH";

/// Prefix for per-field environment overrides, e.g.
/// `MATCHBAY__PORT=8080` or `MATCHBAY__SCHEDULER__TICK_RATE=60`
/// ("__" separates nesting levels).
pub const ENV_OVERRIDE_PREFIX: &str = "MATCHBAY__";

/// Load configuration, merging sources lowest-precedence first:
/// 1) Defaults compiled into the binary
/// 2) JSON file named by `explicit_path` (the `--config` flag) or, when
///    absent, by the `MATCHBAY_CONFIG_PATH` environment variable
/// 3) `MATCHBAY__SECTION__FIELD` environment overrides
///
/// A named file that is missing or malformed is an error; running with
/// no file at all is not.
pub fn load(explicit_path: Option<&Path>) -> anyhow::Result<Config> {
    let defaults = Config::default();
    let mut merged = serde_json::to_value(&defaults).context("failed to serialize defaults")?;

    let file_path = explicit_path.map(PathBuf::from).or_else(|| {
        std::env::var(CONFIG_PATH_ENV)
            .ok()
            .filter(|raw| !raw.trim().is_empty())
            .map(PathBuf::from)
    });

    if let Some(path) = file_path {
        let contents = fs::read_to_string(&path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        let value: Value = serde_json::from_str(&contents)
            .with_context(|| format!("failed to parse config file {}", path.display()))?;
        merge_values(&mut merged, value);
    }

    apply_env_overrides(&mut merged);

    serde_json::from_value::<Config>(merged).context("failed to deserialize configuration")
}

fn merge_values(target: &mut Value, source: Value) {
    match (target, source) {
        (Value::Object(target_map), Value::Object(source_map)) => {
            for (key, value) in source_map {
                match target_map.get_mut(&key) {
                    Some(existing) => merge_values(existing, value),
                    None => {
                        target_map.insert(key, value);
                    }
                }
            }
        }
        (target_slot, source_value) => {
            *target_slot = source_value;
        }
    }
}

fn apply_env_overrides(root: &mut Value) {
    for (key, raw_value) in std::env::vars() {
        let Some(stripped) = key.strip_prefix(ENV_OVERRIDE_PREFIX) else {
            continue;
        };

        let segments: Vec<String> = stripped
            .split("__")
            .filter(|segment| !segment.is_empty())
            .map(str::to_ascii_lowercase)
            .collect();

        if segments.is_empty() {
            continue;
        }

        let value = parse_env_value(&raw_value);
        set_nested_value(root, &segments, value);
    }
}

fn parse_env_value(raw: &str) -> Value {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Value::String(String::new());
    }

    // Numbers, booleans, and null pass through as JSON scalars; anything
    // else (including quoted strings) stays a plain string.
    serde_json::from_str(trimmed).unwrap_or_else(|_| Value::String(trimmed.to_string()))
}

fn set_nested_value(target: &mut Value, segments: &[String], value: Value) {
    let Some((head, rest)) = segments.split_first() else {
        *target = value;
        return;
    };

    let map = ensure_object(target);
    if rest.is_empty() {
        map.insert(head.clone(), value);
        return;
    }

    let entry = map
        .entry(head.clone())
        .or_insert_with(|| Value::Object(serde_json::Map::new()));
    set_nested_value(entry, rest, value);
}

fn ensure_object(value: &mut Value) -> &mut serde_json::Map<String, Value> {
    if !value.is_object() {
        *value = Value::Object(serde_json::Map::new());
    }

    match value.as_object_mut() {
        Some(map) => map,
        // Unreachable: the branch above coerced `value` into an object.
        None => unreachable!("value was just coerced into an object"),
    }
}
