//! Settings redaction: produce safe-to-log snapshots by masking credentials.

use serde_json::Value;

/// Keys whose string values are secrets.
static SECRET_KEYS: &[&str] = &[
    "azure_key",
    "azureKey",
    "openai_api_key",
    "openaiApiKey",
    "api_key",
    "apiKey",
    "token",
    "secret",
    "password",
];

/// Mask a secret, keeping the first four characters as a hint.
pub fn mask_secret(secret: &str) -> String {
    if secret.is_empty() {
        return String::new();
    }
    if secret.chars().count() > 8 {
        format!("{}***", secret.chars().take(4).collect::<String>())
    } else {
        "***".to_string()
    }
}

/// Redact a JSON value, masking every string stored under a secret key.
pub fn redact(value: &Value) -> Value {
    redact_recursive(value, "")
}

fn is_secret_key(key: &str) -> bool {
    SECRET_KEYS.iter().any(|k| k.eq_ignore_ascii_case(key))
}

fn redact_recursive(value: &Value, key: &str) -> Value {
    match value {
        Value::String(s) if is_secret_key(key) => Value::String(mask_secret(s)),
        Value::Array(arr) => {
            Value::Array(arr.iter().map(|v| redact_recursive(v, key)).collect())
        }
        Value::Object(map) => {
            let mut result = serde_json::Map::new();
            for (k, v) in map {
                result.insert(k.clone(), redact_recursive(v, k));
            }
            Value::Object(result)
        }
        other => other.clone(),
    }
}
