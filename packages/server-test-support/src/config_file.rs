//! Temporary JSON config files.

use std::io::Write;

use tempfile::NamedTempFile;

/// Write `contents` to a temp file that lives as long as the returned handle.
pub fn write_config(contents: &str) -> NamedTempFile {
    let mut file = tempfile::Builder::new()
        .prefix("config-")
        .suffix(".json")
        .tempfile()
        .expect("create temp config file");
    file.write_all(contents.as_bytes())
        .expect("write temp config file");
    file
}

/// A well-formed config pointing at a database nobody listens on.
pub fn sample_config_json() -> String {
    serde_json::json!({
        "host": "127.0.0.1",
        "port": "1",
        "user": "app",
        "password": "secret",
        "name": "app_test"
    })
    .to_string()
}
