//! Menu catalog persistence.
//!
//! The catalog is the only durable artifact: a JSON array of menu item
//! records at a fixed path. A missing or corrupt file loads as an empty
//! catalog rather than failing startup.

use std::io;
use std::path::Path;

use serde_json::Value;

use mesa_core::catalog::MenuItem;

/// Load raw menu records from disk; missing or unparseable files yield
/// an empty list.
pub async fn load(path: &Path) -> Vec<Value> {
    match tokio::fs::read(path).await {
        Ok(bytes) => serde_json::from_slice(&bytes).unwrap_or_default(),
        Err(_) => Vec::new(),
    }
}

/// Persist the normalized catalog snapshot as pretty-printed JSON.
///
/// # Errors
///
/// Returns an error if serialization or the filesystem write fails.
pub async fn save(path: &Path, items: &[MenuItem]) -> io::Result<()> {
    let body = serde_json::to_vec_pretty(items).map_err(io::Error::other)?;
    tokio::fs::write(path, body).await
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    fn temp_path(name: &str) -> std::path::PathBuf {
        std::env::temp_dir().join(format!("mesa-menu-{name}-{}.json", std::process::id()))
    }

    #[tokio::test]
    async fn missing_file_loads_empty() {
        assert!(load(Path::new("/nonexistent/menu.json")).await.is_empty());
    }

    #[tokio::test]
    async fn save_then_load_round_trips() {
        let path = temp_path("roundtrip");
        let items = vec![MenuItem {
            name: "Soup".to_owned(),
            price: 4.0,
            img_ref: "soup.png".to_owned(),
            ingredients: String::new(),
            description: String::new(),
        }];

        save(&path, &items).await.unwrap();
        let raw = load(&path).await;
        assert_eq!(raw.len(), 1);
        assert_eq!(raw[0]["name"], json!("Soup"));

        let _ = tokio::fs::remove_file(&path).await;
    }

    #[tokio::test]
    async fn corrupt_file_loads_empty() {
        let path = temp_path("corrupt");
        tokio::fs::write(&path, b"{not json").await.unwrap();
        assert!(load(&path).await.is_empty());
        let _ = tokio::fs::remove_file(&path).await;
    }
}
