//! # Backup Command
//!
//! Writes the whole inventory (products, then sales) to one CSV file.
//!
//! Rows are the backend's records as received, so every field and every
//! price digit survives the round trip.
//!
//! ```text
//! fetch(/products) ─┐
//!                   ├─► BackupDocument::inventory ──► backup_inventario.csv
//! fetch(/sales) ────┘         │
//!                             └─ both empty ──► no file
//! ```

use stockbook_core::export::{records_from_json, BackupDocument, BACKUP_FILENAME};
use stockbook_core::EntityKind;
use stockbook_query::CacheKey;
use tracing::info;

use crate::download::trigger_download;
use crate::error::ViewError;
use crate::state::{ClientState, ConfigState};

/// Fetches products and sales concurrently and downloads the backup.
pub async fn backup_inventory(
    client: &ClientState,
    config: &ConfigState,
) -> Result<String, ViewError> {
    let products_key = CacheKey::collection(EntityKind::Products);
    let sales_key = CacheKey::collection(EntityKind::Sales);
    let (products, sales) = tokio::join!(
        client.inner().fetch(&products_key),
        client.inner().fetch(&sales_key)
    );
    let products = records_from_json(&*products?)?;
    let sales = records_from_json(&*sales?)?;

    let document = BackupDocument::inventory(&products, &sales);
    let Some(content) = document.finish() else {
        return Ok("Nothing to back up".to_string());
    };

    let path = trigger_download(&config.download_dir, BACKUP_FILENAME, &content)?;
    info!(
        products = products.len(),
        sales = sales.len(),
        path = %path.display(),
        "Inventory backed up"
    );
    Ok(format!(
        "Backed up {} products and {} sales to {}",
        products.len(),
        sales.len(),
        path.display()
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;
    use crate::test_support::{product, sale, Backend, Store};
    use std::fs;
    use stockbook_core::export::decode_row;
    use stockbook_query::QueryConfig;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_backup_writes_both_blocks() {
        let backend = Backend::spawn(Store {
            products: vec![product("p1", "Zelda, Ocarina", 50.0, 1)],
            sales: vec![sale("s1", "Ana", &[("p1", 1, 50.0)])],
            ..Store::default()
        })
        .await;
        let dir = tempdir().unwrap();

        let out = backup_inventory(&backend.client(), &ConfigState::new(dir.path()))
            .await
            .unwrap();
        assert!(out.starts_with("Backed up 1 products and 1 sales to "));

        let csv = fs::read_to_string(dir.path().join(BACKUP_FILENAME)).unwrap();
        let lines: Vec<&str> = csv.split('\n').collect();
        assert_eq!(lines[0], "# Productos");
        assert!(lines[1].starts_with("_id,name,price,"));
        assert_eq!(decode_row(lines[2]).unwrap()[1], "Zelda, Ocarina");
        assert_eq!(lines[3], "# Ventas");
        assert_eq!(lines[4], "_id,date,total,products,clientName,__v");
        assert!(lines[5].starts_with("\"s1\","));
        assert_eq!(lines.len(), 7);
        assert_eq!(lines[6], "");
    }

    #[tokio::test]
    async fn test_backup_keeps_backend_fields_and_prices() {
        let mut zelda = product("p1", "Zelda", 19.999, 1);
        zelda["__v"] = 0.into();
        zelda["createdAt"] = "2024-05-01T10:00:00.000Z".into();
        let backend = Backend::spawn(Store {
            products: vec![zelda],
            ..Store::default()
        })
        .await;
        let dir = tempdir().unwrap();

        backup_inventory(&backend.client(), &ConfigState::new(dir.path()))
            .await
            .unwrap();

        let csv = fs::read_to_string(dir.path().join(BACKUP_FILENAME)).unwrap();
        let lines: Vec<&str> = csv.split('\n').collect();
        assert_eq!(
            lines[1],
            "_id,name,price,description,category,platformId,stock,status,internCode,__v,createdAt"
        );
        let row = decode_row(lines[2]).unwrap();
        assert_eq!(row[2], 19.999);
        assert_eq!(row[10], "2024-05-01T10:00:00.000Z");
    }

    #[tokio::test]
    async fn test_backup_skips_empty_blocks() {
        let backend = Backend::spawn(Store {
            sales: vec![sale("s1", "Ana", &[("p1", 1, 50.0)])],
            ..Store::default()
        })
        .await;
        let dir = tempdir().unwrap();

        backup_inventory(&backend.client(), &ConfigState::new(dir.path()))
            .await
            .unwrap();

        let csv = fs::read_to_string(dir.path().join(BACKUP_FILENAME)).unwrap();
        assert!(csv.starts_with("# Ventas\n"));
        assert!(!csv.contains("# Productos"));
    }

    #[tokio::test]
    async fn test_empty_inventory_writes_nothing() {
        let backend = Backend::spawn(Store::default()).await;
        let dir = tempdir().unwrap();

        let out = backup_inventory(&backend.client(), &ConfigState::new(dir.path()))
            .await
            .unwrap();
        assert_eq!(out, "Nothing to back up");
        assert!(!dir.path().join(BACKUP_FILENAME).exists());
    }

    #[tokio::test]
    async fn test_backup_reuses_cached_lists() {
        let backend = Backend::spawn(Store {
            products: vec![product("p1", "Zelda", 50.0, 1)],
            ..Store::default()
        })
        .await;
        let client = backend.client();
        let dir = tempdir().unwrap();
        let config = ConfigState::new(dir.path());

        backup_inventory(&client, &config).await.unwrap();
        backup_inventory(&client, &config).await.unwrap();

        assert_eq!(backend.hits("GET /products"), 1);
        assert_eq!(backend.hits("GET /sales"), 1);
    }

    #[tokio::test]
    async fn test_failed_fetch_writes_nothing() {
        let dir = tempdir().unwrap();
        let target = dir.path().join("never");

        let mut config = QueryConfig::default();
        config.api.base_url = "http://127.0.0.1:1".into();
        config.cache.retries = 0;
        let client = ClientState::from_config(&config).unwrap();

        let err = backup_inventory(&client, &ConfigState::new(&target))
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::NetworkError);
        assert!(!target.exists());
    }
}
