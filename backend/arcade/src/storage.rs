//! Asset inventory: lists images from a Supabase-compatible storage bucket.
//!
//! A failed listing is logged and treated as an empty inventory; the
//! selector copes with empty inventories by picking nothing.

use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, warn};

use crate::config::Config;
use crate::errors::{AppError, Result};
use crate::models::AssetRef;

const LIST_LIMIT: u32 = 1000;
const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "webp", "gif"];

#[derive(Debug, Deserialize)]
pub struct ListedObject {
    pub name: String,
}

#[derive(Clone)]
pub struct StorageClient {
    client: Client,
    base_url: String,
    bucket: String,
    api_key: Option<String>,
}

impl StorageClient {
    pub fn new(client: Client, config: &Config) -> Self {
        Self {
            client,
            base_url: config.storage_url.clone(),
            bucket: config.storage_bucket.clone(),
            api_key: config.storage_key.clone(),
        }
    }

    /// Images under `prefix`, sorted by name. Errors collapse to an empty list.
    pub async fn list_images(&self, prefix: &str) -> Vec<AssetRef> {
        match self.list(prefix).await {
            Ok(objects) => {
                let assets = images_from_listing(&self.base_url, &self.bucket, prefix, objects);
                debug!("Listed {} images under {prefix}", assets.len());
                assets
            }
            Err(e) => {
                warn!("Asset listing for {prefix} failed: {e}");
                Vec::new()
            }
        }
    }

    async fn list(&self, prefix: &str) -> Result<Vec<ListedObject>> {
        let url = format!("{}/storage/v1/object/list/{}", self.base_url, self.bucket);
        let body = json!({
            "prefix": prefix,
            "limit": LIST_LIMIT,
            "offset": 0,
            "sortBy": { "column": "name", "order": "asc" },
        });
        let mut req = self.client.post(&url).json(&body);
        if let Some(key) = &self.api_key {
            req = req.header("apikey", key).bearer_auth(key);
        }

        let resp = req.send().await?;
        let status = resp.status();
        if !status.is_success() {
            return Err(AppError::Storage(format!("list returned HTTP {status}")));
        }
        Ok(resp.json().await?)
    }
}

/// Keep image files only, sort by name and resolve public URLs.
pub fn images_from_listing(
    base_url: &str,
    bucket: &str,
    prefix: &str,
    objects: Vec<ListedObject>,
) -> Vec<AssetRef> {
    let mut assets: Vec<AssetRef> = objects
        .into_iter()
        .filter(|o| is_image(&o.name))
        .map(|o| AssetRef {
            path: format!("{prefix}{}", o.name),
            url: format!(
                "{base_url}/storage/v1/object/public/{bucket}/{prefix}{}",
                o.name
            ),
            name: o.name,
        })
        .collect();
    assets.sort_by(|a, b| a.name.cmp(&b.name));
    assets
}

fn is_image(name: &str) -> bool {
    match name.rsplit_once('.') {
        Some((_, ext)) => IMAGE_EXTENSIONS.iter().any(|e| ext.eq_ignore_ascii_case(e)),
        None => false,
    }
}
