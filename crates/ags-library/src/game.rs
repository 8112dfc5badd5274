//! Entitlement to library game-entry mapping

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::entitlements::Entitlement;
use crate::error::Result;

/// A game entry in the shape the aggregator's library expects.
///
/// `appid` is the stringified entitlement id; `details` retains the full
/// raw server record for consumers that need artwork URLs or product
/// metadata. No deduplication happens here: each sync replaces the whole
/// set.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameEntry {
    pub appid: String,
    pub slug: String,
    pub name: String,
    pub details: Value,
}

impl GameEntry {
    /// Map one server entitlement record into a library entry.
    pub fn from_entitlement(entitlement: &Entitlement) -> Self {
        let appid = match &entitlement.id {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        };
        let name = entitlement.product.title.clone();
        Self {
            appid,
            slug: slugify(&name),
            name,
            details: serde_json::to_value(entitlement).unwrap_or(Value::Null),
        }
    }
}

/// Destination for mapped game entries.
///
/// The aggregator supplies its own implementation (its library database, a
/// JSON store). A load saves each mapped entry through it, one record at a
/// time, before returning the list; a save failure aborts the load.
#[async_trait]
pub trait GameRegistry: Send + Sync {
    async fn save(&self, game: &GameEntry) -> Result<()>;
}

/// Lowercase, hyphen-separated slug of a game title.
fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    let mut last_was_hyphen = true;
    for c in name.chars() {
        if c.is_ascii_alphanumeric() {
            slug.push(c.to_ascii_lowercase());
            last_was_hyphen = false;
        } else if !last_was_hyphen {
            slug.push('-');
            last_was_hyphen = true;
        }
    }
    while slug.ends_with('-') {
        slug.pop();
    }
    slug
}
