//! Entitlement sync protocol
//!
//! Fetches the user's full game entitlement list from the Amazon
//! software-distribution service (SDS). The endpoint is RPC-shaped: a
//! fixed fully-qualified operation name rides in the `X-Amz-Target`
//! header and the access token in a custom `x-amzn-token` header. Results
//! are page-cursored: the server hands back an opaque `nextToken` while
//! more pages remain, and the client must not assume anything about its
//! shape. A failure on any page aborts the whole fetch — partial results
//! are never returned.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use sha2::{Digest, Sha256};
use tracing::{debug, info};

use crate::error::{Error, Result};

/// Fully-qualified RPC target of the entitlement list operation.
pub const SDS_TARGET: &str = "com.amazonaws.gearbox.softwaredistribution.service.model.SoftwareDistributionService.GetEntitlementsV2";

/// Fixed key id the launcher sends with every sync request.
const SYNC_KEY_ID: &str = "d5dc8b8b-86c8-4fc4-ae93-18c0def5314d";

/// Entitlements requested per page.
const PAGE_SIZE: u32 = 50;

/// One game entitlement as returned by the server.
///
/// Opaque beyond `id` and `product.title`; everything else is carried
/// through untouched so the cache file holds the raw records.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Entitlement {
    pub id: Value,
    #[serde(default)]
    pub product: Product,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Product {
    #[serde(default)]
    pub title: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Request envelope for one `GetEntitlementsV2` page.
#[derive(Debug, Serialize)]
struct SyncRequest<'a> {
    #[serde(rename = "Operation")]
    operation: &'static str,
    #[serde(rename = "clientId")]
    client_id: &'static str,
    #[serde(rename = "syncPoint")]
    sync_point: Option<()>,
    #[serde(rename = "nextToken")]
    next_token: Option<&'a str>,
    #[serde(rename = "maxResults")]
    max_results: u32,
    #[serde(rename = "productIdFilter")]
    product_id_filter: Option<()>,
    #[serde(rename = "keyId")]
    key_id: &'static str,
    #[serde(rename = "hardwareHash")]
    hardware_hash: &'a str,
}

/// One page of the entitlement list.
#[derive(Debug, Deserialize)]
struct EntitlementsPage {
    #[serde(default)]
    entitlements: Vec<Entitlement>,
    #[serde(rename = "nextToken")]
    next_token: Option<String>,
}

/// Uppercase hex SHA-256 of the device serial.
///
/// Binds each sync request to the device registered during login; the
/// serial comes from the server-confirmed `device_serial_number`, not the
/// locally derived one.
pub fn hardware_hash(serial: &str) -> String {
    let digest = Sha256::digest(serial.as_bytes());
    let mut hex = String::with_capacity(64);
    for b in digest {
        hex.push_str(&format!("{b:02X}"));
    }
    hex
}

/// Fetch the complete entitlement list, following the page cursor.
///
/// Pages are accumulated in arrival order. Any transport or decode
/// failure aborts the entire fetch and discards pages already received;
/// the caller must not cache a partial list.
pub async fn fetch_entitlements(
    client: &reqwest::Client,
    sds_base: &str,
    access_token: &str,
    device_serial: &str,
) -> Result<Vec<Entitlement>> {
    let hash = hardware_hash(device_serial);
    let mut games = Vec::new();
    let mut next_token: Option<String> = None;

    loop {
        let body = SyncRequest {
            operation: "GetEntitlementsV2",
            client_id: "Sonic",
            sync_point: None,
            next_token: next_token.as_deref(),
            max_results: PAGE_SIZE,
            product_id_filter: None,
            key_id: SYNC_KEY_ID,
            hardware_hash: &hash,
        };

        let page = request_sds(client, sds_base, SDS_TARGET, access_token, &body).await?;
        debug!(count = page.entitlements.len(), "received entitlement page");
        games.extend(page.entitlements);

        match page.next_token {
            Some(token) => {
                info!("got next token in response, making next request");
                next_token = Some(token);
            }
            None => break,
        }
    }

    info!(total = games.len(), "entitlement fetch complete");
    Ok(games)
}

/// POST one RPC call to the software-distribution service.
async fn request_sds(
    client: &reqwest::Client,
    sds_base: &str,
    target: &str,
    access_token: &str,
    body: &SyncRequest<'_>,
) -> Result<EntitlementsPage> {
    let url = format!("{sds_base}/amazon/");
    let response = client
        .post(&url)
        .header("X-Amz-Target", target)
        .header("x-amzn-token", access_token)
        .header("User-Agent", ags_auth::SDS_USER_AGENT)
        .header("UserAgent", ags_auth::SDS_USER_AGENT)
        .header("Content-Encoding", "amz-1.0")
        .json(body)
        .send()
        .await
        .map_err(|e| Error::Http(format!("sync request failed: {e}")))?;

    let status = response.status();
    if !status.is_success() {
        let body = response
            .text()
            .await
            .unwrap_or_else(|_| String::from("<no body>"));
        return Err(Error::Sync(format!(
            "sds endpoint returned {status}: {body}"
        )));
    }

    response
        .json::<EntitlementsPage>()
        .await
        .map_err(|e| Error::Sync(format!("invalid sync response: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn entitlement(id: u64, title: &str) -> Value {
        json!({"id": id, "product": {"title": title}})
    }

    #[test]
    fn hardware_hash_matches_known_vector() {
        assert_eq!(
            hardware_hash("FEEDBEEF"),
            "08870C3060EDA43A2D0102D13CADD6C609C79991E174EE4535F662FF0FB80659"
        );
    }

    #[test]
    fn sync_request_serializes_launcher_envelope() {
        let body = SyncRequest {
            operation: "GetEntitlementsV2",
            client_id: "Sonic",
            sync_point: None,
            next_token: None,
            max_results: PAGE_SIZE,
            product_id_filter: None,
            key_id: SYNC_KEY_ID,
            hardware_hash: "ABCD",
        };
        let value = serde_json::to_value(&body).unwrap();
        assert_eq!(
            value,
            json!({
                "Operation": "GetEntitlementsV2",
                "clientId": "Sonic",
                "syncPoint": null,
                "nextToken": null,
                "maxResults": 50,
                "productIdFilter": null,
                "keyId": "d5dc8b8b-86c8-4fc4-ae93-18c0def5314d",
                "hardwareHash": "ABCD",
            })
        );
    }

    #[tokio::test]
    async fn single_page_fetch() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/amazon/"))
            .and(header("X-Amz-Target", SDS_TARGET))
            .and(header("x-amzn-token", "Atna|access"))
            .and(header("Content-Encoding", "amz-1.0"))
            .and(body_partial_json(json!({
                "Operation": "GetEntitlementsV2",
                "clientId": "Sonic",
                "maxResults": 50,
                "hardwareHash": hardware_hash("FEEDBEEF"),
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "entitlements": [entitlement(1, "Game One")]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = reqwest::Client::new();
        let games = fetch_entitlements(&client, &server.uri(), "Atna|access", "FEEDBEEF")
            .await
            .unwrap();
        assert_eq!(games.len(), 1);
        assert_eq!(games[0].product.title, "Game One");
    }

    #[tokio::test]
    async fn three_pages_accumulate_in_order() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/amazon/"))
            .and(body_partial_json(json!({"nextToken": null})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "entitlements": [entitlement(1, "A"), entitlement(2, "B")],
                "nextToken": "cursor-2"
            })))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/amazon/"))
            .and(body_partial_json(json!({"nextToken": "cursor-2"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "entitlements": [entitlement(3, "C")],
                "nextToken": "cursor-3"
            })))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/amazon/"))
            .and(body_partial_json(json!({"nextToken": "cursor-3"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "entitlements": [entitlement(4, "D")]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = reqwest::Client::new();
        let games = fetch_entitlements(&client, &server.uri(), "Atna|access", "FEEDBEEF")
            .await
            .unwrap();

        let titles: Vec<&str> = games.iter().map(|g| g.product.title.as_str()).collect();
        assert_eq!(titles, vec!["A", "B", "C", "D"]);
    }

    #[tokio::test]
    async fn failure_mid_fetch_discards_partial_results() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/amazon/"))
            .and(body_partial_json(json!({"nextToken": null})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "entitlements": [entitlement(1, "A")],
                "nextToken": "cursor-2"
            })))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/amazon/"))
            .and(body_partial_json(json!({"nextToken": "cursor-2"})))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let client = reqwest::Client::new();
        let result = fetch_entitlements(&client, &server.uri(), "Atna|access", "FEEDBEEF").await;
        assert!(matches!(result, Err(Error::Sync(_))));
    }

    #[tokio::test]
    async fn empty_library_is_ok() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/amazon/"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"entitlements": []})))
            .mount(&server)
            .await;

        let client = reqwest::Client::new();
        let games = fetch_entitlements(&client, &server.uri(), "t", "S")
            .await
            .unwrap();
        assert!(games.is_empty());
    }

    #[test]
    fn entitlement_roundtrip_preserves_raw_record() {
        let raw = json!({
            "id": 99,
            "product": {
                "title": "Chasm",
                "productDetail": {"details": {"logoUrl": "https://img/c.jpg"}}
            },
            "grantDate": "2023-01-01T00:00:00Z"
        });
        let parsed: Entitlement = serde_json::from_value(raw.clone()).unwrap();
        assert_eq!(serde_json::to_value(&parsed).unwrap(), raw);
    }
}
