//! Retrieval of the three snapshots a run needs.
//!
//! `fetch_all` issues the three requests concurrently and fails closed: if any
//! one fails, no snapshot is returned.

use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::future::Future;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::config::ApiConfig;
use crate::error::{Collection, FetchError};
use crate::types::{Agent, AuthToken, Member, Snapshot, TierPriceEntry};

/// The service boundary the engine reads from.
pub trait DataSource {
    fn fetch_members(&self, token: &AuthToken) -> impl Future<Output = Result<Vec<Member>, FetchError>> + Send;

    fn fetch_agents(&self, token: &AuthToken) -> impl Future<Output = Result<Vec<Agent>, FetchError>> + Send;

    fn fetch_tier_prices(
        &self,
        token: &AuthToken,
    ) -> impl Future<Output = Result<Vec<TierPriceEntry>, FetchError>> + Send;
}

/// Fetch members, agents and tier prices concurrently.
pub async fn fetch_all<S: DataSource>(source: &S, token: &AuthToken) -> Result<Snapshot, FetchError> {
    let (members, agents, tier_prices) = tokio::try_join!(
        source.fetch_members(token),
        source.fetch_agents(token),
        source.fetch_tier_prices(token),
    )?;

    info!(
        members = members.len(),
        agents = agents.len(),
        tiers = tier_prices.len(),
        "Fetched platform snapshot"
    );

    Ok(Snapshot {
        members,
        agents,
        tier_prices,
    })
}

// ── Response decoding ───────────────────────────────────────────────────────

/// Endpoints answer with either a bare array or `{"data": [...]}`.
#[derive(Deserialize)]
#[serde(untagged)]
enum Envelope {
    Bare(Vec<Value>),
    Wrapped { data: Vec<Value> },
}

/// Decode a list body record by record; non-object elements are skipped.
pub fn decode_records<T: DeserializeOwned>(collection: Collection, body: &str) -> Result<Vec<T>, FetchError> {
    let envelope: Envelope =
        serde_json::from_str(body).map_err(|source| FetchError::Decode { collection, source })?;
    let items = match envelope {
        Envelope::Bare(items) | Envelope::Wrapped { data: items } => items,
    };

    let total = items.len();
    let records: Vec<T> = items
        .into_iter()
        .filter_map(|item| serde_json::from_value(item).ok())
        .collect();

    if records.len() < total {
        warn!(
            %collection,
            skipped = total - records.len(),
            "Skipped malformed records"
        );
    }
    Ok(records)
}

// ── HTTP source ─────────────────────────────────────────────────────────────

/// Reads the admin API over HTTP with bearer authentication.
#[derive(Debug, Clone)]
pub struct HttpSource {
    client: reqwest::Client,
    config: ApiConfig,
}

impl HttpSource {
    pub fn new(config: ApiConfig) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .pool_max_idle_per_host(5)
            .build()?;
        Ok(Self { client, config })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.config.base_url.trim_end_matches('/'), path)
    }

    async fn get_list<T: DeserializeOwned>(
        &self,
        collection: Collection,
        path: &str,
        token: &AuthToken,
    ) -> Result<Vec<T>, FetchError> {
        let url = self.url(path);
        debug!(%collection, %url, "Requesting collection");

        let response = self
            .client
            .get(&url)
            .header("Accept", "application/json")
            .bearer_auth(token.expose())
            .send()
            .await
            .map_err(|source| FetchError::Request { collection, source })?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                collection,
                status: status.as_u16(),
            });
        }

        let body = response
            .text()
            .await
            .map_err(|source| FetchError::Request { collection, source })?;

        decode_records(collection, &body)
    }
}

impl DataSource for HttpSource {
    async fn fetch_members(&self, token: &AuthToken) -> Result<Vec<Member>, FetchError> {
        self.get_list(Collection::Members, &self.config.members_path, token)
            .await
    }

    async fn fetch_agents(&self, token: &AuthToken) -> Result<Vec<Agent>, FetchError> {
        self.get_list(Collection::Agents, &self.config.agents_path, token)
            .await
    }

    async fn fetch_tier_prices(&self, token: &AuthToken) -> Result<Vec<TierPriceEntry>, FetchError> {
        self.get_list(Collection::TierPrices, &self.config.tier_prices_path, token)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_bare_and_wrapped_lists() {
        let bare: Vec<TierPriceEntry> =
            decode_records(Collection::TierPrices, r#"[{"tierName": "Gold", "priceInCoins": 500}]"#).unwrap();
        assert_eq!(bare[0].tier_name, "Gold");
        assert_eq!(bare[0].price_in_coins, 500);

        let wrapped: Vec<Agent> = decode_records(
            Collection::Agents,
            r#"{"data": [{"name": "A1", "referralCode": "REF1"}]}"#,
        )
        .unwrap();
        assert_eq!(wrapped[0].referral_code.as_deref(), Some("REF1"));
    }

    #[test]
    fn non_object_elements_are_skipped() {
        let members: Vec<Member> =
            decode_records(Collection::Members, r#"[{"name": "Ada"}, 17, "junk", null, {"name": "Bo"}]"#).unwrap();
        let names: Vec<_> = members.iter().map(|m| m.name.as_str()).collect();
        assert_eq!(names, vec!["Ada", "Bo"]);
    }

    #[test]
    fn undecodable_body_names_the_collection() {
        let err = decode_records::<Member>(Collection::Members, "<html>oops</html>").unwrap_err();
        assert!(matches!(err, FetchError::Decode { collection: Collection::Members, .. }));
    }

    #[test]
    fn url_joins_base_and_path() {
        let source = HttpSource::new(ApiConfig {
            base_url: "https://api.example.com/".into(),
            ..ApiConfig::default()
        })
        .unwrap();
        assert_eq!(source.url("/admin/users"), "https://api.example.com/admin/users");
    }
}
