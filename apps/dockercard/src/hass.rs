//! Home Assistant REST adapter.

use anyhow::{anyhow, bail, Context, Result};
use async_trait::async_trait;
use card_core::ServiceCaller;
use reqwest::Client;
use serde_json::{Map, Value};
use shared::domain::{EntitySnapshot, EntityState, ServiceCall};
use tracing::{debug, info};
use url::Url;

pub struct HassRestClient {
    http: Client,
    base_url: Url,
    token: String,
}

impl HassRestClient {
    pub fn new(base_url: &str, token: impl Into<String>) -> Result<Self> {
        let mut base_url =
            Url::parse(base_url).with_context(|| format!("invalid Home Assistant url {base_url:?}"))?;
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }
        Ok(Self {
            http: Client::new(),
            base_url,
            token: token.into(),
        })
    }

    fn endpoint(&self, path: &str) -> Result<Url> {
        self.base_url
            .join(path)
            .with_context(|| format!("failed to build url for {path}"))
    }

    pub async fn fetch_states(&self) -> Result<EntitySnapshot> {
        let states: Vec<EntityState> = self
            .http
            .get(self.endpoint("api/states")?)
            .bearer_auth(&self.token)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        info!(entities = states.len(), "fetched entity states");
        Ok(EntitySnapshot::from_states(states))
    }
}

/// Domains and services must be plain identifiers so each stays a single
/// path segment.
fn path_segment<'a>(what: &str, value: &'a str) -> Result<&'a str> {
    let valid = !value.is_empty()
        && value
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
    if !valid {
        bail!("invalid service {what} {value:?}");
    }
    Ok(value)
}

/// The REST endpoint takes a flat body: service data plus the target's
/// `entity_id`/`device_id`/`area_id` fields. Data keys win on conflict.
pub fn request_body(call: &ServiceCall) -> Result<Value> {
    let mut body: Map<String, Value> = call.data.clone();
    match &call.target {
        None | Some(Value::Null) => {}
        Some(Value::Object(target)) => {
            for (key, value) in target {
                body.entry(key.clone()).or_insert_with(|| value.clone());
            }
        }
        Some(other) => return Err(anyhow!("service target must be an object, got {other}")),
    }
    Ok(Value::Object(body))
}

#[async_trait]
impl ServiceCaller for HassRestClient {
    async fn call_service(&self, call: &ServiceCall) -> Result<()> {
        let domain = path_segment("domain", &call.domain)?;
        let service = path_segment("name", &call.service)?;
        let url = self.endpoint(&format!("api/services/{domain}/{service}"))?;
        let body = request_body(call)?;
        debug!(%url, %body, "calling Home Assistant service");
        self.http
            .post(url)
            .bearer_auth(&self.token)
            .json(&body)
            .send()
            .await?
            .error_for_status()
            .with_context(|| format!("{} rejected", call.qualified_name()))?;
        Ok(())
    }
}

#[cfg(test)]
#[path = "tests/hass_tests.rs"]
mod tests;
