use crate::elastic_load::{ElasticLoad, ElasticLoadResults, MapDocument};
use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use elasticsearch::auth::Credentials;
use elasticsearch::cert::CertificateValidation;
use elasticsearch::http::transport::{SingleNodeConnectionPool, TransportBuilder};
use elasticsearch::http::Url;
use elasticsearch::{BulkOperation, BulkOperations, BulkParts, Elasticsearch};
use futures::stream::{FuturesUnordered, StreamExt};
use serde_json::Value;
use tokio::sync::Semaphore;
use tracing::debug;

pub struct BulkElasticLoad {
    client: Elasticsearch,
    index: String,
    batch_size: usize,
    semaphore: Semaphore,
}

impl BulkElasticLoad {
    pub fn builder() -> BulkElasticLoadBuilder {
        BulkElasticLoadBuilder::new()
    }

    /// Sends one batch; document ids continue from `first_id`.
    async fn load_batch(&self, first_id: usize, items: &[MapDocument]) -> Result<ElasticLoadResults> {
        let _permit = self.semaphore.acquire().await.context("bulk loader semaphore closed")?;

        let mut ops = BulkOperations::new();
        for (offset, item) in items.iter().enumerate() {
            ops.push(BulkOperation::create((first_id + offset).to_string(), item))?;
        }

        let response = self
            .client
            .bulk(BulkParts::Index(&self.index))
            .body(vec![ops])
            .send()
            .await
            .with_context(|| format!("bulk request to index '{}' failed", self.index))?;
        let response = response.json::<Value>().await?;
        let tally = summarize_bulk_response(&response)?;
        debug!("batch at id {}: {} created, {} failed", first_id, tally.num_created, tally.num_failed);
        Ok(tally)
    }
}

#[async_trait]
impl ElasticLoad for BulkElasticLoad {
    async fn load(&self, items: &[MapDocument]) -> Result<ElasticLoadResults> {
        let mut responses = items
            .chunks(self.batch_size)
            .enumerate()
            .map(|(n, batch)| self.load_batch(n * self.batch_size + 1, batch))
            .collect::<FuturesUnordered<_>>();

        let mut tally = ElasticLoadResults::default();
        while let Some(result) = responses.next().await {
            tally += result?;
        }
        Ok(tally)
    }
}

/// Counts created and failed items in a `_bulk` response body.
pub fn summarize_bulk_response(response: &Value) -> Result<ElasticLoadResults> {
    let items = response["items"]
        .as_array()
        .ok_or_else(|| anyhow!("bulk response has no 'items' array"))?;
    let mut num_created = 0;
    let mut num_failed = 0;
    for item in items {
        let action = item
            .get("create")
            .or_else(|| item.get("index"))
            .and_then(Value::as_object)
            .ok_or_else(|| anyhow!("found response besides create and index: {}", item))?;
        if action.contains_key("error") {
            num_failed += 1;
        } else {
            num_created += 1;
        }
    }
    Ok(ElasticLoadResults {
        num_failed,
        num_created,
        num_total: num_created + num_failed,
    })
}

pub struct BulkElasticLoadBuilder {
    uri: String,
    credentials: Option<Credentials>,
    index: Option<String>,
    batch_size: usize,
    throttle: usize,
}

const DEFAULT_BATCH_SIZE: usize = 10_000;
const DEFAULT_SIMULTANEOUS_REQUESTS: usize = 1;

impl BulkElasticLoadBuilder {
    pub fn new() -> BulkElasticLoadBuilder {
        BulkElasticLoadBuilder {
            uri: String::from("http://localhost:9200/"),
            credentials: None,
            index: None,
            batch_size: DEFAULT_BATCH_SIZE,
            throttle: DEFAULT_SIMULTANEOUS_REQUESTS,
        }
    }

    pub fn with_uri(mut self, uri: String) -> BulkElasticLoadBuilder {
        self.uri = uri;
        self
    }

    pub fn with_credentials(mut self, credentials: Credentials) -> BulkElasticLoadBuilder {
        self.credentials = Some(credentials);
        self
    }

    pub fn with_index(mut self, index: String) -> BulkElasticLoadBuilder {
        self.index = Some(index);
        self
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> BulkElasticLoadBuilder {
        self.batch_size = batch_size;
        self
    }

    pub fn with_throttle(mut self, throttle: usize) -> BulkElasticLoadBuilder {
        self.throttle = throttle;
        self
    }

    pub fn build(self) -> Result<BulkElasticLoad> {
        let index = self.index.ok_or_else(|| anyhow!("Index name is required."))?;
        if self.batch_size == 0 {
            return Err(anyhow!("Batch size must be at least 1."));
        }
        if self.throttle == 0 {
            return Err(anyhow!("Throttle must allow at least 1 request."));
        }

        let url = Url::parse(&self.uri).with_context(|| format!("Invalid Elasticsearch uri: {}", self.uri))?;
        let conn_pool = SingleNodeConnectionPool::new(url);
        let mut transport_builder = TransportBuilder::new(conn_pool)
            .disable_proxy()
            .cert_validation(CertificateValidation::None);
        if let Some(credentials) = self.credentials {
            transport_builder = transport_builder.auth(credentials);
        }
        let transport = transport_builder.build()?;
        Ok(BulkElasticLoad {
            client: Elasticsearch::new(transport),
            index,
            batch_size: self.batch_size,
            semaphore: Semaphore::new(self.throttle),
        })
    }
}

impl Default for BulkElasticLoadBuilder {
    fn default() -> Self {
        BulkElasticLoadBuilder::new()
    }
}
