use std::time::Duration;

use async_trait::async_trait;
use bourse_models::config::LedgerConfig;
use bourse_models::{AgentDetail, AgentSummary, Instrument, LedgerAction, NewAgent, NewsEvent};
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::client::Ledger;
use crate::envelope::{decode_envelope, error_message};
use crate::error::LedgerError;

/// `data` of `GET /agents/{id}`; loans are not used by the decision pipeline.
#[derive(Debug, Deserialize)]
struct AgentDetailData {
    agent: Option<AgentDetail>,
}

#[derive(Debug, Serialize)]
struct NewsEventBody<'a> {
    news_headline: &'a str,
    news_content: &'a str,
}

/// REST client for the ledger service.
pub struct HttpLedger {
    base_url: String,
    http: Client,
}

impl HttpLedger {
    pub fn new(config: &LedgerConfig) -> Result<Self, LedgerError> {
        let http = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()?;

        Ok(Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            http,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<Option<T>, LedgerError> {
        let url = self.url(path);
        debug!(%url, "GET ledger");
        let response = self.http.get(&url).send().await?;
        read_envelope(response).await
    }

    async fn post<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<Option<T>, LedgerError> {
        let url = self.url(path);
        debug!(%url, "POST ledger");
        let response = self.http.post(&url).json(body).send().await?;
        read_envelope(response).await
    }
}

async fn read_envelope<T: DeserializeOwned>(response: Response) -> Result<Option<T>, LedgerError> {
    let status = response.status();
    let body = response.text().await?;

    if !status.is_success() {
        return Err(LedgerError::Status {
            status: status.as_u16(),
            body: error_message(&body),
        });
    }

    decode_envelope(&body)
}

#[async_trait]
impl Ledger for HttpLedger {
    async fn list_agents(&self) -> Result<Vec<AgentSummary>, LedgerError> {
        Ok(self.get("agents").await?.unwrap_or_default())
    }

    async fn list_instruments(&self) -> Result<Vec<Instrument>, LedgerError> {
        Ok(self.get("stocks").await?.unwrap_or_default())
    }

    async fn agent_detail(&self, agent_id: &str) -> Result<AgentDetail, LedgerError> {
        let data: Option<AgentDetailData> = self.get(&format!("agents/{agent_id}")).await?;
        data.and_then(|d| d.agent)
            .ok_or_else(|| LedgerError::MissingData(format!("agent {agent_id}")))
    }

    async fn create_agent(&self, agent: &NewAgent) -> Result<AgentSummary, LedgerError> {
        let created: Option<AgentSummary> = self.post("agents", agent).await?;
        let created =
            created.ok_or_else(|| LedgerError::MissingData(format!("created agent {}", agent.name)))?;
        info!(name = %agent.name, model = %agent.model, id = %created.id, "Created agent");
        Ok(created)
    }

    async fn submit_action(&self, action: &LedgerAction) -> Result<(), LedgerError> {
        let payload = action.payload()?;
        let _: Option<serde_json::Value> = self
            .post(&format!("agents/{}", action.endpoint()), &payload)
            .await?;
        info!(
            endpoint = action.endpoint(),
            agent_id = %action.agent_id(),
            "Agent action submitted"
        );
        Ok(())
    }

    async fn create_news_event(
        &self,
        headline: &str,
        content: &str,
    ) -> Result<NewsEvent, LedgerError> {
        let body = NewsEventBody {
            news_headline: headline,
            news_content: content,
        };
        let created: Option<NewsEvent> = self.post("news", &body).await?;
        let created = created.ok_or_else(|| LedgerError::MissingData("news event".to_string()))?;
        info!(headline, id = %created.id, "Created news event");
        Ok(created)
    }
}
