use std::time::Duration;

use anyhow::Context;
use folio_common::{
    ArticleGateway, ArticleId, ArticlePayload, ArticleRecord, GatewayError, SavedArticle,
};
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;

use crate::infrastructure::settings::HttpGatewaySettings;

/// Persists drafts through the portfolio REST API
#[derive(Clone, Debug)]
pub struct HttpGateway {
    client: Client,
    base_url: String,
    token: Option<String>,
}

impl HttpGateway {
    pub fn new(settings: &HttpGatewaySettings) -> anyhow::Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(settings.timeout_seconds))
            .build()
            .context("failed to create http client")?;

        Ok(Self {
            client,
            base_url: settings.base_url.trim_end_matches('/').to_string(),
            token: settings.token.clone(),
        })
    }

    fn articles_url(&self, id: Option<ArticleId>) -> String {
        match id {
            Some(id) => format!("{}/articles/{}", self.base_url, id),
            None => format!("{}/articles", self.base_url),
        }
    }

    fn request(&self, method: Method, url: String) -> RequestBuilder {
        let request = self.client.request(method, url);
        match &self.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }
}

fn transport_error(e: reqwest::Error) -> GatewayError {
    GatewayError::Transport(e.to_string())
}

/// Map non-success statuses to gateway errors and return the body
async fn read_body(response: Response) -> Result<String, GatewayError> {
    let status = response.status();
    if status == StatusCode::NOT_FOUND {
        return Err(GatewayError::NotFound);
    }

    let body = response.text().await.map_err(transport_error)?;
    if !status.is_success() {
        return Err(GatewayError::Rejected {
            status: status.as_u16(),
            message: body,
        });
    }
    Ok(body)
}

fn decode<T: DeserializeOwned>(body: &str) -> Result<T, GatewayError> {
    serde_json::from_str(body).map_err(|e| GatewayError::Decode(e.to_string()))
}

impl ArticleGateway for HttpGateway {
    async fn create(&self, payload: ArticlePayload) -> Result<SavedArticle, GatewayError> {
        let response = self
            .request(Method::POST, self.articles_url(None))
            .json(&payload)
            .send()
            .await
            .map_err(transport_error)?;

        let body = read_body(response).await?;
        decode(&body)
    }

    async fn update(
        &self,
        id: ArticleId,
        payload: ArticlePayload,
    ) -> Result<SavedArticle, GatewayError> {
        let response = self
            .request(Method::PUT, self.articles_url(Some(id)))
            .json(&payload)
            .send()
            .await
            .map_err(transport_error)?;

        let body = read_body(response).await?;
        // 204 and empty bodies are fine for updates
        if body.trim().is_empty() {
            return Ok(SavedArticle::from_payload(Some(id), &payload));
        }
        let mut saved: SavedArticle = decode(&body)?;
        if saved.id.is_none() {
            saved.id = Some(id);
        }
        Ok(saved)
    }

    async fn fetch(&self, id: ArticleId) -> Result<ArticleRecord, GatewayError> {
        let response = self
            .request(Method::GET, self.articles_url(Some(id)))
            .send()
            .await
            .map_err(transport_error)?;

        let body = read_body(response).await?;
        decode(&body)
    }
}
