use http::HeaderName;
use tracing::debug;

use crate::error::GatewayError;
use crate::types::{ApiEnvelope, Article, ArticleUpdate, Topic};

static X_ACCESS_TOKEN: HeaderName = HeaderName::from_static("x-access-token");

/// Credentials for the article API, passed explicitly by the caller rather
/// than read from ambient storage.
#[derive(Debug, Clone)]
pub struct SessionContext {
    pub token: String,
    pub user_id: String,
}

#[derive(Debug, Clone)]
pub struct ArticleGateway {
    http: reqwest::Client,
    base_url: String,
    context: SessionContext,
}

impl ArticleGateway {
    pub fn new(base_url: impl Into<String>, context: SessionContext) -> Self {
        Self::with_client(reqwest::Client::new(), base_url, context)
    }

    pub fn with_client(
        http: reqwest::Client,
        base_url: impl Into<String>,
        context: SessionContext,
    ) -> Self {
        let mut base_url = base_url.into();
        while base_url.ends_with('/') {
            base_url.pop();
        }
        Self {
            http,
            base_url,
            context,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    pub async fn fetch_article(&self, id: u64) -> Result<Article, GatewayError> {
        debug!(id, "fetching article");
        let response = self
            .http
            .get(self.url(&format!("/articles/{id}")))
            .header(&X_ACCESS_TOKEN, self.context.token.as_str())
            .send()
            .await?;
        let body = response.bytes().await?;
        let envelope: ApiEnvelope<Article> = serde_json::from_slice(&body)?;
        envelope.into_result()
    }

    pub async fn fetch_topics(&self) -> Result<Vec<Topic>, GatewayError> {
        debug!("fetching topics");
        let response = self
            .http
            .get(self.url("/topics"))
            .header(&X_ACCESS_TOKEN, self.context.token.as_str())
            .send()
            .await?;
        let body = response.bytes().await?;
        let envelope: ApiEnvelope<Vec<Topic>> = serde_json::from_slice(&body)?;
        envelope.into_result()
    }

    pub async fn update_article(&self, update: &ArticleUpdate) -> Result<Article, GatewayError> {
        update.validate()?;
        debug!(id = update.id, "updating article");
        let form = [
            ("id", update.id.to_string()),
            ("title", update.title.clone()),
            ("body", update.body.clone()),
            ("topic_id", update.topic_id.to_string()),
            ("user_id", self.context.user_id.clone()),
            ("what_changed", update.what_changed.clone()),
        ];
        let response = self
            .http
            .put(self.url("/articles/"))
            .header(&X_ACCESS_TOKEN, self.context.token.as_str())
            .form(&form)
            .send()
            .await?;
        let body = response.bytes().await?;
        let envelope: ApiEnvelope<Article> = serde_json::from_slice(&body)?;
        envelope.into_result()
    }
}
