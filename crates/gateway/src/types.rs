use serde::Deserialize;

use crate::error::GatewayError;

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Article {
    pub id: u64,
    pub title: String,
    pub body: String,
    pub topic_id: u64,
    pub updated_at: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Topic {
    pub id: u64,
    pub name: String,
}

/// The fields of a `PUT /articles/` submission. `user_id` comes from the
/// session context, not the form.
#[derive(Debug, Clone, PartialEq)]
pub struct ArticleUpdate {
    pub id: u64,
    pub title: String,
    pub body: String,
    pub topic_id: u64,
    pub what_changed: String,
}

impl ArticleUpdate {
    /// Required-field check, run before any request is made.
    pub fn validate(&self) -> Result<(), GatewayError> {
        if self.title.trim().is_empty() {
            return Err(GatewayError::Validation { field: "title" });
        }
        if self.body.trim().is_empty() {
            return Err(GatewayError::Validation { field: "body" });
        }
        if self.topic_id == 0 {
            return Err(GatewayError::Validation { field: "topic_id" });
        }
        if self.what_changed.trim().is_empty() {
            return Err(GatewayError::Validation { field: "what_changed" });
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiError {
    #[serde(default)]
    pub error: bool,
    #[serde(default)]
    pub message: String,
}

/// Every endpoint answers with this shape; the `error.error` flag decides
/// whether `data` is meaningful.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiEnvelope<T> {
    pub data: Option<T>,
    #[serde(default)]
    pub error: Option<ApiError>,
}

impl<T> ApiEnvelope<T> {
    pub fn into_result(self) -> Result<T, GatewayError> {
        if let Some(error) = self.error {
            if error.error {
                return Err(GatewayError::Api {
                    message: error.message,
                });
            }
        }
        self.data.ok_or_else(|| GatewayError::Api {
            message: "response carried no data".to_string(),
        })
    }
}
