use crate::config::ApiConfig;
use crate::error::{AppError, AppResult};
use crate::models::{ListPayload, Listing};
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode, multipart};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::{Arc, RwLock};

/// Query argument for list endpoints called without filters.
pub const NO_QUERY: &[(&str, &str)] = &[];

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct UploadedFile {
    #[serde(alias = "secure_url", alias = "location")]
    pub url: String,
}

/// Gateway to the ticketing backend.
///
/// Clones share the bearer token, so logging in through one handle
/// authenticates every service holding a clone.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
    token: Arc<RwLock<Option<String>>>,
}

impl ApiClient {
    pub fn new(config: &ApiConfig) -> AppResult<Self> {
        let client = Client::builder()
            .user_agent(concat!("ticketdesk/", env!("CARGO_PKG_VERSION")))
            .timeout(config.timeout())
            .build()?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            token: Arc::new(RwLock::new(None)),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn set_token(&self, token: Option<String>) {
        let mut guard = self
            .token
            .write()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        *guard = token;
    }

    pub fn token(&self) -> Option<String> {
        self.token
            .read()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .clone()
    }

    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> AppResult<T> {
        self.execute(self.request(Method::GET, path)).await
    }

    pub async fn get_query<Q, T>(&self, path: &str, query: &Q) -> AppResult<T>
    where
        Q: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.execute(self.request(Method::GET, path).query(query)).await
    }

    /// Any list endpoint, whatever wrapper the backend chose.
    pub async fn get_list<Q, T>(&self, path: &str, query: &Q) -> AppResult<Listing<T>>
    where
        Q: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let payload: ListPayload<T> = self.get_query(path, query).await?;
        Ok(Listing::from(payload))
    }

    pub async fn post<B, T>(&self, path: &str, body: &B) -> AppResult<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.execute(self.request(Method::POST, path).json(body)).await
    }

    pub async fn put<B, T>(&self, path: &str, body: &B) -> AppResult<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.execute(self.request(Method::PUT, path).json(body)).await
    }

    pub async fn patch<B, T>(&self, path: &str, body: &B) -> AppResult<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.execute(self.request(Method::PATCH, path).json(body)).await
    }

    pub async fn delete(&self, path: &str) -> AppResult<()> {
        let response = self.request(Method::DELETE, path).send().await?;
        Self::read_body(response).await.map(|_| ())
    }

    pub async fn upload(
        &self,
        path: &str,
        file_name: &str,
        bytes: Vec<u8>,
        mime: &str,
    ) -> AppResult<UploadedFile> {
        let part = multipart::Part::bytes(bytes)
            .file_name(file_name.to_string())
            .mime_str(mime)?;
        let form = multipart::Form::new().part("file", part);
        self.execute(self.request(Method::POST, path).multipart(form))
            .await
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let url = format!("{}/{}", self.base_url, path.trim_start_matches('/'));
        let builder = self.client.request(method, url);
        match self.token() {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    async fn execute<T: DeserializeOwned>(&self, builder: RequestBuilder) -> AppResult<T> {
        let response = builder.send().await?;
        let body = Self::read_body(response).await?;
        Ok(serde_json::from_value(body)?)
    }

    async fn read_body(response: Response) -> AppResult<Value> {
        let status = response.status();
        let text = response.text().await?;
        let body: Value = if text.trim().is_empty() {
            Value::Null
        } else {
            serde_json::from_str(&text).unwrap_or(Value::String(text))
        };

        if !status.is_success() {
            return Err(error_for_status(status, &body));
        }

        unwrap_envelope(status, body)
    }
}

const PAGE_KEYS: [&str; 4] = ["total", "page", "limit", "totalPages"];

/// `{ success, data, message }` envelopes are unwrapped to `data`.
fn unwrap_envelope(status: StatusCode, body: Value) -> AppResult<Value> {
    let Value::Object(mut map) = body else {
        return Ok(body);
    };

    let is_envelope =
        map.contains_key("data") && (map.contains_key("success") || map.contains_key("message"));
    if !is_envelope {
        return Ok(Value::Object(map));
    }

    if map.get("success").and_then(Value::as_bool) == Some(false) {
        let body = Value::Object(map);
        let message = error_message(&body).unwrap_or_else(|| "Request failed".to_string());
        return Err(AppError::ApiError {
            status: status.as_u16(),
            message,
        });
    }

    // 分页列表：data 旁边带着 total 等字段时整体保留
    let is_page = map.get("data").is_some_and(Value::is_array)
        && PAGE_KEYS.iter().any(|key| map.contains_key(*key));
    if is_page {
        return Ok(Value::Object(map));
    }

    Ok(map.remove("data").unwrap_or(Value::Null))
}

fn error_message(body: &Value) -> Option<String> {
    match body {
        Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
        Value::Object(map) => map
            .get("message")
            .and_then(Value::as_str)
            .or_else(|| map.get("error").and_then(|e| e.get("message")).and_then(Value::as_str))
            .or_else(|| map.get("error").and_then(Value::as_str))
            .map(str::to_string),
        _ => None,
    }
}

fn error_for_status(status: StatusCode, body: &Value) -> AppError {
    let message = error_message(body).unwrap_or_else(|| {
        status
            .canonical_reason()
            .unwrap_or("Request failed")
            .to_string()
    });

    match status {
        StatusCode::UNAUTHORIZED => AppError::AuthError(message),
        StatusCode::FORBIDDEN => AppError::Forbidden,
        StatusCode::NOT_FOUND => AppError::NotFound(message),
        _ => AppError::ApiError {
            status: status.as_u16(),
            message,
        },
    }
}
