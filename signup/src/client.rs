use std::fmt;

use async_trait::async_trait;
use reqwest::{IntoUrl, Method, RequestBuilder, Response};
use serde::{Deserialize, Deserializer, Serialize};

use crate::form::{FormFields, Mode};
use crate::validation::SERVER_ERROR;

pub const LOGIN_PATH: &str = "/api/auth/login";
pub const REGISTER_PATH: &str = "/api/auth/register";
pub const PRODUCTS_PATH: &str = "/api/products";

#[derive(Clone, PartialEq, Eq, Serialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub full_name: String,
    pub email: String,
    pub phone: String,
    pub password: String,
}

/// Body of an authentication request. The password confirmation is never sent.
#[derive(Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum AuthRequest {
    Login(LoginRequest),
    Register(RegisterRequest),
}

impl AuthRequest {
    pub fn new(fields: &FormFields, mode: Mode) -> Self {
        match mode {
            Mode::Login => Self::Login(LoginRequest {
                email: fields.email.clone(),
                password: fields.password.clone(),
            }),
            Mode::Register => Self::Register(RegisterRequest {
                full_name: fields.full_name.clone(),
                email: fields.email.clone(),
                phone: fields.phone.clone(),
                password: fields.password.clone(),
            }),
        }
    }

    pub fn path(&self) -> &'static str {
        match self {
            Self::Login(_) => LOGIN_PATH,
            Self::Register(_) => REGISTER_PATH,
        }
    }

    pub fn email(&self) -> &str {
        match self {
            Self::Login(r) => &r.email,
            Self::Register(r) => &r.email,
        }
    }
}

impl fmt::Debug for AuthRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Login(r) => f
                .debug_struct("Login")
                .field("email", &r.email)
                .field("password", &"REDACTED")
                .finish(),
            Self::Register(r) => f
                .debug_struct("Register")
                .field("full_name", &r.full_name)
                .field("email", &r.email)
                .field("phone", &r.phone)
                .field("password", &"REDACTED")
                .finish(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct TokenResponse {
    pub token: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ErrorResponse {
    pub message: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Product {
    #[serde(deserialize_with = "deserialize_id")]
    pub id: String,
    pub title: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ProductsResponse {
    pub products: Vec<Product>,
}

// Product ids are either JSON strings or numbers depending on the backend.
fn deserialize_id<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawId {
        Str(String),
        Num(serde_json::Number),
    }
    Ok(match RawId::deserialize(deserializer)? {
        RawId::Str(s) => s,
        RawId::Num(n) => n.to_string(),
    })
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ClientError {
    #[error("Transport error: {0}")]
    Transport(String),
    #[error("Server responded with status {status}: {}", .message.as_deref().unwrap_or("no message"))]
    Server {
        status: u16,
        message: Option<String>,
    },
    #[error("Unexpected response body: {0}")]
    Decode(String),
}

impl ClientError {
    /// The message to display to the user for a failed submission.
    pub fn user_message(&self) -> String {
        match self {
            Self::Server {
                message: Some(m), ..
            } => m.clone(),
            _ => SERVER_ERROR.to_string(),
        }
    }
}

impl From<reqwest::Error> for ClientError {
    fn from(error: reqwest::Error) -> Self {
        if error.is_decode() {
            Self::Decode(error.to_string())
        } else {
            Self::Transport(error.to_string())
        }
    }
}

#[async_trait]
trait ResponseExt {
    async fn check_success(self) -> Result<Self, ClientError>
    where
        Self: Sized;
}

#[async_trait]
impl ResponseExt for Response {
    async fn check_success(self) -> Result<Self, ClientError> {
        let status = self.status();
        if status.is_success() {
            return Ok(self);
        }
        // A body that is not the expected JSON carries no usable message.
        let message = self
            .json::<ErrorResponse>()
            .await
            .ok()
            .and_then(|r| r.message);
        Err(ClientError::Server {
            status: status.as_u16(),
            message,
        })
    }
}

/// Client of the remote authentication and products API.
#[derive(Debug, Clone)]
pub struct AuthClient {
    http: reqwest::Client,
    base_url: String,
}

impl AuthClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url: String = base_url.into();
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    fn request<U: IntoUrl>(&self, method: Method, url: U) -> RequestBuilder {
        self.http.request(method, url)
    }

    /// Log in or register, returning the session token.
    pub async fn authenticate(&self, request: &AuthRequest) -> Result<String, ClientError> {
        let url = format!("{}{}", self.base_url, request.path());
        tracing::debug!("Sending authentication request to {}: {:?}", url, request);
        let response = self
            .request(Method::POST, &url)
            .header("Content-Type", "application/json")
            .json(request)
            .send()
            .await?
            .check_success()
            .await?;

        let TokenResponse { token } = response.json().await?;
        Ok(token)
    }

    pub async fn products(&self, token: &str) -> Result<Vec<Product>, ClientError> {
        let url = format!("{}{}", self.base_url, PRODUCTS_PATH);
        tracing::debug!("Fetching products from {}", url);
        let response = self
            .request(Method::GET, &url)
            .bearer_auth(token)
            .send()
            .await?
            .check_success()
            .await?;

        let ProductsResponse { products } = response.json().await?;
        Ok(products)
    }
}
