// Backend REST API client
// The backend wraps payloads in a {success, data, message} envelope; some
// endpoints return the payload bare and the client wraps those itself

use async_trait::async_trait;
use reqwest::Method;
use serde::de::DeserializeOwned;
use std::sync::Arc;
use thiserror::Error;

use crate::models::{AuthPayload, Tour, TourPayload, User, UserRole};
use crate::storage::{KeyValueStore, TOKEN_KEY};

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("api error: {status} - {message}")]
    Response { status: u16, message: String },

    #[error("malformed response: {0}")]
    Malformed(String),
}

#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub base_url: String,
    pub timeout_ms: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:5000/api".to_string(),
            timeout_ms: 10_000,
        }
    }
}

// Backend collaborator consumed by the auth session and the dashboard.
// Implemented over HTTP by RestClient; tests use an in-process mock.
#[async_trait]
pub trait BackendApi: Send + Sync + 'static {
    async fn login(&self, email: &str, password: &str) -> Result<AuthPayload, ApiError>;
    async fn register(&self, name: &str, email: &str, password: &str)
        -> Result<AuthPayload, ApiError>;
    async fn me(&self) -> Result<User, ApiError>;

    async fn list_tours(&self) -> Result<Vec<Tour>, ApiError>;
    async fn my_tours(&self) -> Result<Vec<Tour>, ApiError>;
    async fn create_tour(&self, tour: &TourPayload) -> Result<Tour, ApiError>;
    async fn update_tour(&self, id: &str, tour: &TourPayload) -> Result<Tour, ApiError>;
    async fn delete_tour(&self, id: &str) -> Result<(), ApiError>;

    async fn list_users(&self) -> Result<Vec<User>, ApiError>;
    async fn update_user_role(&self, id: &str, role: UserRole) -> Result<User, ApiError>;
    async fn delete_user(&self, id: &str) -> Result<(), ApiError>;
}

// Decode a response body, unwrapping the envelope when present.
// Bare payloads from older endpoints are treated as a successful envelope.
fn decode_body<T: DeserializeOwned>(status: u16, body: &str) -> Result<T, ApiError> {
    let value: serde_json::Value = serde_json::from_str(body)
        .map_err(|e| ApiError::Malformed(format!("invalid json: {}", e)))?;

    let message = value
        .get("message")
        .and_then(|m| m.as_str())
        .unwrap_or("request failed")
        .to_string();

    if !(200..300).contains(&status) {
        return Err(ApiError::Response { status, message });
    }

    let success = value.get("success").and_then(|s| s.as_bool());
    if success == Some(false) {
        return Err(ApiError::Response { status, message });
    }

    // the envelope is only present when a data field exists; anything else is
    // a bare payload and gets wrapped as-is
    if success == Some(true) {
        if let Some(data) = value.get("data") {
            return serde_json::from_value(data.clone())
                .map_err(|e| ApiError::Malformed(e.to_string()));
        }
    }

    serde_json::from_value(value).map_err(|e| ApiError::Malformed(e.to_string()))
}

pub struct RestClient {
    http: reqwest::Client,
    config: ClientConfig,
    store: Arc<dyn KeyValueStore>,
}

impl RestClient {
    pub fn new(config: ClientConfig, store: Arc<dyn KeyValueStore>) -> Result<Self, ApiError> {
        let http = reqwest::Client::builder()
            .timeout(std::time::Duration::from_millis(config.timeout_ms))
            .build()?;
        Ok(Self {
            http,
            config,
            store,
        })
    }

    async fn request<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        body: Option<serde_json::Value>,
    ) -> Result<T, ApiError> {
        let url = format!("{}{}", self.config.base_url, path);
        let mut request = self.http.request(method.clone(), &url);

        // attach the stored bearer token when present
        if let Some(token) = self.store.get(TOKEN_KEY) {
            request = request.bearer_auth(token);
        }
        if let Some(body) = body {
            request = request.json(&body);
        }

        let response = request.send().await?;
        let status = response.status().as_u16();
        let text = response.text().await?;

        decode_body(status, &text).map_err(|e| {
            tracing::error!(%method, path, error = %e, "api request failed");
            e
        })
    }
}

#[async_trait]
impl BackendApi for RestClient {
    async fn login(&self, email: &str, password: &str) -> Result<AuthPayload, ApiError> {
        let body = serde_json::json!({ "email": email, "password": password });
        self.request(Method::POST, "/auth/login", Some(body)).await
    }

    async fn register(
        &self,
        name: &str,
        email: &str,
        password: &str,
    ) -> Result<AuthPayload, ApiError> {
        let body = serde_json::json!({ "name": name, "email": email, "password": password });
        self.request(Method::POST, "/auth/register", Some(body))
            .await
    }

    async fn me(&self) -> Result<User, ApiError> {
        self.request(Method::GET, "/auth/me", None).await
    }

    async fn list_tours(&self) -> Result<Vec<Tour>, ApiError> {
        self.request(Method::GET, "/tours", None).await
    }

    async fn my_tours(&self) -> Result<Vec<Tour>, ApiError> {
        self.request(Method::GET, "/tours/my", None).await
    }

    async fn create_tour(&self, tour: &TourPayload) -> Result<Tour, ApiError> {
        let body = serde_json::to_value(tour).map_err(|e| ApiError::Malformed(e.to_string()))?;
        self.request(Method::POST, "/tours", Some(body)).await
    }

    async fn update_tour(&self, id: &str, tour: &TourPayload) -> Result<Tour, ApiError> {
        let body = serde_json::to_value(tour).map_err(|e| ApiError::Malformed(e.to_string()))?;
        self.request(Method::PUT, &format!("/tours/{}", id), Some(body))
            .await
    }

    async fn delete_tour(&self, id: &str) -> Result<(), ApiError> {
        let _: serde_json::Value = self
            .request(Method::DELETE, &format!("/tours/{}", id), None)
            .await?;
        Ok(())
    }

    async fn list_users(&self) -> Result<Vec<User>, ApiError> {
        self.request(Method::GET, "/users", None).await
    }

    async fn update_user_role(&self, id: &str, role: UserRole) -> Result<User, ApiError> {
        let body = serde_json::json!({ "role": role });
        self.request(Method::PATCH, &format!("/users/{}/role", id), Some(body))
            .await
    }

    async fn delete_user(&self, id: &str) -> Result<(), ApiError> {
        let _: serde_json::Value = self
            .request(Method::DELETE, &format!("/users/{}", id), None)
            .await?;
        Ok(())
    }
}


#[cfg(test)]
mod tests {
    use super::mock_backend::MockBackend;
    use super::*;
    use crate::models::UserRole;
    use crate::storage::MemoryStore;
    use test_case::test_case;

    #[test]
    fn test_decode_enveloped_payload() {
        let body = r#"{"success": true, "data": {"user": {"id": "u1", "email": "a@b.kz", "name": "Aida", "role": "USER"}, "token": "tok"}}"#;
        let payload: AuthPayload = decode_body(200, body).unwrap();
        assert_eq!(payload.token, "tok");
        assert_eq!(payload.user.name, "Aida");
    }

    #[test]
    fn test_decode_wraps_bare_payload() {
        // older endpoints return the payload without an envelope
        let body = r#"[{"id": "t1", "title": "Trek", "description": "d", "priceFrom": 10.0,
            "location": "Almaty", "duration": "1 day", "difficulty": "Easy", "rating": 4.0}]"#;
        let tours: Vec<Tour> = decode_body(200, body).unwrap();
        assert_eq!(tours.len(), 1);
        assert_eq!(tours[0].id, "t1");
    }

    #[test_case(401, r#"{"success": false, "message": "Invalid credentials"}"#, "Invalid credentials"; "#1 error status with message")]
    #[test_case(200, r#"{"success": false, "message": "Nope"}"#, "Nope"; "#2 unsuccessful envelope on ok status")]
    #[test_case(500, r#"{}"#, "request failed"; "#3 missing message falls back")]
    fn test_decode_error_responses(status: u16, body: &str, expected_message: &str) {
        let result: Result<Vec<Tour>, ApiError> = decode_body(status, body);
        match result {
            Err(ApiError::Response { message, .. }) => assert_eq!(message, expected_message),
            other => panic!("expected response error, got {:?}", other.err()),
        }
    }

    #[test]
    fn test_decode_envelope_without_data() {
        // delete endpoints acknowledge with a bare success flag
        let value: serde_json::Value = decode_body(200, r#"{"success": true}"#).unwrap();
        assert_eq!(value["success"], true);
    }

    #[test]
    fn test_decode_rejects_invalid_json() {
        let result: Result<Vec<Tour>, ApiError> = decode_body(200, "<html>oops</html>");
        assert!(matches!(result, Err(ApiError::Malformed(_))));
    }

    #[tokio::test]
    async fn test_mock_backend_auth_and_tours_flow() {
        let store = Arc::new(MemoryStore::new());
        let backend = MockBackend::new(Arc::clone(&store) as Arc<dyn KeyValueStore>);

        let payload = backend
            .register("Aida", "aida@steppe.kz", "secret")
            .await
            .unwrap();
        store.set(TOKEN_KEY, &payload.token);

        let me = backend.me().await.unwrap();
        assert_eq!(me.email, "aida@steppe.kz");
        assert_eq!(me.role, UserRole::User);

        let created = backend
            .create_tour(&TourPayload {
                title: Some("Kolsai Lakes".to_string()),
                price_from: Some(150.0),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(created.title, "Kolsai Lakes");

        let mine = backend.my_tours().await.unwrap();
        assert_eq!(mine.len(), 1);

        backend.delete_tour(&created.id).await.unwrap();
        assert!(backend.list_tours().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_mock_backend_rejects_missing_token() {
        let store = Arc::new(MemoryStore::new());
        let backend = MockBackend::new(store);
        let result = backend.me().await;
        assert!(matches!(
            result,
            Err(ApiError::Response { status: 401, .. })
        ));
    }
}
