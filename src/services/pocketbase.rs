use std::time::{Duration, SystemTime, UNIX_EPOCH};

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use reqwest::{Client, Method};
use serde_json::{json, Value};
use tokio::sync::RwLock;

use crate::services::env::required_env;
use crate::services::error::{remote_error, ApiError};

/// Refresh the superuser token once it is within this margin of expiry.
const REFRESH_MARGIN: Duration = Duration::from_secs(5 * 60);

/// Lifetime assumed when the token's `exp` claim cannot be decoded.
const FALLBACK_LIFETIME: Duration = Duration::from_secs(60 * 60);

#[derive(Debug, Clone)]
pub struct PocketBaseConfig {
    pub host: String,
    pub admin_email: String,
    pub admin_password: String,
}

impl PocketBaseConfig {
    pub fn from_env() -> Result<Self, ApiError> {
        Ok(Self {
            host: required_env(
                "POCKETBASE_HOST",
                "Set it to your PocketBase base URL, e.g. 'https://pb.example.com'.",
            )?
            .trim_end_matches('/')
            .to_string(),
            admin_email: required_env(
                "POCKETBASE_ADMIN_EMAIL",
                "Set it to the PocketBase admin email address.",
            )?,
            admin_password: required_env(
                "POCKETBASE_ADMIN_PASSWORD",
                "Set it to the PocketBase admin password.",
            )?,
        })
    }
}

#[derive(Debug, Clone)]
struct AuthToken {
    value: String,
    expires_at: SystemTime,
}

/// Query options for record listing.
#[derive(Debug, Default)]
pub struct ListRecordsQuery {
    pub filter: Option<String>,
    pub sort: Option<String>,
    pub expand: Option<String>,
    pub fields: Option<String>,
    pub page: u64,
    pub per_page: u64,
}

/// PocketBase admin API client.
///
/// Holds a short-lived superuser token obtained via the password auth
/// endpoint; the token is refreshed transparently before each request when
/// it is close to expiring. Tools never see this credential.
pub struct PocketBaseService {
    config: PocketBaseConfig,
    http: Client,
    auth: RwLock<Option<AuthToken>>,
}

impl PocketBaseService {
    pub fn from_env() -> Result<Self, ApiError> {
        Ok(Self::new(PocketBaseConfig::from_env()?))
    }

    pub fn new(config: PocketBaseConfig) -> Self {
        Self {
            config,
            http: Client::new(),
            auth: RwLock::new(None),
        }
    }

    pub async fn list_collections(&self) -> Result<Value, ApiError> {
        self.request(Method::GET, "/api/collections", &[], None).await
    }

    pub async fn get_collection(&self, id: &str) -> Result<Value, ApiError> {
        self.request(
            Method::GET,
            &format!("/api/collections/{}", urlencoding::encode(id)),
            &[],
            None,
        )
        .await
    }

    pub async fn create_collection(&self, data: Value) -> Result<Value, ApiError> {
        self.request(Method::POST, "/api/collections", &[], Some(data)).await
    }

    pub async fn update_collection(&self, id: &str, data: Value) -> Result<Value, ApiError> {
        self.request(
            Method::PATCH,
            &format!("/api/collections/{}", urlencoding::encode(id)),
            &[],
            Some(data),
        )
        .await
    }

    pub async fn delete_collection(&self, id: &str) -> Result<Value, ApiError> {
        self.request(
            Method::DELETE,
            &format!("/api/collections/{}", urlencoding::encode(id)),
            &[],
            None,
        )
        .await
    }

    pub async fn truncate_collection(&self, id: &str) -> Result<Value, ApiError> {
        self.request(
            Method::DELETE,
            &format!("/api/collections/{}/truncate", urlencoding::encode(id)),
            &[],
            None,
        )
        .await
    }

    pub async fn list_records(
        &self,
        collection: &str,
        query: ListRecordsQuery,
    ) -> Result<Value, ApiError> {
        let mut params = vec![
            ("page", query.page.to_string()),
            ("perPage", query.per_page.to_string()),
        ];
        if let Some(filter) = query.filter {
            params.push(("filter", filter));
        }
        if let Some(sort) = query.sort {
            params.push(("sort", sort));
        }
        if let Some(expand) = query.expand {
            params.push(("expand", expand));
        }
        if let Some(fields) = query.fields {
            params.push(("fields", fields));
        }

        self.request(
            Method::GET,
            &format!("/api/collections/{}/records", urlencoding::encode(collection)),
            &params,
            None,
        )
        .await
    }

    pub async fn get_record(
        &self,
        collection: &str,
        id: &str,
        expand: Option<&str>,
        fields: Option<&str>,
    ) -> Result<Value, ApiError> {
        let mut params: Vec<(&str, String)> = Vec::new();
        if let Some(expand) = expand {
            params.push(("expand", expand.to_string()));
        }
        if let Some(fields) = fields {
            params.push(("fields", fields.to_string()));
        }

        self.request(
            Method::GET,
            &format!(
                "/api/collections/{}/records/{}",
                urlencoding::encode(collection),
                urlencoding::encode(id)
            ),
            &params,
            None,
        )
        .await
    }

    pub async fn create_record(&self, collection: &str, data: Value) -> Result<Value, ApiError> {
        self.request(
            Method::POST,
            &format!("/api/collections/{}/records", urlencoding::encode(collection)),
            &[],
            Some(data),
        )
        .await
    }

    pub async fn update_record(
        &self,
        collection: &str,
        id: &str,
        data: Value,
    ) -> Result<Value, ApiError> {
        self.request(
            Method::PATCH,
            &format!(
                "/api/collections/{}/records/{}",
                urlencoding::encode(collection),
                urlencoding::encode(id)
            ),
            &[],
            Some(data),
        )
        .await
    }

    pub async fn delete_record(&self, collection: &str, id: &str) -> Result<Value, ApiError> {
        self.request(
            Method::DELETE,
            &format!(
                "/api/collections/{}/records/{}",
                urlencoding::encode(collection),
                urlencoding::encode(id)
            ),
            &[],
            None,
        )
        .await
    }

    pub async fn get_settings(&self) -> Result<Value, ApiError> {
        self.request(Method::GET, "/api/settings", &[], None).await
    }

    pub async fn update_settings(&self, data: Value) -> Result<Value, ApiError> {
        self.request(Method::PATCH, "/api/settings", &[], Some(data)).await
    }

    pub async fn test_s3(&self, filesystem: &str) -> Result<Value, ApiError> {
        self.request(
            Method::POST,
            "/api/settings/test/s3",
            &[],
            Some(json!({ "filesystem": filesystem })),
        )
        .await
    }

    pub async fn test_email(&self, email: &str, template: &str) -> Result<Value, ApiError> {
        self.request(
            Method::POST,
            "/api/settings/test/email",
            &[],
            Some(json!({ "email": email, "template": template })),
        )
        .await
    }

    pub async fn list_logs(
        &self,
        filter: Option<&str>,
        page: u64,
        per_page: u64,
    ) -> Result<Value, ApiError> {
        let mut params = vec![("page", page.to_string()), ("perPage", per_page.to_string())];
        if let Some(filter) = filter {
            params.push(("filter", filter.to_string()));
        }
        self.request(Method::GET, "/api/logs", &params, None).await
    }

    pub async fn get_log(&self, id: &str) -> Result<Value, ApiError> {
        self.request(
            Method::GET,
            &format!("/api/logs/{}", urlencoding::encode(id)),
            &[],
            None,
        )
        .await
    }

    pub async fn get_log_stats(&self, filter: Option<&str>) -> Result<Value, ApiError> {
        let mut params: Vec<(&str, String)> = Vec::new();
        if let Some(filter) = filter {
            params.push(("filter", filter.to_string()));
        }
        self.request(Method::GET, "/api/logs/stats", &params, None).await
    }

    /// Pure URL construction; no request is made.
    pub fn get_file_url(
        &self,
        collection: &str,
        record_id: &str,
        filename: &str,
        thumb: Option<&str>,
        token: Option<&str>,
    ) -> String {
        let mut url = format!(
            "{}/api/files/{}/{}/{}",
            self.config.host,
            urlencoding::encode(collection),
            urlencoding::encode(record_id),
            urlencoding::encode(filename)
        );
        let mut params: Vec<(&str, &str)> = Vec::new();
        if let Some(thumb) = thumb {
            params.push(("thumb", thumb));
        }
        if let Some(token) = token {
            params.push(("token", token));
        }
        if !params.is_empty() {
            let query: Vec<String> = params
                .iter()
                .map(|(k, v)| format!("{}={}", k, urlencoding::encode(v)))
                .collect();
            url.push('?');
            url.push_str(&query.join("&"));
        }
        url
    }

    pub async fn generate_file_token(&self) -> Result<String, ApiError> {
        let token = self.ensure_authenticated().await?;
        let response = self
            .http
            .post(format!("{}/api/files/token", self.config.host))
            .header(AUTHORIZATION, token)
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(remote_error("generateFileToken", response).await);
        }
        let data: Value = response.json().await?;
        match data.get("token").and_then(Value::as_str) {
            Some(token) => Ok(token.to_string()),
            None => Err(ApiError::service(
                "generateFileToken",
                "response carried no token",
            )),
        }
    }

    pub async fn impersonate_user(
        &self,
        collection: &str,
        id: &str,
        duration: Option<u64>,
    ) -> Result<Value, ApiError> {
        let body = duration.map(|seconds| json!({ "duration": seconds }));
        self.request(
            Method::POST,
            &format!(
                "/api/collections/{}/impersonate/{}",
                urlencoding::encode(collection),
                urlencoding::encode(id)
            ),
            &[],
            body,
        )
        .await
    }

    /// Return a valid superuser token, logging in (or re-logging-in) when the
    /// cached one is absent or about to expire.
    async fn ensure_authenticated(&self) -> Result<String, ApiError> {
        let deadline = SystemTime::now() + REFRESH_MARGIN;
        if let Some(token) = self.auth.read().await.as_ref() {
            if token.expires_at > deadline {
                return Ok(token.value.clone());
            }
        }

        let response = self
            .http
            .post(format!(
                "{}/api/collections/_superusers/auth-with-password",
                self.config.host
            ))
            .header(CONTENT_TYPE, HeaderValue::from_static("application/json"))
            .json(&json!({
                "identity": self.config.admin_email,
                "password": self.config.admin_password,
            }))
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(remote_error("adminAuth", response).await);
        }

        let data: Value = response.json().await?;
        let value = data
            .get("token")
            .and_then(Value::as_str)
            .ok_or_else(|| ApiError::service("adminAuth", "response carried no token"))?
            .to_string();

        let expires_at = decode_token_expiry(&value)
            .unwrap_or_else(|| SystemTime::now() + FALLBACK_LIFETIME);

        let token = AuthToken {
            value: value.clone(),
            expires_at,
        };
        *self.auth.write().await = Some(token);

        Ok(value)
    }

    async fn request(
        &self,
        method: Method,
        path: &str,
        params: &[(&str, String)],
        body: Option<Value>,
    ) -> Result<Value, ApiError> {
        let token = self.ensure_authenticated().await?;

        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        if let Ok(value) = HeaderValue::from_str(&token) {
            headers.insert(AUTHORIZATION, value);
        }

        let mut request = self
            .http
            .request(method, format!("{}{}", self.config.host, path))
            .headers(headers);
        if !params.is_empty() {
            request = request.query(params);
        }
        if let Some(body) = body {
            request = request.json(&body);
        }

        let response = request.send().await?;
        if !response.status().is_success() {
            return Err(remote_error(path, response).await);
        }

        if response.status() == reqwest::StatusCode::NO_CONTENT {
            return Ok(json!({}));
        }
        Ok(response.json().await?)
    }
}

/// Decode the `exp` claim of a JWT without verifying it; we only need the
/// expiry instant for the refresh check.
fn decode_token_expiry(token: &str) -> Option<SystemTime> {
    let payload = token.split('.').nth(1)?;
    let decoded = URL_SAFE_NO_PAD.decode(payload).ok()?;
    let claims: Value = serde_json::from_slice(&decoded).ok()?;
    let exp = claims.get("exp")?.as_u64()?;
    Some(UNIX_EPOCH + Duration::from_secs(exp))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_jwt(exp: u64) -> String {
        let header = URL_SAFE_NO_PAD.encode(b"{\"alg\":\"HS256\"}");
        let payload = URL_SAFE_NO_PAD.encode(format!("{{\"exp\":{exp}}}").as_bytes());
        format!("{header}.{payload}.sig")
    }

    #[test]
    fn test_decode_token_expiry() {
        let expires = decode_token_expiry(&make_jwt(1_900_000_000)).unwrap();
        assert_eq!(
            expires.duration_since(UNIX_EPOCH).unwrap(),
            Duration::from_secs(1_900_000_000)
        );
    }

    #[test]
    fn test_decode_garbage_token_is_none() {
        assert!(decode_token_expiry("not-a-jwt").is_none());
        assert!(decode_token_expiry("a.%%%.c").is_none());
    }

    #[test]
    fn test_file_url_with_query() {
        let service = PocketBaseService::new(PocketBaseConfig {
            host: "https://pb.example.com".to_string(),
            admin_email: "admin@example.com".to_string(),
            admin_password: "secret".to_string(),
        });
        let url = service.get_file_url("posts", "r1", "photo.png", Some("100x100"), None);
        assert_eq!(
            url,
            "https://pb.example.com/api/files/posts/r1/photo.png?thumb=100x100"
        );
    }

    #[tokio::test]
    async fn test_token_cached_across_requests() {
        let mut server = mockito::Server::new_async().await;
        let exp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap()
            .as_secs()
            + 24 * 3600;
        let token = make_jwt(exp);

        let auth_mock = server
            .mock("POST", "/api/collections/_superusers/auth-with-password")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(format!("{{\"token\":\"{token}\"}}"))
            .expect(1)
            .create_async()
            .await;
        let list_mock = server
            .mock("GET", "/api/collections")
            .match_header("authorization", token.as_str())
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body("[]")
            .expect(2)
            .create_async()
            .await;

        let service = PocketBaseService::new(PocketBaseConfig {
            host: server.url(),
            admin_email: "admin@example.com".to_string(),
            admin_password: "secret".to_string(),
        });

        service.list_collections().await.unwrap();
        service.list_collections().await.unwrap();

        auth_mock.assert_async().await;
        list_mock.assert_async().await;
    }
}
