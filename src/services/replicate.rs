use std::path::{Path, PathBuf};

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use reqwest::Client;
use serde::Serialize;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::services::env::required_env;
use crate::services::error::{remote_error, ApiError};

const DEFAULT_BASE_URL: &str = "https://api.replicate.com";
const MODEL: &str = "google/nano-banana";

#[derive(Debug, Serialize)]
pub struct GenerateImageResult {
    #[serde(rename = "filePath")]
    pub file_path: String,
    pub prompt: String,
    pub model: String,
    #[serde(rename = "aspectRatio")]
    pub aspect_ratio: String,
    #[serde(rename = "outputFormat")]
    pub output_format: String,
    #[serde(rename = "predictionId")]
    pub prediction_id: String,
}

/// Replicate predictions client for the image-generation model.
///
/// Uses the synchronous-wait mode (`Prefer: wait=60`): the create call
/// blocks server-side until the prediction settles or the wait window runs
/// out, so there is no polling loop here.
pub struct ReplicateService {
    base_url: String,
    api_token: String,
    http: Client,
}

impl ReplicateService {
    pub fn from_env() -> Result<Self, ApiError> {
        let api_token = required_env(
            "REPLICATE_API_TOKEN",
            "Set it to your Replicate API token from https://replicate.com/account/api-tokens",
        )?;
        Ok(Self::new(DEFAULT_BASE_URL.to_string(), api_token))
    }

    pub fn new(base_url: String, api_token: String) -> Self {
        Self {
            base_url,
            api_token,
            http: Client::new(),
        }
    }

    pub async fn generate_image(
        &self,
        prompt: &str,
        image_inputs: &[String],
        aspect_ratio: &str,
        output_format: &str,
    ) -> Result<GenerateImageResult, ApiError> {
        let mut input = json!({
            "prompt": prompt,
            "aspect_ratio": aspect_ratio,
            "output_format": output_format,
        });

        if !image_inputs.is_empty() {
            let mut data_uris = Vec::with_capacity(image_inputs.len());
            for path in image_inputs {
                data_uris.push(image_to_data_uri(path)?);
            }
            input["image_input"] = json!(data_uris);
        }

        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert("Prefer", HeaderValue::from_static("wait=60"));
        if let Ok(value) = HeaderValue::from_str(&format!("Bearer {}", self.api_token)) {
            headers.insert(AUTHORIZATION, value);
        }

        let response = self
            .http
            .post(format!(
                "{}/v1/models/{}/predictions",
                self.base_url, MODEL
            ))
            .headers(headers)
            .json(&json!({ "input": input }))
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(remote_error("generateImage", response).await);
        }

        let prediction: Value = response.json().await?;
        let id = prediction
            .get("id")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        let status = prediction
            .get("status")
            .and_then(Value::as_str)
            .unwrap_or_default();

        if status == "failed" {
            let detail = prediction
                .get("error")
                .and_then(Value::as_str)
                .unwrap_or("Unknown error");
            return Err(ApiError::service(
                "generateImage",
                format!("image generation failed: {detail}"),
            ));
        }
        if status != "succeeded" {
            return Err(ApiError::service(
                "generateImage",
                format!(
                    "prediction did not complete in time (status: {status}). \
                     Try again or check https://replicate.com/p/{id}"
                ),
            ));
        }

        let output_url = match prediction.get("output") {
            Some(Value::String(url)) => url.clone(),
            Some(Value::Array(urls)) => urls
                .first()
                .and_then(Value::as_str)
                .map(str::to_string)
                .ok_or_else(|| ApiError::service("generateImage", "empty prediction output"))?,
            _ => {
                return Err(ApiError::service(
                    "generateImage",
                    "no output returned from prediction",
                ))
            }
        };

        let file_path = self.download_image(&output_url, output_format).await?;

        Ok(GenerateImageResult {
            file_path: file_path.display().to_string(),
            prompt: prompt.to_string(),
            model: MODEL.to_string(),
            aspect_ratio: aspect_ratio.to_string(),
            output_format: output_format.to_string(),
            prediction_id: id,
        })
    }

    async fn download_image(&self, url: &str, format: &str) -> Result<PathBuf, ApiError> {
        let path = std::env::temp_dir().join(format!("replicate-{}.{}", Uuid::new_v4(), format));
        let response = self.http.get(url).send().await?;
        if !response.status().is_success() {
            return Err(remote_error("downloadImage", response).await);
        }
        let bytes = response.bytes().await?;
        std::fs::write(&path, &bytes)?;
        Ok(path)
    }
}

fn image_to_data_uri(path: &str) -> Result<String, ApiError> {
    if !Path::new(path).exists() {
        return Err(ApiError::service(
            "generateImage",
            format!("image file not found: {path}"),
        ));
    }
    let bytes = std::fs::read(path)?;
    let mime = match Path::new(path)
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_lowercase)
        .as_deref()
    {
        Some("png") => "image/png",
        _ => "image/jpeg",
    };
    Ok(format!("data:{};base64,{}", mime, BASE64.encode(&bytes)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_data_uri_mime_detection() {
        let dir = tempfile::tempdir().unwrap();
        let png = dir.path().join("input.PNG");
        std::fs::write(&png, [0x89u8, 0x50, 0x4e, 0x47]).unwrap();

        let uri = image_to_data_uri(png.to_str().unwrap()).unwrap();
        assert!(uri.starts_with("data:image/png;base64,"));

        let jpg = dir.path().join("input.jpg");
        std::fs::write(&jpg, [0xffu8, 0xd8]).unwrap();
        let uri = image_to_data_uri(jpg.to_str().unwrap()).unwrap();
        assert!(uri.starts_with("data:image/jpeg;base64,"));
    }

    #[test]
    fn test_missing_image_input_is_an_error() {
        let err = image_to_data_uri("/tmp/definitely-not-here.png").unwrap_err();
        assert!(err.to_string().contains("image file not found"));
    }

    #[tokio::test]
    async fn test_failed_prediction_is_reported() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/v1/models/google/nano-banana/predictions")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body("{\"id\":\"p1\",\"status\":\"failed\",\"error\":\"NSFW content\"}")
            .create_async()
            .await;

        let service = ReplicateService::new(server.url(), "token".to_string());
        let err = service
            .generate_image("a cat", &[], "1:1", "jpg")
            .await
            .unwrap_err();
        assert!(err.to_string().contains("image generation failed"));
        assert!(err.to_string().contains("NSFW content"));
    }

    #[tokio::test]
    async fn test_successful_prediction_downloads_output() {
        let mut server = mockito::Server::new_async().await;
        let image_url = format!("{}/out.jpg", server.url());
        server
            .mock("POST", "/v1/models/google/nano-banana/predictions")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(format!(
                "{{\"id\":\"p2\",\"status\":\"succeeded\",\"output\":\"{image_url}\"}}"
            ))
            .create_async()
            .await;
        server
            .mock("GET", "/out.jpg")
            .with_status(200)
            .with_body("jpeg-bytes")
            .create_async()
            .await;

        let service = ReplicateService::new(server.url(), "token".to_string());
        let result = service
            .generate_image("a cat", &[], "1:1", "jpg")
            .await
            .unwrap();
        assert_eq!(result.prediction_id, "p2");
        assert_eq!(std::fs::read_to_string(&result.file_path).unwrap(), "jpeg-bytes");
    }
}
