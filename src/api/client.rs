//! Thin reqwest wrapper shared by every entity service

use reqwest::{Client, Method, RequestBuilder, Url};
use serde::{de::DeserializeOwned, Serialize};
use tracing::{debug, warn};

use super::errors::{extract_server_message, ApiError, ApiResult};
use crate::config::Config;

/// REST client bound to one API base URL
#[derive(Debug, Clone)]
pub struct RestClient {
    http: Client,
    base_url: Url,
}

impl RestClient {
    pub fn new(config: &Config) -> ApiResult<Self> {
        let mut builder = Client::builder().user_agent(config.http.user_agent.clone());
        if let Some(timeout) = config.http_timeout() {
            builder = builder.timeout(timeout);
        }
        let http = builder.build()?;
        Self::with_client(http, &config.api_url)
    }

    pub fn with_client(http: Client, base_url: &str) -> ApiResult<Self> {
        let base_url =
            Url::parse(base_url).map_err(|_| ApiError::InvalidUrl(base_url.to_string()))?;
        if base_url.cannot_be_a_base() {
            return Err(ApiError::InvalidUrl(base_url.to_string()));
        }
        Ok(Self { http, base_url })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Build `{base}/{path}[/{id}]`, percent-encoding the id segment
    pub fn url(&self, path: &str, id: Option<&str>) -> ApiResult<Url> {
        let mut url = self.base_url.clone();
        {
            let mut segments = url
                .path_segments_mut()
                .map_err(|_| ApiError::InvalidUrl(self.base_url.to_string()))?;
            segments.pop_if_empty();
            segments.extend(path.split('/').filter(|s| !s.is_empty()));
            if let Some(id) = id {
                segments.push(id);
            }
        }
        Ok(url)
    }

    pub async fn get_all<T: DeserializeOwned>(&self, path: &str) -> ApiResult<Vec<T>> {
        let url = self.url(path, None)?;
        self.send_json(self.request(Method::GET, url), path).await
    }

    pub async fn get<T: DeserializeOwned>(&self, path: &str, id: &str) -> ApiResult<T> {
        let url = self.url(path, Some(id))?;
        self.send_json(self.request(Method::GET, url), path).await
    }

    pub async fn create<B, T>(&self, path: &str, body: &B) -> ApiResult<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let url = self.url(path, None)?;
        self.send_json(self.request(Method::POST, url).json(body), path)
            .await
    }

    pub async fn update<B, T>(&self, path: &str, id: &str, body: &B) -> ApiResult<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let url = self.url(path, Some(id))?;
        self.send_json(self.request(Method::PUT, url).json(body), path)
            .await
    }

    pub async fn delete(&self, path: &str, id: &str) -> ApiResult<()> {
        let url = self.url(path, Some(id))?;
        self.send(self.request(Method::DELETE, url)).await?;
        Ok(())
    }

    fn request(&self, method: Method, url: Url) -> RequestBuilder {
        debug!("{} {}", method, url);
        self.http.request(method, url)
    }

    async fn send(&self, request: RequestBuilder) -> ApiResult<String> {
        let response = request.send().await?;
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            warn!("API returned status {}: {}", status.as_u16(), body);
            return Err(ApiError::Status {
                status: status.as_u16(),
                message: extract_server_message(&body),
            });
        }

        Ok(body)
    }

    async fn send_json<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
        resource: &str,
    ) -> ApiResult<T> {
        let body = self.send(request).await?;
        serde_json::from_str(&body).map_err(|source| ApiError::Decode {
            resource: resource.trim_start_matches('/').to_string(),
            source,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client(base: &str) -> RestClient {
        RestClient::with_client(Client::new(), base).unwrap()
    }

    #[test]
    fn test_url_building() {
        let api = client("http://localhost:3000");
        assert_eq!(
            api.url("/patients", None).unwrap().as_str(),
            "http://localhost:3000/patients"
        );
        assert_eq!(
            api.url("/patients", Some("42")).unwrap().as_str(),
            "http://localhost:3000/patients/42"
        );
        assert_eq!(
            api.url("/enums/gender", None).unwrap().as_str(),
            "http://localhost:3000/enums/gender"
        );
    }

    #[test]
    fn test_url_keeps_base_path() {
        let api = client("http://backend.local/api/");
        assert_eq!(
            api.url("/regulatoryDoctors", Some("a b")).unwrap().as_str(),
            "http://backend.local/api/regulatoryDoctors/a%20b"
        );
    }

    #[test]
    fn test_rejects_non_base_urls() {
        assert!(RestClient::with_client(Client::new(), "mailto:someone@example.com").is_err());
        assert!(RestClient::with_client(Client::new(), "not a url").is_err());
    }
}
