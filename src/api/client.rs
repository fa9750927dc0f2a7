use futures::future::BoxFuture;
use isahc::config::Configurable;
use isahc::http::{method::Method, request::Builder, StatusCode, Uri};
use isahc::{AsyncReadResponseExt, HttpClient, Request};
use serde::Serialize;
use serde_json::{from_str, Value};
use std::convert::Into;
use std::sync::Mutex;
use std::time::Duration;
use thiserror::Error;

pub use super::api_models::*;
use super::cache::CacheError;
use super::library::{LibraryResult, PhotosLibraryApi};
use crate::models::ModelError;

pub(crate) struct PhotosRequest<'a, Body> {
    client: &'a PhotosClient,
    request: Builder,
    body: Body,
}

impl<'a, B> PhotosRequest<'a, B>
where
    B: Into<isahc::AsyncBody>,
{
    fn method(mut self, method: Method) -> Self {
        self.request = self.request.method(method);
        self
    }

    fn uri(mut self, path: &str, query: Option<&str>) -> Result<Self, LibraryApiError> {
        let uri = match query {
            None => format!("{}{}", self.client.endpoint, path),
            Some(query) => format!("{}{}?{}", self.client.endpoint, path, query),
        };
        self.request = self.request.uri(uri.parse::<Uri>()?);
        Ok(self)
    }

    fn authenticated(mut self) -> Result<Self, LibraryApiError> {
        let token = self
            .client
            .token
            .lock()
            .map_err(|_| LibraryApiError::NoToken)?
            .clone()
            .ok_or(LibraryApiError::NoToken)?;
        self.request = self
            .request
            .header("Authorization", format!("Bearer {}", token));
        Ok(self)
    }

    pub(crate) fn json_body<NewBody>(
        self,
        body: NewBody,
    ) -> Result<PhotosRequest<'a, Vec<u8>>, LibraryApiError>
    where
        NewBody: Serialize,
    {
        let Self {
            client, request, ..
        } = self;
        Ok(PhotosRequest {
            client,
            request: request.header("Content-Type", "application/json"),
            body: serde_json::to_vec(&body)?,
        })
    }

    pub(crate) async fn send(self) -> Result<Value, LibraryApiError> {
        let Self {
            client,
            request,
            body,
        } = self.authenticated()?;
        client.send_req(request.body(body)?).await
    }
}

#[derive(Error, Debug)]
pub enum LibraryApiError {
    #[error("Invalid token")]
    InvalidToken,
    #[error("No token")]
    NoToken,
    #[error("Request rate exceeded")]
    TooManyRequests,
    #[error("Request failed ({0}): {1}")]
    BadStatus(u16, String),
    #[error(transparent)]
    ClientError(#[from] isahc::Error),
    #[error(transparent)]
    HttpError(#[from] isahc::http::Error),
    #[error(transparent)]
    UriError(#[from] isahc::http::uri::InvalidUri),
    #[error(transparent)]
    IoError(#[from] std::io::Error),
    #[error(transparent)]
    CacheError(#[from] CacheError),
    #[error(transparent)]
    ParseError(#[from] serde_json::Error),
    #[error(transparent)]
    Malformed(#[from] ModelError),
}

impl LibraryApiError {
    /// HTTP status to hand back to whoever asked for the data.
    pub fn status(&self) -> u16 {
        match self {
            Self::InvalidToken | Self::NoToken => 401,
            Self::TooManyRequests => 429,
            Self::BadStatus(status, _) => *status,
            _ => 500,
        }
    }
}

pub struct PhotosClient {
    endpoint: String,
    token: Mutex<Option<String>>,
    client: HttpClient,
}

impl PhotosClient {
    pub fn new(endpoint: &str) -> Result<Self, LibraryApiError> {
        let client = HttpClient::builder()
            .timeout(Duration::from_secs(60))
            .build()?;
        Ok(Self {
            endpoint: endpoint.trim_end_matches('/').to_owned(),
            token: Mutex::new(None),
            client,
        })
    }

    pub(crate) fn request(&self) -> PhotosRequest<'_, ()> {
        PhotosRequest {
            client: self,
            request: Builder::new(),
            body: (),
        }
    }

    pub fn has_token(&self) -> bool {
        self.token
            .lock()
            .map(|token| token.is_some())
            .unwrap_or(false)
    }

    pub fn update_token(&self, new_token: String) {
        if let Ok(mut token) = self.token.lock() {
            *token = Some(new_token)
        }
    }

    fn clear_token(&self) {
        if let Ok(mut token) = self.token.lock() {
            *token = None
        }
    }

    async fn send_req<B>(&self, request: Request<B>) -> Result<Value, LibraryApiError>
    where
        B: Into<isahc::AsyncBody>,
    {
        let mut result = self.client.send_async(request).await?;

        match result.status() {
            s if s.is_success() => {
                let text = result.text().await?;
                debug!("Response: {}", text);
                Ok(from_str(&text)?)
            }
            StatusCode::UNAUTHORIZED => {
                self.clear_token();
                Err(LibraryApiError::InvalidToken)
            }
            StatusCode::TOO_MANY_REQUESTS => Err(LibraryApiError::TooManyRequests),
            s => Err(LibraryApiError::BadStatus(
                s.as_u16(),
                result
                    .text()
                    .await
                    .unwrap_or_else(|_| "(no details available)".to_string()),
            )),
        }
    }
}

impl PhotosClient {
    pub(crate) fn list_albums(&self, query: AlbumsQuery) -> Result<PhotosRequest<'_, ()>, LibraryApiError> {
        self.request()
            .method(Method::GET)
            .uri("/v1/albums", Some(&query.into_query_string()))
    }

    pub(crate) fn search(
        &self,
        parameters: &SearchParameters,
    ) -> Result<PhotosRequest<'_, Vec<u8>>, LibraryApiError> {
        let parameters = SearchParameters {
            photos_to_load: None,
            ..parameters.clone()
        };
        self.request()
            .method(Method::POST)
            .uri("/v1/mediaItems:search", None)?
            .json_body(parameters)
    }
}

impl PhotosLibraryApi for PhotosClient {
    fn list_albums(&self, query: AlbumsQuery) -> BoxFuture<LibraryResult<Value>> {
        Box::pin(async move { PhotosClient::list_albums(self, query)?.send().await })
    }

    fn search_media_items(&self, parameters: SearchParameters) -> BoxFuture<LibraryResult<Value>> {
        Box::pin(async move { self.search(&parameters)?.send().await })
    }
}

#[cfg(test)]
pub mod tests {

    use super::*;

    fn uri_of<B>(request: &PhotosRequest<'_, B>) -> String {
        request.request.uri_ref().unwrap().to_string()
    }

    #[test]
    fn test_list_albums_uri() {
        let client = PhotosClient::new("https://photoslibrary.googleapis.com/").unwrap();
        let query = AlbumsQuery {
            page_size: 50,
            page_token: Some("tok".to_string()),
        };
        let req = client.list_albums(query).unwrap();
        assert_eq!(
            uri_of(&req),
            "https://photoslibrary.googleapis.com/v1/albums?pageSize=50&pageToken=tok"
        );
    }

    #[test]
    fn test_search_body_omits_photos_to_load() {
        let client = PhotosClient::new("https://photoslibrary.googleapis.com").unwrap();
        let parameters = SearchParameters {
            page_size: Some(100),
            ..SearchParameters::for_album("abc", Some(25))
        };
        let req = client.search(&parameters).unwrap();
        assert_eq!(
            uri_of(&req),
            "https://photoslibrary.googleapis.com/v1/mediaItems:search"
        );
        assert_eq!(
            String::from_utf8(req.body).unwrap(),
            r#"{"albumId":"abc","pageSize":100}"#
        );
    }

    #[test]
    fn test_send_without_token() {
        let client = PhotosClient::new("https://photoslibrary.googleapis.com").unwrap();
        assert!(!client.has_token());
        let result = futures::executor::block_on(
            PhotosLibraryApi::list_albums(&client, AlbumsQuery::new(1)),
        );
        assert!(matches!(result, Err(LibraryApiError::NoToken)));
    }

    #[test]
    fn test_update_token() {
        let client = PhotosClient::new("https://photoslibrary.googleapis.com").unwrap();
        client.update_token("abc".to_string());
        assert!(client.has_token());
        client.clear_token();
        assert!(!client.has_token());
    }

    #[test]
    fn test_error_status() {
        assert_eq!(LibraryApiError::InvalidToken.status(), 401);
        assert_eq!(LibraryApiError::BadStatus(404, "gone".to_string()).status(), 404);
        assert_eq!(
            LibraryApiError::BadStatus(403, "denied".to_string()).to_string(),
            "Request failed (403): denied"
        );
    }
}
