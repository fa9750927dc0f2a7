use form_urlencoded::Serializer;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Body of `mediaItems:search`. `photos_to_load` is ours and never reaches
/// the API.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SearchParameters {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub album_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filters: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page_size: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page_token: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub photos_to_load: Option<i64>,
}

impl SearchParameters {
    pub fn for_album(album_id: &str, photos_to_load: Option<i64>) -> Self {
        Self {
            album_id: Some(album_id.to_owned()),
            photos_to_load,
            ..Default::default()
        }
    }

    /// The parameters worth keeping once a search completed.
    pub fn without_paging(self) -> Self {
        Self {
            page_size: None,
            page_token: None,
            ..self
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AlbumsQuery {
    pub page_size: usize,
    pub page_token: Option<String>,
}

impl AlbumsQuery {
    pub fn new(page_size: usize) -> Self {
        Self {
            page_size,
            page_token: None,
        }
    }

    pub fn into_query_string(self) -> String {
        let mut serializer = Serializer::new(String::new());
        serializer.append_pair("pageSize", &self.page_size.to_string()[..]);
        if let Some(token) = self.page_token {
            serializer.append_pair("pageToken", &token[..]);
        }
        serializer.finish()
    }
}
