use futures::future::BoxFuture;
use serde_json::Value;

use super::api_models::{AlbumsQuery, SearchParameters};
use super::client::LibraryApiError;
use crate::models::{AlbumResponse, MediaItemSearch, Model, Serializable};
use crate::settings::Settings;

pub type LibraryResult<T> = Result<T, LibraryApiError>;

// The two Photos Library calls the frame relies on, each returning one raw page
pub trait PhotosLibraryApi: Send + Sync {
    fn list_albums(&self, query: AlbumsQuery) -> BoxFuture<LibraryResult<Value>>;

    fn search_media_items(&self, parameters: SearchParameters) -> BoxFuture<LibraryResult<Value>>;
}

#[derive(Debug, Clone, PartialEq)]
pub struct SearchOutcome {
    pub photos: Vec<Value>,
    pub parameters: SearchParameters,
}

/// Lists every album owned by the user, following `nextPageToken` until the
/// API stops returning one. Empty albums are skipped.
pub async fn load_albums(
    api: &dyn PhotosLibraryApi,
    settings: &Settings,
) -> LibraryResult<Vec<Value>> {
    let mut albums = vec![];
    let mut query = AlbumsQuery::new(settings.album_page_size);

    loop {
        debug!("Loading albums. Received so far: {}", albums.len());
        let data = api.list_albums(query.clone()).await?;
        let response = AlbumResponse::try_from_source(&data)?;

        let page = response
            .albums()
            .filter(|album| !album.is_empty())
            .map(Serializable::to_json)
            .collect::<Vec<Value>>();
        debug!("Number of albums received: {}", page.len());
        albums.extend(page);

        query.page_token = response.next_page_token().map(str::to_owned);
        if query.page_token.is_none() {
            break;
        }
    }

    info!("Albums loaded.");
    Ok(albums)
}

/// Runs a media search until at least `photosToLoad` items were collected or
/// the results run out. A negative `photosToLoad` loads everything, absent or
/// zero falls back to the configured amount. Videos that failed or are still
/// processing are left out.
pub async fn search(
    api: &dyn PhotosLibraryApi,
    settings: &Settings,
    mut parameters: SearchParameters,
) -> LibraryResult<SearchOutcome> {
    let requested = parameters.photos_to_load.take();
    let photos_to_load = match requested {
        None | Some(0) => settings.photos_to_load,
        Some(count) => count,
    };
    parameters.page_size = Some(settings.search_page_size);

    let mut photos = vec![];
    loop {
        debug!(
            "Submitting search with parameters: {}",
            serde_json::to_string(&parameters)?
        );
        let result = api.search_media_items(parameters.clone()).await?;
        let result = MediaItemSearch::try_from_source(&result)?;

        let items = result
            .media_items()
            .filter(|item| !item.is_empty())
            .filter(|item| item.is_displayable())
            .map(Serializable::to_json)
            .collect::<Vec<Value>>();
        let found = items.len();
        photos.extend(items);

        parameters.page_token = result.next_page_token().map(str::to_owned);
        debug!(
            "Found {} images in this request. Total images: {}",
            found,
            photos.len()
        );

        let wants_more = photos_to_load < 0 || (photos.len() as i64) < photos_to_load;
        if !wants_more || parameters.page_token.is_none() {
            break;
        }
    }

    info!("Search complete.");

    let mut parameters = parameters.without_paging();
    if requested.is_some() {
        parameters.photos_to_load = Some(photos_to_load);
    }

    Ok(SearchOutcome { photos, parameters })
}

#[cfg(test)]
pub mod tests {

    use super::*;
    use futures::executor::block_on;
    use serde_json::json;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    // Serves canned pages in order and records what was asked for
    #[derive(Default)]
    pub struct FakeLibrary {
        pub album_pages: Mutex<VecDeque<LibraryResult<Value>>>,
        pub search_pages: Mutex<VecDeque<LibraryResult<Value>>>,
        pub album_queries: Mutex<Vec<AlbumsQuery>>,
        pub searches: Mutex<Vec<SearchParameters>>,
    }

    impl FakeLibrary {
        pub fn with_albums(pages: Vec<Value>) -> Self {
            let fake = Self::default();
            fake.album_pages
                .lock()
                .unwrap()
                .extend(pages.into_iter().map(Ok));
            fake
        }

        pub fn with_search(pages: Vec<Value>) -> Self {
            let fake = Self::default();
            fake.search_pages
                .lock()
                .unwrap()
                .extend(pages.into_iter().map(Ok));
            fake
        }
    }

    impl PhotosLibraryApi for FakeLibrary {
        fn list_albums(&self, query: AlbumsQuery) -> BoxFuture<LibraryResult<Value>> {
            self.album_queries.lock().unwrap().push(query);
            let page = self.album_pages.lock().unwrap().pop_front();
            Box::pin(async move { page.unwrap_or(Err(LibraryApiError::NoToken)) })
        }

        fn search_media_items(&self, parameters: SearchParameters) -> BoxFuture<LibraryResult<Value>> {
            self.searches.lock().unwrap().push(parameters);
            let page = self.search_pages.lock().unwrap().pop_front();
            Box::pin(async move { page.unwrap_or(Err(LibraryApiError::NoToken)) })
        }
    }

    pub fn picture(id: &str) -> Value {
        json!({"id": id, "baseUrl": format!("https://img/{}", id), "mimeType": "image/jpeg"})
    }

    fn video(id: &str, status: &str) -> Value {
        json!({
            "id": id,
            "mimeType": "video/mp4",
            "mediaMetadata": {"video": {"status": status}}
        })
    }

    fn settings() -> Settings {
        Settings {
            photos_to_load: 3,
            search_page_size: 2,
            album_page_size: 2,
            ..Settings::default()
        }
    }

    #[test]
    fn test_load_albums_follows_pages() {
        let api = FakeLibrary::with_albums(vec![
            json!({"albums": [{"id": "a", "title": "A"}, {"id": "b"}], "nextPageToken": "p2"}),
            json!({"albums": [{"id": "c"}]}),
        ]);

        let albums = block_on(load_albums(&api, &settings())).unwrap();
        let ids = albums.iter().map(|a| a["id"].clone()).collect::<Vec<Value>>();
        assert_eq!(ids, vec![json!("a"), json!("b"), json!("c")]);
        assert_eq!(albums[0], json!({"id": "a", "title": "A", "isWriteable": false}));

        let queries = api.album_queries.lock().unwrap();
        assert_eq!(queries.len(), 2);
        assert_eq!(queries[0], AlbumsQuery::new(2));
        assert_eq!(queries[1].page_token.as_deref(), Some("p2"));
    }

    #[test]
    fn test_load_albums_without_albums() {
        let api = FakeLibrary::with_albums(vec![json!({})]);
        let albums = block_on(load_albums(&api, &settings())).unwrap();
        assert!(albums.is_empty());
    }

    #[test]
    fn test_load_albums_propagates_errors() {
        let api = FakeLibrary::with_albums(vec![json!({"albums": [], "nextPageToken": "p2"})]);
        let result = block_on(load_albums(&api, &settings()));
        assert!(matches!(result, Err(LibraryApiError::NoToken)));
    }

    #[test]
    fn test_load_albums_rejects_malformed_page() {
        let api = FakeLibrary::with_albums(vec![json!("not a page")]);
        let result = block_on(load_albums(&api, &settings()));
        assert!(matches!(result, Err(LibraryApiError::Malformed(_))));
    }

    #[test]
    fn test_search_stops_once_enough_photos() {
        let api = FakeLibrary::with_search(vec![
            json!({"mediaItems": [picture("1"), picture("2")], "nextPageToken": "p2"}),
            json!({"mediaItems": [picture("3"), picture("4")], "nextPageToken": "p3"}),
            json!({"mediaItems": [picture("5")]}),
        ]);

        let outcome = block_on(search(&api, &settings(), SearchParameters::for_album("x", None))).unwrap();
        assert_eq!(outcome.photos.len(), 4);
        assert_eq!(outcome.parameters, SearchParameters::for_album("x", None));

        let searches = api.searches.lock().unwrap();
        assert_eq!(searches.len(), 2);
        assert_eq!(searches[0].page_size, Some(2));
        assert_eq!(searches[0].photos_to_load, None);
        assert_eq!(searches[1].page_token.as_deref(), Some("p2"));
    }

    #[test]
    fn test_search_negative_count_loads_everything() {
        let api = FakeLibrary::with_search(vec![
            json!({"mediaItems": [picture("1"), picture("2")], "nextPageToken": "p2"}),
            json!({"mediaItems": [picture("3"), picture("4")], "nextPageToken": "p3"}),
            json!({"mediaItems": [picture("5")]}),
        ]);

        let outcome = block_on(search(&api, &settings(), SearchParameters::for_album("x", Some(-1)))).unwrap();
        assert_eq!(outcome.photos.len(), 5);
        assert_eq!(outcome.parameters, SearchParameters::for_album("x", Some(-1)));
    }

    #[test]
    fn test_search_filters_unready_videos_and_empty_items() {
        let api = FakeLibrary::with_search(vec![json!({
            "mediaItems": [
                picture("1"),
                video("2", "FAILED"),
                video("3", "PROCESSING"),
                video("4", "READY"),
                {}
            ]
        })]);

        let outcome = block_on(search(&api, &settings(), SearchParameters::default())).unwrap();
        let ids = outcome
            .photos
            .iter()
            .map(|p| p["id"].clone())
            .collect::<Vec<Value>>();
        assert_eq!(ids, vec![json!("1"), json!("4")]);
        assert_eq!(outcome.photos[0]["mediaType"], json!("image"));
        assert_eq!(outcome.photos[1]["mediaType"], json!("video"));
    }

    #[test]
    fn test_search_zero_count_uses_default() {
        let api = FakeLibrary::with_search(vec![
            json!({"mediaItems": [picture("1"), picture("2")], "nextPageToken": "p2"}),
            json!({"mediaItems": [picture("3")], "nextPageToken": "p3"}),
        ]);

        let outcome = block_on(search(&api, &settings(), SearchParameters::for_album("x", Some(0)))).unwrap();
        assert_eq!(outcome.photos.len(), 3);
        assert_eq!(outcome.parameters.photos_to_load, Some(3));
    }
}
