use regex::Regex;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;

use super::api_models::SearchParameters;
use super::cache::{CacheError, CacheManager};
use super::library::{load_albums, search, LibraryResult, PhotosLibraryApi, SearchOutcome};
use crate::settings::Settings;

const ALBUMS_DIR: &str = "albums";
const MEDIA_ITEMS_DIR: &str = "media_items";
const STORAGE_DIR: &str = "storage";

lazy_static! {
    static ref UNSAFE_KEY_CHARS: Regex = Regex::new(r"[^A-Za-z0-9_-]").unwrap();
    pub static ref ALL_ENTRIES: Regex = Regex::new(r"^[\w-]+\.json(\.expiry)?$").unwrap();
}

enum FrameCacheKey<'a> {
    Albums(&'a str),
    MediaItems(&'a str),
    Storage(&'a str),
}

impl<'a> FrameCacheKey<'a> {
    fn into_raw(self) -> String {
        let (dir, user) = match self {
            Self::Albums(user) => (ALBUMS_DIR, user),
            Self::MediaItems(user) => (MEDIA_ITEMS_DIR, user),
            Self::Storage(user) => (STORAGE_DIR, user),
        };
        format!("{}/{}.json", dir, UNSAFE_KEY_CHARS.replace_all(user, "_"))
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct AlbumList {
    pub albums: Vec<Value>,
}

/// What the frame displays. Both fields are absent when nothing was ever
/// loaded for the user.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct PhotoQueue {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub photos: Option<Vec<Value>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parameters: Option<SearchParameters>,
}

// Last search per user, resubmitted once the media item cache expires
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
struct StoredSearch {
    parameters: SearchParameters,
}

pub struct CachedPhotosClient {
    api: Arc<dyn PhotosLibraryApi>,
    cache: CacheManager,
    settings: Settings,
}

impl CachedPhotosClient {
    pub fn new(
        api: Arc<dyn PhotosLibraryApi>,
        settings: Settings,
    ) -> Result<Self, CacheError> {
        let cache = CacheManager::for_dir(
            &settings.cache_dir,
            &[ALBUMS_DIR, MEDIA_ITEMS_DIR, STORAGE_DIR],
        )?;
        Ok(Self {
            api,
            cache,
            settings,
        })
    }

    async fn cached<T>(&self, key: &str) -> Option<T>
    where
        T: DeserializeOwned,
    {
        match self.cache.get_item(key).await {
            Ok(item) => item,
            Err(e) => {
                warn!("Ignoring cache entry {}: {}", key, e);
                None
            }
        }
    }

    /// All albums owned by `user`, served from the album cache while it is
    /// fresh.
    pub async fn get_albums(&self, user: &str) -> LibraryResult<AlbumList> {
        info!("Loading albums");
        let key = FrameCacheKey::Albums(user).into_raw();

        if let Some(albums) = self.cached::<AlbumList>(&key).await {
            debug!("Loaded albums from cache.");
            return Ok(albums);
        }

        debug!("Loading albums from API.");
        match load_albums(&*self.api, &self.settings).await {
            Ok(albums) => {
                let albums = AlbumList { albums };
                self.cache
                    .set_item(&key, &albums, Some(self.settings.album_cache_ttl))
                    .await?;
                Ok(albums)
            }
            Err(e) => {
                error!("Albums could not be loaded: {}", e);
                self.cache.remove_cache_file(&key).await?;
                Err(e)
            }
        }
    }

    /// The photos selected for the frame. Falls back to resubmitting the
    /// last search once the cached items expired.
    pub async fn get_queue(&self, user: &str) -> LibraryResult<PhotoQueue> {
        info!("Loading queue.");
        let cached_photos = self
            .cached::<Vec<Value>>(&FrameCacheKey::MediaItems(user).into_raw())
            .await;
        let stored = self
            .cached::<StoredSearch>(&FrameCacheKey::Storage(user).into_raw())
            .await;

        match (cached_photos, stored) {
            (Some(photos), stored) if !photos.is_empty() => {
                debug!("Returning cached photos.");
                Ok(PhotoQueue {
                    photos: Some(photos),
                    parameters: stored.map(|stored| stored.parameters),
                })
            }
            (_, Some(stored)) => {
                debug!(
                    "Resubmitting filter search {}",
                    serde_json::to_string(&stored.parameters)?
                );
                let outcome = search(&*self.api, &self.settings, stored.parameters).await?;
                self.return_photos(user, outcome).await
            }
            (_, None) => {
                debug!("No cached data.");
                Ok(PhotoQueue::default())
            }
        }
    }

    /// Loads the photos of one album into the frame. A `photos_to_load` of
    /// zero is treated as absent.
    pub async fn load_from_album(
        &self,
        user: &str,
        album_id: &str,
        photos_to_load: Option<i64>,
    ) -> LibraryResult<PhotoQueue> {
        info!("Importing album: {}", album_id);
        let parameters =
            SearchParameters::for_album(album_id, photos_to_load.filter(|count| *count != 0));
        let outcome = search(&*self.api, &self.settings, parameters).await?;
        self.return_photos(user, outcome).await
    }

    async fn return_photos(&self, user: &str, outcome: SearchOutcome) -> LibraryResult<PhotoQueue> {
        let SearchOutcome { photos, parameters } = outcome;

        self.cache
            .set_item(
                &FrameCacheKey::MediaItems(user).into_raw(),
                &photos,
                Some(self.settings.media_item_cache_ttl),
            )
            .await?;
        let stored = StoredSearch { parameters };
        self.cache
            .set_item(&FrameCacheKey::Storage(user).into_raw(), &stored, None)
            .await?;

        Ok(PhotoQueue {
            photos: Some(photos),
            parameters: Some(stored.parameters),
        })
    }

    /// Forgets everything cached or stored, for every user.
    pub async fn clear_all(&self) -> Result<(), CacheError> {
        for dir in [ALBUMS_DIR, MEDIA_ITEMS_DIR, STORAGE_DIR].iter() {
            self.cache.clear_cache_pattern(dir, &*ALL_ENTRIES).await?;
        }
        Ok(())
    }
}
