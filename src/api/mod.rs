mod api_models;
mod cached_client;
mod client;
mod library;

pub mod cache;

pub use api_models::{AlbumsQuery, SearchParameters};
pub use cached_client::{AlbumList, CachedPhotosClient, PhotoQueue};
pub use client::{LibraryApiError, PhotosClient};
pub use library::{load_albums, search, LibraryResult, PhotosLibraryApi, SearchOutcome};
