use serde_json::{json, Value};

use super::transformers::{boolean_transformer, model_processor, model_transformer};
use super::{FieldDescriptor, Record, Schema};

// Shapes follow the Photos Library REST resources:
// https://developers.google.com/photos/library/reference/rest/v1/albums

lazy_static! {
    static ref SHARED_ALBUM_OPTIONS: Schema = Schema::new(
        "SharedAlbumOptions",
        vec![
            FieldDescriptor::transformed("isCollaborative", boolean_transformer())
                .with_default(json!(false)),
            FieldDescriptor::transformed("isCommentable", boolean_transformer())
                .with_default(json!(false)),
        ]
    );
    static ref SHARE_INFO: Schema = Schema::new(
        "ShareInfo",
        vec![
            FieldDescriptor::nested("sharedAlbumOptions", model_transformer::<SharedAlbumOptions>()),
            FieldDescriptor::scalar("shareableUrl"),
            FieldDescriptor::scalar("shareToken"),
            FieldDescriptor::transformed("isJoined", boolean_transformer()).with_default(json!(false)),
            FieldDescriptor::transformed("isOwned", boolean_transformer()).with_default(json!(false)),
            FieldDescriptor::transformed("isJoinable", boolean_transformer())
                .with_default(json!(false)),
        ]
    );
    static ref ALBUM: Schema = Schema::new(
        "Album",
        vec![
            FieldDescriptor::scalar("id"),
            FieldDescriptor::scalar("title"),
            FieldDescriptor::scalar("productUrl"),
            FieldDescriptor::transformed("isWriteable", boolean_transformer())
                .with_default(json!(false)),
            FieldDescriptor::nested("shareInfo", model_transformer::<ShareInfo>()),
            FieldDescriptor::scalar("mediaItemsCount"),
            FieldDescriptor::scalar("coverPhotoBaseUrl"),
            FieldDescriptor::scalar("coverPhotoMediaItemId"),
        ]
    );
    static ref ALBUM_RESPONSE: Schema = Schema::new(
        "AlbumResponse",
        vec![
            FieldDescriptor::list("albums", model_processor::<Album>()),
            FieldDescriptor::scalar("nextPageToken"),
        ]
    );
}

#[derive(Debug)]
pub struct SharedAlbumOptions {
    record: Record,
}

model!(SharedAlbumOptions, SHARED_ALBUM_OPTIONS);

impl SharedAlbumOptions {
    pub fn is_collaborative(&self) -> bool {
        self.record.boolean("isCollaborative")
    }

    pub fn is_commentable(&self) -> bool {
        self.record.boolean("isCommentable")
    }
}

#[derive(Debug)]
pub struct ShareInfo {
    record: Record,
}

model!(ShareInfo, SHARE_INFO);

impl ShareInfo {
    pub fn shared_album_options(&self) -> Option<&SharedAlbumOptions> {
        self.record.model("sharedAlbumOptions")
    }

    pub fn shareable_url(&self) -> Option<&str> {
        self.record.str("shareableUrl")
    }

    pub fn share_token(&self) -> Option<&str> {
        self.record.str("shareToken")
    }

    pub fn is_joined(&self) -> bool {
        self.record.boolean("isJoined")
    }

    pub fn is_owned(&self) -> bool {
        self.record.boolean("isOwned")
    }

    pub fn is_joinable(&self) -> bool {
        self.record.boolean("isJoinable")
    }
}

#[derive(Debug)]
pub struct Album {
    record: Record,
}

model!(Album, ALBUM);

impl Album {
    pub fn id(&self) -> Option<&str> {
        self.record.str("id")
    }

    pub fn title(&self) -> Option<&str> {
        self.record.str("title")
    }

    pub fn product_url(&self) -> Option<&str> {
        self.record.str("productUrl")
    }

    pub fn is_writeable(&self) -> bool {
        self.record.boolean("isWriteable")
    }

    pub fn share_info(&self) -> Option<&ShareInfo> {
        self.record.model("shareInfo")
    }

    // The API sends int64 counts as strings
    pub fn media_items_count(&self) -> Option<u64> {
        match self.record.value("mediaItemsCount")? {
            Value::String(count) => count.parse().ok(),
            Value::Number(count) => count.as_u64(),
            _ => None,
        }
    }

    pub fn cover_photo_base_url(&self) -> Option<&str> {
        self.record.str("coverPhotoBaseUrl")
    }

    pub fn cover_photo_media_item_id(&self) -> Option<&str> {
        self.record.str("coverPhotoMediaItemId")
    }
}

/// One page of `albums.list`.
#[derive(Debug)]
pub struct AlbumResponse {
    record: Record,
}

model!(AlbumResponse, ALBUM_RESPONSE);

impl AlbumResponse {
    pub fn albums(&self) -> impl Iterator<Item = &Album> + '_ {
        self.record.list("albums")
    }

    pub fn next_page_token(&self) -> Option<&str> {
        self.record.str("nextPageToken")
    }
}
