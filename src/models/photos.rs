use serde_json::Value;

use super::transformers::{model_processor, model_transformer};
use super::{FieldDescriptor, Record, Schema};

// Shapes follow the Photos Library REST resources:
// https://developers.google.com/photos/library/reference/rest/v1/mediaItems

lazy_static! {
    static ref PHOTO: Schema = Schema::new(
        "Photo",
        vec![
            FieldDescriptor::scalar("cameraMake"),
            FieldDescriptor::scalar("cameraModel"),
            FieldDescriptor::scalar("focalLength"),
            FieldDescriptor::scalar("apertureFNumber"),
            FieldDescriptor::scalar("isoEquivalent"),
            FieldDescriptor::scalar("exposureTime"),
        ]
    );
    static ref VIDEO: Schema = Schema::new(
        "Video",
        vec![
            FieldDescriptor::scalar("cameraMake"),
            FieldDescriptor::scalar("cameraModel"),
            FieldDescriptor::scalar("fps"),
            FieldDescriptor::scalar("status"),
        ]
    );
    static ref MEDIA_METADATA: Schema = Schema::new(
        "MediaMetadata",
        vec![
            FieldDescriptor::scalar("creationTime"),
            FieldDescriptor::scalar("width"),
            FieldDescriptor::scalar("height"),
            FieldDescriptor::nested("photo", model_transformer::<Photo>()),
            FieldDescriptor::nested("video", model_transformer::<Video>()),
        ]
    );
    static ref CONTRIBUTOR_INFO: Schema = Schema::new(
        "ContributorInfo",
        vec![
            FieldDescriptor::scalar("profilePictureBaseUrl"),
            FieldDescriptor::scalar("displayName"),
        ]
    );
    static ref MEDIA_ITEM: Schema = Schema::new(
        "MediaItem",
        vec![
            FieldDescriptor::scalar("id"),
            FieldDescriptor::scalar("description"),
            FieldDescriptor::scalar("productUrl"),
            FieldDescriptor::scalar("baseUrl"),
            FieldDescriptor::scalar("mimeType"),
            FieldDescriptor::nested("mediaMetadata", model_transformer::<MediaMetadata>()),
            FieldDescriptor::nested("contributorInfo", model_transformer::<ContributorInfo>()),
            FieldDescriptor::scalar("filename"),
        ]
    );
    static ref MEDIA_ITEM_SEARCH: Schema = Schema::new(
        "MediaItemSearch",
        vec![
            FieldDescriptor::list("mediaItems", model_processor::<MediaItem>()),
            FieldDescriptor::scalar("nextPageToken"),
        ]
    );
}

#[derive(Debug)]
pub struct Photo {
    record: Record,
}

model!(Photo, PHOTO);

impl Photo {
    pub fn camera_make(&self) -> Option<&str> {
        self.record.str("cameraMake")
    }

    pub fn camera_model(&self) -> Option<&str> {
        self.record.str("cameraModel")
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum VideoProcessingStatus {
    Unspecified,
    Processing,
    Ready,
    Failed,
}

impl VideoProcessingStatus {
    // Exact match only, "failed" is not FAILED
    pub fn parse(status: &str) -> Option<Self> {
        match status {
            "UNSPECIFIED" => Some(Self::Unspecified),
            "PROCESSING" => Some(Self::Processing),
            "READY" => Some(Self::Ready),
            "FAILED" => Some(Self::Failed),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Unspecified => "UNSPECIFIED",
            Self::Processing => "PROCESSING",
            Self::Ready => "READY",
            Self::Failed => "FAILED",
        }
    }
}

#[derive(Debug)]
pub struct Video {
    record: Record,
}

model!(Video, VIDEO);

impl Video {
    pub fn fps(&self) -> Option<f64> {
        self.record.value("fps").and_then(Value::as_f64)
    }

    pub fn status(&self) -> Option<VideoProcessingStatus> {
        self.record
            .str("status")
            .and_then(VideoProcessingStatus::parse)
    }
}

#[derive(Debug)]
pub struct MediaMetadata {
    record: Record,
}

model!(MediaMetadata, MEDIA_METADATA);

impl MediaMetadata {
    pub fn creation_time(&self) -> Option<&str> {
        self.record.str("creationTime")
    }

    pub fn photo(&self) -> Option<&Photo> {
        self.record.model("photo")
    }

    pub fn video(&self) -> Option<&Video> {
        self.record.model("video")
    }

    pub fn has_failed_processing(&self) -> bool {
        self.video_status() == Some(VideoProcessingStatus::Failed)
    }

    pub fn is_processing(&self) -> bool {
        self.video_status() == Some(VideoProcessingStatus::Processing)
    }

    fn video_status(&self) -> Option<VideoProcessingStatus> {
        self.video().and_then(Video::status)
    }
}

#[derive(Debug)]
pub struct ContributorInfo {
    record: Record,
}

model!(ContributorInfo, CONTRIBUTOR_INFO);

impl ContributorInfo {
    pub fn display_name(&self) -> Option<&str> {
        self.record.str("displayName")
    }

    pub fn profile_picture_base_url(&self) -> Option<&str> {
        self.record.str("profilePictureBaseUrl")
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MediaType {
    Video,
    Picture,
}

impl MediaType {
    pub fn from_mime_type(mime_type: Option<&str>) -> Self {
        match mime_type {
            Some(mime) if mime.starts_with("video") => Self::Video,
            _ => Self::Picture,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Video => "video",
            Self::Picture => "image",
        }
    }
}

#[derive(Debug)]
pub struct MediaItem {
    record: Record,
    media_type: MediaType,
}

model!(MediaItem, MEDIA_ITEM {
    fn from_source(source: &Value) -> Self {
        let record = Record::build(&*MEDIA_ITEM, source);
        let media_type = MediaType::from_mime_type(record.str("mimeType"));
        Self { record, media_type }
    }

    // Derived, so it is written out but never counts towards emptiness
    fn derived_fields(&self) -> Vec<(&'static str, Value)> {
        vec![("mediaType", Value::from(self.media_type.as_str()))]
    }
});

impl MediaItem {
    pub fn id(&self) -> Option<&str> {
        self.record.str("id")
    }

    pub fn description(&self) -> Option<&str> {
        self.record.str("description")
    }

    pub fn base_url(&self) -> Option<&str> {
        self.record.str("baseUrl")
    }

    pub fn mime_type(&self) -> Option<&str> {
        self.record.str("mimeType")
    }

    pub fn filename(&self) -> Option<&str> {
        self.record.str("filename")
    }

    pub fn media_metadata(&self) -> Option<&MediaMetadata> {
        self.record.model("mediaMetadata")
    }

    pub fn contributor_info(&self) -> Option<&ContributorInfo> {
        self.record.model("contributorInfo")
    }

    pub fn media_type(&self) -> MediaType {
        self.media_type
    }

    pub fn is_picture(&self) -> bool {
        self.media_type == MediaType::Picture
    }

    pub fn is_video(&self) -> bool {
        self.media_type == MediaType::Video
    }

    /// `None` for pictures; processing state only exists for videos.
    pub fn has_failed_processing(&self) -> Option<bool> {
        self.video_metadata(MediaMetadata::has_failed_processing)
    }

    /// `None` for pictures; processing state only exists for videos.
    pub fn is_processing(&self) -> Option<bool> {
        self.video_metadata(MediaMetadata::is_processing)
    }

    /// Pictures, and videos that finished processing.
    pub fn is_displayable(&self) -> bool {
        !(self.has_failed_processing().unwrap_or(false) || self.is_processing().unwrap_or(false))
    }

    fn video_metadata<F>(&self, check: F) -> Option<bool>
    where
        F: Fn(&MediaMetadata) -> bool,
    {
        if !self.is_video() {
            return None;
        }
        Some(self.media_metadata().map(check).unwrap_or(false))
    }
}

/// One page of `mediaItems.search`.
#[derive(Debug)]
pub struct MediaItemSearch {
    record: Record,
}

model!(MediaItemSearch, MEDIA_ITEM_SEARCH);

impl MediaItemSearch {
    pub fn media_items(&self) -> impl Iterator<Item = &MediaItem> + '_ {
        self.record.list("mediaItems")
    }

    pub fn next_page_token(&self) -> Option<&str> {
        self.record.str("nextPageToken")
    }
}
