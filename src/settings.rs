use directories::ProjectDirs;
use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

const PREFIX: &str = "PHOTOFRAME_";

pub const DEFAULT_ENDPOINT: &str = "https://photoslibrary.googleapis.com";

fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("com", "photoframe", "photoframe")
}

#[derive(Clone, Debug, PartialEq)]
pub struct Settings {
    pub api_endpoint: String,
    // Negative loads everything a search returns
    pub photos_to_load: i64,
    pub search_page_size: usize,
    pub album_page_size: usize,
    pub album_cache_ttl: Duration,
    // Base URLs stop working after an hour
    pub media_item_cache_ttl: Duration,
    pub cache_dir: PathBuf,
    pub config_dir: PathBuf,
}

impl Settings {
    pub fn new_from_env() -> Self {
        Self::new_from_vars(|name| env::var(name).ok())
    }

    /// Builds the settings from `PHOTOFRAME_*` variables as returned by
    /// `lookup`, keeping the default for anything unset or unparseable.
    pub fn new_from_vars<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let var = |name: &str| lookup(&format!("{}{}", PREFIX, name));
        let seconds = |name: &str, default: Duration| {
            Duration::from_secs(parse_or(var(name), name, default.as_secs()))
        };

        Self {
            api_endpoint: var("API_ENDPOINT").unwrap_or(defaults.api_endpoint),
            photos_to_load: parse_or(var("PHOTOS_TO_LOAD"), "PHOTOS_TO_LOAD", defaults.photos_to_load),
            search_page_size: parse_or(
                var("SEARCH_PAGE_SIZE"),
                "SEARCH_PAGE_SIZE",
                defaults.search_page_size,
            ),
            album_page_size: parse_or(
                var("ALBUM_PAGE_SIZE"),
                "ALBUM_PAGE_SIZE",
                defaults.album_page_size,
            ),
            album_cache_ttl: seconds("ALBUM_CACHE_TTL", defaults.album_cache_ttl),
            media_item_cache_ttl: seconds("MEDIA_ITEM_CACHE_TTL", defaults.media_item_cache_ttl),
            cache_dir: var("CACHE_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.cache_dir),
            config_dir: var("CONFIG_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.config_dir),
        }
    }

    pub fn credentials_path(&self) -> PathBuf {
        self.config_dir.join("credentials.json")
    }
}

fn parse_or<T>(value: Option<String>, name: &str, default: T) -> T
where
    T: FromStr,
{
    match value {
        None => default,
        Some(value) => value.trim().parse().unwrap_or_else(|_| {
            warn!("Ignoring {}{}={:?}, not a valid value", PREFIX, name, value);
            default
        }),
    }
}

impl Default for Settings {
    fn default() -> Self {
        let dirs = project_dirs();
        Self {
            api_endpoint: DEFAULT_ENDPOINT.to_string(),
            photos_to_load: 150,
            search_page_size: 100,
            album_page_size: 50,
            album_cache_ttl: Duration::from_secs(10 * 60),
            media_item_cache_ttl: Duration::from_secs(55 * 60),
            cache_dir: dirs
                .as_ref()
                .map(|dirs| dirs.cache_dir().to_path_buf())
                .unwrap_or_else(|| PathBuf::from(".photoframe/cache")),
            config_dir: dirs
                .as_ref()
                .map(|dirs| dirs.config_dir().to_path_buf())
                .unwrap_or_else(|| PathBuf::from(".photoframe")),
        }
    }
}

#[cfg(test)]
mod tests {

    use super::*;
    use std::collections::HashMap;

    fn from_map(vars: &[(&str, &str)]) -> Settings {
        let vars = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect::<HashMap<String, String>>();
        Settings::new_from_vars(|name| vars.get(name).cloned())
    }

    #[test]
    fn test_defaults() {
        let settings = from_map(&[]);
        assert_eq!(settings, Settings::default());
        assert_eq!(settings.photos_to_load, 150);
        assert_eq!(settings.search_page_size, 100);
        assert_eq!(settings.album_page_size, 50);
        assert_eq!(settings.album_cache_ttl, Duration::from_secs(600));
        assert_eq!(settings.media_item_cache_ttl, Duration::from_secs(3300));
    }

    #[test]
    fn test_overrides() {
        let settings = from_map(&[
            ("PHOTOFRAME_API_ENDPOINT", "http://localhost:8080"),
            ("PHOTOFRAME_PHOTOS_TO_LOAD", "-1"),
            ("PHOTOFRAME_ALBUM_CACHE_TTL", " 30 "),
            ("PHOTOFRAME_CACHE_DIR", "/tmp/frame"),
        ]);
        assert_eq!(settings.api_endpoint, "http://localhost:8080");
        assert_eq!(settings.photos_to_load, -1);
        assert_eq!(settings.album_cache_ttl, Duration::from_secs(30));
        assert_eq!(settings.cache_dir, PathBuf::from("/tmp/frame"));
    }

    #[test]
    fn test_invalid_values_fall_back() {
        let settings = from_map(&[
            ("PHOTOFRAME_SEARCH_PAGE_SIZE", "lots"),
            ("PHOTOFRAME_MEDIA_ITEM_CACHE_TTL", "-5"),
        ]);
        assert_eq!(settings.search_page_size, 100);
        assert_eq!(settings.media_item_cache_ttl, Duration::from_secs(3300));
    }

    #[test]
    fn test_credentials_path() {
        let settings = from_map(&[("PHOTOFRAME_CONFIG_DIR", "/etc/frame")]);
        assert_eq!(
            settings.credentials_path(),
            PathBuf::from("/etc/frame/credentials.json")
        );
    }
}
