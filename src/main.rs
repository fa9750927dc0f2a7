#[macro_use]
extern crate log;

use clap::Parser;
use serde::Serialize;
use serde_json::Value;
use std::io::{self, Read};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

use photoframe::api::{cache::CacheError, CachedPhotosClient, LibraryApiError, PhotosClient};
use photoframe::credentials::{self, Credentials, CredentialsError};
use photoframe::models::{Album, AlbumResponse, MediaItem, MediaItemSearch, Model, ModelError, Serializable};
use photoframe::settings::Settings;

mod cli;
use cli::{Cli, Commands, ConvertTarget};

#[derive(Error, Debug)]
enum FrameError {
    #[error(transparent)]
    Api(#[from] LibraryApiError),
    #[error(transparent)]
    Cache(#[from] CacheError),
    #[error(transparent)]
    Credentials(#[from] CredentialsError),
    #[error(transparent)]
    Model(#[from] ModelError),
    #[error("Could not read payload: {0}")]
    Io(#[from] io::Error),
    #[error("Payload is not JSON: {0}")]
    Json(#[from] serde_json::Error),
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let cli = Cli::parse();
    let level = if cli.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    let settings = Settings::new_from_env();
    if let Err(e) = run(cli, settings).await {
        error!("{}", e);
        eprintln!("photoframe: {}", e);
        std::process::exit(1);
    }
}

async fn run(cli: Cli, settings: Settings) -> Result<(), FrameError> {
    match cli.command {
        Commands::Convert { model, file } => {
            let source = read_payload(file.as_deref())?;
            print_json(&convert(model, &source)?)
        }
        Commands::Login { token, expires_in } => {
            let credentials = Credentials::new(token, expires_in.map(Duration::from_secs));
            credentials.save(&settings.credentials_path())?;
            info!("Token stored.");
            Ok(())
        }
        Commands::Logout => {
            credentials::logout(&settings.credentials_path())?;
            let api = Arc::new(PhotosClient::new(&settings.api_endpoint)?);
            CachedPhotosClient::new(api, settings)?.clear_all().await?;
            info!("Logged out.");
            Ok(())
        }
        Commands::Albums => {
            let client = connect(settings)?;
            print_json(&client.get_albums(&cli.user).await?)
        }
        Commands::Queue => {
            let client = connect(settings)?;
            print_json(&client.get_queue(&cli.user).await?)
        }
        Commands::LoadAlbum { id, photos } => {
            let client = connect(settings)?;
            print_json(&client.load_from_album(&cli.user, &id, photos).await?)
        }
    }
}

fn connect(settings: Settings) -> Result<CachedPhotosClient, FrameError> {
    let credentials = Credentials::retrieve(&settings.credentials_path())?;
    if credentials.token_expired() {
        warn!("Stored token has expired, requests will likely be rejected");
    }

    let api = PhotosClient::new(&settings.api_endpoint)?;
    api.update_token(credentials.access_token);
    Ok(CachedPhotosClient::new(Arc::new(api), settings)?)
}

fn convert(target: ConvertTarget, source: &Value) -> Result<Value, ModelError> {
    Ok(match target {
        ConvertTarget::Album => Album::try_from_source(source)?.to_json(),
        ConvertTarget::AlbumResponse => AlbumResponse::try_from_source(source)?.to_json(),
        ConvertTarget::MediaItem => MediaItem::try_from_source(source)?.to_json(),
        ConvertTarget::MediaSearch => MediaItemSearch::try_from_source(source)?.to_json(),
    })
}

fn read_payload(file: Option<&Path>) -> Result<Value, FrameError> {
    let content = match file {
        Some(path) => std::fs::read_to_string(path)?,
        None => {
            let mut content = String::new();
            io::stdin().read_to_string(&mut content)?;
            content
        }
    };
    Ok(serde_json::from_str(&content)?)
}

fn print_json<T>(value: &T) -> Result<(), FrameError>
where
    T: Serialize,
{
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
