use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::Path;
use std::time::{Duration, SystemTime};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CredentialsError {
    #[error("Not logged in, no credentials at {0}")]
    NoCredentials(String),
    #[error("Could not access credentials: {0}")]
    Io(#[from] io::Error),
    #[error("Could not read credentials: {0}")]
    Parse(#[from] serde_json::Error),
}

#[derive(Deserialize, Serialize, Clone, Debug, PartialEq)]
pub struct Credentials {
    pub access_token: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token_expiry_time: Option<SystemTime>,
}

impl Credentials {
    pub fn new(access_token: String, expires_in: Option<Duration>) -> Self {
        Self {
            access_token,
            refresh_token: None,
            token_expiry_time: expires_in.map(|duration| SystemTime::now() + duration),
        }
    }

    // A token without a known expiry is used until the API rejects it
    pub fn token_expired(&self) -> bool {
        match self.token_expiry_time {
            Some(v) => SystemTime::now() > v,
            None => false,
        }
    }

    pub fn retrieve(path: &Path) -> Result<Self, CredentialsError> {
        let content = fs::read(path).map_err(|e| match e.kind() {
            io::ErrorKind::NotFound => CredentialsError::NoCredentials(path.display().to_string()),
            _ => e.into(),
        })?;
        Ok(serde_json::from_slice(&content)?)
    }

    pub fn save(&self, path: &Path) -> Result<(), CredentialsError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let encoded = serde_json::to_vec_pretty(&self)?;
        fs::write(path, encoded)?;
        Ok(())
    }
}

pub fn logout(path: &Path) -> Result<(), CredentialsError> {
    match fs::remove_file(path) {
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        result => Ok(result?),
    }
}
