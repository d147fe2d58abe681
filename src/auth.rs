//! Credential resolution for the warehouse client.
//!
//! Either an explicit service-account key file or the platform default chain
//! (`GOOGLE_APPLICATION_CREDENTIALS`, gcloud ADC, metadata server). Scopes are
//! the BigQuery HTTP client's own.

use std::path::{Path, PathBuf};

use google_cloud_auth::credentials::CredentialsFile;
use google_cloud_bigquery::client::HttpClientConfig;
use google_cloud_token::TokenSourceProvider;
use tracing::info;

const SERVICE_ACCOUNT_TYPE: &str = "service_account";

#[derive(Debug, thiserror::Error)]
pub enum CredentialsError {
    #[error("cannot read credentials file {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: google_cloud_auth::error::Error,
    },

    #[error("credentials file {} holds a {found:?} credential, expected a service account key", path.display())]
    NotServiceAccount { path: PathBuf, found: String },

    #[error("credentials in {} were rejected: {source}", path.display())]
    Rejected {
        path: PathBuf,
        #[source]
        source: google_cloud_auth::error::Error,
    },

    #[error("default credentials unavailable: {0}")]
    Default(#[source] google_cloud_auth::error::Error),
}

/// Resolve a token provider, preferring the explicit key file when one is given.
///
/// Construction fetches a first token, so bad credentials fail here rather
/// than on the first warehouse call.
pub async fn token_provider(
    credentials_path: Option<&Path>,
) -> Result<Box<dyn TokenSourceProvider>, CredentialsError> {
    match credentials_path {
        Some(path) => {
            let file = read_service_account(path).await?;
            info!(path = %path.display(), "using service account credentials");
            let provider = HttpClientConfig::default_token_provider_with(file)
                .await
                .map_err(|source| CredentialsError::Rejected {
                    path: path.to_path_buf(),
                    source,
                })?;
            Ok(Box::new(provider))
        }
        None => {
            info!("using default credential chain");
            let provider = HttpClientConfig::default_token_provider()
                .await
                .map_err(CredentialsError::Default)?;
            Ok(Box::new(provider))
        }
    }
}

/// Load a key file and check it is a service-account credential.
pub async fn read_service_account(path: &Path) -> Result<CredentialsFile, CredentialsError> {
    let file = CredentialsFile::new_from_file(path.to_string_lossy().into_owned())
        .await
        .map_err(|source| CredentialsError::Read {
            path: path.to_path_buf(),
            source,
        })?;

    if file.tp != SERVICE_ACCOUNT_TYPE {
        return Err(CredentialsError::NotServiceAccount {
            path: path.to_path_buf(),
            found: file.tp,
        });
    }
    Ok(file)
}
