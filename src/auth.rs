use crate::api::{ApiClient, Profile};
use crate::error::AppError;
use backoff::future::retry_notify;
use backoff::Error as BackoffError;
use backoff::ExponentialBackoff;
use std::time::Duration;

/// Fixed spacing between profile-fetch retries.
const PROFILE_RETRY_INTERVAL: Duration = Duration::from_secs(1);
/// Budget for roughly three retries after the initial attempt.
const PROFILE_RETRY_BUDGET: Duration = Duration::from_millis(3500);

/// An authenticated session over the backend. The access token itself is
/// issued by the wallet/auth provider and treated as opaque here.
pub struct Session {
    api: ApiClient,
    profile: Option<Profile>,
}

impl Session {
    pub fn new(api: ApiClient) -> Self {
        Session { api, profile: None }
    }

    pub fn api(&self) -> &ApiClient {
        &self.api
    }

    pub fn is_authenticated(&self) -> bool {
        self.profile.is_some()
    }

    pub fn profile(&self) -> Option<&Profile> {
        self.profile.as_ref()
    }

    pub fn wallet_address(&self) -> Option<&str> {
        self.profile
            .as_ref()
            .and_then(|p| p.user.wallet_address.as_deref())
    }

    /// Install the provider-issued token and load the backend profile.
    pub async fn login(&mut self, token: String) -> Result<Profile, AppError> {
        self.api.set_token(Some(token));
        let profile = fetch_profile_with_retry(&self.api).await?;
        tracing::info!(user = %profile.user.id, "user profile fetched");
        self.profile = Some(profile.clone());
        Ok(profile)
    }

    pub async fn refresh(&mut self) -> Result<Profile, AppError> {
        let profile = fetch_profile_with_retry(&self.api).await?;
        self.profile = Some(profile.clone());
        Ok(profile)
    }

    pub fn logout(&mut self) {
        self.api.set_token(None);
        self.profile = None;
    }
}

/// Fetch `/api/users/me`, retrying 401s and transport failures at a fixed 1s
/// spacing. A freshly provisioned user may still be syncing on the backend,
/// which shows up as a transient 401.
pub async fn fetch_profile_with_retry(api: &ApiClient) -> Result<Profile, AppError> {
    if !api.has_token() {
        return Err(AppError::AuthError("no access token available".to_string()));
    }

    let policy = ExponentialBackoff {
        initial_interval: PROFILE_RETRY_INTERVAL,
        randomization_factor: 0.0,
        multiplier: 1.0,
        max_interval: PROFILE_RETRY_INTERVAL,
        max_elapsed_time: Some(PROFILE_RETRY_BUDGET),
        ..ExponentialBackoff::default()
    };

    retry_notify(
        policy,
        || async {
            match api.me().await {
                Ok(profile) => Ok(profile),
                Err(err @ AppError::AuthError(_)) | Err(err @ AppError::HttpError(_)) => {
                    Err(BackoffError::transient(err))
                }
                Err(err) => Err(BackoffError::permanent(err)),
            }
        },
        |err, duration: Duration| {
            tracing::warn!(
                "profile fetch failed: {}. Retrying in {:.1}s...",
                err,
                duration.as_secs_f32()
            );
        },
    )
    .await
}
