//! [`CalendarService`] implementation for Google Calendar.

use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use gcalcl_core::Event;

use crate::error::{ProviderError, ProviderResult};
use crate::service::{
    BoxFuture, CalendarInfo, CalendarService, DeleteItem, EventQuery, EventRef, PRIMARY_CALENDAR,
    QuickAddItem,
};

use super::client::GoogleCalendarClient;
use super::config::GoogleConfig;
use super::oauth::OAuthClient;
use super::tokens::{TokenInfo, TokenStorage};

const SERVICE_NAME: &str = "google";

/// Google Calendar service.
///
/// Holds the OAuth tokens in memory, refreshing and persisting them when the
/// access token expires.
pub struct GoogleService {
    config: GoogleConfig,
    token_storage: TokenStorage,
    oauth_client: OAuthClient,
    api_client: GoogleCalendarClient,
    tokens: RwLock<Option<TokenInfo>>,
}

impl GoogleService {
    /// Creates the service and loads any stored tokens.
    ///
    /// No network request is made. An unreadable token file is logged and
    /// treated as absent so that `auth google` can overwrite it.
    pub fn new(config: GoogleConfig) -> ProviderResult<Self> {
        config.validate()?;

        let token_storage = TokenStorage::new(&config.token_path);
        let tokens = token_storage.load().unwrap_or_else(|e| {
            warn!("ignoring stored tokens: {}", e);
            None
        });

        Ok(Self {
            oauth_client: OAuthClient::new(config.credentials.clone(), config.timeout)?,
            api_client: GoogleCalendarClient::new(config.timeout, &config.user_agent)?,
            token_storage,
            tokens: RwLock::new(tokens),
            config,
        })
    }

    /// Runs the browser authorization flow and stores the new tokens.
    pub async fn authenticate(&self) -> ProviderResult<()> {
        info!("starting Google authentication flow");
        let tokens = self
            .oauth_client
            .authorize(&self.config.scopes, self.config.loopback_port_range)
            .await?;
        self.token_storage.save(&tokens)?;
        *self.tokens.write().await = Some(tokens);
        info!("stored tokens at {}", self.token_storage.path().display());
        Ok(())
    }

    /// Returns true when a usable or refreshable token is stored.
    pub async fn is_authenticated(&self) -> bool {
        self.tokens
            .read()
            .await
            .as_ref()
            .is_some_and(|t| !t.is_expired() || t.refresh_token.is_some())
    }

    /// Returns true when the stored tokens lack a configured scope.
    pub async fn needs_reauth(&self) -> bool {
        match self.tokens.read().await.as_ref() {
            Some(tokens) => !tokens.has_scopes(&self.config.scopes),
            None => true,
        }
    }

    /// Returns a valid access token, refreshing it first when expired.
    async fn access_token(&self) -> ProviderResult<String> {
        if let Some(tokens) = self.tokens.read().await.as_ref()
            && !tokens.is_expired()
        {
            return Ok(tokens.access_token.clone());
        }

        let mut guard = self.tokens.write().await;
        let tokens = guard.clone().ok_or_else(|| {
            ProviderError::authentication("not authenticated, run 'gcalcl auth google'")
        })?;
        // Another caller may have refreshed while we waited for the lock.
        if !tokens.is_expired() {
            return Ok(tokens.access_token);
        }

        debug!("access token expired, refreshing");
        let refreshed = self.oauth_client.refresh(tokens).await?;
        self.token_storage.save(&refreshed)?;
        let access_token = refreshed.access_token.clone();
        *guard = Some(refreshed);
        info!("refreshed Google access token");
        Ok(access_token)
    }

    fn tag(error: ProviderError) -> ProviderError {
        error.with_provider(SERVICE_NAME)
    }
}

impl CalendarService for GoogleService {
    fn name(&self) -> &str {
        SERVICE_NAME
    }

    fn list_calendars(&self) -> BoxFuture<'_, ProviderResult<Vec<CalendarInfo>>> {
        Box::pin(async move {
            let token = self.access_token().await.map_err(Self::tag)?;
            self.api_client.list_calendars(&token).await.map_err(Self::tag)
        })
    }

    fn list_events(&self, query: EventQuery) -> BoxFuture<'_, ProviderResult<Vec<Event>>> {
        Box::pin(async move {
            let token = self.access_token().await.map_err(Self::tag)?;
            self.api_client
                .list_events(&token, &query)
                .await
                .map_err(Self::tag)
        })
    }

    fn quick_add_batch(
        &self,
        calendar_id: String,
        items: Vec<QuickAddItem>,
    ) -> BoxFuture<'_, ProviderResult<Vec<Event>>> {
        Box::pin(async move {
            let token = self.access_token().await.map_err(Self::tag)?;
            self.api_client
                .quick_add_batch(&token, &calendar_id, &items)
                .await
                .map_err(Self::tag)
        })
    }

    fn delete_batch(&self, items: Vec<DeleteItem>) -> BoxFuture<'_, ProviderResult<()>> {
        Box::pin(async move {
            let token = self.access_token().await.map_err(Self::tag)?;
            self.api_client
                .delete_batch(&token, &items)
                .await
                .map_err(Self::tag)
        })
    }

    fn delete_event(&self, target: EventRef) -> BoxFuture<'_, ProviderResult<()>> {
        Box::pin(async move {
            let token = self.access_token().await.map_err(Self::tag)?;
            self.api_client
                .delete_event(&token, &target)
                .await
                .map_err(Self::tag)
        })
    }

    fn check_token(&self) -> BoxFuture<'_, ProviderResult<()>> {
        Box::pin(async move {
            let query = EventQuery::new(PRIMARY_CALENDAR).with_max_results(1);
            self.list_events(query).await.map(|_| ())
        })
    }
}
