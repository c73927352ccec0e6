use async_trait::async_trait;
use oauth2::basic::{BasicClient, BasicErrorResponse};
use oauth2::{AuthType, AuthUrl, ClientId, ClientSecret, RequestTokenError, TokenResponse, TokenUrl};
use tracing::{debug, error, instrument};

use super::TOKEN_PATH;
use crate::config::AmadeusConfig;
use crate::hotels::{AccessToken, TokenProvider};
use crate::{Result, TravelBookError};

/// OAuth2 client-credentials token source.
///
/// Every call performs a fresh grant; tokens are never cached.
pub struct AmadeusTokenProvider {
    client: Option<BasicClient>,
    token_url: String,
}

impl AmadeusTokenProvider {
    pub fn new(config: &AmadeusConfig) -> Result<Self> {
        let token_url = format!("{}{}", config.base_url.trim_end_matches('/'), TOKEN_PATH);

        let client = match (config.client_id.as_ref(), config.client_secret.as_ref()) {
            (Some(id), Some(secret)) => {
                // Amadeus has no authorization endpoint; the grant only uses the token URL
                let auth_url = AuthUrl::new(token_url.clone()).map_err(|e| {
                    TravelBookError::config(format!("Invalid Amadeus base URL: {e}"))
                })?;
                let token = TokenUrl::new(token_url.clone()).map_err(|e| {
                    TravelBookError::config(format!("Invalid Amadeus base URL: {e}"))
                })?;

                Some(
                    BasicClient::new(
                        ClientId::new(id.clone()),
                        Some(ClientSecret::new(secret.clone())),
                        auth_url,
                        Some(token),
                    )
                    .set_auth_type(AuthType::RequestBody),
                )
            }
            _ => None,
        };

        Ok(Self { client, token_url })
    }

    fn client(&self) -> Result<&BasicClient> {
        self.client.as_ref().ok_or_else(|| {
            TravelBookError::config(
                "Amadeus API credentials are missing. Set AMADEUS_API_KEY and AMADEUS_API_SECRET.",
            )
        })
    }
}

fn map_token_error<E>(err: RequestTokenError<E, BasicErrorResponse>) -> TravelBookError
where
    E: std::error::Error + 'static,
{
    match err {
        RequestTokenError::ServerResponse(response) => {
            error!("Amadeus token request rejected: {}", response);
            TravelBookError::authentication(format!(
                "Amadeus rejected the client credentials: {response}"
            ))
        }
        RequestTokenError::Request(e) => {
            TravelBookError::network(format!("Token request failed: {e}"))
        }
        RequestTokenError::Parse(e, _) => {
            TravelBookError::parse(format!("Failed to parse Amadeus token response: {e}"))
        }
        RequestTokenError::Other(message) => {
            TravelBookError::network(format!("Token request failed: {message}"))
        }
    }
}

#[async_trait]
impl TokenProvider for AmadeusTokenProvider {
    #[instrument(name = "amadeus_token", skip(self))]
    async fn get_token(&self) -> Result<AccessToken> {
        let token = self
            .client()?
            .exchange_client_credentials()
            .request_async(oauth2::reqwest::async_http_client)
            .await
            .map_err(map_token_error)?;

        let secret = token.access_token().secret();
        if secret.is_empty() {
            return Err(TravelBookError::authentication(
                "Amadeus returned an empty access token",
            ));
        }

        debug!(
            "Obtained token from {} valid for {}s",
            self.token_url,
            token.expires_in().map(|d| d.as_secs()).unwrap_or_default()
        );

        Ok(AccessToken::new(secret.clone()))
    }
}
