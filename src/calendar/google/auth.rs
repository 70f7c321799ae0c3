use super::ClientError;
use async_trait::async_trait;
use std::future::Future;
use std::path::Path;
use std::pin::Pin;
use yup_oauth2::authenticator::DefaultAuthenticator;
use yup_oauth2::authenticator_delegate::InstalledFlowDelegate;
use yup_oauth2::{InstalledFlowAuthenticator, InstalledFlowReturnMethod};

/// Full read/write access to the user's calendars.
pub const CALENDAR_SCOPE: &str = "https://www.googleapis.com/auth/calendar";

/// Something that hands out OAuth2 access tokens.
#[async_trait]
pub trait TokenSource: Send + Sync {
    /// Returns a valid access token, refreshing or acquiring one if necessary.
    async fn token(&self) -> Result<String, ClientError>;
}

/// A `TokenSource` that always returns the same token.
#[derive(Debug, Clone)]
pub struct StaticTokenSource(pub String);

#[async_trait]
impl TokenSource for StaticTokenSource {
    async fn token(&self) -> Result<String, ClientError> {
        Ok(self.0.clone())
    }
}

// Prints the authorization URL to stderr instead of stdout, which is reserved for the tool's
// output.
struct StderrFlowDelegate;

impl InstalledFlowDelegate for StderrFlowDelegate {
    fn present_user_url<'a>(
        &'a self,
        url: &'a str,
        _need_code: bool,
    ) -> Pin<Box<dyn Future<Output = Result<String, String>> + Send + 'a>> {
        Box::pin(async move {
            eprintln!("Please open the following URL in your browser to authorize access:\n\n  {url}\n");
            Ok(String::new())
        })
    }
}

/// A `TokenSource` backed by the OAuth2 installed application flow.
///
/// Tokens are cached on disk. Expired access tokens are refreshed with the cached refresh token;
/// only if there is no usable cache the user is asked to authorize access in the browser. The
/// redirect is received by a loopback server on an ephemeral port.
pub struct InstalledFlowTokenSource {
    authenticator: DefaultAuthenticator,
    scopes: Vec<String>,
}

impl InstalledFlowTokenSource {
    /// Reads the client secret from `credentials_file` and makes sure a token is available,
    /// running the authorization flow and persisting its result to `token_file` if needed.
    pub async fn acquire(
        credentials_file: &Path,
        token_file: &Path,
    ) -> Result<InstalledFlowTokenSource, ClientError> {
        if token_file.exists() {
            log::info!("loading cached credentials from {}", token_file.display());
        } else {
            log::info!(
                "no cached credentials at {}; starting authorization flow",
                token_file.display()
            );
        }

        let secret = yup_oauth2::read_application_secret(credentials_file)
            .await
            .map_err(|source| ClientError::ClientSecret {
                path: credentials_file.to_owned(),
                source,
            })?;

        let authenticator = InstalledFlowAuthenticator::builder(
            secret,
            InstalledFlowReturnMethod::HTTPRedirect,
        )
        .persist_tokens_to_disk(token_file)
        .flow_delegate(Box::new(StderrFlowDelegate))
        .build()
        .await
        .map_err(ClientError::Authenticator)?;

        let source = InstalledFlowTokenSource {
            authenticator,
            scopes: vec![CALENDAR_SCOPE.to_owned()],
        };

        // Acquire eagerly so the flow runs (and the cache is written) before any API request.
        source.token().await?;

        Ok(source)
    }
}

#[async_trait]
impl TokenSource for InstalledFlowTokenSource {
    async fn token(&self) -> Result<String, ClientError> {
        let token = self.authenticator.token(&self.scopes).await?;

        token
            .token()
            .map(ToOwned::to_owned)
            .ok_or(ClientError::MissingToken)
    }
}
