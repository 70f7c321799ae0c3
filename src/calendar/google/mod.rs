pub mod auth;
pub mod models;

use crate::GoogleConfig;
use auth::TokenSource;
use indexmap::IndexMap;
use reqwest::header::{ACCEPT_ENCODING, AUTHORIZATION, HeaderMap, HeaderValue};
use reqwest::{Request, Response};
use reqwest_middleware::{ClientBuilder, ClientWithMiddleware, Middleware, Next};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use task_local_extensions::Extensions;

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// Error while reading the OAuth2 client secret.
    #[error("failed to read client secret from {}: {source}", .path.display())]
    ClientSecret {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Error while setting up the installed application flow.
    #[error("failed to set up authenticator: {0}")]
    Authenticator(std::io::Error),

    /// Error while authorizing with google.
    #[error("failed to authorize: {0}")]
    OAuth(#[from] yup_oauth2::Error),

    /// The authorization server returned no access token.
    #[error("authorization returned no access token")]
    MissingToken,

    /// Error while making a http request.
    #[error("failure requesting remote resource: {0}")]
    Request(#[from] reqwest::Error),

    /// Error while executing some middleware code.
    #[error("request middleware failed with: {0}")]
    RequestMiddleware(#[from] reqwest_middleware::Error),

    /// Error while building http headers.
    #[error("encountered invalid HTTP header value: {0}")]
    InvalidHeaderValue(#[from] reqwest::header::InvalidHeaderValue),

    /// Error while parsing a JSON response.
    #[error("failed to parse response as JSON: {0}")]
    Json(#[from] serde_json::Error),
}

impl From<ClientError> for reqwest_middleware::Error {
    fn from(err: ClientError) -> Self {
        reqwest_middleware::Error::Middleware(anyhow::Error::new(err))
    }
}

struct AuthMiddleware {
    token_source: Arc<dyn TokenSource>,
}

impl AuthMiddleware {
    fn new(token_source: Arc<dyn TokenSource>) -> AuthMiddleware {
        AuthMiddleware { token_source }
    }
}

#[async_trait::async_trait]
impl Middleware for AuthMiddleware {
    async fn handle(
        &self,
        mut req: Request,
        extensions: &mut Extensions,
        next: Next<'_>,
    ) -> reqwest_middleware::Result<Response> {
        let token = self.token_source.token().await?;

        let mut header =
            HeaderValue::try_from(format!("Bearer {token}")).map_err(ClientError::from)?;
        header.set_sensitive(true);
        req.headers_mut().insert(AUTHORIZATION, header);
        next.run(req, extensions).await
    }
}

/// Google calendar client for making requests to the google calendar api
#[derive(Debug)]
pub struct GoogleCalendarClient {
    client: ClientWithMiddleware,
    base_url: String,
}

impl GoogleCalendarClient {
    /// Creates a new google calendar client. Every request is authorized with a bearer token
    /// obtained from `token_source`.
    pub fn new(
        config: &GoogleConfig,
        token_source: Arc<dyn TokenSource>,
    ) -> Result<GoogleCalendarClient, ClientError> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT_ENCODING, HeaderValue::from_str("gzip")?);

        let client = ClientBuilder::new(
            reqwest::Client::builder()
                .default_headers(headers)
                .timeout(Duration::from_secs(config.timeout_secs))
                .build()?,
        )
        .with(AuthMiddleware::new(token_source))
        .build();

        Ok(GoogleCalendarClient {
            client,
            base_url: config.base_url.trim_end_matches('/').to_owned(),
        })
    }

    /// Lists the calendars on the user's calendar list. If the result does not fit into a single
    /// page a page token is returned that should be passed to the next request to get the next
    /// page of calendars.
    pub async fn list_calendars(
        &self,
        max_results: Option<u32>,
        page_token: Option<String>,
    ) -> Result<(Vec<models::CalendarListEntry>, Option<String>), ClientError> {
        let query = build_query_parameters(&max_results, &page_token);

        let calendars = self
            .client
            .get(format!("{}/users/me/calendarList", self.base_url))
            .query(&query)
            .send()
            .await?
            .error_for_status()?
            .json::<models::CalendarList>()
            .await?;

        log::debug!(
            "fetched {} calendars from Google Calendar",
            calendars.items.len()
        );

        Ok((calendars.items, calendars.next_page_token))
    }
}

fn build_query_parameters(
    max_results: &Option<u32>,
    page_token: &Option<String>,
) -> IndexMap<&'static str, String> {
    // see: https://developers.google.com/calendar/api/v3/reference/calendarList/list
    let mut query_parameters = IndexMap::new();

    if let Some(count) = max_results {
        // limit the number of entries per page
        query_parameters.insert("maxResults", count.to_string());
    }

    if let Some(token) = page_token {
        // page token returned by previous request to fetch the next page
        query_parameters.insert("pageToken", token.clone());
    }

    query_parameters
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn build_query_parameters_without_parameters() {
        let query_parameters = build_query_parameters(&None, &None);

        assert!(query_parameters.is_empty());
    }

    #[test]
    fn build_query_parameters_with_max_results() {
        let query_parameters = build_query_parameters(&Some(250), &None);

        let expected_parameters = IndexMap::from([("maxResults", "250".to_owned())]);

        assert_eq!(expected_parameters, query_parameters);
    }

    #[test]
    fn build_query_parameters_with_max_results_and_page_token() {
        let query_parameters = build_query_parameters(&Some(250), &Some("abcd".to_owned()));

        let expected_parameters = IndexMap::from([
            ("maxResults", "250".to_owned()),
            ("pageToken", "abcd".to_owned()),
        ]);

        assert_eq!(expected_parameters, query_parameters);
    }

    #[test]
    fn query_parameters_serialize_in_insertion_order() {
        let query_parameters = build_query_parameters(&Some(250), &Some("abcd".to_owned()));

        assert_eq!(
            serde_json::to_string(&query_parameters).unwrap(),
            r#"{"maxResults":"250","pageToken":"abcd"}"#
        );
    }

    #[test]
    fn base_url_trailing_slash_is_dropped() {
        let config = GoogleConfig {
            base_url: "http://localhost:1234/calendar/v3/".into(),
            ..Default::default()
        };

        let client = GoogleCalendarClient::new(
            &config,
            Arc::new(auth::StaticTokenSource("token".into())),
        )
        .unwrap();

        assert_eq!(client.base_url, "http://localhost:1234/calendar/v3");
    }
}
