pub mod google;

use super::Result;
use crate::GoogleConfig;
use async_trait::async_trait;
use google::auth::InstalledFlowTokenSource;
use google::GoogleCalendarClient;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Page size requested from the API. 250 is the maximum it supports.
const PAGE_SIZE: u32 = 250;

/// A calendar on the user's calendar list.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq)]
pub struct CalendarSummary {
    /// The calendar title.
    pub summary: String,
    /// The calendar ID, usable in `calendars/{id}/events` requests.
    pub id: String,
}

impl From<google::models::CalendarListEntry> for CalendarSummary {
    fn from(entry: google::models::CalendarListEntry) -> Self {
        Self {
            summary: entry.summary,
            id: entry.id,
        }
    }
}

/// One page of calendars.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CalendarPage {
    pub calendars: Vec<CalendarSummary>,
    /// Token for the following page, if any.
    pub next_page_token: Option<String>,
}

/// Trait that needs to be implemented by a source of calendars.
#[async_trait]
pub trait CalendarSource: Send + Sync {
    /// Fetches a single page of calendars. `None` requests the first page.
    async fn fetch_page(&self, page_token: Option<String>) -> Result<CalendarPage>;
}

/// A `CalendarSource` that returns calendars from a static list of pages. Page tokens are the
/// page indices.
pub struct StaticCalendarSource {
    pages: Vec<Vec<CalendarSummary>>,
}

impl StaticCalendarSource {
    /// Creates a new `StaticCalendarSource` from an iterator of pages.
    pub fn new<I, P>(pages: I) -> StaticCalendarSource
    where
        I: IntoIterator<Item = P>,
        P: IntoIterator,
        P::Item: Into<CalendarSummary>,
    {
        StaticCalendarSource {
            pages: pages
                .into_iter()
                .map(|page| page.into_iter().map(Into::into).collect())
                .collect(),
        }
    }
}

#[async_trait]
impl CalendarSource for StaticCalendarSource {
    async fn fetch_page(&self, page_token: Option<String>) -> Result<CalendarPage> {
        let index = page_token
            .and_then(|token| token.parse::<usize>().ok())
            .unwrap_or(0);

        let calendars = self.pages.get(index).cloned().unwrap_or_default();
        let next_page_token = (index + 1 < self.pages.len()).then(|| (index + 1).to_string());

        Ok(CalendarPage {
            calendars,
            next_page_token,
        })
    }
}

#[derive(Debug)]
pub struct GoogleCalendarSource {
    client: GoogleCalendarClient,
}

impl GoogleCalendarSource {
    /// Creates a source on top of an already authorized client.
    pub fn new(client: GoogleCalendarClient) -> GoogleCalendarSource {
        GoogleCalendarSource { client }
    }

    /// Loads cached credentials or runs the installed application flow, then creates a client.
    pub async fn from_config(config: &GoogleConfig) -> Result<GoogleCalendarSource> {
        let token_source =
            InstalledFlowTokenSource::acquire(&config.credentials_file, &config.token_file)
                .await?;

        let client = GoogleCalendarClient::new(config, Arc::new(token_source))?;

        Ok(GoogleCalendarSource::new(client))
    }
}

#[async_trait]
impl CalendarSource for GoogleCalendarSource {
    async fn fetch_page(&self, page_token: Option<String>) -> Result<CalendarPage> {
        let (entries, next_page_token) = self
            .client
            .list_calendars(Some(PAGE_SIZE), page_token)
            .await?;

        Ok(CalendarPage {
            calendars: entries.into_iter().map(Into::into).collect(),
            next_page_token,
        })
    }
}

#[async_trait]
impl<T> CalendarSource for Arc<T>
where
    T: CalendarSource + ?Sized,
{
    async fn fetch_page(&self, page_token: Option<String>) -> Result<CalendarPage> {
        (**self).fetch_page(page_token).await
    }
}

/// The user's calendar list.
#[derive(Clone)]
pub struct CalendarList {
    source: Arc<dyn CalendarSource>,
}

impl CalendarList {
    /// Creates a new `CalendarList` from a calendar source.
    pub fn new<T>(source: T) -> CalendarList
    where
        T: CalendarSource + 'static,
    {
        CalendarList {
            source: Arc::new(source),
        }
    }

    /// Creates a new `CalendarList` backed by Google Calendar.
    pub async fn from_config(config: &GoogleConfig) -> Result<CalendarList> {
        Ok(CalendarList::new(
            GoogleCalendarSource::from_config(config).await?,
        ))
    }

    /// Fetches all calendars, following page tokens until the last page.
    pub async fn fetch_all(&self) -> Result<Vec<CalendarSummary>> {
        let mut calendars = Vec::new();
        let mut page_token = None;

        loop {
            let page = self.source.fetch_page(page_token.take()).await?;
            calendars.extend(page.calendars);

            match page.next_page_token {
                Some(token) => {
                    log::debug!("fetching next calendar page");
                    page_token = Some(token);
                }
                None => break,
            }
        }

        log::info!("found {} calendars", calendars.len());

        Ok(calendars)
    }
}

/// Renders calendars as a JSON array of `{"summary", "id"}` objects indented by two spaces.
pub fn to_json(calendars: &[CalendarSummary]) -> Result<String> {
    Ok(serde_json::to_string_pretty(calendars)?)
}
