use serde::Deserialize;

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all(deserialize = "camelCase"))]
pub struct DefaultReminder {
    pub method: String,
    pub minutes: u32,
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all(deserialize = "camelCase"))]
pub struct CalendarListEntry {
    pub id: String,
    #[serde(default)]
    pub summary: String,
    pub summary_override: Option<String>,
    pub description: Option<String>,
    pub time_zone: Option<String>,
    pub access_role: Option<String>,
    #[serde(default)]
    pub primary: bool,
    #[serde(default)]
    pub selected: bool,
    #[serde(default)]
    pub default_reminders: Vec<DefaultReminder>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all(deserialize = "camelCase"))]
pub struct CalendarList {
    pub kind: Option<String>,
    pub etag: Option<String>,
    pub next_page_token: Option<String>,
    pub next_sync_token: Option<String>,
    #[serde(default)]
    pub items: Vec<CalendarListEntry>,
}
