use gcal_tools::calendar::google::auth::StaticTokenSource;
use gcal_tools::calendar::google::GoogleCalendarClient;
use gcal_tools::calendar::{self, CalendarList, GoogleCalendarSource};
use gcal_tools::GoogleConfig;
use serde_json::json;
use std::sync::Arc;
use wiremock::matchers::{header, method, path, query_param, query_param_is_missing};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn calendar_list(server: &MockServer) -> CalendarList {
    let config = GoogleConfig {
        base_url: server.uri(),
        ..Default::default()
    };

    let client =
        GoogleCalendarClient::new(&config, Arc::new(StaticTokenSource("test-token".into())))
            .unwrap();

    CalendarList::new(GoogleCalendarSource::new(client))
}

#[tokio::test]
async fn lists_calendars_across_pages() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/users/me/calendarList"))
        .and(header("authorization", "Bearer test-token"))
        .and(query_param("maxResults", "250"))
        .and(query_param_is_missing("pageToken"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "kind": "calendar#calendarList",
            "nextPageToken": "page-2",
            "items": [
                {
                    "id": "owner@example.com",
                    "summary": "owner@example.com",
                    "accessRole": "owner",
                    "primary": true
                }
            ]
        })))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/users/me/calendarList"))
        .and(header("authorization", "Bearer test-token"))
        .and(query_param("pageToken", "page-2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "kind": "calendar#calendarList",
            "nextSyncToken": "sync",
            "items": [
                {
                    "id": "bookings@group.calendar.google.com",
                    "summary": "Bookings",
                    "accessRole": "writer"
                }
            ]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let calendars = calendar_list(&server).fetch_all().await.unwrap();

    assert_eq!(
        calendar::to_json(&calendars).unwrap(),
        r#"[
  {
    "summary": "owner@example.com",
    "id": "owner@example.com"
  },
  {
    "summary": "Bookings",
    "id": "bookings@group.calendar.google.com"
  }
]"#
    );
}

#[tokio::test]
async fn api_errors_are_reported() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/users/me/calendarList"))
        .respond_with(ResponseTemplate::new(403).set_body_json(json!({
            "error": {"code": 403, "message": "Request had insufficient authentication scopes."}
        })))
        .mount(&server)
        .await;

    let err = calendar_list(&server).fetch_all().await.unwrap_err();

    assert!(matches!(
        err,
        gcal_tools::Error::Client(calendar::google::ClientError::Request(_))
    ));
}

#[tokio::test]
async fn malformed_responses_are_rejected() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/users/me/calendarList"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>not json</html>"))
        .mount(&server)
        .await;

    assert!(calendar_list(&server).fetch_all().await.is_err());
}
