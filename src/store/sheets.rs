use async_trait::async_trait;
use chrono::{DateTime, NaiveDateTime, Utc};
use reqwest::{StatusCode, Url};
use serde::Deserialize;
use serde_json::json;

use super::{MoodStore, StoreError};
use crate::auth::jwt::{ServiceAccountKey, TokenProvider};
use crate::models::mood::{Mood, MoodEntry};

const DEFAULT_API_BASE: &str = "https://sheets.googleapis.com/v4/spreadsheets/";

/// Google Sheets backed store. The sheet's first row is a header
/// (`timestamp | mood | note`); data rows follow in append order.
pub struct SheetsStore {
    http: reqwest::Client,
    tokens: TokenProvider,
    api_base: String,
    sheet_key: String,
    range: String,
}

#[derive(Debug, Deserialize)]
struct ValueRange {
    #[serde(default)]
    values: Vec<Vec<String>>,
}

impl SheetsStore {
    pub fn new(
        key: ServiceAccountKey,
        sheet_key: String,
        range: String,
    ) -> Result<Self, StoreError> {
        let http = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(15))
            .build()?;

        Ok(Self {
            tokens: TokenProvider::new(key, http.clone()),
            http,
            api_base: DEFAULT_API_BASE.to_string(),
            sheet_key,
            range,
        })
    }

    /// Point the client at another Sheets-compatible endpoint.
    #[cfg(test)]
    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into();
        self
    }

    fn values_url(&self, suffix: &str) -> Result<Url, StoreError> {
        let mut url = Url::parse(&self.api_base)
            .map_err(|e| StoreError::Malformed(format!("base url: {}", e)))?;
        url.path_segments_mut()
            .map_err(|_| StoreError::Malformed("base url cannot hold a path".into()))?
            .pop_if_empty()
            .push(&self.sheet_key)
            .push("values")
            .push(&format!("{}{}", self.range, suffix));
        Ok(url)
    }
}

#[async_trait]
impl MoodStore for SheetsStore {
    async fn append_entry(&self, entry: &MoodEntry) -> Result<(), StoreError> {
        let token = self.tokens.access_token().await?;
        let url = self.values_url(":append")?;

        let response = self
            .http
            .post(url)
            .bearer_auth(token)
            .query(&[
                ("valueInputOption", "RAW"),
                ("insertDataOption", "INSERT_ROWS"),
            ])
            .json(&json!({ "values": [entry.to_row()] }))
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(classify_failure(status, body));
        }

        tracing::debug!(mood = %entry.mood, "Appended row to sheet");
        Ok(())
    }

    async fn read_all(&self) -> Result<Vec<MoodEntry>, StoreError> {
        let token = self.tokens.access_token().await?;
        let url = self.values_url("")?;

        let response = self.http.get(url).bearer_auth(token).send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(classify_failure(status, body));
        }

        let range: ValueRange = response
            .json()
            .await
            .map_err(|e| StoreError::Malformed(format!("values response: {}", e)))?;

        let entries = parse_rows(range.values);
        tracing::debug!(
            rows = entries.len(),
            client_email = %self.tokens.client_email(),
            "Read sheet"
        );
        Ok(entries)
    }

    fn name(&self) -> &'static str {
        "sheets"
    }
}

fn classify_failure(status: StatusCode, body: String) -> StoreError {
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => StoreError::Auth(body),
        StatusCode::TOO_MANY_REQUESTS => StoreError::QuotaExceeded,
        _ => StoreError::Backend {
            status: status.as_u16(),
            body,
        },
    }
}

/// Drop the header row and convert the rest. Rows that cannot be understood
/// are skipped rather than failing the whole read.
fn parse_rows(values: Vec<Vec<String>>) -> Vec<MoodEntry> {
    values
        .into_iter()
        .enumerate()
        .skip(1)
        .filter_map(|(idx, row)| match parse_row(&row) {
            Some(entry) => Some(entry),
            None => {
                tracing::warn!(line = idx + 1, ?row, "Skipping unreadable sheet row");
                None
            }
        })
        .collect()
}

fn parse_row(row: &[String]) -> Option<MoodEntry> {
    let timestamp = parse_timestamp(row.first()?)?;
    let mood: Mood = row.get(1)?.parse().ok()?;
    let note = row.get(2).cloned().unwrap_or_default();

    // Rows are taken as written; the length limit only applies to new input.
    Some(MoodEntry {
        timestamp,
        mood,
        note,
    })
}

/// ISO-8601 with offset, or a naive timestamp taken as UTC.
fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.with_timezone(&Utc));
    }
    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .map(|naive| naive.and_utc())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(cells: &[&str]) -> Vec<String> {
        cells.iter().map(|c| c.to_string()).collect()
    }

    #[test]
    fn test_parse_rows_skips_header() {
        let values = vec![
            row(&["timestamp", "mood", "note"]),
            row(&["2026-02-10T15:00:00.123456+00:00", "😄", "quick fix"]),
            row(&["2026-02-10T16:00:00Z", "😠", ""]),
        ];

        let entries = parse_rows(values);
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].mood, Mood::Delighted);
        assert_eq!(entries[0].note, "quick fix");
        assert_eq!(entries[1].mood, Mood::Angry);
    }

    #[test]
    fn test_parse_rows_missing_note_cell_reads_empty() {
        let values = vec![
            row(&["timestamp", "mood", "note"]),
            row(&["2026-02-10T15:00:00Z", "😐"]),
        ];
        let entries = parse_rows(values);
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].note, "");
    }

    #[test]
    fn test_parse_rows_skips_unreadable_rows() {
        let values = vec![
            row(&["timestamp", "mood", "note"]),
            row(&["yesterday-ish", "😄", ""]),
            row(&["2026-02-10T15:00:00Z", "🤖", ""]),
            row(&[]),
            row(&["2026-02-10T15:00:00Z", "🙂", "ok"]),
        ];
        let entries = parse_rows(values);
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].mood, Mood::Satisfied);
    }

    #[test]
    fn test_parse_rows_empty_sheet() {
        assert!(parse_rows(vec![]).is_empty());
        assert!(parse_rows(vec![row(&["timestamp", "mood", "note"])]).is_empty());
    }

    #[test]
    fn test_parse_timestamp_naive_is_utc() {
        let ts = parse_timestamp("2026-02-10 15:30:00").unwrap();
        assert_eq!(ts.to_rfc3339(), "2026-02-10T15:30:00+00:00");
    }

    #[test]
    fn test_parse_timestamp_converts_offset_to_utc() {
        let ts = parse_timestamp("2026-02-10T10:00:00-05:00").unwrap();
        assert_eq!(ts.to_rfc3339(), "2026-02-10T15:00:00+00:00");
    }

    #[test]
    fn test_classify_failure() {
        assert!(matches!(
            classify_failure(StatusCode::FORBIDDEN, "denied".into()),
            StoreError::Auth(_)
        ));
        assert!(matches!(
            classify_failure(StatusCode::TOO_MANY_REQUESTS, String::new()),
            StoreError::QuotaExceeded
        ));
        assert!(matches!(
            classify_failure(StatusCode::BAD_GATEWAY, String::new()),
            StoreError::Backend { status: 502, .. }
        ));
    }

    #[test]
    fn test_values_url_encodes_range() {
        let key = ServiceAccountKey {
            client_email: "bot@proj".into(),
            private_key: String::new(),
            token_uri: "https://oauth2.googleapis.com/token".into(),
        };
        let store = SheetsStore::new(key, "abc123".into(), "Mood Log!A:C".into()).unwrap();

        let url = store.values_url(":append").unwrap();
        assert_eq!(
            url.as_str(),
            "https://sheets.googleapis.com/v4/spreadsheets/abc123/values/Mood%20Log!A:C:append"
        );
    }

    mod remote {
        use super::*;
        use std::collections::HashMap;
        use std::sync::atomic::{AtomicU16, AtomicUsize, Ordering};
        use std::sync::{Arc, Mutex};

        use axum::{
            extract::State,
            http::{header, HeaderMap, Method, StatusCode, Uri},
            routing::post,
            Form, Json, Router,
        };
        use jsonwebtoken::{decode, DecodingKey, Validation};

        use crate::auth::jwt::{Claims, SHEETS_SCOPE};

        const TEST_KEY_PEM: &str = include_str!("testdata/service_account_key.pem");

        #[derive(Debug, Clone)]
        struct Recorded {
            method: Method,
            uri: Uri,
            authorization: Option<String>,
            body: String,
        }

        #[derive(Default)]
        struct FakeGoogle {
            token_calls: AtomicUsize,
            token_status: AtomicU16,
            values_status: AtomicU16,
            assertions: Mutex<Vec<Claims>>,
            requests: Mutex<Vec<Recorded>>,
        }

        async fn token(
            State(fake): State<Arc<FakeGoogle>>,
            Form(form): Form<HashMap<String, String>>,
        ) -> (StatusCode, Json<serde_json::Value>) {
            let n = fake.token_calls.fetch_add(1, Ordering::SeqCst) + 1;
            assert_eq!(
                form.get("grant_type").map(String::as_str),
                Some("urn:ietf:params:oauth:grant-type:jwt-bearer")
            );

            let mut validation = Validation::new(jsonwebtoken::Algorithm::RS256);
            validation.insecure_disable_signature_validation();
            validation.validate_aud = false;
            let claims = decode::<Claims>(
                &form["assertion"],
                &DecodingKey::from_secret(&[]),
                &validation,
            )
            .unwrap()
            .claims;
            fake.assertions.lock().unwrap().push(claims);

            let status = StatusCode::from_u16(fake.token_status.load(Ordering::SeqCst)).unwrap();
            if !status.is_success() {
                return (status, Json(json!({ "error": "invalid_grant" })));
            }
            (
                status,
                Json(json!({
                    "access_token": format!("tok-{}", n),
                    "expires_in": 3600,
                    "token_type": "Bearer",
                })),
            )
        }

        async fn values(
            State(fake): State<Arc<FakeGoogle>>,
            method: Method,
            uri: Uri,
            headers: HeaderMap,
            body: String,
        ) -> (StatusCode, Json<serde_json::Value>) {
            fake.requests.lock().unwrap().push(Recorded {
                method: method.clone(),
                uri,
                authorization: headers
                    .get(header::AUTHORIZATION)
                    .and_then(|v| v.to_str().ok())
                    .map(str::to_string),
                body,
            });

            let status = StatusCode::from_u16(fake.values_status.load(Ordering::SeqCst)).unwrap();
            if !status.is_success() {
                return (status, Json(json!({ "error": { "code": status.as_u16() } })));
            }
            if method == Method::GET {
                (
                    status,
                    Json(json!({
                        "range": "Sheet1!A1:C3",
                        "majorDimension": "ROWS",
                        "values": [
                            ["timestamp", "mood", "note"],
                            ["2026-02-10T15:00:00Z", "😄", "quick fix"],
                            ["2026-02-10T16:00:00Z", "😠"],
                        ],
                    })),
                )
            } else {
                (status, Json(json!({ "updates": { "updatedRows": 1 } })))
            }
        }

        async fn start_fake() -> (Arc<FakeGoogle>, SheetsStore) {
            let fake = Arc::new(FakeGoogle::default());
            fake.token_status.store(200, Ordering::SeqCst);
            fake.values_status.store(200, Ordering::SeqCst);

            let app = Router::new()
                .route("/token", post(token))
                .fallback(values)
                .with_state(fake.clone());
            let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
            let addr = listener.local_addr().unwrap();
            tokio::spawn(async move {
                axum::serve(listener, app).await.unwrap();
            });

            let key = ServiceAccountKey {
                client_email: "bot@proj.iam.gserviceaccount.com".into(),
                private_key: TEST_KEY_PEM.into(),
                token_uri: format!("http://{}/token", addr),
            };
            let store = SheetsStore::new(key, "abc123".into(), "A:C".into())
                .unwrap()
                .with_api_base(format!("http://{}/v4/spreadsheets/", addr));
            (fake, store)
        }

        fn recorded(fake: &FakeGoogle) -> Vec<Recorded> {
            fake.requests.lock().unwrap().clone()
        }

        #[tokio::test]
        async fn test_append_sends_row_with_bearer_token() {
            let (fake, store) = start_fake().await;
            let ts: DateTime<Utc> = "2026-02-10T15:00:00Z".parse().unwrap();
            let entry = MoodEntry::new(ts, Mood::Delighted, "quick fix").unwrap();

            store.append_entry(&entry).await.unwrap();

            let requests = recorded(&fake);
            assert_eq!(requests.len(), 1);
            let req = &requests[0];
            assert_eq!(req.method, Method::POST);
            assert_eq!(req.uri.path(), "/v4/spreadsheets/abc123/values/A:C:append");

            let query = req.uri.query().unwrap();
            assert!(query.contains("valueInputOption=RAW"));
            assert!(query.contains("insertDataOption=INSERT_ROWS"));
            assert_eq!(req.authorization.as_deref(), Some("Bearer tok-1"));

            let body: serde_json::Value = serde_json::from_str(&req.body).unwrap();
            assert_eq!(
                body,
                json!({ "values": [["2026-02-10T15:00:00+00:00", "😄", "quick fix"]] })
            );
        }

        #[tokio::test]
        async fn test_read_all_parses_sheet() {
            let (fake, store) = start_fake().await;

            let entries = store.read_all().await.unwrap();
            assert_eq!(entries.len(), 2);
            assert_eq!(entries[0].mood, Mood::Delighted);
            assert_eq!(entries[0].note, "quick fix");
            assert_eq!(entries[1].mood, Mood::Angry);
            assert_eq!(entries[1].note, "");

            let req = &recorded(&fake)[0];
            assert_eq!(req.method, Method::GET);
            assert_eq!(req.uri.path(), "/v4/spreadsheets/abc123/values/A:C");
        }

        #[tokio::test]
        async fn test_token_is_fetched_once_and_reused() {
            let (fake, store) = start_fake().await;

            store.read_all().await.unwrap();
            store.read_all().await.unwrap();

            assert_eq!(fake.token_calls.load(Ordering::SeqCst), 1);
            assert!(recorded(&fake)
                .iter()
                .all(|r| r.authorization.as_deref() == Some("Bearer tok-1")));

            let claims = fake.assertions.lock().unwrap()[0].clone();
            assert_eq!(claims.iss, "bot@proj.iam.gserviceaccount.com");
            assert_eq!(claims.scope, SHEETS_SCOPE);
            assert!(claims.aud.ends_with("/token"));
            assert_eq!(claims.exp - claims.iat, 3600);
        }

        #[tokio::test]
        async fn test_rejected_token_exchange_is_auth_error() {
            let (fake, store) = start_fake().await;
            fake.token_status.store(400, Ordering::SeqCst);

            let result = store.read_all().await;
            assert!(matches!(result, Err(StoreError::Auth(_))));
            assert!(recorded(&fake).is_empty());
        }

        #[tokio::test]
        async fn test_backend_statuses_are_classified() {
            let (fake, store) = start_fake().await;
            let entry = MoodEntry::new(Utc::now(), Mood::Neutral, "").unwrap();

            for status in [401, 403] {
                fake.values_status.store(status, Ordering::SeqCst);
                assert!(matches!(store.read_all().await, Err(StoreError::Auth(_))));
                assert!(matches!(
                    store.append_entry(&entry).await,
                    Err(StoreError::Auth(_))
                ));
            }

            fake.values_status.store(429, Ordering::SeqCst);
            assert!(matches!(store.read_all().await, Err(StoreError::QuotaExceeded)));
            assert!(matches!(
                store.append_entry(&entry).await,
                Err(StoreError::QuotaExceeded)
            ));

            fake.values_status.store(500, Ordering::SeqCst);
            assert!(matches!(
                store.read_all().await,
                Err(StoreError::Backend { status: 500, .. })
            ));
        }
    }
}
