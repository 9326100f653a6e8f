//! Remote record store client
//!
//! Speaks the activity endpoints of the remote store:
//!
//! - `GET  /user/activities/data` — full snapshot
//! - `POST /user/activities/{kind}` — create
//! - `PUT  /user/activities/{kind}/{id}` — update
//! - `DELETE /user/activities/{kind}/{id}` — delete
//!
//! Every mutation response is itself a fresh snapshot envelope. The store
//! is a plain data source: no retries, no backoff, no caching — transport
//! policy belongs to the caller.

use crate::config::ApiConfig;
use crate::error::{ClientError, ClientResult};
use crate::session::Session;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;
use trackwell_shared::decode::{ActivitySnapshot, DecodeOptions};
use trackwell_shared::record::ActivityKind;

/// Timestamp format sent to the store (fractional-second UTC)
const WIRE_TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.6fZ";

// ============================================================================
// Mutations
// ============================================================================

/// Fields of a record the client authors (the store assigns the id)
#[derive(Debug, Clone, PartialEq)]
pub struct RecordDraft {
    pub kind: ActivityKind,
    pub value: f64,
    pub timestamp: DateTime<Utc>,
    pub unit: String,
    pub metadata: BTreeMap<String, String>,
}

impl RecordDraft {
    /// Draft with the kind's default unit and empty metadata
    pub fn new(kind: ActivityKind, value: f64, timestamp: DateTime<Utc>) -> Self {
        Self {
            kind,
            value,
            timestamp,
            unit: kind.default_unit().to_string(),
            metadata: BTreeMap::new(),
        }
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }
}

/// One write against the remote store
#[derive(Debug, Clone, PartialEq)]
pub enum Mutation {
    Create(RecordDraft),
    Update { id: i64, draft: RecordDraft },
    Delete { id: i64, kind: ActivityKind },
}

impl Mutation {
    pub fn kind(&self) -> ActivityKind {
        match self {
            Mutation::Create(draft) | Mutation::Update { draft, .. } => draft.kind,
            Mutation::Delete { kind, .. } => *kind,
        }
    }

    pub fn action_name(&self) -> &'static str {
        match self {
            Mutation::Create(_) => "create",
            Mutation::Update { .. } => "update",
            Mutation::Delete { .. } => "delete",
        }
    }
}

/// Request body for create/update; metadata is JSON-encoded into a string,
/// matching the envelope the store hands back
#[derive(Debug, Serialize)]
struct MutationBody<'a> {
    activity_type: &'a str,
    value: f64,
    date: String,
    unit: &'a str,
    additional_data: String,
}

impl<'a> MutationBody<'a> {
    fn from_draft(draft: &'a RecordDraft) -> Self {
        Self {
            activity_type: draft.kind.wire_name(),
            value: draft.value,
            date: draft.timestamp.format(WIRE_TIMESTAMP_FORMAT).to_string(),
            unit: &draft.unit,
            additional_data: serde_json::to_string(&draft.metadata)
                .unwrap_or_else(|_| "{}".to_string()),
        }
    }
}

// ============================================================================
// Record store seam
// ============================================================================

/// The remote record store as the engine sees it
///
/// The sync controller depends on this trait, not on HTTP, so tests drive
/// it with deterministic fakes.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Fetch a fresh full snapshot
    async fn fetch(&self) -> ClientResult<ActivitySnapshot>;

    /// Apply one mutation; the response snapshot is an acknowledgment, the
    /// authoritative state comes from the follow-up `fetch`
    async fn apply(&self, mutation: &Mutation) -> ClientResult<ActivitySnapshot>;
}

// ============================================================================
// HTTP implementation
// ============================================================================

/// Structured error body the store returns on rejection
#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
}

/// `RecordStore` over HTTP with bearer authentication
pub struct HttpRecordStore {
    http: reqwest::Client,
    base_url: String,
    session: Arc<Session>,
    decode: DecodeOptions,
}

impl HttpRecordStore {
    pub fn new(
        config: &ApiConfig,
        session: Arc<Session>,
        decode: DecodeOptions,
    ) -> ClientResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            session,
            decode,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn authorized(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match self.session.bearer() {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    /// Map the response to a decoded envelope or a typed error
    ///
    /// 401 is surfaced as `Unauthorized` and must not be retried here; the
    /// caller owns the reauthentication flow. Other non-2xx statuses carry
    /// the server's message verbatim when one is present.
    async fn check_response(&self, response: reqwest::Response) -> ClientResult<ActivitySnapshot> {
        let status = response.status();

        if status == reqwest::StatusCode::UNAUTHORIZED {
            return Err(ClientError::Unauthorized);
        }

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ErrorBody>(&body)
                .map(|e| e.message)
                .unwrap_or(body);
            return Err(ClientError::ServerRejected {
                status: status.as_u16(),
                message,
            });
        }

        let envelope: serde_json::Value = response
            .json()
            .await
            .map_err(|e| ClientError::Decode(e.to_string()))?;
        Ok(ActivitySnapshot::from_wire(&envelope, &self.decode))
    }
}

#[async_trait]
impl RecordStore for HttpRecordStore {
    async fn fetch(&self) -> ClientResult<ActivitySnapshot> {
        debug!("fetching activity snapshot");
        let response = self
            .authorized(self.http.get(self.url("/user/activities/data")))
            .send()
            .await?;
        self.check_response(response).await
    }

    async fn apply(&self, mutation: &Mutation) -> ClientResult<ActivitySnapshot> {
        let kind = mutation.kind().wire_name();
        debug!(action = mutation.action_name(), kind, "applying mutation");

        let request = match mutation {
            Mutation::Create(draft) => self
                .http
                .post(self.url(&format!("/user/activities/{}", kind)))
                .json(&MutationBody::from_draft(draft)),
            Mutation::Update { id, draft } => self
                .http
                .put(self.url(&format!("/user/activities/{}/{}", kind, id)))
                .json(&MutationBody::from_draft(draft)),
            Mutation::Delete { id, .. } => self
                .http
                .delete(self.url(&format!("/user/activities/{}/{}", kind, id))),
        };

        let response = self.authorized(request).send().await?;
        self.check_response(response).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_mutation_body_encodes_metadata_as_string() {
        let draft = RecordDraft::new(
            ActivityKind::WaterIntake,
            250.0,
            Utc.with_ymd_and_hms(2024, 3, 5, 8, 0, 0).unwrap(),
        )
        .with_metadata("time", "08:00");

        let body = MutationBody::from_draft(&draft);
        assert_eq!(body.activity_type, "water_intake");
        assert_eq!(body.date, "2024-03-05T08:00:00.000000Z");
        assert_eq!(body.additional_data, "{\"time\":\"08:00\"}");

        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["additional_data"], "{\"time\":\"08:00\"}");
    }

    #[test]
    fn test_mutation_accessors() {
        let draft = RecordDraft::new(ActivityKind::Weight, 70.5, Utc::now());
        assert_eq!(Mutation::Create(draft.clone()).kind(), ActivityKind::Weight);
        assert_eq!(Mutation::Create(draft.clone()).action_name(), "create");
        assert_eq!(
            Mutation::Update { id: 3, draft }.action_name(),
            "update"
        );
        assert_eq!(
            Mutation::Delete {
                id: 3,
                kind: ActivityKind::Exercise
            }
            .kind(),
            ActivityKind::Exercise
        );
    }

    #[test]
    fn test_base_url_trailing_slash_trimmed() {
        let store = HttpRecordStore::new(
            &ApiConfig {
                base_url: "http://localhost:8080/api/".to_string(),
                timeout_secs: 5,
            },
            Arc::new(Session::new()),
            DecodeOptions::default(),
        )
        .unwrap();
        assert_eq!(
            store.url("/user/activities/data"),
            "http://localhost:8080/api/user/activities/data"
        );
    }
}
