use std::convert::Infallible;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use log::{debug, error, warn};
use serde::Serialize;
use uuid::Uuid;

use crate::codec::decode;
use crate::report::render_report;
use crate::storage::{AnalysisResult, HistoryRecord, RecordStatus, RecordStore};
use warp::{http::StatusCode, reply, reply::Response, Filter, Rejection, Reply};

/// History entry as listed by the dashboard; the preview payload is left out.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntryResponse {
    pub id: Uuid,
    pub file_name: String,
    pub file_size_bytes: u64,
    pub created_at: DateTime<Utc>,
    pub status: RecordStatus,
    pub has_preview: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<AnalysisResult>,
}

impl From<&HistoryRecord> for HistoryEntryResponse {
    fn from(record: &HistoryRecord) -> Self {
        Self {
            id: record.id,
            file_name: record.file_name.clone(),
            file_size_bytes: record.file_size_bytes,
            created_at: record.created_at,
            status: record.status,
            has_preview: record.preview_encoding.is_some(),
            result: record.result.clone(),
        }
    }
}

/// API error payload
#[derive(Debug, Serialize)]
pub struct ApiError {
    pub message: String,
}

fn api_error(status: StatusCode, message: impl Into<String>) -> Response {
    reply::with_status(
        reply::json(&ApiError {
            message: message.into(),
        }),
        status,
    )
    .into_response()
}

fn parse_id(raw: &str) -> Result<Uuid, Response> {
    Uuid::parse_str(raw).map_err(|_| api_error(StatusCode::BAD_REQUEST, "Invalid record id"))
}

fn with_store(
    store: Arc<dyn RecordStore>,
) -> impl Filter<Extract = (Arc<dyn RecordStore>,), Error = Infallible> + Clone {
    warp::any().map(move || store.clone())
}

/// GET /history
pub async fn list_history(store: Arc<dyn RecordStore>) -> Result<Response, Rejection> {
    let entries: Vec<HistoryEntryResponse> =
        store.load().iter().map(HistoryEntryResponse::from).collect();
    debug!("Listing {} history record(s)", entries.len());
    Ok(reply::json(&entries).into_response())
}

/// GET /history/:id/file
pub async fn get_record_file(
    id: String,
    store: Arc<dyn RecordStore>,
) -> Result<Response, Rejection> {
    let id = match parse_id(&id) {
        Ok(id) => id,
        Err(res) => return Ok(res),
    };
    let Some(record) = store.get(id) else {
        return Ok(api_error(StatusCode::NOT_FOUND, "Record not found"));
    };
    let Some(encoding) = record.preview_encoding.as_ref() else {
        return Ok(api_error(StatusCode::NOT_FOUND, "Record has no stored file"));
    };

    match decode(encoding) {
        Ok((bytes, media_type)) => Ok(reply::with_header(bytes, "Content-Type", media_type).into_response()),
        Err(e) => {
            warn!("[{}] stored file cannot be decoded: {}", id, e);
            Ok(api_error(StatusCode::UNPROCESSABLE_ENTITY, e.to_string()))
        }
    }
}

/// GET /history/:id/report
pub async fn get_record_report(
    id: String,
    store: Arc<dyn RecordStore>,
) -> Result<Response, Rejection> {
    let id = match parse_id(&id) {
        Ok(id) => id,
        Err(res) => return Ok(res),
    };
    match store.get(id) {
        Some(record) => Ok(render_report(&record).into_response()),
        None => Ok(api_error(StatusCode::NOT_FOUND, "Record not found")),
    }
}

/// DELETE /history/:id
pub async fn delete_record(id: String, store: Arc<dyn RecordStore>) -> Result<Response, Rejection> {
    let id = match parse_id(&id) {
        Ok(id) => id,
        Err(res) => return Ok(res),
    };
    match store.remove_by_id(id) {
        Ok(_) => Ok(StatusCode::NO_CONTENT.into_response()),
        Err(e) => {
            error!("[{}] removal failed: {}", id, e);
            Ok(api_error(StatusCode::INTERNAL_SERVER_ERROR, "Failed to remove record"))
        }
    }
}

/// DELETE /history
pub async fn clear_history(store: Arc<dyn RecordStore>) -> Result<Response, Rejection> {
    match store.clear() {
        Ok(()) => Ok(StatusCode::NO_CONTENT.into_response()),
        Err(e) => {
            error!("Clearing history failed: {}", e);
            Ok(api_error(StatusCode::INTERNAL_SERVER_ERROR, "Failed to clear history"))
        }
    }
}

/// Every dashboard route over `store`.
pub fn history_routes(
    store: Arc<dyn RecordStore>,
) -> impl Filter<Extract = impl Reply, Error = Rejection> + Clone {
    let list = warp::path!("history")
        .and(warp::get())
        .and(with_store(store.clone()))
        .and_then(list_history);

    let file = warp::path!("history" / String / "file")
        .and(warp::get())
        .and(with_store(store.clone()))
        .and_then(get_record_file);

    let report = warp::path!("history" / String / "report")
        .and(warp::get())
        .and(with_store(store.clone()))
        .and_then(get_record_report);

    let delete_one = warp::path!("history" / String)
        .and(warp::delete())
        .and(with_store(store.clone()))
        .and_then(delete_record);

    let clear = warp::path!("history")
        .and(warp::delete())
        .and(with_store(store))
        .and_then(clear_history);

    list.or(file).or(report).or(delete_one).or(clear)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::{encode, Encoding};
    use crate::storage::{MemorySlot, PersistentRecordStore};
    use crate::sync::SyncBus;

    fn store_with(records: Vec<HistoryRecord>) -> Arc<dyn RecordStore> {
        let store = PersistentRecordStore::new(MemorySlot::new(), Arc::new(SyncBus::default()));
        for record in records.into_iter().rev() {
            store.add(record).unwrap();
        }
        Arc::new(store)
    }

    fn record(preview: Option<Encoding>) -> HistoryRecord {
        HistoryRecord::pending(Uuid::new_v4(), "a.png", 3, Utc::now(), preview)
    }

    #[test]
    fn listing_omits_the_preview_payload() {
        let record = record(Some(encode(b"abc", "image/png")));
        let json = serde_json::to_value(HistoryEntryResponse::from(&record)).unwrap();
        assert_eq!(json["fileName"], "a.png");
        assert_eq!(json["status"], "pending");
        assert_eq!(json["hasPreview"], true);
        assert!(json.get("previewEncoding").is_none());
        assert!(json.get("result").is_none());
    }

    #[tokio::test]
    async fn list_is_ok() {
        let store = store_with(vec![record(None)]);
        let res = list_history(store).await.unwrap();
        assert_eq!(res.status(), StatusCode::OK);
        assert_eq!(res.headers()["content-type"], "application/json");
    }

    #[tokio::test]
    async fn file_is_served_with_its_media_type() {
        let stored = record(Some(encode(b"abc", "image/png")));
        let id = stored.id.to_string();
        let store = store_with(vec![stored]);

        let res = get_record_file(id, store).await.unwrap();
        assert_eq!(res.status(), StatusCode::OK);
        assert_eq!(res.headers()["content-type"], "image/png");
    }

    #[tokio::test]
    async fn file_lookup_failures() {
        let bare = record(None);
        let broken = record(Some(Encoding::from("data:image/png;base64,%%%")));
        let (bare_id, broken_id) = (bare.id.to_string(), broken.id.to_string());
        let store = store_with(vec![bare, broken]);

        let res = get_record_file("nope".into(), store.clone()).await.unwrap();
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
        let res = get_record_file(Uuid::new_v4().to_string(), store.clone())
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::NOT_FOUND);
        let res = get_record_file(bare_id, store.clone()).await.unwrap();
        assert_eq!(res.status(), StatusCode::NOT_FOUND);
        let res = get_record_file(broken_id, store).await.unwrap();
        assert_eq!(res.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn report_is_plain_text() {
        let stored = record(None);
        let id = stored.id.to_string();
        let store = store_with(vec![stored]);

        let res = get_record_report(id, store.clone()).await.unwrap();
        assert_eq!(res.status(), StatusCode::OK);
        assert!(res.headers()["content-type"]
            .to_str()
            .unwrap()
            .starts_with("text/plain"));

        let res = get_record_report(Uuid::new_v4().to_string(), store)
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn deletes_are_idempotent() {
        let stored = record(None);
        let id = stored.id.to_string();
        let store = store_with(vec![stored, record(None)]);

        let res = delete_record(id.clone(), store.clone()).await.unwrap();
        assert_eq!(res.status(), StatusCode::NO_CONTENT);
        assert_eq!(store.load().len(), 1);
        let res = delete_record(id, store.clone()).await.unwrap();
        assert_eq!(res.status(), StatusCode::NO_CONTENT);
        let res = delete_record("bad".into(), store.clone()).await.unwrap();
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);

        let res = clear_history(store.clone()).await.unwrap();
        assert_eq!(res.status(), StatusCode::NO_CONTENT);
        assert!(store.load().is_empty());
    }
}
