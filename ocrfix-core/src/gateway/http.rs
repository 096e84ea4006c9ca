//! `ReviewGateway` for the review web service.
//!
//! Endpoints, relative to the base URL:
//!
//! | Call   | Request                                 | Success body                      |
//! |--------|-----------------------------------------|-----------------------------------|
//! | fetch  | `GET /api/reviewdata`                   | `{"segments": [...]}`             |
//! | save   | `GET /api/review/<id>?text=<text>`      | `{"status": "ok", "id": <rev>}`   |
//! | skip   | `GET /api/review/<id>?skip=true`        | any 2xx                           |
//! | undo   | `GET /api/unreview/<id>?revid=<rev>`    | any 2xx                           |

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;

use super::{Page, ReviewGateway, SaveReceipt};
use crate::error::GatewayError;
use crate::types::{BoundingBox, RevisionId, Segment, SegmentId};

impl From<reqwest::Error> for GatewayError {
    fn from(err: reqwest::Error) -> Self {
        match err.status() {
            Some(status) => GatewayError::Status { code: status.as_u16() },
            None => GatewayError::Transport(err.to_string()),
        }
    }
}

/// Segment as serialised by `/api/reviewdata`.
#[derive(Debug, Deserialize)]
struct WireSegment {
    segment_id: i64,
    docid: i64,
    page: u32,
    x1: i64,
    y1: i64,
    x2: i64,
    y2: i64,
    #[serde(default)]
    ocrtext: Option<String>,
    /// Best known text: the latest review, else the OCR text.
    #[serde(default)]
    text: Option<String>,
    #[serde(default)]
    textlines: Option<u16>,
    #[serde(default)]
    suggests: Vec<String>,
}

impl From<WireSegment> for Segment {
    fn from(w: WireSegment) -> Self {
        let bounding_box = BoundingBox { x1: w.x1, y1: w.y1, x2: w.x2, y2: w.y2 };
        let ocr_text = w.ocrtext.unwrap_or_default();
        let edited_text = w.text.unwrap_or_else(|| ocr_text.clone());
        let mut segment = Segment::new(SegmentId(w.segment_id), w.docid, w.page, bounding_box, ocr_text)
            .with_edited_text(edited_text)
            .with_suggestions(w.suggests);
        if let Some(lines) = w.textlines {
            segment = segment.with_text_line_count(lines);
        }
        segment
    }
}

#[derive(Debug, Deserialize)]
struct ReviewData {
    #[serde(default)]
    segments: Vec<WireSegment>,
}

#[derive(Debug, Deserialize)]
struct SaveResponse {
    status: String,
    #[serde(default)]
    id: Option<i64>,
}

/// Decodes a `/api/reviewdata` body.
pub fn parse_page(body: &[u8]) -> Result<Page, GatewayError> {
    let data: ReviewData =
        serde_json::from_slice(body).map_err(|e| GatewayError::Decode(e.to_string()))?;
    Ok(Page { segments: data.segments.into_iter().map(Segment::from).collect() })
}

/// Decodes a `/api/review/<id>?text=` body. Anything but `status == "ok"` with an id is a rejection.
pub fn parse_save_response(body: &[u8]) -> Result<SaveReceipt, GatewayError> {
    let resp: SaveResponse =
        serde_json::from_slice(body).map_err(|e| GatewayError::Decode(e.to_string()))?;
    match (resp.status.as_str(), resp.id) {
        ("ok", Some(id)) => Ok(SaveReceipt { revision_id: RevisionId(id) }),
        ("ok", None) => Err(GatewayError::Decode("save acknowledgment without an id".into())),
        _ => Err(GatewayError::Rejected { status: resp.status }),
    }
}

pub struct HttpGateway {
    client: reqwest::Client,
    base_url: String,
}

impl HttpGateway {
    /// Builds a client for `base_url` (e.g. `http://localhost:5000`).
    ///
    /// # Errors
    ///
    /// Returns `GatewayError::Transport` if the TLS backend cannot be initialised.
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, GatewayError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        let base_url = base_url.into().trim_end_matches('/').to_owned();
        Ok(Self { client, base_url })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Sends a GET and returns the body of a 2xx response.
    async fn get(&self, path: &str, query: &[(&str, String)]) -> Result<Vec<u8>, GatewayError> {
        let bytes = self
            .client
            .get(self.url(path))
            .query(query)
            .send()
            .await?
            .error_for_status()?
            .bytes()
            .await?;
        Ok(bytes.to_vec())
    }
}

#[async_trait]
impl ReviewGateway for HttpGateway {
    async fn fetch_page(&self) -> Result<Page, GatewayError> {
        let body = self.get("/api/reviewdata", &[]).await?;
        parse_page(&body)
    }

    async fn submit_save(
        &self,
        segment_id: SegmentId,
        text: &str,
    ) -> Result<SaveReceipt, GatewayError> {
        let body = self
            .get(&format!("/api/review/{segment_id}"), &[("text", text.to_owned())])
            .await?;
        parse_save_response(&body)
    }

    async fn submit_skip(&self, segment_id: SegmentId) -> Result<(), GatewayError> {
        self.get(&format!("/api/review/{segment_id}"), &[("skip", "true".to_owned())])
            .await?;
        Ok(())
    }

    async fn submit_undo(
        &self,
        segment_id: SegmentId,
        revision_id: RevisionId,
    ) -> Result<(), GatewayError> {
        self.get(
            &format!("/api/unreview/{segment_id}"),
            &[("revid", revision_id.to_string())],
        )
        .await?;
        Ok(())
    }
}
