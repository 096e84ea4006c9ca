use std::fmt;

use serde::{Deserialize, Serialize};

/// Backend identifier of a segment. Opaque to the queue and the controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SegmentId(pub i64);

impl fmt::Display for SegmentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Token returned by a save acknowledgment. Reversing that save requires it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RevisionId(pub i64);

impl fmt::Display for RevisionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Region of the source page image, in source-image pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x1: i64,
    pub y1: i64,
    pub x2: i64,
    pub y2: i64,
}

impl BoundingBox {
    pub fn width(&self) -> i64 {
        (self.x2 - self.x1).abs()
    }

    pub fn height(&self) -> i64 {
        (self.y2 - self.y1).abs()
    }
}

/// One OCR text region awaiting review.
///
/// Everything except `edited_text` is fixed at construction. The controller is the
/// only writer of `edited_text` (on save, and when an undo restores the prior text),
/// which is why the setter is crate-private.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segment {
    segment_id: SegmentId,
    doc_id: i64,
    page: u32,
    bounding_box: BoundingBox,
    ocr_text: String,
    edited_text: String,
    text_line_count: u16,
    suggestions: Vec<String>,
}

impl Segment {
    /// Builds a segment whose edit text starts out as the OCR text.
    ///
    /// The line-count hint defaults to the number of lines in `ocr_text` (at least 1)
    /// and the suggestion list starts empty.
    pub fn new(
        segment_id: SegmentId,
        doc_id: i64,
        page: u32,
        bounding_box: BoundingBox,
        ocr_text: impl Into<String>,
    ) -> Self {
        let ocr_text = ocr_text.into();
        Self {
            segment_id,
            doc_id,
            page,
            bounding_box,
            text_line_count: line_count(&ocr_text),
            edited_text: ocr_text.clone(),
            ocr_text,
            suggestions: Vec::new(),
        }
    }

    /// Replaces the initial edit text (e.g. with a previously saved review).
    pub fn with_edited_text(mut self, text: impl Into<String>) -> Self {
        self.edited_text = text.into();
        self
    }

    /// Sets the ordered suggestion list. Empty strings and duplicates are kept.
    pub fn with_suggestions(mut self, suggestions: Vec<String>) -> Self {
        self.suggestions = suggestions;
        self
    }

    pub fn with_text_line_count(mut self, lines: u16) -> Self {
        self.text_line_count = lines.max(1);
        self
    }

    pub fn segment_id(&self) -> SegmentId {
        self.segment_id
    }

    pub fn doc_id(&self) -> i64 {
        self.doc_id
    }

    pub fn page(&self) -> u32 {
        self.page
    }

    pub fn bounding_box(&self) -> BoundingBox {
        self.bounding_box
    }

    pub fn ocr_text(&self) -> &str {
        &self.ocr_text
    }

    pub fn edited_text(&self) -> &str {
        &self.edited_text
    }

    pub fn text_line_count(&self) -> u16 {
        self.text_line_count
    }

    pub fn suggestions(&self) -> &[String] {
        &self.suggestions
    }

    /// Swaps in new edit text and hands back the previous value.
    pub(crate) fn replace_edited_text(&mut self, text: String) -> String {
        std::mem::replace(&mut self.edited_text, text)
    }
}

/// Row shape accepted by the local store's importer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewSegment {
    pub doc_id: i64,
    pub page: u32,
    pub x1: i64,
    pub y1: i64,
    pub x2: i64,
    pub y2: i64,
    pub ocr_text: String,
}

/// Number of display lines for `text`, never less than one.
pub fn line_count(text: &str) -> u16 {
    let lines = text.lines().count().max(1);
    u16::try_from(lines).unwrap_or(u16::MAX)
}
