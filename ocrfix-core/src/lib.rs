//! Core of the ocrfix OCR correction workflow.
//!
//! The crate is split leaves-first:
//!
//! - [`types`]: `Segment` and its identifiers.
//! - [`queue`]: the append-only `SegmentQueue` with its cursor.
//! - [`controller`]: the `SessionController` state machine (advance / save / skip / undo).
//! - [`gateway`]: the `ReviewGateway` trait, the command/reply protocol, the background
//!   worker, and the SQLite and HTTP implementations.
//! - [`db`] / [`schema`]: the WAL-mode SQLite store behind `SqliteGateway`.
//! - [`suggest`]: replacement-text heuristics offered alongside each segment.
//!
//! No rendering lives here; the `ocrfix` binary reads [`controller::ReviewView`] and
//! calls controller operations.

pub mod controller;
pub mod db;
pub mod error;
pub mod gateway;
pub mod queue;
pub mod schema;
pub mod suggest;
pub mod types;

pub use controller::{ReviewView, SessionController, SessionState};
pub use error::{GatewayAction, GatewayError, ReviewError, UndoRejection};
pub use gateway::{GatewayCommand, GatewayReply, Page, ReviewGateway, SaveReceipt};
pub use queue::SegmentQueue;
pub use types::{BoundingBox, NewSegment, RevisionId, Segment, SegmentId};
