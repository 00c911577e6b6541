//! Application layer for leafysan-bridge.
//!
//! The application layer knows *what* to do with a dashboard request or an
//! archive row, and delegates *how* (sockets, files, serial ports) to the
//! infrastructure layer.
//!
//! # Responsibilities
//!
//! - Parsing dashboard JSON into [`DashboardRequest`](crate::domain::DashboardRequest)s
//! - Building values and thresholds replies from the State Store snapshots
//! - Turning loosely typed threshold fields into a validated candidate
//! - Laying out archive rows, naming daily files, downsampling a day
//!
//! # What does NOT belong here?
//!
//! - Opening sockets, files or serial ports (that is infrastructure)
//! - Tokio task spawning

pub mod archive;
pub mod dashboard_service;

pub use archive::{archive_date, archive_file_name, archive_record, downsample, ARCHIVE_HEADER};
pub use dashboard_service::{
    parse_request, threshold_candidate, thresholds_response, values_response, DashboardError,
};
