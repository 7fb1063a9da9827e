//! Classroom assignment backend and answer-sync core.
//!
//! Student editors capture answers locally first, sync them to a per-student
//! submission document with debounced merge-writes, and submit a gathered
//! draft tree once, finally, through the legacy endpoint. Teachers read the
//! same documents through an aggregated dashboard with a live change feed.
//!
//! The crate splits into
//! - the sync core used by a headless student session: [`cache`], [`keys`],
//!   [`writer`], [`editor`], [`gather`], [`submission`], [`printer`]
//! - the hosted side: [`docstore`], [`dashboard`], [`definitions`],
//!   [`auth`], [`routes`] and the server [`state`]

pub mod telemetry;
pub mod util;
pub mod domain;
pub mod config;
pub mod error;
pub mod keys;
pub mod cache;
pub mod docstore;
pub mod writer;
pub mod editor;
pub mod gather;
pub mod dashboard;
pub mod printer;
pub mod submission;
pub mod definitions;
pub mod auth;
pub mod state;
pub mod protocol;
pub mod routes;
