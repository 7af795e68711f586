//! # ryzenmon-rs-pmtable
//!
//! Decoder and derived-metrics engine for the PM table, the binary telemetry
//! snapshot the Ryzen SMU firmware publishes. Given the table's version
//! identifier and its raw bytes (acquired by a transport collaborator), this
//! crate binds the bytes to a per-revision field layout and computes the
//! normalized per-core and platform sensor readings.
//!
//! ```rust
//! use ryzenmon_rs_core::Topology;
//! use ryzenmon_rs_pmtable::{compute_report, PmTableView};
//!
//! // Raw bytes come from the SMU transport; a zeroed buffer stands in here.
//! let raw = vec![0u8; 0x5A4];
//! let view = PmTableView::decode(0x380904, &raw)?;
//!
//! let topology = Topology {
//!     cores: 8,
//!     ccds: 1,
//!     ccxs: 1,
//!     cores_per_ccx: 8,
//!     enabled_cores: 8,
//!     core_disable_map: 0,
//!     l3_caches: 1,
//!     memory_channels: 2,
//! };
//! topology.validate().expect("discovery hands in a sane topology");
//!
//! let report = compute_report(&view, &topology, 8);
//! assert_eq!(report.cores.len(), 8);
//! # Ok::<(), ryzenmon_rs_pmtable::PmTableError>(())
//! ```

pub mod error;
pub mod fields;
pub mod layout;
pub mod metrics;
pub mod view;

pub use error::PmTableError;
pub use fields::{Field, IndexedField};
pub use layout::{layout_for, supported_versions, IndexedRange, TableLayout};
pub use metrics::compute_report;
pub use view::PmTableView;
