//! # morsegraph
//!
//! Graph-shaped summaries of Morse-Smale complexes, built for
//! optimal-transport comparison.
//!
//! An upstream topological-analysis pipeline hands us three tables: separatrix
//! point samples, separatrix cell connectivity, and the critical-point cells.
//! This crate turns those into a **Morse graph** (critical points plus the
//! separatrix curves connecting them), optionally coarsens it, and exports it
//! as a **measure network** `(X, W, μ)` — the standard input shape for
//! optimal-transport graph comparison.
//!
//! This crate is intentionally small:
//!
//! - it implements indexing, assembly, simplification, and export,
//! - it does **not** compute the Morse-Smale complex (upstream concern),
//! - it does **not** implement the transport solver (that consumes the
//!   measure networks we produce) or any plotting/coloring utilities.
//!
//! ## Public invariants (must not change)
//!
//! - **Determinism**: node ids are assigned once, in a fixed sample order
//!   (ascending by x, then y); every operation is a pure function of its
//!   inputs. Re-running on the same tables yields the same graph.
//! - **Critical structure is preserved**: [`MorseGraph::simplify`] returns a
//!   new graph with exactly the input's critical-node set, and checks it.
//! - **No silent repair**: disconnected or inconsistent upstream data is an
//!   error, never patched.
//!
//! ## Module map
//!
//! - `tables`: upstream table rows + CSV ingestion
//! - `point_index`: sample deduplication and node-id assignment
//! - `graph`: the [`MorseGraph`] arena and assembly from tables
//! - `simplify`: length-bounded chain coarsening
//! - `measure`: measure-network export

pub mod graph;
pub mod measure;
pub mod point_index;
pub mod simplify;
pub mod tables;

pub use graph::{MorseGraph, MorseNode};
pub use measure::MeasureNetwork;
pub use point_index::{index_points, BoundingBox, PointIndex};
pub use simplify::LengthMode;
pub use tables::{CriticalPoint, SeparatrixCell, SeparatrixPoint};

/// morsegraph error variants.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Upstream tables disagree with each other (e.g. a critical-flagged
    /// sample whose cell is not a known critical cell). Caller must fix data
    /// generation; retrying is pointless.
    #[error("inconsistent input: {0}")]
    Consistency(String),
    /// The assembled graph violates a structural requirement (disconnected
    /// separatrix data). Treated as an unrecoverable input defect.
    #[error("structural defect: {0}")]
    Structural(&'static str),
    /// An unimplemented mode was requested. An API-usage error, not a data
    /// error.
    #[error("unsupported mode: {0}")]
    UnsupportedMode(String),
    /// A post-simplification invariant broke. This signals a bug in the
    /// simplifier, not bad input; abort rather than recover.
    #[error("invariant violated: {0}")]
    Invariant(&'static str),
    /// Invalid parameter value.
    #[error("domain error: {0}")]
    Domain(&'static str),
}

pub type Result<T> = std::result::Result<T, Error>;
