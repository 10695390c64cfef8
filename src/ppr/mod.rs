//! Multi-source personalized PageRank by flow decomposition.
//!
//! Every source pushes a unit of weight along out-edges. At each vertex a
//! `reset_prob` share of the arriving flow is retained as residual and the
//! rest moves on, split evenly over the out-edges, until it falls below the
//! significance threshold or the round cap is hit. A collection pass then
//! folds residuals and leftover flow (scaled by precomputed ppr vectors)
//! back into each source's own ppr vector.

mod collection;
mod data;
mod decomposition;
mod query;
mod sources;
mod writer;

pub use collection::{collect_results, CollectSettings, CollectionProgram};
pub use data::{dequantize, quantize, VertexData, QUANTUM};
pub use decomposition::{DecompositionProgram, FlowSettings, RESET_PROB};
pub use query::{compute, load_graph, run_query, QuerySummary};
pub use sources::read_sources;
pub use writer::{format_vertex, save_results, top_k};
