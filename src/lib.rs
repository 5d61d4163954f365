//! ForgeBench - benchmark harness for continuous-batched decode engines
//!
//! ForgeBench replays a static dataset of prompts through an autoregressive
//! text-generation engine and reports latency, throughput, and optional
//! output-quality statistics. The engine itself (model weights, forward
//! passes, sampling), the tokenizer, the quality metric, and the tracing
//! subsystem are external capabilities expressed as traits in [`engine`];
//! this crate owns the benchmark orchestration: window partitioning over the
//! dataset, slot assignment for concurrent decodes, the three-phase
//! prefill / prefill-insert / autoregressive pipeline, and statistics
//! aggregation.

pub mod bench;
pub mod config;
pub mod dataset;
pub mod engine;
pub mod error;
pub mod logging;
pub mod report;
pub mod slots;
pub mod stats;
pub mod text;

pub use bench::orchestrator::BenchmarkOrchestrator;
pub use bench::{BatchStats, Metric, Phase, PhaseRunner, PhaseStats};
pub use config::BenchConfig;
pub use dataset::{Dataset, DatasetRecord, Window};
pub use engine::{
    DecodeEngine, PaddedPrompt, PromptTokenizer, QualityScorer, SlotTokens, TraceSink,
};
pub use error::{BenchResult, ForgeBenchError};
pub use report::RunReport;
pub use slots::SlotCycler;
pub use stats::{MetricKey, StatsAccumulator, Summary};
pub use text::TextReconstructor;
