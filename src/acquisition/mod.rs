//! Acquisition: bridging the SDR driver thread into per-tile sample files.

pub mod orchestrator;
pub mod ring;
pub mod sink;

pub use orchestrator::TileOrchestrator;
pub use ring::{CaptureRing, PushOutcome, RingConsumer, RingProducer};
pub use sink::{SampleSink, DEFAULT_TILE_BUDGET_BYTES};
