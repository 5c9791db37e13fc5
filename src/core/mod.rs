pub mod coerce;
pub mod diagnostics;
pub mod pipeline;
pub mod selector;
pub mod source;
pub mod storage;
pub mod synth;
