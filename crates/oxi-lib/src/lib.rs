pub mod io;
pub mod metrics;
pub mod plot;
pub mod signal;
pub mod synth;

pub use metrics::*;
pub use signal::*;
