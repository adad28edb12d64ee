pub mod logging;
pub mod metrics;

pub use self::logging::init_tracing;
pub use self::metrics::{install_recorder, render_recorder};
