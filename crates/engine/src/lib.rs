//! Monitoring Engine
//!
//! Drives the acquisition → classification → alerting → dispatch → storage
//! pipeline. Each vital's state is owned by its own worker task; cycles
//! for different vitals proceed independently, and slow notification
//! channels never stall the intake loop.

mod runtime;
mod settings;

pub use runtime::Engine;
pub use settings::{AlertsConfig, ChannelsConfig, EngineConfig, EngineError};

use tracing::Level;
use tracing_subscriber::FmtSubscriber;

/// Initialize logging
pub fn init_logging() {
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .with_target(true)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .expect("Failed to set tracing subscriber");
}
