//! Configuration shared by Packetframe's processes.

pub mod edged;
pub mod filecfg;
pub mod logging;
pub mod nodes;
pub mod orchestrator;

pub use edged::EdgedConfig;
pub use logging::{LogLevel, LogTarget, LoggingConfig};
pub use nodes::NodeFile;
pub use orchestrator::OrchestratorConfig;
