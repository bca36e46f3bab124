//! Bootstrap Orchestrator
//!
//! # Startup Phases
//!
//! ```text
//! Uninitialized
//!    ↓  locate entry file, resolve configured packages (fatal on failure)
//! Scanning
//!    ↓  walk package directories, load modules, classify components
//! Bound
//!    ↓  components bound in the container, controller routes mounted
//! Serving
//!    ↓  until Ctrl+C / SIGTERM
//! [Stopped]
//! ```

mod application;
mod shutdown;

pub use application::{Application, ApplicationBuilder, BootReport, BootState};
pub use shutdown::shutdown_signal;
