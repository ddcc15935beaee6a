pub mod batch;
pub mod cli;
pub mod config;
pub mod context;
pub mod detect;
pub mod discovery;
pub mod error;
pub mod exit;
pub mod fix;
pub mod lang;
pub mod reporting;
pub mod session;
pub mod syntax;
pub mod types;

pub use detect::scan_source;
pub use error::{LeakError, Result};
pub use fix::{generate_fix, generate_fix_at};
pub use types::{Finding, Fix, FixResult, LeakDetectionResult, LeakType, Severity, Transformation};
