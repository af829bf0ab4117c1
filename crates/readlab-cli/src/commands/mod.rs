//! Command implementations.

pub mod aggregate;
pub mod batch;
pub mod config;
pub mod ingest;
pub mod quality;
pub mod run;
pub mod summarize;

pub use self::aggregate::execute_aggregate;
pub use self::config::execute_config;
pub use self::ingest::execute_ingest;
pub use self::quality::execute_quality;
pub use self::run::execute_run;
pub use self::summarize::execute_summarize;
