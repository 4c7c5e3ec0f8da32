pub mod config;
pub mod error;
pub mod types;

#[cfg(feature = "historical")]
pub mod historical;

#[cfg(feature = "storage")]
pub mod storage;

pub use config::EngineConfig;
pub use error::PlanFinanceError;
pub use types::*;

/// Standard result type for all plan-finance operations
pub type PlanFinanceResult<T> = Result<T, PlanFinanceError>;
