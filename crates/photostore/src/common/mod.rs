mod error;
pub mod metrics;
mod result;
mod state;

pub use error::ApiError;
pub use result::ApiResult;
pub use state::AppState;
