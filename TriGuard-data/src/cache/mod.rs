// In-process expiring state used by the verification code flow
pub mod code_cache;
pub mod flow_limiter;

pub use code_cache::{CodeCache, CodeCheck};
pub use flow_limiter::FlowLimiter;
