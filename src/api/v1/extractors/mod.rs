pub mod auth_ctx;
pub mod authorized;

pub use auth_ctx::{AuthCtx, AuthCtxExtractor};
pub use authorized::Authorized;
