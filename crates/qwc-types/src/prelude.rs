pub use crate::error::{Error, QwcResult};
pub use crate::types::{DEFAULT_TENANT, Identity, PUBLIC_USER, Tenant};

pub use tracing::{debug, error, info, warn};

// vim: ts=4
