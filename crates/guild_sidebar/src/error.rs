use std::time::Duration;

use shared::error::ApiException;
use thiserror::Error;

/// Failures surfaced to the user while keeping the sidebar usable. None of
/// these mutate the view.
#[derive(Debug, Clone, Error)]
pub enum SidebarError {
    #[error("cannot get guilds: {source}")]
    Fetch { source: ApiException },
    #[error("cannot get guilds: no response after {after:?}")]
    FetchTimeout { after: Duration },
}

impl From<ApiException> for SidebarError {
    fn from(source: ApiException) -> Self {
        Self::Fetch { source }
    }
}
