use serde::{Deserialize, Serialize};

/// The signed-in user, handed to the tracker by the host application.
///
/// Replaces ambient auth flags: whoever opens a ledger passes this in
/// explicitly, and the aggregation code never sees it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    /// Opaque user identifier issued by the auth backend
    pub user_id: String,

    /// Name shown on the dashboard
    #[serde(default)]
    pub display_name: Option<String>,
}

impl Session {
    pub fn new(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            display_name: None,
        }
    }

    pub fn with_display_name(mut self, name: impl Into<String>) -> Self {
        self.display_name = Some(name.into());
        self
    }

    /// Whether this session may open a ledger owned by `owner`.
    pub fn owns(&self, owner: &str) -> bool {
        self.user_id == owner
    }
}
