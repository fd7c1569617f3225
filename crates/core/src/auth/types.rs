use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Request information for authentication. Header names are expected
/// lowercased; the server middleware lowercases them on the way in.
#[derive(Debug, Clone)]
pub struct AuthRequest {
    pub headers: HashMap<String, String>,
}

/// Authenticated identity. `user_id` is what sync history records as the
/// requesting party on adds and removals.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Identity {
    pub user_id: String,
    pub method: String,
}

impl Identity {
    pub fn anonymous() -> Self {
        Self {
            user_id: "anonymous".to_string(),
            method: "none".to_string(),
        }
    }
}
