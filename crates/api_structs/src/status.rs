use serde::{Deserialize, Serialize};

pub mod get_status {
    use super::*;

    #[derive(Debug, Clone, Serialize, Deserialize)]
    pub struct APIResponse {
        pub message: String,
    }
}
