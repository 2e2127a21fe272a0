//! Shared relay state.

use std::sync::Arc;

use crate::slack::ChatPoster;

#[derive(Clone)]
pub struct RelayState {
    pub chat: Arc<dyn ChatPoster>,
    pub channel_id: String,
}

impl RelayState {
    #[must_use]
    pub fn new(chat: Arc<dyn ChatPoster>, channel_id: String) -> Self {
        Self { chat, channel_id }
    }
}
