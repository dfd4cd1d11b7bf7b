use std::sync::Arc;

use crate::application::content::ContentService;

#[derive(Clone)]
pub struct HttpState {
    pub content: Arc<ContentService>,
    pub upload_limit_bytes: usize,
}
