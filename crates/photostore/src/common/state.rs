use std::sync::Arc;

use crate::store::PhotoStore;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<PhotoStore>,
}

impl AppState {
    pub fn new(store: PhotoStore) -> Self {
        Self {
            store: Arc::new(store),
        }
    }
}
