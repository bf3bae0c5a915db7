//! Browser scoped resources used by the form: picture previews and the
//! clipboard.
use std::{
    collections::HashSet,
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc, Mutex,
    },
};

use libregistration::domain::core::fields::ImageUpload;

/// Hands out revocable local references to selected files.
pub trait PreviewStore {
    /// Returns a reference that stays valid until it's revoked.
    fn create(&self, file: &ImageUpload) -> String;

    fn revoke(&self, url: &str);
}

/// A preview reference that is revoked when dropped.
pub struct PreviewHandle {
    url: String,
    store: Arc<dyn PreviewStore + Send + Sync>,
}

impl PreviewHandle {
    pub fn acquire(store: Arc<dyn PreviewStore + Send + Sync>, file: &ImageUpload) -> Self {
        let url = store.create(file);
        Self { url, store }
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

impl Drop for PreviewHandle {
    fn drop(&mut self) {
        self.store.revoke(&self.url);
    }
}

impl std::fmt::Debug for PreviewHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("PreviewHandle").field(&self.url).finish()
    }
}

/// In-process object URLs, `blob:registration/<n>`.
#[derive(Default)]
pub struct ObjectUrls {
    next: AtomicU64,
    live: Mutex<HashSet<String>>,
}

impl ObjectUrls {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of references created and not yet revoked.
    pub fn live(&self) -> usize {
        self.live.lock().map(|live| live.len()).unwrap_or_default()
    }

    pub fn is_live(&self, url: &str) -> bool {
        self.live
            .lock()
            .map(|live| live.contains(url))
            .unwrap_or_default()
    }
}

impl PreviewStore for ObjectUrls {
    fn create(&self, _file: &ImageUpload) -> String {
        let url = format!(
            "blob:registration/{}",
            self.next.fetch_add(1, Ordering::Relaxed)
        );
        if let Ok(mut live) = self.live.lock() {
            live.insert(url.clone());
        }
        url
    }

    fn revoke(&self, url: &str) {
        if let Ok(mut live) = self.live.lock() {
            live.remove(url);
        }
    }
}

pub trait Clipboard {
    fn write_text(&self, text: &str) -> Result<(), String>;
}
