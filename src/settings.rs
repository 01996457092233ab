//! Skin preference store
//!
//! Persisted to LocalStorage as a small JSON blob, written by the settings
//! page and read by the game. The game treats it as read-only apart from
//! `save`, and re-resolves skins live when another tab rewrites it.

use serde::{Deserialize, Serialize};

use crate::skin::SkinName;

/// Current skin preference plus its cache-busting token
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Settings {
    pub skin: SkinName,
    /// Rewritten on every save; appended to asset URLs so a skin change
    /// defeats stale image caches
    #[serde(default)]
    pub version: String,
}

impl Settings {
    /// LocalStorage key, shared with the settings page
    pub const STORAGE_KEY: &'static str = "bomb_sort_settings";

    /// Load the preference from LocalStorage (WASM only)
    #[cfg(target_arch = "wasm32")]
    pub fn load() -> Self {
        let storage = web_sys::window()
            .and_then(|w| w.local_storage().ok())
            .flatten();

        if let Some(storage) = storage {
            if let Ok(Some(json)) = storage.get_item(Self::STORAGE_KEY) {
                if let Ok(settings) = serde_json::from_str::<Settings>(&json) {
                    log::info!("loaded skin preference: {}", settings.skin.as_str());
                    return settings;
                }
            }
        }

        log::info!("using default skin preference");
        Self::default()
    }

    /// Save the preference with a fresh cache-busting token (WASM only)
    #[cfg(target_arch = "wasm32")]
    pub fn save(&mut self) {
        self.version = (js_sys::Date::now() as u64).to_string();

        let storage = web_sys::window()
            .and_then(|w| w.local_storage().ok())
            .flatten();

        if let Some(storage) = storage {
            if let Ok(json) = serde_json::to_string(self) {
                let _ = storage.set_item(Self::STORAGE_KEY, &json);
                log::info!("skin preference saved: {}", self.skin.as_str());
            }
        }
    }

    /// Native stubs
    #[cfg(not(target_arch = "wasm32"))]
    pub fn load() -> Self {
        Self::default()
    }

    #[cfg(not(target_arch = "wasm32"))]
    pub fn save(&mut self) {
        // No-op for native
    }
}
