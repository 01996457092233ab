//! Bomb skin resolution
//!
//! The simulation never touches assets; it reports lifecycle cues and the
//! presentation layer asks a `SkinProvider` how to draw them. Providers are
//! small capability objects so the warning presentation can degrade
//! gracefully when a skin ships without a blink frame.

use serde::{Deserialize, Serialize};

use crate::sim::BombKind;

/// Named skin selection persisted by the preference store
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SkinName {
    #[default]
    Standard,
    Minimal,
}

impl SkinName {
    pub fn as_str(&self) -> &'static str {
        match self {
            SkinName::Standard => "standard",
            SkinName::Minimal => "minimal",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "standard" => Some(SkinName::Standard),
            "minimal" | "min" => Some(SkinName::Minimal),
            _ => None,
        }
    }
}

/// How the warning phase is presented
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlinkMode {
    /// Swap the normal asset for a blink frame
    Swap,
    /// Pulse via a CSS class, no extra asset
    Css,
}

/// Asset bundle for one bomb kind
#[derive(Debug, Clone, PartialEq)]
pub struct SkinAssets {
    pub normal: String,
    pub blink: Option<String>,
    pub blink_mode: BlinkMode,
}

/// Concrete warning cue after fallback resolution
#[derive(Debug, Clone, PartialEq)]
pub enum WarningCue {
    SwapTo(String),
    CssPulse,
}

impl SkinAssets {
    /// A swap-mode skin without a blink frame degrades to the CSS pulse
    pub fn warning_cue(&self) -> WarningCue {
        match (self.blink_mode, &self.blink) {
            (BlinkMode::Swap, Some(asset)) => WarningCue::SwapTo(asset.clone()),
            _ => WarningCue::CssPulse,
        }
    }
}

/// Capability interface between the presentation layer and skin data
pub trait SkinProvider {
    fn resolve(&self, kind: BombKind) -> SkinAssets;
}

/// Full image skin with dedicated blink frames. URLs carry the preference
/// store's cache-busting token so a re-saved skin defeats stale caches.
pub struct StandardSkin {
    version: String,
}

impl StandardSkin {
    pub fn new(version: &str) -> Self {
        Self {
            version: version.to_string(),
        }
    }

    fn url(&self, name: &str) -> String {
        if self.version.is_empty() {
            format!("img/{name}.png")
        } else {
            format!("img/{name}.png?v={}", self.version)
        }
    }
}

impl SkinProvider for StandardSkin {
    fn resolve(&self, kind: BombKind) -> SkinAssets {
        SkinAssets {
            normal: self.url(&format!("bomb_{}", kind.as_str())),
            blink: Some(self.url(&format!("bomb_{}_blink", kind.as_str()))),
            blink_mode: BlinkMode::Swap,
        }
    }
}

/// Flat single-asset skin; warnings pulse via CSS
pub struct MinimalSkin {
    version: String,
}

impl MinimalSkin {
    pub fn new(version: &str) -> Self {
        Self {
            version: version.to_string(),
        }
    }
}

impl SkinProvider for MinimalSkin {
    fn resolve(&self, kind: BombKind) -> SkinAssets {
        let name = format!("bomb_{}_flat", kind.as_str());
        let normal = if self.version.is_empty() {
            format!("img/{name}.png")
        } else {
            format!("img/{name}.png?v={}", self.version)
        };
        SkinAssets {
            normal,
            blink: None,
            blink_mode: BlinkMode::Css,
        }
    }
}

/// Resolve the provider for a stored preference
pub fn provider_for(name: SkinName, version: &str) -> Box<dyn SkinProvider> {
    match name {
        SkinName::Standard => Box::new(StandardSkin::new(version)),
        SkinName::Minimal => Box::new(MinimalSkin::new(version)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_skin_name_round_trip() {
        for name in [SkinName::Standard, SkinName::Minimal] {
            assert_eq!(SkinName::from_str(name.as_str()), Some(name));
        }
        assert_eq!(SkinName::from_str("no-such-skin"), None);
    }

    #[test]
    fn test_standard_skin_blinks_by_swap() {
        let skin = StandardSkin::new("1234");
        let assets = skin.resolve(BombKind::Red);
        assert_eq!(assets.normal, "img/bomb_red.png?v=1234");
        assert_eq!(
            assets.warning_cue(),
            WarningCue::SwapTo("img/bomb_red_blink.png?v=1234".to_string())
        );
    }

    #[test]
    fn test_minimal_skin_pulses_via_css() {
        let skin = MinimalSkin::new("");
        let assets = skin.resolve(BombKind::Black);
        assert_eq!(assets.normal, "img/bomb_black_flat.png");
        assert_eq!(assets.warning_cue(), WarningCue::CssPulse);
    }

    #[test]
    fn test_swap_without_blink_asset_falls_back_to_css() {
        let assets = SkinAssets {
            normal: "img/bomb_red.png".to_string(),
            blink: None,
            blink_mode: BlinkMode::Swap,
        };
        assert_eq!(assets.warning_cue(), WarningCue::CssPulse);
    }
}
