//! Screen components, one per [`ScreenId`](crate::screen::ScreenId).

pub mod banned;
pub mod hotspot;
pub mod wifi_settings;

use crate::component::Component;
use crate::screen::ScreenId;

/// Instantiate all primary screens in tab-bar order.
pub fn create_screens() -> Vec<(ScreenId, Box<dyn Component>)> {
    vec![
        (
            ScreenId::Hotspot,
            Box::new(hotspot::HotspotScreen::new()) as Box<dyn Component>,
        ),
        (
            ScreenId::WifiSettings,
            Box::new(wifi_settings::WifiSettingsScreen::new()),
        ),
        (ScreenId::Banned, Box::new(banned::BannedScreen::new())),
    ]
}
