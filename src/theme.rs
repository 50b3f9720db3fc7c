//! Themes, palettes and change notification
//!
//! Every theme currently resolves to the same classic pink blossom palette;
//! only the page backdrop differs. The change signal is still delivered so
//! subscribers rebuild anything that has colors baked into pixels.

use crate::display::Rgb;
use crate::error::SakuraError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::mpsc::{self, Receiver, Sender};

/// Number of colors in a blossom palette
pub const PALETTE_SIZE: usize = 4;

/// Four blossom colors
pub type Palette = [Rgb; PALETTE_SIZE];

const CLASSIC_PINK: Palette = [
    Rgb::new(255, 200, 220),
    Rgb::new(255, 210, 230),
    Rgb::new(255, 220, 235),
    Rgb::new(255, 195, 215),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Cherry,
    Dark,
    Light,
    Blue,
    Green,
    Orange,
}

impl Theme {
    pub const ALL: [Theme; 6] = [
        Theme::Cherry,
        Theme::Dark,
        Theme::Light,
        Theme::Blue,
        Theme::Green,
        Theme::Orange,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Theme::Cherry => "cherry",
            Theme::Dark => "dark",
            Theme::Light => "light",
            Theme::Blue => "blue",
            Theme::Green => "green",
            Theme::Orange => "orange",
        }
    }

    /// Blossom palette; the same for every theme
    pub fn palette(&self) -> Palette {
        CLASSIC_PINK
    }

    /// Page color painted behind the transparent tree surface
    pub fn backdrop(&self) -> Rgb {
        match self {
            Theme::Cherry => Rgb::new(255, 240, 245),
            Theme::Dark => Rgb::new(26, 26, 46),
            Theme::Light => Rgb::new(250, 250, 250),
            Theme::Blue => Rgb::new(232, 244, 253),
            Theme::Green => Rgb::new(236, 248, 238),
            Theme::Orange => Rgb::new(255, 243, 230),
        }
    }

    /// Next theme in menu order (wraps)
    pub fn next(&self) -> Theme {
        let idx = Self::ALL.iter().position(|t| t == self).unwrap_or(0);
        Self::ALL[(idx + 1) % Self::ALL.len()]
    }
}

impl fmt::Display for Theme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Theme {
    type Err = SakuraError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase();
        Self::ALL
            .iter()
            .copied()
            .find(|t| t.name() == wanted)
            .ok_or(SakuraError::UnknownTheme(wanted))
    }
}

/// Delivered to subscribers when the active theme changes
#[derive(Debug, Clone, PartialEq)]
pub struct ThemeChange {
    pub theme: Theme,
    pub palette: Palette,
}

/// Receiving end of a theme subscription
pub struct ThemeSubscription {
    receiver: Receiver<ThemeChange>,
}

impl ThemeSubscription {
    /// Drain pending changes (non-blocking), returning only the latest
    pub fn poll(&self) -> Option<ThemeChange> {
        let mut latest = None;
        while let Ok(change) = self.receiver.try_recv() {
            latest = Some(change);
        }
        latest
    }
}

/// Owner of the active theme; broadcasts changes to subscribers
pub struct ThemeProvider {
    current: Theme,
    subscribers: Vec<Sender<ThemeChange>>,
}

impl ThemeProvider {
    pub fn new(theme: Theme) -> Self {
        Self {
            current: theme,
            subscribers: Vec::new(),
        }
    }

    pub fn current(&self) -> Theme {
        self.current
    }

    pub fn subscribe(&mut self) -> ThemeSubscription {
        let (sender, receiver) = mpsc::channel();
        self.subscribers.push(sender);
        ThemeSubscription { receiver }
    }

    /// Switch theme. Subscribers hear about it only if it actually changed.
    /// Returns true when a change was broadcast.
    pub fn set_theme(&mut self, theme: Theme) -> bool {
        if theme == self.current {
            return false;
        }
        self.current = theme;
        log::info!("Theme changed to '{}'", theme);

        let change = ThemeChange {
            theme,
            palette: theme.palette(),
        };
        // Dropped subscriptions fail to send and are pruned
        self.subscribers.retain(|s| s.send(change.clone()).is_ok());
        true
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }
}

impl Default for ThemeProvider {
    fn default() -> Self {
        Self::new(Theme::default())
    }
}
