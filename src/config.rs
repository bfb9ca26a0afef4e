// --- File: config.rs ---
use crate::constants::{MAX_AGENT_COUNT, MIN_AGENT_SIZE, MIN_MAX_FORCE, MIN_MAX_SPEED};
use crate::error::ConfigError;
use std::str::FromStr;

// --- Color ---

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Parses `#rrggbb` or the short `#rgb` form. The leading `#` is optional.
    pub fn from_hex(text: &str) -> Result<Self, ConfigError> {
        let invalid = || ConfigError::InvalidColor(text.to_string());
        let hex = text.trim().trim_start_matches('#');
        if !hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(invalid());
        }
        match hex.len() {
            6 => {
                let channel =
                    |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).map_err(|_| invalid());
                Ok(Self::rgb(channel(0)?, channel(2)?, channel(4)?))
            }
            3 => {
                let channel = |i: usize| {
                    u8::from_str_radix(&hex[i..i + 1], 16)
                        .map(|v| v * 17)
                        .map_err(|_| invalid())
                };
                Ok(Self::rgb(channel(0)?, channel(1)?, channel(2)?))
            }
            _ => Err(invalid()),
        }
    }

    pub fn to_hex(self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }

    pub fn to_rgba(self) -> [u8; 4] {
        [self.r, self.g, self.b, 255]
    }
}

impl FromStr for Color {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_hex(s)
    }
}

/// Background choices offered by the control surface, in cycling order.
pub const BACKGROUND_PRESETS: [(&str, Color); 6] = [
    ("White", Color::rgb(0xff, 0xff, 0xff)),
    ("Light Gray", Color::rgb(0xf8, 0xf9, 0xfa)),
    ("Dark Blue", Color::rgb(0x1e, 0x29, 0x3b)),
    ("Black", Color::rgb(0x00, 0x00, 0x00)),
    ("Light Blue", Color::rgb(0xe0, 0xf2, 0xfe)),
    ("Beige", Color::rgb(0xf5, 0xf5, 0xdc)),
];

// --- Agent Palette ---

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AgentPalette {
    pub body: Color,
    pub head: Color,
    pub legs: Color,
}

impl AgentPalette {
    pub const NORMAL: Self = Self {
        body: Color::rgb(0x8b, 0x45, 0x13),
        head: Color::rgb(0x65, 0x43, 0x21),
        legs: Color::rgb(0x33, 0x33, 0x33),
    };

    pub const DARK: Self = Self {
        body: Color::rgb(0x1a, 0x1a, 0x1a),
        head: Color::rgb(0x0a, 0x0a, 0x0a),
        legs: Color::rgb(0x33, 0x33, 0x33),
    };
}

// --- Simulation Config ---

#[derive(Debug, Clone, PartialEq)]
pub struct SimulationConfig {
    pub agent_count: usize,
    pub avoidance_strength: f32,
    pub wander_amount: f32,
    pub max_speed: f32,
    pub max_force: f32,
    pub bounce_force: f32,
    pub agent_size: f32,
    pub background_color: Color,
    pub show_mask_overlay: bool,
    pub dark_palette: bool,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            agent_count: 100,
            avoidance_strength: 2.5,
            wander_amount: 0.3,
            max_speed: 2.0,
            max_force: 0.1,
            bounce_force: 0.8,
            agent_size: 12.0,
            background_color: Color::rgb(0x1e, 0x29, 0x3b),
            show_mask_overlay: false,
            dark_palette: false,
        }
    }
}

/// Result of applying a [`ConfigUpdate`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ConfigChange {
    /// Agent count or base size changed, so the population must be rebuilt.
    pub regenerate_population: bool,
}

impl SimulationConfig {
    /// Clamps every value into a range the simulation can always run with.
    /// Non-finite values fall back to the defaults.
    pub fn sanitize(&mut self) {
        let defaults = Self::default();
        let finite_or = |value: f32, fallback: f32| if value.is_finite() { value } else { fallback };

        self.agent_count = self.agent_count.clamp(1, MAX_AGENT_COUNT);
        self.avoidance_strength =
            finite_or(self.avoidance_strength, defaults.avoidance_strength).max(0.0);
        self.wander_amount = finite_or(self.wander_amount, defaults.wander_amount).max(0.0);
        self.max_speed = finite_or(self.max_speed, defaults.max_speed).max(MIN_MAX_SPEED);
        self.max_force = finite_or(self.max_force, defaults.max_force).max(MIN_MAX_FORCE);
        self.bounce_force = finite_or(self.bounce_force, defaults.bounce_force).clamp(0.0, 1.0);
        self.agent_size = finite_or(self.agent_size, defaults.agent_size).max(MIN_AGENT_SIZE);
    }

    pub fn sanitized(mut self) -> Self {
        self.sanitize();
        self
    }

    /// Merges a partial update, sanitizes, and reports whether the population
    /// has to be regenerated.
    pub fn apply(&mut self, update: &ConfigUpdate) -> ConfigChange {
        let previous_count = self.agent_count;
        let previous_size = self.agent_size;

        if let Some(count) = update.agent_count {
            self.agent_count = count;
        }
        if let Some(v) = update.avoidance_strength {
            self.avoidance_strength = v;
        }
        if let Some(v) = update.wander_amount {
            self.wander_amount = v;
        }
        if let Some(v) = update.max_speed {
            self.max_speed = v;
        }
        if let Some(v) = update.max_force {
            self.max_force = v;
        }
        if let Some(v) = update.bounce_force {
            self.bounce_force = v;
        }
        if let Some(v) = update.agent_size {
            self.agent_size = v;
        }
        if let Some(color) = update.background_color {
            self.background_color = color;
        }
        if let Some(show) = update.show_mask_overlay {
            self.show_mask_overlay = show;
        }
        if let Some(dark) = update.dark_palette {
            self.dark_palette = dark;
        }
        self.sanitize();

        ConfigChange {
            regenerate_population: self.agent_count != previous_count
                || self.agent_size != previous_size,
        }
    }

    pub fn palette(&self) -> AgentPalette {
        if self.dark_palette {
            AgentPalette::DARK
        } else {
            AgentPalette::NORMAL
        }
    }

    /// Index of the current background in [`BACKGROUND_PRESETS`], if it is one.
    pub fn background_preset_index(&self) -> Option<usize> {
        BACKGROUND_PRESETS
            .iter()
            .position(|(_, color)| *color == self.background_color)
    }

    pub fn next_background_preset(&self) -> Color {
        let next = self
            .background_preset_index()
            .map_or(0, |i| (i + 1) % BACKGROUND_PRESETS.len());
        BACKGROUND_PRESETS[next].1
    }
}

/// A partial configuration; `None` fields keep their current value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConfigUpdate {
    pub agent_count: Option<usize>,
    pub avoidance_strength: Option<f32>,
    pub wander_amount: Option<f32>,
    pub max_speed: Option<f32>,
    pub max_force: Option<f32>,
    pub bounce_force: Option<f32>,
    pub agent_size: Option<f32>,
    pub background_color: Option<Color>,
    pub show_mask_overlay: Option<bool>,
    pub dark_palette: Option<bool>,
}

impl ConfigUpdate {
    /// An update that restores every field to its default.
    pub fn reset_defaults() -> Self {
        let d = SimulationConfig::default();
        Self {
            agent_count: Some(d.agent_count),
            avoidance_strength: Some(d.avoidance_strength),
            wander_amount: Some(d.wander_amount),
            max_speed: Some(d.max_speed),
            max_force: Some(d.max_force),
            bounce_force: Some(d.bounce_force),
            agent_size: Some(d.agent_size),
            background_color: Some(d.background_color),
            show_mask_overlay: Some(d.show_mask_overlay),
            dark_palette: Some(d.dark_palette),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_long_and_short_hex() {
        assert_eq!(Color::from_hex("#1e293b"), Ok(Color::rgb(0x1e, 0x29, 0x3b)));
        assert_eq!("fff".parse::<Color>(), Ok(Color::rgb(255, 255, 255)));
        assert_eq!(Color::rgb(0x8b, 0x45, 0x13).to_hex(), "#8b4513");
    }

    #[test]
    fn rejects_malformed_hex() {
        assert!(Color::from_hex("#12345").is_err());
        assert!(Color::from_hex("#gg0000").is_err());
        assert!(Color::from_hex("").is_err());
    }

    #[test]
    fn sanitize_clamps_to_safe_minimums() {
        let mut config = SimulationConfig {
            agent_count: 0,
            avoidance_strength: -1.0,
            wander_amount: f32::NAN,
            max_speed: 0.0,
            max_force: -3.0,
            bounce_force: 4.0,
            agent_size: 0.0,
            ..SimulationConfig::default()
        };
        config.sanitize();

        assert_eq!(config.agent_count, 1);
        assert_eq!(config.avoidance_strength, 0.0);
        assert_eq!(config.wander_amount, SimulationConfig::default().wander_amount);
        assert!(config.max_speed > 0.0);
        assert!(config.max_force > 0.0);
        assert_eq!(config.bounce_force, 1.0);
        assert!(config.agent_size >= MIN_AGENT_SIZE);
    }

    #[test]
    fn apply_flags_regeneration_only_for_count_or_size() {
        let mut config = SimulationConfig::default();

        let change = config.apply(&ConfigUpdate {
            wander_amount: Some(1.0),
            show_mask_overlay: Some(true),
            ..Default::default()
        });
        assert!(!change.regenerate_population);
        assert_eq!(config.wander_amount, 1.0);
        assert!(config.show_mask_overlay);

        let change = config.apply(&ConfigUpdate {
            agent_count: Some(250),
            ..Default::default()
        });
        assert!(change.regenerate_population);

        let change = config.apply(&ConfigUpdate {
            agent_size: Some(20.0),
            ..Default::default()
        });
        assert!(change.regenerate_population);

        // Same value again is not a change.
        let change = config.apply(&ConfigUpdate {
            agent_size: Some(20.0),
            ..Default::default()
        });
        assert!(!change.regenerate_population);
    }

    #[test]
    fn background_presets_cycle() {
        let mut config = SimulationConfig::default();
        assert_eq!(config.background_preset_index(), Some(2));
        config.background_color = config.next_background_preset();
        assert_eq!(config.background_preset_index(), Some(3));

        config.background_color = Color::rgb(1, 2, 3);
        assert_eq!(config.next_background_preset(), BACKGROUND_PRESETS[0].1);
    }

    #[test]
    fn reset_defaults_restores_everything() {
        let mut config = SimulationConfig {
            agent_count: 900,
            dark_palette: true,
            ..SimulationConfig::default()
        };
        config.apply(&ConfigUpdate::reset_defaults());
        assert_eq!(config, SimulationConfig::default());
        assert_eq!(config.palette(), AgentPalette::NORMAL);
    }
}

// --- End of File: config.rs ---
