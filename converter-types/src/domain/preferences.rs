//! User preferences.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::DomainError;
use exchange_rates::CurrencyPair;

/// Theme selection. Only the name is stored; rendering is up to the UI.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AppTheme {
    #[default]
    System,
    Light,
    Dark,
    Blue,
    Green,
    Purple,
    Orange,
    Red,
}

impl AppTheme {
    pub fn all() -> &'static [AppTheme] {
        &[
            AppTheme::System,
            AppTheme::Light,
            AppTheme::Dark,
            AppTheme::Blue,
            AppTheme::Green,
            AppTheme::Purple,
            AppTheme::Orange,
            AppTheme::Red,
        ]
    }

    /// Stable identifier, as serialized.
    pub fn id(&self) -> &'static str {
        match self {
            AppTheme::System => "system",
            AppTheme::Light => "light",
            AppTheme::Dark => "dark",
            AppTheme::Blue => "blue",
            AppTheme::Green => "green",
            AppTheme::Purple => "purple",
            AppTheme::Orange => "orange",
            AppTheme::Red => "red",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            AppTheme::System => "System",
            AppTheme::Light => "Light",
            AppTheme::Dark => "Dark",
            AppTheme::Blue => "Ocean Blue",
            AppTheme::Green => "Forest Green",
            AppTheme::Purple => "Royal Purple",
            AppTheme::Orange => "Sunset Orange",
            AppTheme::Red => "Cherry Red",
        }
    }
}

impl std::fmt::Display for AppTheme {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.id())
    }
}

impl std::str::FromStr for AppTheme {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim().to_lowercase();
        AppTheme::all()
            .iter()
            .copied()
            .find(|t| t.id() == s)
            .ok_or_else(|| DomainError::ValidationError(format!("Unknown theme: {}", s)))
    }
}

/// Persisted user settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Preferences {
    pub theme: AppTheme,
    /// Seconds between scheduled refresh checks
    pub auto_refresh_interval_secs: u64,
    pub haptics_enabled: bool,
    pub show_rate_changes: bool,
    /// Pair selected on first launch
    pub default_pair: CurrencyPair,
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            theme: AppTheme::System,
            auto_refresh_interval_secs: 300,
            haptics_enabled: true,
            show_rate_changes: true,
            default_pair: CurrencyPair::default(),
        }
    }
}

impl Preferences {
    pub fn auto_refresh_interval(&self) -> Duration {
        Duration::from_secs(self.auto_refresh_interval_secs)
    }

    /// # Validation
    /// - Refresh interval must be positive
    pub fn validate(&self) -> Result<(), DomainError> {
        if self.auto_refresh_interval_secs == 0 {
            return Err(DomainError::ValidationError(
                "Auto-refresh interval must be positive".into(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use exchange_rates::Currency;

    #[test]
    fn test_defaults() {
        let prefs = Preferences::default();
        assert_eq!(prefs.theme, AppTheme::System);
        assert_eq!(prefs.auto_refresh_interval(), Duration::from_secs(300));
        assert_eq!(
            prefs.default_pair,
            CurrencyPair::new(Currency::USD, Currency::RUB)
        );
    }

    #[test]
    fn test_theme_parse() {
        assert_eq!("Dark".parse::<AppTheme>().unwrap(), AppTheme::Dark);
        assert_eq!(AppTheme::Blue.display_name(), "Ocean Blue");
        assert!("neon".parse::<AppTheme>().is_err());
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let prefs: Preferences = serde_json::from_str(r#"{"theme":"green"}"#).unwrap();
        assert_eq!(prefs.theme, AppTheme::Green);
        assert!(prefs.haptics_enabled);
        assert_eq!(prefs.auto_refresh_interval_secs, 300);
    }

    #[test]
    fn test_zero_interval_invalid() {
        let prefs = Preferences {
            auto_refresh_interval_secs: 0,
            ..Preferences::default()
        };
        assert!(matches!(prefs.validate(), Err(DomainError::ValidationError(_))));
    }
}
