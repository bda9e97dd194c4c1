use std::collections::HashMap;

/// Color configuration mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorMode {
    /// Auto-detect based on terminal and NO_COLOR env var.
    Auto,
    /// Always emit ANSI color codes.
    Always,
    /// Never emit ANSI color codes.
    Never,
}

/// Check if color should be used for the given mode and stream.
///
/// Respects:
/// - The `NO_COLOR` environment variable (<https://no-color.org/>)
/// - The `GIT_NO_COLOR` environment variable
/// - Whether the stream is a terminal (for Auto mode)
pub fn use_color(mode: ColorMode, is_terminal: bool) -> bool {
    match mode {
        ColorMode::Always => true,
        ColorMode::Never => false,
        ColorMode::Auto => {
            if std::env::var_os("NO_COLOR").is_some() {
                return false;
            }
            if std::env::var_os("GIT_NO_COLOR").is_some() {
                return false;
            }
            is_terminal
        }
    }
}

/// Semantic painting points of the fancy diff output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ColorSlot {
    /// Banner lines: rules and file/submodule summaries.
    Meta,
    /// Start of the changed region inside a paired hunk line.
    Emphasis,
    /// End of the changed region; restores the line's own colors.
    EmphasisOff,
    /// Cell drawn for an added or removed line with blank content.
    BlankCell,
    Reset,
}

impl ColorSlot {
    /// Return the built-in ANSI escape code for this slot.
    pub fn default_ansi(&self) -> &'static str {
        match self {
            ColorSlot::Meta => "\x1b[1m",
            ColorSlot::Emphasis => "\x1b[7m",
            ColorSlot::EmphasisOff => "\x1b[27m",
            ColorSlot::BlankCell => "\x1b[7m",
            ColorSlot::Reset => "\x1b[0m",
        }
    }
}

/// Color mode settings read from git config.
///
/// Holds the global `color.ui` mode and per-command overrides
/// (`color.<cmd>`).
pub struct ColorConfig {
    /// The global `color.ui` setting (default: Auto).
    pub ui: ColorMode,
    /// Per-command color mode overrides (e.g., `color.diff = always`).
    pub commands: HashMap<String, ColorMode>,
}

impl ColorConfig {
    /// Create a new `ColorConfig` with default values.
    pub fn new() -> Self {
        Self {
            ui: ColorMode::Auto,
            commands: HashMap::new(),
        }
    }

    /// Build a `ColorConfig` by reading values through a config lookup function.
    ///
    /// The `get_string` closure looks up a git config key (e.g., `"color.ui"`)
    /// and returns `Some(value)` when it is set.
    pub fn from_config<F>(get_string: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut cc = Self::new();

        if let Some(val) = get_string("color.ui") {
            cc.ui = parse_color_mode(&val);
        }

        for cmd in &["diff"] {
            let key = format!("color.{}", cmd);
            if let Some(val) = get_string(&key) {
                cc.commands.insert(cmd.to_string(), parse_color_mode(&val));
            }
        }

        cc
    }

    /// Determine the effective color mode for a given command.
    ///
    /// Priority order: CLI flag > per-command config > `color.ui` > default Auto.
    pub fn effective_mode(&self, command: &str, cli_flag: Option<ColorMode>) -> ColorMode {
        if let Some(mode) = cli_flag {
            return mode;
        }
        if let Some(&mode) = self.commands.get(command) {
            return mode;
        }
        self.ui
    }
}

impl Default for ColorConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Parse a git color mode string into a `ColorMode`.
///
/// Recognized values (case-insensitive):
/// - `"always"`, `"true"`, `"yes"` -> `ColorMode::Always`
/// - `"never"`, `"false"`, `"no"` -> `ColorMode::Never`
/// - anything else -> `ColorMode::Auto`
pub fn parse_color_mode(s: &str) -> ColorMode {
    match s.to_lowercase().as_str() {
        "always" | "true" | "yes" => ColorMode::Always,
        "never" | "false" | "no" => ColorMode::Never,
        _ => ColorMode::Auto,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn use_color_always() {
        assert!(use_color(ColorMode::Always, false));
        assert!(use_color(ColorMode::Always, true));
    }

    #[test]
    fn use_color_never() {
        assert!(!use_color(ColorMode::Never, false));
        assert!(!use_color(ColorMode::Never, true));
    }

    #[test]
    fn use_color_auto_not_terminal() {
        assert!(!use_color(ColorMode::Auto, false));
    }

    #[test]
    fn emphasis_pair_toggles_reverse_only() {
        assert_eq!(ColorSlot::Emphasis.default_ansi(), "\x1b[7m");
        assert_eq!(ColorSlot::EmphasisOff.default_ansi(), "\x1b[27m");
    }

    #[test]
    fn color_config_from_config_reads_ui_and_diff() {
        let cc = ColorConfig::from_config(|key| match key {
            "color.ui" => Some("never".to_string()),
            "color.diff" => Some("always".to_string()),
            _ => None,
        });
        assert_eq!(cc.ui, ColorMode::Never);
        assert_eq!(cc.commands.get("diff"), Some(&ColorMode::Always));
    }

    #[test]
    fn color_config_effective_mode_cli_flag_wins() {
        let mut cc = ColorConfig::new();
        cc.commands.insert("diff".to_string(), ColorMode::Never);
        assert_eq!(
            cc.effective_mode("diff", Some(ColorMode::Always)),
            ColorMode::Always
        );
    }

    #[test]
    fn color_config_effective_mode_falls_back_to_ui() {
        let mut cc = ColorConfig::new();
        cc.ui = ColorMode::Never;
        assert_eq!(cc.effective_mode("diff", None), ColorMode::Never);
        assert_eq!(ColorConfig::default().effective_mode("diff", None), ColorMode::Auto);
    }

    #[test]
    fn parse_color_mode_values() {
        assert_eq!(parse_color_mode("ALWAYS"), ColorMode::Always);
        assert_eq!(parse_color_mode("yes"), ColorMode::Always);
        assert_eq!(parse_color_mode("false"), ColorMode::Never);
        assert_eq!(parse_color_mode("auto"), ColorMode::Auto);
        assert_eq!(parse_color_mode(""), ColorMode::Auto);
    }
}
