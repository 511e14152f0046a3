//! Built-in color palettes for the picker UI.

use ratatui::style::Color;

use crate::config::ThemeConfig;

/// All runtime colors used in the UI.
#[derive(Debug, Clone)]
pub struct ThemeColors {
    // Tree panel
    pub tree_fg: Color,
    pub tree_focused_bg: Color,
    pub tree_folder_fg: Color,
    pub tree_selected_fg: Color,
    pub tree_match_fg: Color,
    pub tree_guide_fg: Color,

    // Status bar
    pub status_bg: Color,
    pub status_fg: Color,

    // Borders & chrome
    pub border_fg: Color,
    pub border_focused_fg: Color,

    // Semantic
    pub error_fg: Color,
    pub success_fg: Color,
    pub accent_fg: Color,
    pub dim_fg: Color,
}

/// Dark theme using Catppuccin Mocha palette.
pub fn dark_theme() -> ThemeColors {
    ThemeColors {
        tree_fg: Color::Rgb(205, 214, 244),         // #cdd6f4 (text)
        tree_focused_bg: Color::Rgb(69, 71, 90),    // #45475a (surface1)
        tree_folder_fg: Color::Rgb(137, 180, 250),  // #89b4fa (blue)
        tree_selected_fg: Color::Rgb(166, 227, 161), // #a6e3a1 (green)
        tree_match_fg: Color::Rgb(249, 226, 175),   // #f9e2af (yellow)
        tree_guide_fg: Color::Rgb(88, 91, 112),     // #585b70 (surface2)

        status_bg: Color::Rgb(30, 30, 46), // #1e1e2e (base)
        status_fg: Color::Rgb(205, 214, 244),

        border_fg: Color::Rgb(88, 91, 112),
        border_focused_fg: Color::Rgb(137, 180, 250),

        error_fg: Color::Rgb(243, 139, 168),  // #f38ba8 (red)
        success_fg: Color::Rgb(166, 227, 161),
        accent_fg: Color::Rgb(203, 166, 247), // #cba6f7 (mauve)
        dim_fg: Color::Rgb(108, 112, 134),    // #6c7086 (overlay0)
    }
}

/// Light theme using Catppuccin Latte palette.
pub fn light_theme() -> ThemeColors {
    ThemeColors {
        tree_fg: Color::Rgb(76, 79, 105),           // #4c4f69 (text)
        tree_focused_bg: Color::Rgb(204, 208, 218), // #ccd0da (surface1)
        tree_folder_fg: Color::Rgb(30, 102, 245),   // #1e66f5 (blue)
        tree_selected_fg: Color::Rgb(64, 160, 43),  // #40a02b (green)
        tree_match_fg: Color::Rgb(223, 142, 29),    // #df8e1d (yellow)
        tree_guide_fg: Color::Rgb(172, 176, 190),   // #acb0be (surface2)

        status_bg: Color::Rgb(239, 241, 245), // #eff1f5 (base)
        status_fg: Color::Rgb(76, 79, 105),

        border_fg: Color::Rgb(172, 176, 190),
        border_focused_fg: Color::Rgb(30, 102, 245),

        error_fg: Color::Rgb(210, 15, 57), // #d20f39 (red)
        success_fg: Color::Rgb(64, 160, 43),
        accent_fg: Color::Rgb(136, 57, 239), // #8839ef (mauve)
        dim_fg: Color::Rgb(156, 160, 176),   // #9ca0b0 (overlay0)
    }
}

/// Resolve the palette named by the config; unknown names fall back to dark.
pub fn resolve_theme(config: &ThemeConfig) -> ThemeColors {
    match config.scheme.as_deref().unwrap_or("dark") {
        "light" => light_theme(),
        _ => dark_theme(),
    }
}
