//! Period colour schemes.
//!
//! The palette is owned by the dashboard's theming collaborator; the exporter
//! only reads it to give each period the same visual identity in the artifact.

use crate::period::PeriodColumn;
use serde::Serialize;

/// Named palette entry for a period's visual identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ColorScheme {
    pub name: &'static str,
    pub primary: &'static str,
    pub secondary: &'static str,
    /// Whether text on `primary` must be light.
    pub is_dark: bool,
}

/// Built-in palette, in default assignment order.
pub const COLOR_SCHEMES: &[ColorScheme] = &[
    ColorScheme {
        name: "blue",
        primary: "#288cfa",
        secondary: "#103766",
        is_dark: true,
    },
    ColorScheme {
        name: "green",
        primary: "#2e865f",
        secondary: "#c8e6c9",
        is_dark: true,
    },
    ColorScheme {
        name: "yellow",
        primary: "#ffd700",
        secondary: "#8b7500",
        is_dark: false,
    },
    ColorScheme {
        name: "orange",
        primary: "#ff6b35",
        secondary: "#ffe0d6",
        is_dark: false,
    },
    ColorScheme {
        name: "boldContrast",
        primary: "#003366",
        secondary: "#ff0000",
        is_dark: true,
    },
    ColorScheme {
        name: "purple",
        primary: "#7e57c2",
        secondary: "#ede7f6",
        is_dark: true,
    },
];

impl ColorScheme {
    /// Look a scheme up by name (case-insensitive).
    pub fn by_name(name: &str) -> Option<&'static ColorScheme> {
        COLOR_SCHEMES
            .iter()
            .find(|s| s.name.eq_ignore_ascii_case(name.trim()))
    }

    /// Scheme for a column at `index` in the visible order.
    ///
    /// A recognised `custom_color` wins; otherwise the palette is cycled.
    pub fn for_column(column: &PeriodColumn, index: usize) -> &'static ColorScheme {
        column
            .custom_color
            .as_deref()
            .and_then(ColorScheme::by_name)
            .unwrap_or(&COLOR_SCHEMES[index % COLOR_SCHEMES.len()])
    }

    /// Text colour that reads on `primary`.
    pub fn text_color(&self) -> &'static str {
        if self.is_dark {
            "#ffffff"
        } else {
            "#1f2937"
        }
    }
}
