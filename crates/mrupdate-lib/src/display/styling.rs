//! Semantic colors and symbols on top of `console`

use console::Style;

/// Symbol set for one terminal flavour
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Symbols {
    pub success: &'static str,
    pub error: &'static str,
    pub warning: &'static str,
    pub info: &'static str,
    pub arrow: &'static str,
    pub bullet: &'static str,
}

pub const UNICODE_SYMBOLS: Symbols = Symbols {
    success: "✓",
    error: "✗",
    warning: "!",
    info: "·",
    arrow: "→",
    bullet: "•",
};

pub const ASCII_SYMBOLS: Symbols = Symbols {
    success: "+",
    error: "x",
    warning: "!",
    info: "-",
    arrow: ">",
    bullet: "*",
};

/// Style manager resolved once from color and unicode support
#[derive(Debug, Clone)]
pub struct StyleManager {
    colors: bool,
    symbols: Symbols,
}

impl StyleManager {
    pub fn new(colors: bool, unicode: bool) -> Self {
        Self {
            colors,
            symbols: if unicode {
                UNICODE_SYMBOLS
            } else {
                ASCII_SYMBOLS
            },
        }
    }

    /// No color, ASCII symbols
    pub fn plain() -> Self {
        Self::new(false, false)
    }

    pub fn colors_enabled(&self) -> bool {
        self.colors
    }

    pub fn is_unicode(&self) -> bool {
        self.symbols == UNICODE_SYMBOLS
    }

    pub fn symbols(&self) -> &Symbols {
        &self.symbols
    }

    fn paint(&self, style: Style, text: &str) -> String {
        style.force_styling(self.colors).apply_to(text).to_string()
    }

    pub fn style_success(&self, text: &str) -> String {
        self.paint(Style::new().green(), text)
    }

    pub fn style_error(&self, text: &str) -> String {
        self.paint(Style::new().red(), text)
    }

    pub fn style_warning(&self, text: &str) -> String {
        self.paint(Style::new().yellow(), text)
    }

    pub fn style_info(&self, text: &str) -> String {
        self.paint(Style::new().cyan(), text)
    }

    pub fn style_emphasis(&self, text: &str) -> String {
        self.paint(Style::new().bold(), text)
    }

    pub fn style_subtle(&self, text: &str) -> String {
        self.paint(Style::new().dim(), text)
    }

    pub fn format_success(&self, message: &str) -> String {
        format!("{} {}", self.style_success(self.symbols.success), message)
    }

    pub fn format_error(&self, message: &str) -> String {
        format!("{} {}", self.style_error(self.symbols.error), message)
    }

    pub fn format_warning(&self, message: &str) -> String {
        format!("{} {}", self.style_warning(self.symbols.warning), message)
    }

    pub fn format_info(&self, message: &str) -> String {
        format!("{} {}", self.style_info(self.symbols.info), message)
    }

    pub fn format_working(&self, message: &str) -> String {
        format!("{} {}", self.style_info(self.symbols.arrow), message)
    }

    pub fn bullet(&self) -> String {
        self.style_subtle(self.symbols.bullet)
    }
}

#[cfg(test)]
mod tests {
    include!("styling.test.rs");
}
