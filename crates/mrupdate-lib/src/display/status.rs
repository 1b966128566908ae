//! Status display for user feedback
//!
//! Semantic status lines that replace raw `println!` usage. Logging goes
//! through `tracing`; this is what the user reads.

use super::styling::StyleManager;

/// Status display manager for semantic user feedback
pub struct StatusDisplay<'a> {
    styling: &'a StyleManager,
}

fn join(item: &str, details: &str) -> String {
    if details.is_empty() {
        item.to_string()
    } else {
        format!("{}: {}", item, details)
    }
}

impl<'a> StatusDisplay<'a> {
    pub fn new(styling: &'a StyleManager) -> Self {
        Self { styling }
    }

    /// Output: `✓ item: details`
    pub fn success(&self, item: &str, details: &str) {
        println!("{}", self.styling.format_success(&join(item, details)));
    }

    /// Output: `✗ item: details`
    pub fn error(&self, item: &str, details: &str) {
        println!("{}", self.styling.format_error(&join(item, details)));
    }

    pub fn warning(&self, message: &str) {
        println!("{}", self.styling.format_warning(message));
    }

    pub fn info(&self, message: &str) {
        println!("{}", self.styling.format_info(message));
    }

    pub fn working(&self, message: &str) {
        println!("{}", self.styling.format_working(message));
    }

    pub fn message(&self, text: &str) {
        println!("{}", text);
    }

    pub fn subtle(&self, text: &str) {
        println!("{}", self.styling.style_subtle(text));
    }

    pub fn list(&self, items: &[&str]) {
        for item in items {
            println!("  {} {}", self.styling.bullet(), item);
        }
    }

    /// Header for a section of work
    pub fn section(&self, title: &str) {
        println!();
        println!("{}", self.styling.style_emphasis(title));
    }

    /// Output: `[1/3] description`
    pub fn step(&self, current: usize, total: usize, description: &str) {
        let prefix = format!("[{}/{}]", current, total);
        println!("{} {}", self.styling.style_subtle(&prefix), description);
    }
}

#[cfg(test)]
mod tests {
    include!("status.test.rs");
}
