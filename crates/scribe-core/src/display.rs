//! Plain-text console surface for the rolling summary.
//!
//! The transcript console echoes lines as the store writes them; this
//! surface handles the summary console, redrawing only when the notes body
//! actually changed.

use chrono::Local;

/// Change-gated summary surface. Inactive instances still track the shown
/// body (for the transcript console and tests) but never draw.
pub struct SummaryDisplay {
    active: bool,
    current: String,
}

impl SummaryDisplay {
    pub fn new(active: bool) -> Self {
        Self {
            active,
            current: String::new(),
        }
    }

    /// Draw the banner before any notes exist.
    pub fn show_initial(&self) {
        if !self.active {
            return;
        }
        clear_screen();
        println!("=== Meeting Summary ===");
        println!("\nInitializing...\n");
        println!("============================");
    }

    /// Redraw with `body` unless it matches what is already shown.
    /// Returns whether anything changed.
    pub fn update(&mut self, body: &str) -> bool {
        if body == self.current {
            return false;
        }
        self.current = body.to_string();

        if self.active {
            clear_screen();
            println!("=== Meeting Summary ===\n");
            println!("{}", body);
            println!("\n============================");
            println!("\nLast updated: {}", Local::now().format("%I:%M:%S %p"));
        }
        true
    }

    pub fn shown(&self) -> &str {
        &self.current
    }
}

fn clear_screen() {
    print!("\x1b[2J\x1b[1;1H");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unchanged_body_is_a_noop() {
        let mut display = SummaryDisplay::new(false);

        assert!(display.update("notes v1"));
        assert!(!display.update("notes v1"));
        assert!(display.update("notes v2"));
        assert_eq!(display.shown(), "notes v2");
    }
}
