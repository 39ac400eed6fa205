use comfy_table::{ContentArrangement, Table, presets};
use owo_colors::OwoColorize;

/// Terminal output helpers so every command prints the same way
#[derive(Debug, Clone, Default)]
pub struct Output {
    /// Machine-readable mode: decorative lines are suppressed
    quiet: bool,
}

impl Output {
    pub fn quiet(quiet: bool) -> Self {
        Self { quiet }
    }

    pub fn is_quiet(&self) -> bool {
        self.quiet
    }

    /// Bold heading with an underline
    pub fn section(&self, title: &str) {
        if self.quiet {
            return;
        }
        println!();
        println!("{}", title.bold().bright_cyan());
        println!("{}", "─".repeat(title.chars().count()).dimmed());
    }

    /// Raw line, always printed
    pub fn print(&self, line: &str) {
        println!("{line}");
    }

    pub fn info(&self, icon: &str, message: &str) {
        if !self.quiet {
            println!("{icon} {message}");
        }
    }

    pub fn success(&self, message: &str) {
        if !self.quiet {
            println!("{} {}", "✓".bright_green(), message);
        }
    }

    pub fn warning(&self, message: &str) {
        eprintln!("{} {}", "⚠".yellow(), message.yellow());
    }

    pub fn error(&self, message: &str) {
        eprintln!("{} {}", "✗".bright_red(), message.bright_red());
    }

    pub fn status(&self, message: &str) {
        if !self.quiet {
            println!("{}", message.dimmed());
        }
    }

    pub fn kv(&self, key: &str, value: &str) {
        if !self.quiet {
            println!("{} {}", format!("{key}:").bright_blue(), value);
        }
    }

    pub fn list_item(&self, item: &str) {
        if !self.quiet {
            println!("  {} {}", "•".dimmed(), item);
        }
    }

    /// Table with the house style applied
    pub fn table(&self, header: &[&str]) -> Table {
        let mut table = Table::new();
        table
            .load_preset(presets::UTF8_FULL_CONDENSED)
            .set_content_arrangement(ContentArrangement::Dynamic)
            .set_header(header.to_vec());
        table
    }

    pub fn print_table(&self, table: &Table) {
        if !self.quiet {
            println!("{table}");
        }
    }
}
