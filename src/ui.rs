//! Terminal output helpers.
//!
//! - `Table` - box-drawn table that shrinks its widest columns to fit the terminal
//! - `QueryProgress` - spinner shown while module metadata is being queried
//!
//! ## Example
//!
//! ```rust
//! use copyko::ui::Table;
//!
//! let mut table = Table::new(&["Module", "Path"]);
//! table.add_row(vec!["e1000e".to_string(), "kernel/drivers/net/e1000e.ko".to_string()]);
//! table.print();
//! ```

use crate::modinfo::{MetadataProvider, ModuleInfo, QueryError};
use colored::*;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::Path;
use std::time::Duration;

/// Columns are never shrunk below this many characters.
const MIN_COLUMN: usize = 8;

pub struct Table {
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl Table {
    pub fn new(headers: &[&str]) -> Self {
        Self {
            headers: headers.iter().map(|s| s.to_string()).collect(),
            rows: Vec::new(),
        }
    }

    /// Rows with the wrong number of cells are ignored.
    pub fn add_row(&mut self, row: Vec<String>) {
        if row.len() == self.headers.len() {
            self.rows.push(row);
        }
    }

    pub fn print(&self) {
        let (_, term_width) = console::Term::stdout().size();
        print!("{}", self.render(term_width as usize));
    }

    /// Render to a string no wider than `max_width` where possible.
    pub fn render(&self, max_width: usize) -> String {
        if self.headers.is_empty() {
            return String::new();
        }

        let mut widths: Vec<usize> = self.headers.iter().map(|h| h.chars().count()).collect();
        for row in &self.rows {
            for (i, cell) in row.iter().enumerate() {
                widths[i] = widths[i].max(console::measure_text_width(&flatten(cell)));
            }
        }

        // Indent, outer borders and one space of padding each side per column.
        let overhead = 3 + 3 * widths.len();
        let available = max_width.saturating_sub(overhead);
        while widths.iter().sum::<usize>() > available {
            let Some((widest, &w)) = widths.iter().enumerate().max_by_key(|(_, w)| **w) else {
                break;
            };
            if w <= MIN_COLUMN {
                break;
            }
            widths[widest] -= 1;
        }

        let line = |left: &str, mid: &str, right: &str| {
            let cells: Vec<String> = widths.iter().map(|w| "─".repeat(w + 2)).collect();
            format!("  {}{}{}\n", left, cells.join(mid), right)
        };
        let row_line = |cells: &[String], header: bool| {
            let mut s = String::from("  │");
            for (cell, &width) in cells.iter().zip(&widths) {
                let text = console::truncate_str(&flatten(cell), width, "...").into_owned();
                let padding = width.saturating_sub(console::measure_text_width(&text));
                let text = if header { text.bold().to_string() } else { text };
                s.push_str(&format!(" {}{} │", text, " ".repeat(padding)));
            }
            s.push('\n');
            s
        };

        let mut out = line("┌", "┬", "┐");
        out.push_str(&row_line(&self.headers, true));
        out.push_str(&line("├", "┼", "┤"));
        for row in &self.rows {
            out.push_str(&row_line(row, false));
        }
        out.push_str(&line("└", "┴", "┘"));
        out
    }
}

fn flatten(s: &str) -> String {
    s.chars()
        .map(|c| match c {
            '\n' | '\r' | '\t' => ' ',
            _ => c,
        })
        .collect()
}

/// Wraps a provider and shows the module being queried on a spinner.
pub struct QueryProgress<'p, P: MetadataProvider + ?Sized> {
    inner: &'p mut P,
    bar: ProgressBar,
}

impl<'p, P: MetadataProvider + ?Sized> QueryProgress<'p, P> {
    pub fn new(inner: &'p mut P) -> Self {
        let bar = ProgressBar::new_spinner();
        if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.green} {msg}") {
            bar.set_style(style.tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", ""]));
        }
        bar.enable_steady_tick(Duration::from_millis(100));
        Self { inner, bar }
    }

    pub fn finish(self) {
        self.bar.finish_and_clear();
    }
}

impl<P: MetadataProvider + ?Sized> MetadataProvider for QueryProgress<'_, P> {
    fn query(&mut self, module: &Path) -> Result<ModuleInfo, QueryError> {
        let name = module.file_name().unwrap_or_default().to_string_lossy();
        self.bar.set_message(format!("Reading {}", name));
        self.inner.query(module)
    }
}
