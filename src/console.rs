use std::io::{self, BufRead, Write};

use crossterm::style::Stylize;

use crate::types::{Pattern, SignalKind};

/// One designated point on the interactive surface, in (sample, value) space.
pub type Point = (f64, f64);

/// What the operator sees when a detection result is rendered.
pub struct PlotView<'a> {
    pub position: &'a [f64],
    pub velocity: &'a [f64],
    pub boundaries: &'a [usize],
    pub threshold: f64,
    pub signal: SignalKind,
    pub manual_cuts: Option<&'a [usize]>,
}

/// Operator interaction surface. All waits are synchronous and unbounded;
/// the workflow blocks until the operator answers.
pub trait OperatorConsole {
    /// Yes/no prompt; empty input takes the shown default.
    fn confirm(&mut self, prompt: &str, default: bool) -> bool;

    /// Float prompt; empty input keeps the shown default.
    fn prompt_f64(&mut self, prompt: &str, default: f64) -> f64;

    /// Pattern prompt; empty input keeps the shown default.
    fn prompt_pattern(&mut self, default: Pattern) -> Pattern;

    /// Render both series with boundary overlays for inspection. Opaque:
    /// implementations may draw, print, or ignore.
    fn visualize(&mut self, view: &PlotView<'_>);

    /// Interactive point designation. Returns the points in the order the
    /// operator designated them; an empty result means none were chosen.
    fn designate_points(&mut self) -> Vec<Point>;

    fn info(&mut self, line: &str);
    fn warn(&mut self, line: &str);
    fn error(&mut self, line: &str);
}

const PLOT_WIDTH: usize = 72;
const SPARK_LEVELS: [char; 8] = ['▁', '▂', '▃', '▄', '▅', '▆', '▇', '█'];

/// Console over stdin/stdout with crossterm-colored feedback.
pub struct TerminalConsole;

impl TerminalConsole {
    pub fn new() -> Self {
        Self
    }

    fn read_line(&self) -> String {
        let mut buf = String::new();
        if io::stdin().lock().read_line(&mut buf).is_err() {
            return String::new();
        }
        buf.trim().to_string()
    }

    fn render_series(&self, label: &str, series: &[f64], boundaries: &[usize]) {
        if series.is_empty() {
            return;
        }
        let min = series.iter().fold(f64::INFINITY, |m, &v| m.min(v));
        let max = series.iter().fold(f64::NEG_INFINITY, |m, &v| m.max(v));
        println!("{label}  [{} samples, min {min:.3}, max {max:.3}]", series.len());
        println!("  {}", sparkline(series, PLOT_WIDTH));
        println!("  {}", marker_row(series.len(), boundaries, PLOT_WIDTH));
    }
}

impl Default for TerminalConsole {
    fn default() -> Self {
        Self::new()
    }
}

impl OperatorConsole for TerminalConsole {
    fn confirm(&mut self, prompt: &str, default: bool) -> bool {
        let hint = if default { "Y" } else { "N" };
        print!("{prompt} (Y/N) [{hint}]: ");
        let _ = io::stdout().flush();
        let reply = self.read_line();
        if reply.is_empty() {
            return default;
        }
        reply.eq_ignore_ascii_case("y")
    }

    fn prompt_f64(&mut self, prompt: &str, default: f64) -> f64 {
        loop {
            print!("{prompt} [{default}]: ");
            let _ = io::stdout().flush();
            let reply = self.read_line();
            if reply.is_empty() {
                return default;
            }
            match reply.parse() {
                Ok(value) => return value,
                Err(_) => self.error("Please enter a number."),
            }
        }
    }

    fn prompt_pattern(&mut self, default: Pattern) -> Pattern {
        loop {
            print!("Enter pattern (on_peak, between_peak, both) [{default}]: ");
            let _ = io::stdout().flush();
            let reply = self.read_line();
            if reply.is_empty() {
                return default;
            }
            match Pattern::parse(&reply) {
                Ok(pattern) => return pattern,
                Err(e) => self.error(&e.to_string()),
            }
        }
    }

    fn visualize(&mut self, view: &PlotView<'_>) {
        println!();
        self.render_series("Position", view.position, view.boundaries);

        let velocity_display: Vec<f64> = match view.signal {
            SignalKind::AbsVelocity => view.velocity.iter().map(|v| v.abs()).collect(),
            _ => view.velocity.to_vec(),
        };
        self.render_series("Velocity", &velocity_display, view.boundaries);

        if view.threshold != 0.0 {
            println!("  threshold {:.3} on {}", view.threshold, view.signal);
        }
        let indices: Vec<String> = view.boundaries.iter().map(|b| b.to_string()).collect();
        println!("  boundaries ({}): {}", view.boundaries.len(), indices.join(", "));
        if let Some(cuts) = view.manual_cuts {
            let cuts: Vec<String> = cuts.iter().map(|c| c.to_string()).collect();
            println!("  {}", format!("manual cuts: {}", cuts.join(", ")).magenta());
        }
        println!();
    }

    fn designate_points(&mut self) -> Vec<Point> {
        println!(
            "{}",
            "Enter boundary sample indices separated by spaces, then press enter:".cyan()
        );
        print!("> ");
        let _ = io::stdout().flush();
        self.read_line()
            .split_whitespace()
            .filter_map(|token| token.parse::<f64>().ok())
            .map(|x| (x, 0.0))
            .collect()
    }

    fn info(&mut self, line: &str) {
        println!("{}", line.green());
    }

    fn warn(&mut self, line: &str) {
        println!("{}", line.yellow());
    }

    fn error(&mut self, line: &str) {
        eprintln!("{}", line.red());
    }
}

/// Downsample a series to `width` columns of block characters.
fn sparkline(series: &[f64], width: usize) -> String {
    let min = series.iter().fold(f64::INFINITY, |m, &v| m.min(v));
    let max = series.iter().fold(f64::NEG_INFINITY, |m, &v| m.max(v));
    let span = if max > min { max - min } else { 1.0 };
    let width = width.min(series.len());

    (0..width)
        .map(|col| {
            let start = col * series.len() / width;
            let end = ((col + 1) * series.len() / width).max(start + 1);
            let bucket = &series[start..end];
            let mean = bucket.iter().sum::<f64>() / bucket.len() as f64;
            let level = ((mean - min) / span * (SPARK_LEVELS.len() - 1) as f64).round() as usize;
            SPARK_LEVELS[level.min(SPARK_LEVELS.len() - 1)]
        })
        .collect()
}

/// Boundary tick marks aligned under the sparkline columns.
fn marker_row(len: usize, boundaries: &[usize], width: usize) -> String {
    let width = width.min(len);
    let mut row = vec![' '; width];
    for &idx in boundaries {
        if len > 0 && idx < len {
            let col = idx * width / len;
            row[col.min(width - 1)] = '|';
        }
    }
    row.into_iter().collect()
}
