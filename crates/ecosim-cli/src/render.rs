//! Console frames: header, grouped event log and the map.

use ecosim_core::{Coordinate, DisplayConfig, Event, EventKind};
use ecosim_world::{Entity, Grid};
use std::fmt::Write;

const CLEAR_SCREEN: &str = "\x1b[2J\x1b[H";

pub struct Renderer {
    display: DisplayConfig,
    empty_cell: String,
}

impl Renderer {
    pub fn new(display: DisplayConfig, empty_cell: &str) -> Self {
        Self {
            display,
            empty_cell: empty_cell.to_string(),
        }
    }

    /// Clear the terminal and print a whole frame
    pub fn draw(&self, grid: &Grid, turn: u64, events: &[Event]) {
        print!("{CLEAR_SCREEN}{}", self.frame(grid, turn, events));
    }

    pub fn frame(&self, grid: &Grid, turn: u64, events: &[Event]) -> String {
        let mut out = String::new();
        out.push_str(&header(turn));
        out.push('\n');
        for line in group_events(events, self.display.max_logs_per_line) {
            out.push_str(&line);
            out.push('\n');
        }
        out.push('\n');
        for line in self.map_lines(grid) {
            out.push_str(&line);
            out.push('\n');
        }
        out
    }

    pub fn map_lines(&self, grid: &Grid) -> Vec<String> {
        let mut lines = Vec::new();

        if self.display.show_coordinates {
            let separator = format!("    {}", "-".repeat(grid.width() as usize * 3 + 1));
            let mut columns = String::from("      ");
            for x in 0..grid.width() {
                if x > 0 {
                    columns.push(' ');
                }
                let _ = write!(columns, "{x:2}");
            }
            lines.push(separator.clone());
            lines.push(columns);
            lines.push(separator);
        }

        for y in 0..grid.height() {
            let symbols: Vec<&str> = (0..grid.width())
                .map(|x| {
                    grid.get(Coordinate::new(x, y))
                        .map(Entity::symbol)
                        .unwrap_or(self.empty_cell.as_str())
                })
                .collect();

            if self.display.show_coordinates {
                lines.push(format!("{y:2} |  {}", symbols.join(" ")));
            } else {
                lines.push(symbols.concat());
            }
        }

        lines
    }
}

pub fn header(turn: u64) -> String {
    if turn == 0 {
        "=== Start of simulation ===".to_string()
    } else {
        format!("=== Turn {turn} ===\n")
    }
}

/// Group events by kind in first-seen order, at most `per_line` entries per line
pub fn group_events(events: &[Event], per_line: usize) -> Vec<String> {
    let mut groups: Vec<(EventKind, Vec<String>)> = Vec::new();
    for event in events {
        match groups.iter_mut().find(|(kind, _)| *kind == event.kind) {
            Some((_, details)) => details.push(event.detail()),
            None => groups.push((event.kind, vec![event.detail()])),
        }
    }

    let per_line = per_line.max(1);
    groups
        .into_iter()
        .flat_map(|(kind, details)| {
            details
                .chunks(per_line)
                .map(|chunk| format!("{}: {}", kind.label(), chunk.join(", ")))
                .collect::<Vec<_>>()
        })
        .collect()
}
