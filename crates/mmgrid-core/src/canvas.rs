//! Canvas (§4.4): a 2D character grid with safe write semantics.
//!
//! Dynamically sized to fit the maximum painted coordinate. Writes outside
//! the current extent grow the grid; negative coordinates are silently
//! ignored rather than panicking, since a layout bug upstream should not
//! crash the renderer (only a `LayoutError` invariant is grounds for that,
//! and this isn't one).

use crate::charset::{Cell, Family};

pub struct Canvas {
    rows: Vec<Vec<Cell>>,
    width: usize,
}

impl Canvas {
    #[must_use]
    pub fn new() -> Self {
        Self {
            rows: Vec::new(),
            width: 0,
        }
    }

    fn ensure_size(&mut self, x: usize, y: usize) {
        if y >= self.rows.len() {
            self.rows.resize_with(y + 1, || vec![Cell::space(); self.width]);
        }
        if x >= self.width {
            self.width = x + 1;
            for row in &mut self.rows {
                row.resize(self.width, Cell::space());
            }
        }
    }

    /// Write a single glyph. Non-opaque families OR-merge their arms with
    /// whatever is already in the cell (if also non-blank); opaque writes
    /// (borders, arrowheads, stub overwrites, text) simply replace the cell.
    pub fn put(&mut self, x: i64, y: i64, ch: char, family: Family, arms: crate::charset::Arms, charset: crate::charset::Charset) {
        if x < 0 || y < 0 {
            return;
        }
        let (x, y) = (x as usize, y as usize);
        self.ensure_size(x, y);
        let cell = &mut self.rows[y][x];
        if family == Family::Opaque || cell.is_blank() {
            *cell = Cell { ch, family, arms };
            return;
        }
        if cell.family != family {
            // Distinct line families are independent merge tables (§4.5);
            // mixing them is undefined and the second write wins.
            *cell = Cell { ch, family, arms };
            return;
        }
        let merged_arms = cell.arms | arms;
        let merged_ch = charset.glyph_for(family, merged_arms);
        *cell = Cell {
            ch: merged_ch,
            family,
            arms: merged_arms,
        };
    }

    /// Force-overwrite a cell regardless of what's there (used for exit
    /// stubs, §4.6 phase 6 — "a targeted write, not an OR-merge").
    pub fn put_forced(&mut self, x: i64, y: i64, ch: char) {
        if x < 0 || y < 0 {
            return;
        }
        let (x, y) = (x as usize, y as usize);
        self.ensure_size(x, y);
        self.rows[y][x] = Cell {
            ch,
            family: Family::Opaque,
            arms: Arms::NONE,
        };
    }

    /// Write a string left-to-right starting at `(x, y)`; each scalar code
    /// point occupies exactly one cell.
    pub fn put_string(&mut self, x: i64, y: i64, s: &str) {
        for (i, ch) in s.chars().enumerate() {
            self.put_forced(x + i as i64, y, ch);
        }
    }

    #[must_use]
    pub fn get(&self, x: i64, y: i64) -> Option<Cell> {
        if x < 0 || y < 0 {
            return None;
        }
        let (x, y) = (x as usize, y as usize);
        self.rows.get(y).and_then(|row| row.get(x)).copied()
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.rows.len()
    }

    /// Reverse the order of rows in place (BT post-transform, §4.6 phase 7).
    pub fn flip_vertical(&mut self) {
        self.rows.reverse();
    }

    /// Reverse the order of columns in every row in place (RL post-transform).
    pub fn flip_horizontal(&mut self) {
        for row in &mut self.rows {
            row.reverse();
        }
    }

    /// Apply a glyph remap table in place — used by the BT/RL post-transform
    /// to swap direction-sensitive glyphs (`▼↔▲`, `┌↔└`, ...).
    pub fn remap(&mut self, table: &[(char, char)]) {
        for row in &mut self.rows {
            for cell in row {
                for &(from, to) in table {
                    if cell.ch == from {
                        cell.ch = to;
                        break;
                    }
                }
            }
        }
    }

    /// Render to a string: trims trailing whitespace on each line, trims
    /// trailing empty lines, and terminates with exactly one newline.
    #[must_use]
    pub fn to_string_trimmed(&self) -> String {
        let mut lines: Vec<String> = self
            .rows
            .iter()
            .map(|row| {
                let s: String = row.iter().map(|c| c.ch).collect();
                s.trim_end().to_string()
            })
            .collect();
        while lines.last().is_some_and(String::is_empty) {
            lines.pop();
        }
        // Every row's trailing whitespace is trimmed independently above, so a
        // centered narrow layer can come out shorter than a wider one below
        // it; re-pad every line to the widest surviving row so the grid stays
        // rectangular (§8 invariant #1).
        let width = lines.iter().map(|l| l.chars().count()).max().unwrap_or(0);
        for line in &mut lines {
            let pad = width - line.chars().count();
            if pad > 0 {
                line.push_str(&" ".repeat(pad));
            }
        }
        let mut out = lines.join("\n");
        out.push('\n');
        out
    }
}

impl Default for Canvas {
    fn default() -> Self {
        Self::new()
    }
}

use crate::charset::Arms;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::charset::Charset;

    #[test]
    fn negative_coordinates_are_ignored() {
        let mut c = Canvas::new();
        c.put(-1, -1, 'x', Family::Opaque, Arms::NONE, Charset::new(false));
        assert_eq!(c.width(), 0);
        assert_eq!(c.height(), 0);
    }

    #[test]
    fn grid_grows_to_fit_writes() {
        let mut c = Canvas::new();
        c.put_forced(4, 2, 'A');
        assert_eq!(c.width(), 5);
        assert_eq!(c.height(), 3);
    }

    #[test]
    fn trailing_whitespace_and_blank_lines_are_trimmed() {
        let mut c = Canvas::new();
        c.put_forced(0, 0, 'A');
        c.put_forced(0, 3, ' ');
        let s = c.to_string_trimmed();
        assert_eq!(s, "A\n");
    }

    #[test]
    fn shorter_rows_are_padded_to_the_widest_row() {
        let mut c = Canvas::new();
        c.put_forced(0, 0, 'A');
        c.put_forced(6, 1, 'B');
        let s = c.to_string_trimmed();
        let lines: Vec<&str> = s.lines().collect();
        assert_eq!(lines.len(), 2);
        let width = lines[1].chars().count();
        assert_eq!(lines[0].chars().count(), width);
        assert_eq!(lines[0], "A".to_string() + &" ".repeat(width - 1));
    }

    #[test]
    fn empty_canvas_renders_single_newline() {
        let c = Canvas::new();
        assert_eq!(c.to_string_trimmed(), "\n");
    }

    #[test]
    fn arms_merge_on_overlapping_solid_writes() {
        let mut c = Canvas::new();
        let cs = Charset::new(false);
        c.put(2, 2, '─', Family::Solid, Arms::LEFT | Arms::RIGHT, cs);
        c.put(2, 2, '│', Family::Solid, Arms::UP | Arms::DOWN, cs);
        assert_eq!(c.get(2, 2).unwrap().ch, '┼');
    }

    #[test]
    fn put_string_writes_one_codepoint_per_cell() {
        let mut c = Canvas::new();
        c.put_string(0, 0, "abc");
        assert_eq!(c.get(0, 0).unwrap().ch, 'a');
        assert_eq!(c.get(2, 0).unwrap().ch, 'c');
    }
}
