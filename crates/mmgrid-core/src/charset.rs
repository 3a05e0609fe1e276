//! Charset & Arms merging (§4.5).
//!
//! A box-drawing glyph is modeled as a 4-bit set of "arms" — the directions
//! in which a line segment leaves the cell's center. OR-merging two glyphs'
//! arm sets and looking the result back up in the active table is what lets
//! the canvas compose `─` and `│` into `┼` (or `├`, `┬`, ...) without the
//! renderer ever special-casing a junction shape directly.

use std::ops::{BitOr, BitOrAssign};

/// `{up, down, left, right}`, one bit each.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
pub struct Arms(u8);

impl Arms {
    pub const NONE: Arms = Arms(0);
    pub const UP: Arms = Arms(0b0001);
    pub const DOWN: Arms = Arms(0b0010);
    pub const LEFT: Arms = Arms(0b0100);
    pub const RIGHT: Arms = Arms(0b1000);

    #[must_use]
    pub fn bits(self) -> u8 {
        self.0
    }

    #[must_use]
    pub fn has(self, other: Arms) -> bool {
        self.0 & other.0 == other.0
    }
}

impl BitOr for Arms {
    type Output = Arms;
    fn bitor(self, rhs: Arms) -> Arms {
        Arms(self.0 | rhs.0)
    }
}

impl BitOrAssign for Arms {
    fn bitor_assign(&mut self, rhs: Arms) {
        self.0 |= rhs.0;
    }
}

/// Which independent glyph family a write belongs to (§4.5: "mixing families
/// is undefined and the second write wins").
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Family {
    Solid,
    Dotted,
    Thick,
    /// Box corners/border glyphs, arrowheads, and plain text — never merged,
    /// a write of this family always simply replaces the cell.
    Opaque,
}

/// One cell of canvas state: the glyph currently painted there, plus enough
/// to decide whether the next write should Arms-merge with it or replace it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cell {
    pub ch: char,
    pub family: Family,
    pub arms: Arms,
}

impl Cell {
    #[must_use]
    pub fn space() -> Self {
        Self {
            ch: ' ',
            family: Family::Opaque,
            arms: Arms::NONE,
        }
    }

    #[must_use]
    pub fn is_blank(self) -> bool {
        self.ch == ' '
    }
}

/// The active glyph table: Unicode box-drawing or plain ASCII.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Charset {
    pub ascii: bool,
}

impl Charset {
    #[must_use]
    pub fn new(ascii: bool) -> Self {
        Self { ascii }
    }

    /// Look up the glyph for a given arm set within a line family.
    #[must_use]
    pub fn glyph_for(self, family: Family, arms: Arms) -> char {
        if self.ascii {
            return ascii_glyph(family, arms);
        }
        unicode_glyph(family, arms)
    }

    #[must_use]
    pub fn rect_corner(self, which: Corner) -> char {
        if self.ascii {
            '+'
        } else {
            match which {
                Corner::TopLeft => '┌',
                Corner::TopRight => '┐',
                Corner::BottomLeft => '└',
                Corner::BottomRight => '┘',
            }
        }
    }

    #[must_use]
    pub fn rounded_corner(self, which: Corner) -> char {
        if self.ascii {
            match which {
                Corner::TopLeft | Corner::TopRight => '.',
                Corner::BottomLeft | Corner::BottomRight => '\'',
            }
        } else {
            match which {
                Corner::TopLeft => '╭',
                Corner::TopRight => '╮',
                Corner::BottomLeft => '╰',
                Corner::BottomRight => '╯',
            }
        }
    }

    #[must_use]
    pub fn horizontal(self) -> char {
        if self.ascii {
            '-'
        } else {
            '─'
        }
    }

    #[must_use]
    pub fn vertical(self) -> char {
        if self.ascii {
            '|'
        } else {
            '│'
        }
    }

    #[must_use]
    pub fn arrow(self, dir: ArrowDir) -> char {
        if self.ascii {
            match dir {
                ArrowDir::Up => '^',
                ArrowDir::Down => 'v',
                ArrowDir::Left => '<',
                ArrowDir::Right => '>',
            }
        } else {
            match dir {
                ArrowDir::Up => '▲',
                ArrowDir::Down => '▼',
                ArrowDir::Left => '◄',
                ArrowDir::Right => '►',
            }
        }
    }

    /// Exit-stub glyph for a border cell where an edge departs: arms
    /// deliberately exclude the border's own run direction, so the result is
    /// `┬/┴/├/┤`, never `┼` (§4.5).
    #[must_use]
    pub fn stub(self, border_arms: Arms, exit: Arms) -> char {
        self.glyph_for(Family::Solid, border_arms | exit)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Corner {
    TopLeft,
    TopRight,
    BottomLeft,
    BottomRight,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArrowDir {
    Up,
    Down,
    Left,
    Right,
}

fn unicode_glyph(family: Family, arms: Arms) -> char {
    use Arms as A;
    let (u, d, l, r) = (
        arms.has(A::UP),
        arms.has(A::DOWN),
        arms.has(A::LEFT),
        arms.has(A::RIGHT),
    );
    match family {
        Family::Solid | Family::Opaque => match (u, d, l, r) {
            (false, false, false, false) => ' ',
            (true, false, false, false) => '│',
            (false, true, false, false) => '│',
            (true, true, false, false) => '│',
            (false, false, true, false) => '─',
            (false, false, false, true) => '─',
            (false, false, true, true) => '─',
            (true, false, true, false) => '┘',
            (true, false, false, true) => '└',
            (false, true, true, false) => '┐',
            (false, true, false, true) => '┌',
            (true, true, true, false) => '┤',
            (true, true, false, true) => '├',
            (true, false, true, true) => '┴',
            (false, true, true, true) => '┬',
            (true, true, true, true) => '┼',
        },
        Family::Dotted => match (u, d, l, r) {
            (false, false, false, false) => ' ',
            (true, false, false, false) | (false, true, false, false) | (true, true, false, false) => '╎',
            (false, false, true, false) | (false, false, false, true) | (false, false, true, true) => '╌',
            _ => '┼',
        },
        Family::Thick => match (u, d, l, r) {
            (false, false, false, false) => ' ',
            (true, false, false, false) | (false, true, false, false) | (true, true, false, false) => '║',
            (false, false, true, false) | (false, false, false, true) | (false, false, true, true) => '═',
            (true, false, true, false) => '╝',
            (true, false, false, true) => '╚',
            (false, true, true, false) => '╗',
            (false, true, false, true) => '╔',
            (true, true, true, false) => '╣',
            (true, true, false, true) => '╠',
            (true, false, true, true) => '╩',
            (false, true, true, true) => '╦',
            (true, true, true, true) => '╬',
        },
    }
}

fn ascii_glyph(family: Family, arms: Arms) -> char {
    use Arms as A;
    let vertical_ish = arms.has(A::UP) || arms.has(A::DOWN);
    let horizontal_ish = arms.has(A::LEFT) || arms.has(A::RIGHT);
    match family {
        Family::Dotted => {
            if arms == Arms::NONE {
                ' '
            } else if vertical_ish && !horizontal_ish {
                ':'
            } else if horizontal_ish && !vertical_ish {
                '.'
            } else {
                '+'
            }
        }
        Family::Solid | Family::Thick | Family::Opaque => {
            if arms == Arms::NONE {
                ' '
            } else if vertical_ish && !horizontal_ish {
                '|'
            } else if horizontal_ish && !vertical_ish {
                '-'
            } else {
                '+'
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn solid_horizontal_merge_is_idempotent() {
        let cs = Charset::new(false);
        assert_eq!(cs.glyph_for(Family::Solid, Arms::LEFT | Arms::RIGHT), '─');
    }

    #[test]
    fn crossing_solid_and_vertical_makes_a_cross() {
        let cs = Charset::new(false);
        let merged = (Arms::LEFT | Arms::RIGHT) | (Arms::UP | Arms::DOWN);
        assert_eq!(cs.glyph_for(Family::Solid, merged), '┼');
    }

    #[test]
    fn border_plus_vertical_makes_a_tee() {
        let cs = Charset::new(false);
        // Top-left corner's arms are DOWN|RIGHT; merging an incoming vertical
        // stub (UP) must not occur here directly — this checks the simpler
        // down+right+up branch used by an exit stub on a top border.
        let merged = Arms::DOWN | Arms::RIGHT | Arms::UP;
        assert_eq!(cs.glyph_for(Family::Solid, merged), '├');
    }

    #[test]
    fn ascii_never_uses_unicode_glyphs() {
        let cs = Charset::new(true);
        assert_eq!(cs.horizontal(), '-');
        assert_eq!(cs.vertical(), '|');
        assert_eq!(cs.arrow(ArrowDir::Down), 'v');
        assert_eq!(cs.rect_corner(Corner::TopLeft), '+');
    }

    #[test]
    fn stub_excludes_crossing_glyph() {
        let cs = Charset::new(false);
        // A bottom-border exit stub: border runs left-right, edge exits down.
        let g = cs.stub(Arms::LEFT | Arms::RIGHT, Arms::DOWN);
        assert_ne!(g, '┼');
        assert_eq!(g, '┬');
    }
}
