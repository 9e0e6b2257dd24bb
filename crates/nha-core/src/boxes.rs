//! Bordered panel detection
//!
//! Windowports that draw menus and message windows with line-drawing
//! characters leave rectangles like this on screen:
//!
//! ```text
//! ┌──────────────┐
//! │ Discoveries  │
//! │ ...          │
//! └──────────────┘
//! ```
//!
//! [`find_boxes`] locates every outermost rectangle and [`extract_boxes`]
//! returns the interior text of each, in reading order. The glyph set is a
//! configuration point ([`BorderGlyphs`]) since themes differ between
//! terminals and builds.

use serde::{Deserialize, Serialize};

use crate::frame::Frame;

/// Glyphs that make up panel borders
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BorderGlyphs {
    pub top_left: char,
    pub top_right: char,
    pub bottom_left: char,
    pub bottom_right: char,
    pub horizontal: char,
    pub vertical: char,
    /// T-junction opening downwards, valid on the top border
    pub tee_down: char,
    /// T-junction opening upwards, valid on the bottom border
    pub tee_up: char,
    /// T-junction opening rightwards, valid on the left border
    pub tee_right: char,
    /// T-junction opening leftwards, valid on the right border
    pub tee_left: char,
}

impl Default for BorderGlyphs {
    fn default() -> Self {
        Self {
            top_left: '┌',
            top_right: '┐',
            bottom_left: '└',
            bottom_right: '┘',
            horizontal: '─',
            vertical: '│',
            tee_down: '┬',
            tee_up: '┴',
            tee_right: '├',
            tee_left: '┤',
        }
    }
}

impl BorderGlyphs {
    fn top_edge(&self, ch: char) -> bool {
        ch == self.horizontal || ch == self.tee_down
    }

    fn bottom_edge(&self, ch: char) -> bool {
        ch == self.horizontal || ch == self.tee_up
    }

    fn left_edge(&self, ch: char) -> bool {
        ch == self.vertical || ch == self.tee_right
    }

    fn right_edge(&self, ch: char) -> bool {
        ch == self.vertical || ch == self.tee_left
    }
}

/// Border cell coordinates of a detected panel (inclusive)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoxBounds {
    pub top: usize,
    pub left: usize,
    pub bottom: usize,
    pub right: usize,
}

impl BoxBounds {
    /// True when `self` lies inside `outer` and is not the same box
    #[must_use]
    pub fn is_strictly_inside(&self, outer: &Self) -> bool {
        self != outer
            && outer.top <= self.top
            && outer.left <= self.left
            && outer.bottom >= self.bottom
            && outer.right >= self.right
    }
}

struct Grid {
    rows: Vec<Vec<char>>,
}

impl Grid {
    fn new(frame: &Frame) -> Self {
        Self {
            rows: frame.lines().map(|line| line.chars().collect()).collect(),
        }
    }

    fn at(&self, row: usize, col: usize) -> char {
        self.rows
            .get(row)
            .and_then(|line| line.get(col))
            .copied()
            .unwrap_or(' ')
    }

    fn height(&self) -> usize {
        self.rows.len()
    }

    fn width(&self, row: usize) -> usize {
        self.rows.get(row).map_or(0, Vec::len)
    }
}

fn scan_down(grid: &Grid, glyphs: &BorderGlyphs, top: usize, col: usize) -> Option<usize> {
    (top + 1..grid.height())
        .take_while(|&row| {
            let ch = grid.at(row, col);
            ch == glyphs.bottom_left || glyphs.left_edge(ch)
        })
        .find(|&row| grid.at(row, col) == glyphs.bottom_left)
}

fn scan_right(grid: &Grid, glyphs: &BorderGlyphs, row: usize, left: usize) -> Option<usize> {
    (left + 1..grid.width(row))
        .take_while(|&col| {
            let ch = grid.at(row, col);
            ch == glyphs.top_right || glyphs.top_edge(ch)
        })
        .find(|&col| grid.at(row, col) == glyphs.top_right)
}

fn borders_valid(grid: &Grid, glyphs: &BorderGlyphs, bounds: &BoxBounds) -> bool {
    let BoxBounds {
        top,
        left,
        bottom,
        right,
    } = *bounds;
    if grid.at(bottom, right) != glyphs.bottom_right {
        return false;
    }
    let horizontal = left + 1..right;
    let vertical = top + 1..bottom;
    horizontal.clone().all(|col| glyphs.top_edge(grid.at(top, col)))
        && horizontal.into_iter().all(|col| glyphs.bottom_edge(grid.at(bottom, col)))
        && vertical.clone().all(|row| glyphs.left_edge(grid.at(row, left)))
        && vertical.into_iter().all(|row| glyphs.right_edge(grid.at(row, right)))
}

/// Locate outermost bordered panels in reading order
#[must_use]
pub fn find_boxes(frame: &Frame, glyphs: &BorderGlyphs) -> Vec<BoxBounds> {
    let grid = Grid::new(frame);
    let mut accepted = Vec::new();

    for top in 0..grid.height() {
        for left in 0..grid.width(top) {
            if grid.at(top, left) != glyphs.top_left {
                continue;
            }
            let Some(bottom) = scan_down(&grid, glyphs, top, left) else {
                continue;
            };
            let Some(right) = scan_right(&grid, glyphs, top, left) else {
                continue;
            };
            let bounds = BoxBounds {
                top,
                left,
                bottom,
                right,
            };
            if borders_valid(&grid, glyphs, &bounds) {
                accepted.push(bounds);
            }
        }
    }

    accepted
        .iter()
        .filter(|inner| !accepted.iter().any(|outer| inner.is_strictly_inside(outer)))
        .copied()
        .collect()
}

/// Interior text of a panel: rows right-trimmed, trailing blank rows dropped
#[must_use]
pub fn box_content(frame: &Frame, bounds: &BoxBounds) -> String {
    let grid = Grid::new(frame);
    let mut rows: Vec<String> = (bounds.top + 1..bounds.bottom)
        .map(|row| {
            (bounds.left + 1..bounds.right)
                .map(|col| grid.at(row, col))
                .collect::<String>()
                .trim_end()
                .to_string()
        })
        .collect();
    while rows.last().is_some_and(String::is_empty) {
        rows.pop();
    }
    rows.join("\n")
}

/// Interior text of every outermost non-empty panel, in reading order
#[must_use]
pub fn extract_boxes(frame: &Frame, glyphs: &BorderGlyphs) -> Vec<String> {
    find_boxes(frame, glyphs)
        .iter()
        .map(|bounds| box_content(frame, bounds))
        .filter(|content| !content.trim().is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(lines: &[&str]) -> Vec<String> {
        extract_boxes(&Frame::from_lines(lines), &BorderGlyphs::default())
    }

    #[test]
    fn two_side_by_side_boxes_in_reading_order() {
        let boxes = parse(&[
            "┌─────┐   ┌────┐",
            "│ one │   │two │",
            "└─────┘   │    │",
            "          └────┘",
        ]);
        assert_eq!(boxes, vec![" one".to_string(), "two".to_string()]);
    }

    #[test]
    fn stacked_boxes_sorted_top_first() {
        let boxes = parse(&[
            "      ┌──┐",
            "      │b │",
            "      └──┘",
            "┌──┐",
            "│a │",
            "└──┘",
        ]);
        assert_eq!(boxes, vec!["b".to_string(), "a".to_string()]);
    }

    #[test]
    fn nested_box_is_not_returned_separately() {
        let frame = Frame::from_lines(&[
            "┌────────┐",
            "│outer   │",
            "│ ┌──┐   │",
            "│ │in│   │",
            "│ └──┘   │",
            "└────────┘",
        ]);
        let bounds = find_boxes(&frame, &BorderGlyphs::default());
        assert_eq!(bounds.len(), 1);
        assert_eq!(
            bounds[0],
            BoxBounds {
                top: 0,
                left: 0,
                bottom: 5,
                right: 9
            }
        );
        let content = extract_boxes(&frame, &BorderGlyphs::default());
        assert_eq!(content.len(), 1);
        assert!(content[0].starts_with("outer"));
        assert!(content[0].contains("│in│"));
    }

    #[test]
    fn junctions_are_valid_border_cells() {
        let boxes = parse(&[
            "┌──┬──┐",
            "│ab│cd│",
            "├──┼──┤",
            "│ef│gh│",
            "└──┴──┘",
        ]);
        assert_eq!(boxes.len(), 1);
        assert!(boxes[0].starts_with("ab│cd"));
    }

    #[test]
    fn broken_border_is_rejected() {
        let boxes = parse(&["┌──┐", "│ab ", "└──┘"]);
        assert!(boxes.is_empty());
    }

    #[test]
    fn wrong_bottom_right_corner_is_rejected() {
        let boxes = parse(&["┌──┐", "│ab│", "└──┤"]);
        assert!(boxes.is_empty());
    }

    #[test]
    fn blank_boxes_are_omitted_and_trailing_rows_trimmed() {
        assert!(parse(&["┌──┐", "│  │", "└──┘"]).is_empty());
        assert_eq!(
            parse(&["┌────┐", "│ x  │", "│    │", "└────┘"]),
            vec![" x".to_string()]
        );
    }

    #[test]
    fn custom_glyph_set() {
        let glyphs = BorderGlyphs {
            top_left: '╔',
            top_right: '╗',
            bottom_left: '╚',
            bottom_right: '╝',
            horizontal: '═',
            vertical: '║',
            tee_down: '╦',
            tee_up: '╩',
            tee_right: '╠',
            tee_left: '╣',
        };
        let frame = Frame::from_lines(&["╔══╗", "║ok║", "╚══╝"]);
        assert_eq!(extract_boxes(&frame, &glyphs), vec!["ok".to_string()]);
        assert!(extract_boxes(&frame, &BorderGlyphs::default()).is_empty());
    }

    #[test]
    fn strict_containment() {
        let outer = BoxBounds {
            top: 0,
            left: 0,
            bottom: 10,
            right: 10,
        };
        let inner = BoxBounds {
            top: 1,
            left: 1,
            bottom: 3,
            right: 3,
        };
        assert!(inner.is_strictly_inside(&outer));
        assert!(!outer.is_strictly_inside(&inner));
        assert!(!outer.is_strictly_inside(&outer));
    }
}
