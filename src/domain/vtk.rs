//! Tolerant reader for legacy ASCII VTK polydata.
//!
//! Only the blocks a vascular tree needs are interpreted: `POINTS`, `LINES`
//! and the first cell scalar array (edge radius). Everything else is skipped.
//! Malformed or truncated input never fails; parsing stops and whatever was
//! read is returned together with a [`ParseIncomplete`] diagnostic.

use std::collections::VecDeque;
use std::str::FromStr;

use glam::DVec3;
use thiserror::Error;
use tracing::{debug, instrument};

use crate::domain::geometry::RawGeometry;

/// Where and why parsing stopped early.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("line {line}: {reason}")]
pub struct ParseIncomplete {
    /// 1-based line number, or the last line when input ran out.
    pub line: usize,
    pub reason: String,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParseOutcome {
    pub geometry: RawGeometry,
    pub issue: Option<ParseIncomplete>,
}

impl ParseOutcome {
    pub fn is_complete(&self) -> bool {
        self.issue.is_none()
    }
}

/// Parse file content into geometry.
#[instrument(level = "debug", skip_all, fields(bytes = content.len()))]
pub fn parse(content: &str) -> ParseOutcome {
    let mut parser = Parser::new(content);
    let issue = parser.run().err();
    let Parser {
        points,
        edges,
        radius,
        ..
    } = parser;

    debug!(
        points = points.len(),
        edges = edges.len(),
        radii = radius.as_ref().map_or(0, Vec::len),
        complete = issue.is_none(),
        "vtk parsed"
    );
    ParseOutcome {
        geometry: RawGeometry::new(points, edges, radius.unwrap_or_default()),
        issue,
    }
}

/// Line-aware token stream. Data blocks may spread values over lines freely.
struct Cursor<'a> {
    lines: std::iter::Enumerate<std::str::Lines<'a>>,
    pending: VecDeque<&'a str>,
    line: usize,
}

impl<'a> Cursor<'a> {
    fn new(content: &'a str) -> Self {
        Self {
            lines: content.lines().enumerate(),
            pending: VecDeque::new(),
            line: 0,
        }
    }

    /// Next non-blank line, dropping unread tokens of the current one.
    fn next_line(&mut self) -> Option<&'a str> {
        self.pending.clear();
        for (i, raw) in self.lines.by_ref() {
            let trimmed = raw.trim();
            if !trimmed.is_empty() {
                self.line = i + 1;
                return Some(trimmed);
            }
        }
        None
    }

    /// Peek the next non-blank line without consuming its tokens.
    fn fill(&mut self) -> bool {
        if !self.pending.is_empty() {
            return true;
        }
        match self.next_line() {
            Some(line) => {
                self.pending.extend(line.split_whitespace());
                true
            }
            None => false,
        }
    }

    fn token(&mut self, block: &str) -> Result<&'a str, ParseIncomplete> {
        if !self.fill() {
            return Err(self.incomplete(format!("unexpected end of input in {block}")));
        }
        self.pending
            .pop_front()
            .ok_or_else(|| self.incomplete(format!("unexpected end of input in {block}")))
    }

    fn number<T: FromStr>(&mut self, block: &str) -> Result<T, ParseIncomplete> {
        let token = self.token(block)?;
        token
            .parse()
            .map_err(|_| self.incomplete(format!("invalid number '{token}' in {block}")))
    }

    fn incomplete(&self, reason: String) -> ParseIncomplete {
        ParseIncomplete {
            line: self.line,
            reason,
        }
    }
}

struct Parser<'a> {
    cursor: Cursor<'a>,
    points: Vec<DVec3>,
    edges: Vec<(u32, u32)>,
    /// Per `LINES` record: whether it became an edge.
    accepted: Vec<bool>,
    radius: Option<Vec<f64>>,
    in_cell_data: bool,
}

impl<'a> Parser<'a> {
    fn new(content: &'a str) -> Self {
        Self {
            cursor: Cursor::new(content),
            points: Vec::new(),
            edges: Vec::new(),
            accepted: Vec::new(),
            radius: None,
            in_cell_data: false,
        }
    }

    fn run(&mut self) -> Result<(), ParseIncomplete> {
        while let Some(line) = self.cursor.next_line() {
            if line.starts_with('#') {
                continue;
            }
            let mut words = line.split_whitespace();
            let Some(keyword) = words.next() else {
                continue;
            };
            let args: Vec<&str> = words.collect();

            if keyword.eq_ignore_ascii_case("POINTS") {
                let n = self.header_count(&args, "POINTS")?;
                self.read_points(n)?;
            } else if keyword.eq_ignore_ascii_case("LINES") {
                let n = self.header_count(&args, "LINES")?;
                self.read_lines(n)?;
            } else if keyword.eq_ignore_ascii_case("CELL_DATA") {
                self.in_cell_data = true;
            } else if keyword.eq_ignore_ascii_case("POINT_DATA") {
                self.in_cell_data = false;
            } else if keyword.eq_ignore_ascii_case("SCALARS") {
                if self.in_cell_data && self.radius.is_none() {
                    let components = args.get(2).and_then(|c| c.parse().ok()).unwrap_or(1usize);
                    self.read_cell_scalars(components.max(1))?;
                }
                // Other arrays fall through as stray numeric lines.
            }
        }
        Ok(())
    }

    fn header_count(&self, args: &[&str], block: &str) -> Result<usize, ParseIncomplete> {
        args.first()
            .and_then(|n| n.parse().ok())
            .ok_or_else(|| self.cursor.incomplete(format!("missing count in {block} header")))
    }

    // Header counts are untrusted: vectors grow with the values actually read.
    fn read_points(&mut self, n: usize) -> Result<(), ParseIncomplete> {
        for _ in 0..n {
            let x = self.cursor.number("POINTS")?;
            let y = self.cursor.number("POINTS")?;
            let z = self.cursor.number("POINTS")?;
            self.points.push(DVec3::new(x, y, z));
        }
        Ok(())
    }

    fn read_lines(&mut self, n: usize) -> Result<(), ParseIncomplete> {
        for _ in 0..n {
            let count: usize = self.cursor.number("LINES")?;
            let mut ids = Vec::new();
            for _ in 0..count {
                ids.push(self.cursor.number::<u32>("LINES")?);
            }
            let edge = match ids.as_slice() {
                [a, b] => Some((*a, *b)),
                _ => None,
            };
            self.accepted.push(edge.is_some());
            self.edges.extend(edge);
        }
        Ok(())
    }

    fn read_cell_scalars(&mut self, components: usize) -> Result<(), ParseIncomplete> {
        if self.cursor.fill()
            && self
                .cursor
                .pending
                .front()
                .is_some_and(|t| t.eq_ignore_ascii_case("LOOKUP_TABLE"))
        {
            self.cursor.pending.clear();
        }

        let mut radius = Vec::with_capacity(self.edges.len());
        let records = self.accepted.clone();
        let outcome = records.iter().try_for_each(|&keep| {
            let value: f64 = self.cursor.number("SCALARS")?;
            for _ in 1..components {
                self.cursor.number::<f64>("SCALARS")?;
            }
            if keep {
                radius.push(value);
            }
            Ok(())
        });
        self.radius = Some(radius);
        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "# vtk DataFile Version 3.0
tree
ASCII
DATASET POLYDATA
POINTS 4 float
0 0 0  0 1 0
-1 2 0
1 2 0
LINES 3 9
2 0 1
2 1 2
2 1 3
CELL_DATA 3
scalars radius float
LOOKUP_TABLE default
0.3
0.2
0.1
";

    #[test]
    fn given_well_formed_file_when_parsing_then_reads_all_blocks() {
        let outcome = parse(SAMPLE);

        assert!(outcome.is_complete());
        let g = outcome.geometry;
        assert_eq!(g.point_count(), 4);
        assert_eq!(g.points[1], DVec3::new(0.0, 1.0, 0.0));
        assert_eq!(g.edges, vec![(0, 1), (1, 2), (1, 3)]);
        assert_eq!(g.edge_radius, vec![0.3, 0.2, 0.1]);
    }

    #[test]
    fn given_polyline_record_when_parsing_then_its_scalar_is_dropped() {
        let content = "POINTS 3 float
0 0 0 1 0 0 2 0 0
LINES 2 7
3 0 1 2
2 0 1
CELL_DATA 2
SCALARS r float
LOOKUP_TABLE default
9.0 0.5
";
        let outcome = parse(content);

        assert!(outcome.is_complete());
        assert_eq!(outcome.geometry.edges, vec![(0, 1)]);
        assert_eq!(outcome.geometry.edge_radius, vec![0.5]);
    }

    #[test]
    fn given_truncated_points_when_parsing_then_keeps_prefix_and_reports_line() {
        let content = "POINTS 3 float\n0 0 0\n1 1 1\n2 2\n";

        let outcome = parse(content);

        assert_eq!(outcome.geometry.point_count(), 2);
        let issue = outcome.issue.unwrap();
        assert_eq!(issue.line, 4);
        assert!(issue.reason.contains("POINTS"));
    }

    #[test]
    fn given_garbage_number_when_parsing_then_stops_with_diagnostic() {
        let content = "POINTS 1 float\n0 0 0\nLINES 1 3\n2 0 x\n";

        let outcome = parse(content);

        assert!(outcome.geometry.edges.is_empty());
        assert!(outcome.issue.unwrap().reason.contains("'x'"));
    }

    #[test]
    fn given_huge_point_count_when_parsing_then_stops_with_diagnostic() {
        let content = "POINTS 900000000000000000 float\n0 0 0\n";

        let outcome = parse(content);

        assert_eq!(outcome.geometry.point_count(), 1);
        assert!(outcome.issue.unwrap().reason.contains("POINTS"));
    }

    #[test]
    fn given_huge_line_record_count_when_parsing_then_stops_with_diagnostic() {
        let content = "POINTS 2 float\n0 0 0 1 0 0\nLINES 1 3\n4000000000000 0 1\n";

        let outcome = parse(content);

        assert_eq!(outcome.geometry.point_count(), 2);
        assert!(outcome.geometry.edges.is_empty());
        assert!(outcome.issue.unwrap().reason.contains("LINES"));
    }

    #[test]
    fn given_point_data_scalars_when_parsing_then_ignored() {
        let content = "POINTS 2 float
0 0 0 1 0 0
LINES 1 3
2 0 1
POINT_DATA 2
SCALARS pressure float
LOOKUP_TABLE default
5 6
CELL_DATA 1
SCALARS radius float 1
LOOKUP_TABLE default
0.25
";
        let outcome = parse(content);

        assert!(outcome.is_complete());
        assert_eq!(outcome.geometry.edge_radius, vec![0.25]);
    }

    #[test]
    fn given_empty_input_when_parsing_then_empty_geometry() {
        let outcome = parse("");

        assert!(outcome.is_complete());
        assert!(!outcome.geometry.is_plausible());
    }
}
