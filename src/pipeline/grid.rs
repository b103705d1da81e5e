//! Ruled-table detection on page bitmaps.
//!
//! Only bordered tables are found. The lattice is recovered in five steps:
//!
//! 1. **Runs**: horizontal and vertical runs of dark pixels at least
//!    `min_line_len` long.
//! 2. **Lines**: runs on adjacent rows (or columns) that overlap are
//!    snapped into one ruled line at their centre, and collinear pieces
//!    separated by at most `join_tolerance` are joined. Connected groups
//!    thicker than `max_line_thickness` are filled areas, not rules, and
//!    are dropped.
//! 3. **Components**: lines that cross are grouped with union-find; each
//!    group is a table candidate.
//! 4. **Intersections**: crossing points, snapped onto distinct row and
//!    column boundaries.
//! 5. **Cells**: from every intersection, the nearest corner to the right
//!    and below that closes a rectangle. Merged cells therefore span
//!    several lattice slots.
//!
//! A candidate becomes a table when it has at least two horizontal and two
//! vertical lines and at least two cells.

use image::{DynamicImage, GrayImage};
use std::collections::{BTreeMap, HashSet};
use tracing::debug;

/// Detection thresholds, in pixels.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GridSettings {
    /// Luma below this is ink.
    pub dark_threshold: u8,
    pub min_line_len: u32,
    pub max_line_thickness: u32,
    pub join_tolerance: u32,
    pub intersection_tolerance: u32,
}

impl GridSettings {
    /// Thresholds scaled to an image: the minimum line length grows with
    /// the shorter side so glyph strokes of large renders are not rules.
    pub fn for_size(width: u32, height: u32) -> Self {
        Self {
            dark_threshold: 128,
            min_line_len: (width.min(height) / 40).max(30),
            max_line_thickness: 12,
            join_tolerance: 3,
            intersection_tolerance: 3,
        }
    }
}

/// An axis-aligned pixel rectangle, `x1`/`y1` exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rect {
    pub x0: u32,
    pub y0: u32,
    pub x1: u32,
    pub y1: u32,
}

impl Rect {
    pub fn contains(&self, x: u32, y: u32) -> bool {
        x >= self.x0 && x < self.x1 && y >= self.y0 && y < self.y1
    }

    fn union(&self, other: &Rect) -> Rect {
        Rect {
            x0: self.x0.min(other.x0),
            y0: self.y0.min(other.y0),
            x1: self.x1.max(other.x1),
            y1: self.y1.max(other.y1),
        }
    }
}

/// A ruled line: `pos` across the line, `start..end` along it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RuledLine {
    pub pos: u32,
    pub start: u32,
    pub end: u32,
}

/// One cell of a detected table, in lattice coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GridCell {
    pub row: usize,
    pub col: usize,
    pub row_span: usize,
    pub col_span: usize,
    pub rect: Rect,
}

/// A bordered table found on a page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DetectedTable {
    pub bbox: Rect,
    pub rows: usize,
    pub cols: usize,
    pub cells: Vec<GridCell>,
}

/// Find ruled tables in `image`, ordered top-to-bottom then left-to-right.
pub fn detect_tables(image: &DynamicImage) -> Vec<DetectedTable> {
    let gray = image.to_luma8();
    let settings = GridSettings::for_size(gray.width(), gray.height());
    detect_tables_with(&gray, &settings)
}

pub fn detect_tables_with(gray: &GrayImage, settings: &GridSettings) -> Vec<DetectedTable> {
    let (horizontal, vertical) = detect_lines(gray, settings);
    debug!(
        "Ruled lines: {} horizontal, {} vertical",
        horizontal.len(),
        vertical.len()
    );

    let tol = settings.intersection_tolerance;
    let mut tables: Vec<DetectedTable> = components(&horizontal, &vertical, tol)
        .into_iter()
        .filter(|(hs, vs)| hs.len() >= 2 && vs.len() >= 2)
        .filter_map(|(hs, vs)| build_table(&hs, &vs, tol))
        .filter(|t| t.cells.len() >= 2)
        .collect();

    tables.sort_by_key(|t| (t.bbox.y0, t.bbox.x0));
    debug!("Detected {} ruled table(s)", tables.len());
    tables
}

/// Horizontal and vertical ruled lines.
pub fn detect_lines(
    gray: &GrayImage,
    settings: &GridSettings,
) -> (Vec<RuledLine>, Vec<RuledLine>) {
    let (w, h) = gray.dimensions();
    let dark = |x: u32, y: u32| gray.get_pixel(x, y).0[0] < settings.dark_threshold;

    let h_runs = runs(h, w, settings.min_line_len, |y, x| dark(x, y));
    let v_runs = runs(w, h, settings.min_line_len, |x, y| dark(x, y));

    (merge_runs(h_runs, settings), merge_runs(v_runs, settings))
}

/// Dark runs along every line `pos in 0..outer`, scanning `0..inner`.
fn runs(outer: u32, inner: u32, min_len: u32, is_dark: impl Fn(u32, u32) -> bool) -> Vec<RuledLine> {
    let mut out = Vec::new();
    for pos in 0..outer {
        let mut start = None;
        for i in 0..=inner {
            let ink = i < inner && is_dark(pos, i);
            match (ink, start) {
                (true, None) => start = Some(i),
                (false, Some(s)) => {
                    if i - s >= min_len {
                        out.push(RuledLine { pos, start: s, end: i });
                    }
                    start = None;
                }
                _ => {}
            }
        }
    }
    out
}

/// Snap connected runs into one line at their centre, then join collinear
/// pieces. Runs are connected when they sit on adjacent positions and
/// overlap along the line, so a filled block elsewhere in a rule's band
/// forms its own group.
fn merge_runs(mut runs: Vec<RuledLine>, settings: &GridSettings) -> Vec<RuledLine> {
    runs.sort_by_key(|r| (r.pos, r.start));

    let mut parent: Vec<usize> = (0..runs.len()).collect();
    let mut prev = 0..0;
    let mut i = 0;
    while i < runs.len() {
        let pos = runs[i].pos;
        let mut j = i;
        while j < runs.len() && runs[j].pos == pos {
            j += 1;
        }
        if !prev.is_empty() && runs[prev.start].pos + 1 == pos {
            for a in i..j {
                for b in prev.clone() {
                    if overlaps(&runs[a], &runs[b]) {
                        let (ra, rb) = (find(&mut parent, a), find(&mut parent, b));
                        if ra != rb {
                            parent[ra] = rb;
                        }
                    }
                }
            }
        }
        prev = i..j;
        i = j;
    }

    let mut groups: BTreeMap<usize, Vec<RuledLine>> = BTreeMap::new();
    for (k, run) in runs.iter().enumerate() {
        let root = find(&mut parent, k);
        groups.entry(root).or_default().push(*run);
    }

    let mut pieces = Vec::new();
    for group in groups.into_values() {
        let first = group.iter().map(|r| r.pos).min().unwrap_or(0);
        let last = group.iter().map(|r| r.pos).max().unwrap_or(0);
        if last - first < settings.max_line_thickness {
            let pos = first + (last - first) / 2;
            pieces.extend(group.iter().map(|r| RuledLine { pos, ..*r }));
        } else {
            debug!("Dropping filled area {}..={} ({} runs)", first, last, group.len());
        }
    }
    join_collinear(pieces, settings.join_tolerance)
}

fn overlaps(a: &RuledLine, b: &RuledLine) -> bool {
    a.start < b.end && b.start < a.end
}

/// Join pieces on the same position separated by at most `tolerance`.
fn join_collinear(mut pieces: Vec<RuledLine>, tolerance: u32) -> Vec<RuledLine> {
    pieces.sort_by_key(|r| (r.pos, r.start));

    let mut out: Vec<RuledLine> = Vec::new();
    for piece in pieces {
        match out.last_mut() {
            Some(cur) if cur.pos == piece.pos && piece.start <= cur.end + tolerance => {
                cur.end = cur.end.max(piece.end);
            }
            _ => out.push(piece),
        }
    }
    out
}

fn find(parent: &mut [usize], mut i: usize) -> usize {
    while parent[i] != i {
        parent[i] = parent[parent[i]];
        i = parent[i];
    }
    i
}

fn crosses(h: &RuledLine, v: &RuledLine, tol: u32) -> bool {
    v.pos + tol >= h.start && v.pos <= h.end + tol && h.pos + tol >= v.start && h.pos <= v.end + tol
}

/// Groups of mutually connected (horizontal, vertical) lines.
fn components(
    horizontal: &[RuledLine],
    vertical: &[RuledLine],
    tol: u32,
) -> Vec<(Vec<RuledLine>, Vec<RuledLine>)> {
    let nh = horizontal.len();
    let mut parent: Vec<usize> = (0..nh + vertical.len()).collect();

    for (hi, h) in horizontal.iter().enumerate() {
        for (vi, v) in vertical.iter().enumerate() {
            if crosses(h, v, tol) {
                let (a, b) = (find(&mut parent, hi), find(&mut parent, nh + vi));
                if a != b {
                    parent[b] = a;
                }
            }
        }
    }

    let mut groups: BTreeMap<usize, (Vec<RuledLine>, Vec<RuledLine>)> = BTreeMap::new();
    for (i, h) in horizontal.iter().enumerate() {
        let root = find(&mut parent, i);
        groups.entry(root).or_default().0.push(*h);
    }
    for (i, v) in vertical.iter().enumerate() {
        let root = find(&mut parent, nh + i);
        groups.entry(root).or_default().1.push(*v);
    }
    groups.into_values().collect()
}

/// Sorted boundary positions, merging values within `tol` of the previous one.
fn snap_positions(mut values: Vec<u32>, tol: u32) -> Vec<u32> {
    values.sort_unstable();
    let mut out: Vec<u32> = Vec::new();
    for v in values {
        match out.last() {
            Some(&last) if v <= last + tol => {}
            _ => out.push(v),
        }
    }
    out
}

fn slot(bounds: &[u32], value: u32, tol: u32) -> usize {
    bounds
        .iter()
        .rposition(|&b| b <= value + tol)
        .unwrap_or(0)
}

fn build_table(hs: &[RuledLine], vs: &[RuledLine], tol: u32) -> Option<DetectedTable> {
    let points: Vec<(u32, u32)> = hs
        .iter()
        .flat_map(|h| {
            vs.iter()
                .filter(move |v| crosses(h, v, tol))
                .map(move |v| (v.pos, h.pos))
        })
        .collect();

    let xs = snap_positions(points.iter().map(|p| p.0).collect(), tol);
    let ys = snap_positions(points.iter().map(|p| p.1).collect(), tol);
    if xs.len() < 2 || ys.len() < 2 {
        return None;
    }

    let corners: HashSet<(usize, usize)> = points
        .iter()
        .map(|&(x, y)| (slot(&ys, y, tol), slot(&xs, x, tol)))
        .collect();

    let mut cells = Vec::new();
    for row in 0..ys.len() - 1 {
        for col in 0..xs.len() - 1 {
            if !corners.contains(&(row, col)) {
                continue;
            }
            if let Some(cell) = close_cell(&corners, &xs, &ys, row, col) {
                cells.push(cell);
            }
        }
    }

    let bbox = cells
        .iter()
        .map(|c| c.rect)
        .reduce(|a, b| a.union(&b))?;

    Some(DetectedTable {
        bbox,
        rows: ys.len() - 1,
        cols: xs.len() - 1,
        cells,
    })
}

/// The smallest rectangle with its top-left corner at `(row, col)`.
fn close_cell(
    corners: &HashSet<(usize, usize)>,
    xs: &[u32],
    ys: &[u32],
    row: usize,
    col: usize,
) -> Option<GridCell> {
    let rights = (col + 1..xs.len()).filter(|&c| corners.contains(&(row, c)));
    for right in rights {
        let belows = (row + 1..ys.len()).filter(|&r| corners.contains(&(r, col)));
        for below in belows {
            if corners.contains(&(below, right)) {
                return Some(GridCell {
                    row,
                    col,
                    row_span: below - row,
                    col_span: right - col,
                    rect: Rect {
                        x0: xs[col],
                        y0: ys[row],
                        x1: xs[right],
                        y1: ys[below],
                    },
                });
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Luma;

    /// White canvas with black rules; `cols`/`rows` are boundary positions.
    fn ruled(
        canvas: &mut GrayImage,
        x0: u32,
        y0: u32,
        cols: &[u32],
        rows: &[u32],
        thickness: u32,
    ) {
        let (left, right) = (x0 + cols[0], x0 + cols[cols.len() - 1]);
        let (top, bottom) = (y0 + rows[0], y0 + rows[rows.len() - 1]);
        for &r in rows {
            for t in 0..thickness {
                for x in left..right + thickness {
                    canvas.put_pixel(x, y0 + r + t, Luma([0]));
                }
            }
        }
        for &c in cols {
            for t in 0..thickness {
                for y in top..bottom + thickness {
                    canvas.put_pixel(x0 + c + t, y, Luma([0]));
                }
            }
        }
    }

    fn blank(w: u32, h: u32) -> GrayImage {
        GrayImage::from_pixel(w, h, Luma([255]))
    }

    #[test]
    fn single_table_lattice() {
        let mut img = blank(400, 300);
        ruled(&mut img, 20, 20, &[0, 120, 240, 340], &[0, 50, 100, 150], 2);

        let tables = detect_tables(&DynamicImage::ImageLuma8(img));
        assert_eq!(tables.len(), 1);
        let t = &tables[0];
        assert_eq!((t.rows, t.cols), (3, 3));
        assert_eq!(t.cells.len(), 9);
        assert!(t.cells.iter().all(|c| c.row_span == 1 && c.col_span == 1));

        let first = t.cells[0];
        assert_eq!((first.row, first.col), (0, 0));
        assert!(first.rect.contains(80, 45));
    }

    #[test]
    fn two_tables_ordered_top_to_bottom() {
        let mut img = blank(400, 500);
        ruled(&mut img, 30, 300, &[0, 100, 200], &[0, 40, 80], 1);
        ruled(&mut img, 30, 20, &[0, 150, 300], &[0, 60, 120, 180], 1);

        let tables = detect_tables(&DynamicImage::ImageLuma8(img));
        assert_eq!(tables.len(), 2);
        assert!(tables[0].bbox.y0 < tables[1].bbox.y0);
        assert_eq!((tables[0].rows, tables[0].cols), (3, 2));
        assert_eq!((tables[1].rows, tables[1].cols), (2, 2));
    }

    #[test]
    fn unruled_image_has_no_tables() {
        let mut img = blank(300, 200);
        // Short strokes, like glyphs.
        for x in (10..290).step_by(15) {
            for y in 50..60 {
                img.put_pixel(x, y, Luma([0]));
            }
        }
        assert!(detect_tables(&DynamicImage::ImageLuma8(img)).is_empty());
    }

    #[test]
    fn single_box_is_not_a_table() {
        let mut img = blank(300, 200);
        ruled(&mut img, 10, 10, &[0, 200], &[0, 100], 1);
        assert!(detect_tables(&DynamicImage::ImageLuma8(img)).is_empty());
    }

    #[test]
    fn merged_header_spans_columns() {
        let mut img = blank(400, 300);
        ruled(&mut img, 10, 10, &[0, 300], &[0, 50, 100, 150], 1);
        // Inner column divider only below the header row.
        for y in 60..=160 {
            img.put_pixel(160, y, Luma([0]));
        }

        let tables = detect_tables(&DynamicImage::ImageLuma8(img));
        assert_eq!(tables.len(), 1);
        let t = &tables[0];
        assert_eq!(t.cols, 2);
        let header = t.cells.iter().find(|c| c.row == 0).unwrap();
        assert_eq!(header.col_span, 2);
        assert_eq!(t.cells.len(), 5);
    }

    #[test]
    fn filled_band_is_not_a_rule() {
        let mut img = blank(300, 200);
        for y in 40..80 {
            for x in 20..280 {
                img.put_pixel(x, y, Luma([0]));
            }
        }
        let settings = GridSettings::for_size(300, 200);
        let (h, _) = detect_lines(&img, &settings);
        assert!(h.is_empty());
    }

    #[test]
    fn filled_block_in_a_rule_band_keeps_the_rule() {
        let mut img = blank(400, 800);
        ruled(&mut img, 80, 50, &[0, 140, 280], &[0, 70, 140], 2);
        // Unrelated block far below, covering the left rule's x band.
        for y in 500..700 {
            for x in 80..130 {
                img.put_pixel(x, y, Luma([0]));
            }
        }

        let tables = detect_tables(&DynamicImage::ImageLuma8(img));
        assert_eq!(tables.len(), 1);
        let t = &tables[0];
        assert_eq!((t.rows, t.cols), (2, 2));
        assert_eq!(t.bbox.x0, 80);
        assert_eq!(t.cells.len(), 4);
    }

    #[test]
    fn thick_rule_becomes_one_line() {
        let mut img = blank(200, 100);
        for y in 30..35 {
            for x in 10..190 {
                img.put_pixel(x, y, Luma([0]));
            }
        }
        let settings = GridSettings::for_size(200, 100);
        let (h, v) = detect_lines(&img, &settings);
        assert_eq!(h, vec![RuledLine { pos: 32, start: 10, end: 190 }]);
        assert!(v.is_empty());
    }

    #[test]
    fn broken_rule_is_joined() {
        let mut img = blank(200, 100);
        for x in (10..100).chain(102..190) {
            img.put_pixel(x, 50, Luma([0]));
        }
        let settings = GridSettings::for_size(200, 100);
        let (h, _) = detect_lines(&img, &settings);
        assert_eq!(h, vec![RuledLine { pos: 50, start: 10, end: 190 }]);
    }
}
