//! Plain-text tables in GitHub markdown layout.

use unicode_width::UnicodeWidthStr;

/// Horizontal alignment of a column's cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Align {
    Left,
    Right,
}

/// A column heading and how its cells are aligned.
#[derive(Debug, Clone)]
pub struct Column {
    pub header: String,
    pub align: Align,
}

impl Column {
    pub fn left(header: impl Into<String>) -> Self {
        Self {
            header: header.into(),
            align: Align::Left,
        }
    }

    pub fn right(header: impl Into<String>) -> Self {
        Self {
            header: header.into(),
            align: Align::Right,
        }
    }
}

/// Render `rows` under `columns`.
///
/// Every column is as wide as its widest cell (header included), measured in
/// terminal columns.  The result has no trailing newline.
///
/// ```text
/// | User       | Usage / GPUh | Usage / % |
/// |------------|--------------|-----------|
/// | ab12-teamx |         4.00 |    100.00 |
/// ```
pub fn render_table(columns: &[Column], rows: &[Vec<String>]) -> String {
    let widths: Vec<usize> = columns
        .iter()
        .enumerate()
        .map(|(i, col)| {
            rows.iter()
                .filter_map(|row| row.get(i))
                .map(|cell| cell.width())
                .chain(std::iter::once(col.header.width()))
                .max()
                .unwrap_or(0)
        })
        .collect();

    let mut lines = Vec::with_capacity(rows.len() + 2);

    let headers: Vec<&str> = columns.iter().map(|c| c.header.as_str()).collect();
    lines.push(render_line(columns, &widths, &headers));

    let separator: Vec<String> = widths.iter().map(|w| "-".repeat(w + 2)).collect();
    lines.push(format!("|{}|", separator.join("|")));

    for row in rows {
        let cells: Vec<&str> = (0..columns.len())
            .map(|i| row.get(i).map(String::as_str).unwrap_or(""))
            .collect();
        lines.push(render_line(columns, &widths, &cells));
    }

    lines.join("\n")
}

fn render_line(columns: &[Column], widths: &[usize], cells: &[&str]) -> String {
    let padded: Vec<String> = columns
        .iter()
        .zip(widths)
        .zip(cells)
        .map(|((col, &width), cell)| {
            let fill = " ".repeat(width.saturating_sub(cell.width()));
            match col.align {
                Align::Left => format!(" {}{} ", cell, fill),
                Align::Right => format!(" {}{} ", fill, cell),
            }
        })
        .collect();
    format!("|{}|", padded.join("|"))
}

// ── Tests ──────────────────────────────────────────────────────────────────────
