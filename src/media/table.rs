//! Table assets and their HTML rendering.

use crate::model::{Table, TableCell, VerticalMerge};
use serde::Serialize;

/// A data table handed to the table renderer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TableAsset {
    /// The `n` of `TABLE_<n>`
    pub id: usize,
    /// Cell text by row
    pub rows: Vec<Vec<String>>,
    /// HTML rendering
    pub html: String,
}

impl TableAsset {
    pub fn from_table(id: usize, table: &Table) -> Self {
        Self {
            id,
            rows: table.text_rows(),
            html: table_html(table),
        }
    }
}

/// Render a table as HTML with `colspan`/`rowspan` from merged cells.
pub fn table_html(table: &Table) -> String {
    let grid: Vec<Vec<(usize, &TableCell)>> = table
        .rows
        .iter()
        .map(|row| {
            let mut col = 0;
            row.cells
                .iter()
                .map(|cell| {
                    let at = col;
                    col += cell.colspan.max(1) as usize;
                    (at, cell)
                })
                .collect()
        })
        .collect();

    let mut html = String::from("<table>\n");
    for (r, row) in grid.iter().enumerate() {
        html.push_str("<tr>");
        for &(col, cell) in row {
            if cell.vertical_merge == VerticalMerge::Continue {
                continue;
            }
            html.push_str("<td");
            if cell.colspan > 1 {
                html.push_str(&format!(" colspan=\"{}\"", cell.colspan));
            }
            if cell.vertical_merge == VerticalMerge::Restart {
                let rowspan = 1 + grid[r + 1..]
                    .iter()
                    .take_while(|next| {
                        next.iter().any(|&(c, n)| c == col && n.vertical_merge == VerticalMerge::Continue)
                    })
                    .count();
                if rowspan > 1 {
                    html.push_str(&format!(" rowspan=\"{}\"", rowspan));
                }
            }
            html.push('>');
            let lines: Vec<String> = cell
                .paragraphs
                .iter()
                .map(|p| escape_html(&p.plain_text()))
                .collect();
            html.push_str(&lines.join("<br>"));
            html.push_str("</td>");
        }
        html.push_str("</tr>\n");
    }
    html.push_str("</table>");
    html
}

fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}
