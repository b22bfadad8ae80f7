//! Positional text extraction and table-grid reconstruction for PDF pages.
//!
//! Text spans come from `pdf_oxide`, which decodes strings through the
//! font's encoding and ToUnicode CMap and measures them with the font's
//! widths. Spans sharing a baseline form a row. Column bands are the
//! horizontal stretches covered by at least [`MIN_COLUMN_SUPPORT`] spans
//! of multi-span rows, so a single long label cannot fuse two columns.

use std::path::Path;

use pdf_oxide::PdfDocument;
use pdf_oxide::layout::TextSpan;

/// Baselines closer than this (in points) belong to the same row.
const ROW_TOLERANCE: f32 = 2.0;

/// Spans that must overlap a stretch of the page for it to count as a column.
const MIN_COLUMN_SUPPORT: usize = 2;

#[derive(Debug, thiserror::Error)]
pub enum PdfError {
    #[error("Failed to read PDF: {0}")]
    Load(#[from] pdf_oxide::Error),
    #[error("Page index {index} is out of range (document has {pages} pages)")]
    PageOutOfRange { index: usize, pages: usize },
}

/// A string shown at a single position on the page.
#[derive(Debug, Clone, PartialEq)]
pub struct TextRun {
    pub x: f32,
    pub y: f32,
    /// Horizontal extent in user space, from the font metrics.
    pub width: f32,
    pub text: String,
}

impl TextRun {
    fn end(&self) -> f32 {
        self.x + self.width
    }
}

impl From<TextSpan> for TextRun {
    fn from(span: TextSpan) -> Self {
        Self {
            x: span.bbox.x,
            y: span.bbox.y,
            width: span.bbox.width.max(0.0),
            text: span.text,
        }
    }
}

/// Rebuilds a cell grid from text runs, or `None` when the runs do not look tabular.
pub fn build_grid(runs: Vec<TextRun>) -> Option<Vec<Vec<String>>> {
    let mut runs: Vec<TextRun> = runs
        .into_iter()
        .filter(|r| !r.text.trim().is_empty())
        .collect();
    runs.sort_by(|a, b| b.y.total_cmp(&a.y).then(a.x.total_cmp(&b.x)));

    let mut rows: Vec<(f32, Vec<TextRun>)> = Vec::new();
    for run in runs {
        match rows.last_mut() {
            Some((y, row)) if (*y - run.y).abs() <= ROW_TOLERANCE => row.push(run),
            _ => rows.push((run.y, vec![run])),
        }
    }
    for (_, row) in rows.iter_mut() {
        row.sort_by(|a, b| a.x.total_cmp(&b.x));
    }

    let bands = column_bands(rows.iter().map(|(_, row)| row.as_slice()));
    if bands.len() < 2 {
        return None;
    }

    let grid: Vec<Vec<String>> = rows
        .into_iter()
        .map(|(_, row)| {
            let mut cells = vec![String::new(); bands.len()];
            for run in row {
                let cell = &mut cells[column_of(&run, &bands)];
                if !cell.is_empty() {
                    cell.push(' ');
                }
                cell.push_str(run.text.trim());
            }
            cells
        })
        .collect();

    let tabular_rows = grid
        .iter()
        .filter(|row| row.iter().filter(|c| !c.is_empty()).count() >= 2)
        .count();
    if tabular_rows < 2 {
        return None;
    }

    Some(grid)
}

/// `(start, end)` stretches covered by at least [`MIN_COLUMN_SUPPORT`] runs of
/// multi-run rows, left to right.
fn column_bands<'a>(rows: impl Iterator<Item = &'a [TextRun]>) -> Vec<(f32, f32)> {
    let mut edges: Vec<(f32, i32)> = rows
        .filter(|row| row.len() >= 2)
        .flat_map(|row| row.iter().flat_map(|r| [(r.x, 1), (r.end(), -1)]))
        .collect();
    // Openings sort before closings at the same x so touching runs stay joined.
    edges.sort_by(|a, b| a.0.total_cmp(&b.0).then(b.1.cmp(&a.1)));

    let mut bands = Vec::new();
    let mut depth = 0;
    let mut open: Option<f32> = None;
    for (x, delta) in edges {
        depth += delta;
        let supported = depth >= MIN_COLUMN_SUPPORT as i32;
        match open {
            None if supported => open = Some(x),
            Some(start) if !supported => {
                bands.push((start, x));
                open = None;
            }
            _ => {}
        }
    }
    bands
}

/// The band holding the run's start, else the band it overlaps most (or lies nearest).
fn column_of(run: &TextRun, bands: &[(f32, f32)]) -> usize {
    if let Some(col) = bands
        .iter()
        .position(|&(start, end)| start - ROW_TOLERANCE <= run.x && run.x <= end)
    {
        return col;
    }

    let mut best = 0;
    let mut best_overlap = f32::NEG_INFINITY;
    for (col, &(start, end)) in bands.iter().enumerate() {
        let overlap = run.end().min(end) - run.x.max(start);
        if overlap > best_overlap {
            best = col;
            best_overlap = overlap;
        }
    }
    best
}

/// A loaded PDF report.
pub struct PdfReport {
    document: PdfDocument,
    pages: usize,
}

impl PdfReport {
    pub fn open(path: &Path) -> Result<Self, PdfError> {
        let mut document = PdfDocument::open(path)?;
        let pages = document.page_count()?;
        log::debug!("Opened {} ({} pages)", path.display(), pages);
        Ok(Self { document, pages })
    }

    pub fn page_count(&self) -> usize {
        self.pages
    }

    pub fn page_text_runs(&mut self, index: usize) -> Result<Vec<TextRun>, PdfError> {
        if index >= self.pages {
            return Err(PdfError::PageOutOfRange {
                index,
                pages: self.pages,
            });
        }
        let runs: Vec<TextRun> = self
            .document
            .extract_spans(index)?
            .into_iter()
            .map(TextRun::from)
            .collect();
        log::trace!("Page {}: {} text runs", index + 1, runs.len());
        Ok(runs)
    }

    /// The single table on the zero-indexed page, if one can be reconstructed.
    pub fn extract_table(&mut self, index: usize) -> Result<Option<Vec<Vec<String>>>, PdfError> {
        Ok(build_grid(self.page_text_runs(index)?))
    }
}
