//! Pipeline stages for uploaded files.
//!
//! Each submodule implements one handler or one step of a handler, so each
//! can be tested on its own with in-memory bytes.
//!
//! ## Data Flow
//!
//! ```text
//!            ┌─▶ table/tabular ──▶ chart ──▶ tabular::serialize   (.csv .xlsx)
//! intake ────┼─▶ pdf_text                                         (.pdf)
//!            ├─▶ document                                         (.docx)
//!            └─▶ image_pdf                                        (.jpg .png)
//! ```
//!
//! 1. [`intake`]    — classify uploads by extension, load local paths
//! 2. [`table`]     — the in-memory table model and its two cleaning transforms
//! 3. [`tabular`]   — CSV/Excel parse and serialise
//! 4. [`chart`]     — validate a chart request and draw it to PNG
//! 5. [`pdf_text`]  — page-by-page text extraction
//! 6. [`document`]  — Word paragraphs redrawn onto a PDF page
//! 7. [`image_pdf`] — image re-encoded as a single-page PDF

pub mod chart;
pub mod document;
pub mod image_pdf;
pub mod intake;
pub mod pdf_text;
pub mod table;
pub mod tabular;
