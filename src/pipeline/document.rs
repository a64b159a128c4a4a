//! Word document to PDF.
//!
//! Body paragraphs are read in order and redrawn as plain Helvetica lines
//! on one US-Letter page: a fixed header at (100, 750), then one line per
//! paragraph starting at y = 730 and stepping down 20 points. Each line is
//! cut to its first 90 characters. Formatting, tables and images are not
//! carried over.

use crate::error::FileError;
use crate::output::ConversionResult;
use crate::pipeline::intake::pdf_name;
use docx_rs::{DocumentChild, ParagraphChild, RunChild};
use printpdf::{BuiltinFont, Mm, PdfDocument, Pt};
use std::io::BufWriter;
use tracing::debug;

pub const HEADER: &str = "Converted from Word Document";
pub const PAGE_SIZE_PT: (f32, f32) = (612.0, 792.0);
pub const LEFT_PT: f32 = 100.0;
pub const HEADER_Y_PT: f32 = 750.0;
pub const FIRST_LINE_Y_PT: f32 = 730.0;
pub const LINE_STEP_PT: f32 = 20.0;
pub const MAX_LINE_CHARS: usize = 90;
const FONT_SIZE: f32 = 12.0;

/// A line of text at a page position, in points from the bottom-left.
#[derive(Debug, Clone, PartialEq)]
pub struct PlacedLine {
    pub x: f32,
    pub y: f32,
    pub text: String,
}

/// Plain text of every body paragraph, in document order.
///
/// Runs are concatenated; tabs become `\t` and breaks `\n`. Empty
/// paragraphs are kept so they still take up a line.
pub fn read_paragraphs(file: &str, bytes: &[u8]) -> Result<Vec<String>, FileError> {
    let docx = docx_rs::read_docx(bytes).map_err(|e| FileError::Parse {
        file: file.to_string(),
        detail: format!("Could not read Word document: {e}"),
    })?;

    let paragraphs: Vec<String> = docx
        .document
        .children
        .iter()
        .filter_map(|child| match child {
            DocumentChild::Paragraph(p) => {
                let mut text = String::new();
                push_children(&mut text, &p.children);
                Some(text)
            }
            _ => None,
        })
        .collect();

    debug!("{}: {} paragraphs", file, paragraphs.len());
    Ok(paragraphs)
}

fn push_children(out: &mut String, children: &[ParagraphChild]) {
    for child in children {
        match child {
            ParagraphChild::Run(run) => {
                for rc in &run.children {
                    match rc {
                        RunChild::Text(t) => out.push_str(&t.text),
                        RunChild::Tab(_) => out.push('\t'),
                        RunChild::Break(_) => out.push('\n'),
                        _ => {}
                    }
                }
            }
            ParagraphChild::Hyperlink(link) => push_children(out, &link.children),
            _ => {}
        }
    }
}

/// Header plus one line per paragraph, positioned on the page.
///
/// Lines past the bottom edge get negative y and fall off the page.
pub fn layout_lines(paragraphs: &[String]) -> Vec<PlacedLine> {
    let mut lines = Vec::with_capacity(paragraphs.len() + 1);
    lines.push(PlacedLine {
        x: LEFT_PT,
        y: HEADER_Y_PT,
        text: HEADER.to_string(),
    });
    for (i, p) in paragraphs.iter().enumerate() {
        lines.push(PlacedLine {
            x: LEFT_PT,
            y: FIRST_LINE_Y_PT - LINE_STEP_PT * i as f32,
            text: p.chars().take(MAX_LINE_CHARS).collect(),
        });
    }
    lines
}

/// Render placed lines onto a single Letter page and return the PDF bytes.
pub fn render_pdf(file: &str, lines: &[PlacedLine]) -> Result<Vec<u8>, FileError> {
    let ser_err = |detail: String| FileError::Serialize {
        file: file.to_string(),
        detail,
    };

    let (w, h) = PAGE_SIZE_PT;
    let (doc, page1, layer1) =
        PdfDocument::new(file, Mm::from(Pt(w)), Mm::from(Pt(h)), "Layer 1");
    let layer = doc.get_page(page1).get_layer(layer1);
    let font = doc
        .add_builtin_font(BuiltinFont::Helvetica)
        .map_err(|e| ser_err(format!("PDF font error: {e}")))?;

    for line in lines {
        layer.use_text(
            &line.text,
            FONT_SIZE,
            Mm::from(Pt(line.x)),
            Mm::from(Pt(line.y)),
            &font,
        );
    }

    let mut buf = BufWriter::new(Vec::new());
    doc.save(&mut buf)
        .map_err(|e| ser_err(format!("PDF save error: {e}")))?;
    buf.into_inner()
        .map_err(|e| ser_err(format!("PDF buffer error: {e}")))
}

/// Convert a `.docx` upload to a PDF download named `<stem>.pdf`.
pub fn convert(file: &str, bytes: &[u8]) -> Result<ConversionResult, FileError> {
    let paragraphs = read_paragraphs(file, bytes)?;
    let pdf = render_pdf(file, &layout_lines(&paragraphs))?;
    Ok(ConversionResult {
        file_name: pdf_name(file),
        mime_type: "application/pdf".to_string(),
        bytes: pdf,
    })
}
