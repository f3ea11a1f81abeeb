//! Document model and its OOXML (`.docx`) serialization.

use crate::dtos::ValidDocumentRequest;
use docx_rs::{Docx, Paragraph, Run, Style, StyleType};
use service_core::error::AppError;
use std::io::Cursor;

pub const TITLE_PREFIX: &str = "Document title: ";
pub const DATE_PREFIX: &str = "Creation date: ";

pub const DOCX_CONTENT_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Block {
    Heading { level: u8, text: String },
    Paragraph(String),
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Section {
    pub blocks: Vec<Block>,
}

impl Section {
    pub fn add_heading(&mut self, text: impl Into<String>, level: u8) {
        self.blocks.push(Block::Heading {
            level: level.clamp(1, 9),
            text: text.into(),
        });
    }

    pub fn add_text(&mut self, text: impl Into<String>) {
        self.blocks.push(Block::Paragraph(text.into()));
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GeneratedDocument {
    pub sections: Vec<Section>,
}

fn heading_style_id(level: u8) -> String {
    format!("Heading{}", level)
}

// Half-points, as Word uses for run sizes.
fn heading_size(level: u8) -> usize {
    match level {
        1 => 32,
        2 => 26,
        _ => 24,
    }
}

impl GeneratedDocument {
    /// One section: the title as a level-1 heading followed by the date line.
    pub fn from_request(request: &ValidDocumentRequest) -> Self {
        let mut section = Section::default();
        section.add_heading(format!("{}{}", TITLE_PREFIX, request.title), 1);
        section.add_text(format!("{}{}", DATE_PREFIX, request.date));
        Self {
            sections: vec![section],
        }
    }

    pub fn to_docx(&self) -> Docx {
        let mut levels: Vec<u8> = self
            .sections
            .iter()
            .flat_map(|s| &s.blocks)
            .filter_map(|b| match b {
                Block::Heading { level, .. } => Some(*level),
                Block::Paragraph(_) => None,
            })
            .collect();
        levels.sort_unstable();
        levels.dedup();

        let mut docx = Docx::new();
        for level in levels {
            docx = docx.add_style(
                Style::new(heading_style_id(level), StyleType::Paragraph)
                    .name(format!("Heading {}", level))
                    .size(heading_size(level))
                    .bold(),
            );
        }

        for block in self.sections.iter().flat_map(|s| &s.blocks) {
            let paragraph = match block {
                Block::Heading { level, text } => Paragraph::new()
                    .add_run(Run::new().add_text(text))
                    .style(&heading_style_id(*level)),
                Block::Paragraph(text) => Paragraph::new().add_run(Run::new().add_text(text)),
            };
            docx = docx.add_paragraph(paragraph);
        }

        docx
    }

    pub fn to_docx_bytes(&self) -> Result<Vec<u8>, AppError> {
        let mut buffer = Cursor::new(Vec::new());
        self.to_docx().build().pack(&mut buffer).map_err(|e| {
            AppError::InternalError(anyhow::anyhow!("Failed to serialize document: {}", e))
        })?;
        Ok(buffer.into_inner())
    }
}
