use std::path::Path;
use std::sync::Arc;

use chrono::Utc;
use tracing::{info, instrument};

use crate::config::Analysis;
use crate::error::{AnalysisError, ValidationError};
use crate::extract::{ExtractMode, PdfTextExtractor};
use crate::keywords::KeywordPipeline;
use crate::model::{AnalysisResult, ExtractionResult, UploadedDocument};
use crate::normalize::preview;
use crate::standards::ReferenceTable;
use crate::upload::has_allowed_extension;

/// Runs the extraction and keyword pipeline for one document and joins the
/// result with the selected standard's reference row.
pub struct Analyzer {
    table: Arc<ReferenceTable>,
    extractor: PdfTextExtractor,
    pipeline: KeywordPipeline,
    preview_chars: usize,
}

impl Analyzer {
    pub fn new(table: Arc<ReferenceTable>, cfg: &Analysis) -> Self {
        Self::with_extractor(table, cfg, PdfTextExtractor::new(cfg.max_pages))
    }

    pub fn with_extractor(table: Arc<ReferenceTable>, cfg: &Analysis, extractor: PdfTextExtractor) -> Self {
        Analyzer {
            table,
            extractor,
            pipeline: KeywordPipeline::new(cfg.tfidf_top_n, cfg.contextual_top_n),
            preview_chars: cfg.preview_chars,
        }
    }

    pub fn list_selectable_standards(&self) -> &[String] {
        self.table.names()
    }

    /// Reads only as many pages as the preview needs.
    pub fn preview(&self, path: &Path) -> Result<String, AnalysisError> {
        let extracted = self.extractor.extract(
            path,
            ExtractMode::Preview {
                max_chars: self.preview_chars,
            },
        )?;
        Ok(preview(&extracted.text, self.preview_chars))
    }

    /// `display_name` is what the user sees as the file name; `path` is where
    /// the upload actually lives.
    #[instrument(skip(self, path), fields(path = %path.display()))]
    pub fn analyze(
        &self,
        standard: &str,
        display_name: &str,
        path: &Path,
    ) -> Result<AnalysisResult, AnalysisError> {
        let standard = standard.trim();
        if standard.is_empty() {
            return Err(ValidationError::MissingStandard.into());
        }
        if display_name.is_empty() {
            return Err(ValidationError::MissingFile.into());
        }
        if !has_allowed_extension(display_name) {
            return Err(ValidationError::InvalidFileType.into());
        }

        let extracted = self.extractor.extract(path, ExtractMode::Full)?;
        let keywords = self.pipeline.run(&extracted.text);

        let document = UploadedDocument {
            filename: display_name.to_string(),
            stored_path: path.to_path_buf(),
            raw_text: extracted.text,
            normalized_text: keywords.normalized_text,
        };

        let matched_standard = self.table.lookup(standard).cloned();
        info!(
            strategy = extracted.strategy,
            matched = matched_standard.is_some(),
            year = %keywords.detected_year,
            "document analyzed"
        );

        Ok(AnalysisResult {
            filename: document.filename,
            standard: standard.to_string(),
            extraction: ExtractionResult {
                preview: preview(&document.raw_text, self.preview_chars),
                detected_year: keywords.detected_year,
                tfidf_keywords: keywords.tfidf,
                contextual_keywords: keywords.contextual,
            },
            matched_standard,
            analyzed_at: Utc::now(),
        })
    }
}
