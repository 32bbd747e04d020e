//! PDF to plain text.
//!
//! Extraction runs an ordered list of strategies. The first one that returns
//! readable text wins; a strategy that errors or returns only whitespace hands
//! over to the next one. `lopdf` goes first because it reads page by page and
//! can stop early for previews, `pdf-extract` is the fallback.

use std::panic::{AssertUnwindSafe, catch_unwind};
use std::path::Path;

use tracing::{debug, instrument, warn};

use crate::error::ExtractionError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtractMode {
    Full,
    /// Stop reading pages once this many characters have been collected.
    Preview { max_chars: usize },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedText {
    pub text: String,
    pub strategy: &'static str,
}

impl ExtractedText {
    pub fn is_blank(&self) -> bool {
        self.text.trim().is_empty()
    }
}

pub trait TextStrategy: Send + Sync {
    fn name(&self) -> &'static str;

    fn extract(
        &self,
        path: &Path,
        mode: ExtractMode,
        max_pages: Option<usize>,
    ) -> Result<String, ExtractionError>;
}

/// Both PDF libraries can panic on hostile input.
fn guarded<T>(
    strategy: &'static str,
    f: impl FnOnce() -> Result<T, ExtractionError>,
) -> Result<T, ExtractionError> {
    catch_unwind(AssertUnwindSafe(f)).unwrap_or(Err(ExtractionError::Panicked { strategy }))
}

pub struct LopdfStrategy;

impl TextStrategy for LopdfStrategy {
    fn name(&self) -> &'static str {
        "lopdf"
    }

    fn extract(
        &self,
        path: &Path,
        mode: ExtractMode,
        max_pages: Option<usize>,
    ) -> Result<String, ExtractionError> {
        guarded(self.name(), || {
            let doc = lopdf::Document::load(path).map_err(|e| ExtractionError::Parse {
                strategy: self.name(),
                message: e.to_string(),
            })?;

            let mut parts = Vec::new();
            let mut collected = 0;
            for (idx, page_number) in doc.get_pages().into_keys().enumerate() {
                if max_pages.is_some_and(|max| idx >= max) {
                    debug!(max_pages = ?max_pages, "page limit reached");
                    break;
                }

                let text = doc.extract_text(&[page_number]).unwrap_or_else(|e| {
                    debug!(page = page_number, error = %e, "page yielded no text");
                    String::new()
                });
                collected += text.chars().count();
                parts.push(text);

                if let ExtractMode::Preview { max_chars } = mode {
                    if collected >= max_chars {
                        break;
                    }
                }
            }

            Ok(parts.join("\n"))
        })
    }
}

/// Whole-document fallback. Ignores page limits since `pdf-extract` does not
/// expose pages.
pub struct PdfExtractStrategy;

impl TextStrategy for PdfExtractStrategy {
    fn name(&self) -> &'static str {
        "pdf-extract"
    }

    fn extract(
        &self,
        path: &Path,
        _mode: ExtractMode,
        _max_pages: Option<usize>,
    ) -> Result<String, ExtractionError> {
        let bytes = std::fs::read(path).map_err(|source| ExtractionError::Io {
            path: path.display().to_string(),
            source,
        })?;

        guarded(self.name(), || {
            pdf_extract::extract_text_from_mem(&bytes).map_err(|e| ExtractionError::Parse {
                strategy: self.name(),
                message: e.to_string(),
            })
        })
    }
}

pub struct PdfTextExtractor {
    strategies: Vec<Box<dyn TextStrategy>>,
    max_pages: Option<usize>,
}

impl PdfTextExtractor {
    pub fn new(max_pages: Option<usize>) -> Self {
        Self::with_strategies(
            vec![Box::new(LopdfStrategy), Box::new(PdfExtractStrategy)],
            max_pages,
        )
    }

    pub fn with_strategies(strategies: Vec<Box<dyn TextStrategy>>, max_pages: Option<usize>) -> Self {
        PdfTextExtractor {
            strategies,
            max_pages,
        }
    }

    /// Blank text from a strategy that did not fail is returned as is; only
    /// when every strategy errors does extraction fail.
    #[instrument(skip(self), fields(path = %path.display()))]
    pub fn extract(&self, path: &Path, mode: ExtractMode) -> Result<ExtractedText, ExtractionError> {
        let mut blank: Option<ExtractedText> = None;
        let mut last_error: Option<ExtractionError> = None;

        for strategy in &self.strategies {
            match strategy.extract(path, mode, self.max_pages) {
                Ok(text) => {
                    let extracted = ExtractedText {
                        text,
                        strategy: strategy.name(),
                    };
                    if !extracted.is_blank() {
                        debug!(
                            strategy = strategy.name(),
                            chars = extracted.text.len(),
                            "extracted text"
                        );
                        return Ok(extracted);
                    }
                    debug!(strategy = strategy.name(), "no text extracted, trying next strategy");
                    blank.get_or_insert(extracted);
                }
                Err(e) => {
                    warn!(strategy = strategy.name(), error = %e, "extraction strategy failed");
                    last_error = Some(e);
                }
            }
        }

        if let Some(extracted) = blank {
            return Ok(extracted);
        }

        let cause = last_error.unwrap_or(ExtractionError::Parse {
            strategy: "none",
            message: "no extraction strategies configured".to_string(),
        });
        Err(ExtractionError::AllStrategiesFailed(Box::new(cause)))
    }
}
