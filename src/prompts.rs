//! Instruction sent to the vision model with every page.
//!
//! The wording is part of the contract with existing Ollama deployments:
//! models that were tuned or evaluated against this exact sentence should
//! keep behaving the same way. Override it through
//! [`crate::config::OcrConfigBuilder::prompt`] rather than editing it here.

/// Default instruction asking the model for a plain transcription of the page.
pub const DEFAULT_OCR_PROMPT: &str = "Extract and return all text from this image. Provide only the text content without any additional commentary.";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prompt_wording_is_stable() {
        assert_eq!(
            DEFAULT_OCR_PROMPT,
            "Extract and return all text from this image. \
Provide only the text content without any additional commentary."
        );
    }
}
