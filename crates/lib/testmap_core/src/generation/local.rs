//! Local deterministic generator.
//!
//! Echoes a condensed form of the prompt so that offline deployments and
//! demos run end to end without a language model. Output is stable for a
//! given prompt.

use async_trait::async_trait;

use super::TextGenerator;
use crate::provider::ProviderError;

const MAX_ECHO_CHARS: usize = 280;

/// Collapse whitespace and truncate to [`MAX_ECHO_CHARS`] characters.
pub fn condense(prompt: &str) -> String {
    let collapsed = prompt.split_whitespace().collect::<Vec<_>>().join(" ");
    collapsed.chars().take(MAX_ECHO_CHARS).collect()
}

#[derive(Debug, Clone, Default)]
pub struct LocalGenerator;

#[async_trait]
impl TextGenerator for LocalGenerator {
    async fn generate(&self, prompt: &str) -> Result<String, ProviderError> {
        let condensed = condense(prompt);
        if condensed.is_empty() {
            return Err(ProviderError::EmptyResponse);
        }
        Ok(format!("[local] {condensed}"))
    }

    fn name(&self) -> &str {
        "local"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn condense_collapses_and_truncates() {
        assert_eq!(condense("  a \n\n b\tc "), "a b c");
        assert_eq!(condense(&"x ".repeat(1000)).chars().count(), MAX_ECHO_CHARS);
    }

    #[tokio::test]
    async fn output_is_stable() {
        let g = LocalGenerator;
        let a = g.generate("Describe this test").await.unwrap();
        let b = g.generate("Describe this test").await.unwrap();
        assert_eq!(a, b);
        assert!(a.starts_with("[local] "));
    }

    #[tokio::test]
    async fn blank_prompt_is_rejected() {
        assert!(LocalGenerator.generate("  ").await.is_err());
    }
}
