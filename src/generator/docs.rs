use crate::generator::postprocess::{clean_markdown_response, format_comment, wrap_docstring};
use crate::generator::prompts::{
    DOCUMENTATION_SYSTEM_PROMPT, README_SYSTEM_PROMPT, build_comment_prompt,
    build_docstring_prompt, build_readme_prompt,
};
use crate::llm::LLMClient;
use crate::packer::KeyFile;
use crate::utils::error::ParrotyError;

/// Summarize `snippet` as a one-line comment prefixed with `marker`.
pub async fn generate_comment(
    client: &LLMClient,
    snippet: &str,
    marker: &str,
) -> Result<String, ParrotyError> {
    let prompt = build_comment_prompt(snippet);
    tracing::debug!("Comment prompt: {} bytes", prompt.len());
    let raw = client.prompt(DOCUMENTATION_SYSTEM_PROMPT, &prompt).await?;
    format_comment(&raw, marker)
}

/// Describe `snippet` as a triple-quoted docstring with `Args:`/`Returns:`.
pub async fn generate_docstring(client: &LLMClient, snippet: &str) -> Result<String, ParrotyError> {
    let prompt = build_docstring_prompt(snippet);
    tracing::debug!("Docstring prompt: {} bytes", prompt.len());
    let raw = client.prompt(DOCUMENTATION_SYSTEM_PROMPT, &prompt).await?;
    Ok(wrap_docstring(&raw))
}

/// Write a README from a tree listing and the project's key files.
pub async fn generate_readme(
    client: &LLMClient,
    project_structure: &str,
    key_files: &[KeyFile],
) -> Result<String, ParrotyError> {
    let prompt = build_readme_prompt(project_structure, key_files);
    tracing::debug!(
        "README prompt: {} bytes, {} key files",
        prompt.len(),
        key_files.len()
    );
    let raw = client.prompt(README_SYSTEM_PROMPT, &prompt).await?;
    let readme = clean_markdown_response(&raw);
    if readme.is_empty() {
        return Err(ParrotyError::EmptyResponse {
            provider: "model".to_owned(),
            reason: "README was empty after removing code fences".to_owned(),
        });
    }
    Ok(readme)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::{CompletionOptions, CompletionResponse, LLMProvider, Message};
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// Returns a fixed reply and records the prompt it was sent.
    struct EchoProvider {
        reply: String,
        seen: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl LLMProvider for EchoProvider {
        async fn complete(
            &self,
            messages: &[Message],
            _options: &CompletionOptions,
        ) -> Result<CompletionResponse, ParrotyError> {
            self.seen
                .lock()
                .unwrap()
                .extend(messages.iter().map(|m| m.content.clone()));
            Ok(CompletionResponse {
                content: self.reply.clone(),
                prompt_tokens: 0,
                completion_tokens: 0,
            })
        }

        fn name(&self) -> &'static str {
            "echo"
        }

        fn model(&self) -> &str {
            "echo-1"
        }
    }

    fn client_replying(reply: &str) -> LLMClient {
        LLMClient::new(Box::new(EchoProvider {
            reply: reply.to_owned(),
            seen: Mutex::new(Vec::new()),
        }))
    }

    #[tokio::test]
    async fn test_generate_comment_prefixes_marker() {
        let client = client_replying("  Adds two numbers.\n");
        let comment = generate_comment(&client, "def add(a, b): return a + b", "#")
            .await
            .unwrap();
        assert_eq!(comment, "# Adds two numbers.");
    }

    #[tokio::test]
    async fn test_generate_comment_rejects_marker_only_reply() {
        let client = client_replying("#\n");
        let err = generate_comment(&client, "x = 1", "#").await.unwrap_err();
        assert!(matches!(err, ParrotyError::EmptyResponse { .. }));
    }

    #[tokio::test]
    async fn test_generate_docstring_multi_line() {
        let client = client_replying("Adds.\n\nArgs:\n    a: int\n\nReturns:\n    int");
        let doc = generate_docstring(&client, "def add(a, b): ...").await.unwrap();
        assert!(doc.starts_with("\"\"\"Adds."));
        assert!(doc.ends_with("\n\"\"\""));
    }

    #[tokio::test]
    async fn test_generate_readme_strips_fence() {
        let client = client_replying("```markdown\n# Demo\n\n## Usage\nRun it.\n```\n");
        let readme = generate_readme(&client, "demo/\n", &[KeyFile::new("go.mod", "module x")])
            .await
            .unwrap();
        assert_eq!(readme, "# Demo\n\n## Usage\nRun it.");
    }

    #[tokio::test]
    async fn test_generate_readme_rejects_empty_body() {
        let client = client_replying("```markdown\n```");
        let err = generate_readme(&client, "demo/\n", &[]).await.unwrap_err();
        assert!(matches!(err, ParrotyError::EmptyResponse { .. }));
    }
}
