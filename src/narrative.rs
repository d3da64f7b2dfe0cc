//! Free-form changelog prose written by a generative text model.
//!
//! The model is optional. Without a credential, on any error, on timeout or
//! on an empty answer the deterministic Markdown renderer is used instead, so
//! callers always get a changelog back.
use async_trait::async_trait;
use color_eyre::eyre::eyre;
use futures::StreamExt;
use log::*;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use std::{sync::Arc, time::Duration};

#[cfg(test)]
use mockall::automock;

use crate::{
    changelog::render_markdown,
    config::{AiConfig, GEMINI_API_KEY_ENV, env_secret},
    error::MergelogError,
    result::Result,
    types::{DateWindow, PullRequest},
};

pub const DEFAULT_STYLE: &str = "Write a professional, detailed changelog like you'd see on GitHub releases or in a SaaS product.
Be clear and informative. Extract real details from PR descriptions.
Group by category (Features, Fixes, Improvements, etc.).
Write descriptions that users can understand. Focus on WHAT changed and WHY it matters.";

const PROMPT_TEMPLATE: &str = r#"You are a professional technical writer creating a detailed, informative changelog for "{{ repo_name }}".

Here are the merged pull requests between {{ since }} and {{ until }}:

{{ summaries }}

Style: "{{ style }}"

Create a DETAILED, professional changelog that:
1. Has a clear title with repo name and date range
2. Groups changes by category (Features, Bug Fixes, Improvements, etc.)
3. For EACH change, write a clear description of WHAT was implemented/changed and WHY it matters
4. Use the PR description/body to extract details - don't just repeat the title
5. Include PR numbers as links: [#123](url)
6. Mention authors when relevant
7. If there are related issues, reference them
8. Follow the user's style preference while being informative
9. Make it read like a real product changelog - users should understand what changed

IMPORTANT:
- Don't just list PR titles - explain what was actually done
- Extract key information from the PR descriptions
- Write clear, user-friendly descriptions
- If a PR title is vague (like "Fix CI/CD"), use the description to explain what was fixed
- Include release information: mention which version each change was released in (check the "released_in" field)
- Mark changes that haven't been released yet

Return ONLY the markdown changelog, no extra text."#;

const NOT_RELEASED: &str = "Not yet released";

/// Single-shot text generation backend.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Returns the whole response to `prompt`, assembled from any stream.
    async fn generate(&self, prompt: &str) -> Result<String>;
}

#[derive(Debug, Serialize)]
struct RequestPart {
    text: String,
}

#[derive(Debug, Serialize)]
struct RequestContent {
    role: String,
    parts: Vec<RequestPart>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ThinkingConfig {
    thinking_budget: u32,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    thinking_config: ThinkingConfig,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest {
    contents: Vec<RequestContent>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ResponseContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<ResponseContent>,
}

#[derive(Debug, Deserialize)]
struct StreamChunk {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

/// Reassembles the text of a server-sent-event stream whose chunk
/// boundaries can fall anywhere, including inside a UTF-8 sequence.
#[derive(Debug, Default)]
struct SseAssembler {
    pending: Vec<u8>,
    text: String,
}

impl SseAssembler {
    fn push(&mut self, bytes: &[u8]) -> Result<()> {
        self.pending.extend_from_slice(bytes);

        while let Some(pos) = self.pending.iter().position(|b| *b == b'\n') {
            let line = self.pending.drain(..=pos).collect::<Vec<u8>>();
            self.process_line(&line)?;
        }

        Ok(())
    }

    fn finish(mut self) -> Result<String> {
        let rest = std::mem::take(&mut self.pending);
        self.process_line(&rest)?;
        Ok(self.text)
    }

    fn process_line(&mut self, line: &[u8]) -> Result<()> {
        let line = String::from_utf8_lossy(line);
        let line = line.trim();

        let Some(data) = line.strip_prefix("data:") else {
            return Ok(());
        };

        let chunk: StreamChunk = serde_json::from_str(data.trim())?;

        for candidate in chunk.candidates.into_iter().take(1) {
            for part in candidate.content.into_iter().flat_map(|c| c.parts) {
                if let Some(text) = part.text {
                    self.text.push_str(&text);
                }
            }
        }

        Ok(())
    }
}

/// Gemini `streamGenerateContent` client.
pub struct Gemini {
    client: reqwest::Client,
    api_base: String,
    model: String,
    api_key: SecretString,
}

impl Gemini {
    pub fn new(config: &AiConfig, api_key: SecretString) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs.max(1)))
            .build()?;

        Ok(Self {
            client,
            api_base: config.api_base.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            api_key,
        })
    }
}

#[async_trait]
impl TextGenerator for Gemini {
    async fn generate(&self, prompt: &str) -> Result<String> {
        let endpoint = format!(
            "{}/models/{}:streamGenerateContent?alt=sse",
            self.api_base, self.model
        );

        let body = GenerateRequest {
            contents: vec![RequestContent {
                role: "user".into(),
                parts: vec![RequestPart {
                    text: prompt.to_string(),
                }],
            }],
            generation_config: GenerationConfig {
                thinking_config: ThinkingConfig { thinking_budget: 0 },
            },
        };

        debug!("calling {} with a {} byte prompt", self.model, prompt.len());

        let response = self
            .client
            .post(endpoint)
            .header("x-goog-api-key", self.api_key.expose_secret())
            .json(&body)
            .send()
            .await?
            .error_for_status()?;

        let mut stream = response.bytes_stream();
        let mut assembler = SseAssembler::default();

        while let Some(chunk) = stream.next().await {
            assembler.push(&chunk?)?;
        }

        assembler.finish()
    }
}

#[derive(Debug, Serialize)]
struct PullSummary<'a> {
    number: u64,
    title: &'a str,
    description: &'a str,
    author: &'a str,
    merged_at: String,
    labels: &'a [String],
    issues: Vec<String>,
    url: &'a str,
    released_in: &'a str,
}

impl<'a> From<&'a PullRequest> for PullSummary<'a> {
    fn from(pr: &'a PullRequest) -> Self {
        Self {
            number: pr.number,
            title: &pr.title,
            description: &pr.body,
            author: &pr.author,
            merged_at: pr.merged_at.to_rfc3339(),
            labels: &pr.labels,
            issues: pr
                .issues
                .iter()
                .map(|i| format!("#{}: {}", i.number, i.title))
                .collect(),
            url: &pr.html_url,
            released_in: pr.release.as_deref().unwrap_or(NOT_RELEASED),
        }
    }
}

/// Writes changelog prose through a [`TextGenerator`], falling back to
/// [`render_markdown`] whenever that does not produce text.
pub struct NarrativeGenerator {
    generator: Option<Arc<dyn TextGenerator>>,
    default_style: String,
    timeout: Duration,
}

impl NarrativeGenerator {
    pub fn new(
        generator: Option<Arc<dyn TextGenerator>>,
        config: &AiConfig,
    ) -> Self {
        let default_style = config
            .default_style
            .clone()
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_STYLE.to_string());

        Self {
            generator,
            default_style,
            timeout: Duration::from_secs(config.timeout_secs.max(1)),
        }
    }

    /// Uses Gemini when `GEMINI_API_KEY` is set, deterministic output
    /// otherwise.
    pub fn from_env(config: &AiConfig) -> Result<Self> {
        let Some(key) = env_secret(GEMINI_API_KEY_ENV) else {
            info!(
                "{GEMINI_API_KEY_ENV} not set: changelogs use automatic categorization"
            );
            return Ok(Self::new(None, config));
        };

        let gemini = Gemini::new(config, SecretString::from(key))?;
        let generator: Arc<dyn TextGenerator> = Arc::new(gemini);

        Ok(Self::new(Some(generator), config))
    }

    pub fn ai_enabled(&self) -> bool {
        self.generator.is_some()
    }

    /// Produces the changelog. Never fails: every problem with the model
    /// degrades to the deterministic renderer with identical inputs.
    pub async fn generate(
        &self,
        pulls: &[PullRequest],
        window: &DateWindow,
        repo_name: &str,
        custom_style: Option<&str>,
    ) -> String {
        let Some(generator) = self.generator.as_deref() else {
            debug!(
                "no text generator configured: using automatic categorization"
            );
            return render_markdown(pulls, window, repo_name);
        };

        match self
            .try_generate(generator, pulls, window, repo_name, custom_style)
            .await
        {
            Ok(changelog) => changelog,
            Err(err) => {
                warn!(
                    "narrative generation failed, falling back to automatic categorization: {err}"
                );
                render_markdown(pulls, window, repo_name)
            }
        }
    }

    async fn try_generate(
        &self,
        generator: &dyn TextGenerator,
        pulls: &[PullRequest],
        window: &DateWindow,
        repo_name: &str,
        custom_style: Option<&str>,
    ) -> Result<String> {
        let style = custom_style
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .unwrap_or(&self.default_style);

        if style == self.default_style {
            info!("generating narrative changelog with the default style");
        } else {
            info!("generating narrative changelog with custom style: {style}");
        }

        let prompt = build_prompt(pulls, window, repo_name, style)?;

        let text =
            tokio::time::timeout(self.timeout, generator.generate(&prompt))
                .await
                .map_err(|_| {
                    MergelogError::upstream_timeout(format!(
                        "no model response after {:?}",
                        self.timeout
                    ))
                })??;

        let text = text.trim();

        if text.is_empty() {
            return Err(eyre!("model returned an empty response"));
        }

        Ok(text.to_string())
    }
}

/// Fills the instruction template with a JSON summary of `pulls`.
fn build_prompt(
    pulls: &[PullRequest],
    window: &DateWindow,
    repo_name: &str,
    style: &str,
) -> Result<String> {
    let summaries = pulls.iter().map(PullSummary::from).collect::<Vec<_>>();

    let mut context = tera::Context::new();
    context.insert("repo_name", repo_name);
    context.insert("since", &window.since.format("%Y-%m-%d").to_string());
    context.insert("until", &window.until.format("%Y-%m-%d").to_string());
    context.insert("summaries", &serde_json::to_string_pretty(&summaries)?);
    context.insert("style", style);

    Ok(fill_template(PROMPT_TEMPLATE, &context)?)
}

fn fill_template(
    template: &str,
    context: &tera::Context,
) -> std::result::Result<String, MergelogError> {
    Ok(tera::Tera::one_off(template, context, false)?)
}
