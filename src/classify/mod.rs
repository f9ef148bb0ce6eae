//! Natural-language intent classification
//!
//! Maps a user question onto one catalog template plus extracted
//! parameters — or a clarification request when the question is
//! under-specified. The ingestion and query engines depend only on the
//! [`IntentClassifier`] trait; how the resolution happens (an LLM call, a
//! keyword matcher) is an injected collaborator.

pub mod client;

use crate::catalog::QueryTemplate;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;

/// Errors surfaced by intent classification
#[derive(Error, Debug)]
pub enum ClassifyError {
    #[error("LLM API error: {0}")]
    Api(String),
    #[error("configuration error: {0}")]
    Config(String),
    #[error("network error: {0}")]
    Network(String),
    #[error("serialization error: {0}")]
    Serialization(String),
    #[error("malformed classifier response: {0}")]
    MalformedResponse(String),
}

pub type ClassifyResult<T> = Result<T, ClassifyError>;

/// Classification outcome.
#[derive(Debug, Clone, PartialEq)]
pub enum Intent {
    Selection {
        template: String,
        params: HashMap<String, String>,
        reasoning: Option<String>,
    },
    /// The question cannot be answered without more information; the text
    /// is surfaced to the user unchanged.
    Clarify { question: String },
}

#[async_trait]
pub trait IntentClassifier: Send + Sync {
    async fn classify(
        &self,
        question: &str,
        templates: &[QueryTemplate],
    ) -> ClassifyResult<Intent>;
}

#[async_trait]
impl IntentClassifier for Box<dyn IntentClassifier> {
    async fn classify(
        &self,
        question: &str,
        templates: &[QueryTemplate],
    ) -> ClassifyResult<Intent> {
        (**self).classify(question, templates).await
    }
}

/// Which LLM backend the classifier talks to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LlmProvider {
    OpenAi,
    Ollama,
    Gemini,
}

/// Classifier backend configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassifierConfig {
    pub provider: LlmProvider,
    pub model: String,
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default)]
    pub api_base_url: Option<String>,
    /// Known device hostnames, folded into the selector prompt so the
    /// model normalizes colloquial names ("the edge router") to inventory
    /// hostnames.
    #[serde(default)]
    pub device_names: Vec<String>,
}

/// LLM-backed classifier: selector prompt in, template selection out.
pub struct LlmClassifier {
    client: client::LlmClient,
    device_names: Vec<String>,
}

impl LlmClassifier {
    pub fn new(config: &ClassifierConfig) -> ClassifyResult<Self> {
        Ok(LlmClassifier {
            client: client::LlmClient::new(config)?,
            device_names: config.device_names.clone(),
        })
    }
}

#[async_trait]
impl IntentClassifier for LlmClassifier {
    async fn classify(
        &self,
        question: &str,
        templates: &[QueryTemplate],
    ) -> ClassifyResult<Intent> {
        let prompt = build_selector_prompt(question, templates, &self.device_names);
        let response = self.client.generate(&prompt).await?;
        parse_selection_response(&response)
    }
}

/// Build the template-selection prompt from the catalog descriptions.
pub fn build_selector_prompt(
    question: &str,
    templates: &[QueryTemplate],
    device_names: &[String],
) -> String {
    let mut template_list = String::new();
    for (i, t) in templates.iter().enumerate() {
        let params = if t.params.is_empty() {
            "No parameters".to_string()
        } else {
            format!("Requires: {}", t.params.join(", "))
        };
        let keywords: Vec<&str> = t.keywords.iter().take(3).copied().collect();
        template_list.push_str(&format!(
            "{}. **{}**: {}\n   {} | Keywords: {}\n",
            i + 1,
            t.name,
            t.description,
            params,
            keywords.join(", ")
        ));
    }

    let devices = if device_names.is_empty() {
        "(extract device names verbatim from the question)".to_string()
    } else {
        device_names.join(", ")
    };

    format!(
        r#"You are an intelligent network infrastructure query assistant. Map the user's question to the MOST SIMILAR predefined query template, even when the wording differs.

**Available Query Templates:**

{template_list}
**Device Names in Network:**
{devices}

**Matching Guidelines:**

1. Match user INTENT, not just exact keywords (devices = equipment = nodes = hosts; interfaces = ports; down = offline = failed = broken; up = operational = active; path = route; neighbors = adjacent = peers; topology = map = layout).
2. One device mentioned -> templates with a "device" parameter. Two devices -> "device1" and "device2". "all"/"list" -> templates without parameters.
3. Extract and normalize device names to the inventory hostnames, case-insensitively.
4. If multiple templates could match, choose the MOST SPECIFIC one; when in doubt, prefer fewer parameters.
5. If a required device name is missing from the question, ask for clarification instead of guessing.

**Output Format:**

<reasoning>
1. User Intent: ...
2. Key Words Detected: ...
3. Template Match: ...
4. Device Names: ...
</reasoning>

<response>
{{"template": "template_key", "params": {{"device": "DEVICE-NAME"}}}}
</response>

For a clarification, respond with:

<response>
{{"clarify": "your question to the user"}}
</response>

Question: {question}"#
    )
}

#[derive(Deserialize)]
struct SelectionReply {
    #[serde(default)]
    template: Option<String>,
    #[serde(default)]
    params: HashMap<String, String>,
    #[serde(default)]
    clarify: Option<String>,
}

/// Extract the `<reasoning>`/`<response>` blocks from an LLM reply and
/// parse the selection JSON.
pub fn parse_selection_response(response: &str) -> ClassifyResult<Intent> {
    let reasoning = extract_block(response, "reasoning").map(|s| s.to_string());

    let body = extract_block(response, "response")
        .ok_or_else(|| ClassifyError::MalformedResponse("no <response> block".to_string()))?;

    let reply: SelectionReply = serde_json::from_str(body)
        .map_err(|e| ClassifyError::MalformedResponse(format!("invalid JSON: {}", e)))?;

    if let Some(question) = reply.clarify {
        return Ok(Intent::Clarify { question });
    }
    let template = reply
        .template
        .ok_or_else(|| ClassifyError::MalformedResponse("neither template nor clarify".to_string()))?;
    Ok(Intent::Selection {
        template,
        params: reply.params,
        reasoning,
    })
}

fn extract_block<'a>(text: &'a str, tag: &str) -> Option<&'a str> {
    let open = format!("<{}>", tag);
    let close = format!("</{}>", tag);
    let start = text.find(&open)? + open.len();
    let end = text[start..].find(&close)? + start;
    Some(text[start..end].trim())
}

/// Keyword-scored classifier, used offline and in tests.
///
/// Scores every template by the longest catalog keyword contained in the
/// question, then extracts device parameters by matching known hostnames
/// in order of appearance.
pub struct StaticClassifier {
    devices: Vec<String>,
}

impl StaticClassifier {
    pub fn new(devices: Vec<String>) -> Self {
        StaticClassifier { devices }
    }

    fn devices_in_question(&self, question: &str) -> Vec<String> {
        let lower = question.to_lowercase();
        let mut found: Vec<(usize, &String)> = self
            .devices
            .iter()
            .filter_map(|d| lower.find(&d.to_lowercase()).map(|pos| (pos, d)))
            .collect();
        found.sort_by_key(|(pos, _)| *pos);
        found.into_iter().map(|(_, d)| d.clone()).collect()
    }
}

#[async_trait]
impl IntentClassifier for StaticClassifier {
    async fn classify(
        &self,
        question: &str,
        templates: &[QueryTemplate],
    ) -> ClassifyResult<Intent> {
        let lower = question.to_lowercase();

        let best = templates
            .iter()
            .filter_map(|t| {
                t.keywords
                    .iter()
                    .filter(|k| lower.contains(&k.to_lowercase()))
                    .map(|k| k.len())
                    .max()
                    .map(|score| (score, t))
            })
            .max_by_key(|(score, _)| *score);

        let Some((_, template)) = best else {
            return Ok(Intent::Clarify {
                question: "I could not match that question to a known query. \
                           Try asking about devices, interfaces, neighbors, or paths."
                    .to_string(),
            });
        };

        let mentioned = self.devices_in_question(question);
        let mut params = HashMap::new();
        for (i, name) in template.params.iter().enumerate() {
            match mentioned.get(i) {
                Some(device) => {
                    params.insert(name.to_string(), device.clone());
                }
                None => {
                    return Ok(Intent::Clarify {
                        question: format!("Which device should I use for {:?}?", name),
                    });
                }
            }
        }

        Ok(Intent::Selection {
            template: template.name.to_string(),
            params,
            reasoning: None,
        })
    }
}
