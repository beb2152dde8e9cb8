use crate::error::{QuestionError, Result};
use crate::parser::{parse_question, parse_questions, GeneratedQuestion};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

pub const DEFAULT_ENDPOINT: &str = "https://api.deepinfra.com/v1/openai";
pub const DEFAULT_MODEL: &str = "meta-llama/Meta-Llama-3-8B-Instruct";
pub const DEFAULT_BATCH_SIZE: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    #[default]
    Medium,
    Hard,
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Easy => "easy",
            Self::Medium => "medium",
            Self::Hard => "hard",
        })
    }
}

impl FromStr for Difficulty {
    type Err = QuestionError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "easy" => Ok(Self::Easy),
            "medium" => Ok(Self::Medium),
            "hard" => Ok(Self::Hard),
            other => Err(QuestionError::Config(format!(
                "unknown difficulty '{}', expected easy, medium or hard",
                other
            ))),
        }
    }
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: String,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatContent,
}

#[derive(Debug, Deserialize)]
struct ChatContent {
    content: String,
}

/// Generates trivia questions through an OpenAI-compatible chat completions
/// endpoint (DeepInfra by default).
pub struct QuestionGenerator {
    client: Client,
    api_key: String,
    endpoint: String,
    model: String,
}

impl QuestionGenerator {
    pub fn new(api_key: impl Into<String>) -> Result<Self> {
        let api_key = api_key.into();
        if api_key.trim().is_empty() {
            return Err(QuestionError::Config("API key cannot be empty".to_string()));
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(60))
            .build()
            .map_err(|e| QuestionError::Config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            api_key,
            endpoint: DEFAULT_ENDPOINT.to_string(),
            model: DEFAULT_MODEL.to_string(),
        })
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub async fn generate_question(
        &self,
        category: &str,
        difficulty: Difficulty,
    ) -> Result<GeneratedQuestion> {
        let system = format!(
            "You are an expert trivia question creator. Generate one multiple-choice trivia question about {category} with exactly 4 answer options. The question should be {difficulty} difficulty.

Format your response exactly like this, with no additional text:
Question: [THE QUESTION]
A) [OPTION A]
B) [OPTION B]
C) [OPTION C]
D) [OPTION D]
Correct Answer: [A, B, C, or D]"
        );
        let user = format!("Generate a {difficulty} difficulty {category} trivia question.");

        let content = self.complete(system, user, 0.7, 500, "Failed to generate question").await?;

        parse_question(&content, category).ok_or_else(|| {
            tracing::error!("Failed to parse question format: {}", content);
            QuestionError::Unparsable(content)
        })
    }

    /// Unparsable blocks in the completion are dropped, so the result may
    /// hold fewer than `count` questions.
    pub async fn generate_questions(
        &self,
        category: &str,
        difficulty: Difficulty,
        count: usize,
    ) -> Result<Vec<GeneratedQuestion>> {
        if count == 0 {
            return Ok(Vec::new());
        }

        let system = format!(
            "You are an expert trivia question creator. Generate {count} unique multiple-choice trivia questions about {category} with exactly 4 answer options each. The questions should be {difficulty} difficulty.

Format your response exactly like this, with each question separated by three dashes (---):

Question: [THE QUESTION 1]
A) [OPTION A]
B) [OPTION B]
C) [OPTION C]
D) [OPTION D]
Correct Answer: [A, B, C, or D]

---

Question: [THE QUESTION 2]
A) [OPTION A]
B) [OPTION B]
C) [OPTION C]
D) [OPTION D]
Correct Answer: [A, B, C, or D]

And so on for all {count} questions."
        );
        let user = format!("Generate {count} {difficulty} difficulty {category} trivia questions.");

        let content = self
            .complete(system, user, 0.8, 2000, "Failed to generate questions")
            .await?;

        let questions = parse_questions(&content, category);
        tracing::info!(
            "Generated {} of {} requested {} questions",
            questions.len(),
            count,
            category
        );
        Ok(questions)
    }

    async fn complete(
        &self,
        system: String,
        user: String,
        temperature: f32,
        max_tokens: u32,
        fallback: &str,
    ) -> Result<String> {
        let request = ChatRequest {
            model: &self.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: system,
                },
                ChatMessage {
                    role: "user",
                    content: user,
                },
            ],
            temperature,
            max_tokens,
        };

        let url = format!("{}/chat/completions", self.endpoint.trim_end_matches('/'));
        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| QuestionError::Unreachable(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = api_error_message(&body).unwrap_or_else(|| fallback.to_string());
            tracing::error!("Completion API error ({}): {}", status.as_u16(), message);
            return Err(QuestionError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let body: ChatResponse = response
            .json()
            .await
            .map_err(|e| QuestionError::MalformedResponse(e.to_string()))?;

        body.choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content)
            .ok_or_else(|| QuestionError::MalformedResponse("no choices returned".to_string()))
    }
}

fn api_error_message(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    value
        .get("error")
        .and_then(|e| e.get("message"))
        .and_then(|m| m.as_str())
        .map(str::to_string)
}
