//! HTTP client for the generative-language REST API.

use futures_util::StreamExt;
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use serde::Serialize;
use serde_json::Value;

use crate::error::{GatewayError, GatewayResult};

/// One turn of a conversation, already in wire roles ("user" / "model").
#[derive(Debug, Clone, Serialize)]
pub struct ChatTurn {
    pub role: String,
    pub text: String,
}

impl ChatTurn {
    pub fn user(text: impl Into<String>) -> Self {
        Self { role: "user".to_string(), text: text.into() }
    }

    pub fn model(text: impl Into<String>) -> Self {
        Self { role: "model".to_string(), text: text.into() }
    }
}

/// Streaming lifecycle for one request. The chunk sequence is lazy, finite,
/// and not restartable; the call ends at `Completed` or an `Err` return.
#[derive(Debug, Clone)]
pub enum StreamEvent {
    Started,
    Delta(String),
    Completed,
}

#[derive(Debug, Clone)]
pub struct LlmClient {
    http: reqwest::Client,
    base_url: String,
    model: String,
    api_key: String,
    temperature: f32,
}

impl LlmClient {
    pub fn new(base_url: &str, model: &str, api_key: &str, temperature: f32) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.to_string(),
            api_key: api_key.to_string(),
            temperature,
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn headers(&self) -> GatewayResult<HeaderMap> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(
            "x-goog-api-key",
            HeaderValue::from_str(&self.api_key)
                .map_err(|e| GatewayError::Remote(anyhow::anyhow!("bad api key header: {e}")))?,
        );
        Ok(headers)
    }

    /// One-shot generation. With `response_schema` set, the service is asked
    /// for structured JSON output conforming to the schema; otherwise free
    /// text. Returns the concatenated candidate text ("" when the response
    /// carried none — absent text is no data, not an error).
    pub async fn generate(
        &self,
        prompt: &str,
        response_schema: Option<Value>,
    ) -> GatewayResult<String> {
        #[derive(Serialize)]
        struct Part {
            text: String,
        }

        #[derive(Serialize)]
        struct Content {
            role: String,
            parts: Vec<Part>,
        }

        #[derive(Serialize)]
        #[serde(rename_all = "camelCase")]
        struct GenerationConfig {
            temperature: f32,
            #[serde(skip_serializing_if = "Option::is_none")]
            response_mime_type: Option<String>,
            #[serde(skip_serializing_if = "Option::is_none")]
            response_schema: Option<Value>,
        }

        #[derive(Serialize)]
        #[serde(rename_all = "camelCase")]
        struct Req {
            contents: Vec<Content>,
            generation_config: GenerationConfig,
        }

        let body = Req {
            contents: vec![Content {
                role: "user".to_string(),
                parts: vec![Part { text: prompt.to_string() }],
            }],
            generation_config: GenerationConfig {
                temperature: self.temperature,
                response_mime_type: response_schema
                    .is_some()
                    .then(|| "application/json".to_string()),
                response_schema,
            },
        };

        let url =
            format!("{}/v1beta/models/{}:generateContent", self.base_url, self.model);
        let resp = self
            .http
            .post(url)
            .headers(self.headers()?)
            .json(&body)
            .send()
            .await
            .map_err(GatewayError::from_transport)?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(GatewayError::from_response(status.as_u16(), &body));
        }

        let v: Value = resp
            .json()
            .await
            .map_err(|e| GatewayError::Remote(anyhow::Error::new(e).context("parse response")))?;
        Ok(extract_text(&v))
    }

    /// Streaming generation over a full turn history (SSE). Each partial
    /// text fragment is forwarded to `on_event` as it arrives.
    pub async fn stream_generate(
        &self,
        system: &str,
        turns: &[ChatTurn],
        mut on_event: impl FnMut(StreamEvent) + Send,
    ) -> GatewayResult<()> {
        #[derive(Serialize)]
        struct Part {
            text: String,
        }

        #[derive(Serialize)]
        struct Content {
            #[serde(skip_serializing_if = "Option::is_none")]
            role: Option<String>,
            parts: Vec<Part>,
        }

        #[derive(Serialize)]
        #[serde(rename_all = "camelCase")]
        struct Req {
            system_instruction: Content,
            contents: Vec<Content>,
            generation_config: GenerationConfig,
        }

        #[derive(Serialize)]
        struct GenerationConfig {
            temperature: f32,
        }

        let contents = turns
            .iter()
            .map(|t| Content {
                role: Some(t.role.clone()),
                parts: vec![Part { text: t.text.clone() }],
            })
            .collect();

        let body = Req {
            system_instruction: Content {
                role: None,
                parts: vec![Part { text: system.to_string() }],
            },
            contents,
            generation_config: GenerationConfig { temperature: self.temperature },
        };

        let url = format!(
            "{}/v1beta/models/{}:streamGenerateContent?alt=sse",
            self.base_url, self.model
        );
        let resp = self
            .http
            .post(url)
            .headers(self.headers()?)
            .json(&body)
            .send()
            .await
            .map_err(GatewayError::from_transport)?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(GatewayError::from_response(status.as_u16(), &body));
        }

        on_event(StreamEvent::Started);

        let mut stream = resp.bytes_stream();
        let mut buf = String::new();

        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(GatewayError::from_transport)?;
            buf.push_str(&String::from_utf8_lossy(chunk.as_ref()));

            while let Some(pos) = buf.find('\n') {
                let line = buf[..pos].trim().to_string();
                buf = buf[(pos + 1)..].to_string();

                let Some(data) = line.strip_prefix("data:") else {
                    continue;
                };
                let data = data.trim();
                if data.is_empty() || data == "[DONE]" {
                    continue;
                }

                // An unreadable frame carries no data; keep consuming.
                let Ok(v) = serde_json::from_str::<Value>(data) else {
                    log::debug!("skipping unreadable stream frame");
                    continue;
                };
                let text = extract_text(&v);
                if !text.is_empty() {
                    on_event(StreamEvent::Delta(text));
                }
            }
        }

        on_event(StreamEvent::Completed);
        Ok(())
    }
}

/// Concatenate `candidates[0].content.parts[*].text` from a response value.
fn extract_text(v: &Value) -> String {
    let mut out = String::new();
    let parts = v
        .get("candidates")
        .and_then(|c| c.get(0))
        .and_then(|c0| c0.get("content"))
        .and_then(|c| c.get("parts"))
        .and_then(|p| p.as_array());
    if let Some(parts) = parts {
        for part in parts {
            if let Some(t) = part.get("text").and_then(|t| t.as_str()) {
                out.push_str(t);
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_text_concatenates_parts() {
        let v: Value = serde_json::json!({
            "candidates": [{
                "content": { "parts": [{ "text": "Hel" }, { "text": "lo" }] }
            }]
        });
        assert_eq!(extract_text(&v), "Hello");
    }

    #[test]
    fn test_extract_text_handles_missing_candidates() {
        let v: Value = serde_json::json!({ "promptFeedback": {} });
        assert_eq!(extract_text(&v), "");
    }
}
