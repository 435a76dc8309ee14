use serde::Deserialize;
use serde_json::{json, Value};

use aura_core::Citation;

use crate::error::ConversionError;
use crate::provider::{ModelReply, Turn};

/// Default MIME type Imagen is asked to produce
pub const IMAGE_MIME_TYPE: &str = "image/jpeg";

/// Build a `generateContent` body from prior turns plus the new user text
pub fn build_generate_request(
    history: &[Turn],
    message: &str,
    system_instruction: Option<&str>,
    web_search: bool,
) -> Value {
    let mut contents: Vec<Value> = history
        .iter()
        .map(|turn| {
            json!({
                "role": turn.role.as_str(),
                "parts": [{ "text": turn.text }],
            })
        })
        .collect();
    contents.push(json!({
        "role": "user",
        "parts": [{ "text": message }],
    }));

    let mut body = json!({ "contents": contents });

    if let Some(instruction) = system_instruction.filter(|s| !s.trim().is_empty()) {
        body["systemInstruction"] = json!({ "parts": [{ "text": instruction }] });
    }
    if web_search {
        body["tools"] = json!([{ "google_search": {} }]);
    }

    body
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    content: Option<ContentResponse>,
    grounding_metadata: Option<GroundingMetadata>,
}

#[derive(Deserialize)]
struct ContentResponse {
    #[serde(default)]
    parts: Vec<PartResponse>,
}

#[derive(Deserialize)]
struct PartResponse {
    text: Option<String>,
    #[serde(default)]
    thought: bool,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct GroundingMetadata {
    #[serde(default)]
    grounding_chunks: Vec<GroundingChunk>,
}

#[derive(Deserialize)]
struct GroundingChunk {
    web: Option<WebSource>,
}

#[derive(Deserialize)]
struct WebSource {
    uri: Option<String>,
    title: Option<String>,
}

/// Extract reply text and citations from a `generateContent` response
pub fn parse_generate_response(data: &Value) -> Result<ModelReply, ConversionError> {
    let response: GenerateContentResponse = serde_json::from_value(data.clone())?;
    let candidate = response
        .candidates
        .into_iter()
        .next()
        .ok_or_else(|| ConversionError::MissingField("candidates".to_string()))?;

    let text: String = candidate
        .content
        .map(|content| {
            content
                .parts
                .into_iter()
                .filter(|part| !part.thought)
                .filter_map(|part| part.text)
                .collect()
        })
        .unwrap_or_default();

    if text.is_empty() {
        return Err(ConversionError::MissingField(
            "candidates[0].content.parts[].text".to_string(),
        ));
    }

    let citations = candidate
        .grounding_metadata
        .map(collect_citations)
        .unwrap_or_default();

    Ok(ModelReply { text, citations })
}

fn collect_citations(metadata: GroundingMetadata) -> Vec<Citation> {
    let mut citations: Vec<Citation> = Vec::new();
    for web in metadata.grounding_chunks.into_iter().filter_map(|c| c.web) {
        let Some(uri) = web.uri.filter(|u| !u.trim().is_empty()) else {
            continue;
        };
        if citations.iter().any(|c| c.uri == uri) {
            continue;
        }
        let title = web
            .title
            .filter(|t| !t.trim().is_empty())
            .unwrap_or_else(|| uri.clone());
        citations.push(Citation::new(uri, title));
    }
    citations
}

/// Build an Imagen `predict` body for a single image
pub fn build_predict_request(prompt: &str) -> Value {
    json!({
        "instances": [{ "prompt": prompt }],
        "parameters": {
            "sampleCount": 1,
            "outputMimeType": IMAGE_MIME_TYPE,
        },
    })
}

#[derive(Deserialize)]
struct PredictResponse {
    #[serde(default)]
    predictions: Vec<Prediction>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct Prediction {
    bytes_base64_encoded: Option<String>,
    mime_type: Option<String>,
}

/// Turn the first prediction into a `data:` URI
pub fn parse_predict_response(data: &Value) -> Result<String, ConversionError> {
    let response: PredictResponse = serde_json::from_value(data.clone())?;
    let prediction = response
        .predictions
        .into_iter()
        .find(|p| p.bytes_base64_encoded.as_deref().is_some_and(|b| !b.is_empty()))
        .ok_or_else(|| {
            ConversionError::MissingField("predictions[0].bytesBase64Encoded".to_string())
        })?;

    let bytes = prediction.bytes_base64_encoded.unwrap_or_default();
    let mime = prediction
        .mime_type
        .unwrap_or_else(|| IMAGE_MIME_TYPE.to_string());
    Ok(format!("data:{};base64,{}", mime, bytes))
}

#[derive(Deserialize)]
struct ErrorWrapper {
    error: ErrorBody,
}

#[derive(Deserialize)]
struct ErrorBody {
    message: Option<String>,
    status: Option<String>,
}

/// Human-readable message from an API error body, falling back to the raw body
pub fn parse_error_message(body: &str) -> String {
    serde_json::from_str::<ErrorWrapper>(body)
        .map(|wrapper| {
            let msg = wrapper.error.message.unwrap_or_else(|| body.to_string());
            match wrapper.error.status.filter(|s| !s.is_empty()) {
                Some(status) => format!("{status}: {msg}"),
                None => msg,
            }
        })
        .unwrap_or_else(|_| body.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_request_shape() {
        let history = vec![Turn::user("hi"), Turn::model("hello")];
        let body = build_generate_request(&history, "next", Some("Be brief."), true);

        let contents = body["contents"].as_array().unwrap();
        assert_eq!(contents.len(), 3);
        assert_eq!(contents[0]["role"], "user");
        assert_eq!(contents[1]["role"], "model");
        assert_eq!(contents[2]["parts"][0]["text"], "next");
        assert_eq!(body["systemInstruction"]["parts"][0]["text"], "Be brief.");
        assert!(body["tools"][0]["google_search"].is_object());
    }

    #[test]
    fn test_generate_request_without_extras() {
        let body = build_generate_request(&[], "title please", None, false);
        assert!(body.get("systemInstruction").is_none());
        assert!(body.get("tools").is_none());
    }

    #[test]
    fn test_parse_reply_with_grounding() {
        let data = json!({
            "candidates": [{
                "content": {
                    "role": "model",
                    "parts": [
                        { "text": "thinking...", "thought": true },
                        { "text": "Rust 1.0 shipped " },
                        { "text": "in May 2015." }
                    ]
                },
                "groundingMetadata": {
                    "groundingChunks": [
                        { "web": { "uri": "https://blog.rust-lang.org", "title": "Rust Blog" } },
                        { "web": { "uri": "https://blog.rust-lang.org", "title": "Duplicate" } },
                        { "web": { "uri": "", "title": "No link" } },
                        { "web": { "uri": "https://example.com/untitled" } }
                    ]
                }
            }]
        });

        let reply = parse_generate_response(&data).unwrap();
        assert_eq!(reply.text, "Rust 1.0 shipped in May 2015.");
        assert_eq!(
            reply.citations,
            vec![
                Citation::new("https://blog.rust-lang.org", "Rust Blog"),
                Citation::new("https://example.com/untitled", "https://example.com/untitled"),
            ]
        );
    }

    #[test]
    fn test_parse_reply_without_candidates() {
        let err = parse_generate_response(&json!({ "promptFeedback": {} })).unwrap_err();
        assert!(matches!(err, ConversionError::MissingField(_)));
    }

    #[test]
    fn test_parse_prediction_to_data_uri() {
        let data = json!({
            "predictions": [{ "bytesBase64Encoded": "iVBORw0KGgo=", "mimeType": "image/png" }]
        });
        assert_eq!(
            parse_predict_response(&data).unwrap(),
            "data:image/png;base64,iVBORw0KGgo="
        );

        let default_mime = json!({ "predictions": [{ "bytesBase64Encoded": "AAAA" }] });
        assert_eq!(
            parse_predict_response(&default_mime).unwrap(),
            "data:image/jpeg;base64,AAAA"
        );

        assert!(parse_predict_response(&json!({ "predictions": [] })).is_err());
    }

    #[test]
    fn test_error_message_extraction() {
        let body = r#"{"error":{"code":400,"message":"Invalid prompt","status":"INVALID_ARGUMENT"}}"#;
        assert_eq!(parse_error_message(body), "INVALID_ARGUMENT: Invalid prompt");
        assert_eq!(parse_error_message("gateway timeout"), "gateway timeout");
    }
}
