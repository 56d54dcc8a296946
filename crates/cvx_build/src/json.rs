//! JSON helpers for agent input and output.

use cvx_cache::{AgentOutput, JsonObject};
use cvx_error::JsonError;
use serde_json::Value;

/// Compact JSON with object keys in sorted order.
///
/// Two objects with the same content always serialise to the same text,
/// whatever order their keys were inserted in, which keeps cache keys stable.
///
/// ```
/// use cvx_build::canonical_json;
/// use serde_json::json;
///
/// let a = json!({"name": "John", "email": "john@example.com"});
/// let b = json!({"email": "john@example.com", "name": "John"});
/// assert_eq!(
///     canonical_json(a.as_object().unwrap()),
///     canonical_json(b.as_object().unwrap())
/// );
/// ```
pub fn canonical_json(object: &JsonObject) -> String {
    // Key order must not depend on serde_json's `preserve_order` feature.
    let mut sorted: Vec<(&String, &Value)> = object.iter().collect();
    sorted.sort_by(|a, b| a.0.cmp(b.0));

    let mut out = String::from("{");
    for (i, (key, value)) in sorted.into_iter().enumerate() {
        if i > 0 {
            out.push(',');
        }
        out.push_str(&Value::String(key.clone()).to_string());
        out.push(':');
        out.push_str(&canonical_value(value));
    }
    out.push('}');
    out
}

fn canonical_value(value: &Value) -> String {
    match value {
        Value::Object(object) => canonical_json(object),
        Value::Array(items) => {
            let items: Vec<String> = items.iter().map(canonical_value).collect();
            format!("[{}]", items.join(","))
        }
        scalar => scalar.to_string(),
    }
}

/// The JSON object in a model reply.
///
/// Strips a surrounding ```` ```json ```` or ```` ``` ```` fence, then keeps
/// the text from the first `{` to the last `}`. Text without braces is
/// returned trimmed.
///
/// ```
/// use cvx_build::extract_json;
///
/// assert_eq!(extract_json("```json\n{\"a\": 1}\n```"), "{\"a\": 1}");
/// assert_eq!(extract_json("Here you go: {\"a\": {\"b\": 2}} Thanks!"), "{\"a\": {\"b\": 2}}");
/// ```
pub fn extract_json(text: &str) -> &str {
    let mut s = text.trim();

    for fence in ["```json", "```"] {
        if let Some(rest) = s.strip_prefix(fence) {
            s = match rest.rfind("```") {
                Some(end) => &rest[..end],
                None => rest,
            };
            break;
        }
    }

    if let (Some(start), Some(end)) = (s.find('{'), s.rfind('}')) {
        if end > start {
            s = &s[start..=end];
        }
    }

    s.trim()
}

/// Decode an agent reply into its CV and letter.
///
/// # Errors
///
/// Returns a `JsonError` if the text is not a JSON object or lacks an object
/// under either `cv` or `letter`.
pub fn parse_agent_output(text: &str) -> Result<AgentOutput, JsonError> {
    let value: Value = serde_json::from_str(extract_json(text))
        .map_err(|e| JsonError::new(format!("failed to parse agent output: {}", e)))?;

    let Value::Object(mut object) = value else {
        return Err(JsonError::new("agent output is not a JSON object"));
    };

    match (object.remove("cv"), object.remove("letter")) {
        (Some(Value::Object(cv)), Some(Value::Object(letter))) => Ok(AgentOutput::new(cv, letter)),
        _ => Err(JsonError::new("invalid output: missing cv or letter fields")),
    }
}
