use serde_json::{Map, Value};

use super::schema::{FieldKind, RecordSchema, DOCUMENT_SCHEMA, NOT_AVAILABLE, NOT_DISCLOSED, NOT_SPECIFIED};

/// Characters of whitepaper text sent to the model.
pub const MAX_PROMPT_TEXT_CHARS: usize = 20_000;

pub const ANALYSIS_SYSTEM_PROMPT: &str = "You are an expert blockchain analyst and financial \
advisor. Provide comprehensive, detailed analysis in JSON format only. Be thorough, critical, \
and specific. ENSURE the JSON is complete and properly formatted.";

/// Build the analysis prompt for one whitepaper.
pub fn build_analysis_prompt(whitepaper_text: &str) -> String {
    let text = truncate_chars(whitepaper_text, MAX_PROMPT_TEXT_CHARS);
    let skeleton = render_skeleton();

    format!(
        r#"You are an expert cryptocurrency analyst, blockchain architect, and financial analyst. Perform a comprehensive deep-dive analysis of this whitepaper.

<whitepaper>
{text}
</whitepaper>

MISSING INFORMATION:
- Team details not in the whitepaper: "{NOT_AVAILABLE}"
- Tokenomics details not in the whitepaper: "{NOT_SPECIFIED}"
- Financial details not in the whitepaper: "{NOT_DISCLOSED}"
- Partnerships not in the whitepaper: "Partnership information not available"

Respond with a single JSON object of exactly this shape:

{skeleton}

RULES:
1. Return ONLY valid JSON, no markdown or additional text.
2. Use actual data from the whitepaper and be specific.
3. Scores are integers from 1 to 10.
4. Risk severity: Low/Medium/High/Critical. Likelihood: Low/Medium/High.
5. Investment recommendation: Strong Buy/Buy/Hold/Avoid.
6. Be critical and objective. Identify real weaknesses.
7. Include 3-5 items in each list where the whitepaper supports it.
8. Escape quotes inside strings and do not leave trailing commas.
9. Do not truncate the response."#
    )
}

fn truncate_chars(text: &str, max: usize) -> &str {
    match text.char_indices().nth(max) {
        Some((cut, _)) => &text[..cut],
        None => text,
    }
}

/// Example document with a type hint in place of every value.
fn render_skeleton() -> String {
    let sections: Map<String, Value> = DOCUMENT_SCHEMA
        .iter()
        .map(|section| (section.name.to_string(), record_hint(section)))
        .collect();
    serde_json::to_string_pretty(&Value::Object(sections)).unwrap_or_default()
}

fn record_hint(schema: &RecordSchema) -> Value {
    let fields = schema
        .fields
        .iter()
        .map(|field| (field.key.to_string(), field_hint(field.kind)));
    Value::Object(fields.collect())
}

fn field_hint(kind: FieldKind) -> Value {
    match kind {
        FieldKind::Text { .. } => "string".into(),
        FieldKind::TextList { .. } => Value::Array(vec!["string".into()]),
        FieldKind::TextMap { .. } => {
            let mut map = Map::new();
            map.insert("category".into(), "value".into());
            Value::Object(map)
        }
        FieldKind::Score { min, max, .. } => format!("integer {min}-{max}").into(),
        FieldKind::Choice { allowed, .. } => allowed.join(" | ").into(),
        FieldKind::Flag { .. } => "true | false".into(),
        FieldKind::Coordinate { .. } => "number 0-10".into(),
        FieldKind::Records(nested) => Value::Array(vec![record_hint(nested)]),
    }
}
