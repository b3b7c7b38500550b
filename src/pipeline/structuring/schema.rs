//! Declarative description of the analysis document: every section, every
//! field, its kind and the default used when the model leaves it out.
//!
//! The normalizer and the prompt skeleton are both driven from this table,
//! so adding a field here is enough for it to be requested and enforced.

use serde_json::{Map, Value};

use crate::models::enums::{Likelihood, MilestoneStatus, Recommendation, Severity};

pub const NOT_SPECIFIED: &str = "Not specified in whitepaper";
pub const NOT_DISCLOSED: &str = "Not disclosed in whitepaper";
pub const NOT_AVAILABLE: &str = "Information not available in whitepaper";

/// Score used whenever the model's value is unusable.
pub const DEFAULT_SCORE: i64 = 5;

// ═══════════════════════════════════════════════════════════
// Types
// ═══════════════════════════════════════════════════════════

#[derive(Debug, Clone, Copy)]
pub enum FieldKind {
    Text {
        default: &'static str,
    },
    /// List of strings; empty lists become `[placeholder]`.
    TextList {
        placeholder: &'static str,
    },
    /// String-to-string map; empty maps become `{key: value}`.
    TextMap {
        key: &'static str,
        value: &'static str,
    },
    /// Integer in `min..=max`.
    Score {
        min: i64,
        max: i64,
        default: i64,
    },
    /// One of `allowed`, matched case-insensitively.
    Choice {
        allowed: &'static [&'static str],
        default: &'static str,
    },
    Flag {
        default: bool,
    },
    Coordinate {
        default: f64,
    },
    /// List of nested records; empty lists become one default record.
    Records(&'static RecordSchema),
}

#[derive(Debug, Clone, Copy)]
pub struct FieldSchema {
    pub key: &'static str,
    /// Alternative input keys, tried in order when `key` is absent.
    pub aliases: &'static [&'static str],
    pub kind: FieldKind,
}

/// Builds a record from a bare string, e.g. `"Alice (CTO)"`.
pub type FromText = fn(&str) -> Map<String, Value>;

pub struct RecordSchema {
    /// Section key for top-level records, a description for nested ones.
    pub name: &'static str,
    pub fields: &'static [FieldSchema],
    pub from_text: Option<FromText>,
}

impl std::fmt::Debug for RecordSchema {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RecordSchema")
            .field("name", &self.name)
            .field("fields", &self.fields.len())
            .finish()
    }
}

impl FieldSchema {
    const fn aka(self, aliases: &'static [&'static str]) -> Self {
        Self { aliases, ..self }
    }
}

const fn text(key: &'static str, default: &'static str) -> FieldSchema {
    FieldSchema { key, aliases: &[], kind: FieldKind::Text { default } }
}

const fn list(key: &'static str, placeholder: &'static str) -> FieldSchema {
    FieldSchema { key, aliases: &[], kind: FieldKind::TextList { placeholder } }
}

const fn map(key: &'static str, k: &'static str, v: &'static str) -> FieldSchema {
    FieldSchema { key, aliases: &[], kind: FieldKind::TextMap { key: k, value: v } }
}

const fn score(key: &'static str, min: i64, max: i64) -> FieldSchema {
    FieldSchema {
        key,
        aliases: &[],
        kind: FieldKind::Score { min, max, default: DEFAULT_SCORE },
    }
}

const fn choice(
    key: &'static str,
    allowed: &'static [&'static str],
    default: &'static str,
) -> FieldSchema {
    FieldSchema { key, aliases: &[], kind: FieldKind::Choice { allowed, default } }
}

const fn flag(key: &'static str, default: bool) -> FieldSchema {
    FieldSchema { key, aliases: &[], kind: FieldKind::Flag { default } }
}

const fn coordinate(key: &'static str, default: f64) -> FieldSchema {
    FieldSchema { key, aliases: &[], kind: FieldKind::Coordinate { default } }
}

const fn records(key: &'static str, schema: &'static RecordSchema) -> FieldSchema {
    FieldSchema { key, aliases: &[], kind: FieldKind::Records(schema) }
}

// ═══════════════════════════════════════════════════════════
// Nested records
// ═══════════════════════════════════════════════════════════

pub static TOKEN_DISTRIBUTION: RecordSchema = RecordSchema {
    name: "token distribution",
    fields: &[
        text("category", "Information not available"),
        text("percentage", "Not disclosed").aka(&["share", "allocation"]),
        text("vesting", "Not specified"),
    ],
    from_text: Some(distribution_from_text),
};

pub static DIAGRAM_NODE: RecordSchema = RecordSchema {
    name: "diagram node",
    fields: &[
        text("id", "unknown"),
        text("label", "Not specified").aka(&["name"]),
        text("type", "component"),
    ],
    from_text: None,
};

pub static DIAGRAM_CONNECTION: RecordSchema = RecordSchema {
    name: "diagram connection",
    fields: &[
        text("source", "unknown").aka(&["from"]),
        text("target", "unknown").aka(&["to"]),
        text("label", "Not specified"),
    ],
    from_text: None,
};

pub static RISK_ITEM: RecordSchema = RecordSchema {
    name: "risk",
    fields: &[
        text("label", "Unspecified risk").aka(&["risk", "name", "title"]),
        text("description", NOT_SPECIFIED).aka(&["details"]),
        choice("severity", Severity::NAMES, "Medium"),
        choice("likelihood", Likelihood::NAMES, "Medium").aka(&["probability"]),
    ],
    from_text: Some(risk_from_text),
};

pub static COMPETITOR: RecordSchema = RecordSchema {
    name: "competitor",
    fields: &[
        text("name", "Not specified"),
        text("description", NOT_SPECIFIED),
        list("strengths", "Not specified"),
        list("weaknesses", "Not specified"),
    ],
    from_text: Some(competitor_from_text),
};

pub static FEATURE_COMPARISON: RecordSchema = RecordSchema {
    name: "feature comparison",
    fields: &[
        text("feature", "Not specified"),
        text("project_score", "N/A"),
        map("competitor_scores", "Not available", "N/A"),
    ],
    from_text: None,
};

pub static MILESTONE: RecordSchema = RecordSchema {
    name: "milestone",
    fields: &[
        text("phase", "Not specified"),
        text("title", "Not specified").aka(&["phase", "name"]),
        text("description", NOT_SPECIFIED),
        text("timeline", "Not specified").aka(&["date"]),
        choice("status", MilestoneStatus::NAMES, "Planned"),
    ],
    from_text: Some(milestone_from_text),
};

pub static TEAM_MEMBER: RecordSchema = RecordSchema {
    name: "team member",
    fields: &[
        text("name", "Information not available"),
        text("role", NOT_AVAILABLE).aka(&["title", "position"]),
        text("experience", "Not specified"),
        text("linkedin", "Not available"),
    ],
    from_text: Some(person_from_text),
};

pub static PARTNERSHIP: RecordSchema = RecordSchema {
    name: "partnership",
    fields: &[
        text("partner", "Information not available").aka(&["name"]),
        text("type", "Not disclosed"),
        text("significance", "Partnership information not available"),
    ],
    from_text: Some(partner_from_text),
};

pub static USE_CASE: RecordSchema = RecordSchema {
    name: "use case",
    fields: &[
        text("title", "Not specified").aka(&["name"]),
        text("description", NOT_SPECIFIED),
        text("example", "Not specified"),
    ],
    from_text: Some(use_case_from_text),
};

pub static RADAR_POINT: RecordSchema = RecordSchema {
    name: "radar point",
    fields: &[text("dimension", "Not specified"), score("score", 0, 10)],
    from_text: None,
};

pub static COMPETITOR_PLOT: RecordSchema = RecordSchema {
    name: "competitor plot",
    fields: &[
        text("name", "Not specified"),
        coordinate("x", DEFAULT_SCORE as f64),
        coordinate("y", DEFAULT_SCORE as f64),
    ],
    from_text: None,
};

// ═══════════════════════════════════════════════════════════
// Sections
// ═══════════════════════════════════════════════════════════

pub static EXECUTIVE_ANALYSIS: RecordSchema = RecordSchema {
    name: "executive_analysis",
    fields: &[
        text("project_name", NOT_SPECIFIED).aka(&["name"]),
        text("tagline", NOT_SPECIFIED),
        text("core_value_proposition", NOT_SPECIFIED),
        text("target_problem", NOT_SPECIFIED),
        text("solution_approach", NOT_SPECIFIED),
        text("market_positioning", NOT_SPECIFIED),
        text("competitive_moat", NOT_SPECIFIED),
    ],
    from_text: None,
};

pub static TECHNICAL_DEEP_DIVE: RecordSchema = RecordSchema {
    name: "technical_deep_dive",
    fields: &[
        text("architecture_overview", NOT_SPECIFIED),
        list("design_patterns", NOT_AVAILABLE),
        text("consensus_mechanism", NOT_SPECIFIED),
        text("consensus_details", NOT_SPECIFIED),
        text("smart_contract_functionality", NOT_SPECIFIED),
        text("smart_contract_limitations", NOT_SPECIFIED),
        list("scalability_solutions", NOT_AVAILABLE),
        list("security_measures", NOT_AVAILABLE),
        text("audit_status", NOT_SPECIFIED),
        text("interoperability", NOT_SPECIFIED),
        score("technical_innovation_score", 1, 10),
        text("innovation_justification", NOT_SPECIFIED),
    ],
    from_text: None,
};

pub static TOKENOMICS: RecordSchema = RecordSchema {
    name: "tokenomics",
    fields: &[
        text("token_name", NOT_SPECIFIED),
        text("token_symbol", NOT_SPECIFIED).aka(&["symbol", "ticker"]),
        text("total_supply", NOT_SPECIFIED),
        list("utility", NOT_AVAILABLE),
        records("distribution", &TOKEN_DISTRIBUTION),
        text("inflation_mechanism", NOT_SPECIFIED),
        text("deflation_mechanism", NOT_SPECIFIED),
        text("economic_sustainability", NOT_SPECIFIED),
        records("flow_nodes", &DIAGRAM_NODE),
        records("flow_connections", &DIAGRAM_CONNECTION),
    ],
    from_text: None,
};

pub static RISK_ANALYSIS: RecordSchema = RecordSchema {
    name: "risk_analysis",
    fields: &[
        records("technical_risks", &RISK_ITEM),
        records("market_risks", &RISK_ITEM),
        records("team_execution_risks", &RISK_ITEM).aka(&["team_risks", "execution_risks"]),
        choice("overall_risk_level", Severity::NAMES, "Medium"),
    ],
    from_text: None,
};

pub static COMPETITIVE_LANDSCAPE: RecordSchema = RecordSchema {
    name: "competitive_landscape",
    fields: &[
        records("direct_competitors", &COMPETITOR).aka(&["competitors"]),
        records("feature_comparisons", &FEATURE_COMPARISON),
        text("technology_differentiation", NOT_SPECIFIED),
        list("alternative_approaches", NOT_AVAILABLE),
    ],
    from_text: None,
};

pub static TECHNOLOGY_ALTERNATIVES: RecordSchema = RecordSchema {
    name: "technology_alternatives",
    fields: &[
        list("current_tech_stack", NOT_AVAILABLE),
        text("why_chosen", NOT_SPECIFIED),
        list("alternatives", NOT_AVAILABLE),
        text("tradeoffs", NOT_SPECIFIED),
        list("emerging_disruptions", NOT_AVAILABLE),
        flag("is_optimal", true),
        text("optimization_reasoning", NOT_SPECIFIED),
    ],
    from_text: None,
};

pub static ROADMAP: RecordSchema = RecordSchema {
    name: "roadmap",
    fields: &[
        records("past_achievements", &MILESTONE),
        text("current_phase", NOT_SPECIFIED),
        records("future_milestones", &MILESTONE),
        list("critical_path", NOT_AVAILABLE),
        text("roadmap_risk", NOT_SPECIFIED),
    ],
    from_text: None,
};

pub static TEAM_PARTNERSHIPS: RecordSchema = RecordSchema {
    name: "team_partnerships",
    fields: &[
        records("team_members", &TEAM_MEMBER).aka(&["team"]),
        records("advisors", &TEAM_MEMBER),
        records("partnerships", &PARTNERSHIP).aka(&["partners"]),
        text("community_size", NOT_SPECIFIED),
        text("community_engagement", NOT_SPECIFIED),
    ],
    from_text: None,
};

pub static USE_CASES_ADOPTION: RecordSchema = RecordSchema {
    name: "use_cases_adoption",
    fields: &[
        records("primary_use_cases", &USE_CASE).aka(&["use_cases"]),
        list("target_segments", NOT_AVAILABLE),
        list("adoption_barriers", NOT_AVAILABLE),
        text("network_effects", NOT_SPECIFIED),
        list("traction_evidence", NOT_AVAILABLE),
    ],
    from_text: None,
};

pub static FINANCIAL_ANALYSIS: RecordSchema = RecordSchema {
    name: "financial_analysis",
    fields: &[
        text("funding_raised", NOT_DISCLOSED),
        map("funding_allocation", "Information", NOT_DISCLOSED),
        text("revenue_model", NOT_DISCLOSED),
        list("token_value_drivers", NOT_AVAILABLE),
        text("bull_case", NOT_SPECIFIED),
        text("bear_case", NOT_SPECIFIED),
    ],
    from_text: None,
};

pub static VISUALIZATION_DATA: RecordSchema = RecordSchema {
    name: "visualization_data",
    fields: &[
        records("tech_stack_nodes", &DIAGRAM_NODE),
        records("tech_stack_connections", &DIAGRAM_CONNECTION),
        records("risk_radar", &RADAR_POINT),
        text("competitive_matrix_x_axis", "Decentralization"),
        text("competitive_matrix_y_axis", "Scalability"),
        records("competitive_plots", &COMPETITOR_PLOT),
    ],
    from_text: None,
};

pub static OVERALL_ASSESSMENT: RecordSchema = RecordSchema {
    name: "overall_assessment",
    fields: &[
        score("innovation_score", 1, 10),
        score("technical_viability", 1, 10),
        score("team_capability", 1, 10),
        score("market_opportunity", 1, 10),
        score("risk_adjusted_rating", 1, 10),
        choice("investment_recommendation", Recommendation::NAMES, "Hold")
            .aka(&["recommendation"]),
        text("recommendation_justification", NOT_SPECIFIED),
    ],
    from_text: None,
};

/// All twelve sections in document order.
pub static DOCUMENT_SCHEMA: &[&RecordSchema] = &[
    &EXECUTIVE_ANALYSIS,
    &TECHNICAL_DEEP_DIVE,
    &TOKENOMICS,
    &RISK_ANALYSIS,
    &COMPETITIVE_LANDSCAPE,
    &TECHNOLOGY_ALTERNATIVES,
    &ROADMAP,
    &TEAM_PARTNERSHIPS,
    &USE_CASES_ADOPTION,
    &FINANCIAL_ANALYSIS,
    &VISUALIZATION_DATA,
    &OVERALL_ASSESSMENT,
];

// ═══════════════════════════════════════════════════════════
// Record parsing from bare strings
// ═══════════════════════════════════════════════════════════

fn record_of(pairs: &[(&str, Option<&str>)]) -> Map<String, Value> {
    pairs
        .iter()
        .filter_map(|(key, value)| {
            let value = (*value)?.trim();
            (!value.is_empty()).then(|| (key.to_string(), Value::String(value.to_string())))
        })
        .collect()
}

/// `"Alice (CTO)"` → `("Alice", Some("CTO"))`.
fn split_parenthetical(s: &str) -> (&str, Option<&str>) {
    let s = s.trim();
    if let (Some(open), true) = (s.find('('), s.ends_with(')')) {
        if open > 0 {
            return (&s[..open], Some(&s[open + 1..s.len() - 1]));
        }
    }
    (s, None)
}

/// `"Bridge exploit: funds at risk"` → `("Bridge exploit", Some("funds at risk"))`.
fn split_label(s: &str) -> (&str, Option<&str>) {
    match s.split_once(':') {
        Some((label, rest)) if !label.trim().is_empty() => (label, Some(rest)),
        _ => (s, None),
    }
}

fn person_from_text(s: &str) -> Map<String, Value> {
    let (name, role) = split_parenthetical(s);
    record_of(&[("name", Some(name)), ("role", role)])
}

fn partner_from_text(s: &str) -> Map<String, Value> {
    let (partner, kind) = split_parenthetical(s);
    record_of(&[("partner", Some(partner)), ("type", kind)])
}

fn distribution_from_text(s: &str) -> Map<String, Value> {
    let (category, share) = split_label(s);
    record_of(&[("category", Some(category)), ("percentage", share)])
}

fn risk_from_text(s: &str) -> Map<String, Value> {
    let (label, description) = split_label(s);
    record_of(&[("label", Some(label)), ("description", description)])
}

fn competitor_from_text(s: &str) -> Map<String, Value> {
    let (name, description) = split_label(s);
    record_of(&[("name", Some(name)), ("description", description)])
}

fn milestone_from_text(s: &str) -> Map<String, Value> {
    let (title, description) = split_label(s);
    record_of(&[("title", Some(title)), ("description", description)])
}

fn use_case_from_text(s: &str) -> Map<String, Value> {
    let (title, description) = split_label(s);
    record_of(&[("title", Some(title)), ("description", description)])
}

#[cfg(test)]
mod tests {
    use super::*;

    fn all_records() -> Vec<&'static RecordSchema> {
        let mut seen: Vec<&'static RecordSchema> = Vec::new();
        let mut queue: Vec<&'static RecordSchema> = DOCUMENT_SCHEMA.to_vec();
        while let Some(record) = queue.pop() {
            if seen.iter().any(|r| std::ptr::eq(*r, record)) {
                continue;
            }
            for field in record.fields {
                if let FieldKind::Records(nested) = field.kind {
                    queue.push(nested);
                }
            }
            seen.push(record);
        }
        seen
    }

    #[test]
    fn document_has_twelve_sections() {
        let names: Vec<_> = DOCUMENT_SCHEMA.iter().map(|s| s.name).collect();
        assert_eq!(names.len(), 12);
        assert_eq!(names[0], "executive_analysis");
        assert_eq!(names[11], "overall_assessment");
    }

    #[test]
    fn every_default_is_non_empty_and_valid() {
        for record in all_records() {
            for field in record.fields {
                match field.kind {
                    FieldKind::Text { default } => assert!(!default.trim().is_empty(), "{}", field.key),
                    FieldKind::TextList { placeholder } => assert!(!placeholder.trim().is_empty()),
                    FieldKind::TextMap { key, value } => {
                        assert!(!key.trim().is_empty() && !value.trim().is_empty())
                    }
                    FieldKind::Score { min, max, default } => {
                        assert!((min..=max).contains(&default), "{}", field.key)
                    }
                    FieldKind::Choice { allowed, default } => {
                        assert!(allowed.contains(&default), "{}", field.key)
                    }
                    FieldKind::Flag { .. } | FieldKind::Coordinate { .. } => {}
                    FieldKind::Records(_) => {}
                }
            }
        }
    }

    #[test]
    fn keys_are_unique_within_each_record() {
        for record in all_records() {
            let mut keys: Vec<_> = record.fields.iter().map(|f| f.key).collect();
            keys.sort_unstable();
            let before = keys.len();
            keys.dedup();
            assert_eq!(before, keys.len(), "duplicate key in {}", record.name);
        }
    }

    #[test]
    fn parses_people_and_partners_from_text() {
        let person = person_from_text("Satoshi Nakamoto (Founder)");
        assert_eq!(person["name"], "Satoshi Nakamoto");
        assert_eq!(person["role"], "Founder");

        let partner = partner_from_text("Chainlink");
        assert_eq!(partner["partner"], "Chainlink");
        assert!(!partner.contains_key("type"));
    }

    #[test]
    fn parses_labelled_text() {
        let risk = risk_from_text("Bridge exploit: funds held in escrow");
        assert_eq!(risk["label"], "Bridge exploit");
        assert_eq!(risk["description"], "funds held in escrow");

        let share = distribution_from_text("Team: 20%");
        assert_eq!(share["percentage"], "20%");
    }

    #[test]
    fn record_skips_absent_and_blank_values() {
        let record = record_of(&[("name", Some("  Ada ")), ("role", None), ("note", Some("  "))]);
        assert_eq!(record.len(), 1);
        assert_eq!(record["name"], "Ada");
    }
}
