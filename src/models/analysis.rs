//! The twelve-section analysis report produced for every completed task.
//!
//! These types are the externally visible shape. They are only ever built
//! by the normalizer or the fallback generator, so every field is populated.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::enums::{Likelihood, MilestoneStatus, Recommendation, Severity};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisDocument {
    pub executive_analysis: ExecutiveAnalysis,
    pub technical_deep_dive: TechnicalDeepDive,
    pub tokenomics: TokenomicsBreakdown,
    pub risk_analysis: RiskAnalysis,
    pub competitive_landscape: CompetitiveLandscape,
    pub technology_alternatives: TechnologyAlternatives,
    pub roadmap: RoadmapAnalysis,
    pub team_partnerships: TeamPartnerships,
    pub use_cases_adoption: UseCasesAdoption,
    pub financial_analysis: FinancialAnalysis,
    pub visualization_data: VisualizationData,
    pub overall_assessment: OverallAssessment,
}

// ═══════════════════════════════════════════════════════════
// Narrative sections
// ═══════════════════════════════════════════════════════════

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutiveAnalysis {
    pub project_name: String,
    pub tagline: String,
    pub core_value_proposition: String,
    pub target_problem: String,
    pub solution_approach: String,
    pub market_positioning: String,
    pub competitive_moat: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TechnicalDeepDive {
    pub architecture_overview: String,
    pub design_patterns: Vec<String>,
    pub consensus_mechanism: String,
    pub consensus_details: String,
    pub smart_contract_functionality: String,
    pub smart_contract_limitations: String,
    pub scalability_solutions: Vec<String>,
    pub security_measures: Vec<String>,
    pub audit_status: String,
    pub interoperability: String,
    /// 1–10.
    pub technical_innovation_score: u8,
    pub innovation_justification: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TechnologyAlternatives {
    pub current_tech_stack: Vec<String>,
    pub why_chosen: String,
    pub alternatives: Vec<String>,
    pub tradeoffs: String,
    pub emerging_disruptions: Vec<String>,
    pub is_optimal: bool,
    pub optimization_reasoning: String,
}

// ═══════════════════════════════════════════════════════════
// Token economics
// ═══════════════════════════════════════════════════════════

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TokenomicsBreakdown {
    pub token_name: String,
    pub token_symbol: String,
    pub total_supply: String,
    pub utility: Vec<String>,
    pub distribution: Vec<TokenDistribution>,
    pub inflation_mechanism: String,
    pub deflation_mechanism: String,
    pub economic_sustainability: String,
    pub flow_nodes: Vec<DiagramNode>,
    pub flow_connections: Vec<DiagramConnection>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TokenDistribution {
    pub category: String,
    pub percentage: String,
    pub vesting: String,
}

// ═══════════════════════════════════════════════════════════
// Risk register
// ═══════════════════════════════════════════════════════════

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskAnalysis {
    pub technical_risks: Vec<RiskItem>,
    pub market_risks: Vec<RiskItem>,
    pub team_execution_risks: Vec<RiskItem>,
    pub overall_risk_level: Severity,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskItem {
    pub label: String,
    pub description: String,
    pub severity: Severity,
    pub likelihood: Likelihood,
}

// ═══════════════════════════════════════════════════════════
// Market position
// ═══════════════════════════════════════════════════════════

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompetitiveLandscape {
    pub direct_competitors: Vec<Competitor>,
    pub feature_comparisons: Vec<FeatureComparison>,
    pub technology_differentiation: String,
    pub alternative_approaches: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Competitor {
    pub name: String,
    pub description: String,
    pub strengths: Vec<String>,
    pub weaknesses: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureComparison {
    pub feature: String,
    pub project_score: String,
    pub competitor_scores: BTreeMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UseCasesAdoption {
    pub primary_use_cases: Vec<UseCase>,
    pub target_segments: Vec<String>,
    pub adoption_barriers: Vec<String>,
    pub network_effects: String,
    pub traction_evidence: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UseCase {
    pub title: String,
    pub description: String,
    pub example: String,
}

// ═══════════════════════════════════════════════════════════
// Roadmap and people
// ═══════════════════════════════════════════════════════════

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoadmapAnalysis {
    pub past_achievements: Vec<Milestone>,
    pub current_phase: String,
    pub future_milestones: Vec<Milestone>,
    pub critical_path: Vec<String>,
    pub roadmap_risk: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Milestone {
    pub phase: String,
    pub title: String,
    pub description: String,
    pub timeline: String,
    pub status: MilestoneStatus,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TeamPartnerships {
    pub team_members: Vec<TeamMember>,
    pub advisors: Vec<TeamMember>,
    pub partnerships: Vec<Partnership>,
    pub community_size: String,
    pub community_engagement: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TeamMember {
    pub name: String,
    pub role: String,
    pub experience: String,
    pub linkedin: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Partnership {
    pub partner: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub significance: String,
}

// ═══════════════════════════════════════════════════════════
// Financials and scorecard
// ═══════════════════════════════════════════════════════════

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FinancialAnalysis {
    pub funding_raised: String,
    pub funding_allocation: BTreeMap<String, String>,
    pub revenue_model: String,
    pub token_value_drivers: Vec<String>,
    pub bull_case: String,
    pub bear_case: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OverallAssessment {
    pub innovation_score: u8,
    pub technical_viability: u8,
    pub team_capability: u8,
    pub market_opportunity: u8,
    pub risk_adjusted_rating: u8,
    pub investment_recommendation: Recommendation,
    pub recommendation_justification: String,
}

// ═══════════════════════════════════════════════════════════
// Chart payloads
// ═══════════════════════════════════════════════════════════

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VisualizationData {
    pub tech_stack_nodes: Vec<DiagramNode>,
    pub tech_stack_connections: Vec<DiagramConnection>,
    pub risk_radar: Vec<RadarDataPoint>,
    pub competitive_matrix_x_axis: String,
    pub competitive_matrix_y_axis: String,
    pub competitive_plots: Vec<CompetitorPlot>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiagramNode {
    pub id: String,
    pub label: String,
    #[serde(rename = "type")]
    pub kind: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiagramConnection {
    pub source: String,
    pub target: String,
    pub label: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RadarDataPoint {
    pub dimension: String,
    /// 0–10.
    pub score: u8,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompetitorPlot {
    pub name: String,
    pub x: f64,
    pub y: f64,
}
