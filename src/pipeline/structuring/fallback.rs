//! The degraded document returned when no attempt yielded usable JSON.

use std::collections::BTreeMap;

use crate::models::analysis::*;
use crate::models::enums::{Likelihood, MilestoneStatus, Recommendation, Severity};

const FAILED: &str = "Analysis could not be completed";
const RETRY_HINT: &str = "Analysis could not be completed. Please try again.";
const UNKNOWN: &str = "Unknown";

fn failed_list() -> Vec<String> {
    vec![FAILED.to_string()]
}

fn failed_risk() -> RiskItem {
    RiskItem {
        label: "Analysis failure".into(),
        description: FAILED.into(),
        severity: Severity::High,
        likelihood: Likelihood::High,
    }
}

fn failed_milestone() -> Milestone {
    Milestone {
        phase: UNKNOWN.into(),
        title: UNKNOWN.into(),
        description: FAILED.into(),
        timeline: UNKNOWN.into(),
        status: MilestoneStatus::Planned,
    }
}

fn failed_member() -> TeamMember {
    TeamMember {
        name: UNKNOWN.into(),
        role: UNKNOWN.into(),
        experience: FAILED.into(),
        linkedin: "Not available".into(),
    }
}

fn node(id: &str) -> DiagramNode {
    DiagramNode {
        id: id.into(),
        label: FAILED.into(),
        kind: "error".into(),
    }
}

fn connection() -> DiagramConnection {
    DiagramConnection {
        source: "error".into(),
        target: "error".into(),
        label: FAILED.into(),
    }
}

/// A complete document stating that analysis failed, with every score at
/// its minimum and the most conservative recommendation.
///
/// Deterministic, and unchanged by normalization.
pub fn fallback_document() -> AnalysisDocument {
    AnalysisDocument {
        executive_analysis: ExecutiveAnalysis {
            project_name: UNKNOWN.into(),
            tagline: FAILED.into(),
            core_value_proposition: RETRY_HINT.into(),
            target_problem: FAILED.into(),
            solution_approach: FAILED.into(),
            market_positioning: FAILED.into(),
            competitive_moat: FAILED.into(),
        },
        technical_deep_dive: TechnicalDeepDive {
            architecture_overview: FAILED.into(),
            design_patterns: failed_list(),
            consensus_mechanism: UNKNOWN.into(),
            consensus_details: FAILED.into(),
            smart_contract_functionality: FAILED.into(),
            smart_contract_limitations: FAILED.into(),
            scalability_solutions: failed_list(),
            security_measures: failed_list(),
            audit_status: UNKNOWN.into(),
            interoperability: FAILED.into(),
            technical_innovation_score: 1,
            innovation_justification: FAILED.into(),
        },
        tokenomics: TokenomicsBreakdown {
            token_name: UNKNOWN.into(),
            token_symbol: UNKNOWN.into(),
            total_supply: UNKNOWN.into(),
            utility: failed_list(),
            distribution: vec![TokenDistribution {
                category: UNKNOWN.into(),
                percentage: UNKNOWN.into(),
                vesting: UNKNOWN.into(),
            }],
            inflation_mechanism: FAILED.into(),
            deflation_mechanism: FAILED.into(),
            economic_sustainability: FAILED.into(),
            flow_nodes: vec![node("error")],
            flow_connections: vec![connection()],
        },
        risk_analysis: RiskAnalysis {
            technical_risks: vec![failed_risk()],
            market_risks: vec![failed_risk()],
            team_execution_risks: vec![failed_risk()],
            overall_risk_level: Severity::Critical,
        },
        competitive_landscape: CompetitiveLandscape {
            direct_competitors: vec![Competitor {
                name: UNKNOWN.into(),
                description: FAILED.into(),
                strengths: failed_list(),
                weaknesses: failed_list(),
            }],
            feature_comparisons: vec![FeatureComparison {
                feature: UNKNOWN.into(),
                project_score: "N/A".into(),
                competitor_scores: BTreeMap::from([(UNKNOWN.to_string(), "N/A".to_string())]),
            }],
            technology_differentiation: FAILED.into(),
            alternative_approaches: failed_list(),
        },
        technology_alternatives: TechnologyAlternatives {
            current_tech_stack: failed_list(),
            why_chosen: FAILED.into(),
            alternatives: failed_list(),
            tradeoffs: FAILED.into(),
            emerging_disruptions: failed_list(),
            is_optimal: false,
            optimization_reasoning: FAILED.into(),
        },
        roadmap: RoadmapAnalysis {
            past_achievements: vec![failed_milestone()],
            current_phase: UNKNOWN.into(),
            future_milestones: vec![failed_milestone()],
            critical_path: failed_list(),
            roadmap_risk: FAILED.into(),
        },
        team_partnerships: TeamPartnerships {
            team_members: vec![failed_member()],
            advisors: vec![failed_member()],
            partnerships: vec![Partnership {
                partner: UNKNOWN.into(),
                kind: UNKNOWN.into(),
                significance: FAILED.into(),
            }],
            community_size: UNKNOWN.into(),
            community_engagement: FAILED.into(),
        },
        use_cases_adoption: UseCasesAdoption {
            primary_use_cases: vec![UseCase {
                title: UNKNOWN.into(),
                description: FAILED.into(),
                example: FAILED.into(),
            }],
            target_segments: failed_list(),
            adoption_barriers: failed_list(),
            network_effects: FAILED.into(),
            traction_evidence: failed_list(),
        },
        financial_analysis: FinancialAnalysis {
            funding_raised: UNKNOWN.into(),
            funding_allocation: BTreeMap::from([("Error".to_string(), FAILED.to_string())]),
            revenue_model: FAILED.into(),
            token_value_drivers: failed_list(),
            bull_case: FAILED.into(),
            bear_case: FAILED.into(),
        },
        visualization_data: VisualizationData {
            tech_stack_nodes: vec![node("error")],
            tech_stack_connections: vec![connection()],
            risk_radar: vec![RadarDataPoint {
                dimension: "Analysis Risk".into(),
                score: 0,
            }],
            competitive_matrix_x_axis: "Decentralization".into(),
            competitive_matrix_y_axis: "Scalability".into(),
            competitive_plots: vec![CompetitorPlot {
                name: UNKNOWN.into(),
                x: 0.0,
                y: 0.0,
            }],
        },
        overall_assessment: OverallAssessment {
            innovation_score: 1,
            technical_viability: 1,
            team_capability: 1,
            market_opportunity: 1,
            risk_adjusted_rating: 1,
            investment_recommendation: Recommendation::Avoid,
            recommendation_justification: RETRY_HINT.into(),
        },
    }
}
