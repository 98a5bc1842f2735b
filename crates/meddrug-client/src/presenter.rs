//! View models derived from the canonical result.
//!
//! Rendering code (the CLI, or any UI) consumes these and never looks at an
//! `AnalysisResult` facet directly. Everything here is a pure function of
//! its input.

use meddrug_common::models::{MAX_H_BOND_ACCEPTORS, MAX_H_BOND_DONORS, MAX_LOG_P, MAX_MOLECULAR_WEIGHT};
use meddrug_common::{
    AdmetCategory, AdmetProfile, AdmetSeverity, AdmetValue, AnalysisKind, AnalysisResult,
    BindingResult, DruglikenessProfile,
};
use serde::Serialize;

use crate::notify::{Notification, NotificationLevel};
use crate::session::{completion_note, SessionSnapshot, SessionState};

pub const NO_DATA_MARKER: &str = "No data available";
pub const NO_NARRATIVE_PLACEHOLDER: &str = "No AI analysis available yet. Ask a question to get started.";

// ── Drug-likeness ───────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RuleRow {
    pub name: &'static str,
    pub value: f64,
    pub limit: f64,
    pub unit: &'static str,
    pub within_limit: bool,
    pub description: &'static str,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DruglikenessView {
    pub passes: bool,
    pub verdict: &'static str,
    pub violations: u32,
    pub rows: Vec<RuleRow>,
}

impl DruglikenessView {
    pub fn from_profile(profile: &DruglikenessProfile) -> Self {
        let rule = |name, value: f64, limit: f64, unit, description| RuleRow {
            name,
            value,
            limit,
            unit,
            within_limit: value <= limit,
            description,
        };
        let rows = vec![
            rule(
                "Molecular Weight",
                profile.molecular_weight,
                MAX_MOLECULAR_WEIGHT,
                "g/mol",
                "Lipinski's rule states that molecules with MW > 500 may have poor absorption",
            ),
            rule(
                "LogP",
                profile.log_p,
                MAX_LOG_P,
                "",
                "Measure of lipophilicity. Molecules with LogP > 5 may have poor absorption",
            ),
            rule(
                "H-Bond Donors",
                f64::from(profile.h_bond_donors),
                f64::from(MAX_H_BOND_DONORS),
                "",
                "Number of hydrogen bond donors. Molecules with HBD > 5 may have poor absorption",
            ),
            rule(
                "H-Bond Acceptors",
                f64::from(profile.h_bond_acceptors),
                f64::from(MAX_H_BOND_ACCEPTORS),
                "",
                "Number of hydrogen bond acceptors. Molecules with HBA > 10 may have poor absorption",
            ),
        ];

        Self {
            passes: profile.passes,
            verdict: if profile.passes {
                "Passes Lipinski's Rule of Five"
            } else {
                "Does Not Pass Lipinski's Rule of Five"
            },
            violations: profile.rule_of_five_violations(),
            rows,
        }
    }
}

// ── Binding ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BindingStrength {
    Weak,
    Moderate,
    Strong,
}

impl BindingStrength {
    pub fn from_score(score: f64) -> Self {
        if score > 0.7 {
            BindingStrength::Strong
        } else if score > 0.4 {
            BindingStrength::Moderate
        } else {
            BindingStrength::Weak
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            BindingStrength::Weak => "Weak",
            BindingStrength::Moderate => "Moderate",
            BindingStrength::Strong => "Strong",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BindingView {
    /// Score as a percentage, clamped to [0, 100].
    pub percent: f64,
    pub strength: BindingStrength,
    pub target: String,
    pub caption: String,
    pub narrative: Option<String>,
}

impl BindingView {
    pub fn from_result(binding: &BindingResult) -> Self {
        let target = if binding.target.is_empty() { "target".to_string() } else { binding.target.clone() };
        Self {
            percent: (binding.score * 100.0).clamp(0.0, 100.0),
            strength: BindingStrength::from_score(binding.score),
            caption: format!("Binding prediction based on {target} interaction model"),
            target,
            narrative: binding.narrative.clone(),
        }
    }
}

/// Toast for a finished binding prediction; the level follows the band.
pub fn binding_notification(binding: &BindingResult) -> Notification {
    let view = BindingView::from_result(binding);
    match view.strength {
        BindingStrength::Strong => {
            Notification::success(format!("Strong binding affinity detected: {:.1}%", view.percent))
        }
        BindingStrength::Moderate => {
            Notification::new(NotificationLevel::Info, format!("Moderate binding affinity: {:.1}%", view.percent))
        }
        BindingStrength::Weak => Notification::warning(format!("Weak binding affinity: {:.1}%", view.percent)),
    }
}

/// Completion note for `AnalysisSession::with_completion_note`: binding-only
/// results get the banded toast, everything else the session's default.
pub fn analysis_notification(result: &AnalysisResult) -> Notification {
    match (result.kind, &result.binding) {
        (AnalysisKind::Binding, Some(binding)) => binding_notification(binding),
        _ => completion_note(result),
    }
}

// ── ADMET ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AdmetItemView {
    pub name: String,
    pub display_value: String,
    pub severity: AdmetSeverity,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AdmetSection {
    pub category: AdmetCategory,
    pub title: &'static str,
    pub items: Vec<AdmetItemView>,
    /// Set exactly when `items` is empty.
    pub placeholder: Option<&'static str>,
}

/// All five categories, in fixed order, whether or not they hold data.
pub fn admet_sections(profile: &AdmetProfile) -> Vec<AdmetSection> {
    AdmetCategory::ALL
        .iter()
        .map(|&category| {
            let items: Vec<AdmetItemView> = profile
                .category(category)
                .iter()
                .map(|p| AdmetItemView {
                    name: p.name.clone(),
                    display_value: format_admet_value(&p.value),
                    severity: p.severity,
                    description: p.description.clone(),
                })
                .collect();
            AdmetSection {
                category,
                title: category.title(),
                placeholder: items.is_empty().then_some(NO_DATA_MARKER),
                items,
            }
        })
        .collect()
}

pub fn format_admet_value(value: &AdmetValue) -> String {
    match value {
        AdmetValue::Number(n) => format!("{n:.2}"),
        AdmetValue::Text(s) => s.clone(),
    }
}

// ── Narrative ───────────────────────────────────────────────────────────────

/// Paragraphs of the narrative, or the placeholder when there is none.
pub fn narrative_paragraphs(narrative: Option<&str>) -> Vec<String> {
    let paragraphs: Vec<String> = narrative
        .unwrap_or_default()
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(String::from)
        .collect();
    if paragraphs.is_empty() {
        vec![NO_NARRATIVE_PLACEHOLDER.to_string()]
    } else {
        paragraphs
    }
}

// ── Dashboard ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardView {
    pub descriptor: String,
    pub target: Option<String>,
    pub model_variant: &'static str,
    pub druglikeness: Option<DruglikenessView>,
    pub binding: Option<BindingView>,
    pub admet: Option<Vec<AdmetSection>>,
    pub narrative: Vec<String>,
    pub recommendations: Vec<String>,
}

impl DashboardView {
    pub fn from_result(result: &AnalysisResult) -> Self {
        Self {
            descriptor: result.descriptor.to_string(),
            target: result.target.clone(),
            model_variant: result.model_variant.as_str(),
            druglikeness: result.druglikeness.as_ref().map(DruglikenessView::from_profile),
            binding: result.binding.as_ref().map(BindingView::from_result),
            admet: result.admet.as_ref().map(admet_sections),
            narrative: narrative_paragraphs(result.narrative.as_deref()),
            recommendations: result
                .ai_analysis
                .as_ref()
                .map(|a| a.recommendations.clone())
                .unwrap_or_default(),
        }
    }
}

/// Busy flags and error line for whatever is driving the session.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatusView {
    pub analysis_loading: bool,
    pub followup_loading: bool,
    pub error: Option<String>,
    pub dashboard: Option<DashboardView>,
}

impl StatusView {
    pub fn from_snapshot(snapshot: &SessionSnapshot) -> Self {
        Self {
            analysis_loading: snapshot.state == SessionState::Submitting,
            followup_loading: snapshot.state == SessionState::AskingFollowup,
            error: snapshot.last_error.as_ref().map(ToString::to_string),
            dashboard: snapshot.result.as_ref().map(DashboardView::from_result),
        }
    }
}
