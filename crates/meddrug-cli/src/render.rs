//! Plain-text rendering of presenter views.

use std::fmt;

use meddrug_client::presenter::{
    AdmetSection, BindingView, DashboardView, DruglikenessView, NO_NARRATIVE_PLACEHOLDER,
};
use meddrug_common::{AdmetSeverity, GeneratedMolecules};

const BAR_WIDTH: usize = 30;

pub struct Dashboard<'a>(pub &'a DashboardView);
pub struct Narrative<'a>(pub &'a [String]);
pub struct Generated<'a>(pub &'a GeneratedMolecules);

impl fmt::Display for Dashboard<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let view = self.0;
        writeln!(f, "Molecule: {}", view.descriptor)?;
        if let Some(target) = &view.target {
            writeln!(f, "Target:   {target} ({} model)", view.model_variant)?;
        }
        if let Some(d) = &view.druglikeness {
            druglikeness(f, d)?;
        }
        if let Some(b) = &view.binding {
            binding(f, b)?;
        }
        if let Some(sections) = &view.admet {
            admet(f, sections)?;
        }
        write!(f, "{}", Narrative(&view.narrative))?;
        if !view.recommendations.is_empty() {
            writeln!(f, "\nRecommendations")?;
            for r in &view.recommendations {
                writeln!(f, "  - {r}")?;
            }
        }
        Ok(())
    }
}

fn druglikeness(f: &mut fmt::Formatter<'_>, view: &DruglikenessView) -> fmt::Result {
    writeln!(f, "\nLipinski Rule Analysis")?;
    writeln!(f, "  {} ({} violation(s))", view.verdict, view.violations)?;
    for row in &view.rows {
        let mark = if row.within_limit { "ok" } else { "!!" };
        writeln!(
            f,
            "  [{mark}] {:<17} {:>8.1}{}  limit {}{}",
            row.name,
            row.value,
            unit(row.unit),
            row.limit,
            unit(row.unit),
        )?;
    }
    Ok(())
}

fn unit(u: &str) -> String {
    if u.is_empty() { String::new() } else { format!(" {u}") }
}

fn binding(f: &mut fmt::Formatter<'_>, view: &BindingView) -> fmt::Result {
    let filled = ((view.percent / 100.0) * BAR_WIDTH as f64).round() as usize;
    writeln!(f, "\nBinding Affinity to {}", view.target)?;
    writeln!(f, "  {:.1}% ({})", view.percent, view.strength.label())?;
    writeln!(f, "  [{}{}]", "#".repeat(filled), "-".repeat(BAR_WIDTH - filled))?;
    writeln!(f, "  {}", view.caption)?;
    if let Some(n) = &view.narrative {
        writeln!(f, "  {n}")?;
    }
    Ok(())
}

fn admet(f: &mut fmt::Formatter<'_>, sections: &[AdmetSection]) -> fmt::Result {
    writeln!(f, "\nADMET Profile")?;
    for section in sections {
        writeln!(f, "  {}", section.title)?;
        if let Some(placeholder) = section.placeholder {
            writeln!(f, "    {placeholder}")?;
            continue;
        }
        for item in &section.items {
            let tag = match item.severity {
                AdmetSeverity::Good => "good",
                AdmetSeverity::Moderate => "moderate",
                AdmetSeverity::Poor => "poor",
                AdmetSeverity::Info => "info",
            };
            write!(f, "    [{tag}] {}: {}", item.name, item.display_value)?;
            if !item.description.is_empty() {
                write!(f, "  ({})", item.description)?;
            }
            writeln!(f)?;
        }
    }
    Ok(())
}

impl fmt::Display for Narrative<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "\nAI Analysis")?;
        if self.0.is_empty() {
            return writeln!(f, "  {NO_NARRATIVE_PLACEHOLDER}");
        }
        for paragraph in self.0 {
            writeln!(f, "  {paragraph}")?;
        }
        Ok(())
    }
}

impl fmt::Display for Generated<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(message) = &self.0.message {
            writeln!(f, "{message}")?;
        }
        for (i, smiles) in self.0.molecules.iter().enumerate() {
            writeln!(f, "{:>3}. {smiles}", i + 1)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use meddrug_client::presenter::{admet_sections, NO_DATA_MARKER};
    use meddrug_common::{
        AdmetProfile, AnalysisKind, AnalysisResult, BindingResult, DruglikenessProfile,
        ModelVariant, MoleculeDescriptor,
    };

    fn aspirin() -> AnalysisResult {
        AnalysisResult {
            descriptor: MoleculeDescriptor::new("CC(=O)OC1=CC=CC=C1C(=O)O").unwrap(),
            target: Some("EGFR".to_string()),
            model_variant: ModelVariant::Cnn,
            kind: AnalysisKind::Full,
            druglikeness: Some(DruglikenessProfile::from_measurements(180.16, 1.19, 1, 4)),
            binding: Some(BindingResult { score: 0.83, target: "EGFR".to_string(), narrative: None }),
            admet: Some(AdmetProfile::default()),
            narrative: None,
            ai_analysis: None,
        }
    }

    #[test]
    fn test_dashboard_text_has_every_section() {
        let text = Dashboard(&DashboardView::from_result(&aspirin())).to_string();
        assert!(text.contains("Passes Lipinski's Rule of Five"));
        assert!(text.contains("83.0% (Strong)"));
        assert!(text.contains("Binding prediction based on EGFR interaction model"));
        assert_eq!(text.matches(NO_DATA_MARKER).count(), 5);
        assert!(text.contains(NO_NARRATIVE_PLACEHOLDER));
    }

    #[test]
    fn test_binding_bar_is_fixed_width() {
        let view = DashboardView::from_result(&aspirin());
        let text = Dashboard(&view).to_string();
        let bar = text.lines().find(|l| l.trim_start().starts_with('[') && l.contains('#')).unwrap();
        assert_eq!(bar.trim().len(), BAR_WIDTH + 2);
    }

    #[test]
    fn test_admet_sections_render_in_order() {
        let text = Dashboard(&DashboardView {
            admet: Some(admet_sections(&AdmetProfile::default())),
            ..DashboardView::from_result(&aspirin())
        })
        .to_string();
        let abs = text.find("Absorption").unwrap();
        let tox = text.find("Toxicity").unwrap();
        assert!(abs < tox);
    }

    #[test]
    fn test_generated_list_is_numbered() {
        let generated = GeneratedMolecules {
            molecules: vec!["CCO".to_string(), "CCN".to_string()],
            message: None,
        };
        assert_eq!(Generated(&generated).to_string(), "  1. CCO\n  2. CCN\n");
    }
}
