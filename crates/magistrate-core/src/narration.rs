//! Offense narration through a validated template table.
//!
//! Each offense category maps to a one-line template with named
//! placeholders; categories without an entry fall back to a generic
//! line. Templates are validated when loaded so a typo'd placeholder is
//! a configuration error, not a runtime artifact in player-facing text.

use std::collections::BTreeMap;

use thiserror::Error;

use magistrate_types::OffenseCategory;

/// Placeholders a template may use.
const PLACEHOLDERS: [&str; 3] = ["{offender}", "{victim}", "{location}"];

/// Errors from template configuration.
#[derive(Debug, Error)]
pub enum NarrationError {
    /// A template contains a brace sequence that is not a known
    /// placeholder.
    #[error("template for {category}: unknown placeholder {placeholder}")]
    UnknownPlaceholder {
        /// The offense category whose template is bad.
        category: OffenseCategory,
        /// The offending placeholder text.
        placeholder: String,
    },
}

/// Inputs for rendering one narration line.
#[derive(Debug, Clone, Copy)]
pub struct NarrationFacts<'a> {
    /// Offender display name.
    pub offender: &'a str,
    /// Victim display name, when there is one.
    pub victim: Option<&'a str>,
    /// Location display name.
    pub location: &'a str,
}

/// Validated per-category narration templates with a generic fallback.
#[derive(Debug, Clone, Default)]
pub struct NarrationTable {
    templates: BTreeMap<OffenseCategory, String>,
}

impl NarrationTable {
    /// Create an empty table; every category uses the fallback.
    pub fn new() -> Self {
        Self::default()
    }

    /// Install a template for a category.
    ///
    /// # Errors
    ///
    /// Returns [`NarrationError::UnknownPlaceholder`] when the template
    /// uses a brace sequence other than `{offender}`, `{victim}`, or
    /// `{location}`.
    pub fn set(&mut self, category: OffenseCategory, template: &str) -> Result<(), NarrationError> {
        validate_template(category, template)?;
        self.templates.insert(category, template.to_owned());
        Ok(())
    }

    /// Render the narration line for a crime.
    pub fn narrate(&self, category: OffenseCategory, facts: &NarrationFacts<'_>) -> String {
        self.templates.get(&category).map_or_else(
            || generic_line(category, facts),
            |template| render(template, facts),
        )
    }
}

fn render(template: &str, facts: &NarrationFacts<'_>) -> String {
    template
        .replace("{offender}", facts.offender)
        .replace("{victim}", facts.victim.unwrap_or("someone"))
        .replace("{location}", facts.location)
}

fn generic_line(category: OffenseCategory, facts: &NarrationFacts<'_>) -> String {
    match facts.victim {
        Some(victim) => format!(
            "{} committed {category} against {victim} at {}",
            facts.offender, facts.location
        ),
        None => format!("{} committed {category} at {}", facts.offender, facts.location),
    }
}

fn validate_template(category: OffenseCategory, template: &str) -> Result<(), NarrationError> {
    let mut rest = template;
    while let Some(start) = rest.find('{') {
        let Some(after) = rest.get(start..) else {
            break;
        };
        let Some(end) = after.find('}') else {
            return Err(NarrationError::UnknownPlaceholder {
                category,
                placeholder: after.to_owned(),
            });
        };
        let candidate = after.get(..=end).unwrap_or(after);
        if !PLACEHOLDERS.contains(&candidate) {
            return Err(NarrationError::UnknownPlaceholder {
                category,
                placeholder: candidate.to_owned(),
            });
        }
        rest = after.get(end.saturating_add(1)..).unwrap_or("");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn facts<'a>(victim: Option<&'a str>) -> NarrationFacts<'a> {
        NarrationFacts {
            offender: "Rald",
            victim,
            location: "the market square",
        }
    }

    #[test]
    fn template_renders_placeholders() {
        let mut table = NarrationTable::new();
        assert!(table
            .set(
                OffenseCategory::Theft,
                "{offender} picked {victim}'s pocket at {location}"
            )
            .is_ok());

        let line = table.narrate(OffenseCategory::Theft, &facts(Some("Mira")));
        assert_eq!(line, "Rald picked Mira's pocket at the market square");
    }

    #[test]
    fn missing_category_uses_generic_fallback() {
        let table = NarrationTable::new();
        let line = table.narrate(OffenseCategory::Vandalism, &facts(None));
        assert_eq!(line, "Rald committed vandalism at the market square");
    }

    #[test]
    fn victimless_generic_line_omits_victim() {
        let table = NarrationTable::new();
        let line = table.narrate(OffenseCategory::Trespass, &facts(Some("Mira")));
        assert!(line.contains("against Mira"));
    }

    #[test]
    fn unknown_placeholder_rejected_at_load() {
        let mut table = NarrationTable::new();
        let result = table.set(OffenseCategory::Theft, "{offender} stole the {item}");
        assert!(matches!(
            result,
            Err(NarrationError::UnknownPlaceholder { .. })
        ));
    }

    #[test]
    fn unclosed_brace_rejected_at_load() {
        let mut table = NarrationTable::new();
        assert!(table
            .set(OffenseCategory::Theft, "{offender stole a thing")
            .is_err());
    }
}
