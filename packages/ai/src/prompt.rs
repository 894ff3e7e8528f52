//! Retail-analyst prompt construction.

use retail_radar_analysis_models::ClusterBrief;

use crate::AiError;

/// Section headings the model is asked to cover, in order.
pub const SECTION_HEADINGS: [&str; 4] = [
    "Overall store density",
    "Cluster highlights",
    "Store type and size breakdown",
    "Suggestions for market opportunities",
];

const NO_POPULATION: &str = "No population data available";

/// Builds the prompt asking the model to analyze `briefs` around `address`.
///
/// `population_context` is a pre-rendered line such as
/// `Population data for Lagos: {...}`.
///
/// # Errors
///
/// Returns [`AiError::Json`] if the briefs cannot be serialized.
pub fn build_prompt(
    address: &str,
    briefs: &[ClusterBrief],
    population_context: Option<&str>,
) -> Result<String, AiError> {
    let clusters = serde_json::to_string_pretty(briefs)?;
    let population = population_context
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .unwrap_or(NO_POPULATION);

    let focus = SECTION_HEADINGS
        .iter()
        .map(|h| format!("- {h}"))
        .collect::<Vec<_>>()
        .join("\n");

    let prompt = format!(
        r#"You are a retail analyst AI.
Analyze the following clusters for {address}:
{clusters}

Population context:
{population}

Focus only on:
{focus}

Important:
- Do NOT say "more demographic data is needed" or "insufficient data".
- Use ONLY the clusters and population info provided above.
- Give clear, actionable insights even if the data is limited.
- Start each section with its heading on its own line, followed by a colon.
"#
    );

    log::debug!(
        "Built insight prompt for '{address}' with {} clusters ({} chars)",
        briefs.len(),
        prompt.len()
    );

    Ok(prompt)
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use retail_radar_store_models::{GeoPoint, SizeTier};

    use super::*;

    fn brief() -> ClusterBrief {
        ClusterBrief {
            id: 1,
            centroid: GeoPoint::new(6.5245, 3.3792),
            store_count: 3,
            types: BTreeMap::from([("bakery".to_string(), 2), ("supermarket".to_string(), 1)]),
            sizes: BTreeMap::from([(SizeTier::Medium, 2), (SizeTier::Large, 1)]),
        }
    }

    #[test]
    fn prompt_names_address_and_headings() {
        let prompt = build_prompt("Ikeja, Lagos", &[brief()], None).unwrap();
        assert!(prompt.starts_with("You are a retail analyst AI."));
        assert!(prompt.contains("Analyze the following clusters for Ikeja, Lagos:"));
        for heading in SECTION_HEADINGS {
            assert!(prompt.contains(&format!("- {heading}")), "missing {heading}");
        }
    }

    #[test]
    fn prompt_embeds_cluster_json() {
        let prompt = build_prompt("Ikeja", &[brief()], None).unwrap();
        assert!(prompt.contains("\"storeCount\": 3"));
        assert!(prompt.contains("\"bakery\": 2"));
        assert!(prompt.contains("\"large\": 1"));
    }

    #[test]
    fn population_context_or_placeholder() {
        let with = build_prompt("Ikeja", &[], Some("Population data for Lagos: {}")).unwrap();
        assert!(with.contains("Population context:\nPopulation data for Lagos: {}"));

        let without = build_prompt("Ikeja", &[], Some("   ")).unwrap();
        assert!(without.contains("Population context:\nNo population data available"));
    }
}
