//! Leaf label text and placement.

use std::f64::consts::PI;

use serde::Serialize;

use crate::tree::Polar;

const ELLIPSIS: char = '…';

/// Gap in pixels between a node circle and its label.
pub const LABEL_OFFSET: f64 = 4.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TextAnchor {
    Start,
    End,
}

/// A positioned label. `rotation` is in degrees about `(x, y)`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LabelPrimitive {
    pub text: String,
    pub x: f64,
    pub y: f64,
    pub anchor: TextAnchor,
    pub rotation: f64,
}

fn prefix(text: &str, chars: usize) -> String {
    text.chars().take(chars).collect()
}

/// Display form of a label truncated to `budget` characters.
///
/// Underscores read as spaces. Long binomials shorten in steps:
/// `Genus species…`, then `G. species`, then `G. spe…`; the genus and the
/// start of the species epithet survive longer than anything after them.
pub fn truncate_label(name: &str, budget: usize) -> String {
    let display = name.replace('_', " ").split_whitespace().collect::<Vec<_>>().join(" ");
    if display.chars().count() <= budget {
        return display;
    }
    if budget == 0 {
        return String::new();
    }

    let tokens: Vec<&str> = display.split(' ').collect();
    if let [genus, species, rest @ ..] = tokens.as_slice() {
        let binomial = format!("{genus} {species}");
        if binomial.chars().count() < budget {
            return format!("{binomial}{ELLIPSIS}");
        }

        let initial = genus.chars().next().unwrap_or_default();
        let abbreviated = if rest.is_empty() {
            format!("{initial}. {species}")
        } else {
            format!("{initial}. {species}{ELLIPSIS}")
        };
        if abbreviated.chars().count() <= budget {
            return abbreviated;
        }

        // "G. " plus at least one epithet character plus the ellipsis
        if budget >= 5 {
            return format!("{initial}. {}{ELLIPSIS}", prefix(species, budget - 4));
        }
    }

    format!("{}{ELLIPSIS}", prefix(&display, budget - 1))
}

/// Label to the right of a rectangular leaf.
pub fn rectangular_label(text: String, cx: f64, cy: f64, node_radius: f64) -> LabelPrimitive {
    LabelPrimitive {
        text,
        x: cx + node_radius + LABEL_OFFSET,
        y: cy,
        anchor: TextAnchor::Start,
        rotation: 0.0,
    }
}

/// Label continuing outward along a radial leaf's ray. Labels on the left
/// half are flipped so they never read upside down.
pub fn radial_label(
    text: String,
    center: (f64, f64),
    polar: Polar,
    node_radius: f64,
) -> LabelPrimitive {
    let anchor_point = Polar {
        angle: polar.angle,
        radius: polar.radius + node_radius + LABEL_OFFSET,
    };
    let (dx, dy) = anchor_point.to_cartesian();

    let angle = polar.angle.rem_euclid(2.0 * PI);
    // Screen direction of the ray, 0 degrees pointing right
    let mut rotation = angle.to_degrees() - 90.0;
    let anchor = if angle > PI {
        rotation -= 180.0;
        TextAnchor::End
    } else {
        TextAnchor::Start
    };

    LabelPrimitive {
        text,
        x: center.0 + dx,
        y: center.1 + dy,
        anchor,
        rotation,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_labels_are_untouched() {
        assert_eq!(truncate_label("Homo_sapiens", 36), "Homo sapiens");
        assert_eq!(truncate_label("Ath", 3), "Ath");
    }

    #[test]
    fn test_binomial_kept_before_infraspecific_names() {
        assert_eq!(
            truncate_label("Brassica_rapa_subsp_chinensis", 16),
            "Brassica rapa…"
        );
    }

    #[test]
    fn test_genus_abbreviated_before_epithet() {
        assert_eq!(truncate_label("Arabidopsis thaliana", 14), "A. thaliana");
        assert_eq!(truncate_label("Arabidopsis thaliana Col-0", 14), "A. thaliana…");
    }

    #[test]
    fn test_epithet_prefix_survives_tight_budget() {
        let label = truncate_label("Solanum lycopersicum", 9);
        assert_eq!(label, "S. lycop…");
        assert_eq!(label.chars().count(), 9);
    }

    #[test]
    fn test_single_token_and_tiny_budgets() {
        assert_eq!(truncate_label("Saccharomycetaceae", 8), "Sacchar…");
        assert_eq!(truncate_label("Homo sapiens", 3), "Ho…");
        assert_eq!(truncate_label("Homo sapiens", 1), "…");
        assert_eq!(truncate_label("Homo sapiens", 0), "");
    }

    #[test]
    fn test_truncation_respects_budget() {
        let names = [
            "Homo_sapiens",
            "Brassica_napus_var_napobrassica",
            "Arabidopsis_thaliana",
            "Escherichia_coli_str_K-12_substr_MG1655",
            "Zea_mays",
            "Saccharomyces",
        ];
        for name in names {
            for budget in 0..40 {
                let label = truncate_label(name, budget);
                assert!(
                    label.chars().count() <= budget,
                    "{name:?} at budget {budget} gave {label:?}"
                );
            }
        }
    }

    #[test]
    fn test_radial_label_flips_on_left_half() {
        let right = radial_label("A".into(), (100.0, 100.0), Polar { angle: PI / 2.0, radius: 50.0 }, 2.0);
        assert_eq!(right.anchor, TextAnchor::Start);
        assert!(right.rotation.abs() < 1e-9);
        assert!((right.x - 156.0).abs() < 1e-9, "x was {}", right.x);
        assert!((right.y - 100.0).abs() < 1e-9);

        let left = radial_label("B".into(), (100.0, 100.0), Polar { angle: 1.5 * PI, radius: 50.0 }, 2.0);
        assert_eq!(left.anchor, TextAnchor::End);
        assert!(left.rotation.abs() < 1e-9, "rotation was {}", left.rotation);
        assert!((left.x - 44.0).abs() < 1e-9, "x was {}", left.x);
    }

    #[test]
    fn test_rectangular_label_sits_right_of_node() {
        let label = rectangular_label("C".into(), 300.0, 40.0, 5.0);
        assert_eq!(label.x, 309.0);
        assert_eq!(label.y, 40.0);
        assert_eq!(label.anchor, TextAnchor::Start);
    }
}
