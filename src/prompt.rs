//! Prompt synthesis for prompt-driven try-on providers.
//!
//! The prompt is assembled from a fixed photoshoot template, a
//! category-specific directive and a fit-specific directive. The negative
//! prompt is a fixed deny-list and does not depend on the inputs.

use crate::types::{FitPreference, GarmentCategory, Gender, PromptBundle};

const BASE_QUALITY: &str = "natural body proportions, soft studio lighting, \
high-detail fabric texture, natural skin tone, realistic shadows and reflections, \
seamless garment integration, preserve original background, realistic posture, \
8k photo, DSLR, shallow depth of field, editorial quality, \
fashion e-commerce photography style, photorealistic, perfect clothing fit, \
natural fabric draping, accurate color reproduction, professional model pose, \
clean composition, high resolution, detailed stitching, precise hemlines, \
proper garment placement, natural wrinkles and folds.";

const TOP_DIRECTIVE: &str = "Ensure perfect shoulder alignment, natural sleeve positioning, \
proper neckline fit, smooth fabric transition across chest and back, \
realistic button or zipper placement.";

const BOTTOM_DIRECTIVE: &str = "Remove existing lower-body clothing completely, \
apply only the new garment, ensure perfect alignment and natural drape of fabric \
around legs and waist, maintain proper proportions and seamless integration, \
realistic waistband positioning, natural leg line following, appropriate inseam length.";

const DRESS_DIRECTIVE: &str = "Replace entire outfit with the dress, \
ensure full coverage and proper fit, natural flow of fabric, \
appropriate length and proportions, elegant silhouette, \
smooth transitions from bodice to skirt, realistic dart placements.";

const UNDERGARMENT_DIRECTIVE: &str = "Subtle and tasteful representation, \
focus on fit and comfort, natural fabric adherence to body contours, appropriate coverage.";

const TIGHT_DIRECTIVE: &str = "Body-conscious silhouette, fabric follows natural curves closely, \
tailored appearance, structured fit lines.";

const LOOSE_DIRECTIVE: &str = "Comfortable drape, relaxed silhouette, casual styling, \
natural fabric flow with slight ease.";

/// Quality artifacts every generation should avoid.
pub const NEGATIVE_PROMPT: &str = "blurry, distorted body, double limbs, deformed hands, \
artifacts, incorrect lighting, cartoon, painting, AI-looking texture, unrealistic shadows, \
mismatched perspective, extra clothing layers, transparency, overexposure, bad anatomy, \
floating clothes, disconnected garments, unnatural poses, low quality, pixelated, watermark, \
clothing floating off body, impossible fabric physics, misaligned seams, \
distorted proportions, color bleeding, texture inconsistencies.";

fn subject_noun(gender: Gender) -> &'static str {
    match gender {
        Gender::Male => "man",
        Gender::Female => "woman",
        Gender::Unisex => "person",
    }
}

fn garment_description(category: GarmentCategory, gender: Gender) -> &'static str {
    match (category, gender) {
        (GarmentCategory::Top, _) => "upper-body clothing (shirt, t-shirt, blouse, jacket)",
        (GarmentCategory::Bottom, _) => "lower-body clothing (pants, jeans, skirt, shorts)",
        (GarmentCategory::Dress, _) => "full-body outfit (dress or gown)",
        (GarmentCategory::Undergarment, Gender::Male) => {
            "men's undergarment (briefs, boxers, undershirt)"
        }
        (GarmentCategory::Undergarment, _) => "women's undergarment (bra, panties, lingerie)",
    }
}

fn fit_description(fit: FitPreference) -> &'static str {
    match fit {
        FitPreference::Tight => "snug fit, body-hugging, tailored",
        FitPreference::Regular => "natural fit, balanced shape",
        FitPreference::Loose => "relaxed fit, slightly oversized",
    }
}

fn category_directive(category: GarmentCategory) -> &'static str {
    match category {
        GarmentCategory::Top => TOP_DIRECTIVE,
        GarmentCategory::Bottom => BOTTOM_DIRECTIVE,
        GarmentCategory::Dress => DRESS_DIRECTIVE,
        GarmentCategory::Undergarment => UNDERGARMENT_DIRECTIVE,
    }
}

fn fit_directive(fit: FitPreference) -> Option<&'static str> {
    match fit {
        FitPreference::Tight => Some(TIGHT_DIRECTIVE),
        FitPreference::Loose => Some(LOOSE_DIRECTIVE),
        FitPreference::Regular => None,
    }
}

/// Build the prompt pair for a subject/garment/fit combination.
///
/// Total and deterministic: every combination yields non-empty text, and
/// identical inputs always give identical output.
pub fn synthesize(
    gender: Gender,
    category: GarmentCategory,
    fit: FitPreference,
) -> PromptBundle {
    let mut lines = vec![
        format!(
            "professional fashion photoshoot of a {} wearing {}, realistic virtual try-on, {},",
            subject_noun(gender),
            garment_description(category, gender),
            fit_description(fit),
        ),
        BASE_QUALITY.to_string(),
        category_directive(category).to_string(),
    ];
    if let Some(directive) = fit_directive(fit) {
        lines.push(directive.to_string());
    }

    PromptBundle {
        prompt: lines.join("\n"),
        negative_prompt: NEGATIVE_PROMPT.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_combinations_non_empty() {
        let mut count = 0;
        for gender in Gender::ALL {
            for category in GarmentCategory::ALL {
                for fit in FitPreference::ALL {
                    let bundle = synthesize(gender, category, fit);
                    assert!(!bundle.prompt.trim().is_empty());
                    assert!(!bundle.negative_prompt.trim().is_empty());
                    count += 1;
                }
            }
        }
        assert_eq!(count, 36);
    }

    #[test]
    fn test_deterministic() {
        for gender in Gender::ALL {
            for category in GarmentCategory::ALL {
                for fit in FitPreference::ALL {
                    assert_eq!(
                        synthesize(gender, category, fit),
                        synthesize(gender, category, fit)
                    );
                }
            }
        }
    }

    #[test]
    fn test_bottom_removes_existing_clothing() {
        let bundle = synthesize(Gender::Female, GarmentCategory::Bottom, FitPreference::Regular);
        assert!(bundle.prompt.contains("Remove existing lower-body clothing completely"));
        assert!(bundle.prompt.contains("waistband"));
        assert!(bundle.prompt.contains("leg line"));
    }

    #[test]
    fn test_dress_replaces_outfit() {
        let bundle = synthesize(Gender::Unisex, GarmentCategory::Dress, FitPreference::Regular);
        assert!(bundle.prompt.contains("Replace entire outfit"));
        assert!(bundle.prompt.starts_with("professional fashion photoshoot of a person"));
    }

    #[test]
    fn test_undergarment_branches_on_gender() {
        let male = synthesize(Gender::Male, GarmentCategory::Undergarment, FitPreference::Regular);
        let female =
            synthesize(Gender::Female, GarmentCategory::Undergarment, FitPreference::Regular);
        assert!(male.prompt.contains("men's undergarment"));
        assert!(female.prompt.contains("women's undergarment"));
        assert_ne!(male.prompt, female.prompt);
    }

    #[test]
    fn test_fit_directives() {
        let tight = synthesize(Gender::Male, GarmentCategory::Top, FitPreference::Tight);
        let loose = synthesize(Gender::Male, GarmentCategory::Top, FitPreference::Loose);
        let regular = synthesize(Gender::Male, GarmentCategory::Top, FitPreference::Regular);
        assert!(tight.prompt.contains(TIGHT_DIRECTIVE));
        assert!(loose.prompt.contains(LOOSE_DIRECTIVE));
        assert!(!regular.prompt.contains(TIGHT_DIRECTIVE));
        assert!(!regular.prompt.contains(LOOSE_DIRECTIVE));
    }

    #[test]
    fn test_negative_prompt_is_fixed() {
        let a = synthesize(Gender::Male, GarmentCategory::Top, FitPreference::Tight);
        let b = synthesize(Gender::Female, GarmentCategory::Dress, FitPreference::Loose);
        assert_eq!(a.negative_prompt, b.negative_prompt);
        for term in ["bad anatomy", "floating clothes", "extra clothing layers", "watermark"] {
            assert!(a.negative_prompt.contains(term), "missing {}", term);
        }
    }
}
