//! Cheap script heuristic deciding between summarizing and translating.
//!
//! Not a language identifier: it only measures how much of the text is made
//! of CJK ideographs, and leans towards skipping translation.

/// Share of CJK ideographs above which text counts as target script
pub const CJK_THRESHOLD: f64 = 0.2;

fn is_cjk_ideograph(c: char) -> bool {
    ('\u{4E00}'..='\u{9FFF}').contains(&c)
}

/// Ratio of CJK Unified Ideographs to non-whitespace characters
pub fn cjk_ratio(text: &str) -> f64 {
    let mut total = 0usize;
    let mut cjk = 0usize;

    for c in text.chars().filter(|c| !c.is_whitespace()) {
        total += 1;
        if is_cjk_ideograph(c) {
            cjk += 1;
        }
    }

    if total == 0 {
        return 0.0;
    }
    cjk as f64 / total as f64
}

/// Whether the text is already in the target script family
pub fn is_target_script(text: &str) -> bool {
    cjk_ratio(text) > CJK_THRESHOLD
}
