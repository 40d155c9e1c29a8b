//! Display category guessed from a fund name.
//!
//! Purely cosmetic: the contract has no notion of categories.

const RULES: &[(&str, &[&str])] = &[
    ("Tech", &["tech", "software", "ai", "app"]),
    ("Charity", &["charity", "help", "poor", "assist"]),
    ("Creative", &["art", "music", "creative", "film"]),
    ("Environment", &["tree", "nature", "green", "earth"]),
];

const FALLBACK: &str = "Environment";

/// First matching category wins. Keywords of three letters or fewer must
/// match a whole word ("ai" should not hit "rain"); longer ones match
/// anywhere in the name.
pub fn categorize(name: &str) -> &'static str {
    let lower = name.to_lowercase();
    let words: Vec<&str> = lower
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .collect();

    RULES
        .iter()
        .find(|(_, keywords)| {
            keywords.iter().any(|kw| {
                if kw.len() <= 3 {
                    words.contains(kw)
                } else {
                    lower.contains(kw)
                }
            })
        })
        .map(|(category, _)| *category)
        .unwrap_or(FALLBACK)
}
