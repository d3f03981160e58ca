//! Content-type classifier.
//!
//! Scores the normalized stream against one weighted lexicon per subject and
//! picks the dominant category. The lexicons target Uzbek-language school
//! material, so word patterns have no trailing boundary (suffixes attach).

use crate::model::DetectedCategory;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

/// Per-category scores for one stream.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CategoryScores {
    pub math: u32,
    pub physics: u32,
    pub chemistry: u32,
    pub biology: u32,
    pub literature: u32,
    pub history: u32,
    pub english: u32,
}

impl CategoryScores {
    /// Score for a category (`Generic` has none).
    pub fn get(&self, category: DetectedCategory) -> u32 {
        match category {
            DetectedCategory::Math => self.math,
            DetectedCategory::Physics => self.physics,
            DetectedCategory::Chemistry => self.chemistry,
            DetectedCategory::Biology => self.biology,
            DetectedCategory::Literature => self.literature,
            DetectedCategory::History => self.history,
            DetectedCategory::English => self.english,
            DetectedCategory::Generic => 0,
        }
    }

    /// Scored categories in tie-break order.
    fn ranked(&self) -> [(DetectedCategory, u32); 7] {
        [
            (DetectedCategory::Math, self.math),
            (DetectedCategory::Physics, self.physics),
            (DetectedCategory::Chemistry, self.chemistry),
            (DetectedCategory::Biology, self.biology),
            (DetectedCategory::Literature, self.literature),
            (DetectedCategory::History, self.history),
            (DetectedCategory::English, self.english),
        ]
    }

    /// Select the dominant category.
    ///
    /// Chemistry wins over math when both reach 3 and chemistry is not lower,
    /// since chemistry uses the same sub/superscript notation. Math wins
    /// outright at 5 or more while physics stays below 4. Otherwise the
    /// highest score wins, ties going to the earlier category.
    pub fn dominant(&self) -> DetectedCategory {
        let ranked = self.ranked();
        if ranked.iter().all(|(_, s)| *s == 0) {
            return DetectedCategory::Generic;
        }
        if self.chemistry >= 3 && self.math >= 3 && self.chemistry >= self.math {
            return DetectedCategory::Chemistry;
        }
        if self.math >= 5 && self.physics < 4 {
            return DetectedCategory::Math;
        }
        let mut best = ranked[0];
        for entry in &ranked[1..] {
            if entry.1 > best.1 {
                best = *entry;
            }
        }
        best.0
    }
}

struct Rule {
    category: DetectedCategory,
    weight: u32,
    pattern: Regex,
}

impl Rule {
    fn new(category: DetectedCategory, weight: u32, pattern: &str) -> Self {
        Self {
            category,
            weight,
            pattern: Regex::new(pattern).unwrap(),
        }
    }
}

static RULES: Lazy<Vec<Rule>> = Lazy::new(|| {
    use DetectedCategory::*;
    vec![
        Rule::new(Math, 5, r"\\(?:frac|sqrt|sum|int|prod|lim)\{"),
        Rule::new(Math, 3, r"\\\(|\$\$"),
        Rule::new(Math, 2, r"\\(?:mathbf|boldsymbol)\{"),
        Rule::new(Math, 2, r"\^\{.*?\}|_\{.*?\}"),
        Rule::new(Physics, 4, r"(?i)\b(?:m/s|km/h|m/s²|kg/m|kPa|MPa|kVt)"),
        Rule::new(
            Physics,
            3,
            r"(?i)\b(?:tezlik|tezlanish|energiya|quvvat|bosim|chastota|to'lqin|impuls|inertsiya)",
        ),
        Rule::new(Physics, 3, r"\b(?:Nyuton|Joul|Vatt|Amper|Volt|Paskal|Gerts|Faradey)"),
        Rule::new(Chemistry, 4, r"[A-Z][a-z]?(?:~\d+~|_\{?\d+\}?|\d+)[A-Z]"),
        Rule::new(
            Chemistry,
            3,
            r"(?i)\b(?:reaksiya|oksid|kislota|eritma|molekula|valentlik|molyar|g/mol)",
        ),
        Rule::new(Chemistry, 2, r"->|<->|→|⇌"),
        Rule::new(
            Biology,
            4,
            r"(?i)\b(?:hujayra|fotosintez|xlorofill|mitoz|meioz|genotip|fenotip|xromosoma)",
        ),
        Rule::new(
            Biology,
            3,
            r"(?i)\b(?:biologiya|anatomiya|fiziologiya|genetika|ekologiya|evolyutsiya|DNK|RNK)",
        ),
        Rule::new(
            History,
            4,
            r"(?i)\b(?:sulton|xalifa|imperator|podshoh|hukmdor|sulola|xonlik|saltanat|bosqin|istilo)",
        ),
        Rule::new(
            History,
            3,
            r"(?i)\b(?:asr|milod|eramiz|urush|jang|shartnoma|mustaqillik|qo'shin|lashkar)",
        ),
        Rule::new(
            History,
            3,
            r"\b(?:Mo'g'ul|Temur|Saljuq|Rim\b|Arab|Turkiston|Buxoro|Samarqand|Xorazm)",
        ),
        Rule::new(
            Literature,
            4,
            r"(?i)\b(?:she'r|roman|qissa|hikoya|doston|yozuvchi|shoir|asar|badiiy)",
        ),
        Rule::new(
            Literature,
            3,
            r"(?i)\b(?:fe'l|sifat|ravish|kesim|bo'lak|turkum|undov|kelishik|imlo)",
        ),
        Rule::new(
            Literature,
            3,
            r"(?i)\b(?:to'g'ri yozilgan|noto'g'ri yozilgan|qo'shimcha|gap bo'laklari)",
        ),
        Rule::new(
            English,
            4,
            r"(?i)\b(?:Choose|correct|answer|sentence|which|following|grammar|tense)\b",
        ),
        Rule::new(
            English,
            3,
            r"\b(?:Present|Past|Future|Simple|Continuous|Perfect|Passive|Active)\b",
        ),
        Rule::new(
            English,
            3,
            r"(?i)\b(?:noun|verb|adjective|adverb|preposition|pronoun|article)\b",
        ),
        Rule::new(
            English,
            2,
            r"(?i)\b(?:Fill in|gaps?|blanks?|underlined|appropriate)\b",
        ),
    ]
});

static BLANKS: Lazy<Regex> = Lazy::new(|| Regex::new(r"\\_\\_|_{3,}").unwrap());
static ENGLISH_FUNCTION_WORDS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(?:she|he|they|we|it|the|was|were|has|had|did|does|my|his|her)\b").unwrap()
});

/// Score a stream against every lexicon.
pub fn score(text: &str) -> CategoryScores {
    let mut scores = CategoryScores::default();
    for rule in RULES.iter() {
        if !rule.pattern.is_match(text) {
            continue;
        }
        let slot = match rule.category {
            DetectedCategory::Math => &mut scores.math,
            DetectedCategory::Physics => &mut scores.physics,
            DetectedCategory::Chemistry => &mut scores.chemistry,
            DetectedCategory::Biology => &mut scores.biology,
            DetectedCategory::Literature => &mut scores.literature,
            DetectedCategory::History => &mut scores.history,
            DetectedCategory::English => &mut scores.english,
            DetectedCategory::Generic => continue,
        };
        *slot += rule.weight;
    }
    // fill-in-the-blank items with English function words
    if BLANKS.is_match(text) && ENGLISH_FUNCTION_WORDS.is_match(text) {
        scores.english += 5;
    }
    scores
}

/// Classify a stream.
pub fn classify(text: &str) -> DetectedCategory {
    score(text).dominant()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_zero_is_generic() {
        assert_eq!(classify("1) Savol A) bir B) ikki"), DetectedCategory::Generic);
    }

    #[test]
    fn test_math() {
        let text = "1) \\(\\frac{1}{2}\\) ni hisoblang A) 1 B) 2";
        let scores = score(text);
        assert_eq!(scores.math, 8);
        assert_eq!(classify(text), DetectedCategory::Math);
    }

    #[test]
    fn test_chemistry_over_math() {
        // math 3 (delimiters) + 2 (braced script) = 5, chemistry 4 + 3 = 7
        let text = "H_2O molekula \\(Ca^{2+}\\)";
        let scores = score(text);
        assert_eq!(scores.math, 5);
        assert_eq!(scores.chemistry, 7);
        assert_eq!(classify(text), DetectedCategory::Chemistry);
    }

    #[test]
    fn test_math_beats_lower_chemistry() {
        // math 5 + 3, chemistry 3
        let text = "\\(\\sqrt{2}\\) kislota";
        assert_eq!(classify(text), DetectedCategory::Math);
    }

    #[test]
    fn test_physics_blocks_math_priority() {
        // math 5 + 3, physics 4 + 3 + 3
        let text = "\\(\\frac{s}{t}\\) tezlik 5 m/s Nyuton";
        let scores = score(text);
        assert_eq!(scores.math, 8);
        assert_eq!(scores.physics, 10);
        assert_eq!(classify(text), DetectedCategory::Physics);
    }

    #[test]
    fn test_history_and_literature() {
        assert_eq!(
            classify("Amir Temur qaysi asrda yashagan? Sulton"),
            DetectedCategory::History
        );
        assert_eq!(
            classify("Qaysi shoir bu she'r muallifi?"),
            DetectedCategory::Literature
        );
    }

    #[test]
    fn test_english_blanks() {
        let scores = score("She ___ to school yesterday.");
        assert_eq!(scores.english, 5);
    }

    #[test]
    fn test_tie_prefers_earlier_category() {
        let scores = CategoryScores {
            biology: 4,
            history: 4,
            ..Default::default()
        };
        assert_eq!(scores.dominant(), DetectedCategory::Biology);
    }
}
