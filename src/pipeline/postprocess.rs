//! Subject-specific rewriting of restored text.
//!
//! Chemistry and physics/math documents often carry formula fragments typed
//! as plain text with script markers (`H_2O`, `Ca^{2+}`, `v_0`). These are
//! wrapped in math delimiters and split spans are merged. Every rewrite is
//! repeated until the text stops changing, so applying it twice is a no-op.

use crate::model::DetectedCategory;
use once_cell::sync::Lazy;
use regex::{Captures, Regex};

const MAX_PASSES: usize = 8;

static MATH_SPAN: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s)\\\(.*?\\\)").unwrap());

static CHEMISTRY_RUN: Lazy<Regex> = Lazy::new(|| Regex::new(r"[A-Za-z0-9()\[\]{}_^+\-]+").unwrap());
static NOTATION_RUN: Lazy<Regex> = Lazy::new(|| Regex::new(r"[A-Za-z0-9(){}_^+\-=/]+").unwrap());
static SCRIPT_SHAPE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[A-Za-z0-9)}\]][_^][A-Za-z0-9{+\-]").unwrap());
static ELECTRON_SHELL: Lazy<Regex> = Lazy::new(|| Regex::new(r"\d[spdf]\^").unwrap());
static HYPHEN_SUFFIX: Lazy<Regex> = Lazy::new(|| Regex::new(r"-[a-z]+$").unwrap());

static ADJACENT_SPANS: Lazy<Regex> = Lazy::new(|| Regex::new(r"\\\)[ \t]*\\\(").unwrap());

const OPERATORS: &str = r"\+|-|=|×|·|∙|÷|≈|≠|≤|≥|\\cdot|\\times|\\div|\\approx|\\neq|\\leq|\\geq";
const PRODUCT_OPERATORS: &str = r"×|·|∙|÷|\\cdot|\\times|\\div";

static OPERATOR_BETWEEN_SPANS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(r"\\\)[ \t]*({})[ \t]*\\\(", OPERATORS)).unwrap()
});
static NUMBER_BEFORE_SPAN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(r"(^|[\s(])(\d+(?:[.,]\d+)?)[ \t]*({})[ \t]*\\\(", OPERATORS)).unwrap()
});
static SPAN_BEFORE_NUMBER: Lazy<Regex> = Lazy::new(|| {
    let pattern = format!(r"\\\)[ \t]*({})[ \t]*(\d+(?:[.,]\d+)*)(\W|$)", PRODUCT_OPERATORS);
    Regex::new(&pattern).unwrap()
});
static ELEMENT_COUNT: Lazy<Regex> = Lazy::new(|| Regex::new(r"[A-Z][a-z]?\d+").unwrap());

/// Apply the rewrites for `category` until the text is stable.
pub fn post_process(text: &str, category: DetectedCategory) -> String {
    let pass: fn(&str) -> String = match category {
        DetectedCategory::Chemistry => chemistry_pass,
        DetectedCategory::Physics | DetectedCategory::Math => notation_pass,
        _ => return text.to_string(),
    };
    let mut current = text.to_string();
    for _ in 0..MAX_PASSES {
        let next = pass(&current);
        if next == current {
            break;
        }
        current = next;
    }
    current
}

fn chemistry_pass(text: &str) -> String {
    let text = map_outside_math(text, |gap| {
        let gap = collapse_repeated_units(gap)
            .replace("&lt;-&gt;", "⇌")
            .replace("<->", "⇌")
            .replace("-&gt;", "→")
            .replace("->", "→");
        wrap_runs(&gap, &CHEMISTRY_RUN, |core| {
            SCRIPT_SHAPE.is_match(core)
                && (core.chars().any(|c| c.is_ascii_uppercase()) || ELECTRON_SHELL.is_match(core))
        })
    });
    ADJACENT_SPANS.replace_all(&text, " ").into_owned()
}

fn notation_pass(text: &str) -> String {
    let text = map_outside_math(text, |gap| {
        wrap_runs(gap, &NOTATION_RUN, |core| SCRIPT_SHAPE.is_match(core))
    });
    let text = OPERATOR_BETWEEN_SPANS.replace_all(&text, |caps: &Captures| {
        format!(" {} ", latex_operator(&caps[1]))
    });
    let text = SPAN_BEFORE_NUMBER.replace_all(&text, |caps: &Captures| {
        format!(" {} {}\\){}", latex_operator(&caps[1]), &caps[2], &caps[3])
    });
    let text = NUMBER_BEFORE_SPAN.replace_all(&text, |caps: &Captures| {
        format!("{}\\({} {} ", &caps[1], &caps[2], latex_operator(&caps[3]))
    });
    ADJACENT_SPANS.replace_all(&text, " ").into_owned()
}

fn latex_operator(op: &str) -> &str {
    match op {
        "×" => "\\times",
        "·" | "∙" => "\\cdot",
        "÷" => "\\div",
        "≈" => "\\approx",
        "≠" => "\\neq",
        "≤" => "\\leq",
        "≥" => "\\geq",
        other => other,
    }
}

/// `Fe2Fe2O3` -> `Fe2O3`: an element count repeated back to back is kept once.
fn collapse_repeated_units(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut last = 0;
    let mut prev: Option<(usize, &str)> = None;
    for m in ELEMENT_COUNT.find_iter(text) {
        if let Some((end, unit)) = prev {
            if end == m.start() && unit == m.as_str() {
                out.push_str(&text[last..m.start()]);
                last = m.end();
                prev = Some((m.end(), unit));
                continue;
            }
        }
        prev = Some((m.end(), m.as_str()));
    }
    out.push_str(&text[last..]);
    out
}

/// Apply `f` to the text between math spans.
fn map_outside_math(text: &str, f: impl Fn(&str) -> String) -> String {
    let mut out = String::with_capacity(text.len());
    let mut last = 0;
    for m in MATH_SPAN.find_iter(text) {
        out.push_str(&f(&text[last..m.start()]));
        out.push_str(m.as_str());
        last = m.end();
    }
    out.push_str(&f(&text[last..]));
    out
}

fn wrap_runs(text: &str, run: &Regex, should_wrap: impl Fn(&str) -> bool) -> String {
    run.replace_all(text, |caps: &Captures| {
        let token = &caps[0];
        let (lead, core, tail) = split_token(token);
        if !core.is_empty() && should_wrap(core) {
            format!("{}\\({}\\){}", lead, core, tail)
        } else {
            token.to_string()
        }
    })
    .into_owned()
}

/// Separate unbalanced parentheses, trailing `=` or `/`, and a hyphenated
/// word suffix (`H_2O-ning`) from the formula core.
fn split_token(token: &str) -> (&str, &str, &str) {
    let mut start = 0;
    let mut end = token.len();
    let depth = |s: &str| s.matches('(').count() as i64 - s.matches(')').count() as i64;

    while token[start..end].starts_with('(') && depth(&token[start..end]) > 0 {
        start += 1;
    }
    if let Some(m) = HYPHEN_SUFFIX.find(&token[start..end]) {
        end = start + m.start();
    }
    loop {
        let core = &token[start..end];
        if core.ends_with(')') && depth(core) < 0 {
            end -= 1;
        } else if core.ends_with(['=', '/']) {
            end -= 1;
        } else {
            break;
        }
    }
    (&token[..start], &token[start..end], &token[end..])
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chem(text: &str) -> String {
        post_process(text, DetectedCategory::Chemistry)
    }

    fn phys(text: &str) -> String {
        post_process(text, DetectedCategory::Physics)
    }

    #[test]
    fn test_delimited_chemistry_is_stable() {
        let text = "\\(Ca^{2+}\\) ioni";
        assert_eq!(chem(text), text);
    }

    #[test]
    fn test_bare_ion_wrapped_once() {
        let once = chem("Ca^{2+} ioni");
        assert_eq!(once, "\\(Ca^{2+}\\) ioni");
        assert_eq!(chem(&once), once);
    }

    #[test]
    fn test_reaction_arrows() {
        assert_eq!(
            chem("H_2 + O_2 -&gt; H_2O"),
            "\\(H_2\\) + \\(O_2\\) → \\(H_2O\\)"
        );
        assert_eq!(chem("N_2 + 3H_2 <-> 2NH_3"), "\\(N_2\\) + \\(3H_2\\) ⇌ \\(2NH_3\\)");
    }

    #[test]
    fn test_electron_shells_merged() {
        let once = chem("1s^2 2s^2 konfiguratsiya");
        assert_eq!(once, "\\(1s^2 2s^2\\) konfiguratsiya");
        assert_eq!(chem(&once), once);
    }

    #[test]
    fn test_parentheses_and_suffix_left_outside() {
        assert_eq!(chem("(masalan H_2O)"), "(masalan \\(H_2O\\))");
        assert_eq!(chem("H_2SO_4-ning massasi"), "\\(H_2SO_4\\)-ning massasi");
        assert_eq!(chem("(NH_4)_2SO_4 tuzi"), "\\((NH_4)_2SO_4\\) tuzi");
    }

    #[test]
    fn test_repeated_element_counts_collapsed() {
        let once = chem("Fe2Fe2O3 oksidi");
        assert_eq!(once, "Fe2O3 oksidi");
        assert_eq!(chem(&once), once);
        assert_eq!(chem("H2O2 peroksid"), "H2O2 peroksid");
        assert_eq!(chem("\\(X3X3\\) belgisi"), "\\(X3X3\\) belgisi");
    }

    #[test]
    fn test_blanks_not_wrapped() {
        assert_eq!(chem("A___ bo'sh"), "A___ bo'sh");
    }

    #[test]
    fn test_physics_fragments() {
        assert_eq!(phys("E=mc^2 formulasi"), "\\(E=mc^2\\) formulasi");
        assert_eq!(phys("v_0 tezlik"), "\\(v_0\\) tezlik");
        assert_eq!(phys("x^2= 4"), "\\(x^2\\)= 4");
    }

    #[test]
    fn test_operator_merge() {
        assert_eq!(phys("\\(a\\) + \\(b\\)"), "\\(a + b\\)");
        assert_eq!(phys("\\(a\\) × \\(b\\)"), "\\(a \\times b\\)");
        assert_eq!(phys("2 · \\(x\\) ga teng"), "\\(2 \\cdot x\\) ga teng");
        assert_eq!(phys("\\(a\\)\\(b\\)"), "\\(a b\\)");
    }

    #[test]
    fn test_product_with_trailing_number() {
        let once = phys("\\(x\\) · 5 ga teng");
        assert_eq!(once, "\\(x \\cdot 5\\) ga teng");
        assert_eq!(phys(&once), once);
        assert_eq!(phys("\\(a\\) \\times 2,5"), "\\(a \\times 2,5\\)");
        assert_eq!(phys("\\(a\\) × 5ta"), "\\(a\\) × 5ta");
    }

    #[test]
    fn test_comparison_symbols() {
        assert_eq!(phys("\\(a\\) ≤ \\(b\\)"), "\\(a \\leq b\\)");
        let once = phys("\\(x\\) ≠ \\(0\\) va \\(y\\) ≥ \\(1\\)");
        assert_eq!(once, "\\(x \\neq 0\\) va \\(y \\geq 1\\)");
        assert_eq!(phys(&once), once);
        assert_eq!(phys("\\(g\\) ≈ \\(10\\)"), "\\(g \\approx 10\\)");
    }

    #[test]
    fn test_idempotent_notation() {
        let once = phys("3 + \\(x_1\\) va y^2 hamda \\(a\\) ÷ \\(b\\)");
        assert_eq!(phys(&once), once);
    }

    #[test]
    fn test_other_categories_untouched() {
        let text = "H_2O -> suv";
        assert_eq!(post_process(text, DetectedCategory::Literature), text);
        assert_eq!(post_process(text, DetectedCategory::Generic), text);
    }
}
