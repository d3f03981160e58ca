//! Office Math (OMML) to LaTeX conversion.
//!
//! The body walker feeds every event inside `m:oMath` into an [`OmmlBuilder`],
//! which keeps a small element tree. When the math node closes, the tree is
//! rendered to LaTeX in one recursive pass.

use crate::model::MathSpan;
use quick_xml::events::BytesStart;

/// An element inside an `m:oMath` node.
#[derive(Debug, Clone, Default)]
struct MathNode {
    name: String,
    val: Option<String>,
    children: Vec<MathNode>,
    text: String,
}

impl MathNode {
    fn from_start(e: &BytesStart) -> Self {
        let name = String::from_utf8_lossy(e.name().as_ref()).to_string();
        let val = e
            .attributes()
            .flatten()
            .find(|a| matches!(a.key.as_ref(), b"m:val" | b"w:val"))
            .map(|a| String::from_utf8_lossy(&a.value).to_string());
        Self {
            name,
            val,
            children: Vec::new(),
            text: String::new(),
        }
    }

    fn local(&self) -> &str {
        self.name.rsplit(':').next().unwrap_or(&self.name)
    }

    fn child(&self, local: &str) -> Option<&MathNode> {
        self.children.iter().find(|c| c.local() == local)
    }

    /// Value of a property: `<m:xxxPr><m:prop m:val=".."/></m:xxxPr>`.
    fn prop(&self, pr: &str, prop: &str) -> Option<&str> {
        self.child(pr)?.child(prop)?.val.as_deref()
    }

    fn flag(&self, pr: &str, prop: &str) -> bool {
        match self.child(pr).and_then(|p| p.child(prop)) {
            Some(node) => !matches!(node.val.as_deref(), Some("0" | "off" | "false")),
            None => false,
        }
    }
}

/// Incremental builder for one `m:oMath` element.
#[derive(Debug)]
pub(crate) struct OmmlBuilder {
    stack: Vec<MathNode>,
    display: bool,
}

impl OmmlBuilder {
    /// Start a builder at an `m:oMath` start tag.
    pub(crate) fn new(root: &BytesStart, display: bool) -> Self {
        Self {
            stack: vec![MathNode::from_start(root)],
            display,
        }
    }

    pub(crate) fn start(&mut self, e: &BytesStart) {
        self.stack.push(MathNode::from_start(e));
    }

    pub(crate) fn empty(&mut self, e: &BytesStart) {
        let node = MathNode::from_start(e);
        if let Some(top) = self.stack.last_mut() {
            top.children.push(node);
        }
    }

    pub(crate) fn text(&mut self, text: &str) {
        if let Some(top) = self.stack.last_mut() {
            top.text.push_str(text);
        }
    }

    /// Close the current element. Returns the finished span when the root closes.
    pub(crate) fn end(&mut self) -> Option<MathSpan> {
        let node = self.stack.pop()?;
        match self.stack.last_mut() {
            Some(parent) => {
                parent.children.push(node);
                None
            }
            None => Some(finish(&node, self.display)),
        }
    }
}

fn finish(root: &MathNode, display: bool) -> MathSpan {
    let source = tidy(&render(root));
    let (runs, bold) = count_runs(root);
    MathSpan {
        source,
        bold: runs > 0 && runs == bold,
        display,
    }
}

/// Collapse whitespace introduced around commands.
fn tidy(latex: &str) -> String {
    latex.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn count_runs(node: &MathNode) -> (usize, usize) {
    if node.local() == "r" {
        let has_text = node.children.iter().any(|c| c.local() == "t" && !c.text.trim().is_empty());
        if !has_text {
            return (0, 0);
        }
        return (1, usize::from(run_is_bold(node)));
    }
    node.children
        .iter()
        .map(count_runs)
        .fold((0, 0), |acc, x| (acc.0 + x.0, acc.1 + x.1))
}

fn run_is_bold(run: &MathNode) -> bool {
    let math_bold = run
        .prop("rPr", "sty")
        .is_some_and(|v| v == "b" || v == "bi");
    let word_bold = run
        .children
        .iter()
        .filter(|c| c.name == "w:rPr")
        .flat_map(|pr| &pr.children)
        .any(|c| c.name == "w:b" && !matches!(c.val.as_deref(), Some("0" | "false")));
    math_bold || word_bold
}

fn render_children(node: &MathNode) -> String {
    node.children.iter().map(render).collect()
}

fn arg(node: &MathNode, local: &str) -> String {
    node.child(local).map(render).unwrap_or_default()
}

fn render(node: &MathNode) -> String {
    match node.local() {
        "t" => symbols_to_latex(&node.text),
        "r" => render_children(node),
        "sSup" => format!("{}^{{{}}}", arg(node, "e"), arg(node, "sup")),
        "sSub" => format!("{}_{{{}}}", arg(node, "e"), arg(node, "sub")),
        "sSubSup" => format!(
            "{}_{{{}}}^{{{}}}",
            arg(node, "e"),
            arg(node, "sub"),
            arg(node, "sup")
        ),
        "sPre" => format!(
            "{{}}_{{{}}}^{{{}}}{}",
            arg(node, "sub"),
            arg(node, "sup"),
            arg(node, "e")
        ),
        "f" => render_fraction(node),
        "rad" => render_radical(node),
        "nary" => render_nary(node),
        "d" => render_delimiter(node),
        "func" => render_function(node),
        "limLow" => format!("{}_{{{}}}", limit_base(node), arg(node, "lim")),
        "limUpp" => format!("{}^{{{}}}", limit_base(node), arg(node, "lim")),
        "acc" => render_accent(node),
        "bar" => {
            let command = if node.prop("barPr", "pos") == Some("top") {
                "\\overline"
            } else {
                "\\underline"
            };
            format!("{}{{{}}}", command, arg(node, "e"))
        }
        "groupChr" => match node.prop("groupChrPr", "chr") {
            Some("\u{23DE}") => format!("\\overbrace{{{}}}", arg(node, "e")),
            _ => format!("\\underbrace{{{}}}", arg(node, "e")),
        },
        "eqArr" => {
            let rows: Vec<String> = node
                .children
                .iter()
                .filter(|c| c.local() == "e")
                .map(render)
                .collect();
            format!("\\begin{{array}}{{l}} {} \\end{{array}}", rows.join(" \\\\ "))
        }
        "m" => {
            let rows: Vec<String> = node
                .children
                .iter()
                .filter(|c| c.local() == "mr")
                .map(|row| {
                    row.children
                        .iter()
                        .filter(|c| c.local() == "e")
                        .map(render)
                        .collect::<Vec<_>>()
                        .join(" & ")
                })
                .collect();
            format!("\\begin{{matrix}} {} \\end{{matrix}}", rows.join(" \\\\ "))
        }
        name if name.ends_with("Pr") => String::new(),
        _ => render_children(node),
    }
}

fn render_fraction(node: &MathNode) -> String {
    let num = arg(node, "num");
    let den = arg(node, "den");
    match node.prop("fPr", "type") {
        Some("lin") | Some("skw") => format!("{}/{}", num, den),
        Some("noBar") => format!("\\binom{{{}}}{{{}}}", num, den),
        _ => format!("\\frac{{{}}}{{{}}}", num, den),
    }
}

fn render_radical(node: &MathNode) -> String {
    let deg = arg(node, "deg");
    if node.flag("radPr", "degHide") || deg.trim().is_empty() {
        format!("\\sqrt{{{}}}", arg(node, "e"))
    } else {
        format!("\\sqrt[{}]{{{}}}", deg, arg(node, "e"))
    }
}

fn render_nary(node: &MathNode) -> String {
    let chr = node.prop("naryPr", "chr").unwrap_or("\u{222B}");
    let op = match chr {
        "\u{2211}" => "\\sum",
        "\u{220F}" => "\\prod",
        "\u{2210}" => "\\coprod",
        "\u{222C}" => "\\iint",
        "\u{222D}" => "\\iiint",
        "\u{222E}" => "\\oint",
        "\u{22C3}" => "\\bigcup",
        "\u{22C2}" => "\\bigcap",
        _ => "\\int",
    };
    let mut out = op.to_string();
    let sub = arg(node, "sub");
    if !node.flag("naryPr", "subHide") && !sub.trim().is_empty() {
        out.push_str(&format!("_{{{}}}", sub));
    }
    let sup = arg(node, "sup");
    if !node.flag("naryPr", "supHide") && !sup.trim().is_empty() {
        out.push_str(&format!("^{{{}}}", sup));
    }
    format!("{} {}", out, arg(node, "e"))
}

fn delimiter_char(c: &str) -> &str {
    match c {
        "{" => "\\{",
        "}" => "\\}",
        "\u{2329}" | "\u{27E8}" => "\\langle",
        "\u{232A}" | "\u{27E9}" => "\\rangle",
        "\u{2016}" => "\\|",
        other => other,
    }
}

fn render_delimiter(node: &MathNode) -> String {
    let beg = node.prop("dPr", "begChr").unwrap_or("(");
    let end = node.prop("dPr", "endChr").unwrap_or(")");
    let sep = node.prop("dPr", "sepChr").unwrap_or("|");
    let items: Vec<String> = node
        .children
        .iter()
        .filter(|c| c.local() == "e")
        .map(render)
        .collect();
    format!(
        "{}{}{}",
        delimiter_char(beg),
        items.join(delimiter_char(sep)),
        delimiter_char(end)
    )
}

const FUNCTION_NAMES: &[&str] = &[
    "sin", "cos", "tan", "cot", "sec", "csc", "arcsin", "arccos", "arctan", "sinh", "cosh",
    "tanh", "log", "ln", "lg", "exp", "lim", "max", "min", "det",
];

fn function_name(raw: &str) -> String {
    let trimmed = raw.trim();
    if FUNCTION_NAMES.contains(&trimmed) {
        format!("\\{}", trimmed)
    } else {
        trimmed.to_string()
    }
}

fn render_function(node: &MathNode) -> String {
    let name = function_name(&arg(node, "fName"));
    format!("{} {}", name, arg(node, "e"))
}

fn limit_base(node: &MathNode) -> String {
    function_name(&arg(node, "e"))
}

fn render_accent(node: &MathNode) -> String {
    let command = match node.prop("accPr", "chr").unwrap_or("\u{0302}") {
        "\u{20D7}" | "\u{20D1}" => "\\vec",
        "\u{0305}" | "\u{00AF}" => "\\bar",
        "\u{0307}" => "\\dot",
        "\u{0308}" => "\\ddot",
        "\u{0303}" => "\\tilde",
        _ => "\\hat",
    };
    format!("{}{{{}}}", command, arg(node, "e"))
}

/// Map Unicode math characters to LaTeX commands.
pub(crate) fn symbols_to_latex(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 8);
    for c in text.chars() {
        match symbol_command(c) {
            Some(cmd) => {
                out.push_str(cmd);
                if cmd.ends_with(|ch: char| ch.is_ascii_alphabetic()) {
                    out.push(' ');
                }
            }
            None => out.push(c),
        }
    }
    out
}

fn symbol_command(c: char) -> Option<&'static str> {
    let cmd = match c {
        'α' => "\\alpha",
        'β' => "\\beta",
        'γ' => "\\gamma",
        'δ' => "\\delta",
        'ε' => "\\varepsilon",
        'ζ' => "\\zeta",
        'η' => "\\eta",
        'θ' => "\\theta",
        'ι' => "\\iota",
        'κ' => "\\kappa",
        'λ' => "\\lambda",
        'μ' => "\\mu",
        'ν' => "\\nu",
        'ξ' => "\\xi",
        'π' => "\\pi",
        'ρ' => "\\rho",
        'σ' => "\\sigma",
        'τ' => "\\tau",
        'φ' => "\\varphi",
        'χ' => "\\chi",
        'ψ' => "\\psi",
        'ω' => "\\omega",
        'Γ' => "\\Gamma",
        'Δ' | '∆' => "\\Delta",
        'Θ' => "\\Theta",
        'Λ' => "\\Lambda",
        'Π' => "\\Pi",
        'Σ' => "\\Sigma",
        'Φ' => "\\Phi",
        'Ψ' => "\\Psi",
        'Ω' => "\\Omega",
        '×' => "\\times",
        '÷' => "\\div",
        '·' | '⋅' | '∙' => "\\cdot",
        '±' => "\\pm",
        '∓' => "\\mp",
        '≤' => "\\leq",
        '≥' => "\\geq",
        '≠' => "\\neq",
        '≈' => "\\approx",
        '≡' => "\\equiv",
        '∼' => "\\sim",
        '≅' => "\\cong",
        '∞' => "\\infty",
        '→' => "\\rightarrow",
        '←' => "\\leftarrow",
        '↔' => "\\leftrightarrow",
        '⇒' | '⟹' => "\\Rightarrow",
        '⇔' => "\\Leftrightarrow",
        '⇌' => "\\rightleftharpoons",
        '∈' => "\\in",
        '∉' => "\\notin",
        '⊂' => "\\subset",
        '⊆' => "\\subseteq",
        '∪' => "\\cup",
        '∩' => "\\cap",
        '∅' => "\\emptyset",
        '∠' => "\\angle",
        '⊥' => "\\perp",
        '∥' => "\\parallel",
        '∂' => "\\partial",
        '∇' => "\\nabla",
        '∀' => "\\forall",
        '∃' => "\\exists",
        '…' => "\\ldots",
        '°' => "^{\\circ}",
        '−' => "-",
        'ℝ' => "\\mathbb{R}",
        'ℕ' => "\\mathbb{N}",
        'ℤ' => "\\mathbb{Z}",
        'ℚ' => "\\mathbb{Q}",
        _ => return None,
    };
    Some(cmd)
}

#[cfg(test)]
pub(crate) fn convert_fragment(xml: &str) -> Option<MathSpan> {
    use quick_xml::events::Event;
    use quick_xml::Reader;

    let mut reader = Reader::from_str(xml);
    let mut buf = Vec::new();
    let mut builder: Option<OmmlBuilder> = None;
    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) => match builder.as_mut() {
                Some(b) => b.start(&e),
                None if e.name().as_ref() == b"m:oMath" => {
                    builder = Some(OmmlBuilder::new(&e, false))
                }
                None => {}
            },
            Ok(Event::Empty(e)) => {
                if let Some(b) = builder.as_mut() {
                    b.empty(&e);
                }
            }
            Ok(Event::Text(t)) => {
                if let Some(b) = builder.as_mut() {
                    b.text(&t.unescape().ok()?);
                }
            }
            Ok(Event::End(_)) => {
                if let Some(b) = builder.as_mut() {
                    if let Some(span) = b.end() {
                        return Some(span);
                    }
                }
            }
            Ok(Event::Eof) | Err(_) => return None,
            _ => {}
        }
        buf.clear();
    }
}
