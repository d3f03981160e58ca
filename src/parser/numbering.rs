//! Automatic list numbering (`word/numbering.xml`).
//!
//! Auto-numbered paragraphs carry no number in their text runs. The labels are
//! materialized here so numbered questions and lettered variants reach the
//! text stream like typed ones.

use crate::error::{Error, Result};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use std::collections::HashMap;

/// Format of one list level.
#[derive(Debug, Clone, PartialEq, Eq)]
struct LevelFormat {
    start: u32,
    num_fmt: String,
    lvl_text: String,
}

impl Default for LevelFormat {
    fn default() -> Self {
        Self {
            start: 1,
            num_fmt: "decimal".into(),
            lvl_text: String::new(),
        }
    }
}

/// A concrete numbering instance (`w:num`).
#[derive(Debug, Clone, Default)]
struct NumInstance {
    abstract_id: String,
    start_overrides: HashMap<u32, u32>,
}

/// Parsed numbering definitions.
#[derive(Debug, Clone, Default)]
pub(crate) struct NumberingDefinitions {
    abstracts: HashMap<String, HashMap<u32, LevelFormat>>,
    instances: HashMap<String, NumInstance>,
}

fn attr(e: &BytesStart, key: &[u8]) -> Option<String> {
    e.attributes()
        .flatten()
        .find(|a| a.key.as_ref() == key)
        .map(|a| String::from_utf8_lossy(&a.value).to_string())
}

impl NumberingDefinitions {
    /// Parse `word/numbering.xml`.
    pub(crate) fn parse(xml: &str) -> Result<Self> {
        let mut defs = Self::default();
        let mut reader = Reader::from_str(xml);
        let mut buf = Vec::new();

        let mut current_abstract: Option<String> = None;
        let mut current_level: Option<(u32, LevelFormat)> = None;
        let mut current_num: Option<(String, NumInstance)> = None;
        let mut override_level: Option<u32> = None;

        loop {
            let event = reader
                .read_event_into(&mut buf)
                .map_err(|e| Error::xml("word/numbering.xml", e))?;
            match event {
                Event::Start(ref e) | Event::Empty(ref e) => match e.name().as_ref() {
                    b"w:abstractNum" => current_abstract = attr(e, b"w:abstractNumId"),
                    b"w:lvl" => {
                        let ilvl = attr(e, b"w:ilvl").and_then(|v| v.parse().ok()).unwrap_or(0);
                        current_level = Some((ilvl, LevelFormat::default()));
                    }
                    b"w:start" => {
                        if let (Some((_, level)), Some(v)) = (current_level.as_mut(), attr(e, b"w:val")) {
                            level.start = v.parse().unwrap_or(1);
                        }
                    }
                    b"w:numFmt" => {
                        if let (Some((_, level)), Some(v)) = (current_level.as_mut(), attr(e, b"w:val")) {
                            level.num_fmt = v;
                        }
                    }
                    b"w:lvlText" => {
                        if let (Some((_, level)), Some(v)) = (current_level.as_mut(), attr(e, b"w:val")) {
                            level.lvl_text = v;
                        }
                    }
                    b"w:num" => {
                        if let Some(id) = attr(e, b"w:numId") {
                            current_num = Some((id, NumInstance::default()));
                        }
                    }
                    b"w:abstractNumId" => {
                        if let (Some((_, num)), Some(v)) = (current_num.as_mut(), attr(e, b"w:val")) {
                            num.abstract_id = v;
                        }
                    }
                    b"w:lvlOverride" => {
                        override_level = attr(e, b"w:ilvl").and_then(|v| v.parse().ok());
                    }
                    b"w:startOverride" => {
                        if let (Some((_, num)), Some(ilvl), Some(v)) =
                            (current_num.as_mut(), override_level, attr(e, b"w:val"))
                        {
                            num.start_overrides.insert(ilvl, v.parse().unwrap_or(1));
                        }
                    }
                    _ => {}
                },
                Event::End(ref e) => match e.name().as_ref() {
                    b"w:lvl" => {
                        if let (Some(abs), Some((ilvl, level))) =
                            (current_abstract.as_ref(), current_level.take())
                        {
                            defs.abstracts
                                .entry(abs.clone())
                                .or_default()
                                .insert(ilvl, level);
                        }
                    }
                    b"w:abstractNum" => current_abstract = None,
                    b"w:num" => {
                        if let Some((id, num)) = current_num.take() {
                            defs.instances.insert(id, num);
                        }
                    }
                    b"w:lvlOverride" => override_level = None,
                    _ => {}
                },
                Event::Eof => break,
                _ => {}
            }
            buf.clear();
        }

        Ok(defs)
    }

    fn level(&self, num_id: &str, ilvl: u32) -> Option<(&str, &LevelFormat)> {
        let instance = self.instances.get(num_id)?;
        let level = self.abstracts.get(&instance.abstract_id)?.get(&ilvl)?;
        Some((instance.abstract_id.as_str(), level))
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.instances.is_empty()
    }
}

/// Running list counters for one document walk.
#[derive(Debug, Default)]
pub(crate) struct NumberingCounters {
    /// abstractNumId → counter per level
    counters: HashMap<String, Vec<u32>>,
    /// numIds whose start overrides were applied
    seen: Vec<String>,
}

impl NumberingCounters {
    /// Advance the counter for a numbered paragraph and return its label.
    pub(crate) fn next_label(
        &mut self,
        defs: &NumberingDefinitions,
        num_id: &str,
        ilvl: u32,
    ) -> Option<String> {
        // numId 0 removes numbering from the paragraph
        if num_id == "0" {
            return None;
        }
        let (abstract_id, level) = defs.level(num_id, ilvl)?;
        if matches!(level.num_fmt.as_str(), "bullet" | "none") {
            return None;
        }

        let first_use = !self.seen.iter().any(|s| s == num_id);
        if first_use {
            self.seen.push(num_id.to_string());
        }
        let overrides = defs
            .instances
            .get(num_id)
            .map(|n| n.start_overrides.clone())
            .unwrap_or_default();

        let counters = self.counters.entry(abstract_id.to_string()).or_default();
        let depth = ilvl as usize + 1;
        if counters.len() < depth {
            counters.resize(depth, 0);
        }
        if first_use {
            for (&lvl, &start) in &overrides {
                if let Some(slot) = counters.get_mut(lvl as usize) {
                    *slot = start.saturating_sub(1);
                }
            }
        }
        let current = counters[ilvl as usize];
        counters[ilvl as usize] = if current == 0 && !(first_use && overrides.contains_key(&ilvl)) {
            level.start
        } else {
            current.saturating_add(1)
        };
        counters.truncate(depth);

        let values = counters.clone();
        let mut label = if level.lvl_text.is_empty() {
            format!("%{}.", ilvl + 1)
        } else {
            level.lvl_text.clone()
        };
        for (i, value) in values.iter().enumerate() {
            let fmt = defs
                .level(num_id, i as u32)
                .map(|(_, l)| l.num_fmt.as_str())
                .unwrap_or("decimal");
            label = label.replace(&format!("%{}", i + 1), &format_number(*value, fmt));
        }
        Some(label)
    }
}

fn format_number(value: u32, fmt: &str) -> String {
    match fmt {
        "upperLetter" => letter(value, b'A'),
        "lowerLetter" => letter(value, b'a'),
        "upperRoman" => roman(value),
        "lowerRoman" => roman(value).to_lowercase(),
        "decimalZero" => format!("{:02}", value),
        _ => value.to_string(),
    }
}

/// Longest run of a repeated letter label (`AAAA`).
const MAX_LETTER_REPEAT: usize = 8;

fn letter(value: u32, base: u8) -> String {
    if value == 0 {
        return String::new();
    }
    let idx = ((value - 1) % 26) as u8;
    let repeat = (((value - 1) / 26 + 1) as usize).min(MAX_LETTER_REPEAT);
    ((base + idx) as char).to_string().repeat(repeat)
}

fn roman(mut value: u32) -> String {
    if value >= 4000 {
        return value.to_string();
    }
    const TABLE: [(u32, &str); 13] = [
        (1000, "M"),
        (900, "CM"),
        (500, "D"),
        (400, "CD"),
        (100, "C"),
        (90, "XC"),
        (50, "L"),
        (40, "XL"),
        (10, "X"),
        (9, "IX"),
        (5, "V"),
        (4, "IV"),
        (1, "I"),
    ];
    let mut out = String::new();
    for (n, s) in TABLE {
        while value >= n {
            out.push_str(s);
            value -= n;
        }
    }
    out
}
