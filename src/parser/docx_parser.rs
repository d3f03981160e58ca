//! DOCX container reader.
//!
//! Opens the ZIP container, resolves relationships, numbering and media parts,
//! then streams `word/document.xml` into the block tree of [`Document`].

use super::numbering::{NumberingCounters, NumberingDefinitions};
use super::omml::OmmlBuilder;
use crate::detect::ContainerFormat;
use crate::error::{Error, Result};
use crate::model::{
    Block, Document, ImageRef, InlineContent, MediaPart, Metadata, Paragraph, Script, Table,
    TableCell, TableRow, TextRun, TextStyle, VerticalMerge,
};
use chrono::{DateTime, Utc};
use log::{debug, warn};
use once_cell::sync::Lazy;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use regex::Regex;
use std::collections::HashMap;
use std::fs;
use std::io::{Cursor, Read};
use std::path::Path;
use zip::result::ZipError;
use zip::ZipArchive;

const DOCUMENT_PART: &str = "word/document.xml";
const RELS_PART: &str = "word/_rels/document.xml.rels";
const NUMBERING_PART: &str = "word/numbering.xml";
const CORE_PART: &str = "docProps/core.xml";
const MEDIA_PREFIX: &str = "word/media/";

/// EMU per pixel at 96 DPI.
const EMU_PER_PX: u64 = 9525;

/// DOCX document reader.
pub struct DocxParser {
    archive: ZipArchive<Cursor<Vec<u8>>>,
}

impl DocxParser {
    /// Open a DOCX file.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::from_bytes(fs::read(path)?)
    }

    /// Create a parser from owned bytes.
    pub fn from_bytes(data: Vec<u8>) -> Result<Self> {
        let archive = ZipArchive::new(Cursor::new(data))?;
        Ok(Self { archive })
    }

    /// Create a parser from a reader.
    pub fn from_reader<R: Read>(mut reader: R) -> Result<Self> {
        let mut data = Vec::new();
        reader.read_to_end(&mut data)?;
        Self::from_bytes(data)
    }

    /// Read the container into a [`Document`].
    ///
    /// A malformed `word/document.xml` does not fail the call: its text is
    /// salvaged into a raw body so the fallback cleanup path can still run.
    pub fn parse(mut self) -> Result<Document> {
        let media = self.collect_media()?;
        let by_part: HashMap<&str, u32> = media.iter().map(|m| (m.name.as_str(), m.seq)).collect();

        let image_rels: HashMap<String, u32> = match self.read_part(RELS_PART)? {
            Some(xml) => parse_relationships(&xml)?
                .into_iter()
                .filter_map(|(id, target)| {
                    by_part
                        .get(resolve_target(&target).as_str())
                        .map(|&seq| (id, seq))
                })
                .collect(),
            None => HashMap::new(),
        };

        let numbering = match self.read_part(NUMBERING_PART)? {
            Some(xml) => NumberingDefinitions::parse(&xml).unwrap_or_else(|e| {
                warn!("Ignoring list numbering: {}", e);
                NumberingDefinitions::default()
            }),
            None => NumberingDefinitions::default(),
        };

        let mut metadata = match self.read_part(CORE_PART)? {
            Some(xml) => parse_core_properties(&xml),
            None => Metadata::default(),
        };
        metadata.format = Some(ContainerFormat::Docx);

        let xml = self
            .read_part(DOCUMENT_PART)?
            .ok_or_else(|| Error::MissingPart(DOCUMENT_PART.into()))?;

        let mut doc = match BodyWalker::new(&image_rels, &numbering).walk(&xml) {
            Ok(blocks) => {
                debug!(
                    "Read {} blocks, {} media parts, numbering: {}",
                    blocks.len(),
                    media.len(),
                    !numbering.is_empty()
                );
                Document::from_blocks(blocks)
            }
            Err(e) => {
                warn!("Structured body unavailable ({}), falling back to text", e);
                Document::from_text(salvage_text(&xml))
            }
        };
        doc.metadata = metadata;
        Ok(doc.with_media(media))
    }

    fn read_part(&mut self, name: &str) -> Result<Option<String>> {
        match self.archive.by_name(name) {
            Ok(mut file) => {
                let mut data = Vec::new();
                file.read_to_end(&mut data)?;
                Ok(Some(String::from_utf8_lossy(&data).into_owned()))
            }
            Err(ZipError::FileNotFound) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Collect `word/media/*` parts and assign sequence numbers.
    fn collect_media(&mut self) -> Result<Vec<MediaPart>> {
        let mut raw: Vec<(String, Vec<u8>)> = Vec::new();
        for i in 0..self.archive.len() {
            let mut file = self.archive.by_index(i)?;
            if file.is_dir() || !file.name().starts_with(MEDIA_PREFIX) {
                continue;
            }
            let name = file.name().to_string();
            let mut data = Vec::new();
            file.read_to_end(&mut data)?;
            raw.push((name, data));
        }
        raw.sort_by(|a, b| a.0.cmp(&b.0));

        let mut used: Vec<u32> = Vec::new();
        let mut pending = Vec::new();
        let mut parts = Vec::new();
        for (name, data) in raw {
            match MediaPart::sequence_from_name(&name) {
                Some(seq) if !used.contains(&seq) => {
                    used.push(seq);
                    parts.push(MediaPart::new(seq, name, data));
                }
                _ => pending.push((name, data)),
            }
        }
        let mut next = used.iter().copied().max().unwrap_or(0) + 1;
        for (name, data) in pending {
            parts.push(MediaPart::new(next, name, data));
            next += 1;
        }
        parts.sort_by_key(|p| p.seq);
        Ok(parts)
    }
}

/// Relationship targets are relative to `word/`.
fn resolve_target(target: &str) -> String {
    if let Some(abs) = target.strip_prefix('/') {
        abs.to_string()
    } else if let Some(up) = target.strip_prefix("../") {
        up.to_string()
    } else {
        format!("word/{}", target)
    }
}

/// Parse a relationships part into `Id → Target`, skipping external targets.
fn parse_relationships(xml: &str) -> Result<HashMap<String, String>> {
    let mut relationships = HashMap::new();
    let mut reader = Reader::from_str(xml);
    reader.trim_text(true);

    let mut buf = Vec::new();
    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Empty(e)) | Ok(Event::Start(e)) if e.name().as_ref() == b"Relationship" => {
                let external = get_attr(&e, b"TargetMode").is_some_and(|m| m == "External");
                if let (Some(id), Some(target), false) =
                    (get_attr(&e, b"Id"), get_attr(&e, b"Target"), external)
                {
                    relationships.insert(id, target);
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(Error::xml(RELS_PART, e)),
            _ => {}
        }
        buf.clear();
    }
    Ok(relationships)
}

fn parse_core_properties(xml: &str) -> Metadata {
    let mut metadata = Metadata::default();
    let mut reader = Reader::from_str(xml);
    reader.trim_text(true);
    let mut buf = Vec::new();
    let mut current: Option<Vec<u8>> = None;

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) => current = Some(e.name().as_ref().to_vec()),
            Ok(Event::Text(t)) => {
                let Ok(text) = t.unescape() else { continue };
                let text = text.trim().to_string();
                match current.as_deref() {
                    Some(b"dc:title") => metadata.title = Some(text),
                    Some(b"dc:creator") => metadata.author = Some(text),
                    Some(b"dcterms:created") => metadata.created = parse_datetime(&text),
                    Some(b"dcterms:modified") => metadata.modified = parse_datetime(&text),
                    _ => {}
                }
            }
            Ok(Event::End(_)) => current = None,
            Ok(Event::Eof) | Err(_) => break,
            _ => {}
        }
        buf.clear();
    }
    metadata
}

fn parse_datetime(text: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(text)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

fn get_attr(e: &BytesStart, key: &[u8]) -> Option<String> {
    e.attributes()
        .flatten()
        .find(|a| a.key.as_ref() == key)
        .map(|a| String::from_utf8_lossy(&a.value).to_string())
}

/// `w:val` explicitly "0"/"false" switches a toggle property off.
fn check_val_off(e: &BytesStart) -> bool {
    matches!(get_attr(e, b"w:val").as_deref(), Some("0" | "false" | "none"))
}

/// Parse a VML length ("45pt", "0.5in", "60px") into pixels.
fn vml_length_px(value: &str) -> Option<u32> {
    let value = value.trim();
    let (num, factor) = if let Some(v) = value.strip_suffix("pt") {
        (v, 96.0 / 72.0)
    } else if let Some(v) = value.strip_suffix("in") {
        (v, 96.0)
    } else if let Some(v) = value.strip_suffix("px") {
        (v, 1.0)
    } else {
        (value, 96.0 / 72.0)
    };
    let px = num.trim().parse::<f64>().ok()? * factor;
    (px > 0.0).then(|| px.round() as u32)
}

fn vml_style_size(style: &str) -> Option<(u32, u32)> {
    let mut width = None;
    let mut height = None;
    for decl in style.split(';') {
        let Some((key, value)) = decl.split_once(':') else { continue };
        match key.trim() {
            "width" => width = vml_length_px(value),
            "height" => height = vml_length_px(value),
            _ => {}
        }
    }
    Some((width?, height?))
}

#[derive(Default)]
struct ParagraphBuilder {
    paragraph: Paragraph,
    num_id: Option<String>,
    ilvl: u32,
    in_ppr: bool,
    in_mark_rpr: bool,
    mark_bold: bool,
}

#[derive(Default)]
struct TableBuilder {
    table: Table,
    row: Option<TableRow>,
    cell: Option<TableCell>,
}

/// Event-driven walk over `word/document.xml`.
struct BodyWalker<'a> {
    image_rels: &'a HashMap<String, u32>,
    numbering: &'a NumberingDefinitions,
    counters: NumberingCounters,
    blocks: Vec<Block>,
    paragraphs: Vec<ParagraphBuilder>,
    tables: Vec<TableBuilder>,
    run_style: TextStyle,
    in_run: bool,
    in_rpr: bool,
    in_text: bool,
    math: Option<OmmlBuilder>,
    in_math_para: bool,
    skip_depth: usize,
    extent: Option<(u32, u32)>,
    object_start: Option<usize>,
    object_equation: bool,
}

impl<'a> BodyWalker<'a> {
    fn new(image_rels: &'a HashMap<String, u32>, numbering: &'a NumberingDefinitions) -> Self {
        Self {
            image_rels,
            numbering,
            counters: NumberingCounters::default(),
            blocks: Vec::new(),
            paragraphs: Vec::new(),
            tables: Vec::new(),
            run_style: TextStyle::default(),
            in_run: false,
            in_rpr: false,
            in_text: false,
            math: None,
            in_math_para: false,
            skip_depth: 0,
            extent: None,
            object_start: None,
            object_equation: false,
        }
    }

    fn walk(mut self, xml: &str) -> Result<Vec<Block>> {
        let mut reader = Reader::from_str(xml);
        let mut buf = Vec::new();
        loop {
            let event = reader
                .read_event_into(&mut buf)
                .map_err(|e| Error::xml(DOCUMENT_PART, e))?;
            match event {
                Event::Start(e) => self.handle_start(&e),
                Event::Empty(e) => self.handle_empty(&e),
                Event::Text(t) => {
                    let text = t.unescape().map_err(|e| Error::xml(DOCUMENT_PART, e))?;
                    self.handle_text(&text);
                }
                Event::End(e) => self.handle_end(e.name().as_ref()),
                Event::Eof => break,
                _ => {}
            }
            buf.clear();
        }
        if self.skip_depth > 0 || self.math.is_some() || !self.tables.is_empty() {
            return Err(Error::xml(DOCUMENT_PART, "unbalanced body structure"));
        }
        Ok(self.blocks)
    }

    fn handle_start(&mut self, e: &BytesStart) {
        if self.skip_depth > 0 {
            self.skip_depth += 1;
            return;
        }
        if let Some(math) = self.math.as_mut() {
            math.start(e);
            return;
        }
        match e.name().as_ref() {
            // Alternate content repeats the choice for old readers
            b"mc:Fallback" => self.skip_depth = 1,
            b"w:p" => self.paragraphs.push(ParagraphBuilder::default()),
            b"w:pPr" => {
                if let Some(p) = self.paragraphs.last_mut() {
                    p.in_ppr = true;
                }
            }
            b"w:r" => {
                self.in_run = true;
                self.run_style = TextStyle::default();
            }
            b"w:rPr" => self.enter_rpr(),
            b"w:t" => self.in_text = self.in_run,
            b"m:oMathPara" => self.in_math_para = true,
            b"m:oMath" => self.math = Some(OmmlBuilder::new(e, self.in_math_para)),
            b"w:tbl" => self.tables.push(TableBuilder::default()),
            b"w:tr" => {
                if let Some(t) = self.tables.last_mut() {
                    t.row = Some(TableRow::default());
                }
            }
            b"w:tc" => {
                if let Some(t) = self.tables.last_mut() {
                    t.cell = Some(TableCell::new());
                }
            }
            b"w:drawing" | b"wp:inline" | b"wp:anchor" => self.extent = None,
            b"w:object" => {
                self.object_start = Some(self.current_len());
                self.object_equation = false;
            }
            b"v:shape" => {
                self.extent = get_attr(e, b"style").and_then(|s| vml_style_size(&s));
            }
            _ => self.handle_property(e),
        }
    }

    fn handle_empty(&mut self, e: &BytesStart) {
        if self.skip_depth > 0 {
            return;
        }
        if let Some(math) = self.math.as_mut() {
            math.empty(e);
            return;
        }
        match e.name().as_ref() {
            b"w:tab" if self.in_run && !self.in_rpr => self.push_text(" "),
            b"w:br" | b"w:cr" if self.in_run => {
                if let Some(p) = self.paragraphs.last_mut() {
                    p.paragraph.add_line_break();
                }
            }
            b"w:p" => {
                // empty paragraph
                self.paragraphs.push(ParagraphBuilder::default());
                self.end_paragraph();
            }
            b"v:shape" => {
                self.extent = get_attr(e, b"style").and_then(|s| vml_style_size(&s));
            }
            _ => self.handle_property(e),
        }
    }

    /// Properties and leaf references that may appear as empty or start tags.
    fn handle_property(&mut self, e: &BytesStart) {
        match e.name().as_ref() {
            b"w:b" => {
                let on = !check_val_off(e);
                if self.in_rpr {
                    self.run_style.bold = on;
                } else if let Some(p) = self.paragraphs.last_mut().filter(|p| p.in_mark_rpr) {
                    p.mark_bold = on;
                }
            }
            b"w:highlight" if self.in_rpr => self.run_style.highlight = !check_val_off(e),
            b"w:vertAlign" if self.in_rpr => {
                self.run_style.script = match get_attr(e, b"w:val").as_deref() {
                    Some("superscript") => Script::Superscript,
                    Some("subscript") => Script::Subscript,
                    _ => Script::Baseline,
                };
            }
            b"w:numId" => {
                if let Some(p) = self.paragraphs.last_mut().filter(|p| p.in_ppr) {
                    p.num_id = get_attr(e, b"w:val");
                }
            }
            b"w:ilvl" => {
                if let Some(p) = self.paragraphs.last_mut().filter(|p| p.in_ppr) {
                    p.ilvl = get_attr(e, b"w:val").and_then(|v| v.parse().ok()).unwrap_or(0);
                }
            }
            b"w:gridSpan" => {
                if let Some(cell) = self.tables.last_mut().and_then(|t| t.cell.as_mut()) {
                    cell.colspan = get_attr(e, b"w:val").and_then(|v| v.parse().ok()).unwrap_or(1);
                }
            }
            b"w:vMerge" => {
                if let Some(cell) = self.tables.last_mut().and_then(|t| t.cell.as_mut()) {
                    cell.vertical_merge = match get_attr(e, b"w:val").as_deref() {
                        Some("restart") => VerticalMerge::Restart,
                        _ => VerticalMerge::Continue,
                    };
                }
            }
            b"wp:extent" => {
                let cx = get_attr(e, b"cx").and_then(|v| v.parse::<u64>().ok());
                let cy = get_attr(e, b"cy").and_then(|v| v.parse::<u64>().ok());
                if let (Some(cx), Some(cy)) = (cx, cy) {
                    self.extent = Some(((cx / EMU_PER_PX) as u32, (cy / EMU_PER_PX) as u32));
                }
            }
            b"a:blip" => self.push_image(get_attr(e, b"r:embed")),
            b"v:imagedata" => self.push_image(get_attr(e, b"r:id")),
            b"o:OLEObject" => {
                if get_attr(e, b"ProgID").is_some_and(|p| p.starts_with("Equation")) {
                    self.object_equation = true;
                }
            }
            _ => {}
        }
    }

    fn handle_text(&mut self, text: &str) {
        if self.skip_depth > 0 {
            return;
        }
        if let Some(math) = self.math.as_mut() {
            math.text(text);
        } else if self.in_text {
            self.push_text(text);
        }
    }

    fn handle_end(&mut self, name: &[u8]) {
        if self.skip_depth > 0 {
            self.skip_depth -= 1;
            return;
        }
        if let Some(math) = self.math.as_mut() {
            if let Some(span) = math.end() {
                self.math = None;
                if let Some(p) = self.paragraphs.last_mut() {
                    p.paragraph.add_math(span);
                }
            }
            return;
        }
        match name {
            b"w:t" => self.in_text = false,
            b"w:r" => {
                self.in_run = false;
                self.in_rpr = false;
            }
            b"w:rPr" => {
                if self.in_rpr {
                    self.in_rpr = false;
                } else if let Some(p) = self.paragraphs.last_mut() {
                    p.in_mark_rpr = false;
                }
            }
            b"w:pPr" => {
                if let Some(p) = self.paragraphs.last_mut() {
                    p.in_ppr = false;
                }
            }
            b"m:oMathPara" => self.in_math_para = false,
            b"w:p" => self.end_paragraph(),
            b"w:tc" => {
                if let Some(t) = self.tables.last_mut() {
                    if let (Some(cell), Some(row)) = (t.cell.take(), t.row.as_mut()) {
                        row.cells.push(cell);
                    }
                }
            }
            b"w:tr" => {
                if let Some(t) = self.tables.last_mut() {
                    if let Some(row) = t.row.take() {
                        t.table.add_row(row);
                    }
                }
            }
            b"w:tbl" => self.end_table(),
            b"w:object" => self.end_object(),
            _ => {}
        }
    }

    fn enter_rpr(&mut self) {
        if self.in_run {
            self.in_rpr = true;
        } else if let Some(p) = self.paragraphs.last_mut().filter(|p| p.in_ppr) {
            p.in_mark_rpr = true;
        }
    }

    fn current_len(&self) -> usize {
        self.paragraphs
            .last()
            .map(|p| p.paragraph.content.len())
            .unwrap_or(0)
    }

    fn push_text(&mut self, text: &str) {
        let style = self.run_style;
        if let Some(p) = self.paragraphs.last_mut() {
            push_run(&mut p.paragraph, text, style);
        }
    }

    fn push_image(&mut self, rel_id: Option<String>) {
        let Some(seq) = rel_id.and_then(|id| self.image_rels.get(&id).copied()) else {
            return;
        };
        let mut image = ImageRef::new(seq);
        if let Some((w, h)) = self.extent.take() {
            image = image.with_dimensions(w, h);
        }
        if let Some(p) = self.paragraphs.last_mut() {
            p.paragraph.add_image(image);
        }
    }

    fn end_object(&mut self) {
        if let (Some(start), true) = (self.object_start.take(), self.object_equation) {
            if let Some(p) = self.paragraphs.last_mut() {
                for inline in p.paragraph.content.iter_mut().skip(start) {
                    if let InlineContent::Image(img) = inline {
                        img.equation = true;
                    }
                }
            }
        }
        self.object_equation = false;
    }

    fn end_paragraph(&mut self) {
        let Some(mut builder) = self.paragraphs.pop() else { return };
        if let Some(num_id) = builder.num_id.as_deref() {
            if let Some(label) = self.counters.next_label(self.numbering, num_id, builder.ilvl) {
                let style = TextStyle {
                    bold: builder.mark_bold,
                    ..Default::default()
                };
                builder
                    .paragraph
                    .content
                    .insert(0, InlineContent::Text(TextRun::new(format!("{} ", label)).with_style(style)));
                merge_adjacent_runs(&mut builder.paragraph);
            }
        }
        let paragraph = builder.paragraph;

        // Text box paragraphs nest inside the paragraph that anchors them
        if let Some(parent) = self.paragraphs.last_mut() {
            if !paragraph.is_empty() {
                parent.paragraph.add_line_break();
                parent.paragraph.content.extend(paragraph.content);
            }
            return;
        }
        if let Some(cell) = self.tables.last_mut().and_then(|t| t.cell.as_mut()) {
            cell.paragraphs.push(paragraph);
            return;
        }
        self.blocks.push(Block::Paragraph(paragraph));
    }

    fn end_table(&mut self) {
        let Some(builder) = self.tables.pop() else { return };
        let table = builder.table;
        // Nested tables are flattened into the enclosing cell
        if let Some(cell) = self.tables.last_mut().and_then(|t| t.cell.as_mut()) {
            cell.paragraphs.extend(table.paragraphs().cloned());
            return;
        }
        self.blocks.push(Block::Table(table));
    }
}

fn push_run(paragraph: &mut Paragraph, text: &str, style: TextStyle) {
    if let Some(InlineContent::Text(last)) = paragraph.content.last_mut() {
        if last.style == style {
            last.text.push_str(text);
            return;
        }
    }
    paragraph.add_run(TextRun::new(text).with_style(style));
}

fn merge_adjacent_runs(paragraph: &mut Paragraph) {
    let content = std::mem::take(&mut paragraph.content);
    for inline in content {
        match inline {
            InlineContent::Text(run) => push_run(paragraph, &run.text, run.style),
            other => paragraph.content.push(other),
        }
    }
}

static PARAGRAPH_END: Lazy<Regex> = Lazy::new(|| Regex::new(r"</w:p>|<w:br\s*/>").unwrap());
static TAB: Lazy<Regex> = Lazy::new(|| Regex::new(r"<w:tab\s*/>").unwrap());
static TAG: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^>]*>").unwrap());

/// Best-effort text recovery from a malformed `document.xml`.
fn salvage_text(xml: &str) -> String {
    let text = PARAGRAPH_END.replace_all(xml, "\n");
    let text = TAB.replace_all(&text, " ");
    let text = TAG.replace_all(&text, "");
    text.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&apos;", "'")
        .replace("&amp;", "&")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn walk(body: &str) -> Vec<Block> {
        let rels = HashMap::from([("rId5".to_string(), 1u32)]);
        let numbering = NumberingDefinitions::default();
        let xml = format!("<w:document><w:body>{}</w:body></w:document>", body);
        BodyWalker::new(&rels, &numbering).walk(&xml).unwrap()
    }

    fn paragraph(block: &Block) -> &Paragraph {
        match block {
            Block::Paragraph(p) => p,
            other => panic!("expected paragraph, got {:?}", other),
        }
    }

    #[test]
    fn test_runs_and_bold() {
        let blocks = walk(
            "<w:p><w:r><w:t xml:space=\"preserve\">A) 3 </w:t></w:r>\
             <w:r><w:rPr><w:b/></w:rPr><w:t>B) 4</w:t></w:r>\
             <w:r><w:rPr><w:b w:val=\"0\"/></w:rPr><w:t xml:space=\"preserve\"> C) 5</w:t></w:r></w:p>",
        );
        let p = paragraph(&blocks[0]);
        assert_eq!(p.plain_text(), "A) 3 B) 4 C) 5");
        match &p.content[1] {
            InlineContent::Text(run) => {
                assert_eq!(run.text, "B) 4");
                assert!(run.style.bold);
            }
            other => panic!("unexpected {:?}", other),
        }
        assert_eq!(p.content.len(), 3);
    }

    #[test]
    fn test_highlight_and_vert_align() {
        let blocks = walk(
            "<w:p><w:r><w:rPr><w:highlight w:val=\"yellow\"/></w:rPr><w:t>D) 6</w:t></w:r>\
             <w:r><w:t>H</w:t></w:r><w:r><w:rPr><w:vertAlign w:val=\"subscript\"/></w:rPr><w:t>2</w:t></w:r></w:p>",
        );
        let p = paragraph(&blocks[0]);
        let styles: Vec<TextStyle> = p
            .content
            .iter()
            .filter_map(|c| match c {
                InlineContent::Text(r) => Some(r.style),
                _ => None,
            })
            .collect();
        assert!(styles[0].highlight);
        assert_eq!(styles[2].script, Script::Subscript);
    }

    #[test]
    fn test_drawing_image_with_extent() {
        let blocks = walk(
            "<w:p><w:r><w:drawing><wp:inline><wp:extent cx=\"952500\" cy=\"476250\"/>\
             <a:graphic><a:graphicData><pic:pic><pic:blipFill><a:blip r:embed=\"rId5\"/></pic:blipFill>\
             </pic:pic></a:graphicData></a:graphic></wp:inline></w:drawing></w:r></w:p>",
        );
        let p = paragraph(&blocks[0]);
        let img = p.images().next().unwrap();
        assert_eq!(img.seq, 1);
        assert_eq!((img.width, img.height), (Some(100), Some(50)));
    }

    #[test]
    fn test_fallback_branch_skipped() {
        let blocks = walk(
            "<w:p><w:r><mc:AlternateContent><mc:Choice><w:drawing><a:blip r:embed=\"rId5\"/></w:drawing></mc:Choice>\
             <mc:Fallback><w:pict><v:imagedata r:id=\"rId5\"/></w:pict></mc:Fallback></mc:AlternateContent></w:r></w:p>",
        );
        assert_eq!(paragraph(&blocks[0]).images().count(), 1);
    }

    #[test]
    fn test_ole_equation_preview() {
        let blocks = walk(
            "<w:p><w:r><w:object><v:shape style=\"width:30pt;height:15pt\"><v:imagedata r:id=\"rId5\"/></v:shape>\
             <o:OLEObject ProgID=\"Equation.3\"/></w:object></w:r></w:p>",
        );
        let img = paragraph(&blocks[0]).images().next().cloned().unwrap();
        assert!(img.equation);
        assert_eq!((img.width, img.height), (Some(40), Some(20)));
    }

    #[test]
    fn test_table_cells() {
        let blocks = walk(
            "<w:tbl><w:tr><w:tc><w:tcPr><w:gridSpan w:val=\"2\"/></w:tcPr><w:p><w:r><w:t>Jadval</w:t></w:r></w:p></w:tc></w:tr>\
             <w:tr><w:tc><w:p><w:r><w:t>a</w:t></w:r></w:p></w:tc><w:tc><w:p><w:r><w:t>b</w:t></w:r></w:p></w:tc></w:tr></w:tbl>",
        );
        match &blocks[0] {
            Block::Table(t) => {
                assert_eq!(t.rows[0].cells[0].colspan, 2);
                assert_eq!(t.text_rows()[1], vec!["a", "b"]);
            }
            other => panic!("expected table, got {:?}", other),
        }
    }

    #[test]
    fn test_math_inline() {
        let blocks = walk(
            "<w:p><w:r><w:t xml:space=\"preserve\">Hisoblang: </w:t></w:r><m:oMath><m:sSup><m:e><m:r><m:t>x</m:t></m:r></m:e>\
             <m:sup><m:r><m:t>2</m:t></m:r></m:sup></m:sSup></m:oMath></w:p>",
        );
        let p = paragraph(&blocks[0]);
        match &p.content[1] {
            InlineContent::Math(m) => assert_eq!(m.source, "x^{2}"),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_unbalanced_body_is_error() {
        let rels = HashMap::new();
        let numbering = NumberingDefinitions::default();
        let result = BodyWalker::new(&rels, &numbering).walk("<w:body><w:p><w:r><w:t>x</w:r></w:body>");
        assert!(result.is_err());
    }

    #[test]
    fn test_salvage_text() {
        let xml = "<w:p><w:r><w:t>1. Savol &amp; javob</w:t></w:r></w:p><w:p><w:t>A) bir";
        assert_eq!(salvage_text(xml), "1. Savol & javob\nA) bir");
    }

    #[test]
    fn test_resolve_target() {
        assert_eq!(resolve_target("media/image1.png"), "word/media/image1.png");
        assert_eq!(resolve_target("/word/media/image2.png"), "word/media/image2.png");
    }

    #[test]
    fn test_vml_lengths() {
        assert_eq!(vml_style_size("width:72pt;height:36pt"), Some((96, 48)));
        assert_eq!(vml_style_size("position:absolute"), None);
    }
}
