//! Tests over DOCX containers built in memory.

use std::collections::HashMap;
use std::io::{Cursor, Write};
use std::sync::Arc;

use unquiz::media::{Collaborators, FsMediaStore, MemoryMediaStore};
use unquiz::{
    parse_bytes, parse_with_context, DiagnosticKind, DocxParser, Document, EquationExtractor,
    ErrorMode, MediaPosition, ParseContext, ParseOptions,
};
use zip::write::SimpleFileOptions;
use zip::ZipWriter;

const PNG_1X1: &[u8] = &[
    0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, 0x00, 0x00, 0x00, 0x0D, 0x49, 0x48, 0x44, 0x52,
    0x00, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00, 0x01, 0x08, 0x06, 0x00, 0x00, 0x00, 0x1F, 0x15, 0xC4,
    0x89, 0x00, 0x00, 0x00, 0x0D, 0x49, 0x44, 0x41, 0x54, 0x78, 0x9C, 0x63, 0x00, 0x01, 0x00, 0x00,
    0x05, 0x00, 0x01, 0x0D, 0x0A, 0x2D, 0xB4, 0x00, 0x00, 0x00, 0x00, 0x49, 0x45, 0x4E, 0x44, 0xAE,
    0x42, 0x60, 0x82,
];

const RELS: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
  <Relationship Id="rId5" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/image" Target="media/image1.png"/>
  <Relationship Id="rId9" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/hyperlink" Target="https://example.org" TargetMode="External"/>
</Relationships>"#;

const NUMBERING: &str = r#"<w:numbering xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main">
  <w:abstractNum w:abstractNumId="0">
    <w:lvl w:ilvl="0"><w:start w:val="1"/><w:numFmt w:val="decimal"/><w:lvlText w:val="%1."/></w:lvl>
    <w:lvl w:ilvl="1"><w:start w:val="1"/><w:numFmt w:val="upperLetter"/><w:lvlText w:val="%2)"/></w:lvl>
  </w:abstractNum>
  <w:num w:numId="1"><w:abstractNumId w:val="0"/></w:num>
</w:numbering>"#;

struct Docx {
    body: String,
    numbering: bool,
    media: Vec<(&'static str, Vec<u8>)>,
}

impl Docx {
    fn new() -> Self {
        Self {
            body: String::new(),
            numbering: false,
            media: Vec::new(),
        }
    }

    fn paragraph(mut self, xml: &str) -> Self {
        self.body.push_str(&format!("<w:p>{}</w:p>", xml));
        self
    }

    fn raw(mut self, xml: &str) -> Self {
        self.body.push_str(xml);
        self
    }

    fn with_numbering(mut self) -> Self {
        self.numbering = true;
        self
    }

    fn with_image(mut self) -> Self {
        self.media.push(("word/media/image1.png", PNG_1X1.to_vec()));
        self
    }

    fn build(self) -> Vec<u8> {
        let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
        let options = SimpleFileOptions::default();

        let document = format!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main"
            xmlns:m="http://schemas.openxmlformats.org/officeDocument/2006/math"
            xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships"
            xmlns:wp="http://schemas.openxmlformats.org/drawingml/2006/wordprocessingDrawing"
            xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main"
            xmlns:pic="http://schemas.openxmlformats.org/drawingml/2006/picture"><w:body>{}</w:body></w:document>"#,
            self.body
        );
        zip.start_file("word/document.xml", options).unwrap();
        zip.write_all(document.as_bytes()).unwrap();

        zip.start_file("word/_rels/document.xml.rels", options).unwrap();
        zip.write_all(RELS.as_bytes()).unwrap();

        if self.numbering {
            zip.start_file("word/numbering.xml", options).unwrap();
            zip.write_all(NUMBERING.as_bytes()).unwrap();
        }
        for (name, data) in &self.media {
            zip.start_file(*name, options).unwrap();
            zip.write_all(data).unwrap();
        }
        zip.finish().unwrap().into_inner()
    }
}

fn text(t: &str) -> String {
    format!(r#"<w:r><w:t xml:space="preserve">{}</w:t></w:r>"#, t)
}

fn bold(t: &str) -> String {
    format!(r#"<w:r><w:rPr><w:b/></w:rPr><w:t xml:space="preserve">{}</w:t></w:r>"#, t)
}

fn highlighted(t: &str) -> String {
    format!(
        r#"<w:r><w:rPr><w:highlight w:val="yellow"/></w:rPr><w:t xml:space="preserve">{}</w:t></w:r>"#,
        t
    )
}

fn image() -> String {
    r#"<w:r><w:drawing><wp:inline><wp:extent cx="952500" cy="476250"/><a:graphic><a:graphicData><pic:pic><pic:blipFill><a:blip r:embed="rId5"/></pic:blipFill></pic:pic></a:graphicData></a:graphic></wp:inline></w:drawing></w:r>"#.to_string()
}

fn equation_object() -> String {
    r#"<w:r><w:object><v:shape style="width:30pt;height:15pt"><v:imagedata r:id="rId5"/></v:shape><o:OLEObject ProgID="Equation.3"/></w:object></w:r>"#.to_string()
}

/// Reports every equation preview as one half.
struct HalfExtractor;

impl EquationExtractor for HalfExtractor {
    fn extract(&self, doc: &Document) -> HashMap<u32, String> {
        doc.equation_previews()
            .into_iter()
            .map(|seq| (seq, "\\frac{1}{2}".to_string()))
            .collect()
    }
}

fn superscript_math() -> String {
    "<m:oMath><m:sSup><m:e><m:r><m:t>x</m:t></m:r></m:e><m:sup><m:r><m:t>2</m:t></m:r></m:sup></m:sSup></m:oMath>"
        .to_string()
}

#[test]
fn test_bold_and_highlight_mark_answers() {
    let data = Docx::new()
        .paragraph(&format!("{}{}{}", text("1) 2+2=? A) 3 "), bold("B) 4"), text(" C) 5 D) 6")))
        .paragraph(&format!("{}{}", text("2) Poytaxt? A) Samarqand B) Buxoro "), highlighted("C) Toshkent")))
        .build();

    let outcome = parse_bytes(&data).unwrap();
    assert_eq!(outcome.questions.len(), 2);
    assert_eq!(outcome.questions[0].correct_answer, "B");
    assert_eq!(outcome.questions[0].variant('B').map(|v| v.text.as_str()), Some("4"));
    assert_eq!(outcome.questions[1].correct_answer, "C");
    assert_eq!(outcome.questions[1].variants.len(), 3);
}

#[test]
fn test_omml_math_restored() {
    let data = Docx::new()
        .paragraph(&format!(
            "{}{}{}",
            text("1) "),
            superscript_math(),
            text(" ni hisoblang? A) 1 B) 2 C) 3 D) 4")
        ))
        .build();

    let outcome = parse_bytes(&data).unwrap();
    let q = &outcome.questions[0];
    assert!(q.text.contains("\\(x^{2}\\)"), "text: {}", q.text);
    assert!(q.text.ends_with("ni hisoblang?"));
    assert_eq!(q.variants.len(), 4);
    assert_eq!(outcome.stats.math_count, 1);

    let kinds: Vec<_> = outcome.diagnostics.iter().map(|d| d.kind).collect();
    assert_eq!(kinds, vec![DiagnosticKind::UnmarkedAnswer]);
}

#[test]
fn test_image_linked_with_display_size() {
    let data = Docx::new()
        .with_image()
        .paragraph(&format!("{}{}", text("1) Rasmga qarang:"), image()))
        .paragraph(&text("A) 10"))
        .paragraph(&bold("B) 20"))
        .paragraph(&text("C) 30"))
        .paragraph(&text("D) 40"))
        .build();

    let store = Arc::new(MemoryMediaStore::new());
    let ctx = ParseContext::new(ParseOptions::default())
        .with_collaborators(Collaborators::new(store.clone()));
    let outcome = parse_with_context(&data, &ctx).unwrap();

    let q = &outcome.questions[0];
    assert_eq!(q.text, "Rasmga qarang:");
    assert_eq!(q.correct_answer, "B");
    assert_eq!(q.media.len(), 1);
    assert_eq!(q.media[0].position, MediaPosition::AfterText);
    assert_eq!((q.media[0].width, q.media[0].height), (Some(100), Some(50)));

    let url = q.media[0].url.as_deref().unwrap();
    assert_eq!(store.get(url).as_deref(), Some(PNG_1X1));
    assert_eq!(outcome.stats.image_count, 1);

    // A wide image counts as a scan once the ratio drops below its shape
    let ctx = ParseContext::new(ParseOptions::default().with_scan_threshold(0.4, 10));
    let outcome = parse_with_context(&data, &ctx).unwrap();
    assert!(outcome.questions[0].media.is_empty());
    assert_eq!(outcome.stats.skipped_media, 1);
}

#[test]
fn test_equation_preview_becomes_math() {
    let data = Docx::new()
        .with_image()
        .paragraph(&format!("{}{}{}", text("1) Hisoblang: "), equation_object(), text(" A) 1 B) 2")))
        .build();

    let doc = DocxParser::from_reader(Cursor::new(data.clone())).unwrap().parse().unwrap();
    assert_eq!(doc.equation_previews(), vec![1]);

    let store = Arc::new(MemoryMediaStore::new());
    let collaborators = Collaborators::new(store.clone()).with_equation_extractor(Arc::new(HalfExtractor));
    let ctx = ParseContext::default().with_collaborators(collaborators);
    let outcome = parse_with_context(&data, &ctx).unwrap();

    let q = &outcome.questions[0];
    assert_eq!(q.text, "Hisoblang: \\(\\frac{1}{2}\\)");
    assert!(q.media.is_empty());
    assert!(store.is_empty());
}

#[test]
fn test_images_written_to_directory() {
    let dir = tempfile::tempdir().unwrap();
    let data = Docx::new()
        .with_image()
        .paragraph(&text("1) Qaysi?"))
        .paragraph(&format!("{}{}", text("A) "), image()))
        .paragraph(&text("B) ikkinchi"))
        .build();

    let store = FsMediaStore::new(dir.path()).with_url_prefix("/uploads");
    let ctx = ParseContext::new(ParseOptions::default().with_error_mode(ErrorMode::Strict))
        .with_collaborators(Collaborators::new(Arc::new(store)));
    let outcome = parse_with_context(&data, &ctx).unwrap();

    let variant = outcome.questions[0].variant('A').unwrap();
    let url = variant.image_url.as_deref().unwrap();
    assert!(url.starts_with("/uploads/") && url.ends_with(".png"));
    assert_eq!(variant.image_width, Some(100));

    let name = url.trim_start_matches("/uploads/");
    assert_eq!(std::fs::read(dir.path().join(name)).unwrap(), PNG_1X1);
}

#[test]
fn test_text_only_skips_media() {
    let data = Docx::new()
        .with_image()
        .paragraph(&format!("{}{}", text("1) Rasm"), image()))
        .paragraph(&text("A) 1 B) 2"))
        .build();

    let store = Arc::new(MemoryMediaStore::new());
    let ctx = ParseContext::new(ParseOptions::default().text_only())
        .with_collaborators(Collaborators::new(store.clone()));
    let outcome = parse_with_context(&data, &ctx).unwrap();

    assert!(outcome.questions[0].media.is_empty());
    assert_eq!(outcome.questions[0].text, "Rasm");
    assert!(store.is_empty());
}

#[test]
fn test_list_numbering_materialized() {
    let numbered = |level: u32, run: String| {
        format!(
            r#"<w:pPr><w:numPr><w:ilvl w:val="{}"/><w:numId w:val="1"/></w:numPr></w:pPr>{}"#,
            level, run
        )
    };
    let data = Docx::new()
        .with_numbering()
        .paragraph(&numbered(0, text("Birinchi savol")))
        .paragraph(&numbered(1, text("bir")))
        .paragraph(&numbered(1, bold("ikki")))
        .paragraph(&numbered(0, text("Ikkinchi savol")))
        .paragraph(&numbered(1, bold("uch")))
        .paragraph(&numbered(1, text("to'rt")))
        .build();

    let outcome = parse_bytes(&data).unwrap();
    assert_eq!(outcome.questions.len(), 2);
    assert_eq!(outcome.questions[0].text, "Birinchi savol");
    assert_eq!(outcome.questions[0].correct_answer, "B");
    assert_eq!(outcome.questions[1].original_number, Some(2));
    assert_eq!(outcome.questions[1].correct_answer, "A");
    assert_eq!(outcome.questions[1].variant('B').map(|v| v.text.as_str()), Some("to'rt"));
}

#[test]
fn test_data_table_attached_as_html() {
    let table = format!(
        "<w:tbl><w:tr><w:tc><w:p>{}</w:p></w:tc><w:tc><w:p>{}</w:p></w:tc></w:tr>\
         <w:tr><w:tc><w:p>{}</w:p></w:tc><w:tc><w:p>{}</w:p></w:tc></w:tr></w:tbl>",
        text("Modda"),
        text("Massa"),
        text("suv"),
        text("18")
    );
    let data = Docx::new()
        .paragraph(&text("1) Jadvalga qarang:"))
        .raw(&table)
        .paragraph(&text("A) 16 B) 18"))
        .build();

    let outcome = parse_bytes(&data).unwrap();
    let q = &outcome.questions[0];
    assert_eq!(q.media.len(), 1);
    assert!(q.media[0].url.is_none());
    let html = q.media[0].html.as_deref().unwrap();
    assert!(html.contains("<td>Modda</td>"));
    assert_eq!(outcome.stats.table_count, 1);
}

#[test]
fn test_layout_table_inlined() {
    let table = format!(
        "<w:tbl><w:tr><w:tc><w:p>{}</w:p></w:tc><w:tc><w:p>{}</w:p></w:tc><w:tc><w:p>{}</w:p></w:tc></w:tr></w:tbl>",
        text("1) Savol"),
        text("A) bir"),
        bold("B) ikki")
    );
    let outcome = parse_bytes(&Docx::new().raw(&table).build()).unwrap();
    assert_eq!(outcome.questions.len(), 1);
    assert!(outcome.questions[0].media.is_empty());
    assert_eq!(outcome.questions[0].correct_answer, "B");
}

#[test]
fn test_malformed_body_falls_back_to_text() {
    let data = Docx::new()
        .raw("<w:p><w:r><w:t>1) Savol A) 1 B) 2</w:t></w:r></w:p><w:p><w:r>")
        .build();
    let doc = DocxParser::from_bytes(data.clone()).unwrap().parse().unwrap();
    assert!(!doc.has_tree());

    let outcome = parse_bytes(&data).unwrap();
    assert_eq!(outcome.questions.len(), 1);
    assert_eq!(outcome.questions[0].variants.len(), 2);
}

#[test]
fn test_missing_document_part() {
    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    zip.start_file("word/styles.xml", SimpleFileOptions::default()).unwrap();
    zip.write_all(b"<w:styles/>").unwrap();
    let data = zip.finish().unwrap().into_inner();

    assert!(matches!(parse_bytes(&data), Err(unquiz::Error::MissingPart(_))));
}
