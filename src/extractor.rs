use crate::util::{ElementRefExt, StrExt};
use log::{debug, info};
use scraper::{ElementRef, Html, Selector};

#[derive(Debug, thiserror::Error)]
pub enum ExtractorError {
    #[error("No `dev_page_content` element found in document")]
    NoContentRoot,
    #[error("No `Recent changes` found in document")]
    NoRecentChanges,
    #[error("No version string found in document")]
    NoVersion,
    #[error("Table in `{block}` has a row with {found} cells, expected {expected}")]
    TruncatedRow {
        block: String,
        expected: usize,
        found: usize,
    },
}

/// Tags that make up the flat element sequence under the content root.
/// Everything else (section anchors, script tags, images) is ignored.
const SCANNED_TAGS: &[&str] = &["h3", "h4", "p", "blockquote", "table"];

/// Heading text that opens the method part of the document. Everything
/// before it is changelog and prose.
const METHOD_SECTIONS_START: &str = "Getting updates";

/// Prose sections that share the heading level with objects and methods
/// and must never be picked up by the heading-only pass.
const EXCLUDED_HEADINGS: &[&str] = &[
    "Sending files",
    "Formatting options",
    "Inline mode objects",
    "Inline mode methods",
    "Accent colors",
    "Profile accent colors",
];

pub struct Extractor {
    doc: Html,
}

impl Extractor {
    pub fn from_str(s: &str) -> Self {
        Self {
            doc: Html::parse_document(s),
        }
    }

    pub fn extract(&self) -> Result<Extracted<'_>, ExtractorError> {
        let content = Selector::parse("#dev_page_content").unwrap();
        let root = self
            .doc
            .select(&content)
            .next()
            .ok_or(ExtractorError::NoContentRoot)?;
        let elements = scan_elements(root);

        let (recent_changes, version) = extract_metadata(&elements)?;

        let mut objects = Vec::new();
        let mut methods = Vec::new();
        for block in segment_tables(&elements) {
            match classify(&block) {
                BlockKind::Object => objects.push(RawObject {
                    name: block.heading,
                    description: block.description(),
                    fields: extract_fields(&block)?,
                }),
                BlockKind::Method => methods.push(RawMethod {
                    name: block.heading,
                    description: block.description(),
                    args: extract_args(&block)?,
                }),
                BlockKind::Dropped => {
                    debug!("dropped block `{}`", block.heading.plain_text());
                }
            }
        }

        for block in segment_bare_headings(&elements) {
            methods.push(RawMethod {
                name: block.heading,
                description: block.description(),
                args: vec![],
            });
        }

        info!(
            "extracted {} objects and {} methods",
            objects.len(),
            methods.len()
        );

        Ok(Extracted {
            recent_changes,
            version,
            objects,
            methods,
        })
    }
}

fn scan_elements(root: ElementRef<'_>) -> Vec<ElementRef<'_>> {
    root.children()
        .filter_map(ElementRef::wrap)
        .filter(|elem| SCANNED_TAGS.contains(&elem.value().name()))
        .collect()
}

fn extract_metadata(elements: &[ElementRef<'_>]) -> Result<(String, String), ExtractorError> {
    enum State {
        SearchRecentChanges,
        GetRecentChange,
        GetVersion { recent_changes: String },
    }

    let mut state = State::SearchRecentChanges;
    for elem in elements {
        let tag = elem.value().name();
        state = match state {
            State::SearchRecentChanges
                if tag == "h3" && elem.plain_text() == "Recent changes" =>
            {
                State::GetRecentChange
            }
            State::GetRecentChange if tag == "h4" => State::GetVersion {
                recent_changes: elem.plain_text(),
            },
            State::GetVersion { recent_changes } if tag == "p" => {
                return Ok((recent_changes, elem.plain_text()));
            }
            x => x,
        };
    }

    match state {
        State::SearchRecentChanges => Err(ExtractorError::NoRecentChanges),
        _ => Err(ExtractorError::NoVersion),
    }
}

/// One contiguous run of sibling elements anchored by a heading.
pub(crate) struct Block<'a> {
    pub(crate) heading: ElementRef<'a>,
    pub(crate) body: Vec<ElementRef<'a>>,
}

impl<'a> Block<'a> {
    fn table(&self) -> Option<ElementRef<'a>> {
        self.body
            .iter()
            .copied()
            .find(|elem| elem.value().name() == "table")
    }

    fn description(&self) -> RawDescription<'a> {
        RawDescription(
            self.body
                .iter()
                .copied()
                .filter(|elem| matches!(elem.value().name(), "p" | "blockquote"))
                .collect(),
        )
    }
}

fn is_heading(elem: ElementRef<'_>) -> bool {
    matches!(elem.value().name(), "h3" | "h4")
}

/// Groups the element sequence into table-bearing blocks. A heading closes
/// the current run only once the run holds a table; a heading arriving
/// before any table discards the stale run and re-anchors. A trailing run
/// without a table is not yielded.
pub(crate) fn segment_tables<'a>(elements: &[ElementRef<'a>]) -> Vec<Block<'a>> {
    enum State<'a> {
        Seeking,
        Collecting {
            heading: ElementRef<'a>,
            body: Vec<ElementRef<'a>>,
            has_table: bool,
        },
    }

    let mut blocks = Vec::new();
    let mut state = State::Seeking;
    for &elem in elements {
        state = match state {
            State::Seeking if is_heading(elem) => State::Collecting {
                heading: elem,
                body: vec![],
                has_table: false,
            },
            State::Seeking => State::Seeking,
            State::Collecting {
                heading,
                body,
                has_table,
            } if is_heading(elem) => {
                if has_table {
                    blocks.push(Block { heading, body });
                }
                State::Collecting {
                    heading: elem,
                    body: vec![],
                    has_table: false,
                }
            }
            State::Collecting {
                heading,
                mut body,
                has_table,
            } => {
                let has_table = has_table || elem.value().name() == "table";
                body.push(elem);
                State::Collecting {
                    heading,
                    body,
                    has_table,
                }
            }
        };
    }

    if let State::Collecting {
        heading,
        body,
        has_table: true,
    } = state
    {
        blocks.push(Block { heading, body });
    }

    blocks
}

fn is_bare_method_heading(elem: ElementRef<'_>) -> bool {
    if elem.value().name() != "h4" {
        return false;
    }
    let name = elem.plain_text();
    name.is_first_letter_lowercase()
        && !name.chars().any(char::is_whitespace)
        && !EXCLUDED_HEADINGS.contains(&name.as_str())
}

/// Groups the element sequence into heading-only blocks: parameterless
/// methods. Candidates open only after the `Getting updates` sentinel, at
/// lowerCamelCase headings; a table inside a candidate disqualifies it
/// (that block belongs to the table pass).
pub(crate) fn segment_bare_headings<'a>(elements: &[ElementRef<'a>]) -> Vec<Block<'a>> {
    enum State<'a> {
        BeforeSentinel,
        Seeking,
        Collecting {
            heading: ElementRef<'a>,
            body: Vec<ElementRef<'a>>,
            has_table: bool,
        },
    }

    let mut blocks = Vec::new();
    let mut state = State::BeforeSentinel;
    for &elem in elements {
        state = match state {
            State::BeforeSentinel
                if elem.value().name() == "h3"
                    && elem.plain_text() == METHOD_SECTIONS_START =>
            {
                State::Seeking
            }
            State::BeforeSentinel => State::BeforeSentinel,
            State::Seeking if is_bare_method_heading(elem) => State::Collecting {
                heading: elem,
                body: vec![],
                has_table: false,
            },
            State::Seeking => State::Seeking,
            State::Collecting {
                heading,
                body,
                has_table,
            } if is_heading(elem) => {
                if !has_table {
                    blocks.push(Block { heading, body });
                }
                if is_bare_method_heading(elem) {
                    State::Collecting {
                        heading: elem,
                        body: vec![],
                        has_table: false,
                    }
                } else {
                    State::Seeking
                }
            }
            State::Collecting {
                heading,
                mut body,
                has_table,
            } => {
                let has_table = has_table || elem.value().name() == "table";
                body.push(elem);
                State::Collecting {
                    heading,
                    body,
                    has_table,
                }
            }
        };
    }

    if let State::Collecting {
        heading,
        body,
        has_table: false,
    } = state
    {
        blocks.push(Block { heading, body });
    }

    blocks
}

#[derive(Debug, PartialEq)]
pub(crate) enum BlockKind {
    Object,
    Method,
    Dropped,
}

pub(crate) fn classify(block: &Block<'_>) -> BlockKind {
    let th = Selector::parse("thead > tr > th").unwrap();
    let table = match block.table() {
        Some(table) => table,
        None => return BlockKind::Dropped,
    };
    let headers: Vec<String> = table.select(&th).map(|elem| elem.plain_text()).collect();
    let name = block.heading.plain_text();

    if headers.iter().any(|h| h == "Field") && !name.is_first_letter_lowercase() {
        BlockKind::Object
    } else if headers.iter().any(|h| h == "Parameter") && name.is_first_letter_lowercase() {
        BlockKind::Method
    } else {
        BlockKind::Dropped
    }
}

fn table_rows<'a>(
    block: &Block<'a>,
    expected: usize,
) -> Result<Vec<Vec<ElementRef<'a>>>, ExtractorError> {
    let tr = Selector::parse("tbody > tr").unwrap();
    let td = Selector::parse("td").unwrap();

    // classify() guarantees the table is there
    let table = block.table().expect("classified block without table");
    let mut rows = Vec::new();
    for row in table.select(&tr) {
        let cells: Vec<_> = row.select(&td).collect();
        if cells.len() != expected {
            return Err(ExtractorError::TruncatedRow {
                block: block.heading.plain_text(),
                expected,
                found: cells.len(),
            });
        }
        rows.push(cells);
    }

    Ok(rows)
}

fn extract_fields<'a>(block: &Block<'a>) -> Result<Vec<RawField<'a>>, ExtractorError> {
    table_rows(block, 3)?
        .into_iter()
        .map(|cells| {
            Ok(RawField {
                name: cells[0].plain_text(),
                kind: cells[1].plain_text(),
                description: cells[2],
            })
        })
        .collect()
}

fn extract_args<'a>(block: &Block<'a>) -> Result<Vec<RawParameter<'a>>, ExtractorError> {
    table_rows(block, 4)?
        .into_iter()
        .map(|cells| {
            Ok(RawParameter {
                name: cells[0].plain_text(),
                kind: cells[1].plain_text(),
                required: cells[2].plain_text(),
                description: cells[3],
            })
        })
        .collect()
}

pub struct Extracted<'a> {
    pub recent_changes: String,
    pub version: String,
    pub objects: Vec<RawObject<'a>>,
    pub methods: Vec<RawMethod<'a>>,
}

#[derive(Debug, Default)]
pub struct RawDescription<'a>(pub Vec<ElementRef<'a>>);

impl RawDescription<'_> {
    pub fn plain_text(&self) -> String {
        self.0
            .iter()
            .map(ElementRefExt::plain_text)
            .collect::<Vec<_>>()
            .join("\n")
    }
}

pub struct RawObject<'a> {
    pub name: ElementRef<'a>,
    pub description: RawDescription<'a>,
    pub fields: Vec<RawField<'a>>,
}

pub struct RawMethod<'a> {
    pub name: ElementRef<'a>,
    pub description: RawDescription<'a>,
    pub args: Vec<RawParameter<'a>>,
}

#[derive(Debug)]
pub struct RawField<'a> {
    pub name: String,
    pub kind: String,
    pub description: ElementRef<'a>,
}

pub struct RawParameter<'a> {
    pub name: String,
    pub kind: String,
    pub required: String,
    pub description: ElementRef<'a>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc(body: &str) -> Html {
        Html::parse_document(&format!(r#"<div id="dev_page_content">{}</div>"#, body))
    }

    fn elements_of(doc: &Html) -> Vec<ElementRef<'_>> {
        let content = Selector::parse("#dev_page_content").unwrap();
        scan_elements(doc.select(&content).next().unwrap())
    }

    const USER_TABLE: &str = r#"<table>
        <thead><tr><th>Field</th><th>Type</th><th>Description</th></tr></thead>
        <tbody>
        <tr><td>id</td><td>Integer</td><td>Unique identifier for this user</td></tr>
        <tr><td>username</td><td>String</td><td>Optional. User's username</td></tr>
        </tbody>
        </table>"#;

    const SEND_TABLE: &str = r#"<table>
        <thead><tr><th>Parameter</th><th>Type</th><th>Required</th><th>Description</th></tr></thead>
        <tbody>
        <tr><td>chat_id</td><td>Integer or String</td><td>Yes</td><td>Target chat</td></tr>
        <tr><td>text</td><td>String</td><td>Yes</td><td>Text of the message</td></tr>
        </tbody>
        </table>"#;

    #[test]
    fn table_pass_drops_trailing_run_without_table() {
        let doc = doc(&format!(
            "<h4>Foo</h4>{t}<h4>Bar</h4>{t}<h4>Baz</h4><p>text</p>",
            t = USER_TABLE
        ));
        let elements = elements_of(&doc);
        let blocks = segment_tables(&elements);
        let names: Vec<String> = blocks
            .iter()
            .map(|block| block.heading.plain_text())
            .collect();
        assert_eq!(names, vec!["Foo", "Bar"]);
    }

    #[test]
    fn table_pass_reanchors_on_tableless_heading() {
        let doc = doc(&format!(
            "<h4>Prose</h4><p>intro</p><h4>User</h4><p>desc</p>{}",
            USER_TABLE
        ));
        let elements = elements_of(&doc);
        let blocks = segment_tables(&elements);
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].heading.plain_text(), "User");
        assert_eq!(blocks[0].body.len(), 2);
    }

    #[test]
    fn classification_is_a_partition() {
        let doc = doc(&format!(
            "<h4>User</h4>{}<h4>sendMessage</h4>{}<h4>Mismatch</h4>{}",
            USER_TABLE, SEND_TABLE, SEND_TABLE
        ));
        let elements = elements_of(&doc);
        let blocks = segment_tables(&elements);
        let kinds: Vec<BlockKind> = blocks.iter().map(classify).collect();
        assert_eq!(
            kinds,
            vec![BlockKind::Object, BlockKind::Method, BlockKind::Dropped]
        );
    }

    #[test]
    fn lowercase_heading_with_field_table_is_dropped() {
        let doc = doc(&format!("<h4>user</h4>{}", USER_TABLE));
        let elements = elements_of(&doc);
        let blocks = segment_tables(&elements);
        assert_eq!(classify(&blocks[0]), BlockKind::Dropped);
    }

    #[test]
    fn field_rows_consume_three_cells() {
        let doc = doc(&format!("<h4>User</h4>{}", USER_TABLE));
        let elements = elements_of(&doc);
        let blocks = segment_tables(&elements);
        let fields = extract_fields(&blocks[0]).unwrap();
        assert_eq!(fields.len(), 2);
        assert_eq!(fields[0].name, "id");
        assert_eq!(fields[0].kind, "Integer");
        assert_eq!(fields[1].name, "username");
    }

    #[test]
    fn arg_rows_consume_four_cells() {
        let doc = doc(&format!("<h4>sendMessage</h4>{}", SEND_TABLE));
        let elements = elements_of(&doc);
        let blocks = segment_tables(&elements);
        let args = extract_args(&blocks[0]).unwrap();
        assert_eq!(args.len(), 2);
        assert_eq!(args[0].required, "Yes");
        assert_eq!(args[1].name, "text");
    }

    #[test]
    fn truncated_row_is_fatal() {
        let doc = doc(
            r#"<h4>Broken</h4><table>
            <thead><tr><th>Field</th><th>Type</th><th>Description</th></tr></thead>
            <tbody><tr><td>id</td><td>Integer</td></tr></tbody>
            </table>"#,
        );
        let elements = elements_of(&doc);
        let blocks = segment_tables(&elements);
        let err = extract_fields(&blocks[0]).unwrap_err();
        assert!(matches!(
            err,
            ExtractorError::TruncatedRow {
                expected: 3,
                found: 2,
                ..
            }
        ));
    }

    #[test]
    fn bare_headings_require_the_sentinel() {
        let doc = doc("<h4>getMe</h4><p>Returns the bot.</p>");
        let elements = elements_of(&doc);
        assert!(segment_bare_headings(&elements).is_empty());
    }

    #[test]
    fn bare_heading_after_sentinel_is_yielded() {
        let doc = doc(
            "<h3>Getting updates</h3>\
             <h4>getMe</h4><p>Returns the bot.</p>\
             <h4>User</h4><p>This object represents a user.</p>",
        );
        let elements = elements_of(&doc);
        let blocks = segment_bare_headings(&elements);
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].heading.plain_text(), "getMe");
        assert_eq!(blocks[0].description().plain_text(), "Returns the bot.");
    }

    #[test]
    fn bare_heading_with_table_is_disqualified() {
        let doc = doc(&format!(
            "<h3>Getting updates</h3><h4>sendMessage</h4><p>Sends.</p>{}<h4>getMe</h4><p>Returns the bot.</p>",
            SEND_TABLE
        ));
        let elements = elements_of(&doc);
        let blocks = segment_bare_headings(&elements);
        let names: Vec<String> = blocks
            .iter()
            .map(|block| block.heading.plain_text())
            .collect();
        assert_eq!(names, vec!["getMe"]);
    }

    #[test]
    fn metadata_is_scraped_from_recent_changes() {
        let doc = doc(
            "<h3>Recent changes</h3><h4>January 1, 2024</h4><p>Bot API 7.0</p>\
             <h3>Getting updates</h3>",
        );
        let elements = elements_of(&doc);
        let (recent_changes, version) = extract_metadata(&elements).unwrap();
        assert_eq!(recent_changes, "January 1, 2024");
        assert_eq!(version, "Bot API 7.0");
    }

    #[test]
    fn missing_content_root_is_fatal() {
        let extractor = Extractor::from_str("<html><body><p>nothing</p></body></html>");
        assert!(matches!(
            extractor.extract(),
            Err(ExtractorError::NoContentRoot)
        ));
    }
}
