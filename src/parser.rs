use crate::{
    extractor::{Extracted, RawField, RawMethod, RawObject, RawParameter},
    util::ElementRefExt,
    BOT_API_DOCS_URL,
};
use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;
use scraper::ElementRef;
use std::collections::HashSet;

type Result<T> = std::result::Result<T, ParseError>;

#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    #[error("Invalid Required: {0}")]
    InvalidRequired(String),
    #[error("Failed to extract response type from description: {0:?}")]
    ResponseTypeNotFound(String),
    #[error("Duplicate declaration name: {0}")]
    DuplicateName(String),
    #[error("chrono: {0}")]
    ChronoParse(
        #[from]
        #[source]
        chrono::ParseError,
    ),
    #[error("SemVer: {0}")]
    SemVer(
        #[from]
        #[source]
        semver::Error,
    ),
}

pub fn parse(raw: Extracted) -> Result<Parsed> {
    let recent_changes = NaiveDate::parse_from_str(&raw.recent_changes, "%B %e, %Y")?;
    let version = parse_version(&raw.version)?;
    let objects = raw
        .objects
        .into_iter()
        .map(parse_object)
        .collect::<Result<Vec<_>>>()?;
    let methods = raw
        .methods
        .into_iter()
        .map(parse_method)
        .collect::<Result<Vec<_>>>()?;

    check_unique_names(objects.iter().map(|object| object.name.as_str()))?;
    check_unique_names(methods.iter().map(|method| method.name.as_str()))?;

    Ok(Parsed {
        recent_changes,
        version,
        objects,
        methods,
    })
}

fn parse_version(version: &str) -> Result<semver::Version> {
    let version = version
        .chars()
        .skip_while(|c| !c.is_ascii_digit())
        .collect::<String>()
        .trim_end_matches('.')
        .to_string()
        + ".0";
    Ok(semver::Version::parse(&version)?)
}

fn check_unique_names<'a, I: Iterator<Item = &'a str>>(names: I) -> Result<()> {
    let mut seen = HashSet::new();
    for name in names {
        if !seen.insert(name) {
            return Err(ParseError::DuplicateName(name.to_string()));
        }
    }
    Ok(())
}

fn parse_object(raw_object: RawObject) -> Result<Object> {
    let fields = raw_object
        .fields
        .into_iter()
        .map(parse_field)
        .collect::<Result<_>>()?;
    Ok(Object {
        name: raw_object.name.plain_text(),
        description: raw_object.description.plain_text(),
        fields,
        docs_link: docs_link(&raw_object.name),
    })
}

fn parse_field(raw_field: RawField) -> Result<Field> {
    let description = raw_field.description.plain_text();
    let required = !description.starts_with("Optional.");
    Ok(Field {
        name: raw_field.name,
        kind: raw_field.kind,
        required,
        description,
    })
}

fn parse_method(raw_method: RawMethod) -> Result<Method> {
    let description = raw_method.description.plain_text();
    let return_type = infer_return_type(&description)?;
    let parameters = raw_method
        .args
        .into_iter()
        .map(parse_parameter)
        .collect::<Result<_>>()?;
    Ok(Method {
        name: raw_method.name.plain_text(),
        description,
        parameters,
        return_type,
        docs_link: docs_link(&raw_method.name),
    })
}

fn parse_parameter(raw_arg: RawParameter) -> Result<Parameter> {
    let required = match raw_arg.required.as_str() {
        "Yes" => true,
        "Optional" => false,
        _ => return Err(ParseError::InvalidRequired(raw_arg.required)),
    };
    Ok(Parameter {
        name: raw_arg.name,
        kind: raw_arg.kind,
        required,
        description: raw_arg.description.plain_text(),
    })
}

fn docs_link(heading: &ElementRef<'_>) -> Option<String> {
    let href = heading.a_href()?;
    if href.starts_with('#') {
        Some(format!("{}{}", BOT_API_DOCS_URL, href))
    } else {
        Some(href)
    }
}

#[derive(Debug, Clone)]
pub struct Parsed {
    pub recent_changes: NaiveDate,
    pub version: semver::Version,
    pub objects: Vec<Object>,
    pub methods: Vec<Method>,
}

#[derive(Debug, Clone)]
pub struct Object {
    pub name: String,
    pub description: String,
    pub fields: Vec<Field>,
    pub docs_link: Option<String>,
}

#[derive(Debug, Clone)]
pub struct Field {
    pub name: String,
    /// Raw documentation type string, resolved at emit time.
    pub kind: String,
    pub required: bool,
    pub description: String,
}

#[derive(Debug, Clone)]
pub struct Method {
    pub name: String,
    pub description: String,
    pub parameters: Vec<Parameter>,
    pub return_type: ReturnType,
    pub docs_link: Option<String>,
}

#[derive(Debug, Clone)]
pub struct Parameter {
    pub name: String,
    pub kind: String,
    pub required: bool,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ReturnType {
    pub name: String,
    pub array: bool,
}

impl ReturnType {
    pub fn rust_type(&self) -> String {
        if self.array {
            format!("Vec<{}>", self.name)
        } else {
            self.name.clone()
        }
    }
}

/// Closed mapping from documentation type strings to Rust type text.
/// Union aliases are backed by the manual fixes in `fixes.rs`. Unknown
/// names fall through unchanged so that a new documentation type shows up
/// as a compile error in the generated file instead of blocking the run.
const TYPE_TABLE: &[(&str, &str)] = &[
    ("Integer", "i64"),
    ("Int", "i64"),
    ("String", "String"),
    ("Boolean", "bool"),
    ("True", "bool"),
    ("Float", "f64"),
    ("Float number", "f64"),
    ("InputFile or String", "String"),
    ("Integer or String", "ChatId"),
    (
        "InlineKeyboardMarkup or ReplyKeyboardMarkup or ReplyKeyboardRemove or ForceReply",
        "ReplyMarkup",
    ),
    (
        "InputMediaAudio, InputMediaDocument, InputMediaPhoto and InputMediaVideo",
        "InputMedia",
    ),
];

pub fn resolve_type(doc_type: &str, required: bool) -> String {
    let resolved = resolve_base(doc_type);
    if required {
        resolved
    } else {
        format!("Option<{}>", resolved)
    }
}

fn resolve_base(doc_type: &str) -> String {
    if let Some(rest) = doc_type.strip_prefix("Array of ") {
        return format!("Vec<{}>", resolve_base(rest));
    }

    TYPE_TABLE
        .iter()
        .find(|(doc, _)| *doc == doc_type)
        .map(|(_, rust)| (*rust).to_string())
        .unwrap_or_else(|| doc_type.to_string())
}

#[derive(Debug, Copy, Clone, PartialEq)]
enum Shape {
    Plain,
    Array,
}

/// Ordered response-type patterns; the first match wins. Array phrasings
/// come first so that a description mentioning both an array result and a
/// scalar fallback resolves to the array. The order is load-bearing and
/// pinned by tests against real method descriptions.
static RESPONSE_PATTERNS: Lazy<Vec<(Regex, Shape)>> = Lazy::new(|| {
    [
        (
            r"[Aa]n [Aa]rray of ([A-Z][A-Za-z]*)(?: objects)? is returned",
            Shape::Array,
        ),
        (r"[Rr]eturns an [Aa]rray of ([A-Z][A-Za-z]*)", Shape::Array),
        (
            r"On success, an array of (?:the sent )?([A-Z][A-Za-z]*)",
            Shape::Array,
        ),
        (r"in form of a ([A-Z][A-Za-z]*) object", Shape::Plain),
        (
            r"On success, (?:the sent |the stopped |the edited |a |an )?([A-Z][A-Za-z]*)(?: object)? is returned",
            Shape::Plain,
        ),
        (
            r"[Rr]eturns (?:the |a |an )?(?:new invite link as |created invoice link as |uploaded |revoked invite link as )?([A-Z][A-Za-z]*)",
            Shape::Plain,
        ),
        (r"([A-Z][A-Za-z]*)(?: object)? is returned", Shape::Plain),
    ]
    .iter()
    .map(|(pattern, shape)| (Regex::new(pattern).unwrap(), *shape))
    .collect()
});

pub fn infer_return_type(description: &str) -> Result<ReturnType> {
    for (pattern, shape) in RESPONSE_PATTERNS.iter() {
        if let Some(captures) = pattern.captures(description) {
            let name = &captures[1];
            let name = match shape {
                Shape::Array => strip_plural(name),
                Shape::Plain => name,
            };
            return Ok(ReturnType {
                name: resolve_base(name),
                array: *shape == Shape::Array,
            });
        }
    }

    Err(ParseError::ResponseTypeNotFound(description.to_string()))
}

fn strip_plural(name: &str) -> &str {
    name.strip_suffix('s').unwrap_or(name)
}
