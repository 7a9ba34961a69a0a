mod emitter;
mod extractor;
mod fixes;
mod parser;
mod util;

pub use emitter::{Config, Rendered};
pub use extractor::ExtractorError;
pub use parser::{Field, Method, Object, Parameter, ParseError, Parsed, ReturnType};

pub const CORE_TELEGRAM_URL: &str = "https://core.telegram.org";
pub const BOT_API_DOCS_URL: &str = "https://core.telegram.org/bots/api/";

use extractor::Extractor;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Extractor: {0}")]
    Extractor(
        #[from]
        #[source]
        ExtractorError,
    ),
    #[error("Parser: {0}")]
    Parse(
        #[from]
        #[source]
        ParseError,
    ),
}

/// Parses the documentation page into the typed model.
pub fn parse(html_doc: &str) -> Result<Parsed, Error> {
    let extractor = Extractor::from_str(html_doc);
    let extracted = extractor.extract()?;
    let parsed = parser::parse(extracted)?;
    Ok(parsed)
}

/// Parses the documentation page and renders the two binding source files.
pub fn generate(html_doc: &str, config: &Config) -> Result<Rendered, Error> {
    let parsed = parse(html_doc)?;
    Ok(emitter::render(&parsed, config))
}
