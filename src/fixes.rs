//! Hand-maintained union supertypes that the documentation describes only
//! in prose ("should be one of: ..."), appended verbatim after the scraped
//! declarations. Extend this list when upstream adds a new union family.

pub struct ManualFix {
    pub name: &'static str,
    pub source: &'static str,
}

pub const MANUAL_FIXES: &[ManualFix] = &[
    ManualFix {
        name: "ChatId",
        source: r#"/// Unique identifier of a target chat: a numeric chat id or a channel
/// username of the form `@channelusername`.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ChatId {
    Id(i64),
    Username(String),
}
"#,
    },
    ManualFix {
        name: "ReplyMarkup",
        source: r#"/// Additional interface options attached to a sent message.
///
/// One of: InlineKeyboardMarkup, ReplyKeyboardMarkup, ReplyKeyboardRemove,
/// ForceReply.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ReplyMarkup {
    InlineKeyboard(InlineKeyboardMarkup),
    ReplyKeyboard(ReplyKeyboardMarkup),
    ReplyKeyboardRemove(ReplyKeyboardRemove),
    ForceReply(ForceReply),
}
"#,
    },
    ManualFix {
        name: "InputFile",
        source: r#"/// A file to send, referenced by an existing `file_id` or by an HTTP URL.
///
/// One of: file identifier, URL.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(untagged)]
pub enum InputFile {
    FileId(String),
    Url(String),
}
"#,
    },
    ManualFix {
        name: "InputMedia",
        source: r#"/// Content of a media message to be sent.
///
/// One of: InputMediaAnimation, InputMediaDocument, InputMediaAudio,
/// InputMediaPhoto, InputMediaVideo.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(untagged)]
pub enum InputMedia {
    Animation(InputMediaAnimation),
    Document(InputMediaDocument),
    Audio(InputMediaAudio),
    Photo(InputMediaPhoto),
    Video(InputMediaVideo),
}
"#,
    },
    ManualFix {
        name: "InputMessageContent",
        source: r#"/// Content of a message to be sent as a result of an inline query.
///
/// One of: InputTextMessageContent, InputLocationMessageContent,
/// InputVenueMessageContent, InputContactMessageContent,
/// InputInvoiceMessageContent.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(untagged)]
pub enum InputMessageContent {
    Text(InputTextMessageContent),
    Location(InputLocationMessageContent),
    Venue(InputVenueMessageContent),
    Contact(InputContactMessageContent),
    Invoice(InputInvoiceMessageContent),
}
"#,
    },
];

pub fn render() -> String {
    let mut out = String::from(
        "// Manually maintained union types that the documentation only\n\
         // describes in prose.\n\n",
    );
    for fix in MANUAL_FIXES {
        out.push_str(fix.source);
        out.push('\n');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn fix_names_are_unique() {
        let mut seen = HashSet::new();
        for fix in MANUAL_FIXES {
            assert!(seen.insert(fix.name), "duplicate fix: {}", fix.name);
        }
    }

    #[test]
    fn every_fix_declares_its_supertype() {
        for fix in MANUAL_FIXES {
            assert!(
                fix.source.contains(&format!("pub enum {} {{", fix.name)),
                "fix `{}` does not declare itself",
                fix.name
            );
        }
    }
}
