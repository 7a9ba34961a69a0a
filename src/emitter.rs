use crate::{
    fixes,
    parser::{resolve_type, Method, Object, Parsed},
};
use itertools::Itertools;
use std::{
    fs, io,
    path::{Path, PathBuf},
};

const DATA_FILE: &str = "data.rs";
const METHODS_FILE: &str = "methods.rs";

/// Field names that collide with Rust keywords, renamed on the wire with
/// `#[serde(rename = ...)]`.
const FIELD_RENAMES: &[(&str, &str)] = &[("type", "kind")];

#[derive(Debug, Clone)]
pub struct Config {
    /// Dotted module path the generated files live under, e.g.
    /// `telegram.bindings`; becomes the output subdirectory.
    pub package: String,
    /// Dotted module path of the HTTP client, e.g. `crate.client`. It must
    /// provide `BotApi` with `post_json`/`get_json` and an `ApiError` type.
    pub client_package: String,
}

pub struct Rendered {
    pub data: String,
    pub methods: String,
    package_path: PathBuf,
}

impl Rendered {
    /// Creates the package directory under `root` and writes both files,
    /// overwriting previous output.
    pub fn write_to(&self, root: &Path) -> io::Result<(PathBuf, PathBuf)> {
        let dir = root.join(&self.package_path);
        fs::create_dir_all(&dir)?;

        let data_path = dir.join(DATA_FILE);
        fs::write(&data_path, &self.data)?;
        let methods_path = dir.join(METHODS_FILE);
        fs::write(&methods_path, &self.methods)?;

        Ok((data_path, methods_path))
    }
}

pub fn render(parsed: &Parsed, config: &Config) -> Rendered {
    Rendered {
        data: render_data(parsed),
        methods: render_methods(parsed, config),
        package_path: config.package.split('.').collect(),
    }
}

fn file_header(parsed: &Parsed) -> String {
    format!(
        "// Generated from Bot API {}.{}, {}.\n// Do not edit manually.\n\n",
        parsed.version.major,
        parsed.version.minor,
        parsed.recent_changes.format("%B %-d, %Y"),
    )
}

fn render_data(parsed: &Parsed) -> String {
    let objects = parsed.objects.iter().map(render_object).join("\n");
    format!(
        "{}use serde::{{Deserialize, Serialize}};\n\n{}\n{}",
        file_header(parsed),
        objects,
        fixes::render(),
    )
}

fn render_methods(parsed: &Parsed, config: &Config) -> String {
    let client_path = config.client_package.split('.').join("::");
    let methods = parsed.methods.iter().map(render_method).join("\n");
    format!(
        "{}use serde::Serialize;\n\nuse {}::{{ApiError, BotApi}};\n\nuse super::data::*;\n\n{}",
        file_header(parsed),
        client_path,
        methods,
    )
}

fn doc_comment(out: &mut String, text: &str, indent: &str) {
    for line in text.lines().filter(|line| !line.trim().is_empty()) {
        out.push_str(indent);
        out.push_str("/// ");
        out.push_str(line.trim());
        out.push('\n');
    }
}

fn docs_link_comment(out: &mut String, link: &Option<String>, indent: &str) {
    if let Some(link) = link {
        out.push_str(indent);
        out.push_str("///\n");
        out.push_str(indent);
        out.push_str(&format!("/// <{}>\n", link));
    }
}

fn field_ident(name: &str) -> (&str, Option<&str>) {
    match FIELD_RENAMES.iter().find(|(doc, _)| *doc == name) {
        Some((doc, rust)) => (rust, Some(doc)),
        None => (name, None),
    }
}

fn render_object(object: &Object) -> String {
    let mut out = String::new();
    doc_comment(&mut out, &object.description, "");
    docs_link_comment(&mut out, &object.docs_link, "");
    out.push_str("#[derive(Clone, Debug, Serialize, Deserialize)]\n");
    out.push_str(&format!("pub struct {} {{\n", object.name));
    for field in &object.fields {
        let (ident, rename) = field_ident(&field.name);
        if let Some(original) = rename {
            out.push_str(&format!("    #[serde(rename = \"{}\")]\n", original));
        }
        if !field.required {
            out.push_str("    #[serde(skip_serializing_if = \"Option::is_none\")]\n");
        }
        out.push_str(&format!(
            "    pub {}: {},\n",
            ident,
            resolve_type(&field.kind, field.required)
        ));
    }
    out.push_str("}\n");
    out
}

fn render_method(method: &Method) -> String {
    let fn_name = snake_case(&method.name);
    let return_type = method.return_type.rust_type();
    let mut out = String::new();

    if method.parameters.is_empty() {
        out.push_str("impl BotApi {\n");
        doc_comment(&mut out, &method.description, "    ");
        docs_link_comment(&mut out, &method.docs_link, "    ");
        out.push_str(&format!(
            "    pub async fn {}(&self) -> Result<{}, ApiError> {{\n",
            fn_name, return_type
        ));
        out.push_str(&format!(
            "        self.get_json(\"{}\").await\n",
            method.name
        ));
        out.push_str("    }\n}\n");
        return out;
    }

    let request_name = format!("{}Request", upper_camel(&method.name));

    out.push_str(&format!(
        "/// Request payload of [`BotApi::{}`].\n",
        fn_name
    ));
    out.push_str("#[derive(Clone, Debug, Serialize)]\n");
    out.push_str(&format!("pub struct {} {{\n", request_name));
    for parameter in &method.parameters {
        let (ident, rename) = field_ident(&parameter.name);
        if let Some(original) = rename {
            out.push_str(&format!("    #[serde(rename = \"{}\")]\n", original));
        }
        if !parameter.required {
            out.push_str("    #[serde(skip_serializing_if = \"Option::is_none\")]\n");
        }
        out.push_str(&format!(
            "    pub {}: {},\n",
            ident,
            resolve_type(&parameter.kind, parameter.required)
        ));
    }
    out.push_str("}\n\n");

    out.push_str("impl BotApi {\n");
    doc_comment(&mut out, &method.description, "    ");
    docs_link_comment(&mut out, &method.docs_link, "    ");
    out.push_str(&format!(
        "    pub async fn {}_with(&self, request: {}) -> Result<{}, ApiError> {{\n",
        fn_name, request_name, return_type
    ));
    out.push_str(&format!(
        "        self.post_json(\"{}\", &request).await\n",
        method.name
    ));
    out.push_str("    }\n\n");

    let args = method
        .parameters
        .iter()
        .map(|parameter| {
            let (ident, _) = field_ident(&parameter.name);
            format!(
                "{}: {}",
                ident,
                resolve_type(&parameter.kind, parameter.required)
            )
        })
        .join(", ");
    let field_idents = method
        .parameters
        .iter()
        .map(|parameter| field_ident(&parameter.name).0)
        .join(", ");

    out.push_str(&format!(
        "    /// Flat-argument form of [`BotApi::{}_with`].\n",
        fn_name
    ));
    out.push_str(&format!(
        "    pub async fn {}(&self, {}) -> Result<{}, ApiError> {{\n",
        fn_name, args, return_type
    ));
    out.push_str(&format!(
        "        self.{}_with({} {{ {} }}).await\n",
        fn_name, request_name, field_idents
    ));
    out.push_str("    }\n}\n");

    out
}

fn snake_case(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    for c in name.chars() {
        if c.is_ascii_uppercase() {
            out.push('_');
            out.push(c.to_ascii_lowercase());
        } else {
            out.push(c);
        }
    }
    out
}

fn upper_camel(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}
