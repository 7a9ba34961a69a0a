use ego_tree::iter::Edge;
use scraper::{ElementRef, Node};

pub trait StrExt {
    fn is_first_letter_lowercase(&self) -> bool;
}

impl StrExt for str {
    fn is_first_letter_lowercase(&self) -> bool {
        self.chars()
            .next()
            .map(|c| c.is_lowercase())
            .unwrap_or(false)
    }
}

pub trait ElementRefExt {
    fn plain_text(&self) -> String;

    fn a_href(&self) -> Option<String>;
}

impl ElementRefExt for ElementRef<'_> {
    fn plain_text(&self) -> String {
        self.traverse()
            .filter_map(|edge| {
                if let Edge::Open(node) = edge {
                    return match node.value() {
                        Node::Text(text) => Some(text.as_ref()),
                        Node::Element(elem) if elem.name() == "img" => elem.attr("alt"),
                        Node::Element(elem) if elem.name() == "br" => Some("\n"),
                        _ => None,
                    };
                }

                None
            })
            .collect()
    }

    fn a_href(&self) -> Option<String> {
        self.traverse().find_map(|edge| {
            if let Edge::Open(node) = edge {
                if let Node::Element(elem) = node.value() {
                    if elem.name() == "a" {
                        return elem.attr("href").map(str::to_string);
                    }
                }
            }

            None
        })
    }
}
