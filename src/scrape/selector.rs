// src/scrape/selector.rs
// =============================================================================
// Builds a CSS selector that points at exactly one element.
//
// Output looks like:
//   html > body > div:nth-child(1) > a:nth-child(3)
//
// Every segment below <body> carries :nth-child(k), where k counts ALL
// element siblings (not only siblings with the same tag). <html> and <body>
// are written bare because a document only ever has one of each.
// =============================================================================

use scraper::ElementRef;

pub fn synthesize(element: ElementRef<'_>) -> String {
    let mut segments = Vec::new();
    let mut current = Some(element);

    while let Some(el) = current {
        segments.push(segment(el));
        current = el.parent().and_then(ElementRef::wrap);
    }

    segments.reverse();
    segments.join(" > ")
}

fn segment(element: ElementRef<'_>) -> String {
    let name = element.value().name();

    if name == "html" || name == "body" {
        return name.to_string();
    }

    let position = element
        .prev_siblings()
        .filter(|sibling| sibling.value().is_element())
        .count()
        + 1;

    format!("{}:nth-child({})", name, position)
}

#[cfg(test)]
mod tests {
    use super::*;
    use scraper::{Html, Selector};

    fn first(document: &Html, css: &str) -> String {
        let selector = Selector::parse(css).unwrap();
        synthesize(document.select(&selector).next().unwrap())
    }

    #[test]
    fn test_root_chain_has_no_index() {
        let document = Html::parse_document("<p>text</p>");
        assert_eq!(first(&document, "html"), "html");
        assert_eq!(first(&document, "body"), "html > body");
        assert_eq!(first(&document, "p"), "html > body > p:nth-child(1)");
    }

    #[test]
    fn test_head_keeps_index() {
        let document = Html::parse_document("<title>t</title>");
        assert_eq!(first(&document, "title"), "html > head:nth-child(1) > title:nth-child(1)");
    }

    #[test]
    fn test_counts_all_element_siblings() {
        let document = Html::parse_document("<span></span>text<div></div><a></a>");
        assert_eq!(first(&document, "a"), "html > body > a:nth-child(3)");
    }
}
