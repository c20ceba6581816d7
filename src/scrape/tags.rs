// src/scrape/tags.rs
// =============================================================================
// Which attributes of which elements carry URLs.
//
// The table is a plain `match`, so it is built by the compiler rather than
// at runtime. Each entry also carries the filter level it belongs to; the
// scraper ignores levels and reports every entry, the checker uses them to
// decide what to skip.
// =============================================================================

use crate::config::FilterLevel;

/// Returns the filter level of `tag.attr` if that attribute holds a URL.
///
/// Both names are expected in lower case (html5ever already lower-cases
/// them).
pub fn filter_level(tag: &str, attr: &str) -> Option<FilterLevel> {
    use FilterLevel::*;

    let level = match (tag, attr) {
        ("a", "href") | ("area", "href") => Clickable,

        ("img", "src")
        | ("img", "longdesc")
        | ("audio", "src")
        | ("video", "src")
        | ("video", "poster")
        | ("source", "src")
        | ("track", "src")
        | ("embed", "src")
        | ("iframe", "src")
        | ("frame", "src")
        | ("input", "src")
        | ("object", "data")
        | ("menuitem", "icon") => Media,

        ("link", "href")
        | ("script", "src")
        | ("object", "codebase")
        | ("applet", "codebase") => Assets,

        ("q", "cite")
        | ("blockquote", "cite")
        | ("del", "cite")
        | ("ins", "cite")
        | ("iframe", "longdesc")
        | ("frame", "longdesc")
        | ("body", "background")
        | ("table", "background")
        | ("td", "background")
        | ("th", "background")
        | ("html", "manifest")
        | ("head", "profile")
        | ("form", "action")
        | ("button", "formaction")
        | ("input", "formaction")
        | ("command", "icon") => Metadata,

        _ => return None,
    };

    Some(level)
}

pub fn is_link_attribute(tag: &str, attr: &str) -> bool {
    filter_level(tag, attr).is_some()
}

/// Elements that never have content.
pub fn is_void_element(tag: &str) -> bool {
    matches!(
        tag,
        "area"
            | "base"
            | "br"
            | "col"
            | "command"
            | "embed"
            | "hr"
            | "img"
            | "input"
            | "keygen"
            | "link"
            | "meta"
            | "param"
            | "source"
            | "track"
            | "wbr"
    )
}
