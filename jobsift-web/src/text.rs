use scraper::{ElementRef, Html};

/// Trim and fold runs of whitespace into single spaces.
pub fn collapse_whitespace(raw: &str) -> String {
    raw.split_whitespace().collect::<Vec<_>>().join(" ")
}

pub fn element_text(element: ElementRef<'_>) -> String {
    collapse_whitespace(&element.text().collect::<String>())
}

/// Visible text of an HTML fragment; plain text passes through collapsed.
pub fn html_to_text(raw: &str) -> String {
    if !raw.contains('<') {
        return collapse_whitespace(raw);
    }
    let fragment = Html::parse_fragment(raw);
    collapse_whitespace(&fragment.root_element().text().collect::<Vec<_>>().join(" "))
}
