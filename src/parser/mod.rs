pub mod detail;
pub mod listing;
pub mod pagination;

use scraper::ElementRef;

/// Visible text of an element with whitespace runs collapsed and ends trimmed.
pub fn stripped_text(element: ElementRef<'_>) -> String {
    element
        .text()
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Raw text of an element, only trimmed. Used for script bodies.
pub fn raw_text(element: ElementRef<'_>) -> String {
    element.text().collect::<String>().trim().to_string()
}
