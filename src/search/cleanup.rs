//! Scrape text cleanup: strip scripts/styles, collapse
//! whitespace, decode HTML entities, truncate to a soft cap with a marker.

/// Text appended when [`clean_scraped_text`] truncates its input.
pub const TRUNCATION_MARKER: &str = "\n...[truncated]";

/// Strip `<script>`/`<style>` blocks and every remaining tag, decode the
/// handful of HTML entities that show up in scraped marketing copy, collapse
/// runs of whitespace, then soft-cap the result.
pub fn clean_scraped_text(raw_html: &str, max_characters: usize) -> String {
    let without_blocks = strip_tag_blocks(raw_html, "script");
    let without_blocks = strip_tag_blocks(&without_blocks, "style");
    let without_tags = strip_tags(&without_blocks);
    let decoded = decode_entities(&without_tags);
    let collapsed = collapse_whitespace(&decoded);
    truncate_with_marker(&collapsed, max_characters)
}

fn strip_tag_blocks(html: &str, tag: &str) -> String {
    let open = format!("<{}", tag);
    let close = format!("</{}>", tag);
    let mut out = String::with_capacity(html.len());
    let mut rest = html;
    loop {
        match rest.to_lowercase().find(&open) {
            Some(start) => {
                out.push_str(&rest[..start]);
                match rest[start..].to_lowercase().find(&close) {
                    Some(end_rel) => {
                        let end = start + end_rel + close.len();
                        rest = &rest[end..];
                    }
                    None => return out,
                }
            }
            None => {
                out.push_str(rest);
                return out;
            }
        }
    }
}

fn strip_tags(html: &str) -> String {
    let mut out = String::with_capacity(html.len());
    let mut in_tag = false;
    for c in html.chars() {
        match c {
            '<' => in_tag = true,
            '>' => in_tag = false,
            _ if !in_tag => out.push(c),
            _ => {}
        }
    }
    out
}

fn decode_entities(text: &str) -> String {
    text.replace("&nbsp;", " ")
        .replace("&amp;", "&")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&apos;", "'")
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn truncate_with_marker(text: &str, max_characters: usize) -> String {
    if text.chars().count() <= max_characters {
        return text.to_string();
    }
    let truncated: String = text.chars().take(max_characters).collect();
    format!("{}{}", truncated, TRUNCATION_MARKER)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_script_and_style_blocks() {
        let html = "<html><head><style>.a{color:red}</style></head><body><script>alert(1)</script><p>Hello  world</p></body></html>";
        let cleaned = clean_scraped_text(html, 1000);
        assert_eq!(cleaned, "Hello world");
    }

    #[test]
    fn decodes_common_entities() {
        let html = "<p>Tom &amp; Jerry &mdash-not-handled; &lt;tag&gt;</p>";
        let cleaned = clean_scraped_text(html, 1000);
        assert!(cleaned.contains("Tom & Jerry"));
        assert!(cleaned.contains("<tag>"));
    }

    #[test]
    fn truncates_with_explicit_marker() {
        let long = "word ".repeat(100);
        let cleaned = clean_scraped_text(&long, 10);
        assert!(cleaned.ends_with(TRUNCATION_MARKER));
        assert!(cleaned.len() < long.len());
    }

    #[test]
    fn short_text_is_untouched() {
        let cleaned = clean_scraped_text("<p>short</p>", 1000);
        assert_eq!(cleaned, "short");
    }
}
