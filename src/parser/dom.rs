use scraper::{ElementRef, Node};

/// Elements whose boundaries start a new line in rendered text.
const BLOCK_TAGS: &[&str] = &[
    "address", "article", "aside", "blockquote", "dd", "div", "dl", "dt", "figcaption",
    "figure", "footer", "form", "h1", "h2", "h3", "h4", "h5", "h6", "header", "hr", "li",
    "main", "nav", "ol", "p", "pre", "section", "table", "tr", "ul",
];

/// Elements that never contribute visible text.
const HIDDEN_TAGS: &[&str] = &["script", "style", "template", "noscript", "head"];

pub const BULLET: &str = "• ";

/// Heading level of `h1`..`h6`, `None` for anything else.
pub fn heading_level(el: ElementRef<'_>) -> Option<u8> {
    match el.value().name() {
        "h1" => Some(1),
        "h2" => Some(2),
        "h3" => Some(3),
        "h4" => Some(4),
        "h5" => Some(5),
        "h6" => Some(6),
        _ => None,
    }
}

pub fn is_heading_within(el: ElementRef<'_>, max_level: u8) -> bool {
    heading_level(el).is_some_and(|level| level <= max_level)
}

pub fn is_paragraph(el: ElementRef<'_>) -> bool {
    el.value().name() == "p"
}

pub fn is_list(el: ElementRef<'_>) -> bool {
    matches!(el.value().name(), "ul" | "ol")
}

/// Element children of `el`, skipping text and comment nodes.
pub fn child_elements<'a>(el: ElementRef<'a>) -> impl Iterator<Item = ElementRef<'a>> {
    el.children().filter_map(ElementRef::wrap)
}

/// Element siblings after `el` in document order.
pub fn following_elements<'a>(el: ElementRef<'a>) -> impl Iterator<Item = ElementRef<'a>> {
    el.next_siblings().filter_map(ElementRef::wrap)
}

/// The list's own `<li>` children. Items of nested lists belong to those lists.
pub fn list_items<'a>(list: ElementRef<'a>) -> impl Iterator<Item = ElementRef<'a>> {
    child_elements(list).filter(|c| c.value().name() == "li")
}

pub fn paragraph_children<'a>(el: ElementRef<'a>) -> impl Iterator<Item = ElementRef<'a>> {
    child_elements(el).filter(|c| is_paragraph(*c))
}

/// Visible text of an element, roughly what a browser reports as `innerText`:
/// whitespace runs collapse to one space, every line is trimmed, `<br>` and
/// block boundaries become line breaks. Consecutive `<br>` keep the blank line
/// between them; block boundaries never add one.
pub fn rendered_text(el: ElementRef<'_>) -> String {
    let mut raw = String::new();
    collect_text(el, &mut raw);
    raw.split('\n')
        .map(|line| line.split_whitespace().collect::<Vec<_>>().join(" "))
        .collect::<Vec<_>>()
        .join("\n")
        .trim_matches('\n')
        .to_string()
}

fn collect_text(el: ElementRef<'_>, out: &mut String) {
    for child in el.children() {
        match child.value() {
            Node::Text(text) => {
                // Source newlines are layout whitespace, not line breaks.
                out.extend(text.chars().map(|c| if c.is_whitespace() { ' ' } else { c }));
            }
            Node::Element(element) => {
                let name = element.name();
                if HIDDEN_TAGS.contains(&name) {
                    continue;
                }
                if name == "br" {
                    out.push('\n');
                    continue;
                }
                let Some(child_el) = ElementRef::wrap(child) else {
                    continue;
                };
                let block = BLOCK_TAGS.contains(&name);
                if block {
                    soft_break(out);
                }
                collect_text(child_el, out);
                if block {
                    soft_break(out);
                }
            }
            _ => {}
        }
    }
}

/// Line break at a block boundary, unless the current line is still empty.
fn soft_break(out: &mut String) {
    let tail = out.trim_end_matches(' ');
    if !tail.is_empty() && !tail.ends_with('\n') {
        out.push('\n');
    }
}

/// One `"• item"` line per own list item, blank items included.
pub fn render_list(list: ElementRef<'_>) -> String {
    list_items(list)
        .map(|item| format!("{}{}", BULLET, rendered_text(item)))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Whether any own list item has visible text.
pub fn has_visible_items(list: ElementRef<'_>) -> bool {
    list_items(list).any(|item| !rendered_text(item).is_empty())
}

/// Texts of the paragraph children, separated by blank lines.
pub fn render_paragraphs(container: ElementRef<'_>) -> String {
    join_blocks(paragraph_children(container).map(rendered_text))
}

/// Blocks joined by a blank line and trimmed once. Empty blocks are kept.
pub fn join_blocks<I>(blocks: I) -> String
where
    I: IntoIterator<Item = String>,
{
    blocks
        .into_iter()
        .collect::<Vec<_>>()
        .join("\n\n")
        .trim()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use scraper::{Html, Selector};

    fn first<'a>(doc: &'a Html, css: &str) -> ElementRef<'a> {
        let sel = Selector::parse(css).unwrap();
        doc.select(&sel).next().unwrap()
    }

    #[test]
    fn collapses_whitespace() {
        let doc = Html::parse_document("<p>  Build\n     reliable   <b>systems</b>  </p>");
        assert_eq!(rendered_text(first(&doc, "p")), "Build reliable systems");
    }

    #[test]
    fn br_breaks_lines() {
        let doc = Html::parse_document("<p>Line one <br> line two</p>");
        assert_eq!(rendered_text(first(&doc, "p")), "Line one\nline two");
    }

    #[test]
    fn block_children_break_lines() {
        let doc = Html::parse_document("<div><div>a</div><div>b</div></div>");
        assert_eq!(rendered_text(first(&doc, "div")), "a\nb");
    }

    #[test]
    fn skips_scripts() {
        let doc = Html::parse_document("<p>Visible<script>var x = 1;</script></p>");
        assert_eq!(rendered_text(first(&doc, "p")), "Visible");
    }

    #[test]
    fn heading_levels() {
        let doc = Html::parse_document("<h5>x</h5><p>y</p>");
        let h5 = first(&doc, "h5");
        assert_eq!(heading_level(h5), Some(5));
        assert!(is_heading_within(h5, 6));
        assert!(!is_heading_within(h5, 4));
        assert_eq!(heading_level(first(&doc, "p")), None);
    }

    #[test]
    fn own_items_only() {
        let doc = Html::parse_document(
            "<ul id=outer><li>A<ul><li>A1</li><li>A2</li></ul></li><li>B</li></ul>",
        );
        let outer = first(&doc, "#outer");
        assert_eq!(list_items(outer).count(), 2);
        assert_eq!(render_list(outer), "• A\nA1\nA2\n• B");
    }

    #[test]
    fn blank_items_still_render_bullets() {
        let doc = Html::parse_document("<ul><li> </li><li></li></ul>");
        let ul = first(&doc, "ul");
        assert_eq!(render_list(ul), "• \n• ");
        assert!(!has_visible_items(ul));

        let doc = Html::parse_document("<ul><li></li><li>x</li></ul>");
        assert!(has_visible_items(first(&doc, "ul")));
    }

    #[test]
    fn join_keeps_empty_blocks() {
        let blocks = vec!["A".to_string(), String::new(), "B".to_string()];
        assert_eq!(join_blocks(blocks), "A\n\n\n\nB");

        let trailing = vec!["A".to_string(), String::new()];
        assert_eq!(join_blocks(trailing), "A");
    }

    #[test]
    fn consecutive_breaks_keep_blank_line() {
        let doc = Html::parse_document("<p>A<br><br>B</p>");
        assert_eq!(rendered_text(first(&doc, "p")), "A\n\nB");
    }

    #[test]
    fn edge_breaks_trimmed() {
        let doc = Html::parse_document("<p><br> A <br><br></p>");
        assert_eq!(rendered_text(first(&doc, "p")), "A");
    }

    #[test]
    fn break_then_block_adds_no_blank_line() {
        let doc = Html::parse_document("<div>A<br>\n  <div>B</div>\n  <div>C</div></div>");
        assert_eq!(rendered_text(first(&doc, "div")), "A\nB\nC");
    }
}
