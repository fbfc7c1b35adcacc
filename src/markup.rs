//! Line-oriented renderer for blog post bodies.
//!
//! Each line is one block: `## ` and `### ` start headings, `- ` starts a list
//! item, a blank line is a break and anything else is a paragraph. No inline
//! markup is recognized.

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Block {
    Heading(String),
    Subheading(String),
    ListItem(String),
    Break,
    Paragraph(String),
}

pub fn parse(text: &str) -> Vec<Block> {
    text.split('\n')
        .map(|line| line.trim_end_matches('\r'))
        .map(|line| {
            if let Some(rest) = line.strip_prefix("## ") {
                Block::Heading(rest.to_string())
            } else if let Some(rest) = line.strip_prefix("### ") {
                Block::Subheading(rest.to_string())
            } else if let Some(rest) = line.strip_prefix("- ") {
                Block::ListItem(rest.to_string())
            } else if line.trim().is_empty() {
                Block::Break
            } else {
                Block::Paragraph(line.to_string())
            }
        })
        .collect()
}

/// Renders to HTML with all text escaped. Consecutive list items share one `<ul>`.
pub fn render_html(text: &str) -> String {
    let mut html = String::new();
    let mut in_list = false;

    for block in parse(text) {
        let is_item = matches!(block, Block::ListItem(_));
        if in_list && !is_item {
            html.push_str("</ul>");
        } else if !in_list && is_item {
            html.push_str("<ul>");
        }
        in_list = is_item;

        match block {
            Block::Heading(t) => push_element(&mut html, "h3", &t),
            Block::Subheading(t) => push_element(&mut html, "h4", &t),
            Block::ListItem(t) => push_element(&mut html, "li", &t),
            Block::Paragraph(t) => push_element(&mut html, "p", &t),
            Block::Break => html.push_str("<br>"),
        }
    }

    if in_list {
        html.push_str("</ul>");
    }
    html
}

fn push_element(html: &mut String, tag: &str, text: &str) {
    html.push('<');
    html.push_str(tag);
    html.push('>');
    html.push_str(&ammonia::clean_text(text));
    html.push_str("</");
    html.push_str(tag);
    html.push('>');
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_maps_each_line_kind() {
        let blocks = parse("Intro\n\n## Problem\n### Detail\n- one\n- two");
        assert_eq!(
            blocks,
            vec![
                Block::Paragraph("Intro".to_string()),
                Block::Break,
                Block::Heading("Problem".to_string()),
                Block::Subheading("Detail".to_string()),
                Block::ListItem("one".to_string()),
                Block::ListItem("two".to_string()),
            ]
        );
    }

    #[test]
    fn test_heading_markers_need_trailing_space() {
        assert_eq!(parse("##tight"), vec![Block::Paragraph("##tight".to_string())]);
        assert_eq!(parse("-dash"), vec![Block::Paragraph("-dash".to_string())]);
    }

    #[test]
    fn test_whitespace_only_line_is_break_and_crlf_is_tolerated() {
        assert_eq!(
            parse("a\r\n   \r\nb"),
            vec![
                Block::Paragraph("a".to_string()),
                Block::Break,
                Block::Paragraph("b".to_string()),
            ]
        );
    }

    #[test]
    fn test_render_groups_list_items_and_escapes_text() {
        let html = render_html("## Tips\n- use <b>\n- test\nDone");
        assert!(html.starts_with("<h3>Tips</h3><ul><li>use"));
        assert!(html.contains("&lt;b&gt;</li><li>test</li></ul>"));
        assert!(html.ends_with("<p>Done</p>"));
        assert!(!html.contains("<b>"));
    }
}
