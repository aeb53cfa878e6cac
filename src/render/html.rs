// FormRelay - HTML output for display blocks

use super::{DisplayBlock, Line, LineKind, Span};

/// Escape HTML special characters to prevent XSS.
pub fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

fn spans_html(spans: &[Span]) -> String {
    spans
        .iter()
        .map(|s| {
            if s.strong {
                format!("<strong>{}</strong>", html_escape(&s.text))
            } else {
                html_escape(&s.text)
            }
        })
        .collect()
}

fn line_html(line: &Line) -> String {
    let inner = spans_html(&line.spans);
    match &line.kind {
        LineKind::Break => "<br>".to_string(),
        LineKind::Heading { level } => {
            // h1 is the title; paragraph headings start one level below it.
            let h = (*level + 1).min(6);
            format!("<h{h}>{inner}</h{h}>")
        }
        LineKind::Bullet => format!("<p class=\"bullet\">&bull; {inner}</p>"),
        LineKind::Numbered { number } => {
            format!("<p class=\"numbered\"><span>{number}.</span> {inner}</p>")
        }
        LineKind::Text => format!("<p>{inner}</p>"),
    }
}

/// Render blocks as an HTML fragment.
pub fn to_html(blocks: &[DisplayBlock]) -> String {
    let mut out = String::new();

    for block in blocks {
        match block {
            DisplayBlock::Heading { level, text } => {
                let h = (*level).clamp(1, 6);
                out.push_str(&format!("<h{h}>{}</h{h}>\n", html_escape(text)));
            }
            DisplayBlock::UnorderedList { items } => {
                out.push_str("<ul>\n");
                for item in items {
                    out.push_str(&format!("  <li>{}</li>\n", html_escape(item)));
                }
                out.push_str("</ul>\n");
            }
            DisplayBlock::OrderedList { items } => {
                out.push_str("<ol>\n");
                for item in items {
                    out.push_str(&format!(
                        "  <li value=\"{}\">{}</li>\n",
                        item.number,
                        html_escape(&item.text)
                    ));
                }
                out.push_str("</ol>\n");
            }
            DisplayBlock::Paragraph { lines } => {
                out.push_str("<div class=\"paragraph\">\n");
                for line in lines {
                    out.push_str("  ");
                    out.push_str(&line_html(line));
                    out.push('\n');
                }
                out.push_str("</div>\n");
            }
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::{parse, ContentKind};
    use crate::render::render;

    #[test]
    fn test_escapes_user_text() {
        assert_eq!(
            html_escape("<script>\"x\" & 'y'</script>"),
            "&lt;script&gt;&quot;x&quot; &amp; &#39;y&#39;&lt;/script&gt;"
        );
    }

    #[test]
    fn test_recipe_html() {
        let html = to_html(&render(&parse(
            ContentKind::Food,
            "Omelette\n#Ingredients\nEgg\n#Instructions\nCook",
        )));
        assert!(html.starts_with("<h1>Omelette</h1>\n"));
        assert!(html.contains("<ul>\n  <li>Egg</li>\n</ul>"));
        assert!(html.contains("<ol>\n  <li value=\"1\">Cook</li>\n</ol>"));
    }

    #[test]
    fn test_paragraph_html() {
        let html = to_html(&render(&parse(
            ContentKind::Business,
            "Plan\n## Vision\n- **Bold** <idea>\n\nEnd",
        )));
        assert!(html.contains("<h3>Vision</h3>"));
        assert!(html.contains("&bull; <strong>Bold</strong> &lt;idea&gt;"));
        assert!(html.contains("<br>"));
        assert!(html.contains("<p>End</p>"));
    }
}
