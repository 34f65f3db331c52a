//! ASCII mockups of the UI components found in a record.

use regex::Regex;
use serde::{Deserialize, Serialize};
use unicode_segmentation::UnicodeSegmentation;

use crate::core::errors::Result;
use crate::core::record::ContentRecord;

/// Narrowest mockup that still leaves room for content.
pub const MIN_WIDTH: usize = 20;

/// One detected UI component.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct UiComponent {
    /// Component kind: `button`, `input`, `heading`, `label`, `form`, `image`, `list`, `link`
    pub kind: String,
    /// Visible text, or the kind when none was found
    pub label: String,
    /// Line the component was found on
    pub line: usize,
}

/// Rendered mockup for one record.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Mockup {
    /// Record identity
    pub identity: String,
    /// Detected UI framework
    pub framework: Option<String>,
    /// Components in source order
    pub components: Vec<UiComponent>,
    /// Box drawing of the components
    pub ascii: String,
}

/// Detects UI components and draws them as a text box.
#[derive(Debug, Clone)]
pub struct MockupRenderer {
    width: usize,
    patterns: Vec<(&'static str, Regex)>,
}

impl MockupRenderer {
    /// Compile the component patterns; `width` is the total box width.
    pub fn new(width: usize) -> Result<Self> {
        let table: &[(&str, &str)] = &[
            (
                "button",
                r#"(?i)<button[^>]*>([^<]*)</button>|\b(?:Button|QPushButton|ElevatedButton)\(\s*(?:text\s*=\s*)?["']([^"']+)["']|ui\.button\(\s*"([^"]+)""#,
            ),
            (
                "input",
                r#"(?i)<input\b[^>]*?placeholder="([^"]*)"|<input\b|<textarea\b|\b(?:Entry|QLineEdit|TextField|TextInput)\(|ui\.text_edit"#,
            ),
            ("heading", r"(?i)<h[1-6][^>]*>([^<]*)</h[1-6]>"),
            (
                "label",
                r#"\b(?:Label|QLabel|Text)\(\s*(?:text\s*=\s*)?["']([^"']+)["']|ui\.label\(\s*"([^"]+)""#,
            ),
            ("form", r"(?i)<form\b"),
            ("image", r#"(?i)<img\b[^>]*?alt="([^"]*)"|<img\b|\bImage\("#),
            ("list", r"(?i)<(?:ul|ol)\b|\bListView\b"),
            ("link", r"(?i)<a\b[^>]*>([^<]*)</a>"),
        ];

        let mut patterns = Vec::with_capacity(table.len());
        for (kind, pattern) in table {
            patterns.push((*kind, Regex::new(pattern)?));
        }

        Ok(Self {
            width: width.max(MIN_WIDTH),
            patterns,
        })
    }

    /// Components in `text`, one per kind per line, in line order.
    pub fn components(&self, text: &str) -> Vec<UiComponent> {
        let mut components = Vec::new();
        for (index, line) in text.lines().enumerate() {
            for (kind, pattern) in &self.patterns {
                if let Some(caps) = pattern.captures(line) {
                    let label = caps
                        .iter()
                        .skip(1)
                        .flatten()
                        .map(|m| m.as_str().trim())
                        .find(|label| !label.is_empty())
                        .unwrap_or(kind)
                        .to_string();
                    components.push(UiComponent {
                        kind: (*kind).to_string(),
                        label,
                        line: index + 1,
                    });
                }
            }
        }
        components
    }

    /// Mockup for `record`, or `None` when it has no UI content.
    pub fn render(&self, record: &ContentRecord) -> Option<Mockup> {
        let components = self.components(&record.text);
        if components.is_empty() && record.ui_framework.is_none() {
            return None;
        }

        let title = match &record.ui_framework {
            Some(framework) => format!("{} ({framework})", record.identity),
            None => record.identity.clone(),
        };

        let border = format!("+{}+", "-".repeat(self.width - 2));
        let mut lines = vec![border.clone(), self.row(&title), border.clone()];
        if components.is_empty() {
            lines.push(self.row("(no components detected)"));
        }
        for component in &components {
            lines.push(self.row(&draw(component)));
        }
        lines.push(border);

        Some(Mockup {
            identity: record.identity.clone(),
            framework: record.ui_framework.clone(),
            components,
            ascii: lines.join("\n"),
        })
    }

    fn row(&self, content: &str) -> String {
        let inner = self.width - 4;
        let graphemes: Vec<&str> = content.graphemes(true).collect();
        let shown = if graphemes.len() > inner {
            let mut cut: String = graphemes[..inner - 1].concat();
            cut.push('~');
            cut
        } else {
            content.to_string()
        };
        let padding = inner.saturating_sub(shown.graphemes(true).count());
        format!("| {shown}{} |", " ".repeat(padding))
    }
}

fn draw(component: &UiComponent) -> String {
    match component.kind.as_str() {
        "button" => format!("[ {} ]", component.label),
        "input" => format!("[______ {} ]", component.label),
        "heading" => format!("# {}", component.label),
        "form" => "<form>".to_string(),
        "image" => format!("[img: {}]", component.label),
        "list" => "* list".to_string(),
        "link" => format!("_{}_", component.label),
        _ => component.label.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::record::ContentCategory;

    #[test]
    fn finds_html_components_with_labels() {
        let renderer = MockupRenderer::new(40).unwrap();
        let components = renderer.components(
            "<h1>Welcome</h1>\n<input placeholder=\"Email\">\n<button>Submit</button>\n",
        );
        let summary: Vec<(&str, &str)> = components
            .iter()
            .map(|c| (c.kind.as_str(), c.label.as_str()))
            .collect();
        assert_eq!(
            summary,
            vec![("heading", "Welcome"), ("input", "Email"), ("button", "Submit")]
        );
    }

    #[test]
    fn renders_fixed_width_box() {
        let renderer = MockupRenderer::new(30).unwrap();
        let record = ContentRecord::new("app.html", ContentCategory::Markup, "<button>Go</button>");
        let mockup = renderer.render(&record).unwrap();

        assert!(mockup.ascii.lines().all(|line| line.chars().count() == 30));
        assert!(mockup.ascii.contains("[ Go ]"));
    }

    #[test]
    fn long_labels_are_truncated() {
        let renderer = MockupRenderer::new(20).unwrap();
        let row = renderer.row(&"x".repeat(50));
        assert_eq!(row.chars().count(), 20);
        assert!(row.ends_with("~ |"));
    }

    #[test]
    fn plain_code_has_no_mockup() {
        let renderer = MockupRenderer::new(60).unwrap();
        let record = ContentRecord::new("a.py", ContentCategory::Code, "x = 1");
        assert!(renderer.render(&record).is_none());
    }
}
