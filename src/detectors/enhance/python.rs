//! Python rewrites: print statements, index loops and `eval`.

use async_trait::async_trait;
use regex::Regex;

use crate::core::errors::Result;
use crate::core::record::{ContentRecord, Enhancement, EnhancementKind, Finding, Level};
use crate::detectors::rules::Enhancer;

/// Python-specific enhancer.
#[derive(Debug, Clone)]
pub struct PythonEnhancer {
    print_statement: Regex,
    index_loop: Regex,
    eval_call: Regex,
}

impl PythonEnhancer {
    /// Compile the rewrite patterns.
    pub fn new() -> Result<Self> {
        Ok(Self {
            print_statement: Regex::new(r"^(\s*)print\s+([^(\s].*?)\s*$")?,
            index_loop: Regex::new(
                r"^(\s*)for\s+(\w+)\s+in\s+range\s*\(\s*len\s*\(\s*(\w+)\s*\)\s*\)\s*:(.*)$",
            )?,
            eval_call: Regex::new(r"(^|[^.\w])eval\s*\(")?,
        })
    }
}

#[async_trait]
impl Enhancer for PythonEnhancer {
    fn name(&self) -> &str {
        "python"
    }

    async fn propose(&self, record: &ContentRecord, _findings: &[Finding]) -> Result<Vec<Enhancement>> {
        if record.language.as_deref() != Some("python") {
            return Ok(Vec::new());
        }

        let mut proposals = Vec::new();
        for (index, line) in record.text.lines().enumerate() {
            let number = index + 1;

            if let Some(caps) = self.print_statement.captures(line) {
                let after = format!("{}print({})", &caps[1], &caps[2]);
                proposals.push(
                    Enhancement::new(
                        EnhancementKind::Fix,
                        "syntax",
                        "Convert Python 2 print statement to a function call",
                        0.95,
                        after,
                    )
                    .with_levels(Level::Medium, Level::Low)
                    .with_before(line)
                    .at_line(number),
                );
                continue;
            }

            if let Some(caps) = self.index_loop.captures(line) {
                let after = format!(
                    "{}for {}, _item in enumerate({}):{}",
                    &caps[1], &caps[2], &caps[3], &caps[4]
                );
                proposals.push(
                    Enhancement::new(
                        EnhancementKind::Optimization,
                        "performance",
                        "Iterate with enumerate() instead of range(len())",
                        0.8,
                        after,
                    )
                    .with_levels(Level::Low, Level::Low)
                    .with_before(line)
                    .at_line(number),
                );
                continue;
            }

            if self.eval_call.is_match(line) {
                let after = self.eval_call.replace_all(line, "${1}ast.literal_eval(");
                proposals.push(
                    Enhancement::new(
                        EnhancementKind::Fix,
                        "security",
                        "Replace eval() with ast.literal_eval()",
                        0.85,
                        after.into_owned(),
                    )
                    .with_levels(Level::High, Level::High)
                    .with_before(line)
                    .at_line(number),
                );
            }
        }

        Ok(proposals)
    }
}
