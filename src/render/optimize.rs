//! Static performance heuristics: loops, I/O and allocations.

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::core::errors::Result;
use crate::core::record::ContentRecord;
use crate::detectors::rules::{indent_width, is_comment_or_blank};

/// Performance observations for one record.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct PerformanceReport {
    /// Record identity
    pub identity: String,
    /// Loop headers
    pub loop_count: usize,
    /// Loops nested inside another loop
    pub nested_loops: usize,
    /// I/O calls
    pub io_operations: usize,
    /// I/O calls inside a loop body
    pub io_in_loops: usize,
    /// Allocating calls inside a loop body
    pub allocations_in_loops: usize,
    /// String building by repeated concatenation inside a loop
    pub string_concat_in_loops: usize,
    /// Suggested changes
    pub recommendations: Vec<String>,
    /// Score out of 100
    pub score: u32,
}

/// Line-based performance analyzer.
#[derive(Debug, Clone)]
pub struct PerformanceAnalyzer {
    loop_header: Regex,
    io_call: Regex,
    allocation: Regex,
    concat: Regex,
    range_len: Regex,
}

impl PerformanceAnalyzer {
    /// Compile the heuristics.
    pub fn new() -> Result<Self> {
        Ok(Self {
            loop_header: Regex::new(r"^\s*(?:for|while|loop)\b|\.forEach\(")?,
            io_call: Regex::new(
                r"\bopen\(|\.read\w*\(|\.write\w*\(|\bfetch\(|\brequests\.\w+\(|\bfs\.\w+|File::(?:open|create)|\b(?:query|execute)\(",
            )?,
            allocation: Regex::new(
                r"\bnew\s+[A-Z]\w*|Vec::new\(|\.clone\(\)|\.to_string\(\)|\b(?:list|dict|set)\(|\.append\(|\.push\(",
            )?,
            concat: Regex::new(r#"\+=\s*(?:["'`]|str\(|f["'])"#)?,
            range_len: Regex::new(r"range\s*\(\s*len\s*\(")?,
        })
    }

    /// Analyze `record`.
    pub fn analyze(&self, record: &ContentRecord) -> PerformanceReport {
        let mut report = PerformanceReport {
            identity: record.identity.clone(),
            ..PerformanceReport::default()
        };
        let mut active_loops: Vec<usize> = Vec::new();
        let mut range_len = 0usize;

        for line in record.text.lines().filter(|line| !is_comment_or_blank(line)) {
            let indent = indent_width(line);
            while active_loops.last().is_some_and(|&loop_indent| indent <= loop_indent) {
                active_loops.pop();
            }
            let in_loop = !active_loops.is_empty();

            if self.loop_header.is_match(line) {
                report.loop_count += 1;
                if in_loop {
                    report.nested_loops += 1;
                }
                if self.range_len.is_match(line) {
                    range_len += 1;
                }
                active_loops.push(indent);
                continue;
            }

            if self.io_call.is_match(line) {
                report.io_operations += 1;
                if in_loop {
                    report.io_in_loops += 1;
                }
            }
            if in_loop && self.allocation.is_match(line) {
                report.allocations_in_loops += 1;
            }
            if in_loop && self.concat.is_match(line) {
                report.string_concat_in_loops += 1;
            }
        }

        if report.nested_loops > 0 {
            report.recommendations.push(format!(
                "Reduce {} nested loop(s); consider a lookup table or precomputed index",
                report.nested_loops
            ));
        }
        if report.io_in_loops > 0 {
            report
                .recommendations
                .push("Batch I/O operations outside loop bodies".to_string());
        }
        if report.allocations_in_loops > 0 {
            report
                .recommendations
                .push("Hoist allocations out of hot loops or preallocate capacity".to_string());
        }
        if report.string_concat_in_loops > 0 {
            report
                .recommendations
                .push("Build strings with join() or a buffer instead of += in loops".to_string());
        }
        if range_len > 0 {
            report
                .recommendations
                .push("Iterate directly or with enumerate() instead of range(len())".to_string());
        }
        if report.recommendations.is_empty() {
            report
                .recommendations
                .push("No obvious performance issues found".to_string());
        }

        let penalty = 10 * report.nested_loops
            + 5 * report.io_in_loops
            + 2 * report.allocations_in_loops
            + 3 * report.string_concat_in_loops;
        report.score = 100u32.saturating_sub(u32::try_from(penalty).unwrap_or(u32::MAX));
        report
    }
}
