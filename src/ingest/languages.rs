//! Extension tables, content-based language detection, dependency
//! extraction and UI framework detection.

use std::collections::BTreeSet;

use ahash::AHashMap;
use once_cell::sync::Lazy;
use regex::Regex;

use crate::core::errors::Result;
use crate::core::record::ContentCategory;

/// Language label plus content class for a known extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LanguageInfo {
    /// Language label
    pub language: &'static str,
    /// Content class
    pub category: ContentCategory,
}

const fn info(language: &'static str, category: ContentCategory) -> LanguageInfo {
    LanguageInfo { language, category }
}

static EXTENSIONS: Lazy<AHashMap<&'static str, LanguageInfo>> = Lazy::new(|| {
    use ContentCategory::{Code, Data, Document, Markup};

    let table: &[(&str, LanguageInfo)] = &[
        ("py", info("python", Code)),
        ("ipynb", info("python", Code)),
        ("sh", info("shell", Code)),
        ("ps1", info("powershell", Code)),
        ("rs", info("rust", Code)),
        ("js", info("javascript", Code)),
        ("jsx", info("javascript", Code)),
        ("ts", info("typescript", Code)),
        ("tsx", info("typescript", Code)),
        ("java", info("java", Code)),
        ("cs", info("csharp", Code)),
        ("go", info("go", Code)),
        ("cpp", info("cpp", Code)),
        ("c", info("c", Code)),
        ("rb", info("ruby", Code)),
        ("php", info("php", Code)),
        ("dart", info("dart", Code)),
        ("kt", info("kotlin", Code)),
        ("swift", info("swift", Code)),
        ("r", info("r", Code)),
        ("scala", info("scala", Code)),
        ("clj", info("clojure", Code)),
        ("hs", info("haskell", Code)),
        ("elm", info("elm", Code)),
        ("ml", info("ocaml", Code)),
        ("fs", info("fsharp", Code)),
        ("m", info("objective-c", Code)),
        ("sql", info("sql", Code)),
        ("vue", info("vue", Code)),
        ("svelte", info("svelte", Code)),
        ("html", info("html", Markup)),
        ("htm", info("html", Markup)),
        ("css", info("css", Markup)),
        ("scss", info("scss", Markup)),
        ("less", info("less", Markup)),
        ("xml", info("xml", Markup)),
        ("json", info("json", Data)),
        ("yaml", info("yaml", Data)),
        ("yml", info("yaml", Data)),
        ("csv", info("csv", Data)),
        ("tsv", info("tsv", Data)),
        ("md", info("markdown", Document)),
        ("txt", info("text", Document)),
    ];
    table.iter().copied().collect()
});

/// Look up an extension (without the dot, any case).
pub fn classify_extension(extension: &str) -> Option<LanguageInfo> {
    EXTENSIONS.get(extension.to_ascii_lowercase().as_str()).copied()
}

const UI_MARKERS: &[(&str, &[&str])] = &[
    ("react", &["from 'react'", "from \"react\"", "React.", "useState(", "className="]),
    ("vue", &["<template>", "from 'vue'", "from \"vue\"", "v-if=", "v-for=", "new Vue("]),
    ("angular", &["@Component(", "@angular/"]),
    ("svelte", &["from 'svelte", "from \"svelte", "on:click", "{#if"]),
    ("flutter", &["package:flutter/", "StatelessWidget", "StatefulWidget"]),
    ("tkinter", &["import tkinter", "from tkinter", "tk.Tk()"]),
    ("pyqt", &["PyQt5", "PyQt6", "PySide"]),
    ("kivy", &["import kivy", "from kivy"]),
    ("egui", &["egui::"]),
    ("dioxus", &["dioxus::", "rsx!"]),
    ("tui-rs", &["tui::", "ratatui::"]),
];

/// Content-based detection rules, compiled once.
#[derive(Debug, Clone)]
pub struct LanguageDetector {
    content_rules: Vec<(Regex, LanguageInfo)>,
    python_import: Regex,
    js_import: Regex,
    java_import: Regex,
    rust_use: Regex,
    go_import: Regex,
    go_block: Regex,
    quoted: Regex,
}

impl LanguageDetector {
    /// Compile the detection patterns.
    pub fn new() -> Result<Self> {
        use ContentCategory::{Code, Document, Markup};

        let ordered: &[(&str, LanguageInfo)] = &[
            (r"(?i)<!doctype html|<html[\s>]|<body[\s>]|<div[\s>]", info("html", Markup)),
            (r"(?m)^\s*(?:export\s+)?interface\s+\w+\s*\{|:\s*(?:string|number|boolean)\s*[;,)=]", info("typescript", Code)),
            (r"(?m)^\s*(?:pub\s+)?fn\s+\w+|^\s*use\s+\w+::|\blet\s+mut\s|^\s*impl\b", info("rust", Code)),
            (r"(?m)^package\s+\w+\s*$|^\s*func\s+\w+\(", info("go", Code)),
            (r"\bpublic\s+(?:static\s+)?(?:class|void)\b|System\.out\.", info("java", Code)),
            (r"(?m)^\s*def\s+\w+\s*\(|^\s*from\s+[\w.]+\s+import\s|^\s*import\s+\w+\s*$|^\s*class\s+\w+.*:\s*$|\bprint\(", info("python", Code)),
            (r"(?m)\bfunction\s*\w*\s*\(|^\s*(?:const|let|var)\s+\w+\s*=|=>|console\.log|require\(", info("javascript", Code)),
            (r"(?im)^\s*(?:select\s.+\sfrom|insert\s+into|create\s+table|update\s+\w+\s+set)\b", info("sql", Code)),
            (r"(?m)^\s*[.#]?[\w-]+\s*\{\s*$|\{\s*[\w-]+\s*:\s*[^;{}]+;", info("css", Markup)),
            (r"(?m)^#{1,6}\s+\S|^\s*[-*]\s+\S", info("markdown", Document)),
        ];

        let mut content_rules = Vec::with_capacity(ordered.len());
        for (pattern, language) in ordered {
            content_rules.push((Regex::new(pattern)?, *language));
        }

        Ok(Self {
            content_rules,
            python_import: Regex::new(r"(?m)^\s*(?:import\s+([\w.]+)|from\s+([\w.]+)\s+import\b)")?,
            js_import: Regex::new(
                r#"import\s+(?:[^'";]*?\s+from\s+)?['"]([^'"]+)['"]|require\(\s*['"]([^'"]+)['"]\s*\)"#,
            )?,
            java_import: Regex::new(r"(?m)^\s*import\s+(?:static\s+)?([\w.]+)\s*;")?,
            rust_use: Regex::new(r"(?m)^\s*(?:pub\s+)?(?:use\s+([\w:]+)|extern\s+crate\s+(\w+))")?,
            go_import: Regex::new(r#"(?m)^\s*import\s+(?:\w+\s+)?"([^"]+)""#)?,
            go_block: Regex::new(r"(?s)import\s*\((.*?)\)")?,
            quoted: Regex::new(r#""([^"]+)""#)?,
        })
    }

    /// Guess the language of raw text; plain text when nothing matches.
    pub fn detect(&self, text: &str) -> LanguageInfo {
        let trimmed = text.trim_start();
        if (trimmed.starts_with('{') || trimmed.starts_with('['))
            && serde_json::from_str::<serde_json::Value>(text).is_ok()
        {
            return info("json", ContentCategory::Data);
        }

        self.content_rules
            .iter()
            .find(|(pattern, _)| pattern.is_match(text))
            .map(|(_, language)| *language)
            .unwrap_or(info("text", ContentCategory::Document))
    }

    /// Imported modules and packages for `language`.
    pub fn dependencies(&self, language: &str, text: &str) -> BTreeSet<String> {
        let captures = |pattern: &Regex| -> Vec<String> {
            pattern
                .captures_iter(text)
                .filter_map(|caps| caps.iter().skip(1).flatten().next())
                .map(|m| m.as_str().trim_end_matches("::").to_string())
                .filter(|name| !name.is_empty())
                .collect()
        };

        let found = match language {
            "python" => captures(&self.python_import),
            "javascript" | "typescript" | "vue" | "svelte" => captures(&self.js_import),
            "java" | "kotlin" | "scala" => captures(&self.java_import),
            "rust" => captures(&self.rust_use),
            "go" => {
                let mut found = captures(&self.go_import);
                for block in self.go_block.captures_iter(text) {
                    if let Some(body) = block.get(1) {
                        found.extend(
                            self.quoted
                                .captures_iter(body.as_str())
                                .filter_map(|caps| caps.get(1))
                                .map(|m| m.as_str().to_string()),
                        );
                    }
                }
                found
            }
            _ => Vec::new(),
        };

        found.into_iter().collect()
    }
}

/// First enabled UI framework whose markers appear in `text`.
pub fn detect_ui_framework(text: &str, enabled: &[String]) -> Option<String> {
    UI_MARKERS
        .iter()
        .filter(|(name, _)| enabled.iter().any(|candidate| candidate.eq_ignore_ascii_case(name)))
        .find(|(_, markers)| markers.iter().any(|marker| text.contains(marker)))
        .map(|(name, _)| (*name).to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn detector() -> LanguageDetector {
        LanguageDetector::new().unwrap()
    }

    #[test]
    fn extension_lookup_is_case_insensitive() {
        assert_eq!(classify_extension("PY").unwrap().language, "python");
        assert_eq!(classify_extension("md").unwrap().category, ContentCategory::Document);
        assert_eq!(classify_extension("yml").unwrap().category, ContentCategory::Data);
        assert!(classify_extension("exe").is_none());
    }

    #[test]
    fn detects_common_languages_from_content() {
        let detector = detector();
        assert_eq!(detector.detect("def f():\n    return 1\n").language, "python");
        assert_eq!(detector.detect("fn main() {\n    let mut x = 1;\n}").language, "rust");
        assert_eq!(detector.detect("const x = require('fs');").language, "javascript");
        assert_eq!(detector.detect("{\"a\": 1}").language, "json");
        assert_eq!(detector.detect("<!DOCTYPE html><html></html>").language, "html");
        assert_eq!(detector.detect("# Title\n\nSome prose.").language, "markdown");
        assert_eq!(detector.detect("just words").language, "text");
    }

    #[test]
    fn extracts_dependencies_per_language() {
        let detector = detector();
        let python = detector.dependencies("python", "import os\nfrom collections.abc import Mapping\n");
        assert_eq!(python.into_iter().collect::<Vec<_>>(), vec!["collections.abc", "os"]);

        let js = detector.dependencies(
            "javascript",
            "import React from 'react';\nconst fs = require(\"fs\");\nimport './styles.css';",
        );
        assert!(js.contains("react") && js.contains("fs") && js.contains("./styles.css"));

        let rust = detector.dependencies("rust", "use std::collections::{HashMap, HashSet};\nuse serde::Serialize;\n");
        assert!(rust.contains("std::collections"));
        assert!(rust.contains("serde::Serialize"));

        let go = detector.dependencies("go", "import (\n\t\"fmt\"\n\t\"net/http\"\n)\nimport \"os\"\n");
        assert_eq!(go.len(), 3);
    }

    #[test]
    fn ui_framework_detection_respects_enabled_list() {
        let text = "import React, { useState } from 'react';";
        let all = vec!["react".to_string(), "vue".to_string()];
        assert_eq!(detect_ui_framework(text, &all).as_deref(), Some("react"));
        assert_eq!(detect_ui_framework(text, &["vue".to_string()]), None);
        assert_eq!(detect_ui_framework("import tkinter as tk", &["tkinter".to_string()]).as_deref(), Some("tkinter"));
    }
}
