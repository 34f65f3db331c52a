//! Zip bundle of the JSON report plus the enhanced record texts.

use std::fs::File;
use std::io::Write;
use std::path::{Component, Path};

use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::core::pipeline::PipelineRun;

use super::error::ReportError;

pub const REPORT_ENTRY: &str = "duckycoder_report.json";
const ENHANCED_DIR: &str = "enhanced";

/// Archive entry name for an enhanced record. Identities that are not
/// plain relative paths fall back to `record_<index>.txt`.
pub fn enhanced_entry_name(identity: &str, index: usize) -> String {
    let normal: Vec<String> = Path::new(identity)
        .components()
        .filter_map(|component| match component {
            Component::Normal(part) => part.to_str().map(str::to_string),
            _ => None,
        })
        .collect();
    let usable = !normal.is_empty()
        && normal
            .iter()
            .all(|part| !part.contains(['<', '>', ':', '*', '?', '"', '|']));

    if usable {
        format!("{ENHANCED_DIR}/{}", normal.join("/"))
    } else {
        format!("{ENHANCED_DIR}/record_{index}.txt")
    }
}

/// Write `report_json` and every enhanced text of `run` to `path`.
pub fn write_archive(path: &Path, report_json: &str, run: &PipelineRun) -> Result<usize, ReportError> {
    let mut writer = ZipWriter::new(File::create(path)?);
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

    writer.start_file(REPORT_ENTRY, options)?;
    writer.write_all(report_json.as_bytes())?;

    let mut seen = std::collections::HashSet::new();
    let mut entries = 1;
    for (index, enhancement) in run.enhancements.iter().enumerate() {
        let Some(text) = &enhancement.enhanced_text else {
            continue;
        };
        let mut name = enhanced_entry_name(&enhancement.identity, index);
        if !seen.insert(name.clone()) {
            name = format!("{ENHANCED_DIR}/record_{index}.txt");
            seen.insert(name.clone());
        }
        writer.start_file(name, options)?;
        writer.write_all(text.as_bytes())?;
        entries += 1;
    }

    writer.finish()?;
    Ok(entries)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::pipeline::RecordEnhancement;
    use std::io::Read;
    use tempfile::tempdir;

    fn enhanced(identity: &str, text: Option<&str>) -> RecordEnhancement {
        RecordEnhancement {
            identity: identity.to_string(),
            enhancements: Vec::new(),
            enhanced_text: text.map(str::to_string),
            applied: usize::from(text.is_some()),
            confidence: 1.0,
            errors: Vec::new(),
        }
    }

    #[test]
    fn entry_names_stay_inside_the_enhanced_dir() {
        assert_eq!(enhanced_entry_name("src/app.py", 0), "enhanced/src/app.py");
        assert_eq!(enhanced_entry_name("/abs/../app.py", 1), "enhanced/abs/app.py");
        assert_eq!(enhanced_entry_name("<string>", 2), "enhanced/record_2.txt");
    }

    #[test]
    fn archive_holds_report_and_enhanced_files() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("bundle.zip");
        let mut run = PipelineRun::start(&[]);
        run.enhancements = vec![
            enhanced("a.py", Some("x = 1\n")),
            enhanced("b.py", None),
        ];

        let entries = write_archive(&path, "{\"ok\":true}", &run).unwrap();
        assert_eq!(entries, 2);

        let mut archive = zip::ZipArchive::new(File::open(&path).unwrap()).unwrap();
        assert_eq!(archive.len(), 2);
        let mut body = String::new();
        archive
            .by_name("enhanced/a.py")
            .unwrap()
            .read_to_string(&mut body)
            .unwrap();
        assert_eq!(body, "x = 1\n");
        assert!(archive.by_name(REPORT_ENTRY).is_ok());
    }
}
