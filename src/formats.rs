use serde_json::{json, Value};
use std::path::Path;

use crate::error::{Result, LokaraError};

/// Maximum upload size accepted by the platform, in megabytes.
pub const MAX_UPLOAD_SIZE_MB: u64 = 10;

/// Platform-supported localization file extensions and their format names.
pub const SUPPORTED_FORMATS: &[(&str, &str)] = &[
    // Key-value formats
    (".properties", "Java Properties"),
    (".strings", "iOS Strings"),
    (".stringsdict", "iOS Stringsdict"),
    (".plist", "iOS Plist"),
    (".xml", "Android XML/XLIFF/HTML"),
    (".resx", ".NET RESX"),
    (".resw", "UWP RESW"),
    (".ts", "QT Linguist"),
    // Document formats
    (".json", "JSON"),
    (".yml", "YAML"),
    (".yaml", "YAML"),
    (".po", "GNU gettext"),
    (".pot", "GNU gettext template"),
    (".csv", "CSV"),
    (".xlsx", "Excel"),
    (".xls", "Excel"),
    // Framework-specific
    (".arb", "Flutter ARB"),
    (".ini", "INI"),
    (".toml", "TOML"),
    // Nested formats
    (".nested.json", "Nested JSON"),
    (".nested.yml", "Nested YAML"),
    (".nested.yaml", "Nested YAML"),
];

/// Resolve the platform format name for a filename, honoring the
/// `<name>.nested.<ext>` convention. Returns `None` for unsupported files.
pub fn format_name(filename: &str) -> Option<&'static str> {
    let extension = effective_extension(filename)?;
    SUPPORTED_FORMATS
        .iter()
        .find(|(ext, _)| *ext == extension)
        .map(|(_, name)| *name)
}

/// Derive format-specific upload options from the filename.
pub fn detect_format_options(filename: &str) -> Value {
    let lower = filename.to_lowercase();
    let extension = simple_extension(&lower);
    let is_nested = is_nested_filename(&lower);

    match extension.as_deref() {
        Some(".json") => json!({
            "plural_format": "icu",
            "nested_json": is_nested,
        }),
        Some(".yml") | Some(".yaml") => json!({
            "plural_format": "icu",
            "nested_yaml": is_nested,
        }),
        Some(".xml") => json!({
            "extract_plurals": true,
        }),
        Some(".properties") | Some(".strings") => json!({
            "escape_quotes": 2,
        }),
        _ => json!({}),
    }
}

/// Check that a file exists, has a supported extension, and stays under the
/// platform size limit.
pub fn validate_upload<P: AsRef<Path>>(path: P) -> Result<()> {
    let path = path.as_ref();

    if !path.is_file() {
        return Err(LokaraError::FileNotFound(path.display().to_string()));
    }

    let filename = path
        .file_name()
        .map(|name| name.to_string_lossy().to_string())
        .unwrap_or_default();

    if format_name(&filename).is_none() {
        let supported: Vec<&str> = SUPPORTED_FORMATS.iter().map(|(ext, _)| *ext).collect();
        return Err(LokaraError::UnsupportedFormat(format!(
            "'{}' is not a supported localization file. Supported formats are: {}",
            filename,
            supported.join(", ")
        )));
    }

    let size = std::fs::metadata(path)?.len();
    let max_bytes = MAX_UPLOAD_SIZE_MB * 1024 * 1024;
    if size > max_bytes {
        return Err(LokaraError::UnsupportedFormat(format!(
            "File size ({:.1}MB) exceeds maximum allowed size of {}MB",
            size as f64 / 1024.0 / 1024.0,
            MAX_UPLOAD_SIZE_MB
        )));
    }

    Ok(())
}

/// Extension including the `.nested` marker when present.
fn effective_extension(filename: &str) -> Option<String> {
    let lower = filename.to_lowercase();
    let extension = simple_extension(&lower)?;

    if is_nested_filename(&lower) {
        Some(format!(".nested{}", extension))
    } else {
        Some(extension)
    }
}

fn simple_extension(lower_filename: &str) -> Option<String> {
    let idx = lower_filename.rfind('.')?;
    if idx == 0 {
        return None;
    }
    Some(lower_filename[idx..].to_string())
}

fn is_nested_filename(lower_filename: &str) -> bool {
    let Some(extension) = simple_extension(lower_filename) else {
        return false;
    };

    if !matches!(extension.as_str(), ".json" | ".yml" | ".yaml") {
        return false;
    }

    lower_filename[..lower_filename.len() - extension.len()].ends_with(".nested")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_format_name() {
        assert_eq!(format_name("strings.json"), Some("JSON"));
        assert_eq!(format_name("app.nested.json"), Some("Nested JSON"));
        assert_eq!(format_name("app.nested.yaml"), Some("Nested YAML"));
        assert_eq!(format_name("Localizable.strings"), Some("iOS Strings"));
        assert_eq!(format_name("messages.PO"), Some("GNU gettext"));
        assert_eq!(format_name("archive.zip"), None);
        assert_eq!(format_name("no-extension"), None);
    }

    #[test]
    fn test_detect_format_options() {
        let options = detect_format_options("app.nested.json");
        assert_eq!(options["plural_format"], "icu");
        assert_eq!(options["nested_json"], true);

        let options = detect_format_options("strings.yml");
        assert_eq!(options["nested_yaml"], false);

        let options = detect_format_options("strings.xml");
        assert_eq!(options["extract_plurals"], true);

        let options = detect_format_options("app.properties");
        assert_eq!(options["escape_quotes"], 2);

        assert_eq!(detect_format_options("messages.po"), serde_json::json!({}));
    }

    #[test]
    fn test_validate_upload() {
        let dir = tempfile::tempdir().unwrap();

        let supported = dir.path().join("en.json");
        std::fs::File::create(&supported)
            .unwrap()
            .write_all(b"{}")
            .unwrap();
        assert!(validate_upload(&supported).is_ok());

        let unsupported = dir.path().join("binary.bin");
        std::fs::File::create(&unsupported).unwrap();
        assert!(matches!(
            validate_upload(&unsupported),
            Err(LokaraError::UnsupportedFormat(_))
        ));

        assert!(matches!(
            validate_upload(dir.path().join("missing.json")),
            Err(LokaraError::FileNotFound(_))
        ));
    }
}
