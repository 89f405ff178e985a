use crate::ExportFormat;

const MAX_STEM_CHARS: usize = 80;

/// Windows-safe output filename: `{sanitized_title}.{md|html}`.
pub fn article_filename(title: &str, format: ExportFormat) -> String {
    format!("{}.{}", sanitize_stem(title), format.extension())
}

/// Replaces characters that are illegal in file names and caps the length.
pub fn sanitize_stem(input: &str) -> String {
    let cleaned: String = input
        .chars()
        .map(|c| if is_forbidden(c) { '_' } else { c })
        .take(MAX_STEM_CHARS)
        .collect();
    let mut stem = cleaned.trim_end_matches(['.', ' ']).trim_start().to_string();
    if stem.is_empty() {
        stem = "untitled".to_string();
    }
    if is_reserved_windows_name(&stem) {
        stem.push('_');
    }
    stem
}

fn is_forbidden(c: char) -> bool {
    matches!(c, '\\' | '/' | ':' | '*' | '?' | '"' | '<' | '>' | '|') || c.is_control()
}

fn is_reserved_windows_name(name: &str) -> bool {
    const RESERVED: &[&str] = &[
        "CON", "PRN", "AUX", "NUL", "COM1", "COM2", "COM3", "COM4", "COM5", "COM6", "COM7", "COM8",
        "COM9", "LPT1", "LPT2", "LPT3", "LPT4", "LPT5", "LPT6", "LPT7", "LPT8", "LPT9",
    ];
    let base = name.split('.').next().unwrap_or(name);
    RESERVED.iter().any(|r| r.eq_ignore_ascii_case(base))
}
