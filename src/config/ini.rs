//! Minimal INI reader for the system configuration store.
use std::path::Path;

use crate::error::ConfigError;
use crate::operations::FileSystemOps;

/// A key-value section from an INI file.
///
/// Headers preserve original case since they name the section.
///
/// # Examples
///
/// ```
/// use configurability::config::ini::KvSection;
///
/// let section = KvSection {
///     header: "database".to_string(),
///     entries: vec![("configuration_file_name".to_string(), "db.conf".to_string())],
/// };
/// assert_eq!(section.header, "database");
/// assert_eq!(section.entries[0].1, "db.conf");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KvSection {
    /// The raw section header (e.g., `"database"`).
    pub header: String,
    /// Key-value entries within this section, in file order.
    pub entries: Vec<(String, String)>,
}

/// Parse an INI file into key-value sections.
///
/// # Errors
///
/// Returns [`ConfigError::Io`] if the file cannot be read and
/// [`ConfigError::InvalidSyntax`] if its content cannot be parsed.
pub fn parse_kv_sections(
    path: &Path,
    fs: &dyn FileSystemOps,
) -> Result<Vec<KvSection>, ConfigError> {
    let bytes = fs.read(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_kv_sections_from_str(&String::from_utf8_lossy(&bytes))
}

/// Parse key-value INI content from a string.
///
/// Format:
/// ```ini
/// ; full-line comments start with `;` or `#`
/// [database]
/// configuration_file_name = db.conf  # inline comment stripped
/// owner = "postgres"
/// ```
///
/// # Examples
///
/// ```
/// use configurability::config::ini::parse_kv_sections_from_str;
///
/// let sections = parse_kv_sections_from_str(
///     "[database]\nconfiguration_file_name = db.conf\n"
/// ).unwrap();
/// assert_eq!(sections[0].header, "database");
/// assert_eq!(
///     sections[0].entries[0],
///     ("configuration_file_name".to_string(), "db.conf".to_string())
/// );
/// ```
///
/// Values wrapped in matching quotes are unquoted:
///
/// ```
/// use configurability::config::ini::parse_kv_sections_from_str;
///
/// let sections = parse_kv_sections_from_str("[s]\nkey = \"a # b\"\n").unwrap();
/// assert_eq!(sections[0].entries[0].1, "a # b");
/// ```
///
/// # Errors
///
/// Returns [`ConfigError::InvalidSyntax`] if:
/// - A key-value pair is malformed (missing `=` or empty key)
/// - An entry appears outside of a section header
pub fn parse_kv_sections_from_str(content: &str) -> Result<Vec<KvSection>, ConfigError> {
    let mut sections = Vec::new();
    let mut current: Option<KvSection> = None;

    for (line_num, line) in content.lines().enumerate() {
        let trimmed = line.trim();

        if trimmed.is_empty() || trimmed.starts_with('#') || trimmed.starts_with(';') {
            continue;
        }

        if let Some(header) = parse_raw_header(trimmed) {
            if let Some(section) = current.take() {
                sections.push(section);
            }
            current = Some(KvSection {
                header,
                entries: Vec::new(),
            });
        } else if let Some(ref mut section) = current {
            let Some(entry) = parse_kv_line(trimmed) else {
                return Err(ConfigError::InvalidSyntax {
                    line: line_num + 1,
                    message: format!("invalid key-value pair: {trimmed}"),
                });
            };
            section.entries.push(entry);
        } else {
            return Err(ConfigError::InvalidSyntax {
                line: line_num + 1,
                message: format!("entry outside of section: {trimmed}"),
            });
        }
    }

    if let Some(section) = current {
        sections.push(section);
    }

    Ok(sections)
}

/// Parse a `[header]` line preserving original case.
fn parse_raw_header(line: &str) -> Option<String> {
    let inner = line.trim().strip_prefix('[')?.strip_suffix(']')?;
    let trimmed = inner.trim();
    if trimmed.is_empty() {
        return None;
    }
    Some(trimmed.to_string())
}

/// Parse a `key = value` line.
///
/// - `"owner = postgres # comment"` → `("owner", "postgres")`
/// - `"owner = 'post # gres'"` → `("owner", "post # gres")`
fn parse_kv_line(line: &str) -> Option<(String, String)> {
    let (key, value) = line.split_once('=')?;
    let key = key.trim();
    if key.is_empty() {
        return None;
    }
    let value = value.trim();
    let value = unquote(value).unwrap_or_else(|| strip_inline_comment(value));
    Some((key.to_string(), value.to_string()))
}

/// Return the inner text of a value wrapped in matching `"` or `'` quotes.
fn unquote(value: &str) -> Option<&str> {
    ['"', '\'']
        .into_iter()
        .find_map(|q| value.strip_prefix(q)?.strip_suffix(q))
}

/// Render `value` so that [`parse_kv_sections_from_str`] reads it back
/// unchanged.
///
/// Values that would lose an inline comment, surrounding whitespace or an
/// outer pair of quotes are wrapped in double quotes; the parser only strips
/// the outermost pair, so inner quotes need no escaping.
///
/// ```
/// use configurability::config::ini::quote_value;
///
/// assert_eq!(quote_value("postgres"), "postgres");
/// assert_eq!(quote_value("a # b"), "\"a # b\"");
/// assert_eq!(quote_value("'x'"), "\"'x'\"");
/// ```
#[must_use]
pub fn quote_value(value: &str) -> std::borrow::Cow<'_, str> {
    let needs_quotes = value.contains(" #")
        || value.contains("\t#")
        || value.trim() != value
        || unquote(value).is_some();
    if needs_quotes {
        format!("\"{value}\"").into()
    } else {
        value.into()
    }
}

/// Strip inline comments (`#` preceded by whitespace) from a value.
fn strip_inline_comment(value: &str) -> &str {
    value
        .find(" #")
        .or_else(|| value.find("\t#"))
        .map_or(value, |idx| value[..idx].trim_end())
}
