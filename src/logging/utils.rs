//! Helpers shared by the console formatter and the log file layer.
use std::borrow::Cow;

/// Timestamp precision used in log output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum Stamp {
    /// `YYYY-MM-DD HH:MM:SS`, written once in the log file header.
    Header,
    /// `HH:MM:SS`, prefixed to every log file line.
    Line,
}

impl Stamp {
    /// Current UTC time at this precision.
    pub(super) fn now(self) -> String {
        let format = match self {
            Self::Header => "%Y-%m-%d %H:%M:%S",
            Self::Line => "%H:%M:%S",
        };
        chrono::Utc::now().format(format).to_string()
    }
}

/// Remove terminal escape sequences so `text` can go to a plain file.
///
/// A CSI sequence (`ESC [` ... final byte in `@`..=`~`) is dropped whole; any
/// other escape drops only the byte that follows it.
pub(super) fn plain(text: &str) -> Cow<'_, str> {
    if !text.contains('\x1b') {
        return Cow::Borrowed(text);
    }
    let mut chunks = text.split('\x1b');
    let mut out = chunks.next().unwrap_or_default().to_string();
    for chunk in chunks {
        let rest = match chunk.strip_prefix('[') {
            Some(csi) => csi
                .find(|c: char| ('@'..='~').contains(&c))
                .and_then(|end| csi.get(end + 1..))
                .unwrap_or(""),
            None => {
                let skip = chunk.chars().next().map_or(0, char::len_utf8);
                chunk.get(skip..).unwrap_or("")
            }
        };
        out.push_str(rest);
    }
    Cow::Owned(out)
}
