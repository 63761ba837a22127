//! Logging configuration for Simsh
//!
//! Events go through `tracing`. Anything a user typed passes through
//! [`LogConfig`] first so credentials in URLs and control characters never
//! reach a log line.
//!
//! # Log Levels
//!
//! - **ERROR**: Recovered handler panics
//! - **WARN**: Store limits hit
//! - **INFO**: Session lifecycle
//! - **DEBUG**: Command dispatch and handler failures

use std::borrow::Cow;
use std::ops::Range;

/// Configuration for logging behavior
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogConfig {
    /// Whether to redact URL credentials (default: true)
    pub redact_sensitive: bool,

    /// Whether raw command arguments may be logged (default: false)
    pub log_arguments: bool,

    /// Maximum length of logged values before truncation (default: 200)
    pub max_value_length: usize,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            redact_sensitive: true,
            log_arguments: false,
            max_value_length: 200,
        }
    }
}

impl LogConfig {
    /// Create a new log configuration with defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Disable credential redaction. Debugging only.
    pub fn unsafe_disable_redaction(mut self) -> Self {
        self.redact_sensitive = false;
        self
    }

    /// Include command arguments in debug events.
    pub fn log_arguments(mut self, enabled: bool) -> Self {
        self.log_arguments = enabled;
        self
    }

    /// Set maximum length for logged values
    pub fn max_value_length(mut self, len: usize) -> Self {
        self.max_value_length = len;
        self
    }

    /// Replace userinfo (`user:pass@`) in a URL or `user:pass@host` target
    /// with a marker, truncating anything else that runs long.
    pub fn redact_url<'a>(&self, url: &'a str) -> Cow<'a, str> {
        if !self.redact_sensitive {
            return self.truncate(url);
        }
        match userinfo_range(url) {
            Some(range) => Cow::Owned(format!(
                "{}[REDACTED]@{}",
                &url[..range.start],
                &url[range.end..]
            )),
            None => self.truncate(url),
        }
    }

    /// Prepare a command line for a log event.
    ///
    /// Without `log_arguments`, only the command name and argument count
    /// are kept.
    pub fn format_command(&self, name: &str, args: &[String]) -> String {
        if !self.log_arguments {
            return format!("{} [{} args]", sanitize_for_log(name), args.len());
        }
        let mut line = sanitize_for_log(name);
        for arg in args {
            line.push(' ');
            line.push_str(&sanitize_for_log(&self.redact_url(arg)));
        }
        self.truncate(&line).into_owned()
    }

    /// Truncate value if it exceeds max length, on a char boundary.
    pub fn truncate<'a>(&self, value: &'a str) -> Cow<'a, str> {
        if value.len() <= self.max_value_length {
            Cow::Borrowed(value)
        } else {
            let mut end = self.max_value_length;
            while end > 0 && !value.is_char_boundary(end) {
                end -= 1;
            }
            Cow::Owned(format!(
                "{}...[truncated {} bytes]",
                &value[..end],
                value.len() - end
            ))
        }
    }
}

/// Drop userinfo (`user:pass@`) from a URL or `user:pass@host` target.
///
/// Unlike [`LogConfig::redact_url`] this never truncates, so it is safe for
/// text that ends up in command output or file content.
pub fn strip_credentials(url: &str) -> Cow<'_, str> {
    match userinfo_range(url) {
        Some(range) => Cow::Owned(format!("{}{}", &url[..range.start], &url[range.end..])),
        None => Cow::Borrowed(url),
    }
}

/// Byte range of the userinfo part including its trailing `@`.
///
/// Bare `user@host` targets without a scheme carry no secret and yield
/// `None`.
fn userinfo_range(url: &str) -> Option<Range<usize>> {
    let start = url.find("://").map_or(0, |idx| idx + 3);
    let rest = &url[start..];
    let authority_end = rest.find('/').unwrap_or(rest.len());
    let at_pos = rest[..authority_end].rfind('@')?;
    (start > 0 || rest[..at_pos].contains(':')).then(|| start..start + at_pos + 1)
}

/// Escape newlines and drop other control characters.
pub fn sanitize_for_log(input: &str) -> String {
    input
        .replace('\n', "\\n")
        .replace('\r', "\\r")
        .replace('\t', "\\t")
        .chars()
        .filter(|c| !c.is_control())
        .collect()
}
