//! Raw-insertion newtypes.
//!
//! The artifact template escapes every plain value. The only text inserted
//! unescaped goes through one of these types, each of which makes its
//! content unable to terminate the element it is embedded in.

use regex::Regex;
use serde::Serialize;
use std::fmt;
use std::sync::OnceLock;

fn cached(cell: &'static OnceLock<Option<Regex>>, pattern: &str) -> Option<&'static Regex> {
    cell.get_or_init(|| Regex::new(pattern).ok()).as_ref()
}

fn script_close() -> Option<&'static Regex> {
    static RE: OnceLock<Option<Regex>> = OnceLock::new();
    cached(&RE, r"(?i)</(script)")
}

fn style_close() -> Option<&'static Regex> {
    static RE: OnceLock<Option<Regex>> = OnceLock::new();
    cached(&RE, r"(?i)</(style)")
}

fn script_element() -> Option<&'static Regex> {
    static RE: OnceLock<Option<Regex>> = OnceLock::new();
    cached(&RE, r"(?is)<script\b[^>]*>.*?</script\s*>")
}

fn replace_all(re: Option<&Regex>, text: &str, rep: &str) -> String {
    match re {
        Some(re) => re.replace_all(text, rep).into_owned(),
        None => text.to_string(),
    }
}

/// JSON for an `application/json` script block.
///
/// `<`, `>` and `&` are emitted as `\u003c`, `\u003e` and `\u0026`, which
/// keeps the text valid JSON and free of markup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptJson(String);

impl ScriptJson {
    pub fn new<T: Serialize>(value: &T) -> serde_json::Result<Self> {
        let json = serde_json::to_string(value)?;
        Ok(Self(
            json.replace('<', "\\u003c")
                .replace('>', "\\u003e")
                .replace('&', "\\u0026"),
        ))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// JavaScript source for an inline `<script>` element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InlineScript(String);

impl InlineScript {
    pub fn new(source: &str) -> Self {
        let closed = replace_all(script_close(), source, r"<\/$1");
        Self(closed.replace("<!--", r"<\!--"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// CSS text for an inline `<style>` element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StyleText(String);

impl StyleText {
    pub fn new(css: &str) -> Self {
        Self(replace_all(style_close(), css, r"<\/$1"))
    }

    /// Join fragments, dropping exact duplicates and blanks.
    pub fn join<'a>(fragments: impl IntoIterator<Item = &'a str>) -> Self {
        let mut seen: Vec<&str> = Vec::new();
        for fragment in fragments {
            let fragment = fragment.trim();
            if !fragment.is_empty() && !seen.contains(&fragment) {
                seen.push(fragment);
            }
        }
        Self::new(&seen.join("\n"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Captured view markup with script elements removed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapturedMarkup(String);

impl CapturedMarkup {
    pub fn new(markup: &str) -> Self {
        Self(replace_all(script_element(), markup, ""))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

macro_rules! display_raw {
    ($($ty:ty),*) => {
        $(impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        })*
    };
}

display_raw!(ScriptJson, InlineScript, StyleText, CapturedMarkup);
