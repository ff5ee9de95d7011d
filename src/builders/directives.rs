use anyhow::{Context, Result};
use regex::Regex;
use std::fmt;

/// Matches a once-only inclusion guard at the start of a line.
const GUARD_PATTERN: &str = r"^\s*#\s*pragma\s+once\b";

/// Matches an include directive at the start of a line. Exactly one of the
/// `quoted` or `angled` groups captures the referenced path.
const INCLUDE_PATTERN: &str = r#"^\s*#\s*include\s*(?:"(?P<quoted>[^"]*)"|<(?P<angled>[^>]*)>)"#;

/// The pair of characters that surrounds the path of an include directive.
///
/// The resolver never looks at this; both kinds are searched the same way.
/// It is kept so diagnostics can show the directive as it was written.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delimiter {
    /// `#include "path"`
    Quote,
    /// `#include <path>`
    Angle,
}

impl fmt::Display for Delimiter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Delimiter::Quote => write!(f, "quote"),
            Delimiter::Angle => write!(f, "angle"),
        }
    }
}

/// The classification of a single source line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Directive<'a> {
    /// A `#pragma once` line.
    Guard,
    /// An `#include` line naming `path`.
    Include { path: &'a str, delimiter: Delimiter },
    /// Anything else.
    Plain,
}

/// The `LineClassifier` trait is the seam between the expander and the
/// textual rules that recognize directives.
pub trait LineClassifier {
    /// Classifies one line of text. Must be a pure function of `line`.
    fn classify<'a>(&self, line: &'a str) -> Directive<'a>;
}

/// Recognizes guard and include directives with line-anchored regular
/// expressions.
///
/// Matching is purely textual. A directive sitting inside a multi-line
/// comment or a raw string literal is reported as if it were active.
#[derive(Debug, Clone)]
pub struct DirectiveMatcher {
    guard: Regex,
    include: Regex,
}

impl DirectiveMatcher {
    /// Compiles the directive patterns.
    pub fn new() -> Result<Self> {
        Ok(Self {
            guard: Regex::new(GUARD_PATTERN).context("Invalid guard directive pattern")?,
            include: Regex::new(INCLUDE_PATTERN).context("Invalid include directive pattern")?,
        })
    }
}

impl LineClassifier for DirectiveMatcher {
    fn classify<'a>(&self, line: &'a str) -> Directive<'a> {
        if self.guard.is_match(line) {
            return Directive::Guard;
        }

        let Some(captures) = self.include.captures(line) else {
            return Directive::Plain;
        };

        // Prefer the quoted form; the regex alternation guarantees exactly one
        // of the two groups participates in a match.
        if let Some(path) = captures.name("quoted") {
            Directive::Include {
                path: path.as_str(),
                delimiter: Delimiter::Quote,
            }
        } else if let Some(path) = captures.name("angled") {
            Directive::Include {
                path: path.as_str(),
                delimiter: Delimiter::Angle,
            }
        } else {
            Directive::Plain
        }
    }
}
