use std::fmt;
use smol_str::SmolStr;

/// Everything that can go wrong while parsing or applying sound changes.
///
/// `Format` covers malformed rule/category notation, `UnknownCategory` and
/// `UnknownFlag` cover dangling references, and `Runtime` covers conditions
/// the matcher cannot resolve at application time (these indicate a rule the
/// parser should have rejected, and carry the offending rule and word).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RuleError {
    Format(String),
    UnknownCategory(SmolStr),
    UnknownFlag(SmolStr),
    Runtime(String),
}

impl RuleError {
    pub fn format_err(msg: &str) -> Self {
        Self::Format(msg.to_string())
    }
    pub fn unknown_category(name: &str) -> Self {
        Self::UnknownCategory(SmolStr::new(name))
    }
    pub fn unknown_flag(name: &str) -> Self {
        Self::UnknownFlag(SmolStr::new(name))
    }
    pub fn runtime_err(msg: &str) -> Self {
        Self::Runtime(msg.to_string())
    }
}

impl fmt::Display for RuleError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Format(e) => write!(f, "format error: {e}"),
            Self::UnknownCategory(name) => write!(f, "unknown category: {name}"),
            Self::UnknownFlag(name) => write!(f, "unknown flag: {name}"),
            Self::Runtime(e) => write!(f, "runtime rule error: {e}"),
        }
    }
}

impl std::error::Error for RuleError {}

/// A ruleset line that failed to parse. The driver records these and keeps
/// going; a bad line never takes the rest of the ruleset down with it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineDiagnostic {
    /// 1-based line number within the ruleset source
    pub line_no: usize,
    pub line: String,
    pub error: RuleError,
}

impl fmt::Display for LineDiagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {}: {} ({})", self.line_no, self.error, self.line)
    }
}
