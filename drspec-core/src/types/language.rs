use serde::{Deserialize, Serialize};

/// The three languages the extractor understands (§3).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    Python,
    Javascript,
    Cpp,
}

impl Language {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Python => "python",
            Self::Javascript => "javascript",
            Self::Cpp => "cpp",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Some(match s {
            "python" => Self::Python,
            "javascript" => Self::Javascript,
            "cpp" => Self::Cpp,
            _ => return None,
        })
    }

    /// Extension → language mapping from §4.3.
    pub fn from_extension(ext: &str) -> Option<Self> {
        Some(match ext {
            "py" | "pyw" => Self::Python,
            "js" | "jsx" | "mjs" | "cjs" | "ts" | "tsx" => Self::Javascript,
            "c" | "cpp" | "cc" | "cxx" | "h" | "hpp" | "hxx" | "hh" | "H" => Self::Cpp,
            _ => return None,
        })
    }

    /// Whether this extension denotes a C/C++ header (declarations without
    /// bodies are additionally emitted for these, §4.2).
    pub fn is_cpp_header(ext: &str) -> bool {
        matches!(ext, "h" | "hpp" | "hxx" | "hh" | "H")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extension_map_matches_spec() {
        assert_eq!(Language::from_extension("py"), Some(Language::Python));
        assert_eq!(Language::from_extension("tsx"), Some(Language::Javascript));
        assert_eq!(Language::from_extension("hpp"), Some(Language::Cpp));
        assert_eq!(Language::from_extension("rs"), None);
    }
}
