use once_cell::sync::Lazy;
use regex_lite::Regex;
use std::fmt;

use crate::search::Candidate;

static UNSAFE_CHARS: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^A-Za-z0-9._-]").unwrap());
static UNDERSCORES: Lazy<Regex> = Lazy::new(|| Regex::new(r"_+").unwrap());

/// Map any string to a file-system safe name.
///
/// Characters outside `[A-Za-z0-9._-]` become `_`, underscore runs collapse,
/// and leading/trailing underscores are trimmed.
pub fn make_safe_path(name: &str) -> String {
    let replaced = UNSAFE_CHARS.replace_all(name, "_");
    let collapsed = UNDERSCORES.replace_all(&replaced, "_");
    collapsed.trim_matches('_').to_string()
}

/// File name template for batch downloads.
///
/// Placeholders: `{index}`, `{name}` (made safe), `{ext}`, `{id}`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilenameFormat {
    template: String,
}

pub const DEFAULT_FILENAME_FORMAT: &str = "{index}_{name}.{ext}";

impl FilenameFormat {
    pub fn new(template: impl Into<String>) -> Self {
        Self {
            template: template.into(),
        }
    }

    pub fn template(&self) -> &str {
        &self.template
    }

    pub fn render(&self, index: usize, candidate: &Candidate) -> String {
        self.template
            .replace("{index}", &index.to_string())
            .replace("{name}", &make_safe_path(&candidate.name))
            .replace("{ext}", &candidate.extension)
            .replace("{id}", &candidate.identifier)
    }
}

impl Default for FilenameFormat {
    fn default() -> Self {
        Self::new(DEFAULT_FILENAME_FORMAT)
    }
}

impl fmt::Display for FilenameFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.template)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::search::CardType;
    use crate::testing::fixtures;

    #[test]
    fn test_make_safe_path() {
        assert_eq!(make_safe_path("Jace, Vryn's Prodigy"), "Jace_Vryn_s_Prodigy");
        assert_eq!(make_safe_path("  Bayou  "), "Bayou");
        assert_eq!(make_safe_path("a/b\\c:d"), "a_b_c_d");
        assert_eq!(make_safe_path("ok-name_1.png"), "ok-name_1.png");
        assert_eq!(make_safe_path("???"), "");
    }

    #[test]
    fn test_default_format() {
        let candidate = fixtures::candidate("abc", "Lim-Dûl's Vault", CardType::Card, "x", 0);
        assert_eq!(
            FilenameFormat::default().render(3, &candidate),
            "3_Lim-D_l_s_Vault.png"
        );
    }

    #[test]
    fn test_all_placeholders() {
        let candidate = fixtures::candidate("abc", "Bayou", CardType::Card, "bayou", 0);
        let format = FilenameFormat::new("{id}-{index}-{name}.{ext}");
        assert_eq!(format.render(0, &candidate), "abc-0-Bayou.png");
        assert_eq!(format.to_string(), "{id}-{index}-{name}.{ext}");
    }
}
