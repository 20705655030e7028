//! Public-suffix rejection at zone-creation time.
//!
//! Fetching and periodically refreshing the public suffix list from
//! `publicsuffix.org` is an external collaborator's job (out of scope here,
//! per SPEC_FULL §1); what belongs in the core is the check itself, run
//! against whatever list the collaborator last published.

use foldhash::HashSet;

/// A snapshot of the public suffix list, consulted when a zone is created.
#[derive(Clone, Debug, Default)]
pub struct SuffixList {
    suffixes: HashSet<String>,
}

impl SuffixList {
    /// Build a list from raw suffix lines (as fetched from
    /// `publicsuffix.org/list/public_suffix_list.dat`, comments and blank
    /// lines already stripped).
    pub fn from_lines<I: IntoIterator<Item = S>, S: Into<String>>(lines: I) -> Self {
        Self {
            suffixes: lines.into_iter().map(Into::into).collect(),
        }
    }

    /// A small built-in fallback covering the most commonly abused
    /// general-purpose hosting suffixes, used before the first successful
    /// refresh from the external collaborator.
    pub fn builtin_fallback() -> Self {
        Self::from_lines([
            "com", "net", "org", "pages.dev", "vercel.app", "netlify.app", "github.io", "herokuapp.com",
        ])
    }

    /// True if `fqdn` (trailing-dot or not) is itself a public suffix.
    pub fn is_public_suffix(&self, fqdn: &str) -> bool {
        let trimmed = fqdn.trim_end_matches('.').to_ascii_lowercase();
        self.suffixes.contains(&trimmed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_known_suffix() {
        let list = SuffixList::builtin_fallback();
        assert!(list.is_public_suffix("pages.dev"));
        assert!(list.is_public_suffix("pages.dev."));
        assert!(!list.is_public_suffix("example.com"));
    }
}
