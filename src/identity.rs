use std::sync::LazyLock;

use regex_lite::Regex;

static HTTPS_SHAPE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z][A-Za-z0-9+.-]*://[^/]+/([^/]+)/([^/]+)$").expect("valid regex")
});

static SSH_SHAPE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^@/]+@[^:/]+:([^/]+)/([^/]+)$").expect("valid regex"));

/// Owner/name pair parsed from the primary remote URL, used only for
/// building branch hyperlinks in the report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoIdentity {
    pub owner: String,
    pub name: String,
}

impl RepoIdentity {
    #[must_use]
    pub fn unknown() -> Self {
        Self {
            owner: "unknown".to_string(),
            name: "unknown".to_string(),
        }
    }

    /// Accepts `scheme://host/owner/repo[.git]` and
    /// `user@host:owner/repo[.git]`; the host is unconstrained.
    #[must_use]
    pub fn from_remote_url(url: &str) -> Option<Self> {
        let trimmed = url.trim().trim_end_matches('/');
        let trimmed = trimmed.strip_suffix(".git").unwrap_or(trimmed);
        let captures = HTTPS_SHAPE
            .captures(trimmed)
            .or_else(|| SSH_SHAPE.captures(trimmed))?;
        let owner = captures.get(1)?.as_str();
        let name = captures.get(2)?.as_str();
        if owner.is_empty() || name.is_empty() {
            return None;
        }
        Some(Self {
            owner: owner.to_string(),
            name: name.to_string(),
        })
    }

    #[must_use]
    pub fn branch_url(&self, short_branch: &str) -> String {
        format!(
            "https://github.com/{}/{}/tree/{}",
            self.owner, self.name, short_branch
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_https_shape() {
        let id = RepoIdentity::from_remote_url("https://example.com/acme/widgets.git").unwrap();
        assert_eq!(id.owner, "acme");
        assert_eq!(id.name, "widgets");
    }

    #[test]
    fn parses_https_without_git_suffix_and_trailing_slash() {
        let id = RepoIdentity::from_remote_url("https://example.com/acme/widgets/").unwrap();
        assert_eq!(id.owner, "acme");
        assert_eq!(id.name, "widgets");
    }

    #[test]
    fn parses_ssh_shape() {
        let id = RepoIdentity::from_remote_url("git@example.com:acme/widgets.git").unwrap();
        assert_eq!(id.owner, "acme");
        assert_eq!(id.name, "widgets");
    }

    #[test]
    fn rejects_unparseable_urls() {
        assert!(RepoIdentity::from_remote_url("not a url").is_none());
        assert!(RepoIdentity::from_remote_url("https://example.com/acme").is_none());
        assert!(RepoIdentity::from_remote_url("").is_none());
    }

    #[test]
    fn unknown_placeholder_still_builds_links() {
        let id = RepoIdentity::unknown();
        assert_eq!(
            id.branch_url("feature/x"),
            "https://github.com/unknown/unknown/tree/feature/x"
        );
    }
}
