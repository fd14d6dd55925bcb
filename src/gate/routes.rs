//! Route classification shared by both gates.

pub const SIGN_IN_PATH: &str = "/auth/signin";
pub const SIGN_UP_PATH: &str = "/auth/signup";
pub const ROOT_PATH: &str = "/";

const PROTECTED_PREFIXES: [&str; 3] = ["/dashboard", "/profile", "/settings"];
const AUTH_ONLY_PREFIXES: [&str; 2] = [SIGN_IN_PATH, SIGN_UP_PATH];

/// Asset paths the request gate never looks at.
const UNGATED_PREFIXES: [&str; 2] = ["/static/", "/favicon.ico"];
const UNGATED_EXTENSIONS: [&str; 6] = [".svg", ".png", ".jpg", ".jpeg", ".gif", ".webp"];

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RouteClass {
    /// Requires a session.
    Protected,
    /// Only for visitors without a session (sign-in, sign-up).
    AuthOnly,
    Public,
}

/// Static prefix tables, fixed for the process lifetime.
#[derive(Clone, Debug)]
pub struct RouteTable {
    protected: Vec<String>,
    auth_only: Vec<String>,
}

impl Default for RouteTable {
    fn default() -> Self {
        Self::new(&PROTECTED_PREFIXES, &AUTH_ONLY_PREFIXES)
    }
}

impl RouteTable {
    #[must_use]
    pub fn new(protected: &[&str], auth_only: &[&str]) -> Self {
        Self {
            protected: protected.iter().map(ToString::to_string).collect(),
            auth_only: auth_only.iter().map(ToString::to_string).collect(),
        }
    }

    /// Classify `path`: Protected wins over AuthOnly, everything else is Public.
    #[must_use]
    pub fn classify(&self, path: &str) -> RouteClass {
        if longest_prefix(&self.protected, path).is_some() {
            RouteClass::Protected
        } else if longest_prefix(&self.auth_only, path).is_some() {
            RouteClass::AuthOnly
        } else {
            RouteClass::Public
        }
    }
}

// Plain string prefixes: `/dashboard-old` is protected too.
fn longest_prefix<'a>(prefixes: &'a [String], path: &str) -> Option<&'a str> {
    prefixes
        .iter()
        .filter(|prefix| path.starts_with(prefix.as_str()))
        .max_by_key(|prefix| prefix.len())
        .map(String::as_str)
}

/// Whether the request gate runs for `path` at all.
#[must_use]
pub fn is_gated(path: &str) -> bool {
    if UNGATED_PREFIXES.iter().any(|prefix| path.starts_with(prefix)) {
        return false;
    }
    !UNGATED_EXTENSIONS.iter().any(|ext| path.ends_with(ext))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_table_classifies_known_routes() {
        let table = RouteTable::default();
        for path in ["/dashboard", "/dashboard/links/1", "/profile", "/settings/security"] {
            assert_eq!(table.classify(path), RouteClass::Protected, "{path}");
        }
        for path in ["/auth/signin", "/auth/signup", "/auth/signin/"] {
            assert_eq!(table.classify(path), RouteClass::AuthOnly, "{path}");
        }
        for path in ["/", "/auth/signout", "/health", "", "/about"] {
            assert_eq!(table.classify(path), RouteClass::Public, "{path}");
        }
    }

    #[test]
    fn classification_is_idempotent() {
        let table = RouteTable::default();
        for path in ["/dashboard", "/auth/signup", "/x", "/settingsx"] {
            assert_eq!(table.classify(path), table.classify(path));
        }
    }

    #[test]
    fn plain_prefix_matching_covers_sibling_paths() {
        let table = RouteTable::default();
        assert_eq!(table.classify("/dashboard-old"), RouteClass::Protected);
        assert_eq!(table.classify("/dash"), RouteClass::Public);
    }

    #[test]
    fn protected_wins_over_auth_only() {
        let table = RouteTable::new(&["/auth/signin/admin"], &["/auth/signin"]);
        assert_eq!(table.classify("/auth/signin/admin"), RouteClass::Protected);
        assert_eq!(table.classify("/auth/signin"), RouteClass::AuthOnly);
    }

    #[test]
    fn assets_are_not_gated() {
        assert!(!is_gated("/static/app.css"));
        assert!(!is_gated("/favicon.ico"));
        assert!(!is_gated("/images/logo.png"));
        assert!(is_gated("/dashboard/export.PNG"));
        assert!(is_gated("/settings/avatar.Jpg"));
        assert!(!is_gated("/photo.webp"));
        assert!(is_gated("/dashboard"));
        assert!(is_gated("/"));
    }
}
