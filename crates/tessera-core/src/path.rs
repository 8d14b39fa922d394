//! Decides which request paths need a token
//!
//! Matching is textual: a rule `/user` also matches `/userinfo`. Write
//! `/user/*` to limit a rule to the `/user` subtree.

use tessera_types::InterceptMode;

/// Suffix marking a rule as a prefix rule
const WILDCARD: &str = "/*";

/// Strip one trailing `/`, keeping the root path intact
fn normalize(path: &str) -> &str {
    match path.strip_suffix('/') {
        Some(stripped) if !stripped.is_empty() => stripped,
        _ => path,
    }
}

/// Whether `path` is carved out by one of `excludes`.
///
/// An entry ending in `/*` excludes every path starting with the entry
/// minus that suffix. Any other entry must match exactly.
pub fn is_excluded<S: AsRef<str>>(path: &str, excludes: &[S]) -> bool {
    let path = normalize(path);
    excludes.iter().any(|rule| {
        let rule = rule.as_ref();
        match rule.strip_suffix(WILDCARD) {
            Some(prefix) => path.starts_with(prefix),
            None => !rule.is_empty() && path == normalize(rule),
        }
    })
}

/// Path rules for one interception mode
#[derive(Debug, Clone, Default)]
pub struct PathMatcher {
    mode: InterceptMode,
    auth_paths: Vec<String>,
    exclude_paths: Vec<String>,
    login_path: String,
    logout_path: String,
}

impl PathMatcher {
    pub fn new(mode: InterceptMode) -> Self {
        Self {
            mode,
            ..Self::default()
        }
    }

    /// Set the auth-path prefixes (global and bind modes)
    #[must_use]
    pub fn with_auth_paths<I, S>(mut self, paths: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.auth_paths = paths.into_iter().map(Into::into).collect();
        self
    }

    /// Set the exclude rules
    #[must_use]
    pub fn with_exclude_paths<I, S>(mut self, paths: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.exclude_paths = paths.into_iter().map(Into::into).collect();
        self
    }

    /// Set the login and logout endpoints excluded in group mode
    #[must_use]
    pub fn with_session_endpoints(
        mut self,
        login: impl Into<String>,
        logout: impl Into<String>,
    ) -> Self {
        self.login_path = login.into();
        self.logout_path = logout.into();
        self
    }

    pub fn mode(&self) -> InterceptMode {
        self.mode
    }

    pub fn auth_paths(&self) -> &[String] {
        &self.auth_paths
    }

    pub fn exclude_paths(&self) -> &[String] {
        &self.exclude_paths
    }

    /// Whether `path` falls under a bound auth path: equal to it or below
    /// it at a segment boundary. Used by the adapter in bind mode to pick
    /// which requests are intercepted at all.
    pub fn is_bound(&self, path: &str) -> bool {
        let path = normalize(path);
        self.auth_paths.iter().any(|rule| {
            let base = normalize(rule.strip_suffix(WILDCARD).unwrap_or(rule));
            if base == "/" {
                return true;
            }
            path == base
                || path
                    .strip_prefix(base)
                    .is_some_and(|rest| rest.starts_with('/'))
        })
    }

    /// Whether `path` needs a valid token
    pub fn requires_auth(&self, path: &str) -> bool {
        let path = normalize(path);

        match self.mode {
            InterceptMode::Global => {
                let covered = self.auth_paths.iter().any(|rule| {
                    let prefix = rule.strip_suffix(WILDCARD).unwrap_or(rule);
                    path.starts_with(prefix)
                });
                if !covered {
                    return false;
                }
            }
            InterceptMode::Group => {
                let endpoint = [&self.login_path, &self.logout_path]
                    .into_iter()
                    .any(|p| !p.is_empty() && path.ends_with(normalize(p)));
                if endpoint {
                    return false;
                }
            }
            // Bind mode narrows by registration; see `is_bound`
            InterceptMode::Bind => {}
        }

        !is_excluded(path, self.exclude_paths.as_slice())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn global() -> PathMatcher {
        PathMatcher::new(InterceptMode::Global)
            .with_auth_paths(["/user", "/system"])
            .with_exclude_paths(["/user/info", "/system/user/*"])
    }

    #[test]
    fn test_global_mode() {
        let matcher = global();
        assert!(matcher.requires_auth("/user/list"));
        assert!(matcher.requires_auth("/user/add"));
        assert!(!matcher.requires_auth("/user/info"));
        assert!(!matcher.requires_auth("/system/user"));
        assert!(!matcher.requires_auth("/system/user/info"));
        assert!(matcher.requires_auth("/system/dept"));
        assert!(!matcher.requires_auth("/test"));
    }

    #[test]
    fn test_trailing_slash_is_ignored() {
        let matcher = global();
        assert!(!matcher.requires_auth("/user/info/"));
        assert!(matcher.requires_auth("/user/list/"));
    }

    #[test]
    fn test_prefix_match_is_textual() {
        let matcher = global();
        assert!(matcher.requires_auth("/userinfo"));

        let excludes = vec!["/pub/*".to_string(), "/user/info".to_string()];
        assert!(is_excluded("/public-api", excludes.as_slice()));
        assert!(!is_excluded("/user/infos", excludes.as_slice()));
        assert!(is_excluded("/user/info/", excludes.as_slice()));
    }

    #[test]
    fn test_wildcard_exclusion() {
        let excludes: &[&str] = &["/user/*"];
        assert!(is_excluded("/user/1", excludes));
        assert!(is_excluded("/user", excludes));
        assert!(!is_excluded("/account", excludes));
        assert!(!is_excluded("/anything", &[] as &[&str]));
    }

    #[test]
    fn test_wildcard_auth_path() {
        let matcher = PathMatcher::new(InterceptMode::Global).with_auth_paths(["/api/*"]);
        assert!(matcher.requires_auth("/api/orders"));
        assert!(!matcher.requires_auth("/health"));
    }

    #[test]
    fn test_group_mode_skips_session_endpoints() {
        let matcher = PathMatcher::new(InterceptMode::Group)
            .with_session_endpoints("/login", "/logout")
            .with_exclude_paths(["/api/public/*"]);
        assert!(!matcher.requires_auth("/api/login"));
        assert!(!matcher.requires_auth("/api/logout/"));
        assert!(!matcher.requires_auth("/api/public/news"));
        assert!(matcher.requires_auth("/api/orders"));
    }

    #[test]
    fn test_bind_mode_only_applies_exclusions() {
        let matcher = PathMatcher::new(InterceptMode::Bind)
            .with_auth_paths(["/admin"])
            .with_exclude_paths(["/admin/login"]);
        assert!(matcher.requires_auth("/admin/users"));
        assert!(!matcher.requires_auth("/admin/login"));
    }

    #[test]
    fn test_is_bound_respects_segments() {
        let matcher = PathMatcher::new(InterceptMode::Bind).with_auth_paths(["/admin", "/ops/*"]);
        assert!(matcher.is_bound("/admin"));
        assert!(matcher.is_bound("/admin/"));
        assert!(matcher.is_bound("/admin/users"));
        assert!(!matcher.is_bound("/administrator"));
        assert!(matcher.is_bound("/ops/metrics"));
        assert!(!matcher.is_bound("/public"));
    }

    #[test]
    fn test_root_path() {
        assert_eq!(normalize("/"), "/");
        assert_eq!(normalize("/a/"), "/a");
        let matcher = PathMatcher::new(InterceptMode::Bind).with_auth_paths(["/*"]);
        assert!(matcher.is_bound("/anything"));
    }
}
