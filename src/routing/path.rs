//! Upstream path and query composition.

/// Join an upstream prefix and a request path with exactly one `/`
/// between them.
pub fn join_paths(prefix: &str, path: &str) -> String {
    let prefix_slash = prefix.ends_with('/');
    let path_slash = path.starts_with('/');

    match (prefix_slash, path_slash) {
        (true, true) => format!("{}{}", prefix, &path[1..]),
        (false, false) => format!("{}/{}", prefix, path),
        _ => format!("{}{}", prefix, path),
    }
}

/// Concatenate two query strings, inserting `&` only when both are present.
pub fn merge_query(upstream: &str, inbound: &str) -> String {
    match (upstream.is_empty(), inbound.is_empty()) {
        (true, _) => inbound.to_string(),
        (_, true) => upstream.to_string(),
        _ => format!("{}&{}", upstream, inbound),
    }
}

/// Append the index filename when `path` names a directory.
pub fn append_index(path: String, index: &str) -> String {
    if path.ends_with('/') && !index.is_empty() {
        path + index
    } else {
        path
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_join_all_slash_combinations() {
        assert_eq!(join_paths("/base/", "/page"), "/base/page");
        assert_eq!(join_paths("/base", "page"), "/base/page");
        assert_eq!(join_paths("/base/", "page"), "/base/page");
        assert_eq!(join_paths("/base", "/page"), "/base/page");
    }

    #[test]
    fn test_join_root_prefix() {
        assert_eq!(join_paths("/", "/blog"), "/blog");
        assert_eq!(join_paths("", "/blog"), "/blog");
        assert_eq!(join_paths("/", "/"), "/");
    }

    #[test]
    fn test_merge_query() {
        assert_eq!(merge_query("", ""), "");
        assert_eq!(merge_query("a=1", ""), "a=1");
        assert_eq!(merge_query("", "b=2"), "b=2");
        assert_eq!(merge_query("a=1", "b=2"), "a=1&b=2");
    }

    #[test]
    fn test_append_index() {
        assert_eq!(append_index("/blog/".into(), "index.html"), "/blog/index.html");
        assert_eq!(append_index("/blog".into(), "index.html"), "/blog");
        assert_eq!(append_index("/".into(), ""), "/");
    }

    proptest! {
        #[test]
        fn prop_join_has_single_separator(
            prefix in "(/[a-z]{1,6}){1,3}",
            path in "(/[a-z]{1,6}){1,3}",
            prefix_slash in any::<bool>(),
            path_slash in any::<bool>(),
        ) {
            let p = if prefix_slash { format!("{}/", prefix) } else { prefix.clone() };
            let q = if path_slash { path.clone() } else { path[1..].to_string() };
            let joined = join_paths(&p, &q);
            prop_assert!(!joined.contains("//"));
            prop_assert_eq!(joined, format!("{}{}", prefix, path));
        }
    }
}
