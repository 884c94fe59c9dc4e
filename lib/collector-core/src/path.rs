//! Path segment joining shared by artifact generation and the proxy

/// Join path segments with a single `/`.
///
/// Leading and trailing slashes are stripped from every segment and segments
/// that end up empty are dropped. The result never starts or ends with `/`.
pub fn join_path<I, S>(segments: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut joined = String::new();
    for segment in segments {
        let segment = segment.as_ref().trim_matches('/');
        if segment.is_empty() {
            continue;
        }
        if !joined.is_empty() {
            joined.push('/');
        }
        joined.push_str(segment);
    }
    joined
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_join_strips_slashes() {
        assert_eq!(join_path(["/v1", "openapi.json"]), "v1/openapi.json");
        assert_eq!(join_path(["/v1/", "/openapi.json"]), "v1/openapi.json");
    }

    #[test]
    fn test_join_drops_empty_segments() {
        assert_eq!(join_path(["/", "openapi.json"]), "openapi.json");
        assert_eq!(join_path(["", "//", "openapi.json"]), "openapi.json");
        assert_eq!(join_path(["svc-ns", "/", "openapi.json"]), "svc-ns/openapi.json");
    }

    #[test]
    fn test_join_nothing() {
        assert_eq!(join_path(Vec::<String>::new()), "");
        assert_eq!(join_path(["/", ""]), "");
    }

    #[test]
    fn test_join_keeps_inner_separators() {
        assert_eq!(join_path(["api/v2", "openapi.json"]), "api/v2/openapi.json");
    }
}
