//! Annotation filter and spec extraction

use crate::spec::{ServiceMetadata, Spec};

/// Marks a service for collection when set to `true`
pub const COLLECT_ANNOTATION: &str = "openapi/collect";
/// Route prefix under which the API document is served
pub const PATH_ANNOTATION: &str = "openapi/path";
/// Port number or declared port name serving the API document
pub const PORT_ANNOTATION: &str = "openapi/port";

const DEFAULT_COLLECT: &str = "false";
const DEFAULT_PORT: &str = "80";
const DEFAULT_PATH: &str = "/";

/// Outcome of running the filter and extractor over one service
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Extraction {
    /// The service did not opt in
    Ineligible,
    /// The service opted in and resolved to a spec
    Collected(Spec),
    /// The service opted in but its port reference names no declared port
    UnresolvedPort(String),
}

/// Annotation value without surrounding whitespace; blank values fall back
/// to the default like missing ones
fn annotation_or<'a>(svc: &'a ServiceMetadata, key: &str, default: &'a str) -> &'a str {
    match svc.annotation(key).map(str::trim) {
        Some(value) if !value.is_empty() => value,
        _ => default,
    }
}

/// Check whether a service opted in to collection
pub fn is_eligible(svc: &ServiceMetadata) -> bool {
    annotation_or(svc, COLLECT_ANNOTATION, DEFAULT_COLLECT).eq_ignore_ascii_case("true")
}

/// Resolve the port serving the API document.
///
/// Numeric values are used as-is, anything else is looked up by name in the
/// declared ports (first match wins). `None` means the reference could not be
/// resolved to a port in `1..=65535`.
pub fn resolve_port(svc: &ServiceMetadata) -> Option<u16> {
    let value = annotation_or(svc, PORT_ANNOTATION, DEFAULT_PORT);

    if let Ok(port) = value.parse::<u16>() {
        if port != 0 {
            return Some(port);
        }
    }

    svc.ports
        .iter()
        .find(|declared| declared.name.as_deref() == Some(value))
        .and_then(|declared| u16::try_from(declared.port).ok())
        .filter(|port| *port != 0)
}

/// Route prefix of the API document, `/` when unset
pub fn resolve_path(svc: &ServiceMetadata) -> String {
    annotation_or(svc, PATH_ANNOTATION, DEFAULT_PATH).to_string()
}

/// Run the filter and extractor over one service
pub fn extract_spec(svc: &ServiceMetadata) -> Extraction {
    if !is_eligible(svc) {
        return Extraction::Ineligible;
    }

    match resolve_port(svc) {
        Some(port) => Extraction::Collected(Spec::new(
            svc.name.clone(),
            svc.namespace.clone(),
            port,
            resolve_path(svc),
        )),
        None => Extraction::UnresolvedPort(
            annotation_or(svc, PORT_ANNOTATION, DEFAULT_PORT).to_string(),
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn svc() -> ServiceMetadata {
        ServiceMetadata::new("svc-1", "ns-1")
    }

    #[test]
    fn test_eligible_true() {
        assert!(is_eligible(&svc().with_annotation(COLLECT_ANNOTATION, "true")));
        assert!(is_eligible(&svc().with_annotation(COLLECT_ANNOTATION, "True")));
        assert!(is_eligible(&svc().with_annotation(COLLECT_ANNOTATION, "TRUE")));
    }

    #[test]
    fn test_eligible_false() {
        assert!(!is_eligible(&svc().with_annotation(COLLECT_ANNOTATION, "false")));
        assert!(!is_eligible(&svc().with_annotation(COLLECT_ANNOTATION, "yes")));
        assert!(!is_eligible(&svc()));
    }

    #[test]
    fn test_port_numeric() {
        assert_eq!(resolve_port(&svc().with_annotation(PORT_ANNOTATION, "8000")), Some(8000));
    }

    #[test]
    fn test_port_default() {
        assert_eq!(resolve_port(&svc()), Some(80));
        assert_eq!(resolve_port(&svc().with_annotation(PORT_ANNOTATION, "")), Some(80));
    }

    #[test]
    fn test_port_named() {
        let svc = svc()
            .with_annotation(PORT_ANNOTATION, "api-port")
            .with_port(Some("metrics"), 9090)
            .with_port(Some("api-port"), 8000)
            .with_port(Some("api-port"), 8001);
        assert_eq!(resolve_port(&svc), Some(8000));
    }

    #[test]
    fn test_port_whitespace_ignored() {
        assert_eq!(resolve_port(&svc().with_annotation(PORT_ANNOTATION, " 8000 ")), Some(8000));
        assert_eq!(resolve_port(&svc().with_annotation(PORT_ANNOTATION, "  ")), Some(80));
        let svc = svc()
            .with_annotation(PORT_ANNOTATION, " api-port\n")
            .with_port(Some("api-port"), 8000);
        assert_eq!(resolve_port(&svc), Some(8000));
    }

    #[test]
    fn test_port_named_missing() {
        let svc = svc()
            .with_annotation(PORT_ANNOTATION, "missing")
            .with_port(Some("api-port"), 8000)
            .with_port(None, 8001);
        assert_eq!(resolve_port(&svc), None);
    }

    #[test]
    fn test_port_out_of_range() {
        assert_eq!(resolve_port(&svc().with_annotation(PORT_ANNOTATION, "0")), None);
        assert_eq!(resolve_port(&svc().with_annotation(PORT_ANNOTATION, "70000")), None);
        let svc = svc()
            .with_annotation(PORT_ANNOTATION, "big")
            .with_port(Some("big"), 70000);
        assert_eq!(resolve_port(&svc), None);
    }

    #[test]
    fn test_path() {
        assert_eq!(resolve_path(&svc().with_annotation(PATH_ANNOTATION, "/v1")), "/v1");
        assert_eq!(resolve_path(&svc()), "/");
    }

    #[test]
    fn test_extract_spec() {
        let svc = svc()
            .with_annotation(COLLECT_ANNOTATION, "true")
            .with_annotation(PORT_ANNOTATION, "8000")
            .with_annotation(PATH_ANNOTATION, "/v1");
        assert_eq!(
            extract_spec(&svc),
            Extraction::Collected(Spec::new("svc-1", "ns-1", 8000, "/v1"))
        );
    }

    #[test]
    fn test_extract_spec_ineligible_skips_port_lookup() {
        let svc = svc().with_annotation(PORT_ANNOTATION, "missing");
        assert_eq!(extract_spec(&svc), Extraction::Ineligible);
    }

    #[test]
    fn test_extract_spec_unresolved_port() {
        let svc = svc()
            .with_annotation(COLLECT_ANNOTATION, "true")
            .with_annotation(PORT_ANNOTATION, "missing");
        assert_eq!(
            extract_spec(&svc),
            Extraction::UnresolvedPort("missing".to_string())
        );
    }
}
