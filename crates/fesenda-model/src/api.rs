use serde::{Deserialize, Serialize};

/// Parameter type that marks a URI-carrying call.
const URI_PARAM_TYPE: &str = "android.net.Uri";

/// Class-name fragment identifying content-resolver calls, the only calls
/// whose canonical signature carries a resolved URI suffix.
const CONTENT_RESOLVER_MARKER: &str = "ContentResolver";

/// One intercepted platform API invocation captured during exploration.
///
/// Immutable once captured. The canonical [`unique_string`](Self::unique_string)
/// is the deduplication and equality key used throughout the pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObservedApiCall {
    /// Owning class of the invoked method.
    pub object_class: String,
    pub method_name: String,
    /// Ordered parameter types, fully qualified.
    pub param_types: Vec<String>,
    /// Resolved URI value, present only for content-resolver calls that
    /// received a `android.net.Uri` argument.
    pub uri: Option<String>,
}

impl ObservedApiCall {
    pub fn new(
        object_class: impl Into<String>,
        method_name: impl Into<String>,
        param_types: Vec<String>,
    ) -> Self {
        Self {
            object_class: object_class.into(),
            method_name: method_name.into(),
            param_types,
            uri: None,
        }
    }

    pub fn with_uri(mut self, uri: impl Into<String>) -> Self {
        self.uri = Some(uri.into());
        self
    }

    /// Whether the URI suffix participates in the canonical signature.
    fn has_uri_suffix(&self) -> bool {
        self.uri.is_some()
            && self.object_class.contains(CONTENT_RESOLVER_MARKER)
            && self.param_types.iter().any(|p| p == URI_PARAM_TYPE)
    }

    /// Canonical textual signature:
    /// `Class->method(paramType,paramType)` plus `\t<uri>` for
    /// content-resolver calls with a URI parameter.
    pub fn unique_string(&self) -> String {
        let params = self.param_types.join(",");
        let mut s = format!("{}->{}({})", self.object_class, self.method_name, params);
        if self.has_uri_suffix() {
            s.push('\t');
            s.push_str(self.uri.as_deref().unwrap_or_default());
        }
        s
    }

    /// Policy directive enabling runtime blocking of this API. Tab-separated:
    /// `Class.method(paramTypes)[\turi]\tMock`, consumed by the device-side
    /// enforcement actuator.
    pub fn policy_string(&self) -> String {
        let params = self.param_types.join(", ");
        let uri = if self.has_uri_suffix() {
            format!("\t{}", self.uri.as_deref().unwrap_or_default())
        } else {
            String::new()
        };
        format!(
            "{}.{}({}){}\tMock",
            self.object_class, self.method_name, params, uri
        )
    }
}

impl std::fmt::Display for ObservedApiCall {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.unique_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn camera_open() -> ObservedApiCall {
        ObservedApiCall::new("android.hardware.Camera", "open", vec!["int".into()])
    }

    #[test]
    fn test_unique_string_no_uri() {
        assert_eq!(camera_open().unique_string(), "android.hardware.Camera->open(int)");
    }

    #[test]
    fn test_unique_string_with_uri() {
        let call = ObservedApiCall::new(
            "android.content.ContentResolver",
            "query",
            vec!["android.net.Uri".into(), "java.lang.String[]".into()],
        )
        .with_uri("content://sms");
        assert_eq!(
            call.unique_string(),
            "android.content.ContentResolver->query(android.net.Uri,java.lang.String[])\tcontent://sms"
        );
    }

    #[test]
    fn test_uri_suffix_requires_resolver_class() {
        // URI present but the owning class is not a content resolver.
        let call = ObservedApiCall::new(
            "java.net.URL",
            "openConnection",
            vec!["android.net.Uri".into()],
        )
        .with_uri("content://sms");
        assert!(!call.unique_string().contains("content://sms"));
    }

    #[test]
    fn test_policy_string_format() {
        assert_eq!(
            camera_open().policy_string(),
            "android.hardware.Camera.open(int)\tMock"
        );
    }

    #[test]
    fn test_policy_string_with_uri() {
        let call = ObservedApiCall::new(
            "android.content.ContentResolver",
            "query",
            vec!["android.net.Uri".into(), "java.lang.String".into()],
        )
        .with_uri("content://call_log");
        assert_eq!(
            call.policy_string(),
            "android.content.ContentResolver.query(android.net.Uri, java.lang.String)\tcontent://call_log\tMock"
        );
    }
}
