use serde::{Deserialize, Serialize};

/// Identity of the synthetic widget standing in for "no specific widget"
/// (API calls observed during app launch/reset rather than a click).
pub const RESET_WIDGET_UID: &str = "<RESET>";

/// On-screen bounds of a widget. Never part of widget identity.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bounds {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl Bounds {
    pub fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }
}

/// Location-independent widget identity. Two widget instances with the same
/// id are the same logical widget, regardless of where they were rendered.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct WidgetId(String);

impl WidgetId {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Identity of the dummy/reset widget.
    pub fn reset() -> Self {
        Self(RESET_WIDGET_UID.to_string())
    }

    pub fn is_reset(&self) -> bool {
        self.0 == RESET_WIDGET_UID
    }
}

impl std::fmt::Display for WidgetId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// An addressable UI element.
///
/// Identity (`uid`) derives from structural and textual properties only;
/// `bounds` is carried for reporting but excluded from identity so that the
/// same widget rendered at a different position still matches.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Widget {
    pub class_name: String,
    pub resource_id: String,
    pub text: String,
    pub content_desc: String,
    pub package_name: String,
    pub enabled: bool,
    pub clickable: bool,
    pub long_clickable: bool,
    pub bounds: Bounds,
    /// Precomputed identity string (see [`Widget::uid`]).
    uid: WidgetId,
}

impl Widget {
    pub fn new(
        class_name: impl Into<String>,
        resource_id: impl Into<String>,
        text: impl Into<String>,
        content_desc: impl Into<String>,
    ) -> Self {
        let class_name = class_name.into();
        let resource_id = resource_id.into();
        let text = text.into();
        let content_desc = content_desc.into();
        let uid = WidgetId(format!(
            "{}[{}]{}|{}",
            class_name, resource_id, text, content_desc
        ));
        Self {
            class_name,
            resource_id,
            text,
            content_desc,
            package_name: String::new(),
            enabled: true,
            clickable: true,
            long_clickable: false,
            bounds: Bounds::default(),
            uid,
        }
    }

    /// The synthetic dummy widget with identity `<RESET>`.
    pub fn dummy() -> Self {
        let mut w = Self::new(RESET_WIDGET_UID, "", "", "");
        w.uid = WidgetId::reset();
        w
    }

    pub fn with_bounds(mut self, bounds: Bounds) -> Self {
        self.bounds = bounds;
        self
    }

    pub fn with_flags(mut self, enabled: bool, clickable: bool, long_clickable: bool) -> Self {
        self.enabled = enabled;
        self.clickable = clickable;
        self.long_clickable = long_clickable;
        self
    }

    /// Location-independent identity.
    pub fn uid(&self) -> &WidgetId {
        &self.uid
    }

    pub fn is_dummy(&self) -> bool {
        self.uid.is_reset()
    }

    /// Whether this widget exposes an interaction affordance.
    pub fn can_be_acted_upon(&self) -> bool {
        self.enabled && (self.clickable || self.long_clickable)
    }

    /// Structural equivalence ignoring on-screen location: same resource-id
    /// when both are non-empty and same text when both are non-empty. At
    /// least one of the two fields must be present on both sides.
    pub fn is_equivalent_ignore_location(&self, other: &Widget) -> bool {
        let res_comparable = !self.resource_id.is_empty() && !other.resource_id.is_empty();
        let text_comparable = !self.text.is_empty() && !other.text.is_empty();

        if !res_comparable && !text_comparable {
            return false;
        }

        (!res_comparable || self.resource_id == other.resource_id)
            && (!text_comparable || self.text == other.text)
    }

    /// Raw dump used in report files (tab-free, single line).
    pub fn dump(&self) -> String {
        format!(
            "{} res={} text={} desc={} pkg={} enabled={} clickable={} bounds=({},{},{},{})",
            self.class_name,
            self.resource_id,
            self.text,
            self.content_desc,
            self.package_name,
            self.enabled,
            self.clickable,
            self.bounds.x,
            self.bounds.y,
            self.bounds.width,
            self.bounds.height,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_uid_ignores_location() {
        let a = Widget::new("android.widget.Button", "btn_ok", "OK", "")
            .with_bounds(Bounds::new(0, 0, 10, 10));
        let b = Widget::new("android.widget.Button", "btn_ok", "OK", "")
            .with_bounds(Bounds::new(500, 700, 10, 10));
        assert_eq!(a.uid(), b.uid());
    }

    #[test]
    fn test_dummy_widget_identity() {
        let d = Widget::dummy();
        assert_eq!(d.uid().as_str(), RESET_WIDGET_UID);
        assert!(d.is_dummy());
        assert!(d.package_name.is_empty());
        assert_eq!(d.bounds, Bounds::default());
        assert!(!Widget::new("c", "r", "t", "").is_dummy());
    }

    #[test]
    fn test_actionable_requires_enabled() {
        let w = Widget::new("c", "r", "t", "").with_flags(false, true, false);
        assert!(!w.can_be_acted_upon());
        let w = Widget::new("c", "r", "t", "").with_flags(true, false, true);
        assert!(w.can_be_acted_upon());
        let w = Widget::new("c", "r", "t", "").with_flags(true, false, false);
        assert!(!w.can_be_acted_upon());
    }

    #[test]
    fn test_equivalence_ignores_bounds() {
        let a = Widget::new("android.widget.TextView", "label", "Hello", "")
            .with_bounds(Bounds::new(0, 0, 40, 20));
        let b = Widget::new("android.view.View", "label", "Hello", "alt")
            .with_bounds(Bounds::new(300, 10, 40, 20));
        assert!(a.is_equivalent_ignore_location(&b));
    }

    #[test]
    fn test_equivalence_needs_some_identity_field() {
        let a = Widget::new("android.view.View", "", "", "");
        let b = Widget::new("android.view.View", "", "", "");
        assert!(!a.is_equivalent_ignore_location(&b));
    }

    #[test]
    fn test_equivalence_rejects_text_mismatch() {
        let a = Widget::new("c", "label", "Hello", "");
        let b = Widget::new("c", "label", "Goodbye", "");
        assert!(!a.is_equivalent_ignore_location(&b));
    }
}
