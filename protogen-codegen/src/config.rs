//! Render configuration.

use crate::error::CodegenError;
use protogen_schema::{RulesError, RulesOptions};

/// Target IDL major version.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ProtoVersion {
    /// `syntax = "proto2"`: `required` and `optional` keywords are emitted.
    #[default]
    Proto2,
    /// `syntax = "proto3"`: only `repeated` is emitted.
    Proto3,
}

impl ProtoVersion {
    /// Creates a version from its major number.
    #[must_use]
    pub fn from_major(major: u8) -> Option<Self> {
        match major {
            2 => Some(Self::Proto2),
            3 => Some(Self::Proto3),
            _ => None,
        }
    }

    /// Returns the `syntax` statement value.
    #[must_use]
    pub const fn syntax(self) -> &'static str {
        match self {
            Self::Proto2 => "proto2",
            Self::Proto3 => "proto3",
        }
    }

    /// Returns true if `required`/`optional` keywords are emitted.
    #[must_use]
    pub const fn has_presence_keywords(self) -> bool {
        matches!(self, Self::Proto2)
    }
}

/// Options consumed by both renderers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderOptions {
    /// Target IDL version.
    pub version: ProtoVersion,
    /// IDL package, emitted as `package x;`.
    pub proto_package: Option<String>,
    /// Namespace of the generated IDL classes.
    pub proto_namespace: String,
    /// Namespace of the generated transcoding functions.
    pub cpp_namespace: String,
    /// Namespace of the native structures.
    pub native_namespace: String,
    /// Ignore fields that carry no export flag.
    pub ignore_no_export: bool,
    /// Emit a comment in place of ignored fields.
    pub comment_ignored: bool,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            version: ProtoVersion::Proto2,
            proto_package: None,
            proto_namespace: "dfproto".to_string(),
            cpp_namespace: "DFProto".to_string(),
            native_namespace: "df".to_string(),
            ignore_no_export: false,
            comment_ignored: false,
        }
    }
}

impl RenderOptions {
    /// Creates the default options.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the target IDL version.
    #[must_use]
    pub fn version(mut self, version: ProtoVersion) -> Self {
        self.version = version;
        self
    }

    /// Sets the IDL package.
    #[must_use]
    pub fn proto_package(mut self, package: impl Into<String>) -> Self {
        self.proto_package = Some(package.into());
        self
    }

    /// Sets the namespace of the generated IDL classes.
    #[must_use]
    pub fn proto_namespace(mut self, ns: impl Into<String>) -> Self {
        self.proto_namespace = ns.into();
        self
    }

    /// Sets the namespace of the generated transcoding functions.
    #[must_use]
    pub fn cpp_namespace(mut self, ns: impl Into<String>) -> Self {
        self.cpp_namespace = ns.into();
        self
    }

    /// Sets the namespace of the native structures.
    #[must_use]
    pub fn native_namespace(mut self, ns: impl Into<String>) -> Self {
        self.native_namespace = ns.into();
        self
    }

    #[must_use]
    pub fn ignore_no_export(mut self, enabled: bool) -> Self {
        self.ignore_no_export = enabled;
        self
    }

    #[must_use]
    pub fn comment_ignored(mut self, enabled: bool) -> Self {
        self.comment_ignored = enabled;
        self
    }

    /// Overlays the options section of a rules file.
    ///
    /// # Errors
    /// Returns `CodegenError::Rules` for an unsupported version.
    pub fn merge(mut self, file: &RulesOptions) -> Result<Self, CodegenError> {
        if let Some(major) = file.version {
            self.version = ProtoVersion::from_major(major).ok_or_else(|| {
                RulesError::InvalidOption {
                    option: "version".to_string(),
                    message: format!("unsupported version {major}, expected 2 or 3"),
                }
            })?;
        }
        if let Some(package) = &file.package {
            self.proto_package = Some(package.clone());
        }
        if let Some(ns) = &file.proto_namespace {
            self.proto_namespace = ns.clone();
        }
        if let Some(ns) = &file.cpp_namespace {
            self.cpp_namespace = ns.clone();
        }
        if let Some(ns) = &file.native_namespace {
            self.native_namespace = ns.clone();
        }
        if let Some(enabled) = file.ignore_no_export {
            self.ignore_no_export = enabled;
        }
        if let Some(enabled) = file.comment_ignored {
            self.comment_ignored = enabled;
        }
        Ok(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let options = RenderOptions::default();
        assert_eq!(options.version, ProtoVersion::Proto2);
        assert_eq!(options.proto_namespace, "dfproto");
        assert_eq!(options.cpp_namespace, "DFProto");
        assert_eq!(options.native_namespace, "df");
        assert!(!options.comment_ignored);
        assert!(!options.ignore_no_export);
    }

    #[test]
    fn test_builder() {
        let options = RenderOptions::new()
            .version(ProtoVersion::Proto3)
            .proto_package("dfproto")
            .comment_ignored(true)
            .native_namespace("game");
        assert_eq!(options.version.syntax(), "proto3");
        assert_eq!(options.proto_package.as_deref(), Some("dfproto"));
        assert!(options.comment_ignored);
        assert_eq!(options.native_namespace, "game");
    }

    #[test]
    fn test_version() {
        assert_eq!(ProtoVersion::from_major(2), Some(ProtoVersion::Proto2));
        assert_eq!(ProtoVersion::from_major(4), None);
        assert!(ProtoVersion::Proto2.has_presence_keywords());
        assert!(!ProtoVersion::Proto3.has_presence_keywords());
    }

    #[test]
    fn test_merge_rules_options() {
        let file = RulesOptions {
            version: Some(3),
            package: Some("pkg".to_string()),
            ignore_no_export: Some(true),
            ..RulesOptions::default()
        };
        let options = RenderOptions::new().merge(&file).expect("merge");
        assert_eq!(options.version, ProtoVersion::Proto3);
        assert_eq!(options.proto_package.as_deref(), Some("pkg"));
        assert!(options.ignore_no_export);
        assert!(!options.comment_ignored);

        let bad = RulesOptions {
            version: Some(1),
            ..RulesOptions::default()
        };
        assert!(matches!(
            RenderOptions::new().merge(&bad),
            Err(CodegenError::Rules(_))
        ));
    }
}
