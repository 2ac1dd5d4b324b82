//! Root prefixes of the destination and upstream trees.

use serde::{Deserialize, Serialize};

/// Which half of a tree a path belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind
{
    Main,
    Test,
}

/// Fixed root prefixes for each tree, constant for the process lifetime.
///
/// Upstream roots are lists because the JDK moved its sources between
/// releases (`jdk/src/share/classes/` up to jdk8, `src/java.base/...` after).
/// Lists are tried in declared order and the first existing match wins.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PathLayout
{
    /// Destination root of main sources
    pub destination_main_root: String,

    /// Destination root of tests
    pub destination_test_root: String,

    /// Segment inserted under the destination test root for upstream tests
    pub destination_test_subdir: String,

    /// Class names with this prefix live under the destination test root
    pub test_class_prefix: String,

    /// Upstream roots of main sources, in priority order
    pub upstream_main_roots: Vec<String>,

    /// Upstream roots of tests, in priority order
    pub upstream_test_roots: Vec<String>,

    /// Extension appended to class names
    pub source_extension: String,
}

impl Default for PathLayout
{
    fn default() -> Self
    {
        Self {
            destination_main_root: "ojluni/src/main/java/".to_string(),
            destination_test_root: "ojluni/src/".to_string(),
            destination_test_subdir: "test/".to_string(),
            test_class_prefix: "test.".to_string(),
            upstream_main_roots: vec![
                "jdk/src/share/classes/".to_string(),
                "src/java.base/share/classes/".to_string(),
            ],
            upstream_test_roots: vec!["jdk/test/".to_string(), "test/jdk/".to_string()],
            source_extension: ".java".to_string(),
        }
    }
}

impl PathLayout
{
    /// Every upstream root a class name is searched under: main, then test.
    pub fn upstream_search_roots(&self) -> impl Iterator<Item = &str>
    {
        self.upstream_main_roots
            .iter()
            .chain(&self.upstream_test_roots)
            .map(String::as_str)
    }

    pub fn upstream_roots(
        &self,
        kind: SourceKind,
    ) -> &[String]
    {
        match kind
        {
            SourceKind::Main => &self.upstream_main_roots,
            SourceKind::Test => &self.upstream_test_roots,
        }
    }

    /// Destination roots for class-name conversion: main, then test.
    pub fn destination_roots(&self) -> [&str; 2]
    {
        [self.destination_main_root.as_str(), self.destination_test_root.as_str()]
    }

    /// Prefix under which upstream test files are re-rooted.
    pub fn destination_test_files_root(&self) -> String
    {
        format!("{}{}", self.destination_test_root, self.destination_test_subdir)
    }

    /// Classify a destination path. Main is checked first since the test
    /// root is usually a prefix of the main root.
    pub fn classify_destination<'a>(
        &self,
        path: &'a str,
    ) -> Option<(SourceKind, &'a str)>
    {
        if let Some(rest) = path.strip_prefix(self.destination_main_root.as_str())
        {
            return Some((SourceKind::Main, rest));
        }
        path.strip_prefix(
            self.destination_test_files_root()
                .as_str(),
        )
        .map(|rest| (SourceKind::Test, rest))
    }

    /// Classify an upstream path. Test roots are checked before main roots.
    pub fn classify_upstream<'a>(
        &self,
        path: &'a str,
    ) -> Option<(SourceKind, &'a str)>
    {
        for kind in [SourceKind::Test, SourceKind::Main]
        {
            for root in self.upstream_roots(kind)
            {
                if let Some(rest) = path.strip_prefix(root.as_str())
                {
                    return Some((kind, rest));
                }
            }
        }
        None
    }

    /// `java.util.List` -> `java/util/List.java`
    pub fn class_to_relative(
        &self,
        class_name: &str,
    ) -> String
    {
        format!("{}{}", class_name.replace('.', "/"), self.source_extension)
    }

    /// `java/util/List.java` -> `java.util.List`; directories keep a trailing `.`
    pub fn relative_to_class(
        &self,
        relative: &str,
    ) -> String
    {
        relative
            .strip_suffix(self.source_extension.as_str())
            .unwrap_or(relative)
            .replace('/', ".")
    }
}

#[cfg(test)]
mod tests
{
    use super::*;

    #[test]
    fn search_roots_are_main_then_test()
    {
        let layout = PathLayout::default();
        let roots: Vec<&str> = layout
            .upstream_search_roots()
            .collect();
        assert_eq!(
            roots,
            ["jdk/src/share/classes/", "src/java.base/share/classes/", "jdk/test/", "test/jdk/"]
        );
    }

    #[test]
    fn destination_main_wins_over_test_prefix()
    {
        let layout = PathLayout::default();
        assert_eq!(
            layout.classify_destination("ojluni/src/main/java/java/util/List.java"),
            Some((SourceKind::Main, "java/util/List.java"))
        );
        assert_eq!(
            layout.classify_destination("ojluni/src/test/java/util/ListTest.java"),
            Some((SourceKind::Test, "java/util/ListTest.java"))
        );
        assert_eq!(layout.classify_destination("luni/src/main/java/Foo.java"), None);
    }

    #[test]
    fn upstream_test_roots_are_checked_first()
    {
        let layout = PathLayout {
            upstream_main_roots: vec!["a/".into()],
            upstream_test_roots: vec!["a/test/".into()],
            ..PathLayout::default()
        };
        assert_eq!(layout.classify_upstream("a/test/X.java"), Some((SourceKind::Test, "X.java")));
        assert_eq!(layout.classify_upstream("a/X.java"), Some((SourceKind::Main, "X.java")));
    }

    #[test]
    fn class_and_relative_conversions()
    {
        let layout = PathLayout::default();
        assert_eq!(layout.class_to_relative("java.util.List"), "java/util/List.java");
        assert_eq!(layout.relative_to_class("java/util/List.java"), "java.util.List");
        assert_eq!(layout.relative_to_class("java/util/"), "java.util.");
    }
}
