//! Translation between class names, destination paths and upstream paths.
//!
//! A logical file has three spellings: `java.util.List`,
//! `ojluni/src/main/java/java/util/List.java` and, depending on the JDK era,
//! `jdk/src/share/classes/java/util/List.java` or
//! `src/java.base/share/classes/java/util/List.java`.

use tracing::{debug, instrument};

use crate::core::error::LedgerResult;
use crate::core::layout::{PathLayout, SourceKind};
use crate::core::repo::{CommitId, UpstreamRepo};

/// Anything containing a separator is taken as a path, not a class name.
pub fn is_path(class_or_path: &str) -> bool
{
    class_or_path.contains('/')
}

/// Outcome of an upstream search
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpstreamLookup
{
    Found(String),
    /// Every candidate path tried, in order
    Missing { tried: Vec<String> },
}

/// Path translator over a fixed layout
#[derive(Debug, Clone, Copy)]
pub struct Translator<'a>
{
    layout: &'a PathLayout,
}

impl<'a> Translator<'a>
{
    pub fn new(layout: &'a PathLayout) -> Self
    {
        Self { layout }
    }

    pub fn layout(&self) -> &'a PathLayout
    {
        self.layout
    }

    /// `java.util.List` -> `ojluni/src/main/java/java/util/List.java`.
    /// Paths are returned unchanged.
    pub fn class_name_to_destination_path(
        &self,
        class_or_path: &str,
    ) -> String
    {
        if is_path(class_or_path)
        {
            return class_or_path.to_string();
        }

        let root = if class_or_path.starts_with(self.layout.test_class_prefix.as_str())
        {
            &self.layout.destination_test_root
        }
        else
        {
            &self.layout.destination_main_root
        };
        format!("{root}{}", self.layout.class_to_relative(class_or_path))
    }

    /// Inverse of [`Self::class_name_to_destination_path`].
    pub fn destination_path_to_class_name(
        &self,
        path: &str,
    ) -> Option<String>
    {
        let ext = self
            .layout
            .source_extension
            .as_str();
        if !path.ends_with(ext)
        {
            return None;
        }

        let relative = if let Some(rest) = path.strip_prefix(
            self.layout
                .destination_main_root
                .as_str(),
        )
        {
            rest
        }
        else
        {
            path.strip_prefix(
                self.layout
                    .destination_test_root
                    .as_str(),
            )?
        };
        Some(
            self.layout
                .relative_to_class(relative),
        )
    }

    /// Guess the upstream path of a destination path by trying each upstream
    /// root of the same kind in order.
    #[instrument(skip(self, repo), level = "debug")]
    pub fn destination_path_to_upstream_guess(
        &self,
        repo: &dyn UpstreamRepo,
        commit: &CommitId,
        path: &str,
    ) -> LedgerResult<Option<String>>
    {
        let Some((kind, relative)) = self
            .layout
            .classify_destination(path)
        else
        {
            return Ok(None);
        };

        for root in self
            .layout
            .upstream_roots(kind)
        {
            let candidate = format!("{root}{relative}");
            if repo.is_file(commit, &candidate)?
            {
                debug!(%candidate, "guessed upstream path");
                return Ok(Some(candidate));
            }
        }
        Ok(None)
    }

    /// Find the upstream file of a class name (searching every upstream root,
    /// main then test) or verify that a given path is a file.
    #[instrument(skip(self, repo), level = "debug")]
    pub fn class_name_to_upstream_path(
        &self,
        repo: &dyn UpstreamRepo,
        commit: &CommitId,
        class_or_path: &str,
    ) -> LedgerResult<UpstreamLookup>
    {
        let candidates: Vec<String> = if is_path(class_or_path)
        {
            vec![class_or_path.to_string()]
        }
        else
        {
            let relative = self
                .layout
                .class_to_relative(class_or_path);
            self.layout
                .upstream_search_roots()
                .map(|root| format!("{root}{relative}"))
                .collect()
        };

        for candidate in &candidates
        {
            if repo.is_file(commit, candidate)?
            {
                return Ok(UpstreamLookup::Found(candidate.clone()));
            }
        }
        Ok(UpstreamLookup::Missing { tried: candidates })
    }

    /// Re-root an upstream path under the destination tree. Upstream tests
    /// land under `<test root><test subdir>`.
    pub fn upstream_path_to_destination_guess(
        &self,
        path: &str,
    ) -> Option<String>
    {
        let (kind, relative) = self
            .layout
            .classify_upstream(path)?;
        Some(match kind
        {
            SourceKind::Test => format!(
                "{}{relative}",
                self.layout
                    .destination_test_files_root()
            ),
            SourceKind::Main => format!("{}{relative}", self.layout.destination_main_root),
        })
    }
}

#[cfg(test)]
mod tests
{
    use proptest::prelude::*;

    use super::*;
    use crate::core::repo::MemoryRepo;

    fn repo() -> MemoryRepo
    {
        MemoryRepo::new()
            .with_commit(
                "jdk8u/jdk8u121-b13",
                ["jdk/src/share/classes/java/util/List.java", "jdk/test/java/util/ListTest.java"],
            )
            .with_commit(
                "jdk11u/jdk-11+28",
                [
                    "src/java.base/share/classes/java/util/List.java",
                    "test/jdk/java/util/ListTest.java",
                    "test/jdk/java/util/Helper.java",
                    "jdk/test/java/util/Helper.java",
                ],
            )
    }

    fn commit(
        repo: &MemoryRepo,
        reference: &str,
    ) -> CommitId
    {
        repo.resolve(reference)
            .unwrap()
            .unwrap()
    }

    #[test]
    fn class_name_to_destination()
    {
        let layout = PathLayout::default();
        let t = Translator::new(&layout);
        assert_eq!(
            t.class_name_to_destination_path("java.util.List"),
            "ojluni/src/main/java/java/util/List.java"
        );
        assert_eq!(
            t.class_name_to_destination_path("test.java.util.ListTest"),
            "ojluni/src/test/java/util/ListTest.java"
        );
        assert_eq!(t.class_name_to_destination_path("ojluni/src/Foo.java"), "ojluni/src/Foo.java");
    }

    #[test]
    fn guesses_upstream_from_destination_per_era()
    {
        let layout = PathLayout::default();
        let t = Translator::new(&layout);
        let repo = repo();

        let jdk8 = commit(&repo, "jdk8u/jdk8u121-b13");
        assert_eq!(
            t.destination_path_to_upstream_guess(&repo, &jdk8, "ojluni/src/main/java/java/util/List.java")
                .unwrap(),
            Some("jdk/src/share/classes/java/util/List.java".into())
        );
        assert_eq!(
            t.destination_path_to_upstream_guess(&repo, &jdk8, "ojluni/src/test/java/util/ListTest.java")
                .unwrap(),
            Some("jdk/test/java/util/ListTest.java".into())
        );

        let jdk11 = commit(&repo, "jdk11u/jdk-11+28");
        assert_eq!(
            t.destination_path_to_upstream_guess(&repo, &jdk11, "ojluni/src/main/java/java/util/List.java")
                .unwrap(),
            Some("src/java.base/share/classes/java/util/List.java".into())
        );
        assert_eq!(
            t.destination_path_to_upstream_guess(&repo, &jdk11, "luni/src/main/java/Foo.java")
                .unwrap(),
            None
        );
    }

    #[test]
    fn test_roots_follow_declared_order()
    {
        let layout = PathLayout::default();
        let t = Translator::new(&layout);
        let repo = repo();
        let jdk11 = commit(&repo, "jdk11u/jdk-11+28");

        // Both test roots hold Helper.java; `jdk/test/` is declared first
        assert_eq!(
            t.destination_path_to_upstream_guess(&repo, &jdk11, "ojluni/src/test/java/util/Helper.java")
                .unwrap(),
            Some("jdk/test/java/util/Helper.java".into())
        );
    }

    #[test]
    fn class_search_reports_tried_paths()
    {
        let layout = PathLayout::default();
        let t = Translator::new(&layout);
        let repo = repo();
        let jdk11 = commit(&repo, "jdk11u/jdk-11+28");

        assert_eq!(
            t.class_name_to_upstream_path(&repo, &jdk11, "java.util.List")
                .unwrap(),
            UpstreamLookup::Found("src/java.base/share/classes/java/util/List.java".into())
        );
        assert_eq!(
            t.class_name_to_upstream_path(&repo, &jdk11, "java.util.ListTest")
                .unwrap(),
            UpstreamLookup::Found("test/jdk/java/util/ListTest.java".into())
        );
        assert_eq!(
            t.class_name_to_upstream_path(&repo, &jdk11, "java.util.Set")
                .unwrap(),
            UpstreamLookup::Missing {
                tried: vec![
                    "jdk/src/share/classes/java/util/Set.java".into(),
                    "src/java.base/share/classes/java/util/Set.java".into(),
                    "jdk/test/java/util/Set.java".into(),
                    "test/jdk/java/util/Set.java".into(),
                ]
            }
        );
    }

    #[test]
    fn explicit_path_is_verified_directly()
    {
        let layout = PathLayout::default();
        let t = Translator::new(&layout);
        let repo = repo();
        let jdk8 = commit(&repo, "jdk8u/jdk8u121-b13");

        assert_eq!(
            t.class_name_to_upstream_path(&repo, &jdk8, "jdk/test/java/util/ListTest.java")
                .unwrap(),
            UpstreamLookup::Found("jdk/test/java/util/ListTest.java".into())
        );
        assert_eq!(
            t.class_name_to_upstream_path(&repo, &jdk8, "jdk/test/Nope.java")
                .unwrap(),
            UpstreamLookup::Missing { tried: vec!["jdk/test/Nope.java".into()] }
        );
        assert_eq!(
            t.class_name_to_upstream_path(&repo, &jdk8, "jdk/test/java/util")
                .unwrap(),
            UpstreamLookup::Missing { tried: vec!["jdk/test/java/util".into()] }
        );
    }

    #[test]
    fn upstream_to_destination()
    {
        let layout = PathLayout::default();
        let t = Translator::new(&layout);
        assert_eq!(
            t.upstream_path_to_destination_guess("src/java.base/share/classes/java/util/List.java"),
            Some("ojluni/src/main/java/java/util/List.java".into())
        );
        assert_eq!(
            t.upstream_path_to_destination_guess("test/jdk/java/util/ListTest.java"),
            Some("ojluni/src/test/java/util/ListTest.java".into())
        );
        assert_eq!(t.upstream_path_to_destination_guess("make/Foo.gmk"), None);
    }

    proptest! {
        #[test]
        fn destination_path_inverts_to_class_name(
            segments in proptest::collection::vec("[a-zA-Z][a-zA-Z0-9_]{0,8}", 1..6),
            is_test in any::<bool>(),
        ) {
            let layout = PathLayout::default();
            let t = Translator::new(&layout);
            let mut name = segments.join(".");
            if is_test {
                name = format!("test.{name}");
            }

            let path = t.class_name_to_destination_path(&name);
            prop_assert_eq!(t.destination_path_to_class_name(&path), Some(name));
        }
    }
}
