//! Parsed `git diff` output.
//!
//! A [`Diff`] holds the raw patch text produced by one git invocation and
//! yields one [`DiffEntry`] per changed file, parsing each file section only
//! when the iterator reaches it.

const SECTION_HEADER: &str = "diff --git ";
const NEXT_SECTION: &str = "\ndiff --git ";

/// One changed file between two trees.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DiffEntry {
    /// Path on the target side. `None` for deleted files.
    pub new_path: Option<String>,
    /// Path on the source side. `None` for newly added files.
    pub old_path: Option<String>,
    /// The file did not exist on the source side.
    pub new_file: bool,
    /// The file does not exist on the target side.
    pub deleted: bool,
    /// Hunk text, starting at the first `@@` line. Empty for binary files,
    /// pure renames and mode changes.
    pub patch: String,
}

impl DiffEntry {
    /// Returns the target-side path, or the source-side path for deletions.
    #[must_use]
    pub fn path(&self) -> &str {
        self.new_path
            .as_deref()
            .or(self.old_path.as_deref())
            .unwrap_or_default()
    }

    /// Returns the patch lines that add or remove content.
    pub fn changed_lines(&self) -> impl Iterator<Item = &str> {
        self.patch
            .lines()
            .filter(|line| line.starts_with('+') || line.starts_with('-'))
    }
}

/// Lazy sequence of [`DiffEntry`] values.
///
/// The sequence is finite and can only be walked once.
#[derive(Debug, Clone, Default)]
pub struct Diff {
    raw: String,
    offset: usize,
}

impl Diff {
    /// Wraps raw `git diff` output.
    pub fn parse(raw: impl Into<String>) -> Self {
        let raw = raw.into();
        let offset = if raw.starts_with(SECTION_HEADER) {
            0
        } else {
            raw.find(NEXT_SECTION)
                .map_or(raw.len(), |idx| idx + 1)
        };
        Self { raw, offset }
    }

    /// An empty diff.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }
}

impl Iterator for Diff {
    type Item = DiffEntry;

    fn next(&mut self) -> Option<Self::Item> {
        while self.offset < self.raw.len() {
            let rest = &self.raw[self.offset..];
            let len = rest
                .get(1..)
                .and_then(|tail| tail.find(NEXT_SECTION))
                .map_or(rest.len(), |idx| idx + 2);

            let section = &rest[..len];
            self.offset += len;

            if let Some(entry) = parse_section(section) {
                return Some(entry);
            }
        }
        None
    }
}

/// Parses one `diff --git` section.
fn parse_section(section: &str) -> Option<DiffEntry> {
    let mut lines = section.split_inclusive('\n');
    let header = lines.next()?.trim_end_matches('\n');
    let header_paths = header.strip_prefix(SECTION_HEADER).and_then(split_header);

    let mut entry = DiffEntry::default();
    let mut minus_path: Option<Option<String>> = None;
    let mut plus_path: Option<Option<String>> = None;
    let mut rename_from = None;
    let mut rename_to = None;
    let mut consumed = header.len() + 1;

    for line in lines {
        let text = line.trim_end_matches('\n');
        if text.starts_with("@@") {
            break;
        }
        consumed += line.len();

        if text.starts_with("new file mode") {
            entry.new_file = true;
        } else if text.starts_with("deleted file mode") {
            entry.deleted = true;
        } else if let Some(path) = text.strip_prefix("rename from ") {
            rename_from = Some(unquote(path));
        } else if let Some(path) = text.strip_prefix("rename to ") {
            rename_to = Some(unquote(path));
        } else if let Some(path) = text.strip_prefix("--- ") {
            minus_path = Some(side_path(path, "a/"));
        } else if let Some(path) = text.strip_prefix("+++ ") {
            plus_path = Some(side_path(path, "b/"));
        }
    }

    entry.patch = section.get(consumed..).unwrap_or_default().to_string();

    let (header_old, header_new) = header_paths.unzip();
    let (new_file, deleted) = (entry.new_file, entry.deleted);
    entry.old_path = minus_path
        .unwrap_or_else(|| rename_from.or(header_old))
        .filter(|_| !new_file);
    entry.new_path = plus_path
        .unwrap_or_else(|| rename_to.or(header_new))
        .filter(|_| !deleted);

    Some(entry)
}

/// Reads a `---`/`+++` path, mapping `/dev/null` to `None`.
fn side_path(raw: &str, prefix: &str) -> Option<String> {
    let raw = raw.trim_end_matches(|c| c == '\t' || c == '\r');
    if raw == "/dev/null" {
        return None;
    }
    let path = unquote(raw);
    Some(path.strip_prefix(prefix).map(str::to_string).unwrap_or(path))
}

/// Splits `a/X b/Y` into `(X, Y)`.
///
/// When both sides are the same path the split point is unambiguous even if
/// the path contains ` b/`.
fn split_header(rest: &str) -> Option<(String, String)> {
    if rest.starts_with('"') {
        let close = rest[1..].find("\" ")? + 1;
        let old = unquote(&rest[..=close]);
        let new = unquote(&rest[close + 2..]);
        return Some((
            old.strip_prefix("a/")?.to_string(),
            new.strip_prefix("b/")?.to_string(),
        ));
    }

    if rest.len() % 2 == 1 {
        let half = rest.len() / 2;
        if let (Some(old), Some(new)) = (rest.get(..half), rest.get(half + 1..)) {
            if let (Some(old), Some(new)) = (old.strip_prefix("a/"), new.strip_prefix("b/")) {
                if old == new {
                    return Some((old.to_string(), new.to_string()));
                }
            }
        }
    }

    let split = rest.find(" b/")?;
    Some((
        rest[..split].strip_prefix("a/")?.to_string(),
        rest[split + 3..].to_string(),
    ))
}

/// Removes C-style quoting git applies to unusual paths.
fn unquote(raw: &str) -> String {
    let Some(inner) = raw
        .strip_prefix('"')
        .and_then(|s| s.strip_suffix('"'))
    else {
        return raw.to_string();
    };

    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some(other) => out.push(other),
            None => {},
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const BRANCH_DIFF: &str = "\
diff --git a/app/migrations/0001.py b/app/migrations/0001.py
new file mode 100644
index 0000000..e69de29
--- /dev/null
+++ b/app/migrations/0001.py
@@ -0,0 +1,2 @@
+from django.db import migrations
+
diff --git a/app/models.py b/app/models.py
index 1111111..2222222 100644
--- a/app/models.py
+++ b/app/models.py
@@ -1,3 +1,4 @@
 import os
+import sys

 class Model:
diff --git a/old.py b/old.py
deleted file mode 100644
index 3333333..0000000
--- a/old.py
+++ /dev/null
@@ -1 +0,0 @@
-print('bye')
";

    #[test]
    fn test_parse_entries() {
        let entries: Vec<_> = Diff::parse(BRANCH_DIFF).collect();
        assert_eq!(entries.len(), 3);

        assert_eq!(entries[0].new_path.as_deref(), Some("app/migrations/0001.py"));
        assert_eq!(entries[0].old_path, None);
        assert!(entries[0].new_file);
        assert!(!entries[0].deleted);
        assert!(entries[0].patch.starts_with("@@ -0,0 +1,2 @@"));

        assert_eq!(entries[1].new_path.as_deref(), Some("app/models.py"));
        assert_eq!(entries[1].old_path.as_deref(), Some("app/models.py"));
        assert!(!entries[1].new_file);
        assert_eq!(entries[1].changed_lines().collect::<Vec<_>>(), vec!["+import sys"]);

        assert_eq!(entries[2].new_path, None);
        assert_eq!(entries[2].old_path.as_deref(), Some("old.py"));
        assert!(entries[2].deleted);
        assert_eq!(entries[2].path(), "old.py");
    }

    #[test]
    fn test_patch_excludes_following_section() {
        let entries: Vec<_> = Diff::parse(BRANCH_DIFF).collect();
        assert!(!entries[1].patch.contains("diff --git"));
        assert!(entries[1].patch.ends_with(" class Model:\n"));
    }

    #[test]
    fn test_empty_diff() {
        assert_eq!(Diff::parse("").count(), 0);
        assert_eq!(Diff::empty().count(), 0);
        assert_eq!(Diff::parse("\n").count(), 0);
    }

    #[test]
    fn test_diff_is_consumed_once() {
        let mut diff = Diff::parse(BRANCH_DIFF);
        assert_eq!(diff.by_ref().count(), 3);
        assert_eq!(diff.next(), None);
    }

    #[test]
    fn test_rename_without_content_change() {
        let raw = "\
diff --git a/pkg/a.py b/pkg/b.py
similarity index 100%
rename from pkg/a.py
rename to pkg/b.py
";
        let entries: Vec<_> = Diff::parse(raw).collect();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].old_path.as_deref(), Some("pkg/a.py"));
        assert_eq!(entries[0].new_path.as_deref(), Some("pkg/b.py"));
        assert!(entries[0].patch.is_empty());
    }

    #[test]
    fn test_binary_new_file_uses_header_paths() {
        let raw = "\
diff --git a/static/logo b/x.png b/static/logo b/x.png
new file mode 100644
index 0000000..abcdef0
Binary files /dev/null and b/static/logo b/x.png differ
";
        let entries: Vec<_> = Diff::parse(raw).collect();
        assert_eq!(entries[0].new_path.as_deref(), Some("static/logo b/x.png"));
        assert_eq!(entries[0].old_path, None);
        assert!(entries[0].new_file);
    }

    #[test]
    fn test_quoted_paths() {
        let raw = "\
diff --git \"a/tab\\there.py\" \"b/tab\\there.py\"
index 1111111..2222222 100644
--- \"a/tab\\there.py\"
+++ \"b/tab\\there.py\"
@@ -1 +1 @@
-a
+b
";
        let entries: Vec<_> = Diff::parse(raw).collect();
        assert_eq!(entries[0].new_path.as_deref(), Some("tab\there.py"));
        assert_eq!(entries[0].old_path.as_deref(), Some("tab\there.py"));
    }

    #[test]
    fn test_path_with_space_has_trailing_tab() {
        let raw = "\
diff --git a/my file.py b/my file.py
index 1111111..2222222 100644
--- a/my file.py\t
+++ b/my file.py\t
@@ -1 +1 @@
-a
+b
";
        let entries: Vec<_> = Diff::parse(raw).collect();
        assert_eq!(entries[0].new_path.as_deref(), Some("my file.py"));
    }

    #[test]
    fn test_leading_noise_is_skipped() {
        let raw = format!("warning: something\n{BRANCH_DIFF}");
        assert_eq!(Diff::parse(raw).count(), 3);
    }

    #[test]
    fn test_removed_line_starting_with_dashes_stays_in_patch() {
        let raw = "\
diff --git a/notes.txt b/notes.txt
index 1111111..2222222 100644
--- a/notes.txt
+++ b/notes.txt
@@ -1,2 +1 @@
--- heading
 body
";
        let entries: Vec<_> = Diff::parse(raw).collect();
        assert_eq!(entries[0].new_path.as_deref(), Some("notes.txt"));
        assert_eq!(entries[0].changed_lines().collect::<Vec<_>>(), vec!["--- heading"]);
    }
}
