//! Shared test fixtures for the sitesmith test suite.
//!
//! Each `*_site` builder lays out a small site in a temp directory:
//!
//! ```text
//! tmp/
//! ├── index.html          # main index (MAIN_INDEX)
//! ├── drafts/hello.md     # post source
//! ├── wrote/              # post section root (wroteindex.html)
//! └── read/               # reading section root (readindex.html, readingprogress.md)
//! ```
//!
//! The gallery site is flat: page, description file and `images/` at the root.

use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

use crate::config::{PostConfig, ReadingConfig};

// =========================================================================
// Page fixtures
// =========================================================================

pub const GALLERY_PAGE: &str = "<!DOCTYPE html>
<html>
<head><title>AI projects</title></head>
<body>
<h1>Projects</h1>
<hr>

\t<!-- Old Project -->
\t<div class=\"project\">
\t\t<div class=\"project-image\" onclick=\"openLightbox('arss', 0)\">
\t\t\t<img src=\"images/old.png\" alt=\"Arss\">
\t\t\t<div class=\"image-count\">7</div>
\t\t</div>
\t\t<div class=\"project-content\"><h2>arss</h2><p>Old text.</p></div>
\t</div>

\t<!-- Ulysquot Project -->
\t<div class=\"project\">
\t\t<div class=\"project-image\" onclick=\"openLightbox('ulysquot', 0)\">
\t\t\t<img src=\"images/ulysquot_old.png\" alt=\"Ulysquot\">
\t\t</div>
\t\t<div class=\"project-content\"><h2>ulysquot</h2><p>Quotes.</p></div>
\t</div>
\t<!-- Lightbox Modal -->
\t<div id=\"lightbox\" class=\"lightbox\"></div>
\t<script>
\t\tconst projectImages = {
\t\t\t'arss': [
\t\t\t\t'images/old.png'
\t\t\t]
\t\t};
\t\tfunction openLightbox(project, index) {}
\t</script>
</body>
</html>
";

pub const DESCRIPTIONS: &str = "Notes before the first project are ignored.

# arss
A feed reader ranking articles by
<a href=\"https://example.org\">semantic</a> similarity.

# ulysquot
Quotes from Ulysses.

# empty
Nothing to show yet.
";

/// Start of the "Recently wrote" heading in [`MAIN_INDEX`].
pub const RECENT_ANCHOR: &str =
    r#"<a class="no-underline" href="wrote/wroteindex.html"><b>Recently wrote"#;

pub const MAIN_INDEX: &str = r#"<html>
<body>
<a class="no-underline" href="wrote/wroteindex.html"><b>Recently wrote ></b></a><br>
<p>
    <span class="entry-date">2023-12-01</span> <a href="wrote/old-post.html">Old post</a><br>
</p><br>
<a class="no-underline" href="read/readindex.html"><b>Recently read ></b></a><br>
<p>
    <i>Virginia Woolf, The Waves</i><br>
</p>
</body>
</html>
"#;

pub const WROTE_INDEX: &str = r#"<html>
<body>
<b>Wrote</b>
<p>
<span class="entry-date">2023-12-01</span> <a href="older.html">Older</a><br>
</p>
</body>
</html>
"#;

pub const READ_INDEX: &str = r#"<html>
<body>
<p><i>in progress</i><br>
<div class="row" data-isbn10="0-679-72276-9" data-pagecount="730">
<div class="author">James Joyce, Ulysses</div>
<div class="progress">I--*-------I</div></div>
<div class="row" data-pagecount="387">
<div class="author">Ursula K. Le Guin, The Dispossessed</div>
<div class="progress">I-*--------I</div></div>
<br><br>
<b>2025</b><br>
	<span data-book data-pagecount="955">Virginia Woolf, The Waves</span><br>
<b>2024</b><br>
</p>
</body>
</html>
"#;

// =========================================================================
// Fixture setup
// =========================================================================

/// Create empty files named `names` in `dir`.
pub fn touch_files(dir: &Path, names: &[&str]) {
    fs::create_dir_all(dir).unwrap();
    for name in names {
        fs::write(dir.join(name), b"").unwrap();
    }
}

/// Gallery page, description file and images in a temp directory.
pub fn gallery_site() -> TempDir {
    let tmp = TempDir::new().unwrap();
    fs::write(tmp.path().join("aiprojs.html"), GALLERY_PAGE).unwrap();
    fs::write(tmp.path().join("projdesc.md"), DESCRIPTIONS).unwrap();
    touch_files(
        &tmp.path().join("images"),
        &[
            "arss_1.png",
            "arss_1.1_title.png",
            "arss_1.2_feature.png",
            "arss_2_semantic.png",
            "ulysquot00001.png",
            "ulysquotC00001.png",
            "notes.txt",
        ],
    );
    tmp
}

/// A temp site with one section directory and that section's config.
pub struct Site<C> {
    tmp: TempDir,
    section: &'static str,
    pub config: C,
}

impl<C> Site<C> {
    /// Site root, holding the main index.
    pub fn path(&self) -> &Path {
        self.tmp.path()
    }

    /// Section directory that configured paths resolve against.
    pub fn root(&self) -> PathBuf {
        self.tmp.path().join(self.section)
    }
}

fn site<C>(section: &'static str, config: C) -> Site<C> {
    let tmp = TempDir::new().unwrap();
    fs::create_dir_all(tmp.path().join(section)).unwrap();
    fs::write(tmp.path().join("index.html"), MAIN_INDEX).unwrap();
    Site {
        tmp,
        section,
        config,
    }
}

/// Post section under `wrote/` with a `drafts/hello.md` source.
pub fn post_site() -> Site<PostConfig> {
    let site = site("wrote", PostConfig::default());
    fs::write(site.root().join("wroteindex.html"), WROTE_INDEX).unwrap();
    fs::create_dir_all(site.path().join("drafts")).unwrap();
    fs::write(
        site.path().join("drafts/hello.md"),
        "# Hello\n2024-01-01\nSome *text*\n",
    )
    .unwrap();
    site
}

/// Reading section under `read/` with the given progress file.
pub fn reading_site(progress: &str) -> Site<ReadingConfig> {
    let site = site("read", ReadingConfig::default());
    fs::write(site.root().join("readindex.html"), READ_INDEX).unwrap();
    fs::write(site.root().join("readingprogress.md"), progress).unwrap();
    site
}
