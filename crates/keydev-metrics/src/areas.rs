//! File-area clustering.
//!
//! An area is a directory cluster: the first `depth` components of a
//! file's directory path. Directory prefixes are stable as the window
//! slides, unlike connected components, so the breadth series they feed
//! stays comparable tick to tick.

/// Area of a file path: the leading `depth` directory components.
///
/// Files directly at the repository root share the `"."` area.
///
/// # Examples
///
/// ```
/// use keydev_metrics::area_of;
///
/// assert_eq!(area_of("core/src/query/Parser.java", 2), "core/src");
/// assert_eq!(area_of("core/Parser.java", 2), "core");
/// assert_eq!(area_of("README.md", 2), ".");
/// ```
pub fn area_of(path: &str, depth: usize) -> String {
    let components: Vec<&str> = path
        .split('/')
        .filter(|part| !part.is_empty())
        .collect();
    // The last component is the file name.
    let dirs = &components[..components.len().saturating_sub(1)];
    if dirs.is_empty() || depth == 0 {
        ".".to_string()
    } else {
        dirs[..dirs.len().min(depth)].join("/")
    }
}
