use std::collections::HashMap;

use crate::CodegenError;

pub const NAME_PLACEHOLDER: &str = "[name]";

/// Substitutes every `[name]` in `pattern` with the chunk name.
pub fn asset_filename(pattern: &str, chunk_name: &str) -> String {
    pattern.replace(NAME_PLACEHOLDER, chunk_name)
}

/// Output filenames for the given chunk names, in the same order.
///
/// Fails when the pattern is empty or two chunks would be written to the
/// same file.
pub fn assign_filenames<'a, I>(pattern: &str, chunk_names: I) -> Result<Vec<String>, CodegenError>
where
    I: IntoIterator<Item = &'a str>,
{
    if pattern.trim().is_empty() {
        return Err(CodegenError::new("output filename pattern is empty"));
    }

    let mut seen: HashMap<String, &str> = HashMap::new();
    let mut filenames = Vec::new();
    for name in chunk_names {
        let filename = asset_filename(pattern, name);
        if let Some(previous) = seen.insert(filename.clone(), name) {
            return Err(CodegenError::new(format!(
                "chunks '{}' and '{}' would both be written to '{}'; add {} to the filename pattern",
                previous, name, filename, NAME_PLACEHOLDER
            )));
        }
        filenames.push(filename);
    }
    Ok(filenames)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_asset_filename() {
        assert_eq!(asset_filename("[name].js", "main"), "main.js");
        assert_eq!(asset_filename("js/[name]/[name].bundle.js", "admin"), "js/admin/admin.bundle.js");
        assert_eq!(asset_filename("bundle.js", "main"), "bundle.js");
    }

    #[test]
    fn test_assign_filenames() {
        let names = assign_filenames("[name].js", ["main", "admin"]).unwrap();
        assert_eq!(names, vec!["main.js", "admin.js"]);
    }

    #[test]
    fn test_assign_filenames_collision() {
        let err = assign_filenames("bundle.js", ["main", "admin"]).unwrap_err();
        assert!(err.message.contains("'main' and 'admin'"));
        // A single chunk needs no placeholder.
        assert_eq!(assign_filenames("bundle.js", ["main"]).unwrap(), vec!["bundle.js"]);
    }

    #[test]
    fn test_assign_filenames_empty_pattern() {
        assert!(assign_filenames("  ", ["main"]).is_err());
    }
}
