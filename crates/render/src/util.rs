use std::path::Path;

/// FNV-1a over the input bytes. Renderer ids must be identical across runs
/// for identical input, which rules out the randomized std hasher.
pub(crate) fn fnv1a_64(input: &str) -> u64 {
    const OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
    const PRIME: u64 = 0x0000_0100_0000_01b3;
    let mut hash = OFFSET;
    for byte in input.as_bytes() {
        hash ^= u64::from(*byte);
        hash = hash.wrapping_mul(PRIME);
    }
    hash
}

/// Resource path as shown in labels: relative to the workspace root when
/// one is configured, the full path otherwise.
pub(crate) fn display_path(resource: &Path, root: Option<&Path>) -> String {
    match root {
        Some(root) => resource
            .strip_prefix(root)
            .unwrap_or(resource)
            .display()
            .to_string(),
        None => resource.display().to_string(),
    }
}

/// Base file name of a resource, for participant labels.
pub(crate) fn base_name(resource: &Path) -> String {
    resource
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| resource.display().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn fnv_is_stable() {
        assert_eq!(fnv1a_64("main_src/main.ts"), fnv1a_64("main_src/main.ts"));
        assert_ne!(fnv1a_64("a"), fnv1a_64("b"));
    }

    #[test]
    fn display_path_relativizes_under_root() {
        let resource = PathBuf::from("/work/src/a.ts");
        assert_eq!(
            display_path(&resource, Some(Path::new("/work"))),
            "src/a.ts"
        );
        assert_eq!(display_path(&resource, None), "/work/src/a.ts");
        // A resource outside the root keeps its full path.
        assert_eq!(
            display_path(&resource, Some(Path::new("/elsewhere"))),
            "/work/src/a.ts"
        );
    }
}
