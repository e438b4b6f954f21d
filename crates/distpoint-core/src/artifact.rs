//! Extension-based artifact routing
//!
//! Every backend stores packages and scripts in separate places. The
//! decision is made here and nowhere else.

use std::path::Path;

/// What kind of artifact a file is, judged by its extension
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArtifactKind {
    /// Installer package or disk image (`.pkg`, `.dmg`)
    Package,
    /// Anything else
    Script,
}

impl ArtifactKind {
    /// Classify a local path or bare file name
    pub fn from_path(path: impl AsRef<Path>) -> Self {
        let is_package = path
            .as_ref()
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.eq_ignore_ascii_case("pkg") || ext.eq_ignore_ascii_case("dmg"))
            .unwrap_or(false);

        if is_package {
            ArtifactKind::Package
        } else {
            ArtifactKind::Script
        }
    }

    /// Subdirectory used on file shares and upload endpoints
    pub fn subdirectory(self) -> &'static str {
        match self {
            ArtifactKind::Package => "Packages",
            ArtifactKind::Script => "Scripts",
        }
    }

    /// Server catalog resource holding objects of this kind
    pub fn catalog_resource(self) -> &'static str {
        match self {
            ArtifactKind::Package => "packages",
            ArtifactKind::Script => "scripts",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_packages_and_images() {
        assert_eq!(ArtifactKind::from_path("installer.pkg"), ArtifactKind::Package);
        assert_eq!(ArtifactKind::from_path("image.dmg"), ArtifactKind::Package);
        assert_eq!(ArtifactKind::from_path("/tmp/Flash.PKG"), ArtifactKind::Package);
        assert_eq!(ArtifactKind::from_path("Disk.Dmg"), ArtifactKind::Package);
    }

    #[test]
    fn test_everything_else_is_a_script() {
        assert_eq!(ArtifactKind::from_path("script.sh"), ArtifactKind::Script);
        assert_eq!(ArtifactKind::from_path("postinstall"), ArtifactKind::Script);
        assert_eq!(ArtifactKind::from_path("tool.pkg.py"), ArtifactKind::Script);
        assert_eq!(ArtifactKind::from_path("archive.zip"), ArtifactKind::Script);
    }

    #[test]
    fn test_subdirectories() {
        assert_eq!(ArtifactKind::Package.subdirectory(), "Packages");
        assert_eq!(ArtifactKind::Script.subdirectory(), "Scripts");
    }
}
