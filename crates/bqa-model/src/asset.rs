use std::path::{Component, Path, PathBuf};

use memmap2::Mmap;

use crate::error::{ModelError, Result};

/// Directory holding the model files bundled with the application.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetDir {
    root: PathBuf,
}

impl AssetDir {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolve a bundled asset name to its path.
    ///
    /// The name must be a single plain file name: no separators, no `.`
    /// or `..` components.
    pub fn resolve(&self, name: &str) -> Result<PathBuf> {
        let mut components = Path::new(name).components();
        match (components.next(), components.next()) {
            (Some(Component::Normal(_)), None) if !name.contains(&['/', '\\'][..]) => {
                Ok(self.root.join(name))
            }
            _ => Err(ModelError::InvalidAssetName(name.to_string())),
        }
    }
}

/// A bundled model file mapped into memory.
///
/// The bytes are handed to the runtime as-is; their layout is the runtime's
/// business.
pub struct ModelAsset {
    name: String,
    path: PathBuf,
    mmap: Mmap,
}

impl ModelAsset {
    /// Resolve `name` inside `assets` and memory-map the file.
    pub fn open(assets: &AssetDir, name: &str) -> Result<ModelAsset> {
        let path = assets.resolve(name)?;
        let file = std::fs::File::open(&path)?;

        if file.metadata()?.len() == 0 {
            return Err(ModelError::EmptyAsset(name.to_string()));
        }

        // The file is opened read-only and never written by this process.
        let mmap = unsafe { Mmap::map(&file)? };

        Ok(ModelAsset {
            name: name.to_string(),
            path,
            mmap,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn bytes(&self) -> &[u8] {
        &self.mmap
    }

    pub fn len(&self) -> usize {
        self.mmap.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mmap.is_empty()
    }
}

impl std::fmt::Debug for ModelAsset {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModelAsset")
            .field("name", &self.name)
            .field("path", &self.path)
            .field("len", &self.mmap.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_plain_name() {
        let assets = AssetDir::new("/data/app/assets");
        let path = assets.resolve("mobilebert.tflite").unwrap();
        assert_eq!(path, PathBuf::from("/data/app/assets/mobilebert.tflite"));
    }

    #[test]
    fn test_resolve_rejects_paths() {
        let assets = AssetDir::new("assets");
        for bad in ["", ".", "..", "../model.tflite", "sub/model.tflite", "/etc/passwd", "a\\b"] {
            assert!(
                matches!(assets.resolve(bad), Err(ModelError::InvalidAssetName(_))),
                "accepted {:?}",
                bad
            );
        }
    }

    #[test]
    fn test_open_maps_bytes() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("model.tflite"), b"\x1c\0\0\0TFL3rest").unwrap();

        let assets = AssetDir::new(dir.path());
        let asset = ModelAsset::open(&assets, "model.tflite").unwrap();
        assert_eq!(asset.name(), "model.tflite");
        assert_eq!(asset.len(), 12);
        assert_eq!(&asset.bytes()[4..8], b"TFL3");
        assert_eq!(asset.path(), dir.path().join("model.tflite"));
    }

    #[test]
    fn test_open_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let assets = AssetDir::new(dir.path());
        assert!(matches!(
            ModelAsset::open(&assets, "missing.tflite"),
            Err(ModelError::Io(_))
        ));
    }

    #[test]
    fn test_open_empty_file() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("empty.tflite"), b"").unwrap();
        let assets = AssetDir::new(dir.path());
        assert!(matches!(
            ModelAsset::open(&assets, "empty.tflite"),
            Err(ModelError::EmptyAsset(_))
        ));
    }
}
