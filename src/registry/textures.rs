use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use image::RgbaImage;

use crate::error::EngineError;

/// Named textures shared by material painters (tile sets, pipe sheets,
/// decal sheets).
#[derive(Clone, Debug, Default)]
pub struct TextureLibrary {
    textures: HashMap<String, Arc<RgbaImage>>,
}

impl TextureLibrary {
    pub fn new() -> Self {
        Self::default()
    }

    /// Scan `path` recursively for `.png` files and key each decoded image by
    /// its file stem.
    ///
    /// The first file with a given stem wins; later duplicates and files that
    /// fail to decode are skipped with a warning. A missing root directory is
    /// an error, an empty one is not.
    pub fn load_folder(path: impl AsRef<Path>) -> Result<Self, EngineError> {
        let root = path.as_ref();
        if !root.is_dir() {
            return Err(EngineError::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("texture folder {:?} does not exist", root),
            )));
        }

        let mut library = Self::new();

        for entry in walkdir::WalkDir::new(root)
            .sort_by_file_name()
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file())
        {
            let file_path = entry.path();
            if file_path.extension().and_then(|s| s.to_str()) != Some("png") {
                continue;
            }
            let name = match file_path.file_stem().and_then(|s| s.to_str()) {
                Some(n) if !n.is_empty() => n.to_string(),
                _ => continue,
            };

            if library.contains(&name) {
                log::warn!("textures: duplicate name '{}' from {:?}; skipping", name, file_path);
                continue;
            }

            match image::open(file_path) {
                Ok(img) => library.insert(name, img.to_rgba8()),
                Err(e) => log::warn!("textures: failed to load {:?}: {e}", file_path),
            }
        }

        log::info!("textures: loaded {} textures from {:?}", library.len(), root);
        Ok(library)
    }

    pub fn insert(&mut self, name: impl Into<String>, image: RgbaImage) {
        self.textures.insert(name.into(), Arc::new(image));
    }

    pub fn get(&self, name: &str) -> Option<Arc<RgbaImage>> {
        self.textures.get(name).cloned()
    }

    /// Lookup that fails with [`EngineError::MissingTexture`].
    pub fn require(&self, name: &str) -> Result<Arc<RgbaImage>, EngineError> {
        self.get(name).ok_or_else(|| EngineError::MissingTexture(name.to_string()))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.textures.contains_key(name)
    }

    /// Every `(name, texture)` pair, in no particular order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Arc<RgbaImage>)> {
        self.textures.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.textures.len()
    }

    pub fn is_empty(&self) -> bool {
        self.textures.is_empty()
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    fn scratch_dir(tag: &str) -> std::path::PathBuf {
        let dir = std::env::temp_dir().join(format!("strata-textures-{tag}-{}", std::process::id()));
        let _ = std::fs::remove_dir_all(&dir);
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn load_folder_keys_by_file_stem_and_recurses() {
        let dir = scratch_dir("stems");
        std::fs::create_dir_all(dir.join("nested")).unwrap();
        RgbaImage::from_pixel(2, 2, Rgba([1, 2, 3, 255])).save(dir.join("pipeTiles.png")).unwrap();
        RgbaImage::from_pixel(3, 1, Rgba([9, 9, 9, 255]))
            .save(dir.join("nested").join("tileSetConcrete.png"))
            .unwrap();
        std::fs::write(dir.join("notes.txt"), "ignored").unwrap();

        let lib = TextureLibrary::load_folder(&dir).unwrap();
        assert_eq!(lib.len(), 2);
        assert_eq!(lib.get("pipeTiles").unwrap().dimensions(), (2, 2));
        assert_eq!(lib.get("tileSetConcrete").unwrap().dimensions(), (3, 1));
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn load_folder_skips_undecodable_png() {
        let dir = scratch_dir("broken");
        std::fs::write(dir.join("broken.png"), b"not a png").unwrap();
        let lib = TextureLibrary::load_folder(&dir).unwrap();
        assert!(lib.is_empty());
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn load_folder_of_missing_directory_errors() {
        let err = TextureLibrary::load_folder("/no/such/strata/dir").unwrap_err();
        assert!(matches!(err, EngineError::Io(_)));
    }

    #[test]
    fn require_reports_missing_name() {
        let lib = TextureLibrary::new();
        match lib.require("framework") {
            Err(EngineError::MissingTexture(name)) => assert_eq!(name, "framework"),
            other => panic!("unexpected {other:?}"),
        }
    }
}
