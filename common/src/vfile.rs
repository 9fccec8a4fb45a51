use std::{collections::HashMap, fs, io, path::Path, sync::Arc};

#[derive(Default, Clone)]
pub struct VFile {
    pub data: Vec<u8>,
}

/// Files handed over by the caller, addressed by bare file name.
///
/// Lookups ignore ASCII case and any directory part of the requested path, since
/// maps reference their archives with paths from the machine they were built on.
#[derive(Default, Clone)]
pub struct VFileSystem {
    pub files: Arc<HashMap<String, VFile>>,
}

fn file_key(path: &str) -> String {
    path.rsplit(['/', '\\'])
        .next()
        .unwrap_or(path)
        .to_ascii_lowercase()
}

impl VFileSystem {
    /// Load every regular file directly inside `dir`.
    pub fn from_dir(dir: &Path) -> io::Result<Self> {
        let mut fs = Self::default();
        for entry in fs::read_dir(dir)? {
            let entry = entry?;
            if !entry.file_type()?.is_file() {
                continue;
            }
            let name = entry.file_name().to_string_lossy().into_owned();
            fs.insert(&name, fs::read(entry.path())?);
        }
        log::debug!("loaded {} files from {:?}", fs.len(), dir);
        Ok(fs)
    }

    pub fn insert(&mut self, path: &str, data: Vec<u8>) {
        Arc::make_mut(&mut self.files).insert(file_key(path), VFile { data });
    }

    pub fn contains(&self, path: &str) -> bool {
        self.files.contains_key(&file_key(path))
    }

    pub fn data(&self, path: &str) -> Option<&[u8]> {
        self.files.get(&file_key(path)).map(|f| &f.data[..])
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}
