use crate::{
    binaries::write_name,
    error::{FormatError, Warnings},
};

use super::{consts::NAME_LEN, miptex::RasterAsset, palette::Palette, writer, Wad};

/// An editable, ordered list of textures destined for a new archive.
#[derive(Debug, Default, Clone)]
pub struct TextureSet {
    textures: Vec<RasterAsset>,
}

/// Outcome of [`TextureSet::merge`].
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct MergeReport {
    pub added: Vec<String>,
    /// Names already present, compared ignoring ASCII case. These were not merged.
    pub duplicates: Vec<String>,
}

impl MergeReport {
    pub fn summary(&self) -> String {
        format!(
            "added {} new textures, filtered {} duplicates",
            self.added.len(),
            self.duplicates.len()
        )
    }
}

fn check_name(name: &str) -> Result<(), FormatError> {
    write_name::<NAME_LEN>(name)
        .map(|_| ())
        .ok_or_else(|| FormatError::NameTooLong(name.to_owned()))
}

impl TextureSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_wad(wad: &Wad, warnings: &mut Warnings) -> Self {
        Self {
            textures: wad.assets(warnings),
        }
    }

    pub fn read(data: Vec<u8>, warnings: &mut Warnings) -> Result<Self, FormatError> {
        Ok(Self::from_wad(&Wad::read(data)?, warnings))
    }

    pub fn textures(&self) -> &[RasterAsset] {
        &self.textures
    }

    pub fn len(&self) -> usize {
        self.textures.len()
    }

    pub fn is_empty(&self) -> bool {
        self.textures.is_empty()
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.textures
            .iter()
            .position(|t| t.name.eq_ignore_ascii_case(name))
    }

    pub fn get(&self, name: &str) -> Option<&RasterAsset> {
        self.position(name).map(|i| &self.textures[i])
    }

    pub fn contains(&self, name: &str) -> bool {
        self.position(name).is_some()
    }

    /// Append a newly imported texture.
    ///
    /// Imports must be a multiple of 16 in both dimensions, carry a palette, and use a
    /// name not already taken. Missing mip levels are generated.
    pub fn add(&mut self, asset: RasterAsset) -> Result<(), FormatError> {
        check_name(&asset.name)?;
        if !asset.is_editor_sized() {
            return Err(FormatError::BadDimensions {
                name: asset.name,
                width: asset.width,
                height: asset.height,
            });
        }
        if asset.palette.is_none() {
            return Err(FormatError::MissingPalette(asset.name));
        }
        if self.contains(&asset.name) {
            return Err(FormatError::DuplicateName(asset.name));
        }

        let asset = asset.with_generated_mips();
        asset.validate_mips()?;
        log::info!("added texture {} ({}x{})", asset.name, asset.width, asset.height);
        self.textures.push(asset);
        Ok(())
    }

    pub fn rename(&mut self, old: &str, new: &str) -> Result<(), FormatError> {
        let index = self
            .position(old)
            .ok_or_else(|| FormatError::NotFound(old.to_owned()))?;
        check_name(new)?;
        if let Some(other) = self.position(new) {
            if other != index {
                return Err(FormatError::DuplicateName(new.to_owned()));
            }
        }
        self.textures[index].name = new.to_owned();
        Ok(())
    }

    pub fn remove(&mut self, name: &str) -> Result<RasterAsset, FormatError> {
        let index = self
            .position(name)
            .ok_or_else(|| FormatError::NotFound(name.to_owned()))?;
        Ok(self.textures.remove(index))
    }

    /// Textures whose name contains `query`, ignoring ASCII case and any spaces in the query.
    pub fn search(&self, query: &str) -> Vec<&RasterAsset> {
        let needle: String = query
            .chars()
            .filter(|c| *c != ' ')
            .collect::<String>()
            .to_lowercase();
        self.textures
            .iter()
            .filter(|t| t.name.to_lowercase().contains(&needle))
            .collect()
    }

    /// Append every texture of `other` whose name is not already present.
    pub fn merge(&mut self, other: impl IntoIterator<Item = RasterAsset>) -> MergeReport {
        let mut report = MergeReport::default();
        for asset in other {
            if self.contains(&asset.name) {
                report.duplicates.push(asset.name);
            } else {
                report.added.push(asset.name.clone());
                self.textures.push(asset);
            }
        }

        log::info!("merged archive: {}", report.summary());
        if !report.duplicates.is_empty() {
            log::debug!("non-merged duplicates: {:?}", report.duplicates);
        }
        report
    }

    /// Give textures read from a legacy archive the shared palette so they can be written.
    pub fn fill_missing_palettes(&mut self, palette: &Palette) -> usize {
        let mut filled = 0;
        for texture in self.textures.iter_mut().filter(|t| t.palette.is_none()) {
            texture.palette = Some(palette.clone());
            filled += 1;
        }
        filled
    }

    pub fn write(&self) -> Result<Vec<u8>, FormatError> {
        writer::write(&self.textures)
    }
}

impl IntoIterator for TextureSet {
    type Item = RasterAsset;
    type IntoIter = std::vec::IntoIter<RasterAsset>;

    fn into_iter(self) -> Self::IntoIter {
        self.textures.into_iter()
    }
}
