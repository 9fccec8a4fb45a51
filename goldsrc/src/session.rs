use std::{fs, io, sync::Arc};

use ahash::AHashMap;
use common::prelude::*;
use thiserror::Error;

use crate::{
    config::Settings,
    error::{FormatError, GeometryWarning, Warnings},
    map::{self, MapDocument, MapFormat, Spawn, TexMapping},
    wad::{palette::Rgba, Palette, Wad, WadKind},
};

/// Share of the bar filled while brushes are processed; the rest marks completion.
const BUILD_SHARE: f32 = 95.0;

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("map `{0}` was not found")]
    MapNotFound(String),
    #[error("texture archive `{0}` referenced by the map is not loaded")]
    WadNotLoaded(String),
    #[error(transparent)]
    Format(#[from] FormatError),
    #[error("failed to read {0}")]
    Io(#[from] io::Error),
}

/// Receives completion percentages while a scene builds.
pub trait Progress {
    fn report(&mut self, percent: f32);
}

impl Progress for () {
    fn report(&mut self, _percent: f32) {}
}

impl<F: FnMut(f32)> Progress for F {
    fn report(&mut self, percent: f32) {
        self(percent)
    }
}

/// Every face drawn with one texture, merged into one mesh.
#[derive(Debug, Clone)]
pub struct TexturedMesh {
    pub texture: Arc<Rgba>,
    pub mesh: MeshBuilder<UVVertex>,
}

#[derive(Debug, Default, Clone)]
pub struct Scene {
    pub spawn: Option<Spawn>,
    /// In order of first use.
    pub meshes: Vec<TexturedMesh>,
    pub brushes: usize,
    pub faces: usize,
}

impl Scene {
    pub fn mesh(&self, texture: &str) -> Option<&TexturedMesh> {
        self.meshes
            .iter()
            .find(|m| m.texture.name.eq_ignore_ascii_case(texture))
    }

    pub fn triangle_count(&self) -> usize {
        self.meshes.iter().map(|m| m.mesh.triangle_count()).sum()
    }
}

/// State for turning maps into scenes against one texture archive.
///
/// Decoded textures are cached for the life of the session, so building several maps
/// that share an archive decodes each texture once. Failed lookups are cached with the
/// warnings they raised, which are reported again on every use.
#[derive(Debug, Default)]
pub struct MapSession {
    wad: Option<Wad>,
    palette: Option<Palette>,
    settings: Settings,
    /// Keyed by lowercase name.
    textures: AHashMap<String, Result<Arc<Rgba>, Vec<GeometryWarning>>>,
}

impl MapSession {
    pub fn new(wad: Option<Wad>, palette: Option<Palette>, settings: Settings) -> Self {
        Self {
            wad,
            palette,
            settings,
            textures: AHashMap::new(),
        }
    }

    /// Load `map_name` and the archive it names from `files`.
    ///
    /// The legacy palette comes from the configured path, looked up by file name in
    /// `files` first and then on disk. Maps naming no archive get a session without one.
    pub fn from_files(
        files: &VFileSystem,
        map_name: &str,
        settings: Settings,
    ) -> Result<(Self, String), SessionError> {
        let text = files
            .data(map_name)
            .map(|d| String::from_utf8_lossy(d).into_owned())
            .ok_or_else(|| SessionError::MapNotFound(map_name.to_owned()))?;

        let wad = match map::first_wad_name(&text) {
            Some(name) => {
                let data = files
                    .data(&name)
                    .ok_or_else(|| SessionError::WadNotLoaded(name.clone()))?;
                log::info!("using texture archive {name}");
                Some(Wad::read(data.to_vec())?)
            }
            None => {
                log::warn!("{map_name} names no texture archive");
                None
            }
        };

        let palette = match &settings.palette {
            Some(path) => {
                let name = path.to_string_lossy();
                let bytes = match files.data(&name) {
                    Some(data) => data.to_vec(),
                    None => fs::read(path)?,
                };
                Some(Palette::from_lmp(&bytes)?)
            }
            None => None,
        };

        Ok((Self::new(wad, palette, settings), text))
    }

    pub fn wad(&self) -> Option<&Wad> {
        self.wad.as_ref()
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn cached_textures(&self) -> usize {
        self.textures.values().filter(|t| t.is_ok()).count()
    }

    /// Resolve and decode a texture, once per name.
    fn texture(
        &mut self,
        name: &str,
        format: MapFormat,
        warnings: &mut Warnings,
    ) -> Option<Arc<Rgba>> {
        let key = name.to_ascii_lowercase();
        match self.textures.get(&key) {
            Some(Ok(texture)) => return Some(texture.clone()),
            Some(Err(failures)) => {
                for warning in failures {
                    warnings.push(warning.clone());
                }
                return None;
            }
            None => {}
        }

        let mut raised = Warnings::default();
        let resolved = self.decode(name, format, &mut raised).map(Arc::new);
        let entry = match &resolved {
            Some(texture) => Ok(texture.clone()),
            None => Err(raised.as_slice().to_vec()),
        };
        warnings.extend(raised);
        self.textures.insert(key, entry);
        resolved
    }

    fn decode(&self, name: &str, format: MapFormat, warnings: &mut Warnings) -> Option<Rgba> {
        let kind = match format {
            MapFormat::Valve => WadKind::Wad3,
            MapFormat::Quake => WadKind::Wad2,
        };

        let found = self
            .wad
            .as_ref()
            .and_then(|wad| wad.texture_from_name(name, kind, warnings));
        let Some(asset) = found else {
            warnings.push(GeometryWarning::MissingTexture(name.to_owned()));
            return None;
        };

        match asset.to_rgba(self.palette.as_ref(), &self.settings.transparent_prefix) {
            Ok(rgba) => Some(rgba),
            Err(FormatError::MissingPalette(name)) => {
                warnings.push(GeometryWarning::MissingPalette(name));
                None
            }
            Err(e) => {
                warnings.push(GeometryWarning::BadTexture {
                    name: asset.name.clone(),
                    reason: e.to_string(),
                });
                None
            }
        }
    }

    /// Parse `text` and build one mesh per texture from every brush that reconstructs.
    ///
    /// Faces whose texture cannot be resolved are left out. Progress is reported at
    /// most `progress_steps` times between 0 and 95 %, then 100 % once done.
    pub fn build(&mut self, text: &str, progress: &mut impl Progress) -> (Scene, Warnings) {
        let mut warnings = Warnings::default();
        let doc = map::parse(text, &mut warnings);
        let scene = self.build_document(&doc, progress, &mut warnings);
        (scene, warnings)
    }

    pub fn build_document(
        &mut self,
        doc: &MapDocument,
        progress: &mut impl Progress,
        warnings: &mut Warnings,
    ) -> Scene {
        let mut scene = Scene {
            spawn: doc.spawn(self.settings.spawn_fallback),
            ..Default::default()
        };
        let mut by_texture: AHashMap<String, usize> = AHashMap::new();

        let total = doc.brushes.len();
        let steps = (self.settings.progress_steps as usize).min(total);
        let interval = if steps == 0 { 0 } else { total.div_ceil(steps) };
        let reports = if interval == 0 { 0 } else { total.div_ceil(interval) };

        for (i, brush) in doc.brushes.iter().enumerate() {
            if interval != 0 && i % interval == 0 {
                let step = i / interval + 1;
                progress.report(BUILD_SHARE * step as f32 / reports as f32);
            }

            let Some(solid) = brush.reconstruct(warnings) else {
                continue;
            };
            scene.brushes += 1;

            for polygon in &solid.polygons {
                let face = &brush.faces[polygon.face];
                let Some(texture) = self.texture(&face.texture, doc.format, warnings) else {
                    continue;
                };

                let mapping = TexMapping::new(face, texture.width, texture.height);
                let verts: Vec<UVVertex> = polygon
                    .vertices
                    .iter()
                    .map(|v| UVVertex::new(v.as_vec3(), mapping.project(*v).as_vec2()))
                    .collect();

                let key = face.texture.to_ascii_lowercase();
                let index = *by_texture.entry(key).or_insert_with(|| {
                    scene.meshes.push(TexturedMesh {
                        texture: texture.clone(),
                        mesh: MeshBuilder::default(),
                    });
                    scene.meshes.len() - 1
                });
                scene.meshes[index].mesh.add_polygon(&verts);
                scene.faces += 1;
            }
        }

        progress.report(100.0);
        log::info!(
            "built {} brushes, {} faces over {} textures",
            scene.brushes,
            scene.faces,
            scene.meshes.len()
        );
        scene
    }
}

#[cfg(test)]
mod session_tests {
    use glam::Vec2;

    use super::*;
    use crate::wad::{write, RasterAsset};

    const ROOM: &str = r#"
{
"classname" "worldspawn"
"wad" "\sierra\half-life\valve\test.wad"
{
( -64 -64 -16 ) ( -64 -63 -16 ) ( -64 -64 -15 ) rock [ 0 -1 0 0 ] [ 0 0 -1 0 ] 0 1 1
( -64 -64 -16 ) ( -64 -64 -15 ) ( -63 -64 -16 ) rock [ 1 0 0 0 ] [ 0 0 -1 0 ] 0 1 1
( -64 -64 -16 ) ( -63 -64 -16 ) ( -64 -63 -16 ) glassblue [ -1 0 0 0 ] [ 0 -1 0 0 ] 0 1 1
( 64 64 16 ) ( 64 65 16 ) ( 65 64 16 ) GLASSBLUE [ 1 0 0 0 ] [ 0 -1 0 0 ] 0 1 1
( 64 64 16 ) ( 65 64 16 ) ( 64 64 17 ) rock [ -1 0 0 0 ] [ 0 0 -1 0 ] 0 1 1
( 64 64 16 ) ( 64 64 17 ) ( 64 65 16 ) missing [ 0 1 0 0 ] [ 0 0 -1 0 ] 0 1 1
}
{
( 0 0 0 ) ( 0 1 0 ) ( 1 0 0 ) rock [ 1 0 0 0 ] [ 0 -1 0 0 ] 0 1 1
}
}
{
"classname" "info_player_start"
"origin" "0 0 24"
}
"#;

    fn archive() -> Vec<u8> {
        let texture = |name: &str, size: u32| {
            RasterAsset::new(
                name,
                size,
                size,
                vec![3; (size * size) as usize],
                Some(Palette::grayscale()),
            )
        };
        write(&[texture("rock", 64), texture("glassblue", 32)]).unwrap()
    }

    fn files() -> VFileSystem {
        let mut files = VFileSystem::default();
        files.insert("room.map", ROOM.as_bytes().to_vec());
        files.insert("test.wad", archive());
        files
    }

    #[test]
    fn builds_meshes_per_texture() {
        let (mut session, text) =
            MapSession::from_files(&files(), "room.map", Settings::default()).unwrap();
        let (scene, warnings) = session.build(&text, &mut ());

        assert_eq!(scene.spawn.unwrap().position, glam::DVec3::new(0.0, 0.0, 24.0));
        assert_eq!(scene.brushes, 1);
        assert_eq!(scene.faces, 5);
        assert_eq!(scene.meshes.len(), 2);

        let rock = scene.mesh("rock").unwrap();
        assert_eq!(rock.mesh.verts().len(), 12);
        assert_eq!(rock.mesh.triangle_count(), 6);
        assert!(!rock.texture.transparent);

        let glass = scene.mesh("glassblue").unwrap();
        assert_eq!(glass.mesh.triangle_count(), 4);
        assert!(glass.texture.transparent);
        assert_eq!(glass.texture.pixels[3], 128);

        assert_eq!(
            warnings.as_slice(),
            &[
                GeometryWarning::MissingTexture("missing".into()),
                GeometryWarning::TooFewFaces { brush: 1, faces: 1 },
            ]
        );
    }

    #[test]
    fn uvs_follow_the_face_axes() {
        let (mut session, text) =
            MapSession::from_files(&files(), "room.map", Settings::default()).unwrap();
        let (scene, _) = session.build(&text, &mut ());

        // top face: u = x / 32, v = -y / 32 on the 32 texel glass texture
        let glass = scene.mesh("glassblue").unwrap();
        for vert in glass.mesh.verts().iter().filter(|v| v.position.z > 0.0) {
            let expected = Vec2::new(vert.position.x / 32.0, -vert.position.y / 32.0);
            assert!((vert.uv - expected).length() < 1e-6);
        }
    }

    #[test]
    fn textures_decode_once_per_session() {
        let (mut session, text) =
            MapSession::from_files(&files(), "room.map", Settings::default()).unwrap();
        let (_, first) = session.build(&text, &mut ());
        let (scene, second) = session.build(&text, &mut ());

        assert_eq!(session.cached_textures(), 2);
        assert_eq!(scene.faces, 5);
        // the skipped face is reported on every build
        assert_eq!(first.as_slice(), second.as_slice());
        assert_eq!(
            second.as_slice()[0],
            GeometryWarning::MissingTexture("missing".into())
        );
    }

    #[test]
    fn every_face_with_an_unresolved_texture_is_reported() {
        let text = ROOM.replace(" rock ", " missing ");
        let mut files = files();
        files.insert("room.map", text.as_bytes().to_vec());

        let (mut session, text) =
            MapSession::from_files(&files, "room.map", Settings::default()).unwrap();
        let (scene, warnings) = session.build(&text, &mut ());

        assert_eq!(scene.faces, 2);
        let missing = warnings
            .iter()
            .filter(|w| **w == GeometryWarning::MissingTexture("missing".into()))
            .count();
        assert_eq!(missing, 4);
    }

    #[test]
    fn progress_climbs_to_completion() {
        let brush = ROOM
            .split('{')
            .nth(2)
            .map(|b| format!("{{{b}"))
            .unwrap();
        let text = brush.repeat(100);

        let mut reports = Vec::new();
        let mut session = MapSession::default();
        session.build(&text, &mut |p: f32| reports.push(p));

        assert!(reports.len() <= 28);
        assert!(reports.windows(2).all(|w| w[0] <= w[1]));
        assert_eq!(reports[reports.len() - 2], 95.0);
        assert_eq!(reports[reports.len() - 1], 100.0);
    }

    #[test]
    fn named_archive_must_be_present() {
        let mut files = VFileSystem::default();
        files.insert("room.map", ROOM.as_bytes().to_vec());

        assert!(matches!(
            MapSession::from_files(&files, "room.map", Settings::default()),
            Err(SessionError::WadNotLoaded(name)) if name == "test.wad"
        ));
        assert!(matches!(
            MapSession::from_files(&files, "other.map", Settings::default()),
            Err(SessionError::MapNotFound(_))
        ));
    }

    #[test]
    fn legacy_maps_need_a_palette() {
        // same records, relabelled as a legacy archive
        let mut bytes = archive();
        bytes[..4].copy_from_slice(b"WAD2");
        let dir = u32::from_le_bytes(bytes[8..12].try_into().unwrap()) as usize;
        for entry in bytes[dir..].chunks_exact_mut(32) {
            entry[12] = 0x44;
        }
        let text = ROOM.replace(|c: char| c == '[' || c == ']', "");

        let wad = Wad::read(bytes.clone()).unwrap();
        let mut bare = MapSession::new(Some(wad), None, Settings::default());
        let (scene, warnings) = bare.build(&text, &mut ());
        assert!(scene.meshes.is_empty());
        assert!(warnings
            .iter()
            .any(|w| matches!(w, GeometryWarning::MissingPalette(name) if name == "rock")));

        let mut paletted = MapSession::new(
            Some(Wad::read(bytes).unwrap()),
            Some(Palette::grayscale()),
            Settings::default(),
        );
        let (scene, _) = paletted.build(&text, &mut ());
        assert_eq!(scene.meshes.len(), 2);
        assert_eq!(scene.faces, 5);
    }
}
