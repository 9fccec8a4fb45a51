// Editor map source files (".map").
//
// A map is a list of brace delimited entities. Key/value lines describe the entity;
// nested blocks made of plane lines are its brushes. Two plane line dialects exist:
// Valve 220 carries explicit texture axes in brackets, the older Quake form carries an
// offset and a rotation.

pub mod brush;
pub mod face;
pub mod uv;

use std::{f64::consts::FRAC_PI_2, sync::OnceLock};

use glam::DVec3;
use regex::Regex;

use crate::error::{GeometryWarning, Warnings};

pub use self::{
    brush::{face_polygon, vertices, Brush, FacePolygon, Solid},
    face::{FaceRecord, Plane, TexProjection},
    uv::{project, TexMapping},
};

const NUM: &str = r"(-?[0-9]+\.?[0-9]*)";

/// Orientation given to every spawn point, as XYZ euler angles in radians.
pub const SPAWN_ROTATION: DVec3 = DVec3::new(0.0, FRAC_PI_2, FRAC_PI_2);

/// Marker found in the class name of player start entities.
pub const PLAYER_START: &str = "info_player_";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MapFormat {
    /// Explicit `[ ux uy uz offset ]` texture axes.
    Valve,
    /// Offset and rotation, axes derived from the face normal.
    Quake,
}

impl MapFormat {
    /// Any bracket anywhere in the document selects the Valve dialect.
    pub fn detect(text: &str) -> Self {
        if text.contains('[') || text.contains(']') {
            Self::Valve
        } else {
            Self::Quake
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Spawn {
    pub position: DVec3,
    pub rotation: DVec3,
}

impl Spawn {
    pub fn at(position: DVec3) -> Self {
        Self {
            position,
            rotation: SPAWN_ROTATION,
        }
    }
}

/// Everything the scene builder needs from one map text.
#[derive(Debug, Clone, PartialEq)]
pub struct MapDocument {
    pub format: MapFormat,
    pub brushes: Vec<Brush>,
    /// Origin of the first player start entity.
    pub player_start: Option<Spawn>,
    /// Origin of the first entity carrying one, whatever its class.
    pub first_origin: Option<Spawn>,
    /// Archive file names referenced by the world, without directories.
    pub wad_names: Vec<String>,
}

impl MapDocument {
    fn empty(format: MapFormat) -> Self {
        Self {
            format,
            brushes: Vec::new(),
            player_start: None,
            first_origin: None,
            wad_names: Vec::new(),
        }
    }

    /// The player start, or with `fallback` the first origin of any entity.
    pub fn spawn(&self, fallback: bool) -> Option<Spawn> {
        match self.player_start {
            Some(spawn) => Some(spawn),
            None if fallback => self.first_origin,
            None => None,
        }
    }

    pub fn first_wad_name(&self) -> Option<&str> {
        self.wad_names.first().map(String::as_str)
    }
}

struct Patterns {
    valve: Regex,
    quake: Regex,
    origin: Regex,
    wad: Regex,
}

impl Patterns {
    fn new() -> Result<Self, regex::Error> {
        let point = format!(r"\(\s*{NUM}\s+{NUM}\s+{NUM}\s*\)");
        let points = format!(r"^{point}\s*{point}\s*{point}\s+(\S+)");
        let axis = format!(r"\[\s+{NUM}\s+{NUM}\s+{NUM}\s+{NUM}\s+\]");

        Ok(Self {
            valve: Regex::new(&format!(
                r"{points}\s+{axis}\s+{axis}\s+{NUM}\s+{NUM}\s+{NUM}"
            ))?,
            quake: Regex::new(&format!(
                r"{points}\s+{NUM}\s+{NUM}\s+{NUM}\s+{NUM}\s+{NUM}"
            ))?,
            origin: Regex::new(r#""origin"\s*"(-?[0-9]+)\s+(-?[0-9]+)\s+(-?[0-9]+)""#)?,
            wad: Regex::new(r#"^"wad"\s*"([^"]*)""#)?,
        })
    }

    fn face(&self, format: MapFormat) -> &Regex {
        match format {
            MapFormat::Valve => &self.valve,
            MapFormat::Quake => &self.quake,
        }
    }
}

fn patterns() -> Option<&'static Patterns> {
    static PATTERNS: OnceLock<Option<Patterns>> = OnceLock::new();
    PATTERNS
        .get_or_init(|| match Patterns::new() {
            Ok(p) => Some(p),
            Err(e) => {
                log::error!("map line patterns failed to compile: {e}");
                None
            }
        })
        .as_ref()
}

/// Blocks worth looking at: brushes, and entities that may hold a spawn point.
pub fn split_blocks(text: &str) -> Vec<&str> {
    text.split('{')
        .map(|b| b.trim_matches(|c: char| c.is_whitespace() || c == '}'))
        .filter(|b| !b.is_empty())
        .filter(|b| b.contains('(') || b.contains("\"origin\""))
        .collect()
}

fn lines(block: &str) -> impl Iterator<Item = &str> {
    block.lines().map(str::trim).filter(|l| !l.is_empty())
}

/// Archive names from the world's `"wad"` key, in order.
///
/// Entries are `;` separated; only those ending in `.wad` are kept, stripped of any
/// `/` or `\` directories.
pub fn wad_names(text: &str) -> Vec<String> {
    let Some(patterns) = patterns() else {
        return Vec::new();
    };
    text.lines()
        .map(str::trim)
        .filter(|l| l.starts_with("\"wad\""))
        .filter_map(|l| patterns.wad.captures(l))
        .filter_map(|caps| caps.get(1))
        .flat_map(|m| m.as_str().split(';'))
        .map(str::trim)
        .filter(|entry| entry.to_ascii_lowercase().ends_with(".wad"))
        .map(|entry| {
            entry
                .rsplit(['/', '\\'])
                .next()
                .unwrap_or(entry)
                .to_owned()
        })
        .collect()
}

pub fn first_wad_name(text: &str) -> Option<String> {
    wad_names(text).into_iter().next()
}

fn origin(patterns: &Patterns, line: &str) -> Option<DVec3> {
    let caps = patterns.origin.captures(line)?;
    let coord = |i: usize| -> Option<f64> { caps.get(i)?.as_str().parse().ok() };
    Some(DVec3::new(coord(1)?, coord(2)?, coord(3)?))
}

/// Parse a whole map.
///
/// Plane lines that match neither dialect are skipped silently. Planes whose three points
/// are collinear are dropped with a warning. The first `"origin"` line of an entity
/// records a spawn candidate and ends the scan of that block.
pub fn parse(text: &str, warnings: &mut Warnings) -> MapDocument {
    let format = MapFormat::detect(text);
    let mut doc = MapDocument::empty(format);
    let Some(patterns) = patterns() else {
        return doc;
    };
    doc.wad_names = wad_names(text);

    let face_pattern = patterns.face(format);

    for block in split_blocks(text) {
        let is_brush = block.starts_with('(');
        let mut faces = Vec::new();

        for line in lines(block) {
            if line.starts_with("\"origin\"") {
                if let Some(position) = origin(patterns, line) {
                    let slot = if block.contains(PLAYER_START) {
                        &mut doc.player_start
                    } else {
                        &mut doc.first_origin
                    };
                    if slot.is_none() {
                        log::debug!("spawn candidate at {position}");
                        *slot = Some(Spawn::at(position));
                    }
                }
                break;
            }

            if !is_brush || !line.starts_with('(') {
                continue;
            }

            let Some(caps) = face_pattern.captures(line) else {
                continue;
            };
            match FaceRecord::from_captures(&caps, format) {
                Some(face) => faces.push(face),
                None => warnings.push(GeometryWarning::DegenerateFace {
                    brush: doc.brushes.len(),
                    face: faces.len(),
                }),
            }
        }

        if is_brush {
            doc.brushes.push(Brush::new(doc.brushes.len(), faces));
        }
    }

    log::info!(
        "parsed {} brushes ({:?} format)",
        doc.brushes.len(),
        doc.format
    );
    doc
}
