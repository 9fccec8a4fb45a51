pub use crate::config::{ConfigError, Settings};
pub use crate::error::{FormatError, GeometryWarning, Warnings};
pub use crate::map::{parse, Brush, FaceRecord, MapDocument, MapFormat, Plane, Spawn};
pub use crate::session::{MapSession, Progress, Scene, SessionError};
pub use crate::wad::{palette::Rgba, MergeReport, Palette, RasterAsset, TextureSet, Wad, WadKind};
