use std::{
    collections::HashSet,
    fs,
    path::{Path, PathBuf},
};

use common::vfile::VFileSystem;
use goldsrc::{prelude::*, wad::consts::LumpType};

use crate::{Action, CliError};

pub fn run(action: Action, settings: Settings) -> Result<(), CliError> {
    match action {
        Action::Info { wad } => info(&wad),
        Action::Search { wad, query } => search(&wad, &query),
        Action::Merge {
            wad,
            others,
            output,
        } => {
            let mut set = open_set(&wad, &settings)?;
            for other in &others {
                let report = set.merge(open_set(other, &settings)?);
                println!("{}: {}", other.display(), report.summary());
                for name in &report.duplicates {
                    println!("  skipped {name}");
                }
            }
            save(&set, output.as_deref().unwrap_or(&wad))
        }
        Action::Rename {
            wad,
            old,
            new,
            output,
        } => {
            let mut set = open_set(&wad, &settings)?;
            set.rename(&old, &new)?;
            println!("renamed {old} to {new}");
            save(&set, output.as_deref().unwrap_or(&wad))
        }
        Action::Remove { wad, name, output } => {
            let mut set = open_set(&wad, &settings)?;
            let removed = set.remove(&name)?;
            println!("removed {}", removed.name);
            save(&set, output.as_deref().unwrap_or(&wad))
        }
        Action::Palette { wad, name } => palette(&wad, &name, &settings),
        Action::Map { dir, map } => build_map(dir, &map, settings),
    }
}

fn legacy_palette(settings: &Settings) -> Result<Option<Palette>, CliError> {
    match &settings.palette {
        Some(path) => Ok(Some(Palette::from_lmp(&fs::read(path)?)?)),
        None => Ok(None),
    }
}

fn open_set(path: &Path, settings: &Settings) -> Result<TextureSet, CliError> {
    let mut warnings = Warnings::default();
    let mut set = TextureSet::read(fs::read(path)?, &mut warnings)?;

    if set.textures().iter().any(|t| t.palette.is_none()) {
        if let Some(palette) = legacy_palette(settings)? {
            let filled = set.fill_missing_palettes(&palette);
            log::info!("applied the configured palette to {filled} legacy textures");
        }
    }
    Ok(set)
}

fn save(set: &TextureSet, path: &Path) -> Result<(), CliError> {
    fs::write(path, set.write()?)?;
    println!("wrote {} textures to {}", set.len(), path.display());
    Ok(())
}

fn info(path: &Path) -> Result<(), CliError> {
    let wad = Wad::load(path)?;
    println!(
        "{}: {:?}, {} entries",
        path.display(),
        wad.kind(),
        wad.len()
    );

    for entry in wad.directory() {
        let kind = match entry.lump_type() {
            Some(kind) => format!("{kind:?}"),
            None => format!("{:#04x}", entry.kind),
        };
        let dims = match entry.lump_type() {
            Some(LumpType::MipTex | LumpType::QuakeMipTex) => match wad.extract(entry) {
                Ok(asset) => format!("{}x{}", asset.width, asset.height),
                Err(e) => e.to_string(),
            },
            _ => String::from("-"),
        };
        println!(
            "{:<16} {:<12} {:>9} {}",
            entry.name(),
            kind,
            entry.size(),
            dims
        );
    }
    Ok(())
}

fn search(path: &Path, query: &str) -> Result<(), CliError> {
    let mut warnings = Warnings::default();
    let set = TextureSet::read(fs::read(path)?, &mut warnings)?;
    for texture in set.search(query) {
        println!("{} ({}x{})", texture.name, texture.width, texture.height);
    }
    Ok(())
}

fn palette(path: &Path, name: &str, settings: &Settings) -> Result<(), CliError> {
    let wad = Wad::load(path)?;
    let entry = wad
        .entry(name)
        .ok_or_else(|| CliError::NoTexture(name.to_owned()))?;
    let asset = wad.extract(entry)?;

    let external = match legacy_palette(settings)? {
        Some(palette) => palette,
        None => {
            if asset.palette.is_none() {
                log::warn!("no palette configured, showing {name} in grayscale");
            }
            Palette::grayscale()
        }
    };
    let rgba = asset.to_rgba(Some(&external), &settings.transparent_prefix)?;

    let distinct: HashSet<[u8; 4]> = rgba
        .pixels
        .chunks_exact(4)
        .map(|px| [px[0], px[1], px[2], px[3]])
        .collect();
    let count = (rgba.pixels.len() / 4).max(1) as u64;
    let mut sum = [0u64; 4];
    for px in rgba.pixels.chunks_exact(4) {
        for (s, &c) in sum.iter_mut().zip(px) {
            *s += c as u64;
        }
    }

    println!("{} {}x{}", rgba.name, rgba.width, rgba.height);
    println!("  mip levels:  {}", asset.mip_count());
    println!("  transparent: {}", rgba.transparent);
    println!("  colours:     {}", distinct.len());
    println!(
        "  average:     {:?}",
        sum.map(|s| (s / count) as u8)
    );
    Ok(())
}

fn build_map(dir: PathBuf, map: &str, settings: Settings) -> Result<(), CliError> {
    let files = VFileSystem::from_dir(&dir)?;
    let (mut session, text) = MapSession::from_files(&files, map, settings)?;

    let (scene, warnings) = session.build(&text, &mut |percent: f32| {
        log::debug!("{percent:.0}%");
    });

    match scene.spawn {
        Some(spawn) => println!("spawn:     {}", spawn.position),
        None => println!("spawn:     none"),
    }
    println!("brushes:   {}", scene.brushes);
    println!("faces:     {}", scene.faces);
    println!("triangles: {}", scene.triangle_count());
    let lines: usize = scene
        .meshes
        .iter()
        .map(|m| m.mesh.tris_to_lines().len() / 2)
        .sum();
    println!("wireframe: {lines} lines");
    for mesh in &scene.meshes {
        println!(
            "  {:<16} {:>3}x{:<3} {:>6} tris{}",
            mesh.texture.name,
            mesh.texture.width,
            mesh.texture.height,
            mesh.mesh.triangle_count(),
            if mesh.texture.transparent { " (transparent)" } else { "" }
        );
    }
    if !warnings.is_empty() {
        println!("{} warnings", warnings.len());
    }
    Ok(())
}
