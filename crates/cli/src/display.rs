// Rendering of lookup results

use std::io::{self, Write};

use pokedex_config::DisplaySettings;
use pokedex_store::Pokemon;

pub fn write_stats<W: Write>(out: &mut W, p: &Pokemon) -> io::Result<()> {
    writeln!(out, "Pokemon name: {}", p.name)?;
    writeln!(out, "Pokemon number: {}", p.species_id)?;
    writeln!(out, "Height (in m): {:?}", p.height)?;
    writeln!(out, "Weight (in kg): {:?}", p.weight)?;
    writeln!(out, "Type 1: {}", p.type_1)?;
    writeln!(out, "Type 2: {}", p.type_2)?;
    writeln!(out, "Generation: {}", p.generation_id)?;
    writeln!(out, "Evolves from: {}", p.evolves_from.as_deref().unwrap_or(""))
}

/// Names joined with ", ", `per_line` to a line, followed by a blank line.
pub fn write_names<W: Write>(out: &mut W, names: &[String], per_line: usize) -> io::Result<()> {
    for chunk in names.chunks(per_line.max(1)) {
        writeln!(out, "{}", chunk.join(", "))?;
    }
    writeln!(out)
}

/// Open the Pokemon's image in the system viewer when images are enabled.
///
/// Only `.png` references are considered images.
pub fn show_image<W: Write>(out: &mut W, p: &Pokemon, settings: &DisplaySettings) -> io::Result<()> {
    if !settings.show_images {
        return Ok(());
    }

    match p.image.as_deref() {
        Some(image) if image.ends_with(".png") => {
            let path = settings.images_dir.join(image);
            if !path.exists() {
                return writeln!(out, "Image {} not found", path.display());
            }
            if let Err(e) = open::that(&path) {
                log::warn!("cannot open {}: {e}", path.display());
                writeln!(out, "Could not open image {}", path.display())?;
            }
            Ok(())
        }
        _ => writeln!(out, "No image for this Pokemon available"),
    }
}
