use serde::Serialize;

/// One Pokedex entry.
///
/// All text is lowercase. `type_2` is the empty string when the Pokemon has
/// a single type.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Pokemon {
    pub name: String,
    pub species_id: u32,
    /// Metres.
    pub height: f64,
    /// Kilograms.
    pub weight: f64,
    pub type_1: String,
    pub type_2: String,
    /// Image file name, relative to the images directory.
    pub image: Option<String>,
    pub generation_id: i64,
    /// Species number of the pre-evolution, kept as the raw source text.
    pub evolves_from: Option<String>,
}
