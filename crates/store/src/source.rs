// CSV source parsing
//
// Columns are resolved by header name, so column order in the file does not
// matter and extra columns are ignored.

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::error::{SourceError, StoreError};
use crate::record::Pokemon;

pub const COL_NAME: &str = "pokemon";
pub const COL_SPECIES_ID: &str = "species_id";
pub const COL_HEIGHT: &str = "height";
pub const COL_WEIGHT: &str = "weight";
pub const COL_TYPE_1: &str = "type_1";
pub const COL_TYPE_2: &str = "type_2";
pub const COL_IMAGE: &str = "url_image";
pub const COL_GENERATION: &str = "generation_id";
pub const COL_EVOLVES_FROM: &str = "evolves_from_species_id";

pub const REQUIRED_COLUMNS: [&str; 9] = [
    COL_NAME,
    COL_SPECIES_ID,
    COL_HEIGHT,
    COL_WEIGHT,
    COL_TYPE_1,
    COL_TYPE_2,
    COL_IMAGE,
    COL_GENERATION,
    COL_EVOLVES_FROM,
];

/// A CSV file to build the index from.
#[derive(Debug, Clone)]
pub struct Source {
    path: PathBuf,
    /// `None` sniffs the delimiter from the first lines.
    delimiter: Option<u8>,
}

/// Parsed contents of a [`Source`].
#[derive(Debug, Clone)]
pub struct SourceData {
    pub records: Vec<Pokemon>,
    /// BLAKE3 hex digest of the raw file bytes.
    pub fingerprint: String,
}

impl Source {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into(), delimiter: None }
    }

    pub fn with_delimiter(mut self, delimiter: u8) -> Self {
        self.delimiter = Some(delimiter);
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read and parse the whole file. Nothing is returned unless every row
    /// parses.
    pub fn read(&self) -> Result<SourceData, StoreError> {
        let bytes = self.read_bytes()?;
        let fingerprint = blake3::hash(&bytes).to_hex().to_string();
        let content = decode_utf8(bytes);
        let delimiter = self.delimiter.unwrap_or_else(|| sniff_delimiter(&content));
        let records = import_from_string(&content, delimiter)?;
        Ok(SourceData { records, fingerprint })
    }

    /// BLAKE3 hex digest of the file as it is on disk now.
    pub fn fingerprint(&self) -> Result<String, StoreError> {
        let bytes = self.read_bytes()?;
        Ok(blake3::hash(&bytes).to_hex().to_string())
    }

    fn read_bytes(&self) -> Result<Vec<u8>, StoreError> {
        std::fs::read(&self.path)
            .map_err(|e| StoreError::Io(format!("{}: {e}", self.path.display())))
    }
}

/// Convert to UTF-8, falling back to Windows-1252 (common for Excel-exported CSVs)
fn decode_utf8(bytes: Vec<u8>) -> String {
    match String::from_utf8(bytes) {
        Ok(s) => s,
        Err(e) => {
            let bytes = e.into_bytes();
            let (decoded, _, _) = encoding_rs::WINDOWS_1252.decode(&bytes);
            decoded.into_owned()
        }
    }
}

/// Detect the most likely field delimiter by checking consistency across the first few lines.
///
/// For each candidate (tab, semicolon, comma, pipe), count fields per line. The delimiter
/// that produces the most consistent field count (>1 field) wins.
pub fn sniff_delimiter(content: &str) -> u8 {
    let candidates: &[u8] = &[b'\t', b';', b',', b'|'];
    let sample_lines: Vec<&str> = content.lines().take(10).collect();

    if sample_lines.is_empty() {
        return b',';
    }

    let mut best = b',';
    let mut best_score = 0u64;

    for &delim in candidates {
        let counts: Vec<usize> = sample_lines
            .iter()
            .map(|line| {
                csv::ReaderBuilder::new()
                    .delimiter(delim)
                    .has_headers(false)
                    .flexible(true)
                    .from_reader(line.as_bytes())
                    .records()
                    .next()
                    .and_then(|r| r.ok())
                    .map(|r| r.len())
                    .unwrap_or(1)
            })
            .collect();

        if counts.first().copied().unwrap_or(0) <= 1 {
            continue;
        }

        // Equal scores keep the earlier candidate
        let target = counts[0];
        let consistent = counts.iter().filter(|&&c| c == target).count() as u64;
        let score = consistent * target as u64;

        if score > best_score {
            best_score = score;
            best = delim;
        }
    }

    best
}

/// Header name -> field position, built once per load.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnMap {
    name: usize,
    species_id: usize,
    height: usize,
    weight: usize,
    type_1: usize,
    type_2: usize,
    image: usize,
    generation_id: usize,
    evolves_from: usize,
}

impl ColumnMap {
    pub fn from_header(header: &csv::StringRecord) -> Result<Self, SourceError> {
        let mut positions: HashMap<String, usize> = HashMap::new();
        for (idx, name) in header.iter().enumerate() {
            // First occurrence wins on repeated header names
            positions.entry(normalize(name)).or_insert(idx);
        }

        let find = |column: &str| {
            positions
                .get(column)
                .copied()
                .ok_or_else(|| SourceError::MissingColumn(column.to_string()))
        };

        Ok(Self {
            name: find(COL_NAME)?,
            species_id: find(COL_SPECIES_ID)?,
            height: find(COL_HEIGHT)?,
            weight: find(COL_WEIGHT)?,
            type_1: find(COL_TYPE_1)?,
            type_2: find(COL_TYPE_2)?,
            image: find(COL_IMAGE)?,
            generation_id: find(COL_GENERATION)?,
            evolves_from: find(COL_EVOLVES_FROM)?,
        })
    }

    fn parse_row(&self, row: &csv::StringRecord, line: u64) -> Result<Pokemon, SourceError> {
        let text = |idx: usize, column: &str| -> Result<String, SourceError> {
            row.get(idx)
                .map(normalize)
                .ok_or_else(|| SourceError::MissingField { line, column: column.to_string() })
        };
        let required = |idx: usize, column: &str| -> Result<String, SourceError> {
            let value = text(idx, column)?;
            if value.is_empty() {
                return Err(SourceError::EmptyValue { line, column: column.to_string() });
            }
            Ok(value)
        };
        let optional = |idx: usize, column: &str| -> Result<Option<String>, SourceError> {
            text(idx, column).map(|v| if v.is_empty() { None } else { Some(v) })
        };

        let species_id: u32 = parse_number(&text(self.species_id, COL_SPECIES_ID)?, line, COL_SPECIES_ID)?;
        if species_id == 0 {
            return Err(SourceError::NonPositiveId { line, value: species_id });
        }

        let height: f64 = parse_number(&text(self.height, COL_HEIGHT)?, line, COL_HEIGHT)?;
        let weight: f64 = parse_number(&text(self.weight, COL_WEIGHT)?, line, COL_WEIGHT)?;
        for (value, column) in [(height, COL_HEIGHT), (weight, COL_WEIGHT)] {
            if !value.is_finite() {
                return Err(SourceError::InvalidNumber {
                    line,
                    column: column.to_string(),
                    value: value.to_string(),
                });
            }
        }

        Ok(Pokemon {
            name: required(self.name, COL_NAME)?,
            species_id,
            height,
            weight,
            type_1: required(self.type_1, COL_TYPE_1)?,
            type_2: text(self.type_2, COL_TYPE_2)?,
            image: optional(self.image, COL_IMAGE)?,
            generation_id: parse_number(&text(self.generation_id, COL_GENERATION)?, line, COL_GENERATION)?,
            evolves_from: optional(self.evolves_from, COL_EVOLVES_FROM)?,
        })
    }
}

fn normalize(value: &str) -> String {
    value.trim().to_lowercase()
}

fn parse_number<T: FromStr>(value: &str, line: u64, column: &str) -> Result<T, SourceError> {
    value.parse().map_err(|_| SourceError::InvalidNumber {
        line,
        column: column.to_string(),
        value: value.to_string(),
    })
}

/// Parse CSV text into records.
///
/// Fails on the first bad row rather than skipping it, and rejects duplicate
/// names or species ids.
pub fn import_from_string(content: &str, delimiter: u8) -> Result<Vec<Pokemon>, SourceError> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(true)
        .flexible(true)
        .from_reader(content.as_bytes());

    let header = reader.headers().map_err(|e| SourceError::Csv(e.to_string()))?;
    let columns = ColumnMap::from_header(header)?;

    let mut records = Vec::new();
    let mut names = HashSet::new();
    let mut ids = HashSet::new();

    for (row_idx, result) in reader.records().enumerate() {
        let row = result.map_err(|e| SourceError::Csv(e.to_string()))?;
        // Header is line 1
        let line = row.position().map(|p| p.line()).unwrap_or(row_idx as u64 + 2);

        let pokemon = columns.parse_row(&row, line)?;
        if !names.insert(pokemon.name.clone()) {
            return Err(SourceError::DuplicateName { line, name: pokemon.name });
        }
        if !ids.insert(pokemon.species_id) {
            return Err(SourceError::DuplicateSpeciesId { line, id: pokemon.species_id });
        }
        records.push(pokemon);
    }

    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;

    const HEADER: &str = "pokemon,species_id,height,weight,type_1,type_2,url_image,generation_id,evolves_from_species_id";

    fn csv(rows: &[&str]) -> String {
        let mut s = String::from(HEADER);
        for row in rows {
            s.push('\n');
            s.push_str(row);
        }
        s.push('\n');
        s
    }

    #[test]
    fn parses_rows() {
        let content = csv(&[
            "Bulbasaur,1,0.7,6.9,Grass,Poison,1.png,1,",
            "Ivysaur,2,1,13,grass,poison,2.png,1,1",
        ]);
        let records = import_from_string(&content, b',').unwrap();
        assert_eq!(records.len(), 2);

        let ivysaur = &records[1];
        assert_eq!(ivysaur.name, "ivysaur");
        assert_eq!(ivysaur.species_id, 2);
        assert_eq!(ivysaur.height, 1.0);
        assert_eq!(ivysaur.weight, 13.0);
        assert_eq!(ivysaur.image.as_deref(), Some("2.png"));
        assert_eq!(ivysaur.generation_id, 1);
        assert_eq!(ivysaur.evolves_from.as_deref(), Some("1"));

        assert_eq!(records[0].evolves_from, None);
    }

    #[test]
    fn lowercases_text_fields() {
        let content = csv(&["Mr. Mime,122,1.3,54.5,PSYCHIC,Fairy,MrMime.PNG,1,NaN"]);
        let p = &import_from_string(&content, b',').unwrap()[0];
        assert_eq!(p.name, "mr. mime");
        assert_eq!(p.type_1, "psychic");
        assert_eq!(p.type_2, "fairy");
        assert_eq!(p.image.as_deref(), Some("mrmime.png"));
        assert_eq!(p.evolves_from.as_deref(), Some("nan"));
    }

    #[test]
    fn header_order_does_not_matter() {
        let content = "\
type_2,evolves_from_species_id,pokemon,url_image,weight,type_1,generation_id,height,species_id,extra
,,Pikachu,25.png,6,electric,1,0.4,25,ignored
";
        let p = &import_from_string(content, b',').unwrap()[0];
        assert_eq!(p.name, "pikachu");
        assert_eq!(p.species_id, 25);
        assert_eq!(p.height, 0.4);
        assert_eq!(p.weight, 6.0);
        assert_eq!(p.type_1, "electric");
        assert_eq!(p.type_2, "");
    }

    #[test]
    fn header_names_are_trimmed_and_case_insensitive() {
        let content = "\
Pokemon, Species_ID ,height,weight,type_1,type_2,url_image,generation_id,evolves_from_species_id
mew,151,0.4,4,psychic,,151.png,1,
";
        let p = &import_from_string(content, b',').unwrap()[0];
        assert_eq!(p.species_id, 151);
    }

    #[test]
    fn missing_column_is_rejected() {
        let content = "\
pokemon,height,weight,type_1,type_2,url_image,generation_id,evolves_from_species_id
pikachu,0.4,6,electric,,25.png,1,
";
        assert_eq!(
            import_from_string(content, b','),
            Err(SourceError::MissingColumn("species_id".into()))
        );
    }

    #[test]
    fn empty_input_is_missing_columns() {
        assert_eq!(
            import_from_string("", b','),
            Err(SourceError::MissingColumn("pokemon".into()))
        );
    }

    #[test]
    fn non_numeric_value_fails_whole_import() {
        let content = csv(&[
            "bulbasaur,1,0.7,6.9,grass,poison,1.png,1,",
            "ivysaur,two,1,13,grass,poison,2.png,1,1",
        ]);
        assert_eq!(
            import_from_string(&content, b','),
            Err(SourceError::InvalidNumber {
                line: 3,
                column: "species_id".into(),
                value: "two".into(),
            })
        );
    }

    #[test]
    fn non_finite_magnitude_is_rejected() {
        let content = csv(&["missingno,1,inf,6.9,normal,,,1,"]);
        assert!(matches!(
            import_from_string(&content, b','),
            Err(SourceError::InvalidNumber { column, .. }) if column == "height"
        ));
    }

    #[test]
    fn zero_species_id_is_rejected() {
        let content = csv(&["missingno,0,1,1,normal,,,1,"]);
        assert_eq!(
            import_from_string(&content, b','),
            Err(SourceError::NonPositiveId { line: 2, value: 0 })
        );
    }

    #[test]
    fn duplicate_name_differing_only_in_case_is_rejected() {
        let content = csv(&[
            "Pikachu,25,0.4,6,electric,,25.png,1,",
            "pikachu,26,0.8,30,electric,,26.png,1,25",
        ]);
        assert_eq!(
            import_from_string(&content, b','),
            Err(SourceError::DuplicateName { line: 3, name: "pikachu".into() })
        );
    }

    #[test]
    fn duplicate_species_id_is_rejected() {
        let content = csv(&[
            "pikachu,25,0.4,6,electric,,25.png,1,",
            "raichu,25,0.8,30,electric,,26.png,1,25",
        ]);
        assert_eq!(
            import_from_string(&content, b','),
            Err(SourceError::DuplicateSpeciesId { line: 3, id: 25 })
        );
    }

    #[test]
    fn short_row_is_rejected() {
        let content = csv(&["pikachu,25,0.4"]);
        assert!(matches!(
            import_from_string(&content, b','),
            Err(SourceError::MissingField { line: 2, .. })
        ));
    }

    #[test]
    fn empty_name_is_rejected() {
        let content = csv(&[",25,0.4,6,electric,,25.png,1,"]);
        assert_eq!(
            import_from_string(&content, b','),
            Err(SourceError::EmptyValue { line: 2, column: "pokemon".into() })
        );
    }

    #[test]
    fn blank_lines_are_skipped() {
        let content = csv(&["pikachu,25,0.4,6,electric,,25.png,1,", "", "raichu,26,0.8,30,electric,,26.png,1,25"]);
        assert_eq!(import_from_string(&content, b',').unwrap().len(), 2);
    }

    #[test]
    fn delimiter_only_row_fails_the_load() {
        let content = csv(&["pikachu,25,0.4,6,electric,,25.png,1,", ",,,,,,,,", "raichu,26,0.8,30,electric,,26.png,1,25"]);
        assert_eq!(
            import_from_string(&content, b','),
            Err(SourceError::InvalidNumber { line: 3, column: "species_id".into(), value: String::new() })
        );
    }

    #[test]
    fn header_only_source_is_empty() {
        assert!(import_from_string(HEADER, b',').unwrap().is_empty());
    }

    #[test]
    fn sniffs_delimiters() {
        assert_eq!(sniff_delimiter("a,b,c\n1,2,3\n"), b',');
        assert_eq!(sniff_delimiter("a\tb\tc\n1\t2\t3\n"), b'\t');
        assert_eq!(sniff_delimiter("a;b;c\n1;2;3\n"), b';');
        assert_eq!(sniff_delimiter(""), b',');
    }

    #[test]
    fn decodes_windows_1252() {
        // "flabébé" with é as 0xE9
        let bytes = b"flab\xe9b\xe9".to_vec();
        assert_eq!(decode_utf8(bytes), "flabébé");
    }
}
