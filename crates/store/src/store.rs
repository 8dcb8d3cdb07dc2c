use std::collections::BTreeSet;
use std::path::Path;

use chrono::Utc;
use rusqlite::{Connection, OptionalExtension, Row};

use crate::error::{Lookup, StoreError};
use crate::index::{self, IndexInfo, SELECT_COLUMNS, TABLE};
use crate::record::Pokemon;
use crate::source::Source;
use crate::{Result, SCHEMA_VERSION};

/// The Pokedex: a SQLite index over one CSV source.
///
/// Read-only between loads. `load` and `reload` replace the whole dataset in
/// one transaction, so a failed load leaves the previous data in place.
pub struct Store {
    conn: Connection,
}

impl Store {
    /// Open (or create) the index file at `path`. Does not load anything.
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)?;
        log::debug!("opened index {}", path.display());
        Ok(Self { conn })
    }

    pub fn open_in_memory() -> Result<Self> {
        Ok(Self { conn: Connection::open_in_memory()? })
    }

    /// Parse `source` and replace the indexed dataset with it.
    ///
    /// The file is parsed completely before the index is touched. Returns the
    /// number of records loaded.
    pub fn load(&mut self, source: &Source) -> Result<usize> {
        let data = source.read()?;
        let info = IndexInfo {
            source: source.path().display().to_string(),
            record_count: data.records.len(),
            loaded_at: Utc::now(),
            fingerprint: data.fingerprint,
        };

        let tx = self.conn.transaction()?;
        index::rebuild(&tx, &data.records, &info)?;
        tx.commit()?;

        log::info!("loaded {} pokemon from {}", info.record_count, info.source);
        Ok(info.record_count)
    }

    /// Same as [`Store::load`]: always a full replace, never a merge.
    pub fn reload(&mut self, source: &Source) -> Result<usize> {
        log::info!("rebuilding index from {}", source.path().display());
        self.load(source)
    }

    /// Load `source` only if the index holds nothing usable yet.
    /// Returns whether a load happened.
    pub fn ensure_loaded(&mut self, source: &Source) -> Result<bool> {
        if self.exists()? {
            return Ok(false);
        }
        self.load(source)?;
        Ok(true)
    }

    /// Whether the index was built by this schema version and holds at least
    /// one record.
    pub fn exists(&self) -> Result<bool> {
        if !self.has_table()? {
            return Ok(false);
        }
        if index::schema_version(&self.conn)? != Some(SCHEMA_VERSION) {
            return Ok(false);
        }
        let non_empty = self
            .conn
            .query_row("SELECT EXISTS(SELECT 1 FROM pokemon)", [], |row| row.get(0))?;
        Ok(non_empty)
    }

    pub fn info(&self) -> Result<Option<IndexInfo>> {
        index::read_info(&self.conn)
    }

    /// Whether `source` changed on disk since the index was built from it.
    /// An index that was never built is stale.
    pub fn is_stale(&self, source: &Source) -> Result<bool> {
        match self.info()? {
            Some(info) => Ok(info.fingerprint != source.fingerprint()?),
            None => Ok(true),
        }
    }

    pub fn all_names(&self) -> Result<Vec<String>> {
        self.column("SELECT name FROM pokemon", [])
    }

    pub fn all_species_ids(&self) -> Result<Vec<u32>> {
        self.column("SELECT species_id FROM pokemon", [])
    }

    /// Every type appearing in either type column. The empty second type of
    /// single-typed Pokemon is not a type.
    pub fn all_types(&self) -> Result<Vec<String>> {
        self.column(
            "SELECT type_1 FROM pokemon WHERE type_1 != '' \
             UNION ALL SELECT type_2 FROM pokemon WHERE type_2 != ''",
            [],
        )
    }

    pub fn find_by_name(&self, name: &str) -> Result<Pokemon> {
        let name = name.trim().to_lowercase();
        self.find_one("name", &name)?
            .ok_or(StoreError::NotFound(Lookup::Name(name)))
    }

    pub fn find_by_species_id(&self, id: u32) -> Result<Pokemon> {
        self.find_one("species_id", &id)?
            .ok_or(StoreError::NotFound(Lookup::SpeciesId(id)))
    }

    /// Names of every Pokemon whose first or second type is `pokemon_type`.
    pub fn find_by_type(&self, pokemon_type: &str) -> Result<Vec<String>> {
        let pokemon_type = pokemon_type.trim().to_lowercase();
        let names: Vec<String> = if pokemon_type.is_empty() {
            Vec::new()
        } else {
            self.column(
                "SELECT name FROM pokemon WHERE type_1 = ?1 OR type_2 = ?1",
                [&pokemon_type],
            )?
        };

        if names.is_empty() {
            log::debug!("no pokemon of type '{pokemon_type}'");
            return Err(StoreError::NotFound(Lookup::Type(pokemon_type)));
        }
        Ok(names)
    }

    fn has_table(&self) -> Result<bool> {
        index::table_exists(&self.conn, TABLE)
    }

    /// Run a single-column query, returning unique values in ascending order.
    /// An index that was never loaded reads as empty.
    fn column<T, P>(&self, sql: &str, params: P) -> Result<Vec<T>>
    where
        T: rusqlite::types::FromSql + Ord,
        P: rusqlite::Params,
    {
        if !self.has_table()? {
            return Ok(Vec::new());
        }
        let mut stmt = self.conn.prepare(sql)?;
        let values = stmt
            .query_map(params, |row| row.get::<_, T>(0))?
            .collect::<rusqlite::Result<Vec<T>>>()?;
        Ok(unique_sorted(values))
    }

    fn find_one(&self, column: &str, value: &dyn rusqlite::ToSql) -> Result<Option<Pokemon>> {
        if !self.has_table()? {
            return Ok(None);
        }
        let sql = format!("SELECT {SELECT_COLUMNS} FROM pokemon WHERE {column} = ?1");
        let found = self.conn.query_row(&sql, [value], pokemon_from_row).optional()?;
        if found.is_none() {
            log::debug!("lookup miss on {column}");
        }
        Ok(found)
    }
}

fn pokemon_from_row(row: &Row<'_>) -> rusqlite::Result<Pokemon> {
    Ok(Pokemon {
        name: row.get(0)?,
        species_id: row.get(1)?,
        height: row.get(2)?,
        weight: row.get(3)?,
        type_1: row.get(4)?,
        type_2: row.get(5)?,
        image: row.get(6)?,
        generation_id: row.get(7)?,
        evolves_from: row.get(8)?,
    })
}

/// Deduplicate and sort ascending by the element's natural order.
pub fn unique_sorted<T: Ord>(items: impl IntoIterator<Item = T>) -> Vec<T> {
    items.into_iter().collect::<BTreeSet<T>>().into_iter().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SourceError;
    use std::fs;
    use tempfile::TempDir;

    const HEADER: &str = "pokemon,species_id,height,weight,type_1,type_2,url_image,generation_id,evolves_from_species_id";

    const KANTO: &[&str] = &[
        "Bulbasaur,1,0.7,6.9,grass,poison,1.png,1,",
        "Charmander,4,0.6,8.5,fire,,4.png,1,",
        "Squirtle,7,0.5,9,water,,7.png,1,",
        "Pikachu,25,0.4,6,electric,,25.png,1,172",
        "Raichu,26,0.8,30,electric,,26.png,1,25",
        "Oddish,43,0.5,5.4,grass,poison,43.png,1,",
    ];

    fn write_source(dir: &TempDir, file: &str, rows: &[&str]) -> Source {
        let mut content = String::from(HEADER);
        for row in rows {
            content.push('\n');
            content.push_str(row);
        }
        content.push('\n');
        let path = dir.path().join(file);
        fs::write(&path, content).unwrap();
        Source::new(path).with_delimiter(b',')
    }

    fn loaded(rows: &[&str]) -> (TempDir, Store) {
        let dir = TempDir::new().unwrap();
        let source = write_source(&dir, "pokemon.csv", rows);
        let mut store = Store::open_in_memory().unwrap();
        store.load(&source).unwrap();
        (dir, store)
    }

    #[test]
    fn load_reports_record_count() {
        let dir = TempDir::new().unwrap();
        let source = write_source(&dir, "pokemon.csv", KANTO);
        let mut store = Store::open_in_memory().unwrap();
        assert_eq!(store.load(&source).unwrap(), 6);
    }

    #[test]
    fn fresh_store_does_not_exist() {
        let store = Store::open_in_memory().unwrap();
        assert!(!store.exists().unwrap());
        assert!(store.all_names().unwrap().is_empty());
        assert!(store.info().unwrap().is_none());
        assert!(store.find_by_name("pikachu").unwrap_err().is_not_found());
    }

    #[test]
    fn loaded_store_exists() {
        let (_dir, store) = loaded(KANTO);
        assert!(store.exists().unwrap());
    }

    #[test]
    fn header_only_source_loads_but_does_not_exist() {
        let (_dir, store) = loaded(&[]);
        assert!(!store.exists().unwrap());
        assert!(store.all_names().unwrap().is_empty());
    }

    #[test]
    fn names_are_sorted_and_lowercase() {
        let (_dir, store) = loaded(KANTO);
        assert_eq!(
            store.all_names().unwrap(),
            vec!["bulbasaur", "charmander", "oddish", "pikachu", "raichu", "squirtle"]
        );
    }

    #[test]
    fn species_ids_sort_numerically() {
        let (_dir, store) = loaded(KANTO);
        assert_eq!(store.all_species_ids().unwrap(), vec![1, 4, 7, 25, 26, 43]);
    }

    #[test]
    fn types_are_unique_sorted_and_skip_empty() {
        let (_dir, store) = loaded(&[
            "Bulbasaur,1,0.7,6.9,grass,poison,1.png,1,",
            "Oddish,43,0.5,5.4,grass,poison,43.png,1,",
            "Charmander,4,0.6,8.5,fire,,4.png,1,",
        ]);
        assert_eq!(store.all_types().unwrap(), vec!["fire", "grass", "poison"]);
    }

    #[test]
    fn find_by_name_normalizes_query() {
        let (_dir, store) = loaded(KANTO);
        let pikachu = store.find_by_name("pikachu").unwrap();
        assert_eq!(pikachu.name, "pikachu");
        assert_eq!(pikachu.species_id, 25);
        assert_eq!(pikachu.evolves_from.as_deref(), Some("172"));
        assert_eq!(store.find_by_name("  PIKACHU ").unwrap(), pikachu);
    }

    #[test]
    fn find_by_name_returns_full_record() {
        let (_dir, store) = loaded(KANTO);
        let expected = Pokemon {
            name: "bulbasaur".into(),
            species_id: 1,
            height: 0.7,
            weight: 6.9,
            type_1: "grass".into(),
            type_2: "poison".into(),
            image: Some("1.png".into()),
            generation_id: 1,
            evolves_from: None,
        };
        assert_eq!(store.find_by_name("bulbasaur").unwrap(), expected);
    }

    #[test]
    fn find_by_name_miss() {
        let (_dir, store) = loaded(KANTO);
        match store.find_by_name("pikachi") {
            Err(StoreError::NotFound(Lookup::Name(name))) => assert_eq!(name, "pikachi"),
            other => panic!("expected NotFound, got {other:?}"),
        }
    }

    #[test]
    fn find_by_species_id() {
        let (_dir, store) = loaded(KANTO);
        assert_eq!(store.find_by_species_id(7).unwrap().name, "squirtle");
        match store.find_by_species_id(999) {
            Err(StoreError::NotFound(Lookup::SpeciesId(999))) => {}
            other => panic!("expected NotFound, got {other:?}"),
        }
    }

    #[test]
    fn find_by_type_matches_either_column_once() {
        let (_dir, store) = loaded(&[
            "Bulbasaur,1,0.7,6.9,grass,poison,1.png,1,",
            "Ekans,23,2,6.9,poison,,23.png,1,",
            "Oddish,43,0.5,5.4,grass,poison,43.png,1,",
            "Weird,900,1,1,poison,poison,,9,",
        ]);
        assert_eq!(
            store.find_by_type("poison").unwrap(),
            vec!["bulbasaur", "ekans", "oddish", "weird"]
        );
        assert_eq!(store.find_by_type("Grass").unwrap(), vec!["bulbasaur", "oddish"]);
    }

    #[test]
    fn find_by_type_miss_and_empty_type() {
        let (_dir, store) = loaded(KANTO);
        assert!(matches!(
            store.find_by_type("dragon"),
            Err(StoreError::NotFound(Lookup::Type(t))) if t == "dragon"
        ));
        // Single-typed rows store '' in type_2; that is not a type
        assert!(store.find_by_type("").unwrap_err().is_not_found());
    }

    #[test]
    fn reload_replaces_instead_of_merging() {
        let dir = TempDir::new().unwrap();
        let full = write_source(&dir, "full.csv", KANTO);
        let subset = write_source(&dir, "subset.csv", &KANTO[3..5]);

        let mut store = Store::open_in_memory().unwrap();
        store.load(&full).unwrap();
        store.reload(&subset).unwrap();

        assert_eq!(store.all_names().unwrap(), vec!["pikachu", "raichu"]);
        assert_eq!(store.all_types().unwrap(), vec!["electric"]);
        assert!(store.find_by_name("bulbasaur").unwrap_err().is_not_found());
    }

    #[test]
    fn failed_reload_keeps_previous_dataset() {
        let dir = TempDir::new().unwrap();
        let good = write_source(&dir, "good.csv", KANTO);

        let bad_path = dir.path().join("bad.csv");
        fs::write(
            &bad_path,
            "pokemon,height,weight,type_1,type_2,url_image,generation_id,evolves_from_species_id\n\
             mew,0.4,4,psychic,,151.png,1,\n",
        )
        .unwrap();
        let bad = Source::new(&bad_path).with_delimiter(b',');

        let mut store = Store::open_in_memory().unwrap();
        store.load(&good).unwrap();
        let before = store.info().unwrap();

        match store.reload(&bad) {
            Err(StoreError::MalformedSource(SourceError::MissingColumn(col))) => {
                assert_eq!(col, "species_id")
            }
            other => panic!("expected MalformedSource, got {other:?}"),
        }

        assert_eq!(store.all_names().unwrap().len(), 6);
        assert_eq!(store.info().unwrap(), before);
    }

    #[test]
    fn bad_number_in_late_row_keeps_previous_dataset() {
        let dir = TempDir::new().unwrap();
        let good = write_source(&dir, "good.csv", KANTO);
        let bad = write_source(
            &dir,
            "bad.csv",
            &["Mew,151,0.4,4,psychic,,151.png,1,", "Mewtwo,150,2.0,heavy,psychic,,150.png,1,"],
        );

        let mut store = Store::open_in_memory().unwrap();
        store.load(&good).unwrap();
        assert!(matches!(
            store.reload(&bad),
            Err(StoreError::MalformedSource(SourceError::InvalidNumber { .. }))
        ));
        assert!(store.find_by_name("mew").unwrap_err().is_not_found());
        assert_eq!(store.find_by_name("pikachu").unwrap().species_id, 25);
    }

    #[test]
    fn missing_file_is_io_error() {
        let dir = TempDir::new().unwrap();
        let mut store = Store::open_in_memory().unwrap();
        let source = Source::new(dir.path().join("nope.csv"));
        assert!(matches!(store.load(&source), Err(StoreError::Io(_))));
        assert!(!store.exists().unwrap());
    }

    #[test]
    fn ensure_loaded_only_loads_once() {
        let dir = TempDir::new().unwrap();
        let source = write_source(&dir, "pokemon.csv", KANTO);
        let mut store = Store::open_in_memory().unwrap();

        assert!(store.ensure_loaded(&source).unwrap());
        assert!(!store.ensure_loaded(&source).unwrap());
    }

    #[test]
    fn info_and_staleness_track_the_source() {
        let dir = TempDir::new().unwrap();
        let source = write_source(&dir, "pokemon.csv", KANTO);
        let mut store = Store::open_in_memory().unwrap();
        assert!(store.is_stale(&source).unwrap());

        store.load(&source).unwrap();
        let info = store.info().unwrap().unwrap();
        assert_eq!(info.record_count, 6);
        assert_eq!(info.source, source.path().display().to_string());
        assert!(!store.is_stale(&source).unwrap());

        write_source(&dir, "pokemon.csv", &KANTO[..2]);
        assert!(store.is_stale(&source).unwrap());
    }

    #[test]
    fn sniffed_semicolon_source() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("pokemon.csv");
        fs::write(
            &path,
            "pokemon;species_id;height;weight;type_1;type_2;url_image;generation_id;evolves_from_species_id\n\
             Eevee;133;0.3;6.5;normal;;133.png;1;\n",
        )
        .unwrap();

        let mut store = Store::open_in_memory().unwrap();
        store.load(&Source::new(&path)).unwrap();
        assert_eq!(store.find_by_species_id(133).unwrap().name, "eevee");
    }

    #[test]
    fn unique_sorted_dedups() {
        assert_eq!(unique_sorted(vec![3, 1, 3, 2, 1]), vec![1, 2, 3]);
        assert_eq!(unique_sorted(vec!["b", "a", "b"]), vec!["a", "b"]);
        assert!(unique_sorted(Vec::<u32>::new()).is_empty());
    }
}
