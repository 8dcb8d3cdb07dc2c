// Interactive menu
//
// Prompts re-ask until the answer is valid. End of input anywhere ends the
// session the same way as choosing 0.

use std::io::{self, BufRead, Write};

use pokedex_config::DisplaySettings;
use pokedex_matcher::closest;
use pokedex_store::{Source, Store};

use crate::display;
use crate::error::CliError;

const MAIN_PROMPT: &str = "Choose an option (0 - 4):\n\
                           0: quit program\n\
                           1: find pokemon by name\n\
                           2: find pokemon by number\n\
                           3: list pokemon by type\n\
                           4: reload data\n";
const INVALID_CHOICE: &str = "Invalid choice. Please try again.";
const NAME_PROMPT: &str = "Enter the name of a pokemon: ";
const UNRECOGNIZED_TYPE: &str = "Unrecognized type";
const EMPTY_POKEDEX: &str = "The Pokedex is empty. Choose 4 to reload data.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Choice {
    Quit,
    ByName,
    ByNumber,
    ByType,
    Reload,
}

impl Choice {
    fn parse(s: &str) -> Option<Self> {
        match s {
            "0" => Some(Self::Quit),
            "1" => Some(Self::ByName),
            "2" => Some(Self::ByNumber),
            "3" => Some(Self::ByType),
            "4" => Some(Self::Reload),
            _ => None,
        }
    }
}

/// One interactive session over an already-opened store.
pub struct Session<'a, R, W> {
    store: &'a mut Store,
    source: &'a Source,
    display: &'a DisplaySettings,
    input: R,
    out: W,
}

impl<'a, R: BufRead, W: Write> Session<'a, R, W> {
    pub fn new(
        store: &'a mut Store,
        source: &'a Source,
        display: &'a DisplaySettings,
        input: R,
        out: W,
    ) -> Self {
        Self { store, source, display, input, out }
    }

    pub fn run(mut self) -> Result<(), CliError> {
        loop {
            match self.main_choice()? {
                None | Some(Choice::Quit) => {
                    writeln!(self.out, "Goodbye!")?;
                    return Ok(());
                }
                Some(Choice::ByName) => {
                    let names = self.store.all_names()?;
                    if let Some(name) = self.pick_name(&names)? {
                        let pokemon = self.store.find_by_name(&name)?;
                        self.show(&pokemon)?;
                    }
                }
                Some(Choice::ByNumber) => {
                    let ids = self.store.all_species_ids()?;
                    if let Some(id) = self.pick_number(&ids)? {
                        let pokemon = self.store.find_by_species_id(id)?;
                        self.show(&pokemon)?;
                    }
                }
                Some(Choice::ByType) => {
                    let types = self.store.all_types()?;
                    if let Some(t) = self.pick_type(&types)? {
                        let names = self.store.find_by_type(&t)?;
                        display::write_names(&mut self.out, &names, self.display.names_per_line)?;
                    }
                }
                Some(Choice::Reload) => {
                    writeln!(self.out, "(Re-)creating database...")?;
                    // A rejected source leaves the old data in place; keep going
                    match self.store.reload(self.source) {
                        Ok(count) => writeln!(self.out, "Loaded {count} pokemon.")?,
                        Err(e) => {
                            log::warn!("reload failed: {e}");
                            writeln!(self.out, "Reload failed: {e}")?;
                        }
                    }
                }
            }
        }
    }

    fn main_choice(&mut self) -> Result<Option<Choice>, CliError> {
        loop {
            write!(self.out, "{MAIN_PROMPT}")?;
            self.out.flush()?;
            let Some(line) = self.read_line()? else {
                return Ok(None);
            };
            match Choice::parse(&line) {
                Some(choice) => return Ok(Some(choice)),
                None => writeln!(self.out, "{INVALID_CHOICE}")?,
            }
        }
    }

    /// Ask for a name until it is one of `names` (sorted), suggesting the
    /// closest one on a miss.
    fn pick_name(&mut self, names: &[String]) -> Result<Option<String>, CliError> {
        if names.is_empty() {
            writeln!(self.out, "{EMPTY_POKEDEX}")?;
            return Ok(None);
        }
        loop {
            write!(self.out, "{NAME_PROMPT}")?;
            self.out.flush()?;
            let Some(line) = self.read_line()? else {
                return Ok(None);
            };
            let name = line.to_lowercase();
            if names.binary_search(&name).is_ok() {
                return Ok(Some(name));
            }
            let suggestion = closest(&name, names)?;
            writeln!(self.out, "I don't recognize the name {name}. Did you mean {suggestion}?")?;
        }
    }

    fn pick_number(&mut self, ids: &[u32]) -> Result<Option<u32>, CliError> {
        let Some(&max) = ids.last() else {
            writeln!(self.out, "{EMPTY_POKEDEX}")?;
            return Ok(None);
        };
        loop {
            write!(self.out, "Enter a pokemon number (1 - {max}): ")?;
            self.out.flush()?;
            let Some(line) = self.read_line()? else {
                return Ok(None);
            };
            match parse_digits(&line) {
                Some(id) if ids.binary_search(&id).is_ok() => return Ok(Some(id)),
                _ => writeln!(self.out, "Please enter a number between 1 and {max}")?,
            }
        }
    }

    fn pick_type(&mut self, types: &[String]) -> Result<Option<String>, CliError> {
        if types.is_empty() {
            writeln!(self.out, "{EMPTY_POKEDEX}")?;
            return Ok(None);
        }
        loop {
            write!(self.out, "enter a type from one of the following: \n{}\n", types.join(", "))?;
            self.out.flush()?;
            let Some(line) = self.read_line()? else {
                return Ok(None);
            };
            let t = line.to_lowercase();
            if types.binary_search(&t).is_ok() {
                return Ok(Some(t));
            }
            writeln!(self.out, "{UNRECOGNIZED_TYPE}")?;
        }
    }

    fn show(&mut self, pokemon: &pokedex_store::Pokemon) -> io::Result<()> {
        display::write_stats(&mut self.out, pokemon)?;
        display::show_image(&mut self.out, pokemon, self.display)
    }

    fn read_line(&mut self) -> io::Result<Option<String>> {
        let mut buf = String::new();
        if self.input.read_line(&mut buf)? == 0 {
            return Ok(None);
        }
        Ok(Some(buf.trim().to_string()))
    }
}

/// Plain decimal digits only; no sign, no whitespace inside.
fn parse_digits(s: &str) -> Option<u32> {
    if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    s.parse().ok()
}
