//! Interactive commands read from stdin.

use std::fmt;
use std::path::{Path, PathBuf};

use aarrow_core::{default_preset_dir, load_preset, save_preset, ParamStore};
use aarrow_types::{ParamId, TransportInfo};

pub const HELP: &[&str] = &[
    "set <param> <value>   change a parameter (speed prob octaves sync return d trip direction)",
    "tempo <bpm> <beats>   set transport tempo and time signature numerator",
    "tempo off             drop the transport (BPM link falls back to free running)",
    "show                  print all parameters",
    "save <name|path>      write a preset",
    "load <name|path>      read a preset",
    "reset                 release held notes and restart the pattern",
    "help                  this list",
    "quit                  exit",
];

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Set { key: String, value: String },
    Tempo(Option<(f64, u32)>),
    Show,
    Save(String),
    Load(String),
    Reset,
    Help,
    Quit,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandError {
    Unknown(String),
    Usage(&'static str),
}

impl fmt::Display for CommandError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unknown(word) => write!(f, "unknown command '{}' (try 'help')", word),
            Self::Usage(usage) => write!(f, "usage: {}", usage),
        }
    }
}

impl std::error::Error for CommandError {}

/// Parse one input line. Blank lines give `Ok(None)`.
pub fn parse(line: &str) -> Result<Option<Command>, CommandError> {
    let mut words = line.split_whitespace();
    let Some(head) = words.next() else {
        return Ok(None);
    };
    let rest: Vec<&str> = words.collect();

    let command = match (head.to_ascii_lowercase().as_str(), rest.as_slice()) {
        ("set", [key, value]) => Command::Set {
            key: key.to_string(),
            value: value.to_string(),
        },
        ("set", _) => return Err(CommandError::Usage("set <param> <value>")),
        ("tempo", ["off"]) => Command::Tempo(None),
        ("tempo", [bpm, beats]) => match (bpm.parse::<f64>(), beats.parse::<u32>()) {
            (Ok(bpm), Ok(beats)) => Command::Tempo(Some((bpm, beats))),
            _ => return Err(CommandError::Usage("tempo <bpm> <beats> | tempo off")),
        },
        ("tempo", _) => return Err(CommandError::Usage("tempo <bpm> <beats> | tempo off")),
        ("show", []) => Command::Show,
        ("save", [name]) => Command::Save(name.to_string()),
        ("save", _) => return Err(CommandError::Usage("save <name|path>")),
        ("load", [name]) => Command::Load(name.to_string()),
        ("load", _) => return Err(CommandError::Usage("load <name|path>")),
        ("reset", []) => Command::Reset,
        ("help" | "?", _) => Command::Help,
        ("quit" | "exit" | "q", _) => Command::Quit,
        _ => return Err(CommandError::Unknown(head.to_string())),
    };
    Ok(Some(command))
}

/// What the caller should do after a command ran.
#[derive(Debug, PartialEq)]
pub enum Outcome {
    Print(Vec<String>),
    Reset,
    Quit,
}

/// A bare name goes to the preset directory as `<name>.json`; anything
/// that looks like a path is used as given.
pub fn preset_path(name: &str, preset_dir: Option<&Path>) -> PathBuf {
    let path = Path::new(name);
    let bare = path.components().count() == 1 && path.extension().is_none();
    match preset_dir {
        Some(dir) if bare => dir.join(format!("{}.json", name)),
        _ => path.to_path_buf(),
    }
}

pub fn apply(command: Command, store: &mut ParamStore) -> Outcome {
    apply_in(command, store, default_preset_dir().as_deref())
}

fn apply_in(command: Command, store: &mut ParamStore, preset_dir: Option<&Path>) -> Outcome {
    match command {
        Command::Set { key, value } => match store.set_text(&key, &value) {
            Ok(()) => {
                let line = ParamId::from_key(&key)
                    .map(|id| format!("{} = {}", id.descriptor().name, store.params().display(id)))
                    .unwrap_or_default();
                Outcome::Print(vec![line])
            }
            Err(e) => Outcome::Print(vec![e.to_string()]),
        },
        Command::Tempo(value) => {
            let transport = match value {
                Some((bpm, beats)) => TransportInfo::new(bpm, beats),
                None => TransportInfo::default(),
            };
            store.set_transport(transport);
            let line = match transport.usable() {
                Some((bpm, beats)) => format!("transport {} bpm, {} beats per bar", bpm, beats),
                None => "no usable transport; BPM link runs free".to_string(),
            };
            Outcome::Print(vec![line])
        }
        Command::Show => Outcome::Print(store.describe()),
        Command::Save(name) => {
            let path = preset_path(&name, preset_dir);
            let line = match save_preset(&path, store.params()) {
                Ok(()) => format!("saved {}", path.display()),
                Err(e) => format!("could not save {}: {}", path.display(), e),
            };
            Outcome::Print(vec![line])
        }
        Command::Load(name) => {
            let path = preset_path(&name, preset_dir);
            match load_preset(&path) {
                Ok(params) => {
                    store.replace(params);
                    let mut lines = vec![format!("loaded {}", path.display())];
                    lines.extend(store.describe());
                    Outcome::Print(lines)
                }
                Err(e) => Outcome::Print(vec![format!("could not load {}: {}", path.display(), e)]),
            }
        }
        Command::Reset => Outcome::Reset,
        Command::Help => Outcome::Print(HELP.iter().map(|s| s.to_string()).collect()),
        Command::Quit => Outcome::Quit,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use aarrow_types::ArpParams;

    fn store() -> ParamStore {
        ParamStore::new(ArpParams::default(), TransportInfo::default())
    }

    #[test]
    fn parses_commands() {
        assert_eq!(parse("   "), Ok(None));
        assert_eq!(
            parse("set octaves 3"),
            Ok(Some(Command::Set { key: "octaves".into(), value: "3".into() }))
        );
        assert_eq!(parse("TEMPO 128 4"), Ok(Some(Command::Tempo(Some((128.0, 4))))));
        assert_eq!(parse("tempo off"), Ok(Some(Command::Tempo(None))));
        assert_eq!(parse("show"), Ok(Some(Command::Show)));
        assert_eq!(parse("q"), Ok(Some(Command::Quit)));
    }

    #[test]
    fn parse_errors() {
        assert_eq!(parse("set octaves"), Err(CommandError::Usage("set <param> <value>")));
        assert!(matches!(parse("tempo fast 4"), Err(CommandError::Usage(_))));
        assert_eq!(parse("dance"), Err(CommandError::Unknown("dance".into())));
    }

    #[test]
    fn preset_names_resolve_into_preset_dir() {
        let dir = Path::new("/presets");
        assert_eq!(preset_path("bright", Some(dir)), dir.join("bright.json"));
        assert_eq!(preset_path("bright.json", Some(dir)), PathBuf::from("bright.json"));
        assert_eq!(preset_path("a/b", Some(dir)), PathBuf::from("a/b"));
        assert_eq!(preset_path("bright", None), PathBuf::from("bright"));
    }

    #[test]
    fn set_reports_value_or_error() {
        let mut store = store();
        let out = apply_in(
            Command::Set { key: "trip".into(), value: "on".into() },
            &mut store,
            None,
        );
        assert_eq!(out, Outcome::Print(vec!["Trip = on".into()]));
        assert!(store.params().triplet);

        let out = apply_in(
            Command::Set { key: "octaves".into(), value: "many".into() },
            &mut store,
            None,
        );
        assert_eq!(out, Outcome::Print(vec!["'many' is not a valid value for octaves".into()]));
    }

    #[test]
    fn tempo_updates_transport() {
        let mut store = store();
        apply_in(Command::Tempo(Some((90.0, 3))), &mut store, None);
        assert_eq!(store.transport().usable(), Some((90.0, 3)));
        apply_in(Command::Tempo(None), &mut store, None);
        assert_eq!(store.transport().usable(), None);
    }

    #[test]
    fn save_and_load_by_name() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = store();
        store.set_text("direction", "random").unwrap();
        apply_in(Command::Save("mine".into()), &mut store, Some(dir.path()));
        assert!(dir.path().join("mine.json").exists());

        let mut other = ParamStore::new(ArpParams::default(), TransportInfo::default());
        let out = apply_in(Command::Load("mine".into()), &mut other, Some(dir.path()));
        assert!(matches!(out, Outcome::Print(ref lines) if lines[0].starts_with("loaded")));
        assert_eq!(other.params(), store.params());
    }

    #[test]
    fn reset_and_quit_are_passed_up() {
        let mut store = store();
        assert_eq!(apply_in(Command::Reset, &mut store, None), Outcome::Reset);
        assert_eq!(apply_in(Command::Quit, &mut store, None), Outcome::Quit);
    }
}
