//! Prog library
//!
//! Tracks which `.prog` file defines which named prog and keeps the compiled
//! programs in a [`ProgCache`]. A file that fails to recompile keeps serving
//! its last good program.

use crate::progfile::ProgFile;
use mud_core::{CharacterId, ItemId, LocationId, MudError, Result};
use mud_prog::{CompileError, ProgCache, ProgError, ProgType, Value, World};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

pub const PROG_EXTENSION: &str = "prog";

/// Outcome of loading a directory
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoadSummary {
    pub loaded: usize,
    pub failed: usize,
}

pub struct ProgLibrary {
    cache: ProgCache,
    files: HashMap<PathBuf, String>,
    log_compile: bool,
}

impl ProgLibrary {
    pub fn new(cache: ProgCache, log_compile: bool) -> Self {
        Self {
            cache,
            files: HashMap::new(),
            log_compile,
        }
    }

    pub fn cache(&self) -> &ProgCache {
        &self.cache
    }

    /// Compile every `.prog` file in a directory, logging failures
    pub fn load_dir(&mut self, dir: &Path) -> Result<LoadSummary> {
        let mut paths: Vec<PathBuf> = std::fs::read_dir(dir)?
            .filter_map(|entry| entry.ok().map(|entry| entry.path()))
            .filter(|path| is_prog_file(path))
            .collect();
        paths.sort();

        let mut summary = LoadSummary::default();
        for path in paths {
            match self.load_file(&path) {
                Ok(_) => summary.loaded += 1,
                Err(err) => {
                    tracing::warn!("{}: {}", path.display(), err);
                    summary.failed += 1;
                }
            }
        }

        tracing::info!(
            "Loaded {} progs from {} ({} failed)",
            summary.loaded,
            dir.display(),
            summary.failed
        );
        Ok(summary)
    }

    /// Compile one file and bind it under its prog name
    ///
    /// Compile errors are reported against file lines, header included. A
    /// name already defined by another file is rejected. When a file's
    /// `#name` changes, its old name is dropped.
    pub fn load_file(&mut self, path: &Path) -> std::result::Result<String, ProgError> {
        let file = ProgFile::load(path)?;

        if let Some(owner) = self.owner_of(&file.name, path) {
            tracing::warn!(
                "{} redefines prog '{}' from {}",
                path.display(),
                file.name,
                owner.display()
            );
            return Err(ProgError::Load {
                path: path.display().to_string(),
                message: format!("prog '{}' is already defined by {}", file.name, owner.display()),
            });
        }

        match self
            .cache
            .insert_named(&file.name, &file.source, file.return_type, &file.parameters)
        {
            Ok(_) => {
                if self.log_compile {
                    tracing::info!("Compiled prog '{}' from {}", file.name, path.display());
                } else {
                    tracing::debug!("Compiled prog '{}' from {}", file.name, path.display());
                }
                if let Some(previous) = self.files.insert(path.to_path_buf(), file.name.clone()) {
                    if previous != file.name {
                        self.cache.invalidate_named(&previous);
                        tracing::info!("Prog '{}' renamed to '{}'", previous, file.name);
                    }
                }
                Ok(file.name)
            }
            Err(ProgError::Compile(err)) => Err(ProgError::Compile(CompileError::new(
                file.file_line(err.line),
                err.message,
            ))),
            Err(other) => Err(other),
        }
    }

    /// Forget the prog defined by a removed file
    pub fn unload(&mut self, path: &Path) -> Option<String> {
        let name = self.files.remove(path)?;
        self.cache.invalidate_named(&name);
        tracing::info!("Unloaded prog '{}'", name);
        Some(name)
    }

    /// The other file, if any, that defines `name`
    fn owner_of(&self, name: &str, path: &Path) -> Option<&Path> {
        self.files
            .iter()
            .find(|(other, bound)| bound.as_str() == name && other.as_path() != path)
            .map(|(other, _)| other.as_path())
    }

    /// Run a named prog with already-typed arguments
    pub fn run(&self, name: &str, args: &[Value], world: &dyn World) -> Result<Value> {
        let program = self
            .cache
            .get_named(name)
            .ok_or_else(|| MudError::NotFound(format!("prog '{}'", name)))?;

        let value = self
            .cache
            .engine()
            .invoke(&program, world, args)
            .map_err(ProgError::from)?;
        Ok(value)
    }

    /// Run a named prog, converting command-line text to its parameter types
    pub fn run_with_text(&self, name: &str, args: &[String], world: &dyn World) -> Result<Value> {
        let program = self
            .cache
            .get_named(name)
            .ok_or_else(|| MudError::NotFound(format!("prog '{}'", name)))?;

        if args.len() != program.parameters().len() {
            return Err(MudError::InvalidData(format!(
                "prog '{}' takes {} arguments, got {}",
                name,
                program.parameters().len(),
                args.len()
            )));
        }

        let values = program
            .parameters()
            .iter()
            .zip(args)
            .map(|(parameter, text)| parse_argument(text, parameter.ty))
            .collect::<Result<Vec<_>>>()?;
        self.run(name, &values, world)
    }
}

fn is_prog_file(path: &Path) -> bool {
    path.is_file() && path.extension().is_some_and(|ext| ext == PROG_EXTENSION)
}

/// Convert a command-line argument to a scalar prog value
///
/// Object references are given as numeric ids; `null` is a null reference.
pub fn parse_argument(text: &str, ty: ProgType) -> Result<Value> {
    let invalid = || MudError::InvalidData(format!("'{}' is not a valid {}", text, ty));
    let id = || -> Result<Option<u64>> {
        if text.eq_ignore_ascii_case("null") {
            return Ok(None);
        }
        text.parse().map(Some).map_err(|_| invalid())
    };

    match ty {
        ProgType::Number => text.parse().map(Value::Number).map_err(|_| invalid()),
        ProgType::Text => Ok(Value::text(text)),
        ProgType::Boolean => match text.to_lowercase().as_str() {
            "true" => Ok(Value::Boolean(true)),
            "false" => Ok(Value::Boolean(false)),
            _ => Err(invalid()),
        },
        ProgType::Character => Ok(Value::Character(id()?.map(CharacterId::new))),
        ProgType::Item => Ok(Value::Item(id()?.map(ItemId::new))),
        ProgType::Location => Ok(Value::Location(id()?.map(LocationId::new))),
        ProgType::Void | ProgType::Collection(_) | ProgType::Dictionary(_) => Err(MudError::InvalidData(
            format!("{} arguments cannot be given on the command line", ty),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mud_prog::{MemoryWorld, ProgEngine};

    fn library() -> ProgLibrary {
        ProgLibrary::new(ProgCache::with_defaults(ProgEngine::standard()), false)
    }

    #[test]
    fn test_load_and_run() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("double.prog"),
            "#returns number\n#parameter n number\nreturn n * 2",
        )
        .unwrap();
        std::fs::write(dir.path().join("notes.txt"), "not a prog").unwrap();

        let mut library = library();
        let summary = library.load_dir(dir.path()).unwrap();
        assert_eq!(summary, LoadSummary { loaded: 1, failed: 0 });

        let world = MemoryWorld::new();
        let result = library.run_with_text("double", &["21".to_string()], &world).unwrap();
        assert_eq!(result, Value::Number(42.0));
    }

    #[test]
    fn test_compile_errors_use_file_lines() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.prog");
        std::fs::write(&path, "#name broken\n#returns number\nreturn missing + 1").unwrap();

        let mut library = library();
        let err = library.load_file(&path).unwrap_err();
        assert!(matches!(err, ProgError::Compile(ref e) if e.line == 3));
    }

    #[test]
    fn test_broken_edit_keeps_last_good_program() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("hello.prog");
        std::fs::write(&path, "#returns text\nreturn \"hello\"").unwrap();

        let mut library = library();
        library.load_file(&path).unwrap();

        std::fs::write(&path, "#returns text\nreturn 5").unwrap();
        assert!(library.load_file(&path).is_err());

        let world = MemoryWorld::new();
        assert_eq!(library.run("hello", &[], &world).unwrap(), Value::text("hello"));

        assert_eq!(library.unload(&path), Some("hello".to_string()));
        assert!(matches!(library.run("hello", &[], &world), Err(MudError::NotFound(_))));
    }

    #[test]
    fn test_renamed_prog_drops_old_name() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("greeting.prog");
        std::fs::write(&path, "#name old\n#returns text\nreturn \"old\"").unwrap();

        let mut library = library();
        library.load_file(&path).unwrap();

        std::fs::write(&path, "#name new\n#returns text\nreturn \"new\"").unwrap();
        assert_eq!(library.load_file(&path).unwrap(), "new");

        let world = MemoryWorld::new();
        assert!(matches!(library.run("old", &[], &world), Err(MudError::NotFound(_))));
        assert_eq!(library.run("new", &[], &world).unwrap(), Value::text("new"));

        std::fs::remove_file(&path).unwrap();
        assert_eq!(library.unload(&path), Some("new".to_string()));
        assert!(library.cache().names().is_empty());
        assert!(matches!(library.run("old", &[], &world), Err(MudError::NotFound(_))));
        assert!(matches!(library.run("new", &[], &world), Err(MudError::NotFound(_))));
    }

    #[test]
    fn test_duplicate_name_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let first = dir.path().join("a.prog");
        let second = dir.path().join("b.prog");
        std::fs::write(&first, "#name shared\n#returns number\nreturn 1").unwrap();
        std::fs::write(&second, "#name shared\n#returns number\nreturn 2").unwrap();

        let mut library = library();
        let summary = library.load_dir(dir.path()).unwrap();
        assert_eq!(summary, LoadSummary { loaded: 1, failed: 1 });

        let err = library.load_file(&second).unwrap_err();
        assert!(err.to_string().contains("prog 'shared' is already defined by"));

        let world = MemoryWorld::new();
        assert_eq!(library.run("shared", &[], &world).unwrap(), Value::Number(1.0));

        // reloading the owning file is not a duplicate
        assert_eq!(library.load_file(&first).unwrap(), "shared");

        library.unload(&first);
        assert_eq!(library.load_file(&second).unwrap(), "shared");
        assert_eq!(library.run("shared", &[], &world).unwrap(), Value::Number(2.0));
    }

    #[test]
    fn test_parse_argument() {
        assert_eq!(parse_argument("4.5", ProgType::Number).unwrap(), Value::Number(4.5));
        assert_eq!(
            parse_argument("7", ProgType::Character).unwrap(),
            Value::character(CharacterId::new(7))
        );
        assert_eq!(parse_argument("null", ProgType::Item).unwrap(), Value::Item(None));
        assert!(parse_argument("maybe", ProgType::Boolean).is_err());
    }
}
