//! Schema Resolver: loads JSON Schema files and produces self-contained
//! sub-schemas.
//!
//! `resolve(file, pointer)` returns the node at `pointer` with every `$ref`
//! (internal and cross-file) inlined, `allOf` branches merged, and
//! `additionalProperties: false` added to object schemas that leave it open.
//!
//! Parsed files are cached per resolver instance and only dropped by
//! [`SchemaResolver::clear_cache`]. Each run owns its resolver; there is no
//! shared cache.

pub mod compose;
pub mod pointer;

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde_json::{Map, Value};
use tracing::{debug, instrument};

use crate::error::SchemaError;
use compose::{close_objects, merge_schemas};
use pointer::{display_pointer, normalize_pointer, relative_file, split_ref};

/// Keywords whose object value maps names to subschemas.
const SCHEMA_MAPS: &[&str] = &["properties", "patternProperties", "dependentSchemas"];
/// Keywords whose value is data, never a subschema.
const DATA_KEYWORDS: &[&str] = &["enum", "const", "default", "examples", "required"];
/// Definition containers, dropped from resolved output once refs are inlined.
const DEFINITION_MAPS: &[&str] = &["definitions", "$defs"];

/// Resolves schema pointers under one base directory.
#[derive(Debug)]
pub struct SchemaResolver {
    base_dir: PathBuf,
    cache: HashMap<String, Value>,
}

impl SchemaResolver {
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
            cache: HashMap::new(),
        }
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    /// Number of parsed files currently held.
    pub fn cached_files(&self) -> usize {
        self.cache.len()
    }

    /// Forget every parsed file; the next resolve re-reads from disk.
    pub fn clear_cache(&mut self) {
        debug!(files = self.cache.len(), "clearing schema cache");
        self.cache.clear();
    }

    /// Resolve `pointer` (e.g. `#/definitions/initial.issue`) within `file`.
    #[instrument(skip(self), fields(base_dir = %self.base_dir.display()))]
    pub fn resolve(&mut self, file: &str, pointer: &str) -> Result<Value, SchemaError> {
        let file = relative_file(Path::new(file)).ok_or_else(|| SchemaError::OutsideBaseDir {
            file: file.to_string(),
        })?;
        let pointer = normalize_pointer(pointer)?;
        let mut stack = Vec::new();
        let mut resolved = self.resolve_at(&file, &pointer, &mut stack)?;
        close_objects(&mut resolved);
        Ok(resolved)
    }

    fn resolve_at(
        &mut self,
        file: &str,
        pointer: &str,
        stack: &mut Vec<String>,
    ) -> Result<Value, SchemaError> {
        let key = format!("{file}{}", display_pointer(pointer));
        if stack.contains(&key) {
            let mut chain = stack.clone();
            chain.push(key);
            return Err(SchemaError::CircularRef { chain });
        }
        let node = self
            .document(file)?
            .pointer(pointer)
            .cloned()
            .ok_or_else(|| SchemaError::PointerNotFound {
                pointer: display_pointer(pointer),
                file: file.to_string(),
            })?;

        stack.push(key);
        let expanded = self.expand(node, file, stack)?;
        stack.pop();
        Ok(expanded)
    }

    fn expand(
        &mut self,
        node: Value,
        file: &str,
        stack: &mut Vec<String>,
    ) -> Result<Value, SchemaError> {
        match node {
            Value::Object(mut map) => {
                if let Some(Value::String(reference)) = map.remove("$ref") {
                    let (ref_file, ref_pointer) = split_ref(&reference, file)?;
                    let target = self.resolve_at(&ref_file, &ref_pointer, stack)?;
                    if map.is_empty() {
                        return Ok(target);
                    }
                    let siblings = self.expand(Value::Object(map), file, stack)?;
                    return Ok(merge_schemas(target, siblings));
                }
                if let Some(Value::Array(branches)) = map.remove("allOf") {
                    let mut merged = self.expand(Value::Object(map), file, stack)?;
                    for branch in branches {
                        let branch = self.expand(branch, file, stack)?;
                        merged = merge_schemas(merged, branch);
                    }
                    return Ok(merged);
                }

                let mut out = Map::new();
                for (key, value) in map {
                    let key_str = key.as_str();
                    if DEFINITION_MAPS.contains(&key_str) {
                        continue;
                    }
                    let value = if DATA_KEYWORDS.contains(&key_str) {
                        value
                    } else if SCHEMA_MAPS.contains(&key_str) {
                        self.expand_named(value, file, stack)?
                    } else {
                        self.expand(value, file, stack)?
                    };
                    out.insert(key, value);
                }
                Ok(Value::Object(out))
            }
            Value::Array(items) => items
                .into_iter()
                .map(|item| self.expand(item, file, stack))
                .collect::<Result<Vec<_>, _>>()
                .map(Value::Array),
            other => Ok(other),
        }
    }

    /// Expand each value of a name-to-schema map, leaving the names alone.
    fn expand_named(
        &mut self,
        value: Value,
        file: &str,
        stack: &mut Vec<String>,
    ) -> Result<Value, SchemaError> {
        let Value::Object(children) = value else {
            return Ok(value);
        };
        let mut out = Map::new();
        for (name, child) in children {
            out.insert(name, self.expand(child, file, stack)?);
        }
        Ok(Value::Object(out))
    }

    fn document(&mut self, file: &str) -> Result<&Value, SchemaError> {
        if !self.cache.contains_key(file) {
            let parsed = load_schema_file(&self.base_dir.join(file))?;
            self.cache.insert(file.to_string(), parsed);
        }
        self.cache
            .get(file)
            .ok_or_else(|| SchemaError::FileNotFound {
                path: self.base_dir.join(file),
            })
    }
}

#[instrument]
fn load_schema_file(path: &Path) -> Result<Value, SchemaError> {
    if !path.is_file() {
        return Err(SchemaError::FileNotFound {
            path: path.to_path_buf(),
        });
    }
    debug!("reading schema file");
    let contents = fs::read_to_string(path).map_err(|source| SchemaError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&contents).map_err(|source| SchemaError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

/// Validate a structured output against a resolved schema.
///
/// Returns every violation message; an empty list means the output conforms.
pub fn validate_output(schema: &Value, output: &Value) -> Result<Vec<String>, SchemaError> {
    let validator = jsonschema::validator_for(schema).map_err(|err| SchemaError::InvalidSchema {
        message: err.to_string(),
    })?;
    Ok(validator
        .iter_errors(output)
        .map(|err| err.to_string())
        .collect())
}
