//! The entity/parameter-value store which models are read from and written to.
//!
//! A [`Database`] holds entity classes, alternatives, entities and parameter values. Changes are
//! made to a working copy and only become part of the committed state (the state which is saved)
//! when [`Database::commit`] succeeds, so a conversion which fails part-way still leaves the
//! stages committed before the failure in the saved file.
//!
//! On disk a database is a JSON snapshot in the layout used by Spine's import/export functions:
//!
//! ```json
//! {
//!   "entity_classes": [["REGION", []], ["REGION__FUEL", ["REGION", "FUEL"]]],
//!   "alternatives": [["base", ""]],
//!   "entities": [["REGION", "R1"], ["REGION__FUEL", ["R1", "ELC"]]],
//!   "parameter_values": [["REGION__FUEL", ["R1", "ELC"], "SpecifiedAnnualDemand", 10.0, "base"]]
//! }
//! ```
use crate::id::{AlternativeID, ClassID, IDCollection};
use crate::input::read_json;
use crate::value::ParameterValue;
use anyhow::{Context, Result, ensure};
use indexmap::{IndexMap, IndexSet};
use itertools::Itertools;
use log::debug;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

/// Entity classes of the INES specification used for new target databases
const INES_SCHEMA: &str = include_str!("../schemas/ines_spec.json");

/// The names of an entity's elements (a single name for zero-dimensional entities)
pub type ByName = Vec<String>;

/// Key for the values of one parameter of one entity
type ValueKey = (ClassID, ByName, String);

/// Join the elements of a byname into an entity name
pub fn entity_name(byname: &[String]) -> String {
    byname.join("__")
}

/// A category of entities, possibly composed of other classes
#[derive(Debug, Clone, PartialEq)]
pub struct EntityClass {
    /// Name of the class
    pub name: ClassID,
    /// The classes of the elements, for multi-dimensional classes
    pub dimensions: Vec<ClassID>,
}

impl EntityClass {
    /// The number of names in the byname of this class's entities
    fn byname_len(&self) -> usize {
        self.dimensions.len().max(1)
    }
}

/// An instance of an entity class
#[derive(Debug, Clone, PartialEq)]
pub struct Entity {
    /// The entity's class
    pub class: ClassID,
    /// The names of the elements
    pub byname: ByName,
    /// The entity's name (the byname joined by `__`)
    pub name: String,
}

/// The kinds of item which can be purged
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PurgeItem {
    /// All parameter values
    ParameterValues,
    /// All entities (and their parameter values)
    Entities,
    /// All alternatives (and parameter values in them)
    Alternatives,
}

/// The contents of a database at one point in time
#[derive(Debug, Clone, Default, PartialEq)]
struct Contents {
    classes: IndexMap<ClassID, EntityClass>,
    alternatives: IndexSet<AlternativeID>,
    entities: IndexMap<(ClassID, ByName), Entity>,
    values: IndexMap<ValueKey, IndexMap<AlternativeID, ParameterValue>>,
}

/// An entity/parameter-value store
#[derive(Debug, Default)]
pub struct Database {
    working: Contents,
    committed: Contents,
    dirty: bool,
    commit_messages: Vec<String>,
}

impl Database {
    /// Create an empty database
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty database with the entity classes of the INES specification
    pub fn ines_template() -> Result<Self> {
        let snapshot: Snapshot =
            serde_json::from_str(INES_SCHEMA).context("Invalid bundled INES schema")?;
        Self::from_snapshot(snapshot)
    }

    /// Read a database from a JSON snapshot file
    pub fn from_path(file_path: &Path) -> Result<Self> {
        let snapshot: Snapshot = read_json(file_path)?;
        Self::from_snapshot(snapshot)
            .with_context(|| format!("Invalid database {}", file_path.display()))
    }

    /// Build a database from a snapshot. The contents count as committed.
    fn from_snapshot(snapshot: Snapshot) -> Result<Self> {
        let mut db = Self::new();
        for (name, dimensions) in snapshot.entity_classes {
            db.add_entity_class(&name, &dimensions)?;
        }
        for (name, _description) in snapshot.alternatives {
            db.add_alternative(&name)?;
        }

        // Elements have to exist before the entities made from them
        let entities = snapshot
            .entities
            .into_iter()
            .map(|(class, name)| (class, name.into_byname()))
            .sorted_by_key(|(_, byname)| byname.len());
        for (class, byname) in entities {
            db.add_entity(&class, &byname)?;
        }

        for (class, name, parameter, value, alternative) in snapshot.parameter_values {
            db.add_parameter_value(&class, &name.into_byname(), &parameter, &alternative, value)?;
        }

        db.committed = db.working.clone();
        db.dirty = false;
        Ok(db)
    }

    /// Write the committed contents of the database to a JSON snapshot file
    pub fn save(&self, file_path: &Path, pretty: bool) -> Result<()> {
        let snapshot = Snapshot::from_contents(&self.committed);
        let file = File::create(file_path)
            .with_context(|| format!("Could not create {}", file_path.display()))?;
        let writer = BufWriter::new(file);
        if pretty {
            serde_json::to_writer_pretty(writer, &snapshot)?;
        } else {
            serde_json::to_writer(writer, &snapshot)?;
        }

        Ok(())
    }

    /// Make the working copy the committed state.
    ///
    /// Fails if nothing has changed since the last commit.
    pub fn commit(&mut self, message: &str) -> Result<()> {
        ensure!(self.dirty, "Nothing to commit");
        self.committed = self.working.clone();
        self.dirty = false;
        self.commit_messages.push(message.to_string());
        debug!("Committed: {message}");

        Ok(())
    }

    /// The messages of all successful commits, oldest first
    pub fn commit_messages(&self) -> &[String] {
        &self.commit_messages
    }

    /// Whether there are uncommitted changes
    pub fn has_uncommitted_changes(&self) -> bool {
        self.dirty
    }

    /// Add a new entity class
    pub fn add_entity_class<S: AsRef<str>>(&mut self, name: &str, dimensions: &[S]) -> Result<()> {
        ensure!(
            !self.working.classes.contains_key(name),
            "Entity class {name} already exists"
        );
        let dimensions = dimensions
            .iter()
            .map(|dim| {
                self.working
                    .classes
                    .get_id_by_str(dim.as_ref())
                    .with_context(|| format!("Unknown dimension class for {name}"))
            })
            .collect::<Result<_>>()?;
        let name = ClassID::new(name);
        self.working.classes.insert(
            name.clone(),
            EntityClass {
                name,
                dimensions,
            },
        );
        self.dirty = true;

        Ok(())
    }

    /// Get an entity class by name
    pub fn entity_class(&self, name: &str) -> Option<&EntityClass> {
        self.working.classes.get(name)
    }

    /// Add a new alternative
    pub fn add_alternative(&mut self, name: &str) -> Result<()> {
        ensure!(
            self.working.alternatives.insert(name.into()),
            "Alternative {name} already exists"
        );
        self.dirty = true;

        Ok(())
    }

    /// Iterate over the alternatives in the order they were added
    pub fn alternatives(&self) -> impl Iterator<Item = &AlternativeID> {
        self.working.alternatives.iter()
    }

    /// Add a new entity.
    ///
    /// For multi-dimensional classes, each element of `byname` must be an existing entity of the
    /// corresponding dimension class.
    pub fn add_entity<S: AsRef<str>>(&mut self, class: &str, byname: &[S]) -> Result<()> {
        let byname: ByName = byname.iter().map(|s| s.as_ref().to_string()).collect();
        let entity_class = self
            .working
            .classes
            .get(class)
            .with_context(|| format!("Unknown entity class {class}"))?;
        ensure!(
            byname.len() == entity_class.byname_len(),
            "Entity {} has {} element(s) but class {class} needs {}",
            entity_name(&byname),
            byname.len(),
            entity_class.byname_len()
        );
        for (dimension, element) in entity_class.dimensions.iter().zip(&byname) {
            ensure!(
                self.working
                    .entities
                    .contains_key(&(dimension.clone(), vec![element.clone()])),
                "Element {element} of class {dimension} does not exist"
            );
        }

        let key = (entity_class.name.clone(), byname);
        ensure!(
            !self.working.entities.contains_key(&key),
            "Entity {} of class {class} already exists",
            entity_name(&key.1)
        );
        let entity = Entity {
            class: key.0.clone(),
            name: entity_name(&key.1),
            byname: key.1.clone(),
        };
        self.working.entities.insert(key, entity);
        self.dirty = true;

        Ok(())
    }

    /// Add an entity unless it already exists, returning whether it was added
    pub fn ensure_entity<S: AsRef<str>>(&mut self, class: &str, byname: &[S]) -> Result<bool> {
        if self.entity_exists(class, byname) {
            return Ok(false);
        }
        self.add_entity(class, byname)?;
        Ok(true)
    }

    /// Whether the given entity exists
    pub fn entity_exists<S: AsRef<str>>(&self, class: &str, byname: &[S]) -> bool {
        let byname: ByName = byname.iter().map(|s| s.as_ref().to_string()).collect();
        self.working.entities.contains_key(&(ClassID::new(class), byname))
    }

    /// All entities of a class, in the order they were added
    pub fn entities(&self, class: &str) -> Vec<&Entity> {
        self.working
            .entities
            .values()
            .filter(|entity| entity.class.as_str() == class)
            .collect()
    }

    /// Add a parameter value for an existing entity and alternative
    pub fn add_parameter_value(
        &mut self,
        class: &str,
        byname: &[String],
        parameter: &str,
        alternative: &str,
        value: ParameterValue,
    ) -> Result<()> {
        ensure!(
            self.entity_exists(class, byname),
            "Entity {} of class {class} does not exist",
            entity_name(byname)
        );
        ensure!(
            value.is_finite(),
            "Parameter {parameter} of {class} {} has a non-finite value",
            entity_name(byname)
        );
        let alternative = self
            .working
            .alternatives
            .get_id_by_str(alternative)
            .context("Unknown alternative")?;
        let key = (ClassID::new(class), byname.to_vec(), parameter.to_string());
        let values = self.working.values.entry(key).or_default();
        ensure!(
            !values.contains_key(&alternative),
            "Parameter {parameter} of {class} {} already has a value in alternative {alternative}",
            entity_name(byname)
        );
        values.insert(alternative, value);
        self.dirty = true;

        Ok(())
    }

    /// All values of one parameter of one entity, with their alternatives
    pub fn parameter_values<'a>(
        &'a self,
        class: &str,
        byname: &[String],
        parameter: &str,
    ) -> impl Iterator<Item = (&'a AlternativeID, &'a ParameterValue)> + use<'a> {
        let key = (ClassID::new(class), byname.to_vec(), parameter.to_string());
        self.working.values.get(&key).into_iter().flatten()
    }

    /// The value of a parameter in one alternative, if there is one
    pub fn parameter_value(
        &self,
        class: &str,
        byname: &[String],
        parameter: &str,
        alternative: &str,
    ) -> Option<&ParameterValue> {
        let key = (ClassID::new(class), byname.to_vec(), parameter.to_string());
        self.working.values.get(&key)?.get(alternative)
    }

    /// Remove all items of the given kind
    pub fn purge(&mut self, item: PurgeItem) {
        let contents = &mut self.working;
        let before = (
            contents.values.len(),
            contents.entities.len(),
            contents.alternatives.len(),
        );
        match item {
            PurgeItem::ParameterValues => contents.values.clear(),
            PurgeItem::Entities => {
                contents.values.clear();
                contents.entities.clear();
            }
            PurgeItem::Alternatives => {
                contents.alternatives.clear();
                contents.values.clear();
            }
        }
        let after = (
            contents.values.len(),
            contents.entities.len(),
            contents.alternatives.len(),
        );
        if before != after {
            self.dirty = true;
        }
    }
}

/// An entity's name in a snapshot: a plain name or a list of element names
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
enum SnapshotEntityName {
    Name(String),
    ByName(ByName),
}

impl SnapshotEntityName {
    fn into_byname(self) -> ByName {
        match self {
            Self::Name(name) => vec![name],
            Self::ByName(byname) => byname,
        }
    }

    fn from_byname(byname: &[String]) -> Self {
        match byname {
            [name] => Self::Name(name.clone()),
            _ => Self::ByName(byname.to_vec()),
        }
    }
}

/// The on-disk representation of a database
#[derive(Debug, Default, Serialize, Deserialize)]
struct Snapshot {
    #[serde(default)]
    entity_classes: Vec<(String, Vec<String>)>,
    #[serde(default)]
    alternatives: Vec<(String, String)>,
    #[serde(default)]
    entities: Vec<(String, SnapshotEntityName)>,
    #[serde(default)]
    parameter_values: Vec<(String, SnapshotEntityName, String, ParameterValue, String)>,
}

impl Snapshot {
    fn from_contents(contents: &Contents) -> Self {
        let entity_classes = contents
            .classes
            .values()
            .map(|class| {
                let dimensions = class.dimensions.iter().map(ToString::to_string).collect();
                (class.name.to_string(), dimensions)
            })
            .collect();
        let alternatives = contents
            .alternatives
            .iter()
            .map(|alternative| (alternative.to_string(), String::new()))
            .collect();
        let entities = contents
            .entities
            .values()
            .map(|entity| {
                (
                    entity.class.to_string(),
                    SnapshotEntityName::from_byname(&entity.byname),
                )
            })
            .collect();
        let parameter_values = contents
            .values
            .iter()
            .flat_map(|((class, byname, parameter), values)| {
                values.iter().map(move |(alternative, value)| {
                    (
                        class.to_string(),
                        SnapshotEntityName::from_byname(byname),
                        parameter.clone(),
                        value.clone(),
                        alternative.to_string(),
                    )
                })
            })
            .collect();

        Self {
            entity_classes,
            alternatives,
            entities,
            parameter_values,
        }
    }
}
