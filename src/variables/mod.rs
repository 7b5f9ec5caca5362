//! Variable descriptors and the archive code table.
//!
//! A [`Variable`] identifies one physical field by its canonical archive code,
//! either at the surface or on a specific pressure level. Descriptors are
//! constructed through a [`VariableTable`], the read-only registry mapping
//! channel names and archive codes to variable definitions. Tables are plain
//! values passed in explicitly, so tests can run against synthetic tables and
//! the built-in ERA5 table ([`VariableTable::era5`]) is just one instance.

pub mod era5;

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::hash::{Hash, Hasher};

use crate::error::{CharneyError, Result};

/// Whether a variable lives on the surface or on pressure levels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LevelKind {
    /// No vertical coordinate (e.g. 2 m temperature, mean sea level pressure)
    Surface,
    /// Defined on isobaric surfaces, levels in hPa
    Pressure,
}

/// A typed descriptor for one physical field.
///
/// The two variants form a closed set: a surface variable never carries a
/// level, a pressure-level variable always does. Equality (and hashing) use
/// only the archive code and the level. The `name` is carried for display
/// and for name-based dataset selection, but two descriptors with the same
/// code and level are the same field regardless of how they were labeled.
#[derive(Debug, Clone)]
pub enum Variable {
    /// A field with no vertical coordinate
    Surface {
        /// Canonical archive parameter code
        code: u32,
        /// Short channel key, e.g. "t2m"
        name: String,
    },
    /// A field on a specific isobaric surface
    Pressure {
        /// Canonical archive parameter code
        code: u32,
        /// Family key, e.g. "z"
        name: String,
        /// Pressure level in hPa, e.g. 500
        level: u32,
    },
}

impl Variable {
    /// The archive's canonical numeric identifier for this field
    pub fn code(&self) -> u32 {
        match self {
            Variable::Surface { code, .. } => *code,
            Variable::Pressure { code, .. } => *code,
        }
    }

    /// The short name key ("t2m", "z", ...)
    pub fn name(&self) -> &str {
        match self {
            Variable::Surface { name, .. } => name,
            Variable::Pressure { name, .. } => name,
        }
    }

    /// The pressure level in hPa, if this is a pressure-level field
    pub fn level(&self) -> Option<u32> {
        match self {
            Variable::Surface { .. } => None,
            Variable::Pressure { level, .. } => Some(*level),
        }
    }

    /// Surface or pressure, as a closed tag
    pub fn kind(&self) -> LevelKind {
        match self {
            Variable::Surface { .. } => LevelKind::Surface,
            Variable::Pressure { .. } => LevelKind::Pressure,
        }
    }

    /// The channel-style spelling of this descriptor ("t2m", "z500", ...)
    pub fn channel(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for Variable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Variable::Surface { name, .. } => write!(f, "{}", name),
            Variable::Pressure { name, level, .. } => write!(f, "{}{}", name, level),
        }
    }
}

// Matching key is (code, level-when-present): the extractor relies on this
// equality to pair grid messages with requested descriptors, so the name must
// not participate.
impl PartialEq for Variable {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Variable::Surface { code: a, .. }, Variable::Surface { code: b, .. }) => a == b,
            (
                Variable::Pressure {
                    code: a, level: la, ..
                },
                Variable::Pressure {
                    code: b, level: lb, ..
                },
            ) => a == b && la == lb,
            _ => false,
        }
    }
}

impl Eq for Variable {}

impl Hash for Variable {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.code().hash(state);
        self.level().hash(state);
    }
}

/// One row of the archive code table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VariableDef {
    /// Canonical archive parameter code
    pub code: u32,
    /// Channel key for surface variables, family key for pressure variables
    pub name: String,
    /// Surface or pressure family
    pub kind: LevelKind,
    /// The archive's long variable name, e.g. "2m_temperature"
    pub archive_name: String,
    /// The variable name used inside data files, e.g. "t2m"
    pub short_name: String,
    /// Physical units, e.g. "K"
    pub units: String,
}

impl VariableDef {
    /// Define a surface variable row
    pub fn surface(
        code: u32,
        name: impl Into<String>,
        archive_name: impl Into<String>,
        short_name: impl Into<String>,
        units: impl Into<String>,
    ) -> Self {
        Self {
            code,
            name: name.into(),
            kind: LevelKind::Surface,
            archive_name: archive_name.into(),
            short_name: short_name.into(),
            units: units.into(),
        }
    }

    /// Define a pressure-level variable family row
    pub fn pressure(
        code: u32,
        name: impl Into<String>,
        archive_name: impl Into<String>,
        short_name: impl Into<String>,
        units: impl Into<String>,
    ) -> Self {
        Self {
            code,
            name: name.into(),
            kind: LevelKind::Pressure,
            archive_name: archive_name.into(),
            short_name: short_name.into(),
            units: units.into(),
        }
    }

    /// Construct the descriptor this row defines, at the given level.
    ///
    /// The level must be present for pressure rows and absent for surface
    /// rows; anything else is a caller error surfaced as a parse failure.
    pub fn instantiate(&self, level: Option<u32>) -> Result<Variable> {
        match (self.kind, level) {
            (LevelKind::Surface, None) => Ok(Variable::Surface {
                code: self.code,
                name: self.name.clone(),
            }),
            (LevelKind::Pressure, Some(level)) => Ok(Variable::Pressure {
                code: self.code,
                name: self.name.clone(),
                level,
            }),
            (LevelKind::Surface, Some(level)) => Err(CharneyError::Parse {
                channel: self.name.clone(),
                message: format!("surface variable does not take a level (got {})", level),
            }),
            (LevelKind::Pressure, None) => Err(CharneyError::Parse {
                channel: self.name.clone(),
                message: "pressure-level variable requires a level".to_string(),
            }),
        }
    }
}

/// The read-only registry mapping channel names and archive codes to
/// variable definitions.
///
/// Lookups exist in both directions, from name and from archive code;
/// construction rejects tables where either direction is ambiguous, so the
/// mapping between names and codes is a bijection by the time a table is
/// usable.
#[derive(Debug, Clone)]
pub struct VariableTable {
    by_name: HashMap<String, VariableDef>,
    by_code: HashMap<u32, VariableDef>,
    surface_names: HashSet<String>,
}

impl VariableTable {
    /// Build a table from definition rows, validating uniqueness of names
    /// and codes.
    pub fn new(defs: impl IntoIterator<Item = VariableDef>) -> Result<Self> {
        let mut by_name = HashMap::new();
        let mut by_code = HashMap::new();
        let mut surface_names = HashSet::new();

        for def in defs {
            if let Some(previous) = by_name.insert(def.name.clone(), def.clone()) {
                return Err(CharneyError::Configuration {
                    message: format!("duplicate variable name '{}' in table", previous.name),
                });
            }
            if let Some(previous) = by_code.insert(def.code, def.clone()) {
                return Err(CharneyError::Configuration {
                    message: format!("duplicate variable code {} in table", previous.code),
                });
            }
            if def.kind == LevelKind::Surface {
                surface_names.insert(def.name.clone());
            }
        }

        Ok(Self {
            by_name,
            by_code,
            surface_names,
        })
    }

    /// Number of definition rows in the table
    pub fn len(&self) -> usize {
        self.by_code.len()
    }

    /// Whether the table has no rows
    pub fn is_empty(&self) -> bool {
        self.by_code.is_empty()
    }

    /// Look up a definition row by its name key
    pub fn def_by_name(&self, name: &str) -> Option<&VariableDef> {
        self.by_name.get(name)
    }

    /// Look up a definition row by its archive code
    pub fn def_by_code(&self, code: u32) -> Option<&VariableDef> {
        self.by_code.get(&code)
    }

    /// Whether a channel name denotes a surface variable
    pub fn is_surface_name(&self, name: &str) -> bool {
        self.surface_names.contains(name)
    }

    /// Construct the surface descriptor for a channel name, if the table
    /// defines one
    pub fn surface_by_name(&self, name: &str) -> Option<Variable> {
        self.by_name
            .get(name)
            .and_then(|def| def.instantiate(None).ok())
    }

    /// Construct the pressure-level descriptor for a family name, if the
    /// table defines one
    pub fn pressure_by_name(&self, family: &str, level: u32) -> Option<Variable> {
        self.by_name
            .get(family)
            .and_then(|def| def.instantiate(Some(level)).ok())
    }

    /// Construct the surface descriptor for an archive code, if the table
    /// defines one
    pub fn surface_by_code(&self, code: u32) -> Option<Variable> {
        self.by_code
            .get(&code)
            .and_then(|def| def.instantiate(None).ok())
    }

    /// Construct the pressure-level descriptor for an archive code, if the
    /// table defines one
    pub fn pressure_by_code(&self, code: u32, level: u32) -> Option<Variable> {
        self.by_code
            .get(&code)
            .and_then(|def| def.instantiate(Some(level)).ok())
    }

    /// The archive's long name for a descriptor's variable
    pub fn archive_name(&self, var: &Variable) -> Result<&str> {
        self.def_by_code(var.code())
            .map(|def| def.archive_name.as_str())
            .ok_or_else(|| CharneyError::DataNotFound {
                message: format!("code {} is not in the variable table", var.code()),
            })
    }

    /// The in-file short name for a descriptor's variable
    pub fn short_name(&self, var: &Variable) -> Result<&str> {
        self.def_by_code(var.code())
            .map(|def| def.short_name.as_str())
            .ok_or_else(|| CharneyError::DataNotFound {
                message: format!("code {} is not in the variable table", var.code()),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small_table() -> VariableTable {
        VariableTable::new(vec![
            VariableDef::surface(167, "t2m", "2m_temperature", "t2m", "K"),
            VariableDef::pressure(129, "z", "geopotential", "z", "m**2 s**-2"),
        ])
        .unwrap()
    }

    #[test]
    fn test_equality_ignores_name() {
        let a = Variable::Surface {
            code: 167,
            name: "t2m".to_string(),
        };
        let b = Variable::Surface {
            code: 167,
            name: "renamed".to_string(),
        };
        assert_eq!(a, b);
    }

    #[test]
    fn test_equality_distinguishes_levels_and_kinds() {
        let z500 = Variable::Pressure {
            code: 129,
            name: "z".to_string(),
            level: 500,
        };
        let z850 = Variable::Pressure {
            code: 129,
            name: "z".to_string(),
            level: 850,
        };
        let surface = Variable::Surface {
            code: 129,
            name: "z".to_string(),
        };
        assert_ne!(z500, z850);
        assert_ne!(z500, surface);
    }

    #[test]
    fn test_hash_agrees_with_equality() {
        use std::collections::HashMap;
        let mut index = HashMap::new();
        index.insert(
            Variable::Pressure {
                code: 129,
                name: "z".to_string(),
                level: 500,
            },
            0usize,
        );
        let probe = Variable::Pressure {
            code: 129,
            name: "other".to_string(),
            level: 500,
        };
        assert_eq!(index.get(&probe), Some(&0));
    }

    #[test]
    fn test_display_is_channel_spelling() {
        let t2m = Variable::Surface {
            code: 167,
            name: "t2m".to_string(),
        };
        let z500 = Variable::Pressure {
            code: 129,
            name: "z".to_string(),
            level: 500,
        };
        assert_eq!(t2m.to_string(), "t2m");
        assert_eq!(z500.to_string(), "z500");
        assert_eq!(z500.channel(), "z500");
    }

    #[test]
    fn test_table_lookups() {
        let table = small_table();
        assert!(table.is_surface_name("t2m"));
        assert!(!table.is_surface_name("z"));

        let t2m = table.surface_by_name("t2m").unwrap();
        assert_eq!(t2m.code(), 167);
        assert_eq!(t2m.level(), None);

        let z500 = table.pressure_by_name("z", 500).unwrap();
        assert_eq!(z500.code(), 129);
        assert_eq!(z500.level(), Some(500));

        assert_eq!(table.surface_by_code(167).unwrap(), t2m);
        assert_eq!(table.pressure_by_code(129, 500).unwrap(), z500);
    }

    #[test]
    fn test_table_rejects_kind_mismatch() {
        let table = small_table();
        // "z" is a pressure family, "t2m" is surface-only
        assert!(table.surface_by_name("z").is_none());
        assert!(table.pressure_by_name("t2m", 500).is_none());
        assert!(table.surface_by_code(129).is_none());
        assert!(table.pressure_by_code(167, 500).is_none());
    }

    #[test]
    fn test_table_rejects_duplicates() {
        let dup_name = VariableTable::new(vec![
            VariableDef::surface(167, "t2m", "2m_temperature", "t2m", "K"),
            VariableDef::surface(168, "t2m", "2m_dewpoint_temperature", "d2m", "K"),
        ]);
        assert!(matches!(
            dup_name,
            Err(CharneyError::Configuration { .. })
        ));

        let dup_code = VariableTable::new(vec![
            VariableDef::surface(167, "t2m", "2m_temperature", "t2m", "K"),
            VariableDef::surface(167, "skt", "skin_temperature", "skt", "K"),
        ]);
        assert!(matches!(
            dup_code,
            Err(CharneyError::Configuration { .. })
        ));
    }

    #[test]
    fn test_instantiate_enforces_level_presence() {
        let surface = VariableDef::surface(167, "t2m", "2m_temperature", "t2m", "K");
        let pressure = VariableDef::pressure(129, "z", "geopotential", "z", "m**2 s**-2");

        assert!(surface.instantiate(None).is_ok());
        assert!(surface.instantiate(Some(500)).is_err());
        assert!(pressure.instantiate(Some(500)).is_ok());
        assert!(pressure.instantiate(None).is_err());
    }

    #[test]
    fn test_name_lookups_through_table() {
        let table = small_table();
        let z500 = table.pressure_by_name("z", 500).unwrap();
        assert_eq!(table.archive_name(&z500).unwrap(), "geopotential");
        assert_eq!(table.short_name(&z500).unwrap(), "z");

        let unknown = Variable::Surface {
            code: 999,
            name: "mystery".to_string(),
        };
        assert!(table.archive_name(&unknown).is_err());
    }
}
