//! # Database of species
//!
//! Ordered collection of species records with standard thermodynamic models.
//! Documents are JSON: either a list of records or an object with a "SPECIES" list.
//! ```json
//! [
//!   {"name": "Ca+2", "ion_size": 5.0,
//!    "thermo": {"model": "MaierKelley", "dG": -553580.0, "dH": -542830.0, "S": -53.1}},
//!   {"name": "CaHCO3+",
//!    "thermo": {"model": "Reaction", "reactants": {"Ca+2": 1, "HCO3-": 1}, "log_k": 1.106, "delta_h": 11255.0}}
//! ]
//! ```
//! Species defined by formation reactions are resolved recursively when fetched:
//! the models of their reactants are attached, element and charge balance is checked,
//! cycles of definitions are rejected.
use super::Species::{AggregateState, Species, SpeciesRecord};
use super::thermo_api::{StandardThermoModel, ThermoEnum, ThermoError};
use crate::Thermodynamics::molmass::FormulaError;
use crate::Utils::load_from_file::{LoadData, LoadError};
use crate::library_manager::with_library_manager;
use log::{debug, info, warn};
use prettytable::{Table, row};
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use thiserror::Error;

const DEFAULT_DATABASE: &str = include_str!("../../assets/default_database.json");

#[derive(Debug, Error)]
pub enum DatabaseError {
    #[error("species '{0}' not found in database")]
    SpeciesNotFound(String),
    #[error("species '{0}' is defined more than once")]
    Duplicate(String),
    #[error("failed to parse database document: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("invalid formula of species '{species}': {source}")]
    Formula {
        species: String,
        source: FormulaError,
    },
    #[error("invalid thermodynamic model of species '{species}': {source}")]
    Thermo {
        species: String,
        source: ThermoError,
    },
    #[error("cyclic formation reactions: {0}")]
    CyclicReaction(String),
    #[error("formation reaction of '{species}' is not balanced in {what}")]
    UnbalancedReaction { species: String, what: String },
    #[error("failed to read database file: {0}")]
    Load(#[from] LoadError),
}

#[derive(Debug, Clone, Default)]
pub struct Database {
    species: Vec<Species>,
    index: HashMap<String, usize>,
}

impl Database {
    /// empty database
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_records(records: Vec<SpeciesRecord>) -> Result<Self, DatabaseError> {
        let mut db = Self::new();
        for record in records {
            db.add_record(record)?;
        }
        db.check_reactions()?;
        info!("database with {} species is ready", db.len());
        Ok(db)
    }

    /// document is a list of records or an object with the "SPECIES" list
    pub fn from_value(document: Value) -> Result<Self, DatabaseError> {
        let list = match document {
            Value::Array(_) => document,
            Value::Object(mut map) => match map.remove("SPECIES").or_else(|| map.remove("species")) {
                Some(list) => list,
                None => {
                    return Err(DatabaseError::Parse(serde::de::Error::custom(
                        "database object has no 'SPECIES' list",
                    )));
                }
            },
            _ => {
                return Err(DatabaseError::Parse(serde::de::Error::custom(
                    "database document must be a list or an object",
                )));
            }
        };
        let records: Vec<SpeciesRecord> = serde_json::from_value(list)?;
        Self::from_records(records)
    }

    pub fn from_json_str(document: &str) -> Result<Self, DatabaseError> {
        let value: Value = serde_json::from_str(document)?;
        Self::from_value(value)
    }

    /// file with a "SPECIES" section or plain JSON
    pub fn from_file(file_name: &str) -> Result<Self, DatabaseError> {
        let document = LoadData::new(file_name.to_string()).load_database()?;
        info!("loading database from '{}'", file_name);
        Self::from_value(document)
    }

    /// database named in the library configuration, the built-in one if none is configured
    pub fn from_config() -> Result<Self, DatabaseError> {
        let path = with_library_manager(|manager| manager.database_path().to_string());
        if path.is_empty() {
            Self::built_in()
        } else {
            Self::from_file(&path)
        }
    }

    /// aqueous carbonate, chloride and sulfate species, common minerals and NASA7 gases
    pub fn built_in() -> Result<Self, DatabaseError> {
        Self::from_json_str(DEFAULT_DATABASE)
    }

    fn add_record(&mut self, record: SpeciesRecord) -> Result<(), DatabaseError> {
        if self.index.contains_key(&record.name) {
            return Err(DatabaseError::Duplicate(record.name));
        }
        let species = Species::from_record(record)?;
        debug!("added species {}", species);
        self.index
            .insert(species.name().to_string(), self.species.len());
        self.species.push(species);
        Ok(())
    }

    /// adds one species; reactions must refer to species already present
    pub fn add_species(&mut self, record: SpeciesRecord) -> Result<(), DatabaseError> {
        let name = record.name.clone();
        self.add_record(record)?;
        if let Err(e) = self.resolve(&name, &mut Vec::new()) {
            self.species.pop();
            self.index.remove(&name);
            return Err(e);
        }
        Ok(())
    }

    fn check_reactions(&self) -> Result<(), DatabaseError> {
        for species in &self.species {
            if matches!(species.thermo(), ThermoEnum::Reaction(_)) {
                self.resolve(species.name(), &mut Vec::new())?;
            }
        }
        Ok(())
    }

    fn raw(&self, name: &str) -> Result<&Species, DatabaseError> {
        self.index
            .get(name)
            .map(|&i| &self.species[i])
            .ok_or_else(|| DatabaseError::SpeciesNotFound(name.to_string()))
    }

    fn resolve(&self, name: &str, stack: &mut Vec<String>) -> Result<Species, DatabaseError> {
        if stack.iter().any(|s| s == name) {
            stack.push(name.to_string());
            return Err(DatabaseError::CyclicReaction(stack.join(" -> ")));
        }
        let mut species = self.raw(name)?.clone();
        let ThermoEnum::Reaction(reaction) = species.thermo() else {
            return Ok(species);
        };
        let reactants = reaction.reactants.clone();
        stack.push(name.to_string());
        let mut models = Vec::with_capacity(reactants.len());
        let mut elements: BTreeMap<String, f64> = BTreeMap::new();
        let mut charge = 0.0;
        for (reactant, nu) in &reactants {
            let r = self.resolve(reactant, stack)?;
            for (element, count) in r.elements() {
                *elements.entry(element.clone()).or_insert(0.0) += nu * count;
            }
            charge += nu * r.charge();
            models.push((*nu, r.thermo().clone()));
        }
        stack.pop();
        let all: BTreeSet<&String> = elements.keys().chain(species.elements().keys()).collect();
        for element in all {
            let lhs = elements.get(element).copied().unwrap_or(0.0);
            if (lhs - species.element_coefficient(element)).abs() > 1e-9 {
                return Err(DatabaseError::UnbalancedReaction {
                    species: name.to_string(),
                    what: element.clone(),
                });
            }
        }
        if (charge - species.charge()).abs() > 1e-9 {
            return Err(DatabaseError::UnbalancedReaction {
                species: name.to_string(),
                what: "charge".to_string(),
            });
        }
        if let ThermoEnum::Reaction(r) = species.thermo_mut() {
            r.resolve(models);
        }
        Ok(species)
    }

    /// species ready for evaluation of standard properties
    pub fn species(&self, name: &str) -> Result<Species, DatabaseError> {
        self.resolve(name, &mut Vec::new())
    }

    pub fn species_list(&self, names: &[&str]) -> Result<Vec<Species>, DatabaseError> {
        names.iter().map(|name| self.species(name)).collect()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    pub fn species_names(&self) -> Vec<&str> {
        self.species.iter().map(|s| s.name()).collect()
    }

    pub fn len(&self) -> usize {
        self.species.len()
    }

    pub fn is_empty(&self) -> bool {
        self.species.is_empty()
    }

    /// species made only of the given elements, optionally of one aggregate state.
    /// Element symbols may be given with charges or phase marks stripped ("Ca", "C", "O", "H").
    pub fn species_with_elements(
        &self,
        elements: &[&str],
        state: Option<AggregateState>,
    ) -> Result<Vec<Species>, DatabaseError> {
        let allowed: BTreeSet<&str> = elements.iter().map(|e| e.trim()).collect();
        let unknown: Vec<&&str> = allowed
            .iter()
            .filter(|e| crate::Thermodynamics::molmass::atomic_mass(e).is_none())
            .collect();
        if !unknown.is_empty() {
            warn!("unknown element symbols in selection: {:?}", unknown);
        }
        self.species
            .iter()
            .filter(|s| state.is_none_or(|st| s.aggregate_state() == st))
            .filter(|s| s.elements().keys().all(|e| allowed.contains(e.as_str())))
            .map(|s| self.species(s.name()))
            .collect()
    }

    pub fn species_with_aggregate_state(
        &self,
        state: AggregateState,
    ) -> Result<Vec<Species>, DatabaseError> {
        self.species
            .iter()
            .filter(|s| s.aggregate_state() == state)
            .map(|s| self.species(s.name()))
            .collect()
    }

    /// records in the document form, reactions unresolved
    pub fn to_records(&self) -> Vec<SpeciesRecord> {
        self.species
            .iter()
            .map(|s| SpeciesRecord {
                name: s.name().to_string(),
                formula: Some(s.formula().to_string()),
                aggregate_state: s.aggregate_state(),
                ion_size: s.ion_size(),
                thermo: s.thermo().clone(),
            })
            .collect()
    }

    pub fn to_json_string(&self) -> Result<String, DatabaseError> {
        Ok(serde_json::to_string_pretty(&self.to_records())?)
    }

    pub fn print_species_table(&self) {
        let mut table = Table::new();
        table.add_row(row!["Species", "Formula", "State", "Charge", "M, g/mol", "Model"]);
        for s in &self.species {
            table.add_row(row![
                s.name(),
                s.formula(),
                s.aggregate_state(),
                s.charge(),
                format!("{:.4}", s.molar_mass() * 1000.0),
                s.thermo().model_name()
            ]);
        }
        println!("___________________DATABASE SPECIES________________________");
        table.printstd();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Thermodynamics::DBhandlers::thermo_api::{R, StandardThermoModel, T0, log10_k};
    use approx::assert_relative_eq;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const SMALL: &str = r#"[
        {"name": "Ca+2", "thermo": {"model": "MaierKelley", "dG": -553580.0, "dH": -542830.0, "S": -53.1}},
        {"name": "HCO3-", "thermo": {"model": "MaierKelley", "dG": -586770.0, "dH": -691990.0, "S": 91.2}},
        {"name": "CaHCO3+", "thermo": {"model": "Reaction", "reactants": {"Ca+2": 1, "HCO3-": 1},
            "log_k": 1.106, "delta_h": 11255.0}}
    ]"#;

    #[test]
    fn test_load_and_resolve() {
        let db = Database::from_json_str(SMALL).unwrap();
        assert_eq!(db.len(), 3);
        assert_eq!(db.species_names(), vec!["Ca+2", "HCO3-", "CaHCO3+"]);
        let complex = db.species("CaHCO3+").unwrap();
        let props = complex.standard_props(T0, 1e5).unwrap();
        let expected = -553580.0 - 586770.0 - R * T0 * std::f64::consts::LN_10 * 1.106;
        assert_relative_eq!(props.G0, expected, epsilon = 1e-6);
        assert!(matches!(
            db.species("Mg+2"),
            Err(DatabaseError::SpeciesNotFound(name)) if name == "Mg+2"
        ));
    }

    #[test]
    fn test_duplicate_and_unbalanced() {
        let doc = r#"[
            {"name": "H+", "thermo": {"model": "ConstCp", "dG": 0, "dH": 0, "S": 0}},
            {"name": "H+", "thermo": {"model": "ConstCp", "dG": 0, "dH": 0, "S": 0}}
        ]"#;
        assert!(matches!(
            Database::from_json_str(doc),
            Err(DatabaseError::Duplicate(_))
        ));
        let doc = r#"[
            {"name": "Ca+2", "thermo": {"model": "ConstCp", "dG": 0, "dH": 0, "S": 0}},
            {"name": "CaOH+", "thermo": {"model": "Reaction", "reactants": {"Ca+2": 1}, "log_k": 1.0}}
        ]"#;
        assert!(matches!(
            Database::from_json_str(doc),
            Err(DatabaseError::UnbalancedReaction { .. })
        ));
    }

    #[test]
    fn test_cyclic_reactions() {
        let doc = r#"[
            {"name": "A", "formula": "H2", "thermo": {"model": "Reaction", "reactants": {"B": 1}, "log_k": 1.0}},
            {"name": "B", "formula": "H2", "thermo": {"model": "Reaction", "reactants": {"A": 1}, "log_k": 1.0}}
        ]"#;
        assert!(matches!(
            Database::from_json_str(doc),
            Err(DatabaseError::CyclicReaction(_))
        ));
    }

    #[test]
    fn test_sections_and_file() {
        let doc = format!("{{\"SPECIES\": {}}}", SMALL);
        assert_eq!(Database::from_json_str(&doc).unwrap().len(), 3);
        assert!(Database::from_json_str("{\"OTHER\": []}").is_err());

        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "SPECIES").unwrap();
        writeln!(file, "{}", SMALL).unwrap();
        let db = Database::from_file(file.path().to_str().unwrap()).unwrap();
        assert!(db.contains("CaHCO3+"));
        assert!(matches!(
            Database::from_file("no_such_database.json"),
            Err(DatabaseError::Load(LoadError::FileNotFound(_)))
        ));
        let mut broken = NamedTempFile::new().unwrap();
        writeln!(broken, "SPECIES").unwrap();
        writeln!(broken, "[{{\"name\": ").unwrap();
        assert!(matches!(
            Database::from_file(broken.path().to_str().unwrap()),
            Err(DatabaseError::Load(LoadError::Json { .. }))
        ));
    }

    #[test]
    fn test_add_species() {
        let mut db = Database::from_json_str(SMALL).unwrap();
        let bad: SpeciesRecord = serde_json::from_str(
            r#"{"name": "CaCl+", "thermo": {"model": "Reaction", "reactants": {"Ca+2": 1, "Cl-": 1}, "log_k": 0.4}}"#,
        )
        .unwrap();
        assert!(db.add_species(bad).is_err());
        assert_eq!(db.len(), 3);
        let good: SpeciesRecord = serde_json::from_str(
            r#"{"name": "Cl-", "thermo": {"model": "ConstCp", "dG": -131228.0, "dH": -167159.0, "S": 56.5}}"#,
        )
        .unwrap();
        db.add_species(good).unwrap();
        assert_eq!(db.len(), 4);
    }

    #[test]
    fn test_built_in_database() {
        let db = Database::built_in().unwrap();
        for name in ["H2O(aq)", "H+", "OH-", "CO2(aq)", "HCO3-", "Calcite", "CO2(g)", "H2O(g)"] {
            assert!(db.contains(name), "{} is missing", name);
        }
        let aqueous = db
            .species_with_elements(&["H", "O", "C"], Some(AggregateState::Aqueous))
            .unwrap();
        let names: Vec<&str> = aqueous.iter().map(|s| s.name()).collect();
        assert!(names.contains(&"HCO3-"));
        assert!(!names.contains(&"Ca+2"));
        assert!(!names.contains(&"CO2(g)"));
        let gases = db.species_with_aggregate_state(AggregateState::Gas).unwrap();
        assert!(gases.iter().all(|s| s.aggregate_state() == AggregateState::Gas));

        // water autoprotolysis: log Kw = -14.0 at 25 C
        let water = db.species("H2O(aq)").unwrap();
        let h = db.species("H+").unwrap();
        let oh = db.species("OH-").unwrap();
        let log_kw = log10_k(
            &[(-1.0, water.thermo()), (1.0, h.thermo()), (1.0, oh.thermo())],
            T0,
            1e5,
        )
        .unwrap();
        assert_relative_eq!(log_kw, -14.0, epsilon = 0.02);

        // calcite solubility product: log Ksp = -8.48
        let calcite = db.species("Calcite").unwrap();
        let ca = db.species("Ca+2").unwrap();
        let co3 = db.species("CO3-2").unwrap();
        let log_ksp = log10_k(
            &[(-1.0, calcite.thermo()), (1.0, ca.thermo()), (1.0, co3.thermo())],
            T0,
            1e5,
        )
        .unwrap();
        assert_relative_eq!(log_ksp, -8.48, epsilon = 0.02);
        assert!(calcite.thermo().temperature_range().is_none());

        // NASA7 gases are reported in the apparent convention: dfG(CO2, g) = -394.36 kJ/mol
        let co2_g = db.species("CO2(g)").unwrap();
        let g = co2_g.standard_props(T0, 1e5).unwrap().G0;
        assert_relative_eq!(g, -394_359.0, epsilon = 100.0);
        // Henry constant of CO2: log K = -1.47
        let co2_aq = db.species("CO2(aq)").unwrap();
        let log_kh = log10_k(&[(-1.0, co2_g.thermo()), (1.0, co2_aq.thermo())], T0, 1e5).unwrap();
        assert_relative_eq!(log_kh, -1.47, epsilon = 0.03);
    }

    #[test]
    fn test_print_species_table() {
        let db = Database::from_json_str(SMALL).unwrap();
        let species = db.species_list(&db.species_names()).unwrap();
        let models: Vec<&str> = species.iter().map(|s| s.thermo().model_name()).collect();
        assert_eq!(models, vec!["MaierKelley", "MaierKelley", "Reaction"]);
        db.print_species_table();
        Database::built_in().unwrap().print_species_table();
    }

    #[test]
    fn test_records_roundtrip_keeps_models() {
        let db = Database::from_json_str(SMALL).unwrap();
        let text = db.to_json_string().unwrap();
        let again = Database::from_json_str(&text).unwrap();
        assert_eq!(again.species_names(), db.species_names());
        let model = again.species("CaHCO3+").unwrap();
        assert_eq!(model.thermo().model_name(), "Reaction");
    }
}
