/// Module to parse chemical formulas of species: atomic composition, electric charge and molar mass.
///
/// Formulas may carry aggregate state marks ("CO2(aq)", "H2O(g)"), charge suffixes ("Ca+2", "Ca++",
/// "HCO3-", "SO4[2-]"), nested brackets ("Ca(NO3)2", "K4(Fe(CN)6)"), decimal stoichiometry ("Fe0.95O"),
/// hydrate parts ("CaSO4:2H2O") and user-defined groups of atoms (e.g. Me (methyl) = {"C":1, "H":3}).
use nalgebra::DMatrix;
use regex::Regex;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::OnceLock;
use thiserror::Error;

// Define a struct to hold element data
pub struct Element {
    name: &'static str,
    atomic_mass: f64,
}

// Define a list of elements and their atomic masses, g/mol
const ELEMENTS: &[Element] = &[
    Element { name: "H", atomic_mass: 1.008 },
    Element { name: "He", atomic_mass: 4.0026 },
    Element { name: "Li", atomic_mass: 6.94 },
    Element { name: "Be", atomic_mass: 9.0122 },
    Element { name: "B", atomic_mass: 10.81 },
    Element { name: "C", atomic_mass: 12.011 },
    Element { name: "N", atomic_mass: 14.007 },
    Element { name: "O", atomic_mass: 15.999 },
    Element { name: "F", atomic_mass: 18.998 },
    Element { name: "Ne", atomic_mass: 20.18 },
    Element { name: "Na", atomic_mass: 22.99 },
    Element { name: "Mg", atomic_mass: 24.305 },
    Element { name: "Al", atomic_mass: 26.98 },
    Element { name: "Si", atomic_mass: 28.085 },
    Element { name: "P", atomic_mass: 30.974 },
    Element { name: "S", atomic_mass: 32.065 },
    Element { name: "Cl", atomic_mass: 35.45 },
    Element { name: "Ar", atomic_mass: 39.948 },
    Element { name: "K", atomic_mass: 39.098 },
    Element { name: "Ca", atomic_mass: 40.078 },
    Element { name: "Sc", atomic_mass: 44.9559 },
    Element { name: "Ti", atomic_mass: 47.867 },
    Element { name: "V", atomic_mass: 50.9415 },
    Element { name: "Cr", atomic_mass: 51.9961 },
    Element { name: "Mn", atomic_mass: 54.938 },
    Element { name: "Fe", atomic_mass: 55.845 },
    Element { name: "Co", atomic_mass: 58.933 },
    Element { name: "Ni", atomic_mass: 58.693 },
    Element { name: "Cu", atomic_mass: 63.546 },
    Element { name: "Zn", atomic_mass: 65.38 },
    Element { name: "Ga", atomic_mass: 69.723 },
    Element { name: "Ge", atomic_mass: 72.63 },
    Element { name: "As", atomic_mass: 74.9216 },
    Element { name: "Se", atomic_mass: 78.971 },
    Element { name: "Br", atomic_mass: 79.904 },
    Element { name: "Kr", atomic_mass: 83.798 },
    Element { name: "Rb", atomic_mass: 85.4678 },
    Element { name: "Sr", atomic_mass: 87.62 },
    Element { name: "Y", atomic_mass: 88.9059 },
    Element { name: "Zr", atomic_mass: 91.224 },
    Element { name: "Nb", atomic_mass: 92.9064 },
    Element { name: "Mo", atomic_mass: 95.95 },
    Element { name: "Ag", atomic_mass: 107.8682 },
    Element { name: "Cd", atomic_mass: 112.414 },
    Element { name: "Sn", atomic_mass: 118.71 },
    Element { name: "Sb", atomic_mass: 121.76 },
    Element { name: "I", atomic_mass: 126.904 },
    Element { name: "Xe", atomic_mass: 131.293 },
    Element { name: "Cs", atomic_mass: 132.905 },
    Element { name: "Ba", atomic_mass: 137.327 },
    Element { name: "W", atomic_mass: 183.84 },
    Element { name: "Pt", atomic_mass: 195.084 },
    Element { name: "Au", atomic_mass: 196.967 },
    Element { name: "Hg", atomic_mass: 200.592 },
    Element { name: "Pb", atomic_mass: 207.2 },
    Element { name: "U", atomic_mass: 238.029 },
];

/// atomic mass of an element in g/mol, None for unknown symbols
pub fn atomic_mass(symbol: &str) -> Option<f64> {
    ELEMENTS
        .iter()
        .find(|e| e.name == symbol)
        .map(|e| e.atomic_mass)
}

#[derive(Debug, Error, PartialEq)]
pub enum FormulaError {
    #[error("empty formula")]
    Empty,
    #[error("unknown element or group '{0}' in formula '{1}'")]
    UnknownElement(String, String),
    #[error("unbalanced brackets in formula '{0}'")]
    UnbalancedBrackets(String),
    #[error("invalid character '{0}' in formula '{1}'")]
    InvalidCharacter(char, String),
    #[error("invalid number '{0}' in formula '{1}'")]
    InvalidNumber(String, String),
}

/// result of parsing: number of atoms of every element and the electric charge
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ParsedFormula {
    pub elements: BTreeMap<String, f64>,
    pub charge: f64,
}

impl ParsedFormula {
    /// number of atoms of the element (zero if absent)
    pub fn coefficient(&self, element: &str) -> f64 {
        self.elements.get(element).copied().unwrap_or(0.0)
    }
}

// aggregate state marks at the end of the species names
fn filter_phases_marks(formula: &str) -> String {
    let mut formula = formula.trim().to_string();
    let phases = ["(aq)", "(AQ)", "(cr)", "(cd)", "(g)", "(G)", "(l)", "(L)", "(s)", "(S)", "(c)", "(C)"];
    loop {
        let before = formula.len();
        for phase in phases {
            if formula.ends_with(phase) {
                formula.truncate(formula.len() - phase.len());
            }
        }
        if formula.len() == before {
            break;
        }
    }
    formula
}

fn charge_regex() -> &'static Regex {
    static CHARGE: OnceLock<Regex> = OnceLock::new();
    CHARGE.get_or_init(|| {
        Regex::new(
            r"^(?P<body>.+?)(?:\[(?P<bn>\d*)(?P<bs>[+-])\]|(?P<signs>\++|-+)(?P<n>\d*))$",
        )
        .expect("charge regex is valid")
    })
}

/// splits "Ca+2" into ("Ca", 2.0), "HCO3-" into ("HCO3", -1.0), "SO4[2-]" into ("SO4", -2.0)
fn split_charge(formula: &str) -> (String, f64) {
    if let Some(caps) = charge_regex().captures(formula) {
        let body = caps["body"].to_string();
        if let Some(sign) = caps.name("bs") {
            let sign = if sign.as_str() == "+" { 1.0 } else { -1.0 };
            let n = caps
                .name("bn")
                .and_then(|n| n.as_str().parse::<f64>().ok())
                .unwrap_or(1.0);
            return (body, sign * n);
        }
        if let Some(signs) = caps.name("signs") {
            let signs = signs.as_str();
            let sign = if signs.starts_with('+') { 1.0 } else { -1.0 };
            let n = caps
                .name("n")
                .and_then(|n| n.as_str().parse::<f64>().ok())
                .unwrap_or(signs.len() as f64);
            return (body, sign * n);
        }
    }
    (formula.to_string(), 0.0)
}

struct FormulaParser<'a> {
    chars: Vec<char>,
    pos: usize,
    formula: &'a str,
    groups: Option<&'a HashMap<String, HashMap<String, usize>>>,
}

impl<'a> FormulaParser<'a> {
    fn new(
        part: &str,
        formula: &'a str,
        groups: Option<&'a HashMap<String, HashMap<String, usize>>>,
    ) -> Self {
        Self {
            chars: part.chars().collect(),
            pos: 0,
            formula,
            groups,
        }
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    /// reads integer or decimal number at the current position
    fn number(&mut self) -> Result<Option<f64>, FormulaError> {
        let start = self.pos;
        while let Some(c) = self.peek() {
            let decimal_point = c == '.'
                && self
                    .chars
                    .get(self.pos + 1)
                    .map(|n| n.is_ascii_digit())
                    .unwrap_or(false);
            if c.is_ascii_digit() || decimal_point {
                self.pos += 1;
            } else {
                break;
            }
        }
        if start == self.pos {
            return Ok(None);
        }
        let text: String = self.chars[start..self.pos].iter().collect();
        text.parse::<f64>()
            .map(Some)
            .map_err(|_| FormulaError::InvalidNumber(text, self.formula.to_string()))
    }

    fn sequence(&mut self, closing: Option<char>) -> Result<BTreeMap<String, f64>, FormulaError> {
        let mut counts: BTreeMap<String, f64> = BTreeMap::new();
        loop {
            let Some(c) = self.peek() else {
                if closing.is_some() {
                    return Err(FormulaError::UnbalancedBrackets(self.formula.to_string()));
                }
                break;
            };
            if Some(c) == closing {
                self.pos += 1;
                break;
            }
            match c {
                '(' | '[' | '{' => {
                    self.pos += 1;
                    let close = match c {
                        '(' => ')',
                        '[' => ']',
                        _ => '}',
                    };
                    let inner = self.sequence(Some(close))?;
                    let multiplier = self.number()?.unwrap_or(1.0);
                    for (element, count) in inner {
                        *counts.entry(element).or_insert(0.0) += count * multiplier;
                    }
                }
                ')' | ']' | '}' => {
                    return Err(FormulaError::UnbalancedBrackets(self.formula.to_string()));
                }
                c if c.is_ascii_uppercase() => {
                    let start = self.pos;
                    self.pos += 1;
                    while let Some(l) = self.peek() {
                        if l.is_ascii_lowercase() {
                            self.pos += 1;
                        } else {
                            break;
                        }
                    }
                    let symbol: String = self.chars[start..self.pos].iter().collect();
                    let count = self.number()?.unwrap_or(1.0);
                    self.add_symbol(&mut counts, &symbol, count)?;
                }
                other => {
                    return Err(FormulaError::InvalidCharacter(
                        other,
                        self.formula.to_string(),
                    ));
                }
            }
        }
        Ok(counts)
    }

    // chemical groups are converted into regular elements, i.e. Me (methyl) group is converted into {"C":1, "H":3}
    fn add_symbol(
        &self,
        counts: &mut BTreeMap<String, f64>,
        symbol: &str,
        count: f64,
    ) -> Result<(), FormulaError> {
        if let Some(group) = self.groups.and_then(|g| g.get(symbol)) {
            for (atom, quantity) in group {
                *counts.entry(atom.clone()).or_insert(0.0) += *quantity as f64 * count;
            }
            return Ok(());
        }
        if atomic_mass(symbol).is_none() {
            return Err(FormulaError::UnknownElement(
                symbol.to_string(),
                self.formula.to_string(),
            ));
        }
        *counts.entry(symbol.to_string()).or_insert(0.0) += count;
        Ok(())
    }
}

/// Function to parse a chemical formula and return elements with their counts and the charge. Argument groups is optional. It is
/// needed if formula contains special names for chemical groups like Me, Ph, etc. In that case this argument should contain the names of these groups
/// and their atomic composition { "Me":{"C":1, "H":3}}
pub fn parse_formula(
    formula: &str,
    groups: Option<&HashMap<String, HashMap<String, usize>>>,
) -> Result<ParsedFormula, FormulaError> {
    let cleaned: String = filter_phases_marks(formula)
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect();
    if cleaned.is_empty() {
        return Err(FormulaError::Empty);
    }
    let (body, charge) = split_charge(&cleaned);
    let mut elements: BTreeMap<String, f64> = BTreeMap::new();
    for part in body.split(|c| c == ':' || c == '*' || c == '·') {
        if part.is_empty() {
            return Err(FormulaError::Empty);
        }
        let mut parser = FormulaParser::new(part, formula, groups);
        // hydrate water and similar parts carry a leading multiplier: CaSO4:2H2O
        let multiplier = parser.number()?.unwrap_or(1.0);
        let counts = parser.sequence(None)?;
        for (element, count) in counts {
            *elements.entry(element).or_insert(0.0) += count * multiplier;
        }
    }
    if elements.is_empty() {
        return Err(FormulaError::Empty);
    }
    Ok(ParsedFormula { elements, charge })
}

// Function to calculate the molar mass (g/mol) of a substance given its chemical formula
pub fn calculate_molar_mass(
    formula: &str,
    groups: Option<&HashMap<String, HashMap<String, usize>>>,
) -> Result<(f64, ParsedFormula), FormulaError> {
    let parsed = parse_formula(formula, groups)?;
    let molar_mass = molar_mass_of_elements(&parsed.elements);
    Ok((molar_mass, parsed))
}

/// molar mass (g/mol) of the atomic composition; unknown symbols contribute nothing
pub fn molar_mass_of_elements(elements: &BTreeMap<String, f64>) -> f64 {
    elements
        .iter()
        .map(|(element, count)| atomic_mass(element).unwrap_or(0.0) * count)
        .sum()
}

// Function to calculate the molar mass of a vector of chemical formulas
pub fn calculate_molar_mass_of_vector_of_subs(
    vec_of_formulae: &[&str],
    groups: Option<&HashMap<String, HashMap<String, usize>>>,
) -> Result<Vec<f64>, FormulaError> {
    vec_of_formulae
        .iter()
        .map(|formula| calculate_molar_mass(formula, groups).map(|(m, _)| m))
        .collect()
}

/// elements composition matrix: rows are elements (sorted), columns are formulas
pub fn create_elem_composition_matrix(
    vec_of_formulae: &[&str],
    groups: Option<&HashMap<String, HashMap<String, usize>>>,
) -> Result<(DMatrix<f64>, Vec<String>), FormulaError> {
    let mut set_of_elems: BTreeSet<String> = BTreeSet::new();
    let mut vec_of_compositions = Vec::new();
    for formula in vec_of_formulae.iter() {
        let parsed = parse_formula(formula, groups)?;
        set_of_elems.extend(parsed.elements.keys().cloned());
        vec_of_compositions.push(parsed);
    }
    let unique_vec_of_elems: Vec<String> = set_of_elems.into_iter().collect();
    let mut matrix = DMatrix::zeros(unique_vec_of_elems.len(), vec_of_compositions.len());
    for (j, composition) in vec_of_compositions.iter().enumerate() {
        for (i, element) in unique_vec_of_elems.iter().enumerate() {
            matrix[(i, j)] = composition.coefficient(element);
        }
    }
    Ok((matrix, unique_vec_of_elems))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn counts(pairs: &[(&str, f64)]) -> BTreeMap<String, f64> {
        pairs.iter().map(|(k, v)| (k.to_string(), *v)).collect()
    }

    #[test]
    fn test_parse_formula() {
        let parsed = parse_formula("C6H8O6", None).unwrap();
        assert_eq!(parsed.elements, counts(&[("C", 6.0), ("H", 8.0), ("O", 6.0)]));
        assert_eq!(parsed.charge, 0.0);

        let parsed = parse_formula("Na(NO3)2", None).unwrap();
        assert_eq!(parsed.elements, counts(&[("Na", 1.0), ("N", 2.0), ("O", 6.0)]));

        let parsed = parse_formula("C5H6OOH", None).unwrap();
        assert_eq!(parsed.elements, counts(&[("C", 5.0), ("H", 7.0), ("O", 2.0)]));

        let parsed = parse_formula("K4(Fe(CN)6)", None).unwrap();
        assert_eq!(
            parsed.elements,
            counts(&[("C", 6.0), ("Fe", 1.0), ("K", 4.0), ("N", 6.0)])
        );
    }

    #[test]
    fn test_phase_marks_and_charges() {
        let parsed = parse_formula("CO2(aq)", None).unwrap();
        assert_eq!(parsed.elements, counts(&[("C", 1.0), ("O", 2.0)]));

        assert_eq!(parse_formula("Ca+2", None).unwrap().charge, 2.0);
        assert_eq!(parse_formula("Ca++", None).unwrap().charge, 2.0);
        assert_eq!(parse_formula("HCO3-", None).unwrap().charge, -1.0);
        assert_eq!(parse_formula("CO3-2", None).unwrap().charge, -2.0);
        assert_eq!(parse_formula("CO3--", None).unwrap().charge, -2.0);
        assert_eq!(parse_formula("SO4[2-]", None).unwrap().charge, -2.0);
        assert_eq!(parse_formula("H+", None).unwrap().charge, 1.0);

        let parsed = parse_formula("Fe(OH)2+", None).unwrap();
        assert_eq!(parsed.charge, 1.0);
        assert_eq!(parsed.elements, counts(&[("Fe", 1.0), ("H", 2.0), ("O", 2.0)]));
    }

    #[test]
    fn test_hydrates_and_decimals() {
        let parsed = parse_formula("CaSO4:2H2O", None).unwrap();
        assert_eq!(
            parsed.elements,
            counts(&[("Ca", 1.0), ("H", 4.0), ("O", 6.0), ("S", 1.0)])
        );
        let parsed = parse_formula("Fe0.95O", None).unwrap();
        assert_relative_eq!(parsed.coefficient("Fe"), 0.95);
        assert_relative_eq!(parsed.coefficient("O"), 1.0);
    }

    #[test]
    fn test_errors() {
        assert_eq!(parse_formula("", None), Err(FormulaError::Empty));
        assert!(matches!(
            parse_formula("Xx2O", None),
            Err(FormulaError::UnknownElement(symbol, _)) if symbol == "Xx"
        ));
        assert!(matches!(
            parse_formula("Ca(NO3", None),
            Err(FormulaError::UnbalancedBrackets(_))
        ));
        assert!(matches!(
            parse_formula("CaNO3)2", None),
            Err(FormulaError::UnbalancedBrackets(_))
        ));
        assert!(matches!(
            parse_formula("H2O%", None),
            Err(FormulaError::InvalidCharacter('%', _))
        ));
    }

    #[test]
    fn test_calculate_molar_mass() {
        let (molar_mass, _) = calculate_molar_mass("H2O(g)", None).unwrap();
        assert!((molar_mass - 18.01528).abs() < 1e-2);
        let (molar_mass, _) = calculate_molar_mass("NaCl", None).unwrap();
        assert!((molar_mass - 58.44).abs() < 1e-2);
        let (molar_mass, _) = calculate_molar_mass("CaCO3", None).unwrap();
        assert!((molar_mass - 100.087).abs() < 1e-2);
        let (molar_mass, _) = calculate_molar_mass("Ca(NO3)2", None).unwrap();
        assert!((molar_mass - 164.088).abs() < 1e-2);
        // charge does not change the molar mass
        let (m_ion, _) = calculate_molar_mass("Ca+2", None).unwrap();
        assert!((m_ion - 40.078).abs() < 1e-6);
    }

    #[test]
    fn test_calculate_molar_mass_of_vector_of_substances() {
        let masses =
            calculate_molar_mass_of_vector_of_subs(&["H2O", "NaCl", "C6H8O6", "Ca(NO3)2"], None)
                .unwrap();
        let expected = [18.01528, 58.44, 176.12, 164.088];
        for (m, e) in masses.iter().zip(expected.iter()) {
            assert!((m - e).abs() < 1e-2);
        }
    }

    #[test]
    fn test_with_groups() {
        let groups = HashMap::from([(
            "Me".to_string(),
            HashMap::from([("C".to_string(), 1), ("H".to_string(), 3)]),
        )]);
        let parsed = parse_formula("C6H5Me", Some(&groups)).unwrap();
        assert_eq!(parsed.elements, counts(&[("C", 7.0), ("H", 8.0)]));
        let parsed = parse_formula("C6H4(Me)2", Some(&groups)).unwrap();
        assert_eq!(parsed.elements, counts(&[("C", 8.0), ("H", 10.0)]));
    }

    #[test]
    fn test_element_matrix() {
        let (matrix, elements) =
            create_elem_composition_matrix(&["H2O", "NaCl", "C3H8", "CH4"], None).unwrap();
        assert_eq!(elements, vec!["C", "Cl", "H", "Na", "O"]);
        assert_eq!(matrix.nrows(), 5);
        assert_eq!(matrix.ncols(), 4);
        // H row, C3H8 column
        assert_eq!(matrix[(2, 2)], 8.0);
        assert_eq!(matrix[(0, 3)], 1.0);
    }
}
