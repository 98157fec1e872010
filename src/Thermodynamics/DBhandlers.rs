/// database of species: records, lookup, resolution of formation reactions
/// # Examples
/// ```
/// use EquiThe::Thermodynamics::DBhandlers::Database::Database;
/// use EquiThe::Thermodynamics::DBhandlers::thermo_api::log10_k;
/// let db = Database::built_in().unwrap();
/// let calcite = db.species("Calcite").unwrap();
/// let ca = db.species("Ca+2").unwrap();
/// let co3 = db.species("CO3-2").unwrap();
/// // Calcite = Ca+2 + CO3-2
/// let log_k = log10_k(
///     &[(-1.0, calcite.thermo()), (1.0, ca.thermo()), (1.0, co3.thermo())],
///     298.15,
///     1e5,
/// )
/// .unwrap();
/// assert!((log_k + 8.48).abs() < 0.05);
/// ```
pub mod Database;
/// reference properties with Maier-Kelley heat capacity
pub mod MaierKelleyData;
/// NASA 7-coefficient polynomials
pub mod NASAdata;
/// species defined by formation reactions
pub mod ReactionData;
/// chemical species and database records
pub mod Species;
/// common interface of standard thermodynamic models
pub mod thermo_api;
