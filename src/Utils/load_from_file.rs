use log::{error, info, warn};
use serde_json::Value;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("file '{0}' does not exist")]
    FileNotFound(String),
    #[error("failed to read file: {0}")]
    Io(#[from] std::io::Error),
    #[error("no '{header}' header found in file '{file}'")]
    MissingSection { header: String, file: String },
    #[error("error parsing data at line {line} of file '{file}': {source}")]
    Json {
        file: String,
        line: usize,
        source: serde_json::Error,
    },
    #[error("no species found in file '{0}'")]
    Empty(String),
}

/// Reads sections of text documents: a header line in capitals ("SPECIES", "SPECIES LIST")
/// followed by the data up to the next header or the end of the file.
pub struct LoadData {
    pub file_name: String,
}

impl LoadData {
    pub fn new(file_name: String) -> Self {
        LoadData { file_name }
    }
    /// JSON with species records
    pub fn load_database(&self) -> Result<Value, LoadError> {
        load_database_from_file(&self.file_name)
    }
    /// comma or line separated list of species names
    pub fn load_species_list(&self) -> Result<Vec<String>, LoadError> {
        load_species_list(&self.file_name)
    }
}

fn read_lines(file_name: &str) -> Result<Vec<String>, LoadError> {
    let path = Path::new(file_name);
    if !path.exists() {
        return Err(LoadError::FileNotFound(file_name.to_string()));
    }
    let reader = BufReader::new(File::open(path)?);
    Ok(reader.lines().collect::<Result<Vec<_>, _>>()?)
}

fn is_header(line: &str) -> bool {
    let trimmed = line.trim();
    !trimmed.is_empty()
        && trimmed.chars().any(|c| c.is_ascii_uppercase())
        && trimmed
            .chars()
            .all(|c| c.is_ascii_uppercase() || c == '_' || c == ' ')
}

/// start (line after the header) and end (next header or end of file) of the section
fn find_section(lines: &[String], headers: &[&str]) -> Option<(usize, usize)> {
    let start_index = lines
        .iter()
        .position(|line| headers.contains(&line.trim().to_uppercase().as_str()))?
        + 1;
    let end_index = (start_index..lines.len())
        .find(|&i| is_header(&lines[i]))
        .unwrap_or(lines.len());
    Some((start_index, end_index))
}

/// Parses a document for species data under the "SPECIES" or "DATABASE" header.
/// A file that is plain JSON (no header at all) is parsed as a whole.
pub fn load_database_from_file(file_name: &str) -> Result<Value, LoadError> {
    let lines = read_lines(file_name)?;
    let (start_index, end_index) = match find_section(&lines, &["SPECIES", "DATABASE"]) {
        Some(section) => section,
        None => {
            let first = lines.iter().find(|l| !l.trim().is_empty());
            match first.map(|l| l.trim_start().chars().next()) {
                Some(Some('[')) | Some(Some('{')) => (0, lines.len()),
                _ => {
                    return Err(LoadError::MissingSection {
                        header: "SPECIES".to_string(),
                        file: file_name.to_string(),
                    });
                }
            }
        }
    };
    let section = lines[start_index..end_index].join("\n");
    match serde_json::from_str::<Value>(&section) {
        Ok(data) => {
            info!("Successfully parsed species data from file '{}'", file_name);
            if data.as_array().map(|a| a.is_empty()).unwrap_or(false) {
                warn!("Species data in file '{}' is empty", file_name);
            }
            Ok(data)
        }
        Err(e) => {
            // line of the file where the section parser stopped
            let error_column = e.column();
            let actual_line = start_index + e.line().saturating_sub(1);
            error!(
                "Error parsing species data at line {}, column {}: {}",
                actual_line + 1,
                error_column,
                e
            );
            if actual_line < lines.len() {
                let problem_line = &lines[actual_line];
                error!("Problematic line: {}", problem_line);
                if error_column >= 1 && error_column <= problem_line.len() {
                    let pointer = " ".repeat(error_column - 1) + "^";
                    error!("{}", pointer);
                }
            }
            Err(LoadError::Json {
                file: file_name.to_string(),
                line: actual_line + 1,
                source: e,
            })
        }
    }
}

/// load from file list of species under the "SPECIES LIST" or "SUBSTANCES" header
pub fn load_species_list(file_name: &str) -> Result<Vec<String>, LoadError> {
    let lines = read_lines(file_name)?;
    let Some((start_index, end_index)) = find_section(&lines, &["SPECIES LIST", "SUBSTANCES"])
    else {
        return Err(LoadError::MissingSection {
            header: "SPECIES LIST".to_string(),
            file: file_name.to_string(),
        });
    };
    let vec_of_species: Vec<String> = lines[start_index..end_index]
        .join(",")
        .split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect();
    if vec_of_species.is_empty() {
        return Err(LoadError::Empty(file_name.to_string()));
    }
    Ok(vec_of_species)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_load_database_with_header() {
        let mut temp_file = NamedTempFile::new().unwrap();
        writeln!(temp_file, "Some header text").unwrap();
        writeln!(temp_file, "SPECIES").unwrap();
        writeln!(temp_file, "[").unwrap();
        writeln!(
            temp_file,
            "  {{\"name\": \"H+\", \"thermo\": {{\"model\": \"ConstCp\", \"dG\": 0, \"dH\": 0, \"S\": 0}}}}"
        )
        .unwrap();
        writeln!(temp_file, "]").unwrap();
        writeln!(temp_file, "ANOTHER_HEADER").unwrap();
        writeln!(temp_file, "Some other content").unwrap();

        let loader = LoadData::new(temp_file.path().to_str().unwrap().to_string());
        let data = loader.load_database().unwrap();
        let records = data.as_array().unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0]["name"], "H+");
    }

    #[test]
    fn test_load_plain_json() {
        let mut temp_file = NamedTempFile::new().unwrap();
        writeln!(temp_file, "{{\"SPECIES\": []}}").unwrap();
        let data = load_database_from_file(temp_file.path().to_str().unwrap()).unwrap();
        assert!(data.get("SPECIES").is_some());
    }

    #[test]
    fn test_load_database_errors() {
        let result = load_database_from_file("non_existent_file.json");
        assert!(matches!(result, Err(LoadError::FileNotFound(ref f)) if f == "non_existent_file.json"));

        let mut temp_file = NamedTempFile::new().unwrap();
        writeln!(temp_file, "just text").unwrap();
        let result = load_database_from_file(temp_file.path().to_str().unwrap());
        assert!(matches!(result, Err(LoadError::MissingSection { ref header, .. }) if header == "SPECIES"));

        let mut temp_file = NamedTempFile::new().unwrap();
        writeln!(temp_file, "SPECIES").unwrap();
        writeln!(temp_file, "[{{\"name\": }}]").unwrap();
        let result = load_database_from_file(temp_file.path().to_str().unwrap());
        match result {
            Err(LoadError::Json { line, .. }) => assert_eq!(line, 2),
            other => panic!("expected a JSON error, got {:?}", other),
        }
    }

    #[test]
    fn test_load_species_list_success() {
        let mut temp_file = NamedTempFile::new().unwrap();
        writeln!(temp_file, "Some header").unwrap();
        writeln!(temp_file, "SPECIES LIST").unwrap();
        writeln!(temp_file, "H2O(aq), H+, OH-").unwrap();
        writeln!(temp_file, "CO2(aq) , HCO3-").unwrap();
        writeln!(temp_file, "ANOTHER_HEADER").unwrap();

        let substances = load_species_list(temp_file.path().to_str().unwrap()).unwrap();
        assert_eq!(substances, vec!["H2O(aq)", "H+", "OH-", "CO2(aq)", "HCO3-"]);
    }

    #[test]
    fn test_load_species_list_no_header_or_empty() {
        let mut temp_file = NamedTempFile::new().unwrap();
        writeln!(temp_file, "H2O, CO2, CH4").unwrap();
        let result = load_species_list(temp_file.path().to_str().unwrap());
        let err = result.unwrap_err();
        assert!(matches!(err, LoadError::MissingSection { .. }));
        assert!(err.to_string().contains("'SPECIES LIST' header"));

        let mut temp_file = NamedTempFile::new().unwrap();
        writeln!(temp_file, "SUBSTANCES").unwrap();
        writeln!(temp_file).unwrap();
        writeln!(temp_file, "ANOTHER_HEADER").unwrap();
        let result = load_species_list(temp_file.path().to_str().unwrap());
        assert!(matches!(result, Err(LoadError::Empty(_))));
    }
}
