/// readers of database documents and species lists
pub mod load_from_file;
