/// browsing the species database
pub mod database_examples;
/// equilibrium calculations: speciation, minerals, titrants, combustion, paths
pub mod equilibrium_examples;
