#[allow(non_snake_case)]
pub mod Examples;
#[allow(non_snake_case)]
pub mod Thermodynamics;
#[allow(non_snake_case)]
pub mod Utils;
pub mod library_manager;

use Examples::database_examples::database_examples;
use Examples::equilibrium_examples::equilibrium_examples;
use simplelog::{ColorChoice, Config, LevelFilter, TermLogger, TerminalMode};

pub fn main() {
    let _ = TermLogger::init(
        LevelFilter::Info,
        Config::default(),
        TerminalMode::Mixed,
        ColorChoice::Auto,
    );
    let task: usize = 3;
    if task < 2 {
        database_examples(task);
    } else {
        equilibrium_examples(task - 2);
    }
}
