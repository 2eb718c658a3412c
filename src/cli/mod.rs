// CLI module
// Interactive surface, menu and subcommand handlers

pub mod commands;
mod console;
pub mod menu;

pub use commands::{build_workbench, GenerateOptions};
pub use console::{Console, TerminalConsole};
pub use menu::{menu_items, parse_choice, run_menu, MenuChoice, MenuItem};
