pub mod board_config;

pub use board_config::{load_board_config, BoardConfig};
