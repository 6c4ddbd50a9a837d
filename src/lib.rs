// Minesweeper board engine with a terminal front-end
// The engine (board + game) has no I/O; the remaining modules host it in a terminal

pub mod mns_board; // Grid model, mine placement, flood-fill reveal
pub mod mns_config; // Preferences and best-time records
pub mod mns_game; // Difficulty presets, session state machine, engine host
pub mod mns_lang; // Multi-language string resources
pub mod mns_palette; // Terminal color depth handling
pub mod mns_ui; // Terminal rendering and event handling

pub use mns_board::{Board, BoardConfig, BoardError, Cell, CellView, Pos, RevealOutcome};
pub use mns_game::{Difficulty, Game, Outcome, Phase, Session, SoundEffect, SoundSink};
