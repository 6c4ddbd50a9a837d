// Session state machine and engine host
// Difficulty presets, per-game Session, sound events and the Game wrapper the UI drives

use log::{debug, error, info};
use rand::{RngCore, SeedableRng};
use rand_pcg::Pcg32;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::time::{Duration, Instant};

use crate::mns_board::{Board, BoardConfig, BoardError, Pos, RevealOutcome};

/// Difficulty presets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Difficulty {
    Easy,   // 9x9, 10 mines
    Medium, // 16x16, 40 mines
    Hard,   // 30x16, 99 mines
}

impl Serialize for Difficulty {
    /// Serialize difficulty by name so config files stay readable
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(self.name())
    }
}

impl<'de> Deserialize<'de> for Difficulty {
    fn deserialize<D>(deserializer: D) -> Result<Difficulty, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Difficulty::ALL
            .into_iter()
            .find(|d| d.name().eq_ignore_ascii_case(&s))
            .ok_or_else(|| serde::de::Error::custom(format!("unknown difficulty: {}", s)))
    }
}

impl Difficulty {
    pub const ALL: [Difficulty; 3] = [Difficulty::Easy, Difficulty::Medium, Difficulty::Hard];

    /// Board dimensions and mine count for this difficulty
    pub fn config(&self) -> BoardConfig {
        let (width, height, mines) = match self {
            Difficulty::Easy => (9, 9, 10),
            Difficulty::Medium => (16, 16, 40),
            Difficulty::Hard => (30, 16, 99),
        };
        BoardConfig { width, height, mines }
    }

    /// Config file identifier; keep stable across versions
    pub fn name(&self) -> &'static str {
        match self {
            Difficulty::Easy => "Easy",
            Difficulty::Medium => "Medium",
            Difficulty::Hard => "Hard",
        }
    }

    pub fn to_index(&self) -> usize {
        match self {
            Difficulty::Easy => 0,
            Difficulty::Medium => 1,
            Difficulty::Hard => 2,
        }
    }

    pub fn from_index(i: usize) -> Option<Difficulty> {
        Difficulty::ALL.get(i).copied()
    }
}

/// Where a session is in its lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    AwaitingFirstClick,
    Active,
    Won,
    Lost,
}

impl Phase {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Phase::Won | Phase::Lost)
    }

    pub fn outcome(&self) -> Outcome {
        match self {
            Phase::AwaitingFirstClick | Phase::Active => Outcome::InProgress,
            Phase::Won => Outcome::Won,
            Phase::Lost => Outcome::Lost,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    InProgress,
    Won,
    Lost,
}

/// Named sound events for the presentation layer to realize
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SoundEffect {
    Click,
    Explosion,
    Flag,
    Win,
}

/// Receives sound events. Implemented by the host; never owned by a Session.
pub trait SoundSink {
    fn play(&mut self, effect: SoundEffect);
}

/// Discards every event
impl SoundSink for () {
    fn play(&mut self, _effect: SoundEffect) {}
}

/// Records events in order
impl SoundSink for Vec<SoundEffect> {
    fn play(&mut self, effect: SoundEffect) {
        self.push(effect);
    }
}

/// One playthrough under a fixed difficulty
#[derive(Debug, Clone)]
pub struct Session {
    difficulty: Difficulty,
    board: Board,
    seed: u64,                       // Seed of the placement RNG
    rng: Pcg32,                      // Seeded once at construction
    phase: Phase,
    start_time: Option<Instant>,     // Set by the first reveal
    elapsed: Duration,               // Frozen on the terminal transition
}

impl Session {
    /// Create a fresh session; mines are placed on the first reveal
    pub fn new(difficulty: Difficulty, seed: u64) -> Result<Self, BoardError> {
        let config = difficulty.config();
        config.validate()?;
        Ok(Self::from_board(difficulty, Board::new(config), seed))
    }

    /// Start a session on a board whose mines are already laid out
    pub fn with_layout(difficulty: Difficulty, mines: &[Pos]) -> Result<Self, BoardError> {
        let config = difficulty.config();
        let board = Board::with_mines(config.width, config.height, mines)?;
        Ok(Self::from_board(difficulty, board, 0))
    }

    fn from_board(difficulty: Difficulty, board: Board, seed: u64) -> Self {
        Session {
            difficulty,
            board,
            seed,
            rng: Pcg32::seed_from_u64(seed),
            phase: Phase::AwaitingFirstClick,
            start_time: None,
            elapsed: Duration::ZERO,
        }
    }

    pub fn difficulty(&self) -> Difficulty {
        self.difficulty
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn outcome(&self) -> Outcome {
        self.phase.outcome()
    }

    /// True once the first reveal has happened
    pub fn started(&self) -> bool {
        self.phase != Phase::AwaitingFirstClick
    }

    pub fn elapsed(&self) -> Duration {
        self.elapsed_at(Instant::now())
    }

    /// Time spent in the Active phase as of `now`
    pub fn elapsed_at(&self, now: Instant) -> Duration {
        match (self.phase, self.start_time) {
            (Phase::Active, Some(t0)) => now.saturating_duration_since(t0),
            _ => self.elapsed,
        }
    }

    /// Primary click: reveal a cell, placing mines first if needed
    pub fn reveal(&mut self, pos: Pos) -> Vec<SoundEffect> {
        let mut effects = Vec::new();
        if self.phase.is_terminal() {
            return effects;
        }
        match self.board.cell(pos) {
            Some(cell) if !cell.is_revealed() && !cell.is_flagged() => {}
            _ => return effects,
        }
        if !self.board.mines_placed() {
            let zone = self.board.exclusion_zone(pos);
            if let Err(e) = self.board.place_mines(&zone, &mut self.rng) {
                error!("mine placement failed: {}", e);
                return effects;
            }
        }
        if self.phase == Phase::AwaitingFirstClick {
            self.phase = Phase::Active;
            self.start_time = Some(Instant::now());
            debug!("session started at {} (seed {})", pos, self.seed);
        }
        match self.board.reveal(pos) {
            RevealOutcome::Mine => {
                self.board.reveal_all_mines();
                self.finish(Phase::Lost);
                effects.push(SoundEffect::Explosion);
            }
            RevealOutcome::Continue => {
                effects.push(SoundEffect::Click);
                if self.check_win() {
                    self.board.flag_all_mines();
                    self.finish(Phase::Won);
                    effects.push(SoundEffect::Win);
                }
            }
        }
        effects
    }

    /// Secondary click: toggle a flag on a hidden cell
    pub fn toggle_flag(&mut self, pos: Pos) -> Vec<SoundEffect> {
        let mut effects = Vec::new();
        if self.phase.is_terminal() || !self.board.toggle_flag(pos) {
            return effects;
        }
        effects.push(SoundEffect::Flag);
        if self.check_win() {
            self.board.flag_all_mines();
            self.finish(Phase::Won);
            effects.push(SoundEffect::Win);
        }
        effects
    }

    /// Won when every non-mine cell is revealed; never before the first reveal
    pub fn check_win(&self) -> bool {
        self.started() && self.board.is_cleared()
    }

    fn finish(&mut self, phase: Phase) {
        if let Some(t0) = self.start_time {
            self.elapsed = t0.elapsed();
        }
        self.phase = phase;
        info!(
            "{} game {:?} after {}s",
            self.difficulty.name(),
            phase,
            self.elapsed.as_secs()
        );
    }
}

/// Engine host: owns the current session, the injected sound sink and the menu overlay
pub struct Game<S: SoundSink> {
    session: Session,
    sounds: S,
    menu_open: bool,
    seeder: Pcg32, // Draws one seed per new session
}

impl<S: SoundSink> Game<S> {
    pub fn new(difficulty: Difficulty, sounds: S, seed: u64) -> Result<Self, BoardError> {
        let mut seeder = Pcg32::seed_from_u64(seed);
        let session = Session::new(difficulty, seeder.next_u64())?;
        Ok(Game {
            session,
            sounds,
            menu_open: false,
            seeder,
        })
    }

    /// Host an existing session, e.g. one built from a fixed layout
    pub fn with_session(session: Session, sounds: S) -> Self {
        let seeder = Pcg32::seed_from_u64(session.seed());
        Game {
            session,
            sounds,
            menu_open: false,
            seeder,
        }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn sounds(&self) -> &S {
        &self.sounds
    }

    pub fn sounds_mut(&mut self) -> &mut S {
        &mut self.sounds
    }

    pub fn menu_open(&self) -> bool {
        self.menu_open
    }

    pub fn on_primary_click(&mut self, pos: Pos) {
        if self.menu_open {
            return;
        }
        let effects = self.session.reveal(pos);
        self.emit(effects);
    }

    pub fn on_secondary_click(&mut self, pos: Pos) {
        if self.menu_open {
            return;
        }
        let effects = self.session.toggle_flag(pos);
        self.emit(effects);
    }

    /// Start over with the same difficulty
    pub fn on_restart_requested(&mut self) -> Result<(), BoardError> {
        self.replace_session(self.session.difficulty())
    }

    /// Start over with a new difficulty; accepted in any phase
    pub fn on_difficulty_change_requested(&mut self, difficulty: Difficulty) -> Result<(), BoardError> {
        self.replace_session(difficulty)
    }

    /// The menu may interrupt a game that has not started or has ended
    pub fn open_difficulty_menu(&mut self) -> bool {
        if self.session.phase() == Phase::Active {
            return false;
        }
        self.menu_open = true;
        true
    }

    pub fn close_difficulty_menu(&mut self) {
        self.menu_open = false;
    }

    fn replace_session(&mut self, difficulty: Difficulty) -> Result<(), BoardError> {
        self.session = Session::new(difficulty, self.seeder.next_u64())?;
        self.menu_open = false;
        debug!("new {} session (seed {})", difficulty.name(), self.session.seed());
        self.sounds.play(SoundEffect::Click);
        Ok(())
    }

    fn emit(&mut self, effects: Vec<SoundEffect>) {
        for effect in effects {
            self.sounds.play(effect);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mns_board::CellView;
    use std::collections::BTreeSet;

    // Ten mines on the 9x9 board; columns 0-3 are mine free
    const LAYOUT: [Pos; 10] = [
        Pos::new(5, 0),
        Pos::new(8, 0),
        Pos::new(6, 1),
        Pos::new(7, 2),
        Pos::new(4, 3),
        Pos::new(8, 3),
        Pos::new(6, 4),
        Pos::new(5, 6),
        Pos::new(8, 7),
        Pos::new(7, 8),
    ];

    fn layout_game() -> Game<Vec<SoundEffect>> {
        Game::with_session(Session::with_layout(Difficulty::Easy, &LAYOUT).unwrap(), Vec::new())
    }

    fn revealed(session: &Session) -> BTreeSet<Pos> {
        session
            .board()
            .iter()
            .filter(|(_, c)| c.is_revealed())
            .map(|(p, _)| p)
            .collect()
    }

    #[test]
    fn test_presets_are_valid() {
        for d in Difficulty::ALL {
            assert!(d.config().validate().is_ok(), "{}", d.name());
            assert_eq!(Difficulty::from_index(d.to_index()), Some(d));
        }
        assert_eq!(Difficulty::Hard.config(), BoardConfig { width: 30, height: 16, mines: 99 });
        assert_eq!(Difficulty::from_index(3), None);
    }

    #[test]
    fn test_new_session_defers_placement() {
        let session = Session::new(Difficulty::Medium, 9).unwrap();
        assert_eq!(session.phase(), Phase::AwaitingFirstClick);
        assert_eq!(session.outcome(), Outcome::InProgress);
        assert!(!session.board().mines_placed());
        assert!(!session.check_win());
        assert_eq!(session.elapsed(), Duration::ZERO);
    }

    #[test]
    fn test_first_click_is_safe_for_every_preset() {
        for d in Difficulty::ALL {
            for seed in 0..20u64 {
                let mut session = Session::new(d, seed).unwrap();
                let c = d.config();
                let first = Pos::new((seed as usize * 7) % c.width, (seed as usize * 3) % c.height);
                let effects = session.reveal(first);
                assert_eq!(effects.first(), Some(&SoundEffect::Click));
                assert_ne!(session.phase(), Phase::Lost);
                let board = session.board();
                assert_eq!(board.iter().filter(|(_, c)| c.has_mine()).count(), c.mines);
                assert!(board.exclusion_zone(first).iter().all(|&p| !board.cell(p).unwrap().has_mine()));
            }
        }
    }

    #[test]
    fn test_end_to_end_flood_fill() {
        let mut game = layout_game();
        game.on_primary_click(Pos::new(0, 8));

        // columns 0-4 minus the mine at (4,3), plus the pocket in the bottom corner
        let mut expected = BTreeSet::new();
        for y in 0..9 {
            for x in 0..5 {
                if Pos::new(x, y) != Pos::new(4, 3) {
                    expected.insert(Pos::new(x, y));
                }
            }
        }
        for p in [Pos::new(5, 7), Pos::new(6, 7), Pos::new(5, 8), Pos::new(6, 8)] {
            expected.insert(p);
        }
        assert_eq!(expected.len(), 48);
        assert_eq!(revealed(game.session()), expected);

        let board = game.session().board();
        assert_eq!(board.view(Pos::new(4, 3)), Some(CellView::Hidden));
        assert_eq!(board.view(Pos::new(3, 3)), Some(CellView::Open(1)));
        assert_eq!(board.view(Pos::new(4, 5)), Some(CellView::Open(1)));
        assert_eq!(board.view(Pos::new(6, 7)), Some(CellView::Open(2)));
        assert_eq!(board.view(Pos::new(5, 8)), Some(CellView::Open(0)));
        assert_eq!(board.view(Pos::new(5, 6)), Some(CellView::Hidden));
        assert_eq!(game.session().phase(), Phase::Active);
        assert_eq!(game.sounds(), &vec![SoundEffect::Click]);
    }

    #[test]
    fn test_win_after_all_safe_cells() {
        let mut game = layout_game();
        let safe: Vec<Pos> = game
            .session()
            .board()
            .iter()
            .filter(|(_, c)| !c.has_mine())
            .map(|(p, _)| p)
            .collect();
        for p in safe {
            game.on_primary_click(p);
        }
        let session = game.session();
        assert_eq!(session.outcome(), Outcome::Won);
        // mines were never touched by the player, then auto-flagged
        assert!(LAYOUT.iter().all(|&p| session.board().view(p) == Some(CellView::Flagged)));
        assert_eq!(game.sounds().last(), Some(&SoundEffect::Win));
        assert_eq!(game.sounds().iter().filter(|e| **e == SoundEffect::Win).count(), 1);
    }

    #[test]
    fn test_one_hidden_safe_cell_is_not_a_win() {
        let mut session = Session::with_layout(Difficulty::Easy, &LAYOUT).unwrap();
        let safe: Vec<Pos> = session
            .board()
            .iter()
            .filter(|(_, c)| !c.has_mine())
            .map(|(p, _)| p)
            .collect();
        let (last, rest) = safe.split_last().unwrap();
        for &p in rest {
            session.reveal(p);
        }
        assert!(!session.board().cell(*last).unwrap().is_revealed());
        assert!(!session.check_win());
        assert_eq!(session.outcome(), Outcome::InProgress);
    }

    #[test]
    fn test_mine_hit_loses_and_locks() {
        let mut game = layout_game();
        game.on_primary_click(Pos::new(0, 8));
        game.on_primary_click(Pos::new(4, 3));
        let session = game.session();
        assert_eq!(session.outcome(), Outcome::Lost);
        assert!(LAYOUT.iter().all(|&p| session.board().view(p) == Some(CellView::Mine)));
        assert_eq!(game.sounds(), &vec![SoundEffect::Click, SoundEffect::Explosion]);

        let before = revealed(game.session());
        let flags = game.session().board().flag_count();
        game.on_primary_click(Pos::new(8, 8));
        game.on_secondary_click(Pos::new(8, 8));
        assert_eq!(revealed(game.session()), before);
        assert_eq!(game.session().board().flag_count(), flags);
        assert_eq!(game.sounds().len(), 2);
    }

    #[test]
    fn test_loss_takes_precedence_over_win() {
        // single mine: clearing every safe cell except via the mine is impossible once it blows
        let mut session = Session::with_layout(Difficulty::Easy, &[Pos::new(0, 0)]).unwrap();
        let effects = session.reveal(Pos::new(0, 0));
        assert_eq!(effects, vec![SoundEffect::Explosion]);
        assert_eq!(session.outcome(), Outcome::Lost);
        assert!(!session.board().is_cleared());
    }

    #[test]
    fn test_won_session_rejects_mutation() {
        let mut session = Session::with_layout(Difficulty::Easy, &[Pos::new(8, 8)]).unwrap();
        session.reveal(Pos::new(0, 0));
        assert_eq!(session.outcome(), Outcome::Won);
        let frozen = session.elapsed();
        assert!(session.reveal(Pos::new(8, 8)).is_empty());
        assert!(session.toggle_flag(Pos::new(8, 8)).is_empty());
        assert_eq!(session.board().view(Pos::new(8, 8)), Some(CellView::Flagged));
        assert_eq!(session.elapsed_at(Instant::now() + Duration::from_secs(60)), frozen);
    }

    #[test]
    fn test_flag_guards_and_sounds() {
        let mut game = layout_game();
        game.on_secondary_click(Pos::new(0, 8));
        assert_eq!(game.sounds(), &vec![SoundEffect::Flag]);
        // flagging before the first reveal never wins
        assert_eq!(game.session().phase(), Phase::AwaitingFirstClick);

        game.on_primary_click(Pos::new(0, 8));
        assert_eq!(game.session().board().revealed_count(), 0);
        assert_eq!(game.sounds().len(), 1);

        game.on_secondary_click(Pos::new(0, 8));
        game.on_primary_click(Pos::new(0, 8));
        assert!(game.session().board().cell(Pos::new(0, 8)).unwrap().is_revealed());
        let sounds_before = game.sounds().len();
        game.on_secondary_click(Pos::new(0, 8));
        assert!(!game.session().board().cell(Pos::new(0, 8)).unwrap().is_flagged());
        assert_eq!(game.sounds().len(), sounds_before);
    }

    #[test]
    fn test_out_of_bounds_is_ignored() {
        let mut game = layout_game();
        game.on_primary_click(Pos::new(9, 0));
        game.on_secondary_click(Pos::new(0, 42));
        assert_eq!(game.session().phase(), Phase::AwaitingFirstClick);
        assert!(game.sounds().is_empty());
    }

    #[test]
    fn test_elapsed_only_counts_while_active() {
        let mut session = Session::with_layout(Difficulty::Easy, &LAYOUT).unwrap();
        let later = Instant::now() + Duration::from_secs(30);
        assert_eq!(session.elapsed_at(later), Duration::ZERO);
        session.reveal(Pos::new(0, 8));
        assert!(session.started());
        assert!(session.elapsed_at(later) >= Duration::from_secs(29));
    }

    #[test]
    fn test_restart_and_difficulty_change() {
        let mut game = Game::new(Difficulty::Easy, Vec::new(), 5).unwrap();
        game.on_primary_click(Pos::new(4, 4));
        assert!(game.session().started());
        let old_seed = game.session().seed();

        game.on_restart_requested().unwrap();
        assert_eq!(game.session().phase(), Phase::AwaitingFirstClick);
        assert_eq!(game.session().difficulty(), Difficulty::Easy);
        assert!(!game.session().board().mines_placed());
        assert_eq!(game.session().board().revealed_count(), 0);
        assert_ne!(game.session().seed(), old_seed);

        game.on_difficulty_change_requested(Difficulty::Hard).unwrap();
        let board = game.session().board();
        assert_eq!((board.width(), board.height(), board.mine_count()), (30, 16, 99));
        assert_eq!(game.session().elapsed(), Duration::ZERO);
        // the sink survives session replacement and keeps every event
        assert_eq!(game.sounds().iter().filter(|e| **e == SoundEffect::Click).count(), 3);
    }

    #[test]
    fn test_seeded_games_are_reproducible() {
        let play = || {
            let mut game = Game::new(Difficulty::Medium, (), 1234).unwrap();
            game.on_primary_click(Pos::new(8, 8));
            game.on_restart_requested().unwrap();
            game.on_primary_click(Pos::new(2, 3));
            game.session()
                .board()
                .iter()
                .filter(|(_, c)| c.has_mine())
                .map(|(p, _)| p)
                .collect::<Vec<_>>()
        };
        assert_eq!(play(), play());
    }

    #[test]
    fn test_difficulty_menu_overlay() {
        let mut game = layout_game();
        assert!(game.open_difficulty_menu());
        game.on_primary_click(Pos::new(0, 8));
        assert!(!game.session().started());
        game.close_difficulty_menu();

        game.on_primary_click(Pos::new(0, 8));
        assert!(!game.open_difficulty_menu());
        assert!(!game.menu_open());

        game.on_primary_click(Pos::new(4, 3));
        assert!(game.open_difficulty_menu());
        game.on_difficulty_change_requested(Difficulty::Medium).unwrap();
        assert!(!game.menu_open());
        assert_eq!(game.session().difficulty(), Difficulty::Medium);
    }

    #[test]
    fn test_difficulty_serde_by_name() {
        #[derive(Serialize, Deserialize)]
        struct Wrap {
            difficulty: Difficulty,
        }
        let s = toml::to_string(&Wrap { difficulty: Difficulty::Hard }).unwrap();
        assert_eq!(s.trim(), "difficulty = \"Hard\"");
        let back: Wrap = toml::from_str("difficulty = \"medium\"").unwrap();
        assert_eq!(back.difficulty, Difficulty::Medium);
        assert!(toml::from_str::<Wrap>("difficulty = \"Insane\"").is_err());
    }
}
