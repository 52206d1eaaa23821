use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use dungeon_engine::{
    action_for_command, execute, read_save, write_save, Action, ActorKind, ActorTime, Command,
    CommandParseError, CommandRegistry, LevelRenderer, SavePayload, World,
};
use thiserror::Error;
use tracing::{debug, error, info, warn};

use super::ascii_renderer::AsciiRenderer;
use super::bootstrap::{now_ms, AppWiring};

const UNDO_HISTORY_LIMIT: usize = 256;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum LoopOutcome {
    Quit,
    InputClosed,
    TurnLimit,
    ScheduleEmpty,
}

#[derive(Debug, Error)]
pub(crate) enum LoopError {
    #[error("console i/o failed: {0}")]
    Io(#[from] io::Error),
}

enum PlayerTurn {
    Act(Action),
    Replan,
    Quit,
    InputClosed,
}

pub(crate) struct TurnLoop {
    state: SavePayload,
    history: Vec<SavePayload>,
    commands: CommandRegistry,
    renderer: AsciiRenderer,
    save_path: PathBuf,
    max_turns: Option<u64>,
    turns_taken: u64,
}

impl TurnLoop {
    pub(crate) fn new(start: SavePayload, save_path: PathBuf, max_turns: Option<u64>) -> Self {
        Self {
            state: start,
            history: Vec::new(),
            commands: CommandRegistry::with_builtins(),
            renderer: AsciiRenderer::default(),
            save_path,
            max_turns,
            turns_taken: 0,
        }
    }

    pub(crate) fn state(&self) -> &SavePayload {
        &self.state
    }

    pub(crate) fn turns_taken(&self) -> u64 {
        self.turns_taken
    }

    pub(crate) fn run<R: BufRead, W: Write>(
        &mut self,
        mut input: R,
        out: &mut W,
    ) -> Result<LoopOutcome, LoopError> {
        info!(
            scheduled = self.state.schedule.len(),
            current_time = self.state.current_time,
            "turn_loop_started"
        );
        self.look(out)?;

        loop {
            if let Some(limit) = self.max_turns {
                if self.turns_taken >= limit {
                    info!(turns = self.turns_taken, "turn_limit_reached");
                    return Ok(LoopOutcome::TurnLimit);
                }
            }

            let Some(entry) = self.state.schedule.next(self.state.current_time) else {
                match self.state.schedule.earliest_time() {
                    Some(time) => {
                        debug!(from = self.state.current_time, to = time, "time_advanced");
                        self.state.current_time = time;
                        continue;
                    }
                    None => {
                        info!("schedule_empty");
                        return Ok(LoopOutcome::ScheduleEmpty);
                    }
                }
            };

            let kind = self.state.world.actors().get(entry.actor).map(|actor| actor.kind);
            let action = match kind {
                Some(ActorKind::Player) => match self.player_turn(entry, &mut input, out)? {
                    PlayerTurn::Act(action) => action,
                    PlayerTurn::Replan => continue,
                    PlayerTurn::Quit => return Ok(LoopOutcome::Quit),
                    PlayerTurn::InputClosed => return Ok(LoopOutcome::InputClosed),
                },
                Some(ActorKind::Idle) => Action::Wait,
                None => {
                    warn!(actor = %entry.actor, "unknown_actor_unscheduled");
                    let (schedule, _) = self.state.schedule.remove(entry);
                    self.state.schedule = schedule;
                    continue;
                }
            };

            let is_player = kind == Some(ActorKind::Player);
            match execute(&self.state.world, &action) {
                Ok(world) => self.commit(entry, &action, world, is_player),
                Err(err) => {
                    warn!(actor = %entry.actor, error = %err, "action_failed");
                    if is_player {
                        writeln!(out, "{err}")?;
                    } else {
                        let world = self.state.world.clone();
                        self.commit(entry, &action, world, false);
                    }
                }
            }
        }
    }

    fn player_turn<R: BufRead, W: Write>(
        &mut self,
        entry: ActorTime,
        input: &mut R,
        out: &mut W,
    ) -> Result<PlayerTurn, LoopError> {
        let label = self
            .state
            .world
            .actors()
            .get(entry.actor)
            .map(|actor| actor.label.clone())
            .unwrap_or_else(|| entry.actor.to_string());

        loop {
            write!(out, "[t={}] {label}> ", self.state.current_time)?;
            out.flush()?;

            let mut line = String::new();
            if input.read_line(&mut line)? == 0 {
                return Ok(PlayerTurn::InputClosed);
            }
            let command = match self.commands.parse_line(&line) {
                Ok(command) => command,
                Err(CommandParseError::Empty) => continue,
                Err(err) => {
                    writeln!(out, "{err}")?;
                    continue;
                }
            };
            if let Some(action) = action_for_command(&command, entry.actor) {
                return Ok(PlayerTurn::Act(action));
            }

            match command {
                Command::Look => self.look(out)?,
                Command::Help => {
                    for line in self.commands.help_lines() {
                        writeln!(out, "{line}")?;
                    }
                }
                Command::Save => self.save(out)?,
                Command::Load => {
                    if self.load(out)? {
                        return Ok(PlayerTurn::Replan);
                    }
                }
                Command::Undo => {
                    if self.undo(out)? {
                        return Ok(PlayerTurn::Replan);
                    }
                }
                Command::Quit => return Ok(PlayerTurn::Quit),
                Command::Move { .. } | Command::Turn { .. } | Command::Wait => {}
            }
        }
    }

    /// Only player decisions are undo points, so one `undo` rewinds to the
    /// previous prompt together with every idle turn taken since.
    fn commit(&mut self, entry: ActorTime, action: &Action, world: World, undo_point: bool) {
        if undo_point {
            self.remember(self.state.clone());
        }

        let due = self.state.current_time.saturating_add(action.time_cost());
        let (schedule, _) = self.state.schedule.remove(entry);
        self.state = SavePayload {
            world,
            schedule: schedule.add(entry.actor, due),
            current_time: self.state.current_time,
        };
        self.turns_taken += 1;
        debug!(actor = %entry.actor, ?action, next_turn = due, "turn_taken");
    }

    fn remember(&mut self, snapshot: SavePayload) {
        self.history.push(snapshot);
        if self.history.len() > UNDO_HISTORY_LIMIT {
            self.history.remove(0);
        }
    }

    fn look<W: Write>(&mut self, out: &mut W) -> io::Result<()> {
        let frame = self.renderer.render(&self.state.world, now_ms());
        debug!(frames = self.renderer.frames_drawn(), "frame_drawn");
        write!(out, "{frame}")
    }

    fn save<W: Write>(&self, out: &mut W) -> io::Result<()> {
        match write_save(&self.save_path, &self.state) {
            Ok(()) => writeln!(out, "saved to {}", self.save_path.display()),
            Err(err) => {
                warn!(path = %self.save_path.display(), error = %err, "save_failed");
                writeln!(out, "save failed: {err}")
            }
        }
    }

    fn load<W: Write>(&mut self, out: &mut W) -> io::Result<bool> {
        match read_save(&self.save_path) {
            Ok(payload) => {
                let previous = std::mem::replace(&mut self.state, payload);
                self.remember(previous);
                writeln!(out, "loaded {}", self.save_path.display())?;
                self.look(out)?;
                Ok(true)
            }
            Err(err) => {
                warn!(path = %self.save_path.display(), error = %err, "load_failed");
                writeln!(out, "load failed: {err}")?;
                Ok(false)
            }
        }
    }

    fn undo<W: Write>(&mut self, out: &mut W) -> io::Result<bool> {
        let Some(previous) = self.history.pop() else {
            writeln!(out, "nothing to undo")?;
            return Ok(false);
        };
        self.state = previous;
        info!(
            current_time = self.state.current_time,
            remaining = self.history.len(),
            "undo_applied"
        );
        writeln!(out, "undone")?;
        self.look(out)?;
        Ok(true)
    }
}

pub(crate) fn run(app: AppWiring) -> ExitCode {
    let save_path = app.paths.save_file(&app.config.save_slot);
    let mut turn_loop = TurnLoop::new(app.start, save_path, app.config.max_turns);

    let stdin = io::stdin();
    let stdout = io::stdout();
    match turn_loop.run(stdin.lock(), &mut stdout.lock()) {
        Ok(outcome) => {
            info!(
                ?outcome,
                turns = turn_loop.turns_taken(),
                current_time = turn_loop.state().current_time,
                "session_finished"
            );
            ExitCode::SUCCESS
        }
        Err(err) => {
            error!(error = %err, "session_failed");
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use dungeon_engine::{
        Actor, ActorSchedule, Building, Creature, Direction, Layer, Level, Location,
    };
    use tempfile::TempDir;

    use super::*;

    struct Fixture {
        _temp: TempDir,
        turn_loop: TurnLoop,
    }

    fn fixture(max_turns: Option<u64>) -> Fixture {
        let level = (0..3)
            .fold(Level::new(0), |level, x| {
                level.set(
                    Layer::Floor,
                    Location::new(x, 0),
                    Building::floor("flagstone", Direction::East, true),
                )
            })
            .with_wall_between(Location::new(1, 0), Direction::East, Building::wall("brick"));
        let (world, hero) = World::new(level).add_actor(Actor::new("hero", ActorKind::Player));
        let (world, sentry) = world.add_actor(Actor::new("sentry", ActorKind::Idle));
        let (world, _) = world
            .spawn_creature_at(
                Creature::new("knight", Direction::East),
                Location::new(0, 0),
                Some(hero),
            )
            .expect("hero");
        let (world, _) = world
            .spawn_creature_at(
                Creature::new("skeleton", Direction::West),
                Location::new(2, 0),
                Some(sentry),
            )
            .expect("sentry");
        let start = SavePayload {
            world: world.with_player(Some(hero)),
            schedule: ActorSchedule::new().add(hero, 0).add(sentry, 0),
            current_time: 0,
        };

        let temp = TempDir::new().expect("tempdir");
        let save_path = temp.path().join("saves").join("test.save.json");
        Fixture {
            _temp: temp,
            turn_loop: TurnLoop::new(start, save_path, max_turns),
        }
    }

    fn run_script(turn_loop: &mut TurnLoop, script: &str) -> (LoopOutcome, String) {
        let mut out = Vec::new();
        let outcome = turn_loop.run(script.as_bytes(), &mut out).expect("run");
        (outcome, String::from_utf8(out).expect("utf8"))
    }

    fn hero_position(turn_loop: &TurnLoop) -> (Location, Direction) {
        let world = &turn_loop.state().world;
        let hero = world.player().expect("player");
        let creature = world.creature_for_actor(hero).expect("creature");
        let position = world.position_of(creature).expect("position");
        (position.location, position.facing)
    }

    #[test]
    fn player_moves_and_idle_actor_waits() {
        let mut fixture = fixture(None);
        let (outcome, _) = run_script(&mut fixture.turn_loop, "forward\nquit\n");

        assert_eq!(outcome, LoopOutcome::Quit);
        assert_eq!(
            hero_position(&fixture.turn_loop),
            (Location::new(1, 0), Direction::East)
        );
        assert_eq!(fixture.turn_loop.turns_taken(), 2);
        assert_eq!(fixture.turn_loop.state().current_time, 1);
    }

    #[test]
    fn blocked_move_leaves_world_and_asks_again() {
        let mut fixture = fixture(None);
        let (outcome, output) =
            run_script(&mut fixture.turn_loop, "forward 2\nturn left\nquit\n");

        assert_eq!(outcome, LoopOutcome::Quit);
        assert!(output.contains("blocked leaving (1, 0) towards east"));
        assert_eq!(
            hero_position(&fixture.turn_loop),
            (Location::new(0, 0), Direction::North)
        );
    }

    #[test]
    fn undo_rewinds_to_previous_prompt() {
        let mut fixture = fixture(None);
        let (_, output) = run_script(&mut fixture.turn_loop, "forward\nundo\nquit\n");

        assert!(output.contains("undone"));
        assert_eq!(
            hero_position(&fixture.turn_loop),
            (Location::new(0, 0), Direction::East)
        );
        assert_eq!(fixture.turn_loop.state().current_time, 0);
    }

    #[test]
    fn undo_without_history_is_reported() {
        let mut fixture = fixture(None);
        let (_, output) = run_script(&mut fixture.turn_loop, "undo\nquit\n");
        assert!(output.contains("nothing to undo"));
    }

    #[test]
    fn save_then_load_restores_saved_state() {
        let mut fixture = fixture(None);
        let (outcome, output) =
            run_script(&mut fixture.turn_loop, "save\nforward\nload\nquit\n");

        assert_eq!(outcome, LoopOutcome::Quit);
        assert!(output.contains("saved to"));
        assert!(output.contains("loaded"));
        assert!(fixture.turn_loop.save_path.is_file());
        assert_eq!(
            hero_position(&fixture.turn_loop),
            (Location::new(0, 0), Direction::East)
        );
        assert_eq!(fixture.turn_loop.state().current_time, 0);
    }

    #[test]
    fn load_without_save_reports_failure() {
        let mut fixture = fixture(None);
        let (outcome, output) = run_script(&mut fixture.turn_loop, "load\nquit\n");
        assert_eq!(outcome, LoopOutcome::Quit);
        assert!(output.contains("load failed"));
    }

    #[test]
    fn unknown_command_is_reported_without_consuming_turn() {
        let mut fixture = fixture(None);
        let (_, output) = run_script(&mut fixture.turn_loop, "dance\n\nquit\n");
        assert!(output.contains("unknown command 'dance'"));
        assert_eq!(fixture.turn_loop.turns_taken(), 0);
    }

    #[test]
    fn help_lists_commands() {
        let mut fixture = fixture(None);
        let (_, output) = run_script(&mut fixture.turn_loop, "help\nquit\n");
        assert!(output.contains("forward [steps:i32] - Step forward"));
    }

    #[test]
    fn turn_limit_stops_the_loop() {
        let mut fixture = fixture(Some(3));
        let (outcome, _) = run_script(&mut fixture.turn_loop, "wait\nwait\nwait\nwait\n");
        assert_eq!(outcome, LoopOutcome::TurnLimit);
        assert_eq!(fixture.turn_loop.turns_taken(), 3);
    }

    #[test]
    fn end_of_input_closes_the_loop() {
        let mut fixture = fixture(None);
        let (outcome, _) = run_script(&mut fixture.turn_loop, "wait\n");
        assert_eq!(outcome, LoopOutcome::InputClosed);
        assert_eq!(fixture.turn_loop.turns_taken(), 2);
    }

    #[test]
    fn empty_schedule_ends_immediately() {
        let mut turn_loop = TurnLoop::new(
            SavePayload::default(),
            PathBuf::from("unused.save.json"),
            None,
        );
        let (outcome, output) = run_script(&mut turn_loop, "");
        assert_eq!(outcome, LoopOutcome::ScheduleEmpty);
        assert!(output.contains("(empty level)"));
    }

    #[test]
    fn repeated_loads_keep_history_bounded() {
        let mut fixture = fixture(None);
        let mut script = String::from("save\n");
        for _ in 0..UNDO_HISTORY_LIMIT + 10 {
            script.push_str("load\n");
        }
        script.push_str("quit\n");

        let (outcome, _) = run_script(&mut fixture.turn_loop, &script);
        assert_eq!(outcome, LoopOutcome::Quit);
        assert_eq!(fixture.turn_loop.history.len(), UNDO_HISTORY_LIMIT);
    }
}
