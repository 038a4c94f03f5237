//! Main menu and practice loop.
//!
//! Progress is saved after every answered question and again whenever the
//! learner leaves practice or the menu, whether by `q`, Ctrl-C or end of
//! input.

use std::io;

use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::{debug, warn};

use portstudy_core::{ProgressState, ProgressStore, ProgressionEngine, Transition};

use crate::display;
use crate::prompt::{Input, LineSource};
use crate::question::{Question, QuestionGenerator};

/// What a typed answer line means for the current question.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Answer {
    Quit,
    Graded(bool),
    Invalid(&'static str),
}

/// Interpret one line typed in response to `question`.
pub fn parse_answer(line: &str, question: &Question) -> Answer {
    let line = line.trim();
    if line.eq_ignore_ascii_case("q") {
        return Answer::Quit;
    }

    if question.is_port_entry() {
        return match line.parse::<u16>() {
            Ok(port) if port >= 1 => Answer::Graded(question.check_port(port)),
            Ok(_) => Answer::Invalid("Invalid port number. Must be between 1 and 65535."),
            Err(_) if line.parse::<i64>().is_ok() => {
                Answer::Invalid("Invalid port number. Must be between 1 and 65535.")
            }
            Err(_) => Answer::Invalid("Please enter a valid number or 'q' to quit."),
        };
    }

    match line.parse::<usize>() {
        Ok(choice) if (1..=question.choices.len()).contains(&choice) => {
            Answer::Graded(question.check_choice(choice))
        }
        Ok(_) => Answer::Invalid("Invalid choice. Please try again."),
        Err(_) => Answer::Invalid("Please enter a valid number or 'q' to quit."),
    }
}

enum Flow {
    Next,
    Leave,
}

pub struct Session<'a> {
    store: &'a dyn ProgressStore,
    engine: &'a ProgressionEngine,
    generator: QuestionGenerator<'a>,
    state: ProgressState,
    rng: StdRng,
    correct: usize,
    total: usize,
    asked: usize,
}

impl<'a> Session<'a> {
    pub fn new(
        store: &'a dyn ProgressStore,
        engine: &'a ProgressionEngine,
        generator: QuestionGenerator<'a>,
        state: ProgressState,
    ) -> Self {
        Self::with_rng(store, engine, generator, state, StdRng::from_entropy())
    }

    pub fn with_rng(
        store: &'a dyn ProgressStore,
        engine: &'a ProgressionEngine,
        generator: QuestionGenerator<'a>,
        state: ProgressState,
        rng: StdRng,
    ) -> Self {
        Self {
            store,
            engine,
            generator,
            state,
            rng,
            correct: 0,
            total: 0,
            asked: 0,
        }
    }

    pub fn state(&self) -> &ProgressState {
        &self.state
    }

    /// `(correct, total)` for this run.
    pub fn stats(&self) -> (usize, usize) {
        (self.correct, self.total)
    }

    /// Run the menu until the learner exits. Returns whether the final save
    /// succeeded.
    pub fn run(&mut self, input: &mut dyn LineSource) -> bool {
        loop {
            display::main_menu(self.state.difficulty);
            let choice = match input.read_line(&display::menu_prompt()) {
                Ok(Input::Line(line)) => line,
                Ok(Input::Cancelled) => break,
                Err(e) => {
                    warn!(error = %e, "reading menu choice failed");
                    break;
                }
            };

            match choice.trim() {
                "1" => self.practice(input),
                "2" => {
                    let (correct, total) = self.stats();
                    display::statistics(correct, total, self.state.difficulty);
                    if !wait(input, "Press Enter to continue...") {
                        break;
                    }
                }
                "3" => break,
                _ => display::error("Invalid choice. Please try again."),
            }
        }

        let saved = self.store.save(&self.state);
        display::farewell(saved);
        saved
    }

    /// Ask questions until the learner quits, then save.
    pub fn practice(&mut self, input: &mut dyn LineSource) {
        display::practice_intro();

        loop {
            match self.ask(input) {
                Ok(Flow::Next) => {
                    if !wait(input, "Press Enter for next question...") {
                        break;
                    }
                }
                Ok(Flow::Leave) => break,
                Err(e) => {
                    // A failed question never ends the session.
                    warn!(error = %e, "practice question failed");
                    display::error(&format!("Error in practice question: {e}"));
                    if !wait(input, "Press Enter to try another question...") {
                        break;
                    }
                }
            }
        }

        display::notice("Study session ended. Saving progress...");
        if !self.store.save(&self.state) {
            display::error("Progress could not be saved. See the log for details.");
        }
    }

    fn ask(&mut self, input: &mut dyn LineSource) -> io::Result<Flow> {
        self.asked += 1;
        let question = self.generator.generate(&mut self.rng, self.state.difficulty);
        debug!(kind = ?question.kind, port = %question.port, "asking");

        display::practice_header(self.state.difficulty, self.asked);
        display::question(&question);

        let correct = loop {
            let line = match input.read_line(&display::answer_prompt(&question))? {
                Input::Line(line) => line,
                Input::Cancelled => return Ok(Flow::Leave),
            };
            match parse_answer(&line, &question) {
                Answer::Quit => return Ok(Flow::Leave),
                Answer::Graded(correct) => break correct,
                Answer::Invalid(message) => display::error(message),
            }
        };

        let transition = self.answer(correct);
        display::answer_feedback(correct, &question.answer);
        display::transition(transition);
        display::reference_info(&question);
        display::level_progress(&self.engine.progress(&self.state), &self.state.accuracy);

        if !self.store.save(&self.state) {
            display::error("Progress could not be saved. See the log for details.");
        }
        Ok(Flow::Next)
    }

    /// Record one graded answer in the session and the progression state.
    pub fn answer(&mut self, correct: bool) -> Transition {
        self.total += 1;
        if correct {
            self.correct += 1;
        }
        self.engine.record_answer(&mut self.state, correct)
    }
}

/// Pause for Enter. `false` means the learner asked to leave.
fn wait(input: &mut dyn LineSource, text: &str) -> bool {
    match input.read_line(&display::continue_prompt(text)) {
        Ok(Input::Line(line)) => !line.trim().eq_ignore_ascii_case("q"),
        Ok(Input::Cancelled) | Err(_) => false,
    }
}
