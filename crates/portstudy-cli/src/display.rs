//! Terminal rendering. Everything here only writes to stdout.

use std::io::{self, IsTerminal};

use crossterm::cursor::MoveTo;
use crossterm::execute;
use crossterm::style::{Color, Stylize};
use crossterm::terminal::{Clear, ClearType};

use portstudy_core::{AccuracyWindow, LoadFailure, Progress, Transition};

use crate::question::Question;

const BAR_WIDTH: usize = 50;
const RULE_WIDTH: usize = 72;

const BANNER: &str = r"
    ____             __  _____ __            __
   / __ \____  _____/ /_/ ___// /___  ______/ /_  __
  / /_/ / __ \/ ___/ __/\__ \/ __/ / / / __  / / / /
 / ____/ /_/ / /  / /_ ___/ / /_/ /_/ / /_/ / /_/ /
/_/    \____/_/   \__//____/\__/\__,_/\__,_/\__, /
                                           /____/
";

pub const MENU_OPTIONS: [&str; 3] = ["Practice Mode", "View Statistics", "Exit"];

/// Clears the screen when stdout is a terminal; no-op when piped.
pub fn clear_screen() {
    let mut stdout = io::stdout();
    if stdout.is_terminal() {
        let _ = execute!(stdout, Clear(ClearType::All), MoveTo(0, 0));
    }
}

pub fn main_menu(level: u8) {
    clear_screen();
    println!("{}", "=".repeat(RULE_WIDTH).cyan());
    println!("{}", BANNER.yellow());
    println!("{}", "=".repeat(RULE_WIDTH).cyan());
    println!("{}", format!("Current Level: {level}").green());
    println!("\n{}", "Choose your study mode:".cyan());
    for (i, option) in MENU_OPTIONS.iter().enumerate() {
        println!("{}. {option}", i + 1);
    }
}

pub fn menu_prompt() -> String {
    format!("\n{} ", format!("Select an option (1-{}):", MENU_OPTIONS.len()).green())
}

pub fn practice_header(level: u8, number: usize) {
    clear_screen();
    println!("{}", "=== Practice Mode ===".cyan());
    println!("{}", format!("Current Level: {level}").green());
    println!("\n{}", format!("Question {number}").yellow());
}

pub fn practice_intro() {
    clear_screen();
    println!("{}", "=== Practice Mode ===".cyan());
    println!("Maintain the required accuracy to advance!");
    println!("{}", "Type 'q' at any time to quit".yellow());
}

pub fn question(question: &Question) {
    println!("\n{}", question.text);
    for (i, choice) in question.choices.iter().enumerate() {
        println!("{}. {choice}", i + 1);
    }
}

pub fn answer_prompt(question: &Question) -> String {
    let text = if question.is_port_entry() {
        "Enter the port number (or 'q' to quit):".to_string()
    } else {
        format!("Enter your choice (1-{} or 'q' to quit):", question.choices.len())
    };
    format!("\n{} ", text.green())
}

pub fn answer_feedback(correct: bool, answer: &str) {
    if correct {
        println!("\n{}", "✓ Correct!".green());
    } else {
        println!("\n{}", format!("✗ Incorrect. The correct answer is {answer}").red());
    }
}

pub fn transition(transition: Transition) {
    match transition {
        Transition::Unchanged => {}
        Transition::LevelUp(level) => {
            println!(
                "\n{}",
                format!("Level Up! You've advanced to level {level}!").green()
            );
            println!("You've consistently maintained the required accuracy. Great job!");
        }
        Transition::LevelDown(level) => {
            println!(
                "\n{}",
                format!("⚠ Difficulty decreased to level {level} due to accuracy drop.").yellow()
            );
        }
    }
}

pub fn reference_info(question: &Question) {
    let info = &question.info;
    println!("\n{}", "Reference Information:".cyan());
    println!("Port: {}", question.port);
    println!("Protocol: {}", info.protocol);
    println!("Transport: {}", info.transport);
    println!("Usage: {}", info.common_usage);
}

/// Colour bands for an accuracy percentage.
pub fn accuracy_color(accuracy: f64) -> Color {
    match accuracy {
        a if a >= 90.0 => Color::Green,
        a if a >= 80.0 => Color::DarkGreen,
        a if a >= 70.0 => Color::Yellow,
        a if a >= 60.0 => Color::DarkYellow,
        _ => Color::Red,
    }
}

/// Squeeze `outcomes` (oldest first) into at most `width` cells, newest on
/// the right. A cell is `Some(false)` if any answer it covers was wrong and
/// `None` where there is no data. Returns the cells and answers per cell.
pub fn result_cells(outcomes: &[bool], width: usize) -> (Vec<Option<bool>>, usize) {
    let block = (outcomes.len() / width.max(1)).max(1);
    let mut cells = vec![None; width];
    for i in 0..width {
        let end = outcomes.len().saturating_sub(i * block);
        let start = outcomes.len().saturating_sub((i + 1) * block);
        if start >= end {
            break;
        }
        cells[width - 1 - i] = Some(outcomes[start..end].iter().all(|&ok| ok));
    }
    (cells, block)
}

pub fn level_progress(progress: &Progress, window: &AccuracyWindow) {
    if progress.at_max {
        println!("\n{}", "Maximum level reached!".green());
        return;
    }

    println!("\n{}", format!("Level {} Progress:", progress.level).cyan());

    let target = progress.streak_target as usize;
    let filled = if target == 0 {
        0
    } else {
        BAR_WIDTH * progress.streak.min(target) / target
    };
    let streak_bar = if progress.meets_accuracy {
        format!(
            "{}{}",
            "█".repeat(filled).green(),
            "░".repeat(BAR_WIDTH - filled).white()
        )
    } else {
        "░".repeat(BAR_WIDTH).red().to_string()
    };
    println!(
        "Streak Progress: |{streak_bar}| {}/{}",
        progress.streak, progress.streak_target
    );

    let outcomes: Vec<bool> = window.iter().collect();
    let (cells, block) = result_cells(&outcomes, BAR_WIDTH);
    let results_bar: String = cells
        .iter()
        .map(|cell| match cell {
            None => "·".white().to_string(),
            Some(true) => "█".green().to_string(),
            Some(false) => "█".red().to_string(),
        })
        .collect();
    let mut label = format!("{}/{}", progress.window_len, progress.window_capacity);
    if block > 1 {
        label.push_str(&format!(" ({block}/□)"));
    }
    println!("Recent Results:  |{results_bar}| {label}");

    let accuracy = format!("{:.1}%", progress.accuracy).with(accuracy_color(progress.accuracy));
    println!("Current Window Accuracy: {accuracy}");
    println!("Required Accuracy: {}%", progress.required_accuracy);

    if !progress.meets_accuracy {
        println!(
            "{}",
            format!(
                "Accuracy below {}% - streak reset!",
                progress.required_accuracy
            )
            .red()
        );
    } else if progress.streak < target {
        println!(
            "Maintain {}% accuracy for {} more questions to advance",
            progress.required_accuracy,
            target - progress.streak
        );
    }
}

pub fn statistics(correct: usize, total: usize, level: u8) {
    clear_screen();
    println!("\n{}", "=== Current Session Statistics ===".cyan());
    if total > 0 {
        let accuracy = correct as f64 * 100.0 / total as f64;
        println!("Questions Attempted: {total}");
        println!("Correct Answers: {correct}");
        println!(
            "Session Accuracy: {}",
            format!("{accuracy:.1}%").with(accuracy_color(accuracy))
        );
    } else {
        println!("{}", "No questions attempted in current session.".yellow());
    }
    println!("Current Level: {level}");
}

pub fn load_failure(failure: &LoadFailure) {
    println!("{}", format!("Save data is unreadable ({}).", failure.kind).red());
    println!("{}", failure.message);
    println!(
        "{}",
        "Starting fresh will ERASE ALL SAVE DATA. Choosing 'n' exits and writes a bug report."
            .yellow()
    );
}

pub fn fresh_start_question() -> String {
    format!("{} ", "Start a new game? (y/n):".green())
}

pub fn continue_prompt(text: &str) -> String {
    format!("\n{} ", text.cyan())
}

pub fn error(message: &str) {
    println!("{}", message.red());
}

pub fn notice(message: &str) {
    println!("\n{}", message.yellow());
}

pub fn farewell(saved: bool) {
    println!("\n{}", "Thanks for studying! Saving progress...".green());
    if !saved {
        error("Progress could not be saved. See the log for details.");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_result_cells_short_window_fills_from_right() {
        let (cells, block) = result_cells(&[true, false, true], 5);
        assert_eq!(block, 1);
        assert_eq!(
            cells,
            vec![None, None, Some(true), Some(false), Some(true)]
        );
    }

    #[test]
    fn test_result_cells_scales_long_window() {
        // 90 answers into 50 cells: one answer per cell, newest 50 shown.
        let mut outcomes = vec![true; 90];
        outcomes[89] = false;
        let (cells, block) = result_cells(&outcomes, 50);
        assert_eq!(block, 1);
        assert_eq!(cells.last(), Some(&Some(false)));
        assert!(cells.iter().all(Option::is_some));

        // 100 answers: two per cell, one wrong answer taints its cell.
        let mut outcomes = vec![true; 100];
        outcomes[0] = false;
        let (cells, block) = result_cells(&outcomes, 50);
        assert_eq!(block, 2);
        assert_eq!(cells[0], Some(false));
        assert!(cells[1..].iter().all(|c| *c == Some(true)));
    }

    #[test]
    fn test_result_cells_empty() {
        let (cells, _) = result_cells(&[], 4);
        assert_eq!(cells, vec![None; 4]);
    }

    #[test]
    fn test_accuracy_color_bands() {
        assert_eq!(accuracy_color(95.0), Color::Green);
        assert_eq!(accuracy_color(80.0), Color::DarkGreen);
        assert_eq!(accuracy_color(75.5), Color::Yellow);
        assert_eq!(accuracy_color(60.0), Color::DarkYellow);
        assert_eq!(accuracy_color(12.0), Color::Red);
    }
}
