use anyhow::Result;

use crate::config::Config;
use crate::questions::QuestionSet;
use crate::session::SessionState;

pub mod args;
pub mod client;

pub use args::{Cli, CliCommand, StatusCliArgs};

pub fn handle_questions_command() -> Result<()> {
    let questions = QuestionSet::load()?;

    println!("{} question(s) configured:\n", questions.len());
    for (i, question) in questions.iter().enumerate() {
        println!("{:2}. {}", i + 1, question.prompt);
    }

    Ok(())
}

pub async fn handle_status_command(args: StatusCliArgs) -> Result<()> {
    let port = match args.port {
        Some(port) => port,
        None => Config::load()?.server.port,
    };

    let response = client::ServiceClient::new(port).status().await?;

    let session = &response.session;
    println!("Phase: {}", session.phase.as_str());
    println!("Question: {}", format_question_progress(session));
    println!("Time remaining: {}s", session.time_remaining);
    println!("Recording: {}", if session.recording_active { "yes" } else { "no" });
    println!("Answers submitted: {}", session.recordings_submitted);
    if let Some(error) = &session.last_error {
        println!("Last error: {}", error);
    }

    println!();
    if response.gate.ready {
        println!("Permissions: all granted");
    } else {
        println!("Permissions missing: {}", response.gate.missing.join(", "));
    }
    if response.feedback_ready {
        println!("Feedback: awaiting submission");
    }

    Ok(())
}

/// `current_question` is an index into a list that is empty until the
/// interview starts, so progress shows as "-" before then.
fn format_question_progress(session: &SessionState) -> String {
    if session.total_questions == 0 {
        return "-".to_string();
    }
    format!(
        "{}/{}",
        session.current_question + 1,
        session.total_questions
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_question_progress_before_interview() {
        let session = SessionState::default();
        assert_eq!(format_question_progress(&session), "-");
    }

    #[test]
    fn test_question_progress_is_one_indexed() {
        let session = SessionState {
            current_question: 3,
            total_questions: 10,
            ..SessionState::default()
        };
        assert_eq!(format_question_progress(&session), "4/10");
    }
}
