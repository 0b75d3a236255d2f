//! Interactive quiz loop over any reader/writer pair.

use std::io::{BufRead, Write};

use anyhow::Result;
use danci_quiz::QuizQuestion;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuizOutcome {
    pub correct_count: usize,
    pub incorrect_count: usize,
    /// Input ended before every question was answered
    pub aborted: bool,
}

impl QuizOutcome {
    pub fn answered(&self) -> usize {
        self.correct_count + self.incorrect_count
    }
}

/// `1`-based choice number, or `None` for anything else.
fn parse_choice(line: &str, choice_count: usize) -> Option<usize> {
    let number: usize = line.trim().parse().ok()?;
    (1..=choice_count).contains(&number).then(|| number - 1)
}

pub fn run_quiz<R: BufRead, W: Write>(questions: &[QuizQuestion], mut input: R, mut output: W) -> Result<QuizOutcome> {
    let mut outcome = QuizOutcome {
        correct_count: 0,
        incorrect_count: 0,
        aborted: false,
    };

    for (index, question) in questions.iter().enumerate() {
        writeln!(output, "\n[{}/{}] {}", index + 1, questions.len(), question.prompt)?;
        if let Some(context) = &question.context_en {
            writeln!(output, "    {context}")?;
        }
        for (choice_index, choice) in question.choices.iter().enumerate() {
            writeln!(output, "  {}) {}", choice_index + 1, choice)?;
        }

        let choice = loop {
            write!(output, "> ")?;
            output.flush()?;

            let mut line = String::new();
            if input.read_line(&mut line)? == 0 {
                outcome.aborted = true;
                return Ok(outcome);
            }
            match parse_choice(&line, question.choices.len()) {
                Some(choice) => break choice,
                None => writeln!(output, "enter a number from 1 to {}", question.choices.len())?,
            }
        };

        if question.is_correct(choice) {
            outcome.correct_count += 1;
            writeln!(output, "correct")?;
        } else {
            outcome.incorrect_count += 1;
            writeln!(output, "wrong: {} = {}", question.phrase, question.mean)?;
        }
        if let Some(context) = &question.context_ja {
            writeln!(output, "    {context}")?;
        }
    }

    Ok(outcome)
}

#[cfg(test)]
mod tests {
    use super::*;
    use danci_quiz::{build_questions, VocabularyEntry};
    use std::io::Cursor;

    fn questions() -> Vec<QuizQuestion> {
        let vocab: Vec<VocabularyEntry> = [("one", "1"), ("two", "2"), ("three", "3")]
            .iter()
            .map(|(phrase, mean)| VocabularyEntry::new(*phrase, *mean))
            .collect();
        build_questions(&vocab, 3)
    }

    #[test]
    fn test_parse_choice() {
        assert_eq!(parse_choice(" 2\n", 4), Some(1));
        assert_eq!(parse_choice("0", 4), None);
        assert_eq!(parse_choice("5", 4), None);
        assert_eq!(parse_choice("b", 4), None);
    }

    #[test]
    fn test_counts_answers_and_reprompts() {
        // answer_index is 0 for unshuffled questions
        let input = Cursor::new("1\nx\n2\n1\n");
        let mut output = Vec::new();
        let outcome = run_quiz(&questions(), input, &mut output).unwrap();

        assert_eq!(outcome.correct_count, 2);
        assert_eq!(outcome.incorrect_count, 1);
        assert!(!outcome.aborted);

        let text = String::from_utf8(output).unwrap();
        assert!(text.contains("What does \"one\" mean?"));
        assert!(text.contains("enter a number from 1 to 3"));
        assert!(text.contains("wrong: two = 2"));
    }

    #[test]
    fn test_end_of_input_aborts() {
        let outcome = run_quiz(&questions(), Cursor::new("1\n"), Vec::new()).unwrap();
        assert!(outcome.aborted);
        assert_eq!(outcome.answered(), 1);
    }
}
