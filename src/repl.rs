use anyhow::{Context, Result};
use gojo_syntax::lexer::{Lexer, Token};
use nu_ansi_term::{Color, Style};
use reedline::{
    EditCommand, Emacs, FileBackedHistory, KeyCode, KeyModifiers, PromptEditMode,
    PromptHistorySearch, Reedline, ReedlineEvent, StyledText, ValidationResult,
};

use std::borrow::Cow;
use std::fs;

pub fn editor() -> Result<Reedline> {
    let mut keybindings = reedline::default_emacs_keybindings();
    keybindings.add_binding(
        KeyModifiers::ALT,
        KeyCode::Enter,
        ReedlineEvent::Edit(vec![EditCommand::InsertNewline]),
    );

    let data_dir = dirs::data_dir().context("could not find data directory")?.join("gojo");
    fs::create_dir_all(&data_dir)
        .with_context(|| format!("could not create data directory: {}", data_dir.display()))?;
    let history_path = data_dir.join("history.txt");
    let history = Box::new(
        FileBackedHistory::with_file(10000, history_path.clone())
            .with_context(|| format!("could not open history file: {}", history_path.display()))?,
    );

    let editor = Reedline::create()
        .with_edit_mode(Box::new(Emacs::new(keybindings)))
        .with_highlighter(Box::new(Highlighter))
        .with_history(history)
        .with_validator(Box::new(Validator));
    Ok(editor)
}

// Color scheme inspired by base16-google-dark, using the high-intensity
// variant of each color. LightRed is replaced with LightCyan to tell it apart
// from Red.
const DEFAULT: Color = Color::LightGray;
const COMMENT: Color = Color::DarkGray;
const CONSTANT: Color = Color::LightCyan;
const KEYWORD: Color = Color::LightPurple;
const NAMESPACE: Color = Color::LightYellow;
const STRING: Color = Color::LightGreen;
const VARIABLE: Color = Color::LightRed;

struct Highlighter;

impl reedline::Highlighter for Highlighter {
    fn highlight(&self, line: &str, _: usize) -> StyledText {
        let mut output = StyledText::new();
        let mut curr_end = 0;

        for token in Lexer::new(line) {
            let (start, token, end) = match token {
                Ok(token) => token,
                Err(_) => break,
            };
            push_gap(&mut output, &line[curr_end..start]);
            let fg = match token {
                Token::Break
                | Token::Case
                | Token::Const
                | Token::Continue
                | Token::Default
                | Token::Else
                | Token::Function
                | Token::If
                | Token::Let
                | Token::Return
                | Token::Switch
                | Token::Var
                | Token::While => KEYWORD,
                Token::False
                | Token::Null
                | Token::Number(_)
                | Token::True
                | Token::Undefined => CONSTANT,
                Token::String(_) => STRING,
                Token::Identifier(name) if name == "Math" || name == "console" => NAMESPACE,
                Token::Identifier(_) => VARIABLE,
                _ => DEFAULT,
            };
            output.push((Style::new().fg(fg), line[start..end].to_string()));
            curr_end = end;
        }

        // Anything after a lexing error is left unhighlighted.
        if curr_end < line.len() {
            push_gap(&mut output, &line[curr_end..]);
        }
        output
    }
}

/// Pushes the text between two tokens, which holds only whitespace and
/// comments unless lexing stopped early.
fn push_gap(output: &mut StyledText, gap: &str) {
    if gap.is_empty() {
        return;
    }
    let fg = if gap.contains("//") || gap.contains("/*") { COMMENT } else { DEFAULT };
    output.push((Style::new().fg(fg), gap.to_string()));
}

struct Validator;

impl reedline::Validator for Validator {
    fn validate(&self, line: &str) -> ValidationResult {
        if gojo_syntax::is_complete(line) {
            ValidationResult::Complete
        } else {
            ValidationResult::Incomplete
        }
    }
}

pub struct Prompt;

impl reedline::Prompt for Prompt {
    fn render_prompt_left(&self) -> Cow<str> {
        Cow::Borrowed(">>> ")
    }

    fn render_prompt_right(&self) -> Cow<str> {
        Cow::Borrowed("")
    }

    fn render_prompt_indicator(&self, _: PromptEditMode) -> Cow<str> {
        Cow::Borrowed("")
    }

    fn render_prompt_multiline_indicator(&self) -> Cow<str> {
        Cow::Borrowed("... ")
    }

    fn render_prompt_history_search_indicator(&self, _: PromptHistorySearch) -> Cow<str> {
        Cow::Borrowed("")
    }
}
