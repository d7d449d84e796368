//! Form-driven session: fill in the inputs, then Suggest Clips or Reset.

use anyhow::Result;
use clipper_core::{ApiKey, ClipperConfig, FormInputs, Session};
use console::{Term, style};

use crate::commands::{self, SuggestOptions};

pub async fn run(config: ClipperConfig, initial: FormInputs, play: bool) -> Result<()> {
    let term = Term::stdout();
    let mut session = Session::new(initial);
    let options = SuggestOptions { json: false, play };

    if session.form.url.is_empty() {
        edit_form(&term, &mut session.form)?;
    }

    loop {
        if session.rerender() {
            term.clear_screen()?;
            println!("{}", style("Form reset.").dim());
            edit_form(&term, &mut session.form)?;
        }

        print_form(&session.form);
        println!(
            "{}  {}  {}  {}",
            style("[s] Suggest Clips").cyan().bold(),
            style("[r] Reset").cyan(),
            style("[e] Edit inputs").cyan(),
            style("[q] Quit").dim()
        );

        match term.read_char()? {
            's' | 'S' => {
                if let Err(e) = commands::suggest(&session.form, &config, &options).await {
                    eprintln!("{} {:#}", style("Error:").red().bold(), e);
                }
            }
            'r' | 'R' => match session.reset().await {
                Ok(report) => {
                    commands::report_cleanup(&report);
                }
                Err(e) => eprintln!("{} {}", style("Error:").red().bold(), e),
            },
            'e' | 'E' => edit_form(&term, &mut session.form)?,
            'q' | 'Q' => break,
            _ => {}
        }
        println!();
    }

    Ok(())
}

fn print_form(form: &FormInputs) {
    let or_missing = |value: &str| {
        if value.trim().is_empty() {
            style("<missing>".to_string()).red()
        } else {
            style(value.to_string()).white()
        }
    };
    let key = if form.api_key.is_empty() {
        style("<missing>".to_string()).red()
    } else {
        style(form.api_key.to_string()).white()
    };

    println!("{}", style("─".repeat(60)).dim());
    println!("{:<16}{}", "Video URL", or_missing(&form.url));
    println!("{:<16}{}", "API key", key);
    println!("{:<16}{}", "Download path", or_missing(&form.destination));
    println!("{:<16}{}", "Prompt", style(first_line(&form.prompt)).dim());
    println!("{}", style("─".repeat(60)).dim());
}

fn first_line(text: &str) -> String {
    let mut lines = text.lines();
    let first = lines.next().unwrap_or("").to_string();
    if lines.next().is_some() {
        format!("{first} …")
    } else {
        first
    }
}

/// Prompt for each input; an empty answer keeps the current value.
fn edit_form(term: &Term, form: &mut FormInputs) -> Result<()> {
    if let Some(url) = ask(term, "Video URL", &form.url)? {
        form.url = url;
    }

    let hint = if form.api_key.is_empty() { "" } else { "keep current" };
    term.write_str(&format!("{} {}: ", style("API key").bold(), style(hint).dim()))?;
    let key = term.read_secure_line()?;
    if !key.trim().is_empty() {
        form.api_key = ApiKey::new(key.trim());
    }

    if let Some(destination) = ask(term, "Download path", &form.destination)? {
        form.destination = destination;
    }
    if let Some(prompt) = ask(term, "Prompt", &first_line(&form.prompt))? {
        form.prompt = prompt;
    }
    Ok(())
}

fn ask(term: &Term, label: &str, current: &str) -> Result<Option<String>> {
    term.write_str(&format!("{} {}: ", style(label).bold(), style(current).dim()))?;
    let answer = term.read_line()?;
    let answer = answer.trim();
    Ok((!answer.is_empty()).then(|| answer.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_line_marks_truncation() {
        assert_eq!(first_line("one line"), "one line");
        assert_eq!(first_line("first\nsecond"), "first …");
        assert_eq!(first_line(""), "");
    }
}
