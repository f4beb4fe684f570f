//! Interactive confirmation.

use std::io::{self, IsTerminal, Write};

use dialoguer::{theme::ColorfulTheme, Confirm};

fn use_dialoguer() -> bool {
    io::stdin().is_terminal() && io::stdout().is_terminal()
}

/// Ask a yes/no question. Without a terminal the answer is read from stdin
/// and an empty line (or closed input) takes the default.
pub(crate) fn confirm(label: &str, default: bool) -> anyhow::Result<bool> {
    if use_dialoguer() {
        let theme = ColorfulTheme::default();
        let confirmed = Confirm::with_theme(&theme)
            .with_prompt(label)
            .default(default)
            .interact()?;
        return Ok(confirmed);
    }
    let default_text = if default { "Y/n" } else { "y/N" };
    print!("{label} [{default_text}]: ");
    io::stdout().flush()?;
    let mut line = String::new();
    io::stdin().read_line(&mut line)?;
    parse_answer(&line, default)
}

fn parse_answer(line: &str, default: bool) -> anyhow::Result<bool> {
    match line.trim().to_ascii_lowercase().as_str() {
        "" => Ok(default),
        "y" | "yes" => Ok(true),
        "n" | "no" => Ok(false),
        _ => anyhow::bail!("y または n で答えてください．"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn answers() {
        assert!(parse_answer("\n", true).unwrap());
        assert!(!parse_answer("", false).unwrap());
        assert!(parse_answer("Yes\n", false).unwrap());
        assert!(!parse_answer(" n ", true).unwrap());
        assert!(parse_answer("maybe", true).is_err());
    }
}
