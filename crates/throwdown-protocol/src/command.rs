//! Lobby command grammar.
//!
//! A session that is not attached to a match sends commands; everything it
//! types is parsed here. Verbs are case-sensitive literals. Arguments are
//! split on whitespace, except inside a pair of `"` or `'` quotes, so a
//! match can be called `"friday night"`.

use crate::ProtocolError;

/// A parsed lobby command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// `?`: show the command summary.
    Help,
    /// `l` / `list`: enumerate matches in the lobby.
    List,
    /// `who`: enumerate named sessions.
    Who,
    /// `c <name>` / `create <name>`: open a match and join it.
    Create(String),
    /// `j <name>` / `join <name>`: join an existing match.
    Join(String),
    /// A line containing only whitespace.
    Blank,
    /// Anything else. Carries the raw (trimmed) line for the error message.
    Unknown(String),
}

impl Command {
    /// Parses one line of lobby input.
    ///
    /// # Errors
    /// Returns [`ProtocolError::MissingArgument`] when `create` or `join`
    /// is given no name. Unrecognized verbs are not errors; they parse to
    /// [`Command::Unknown`].
    pub fn parse(line: &str) -> Result<Command, ProtocolError> {
        let line = line.trim();
        let mut tokens = tokenize(line).into_iter();
        let Some(verb) = tokens.next() else {
            return Ok(Command::Blank);
        };
        let rest: Vec<String> = tokens.collect();

        let command = match verb.as_str() {
            "?" => Command::Help,
            "l" | "list" => Command::List,
            "who" => Command::Who,
            "c" | "create" => Command::Create(argument(&rest, "create")?),
            "j" | "join" => Command::Join(argument(&rest, "join")?),
            _ => Command::Unknown(line.to_string()),
        };
        Ok(command)
    }
}

/// Joins the argument tokens back into a single name. `c my game` and
/// `c "my game"` name the same match.
fn argument(
    rest: &[String],
    verb: &'static str,
) -> Result<String, ProtocolError> {
    let name = rest.join(" ");
    if name.trim().is_empty() {
        return Err(ProtocolError::MissingArgument(verb));
    }
    Ok(name)
}

/// Splits a line into tokens on whitespace outside quote pairs.
///
/// A quoted span contributes its contents verbatim (quotes removed) to the
/// current token. An unterminated quote runs to the end of the line. An
/// explicitly empty pair (`""`) yields an empty token.
pub fn tokenize(line: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut in_token = false;
    let mut quote: Option<char> = None;

    for ch in line.chars() {
        match quote {
            Some(q) if ch == q => quote = None,
            Some(_) => current.push(ch),
            None if ch == '"' || ch == '\'' => {
                quote = Some(ch);
                in_token = true;
            }
            None if ch.is_whitespace() => {
                if in_token {
                    tokens.push(std::mem::take(&mut current));
                    in_token = false;
                }
            }
            None => {
                current.push(ch);
                in_token = true;
            }
        }
    }
    if in_token {
        tokens.push(current);
    }
    tokens
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tokenize_plain_words() {
        assert_eq!(tokenize("c  arena   one"), vec!["c", "arena", "one"]);
    }

    #[test]
    fn test_tokenize_quoted_span_is_one_token() {
        assert_eq!(
            tokenize(r#"create "friday night" later"#),
            vec!["create", "friday night", "later"]
        );
        assert_eq!(tokenize("j 'a b'"), vec!["j", "a b"]);
    }

    #[test]
    fn test_tokenize_quote_inside_word_and_unterminated() {
        assert_eq!(tokenize(r#"ab"c d"e"#), vec!["abc de"]);
        assert_eq!(tokenize(r#"c "open ended"#), vec!["c", "open ended"]);
        assert_eq!(tokenize(r#"c """#), vec!["c", ""]);
    }

    #[test]
    fn test_parse_simple_verbs() {
        assert_eq!(Command::parse("?"), Ok(Command::Help));
        assert_eq!(Command::parse("l"), Ok(Command::List));
        assert_eq!(Command::parse("list"), Ok(Command::List));
        assert_eq!(Command::parse("who"), Ok(Command::Who));
        assert_eq!(Command::parse("   "), Ok(Command::Blank));
    }

    #[test]
    fn test_parse_create_and_join() {
        assert_eq!(
            Command::parse("c arena"),
            Ok(Command::Create("arena".into()))
        );
        assert_eq!(
            Command::parse(r#"create "big arena""#),
            Ok(Command::Create("big arena".into()))
        );
        assert_eq!(
            Command::parse("join big arena"),
            Ok(Command::Join("big arena".into()))
        );
    }

    #[test]
    fn test_parse_missing_argument() {
        assert_eq!(
            Command::parse("c"),
            Err(ProtocolError::MissingArgument("create"))
        );
        assert_eq!(
            Command::parse(r#"j """#),
            Err(ProtocolError::MissingArgument("join"))
        );
    }

    #[test]
    fn test_parse_verbs_are_case_sensitive() {
        assert_eq!(
            Command::parse("LIST"),
            Ok(Command::Unknown("LIST".into()))
        );
        assert_eq!(
            Command::parse("dance now"),
            Ok(Command::Unknown("dance now".into()))
        );
    }
}
