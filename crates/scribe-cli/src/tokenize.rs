use anyhow::{Result, bail};

/// Splits a command line on spaces and tabs. Double quotes group text into a
/// single token and may sit anywhere inside it; `""` on its own is an empty
/// token.
pub fn tokenize(line: &str) -> Result<Vec<String>> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut in_token = false;
    let mut quoted = false;

    for ch in line.chars() {
        match ch {
            '"' => {
                quoted = !quoted;
                in_token = true;
            }
            ' ' | '\t' if !quoted => {
                if in_token {
                    tokens.push(std::mem::take(&mut current));
                    in_token = false;
                }
            }
            _ => {
                current.push(ch);
                in_token = true;
            }
        }
    }

    if quoted {
        bail!("unterminated quote");
    }
    if in_token {
        tokens.push(current);
    }
    Ok(tokens)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_words() {
        assert_eq!(
            tokenize("  load \t notes.txt ").unwrap(),
            vec!["load", "notes.txt"]
        );
        assert!(tokenize("   ").unwrap().is_empty());
    }

    #[test]
    fn test_quotes_group() {
        assert_eq!(
            tokenize(r#"insert 1:1 "hello  world""#).unwrap(),
            vec!["insert", "1:1", "hello  world"]
        );
        assert_eq!(tokenize(r#"a"b c"d"#).unwrap(), vec!["ab cd"]);
    }

    #[test]
    fn test_empty_quotes_yield_empty_token() {
        assert_eq!(
            tokenize(r#"edit-text title1 """#).unwrap(),
            vec!["edit-text", "title1", ""]
        );
    }

    #[test]
    fn test_unterminated_quote() {
        let err = tokenize(r#"append "oops"#).unwrap_err();
        assert_eq!(err.to_string(), "unterminated quote");
    }
}
