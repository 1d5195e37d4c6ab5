/***********
 * LISTING *
 ***********/
/* The `trap -- '<body>' NAME` listing format.
 *
 * This is how raw handler slots are printed, and the text the synchronizer
 * reverse-parses when a context first looks at a runtime. Bodies are quoted
 * as POSIX single-quoted words so that any text, including newlines and
 * quotes, survives a print/parse cycle.
*/

use crate::error::Error;

/// Quotes `text` as a single shell word.
///
/// ```
/// assert_eq!(trapstack::listing::quote("it's"), r"'it'\''s'");
/// ```
pub fn quote(text: &str) -> String {
    let mut quoted = String::with_capacity(text.len() + 2);
    quoted.push('\'');
    for c in text.chars() {
        if c == '\'' {
            quoted.push_str(r"'\''");
        } else {
            quoted.push(c);
        }
    }
    quoted.push('\'');
    quoted
}

/// One listing line for `body` set on the trap called `name`.
pub fn format_entry(body: &str, name: &str) -> String {
    format!("trap -- {} {}", quote(body), name)
}

/// Reverse-parses a listing into `(body, name)` pairs, in order.
///
/// An entry may name several traps (`trap -- 'cmd' INT TERM`); it yields one
/// pair per name.
pub fn parse(text: &str) -> Result<Vec<(String, String)>, Error> {
    let mut pairs = Vec::new();
    for words in split_entries(text)? {
        let mut words = words.into_iter();
        match words.next() {
            Some(ref word) if word == "trap" => {}
            Some(word) => return Err(Error::Malformed(format!("unexpected word {:?}", word))),
            None => continue,
        }
        let mut rest: Vec<String> = words.collect();
        if rest.first().map(String::as_str) == Some("--") {
            rest.remove(0);
        }
        if rest.len() < 2 {
            return Err(Error::Malformed("entry without body or signal".to_owned()));
        }
        let body = rest.remove(0);
        for name in rest {
            pairs.push((body.clone(), name));
        }
    }
    Ok(pairs)
}

/* Splits text into entries of words, following the quoting rules of the
 * POSIX shell: single quotes are literal, double quotes honour backslash
 * escapes of $ ` " \ and newline, a bare backslash escapes the next
 * character, and an unquoted newline ends the entry.
*/
fn split_entries(text: &str) -> Result<Vec<Vec<String>>, Error> {
    let mut entries = Vec::new();
    let mut words = Vec::new();
    let mut word = String::new();
    let mut in_word = false;
    let mut chars = text.chars();

    while let Some(c) = chars.next() {
        match c {
            ' ' | '\t' | '\n' => {
                if in_word {
                    words.push(std::mem::take(&mut word));
                    in_word = false;
                }
                if c == '\n' && !words.is_empty() {
                    entries.push(std::mem::take(&mut words));
                }
            }
            '\'' => {
                in_word = true;
                loop {
                    match chars.next() {
                        Some('\'') => break,
                        Some(c) => word.push(c),
                        None => return Err(Error::Malformed("unterminated single quote".to_owned())),
                    }
                }
            }
            '"' => {
                in_word = true;
                loop {
                    match chars.next() {
                        Some('"') => break,
                        Some('\\') => match chars.next() {
                            Some('\n') => {}
                            Some(c @ '$') | Some(c @ '`') | Some(c @ '"') | Some(c @ '\\') => {
                                word.push(c)
                            }
                            Some(c) => {
                                word.push('\\');
                                word.push(c);
                            }
                            None => {
                                return Err(Error::Malformed("unterminated double quote".to_owned()))
                            }
                        },
                        Some(c) => word.push(c),
                        None => return Err(Error::Malformed("unterminated double quote".to_owned())),
                    }
                }
            }
            '\\' => match chars.next() {
                Some('\n') => {}
                Some(c) => {
                    in_word = true;
                    word.push(c);
                }
                None => return Err(Error::Malformed("dangling backslash".to_owned())),
            },
            c => {
                in_word = true;
                word.push(c);
            }
        }
    }

    if in_word {
        words.push(word);
    }
    if !words.is_empty() {
        entries.push(words);
    }
    Ok(entries)
}
