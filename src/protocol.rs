//! Wire-level concerns shared by the reactor and the dump loader: splitting
//! a request line into arguments, the reply encodings of the text
//! protocol, and the result-code taxonomy.

use std::fmt::Write as _;

/// A request line longer than this is rejected outright, before tokenizing.
pub const MAX_QUERY_LEN: usize = 4096;

/// Result codes sent as a signed-decimal line. `Ok` is the only
/// non-negative value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplyCode {
    Ok,
    ErrNotFound,
    ErrWrongArg,
    ErrWrongArgNum,
    ErrMalformedArg,
    ErrObjNotFound,
    ErrObjExists,
    ErrActionFailed,
    ErrConfigurationErr,
    ErrQueryTooLong,
}

impl ReplyCode {
    pub fn code(self) -> i64 {
        match self {
            ReplyCode::Ok => 0,
            ReplyCode::ErrNotFound => -1,
            ReplyCode::ErrWrongArg => -2,
            ReplyCode::ErrWrongArgNum => -3,
            ReplyCode::ErrMalformedArg => -4,
            ReplyCode::ErrObjNotFound => -5,
            ReplyCode::ErrObjExists => -6,
            ReplyCode::ErrActionFailed => -7,
            // Not assigned a value upstream; kept distinct from every code
            // above and from each other, as required.
            ReplyCode::ErrConfigurationErr => -8,
            ReplyCode::ErrQueryTooLong => -9,
        }
    }
}

/// One full reply to a command: a shaped payload the session encodes into
/// the `\n`-terminated line sequence described by the protocol.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    Code(ReplyCode),
    ScalarSize(usize),
    ScalarCounter(u64),
    Str(String),
    StrList(Vec<String>),
    StrCountMap(Vec<(String, u64)>),
    StrStrCountMap(Vec<(String, Vec<(String, u64)>)>),
    StrStrSetMap(Vec<(String, Vec<String>)>),
}

impl Reply {
    pub fn encode(&self) -> Vec<u8> {
        let mut out = String::new();
        match self {
            Reply::Code(code) => {
                let _ = writeln!(out, "{}", code.code());
            }
            Reply::ScalarSize(n) => {
                let _ = writeln!(out, "{n}");
            }
            Reply::ScalarCounter(n) => {
                let _ = writeln!(out, "{n}");
            }
            Reply::Str(s) => {
                let _ = writeln!(out, "{s}");
            }
            Reply::StrList(items) => {
                let _ = writeln!(out, "{}", items.len());
                for item in items {
                    let _ = writeln!(out, "{item}");
                }
            }
            Reply::StrCountMap(entries) => {
                encode_str_count_map(&mut out, entries);
            }
            Reply::StrStrCountMap(entries) => {
                let _ = writeln!(out, "{}", entries.len());
                for (key, map) in entries {
                    let _ = writeln!(out, "{key}");
                    encode_str_count_map(&mut out, map);
                }
            }
            Reply::StrStrSetMap(entries) => {
                let _ = writeln!(out, "{}", entries.len());
                for (key, values) in entries {
                    let _ = writeln!(out, "{key}");
                    let _ = writeln!(out, "{}", values.len());
                    for value in values {
                        let _ = writeln!(out, "{value}");
                    }
                }
            }
        }
        out.into_bytes()
    }
}

fn encode_str_count_map(out: &mut String, entries: &[(String, u64)]) {
    let _ = writeln!(out, "{}", entries.len());
    for (key, count) in entries {
        let _ = writeln!(out, "{key} {count}");
    }
}

/// Every character in `arg` must be printable ASCII (`' '..='~'`), matching
/// the original's `isprint` check — the protocol carries no non-ASCII
/// escaping convention for replies, so non-printable arguments are rejected
/// up front rather than round-tripped.
pub fn is_printable_arg(arg: &str) -> bool {
    arg.bytes().all(|b| (0x20..=0x7e).contains(&b))
}

/// Tokenizes one request line the way `sdssplitargs` does: whitespace
/// separates unquoted tokens; `'...'` takes everything literally except
/// `\'`, which becomes `'`; `"..."` recognizes the standard backslash
/// escapes (`\n \r \t \b \a \\ \" \xHH`); an unterminated quote is a
/// tokenizing error.
pub fn split_args(line: &str) -> Option<Vec<String>> {
    let chars: Vec<char> = line.chars().collect();
    let mut i = 0;
    let mut argv = Vec::new();

    while i < chars.len() {
        while i < chars.len() && chars[i].is_whitespace() {
            i += 1;
        }
        if i >= chars.len() {
            break;
        }

        let mut current = String::new();
        if chars[i] == '"' {
            i += 1;
            loop {
                if i >= chars.len() {
                    return None;
                }
                match chars[i] {
                    '"' => {
                        i += 1;
                        break;
                    }
                    '\\' if i + 1 < chars.len() => {
                        i += 1;
                        match chars[i] {
                            'n' => current.push('\n'),
                            'r' => current.push('\r'),
                            't' => current.push('\t'),
                            'b' => current.push('\u{8}'),
                            'a' => current.push('\u{7}'),
                            'x' if i + 2 < chars.len()
                                && chars[i + 1].is_ascii_hexdigit()
                                && chars[i + 2].is_ascii_hexdigit() =>
                            {
                                let hex: String = chars[i + 1..=i + 2].iter().collect();
                                let byte = u8::from_str_radix(&hex, 16).ok()?;
                                current.push(byte as char);
                                i += 2;
                            }
                            other => current.push(other),
                        }
                        i += 1;
                    }
                    '\\' => return None,
                    c => {
                        current.push(c);
                        i += 1;
                    }
                }
            }
            // a quoted token must be immediately followed by whitespace or end of line
            if i < chars.len() && !chars[i].is_whitespace() {
                return None;
            }
        } else if chars[i] == '\'' {
            i += 1;
            loop {
                if i >= chars.len() {
                    return None;
                }
                match chars[i] {
                    '\'' => {
                        i += 1;
                        break;
                    }
                    '\\' if i + 1 < chars.len() && chars[i + 1] == '\'' => {
                        current.push('\'');
                        i += 2;
                    }
                    c => {
                        current.push(c);
                        i += 1;
                    }
                }
            }
            if i < chars.len() && !chars[i].is_whitespace() {
                return None;
            }
        } else {
            while i < chars.len() && !chars[i].is_whitespace() {
                current.push(chars[i]);
                i += 1;
            }
        }
        argv.push(current);
    }

    Some(argv)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_plain_whitespace_separated_tokens() {
        assert_eq!(
            split_args("INSERT c1 p1 col=a 3"),
            Some(vec!["INSERT", "c1", "p1", "col=a", "3"].into_iter().map(String::from).collect())
        );
    }

    #[test]
    fn double_quoted_token_supports_escapes() {
        let argv = split_args(r#"CUBE "na\x41me""#).unwrap();
        assert_eq!(argv, vec!["CUBE".to_string(), "naAme".to_string()]);
    }

    #[test]
    fn single_quoted_token_is_literal_except_quote_escape() {
        let argv = split_args(r"CUBE 'a\nb\'c'").unwrap();
        assert_eq!(argv[1], "a\\nb'c");
    }

    #[test]
    fn unterminated_quote_is_rejected() {
        assert_eq!(split_args("CUBE \"unterminated"), None);
    }

    #[test]
    fn non_printable_argument_is_rejected() {
        assert!(!is_printable_arg("bad\narg"));
        assert!(is_printable_arg("fine"));
    }

    #[test]
    fn reply_codes_are_pairwise_distinct() {
        let all = [
            ReplyCode::Ok,
            ReplyCode::ErrNotFound,
            ReplyCode::ErrWrongArg,
            ReplyCode::ErrWrongArgNum,
            ReplyCode::ErrMalformedArg,
            ReplyCode::ErrObjNotFound,
            ReplyCode::ErrObjExists,
            ReplyCode::ErrActionFailed,
            ReplyCode::ErrConfigurationErr,
            ReplyCode::ErrQueryTooLong,
        ];
        for (i, a) in all.iter().enumerate() {
            for b in &all[i + 1..] {
                assert_ne!(a.code(), b.code());
            }
        }
    }

    #[test]
    fn scalar_counter_encodes_as_decimal_line() {
        assert_eq!(Reply::ScalarCounter(8).encode(), b"8\n");
    }

    #[test]
    fn str_count_map_encodes_size_then_lines() {
        let reply = Reply::StrCountMap(vec![("a".to_string(), 3), ("b".to_string(), 7)]);
        assert_eq!(reply.encode(), b"2\na 3\nb 7\n");
    }
}
