//! Pattern matching utilities for prompt detection and output cleanup.

use regex::bytes::Regex;

/// Compile a prompt pattern string into a regex.
///
/// Anchors to end of input (allowing trailing whitespace) when the pattern
/// has no anchor of its own.
pub fn compile_prompt_pattern(pattern: &str) -> Result<Regex, regex::Error> {
    let pattern = if pattern.ends_with('$') {
        pattern.to_string()
    } else {
        format!("{}\\s*$", pattern)
    };

    Regex::new(&pattern)
}

/// Return the last non-empty line of the output, trimmed.
///
/// After a bare newline the device answers with just its prompt, so this
/// is the prompt text.
pub fn last_line(output: &[u8]) -> String {
    let trimmed = trim_end(output);
    let start = memchr::memrchr(b'\n', trimmed).map_or(0, |pos| pos + 1);
    String::from_utf8_lossy(&trimmed[start..]).trim().to_string()
}

/// Strip the echoed command and the trailing prompt line from raw output.
pub fn normalize_output(raw: &[u8], command: &str, prompt: &Regex) -> String {
    let text = String::from_utf8_lossy(raw).replace("\r\n", "\n").replace('\r', "");

    // Command echo
    let body = match text.find(command) {
        Some(pos) if !command.is_empty() && text[..pos].trim().is_empty() => {
            &text[pos + command.len()..]
        }
        _ => text.as_str(),
    };
    let body = body.trim_start_matches('\n');

    // Trailing prompt
    let body = match body.rfind('\n') {
        Some(pos) if prompt.is_match(body[pos + 1..].trim_end().as_bytes()) => &body[..pos],
        None if prompt.is_match(body.trim_end().as_bytes()) => "",
        _ => body,
    };

    body.trim_end().to_string()
}

fn trim_end(data: &[u8]) -> &[u8] {
    let end = data
        .iter()
        .rposition(|b| !b.is_ascii_whitespace())
        .map_or(0, |pos| pos + 1);
    &data[..end]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ios_prompt() -> Regex {
        Regex::new(r"(?m)^[\w.\-@/:]{1,63}(\(config[\w.\-@/:+]{0,32}\))?[>#]\s?$").unwrap()
    }

    #[test]
    fn test_compile_prompt_pattern() {
        let pattern = compile_prompt_pattern(r"router#").unwrap();
        assert!(pattern.is_match(b"router# "));

        let pattern = compile_prompt_pattern(r"router#$").unwrap();
        assert!(pattern.is_match(b"router#"));
    }

    #[test]
    fn test_last_line() {
        assert_eq!(last_line(b"\r\nrtr2811#"), "rtr2811#");
        assert_eq!(last_line(b"output\r\nrtr2811# \r\n"), "rtr2811#");
        assert_eq!(last_line(b""), "");
    }

    #[test]
    fn test_normalize_strips_echo_and_prompt() {
        let raw = b"show clock\r\n*14:31:57.089 UTC Tue Feb 10 2008\r\nrtr2811#";
        let result = normalize_output(raw, "show clock", &ios_prompt());
        assert_eq!(result, "*14:31:57.089 UTC Tue Feb 10 2008");
    }

    #[test]
    fn test_normalize_keeps_output_without_prompt() {
        let raw = b"reload\r\nProceed with reload? [confirm]";
        let result = normalize_output(raw, "reload", &ios_prompt());
        assert_eq!(result, "Proceed with reload? [confirm]");
    }

    #[test]
    fn test_normalize_prompt_only() {
        let raw = b"terminal length 0\r\nrtr2811#";
        let result = normalize_output(raw, "terminal length 0", &ios_prompt());
        assert_eq!(result, "");
    }
}
