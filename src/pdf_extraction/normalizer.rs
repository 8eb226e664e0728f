// Text cleanup before the QA model sees it
use regex::Regex;
use std::sync::OnceLock;

/// Unicode whitespace plus the ASCII separators FS, GS, RS and US.
fn whitespace_runs() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[\s\x1C-\x1F]+").expect("static regex"))
}

fn disallowed_chars() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[^a-zA-Z0-9\s.,;!?]").expect("static regex"))
}

fn space_runs() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r" {2,}").expect("static regex"))
}

/// Collapse whitespace to single spaces, then delete everything outside
/// ASCII letters, digits, whitespace and `.,;!?`.
///
/// Deleted characters are not replaced, so a non-ASCII letter inside a word
/// joins its neighbours ("naïve" becomes "nave"). Spaces left adjacent by a
/// deletion are merged again.
pub fn clean_text(text: &str) -> String {
    let collapsed = whitespace_runs().replace_all(text, " ");
    let filtered = disallowed_chars().replace_all(&collapsed, "");
    space_runs().replace_all(&filtered, " ").into_owned()
}
