//! Rewrites of `SHOW CREATE` output into version-gated dump statements.
//!
//! MySQL reports views, triggers and events with a `DEFINER=` clause that
//! only makes sense on the source server. These rewrites wrap each part of
//! the statement in `/*!NNNNN ... */` version comments the way the stock
//! client tools do, and drop the definer entirely under `skip-definer`.

use regex::{Captures, Regex};
use std::sync::OnceLock;

/// A quoted `DEFINER=user@host` clause, with doubled backticks allowed.
pub const DEFINER_RE: &str = r"DEFINER=`(?:[^`]|``)*`@`(?:[^`]|``)*`";

/// Pre-compiled rewrite patterns.
///
/// Uses `OnceLock` for thread-safe lazy initialization.
pub struct DefinerPatterns {
    view: Regex,
    trigger: Regex,
    procedure: Regex,
    function: Regex,
    event: Regex,
    auto_increment: Regex,
}

impl DefinerPatterns {
    /// Gets the singleton instance of the compiled patterns.
    pub fn instance() -> &'static Self {
        static PATTERNS: OnceLock<DefinerPatterns> = OnceLock::new();
        PATTERNS.get_or_init(Self::compile)
    }

    fn compile() -> Self {
        let object = |keyword: &str| {
            Regex::new(&format!(
                r"(?s)^(CREATE)\s+({})?\s*({}\s.*)$",
                DEFINER_RE, keyword
            ))
            .expect("Invalid definer pattern")
        };

        Self {
            view: Regex::new(&format!(
                r"(?s)^(CREATE(?:\s+ALGORITHM=(?:UNDEFINED|MERGE|TEMPTABLE))?)\s+({}(?:\s+SQL SECURITY (?:DEFINER|INVOKER))?)?\s*(VIEW\s.+)$",
                DEFINER_RE
            ))
            .expect("Invalid view pattern"),
            trigger: object("TRIGGER"),
            procedure: object("PROCEDURE"),
            function: object("FUNCTION"),
            event: object("EVENT"),
            auto_increment: Regex::new(r"\s*AUTO_INCREMENT=[0-9]+").expect("Invalid pattern"),
        }
    }
}

/// Splits a view definition into version-gated parts.
pub fn rewrite_view(statement: &str, skip_definer: bool) -> String {
    let patterns = DefinerPatterns::instance();
    patterns
        .view
        .replacen(statement, 1, |caps: &Captures<'_>| {
            let mut out = format!("/*!50001 {} */\n", &caps[1]);
            if let Some(definer) = caps.get(2).filter(|_| !skip_definer) {
                out.push_str(&format!("/*!50013 {} */\n", definer.as_str()));
            }
            out.push_str(&format!("/*!50001 {} */", &caps[3]));
            out
        })
        .into_owned()
}

/// Splits a trigger definition into version-gated parts.
pub fn rewrite_trigger(statement: &str, skip_definer: bool) -> String {
    gate(&DefinerPatterns::instance().trigger, statement, skip_definer, "50003", "50017")
}

/// Splits an event definition into version-gated parts.
pub fn rewrite_event(statement: &str, skip_definer: bool) -> String {
    gate(&DefinerPatterns::instance().event, statement, skip_definer, "50106", "50117")
}

/// Removes the definer clause from a procedure definition.
pub fn strip_procedure_definer(statement: &str) -> String {
    strip(&DefinerPatterns::instance().procedure, statement)
}

/// Removes the definer clause from a function definition.
pub fn strip_function_definer(statement: &str) -> String {
    strip(&DefinerPatterns::instance().function, statement)
}

/// Removes `AUTO_INCREMENT=n` table options.
pub fn strip_auto_increment(statement: &str) -> String {
    DefinerPatterns::instance()
        .auto_increment
        .replace_all(statement, "")
        .into_owned()
}

fn gate(pattern: &Regex, statement: &str, skip_definer: bool, body: &str, definer: &str) -> String {
    pattern
        .replacen(statement, 1, |caps: &Captures<'_>| {
            let mut out = format!("/*!{} {}*/ ", body, &caps[1]);
            if let Some(clause) = caps.get(2).filter(|_| !skip_definer) {
                out.push_str(&format!("/*!{} {}*/ ", definer, clause.as_str()));
            }
            out.push_str(&format!("/*!{} {} */", body, &caps[3]));
            out
        })
        .into_owned()
}

fn strip(pattern: &Regex, statement: &str) -> String {
    pattern
        .replacen(statement, 1, |caps: &Captures<'_>| {
            format!("{} {}", &caps[1], &caps[3])
        })
        .into_owned()
}
