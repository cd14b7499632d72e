//! Robots.txt parser implementation
//!
//! A pragmatic subset of the exclusion protocol: `User-agent` groups and
//! `Disallow` path prefixes. `Allow`, `Crawl-delay` and pattern syntax are
//! not interpreted.

use url::Url;

/// Disallow rules from a robots.txt file that apply to one client identity
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedRobots {
    /// Disallowed path prefixes, in file order
    disallowed: Vec<String>,
}

impl ParsedRobots {
    /// Parses robots.txt content, keeping only rules that govern `agent_tokens`
    ///
    /// A rule applies when its user-agent group names `*` or any of the
    /// tokens (case-insensitive). Rules before the first `User-agent` line
    /// and empty `Disallow` values are ignored.
    ///
    /// # Arguments
    ///
    /// * `content` - The raw robots.txt file content
    /// * `agent_tokens` - Names this client answers to, see [`agent_tokens`]
    pub fn from_content(content: &str, agent_tokens: &[String]) -> Self {
        let mut disallowed = Vec::new();
        let mut group: Vec<String> = Vec::new();
        // Consecutive User-agent lines share one group
        let mut group_open = false;

        for line in content.lines() {
            let line = match line.split_once('#') {
                Some((before, _)) => before,
                None => line,
            }
            .trim();

            let Some((key, value)) = line.split_once(':') else {
                continue;
            };
            let key = key.trim().to_ascii_lowercase();
            let value = value.trim();

            match key.as_str() {
                "user-agent" => {
                    if !group_open {
                        group.clear();
                        group_open = true;
                    }
                    group.push(value.to_ascii_lowercase());
                }
                "disallow" => {
                    group_open = false;
                    if value.is_empty() || !Self::group_applies(&group, agent_tokens) {
                        continue;
                    }
                    disallowed.push(value.to_string());
                }
                _ => group_open = false,
            }
        }

        Self { disallowed }
    }

    /// Creates a permissive ParsedRobots that allows everything
    ///
    /// This is used when robots.txt cannot be fetched.
    pub fn allow_all() -> Self {
        Self::default()
    }

    /// Disallowed path prefixes that apply to this client
    pub fn disallowed(&self) -> &[String] {
        &self.disallowed
    }

    /// Checks if a URL may be crawled
    ///
    /// The URL is denied when it starts with any disallowed path resolved
    /// against the URL itself.
    pub fn is_allowed(&self, url: &Url) -> bool {
        let target = url.as_str();
        !self.disallowed.iter().any(|rule| match url.join(rule) {
            Ok(prefix) => target.starts_with(prefix.as_str()),
            Err(_) => false,
        })
    }

    fn group_applies(group: &[String], agent_tokens: &[String]) -> bool {
        group.iter().any(|agent| {
            agent == "*"
                || agent_tokens
                    .iter()
                    .any(|token| token.eq_ignore_ascii_case(agent))
        })
    }
}

/// Derives the user-agent names this client answers to
///
/// For `MapWWWBot/1.0 (+http://host/botinfo)` these are the full string,
/// `MapWWWBot` and `MapWWWBot/1.0`.
pub fn agent_tokens(user_agent: &str) -> Vec<String> {
    let mut tokens = vec![user_agent.to_string()];

    let mut parts = user_agent.splitn(2, '/');
    let name = parts.next().unwrap_or_default().trim();
    if !name.is_empty() && name != user_agent {
        tokens.push(name.to_string());
    }

    if let Some(version) = parts.next().and_then(|rest| rest.split_whitespace().next()) {
        let versioned = format!("{}/{}", name, version);
        if versioned != user_agent {
            tokens.push(versioned);
        }
    }

    tokens
}
