//! Robots.txt interpretation
//!
//! Only two things are read from the policy document: whether the site root
//! is disallowed for our agent, and the `Crawl-delay` that applies to it.

use robotstxt::DefaultMatcher;

/// Directives of one fetched policy document
#[derive(Debug, Clone)]
pub struct PolicyDirectives {
    content: String,
}

impl PolicyDirectives {
    /// Wraps raw robots.txt content
    pub fn from_content(content: &str) -> Self {
        Self {
            content: content.to_string(),
        }
    }

    /// Returns the raw robots.txt content
    pub fn content(&self) -> &str {
        &self.content
    }

    /// Checks for the disallow-all marker
    ///
    /// The site is closed to `user_agent` when its rules deny the root path,
    /// e.g. `User-agent: *` followed by `Disallow: /`.
    pub fn disallows_all(&self, user_agent: &str) -> bool {
        if self.content.trim().is_empty() {
            return false;
        }

        let mut matcher = DefaultMatcher::default();
        !matcher.one_agent_allowed_by_robots(&self.content, user_agent, "/")
    }

    /// Gets the crawl delay that applies to `user_agent`
    ///
    /// A group naming the agent takes precedence over the `*` group. Agent
    /// names compare case-insensitively.
    ///
    /// # Returns
    ///
    /// * `Some(f64)` - The crawl delay in seconds
    /// * `None` - If no applicable, parseable crawl delay is declared
    pub fn crawl_delay(&self, user_agent: &str) -> Option<f64> {
        let agent = user_agent.to_lowercase();

        let mut group_agents: Vec<String> = Vec::new();
        let mut in_agent_lines = false;
        let mut delay_for_agent: Option<f64> = None;
        let mut delay_for_wildcard: Option<f64> = None;

        for line in self.content.lines() {
            // Strip trailing comments
            let line = line.split('#').next().unwrap_or_default().trim();
            if line.is_empty() {
                continue;
            }

            let Some((key, value)) = line.split_once(':') else {
                continue;
            };
            let key = key.trim().to_lowercase();
            let value = value.trim();

            if key == "user-agent" {
                // Consecutive User-agent lines share one group
                if !in_agent_lines {
                    group_agents.clear();
                }
                group_agents.push(value.to_lowercase());
                in_agent_lines = true;
                continue;
            }
            in_agent_lines = false;

            if key != "crawl-delay" {
                continue;
            }

            let Some(delay) = value.parse::<f64>().ok().filter(|d| d.is_finite() && *d >= 0.0)
            else {
                continue;
            };

            if group_agents.iter().any(|ua| *ua == agent) {
                delay_for_agent.get_or_insert(delay);
            } else if group_agents.iter().any(|ua| ua == "*") {
                delay_for_wildcard.get_or_insert(delay);
            }
        }

        delay_for_agent.or(delay_for_wildcard)
    }
}
