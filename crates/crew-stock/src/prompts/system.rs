//! System prompts for crew members

use super::render;
use crate::error::Result;
use serde_json::json;

/// Who a crew member is: the parts of its system prompt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AgentProfile {
    /// Identifier used in logs and task outputs
    pub name: &'static str,
    pub role: &'static str,
    pub goal: &'static str,
    pub backstory: &'static str,
}

const SYSTEM_TEMPLATE: &str = r"You are {{ role }}.
{{ backstory }}

Your personal goal is: {{ goal }}

{% if tools -%}
Use the tools available to you to gather the data you need before answering.
When a tool reports an error, try another approach or state that the data is unavailable.
{%- else -%}
The data you need is included with each task.
When a source is marked as data unavailable, say so instead of inventing figures.
{%- endif %}
Answer in well structured markdown.";

impl AgentProfile {
    /// Render the system prompt for the prefetch (`tools = false`) or
    /// tool-calling mode
    pub fn system_prompt(&self, tools: bool) -> Result<String> {
        render(
            self.name,
            SYSTEM_TEMPLATE,
            &json!({
                "role": self.role,
                "goal": self.goal,
                "backstory": self.backstory,
                "tools": tools,
            }),
        )
    }
}

pub const RESEARCH_ANALYST: AgentProfile = AgentProfile {
    name: "research_analyst",
    role: "Staff Research Analyst",
    goal: "Being the best at gathering and interpreting data and amaze your customer with it",
    backstory: "Known as the BEST research analyst, you're skilled in sifting through news, \
                company announcements, and market sentiments. Now you're working on a super \
                important customer.",
};

pub const FINANCIAL_ANALYST: AgentProfile = AgentProfile {
    name: "financial_analyst",
    role: "The Best Financial Analyst",
    goal: "Impress all customers with your financial data and market trends analysis",
    backstory: "The most seasoned financial analyst with lots of expertise in stock market \
                analysis and investment strategies that is working for a super important \
                customer.",
};

pub const INVESTMENT_ADVISOR: AgentProfile = AgentProfile {
    name: "investment_advisor",
    role: "Private Investment Advisor",
    goal: "Impress your customers with full analyses over stocks and complete investment \
           recommendations",
    backstory: "You're the most experienced investment advisor and you combine various \
                analytical insights to formulate strategic investment advice. You are now \
                working for a super important customer you need to impress.",
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prefetch_system_prompt() {
        let prompt = FINANCIAL_ANALYST.system_prompt(false).unwrap();
        assert!(prompt.starts_with("You are The Best Financial Analyst."));
        assert!(prompt.contains("Your personal goal is: Impress all customers"));
        assert!(prompt.contains("data unavailable"));
        assert!(!prompt.contains("tools available"));
    }

    #[test]
    fn test_tool_system_prompt() {
        let prompt = RESEARCH_ANALYST.system_prompt(true).unwrap();
        assert!(prompt.contains("Staff Research Analyst"));
        assert!(prompt.contains("Use the tools available to you"));
    }

    #[test]
    fn test_profiles_have_distinct_names() {
        let names = [
            RESEARCH_ANALYST.name,
            FINANCIAL_ANALYST.name,
            INVESTMENT_ADVISOR.name,
        ];
        assert_eq!(names, ["research_analyst", "financial_analyst", "investment_advisor"]);
    }
}
