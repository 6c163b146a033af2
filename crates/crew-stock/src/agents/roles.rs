//! The three crew members

use crate::prompts::{AgentProfile, FINANCIAL_ANALYST, INVESTMENT_ADVISOR, RESEARCH_ANALYST};
use crate::tools::ToolKit;
use crew_core::{Agent, Result};
use crew_runtime::AgentRuntime;
use crew_tools::ToolRegistry;
use crew_utils::CrewMode;
use std::sync::Arc;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    ResearchAnalyst,
    FinancialAnalyst,
    InvestmentAdvisor,
}

impl Role {
    pub fn profile(&self) -> &'static AgentProfile {
        match self {
            Role::ResearchAnalyst => &RESEARCH_ANALYST,
            Role::FinancialAnalyst => &FINANCIAL_ANALYST,
            Role::InvestmentAdvisor => &INVESTMENT_ADVISOR,
        }
    }

    /// Tools handed to this member in tools mode
    pub fn tools(&self, kit: &ToolKit) -> ToolRegistry {
        let registry = ToolRegistry::new();
        registry.register(kit.search());
        registry.register(kit.scrape());
        registry.register(kit.stock_data());
        registry.register(kit.calculator());
        match self {
            Role::ResearchAnalyst => {}
            Role::FinancialAnalyst => registry.register(kit.filings()),
            Role::InvestmentAdvisor => registry.register(kit.chart()),
        }
        registry
    }

    /// Create the LLM-backed agent for this member
    pub fn build(&self, runtime: &AgentRuntime, mode: CrewMode, kit: &ToolKit) -> Result<Arc<dyn Agent>> {
        let profile = self.profile();
        debug!(agent = profile.name, ?mode, "Creating crew member");

        let agent: Arc<dyn Agent> = match mode {
            CrewMode::Prefetch => {
                let config = runtime.simple_config(profile.system_prompt(false)?);
                Arc::new(runtime.create_simple_agent(config, profile.name))
            }
            CrewMode::Tools => {
                let config = runtime.executor_config(profile.system_prompt(true)?);
                let tools = Arc::new(self.tools(kit));
                Arc::new(runtime.create_tool_agent(config, tools, profile.name))
            }
        };
        Ok(agent)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::DataSources;
    use crate::config::StockConfig;
    use crew_tools::Tool;

    fn kit() -> ToolKit {
        ToolKit {
            sources: DataSources::from_config(&StockConfig::default()).unwrap(),
            summarizer: None,
            chart_dir: std::env::temp_dir(),
        }
    }

    fn names(registry: &ToolRegistry) -> Vec<String> {
        registry
            .list_tools()
            .iter()
            .map(|t| t.name().to_string())
            .collect()
    }

    #[test]
    fn test_tools_per_role() {
        let kit = kit();
        assert_eq!(
            names(&Role::ResearchAnalyst.tools(&kit)),
            vec!["calculate", "scrape_website", "search_internet", "stock_data"]
        );
        assert!(names(&Role::FinancialAnalyst.tools(&kit)).contains(&"search_filings".to_string()));
        assert!(names(&Role::InvestmentAdvisor.tools(&kit)).contains(&"stock_chart".to_string()));
        for role in [Role::FinancialAnalyst, Role::InvestmentAdvisor] {
            assert!(names(&role.tools(&kit)).contains(&"calculate".to_string()));
        }
    }

    #[test]
    fn test_profiles() {
        assert_eq!(Role::ResearchAnalyst.profile().role, "Staff Research Analyst");
        assert_eq!(Role::InvestmentAdvisor.profile().name, "investment_advisor");
    }
}
