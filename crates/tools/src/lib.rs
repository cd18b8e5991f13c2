//! Built-in tool implementations for Parley.
//!
//! Tools give the assistant the ability to act on the world: do
//! arithmetic, search the web, fetch a stock quote and check the weather.
//! The set is closed; [`BuiltinTool`] names every member and
//! [`default_registry`] registers them all.

pub mod calculator;
mod http;
pub mod stock_price;
pub mod weather;
pub mod web_search;

use parley_config::ToolsConfig;
use parley_core::error::ToolError;
use parley_core::tool::{Tool, ToolRegistry};

pub use calculator::CalculatorTool;
pub use stock_price::StockPriceTool;
pub use weather::WeatherTool;
pub use web_search::WebSearchTool;

/// Every tool this crate ships.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BuiltinTool {
    Calculator,
    StockPrice,
    Weather,
    WebSearch,
}

impl BuiltinTool {
    pub const ALL: [BuiltinTool; 4] = [
        BuiltinTool::Calculator,
        BuiltinTool::StockPrice,
        BuiltinTool::Weather,
        BuiltinTool::WebSearch,
    ];

    /// The name the model uses to call this tool.
    pub fn name(&self) -> &'static str {
        match self {
            BuiltinTool::Calculator => "calculator",
            BuiltinTool::StockPrice => "get_stock_price",
            BuiltinTool::Weather => "get_weather",
            BuiltinTool::WebSearch => "web_search",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.name() == name)
    }

    /// Construct the tool with its endpoints taken from `config`.
    pub fn build(&self, config: &ToolsConfig) -> Result<Box<dyn Tool>, ToolError> {
        Ok(match self {
            BuiltinTool::Calculator => Box::new(CalculatorTool),
            BuiltinTool::StockPrice => Box::new(StockPriceTool::from_config(config)?),
            BuiltinTool::Weather => Box::new(WeatherTool::from_config(config)?),
            BuiltinTool::WebSearch => Box::new(WebSearchTool::from_config(config)?),
        })
    }
}

/// Create a registry holding every built-in tool.
pub fn default_registry(config: &ToolsConfig) -> Result<ToolRegistry, ToolError> {
    let mut registry = ToolRegistry::new();
    for builtin in BuiltinTool::ALL {
        registry.register(builtin.build(config)?)?;
    }
    tracing::debug!(tools = ?registry.names(), "Built-in tools registered");
    Ok(registry)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registry_has_every_builtin() {
        let registry = default_registry(&ToolsConfig::default()).unwrap();
        assert_eq!(
            registry.names(),
            ["calculator", "get_stock_price", "get_weather", "web_search"]
        );
        for builtin in BuiltinTool::ALL {
            assert_eq!(registry.lookup(builtin.name()).unwrap().name(), builtin.name());
        }
    }

    #[test]
    fn builtin_names_roundtrip() {
        for builtin in BuiltinTool::ALL {
            assert_eq!(BuiltinTool::from_name(builtin.name()), Some(builtin));
        }
        assert_eq!(BuiltinTool::from_name("shell"), None);
    }

    #[test]
    fn definitions_carry_schemas() {
        let registry = default_registry(&ToolsConfig::default()).unwrap();
        let defs = registry.describe_all();
        let calc = defs.iter().find(|d| d.name == "calculator").unwrap();
        assert_eq!(
            calc.parameters["required"],
            serde_json::json!(["first_num", "second_num", "operation"])
        );
    }
}
