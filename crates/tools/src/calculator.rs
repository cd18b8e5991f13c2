//! Calculator tool — one arithmetic operation on two numbers.

use async_trait::async_trait;
use parley_core::error::ToolError;
use parley_core::tool::{ArgType, ArgumentSchema, Tool};

pub struct CalculatorTool;

/// The four supported operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Add,
    Sub,
    Mul,
    Div,
}

impl Operation {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "add" => Some(Operation::Add),
            "sub" => Some(Operation::Sub),
            "mul" => Some(Operation::Mul),
            "div" => Some(Operation::Div),
            _ => None,
        }
    }
}

/// Apply `op`; the only failure is division by zero.
pub fn calculate(first: f64, second: f64, op: Operation) -> Result<f64, &'static str> {
    match op {
        Operation::Add => Ok(first + second),
        Operation::Sub => Ok(first - second),
        Operation::Mul => Ok(first * second),
        Operation::Div if second == 0.0 => Err("Division by zero is not allowed"),
        Operation::Div => Ok(first / second),
    }
}

#[async_trait]
impl Tool for CalculatorTool {
    fn name(&self) -> &str {
        "calculator"
    }

    fn description(&self) -> &str {
        "Perform a basic arithmetic operation on two numbers. Supported operations: add, sub, mul, div."
    }

    fn schema(&self) -> ArgumentSchema {
        ArgumentSchema::new()
            .required("first_num", ArgType::Number, "The first operand")
            .required("second_num", ArgType::Number, "The second operand")
            .required("operation", ArgType::String, "One of add, sub, mul, div")
    }

    async fn execute(&self, arguments: serde_json::Value) -> Result<serde_json::Value, ToolError> {
        let first = arguments["first_num"]
            .as_f64()
            .ok_or_else(|| ToolError::InvalidArguments("Missing 'first_num' argument".into()))?;
        let second = arguments["second_num"]
            .as_f64()
            .ok_or_else(|| ToolError::InvalidArguments("Missing 'second_num' argument".into()))?;
        let operation = arguments["operation"]
            .as_str()
            .ok_or_else(|| ToolError::InvalidArguments("Missing 'operation' argument".into()))?;

        let Some(op) = Operation::parse(operation) else {
            return Ok(serde_json::json!({
                "error": format!("Unsupported operation '{operation}'")
            }));
        };

        Ok(match calculate(first, second, op) {
            Ok(result) => serde_json::json!({
                "first_num": first,
                "second_num": second,
                "operation": operation,
                "result": result,
            }),
            Err(message) => serde_json::json!({ "error": message }),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn run(first: f64, second: f64, op: &str) -> serde_json::Value {
        CalculatorTool
            .execute(serde_json::json!({
                "first_num": first,
                "second_num": second,
                "operation": op,
            }))
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn adds() {
        let out = run(2.0, 3.0, "add").await;
        assert_eq!(out["result"], 5.0);
        assert_eq!(out["operation"], "add");
        assert_eq!(out["first_num"], 2.0);
        assert_eq!(out["second_num"], 3.0);
    }

    #[tokio::test]
    async fn subtracts_multiplies_divides() {
        assert_eq!(run(10.0, 4.0, "sub").await["result"], 6.0);
        assert_eq!(run(2.5, 4.0, "mul").await["result"], 10.0);
        assert_eq!(run(7.0, 2.0, "div").await["result"], 3.5);
    }

    #[tokio::test]
    async fn division_by_zero_is_an_error_payload() {
        assert_eq!(
            run(1.0, 0.0, "div").await,
            serde_json::json!({"error": "Division by zero is not allowed"})
        );
    }

    #[tokio::test]
    async fn unsupported_operation() {
        assert_eq!(
            run(2.0, 3.0, "pow").await,
            serde_json::json!({"error": "Unsupported operation 'pow'"})
        );
    }

    #[tokio::test]
    async fn missing_argument_is_invalid() {
        let err = CalculatorTool
            .execute(serde_json::json!({"first_num": 1, "operation": "add"}))
            .await
            .unwrap_err();
        assert!(matches!(err, ToolError::InvalidArguments(_)));
    }

    #[test]
    fn integer_arguments_are_accepted() {
        let schema = CalculatorTool.schema();
        assert!(
            schema
                .validate(&serde_json::json!({"first_num": 2, "second_num": 3, "operation": "add"}))
                .is_ok()
        );
    }

    #[test]
    fn tool_definition() {
        let def = CalculatorTool.to_definition();
        assert_eq!(def.name, "calculator");
        assert_eq!(def.parameters["properties"]["operation"]["type"], "string");
    }
}
