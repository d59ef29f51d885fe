//! `random_number` tool
//!
//! Returns a uniformly random integer in `[0, max)`.

use rand::Rng;
use serde::Deserialize;
use serde_json::{Value, json};

use crate::error::ToolError;
use crate::protocol::mcp::{CallToolResult, ToolDefinition};
use crate::tools::Tool;

pub const RANDOM_NUMBER_TOOL: &str = "random_number";

#[derive(Debug, Deserialize)]
struct RandomNumberArgs {
    max: u64,
}

#[derive(Debug, Default, Clone, Copy)]
pub struct RandomNumberTool;

impl RandomNumberTool {
    /// Picks a number below `max` using the given source.
    pub fn pick<R: Rng>(max: u64, rng: &mut R) -> Result<u64, ToolError> {
        if max == 0 {
            return Err(ToolError::InvalidArguments(
                "max must be at least 1".to_string(),
            ));
        }
        Ok(rng.gen_range(0..max))
    }
}

impl Tool for RandomNumberTool {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: RANDOM_NUMBER_TOOL.to_string(),
            description: Some("Return a random number up to a given maximum".to_string()),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "max": {
                        "type": "integer",
                        "minimum": 1,
                        "description": "Exclusive upper bound"
                    }
                },
                "required": ["max"]
            }),
        }
    }

    fn call(&self, arguments: Option<&Value>) -> Result<CallToolResult, ToolError> {
        let arguments =
            arguments.ok_or_else(|| ToolError::InvalidArguments("missing arguments".into()))?;
        let args: RandomNumberArgs = serde_json::from_value(arguments.clone())
            .map_err(|e| ToolError::InvalidArguments(e.to_string()))?;

        let number = Self::pick(args.max, &mut rand::thread_rng())?;
        Ok(CallToolResult::text(number.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::mcp::ToolContent;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn text_of(result: &CallToolResult) -> &str {
        match &result.content[0] {
            ToolContent::Text { text } => text,
        }
    }

    #[test]
    fn test_pick_stays_below_max() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..1000 {
            assert!(RandomNumberTool::pick(10, &mut rng).unwrap() < 10);
        }
        assert_eq!(RandomNumberTool::pick(1, &mut rng).unwrap(), 0);
    }

    #[test]
    fn test_pick_rejects_zero() {
        let mut rng = StdRng::seed_from_u64(7);
        assert!(matches!(
            RandomNumberTool::pick(0, &mut rng),
            Err(ToolError::InvalidArguments(_))
        ));
    }

    #[test]
    fn test_call_returns_number_text() {
        let result = RandomNumberTool.call(Some(&json!({"max": 100}))).unwrap();
        assert!(!result.is_error);
        let n: u64 = text_of(&result).parse().unwrap();
        assert!(n < 100);
    }

    #[test]
    fn test_call_rejects_bad_arguments() {
        for args in [json!({}), json!({"max": -5}), json!({"max": "ten"}), json!({"max": 0})] {
            let err = RandomNumberTool.call(Some(&args)).unwrap_err();
            assert!(matches!(err, ToolError::InvalidArguments(_)), "{args}");
        }
        assert!(RandomNumberTool.call(None).is_err());
    }
}
