// src/services/narrative.rs
use log::{error, info};

use crate::BoxError;

pub const MODEL_NOT_CONFIGURED: &str =
    "Narrative model is not configured; the prompt is included in the report.";

/// Everything the opinion prompt is built from.
#[derive(Debug, Clone, PartialEq)]
pub struct NarrativeContext {
    pub ticker: String,
    pub display_name: String,
    pub forward_eps: f64,
    /// Already formatted, e.g. `+4.21%` or `n/a`.
    pub growth: String,
    /// Already formatted, e.g. `-1.11%p`.
    pub acceleration: String,
    pub bond_message: String,
    pub cli_message: String,
    pub signal_message: String,
}

/// Blocking LLM seam. Implementations make one attempt and return its error as is.
pub trait NarrativeModel {
    fn complete(&self, prompt: &str) -> Result<String, BoxError>;
}

pub fn build_prompt(ctx: &NarrativeContext) -> String {
    format!(
        "You are a legendary Wall Street fund manager. Analyze '{name}' ({ticker}) in depth.

[1. Macro risk assessment (critical rules)]
- Bond market: {bond}
- Composite leading indicator (CLI) trend: {cli}

[2. Fundamentals (use your own knowledge)]
- Sector: decide whether {ticker} is cyclical or defensive.
- Look up and assess the forward P/E of {ticker}.

[3. Earnings momentum]
- 12M forward EPS: {fwd:.2}
- Growth: {growth} (month over month)
- Acceleration: {accel} (change in growth)
- System signal: {signal}

[4. Final strategy]
State first that this is not investment advice and that all responsibility lies with the investor.
Give your conclusion first, briefly and in bold.
Weigh the macro risk assessment more heavily for cyclicals and less for defensives.

Three reasons for the conclusion:
1. Fit between the macro picture (CLI/bonds) and the sector.
2. The earnings momentum (acceleration) analysis.
3. The forward P/E of {ticker}.
",
        name = ctx.display_name,
        ticker = ctx.ticker,
        bond = ctx.bond_message,
        cli = ctx.cli_message,
        fwd = ctx.forward_eps,
        growth = ctx.growth,
        accel = ctx.acceleration,
        signal = ctx.signal_message,
    )
}

/// Ask the model for an opinion. Failures come back as text, never as an error.
pub fn request_opinion(model: Option<&dyn NarrativeModel>, prompt: &str) -> String {
    let Some(model) = model else {
        return MODEL_NOT_CONFIGURED.to_string();
    };

    info!("Requesting narrative opinion ({} chars of prompt)", prompt.len());
    match model.complete(prompt) {
        Ok(text) => text,
        Err(e) => {
            error!("Narrative model failed: {}", e);
            format!("Error: {}", e)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Echo;

    impl NarrativeModel for Echo {
        fn complete(&self, prompt: &str) -> Result<String, BoxError> {
            Ok(format!("echo {}", prompt.lines().next().unwrap_or("")))
        }
    }

    struct Down;

    impl NarrativeModel for Down {
        fn complete(&self, _prompt: &str) -> Result<String, BoxError> {
            Err("quota exceeded".into())
        }
    }

    fn context() -> NarrativeContext {
        NarrativeContext {
            ticker: "AAPL".into(),
            display_name: "Apple (AAPL)".into(),
            forward_eps: 7.456,
            growth: "+1.20%".into(),
            acceleration: "-0.40%p".into(),
            bond_message: "stable".into(),
            cli_message: "expansion decelerating".into(),
            signal_message: "cautious (momentum slowing)".into(),
        }
    }

    #[test]
    fn prompt_carries_every_input() {
        let prompt = build_prompt(&context());
        assert!(prompt.contains("'Apple (AAPL)' (AAPL)"));
        assert!(prompt.contains("12M forward EPS: 7.46"));
        assert!(prompt.contains("Growth: +1.20%"));
        assert!(prompt.contains("Acceleration: -0.40%p"));
        assert!(prompt.contains("Bond market: stable"));
        assert!(prompt.contains("expansion decelerating"));
        assert!(prompt.contains("cautious (momentum slowing)"));
    }

    #[test]
    fn opinion_without_model_is_fixed_message() {
        assert_eq!(request_opinion(None, "x"), MODEL_NOT_CONFIGURED);
    }

    #[test]
    fn opinion_passes_through_model_output_and_errors() {
        assert_eq!(request_opinion(Some(&Echo), "hello\nworld"), "echo hello");
        assert_eq!(request_opinion(Some(&Down), "hello"), "Error: quota exceeded");
    }
}
